//! Tri-state frame encoding for DIP-switch addressed sockets.
//!
//! A frame is 16 bytes. Each byte carries one tri-state symbol as an 8-unit
//! pulse pattern, so the frame flattens to 128 pulses sent MSB first:
//!
//! ```text
//! byte  0..=4   system code (DIP switches 1-5)
//! byte  5..=9   device letter A-E
//! byte 10..=11  on/off marker
//! byte 12       sync head
//! byte 13..=15  sync gap
//! ```

use crate::types::{DeviceLetter, SwitchState, SystemCode};
use rf_transport::Level;

pub const FRAME_BYTES: usize = 16;
pub const FRAME_PULSES: usize = FRAME_BYTES * 8;

/// Symbol for an unset position
pub const SYMBOL_OPEN: u8 = 0b1000_1110;
/// Symbol for a set position
pub const SYMBOL_ACTIVE: u8 = 0b1000_1000;
pub const SYMBOL_SYNC: u8 = 0b1000_0000;

const TEMPLATE: TriStateFrame = [
    SYMBOL_OPEN,
    SYMBOL_OPEN,
    SYMBOL_OPEN,
    SYMBOL_OPEN,
    SYMBOL_OPEN,
    SYMBOL_OPEN,
    SYMBOL_OPEN,
    SYMBOL_OPEN,
    SYMBOL_OPEN,
    SYMBOL_OPEN,
    SYMBOL_OPEN,
    SYMBOL_ACTIVE,
    SYMBOL_SYNC,
    0,
    0,
    0,
];

pub type TriStateFrame = [u8; FRAME_BYTES];
pub type PulseTrain = [Level; FRAME_PULSES];

/// Build the 16-byte frame addressing `letter` under `system_code`.
pub fn build_frame(
    system_code: &SystemCode,
    letter: DeviceLetter,
    state: SwitchState,
) -> TriStateFrame {
    let mut frame = TEMPLATE;

    for (byte, on) in frame.iter_mut().zip(system_code.switches()) {
        if on {
            *byte = SYMBOL_ACTIVE;
        }
    }

    // Only flags A..E have an address byte; F and G leave the address open
    let flag = letter.flag();
    for i in 1..=5 {
        if flag & (1 << (i - 1)) != 0 {
            frame[4 + i] = SYMBOL_ACTIVE;
        }
    }

    if state == SwitchState::On {
        frame[10] = SYMBOL_ACTIVE;
        frame[11] = SYMBOL_OPEN;
    }
    frame
}

/// Flatten a frame into pulse levels, most significant bit first.
pub fn frame_pulses(frame: &TriStateFrame) -> PulseTrain {
    let mut out = [Level::Low; FRAME_PULSES];
    for (i, byte) in frame.iter().enumerate() {
        for bit in 0..8 {
            out[i * 8 + bit] = Level::from(byte & (0x80 >> bit) != 0);
        }
    }
    out
}

/// Render pulses as a `0`/`1` string for diagnostics.
pub fn pulse_string(pulses: &[Level]) -> String {
    pulses
        .iter()
        .map(|l| if l.is_high() { '1' } else { '0' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> SystemCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_frame_gf_lamp_on() {
        let frame = build_frame(&code("00001"), DeviceLetter::A, SwitchState::On);
        assert_eq!(
            frame,
            [142, 142, 142, 142, 136, 136, 142, 142, 142, 142, 136, 142, 128, 0, 0, 0]
        );
    }

    #[test]
    fn test_frame_off_keeps_template_marker() {
        let frame = build_frame(&code("10100"), DeviceLetter::C, SwitchState::Off);
        assert_eq!(
            frame,
            [136, 142, 136, 142, 142, 142, 142, 136, 142, 142, 142, 136, 128, 0, 0, 0]
        );
    }

    #[test]
    fn test_letters_f_and_g_set_no_address_byte() {
        for letter in [DeviceLetter::F, DeviceLetter::G] {
            let frame = build_frame(&code("00000"), letter, SwitchState::Off);
            assert_eq!(frame, TEMPLATE);
        }
        let e = build_frame(&code("00000"), DeviceLetter::E, SwitchState::Off);
        assert_eq!(e[9], SYMBOL_ACTIVE);
    }

    #[test]
    fn test_pulses_are_128_and_deterministic() {
        let codes = ["00000", "11111", "01010", "00001", "10011"];
        for c in codes {
            for letter in DeviceLetter::ALL {
                for state in [SwitchState::On, SwitchState::Off] {
                    let a = frame_pulses(&build_frame(&code(c), letter, state));
                    let b = frame_pulses(&build_frame(&code(c), letter, state));
                    assert_eq!(a.len(), FRAME_PULSES);
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_pulses_msb_first() {
        let frame = build_frame(&code("00001"), DeviceLetter::A, SwitchState::On);
        let pulses = frame_pulses(&frame);
        assert_eq!(pulse_string(&pulses[..8]), "10001110");
        assert_eq!(pulse_string(&pulses[32..40]), "10001000");
        assert_eq!(pulse_string(&pulses[96..104]), "10000000");
        assert!(pulses[104..].iter().all(|l| !l.is_high()));
    }
}
