use core::fmt;

/// Logic level of an output pin
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => f.write_str("low"),
            Level::High => f.write_str("high"),
        }
    }
}

/// Pin numbering scheme used when addressing GPIO lines
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PinNumbering {
    /// Broadcom SoC channel numbers
    #[default]
    Bcm,
    /// Physical header positions
    Board,
}

#[derive(Clone, Debug)]
pub struct BackendInfo {
    pub name: String,
    pub driver: String,
}
