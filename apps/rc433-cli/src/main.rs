use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::info;

use rc433::encode::{build_frame, frame_pulses, pulse_string};
use rc433::{
    DeviceLetter, DeviceRegistry, MetricsHub, Rc433Bridge, SharedRc433, StateRequest,
    SwitchState, SystemCode, DEFAULT_PIN,
};
use rf_transport::{Gpio, PulseTransmitter, RfProtocol, SharedGpio};

#[derive(Parser, Debug)]
#[command(
    name = "rc433",
    version,
    about = "Switch 433MHz radio-controlled sockets",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Backend {
    Mock,
    Gpio,
}

/// Transmitter options shared by commands that go on the air
#[derive(clap::Args, Debug)]
struct RadioArgs {
    /// Backend to drive the transmitter with
    #[arg(long, value_enum, default_value_t = Backend::Mock)]
    backend: Backend,
    /// BCM pin wired to the transmitter data line
    #[arg(long, default_value_t = DEFAULT_PIN)]
    pin: u8,
    /// Fixed-code protocol (1-6) for code devices
    #[arg(long, default_value_t = 1u8)]
    protocol: u8,
    /// Print Prometheus metrics afterwards
    #[arg(long, action = ArgAction::SetTrue)]
    metrics: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate device descriptors
    DeviceValidate {
        /// YAML or JSON file path
        #[arg(long)]
        file: Option<String>,
        /// Directory containing descriptor files
        #[arg(long)]
        dir: Option<String>,
        /// Print JSON after validation
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// List devices from a directory
    DeviceList {
        /// Directory containing descriptor files
        #[arg(long, default_value = "configs/devices")]
        dir: String,
    },
    /// Print the tri-state frame for a system code and device letter
    Frame {
        /// DIP switch positions, e.g. 00001
        #[arg(long)]
        system_code: String,
        /// Device letter A-G
        #[arg(long)]
        device_code: String,
        /// on or off
        #[arg(long)]
        state: String,
    },
    /// Switch one device
    Switch {
        /// Descriptor file or directory
        #[arg(long, default_value = "configs/devices")]
        devices: String,
        /// Device name
        #[arg(long)]
        device: String,
        /// on or off
        #[arg(long)]
        state: String,
        #[command(flatten)]
        radio: RadioArgs,
    },
    /// Handle one bus message and print the resulting publication
    Handle {
        /// Descriptor file or directory
        #[arg(long, default_value = "configs/devices")]
        devices: String,
        /// Topic, e.g. rc433/groundfloor/gf-lamp
        #[arg(long)]
        topic: String,
        /// Message payload (on/off)
        #[arg(long)]
        payload: String,
        #[command(flatten)]
        radio: RadioArgs,
    },
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::DeviceValidate { file, dir, json } => {
            device_validate(file.as_deref(), dir.as_deref(), json)
        }
        Commands::DeviceList { dir } => device_list(&dir),
        Commands::Frame {
            system_code,
            device_code,
            state,
        } => frame(&system_code, &device_code, &state),
        Commands::Switch {
            devices,
            device,
            state,
            radio,
        } => switch(&devices, &device, &state, &radio),
        Commands::Handle {
            devices,
            topic,
            payload,
            radio,
        } => handle(&devices, &topic, &payload, &radio),
    }
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn device_validate(file: Option<&str>, dir: Option<&str>, json: bool) -> Result<()> {
    let reg = match (file, dir) {
        (Some(f), None) => rc433::load_devices_file(f)?,
        (None, Some(d)) => rc433::load_devices_dir(d)?,
        _ => {
            return Err(anyhow::anyhow!("provide --file <path> or --dir <dir>"));
        }
    };
    println!("ok: loaded {} devices", reg.len());
    if json {
        let devices: Vec<_> = reg.list().into_iter().map(|d| d.device).collect();
        println!("{}", serde_json::to_string_pretty(&devices)?);
    }
    Ok(())
}

fn device_list(dir: &str) -> Result<()> {
    let reg = rc433::load_devices_dir(dir)?;
    for entry in reg.list() {
        let device = entry.device;
        println!("{}\ttype={}", device.name(), device.kind().name());
    }
    Ok(())
}

fn frame(system_code: &str, device_code: &str, state: &str) -> Result<()> {
    let code: SystemCode = system_code.parse()?;
    let letter: DeviceLetter = device_code.parse()?;
    let state: SwitchState = state.parse()?;
    let frame = build_frame(&code, letter, state);
    println!("{frame:?}");
    println!("{}", pulse_string(&frame_pulses(&frame)));
    Ok(())
}

type DynGpio = SharedGpio<Box<dyn Gpio>>;
type DynRc433 = SharedRc433<Box<dyn Gpio>>;
type DynBridge = Rc433Bridge<DynGpio, PulseTransmitter<DynGpio>>;

fn open_rc433(radio: &RadioArgs) -> Result<DynRc433> {
    let protocol = RfProtocol::by_number(radio.protocol)?;
    let gpio: Box<dyn Gpio> = match radio.backend {
        Backend::Mock => Box::new(rf_transport::MockGpio::new()),
        Backend::Gpio => open_gpio()?,
    };
    info!(
        gpio = gpio.info().name.as_str(),
        pin = radio.pin,
        protocol = radio.protocol,
        "transmitter backend ready"
    );
    // one handle for both encoders: the pin is claimed once per process
    Ok(SharedRc433::with_shared_gpio(gpio, radio.pin, protocol))
}

#[cfg(feature = "gpio")]
fn open_gpio() -> Result<Box<dyn Gpio>> {
    let gpio = rf_transport::RpiGpio::open().context("open GPIO")?;
    Ok(Box::new(gpio))
}

#[cfg(not(feature = "gpio"))]
fn open_gpio() -> Result<Box<dyn Gpio>> {
    anyhow::bail!("GPIO backend not built; rebuild with --features gpio")
}

fn open_bridge(devices: &str, radio: &RadioArgs) -> Result<DynBridge> {
    let registry: DeviceRegistry = rc433::load_devices(devices)
        .with_context(|| format!("load devices from {devices}"))?;
    let metrics = MetricsHub::new().map_err(anyhow::Error::msg)?;
    Ok(Rc433Bridge::new(registry, open_rc433(radio)?, metrics))
}

fn switch(devices: &str, device: &str, state: &str, radio: &RadioArgs) -> Result<()> {
    let mut bridge = open_bridge(devices, radio)?;
    let report = bridge.apply(&StateRequest::new(device, state)?)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if radio.metrics {
        print!("{}", bridge.metrics().encode_text());
    }
    Ok(())
}

fn handle(devices: &str, topic: &str, payload: &str, radio: &RadioArgs) -> Result<()> {
    let mut bridge = open_bridge(devices, radio)?;
    let (report, publication) = bridge.handle(topic, payload.as_bytes())?;
    match publication {
        Some(p) => println!("publish {} {} (retain={})", p.topic, p.payload, p.retain),
        None => println!("nothing to publish: switch not acknowledged"),
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    if radio.metrics {
        print!("{}", bridge.metrics().encode_text());
    }
    Ok(())
}
