//! ALUP master CLI — entry point.
//!
//! ```text
//! alup-master list                       List available serial ports
//! alup-master serial /dev/ttyUSB0       Connect over serial, run the demo
//! alup-master serial COM3 --baud 57600  Custom baud rate
//! alup-master tcp 192.168.1.50:1201     Connect over TCP, run the demo
//! ```
//!
//! The demo prints the negotiated configuration, sweeps a rainbow
//! across the strip while reporting round-trip times, clears the
//! strip and disconnects.

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use alup_core::{AlupError, ByteTransport, Device, SerialTransport, TcpTransport, effects};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "alup-master", about = "ALUP master — drive addressable LED strips")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// List available serial ports.
    List,

    /// Connect to a device over a serial port and run the demo.
    Serial {
        /// Serial port path. Example: /dev/ttyUSB0, COM3
        path: String,

        /// Baud rate; must match the device firmware.
        #[arg(short, long, default_value_t = 115_200)]
        baud: u32,
    },

    /// Connect to a device over TCP and run the demo.
    Tcp {
        /// Device address. Example: 192.168.1.50:1201
        addr: String,
    },
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        CliCommand::List => list_ports()?,
        CliCommand::Serial { path, baud } => {
            let device = Device::new(SerialTransport::new(path, baud));
            run_demo(device).await?;
        }
        CliCommand::Tcp { addr } => {
            let device = Device::new(TcpTransport::new(addr));
            run_demo(device).await?;
        }
    }
    Ok(())
}

fn list_ports() -> Result<(), Box<dyn std::error::Error>> {
    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        println!("no serial ports found");
        return Ok(());
    }
    for port in ports {
        println!("{}", port.port_name);
    }
    Ok(())
}

// ── Demo ─────────────────────────────────────────────────────────

async fn run_demo<T: ByteTransport>(mut device: Device<T>) -> Result<(), AlupError> {
    info!("connecting");
    device.connect().await?;

    let Some(configuration) = device.configuration() else {
        error!("connected without a configuration");
        return Err(AlupError::NotConnected);
    };
    info!(
        name = %configuration.device_name(),
        version = %configuration.protocol_version(),
        leds = configuration.num_of_leds(),
        data_pin = configuration.data_pin(),
        clock_pin = configuration.clock_pin(),
        "configuration received"
    );
    let count = configuration.num_of_leds() as usize;

    // rainbow sweep over one full animation cycle
    for frame in 0..count as u32 {
        device.send_leds(effects::rainbow(1, 10, frame, count)).await?;
        info!(ping_ms = device.ping_ms(), frame, "frame acknowledged");
    }

    device.clear().await?;
    info!("strip cleared");

    device.disconnect().await;
    info!("disconnected");
    Ok(())
}
