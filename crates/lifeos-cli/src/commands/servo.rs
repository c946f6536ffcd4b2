use clap::Subcommand;
use lifeos_core::servo::{self, Servo};
use lifeos_core::{Config, ServoLink};

use super::{CmdResult, Output};

#[derive(Subcommand)]
pub enum ServoAction {
    /// List serial ports
    Ports,
    /// Open the port and center the needle
    Test {
        /// Port to test (default: servo.port from config)
        #[arg(long)]
        port: Option<String>,
    },
    /// Show the needle angle for a remaining-time percentage
    Angle {
        percentage: f64,
        /// Also move the configured servo
        #[arg(long)]
        send: bool,
    },
}

pub fn run(action: ServoAction, out: Output) -> CmdResult {
    let config = Config::load()?;

    match action {
        ServoAction::Ports => {
            let ports = servo::list_ports(&config.servo.fallback_ports);
            out.emit(&ports, |ports: &Vec<String>| {
                for p in ports {
                    println!("{p}");
                }
            })?;
        }
        ServoAction::Test { port } => {
            let port = port.unwrap_or_else(|| config.servo.port.clone());
            let (ok, message) =
                servo::test_connection(&port, config.servo.baud_rate, config.servo.settle());
            out.emit(
                &serde_json::json!({ "port": port, "connected": ok, "message": message }),
                |_| println!("{message}"),
            )?;
            if !ok {
                return Err(format!("servo on {port} did not respond").into());
            }
        }
        ServoAction::Angle { percentage, send } => {
            let angle = servo::angle(percentage);
            let sent = send && ServoLink::from_config(&config.servo).send_angle(percentage);
            out.emit(
                &serde_json::json!({ "percentage": percentage, "angle": angle, "sent": sent }),
                |_| println!("{percentage}% -> {angle}°"),
            )?;
            if send && !sent {
                return Err("servo is not available; enable servo.enabled and build with --features serial".into());
            }
        }
    }
    Ok(())
}
