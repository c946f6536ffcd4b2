//! Optional servo gauge that mirrors the focus countdown.
//!
//! The timer talks to the gauge only through [`Servo::send_angle`], which
//! answers with a `bool`. Whether a gauge exists is decided once, when the
//! [`ServoLink`] is built from configuration; nothing downstream probes for it.

mod calibration;
mod serial;

pub use calibration::{angle, CALIBRATION_TABLE, FALLBACK_ANGLE};
pub use serial::{list_ports, test_connection, SerialServo, DEFAULT_BAUD_RATE, TEST_ANGLE};

use thiserror::Error;

use crate::storage::ServoConfig;

/// Failures talking to the gauge. These stay inside this module.
#[derive(Error, Debug)]
pub enum ServoError {
    #[error("serial support is not built in (enable the `serial` feature)")]
    Unsupported,

    #[error("cannot open {port}: {message}")]
    Open { port: String, message: String },

    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),
}

/// Best-effort sink for the remaining-time percentage.
pub trait Servo {
    /// Move the needle for `percentage` (0..=100) of time remaining.
    /// Returns whether the angle reached the device.
    fn send_angle(&self, percentage: f64) -> bool;

    /// Whether a device is configured at all.
    fn is_available(&self) -> bool;
}

/// The gauge as configured at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServoLink {
    Available(SerialServo),
    Unavailable,
}

impl ServoLink {
    /// `Available` when the gauge is enabled in config and serial support is
    /// compiled in.
    pub fn from_config(config: &ServoConfig) -> Self {
        if config.enabled && cfg!(feature = "serial") {
            ServoLink::Available(SerialServo::new(&config.port, config.baud_rate))
        } else {
            ServoLink::Unavailable
        }
    }
}

impl Servo for ServoLink {
    fn send_angle(&self, percentage: f64) -> bool {
        match self {
            ServoLink::Available(servo) => {
                let target = angle(percentage);
                match servo.write_angle(target) {
                    Ok(()) => {
                        tracing::trace!(port = servo.port(), percentage, angle = target, "servo moved");
                        true
                    }
                    Err(e) => {
                        tracing::warn!(port = servo.port(), error = %e, "servo send failed");
                        false
                    }
                }
            }
            ServoLink::Unavailable => false,
        }
    }

    fn is_available(&self) -> bool {
        matches!(self, ServoLink::Available(_))
    }
}
