//! Serial transport to the gauge board.
//!
//! The board reads one byte per message: the target angle. Every call opens
//! the port, writes and closes it again, so the board can be unplugged and
//! replugged between sends. Without the `serial` feature every operation
//! reports the transport as unsupported.

use std::time::Duration;

use super::ServoError;

/// Default serial speed of the gauge sketch.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Angle written by [`test_connection`]: needle to the middle.
pub const TEST_ANGLE: u8 = 90;

#[cfg(feature = "serial")]
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);
const TEST_HOLD: Duration = Duration::from_millis(500);

/// A servo on a serial port, addressed by name (`COM9`, `/dev/ttyACM0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialServo {
    port: String,
    baud_rate: u32,
}

impl SerialServo {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Open, write one angle byte, close.
    ///
    /// # Errors
    /// Any failure opening or writing the port.
    pub fn write_angle(&self, angle: u8) -> Result<(), ServoError> {
        self.write_angle_with(angle, Duration::ZERO, Duration::ZERO)
    }

    #[cfg(feature = "serial")]
    fn write_angle_with(
        &self,
        angle: u8,
        settle: Duration,
        hold: Duration,
    ) -> Result<(), ServoError> {
        use std::io::Write;

        let mut port = serialport::new(self.port.as_str(), self.baud_rate)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| ServoError::Open {
                port: self.port.clone(),
                message: e.to_string(),
            })?;
        if !settle.is_zero() {
            std::thread::sleep(settle);
        }
        port.write_all(&[angle]).map_err(ServoError::Write)?;
        port.flush().map_err(ServoError::Write)?;
        if !hold.is_zero() {
            std::thread::sleep(hold);
        }
        Ok(())
    }

    #[cfg(not(feature = "serial"))]
    fn write_angle_with(
        &self,
        _angle: u8,
        _settle: Duration,
        _hold: Duration,
    ) -> Result<(), ServoError> {
        Err(ServoError::Unsupported)
    }
}

/// Serial port names present on this machine, or `fallback` when none can be
/// enumerated.
pub fn list_ports(fallback: &[String]) -> Vec<String> {
    let found = enumerate_ports();
    if found.is_empty() {
        fallback.to_vec()
    } else {
        found
    }
}

#[cfg(feature = "serial")]
fn enumerate_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "serial port enumeration failed");
            Vec::new()
        }
    }
}

#[cfg(not(feature = "serial"))]
fn enumerate_ports() -> Vec<String> {
    Vec::new()
}

/// Open the port, wait for the board to boot, centre the needle.
///
/// Returns whether it worked and a message for the user. Never fails.
pub fn test_connection(port: &str, baud_rate: u32, settle: Duration) -> (bool, String) {
    let servo = SerialServo::new(port, baud_rate);
    match servo.write_angle_with(TEST_ANGLE, settle, TEST_HOLD) {
        Ok(()) => {
            tracing::info!(port, "servo responded");
            (true, format!("Servo connected on {port}, needle moved to {TEST_ANGLE}°"))
        }
        Err(e) => {
            tracing::warn!(port, error = %e, "servo connection test failed");
            (false, format!("Connection failed: {e}"))
        }
    }
}
