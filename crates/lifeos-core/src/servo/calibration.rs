//! Percentage to gauge-needle angle.
//!
//! The gauge face is not linear, so the mapping is a measured table of
//! `(percentage, angle)` breakpoints with straight lines in between.

/// Measured breakpoints, ascending by percentage.
pub const CALIBRATION_TABLE: [(f64, f64); 13] = [
    (0.0, 180.0),
    (5.0, 180.0),
    (6.0, 179.0),
    (10.0, 175.0),
    (13.0, 170.0),
    (20.0, 160.0),
    (30.0, 135.0),
    (50.0, 90.0),
    (70.0, 45.0),
    (73.0, 40.0),
    (80.0, 30.0),
    (85.0, 20.0),
    (100.0, 0.0),
];

/// Angle used when a percentage falls outside every bracket (only NaN can).
pub const FALLBACK_ANGLE: u8 = 90;

/// Servo angle, 0..=180, for a remaining-time percentage.
///
/// The percentage is clamped to 0..=100. The first bracket
/// `p1 <= p <= p2` wins; the interpolated angle is truncated.
pub fn angle(percentage: f64) -> u8 {
    let p = percentage.clamp(0.0, 100.0);

    for pair in CALIBRATION_TABLE.windows(2) {
        let (p1, a1) = pair[0];
        let (p2, a2) = pair[1];
        if p1 <= p && p <= p2 {
            if p2 == p1 {
                return to_degrees(a1);
            }
            let ratio = (p - p1) / (p2 - p1);
            return to_degrees(a1 + ratio * (a2 - a1));
        }
    }
    FALLBACK_ANGLE
}

fn to_degrees(value: f64) -> u8 {
    // Saturating float-to-int cast truncates toward zero.
    value.clamp(0.0, 180.0) as u8
}
