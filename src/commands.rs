//! ## Commands
//!
//! The SCPI vocabulary understood by the AG051. Parameters are interpolated as plain
//! decimal text and never validated; the instrument decides what it accepts.
//!

/// Identity query
pub const IDENTIFY: &str = "*IDN?";
/// Reset to the power-on state
pub const RESET: &str = "*RST";
/// Enable the output channel
pub const OUTPUT_ON: &str = ":CHANnel ON";
/// Disable the output channel
pub const OUTPUT_OFF: &str = ":CHANnel OFF";

/// `:FUNCtion {shape}`
pub fn function(shape: &str) -> String {
    format!(":FUNCtion {}", shape)
}

/// `:FUNCtion:FREQuency {hz}`
pub fn frequency(hz: f64) -> String {
    format!(":FUNCtion:FREQuency {}", decimal(hz))
}

/// `:FUNCtion:AMPLitude {vpp}`
pub fn amplitude(vpp: f64) -> String {
    format!(":FUNCtion:AMPLitude {}", decimal(vpp))
}

/// `:FUNCtion:OFFSet {volts}`
pub fn offset(volts: f64) -> String {
    format!(":FUNCtion:OFFSet {}", decimal(volts))
}

/// ### Decimal
///
/// Format a number the way the instrument expects it: whole values keep a single
/// fractional digit (`1000.0`), everything else uses the shortest exact representation.
/// Not-a-number is written `nan`.
///
pub fn decimal(value: f64) -> String {
    if value.is_nan() {
        String::from("nan")
    } else if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
