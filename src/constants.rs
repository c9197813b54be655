//! ## Constants
//!
//! Various constants used throughout the project.
//!

pub mod usb {
    /// Vendor identifier reported by the OWON AG051
    pub const AG051_VENDOR_ID: u16 = 0x5345;
    /// Product identifier reported by the OWON AG051
    pub const AG051_PRODUCT_ID: u16 = 0x1234;
    /// Interface carrying the bulk endpoints on the AG051
    pub const AG051_INTERFACE: u8 = 0;
    /// Fixed BULK OUT endpoint of the AG051
    pub const AG051_BULK_OUT_EP: u8 = 0x03;
    /// Fixed BULK IN endpoint of the AG051
    pub const AG051_BULK_IN_EP: u8 = 0x81;
}

pub mod misc {
    use std::time::Duration;

    /// The default read timeout
    pub const DEFAULT_TIMEOUT_DURATION: Duration = Duration::from_millis(1000);
    /// Pause after every fire-and-forget command
    pub const COMMAND_SETTLE_DELAY: Duration = Duration::from_millis(50);
    /// Pause after `*RST`, the instrument needs longer to recover from a reset
    pub const RESET_SETTLE_DELAY: Duration = Duration::from_millis(500);
    /// Largest response read in a single bulk IN transfer
    pub const READ_BUFFER_SIZE: usize = 4096;
    /// Line terminator appended to every command
    pub const TERM_CHAR: u8 = b'\r';
}
