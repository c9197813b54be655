//! ## Errors
//!
//! The errors used throughout the crate.
//!
//! Transfer faults coming from libusb are not wrapped, they surface as [`rusb::Error`]
//! inside the returned [`anyhow::Error`].
//!

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "device {vendor_id:#06x}:{product_id:#06x} not found, check the USB connection and driver installation"
    )]
    DeviceNotFound { vendor_id: u16, product_id: u16 },
    #[error("no response from the device before the timeout")]
    Timeout,
    #[error("connection to the device is closed")]
    NotConnected,
}
