//! ## Types
//!
//! The different types used across the crate
//!

use std::time::Duration;

use crate::constants::{misc, usb};

/// ### Device ID
///
/// The USB identifiers of a device.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    /// Vendor ID (idVendor)
    pub vendor_id: u16,
    /// Product ID (idProduct)
    pub product_id: u16,
}

impl DeviceId {
    pub const fn new(vendor_id: u16, product_id: u16) -> DeviceId {
        DeviceId {
            vendor_id,
            product_id,
        }
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        AG051.id
    }
}

impl From<(u16, u16)> for DeviceId {
    fn from((vendor_id, product_id): (u16, u16)) -> Self {
        DeviceId::new(vendor_id, product_id)
    }
}

/// ### Device Address
///
/// Where a device is attached on the host.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddr {
    /// USB bus number
    pub bus: u8,
    /// Device address on the bus
    pub device: u8,
}

/// ### Device Info
///
/// An attached device, as returned by the device listing.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub address: DeviceAddr,
    /// Name of the matching entry in [`MODELS`]
    pub model: &'static str,
}

/// ### Endpoints
///
/// The fixed USB layout of one device model. These are not read from the descriptors.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    /// Interface holding both bulk endpoints
    pub interface_number: u8,
    /// BULK OUT endpoint address, commands go here
    pub bulk_out: u8,
    /// BULK IN endpoint address, responses come from here
    pub bulk_in: u8,
}

/// ### Device Model
///
/// One entry of the supported device table.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceModel {
    pub name: &'static str,
    pub id: DeviceId,
    pub endpoints: Endpoints,
}

pub const AG051: DeviceModel = DeviceModel {
    name: "OWON AG051",
    id: DeviceId::new(usb::AG051_VENDOR_ID, usb::AG051_PRODUCT_ID),
    endpoints: Endpoints {
        interface_number: usb::AG051_INTERFACE,
        bulk_out: usb::AG051_BULK_OUT_EP,
        bulk_in: usb::AG051_BULK_IN_EP,
    },
};

/// Supported device models, keyed by their USB identifiers.
pub const MODELS: &[DeviceModel] = &[AG051];

impl DeviceModel {
    /// ### Lookup
    ///
    /// Find the model registered for `id`.
    ///
    pub fn find(id: DeviceId) -> Option<&'static DeviceModel> {
        MODELS.iter().find(|model| model.id == id)
    }

    /// ### Lookup or default
    ///
    /// Identifiers can be overridden by the caller, in which case the device is
    /// assumed to share the AG051 endpoint layout.
    ///
    pub fn lookup(id: DeviceId) -> &'static DeviceModel {
        DeviceModel::find(id).unwrap_or(&AG051)
    }
}

/// ### Connection State
///
/// A controller only exists once the device has been opened, so the disconnected
/// state is the absence of a controller.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Closed,
}

/// ### Config
///
/// Everything fixed at controller construction.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Identifiers of the device to open
    pub device: DeviceId,
    /// Read timeout applied to every query
    pub timeout: Duration,
    /// Pause after each fire-and-forget command
    pub command_delay: Duration,
    /// Pause after a reset
    pub reset_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: DeviceId::default(),
            timeout: misc::DEFAULT_TIMEOUT_DURATION,
            command_delay: misc::COMMAND_SETTLE_DELAY,
            reset_delay: misc::RESET_SETTLE_DELAY,
        }
    }
}

impl Config {
    pub fn with_device(mut self, device: impl Into<DeviceId>) -> Self {
        self.device = device.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_command_delay(mut self, delay: Duration) -> Self {
        self.command_delay = delay;
        self
    }

    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }
}
