//! ## Initialization
//!
//! A set of functions to help initialize a connection to the device.
//!

use crate::{
    error::Error,
    types::{DeviceAddr, DeviceId, DeviceInfo, DeviceModel},
};

use anyhow::Result;
use rusb::{Device, DeviceDescriptor, DeviceHandle, UsbContext};
use tracing::{debug, info};

fn device_id(device_desc: &DeviceDescriptor) -> DeviceId {
    DeviceId::new(device_desc.vendor_id(), device_desc.product_id())
}

/// ### List Devices
///
/// List all attached devices matching a known device model.
///
pub fn list_devices<T: UsbContext>(context: &T) -> Result<Vec<DeviceInfo>> {
    Ok(context
        .devices()?
        .iter()
        .filter_map(|device| {
            let device_desc = device.device_descriptor().ok()?;
            let model = DeviceModel::find(device_id(&device_desc))?;
            Some(DeviceInfo {
                id: model.id,
                address: DeviceAddr {
                    bus: device.bus_number(),
                    device: device.address(),
                },
                model: model.name,
            })
        })
        .collect())
}

/// ### Open Device
///
/// Open the first attached device reporting `id`.
///
/// Fails with [`Error::DeviceNotFound`] when nothing matches. Errors while opening a
/// matching device (permissions, for instance) are propagated as they are.
///
pub fn open_device<T: UsbContext>(
    context: &T,
    id: DeviceId,
) -> Result<(Device<T>, DeviceHandle<T>)> {
    info!(
        "searching for device {:04x}:{:04x}",
        id.vendor_id, id.product_id
    );

    for device in context.devices()?.iter() {
        let Ok(device_desc) = device.device_descriptor() else {
            continue;
        };
        if device_id(&device_desc) != id {
            continue;
        }

        info!(
            "found device on bus {} address {}",
            device.bus_number(),
            device.address()
        );
        let handle = device.open()?;
        return Ok((device, handle));
    }

    Err(Error::DeviceNotFound {
        vendor_id: id.vendor_id,
        product_id: id.product_id,
    }
    .into())
}

/// ### Default Configuration
///
/// The configuration value of the first configuration descriptor, which is what the
/// device is put in when no specific configuration is requested.
///
pub fn default_configuration<T: UsbContext>(device: &Device<T>) -> Result<u8> {
    Ok(device.config_descriptor(0)?.number())
}

/// ### Detach Kernel Driver
///
/// If the interface uses a kernel driver, detach it for the duration of the connection.
/// Returns whether a driver was detached and must be reattached on release.
///
pub fn detach_kernel_driver<T: UsbContext>(
    handle: &mut DeviceHandle<T>,
    interface_number: u8,
) -> Result<bool> {
    match handle.kernel_driver_active(interface_number) {
        Ok(true) => {
            debug!("detaching kernel driver from interface {}", interface_number);
            handle.detach_kernel_driver(interface_number)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}
