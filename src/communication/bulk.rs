//! Bulk
//!
//! Raw byte transfers to the bulk endpoints of one opened device.
//!

use std::time::Duration;

use crate::error::Error;
use crate::init;
use crate::types::{DeviceId, DeviceModel, Endpoints};

use anyhow::Result;
use rusb::{Context, DeviceHandle};
use tracing::{debug, trace, warn};

/// ### Transport
///
/// Byte-oriented access to the bulk OUT / bulk IN endpoint pair of a single device.
///
pub trait Transport {
    /// Blocking write of `payload` to the bulk OUT endpoint, bounded by `timeout`.
    /// Returns the bytes written.
    fn write_bytes(&mut self, payload: &[u8], timeout: Duration) -> Result<usize>;

    /// Blocking read of at most `max_length` bytes from the bulk IN endpoint.
    ///
    /// A read that sees no data within `timeout` fails with [`Error::Timeout`], any other
    /// fault is returned as-is.
    fn read_bytes(&mut self, max_length: usize, timeout: Duration) -> Result<Vec<u8>>;

    /// Release the device. Transfers after this fail with [`Error::NotConnected`].
    fn close(&mut self) -> Result<()>;
}

/// ### Bus
///
/// Where transports come from.
///
pub trait Bus {
    type Transport: Transport;

    /// Open and configure the device identified by `id`.
    fn open(&mut self, id: DeviceId) -> Result<Self::Transport>;
}

/// ### USB Bus
///
/// The host's USB devices, through a libusb context.
///
pub struct UsbBus {
    context: Context,
}

impl UsbBus {
    pub fn new() -> Result<UsbBus> {
        Ok(UsbBus {
            context: Context::new()?,
        })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }
}

impl Bus for UsbBus {
    type Transport = UsbTransport;

    fn open(&mut self, id: DeviceId) -> Result<UsbTransport> {
        UsbTransport::open(&self.context, id)
    }
}

/// ### USB Transport
///
/// An opened, configured device with its interface claimed. The interface is released
/// (and the kernel driver given back) by [`Transport::close`] or on drop, whichever
/// comes first.
///
#[derive(Debug)]
pub struct UsbTransport {
    handle: DeviceHandle<Context>,
    endpoints: Endpoints,
    has_kernel_driver: bool,
    claimed: bool,
    closed: bool,
}

impl UsbTransport {
    /// ### Open
    ///
    /// Find the device, apply its default configuration and claim the bulk interface.
    ///
    /// #### Arguments
    /// - `context` -> the libusb context to search
    /// - `id` -> the USB identifiers of the device
    ///
    pub fn open(context: &Context, id: DeviceId) -> Result<UsbTransport> {
        let (device, handle) = init::open_device(context, id)?;
        let endpoints = DeviceModel::lookup(id).endpoints;

        // from here on, an early return drops `transport` and undoes what was done so far
        let mut transport = UsbTransport {
            handle,
            endpoints,
            has_kernel_driver: false,
            claimed: false,
            closed: false,
        };

        transport.has_kernel_driver =
            init::detach_kernel_driver(&mut transport.handle, endpoints.interface_number)?;

        let config_number = init::default_configuration(&device)?;
        transport.handle.set_active_configuration(config_number)?;
        transport.handle.claim_interface(endpoints.interface_number)?;
        transport.claimed = true;

        debug!(
            "configuration {} active, interface {} claimed",
            config_number, endpoints.interface_number
        );

        Ok(transport)
    }

    fn release(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let interface = self.endpoints.interface_number;
        let released = match self.claimed {
            true => self.handle.release_interface(interface),
            false => Ok(()),
        };
        let reattached = match self.has_kernel_driver {
            true => self.handle.attach_kernel_driver(interface),
            false => Ok(()),
        };

        released?;
        reattached?;
        Ok(())
    }
}

impl Transport for UsbTransport {
    fn write_bytes(&mut self, payload: &[u8], timeout: Duration) -> Result<usize> {
        if self.closed {
            return Err(Error::NotConnected.into());
        }

        // a write timeout stays a rusb::Error, only read timeouts mean "no response"
        let written = self
            .handle
            .write_bulk(self.endpoints.bulk_out, payload, timeout)?;
        trace!("wrote {} of {} bytes", written, payload.len());

        Ok(written)
    }

    fn read_bytes(&mut self, max_length: usize, timeout: Duration) -> Result<Vec<u8>> {
        if self.closed {
            return Err(Error::NotConnected.into());
        }

        let mut buffer = vec![0x00; max_length];
        match self
            .handle
            .read_bulk(self.endpoints.bulk_in, &mut buffer, timeout)
        {
            Ok(bytes_read) => {
                trace!("read {} bytes", bytes_read);
                buffer.truncate(bytes_read);
                Ok(buffer)
            }
            Err(rusb::Error::Timeout) => Err(Error::Timeout.into()),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.release()
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("failed to release usb device: {}", e);
        }
    }
}
