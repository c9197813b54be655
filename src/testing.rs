//! Simulated devices for the unit tests.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;

use crate::communication::bulk::{Bus, Transport};
use crate::error::Error;
use crate::types::DeviceId;

/// What the simulated device does on the next read.
#[derive(Debug, Clone)]
pub enum Reply {
    Data(Vec<u8>),
    Timeout,
    /// Endpoint stall
    Fault,
}

#[derive(Debug, Default)]
pub struct MockTransport {
    pub writes: Vec<Vec<u8>>,
    pub write_timeouts: Vec<Duration>,
    pub reads: Vec<(usize, Duration)>,
    pub replies: VecDeque<Reply>,
    /// Index of the write that fails with a disconnect
    pub fail_write_at: Option<usize>,
    pub closed: bool,
    /// Set once the transport is closed or dropped, shared so it outlives the transport
    pub released: Rc<Cell<bool>>,
}

impl MockTransport {
    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> MockTransport {
        let mut transport = MockTransport::default();
        transport.replies = replies.into_iter().collect();
        transport
    }

    pub fn failing_write(mut self, index: usize) -> MockTransport {
        self.fail_write_at = Some(index);
        self
    }

    /// Every successful write, as text.
    pub fn commands(&self) -> Vec<String> {
        self.writes
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }
}

impl Transport for MockTransport {
    fn write_bytes(&mut self, payload: &[u8], timeout: Duration) -> Result<usize> {
        if self.closed {
            return Err(Error::NotConnected.into());
        }
        self.write_timeouts.push(timeout);
        if self.fail_write_at == Some(self.writes.len()) {
            return Err(rusb::Error::NoDevice.into());
        }
        self.writes.push(payload.to_vec());
        Ok(payload.len())
    }

    fn read_bytes(&mut self, max_length: usize, timeout: Duration) -> Result<Vec<u8>> {
        if self.closed {
            return Err(Error::NotConnected.into());
        }
        self.reads.push((max_length, timeout));
        match self.replies.pop_front() {
            Some(Reply::Data(mut bytes)) => {
                bytes.truncate(max_length);
                Ok(bytes)
            }
            Some(Reply::Fault) => Err(rusb::Error::Pipe.into()),
            Some(Reply::Timeout) | None => Err(Error::Timeout.into()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.released.set(true);
        Ok(())
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.released.set(true);
    }
}

/// A bus with a fixed set of attached devices, all served by one scripted transport.
#[derive(Debug, Default)]
pub struct MockBus {
    pub devices: Vec<DeviceId>,
    pub transport: Option<MockTransport>,
    pub opened: usize,
}

impl MockBus {
    pub fn new(devices: Vec<DeviceId>, transport: MockTransport) -> MockBus {
        MockBus {
            devices,
            transport: Some(transport),
            opened: 0,
        }
    }
}

impl Bus for MockBus {
    type Transport = MockTransport;

    fn open(&mut self, id: DeviceId) -> Result<MockTransport> {
        if !self.devices.contains(&id) {
            return Err(Error::DeviceNotFound {
                vendor_id: id.vendor_id,
                product_id: id.product_id,
            }
            .into());
        }
        self.opened += 1;
        Ok(self.transport.take().unwrap_or_default())
    }
}
