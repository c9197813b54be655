//! SCPI
//!
//! Carriage-return terminated text commands over a [`Transport`].
//!

use std::thread;
use std::time::Duration;

use crate::communication::bulk::Transport;
use crate::constants::misc;
use crate::error::Error;

use anyhow::Result;
use tracing::debug;

/// ### SCPI Channel
///
/// The command/response protocol of the instrument. There is no acknowledgement: sends
/// are paced with a fixed delay, queries by their blocking read.
///
#[derive(Debug)]
pub struct ScpiChannel<T: Transport> {
    transport: T,
    timeout: Duration,
    command_delay: Duration,
}

impl<T: Transport> ScpiChannel<T> {
    /// ### New
    ///
    /// #### Arguments
    /// - `transport` -> the opened device
    /// - `timeout` -> bound on every write, and on the read of every query
    /// - `command_delay` -> pause after each [`ScpiChannel::send`]
    ///
    pub fn new(transport: T, timeout: Duration, command_delay: Duration) -> ScpiChannel<T> {
        ScpiChannel {
            transport,
            timeout,
            command_delay,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn write_command(&mut self, cmd: &str) -> Result<()> {
        debug!("-> {}", cmd);

        let mut payload = Vec::with_capacity(cmd.len() + 1);
        payload.extend_from_slice(cmd.as_bytes());
        payload.push(misc::TERM_CHAR);

        self.transport.write_bytes(&payload, self.timeout)?;
        Ok(())
    }

    /// ### Send
    ///
    /// Send a command that has no response, then wait for the command delay.
    ///
    pub fn send(&mut self, cmd: &str) -> Result<()> {
        self.write_command(cmd)?;
        thread::sleep(self.command_delay);
        Ok(())
    }

    /// ### Query Raw Strict
    ///
    /// Send a command and read one response, undecoded. A read timeout is an
    /// [`Error::Timeout`].
    ///
    pub fn query_raw_strict(&mut self, cmd: &str) -> Result<Vec<u8>> {
        self.write_command(cmd)?;
        let resp = self
            .transport
            .read_bytes(misc::READ_BUFFER_SIZE, self.timeout)?;
        Ok(resp)
    }

    /// ### Query Raw
    ///
    /// Send a command and read one response, undecoded. Nothing arriving before the
    /// timeout gives an empty response.
    ///
    pub fn query_raw(&mut self, cmd: &str) -> Result<Vec<u8>> {
        match self.query_raw_strict(cmd) {
            Err(e) if is_timeout(&e) => Ok(Vec::new()),
            other => other,
        }
    }

    /// ### Query
    ///
    /// Send a command and return the response as trimmed text.
    ///
    /// Many commands legitimately answer nothing, so a read timeout returns an empty
    /// string. Other faults are still errors.
    ///
    pub fn query(&mut self, cmd: &str) -> Result<String> {
        let resp = decode_response(&self.query_raw(cmd)?);
        debug!("<- {}", resp);
        Ok(resp)
    }

    /// ### Query Strict
    ///
    /// Same as [`ScpiChannel::query`], but a read timeout is returned as [`Error::Timeout`]
    /// instead of an empty string.
    ///
    pub fn query_strict(&mut self, cmd: &str) -> Result<String> {
        let resp = decode_response(&self.query_raw_strict(cmd)?);
        debug!("<- {}", resp);
        Ok(resp)
    }

    /// Close the underlying transport.
    pub fn close(&mut self) -> Result<()> {
        self.transport.close()
    }
}

/// Whether `err` is a read timeout reported by a [`Transport`].
pub fn is_timeout(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<Error>(), Some(Error::Timeout))
}

/// ### Decode Response
///
/// UTF-8 text with undecodable sequences dropped, surrounding whitespace trimmed.
///
pub fn decode_response(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }

    String::from(text.trim())
}
