//! # OWON AG051
//!
//! Host-side driver for the OWON AG051 USB function generator.
//!
//! SCPI text commands are written to the instrument's bulk OUT endpoint, terminated by a
//! carriage return, and short text responses are read back from its bulk IN endpoint.
//! Everything is blocking and in program order: a command is written, and either the
//! driver waits a fixed settle delay or it reads one response.
//!
//! ## Usage
//!
//! To use, add the following line to your project's Cargo.toml dependencies:
//! ```toml
//! owon-ag051 = "0.1"
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use owon_ag051::{Config, FunctionGenerator};
//!
//! fn main() -> anyhow::Result<()> {
//!     // connect to the device, this also reads its identity
//!     let mut gen = FunctionGenerator::connect(Config::default())?;
//!     println!("{}", gen.identity());
//!
//!     // 1 kHz sine, 2 Vpp, no offset
//!     gen.reset()?;
//!     gen.configure_waveform("SINE", 1000.0, 2.0, 0.0)?;
//!     gen.output_on()?;
//!
//!     gen.close()
//! }
//! ```
//!
//! Commands the device rejects are not detected, the instrument has no error query
//! wired up here.
//!

pub mod commands;
mod constants;
mod error;
mod init;
mod types;
pub mod communication {
    pub mod bulk;
    pub mod scpi;
}
#[cfg(test)]
mod testing;

pub use communication::bulk::{Bus, Transport, UsbBus, UsbTransport};
pub use communication::scpi::ScpiChannel;
pub use error::Error;
pub use types::{
    Config, ConnectionState, DeviceAddr, DeviceId, DeviceInfo, DeviceModel, Endpoints, AG051,
    MODELS,
};

use std::thread;

use anyhow::Result;
use tracing::info;

/// ### Function Generator
///
/// Controller connected to one function generator.
///
/// The device is released when the controller is closed or dropped.
///
#[derive(Debug)]
pub struct FunctionGenerator<T: Transport = UsbTransport> {
    channel: ScpiChannel<T>,
    config: Config,
    state: ConnectionState,
    identity: String,
}

impl FunctionGenerator<UsbTransport> {
    /// ### Devices
    ///
    /// Get a list of attached devices of a supported model
    ///
    pub fn devices() -> Result<Vec<DeviceInfo>> {
        let bus = UsbBus::new()?;
        init::list_devices(bus.context())
    }

    /// ### Connect
    ///
    /// Open the USB device named by `config` and read its identity.
    ///
    /// Fails with [`Error::DeviceNotFound`] if no attached device matches.
    ///
    pub fn connect(config: Config) -> Result<FunctionGenerator<UsbTransport>> {
        let mut bus = UsbBus::new()?;
        FunctionGenerator::connect_on(&mut bus, config)
    }
}

impl<T: Transport> FunctionGenerator<T> {
    /// ### Connect On
    ///
    /// Open the device named by `config` on `bus`, then send `*IDN?` as a sanity check.
    /// The answer is available from [`FunctionGenerator::identity`].
    ///
    /// If anything fails after the device was opened, the transport is dropped and the
    /// device released before the error is returned.
    ///
    pub fn connect_on<B>(bus: &mut B, config: Config) -> Result<FunctionGenerator<T>>
    where
        B: Bus<Transport = T>,
    {
        let transport = bus.open(config.device)?;
        let mut channel = ScpiChannel::new(transport, config.timeout, config.command_delay);

        let identity = channel.query(commands::IDENTIFY)?;
        info!("connected: {}", identity);

        Ok(FunctionGenerator {
            channel,
            config,
            state: ConnectionState::Connected,
            identity,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Identity string read at construction.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    fn channel(&mut self) -> Result<&mut ScpiChannel<T>> {
        match self.state {
            ConnectionState::Connected => Ok(&mut self.channel),
            ConnectionState::Closed => Err(Error::NotConnected.into()),
        }
    }

    /// ### Send
    ///
    /// Send an arbitrary command that has no response.
    ///
    pub fn send(&mut self, cmd: &str) -> Result<()> {
        self.channel()?.send(cmd)
    }

    /// ### Query
    ///
    /// Send an arbitrary command and read its response. Empty if nothing came back in
    /// time.
    ///
    pub fn query(&mut self, cmd: &str) -> Result<String> {
        self.channel()?.query(cmd)
    }

    /// ### Query Strict
    ///
    /// Like [`FunctionGenerator::query`], with a read timeout reported as [`Error::Timeout`].
    ///
    pub fn query_strict(&mut self, cmd: &str) -> Result<String> {
        self.channel()?.query_strict(cmd)
    }

    /// ### Reset
    ///
    /// Reset the instrument to its default state and wait for it to recover.
    ///
    pub fn reset(&mut self) -> Result<()> {
        self.channel()?.send(commands::RESET)?;
        thread::sleep(self.config.reset_delay);
        Ok(())
    }

    /// Set the waveform shape (`SINE`, `SQUare`, ...). The name is not checked.
    pub fn set_function(&mut self, shape: &str) -> Result<()> {
        self.send(&commands::function(shape))
    }

    /// Set the output frequency in Hz.
    pub fn set_frequency(&mut self, hz: f64) -> Result<()> {
        self.send(&commands::frequency(hz))
    }

    /// Set the amplitude in volts peak-to-peak.
    pub fn set_amplitude(&mut self, vpp: f64) -> Result<()> {
        self.send(&commands::amplitude(vpp))
    }

    /// Set the DC offset in volts.
    pub fn set_offset(&mut self, volts: f64) -> Result<()> {
        self.send(&commands::offset(volts))
    }

    pub fn output_on(&mut self) -> Result<()> {
        self.send(commands::OUTPUT_ON)
    }

    pub fn output_off(&mut self) -> Result<()> {
        self.send(commands::OUTPUT_OFF)
    }

    /// ### Configure Waveform
    ///
    /// Set shape, frequency, amplitude and offset, in that order.
    ///
    /// Each setting is its own command. If one fails, the ones before it stay applied
    /// and the rest are not sent.
    ///
    /// #### Arguments
    /// - `shape` -> waveform name, e.g. `SINE`
    /// - `hz` -> frequency in Hz
    /// - `vpp` -> amplitude in volts peak-to-peak
    /// - `volts` -> DC offset in volts
    ///
    pub fn configure_waveform(
        &mut self,
        shape: &str,
        hz: f64,
        vpp: f64,
        volts: f64,
    ) -> Result<()> {
        self.set_function(shape)?;
        self.set_frequency(hz)?;
        self.set_amplitude(vpp)?;
        self.set_offset(volts)?;
        Ok(())
    }

    /// ### Info
    ///
    /// Query the device identity and firmware version.
    ///
    pub fn info(&mut self) -> Result<String> {
        let identity = self.query(commands::IDENTIFY)?;
        info!("{}", identity);
        Ok(identity)
    }

    /// ### Close
    ///
    /// Release the device. Closing twice is a no-op; any other operation after closing
    /// fails with [`Error::NotConnected`].
    ///
    pub fn close(&mut self) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }
        self.state = ConnectionState::Closed;
        info!("closing connection");
        self.channel.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBus, MockTransport, Reply};
    use std::time::{Duration, Instant};

    const IDN: &[u8] = b"OWON,AG051,12345,1.0\r\n";

    fn fast_config() -> Config {
        Config::default()
            .with_command_delay(Duration::ZERO)
            .with_reset_delay(Duration::ZERO)
    }

    fn connected(transport: MockTransport, config: Config) -> FunctionGenerator<MockTransport> {
        let mut bus = MockBus::new(vec![config.device], transport);
        FunctionGenerator::connect_on(&mut bus, config).unwrap()
    }

    fn generator() -> FunctionGenerator<MockTransport> {
        connected(
            MockTransport::with_replies([Reply::Data(IDN.to_vec())]),
            fast_config(),
        )
    }

    fn commands_sent(gen: &FunctionGenerator<MockTransport>) -> Vec<String> {
        gen.channel.transport().commands()
    }

    #[test]
    fn connect_reads_identity() {
        let gen = generator();
        assert_eq!(gen.identity(), "OWON,AG051,12345,1.0");
        assert_eq!(gen.state(), ConnectionState::Connected);
        assert_eq!(commands_sent(&gen), vec!["*IDN?\r"]);
    }

    #[test]
    fn connect_tolerates_silent_device() {
        let gen = connected(MockTransport::with_replies([Reply::Timeout]), fast_config());
        assert_eq!(gen.identity(), "");
    }

    #[test]
    fn connect_releases_device_when_identity_query_fails() {
        let transport = MockTransport::default().failing_write(0);
        let released = transport.released.clone();
        let mut bus = MockBus::new(vec![DeviceId::default()], transport);

        let err = FunctionGenerator::connect_on(&mut bus, fast_config()).unwrap_err();
        assert_eq!(err.downcast_ref::<rusb::Error>(), Some(&rusb::Error::NoDevice));
        assert_eq!(bus.opened, 1);
        assert!(released.get());
    }

    #[test]
    fn connected_device_is_released_on_drop() {
        let transport = MockTransport::with_replies([Reply::Data(IDN.to_vec())]);
        let released = transport.released.clone();
        let gen = connected(transport, fast_config());

        assert!(!released.get());
        drop(gen);
        assert!(released.get());
    }

    #[test]
    fn connect_uses_configured_ids() {
        let config = fast_config().with_device((0x1111, 0x2222));
        let mut bus = MockBus::new(vec![DeviceId::new(0x1111, 0x2222)], MockTransport::default());
        let gen = FunctionGenerator::connect_on(&mut bus, config).unwrap();
        assert_eq!(bus.opened, 1);
        assert_eq!(gen.config().device, DeviceId::new(0x1111, 0x2222));
    }

    #[test]
    fn connect_without_matching_device_fails() {
        let mut bus = MockBus::new(vec![DeviceId::new(0x1111, 0x2222)], MockTransport::default());
        let err = FunctionGenerator::connect_on(&mut bus, fast_config()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::DeviceNotFound {
                vendor_id: 0x5345,
                product_id: 0x1234
            })
        ));
        assert_eq!(bus.opened, 0);
        let untouched = bus.transport.unwrap();
        assert!(untouched.writes.is_empty());
        assert!(untouched.reads.is_empty());
    }

    #[test]
    fn configure_waveform_sends_four_commands_in_order() {
        let mut gen = generator();
        gen.configure_waveform("SINE", 1000.0, 2.0, 0.0).unwrap();

        assert_eq!(
            commands_sent(&gen)[1..],
            [
                ":FUNCtion SINE\r",
                ":FUNCtion:FREQuency 1000.0\r",
                ":FUNCtion:AMPLitude 2.0\r",
                ":FUNCtion:OFFSet 0.0\r",
            ]
        );
        assert_eq!(gen.channel.transport().reads.len(), 1);
    }

    #[test]
    fn configure_waveform_stops_at_first_fault() {
        // write 0 is the identity query, write 2 is the frequency
        let transport = MockTransport::with_replies([Reply::Data(IDN.to_vec())]).failing_write(2);
        let mut gen = connected(transport, fast_config());

        let err = gen.configure_waveform("SQUare", 50.0, 1.5, 0.25).unwrap_err();
        assert_eq!(err.downcast_ref::<rusb::Error>(), Some(&rusb::Error::NoDevice));
        assert_eq!(commands_sent(&gen), vec!["*IDN?\r", ":FUNCtion SQUare\r"]);
    }

    #[test]
    fn single_settings() {
        let mut gen = generator();
        gen.set_function("RAMP").unwrap();
        gen.set_frequency(12.5).unwrap();
        gen.set_amplitude(4.0).unwrap();
        gen.set_offset(-1.0).unwrap();
        gen.output_on().unwrap();
        gen.output_off().unwrap();

        assert_eq!(
            commands_sent(&gen)[1..],
            [
                ":FUNCtion RAMP\r",
                ":FUNCtion:FREQuency 12.5\r",
                ":FUNCtion:AMPLitude 4.0\r",
                ":FUNCtion:OFFSet -1.0\r",
                ":CHANnel ON\r",
                ":CHANnel OFF\r",
            ]
        );
    }

    #[test]
    fn reset_waits_longer_than_send() {
        let mut gen = connected(
            MockTransport::with_replies([Reply::Data(IDN.to_vec())]),
            Config::default(),
        );

        let start = Instant::now();
        gen.output_off().unwrap();
        let send_elapsed = start.elapsed();

        let start = Instant::now();
        gen.reset().unwrap();
        let reset_elapsed = start.elapsed();

        assert!(send_elapsed >= Duration::from_millis(50));
        assert!(reset_elapsed >= Duration::from_millis(500));
        assert!(reset_elapsed > send_elapsed);
        assert_eq!(commands_sent(&gen).last().unwrap(), "*RST\r");
    }

    #[test]
    fn info_queries_identity() {
        let transport = MockTransport::with_replies([
            Reply::Data(IDN.to_vec()),
            Reply::Data(b"OWON,AG051,12345,1.1\n".to_vec()),
        ]);
        let mut gen = connected(transport, fast_config());
        assert_eq!(gen.info().unwrap(), "OWON,AG051,12345,1.1");
        assert_eq!(commands_sent(&gen), vec!["*IDN?\r", "*IDN?\r"]);
    }

    #[test]
    fn query_strict_reports_timeout() {
        let mut gen = generator();
        let err = gen.query_strict(":CHANnel ON").unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Timeout)));
        assert_eq!(gen.query(":CHANnel ON").unwrap(), "");
    }

    #[test]
    fn close_releases_once_and_blocks_further_use() {
        let mut gen = generator();
        gen.close().unwrap();
        gen.close().unwrap();

        assert_eq!(gen.state(), ConnectionState::Closed);
        assert!(gen.channel.transport().closed);

        let err = gen.output_on().unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotConnected)));
        assert!(gen.reset().is_err());
        assert_eq!(commands_sent(&gen), vec!["*IDN?\r"]);
    }
}
