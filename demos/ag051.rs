//! Drive a connected AG051: reset, 1 kHz sine at 2 Vpp, then raise the amplitude.
//!
//! Run with `RUST_LOG=debug cargo run --example ag051` to see every command.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use owon_ag051::{Config, FunctionGenerator};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    for device in FunctionGenerator::devices()? {
        println!(
            "{} at bus {} address {}",
            device.model, device.address.bus, device.address.device
        );
    }

    // a missing device ends the program here with the error message
    let mut gen = FunctionGenerator::connect(Config::default())?;
    println!("Connected: {}", gen.identity());

    gen.reset()?;
    gen.configure_waveform("SINE", 1000.0, 2.0, 0.0)?;
    gen.output_on()?;

    thread::sleep(Duration::from_secs(2));

    gen.set_amplitude(4.0)?;
    thread::sleep(Duration::from_secs(2));

    gen.output_off()?;
    gen.close()
}
