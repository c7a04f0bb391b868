//! Output device listing.

use clap::Args;
use partita_io::{AudioBackend, CpalBackend};

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let backend = CpalBackend::new();
    let devices = backend.list_devices()?;
    let default = backend.default_output_device()?;

    if devices.is_empty() {
        println!("No output devices found.");
        return Ok(());
    }

    println!("Output Devices ({})", backend.name());
    println!("==============\n");
    for device in &devices {
        let marker = if default.as_ref().is_some_and(|d| d.name == device.name) {
            " (default)"
        } else {
            ""
        };
        println!(
            "  [{}] {} ({} Hz, {} ch){}",
            device.index, device.name, device.default_sample_rate, device.channels, marker
        );
    }

    println!();
    match default {
        Some(device) => println!("Default: {}", device.name),
        None => println!("Default: None"),
    }
    println!();
    println!("Tip: Use a device index or partial name with --output-device:");
    println!("  partita play --output-device 0");
    println!("  partita play --output-device \"USB\"");
    Ok(())
}
