//! Real-time playback of the demo patch.

use super::common::{driver_config, load_config, parse_frequency, stream_config};
use crate::patch::DemoPatch;
use clap::Args;
use partita_core::AudioProcessor;
use partita_io::{CpalBackend, DeviceOutput, ThreadedDriver};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

const STATUS_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Args)]
pub struct PlayArgs {
    /// Engine configuration file (defaults to the user config, if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Oscillator frequency in Hz
    #[arg(short, long, default_value = "540", value_parser = parse_frequency)]
    frequency: f32,

    /// Mixer master gain
    #[arg(long, default_value = "1.0")]
    gain: f32,

    /// Threads running module tasks (overrides [engine] threads)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Driver latency in samples (overrides [driver] latency_samples)
    #[arg(long)]
    latency: Option<usize>,

    /// Driver tick interval in milliseconds (overrides [driver] update_interval_ms)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Output device (index, exact name, or partial name)
    #[arg(short, long)]
    output_device: Option<String>,

    /// Sample rate in Hz (overrides [output] sample_rate)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Device buffer size in frames (overrides [output] buffer_size)
    #[arg(long)]
    buffer_size: Option<u32>,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    seconds: Option<f32>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(threads) = args.threads {
        config.engine.threads = threads;
    }
    if let Some(latency) = args.latency {
        config.driver.latency_samples = latency;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.driver.update_interval_ms = interval_ms;
    }
    if let Some(device) = args.output_device {
        config.output.device = Some(device);
    }
    if let Some(sample_rate) = args.sample_rate {
        config.output.sample_rate = sample_rate;
    }
    if let Some(buffer_size) = args.buffer_size {
        config.output.buffer_size = buffer_size;
    }
    config.validate()?;

    let backend = CpalBackend::new();
    let output = DeviceOutput::open(&backend, &stream_config(&config))?;
    let sample_rate = output.sample_rate();

    let underflows = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&underflows);
    output.queue().set_underflow_callback(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let processor = AudioProcessor::with_threads(config.engine.threads)?;
    let patch = DemoPatch::build(&processor.editor(), args.frequency, sample_rate, output.queue());
    patch.master.set(args.gain);

    let driver_config = driver_config(&config);

    println!("=== Partita ===");
    println!("Sample Rate: {sample_rate}");
    println!("Channels: {}", output.channels());
    println!("Device Latency: {}", output.latency_samples());
    println!("Driver Latency: {}", driver_config.latency_samples);
    println!("Threads: {}", config.engine.threads);
    println!(
        "Patch: {} + {} -> {} -> {}",
        patch.sine, patch.square, patch.mixer, patch.output
    );
    println!("\nPlaying {} Hz... Press Ctrl+C to stop.\n", args.frequency);

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let driver = ThreadedDriver::start(processor, output.queue(), sample_rate, driver_config)?;

    let deadline = args
        .seconds
        .map(|s| Instant::now() + Duration::from_secs_f32(s.max(0.0)));
    let mut stdout = std::io::stdout();
    while running.load(Ordering::SeqCst) && driver.is_running() {
        print!(
            "\rSamples Buffered: {}, Underflows: {}",
            output.samples_buffered(),
            underflows.load(Ordering::Relaxed)
        );
        stdout.flush()?;

        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        std::thread::sleep(STATUS_INTERVAL);
    }

    let blocks = driver.blocks_rendered();
    let samples = driver.samples_rendered();
    let processor = driver.finish();
    drop(output);

    println!("\n\nStopped.");
    println!(
        "Rendered {samples} samples in {blocks} blocks ({} rejected routes)",
        processor.rejected_routes()
    );
    println!("Underflows: {}", underflows.load(Ordering::Relaxed));
    Ok(())
}
