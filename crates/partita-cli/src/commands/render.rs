//! Offline rendering of the demo patch to a WAV file.

use super::common::{load_config, parse_frequency};
use crate::patch::DemoPatch;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use partita_core::AudioProcessor;
use partita_io::{OutputQueue, WavSpec, write_wav};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Duration in seconds
    #[arg(short, long, default_value = "2.0")]
    seconds: f32,

    /// Sample rate in Hz (defaults to [output] sample_rate)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Samples per block
    #[arg(short, long, default_value = "512")]
    block: usize,

    /// Threads running module tasks (defaults to [engine] threads)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Oscillator frequency in Hz
    #[arg(short, long, default_value = "540", value_parser = parse_frequency)]
    frequency: f32,

    /// Mixer master gain
    #[arg(long, default_value = "1.0")]
    gain: f32,

    /// Bits per sample: 32 writes float, 8/16/24 write integer PCM
    #[arg(long, default_value = "32")]
    bits: u16,

    /// Engine configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if args.block == 0 {
        anyhow::bail!("--block must be at least 1");
    }
    if !(args.seconds.is_finite() && args.seconds >= 0.0) {
        anyhow::bail!("--seconds must be a non-negative number");
    }

    let config = load_config(args.config.as_deref())?;
    let sample_rate = args.sample_rate.unwrap_or(config.output.sample_rate);
    if sample_rate == 0 {
        anyhow::bail!("--sample-rate must be greater than 0");
    }
    let threads = args.threads.unwrap_or(config.engine.threads);
    if threads == 0 {
        anyhow::bail!("--threads must be at least 1");
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: args.bits,
    };
    // Surface an unsupported depth before rendering anything.
    spec.validate()?;

    let mut processor = AudioProcessor::with_threads(threads)?;
    let queue = OutputQueue::new();
    let patch = DemoPatch::build(&processor.editor(), args.frequency, sample_rate, queue.clone());
    patch.master.set(args.gain);

    let total = (f64::from(args.seconds) * f64::from(sample_rate)).round() as usize;
    println!(
        "Rendering {total} samples at {sample_rate} Hz ({} threads, {}-sample blocks)...",
        threads, args.block
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut samples = vec![0.0; total];
    for chunk in samples.chunks_mut(args.block) {
        processor.update(chunk.len());
        let taken = queue.fill(chunk);
        debug_assert_eq!(taken, chunk.len());
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("done");

    write_wav(&args.output, &samples, spec)?;

    let peak = samples.iter().fold(0.0_f32, |m, x| m.max(x.abs()));
    println!(
        "Wrote {} ({} blocks, peak {:.3})",
        args.output.display(),
        processor.blocks_processed(),
        peak
    );
    Ok(())
}
