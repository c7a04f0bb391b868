//! Integration tests for partita-io: graph to queue to device callback, the
//! threaded driver keeping a queue topped up, and WAV export of rendered blocks.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use partita_core::{AudioProcessor, Module, ModuleInputs};
use partita_io::{
    AudioBackend, AudioDevice, BackendStreamConfig, DeviceOutput, DriverConfig, ErrorCallback,
    OutputCallback, OutputModule, OutputQueue, Result, StreamHandle, ThreadedDriver, WavSpec,
    read_wav, write_wav,
};
use tempfile::NamedTempFile;

/// Emits a running sample counter.
struct Counter(f32);

impl Module for Counter {
    fn commit(&mut self) {}

    fn sample(&mut self, _inputs: &ModuleInputs<'_>, output: &mut [f32]) {
        for out in output.iter_mut() {
            *out = self.0;
            self.0 += 1.0;
        }
    }
}

/// Backend whose "device" is driven by the test.
#[derive(Default, Clone)]
struct ManualBackend {
    callback: Arc<Mutex<Option<OutputCallback>>>,
}

impl ManualBackend {
    fn pull(&self, buffer: &mut [f32]) {
        if let Some(callback) = self.callback.lock().as_mut() {
            callback(buffer);
        }
    }
}

impl AudioBackend for ManualBackend {
    fn name(&self) -> &str {
        "manual"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        Ok(vec![AudioDevice {
            index: 0,
            name: "Manual".to_string(),
            default_sample_rate: 48000,
            channels: 2,
        }])
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        Ok(self.list_devices()?.into_iter().next())
    }

    fn build_output_stream(
        &self,
        _config: &BackendStreamConfig,
        callback: OutputCallback,
        _error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        *self.callback.lock() = Some(callback);
        Ok(StreamHandle::new(()))
    }
}

// ---------------------------------------------------------------------------
// Graph -> device
// ---------------------------------------------------------------------------

#[test]
fn rendered_blocks_reach_device_in_order() {
    let backend = ManualBackend::default();
    let output = DeviceOutput::open(&backend, &BackendStreamConfig::default()).unwrap();

    let mut processor = AudioProcessor::with_threads(2).unwrap();
    let counter = processor.add_module(Box::new(Counter(0.0)));
    let sink = processor.add_module(Box::new(OutputModule::new(output.queue())));
    processor.route(counter).to(sink);

    processor.update(32);
    processor.update(32);
    assert_eq!(output.samples_buffered(), 64);

    let mut device = vec![0.0; 2 * 48];
    backend.pull(&mut device);
    for frame in 0..48 {
        assert_eq!(device[2 * frame], frame as f32);
        assert_eq!(device[2 * frame + 1], frame as f32);
    }
    assert_eq!(output.samples_buffered(), 16);
    assert_eq!(output.underflow_count(), 0);
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

#[test]
fn driver_tops_queue_up_to_latency_target() {
    let queue = OutputQueue::new();
    let mut processor = AudioProcessor::new();
    let counter = processor.add_module(Box::new(Counter(0.0)));
    let sink = processor.add_module(Box::new(OutputModule::new(queue.clone())));
    processor.route(counter).to(sink);

    let config = DriverConfig {
        update_interval: Duration::from_millis(5),
        latency_samples: 256,
        min_block: 0,
        max_block: 8192,
    };
    let target = config.block_for(48000, 0);
    let driver = ThreadedDriver::start(processor, queue.clone(), 48000, config).unwrap();
    std::thread::sleep(Duration::from_millis(60));
    let processor = driver.finish();

    // Nothing consumed: the first tick fills the target, later ticks skip.
    assert_eq!(queue.samples_buffered(), target);
    assert_eq!(processor.blocks_processed(), 1);
}

#[test]
fn graph_edits_apply_while_driver_runs() {
    let queue = OutputQueue::new();
    let processor = AudioProcessor::new();
    let editor = processor.editor();

    let driver = ThreadedDriver::start(
        processor,
        queue.clone(),
        48000,
        DriverConfig {
            update_interval: Duration::from_millis(2),
            ..DriverConfig::default()
        },
    )
    .unwrap();

    let counter = editor.add_module(Box::new(Counter(0.0)));
    let sink = editor.add_module(Box::new(OutputModule::new(queue.clone())));
    editor.route(counter).to(sink);
    std::thread::sleep(Duration::from_millis(40));

    let processor = driver.finish();
    assert!(processor.contains(counter));
    assert_eq!(processor.input(sink, 0), Some(counter));
}

// ---------------------------------------------------------------------------
// WAV export
// ---------------------------------------------------------------------------

#[test]
fn offline_render_to_wav() {
    let queue = OutputQueue::new();
    let mut processor = AudioProcessor::with_threads(2).unwrap();
    let counter = processor.add_module(Box::new(Counter(0.0)));
    let sink = processor.add_module(Box::new(OutputModule::new(queue.clone())));
    processor.route(counter).to(sink);

    for _ in 0..4 {
        processor.update(100);
    }
    let mut rendered = vec![0.0; queue.samples_buffered()];
    queue.fill(&mut rendered);
    let rendered: Vec<f32> = rendered.iter().map(|x| x / 1000.0).collect();

    let file = NamedTempFile::new().unwrap();
    let spec = WavSpec::default();
    write_wav(file.path(), &rendered, spec).unwrap();

    let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
    assert_eq!(loaded_spec, spec);
    assert_eq!(loaded, rendered);
}

#[test]
fn wav_24_bit_roundtrip_within_quantization() {
    let samples: Vec<f32> = (0..480)
        .map(|i| (i as f32 * 0.05).sin() * 0.8)
        .collect();
    let spec = WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 24,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &samples, spec).unwrap();
    let (loaded, loaded_spec) = read_wav(file.path()).unwrap();

    assert_eq!(loaded_spec.channels, 2);
    assert_eq!(loaded.len(), samples.len());
    for (a, b) in samples.iter().zip(&loaded) {
        assert!((a - b).abs() < 1e-6, "{a} vs {b}");
    }
}
