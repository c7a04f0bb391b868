//! Partita Core - dependency-aware audio graph executor
//!
//! This crate renders a graph of audio modules block by block, spreading each
//! block across a fixed pool of worker threads while honoring the data
//! dependencies between modules.
//!
//! # Core Abstractions
//!
//! ## Modules
//!
//! - [`Module`] - Object-safe `commit` + `sample` contract for graph nodes
//! - [`ModuleInputs`] - The [`MAX_MODULE_INPUTS`] input slices a module reads
//!
//! ## Graph
//!
//! - [`AudioProcessor`] - Owns modules, wiring and buffers; renders one block per `update`
//! - [`GraphEditor`] - Thread-safe handle for queuing topology changes
//! - [`ModuleHandle`] - Generation-tagged module identity
//!
//! ## Scheduling
//!
//! - [`PoolParty`] - Worker pool running dependency-tagged batches
//!
//! ## Buffers
//!
//! - [`RingBuffer`] - Growable FIFO used to hand rendered audio to a device
//!
//! # Tracing
//!
//! Enable the `tracing` feature to log pool resizes, applied actions, rejected
//! routes and buffer growth through the `tracing` facade.
//!
//! # Example
//!
//! ```rust
//! use partita_core::{AudioProcessor, Module, ModuleInputs};
//!
//! struct Ramp(f32);
//!
//! impl Module for Ramp {
//!     fn commit(&mut self) {}
//!     fn sample(&mut self, _inputs: &ModuleInputs<'_>, output: &mut [f32]) {
//!         for out in output.iter_mut() {
//!             *out = self.0;
//!             self.0 += 1.0;
//!         }
//!     }
//! }
//!
//! struct Double;
//!
//! impl Module for Double {
//!     fn commit(&mut self) {}
//!     fn sample(&mut self, inputs: &ModuleInputs<'_>, output: &mut [f32]) {
//!         for (out, &x) in output.iter_mut().zip(inputs[0]) {
//!             *out = 2.0 * x;
//!         }
//!     }
//! }
//!
//! let mut processor = AudioProcessor::with_threads(2).unwrap();
//! let ramp = processor.add_module(Box::new(Ramp(0.0)));
//! let double = processor.add_module(Box::new(Double));
//! processor.route(ramp).to(double);
//!
//! processor.update(4);
//! assert_eq!(processor.output(double).unwrap(), vec![0.0, 2.0, 4.0, 6.0]);
//! ```

pub mod error;
pub mod graph;
pub mod module;
pub mod pool;
pub mod ring_buffer;

pub use error::{Error, Result};
pub use graph::{AudioProcessor, GraphEditor, ModuleHandle, Route};
pub use module::{MAX_MODULE_INPUTS, Module, ModuleInputs};
pub use pool::PoolParty;
pub use ring_buffer::RingBuffer;
