//! Module graph: handles, queued topology edits, and the block processor.
//!
//! # Architecture
//!
//! - [`GraphEditor`]: cloneable and `Send + Sync`. Any thread adds, removes and
//!   routes modules through it. Each call appends an action to a locked queue
//!   and returns.
//! - [`AudioProcessor`]: owned by the coordinating thread. At the start of every
//!   [`update()`](AudioProcessor::update) it drains the queue, applies the
//!   actions in submission order, and rebuilds its dependency table if anything
//!   changed. It then schedules one work item per module on its worker pool.
//!
//! Modules are owned by the processor and named by generation-tagged
//! [`ModuleHandle`]s. A handle outliving its module degrades to a no-op.
//!
//! # Cycles
//!
//! A route whose source already reads, directly or transitively, from its
//! destination is rejected when applied. The slot keeps its previous source and
//! [`AudioProcessor::rejected_routes()`] counts the rejection.

mod action;
mod handle;
mod harness;
mod processor;

pub use handle::ModuleHandle;
pub use processor::{AudioProcessor, GraphEditor, Route};
