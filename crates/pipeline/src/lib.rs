//! Per-request crosshair extraction pipeline.
//!
//! Sequences resolve → acquire → scan for one inbound request, owns
//! the demo artifact for the duration of the run, and converts every
//! stage failure into a reported error instead of a fault.

mod error;
mod run;

pub use error::PipelineError;
pub use run::Pipeline;
