//! Human-readable console output: field filtering, rendering and the stdout sink.

pub mod format;
pub mod sink;

pub use format::{SkipFields, color_for, render};
pub use sink::ConsoleSink;
