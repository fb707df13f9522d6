//! Logging abstractions for resolver passes

mod traits;
mod noop;
mod console;
mod tracing_logger;

pub use traits::{Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use tracing_logger::TracingLogger;

use std::sync::Arc;

/// Default logger for a component
pub fn default_logger(component: &'static str) -> SharedLogger {
    Arc::new(TracingLogger::new(component))
}
