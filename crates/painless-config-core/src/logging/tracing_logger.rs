//! Logger that forwards to `tracing`
//!
//! The host application decides where events go by installing a
//! subscriber; without one, events are dropped.

use super::traits::Logger;

/// Forwards log calls to `tracing` events tagged with a component name
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: &'static str,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("painless_config")
    }
}

impl TracingLogger {
    /// Create a logger whose events carry `component`
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(component = self.component, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(component = self.component, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(component = self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(component = self.component, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_logger_without_subscriber() {
        let logger = TracingLogger::new("env");
        assert_eq!(logger.component(), "env");
        logger.debug("debug message");
        logger.info("info message");
        logger.warn("warn message");
        logger.error("error message");
    }
}
