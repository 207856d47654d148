//! Injected logging handle.
//!
//! Components receive a [`Logger`] at construction instead of reaching for
//! the process-wide logger. The handle still speaks the `log` facade, so the
//! binary wires it to `env_logger` while tests can capture records.

use log::{Level, Log, Metadata, Record};
use std::fmt;
use std::sync::Arc;

/// A cloneable logging capability bound to a target name.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Log>,
    target: &'static str,
}

/// Forwards to whatever logger `log::set_logger` installed.
struct GlobalSink;

impl Log for GlobalSink {
    fn enabled(&self, metadata: &Metadata) -> bool {
        log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record) {
        log::logger().log(record)
    }

    fn flush(&self) {
        log::logger().flush()
    }
}

impl Logger {
    pub fn new(sink: Arc<dyn Log>, target: &'static str) -> Self {
        Self { sink, target }
    }

    /// Handle backed by the process logger (`env_logger` in the binary).
    pub fn global(target: &'static str) -> Self {
        Self::new(Arc::new(GlobalSink), target)
    }

    /// Same sink, different target; used to hand one sink to each stage.
    pub fn child(&self, target: &'static str) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            target,
        }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder()
            .level(level)
            .target(self.target)
            .build();
        if !self.sink.enabled(&metadata) {
            return;
        }
        self.sink.log(
            &Record::builder()
                .metadata(metadata)
                .args(args)
                .build(),
        );
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args)
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args)
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("target", &self.target)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_shares_sink_with_new_target() {
        let (logger, sink) = capture::logger();
        let child = logger.child("layout");
        logger.info(format_args!("parent"));
        child.warn(format_args!("child {}", 2));

        let lines = sink.lines.lock().unwrap();
        assert_eq!(*lines, vec!["test: parent", "layout: child 2"]);
    }
}
