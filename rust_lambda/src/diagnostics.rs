//! JSON diagnostics for the relay.
//!
//! The global subscriber only sees runtime output. Each invocation gets its own
//! `Dispatch` built from that invocation's `LOG_LEVEL`, attached to the
//! invocation future, so no global filter is mutated between invocations.

use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

use crate::log_level::LogLevel;

pub(crate) fn init_global() {
    tracing_subscriber::fmt()
        .json()
        .with_max_level(LogLevel::default().as_level_filter())
        .init();
}

pub(crate) fn dispatch(level: LogLevel) -> Dispatch {
    dispatch_to(level, std::io::stdout)
}

pub(crate) fn dispatch_to<W>(level: LogLevel, writer: W) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(level.as_level_filter())
        .with_writer(writer)
        .finish();
    Dispatch::new(subscriber)
}

#[cfg(test)]
pub(crate) mod capture {
    use std::io;
    use std::sync::{Arc, Mutex};

    use serde_json::Value;
    use tracing::Dispatch;
    use tracing_subscriber::fmt::MakeWriter;

    use crate::log_level::LogLevel;

    /// In-memory sink for diagnostics written by a test dispatch.
    #[derive(Clone, Default)]
    pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub(crate) fn dispatch(&self, level: LogLevel) -> Dispatch {
            super::dispatch_to(level, self.clone())
        }

        pub(crate) fn lines(&self) -> Vec<Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }

        /// `fields` of every line emitted at `level` ("WARN", "INFO", ...).
        pub(crate) fn at_level(&self, level: &str) -> Vec<Value> {
            self.lines()
                .into_iter()
                .filter(|line| line["level"] == level)
                .map(|line| line["fields"].clone())
                .collect()
        }

        pub(crate) fn warning_messages(&self) -> Vec<String> {
            self.at_level("WARN")
                .iter()
                .map(|fields| fields["message"].as_str().unwrap().to_string())
                .collect()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}
