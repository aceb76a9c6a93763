//! Utilities for logging.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::Level;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-field human readable lines, suitable for a terminal.
    #[default]
    HumanReadable,
    /// One json object per event.
    Json,
}

/// Build the filter used by the global subscriber.
///
/// `RUST_LOG` takes precedence over the provided default level so that
/// individual modules can be turned up without a restart flag.
pub fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level).into())
        .from_env_lossy()
}

/// Configure the global tracing subscriber.
///
/// Calling this more than once is a no-op, the first subscriber wins.
pub fn configure_global_logger<W>(default_level: Level, format: LogFormat, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(writer);

    let _ = match format {
        LogFormat::HumanReadable => builder.with_target(true).try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    };
}

/// In-memory sink for checking what a piece of code logged.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Send events from the current thread here until the guard is dropped.
    pub fn install(&self, level: Level) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_twice_does_not_panic() {
        configure_global_logger(Level::INFO, LogFormat::Json, std::io::stderr);
        configure_global_logger(Level::DEBUG, LogFormat::HumanReadable, std::io::stderr);
    }

    #[test]
    fn capture_respects_level() {
        let logs = LogCapture::default();
        {
            let _guard = logs.install(Level::INFO);
            tracing::info!(pipeline = %r#"[{"$limit":1}]"#, "kept");
            tracing::debug!("dropped");
        }
        tracing::info!("after guard");

        let contents = logs.contents();
        assert!(contents.contains("kept"), "{contents}");
        assert!(contents.contains(r#"[{"$limit":1}]"#), "{contents}");
        assert!(!contents.contains("dropped"), "{contents}");
        assert!(!contents.contains("after guard"), "{contents}");
    }

    #[test]
    fn default_format_is_human() {
        assert_eq!(LogFormat::HumanReadable, LogFormat::default());
    }
}
