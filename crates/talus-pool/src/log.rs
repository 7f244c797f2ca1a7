//! Installable logging hook, grounded in `charon_set_logger`/`charon_log_level_t`.
//!
//! There is one process-wide callback (not per-pool state, mirroring the
//! original's single global logger) with three levels. Logging at `Fatal`
//! terminates the process after invoking the callback.

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Warn,
    Fatal,
}

type Callback = fn(Level, &str);

static LOGGER: OnceLock<Callback> = OnceLock::new();

/// Installs the process-wide logging callback. Calling this more than once
/// is a no-op for every call after the first (the first installed logger
/// wins), matching the original's fire-and-forget `charon_set_logger`.
pub fn set_logger(callback: Callback) {
    let _ = LOGGER.set(callback);
}

fn emit(level: Level, message: &str) {
    if let Some(callback) = LOGGER.get() {
        callback(level, message);
    } else if level == Level::Fatal {
        eprintln!("fatal: {message}");
    }
}

pub(crate) fn debug(message: impl AsRef<str>) {
    emit(Level::Debug, message.as_ref());
}

pub(crate) fn warn(message: impl AsRef<str>) {
    emit(Level::Warn, message.as_ref());
}

/// Logs at `Fatal` and terminates the process with a non-zero status.
/// Never returns.
pub(crate) fn fatal(message: impl AsRef<str>) -> ! {
    emit(Level::Fatal, message.as_ref());
    std::process::exit(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static CAPTURED: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

    fn capture(level: Level, message: &str) {
        CAPTURED.lock().unwrap().push((level, message.to_string()));
    }

    #[test]
    fn debug_and_warn_invoke_the_installed_callback() {
        set_logger(capture);
        debug("hello");
        warn("careful");
        let captured = CAPTURED.lock().unwrap();
        assert!(captured.contains(&(Level::Debug, "hello".to_string())));
        assert!(captured.contains(&(Level::Warn, "careful".to_string())));
    }
}
