//! Developer trace channel for frozen descriptors and collection runs.
//!
//! Every line goes to the `log` facade under [`DEV_TARGET`]. While a
//! [`TraceCapture`] is alive on a thread, that thread's lines are also kept
//! so tests can assert on them without installing a global logger.

use std::cell::RefCell;
use std::marker::PhantomData;

/// Log target for developer traces; the logger gives it its own appender.
pub const DEV_TARGET: &str = "nexusmap::dev6";

thread_local! {
    static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Collects the current thread's trace lines until dropped.
///
/// Starting a second capture on the same thread discards the first one's
/// pending lines.
pub struct TraceCapture {
    // Tied to the thread whose buffer it owns.
    _thread: PhantomData<*const ()>,
}

impl TraceCapture {
    /// Lines recorded since the capture started or since the last `take`.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        CAPTURED.with(|c| c.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
    }
}

impl Drop for TraceCapture {
    fn drop(&mut self) {
        CAPTURED.with(|c| c.borrow_mut().take());
    }
}

/// Starts capturing trace lines on this thread.
#[must_use]
pub fn capture() -> TraceCapture {
    CAPTURED.with(|c| *c.borrow_mut() = Some(Vec::new()));
    TraceCapture { _thread: PhantomData }
}

/// Sends one trace line to the log and to an active capture.
pub fn emit(line: String) {
    log::trace!(target: DEV_TARGET, "{line}");
    CAPTURED.with(|c| {
        if let Some(lines) = c.borrow_mut().as_mut() {
            lines.push(line);
        }
    });
}

/// Formats and emits a developer trace line.
#[macro_export]
macro_rules! dev6 {
    ($($arg:tt)*) => {
        $crate::utils::devlog::emit(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_collects_in_order_and_take_resets() {
        let cap = capture();
        crate::dev6!("freeze {}", 1);
        crate::dev6!("find");
        assert_eq!(cap.take(), vec!["freeze 1".to_string(), "find".to_string()]);
        assert!(cap.take().is_empty());
    }

    #[test]
    fn other_threads_are_not_captured() {
        let cap = capture();
        std::thread::spawn(|| crate::dev6!("elsewhere")).join().unwrap();
        crate::dev6!("here");
        assert_eq!(cap.take(), vec!["here".to_string()]);
    }

    #[test]
    fn nothing_is_kept_without_a_capture() {
        drop(capture());
        crate::dev6!("dropped");
        let cap = capture();
        assert!(cap.take().is_empty());
    }
}
