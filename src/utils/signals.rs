use lazy_static::lazy_static;
use signal_hook::consts::{SIGALRM, SIGINT, SIGTERM};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

const SIG_NONE: usize = 0;
const SIG_INTERRUPT: usize = 1;
const SIG_TERMINATE: usize = 2;
const SIG_ALARM: usize = 3;

lazy_static! {
    static ref SIGNAL_STATUS: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(SIG_NONE));
}

/// The kind of signal that interrupted the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalKind {
    /// An interactive interrupt (SIGINT).
    Interrupt,
    /// A termination request (SIGTERM).
    Terminate,
    /// The timeout alarm (SIGALRM or the `-t` timer).
    Alarm,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Interrupt => write!(f, "interrupt"),
            SignalKind::Terminate => write!(f, "termination"),
            SignalKind::Alarm => write!(f, "timeout"),
        }
    }
}

/// The error surfaced when a signal is observed at one of the polling points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("interrupted by {kind} signal")]
pub struct InterruptedError {
    kind: SignalKind,
}

impl InterruptedError {
    /// Returns the kind of signal that caused the interruption.
    pub fn kind(&self) -> SignalKind {
        self.kind
    }
}

/// Installs the handlers recording interrupt, termination and alarm signals into the
/// process-wide signal status.
///
/// The status is set once by the first signal delivered and never cleared.
pub fn register_signal_handlers() -> std::io::Result<()> {
    signal_hook::flag::register_usize(SIGINT, Arc::clone(&SIGNAL_STATUS), SIG_INTERRUPT)?;
    signal_hook::flag::register_usize(SIGTERM, Arc::clone(&SIGNAL_STATUS), SIG_TERMINATE)?;
    signal_hook::flag::register_usize(SIGALRM, Arc::clone(&SIGNAL_STATUS), SIG_ALARM)?;
    Ok(())
}

/// Records the timeout alarm after the given number of seconds.
///
/// The timer runs on a detached thread that only stores the signal status.
pub fn schedule_alarm(seconds: u64) {
    std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_secs(seconds));
        SIGNAL_STATUS.store(SIG_ALARM, Ordering::SeqCst);
    });
}

/// Returns the signal received so far, if any.
pub fn received_signal() -> Option<SignalKind> {
    match SIGNAL_STATUS.load(Ordering::SeqCst) {
        SIG_INTERRUPT => Some(SignalKind::Interrupt),
        SIG_TERMINATE => Some(SignalKind::Terminate),
        SIG_ALARM => Some(SignalKind::Alarm),
        _ => None,
    }
}

/// Fails with an [`InterruptedError`] if a signal has been received.
pub fn check_signal() -> Result<(), InterruptedError> {
    match received_signal() {
        Some(kind) => Err(InterruptedError { kind }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_signal_by_default() {
        // the status is process-wide; these tests only exercise the unsignalled state
        assert_eq!(None, received_signal());
        assert!(check_signal().is_ok());
    }

    #[test]
    fn test_error_message() {
        let e = InterruptedError {
            kind: SignalKind::Alarm,
        };
        assert_eq!("interrupted by timeout signal", e.to_string());
        assert_eq!(SignalKind::Alarm, e.kind());
    }
}
