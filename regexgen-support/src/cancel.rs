/*!
Cooperative cancellation for streaming readers (`spec.md` §5: "Streaming
readers cooperatively check a cancellation token at chunk boundaries and
before each read; cancellation returns an error from `Read`").
*/

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable handle to a shared cancellation flag. Every clone observes
/// the same underlying flag; [`CancellationToken::cancel`] can be called
/// from any thread.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken { flag: Arc::new(AtomicBool::new(false)) }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns [`Cancelled`] if this token has been cancelled, for use at
    /// chunk boundaries and before each underlying read (`spec.md` §5).
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// The error a streaming reader's `Read` impl returns once its token has
/// been cancelled (`spec.md` §7: "A canceled stream returns the
/// cancellation error from the next `Read`").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "streaming match cancelled")
    }
}

impl std::error::Error for Cancelled {}

impl From<Cancelled> for std::io::Error {
    fn from(_: Cancelled) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Interrupted, Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelling_is_visible_on_every_clone() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.check().is_err());
    }
}
