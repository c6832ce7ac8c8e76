use core::fmt;

/// Error which occurs when pushing into a full queue.
///
/// The rejected element is handed back to the caller.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct PushError<T>(pub T);

impl<T> PushError<T> {
    /// Unwraps the rejected element.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "PushError(..)".fmt(f)
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "pushing into a full queue".fmt(f)
    }
}

impl<T: Send> std::error::Error for PushError<T> {}
