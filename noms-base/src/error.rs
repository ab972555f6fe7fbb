// We want a few things here:
// 1. A way to create a new error with a backtrace
// 2. A way to centralize setting a breakpoint to trap any error in the system fairly soon
//    after it's created (or at least when it's propagated from a library we use back to us)
// 3. Same but for logging / emitting error messages into the tracing/logging system
// 4. A way for callers to match on *why* an error happened without every call site
//    having to pick a kind: MergeNeeded and NotFound are routinely matched on,
//    most others are just propagated.

use std::borrow::Cow;
use backtrace_error::DynBacktraceError;
use tracing::error;

#[cfg(test)]
use test_log::test;

/// The error kinds the core distinguishes. Everything that isn't locally
/// recovered (a CAS conflict inside `commit`) surfaces as one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Path or dataset-spec parse failure; message is user-visible.
    Syntax,
    /// A subtype assertion failed during struct construction or write-time
    /// child validation.
    Type,
    /// `commit`'s target is not a descendant of the current head.
    MergeNeeded,
    /// Hash not present in any consulted backend.
    NotFound,
    /// Chunk hash mismatch, codec under/over-read, or a non-finite Number.
    Integrity,
    /// Underlying I/O failure from the chunk-store transport.
    Transport,
    /// Counterpart's protocol version differs from ours.
    Version,
    /// None of the above; an ordinary propagated error with no finer kind.
    Other,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    inner: DynBacktraceError,
}
pub type Result<T> = std::result::Result<T, Error>;

struct SimpleErr(Cow<'static, str>);
impl std::fmt::Debug for SimpleErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for SimpleErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for SimpleErr {
    fn description(&self) -> &str {
        &self.0
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<E> for Error {
    fn from(err: E) -> Error {
        Error::new(Kind::Other, err)
    }
}

impl Error {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(kind: Kind, err: E) -> Error {
        error!(target: "noms", ?kind, "{:?}", err);
        let inner = DynBacktraceError::from(err);
        Error { kind, inner }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.inner)
    }
}

/// Build an ad hoc `Other`-kind error from a message, the way most call
/// sites that don't care about `Kind` want to.
pub fn err(msg: impl Into<Cow<'static, str>>) -> Error {
    kind_err(Kind::Other, msg)
}

/// Build an error of a specific kind from a message.
pub fn kind_err(kind: Kind, msg: impl Into<Cow<'static, str>>) -> Error {
    let e = SimpleErr(msg.into());
    Error::new(kind, e)
}

#[test]
fn test_error() {
    let e = err("test error");
    assert_eq!(e.kind(), Kind::Other);
    let e = kind_err(Kind::NotFound, "missing chunk");
    assert_eq!(e.kind(), Kind::NotFound);
}
