//! The PolyStore error taxonomy.
//!
//! Errors come in two tiers: domain sentinels that callers branch on
//! ([`StorageError::ObjectNotExist`], [`StorageError::IterationDone`]) and
//! opaque backend errors propagated through the
//! [`Backend`](StorageError::Backend) variant. Layers may add context with
//! [`StorageError::with_context`]; the sentinel identity survives wrapping
//! and is recovered through [`StorageError::kind`] — never by string
//! matching.

/// Error type shared by every PolyStore contract operation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The object at the given path (or the multipart session for the given
    /// id) does not exist.
    #[error("object does not exist: {path}")]
    ObjectNotExist {
        /// The path (or session id) that was not found.
        path: String,
    },

    /// The iterator has been exhausted. This is a terminal sentinel, not a
    /// failure: every further pull returns it again.
    #[error("iteration done")]
    IterationDone,

    /// An argument combination is invalid (for example an absent source with
    /// a positive size). The operation failed atomically; no partial object
    /// became observable.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// A pre-signed request was executed past its expiry window.
    #[error("pre-signed request expired")]
    RequestExpired,

    /// A pre-signed request's signature did not verify.
    #[error("pre-signed request signature mismatch")]
    SignatureMismatch,

    /// A wrapped error carrying extra context. The inner error's kind is
    /// preserved; see [`StorageError::kind`].
    #[error("{context}")]
    Context {
        /// Human-readable context describing where the error surfaced.
        context: String,
        /// The wrapped error.
        #[source]
        source: Box<StorageError>,
    },

    /// An opaque backend-specific error, propagated unmodified.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Closed enumeration of error kinds, recovered via [`StorageError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`StorageError::ObjectNotExist`].
    ObjectNotExist,
    /// See [`StorageError::IterationDone`].
    IterationDone,
    /// See [`StorageError::InvalidArgument`].
    InvalidArgument,
    /// See [`StorageError::RequestExpired`].
    RequestExpired,
    /// See [`StorageError::SignatureMismatch`].
    SignatureMismatch,
    /// See [`StorageError::Backend`].
    Backend,
}

impl StorageError {
    /// Build an [`ObjectNotExist`](Self::ObjectNotExist) sentinel for `path`.
    #[must_use]
    pub fn not_exist(path: impl Into<String>) -> Self {
        Self::ObjectNotExist { path: path.into() }
    }

    /// Build an [`InvalidArgument`](Self::InvalidArgument) error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Wrap this error with additional context, preserving its kind.
    #[must_use]
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The kind of this error, looking through any [`Context`](Self::Context)
    /// wrapping.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ObjectNotExist { .. } => ErrorKind::ObjectNotExist,
            Self::IterationDone => ErrorKind::IterationDone,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::RequestExpired => ErrorKind::RequestExpired,
            Self::SignatureMismatch => ErrorKind::SignatureMismatch,
            Self::Context { source, .. } => source.kind(),
            Self::Backend(_) => ErrorKind::Backend,
        }
    }

    /// Returns `true` if this error is (or wraps) the object-not-exist
    /// sentinel.
    #[must_use]
    pub fn is_object_not_exist(&self) -> bool {
        self.kind() == ErrorKind::ObjectNotExist
    }

    /// Returns `true` if this error is (or wraps) the iteration-done
    /// sentinel.
    #[must_use]
    pub fn is_iteration_done(&self) -> bool {
        self.kind() == ErrorKind::IterationDone
    }
}

/// Convenience result type for PolyStore operations.
pub type StorageResult<T> = Result<T, StorageError>;
