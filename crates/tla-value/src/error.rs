//! Error types for value operations

use thiserror::Error;

/// Result type for value operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors raised while operating on values.
///
/// Variants that name an offending value carry its rendering, already bounded
/// by [`crate::config::ERROR_RENDER_BOUND`]. Source positions are not known at
/// this layer; callers that own them attach context once via
/// [`EvalError::in_context`].
#[derive(Debug, Error)]
pub enum EvalError {
    /// The exact element count does not fit the fixed-width (32-bit) bound
    #[error("overflow when computing the number of elements in:\n{value}")]
    Overflow { value: String },

    /// A set had to be enumerated but cannot be
    #[error("attempted to enumerate {what}, but it cannot be enumerated:\n{value}")]
    NotEnumerable { what: String, value: String },

    /// A value of the wrong shape was supplied
    #[error("{message}:\n{value}")]
    TypeMismatch { message: String, value: String },

    /// EXCEPT applied to a value that cannot be updated positionally
    #[error("attempted to apply EXCEPT to the set of functions:\n{value}")]
    ExceptNotSupported { value: String },

    /// Index-based access outside `0..size`
    #[error("index {index} is out of bounds for a set of {size} elements")]
    IndexOutOfBounds { index: String, size: String },

    /// Function applied to an argument outside its domain
    #[error("attempted to apply function\n{func}\nto argument {arg}, which is not in its domain")]
    ApplyOutOfDomain { func: String, arg: String },

    /// Malformed serialized value
    #[error("malformed value encoding: {message}")]
    Decode { message: String },

    /// I/O failure while reading or writing a serialized value
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error enriched with the context of the expression that produced it
    #[error("{context}\n{source}")]
    InContext {
        context: String,
        #[source]
        source: Box<EvalError>,
    },
}

impl EvalError {
    pub fn overflow(value: impl Into<String>) -> Self {
        EvalError::Overflow {
            value: value.into(),
        }
    }

    pub fn not_enumerable(what: impl Into<String>, value: impl Into<String>) -> Self {
        EvalError::NotEnumerable {
            what: what.into(),
            value: value.into(),
        }
    }

    pub fn type_mismatch(message: impl Into<String>, value: impl Into<String>) -> Self {
        EvalError::TypeMismatch {
            message: message.into(),
            value: value.into(),
        }
    }

    pub fn except_not_supported(value: impl Into<String>) -> Self {
        EvalError::ExceptNotSupported {
            value: value.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        EvalError::Decode {
            message: message.into(),
        }
    }

    /// Attach the context of the originating expression.
    ///
    /// Enrichment happens once: an error that already carries context is
    /// returned unchanged, so the innermost boundary wins.
    pub fn in_context(self, context: impl Into<String>) -> Self {
        match self {
            EvalError::InContext { .. } => self,
            other => EvalError::InContext {
                context: context.into(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, with any context wrapper removed.
    pub fn root(&self) -> &EvalError {
        match self {
            EvalError::InContext { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_context_wraps_once() {
        let err = EvalError::overflow("[S -> T]")
            .in_context("line 3, col 7")
            .in_context("line 9, col 1");
        match &err {
            EvalError::InContext { context, .. } => assert_eq!(context, "line 3, col 7"),
            other => panic!("expected context wrapper, got {other:?}"),
        }
        assert!(matches!(err.root(), EvalError::Overflow { .. }));
    }

    #[test]
    fn test_display_mentions_value() {
        let err = EvalError::except_not_supported("[{1} -> {2}]");
        assert!(err.to_string().contains("[{1} -> {2}]"));
    }
}
