//! Resolution results.
//!
//! Argument resolution never raises: a failed resolution is a value carrying
//! the context needed to render an invalid-argument message. The dispatcher
//! decides what to do with it.

use crate::value::DeclaredType;

/// Outcome of resolving one argument.
#[derive(Debug)]
pub enum Resolve<V> {
    Success(V),
    Failure(InvalidArgument),
}

impl<V> Resolve<V> {
    pub fn success(value: V) -> Self {
        Self::Success(value)
    }

    pub fn invalid(context: InvalidArgument) -> Self {
        Self::Failure(context)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Context of a failed resolution: which argument, what was typed, and what
/// type it was supposed to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArgument {
    pub input: String,
    pub argument: String,
    pub declared_type: DeclaredType,
}

impl InvalidArgument {
    pub fn new(input: impl Into<String>, argument: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            input: input.into(),
            argument: argument.into(),
            declared_type,
        }
    }
}
