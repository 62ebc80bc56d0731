//! Dynamically typed argument values and their declared types.
//!
//! Resolvers produce values of arbitrary types; the tree carries them as
//! boxed `Any` until the target downcasts them back. `DeclaredType` is the
//! registry key standing in for the declared parameter type.

use std::any::{Any, TypeId, type_name};

/// A resolved argument value of an arbitrary declared type.
pub type ArgValue = Box<dyn Any + Send + Sync>;

/// Wrap a concrete value as an [`ArgValue`].
pub fn arg_value<T: Send + Sync + 'static>(value: T) -> ArgValue {
    Box::new(value)
}

/// Move a concrete value back out of an [`ArgValue`].
///
/// Returns `None` when the boxed value is of a different type.
pub fn take_value<T: 'static>(value: ArgValue) -> Option<T> {
    value.downcast::<T>().ok().map(|boxed| *boxed)
}

/// The declared type of a parameter, flag payload, or named argument.
///
/// Identity is the `TypeId`; the name is kept for registry diagnostics and
/// invalid-argument messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclaredType {
    id: TypeId,
    name: &'static str,
}

impl DeclaredType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path, as rendered in messages.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_boxed_values() {
        let value = arg_value(42i32);
        assert_eq!(take_value::<i32>(value), Some(42));

        let value = arg_value("hello".to_string());
        assert_eq!(take_value::<i32>(value), None);
    }

    #[test]
    fn declared_type_identity() {
        assert_eq!(DeclaredType::of::<i32>(), DeclaredType::of::<i32>());
        assert_ne!(DeclaredType::of::<i32>(), DeclaredType::of::<i64>());
        assert_eq!(DeclaredType::of::<String>().short_name(), "String");
    }
}
