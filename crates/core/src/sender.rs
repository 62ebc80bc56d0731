//! Sender validation and the permission adapter seam.

use crate::message::MessageKey;
use crate::meta::Meta;
use crate::value::DeclaredType;

/// Outcome of validating a sender against a leaf's declared sender type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(MessageKey),
}

/// Validates the sender once per executed leaf.
///
/// Platform adapters decide what a declared sender type means; the core only
/// carries the declaration and sends the returned key on mismatch.
pub trait SenderValidator<S>: Send + Sync {
    fn validate(&self, meta: &Meta, sender_type: Option<&DeclaredType>, sender: &S) -> ValidationResult;
}

/// Accepts every sender. The default when the host has a single sender kind.
pub struct AcceptAllSenders;

impl<S> SenderValidator<S> for AcceptAllSenders {
    fn validate(&self, _meta: &Meta, _sender_type: Option<&DeclaredType>, _sender: &S) -> ValidationResult {
        ValidationResult::Valid
    }
}

/// Receives permission nodes discovered at registration time.
///
/// Passed explicitly to the engine builder; the core holds no global state.
pub trait PermissionAdapter: Send + Sync {
    fn register(&self, command: &str, permission: &str);
}
