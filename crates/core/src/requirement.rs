//! Per-node execution requirements.

use std::sync::Arc;

use crate::message::{MessageContext, MessageKey, MessageRegistry};
use crate::meta::Meta;

/// Decides whether a sender may proceed at a node.
pub type RequirementResolver<S> = Arc<dyn Fn(&S, &Meta) -> bool + Send + Sync>;

/// Key under which a requirement resolver is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequirementKey(String);

impl RequirementKey {
    pub fn of(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// A resolved requirement: resolver, invert flag, and the message sent on
/// failure. Final result is `resolve XOR invert`.
pub struct Requirement<S> {
    resolver: RequirementResolver<S>,
    message: MessageKey,
    invert: bool,
}

impl<S> Requirement<S> {
    pub fn new(resolver: RequirementResolver<S>, message: MessageKey, invert: bool) -> Self {
        Self {
            resolver,
            message,
            invert,
        }
    }

    pub fn test(&self, sender: &S, meta: &Meta) -> bool {
        (self.resolver)(sender, meta) != self.invert
    }

    pub fn message(&self) -> &MessageKey {
        &self.message
    }
}

impl<S> Clone for Requirement<S> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            message: self.message.clone(),
            invert: self.invert,
        }
    }
}

/// Ordered requirements carried by a command node.
pub struct Settings<S> {
    requirements: Vec<Requirement<S>>,
}

impl<S> Default for Settings<S> {
    fn default() -> Self {
        Self {
            requirements: Vec::new(),
        }
    }
}

impl<S> Settings<S> {
    pub fn new(requirements: Vec<Requirement<S>>) -> Self {
        Self { requirements }
    }

    /// Tests all requirements in order. The first failure sends its message
    /// and short-circuits.
    pub fn test_requirements(
        &self,
        messages: &MessageRegistry<S>,
        sender: &S,
        meta: &Meta,
        command: &str,
        syntax: &str,
    ) -> bool {
        for requirement in &self.requirements {
            if !requirement.test(sender, meta) {
                messages.send(
                    requirement.message(),
                    sender,
                    &MessageContext::Syntax {
                        command: command.to_string(),
                        syntax: syntax.to_string(),
                    },
                );
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always(value: bool) -> RequirementResolver<()> {
        Arc::new(move |_, _| value)
    }

    #[test]
    fn invert_flips_the_result() {
        let meta = Meta::default();
        let plain = Requirement::new(always(true), MessageKey::of("m"), false);
        let inverted = Requirement::new(always(true), MessageKey::of("m"), true);

        assert!(plain.test(&(), &meta));
        assert!(!inverted.test(&(), &meta));
    }

    #[test]
    fn first_failure_short_circuits() {
        use std::sync::Mutex;

        let hits: Arc<Mutex<Vec<&'static str>>> = Arc::default();
        let first = Arc::clone(&hits);
        let second = Arc::clone(&hits);

        let settings = Settings::new(vec![
            Requirement::new(
                Arc::new(move |_, _| {
                    first.lock().unwrap().push("first");
                    false
                }),
                MessageKey::of("denied"),
                false,
            ),
            Requirement::new(
                Arc::new(move |_, _| {
                    second.lock().unwrap().push("second");
                    true
                }),
                MessageKey::of("never"),
                false,
            ),
        ]);

        let messages = MessageRegistry::default();
        let passed = settings.test_requirements(&messages, &(), &Meta::default(), "cmd", "/cmd");

        assert!(!passed);
        assert_eq!(hits.lock().unwrap().as_slice(), ["first"]);
    }
}
