//! Message keys, contexts, and the message registry.
//!
//! User-input errors never become `Err`; the tree renders them through
//! whatever renderer the host registered for the key. A missing renderer is
//! a silent no-op.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Identifies a message the core (or an adapter) may emit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageKey(Cow<'static, str>);

impl MessageKey {
    pub const UNKNOWN_COMMAND: MessageKey = MessageKey(Cow::Borrowed("unknown-command"));
    pub const TOO_MANY_ARGUMENTS: MessageKey = MessageKey(Cow::Borrowed("too-many-arguments"));
    pub const NOT_ENOUGH_ARGUMENTS: MessageKey = MessageKey(Cow::Borrowed("not-enough-arguments"));
    pub const INVALID_ARGUMENT: MessageKey = MessageKey(Cow::Borrowed("invalid-argument"));

    /// An adapter-defined key, e.g. for sender mismatches or failed
    /// requirements.
    pub fn of(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// What the renderer gets to work with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContext {
    /// An unrecognized head token.
    InvalidCommand { command: String },
    /// Wrong argument count, sender mismatch, or a failed requirement.
    Syntax { command: String, syntax: String },
    /// A value that failed to resolve.
    InvalidArgument {
        command: String,
        syntax: String,
        input: String,
        argument: String,
        argument_type: String,
    },
}

pub type MessageRenderer<S> = Arc<dyn Fn(&S, &MessageContext) + Send + Sync>;

/// `MessageKey -> renderer` map. Registration is last-write-wins.
pub struct MessageRegistry<S> {
    renderers: HashMap<MessageKey, MessageRenderer<S>>,
}

impl<S> Default for MessageRegistry<S> {
    fn default() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }
}

impl<S> MessageRegistry<S> {
    pub fn register(
        &mut self,
        key: MessageKey,
        renderer: impl Fn(&S, &MessageContext) + Send + Sync + 'static,
    ) {
        self.renderers.insert(key, Arc::new(renderer));
    }

    pub fn send(&self, key: &MessageKey, sender: &S, context: &MessageContext) {
        match self.renderers.get(key) {
            Some(renderer) => renderer(sender, context),
            None => tracing::debug!(key = key.name(), "no renderer registered for message"),
        }
    }
}
