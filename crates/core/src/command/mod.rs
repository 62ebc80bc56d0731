//! The executable command tree.
//!
//! Built once from declarations, then read-only. Execution walks the tree
//! consuming tokens; every user-facing failure becomes a message, and only
//! target errors propagate as `Err`.

pub(crate) mod build;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::argument::InternalArgument;
use crate::declare::{CommandTarget, DEFAULT_LEAF, Invocation, NamedInput};
use crate::error::ExecutionError;
use crate::message::{MessageContext, MessageKey, MessageRegistry};
use crate::meta::Meta;
use crate::requirement::Settings;
use crate::resolve::{InvalidArgument, Resolve};
use crate::sender::{SenderValidator, ValidationResult};
use crate::value::{ArgValue, DeclaredType};

/// Everything execution needs besides the tree itself.
pub struct ExecutionContext<'a, S> {
    pub messages: &'a MessageRegistry<S>,
    pub validator: &'a dyn SenderValidator<S>,
}

pub enum Command<S> {
    Parent(ParentCommand<S>),
    Leaf(LeafCommand<S>),
}

impl<S> Command<S> {
    pub fn name(&self) -> &str {
        match self {
            Self::Parent(parent) => &parent.name,
            Self::Leaf(leaf) => &leaf.name,
        }
    }

    pub fn aliases(&self) -> &[String] {
        match self {
            Self::Parent(parent) => &parent.aliases,
            Self::Leaf(leaf) => &leaf.aliases,
        }
    }

    fn execute(
        &self,
        ctx: &ExecutionContext<'_, S>,
        sender: &S,
        scope: Vec<ArgValue>,
        tokens: &mut VecDeque<String>,
    ) -> Result<(), ExecutionError> {
        match self {
            Self::Parent(parent) => parent.execute(ctx, sender, scope, tokens),
            Self::Leaf(leaf) => leaf.execute(ctx, sender, scope, tokens),
        }
    }

    fn suggestions(&self, sender: &S, tokens: &mut VecDeque<String>) -> Vec<String> {
        match self {
            Self::Parent(parent) => parent.suggestions(sender, tokens),
            Self::Leaf(leaf) => leaf.suggestions(sender, tokens),
        }
    }
}

/// A grouping node. Roots are parents whose syntax starts at `/name`.
pub struct ParentCommand<S> {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) syntax: String,
    pub(crate) meta: Arc<Meta>,
    pub(crate) settings: Settings<S>,
    /// When set, this parent consumes one token as its own argument before
    /// descending; the value joins the scope of every leaf below.
    pub(crate) argument: Option<InternalArgument<S>>,
    pub(crate) children: Vec<Arc<Command<S>>>,
    /// Child lookup over names and aliases. The default leaf is not in here.
    pub(crate) lookup: IndexMap<String, usize>,
    pub(crate) default: Option<usize>,
}

impl<S> ParentCommand<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn syntax(&self) -> &str {
        &self.syntax
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub(crate) fn child_by_name(&self, name: &str) -> Option<&Arc<Command<S>>> {
        self.lookup.get(name).map(|index| &self.children[*index])
    }

    pub(crate) fn default_child(&self) -> Option<&Arc<Command<S>>> {
        self.default.map(|index| &self.children[index])
    }

    pub fn execute(
        &self,
        ctx: &ExecutionContext<'_, S>,
        sender: &S,
        mut scope: Vec<ArgValue>,
        tokens: &mut VecDeque<String>,
    ) -> Result<(), ExecutionError> {
        if !self.settings.test_requirements(
            ctx.messages,
            sender,
            &self.meta,
            &self.name,
            &self.syntax,
        ) {
            return Ok(());
        }

        if let Some(argument) = &self.argument {
            let input = tokens.pop_front().unwrap_or_default();
            match argument.resolve_single(sender, &input) {
                Resolve::Success(value) => scope.push(value),
                Resolve::Failure(invalid) => {
                    send_invalid_argument(ctx, sender, &self.name, &self.syntax, invalid);
                    return Ok(());
                }
            }
        }

        let Some(head) = tokens.front().cloned() else {
            // Bare invocation runs the default leaf when there is one.
            if let Some(child) = self.default_child() {
                return child.execute(ctx, sender, scope, tokens);
            }
            return Ok(());
        };

        if let Some(child) = self.child_by_name(&head) {
            let child = Arc::clone(child);
            tokens.pop_front();
            return child.execute(ctx, sender, scope, tokens);
        }

        // An unmatched head falls through to the default leaf, which treats
        // it as its first argument.
        if let Some(child) = self.default_child() {
            return child.execute(ctx, sender, scope, tokens);
        }

        ctx.messages.send(
            &MessageKey::UNKNOWN_COMMAND,
            sender,
            &MessageContext::InvalidCommand { command: head },
        );
        Ok(())
    }

    pub fn suggestions(&self, sender: &S, tokens: &mut VecDeque<String>) -> Vec<String> {
        if self.argument.is_some() {
            if tokens.len() <= 1 {
                return self
                    .argument
                    .as_ref()
                    .map(|argument| argument.suggestions(sender, tokens))
                    .unwrap_or_default();
            }
            tokens.pop_front();
        }

        if tokens.len() <= 1 {
            let current = tokens.front().map(String::as_str).unwrap_or("");
            let mut names: Vec<String> = self
                .children
                .iter()
                .flat_map(|child| {
                    std::iter::once(child.name())
                        .chain(child.aliases().iter().map(String::as_str))
                })
                .filter(|name| *name != DEFAULT_LEAF)
                .filter(|name| name.starts_with(current))
                .map(str::to_string)
                .collect();
            if let Some(child) = self.default_child() {
                names.extend(child.suggestions(sender, tokens));
            }
            return names;
        }

        let head = tokens.front().cloned().unwrap_or_default();
        if let Some(child) = self.child_by_name(&head) {
            let child = Arc::clone(child);
            tokens.pop_front();
            return child.suggestions(sender, tokens);
        }
        if let Some(child) = self.default_child() {
            return child.suggestions(sender, tokens);
        }
        Vec::new()
    }
}

/// An executable node: ordered parameters plus a target.
pub struct LeafCommand<S> {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) syntax: String,
    pub(crate) meta: Arc<Meta>,
    pub(crate) settings: Settings<S>,
    pub(crate) sender_type: Option<DeclaredType>,
    pub(crate) arguments: Vec<InternalArgument<S>>,
    pub(crate) target: CommandTarget<S>,
}

impl<S> LeafCommand<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn syntax(&self) -> &str {
        &self.syntax
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn execute(
        &self,
        ctx: &ExecutionContext<'_, S>,
        sender: &S,
        scope: Vec<ArgValue>,
        tokens: &mut VecDeque<String>,
    ) -> Result<(), ExecutionError> {
        if !self.check_access(ctx, sender) {
            return Ok(());
        }

        let mut values = Vec::with_capacity(self.arguments.len());
        for argument in &self.arguments {
            if argument.is_limitless() {
                let rest: Vec<String> = tokens.drain(..).collect();
                match argument.resolve_tail(sender, rest) {
                    Resolve::Success(value) => values.push(Some(value)),
                    Resolve::Failure(invalid) => {
                        send_invalid_argument(ctx, sender, &self.name, &self.syntax, invalid);
                        return Ok(());
                    }
                }
                continue;
            }

            let Some(token) = tokens.pop_front() else {
                if argument.optional() {
                    values.push(None);
                    continue;
                }
                self.send_syntax(ctx, sender, &MessageKey::NOT_ENOUGH_ARGUMENTS);
                return Ok(());
            };
            match argument.resolve_single(sender, &token) {
                Resolve::Success(value) => values.push(Some(value)),
                Resolve::Failure(invalid) => {
                    send_invalid_argument(ctx, sender, &self.name, &self.syntax, invalid);
                    return Ok(());
                }
            }
        }

        if !tokens.is_empty() {
            self.send_syntax(ctx, sender, &MessageKey::TOO_MANY_ARGUMENTS);
            return Ok(());
        }

        self.invoke(sender, scope, values)
    }

    /// By-name execution: each parameter is looked up in `arguments` instead
    /// of being consumed positionally. Extra entries are ignored and the
    /// trailing-token check does not apply.
    pub fn execute_named(
        &self,
        ctx: &ExecutionContext<'_, S>,
        sender: &S,
        scope: Vec<ArgValue>,
        mut arguments: HashMap<String, NamedInput>,
    ) -> Result<(), ExecutionError> {
        if !self.check_access(ctx, sender) {
            return Ok(());
        }

        let mut values = Vec::with_capacity(self.arguments.len());
        for argument in &self.arguments {
            let Some(input) = arguments.remove(argument.name()) else {
                if argument.optional() {
                    values.push(None);
                    continue;
                }
                self.send_syntax(ctx, sender, &MessageKey::NOT_ENOUGH_ARGUMENTS);
                return Ok(());
            };
            if let Some(value) = input.value {
                values.push(Some(value));
                continue;
            }
            match argument.resolve_single(sender, &input.raw) {
                Resolve::Success(value) => values.push(Some(value)),
                Resolve::Failure(invalid) => {
                    send_invalid_argument(ctx, sender, &self.name, &self.syntax, invalid);
                    return Ok(());
                }
            }
        }

        self.invoke(sender, scope, values)
    }

    fn check_access(&self, ctx: &ExecutionContext<'_, S>, sender: &S) -> bool {
        match ctx
            .validator
            .validate(&self.meta, self.sender_type.as_ref(), sender)
        {
            ValidationResult::Valid => {}
            ValidationResult::Invalid(key) => {
                self.send_syntax(ctx, sender, &key);
                return false;
            }
        }
        self.settings.test_requirements(
            ctx.messages,
            sender,
            &self.meta,
            &self.name,
            &self.syntax,
        )
    }

    fn invoke(
        &self,
        sender: &S,
        scope: Vec<ArgValue>,
        values: Vec<Option<ArgValue>>,
    ) -> Result<(), ExecutionError> {
        tracing::debug!(command = %self.name, "invoking command target");
        (self.target)(sender, Invocation::new(scope, values)).map_err(|source| {
            ExecutionError::Target {
                command: self.name.clone(),
                source,
            }
        })
    }

    fn send_syntax(&self, ctx: &ExecutionContext<'_, S>, sender: &S, key: &MessageKey) {
        ctx.messages.send(
            key,
            sender,
            &MessageContext::Syntax {
                command: self.name.clone(),
                syntax: self.syntax.clone(),
            },
        );
    }

    /// The parameter owning the last token gets to suggest. Limitless
    /// parameters own every token from their position on.
    pub fn suggestions(&self, sender: &S, tokens: &mut VecDeque<String>) -> Vec<String> {
        for argument in &self.arguments {
            if argument.is_limitless() || tokens.len() <= 1 {
                return argument.suggestions(sender, tokens);
            }
            tokens.pop_front();
        }
        Vec::new()
    }
}

fn send_invalid_argument<S>(
    ctx: &ExecutionContext<'_, S>,
    sender: &S,
    command: &str,
    syntax: &str,
    invalid: InvalidArgument,
) {
    ctx.messages.send(
        &MessageKey::INVALID_ARGUMENT,
        sender,
        &MessageContext::InvalidArgument {
            command: command.to_string(),
            syntax: syntax.to_string(),
            input: invalid.input,
            argument: invalid.argument,
            argument_type: invalid.declared_type.short_name().to_string(),
        },
    );
}
