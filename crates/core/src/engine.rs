//! The engine: registries, root commands, and the execution entry points.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::argument::InternalArgument;
use crate::argument::keyed::{ArgumentKey, Flag, FlagKey, NamedArg};
use crate::command::build::build_root;
use crate::command::{Command, ExecutionContext, ParentCommand};
use crate::declare::{NamedInput, ParentDeclaration};
use crate::error::{ExecutionError, RegistrationError};
use crate::message::{MessageContext, MessageKey, MessageRegistry};
use crate::registry::{ArgumentSpec, RegistryContainer};
use crate::requirement::RequirementKey;
use crate::sender::{AcceptAllSenders, PermissionAdapter, SenderValidator};
use crate::suggestion::{SuggestionKey, SuggestionMethod};

/// Holds every registry and registered root. `S` is the sender type the
/// embedding application executes commands as.
pub struct CommandEngine<S> {
    registries: RegistryContainer<S>,
    validator: Arc<dyn SenderValidator<S>>,
    permissions: Option<Arc<dyn PermissionAdapter>>,
    roots: Vec<Arc<ParentCommand<S>>>,
    lookup: IndexMap<String, usize>,
}

impl<S> Default for CommandEngine<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> CommandEngine<S> {
    /// An engine accepting every sender, with resolvers for the primitive
    /// types pre-registered.
    pub fn new() -> Self {
        let mut engine = Self {
            registries: RegistryContainer::default(),
            validator: Arc::new(AcceptAllSenders),
            permissions: None,
            roots: Vec::new(),
            lookup: IndexMap::new(),
        };
        engine.register_default_arguments();
        engine
    }

    fn register_default_arguments(&mut self) {
        let arguments = &mut self.registries.arguments;
        arguments.register::<String>(|_, input| Some(input.to_string()));
        arguments.register::<bool>(|_, input| input.parse().ok());
        arguments.register::<char>(|_, input| {
            let mut chars = input.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Some(ch),
                _ => None,
            }
        });
        arguments.register::<i32>(|_, input| input.parse().ok());
        arguments.register::<i64>(|_, input| input.parse().ok());
        arguments.register::<u32>(|_, input| input.parse().ok());
        arguments.register::<u64>(|_, input| input.parse().ok());
        arguments.register::<f32>(|_, input| input.parse().ok());
        arguments.register::<f64>(|_, input| input.parse().ok());
    }

    pub fn set_validator(&mut self, validator: impl SenderValidator<S> + 'static) {
        self.validator = Arc::new(validator);
    }

    pub fn set_permission_adapter(&mut self, adapter: impl PermissionAdapter + 'static) {
        self.permissions = Some(Arc::new(adapter));
    }

    pub fn registries(&self) -> &RegistryContainer<S> {
        &self.registries
    }

    pub fn registries_mut(&mut self) -> &mut RegistryContainer<S> {
        &mut self.registries
    }

    pub fn register_argument<T: Send + Sync + 'static>(
        &mut self,
        resolver: impl Fn(&S, &str) -> Option<T> + Send + Sync + 'static,
    ) {
        self.registries.arguments.register(resolver);
    }

    /// Registers a factory that builds the internal argument for `T` itself,
    /// giving custom types their own suggestion source and failure detail.
    pub fn register_argument_factory<T: Send + Sync + 'static>(
        &mut self,
        factory: impl Fn(ArgumentSpec<'_, S>) -> InternalArgument<S> + Send + Sync + 'static,
    ) {
        self.registries.arguments.register_factory::<T>(factory);
    }

    pub fn register_suggestion(
        &mut self,
        key: SuggestionKey,
        method: SuggestionMethod,
        resolver: impl Fn(&S, &str) -> Vec<String> + Send + Sync + 'static,
    ) {
        self.registries.suggestions.register_key(key, method, resolver);
    }

    pub fn register_flags(&mut self, key: FlagKey, flags: Vec<Flag>) {
        self.registries.flags.register(key, flags);
    }

    pub fn register_named_arguments(&mut self, key: ArgumentKey, arguments: Vec<NamedArg>) {
        self.registries.named.register(key, arguments);
    }

    pub fn register_requirement(
        &mut self,
        key: RequirementKey,
        resolver: impl Fn(&S, &crate::meta::Meta) -> bool + Send + Sync + 'static,
    ) {
        self.registries.requirements.register(key, resolver);
    }

    pub fn register_message(
        &mut self,
        key: MessageKey,
        renderer: impl Fn(&S, &MessageContext) + Send + Sync + 'static,
    ) {
        self.registries.messages.register(key, renderer);
    }

    /// Validates and registers a root command.
    pub fn register(&mut self, declaration: ParentDeclaration<S>) -> Result<(), RegistrationError> {
        let root = build_root(declaration, &self.registries, self.permissions.as_deref())?;
        for key in
            std::iter::once(root.name()).chain(root.aliases().iter().map(String::as_str))
        {
            if self.lookup.contains_key(key) {
                return Err(RegistrationError::DuplicateCommand {
                    command: key.to_string(),
                });
            }
        }
        tracing::debug!(command = %root.name(), "registered root command");
        let index = self.roots.len();
        for key in
            std::iter::once(root.name().to_string()).chain(root.aliases().iter().cloned())
        {
            self.lookup.insert(key, index);
        }
        self.roots.push(Arc::new(root));
        Ok(())
    }

    fn root(&self, name: &str) -> Option<&ParentCommand<S>> {
        self.lookup.get(name).map(|index| self.roots[*index].as_ref())
    }

    fn context(&self) -> ExecutionContext<'_, S> {
        ExecutionContext {
            messages: &self.registries.messages,
            validator: self.validator.as_ref(),
        }
    }

    /// Executes a tokenized line. The first token names the root command.
    ///
    /// `Ok(())` covers every user-input failure; those are rendered through
    /// the message registry. Only command-target errors come back as `Err`.
    pub fn execute(&self, sender: &S, tokens: &[String]) -> Result<(), ExecutionError> {
        let Some((head, rest)) = tokens.split_first() else {
            return Ok(());
        };
        tracing::debug!(command = %head, "executing");
        let Some(root) = self.root(head) else {
            self.send_unknown(sender, head);
            return Ok(());
        };
        let mut tokens: VecDeque<String> = rest.to_vec().into();
        root.execute(&self.context(), sender, Vec::new(), &mut tokens)
    }

    /// Executes a leaf by path, with parameters supplied by name instead of
    /// positionally. Inputs carry their raw text and may carry an already
    /// resolved value; limitless parameters take their whole input as one
    /// string.
    pub fn execute_named(
        &self,
        sender: &S,
        path: &[&str],
        arguments: HashMap<String, NamedInput>,
    ) -> Result<(), ExecutionError> {
        let Some((head, rest)) = path.split_first() else {
            return Ok(());
        };
        let Some(mut parent) = self.root(head) else {
            self.send_unknown(sender, head);
            return Ok(());
        };
        let ctx = self.context();

        for (position, name) in rest.iter().enumerate() {
            match parent.child_by_name(name).map(Arc::as_ref) {
                Some(Command::Parent(child)) => parent = child,
                Some(Command::Leaf(leaf)) if position == rest.len() - 1 => {
                    return leaf.execute_named(&ctx, sender, Vec::new(), arguments);
                }
                _ => {
                    self.send_unknown(sender, name);
                    return Ok(());
                }
            }
        }

        match parent.default_child().map(Arc::as_ref) {
            Some(Command::Leaf(leaf)) => leaf.execute_named(&ctx, sender, Vec::new(), arguments),
            _ => {
                self.send_unknown(sender, parent.name());
                Ok(())
            }
        }
    }

    /// Completion candidates for a tokenized partial line.
    pub fn suggest(&self, sender: &S, tokens: &[String]) -> Vec<String> {
        match tokens {
            [] => self.lookup.keys().cloned().collect(),
            [head] => self
                .lookup
                .keys()
                .filter(|name| name.starts_with(head.as_str()))
                .cloned()
                .collect(),
            [head, rest @ ..] => {
                let Some(root) = self.root(head) else {
                    return Vec::new();
                };
                let mut tokens: VecDeque<String> = rest.to_vec().into();
                root.suggestions(sender, &mut tokens)
            }
        }
    }

    fn send_unknown(&self, sender: &S, command: &str) {
        self.registries.messages.send(
            &MessageKey::UNKNOWN_COMMAND,
            sender,
            &MessageContext::InvalidCommand {
                command: command.to_string(),
            },
        );
    }
}

/// Read access to registered messages for embedders building adapters.
impl<S> CommandEngine<S> {
    pub fn messages(&self) -> &MessageRegistry<S> {
        &self.registries.messages
    }
}
