//! Registries consulted while building the command tree.
//!
//! All of these are write-at-setup, read-at-registration. Lookups happen
//! when a command is registered, never per execution.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::argument::InternalArgument;
use crate::argument::keyed::{ArgumentKey, Flag, FlagKey, NamedArg};
use crate::message::MessageRegistry;
use crate::requirement::{RequirementKey, RequirementResolver};
use crate::suggestion::{Suggestion, SuggestionKey, SuggestionMethod, SuggestionResolver};
use crate::value::ArgValue;

/// Turns one raw token into a value of the registered type, or `None` when
/// the token does not parse.
pub type ArgumentResolver<S> = Arc<dyn Fn(&S, &str) -> Option<ArgValue> + Send + Sync>;

/// What a parameter declaration carries for a custom type, handed to the
/// type's factory so it can build the internal argument itself.
pub struct ArgumentSpec<'a, S> {
    pub name: &'a str,
    pub description: &'a str,
    pub optional: bool,
    /// The suggestion the declaration asked for; the factory may use it or
    /// substitute its own.
    pub suggestion: Suggestion<S>,
}

/// Builds the whole internal argument for the registered type, taking over
/// resolution, suggestion, and token behavior.
pub type ArgumentFactory<S> =
    Arc<dyn Fn(ArgumentSpec<'_, S>) -> InternalArgument<S> + Send + Sync>;

pub enum ArgumentEntry<S> {
    Resolver(ArgumentResolver<S>),
    Factory(ArgumentFactory<S>),
}

/// `TypeId -> resolver or factory` map. Last registration for a type wins.
pub struct ArgumentRegistry<S> {
    entries: HashMap<TypeId, ArgumentEntry<S>>,
}

impl<S> Default for ArgumentRegistry<S> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<S> ArgumentRegistry<S> {
    pub fn register<T>(&mut self, resolver: impl Fn(&S, &str) -> Option<T> + Send + Sync + 'static)
    where
        T: Send + Sync + 'static,
    {
        let wrapped: ArgumentResolver<S> = Arc::new(move |sender, input| {
            resolver(sender, input).map(|value| Box::new(value) as ArgValue)
        });
        self.entries
            .insert(TypeId::of::<T>(), ArgumentEntry::Resolver(wrapped));
    }

    /// Registers a factory that builds the internal argument for `T`
    /// directly, instead of going through a plain resolver.
    pub fn register_factory<T>(
        &mut self,
        factory: impl Fn(ArgumentSpec<'_, S>) -> InternalArgument<S> + Send + Sync + 'static,
    ) where
        T: Send + Sync + 'static,
    {
        self.entries
            .insert(TypeId::of::<T>(), ArgumentEntry::Factory(Arc::new(factory)));
    }

    pub fn get(&self, id: TypeId) -> Option<&ArgumentEntry<S>> {
        self.entries.get(&id)
    }
}

/// Suggestion resolvers, addressable by key or by argument type.
pub struct SuggestionRegistry<S> {
    by_key: HashMap<SuggestionKey, (SuggestionResolver<S>, SuggestionMethod)>,
    by_type: HashMap<TypeId, (SuggestionResolver<S>, SuggestionMethod)>,
}

impl<S> Default for SuggestionRegistry<S> {
    fn default() -> Self {
        Self {
            by_key: HashMap::new(),
            by_type: HashMap::new(),
        }
    }
}

impl<S> SuggestionRegistry<S> {
    pub fn register_key(
        &mut self,
        key: SuggestionKey,
        method: SuggestionMethod,
        resolver: impl Fn(&S, &str) -> Vec<String> + Send + Sync + 'static,
    ) {
        self.by_key.insert(key, (Arc::new(resolver), method));
    }

    pub fn register_type<T: 'static>(
        &mut self,
        method: SuggestionMethod,
        resolver: impl Fn(&S, &str) -> Vec<String> + Send + Sync + 'static,
    ) {
        self.by_type
            .insert(TypeId::of::<T>(), (Arc::new(resolver), method));
    }

    pub fn by_key(&self, key: &SuggestionKey) -> Option<Suggestion<S>> {
        self.by_key
            .get(key)
            .map(|(resolver, method)| Suggestion::Resolver(Arc::clone(resolver), *method))
    }

    pub fn by_type(&self, id: TypeId) -> Option<Suggestion<S>> {
        self.by_type
            .get(&id)
            .map(|(resolver, method)| Suggestion::Resolver(Arc::clone(resolver), *method))
    }
}

/// Reusable flag lists shared across commands.
#[derive(Default)]
pub struct FlagRegistry {
    groups: HashMap<FlagKey, Vec<Flag>>,
}

impl FlagRegistry {
    pub fn register(&mut self, key: FlagKey, flags: Vec<Flag>) {
        self.groups.insert(key, flags);
    }

    pub fn get(&self, key: &FlagKey) -> Option<&[Flag]> {
        self.groups.get(key).map(Vec::as_slice)
    }
}

/// Reusable named-argument lists shared across commands.
#[derive(Default)]
pub struct NamedArgumentRegistry {
    groups: HashMap<ArgumentKey, Vec<NamedArg>>,
}

impl NamedArgumentRegistry {
    pub fn register(&mut self, key: ArgumentKey, arguments: Vec<NamedArg>) {
        self.groups.insert(key, arguments);
    }

    pub fn get(&self, key: &ArgumentKey) -> Option<&[NamedArg]> {
        self.groups.get(key).map(Vec::as_slice)
    }
}

/// Requirement resolvers, referenced from command declarations by key.
pub struct RequirementRegistry<S> {
    resolvers: HashMap<RequirementKey, RequirementResolver<S>>,
}

impl<S> Default for RequirementRegistry<S> {
    fn default() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }
}

impl<S> RequirementRegistry<S> {
    pub fn register(
        &mut self,
        key: RequirementKey,
        resolver: impl Fn(&S, &crate::meta::Meta) -> bool + Send + Sync + 'static,
    ) {
        self.resolvers.insert(key, Arc::new(resolver));
    }

    pub fn get(&self, key: &RequirementKey) -> Option<RequirementResolver<S>> {
        self.resolvers.get(key).cloned()
    }
}

/// Everything the tree builder and the runtime read from.
pub struct RegistryContainer<S> {
    pub arguments: ArgumentRegistry<S>,
    pub suggestions: SuggestionRegistry<S>,
    pub flags: FlagRegistry,
    pub named: NamedArgumentRegistry,
    pub requirements: RequirementRegistry<S>,
    pub messages: MessageRegistry<S>,
}

impl<S> Default for RegistryContainer<S> {
    fn default() -> Self {
        Self {
            arguments: ArgumentRegistry::default(),
            suggestions: SuggestionRegistry::default(),
            flags: FlagRegistry::default(),
            named: NamedArgumentRegistry::default(),
            requirements: RequirementRegistry::default(),
            messages: MessageRegistry::default(),
        }
    }
}
