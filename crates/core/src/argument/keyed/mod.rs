//! Keyed arguments: flags (`-f`, `--flag`, `-f=value`), named arguments
//! (`name:value`), and the free-form leftover text between them.

mod parser;
mod values;

pub(crate) use parser::ArgumentParser;
pub use values::{ArgumentValue, KeyedArguments};

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::suggestion::SuggestionKey;
use crate::value::DeclaredType;

/// Key under which a reusable flag list is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlagKey(String);

impl FlagKey {
    pub fn of(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Key under which a reusable named-argument list is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgumentKey(String);

impl ArgumentKey {
    pub fn of(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// A flag declaration: a short form, a long form, or both, with an optional
/// typed payload.
///
/// Equality and hashing consider the forms and the payload type only.
#[derive(Debug, Clone)]
pub struct Flag {
    short: Option<String>,
    long: Option<String>,
    description: String,
    argument: Option<DeclaredType>,
    suggestion: Option<SuggestionKey>,
}

impl Flag {
    /// Starts a builder from the short form (`-f` is declared as `"f"`).
    pub fn short(flag: impl Into<String>) -> FlagBuilder {
        FlagBuilder {
            flag: Flag {
                short: Some(flag.into()),
                long: None,
                description: String::new(),
                argument: None,
                suggestion: None,
            },
        }
    }

    /// Starts a builder from the long form (`--force` is declared as
    /// `"force"`).
    pub fn long(flag: impl Into<String>) -> FlagBuilder {
        FlagBuilder {
            flag: Flag {
                short: None,
                long: Some(flag.into()),
                description: String::new(),
                argument: None,
                suggestion: None,
            },
        }
    }

    pub fn short_name(&self) -> Option<&str> {
        self.short.as_deref()
    }

    pub fn long_name(&self) -> Option<&str> {
        self.long.as_deref()
    }

    /// The short form if present, otherwise the long form.
    pub fn key(&self) -> &str {
        self.short
            .as_deref()
            .or(self.long.as_deref())
            .unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn has_argument(&self) -> bool {
        self.argument.is_some()
    }

    pub fn argument(&self) -> Option<&DeclaredType> {
        self.argument.as_ref()
    }

    pub fn suggestion(&self) -> Option<&SuggestionKey> {
        self.suggestion.as_ref()
    }
}

impl PartialEq for Flag {
    fn eq(&self, other: &Self) -> bool {
        self.short == other.short && self.long == other.long && self.argument == other.argument
    }
}

impl Eq for Flag {}

impl Hash for Flag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.short.hash(state);
        self.long.hash(state);
        self.argument.hash(state);
    }
}

pub struct FlagBuilder {
    flag: Flag,
}

impl FlagBuilder {
    pub fn short(mut self, flag: impl Into<String>) -> Self {
        self.flag.short = Some(flag.into());
        self
    }

    pub fn long(mut self, flag: impl Into<String>) -> Self {
        self.flag.long = Some(flag.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.flag.description = description.into();
        self
    }

    /// Declares a typed payload (`-f=value` or `-f value`).
    pub fn argument<T: 'static>(mut self) -> Self {
        self.flag.argument = Some(DeclaredType::of::<T>());
        self
    }

    pub fn suggestion(mut self, key: SuggestionKey) -> Self {
        self.flag.suggestion = Some(key);
        self
    }

    pub fn build(self) -> Flag {
        self.flag
    }
}

/// Which collection a multi-value argument produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
}

/// A named argument declaration (`name:value`), optionally a collection of
/// values split on a separator.
///
/// Equality and hashing are by name.
#[derive(Debug, Clone)]
pub struct NamedArg {
    name: String,
    description: String,
    argument_type: DeclaredType,
    suggestion: Option<SuggestionKey>,
    collection: Option<(CollectionKind, String)>,
}

impl NamedArg {
    /// A single-value named argument of type `T`.
    pub fn of<T: 'static>(name: impl Into<String>) -> NamedArgBuilder {
        NamedArgBuilder {
            arg: NamedArg {
                name: name.into(),
                description: String::new(),
                argument_type: DeclaredType::of::<T>(),
                suggestion: None,
                collection: None,
            },
        }
    }

    /// A list of `T` values, split on `,` by default.
    pub fn list_of<T: 'static>(name: impl Into<String>) -> NamedArgBuilder {
        let mut builder = Self::of::<T>(name);
        builder.arg.collection = Some((CollectionKind::List, ",".to_string()));
        builder
    }

    /// A set of `T` values, split on `,` by default.
    pub fn set_of<T: 'static>(name: impl Into<String>) -> NamedArgBuilder {
        let mut builder = Self::of::<T>(name);
        builder.arg.collection = Some((CollectionKind::Set, ",".to_string()));
        builder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn argument_type(&self) -> &DeclaredType {
        &self.argument_type
    }

    pub fn suggestion(&self) -> Option<&SuggestionKey> {
        self.suggestion.as_ref()
    }

    pub fn collection(&self) -> Option<(CollectionKind, &str)> {
        self.collection
            .as_ref()
            .map(|(kind, separator)| (*kind, separator.as_str()))
    }
}

impl PartialEq for NamedArg {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for NamedArg {}

impl Hash for NamedArg {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

pub struct NamedArgBuilder {
    arg: NamedArg,
}

impl NamedArgBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.arg.description = description.into();
        self
    }

    pub fn suggestion(mut self, key: SuggestionKey) -> Self {
        self.arg.suggestion = Some(key);
        self
    }

    /// Element separator for collection forms; a regex, default `,`.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        if let Some((_, existing)) = self.arg.collection.as_mut() {
            *existing = separator.into();
        }
        self
    }

    pub fn build(self) -> NamedArg {
        self.arg
    }
}

fn strip_leading_hyphens(token: &str) -> &str {
    if let Some(stripped) = token.strip_prefix("--") {
        stripped
    } else if let Some(stripped) = token.strip_prefix('-') {
        stripped
    } else {
        token
    }
}

/// Flag lookup by short form, long form, or unique short prefix.
pub struct FlagGroup {
    short: IndexMap<String, Arc<Flag>>,
    long: IndexMap<String, Arc<Flag>>,
    all: Vec<Arc<Flag>>,
}

impl FlagGroup {
    pub fn new(flags: &[Arc<Flag>]) -> Self {
        let mut short = IndexMap::new();
        let mut long = IndexMap::new();
        for flag in flags {
            if let Some(name) = flag.short_name() {
                short.insert(name.to_string(), Arc::clone(flag));
            }
            if let Some(name) = flag.long_name() {
                long.insert(name.to_string(), Arc::clone(flag));
            }
        }
        Self {
            short,
            long,
            all: flags.to_vec(),
        }
    }

    /// Every accepted form, hyphens included.
    pub fn all_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.short.keys().map(|name| format!("-{name}")).collect();
        names.extend(self.long.keys().map(|name| format!("--{name}")));
        names
    }

    pub fn is_empty(&self) -> bool {
        self.short.is_empty() && self.long.is_empty()
    }

    /// Exact lookup; leading hyphens on the token are ignored.
    pub fn match_exact(&self, token: &str) -> Option<Arc<Flag>> {
        let stripped = strip_leading_hyphens(token);
        self.short
            .get(stripped)
            .or_else(|| self.long.get(stripped))
            .cloned()
    }

    /// The unique short form the token is a prefix of, if exactly one.
    pub fn match_partial_single(&self, token: &str) -> Option<Arc<Flag>> {
        let stripped = strip_leading_hyphens(token);
        if stripped.is_empty() {
            return None;
        }
        let mut matches = self
            .short
            .iter()
            .filter(|(name, _)| name.starts_with(stripped))
            .map(|(_, flag)| flag);
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(Arc::clone(first))
    }

    pub fn all(&self) -> &[Arc<Flag>] {
        &self.all
    }
}

/// Named-argument lookup by name or unique name prefix.
pub struct NamedGroup {
    arguments: IndexMap<String, Arc<NamedArg>>,
}

impl NamedGroup {
    pub fn new(arguments: &[Arc<NamedArg>]) -> Self {
        let mut map = IndexMap::new();
        for argument in arguments {
            map.insert(argument.name().to_string(), Arc::clone(argument));
        }
        Self { arguments: map }
    }

    pub fn all_names(&self) -> Vec<String> {
        self.arguments.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    pub fn match_exact(&self, token: &str) -> Option<Arc<NamedArg>> {
        self.arguments.get(token).cloned()
    }

    pub fn match_partial_single(&self, token: &str) -> Option<Arc<NamedArg>> {
        if token.is_empty() {
            return None;
        }
        let mut matches = self
            .arguments
            .iter()
            .filter(|(name, _)| name.starts_with(token))
            .map(|(_, argument)| argument);
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(Arc::clone(first))
    }

    pub fn all(&self) -> Vec<Arc<NamedArg>> {
        self.arguments.values().cloned().collect()
    }
}
