//! Internal arguments: the per-parameter resolution units the tree executes.
//!
//! Declarations are lowered into [`InternalArgument`]s at registration time;
//! by execution time every parameter knows how to turn its share of the
//! token stream into a value.

pub mod keyed;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;

use crate::resolve::{InvalidArgument, Resolve};
use crate::registry::ArgumentResolver;
use crate::suggestion::Suggestion;
use crate::value::{ArgValue, DeclaredType, arg_value};

pub use keyed::{
    ArgumentKey, ArgumentValue, CollectionKind, Flag, FlagGroup, FlagKey, KeyedArguments,
    NamedArg, NamedGroup,
};

use keyed::ArgumentParser;

/// Case-insensitive variant table for enum-like parameters.
///
/// Variant values are cloned out through a factory so the table can hand the
/// same variant to any number of invocations.
pub struct EnumTable {
    variants: IndexMap<String, Arc<dyn Fn() -> ArgValue + Send + Sync>>,
    declared: DeclaredType,
}

impl EnumTable {
    pub fn new<T, N>(variants: impl IntoIterator<Item = (N, T)>) -> Self
    where
        T: Clone + Send + Sync + 'static,
        N: Into<String>,
    {
        let mut table = IndexMap::new();
        for (name, value) in variants {
            let factory: Arc<dyn Fn() -> ArgValue + Send + Sync> =
                Arc::new(move || arg_value(value.clone()));
            table.insert(name.into().to_uppercase(), factory);
        }
        Self {
            variants: table,
            declared: DeclaredType::of::<T>(),
        }
    }

    pub fn resolve(&self, input: &str) -> Option<ArgValue> {
        self.variants.get(&input.to_uppercase()).map(|factory| factory())
    }

    /// Variant names in declaration order, lowercased for suggestions.
    pub fn names(&self) -> Vec<String> {
        self.variants.keys().map(|name| name.to_lowercase()).collect()
    }

    pub fn declared(&self) -> DeclaredType {
        self.declared
    }
}

/// How a parameter consumes tokens and produces its value.
pub enum ArgumentKind<S> {
    /// One token through a registered resolver.
    Single { resolver: ArgumentResolver<S> },
    /// One token matched case-insensitively against an [`EnumTable`].
    Enum { table: Arc<EnumTable> },
    /// All remaining tokens joined into one string.
    JoinedTail { delimiter: String },
    /// One token split on a separator, each piece resolved as `element`.
    SplitCollection {
        separator: String,
        pattern: Regex,
        element: Box<InternalArgument<S>>,
        collection: CollectionKind,
    },
    /// All remaining tokens, each resolved as `element`.
    CollectionOf {
        element: Box<InternalArgument<S>>,
        collection: CollectionKind,
    },
    /// All remaining tokens scanned for flags and named arguments.
    Keyed(KeyedInternal<S>),
}

pub struct InternalArgument<S> {
    name: String,
    description: String,
    declared: DeclaredType,
    optional: bool,
    suggestion: Suggestion<S>,
    kind: ArgumentKind<S>,
}

impl<S> InternalArgument<S> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        declared: DeclaredType,
        optional: bool,
        suggestion: Suggestion<S>,
        kind: ArgumentKind<S>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            declared,
            optional,
            suggestion,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn declared(&self) -> DeclaredType {
        self.declared
    }

    pub fn optional(&self) -> bool {
        self.optional
    }

    /// Limitless parameters consume every remaining token, so nothing may be
    /// declared after them.
    pub fn is_limitless(&self) -> bool {
        matches!(
            self.kind,
            ArgumentKind::JoinedTail { .. }
                | ArgumentKind::CollectionOf { .. }
                | ArgumentKind::Keyed(_)
        )
    }

    /// Resolves a single-token parameter.
    ///
    /// Limitless kinds re-tokenize the input on whitespace, which is how
    /// by-name execution supplies them through one string.
    pub fn resolve_single(&self, sender: &S, input: &str) -> Resolve<ArgValue> {
        match &self.kind {
            ArgumentKind::Single { resolver } => match resolver(sender, input) {
                Some(value) => Resolve::success(value),
                None => Resolve::invalid(InvalidArgument::new(input, &self.name, self.declared)),
            },
            ArgumentKind::Enum { table } => match table.resolve(input) {
                Some(value) => Resolve::success(value),
                None => Resolve::invalid(InvalidArgument::new(input, &self.name, self.declared)),
            },
            ArgumentKind::SplitCollection {
                pattern,
                element,
                collection,
                ..
            } => {
                let pieces: Vec<String> =
                    pattern.split(input).map(|piece| piece.to_string()).collect();
                self.resolve_pieces(sender, element, *collection, pieces)
            }
            ArgumentKind::JoinedTail { .. } => Resolve::success(arg_value(input.to_string())),
            ArgumentKind::CollectionOf { .. } | ArgumentKind::Keyed(_) => {
                let tokens: Vec<String> =
                    input.split_whitespace().map(|token| token.to_string()).collect();
                self.resolve_tail(sender, tokens)
            }
        }
    }

    /// Resolves a limitless parameter from the remaining tokens.
    pub fn resolve_tail(&self, sender: &S, tokens: Vec<String>) -> Resolve<ArgValue> {
        match &self.kind {
            ArgumentKind::JoinedTail { delimiter } => {
                Resolve::success(arg_value(tokens.join(delimiter)))
            }
            ArgumentKind::CollectionOf {
                element,
                collection,
            } => self.resolve_pieces(sender, element, *collection, tokens),
            ArgumentKind::Keyed(keyed) => keyed.resolve(sender, tokens),
            _ => self.resolve_single(sender, &tokens.join(" ")),
        }
    }

    fn resolve_pieces(
        &self,
        sender: &S,
        element: &InternalArgument<S>,
        collection: CollectionKind,
        mut pieces: Vec<String>,
    ) -> Resolve<ArgValue> {
        if collection == CollectionKind::Set {
            let mut seen = HashSet::new();
            pieces.retain(|piece| seen.insert(piece.clone()));
        }
        let mut values = Vec::with_capacity(pieces.len());
        for piece in pieces {
            match element.resolve_single(sender, &piece) {
                Resolve::Success(value) => values.push(value),
                Resolve::Failure(invalid) => return Resolve::invalid(invalid),
            }
        }
        Resolve::success(arg_value(values))
    }

    /// Completion candidates given every token this parameter has consumed
    /// so far; the last one is the partial token being completed.
    pub fn suggestions(&self, sender: &S, tokens: &VecDeque<String>) -> Vec<String> {
        match &self.kind {
            ArgumentKind::Keyed(keyed) => {
                let tokens: Vec<String> = tokens.iter().cloned().collect();
                keyed.suggestions(sender, &tokens)
            }
            _ => {
                let current = tokens.back().map(String::as_str).unwrap_or("");
                self.suggest_token(sender, current)
            }
        }
    }

    /// Candidates for one token, with collection-aware prefixing.
    fn suggest_token(&self, sender: &S, current: &str) -> Vec<String> {
        match &self.kind {
            ArgumentKind::SplitCollection {
                separator,
                pattern,
                element,
                ..
            } => {
                let pieces: Vec<&str> = pattern.split(current).collect();
                let (last, head) = pieces.split_last().unwrap_or((&"", &[]));
                let prefix = if head.is_empty() {
                    String::new()
                } else {
                    format!("{}{separator}", head.join(separator.as_str()))
                };
                element
                    .suggest_token(sender, *last)
                    .into_iter()
                    .map(|candidate| format!("{prefix}{candidate}"))
                    .collect()
            }
            ArgumentKind::CollectionOf { element, .. } => element.suggest_token(sender, current),
            _ => self.suggestion.suggest(sender, current),
        }
    }
}

/// A keyed parameter: flag and named-argument payload resolvers plus the
/// token scanner.
pub struct KeyedInternal<S> {
    flag_arguments: IndexMap<Arc<Flag>, InternalArgument<S>>,
    named_arguments: IndexMap<Arc<NamedArg>, InternalArgument<S>>,
    parser: ArgumentParser,
}

impl<S> KeyedInternal<S> {
    pub(crate) fn new(
        flag_arguments: IndexMap<Arc<Flag>, InternalArgument<S>>,
        named_arguments: IndexMap<Arc<NamedArg>, InternalArgument<S>>,
        parser: ArgumentParser,
    ) -> Self {
        Self {
            flag_arguments,
            named_arguments,
            parser,
        }
    }

    /// Scans the tokens and resolves every matched payload. The first payload
    /// that fails to resolve fails the whole parameter.
    fn resolve(&self, sender: &S, tokens: Vec<String>) -> Resolve<ArgValue> {
        let parsed = self.parser.parse(&tokens);
        let mut keyed = KeyedArguments::default();

        for (argument, raw) in &parsed.named {
            let Some(internal) = self.named_arguments.get(argument) else {
                continue;
            };
            match internal.resolve_single(sender, raw) {
                Resolve::Success(value) => keyed.insert_argument(argument.name(), raw.clone(), value),
                Resolve::Failure(invalid) => return Resolve::invalid(invalid),
            }
        }

        for (flag, raw) in &parsed.flags {
            if !flag.has_argument() {
                keyed.insert_flag(flag.short_name(), flag.long_name());
                continue;
            }
            let Some(internal) = self.flag_arguments.get(flag) else {
                keyed.insert_flag_value(flag.short_name(), flag.long_name(), raw.clone(), None);
                continue;
            };
            match internal.resolve_single(sender, raw) {
                Resolve::Success(value) => keyed.insert_flag_value(
                    flag.short_name(),
                    flag.long_name(),
                    raw.clone(),
                    Some(value),
                ),
                Resolve::Failure(invalid) => return Resolve::invalid(invalid),
            }
        }

        keyed.set_leftover(parsed.leftover);
        Resolve::success(arg_value(keyed))
    }

    fn suggestions(&self, sender: &S, tokens: &[String]) -> Vec<String> {
        let parsed = self.parser.parse(tokens);

        if let Some((flag, kind)) = &parsed.waiting_flag {
            let candidates = self
                .flag_arguments
                .get(flag)
                .map(|internal| internal.suggest_token(sender, &parsed.current))
                .unwrap_or_default();
            if !kind.has_equals() {
                return candidates;
            }
            let prefix = if kind.is_long() {
                format!("--{}", flag.long_name().unwrap_or_default())
            } else {
                format!("-{}", flag.short_name().unwrap_or_default())
            };
            return candidates
                .into_iter()
                .map(|candidate| format!("{prefix}={candidate}"))
                .collect();
        }

        if let Some(argument) = &parsed.waiting_argument {
            let candidates = self
                .named_arguments
                .get(argument)
                .map(|internal| internal.suggest_token(sender, &parsed.current))
                .unwrap_or_default();
            if candidates.is_empty() {
                return vec![format!("{}:", argument.name())];
            }
            return candidates
                .into_iter()
                .map(|candidate| format!("{}:{candidate}", argument.name()))
                .collect();
        }

        let current = parsed.current.as_str();
        if current.starts_with("--") {
            return self
                .parser
                .flags()
                .all()
                .iter()
                .filter(|flag| !parsed.flags.contains_key(*flag))
                .filter_map(|flag| flag.long_name())
                .map(|name| format!("--{name}"))
                .filter(|candidate| candidate.starts_with(current))
                .collect();
        }
        if current.starts_with('-') {
            return self
                .parser
                .flags()
                .all()
                .iter()
                .filter(|flag| !parsed.flags.contains_key(*flag))
                .filter_map(|flag| flag.short_name())
                .map(|name| format!("-{name}"))
                .filter(|candidate| candidate.starts_with(current))
                .collect();
        }
        self.parser
            .named()
            .all()
            .iter()
            .filter(|argument| !parsed.named.contains_key(*argument))
            .map(|argument| format!("{}:", argument.name()))
            .filter(|candidate| candidate.starts_with(current))
            .collect()
    }
}
