//! Command declarations: what the embedding application hands to the engine.
//!
//! Declarations are plain data. They are validated and lowered into the
//! executable tree when registered; nothing here touches a registry.

use std::sync::Arc;

use crate::argument::keyed::{ArgumentKey, Flag, FlagKey, NamedArg};
use crate::argument::{CollectionKind, EnumTable};
use crate::message::MessageKey;
use crate::requirement::RequirementKey;
use crate::suggestion::SuggestionKey;
use crate::value::{ArgValue, DeclaredType, take_value};

/// Name under which a parent's default leaf is stored. Never suggested.
pub const DEFAULT_LEAF: &str = "__DEFAULT__";

/// The resolved values handed to a command target.
pub struct Invocation {
    scope: Vec<ArgValue>,
    arguments: Vec<Option<ArgValue>>,
}

impl Invocation {
    pub fn new(scope: Vec<ArgValue>, arguments: Vec<Option<ArgValue>>) -> Self {
        Self { scope, arguments }
    }

    /// Takes the parameter at `index` out of the invocation.
    ///
    /// `None` for an absent optional, an out-of-range index, or a type
    /// mismatch.
    pub fn take<T: 'static>(&mut self, index: usize) -> Option<T> {
        take_value(self.arguments.get_mut(index)?.take()?)
    }

    /// Takes a parent-argument value, outermost parent first.
    pub fn take_scope<T: 'static>(&mut self, index: usize) -> Option<T> {
        if index >= self.scope.len() {
            return None;
        }
        take_value(self.scope.remove(index))
    }

    pub fn is_present(&self, index: usize) -> bool {
        matches!(self.arguments.get(index), Some(Some(_)))
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

/// What a leaf runs. Errors from here are the only errors execution returns.
pub type CommandTarget<S> = Arc<dyn Fn(&S, Invocation) -> anyhow::Result<()> + Send + Sync>;

/// One parameter input for by-name execution: the raw text, optionally
/// already resolved by the caller.
pub struct NamedInput {
    pub(crate) raw: String,
    pub(crate) value: Option<ArgValue>,
}

impl NamedInput {
    /// Raw text, resolved by the parameter's own resolver.
    pub fn raw(input: impl Into<String>) -> Self {
        Self {
            raw: input.into(),
            value: None,
        }
    }

    /// A pre-resolved value; the raw text is kept for diagnostics only.
    pub fn resolved(raw: impl Into<String>, value: ArgValue) -> Self {
        Self {
            raw: raw.into(),
            value: Some(value),
        }
    }
}

/// Where a parameter's suggestions come from.
pub enum SuggestionSource {
    /// Type-registered resolver, or variant names for enums.
    Inferred,
    Key(SuggestionKey),
}

/// Where a keyed parameter's flag list comes from.
pub enum FlagsSource {
    Inline(Vec<Flag>),
    Key(FlagKey),
}

/// Where a keyed parameter's named-argument list comes from.
pub enum NamedSource {
    Inline(Vec<NamedArg>),
    Key(ArgumentKey),
}

pub enum ParameterKind {
    /// One token resolved through the argument registry.
    Typed(DeclaredType),
    /// One token matched against a variant table.
    Enum(Arc<EnumTable>),
    /// Remaining tokens joined into one string.
    Joined { delimiter: String },
    /// One token split on a separator into a collection.
    Split {
        element: DeclaredType,
        collection: CollectionKind,
        separator: String,
    },
    /// Remaining tokens, one element each.
    Collection {
        element: DeclaredType,
        collection: CollectionKind,
    },
    /// Remaining tokens scanned for flags and named arguments.
    Keyed {
        flags: FlagsSource,
        named: NamedSource,
    },
}

pub struct ParameterDeclaration {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) optional: bool,
    pub(crate) suggestion: SuggestionSource,
    pub(crate) kind: ParameterKind,
}

impl ParameterDeclaration {
    fn base(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            optional: false,
            suggestion: SuggestionSource::Inferred,
            kind,
        }
    }

    /// A single-token parameter of type `T`.
    pub fn of<T: 'static>(name: impl Into<String>) -> Self {
        Self::base(name, ParameterKind::Typed(DeclaredType::of::<T>()))
    }

    /// A single-token parameter matched against fixed variants.
    pub fn enumeration(name: impl Into<String>, table: EnumTable) -> Self {
        Self::base(name, ParameterKind::Enum(Arc::new(table)))
    }

    /// A greedy tail parameter joining the rest of the input with spaces.
    pub fn joined(name: impl Into<String>) -> Self {
        Self::base(
            name,
            ParameterKind::Joined {
                delimiter: " ".into(),
            },
        )
    }

    /// One token split on `,` into a list of `T`.
    pub fn split_list_of<T: 'static>(name: impl Into<String>) -> Self {
        Self::base(
            name,
            ParameterKind::Split {
                element: DeclaredType::of::<T>(),
                collection: CollectionKind::List,
                separator: ",".into(),
            },
        )
    }

    /// One token split on `,` into a set of `T`.
    pub fn split_set_of<T: 'static>(name: impl Into<String>) -> Self {
        Self::base(
            name,
            ParameterKind::Split {
                element: DeclaredType::of::<T>(),
                collection: CollectionKind::Set,
                separator: ",".into(),
            },
        )
    }

    /// A greedy tail parameter collecting one `T` per token.
    pub fn list_of<T: 'static>(name: impl Into<String>) -> Self {
        Self::base(
            name,
            ParameterKind::Collection {
                element: DeclaredType::of::<T>(),
                collection: CollectionKind::List,
            },
        )
    }

    /// A greedy tail parameter collecting unique `T`s.
    pub fn set_of<T: 'static>(name: impl Into<String>) -> Self {
        Self::base(
            name,
            ParameterKind::Collection {
                element: DeclaredType::of::<T>(),
                collection: CollectionKind::Set,
            },
        )
    }

    /// A greedy tail parameter scanned for flags and named arguments.
    pub fn keyed(name: impl Into<String>) -> Self {
        Self::base(
            name,
            ParameterKind::Keyed {
                flags: FlagsSource::Inline(Vec::new()),
                named: NamedSource::Inline(Vec::new()),
            },
        )
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn suggestion(mut self, key: SuggestionKey) -> Self {
        self.suggestion = SuggestionSource::Key(key);
        self
    }

    /// Overrides the join delimiter of a joined parameter.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        if let ParameterKind::Joined { delimiter: existing } = &mut self.kind {
            *existing = delimiter.into();
        }
        self
    }

    /// Overrides the separator of a split parameter; a regex.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        if let ParameterKind::Split {
            separator: existing,
            ..
        } = &mut self.kind
        {
            *existing = separator.into();
        }
        self
    }

    /// Declares inline flags on a keyed parameter.
    pub fn flags(mut self, declared: Vec<Flag>) -> Self {
        if let ParameterKind::Keyed { flags, .. } = &mut self.kind {
            *flags = FlagsSource::Inline(declared);
        }
        self
    }

    /// Pulls the flag list from the flag registry.
    pub fn flags_key(mut self, key: FlagKey) -> Self {
        if let ParameterKind::Keyed { flags, .. } = &mut self.kind {
            *flags = FlagsSource::Key(key);
        }
        self
    }

    /// Declares inline named arguments on a keyed parameter.
    pub fn named(mut self, declared: Vec<NamedArg>) -> Self {
        if let ParameterKind::Keyed { named, .. } = &mut self.kind {
            *named = NamedSource::Inline(declared);
        }
        self
    }

    /// Pulls the named-argument list from the named-argument registry.
    pub fn named_key(mut self, key: ArgumentKey) -> Self {
        if let ParameterKind::Keyed { named, .. } = &mut self.kind {
            *named = NamedSource::Key(key);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A requirement reference, resolved against the requirement registry at
/// registration time.
pub struct RequirementDeclaration {
    pub key: RequirementKey,
    pub message: MessageKey,
    pub invert: bool,
}

impl RequirementDeclaration {
    pub fn new(key: RequirementKey, message: MessageKey) -> Self {
        Self {
            key,
            message,
            invert: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }
}

/// An executable command: parameters plus a target.
pub struct LeafDeclaration<S> {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: String,
    pub(crate) sender_type: Option<DeclaredType>,
    pub(crate) permission: Option<String>,
    pub(crate) requirements: Vec<RequirementDeclaration>,
    pub(crate) parameters: Vec<ParameterDeclaration>,
    pub(crate) target: CommandTarget<S>,
}

impl<S> LeafDeclaration<S> {
    pub fn new(
        name: impl Into<String>,
        target: impl Fn(&S, Invocation) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            sender_type: None,
            permission: None,
            requirements: Vec::new(),
            parameters: Vec::new(),
            target: Arc::new(target),
        }
    }

    /// The leaf that runs when its parent is invoked with no child name.
    pub fn default(
        target: impl Fn(&S, Invocation) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::new(DEFAULT_LEAF, target)
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restricts the leaf to senders the validator accepts for `T`.
    pub fn sender<T: 'static>(mut self) -> Self {
        self.sender_type = Some(DeclaredType::of::<T>());
        self
    }

    pub fn permission(mut self, node: impl Into<String>) -> Self {
        self.permission = Some(node.into());
        self
    }

    pub fn requirement(mut self, requirement: RequirementDeclaration) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn parameter(mut self, parameter: ParameterDeclaration) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// A grouping command holding children, optionally consuming one token as an
/// argument of its own.
pub struct ParentDeclaration<S> {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: String,
    pub(crate) permission: Option<String>,
    pub(crate) requirements: Vec<RequirementDeclaration>,
    pub(crate) argument: Option<ParameterDeclaration>,
    pub(crate) children: Vec<CommandDeclaration<S>>,
}

impl<S> ParentDeclaration<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            permission: None,
            requirements: Vec::new(),
            argument: None,
            children: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn permission(mut self, node: impl Into<String>) -> Self {
        self.permission = Some(node.into());
        self
    }

    pub fn requirement(mut self, requirement: RequirementDeclaration) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Makes this parent consume one token as a typed argument before
    /// descending. The value is added to the scope of every leaf below.
    pub fn argument(mut self, parameter: ParameterDeclaration) -> Self {
        self.argument = Some(parameter);
        self
    }

    pub fn child(mut self, child: CommandDeclaration<S>) -> Self {
        self.children.push(child);
        self
    }

    pub fn leaf(mut self, leaf: LeafDeclaration<S>) -> Self {
        self.children.push(CommandDeclaration::Leaf(leaf));
        self
    }

    pub fn parent(mut self, parent: ParentDeclaration<S>) -> Self {
        self.children.push(CommandDeclaration::Parent(parent));
        self
    }
}

pub enum CommandDeclaration<S> {
    Parent(ParentDeclaration<S>),
    Leaf(LeafDeclaration<S>),
}
