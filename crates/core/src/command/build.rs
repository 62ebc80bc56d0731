//! Lowering declarations into the executable tree.
//!
//! All registry lookups and structural validation happen here, once, at
//! registration time.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;

use crate::argument::keyed::{ArgumentParser, Flag, FlagGroup, NamedArg, NamedGroup};
use crate::argument::{ArgumentKind, InternalArgument, KeyedArguments, KeyedInternal};
use crate::command::{Command, LeafCommand, ParentCommand};
use crate::declare::{
    CommandDeclaration, DEFAULT_LEAF, FlagsSource, LeafDeclaration, NamedSource,
    ParameterDeclaration, ParameterKind, ParentDeclaration, RequirementDeclaration,
    SuggestionSource,
};
use crate::error::RegistrationError;
use crate::meta::{Meta, keys};
use crate::registry::{ArgumentEntry, ArgumentSpec, RegistryContainer};
use crate::requirement::{Requirement, Settings};
use crate::sender::PermissionAdapter;
use crate::suggestion::{Suggestion, SuggestionKey, SuggestionMethod};
use crate::value::DeclaredType;

pub(crate) fn build_root<S>(
    declaration: ParentDeclaration<S>,
    registries: &RegistryContainer<S>,
    permissions: Option<&dyn PermissionAdapter>,
) -> Result<ParentCommand<S>, RegistrationError> {
    build_parent(declaration, None, None, registries, permissions)
}

fn build_parent<S>(
    declaration: ParentDeclaration<S>,
    parent_syntax: Option<&str>,
    parent_meta: Option<Arc<Meta>>,
    registries: &RegistryContainer<S>,
    permissions: Option<&dyn PermissionAdapter>,
) -> Result<ParentCommand<S>, RegistrationError> {
    let name = normalize_name(&declaration.name)?;
    let aliases = normalize_aliases(&declaration.aliases)?;
    let mut syntax = match parent_syntax {
        Some(parent) => format!("{parent} {name}"),
        None => format!("/{name}"),
    };

    let meta = Arc::new(build_meta(
        &name,
        &declaration.description,
        declaration.permission.as_deref(),
        parent_meta,
    ));

    let settings = resolve_requirements(declaration.requirements, registries, &name)?;

    let argument = match declaration.argument {
        Some(parameter) => {
            let internal = build_parameter(parameter, &name, registries)?;
            if internal.is_limitless() {
                return Err(RegistrationError::ParentArgumentNotSingleToken {
                    command: name,
                    parameter: internal.name().to_string(),
                });
            }
            syntax.push_str(&format!(" <{}>", internal.name()));
            Some(internal)
        }
        None => None,
    };
    register_permission(permissions, &syntax, &meta);

    let mut children = Vec::new();
    let mut lookup = IndexMap::new();
    let mut default = None;

    for child in declaration.children {
        let command = match child {
            CommandDeclaration::Parent(parent) => Command::Parent(build_parent(
                parent,
                Some(&syntax),
                Some(Arc::clone(&meta)),
                registries,
                permissions,
            )?),
            CommandDeclaration::Leaf(leaf) => Command::Leaf(build_leaf(
                leaf,
                &syntax,
                Arc::clone(&meta),
                registries,
                permissions,
            )?),
        };

        let index = children.len();
        if command.name() == DEFAULT_LEAF {
            if default.is_some() {
                return Err(RegistrationError::DuplicateChild {
                    parent: name,
                    child: DEFAULT_LEAF.to_string(),
                });
            }
            default = Some(index);
        } else {
            for key in std::iter::once(command.name()).chain(
                command.aliases().iter().map(String::as_str),
            ) {
                if lookup.insert(key.to_string(), index).is_some() {
                    return Err(RegistrationError::DuplicateChild {
                        parent: name,
                        child: key.to_string(),
                    });
                }
            }
        }
        children.push(Arc::new(command));
    }

    Ok(ParentCommand {
        name,
        aliases,
        syntax,
        meta,
        settings,
        argument,
        children,
        lookup,
        default,
    })
}

fn build_leaf<S>(
    declaration: LeafDeclaration<S>,
    parent_syntax: &str,
    parent_meta: Arc<Meta>,
    registries: &RegistryContainer<S>,
    permissions: Option<&dyn PermissionAdapter>,
) -> Result<LeafCommand<S>, RegistrationError> {
    let is_default = declaration.name == DEFAULT_LEAF;
    let name = if is_default {
        DEFAULT_LEAF.to_string()
    } else {
        normalize_name(&declaration.name)?
    };
    let aliases = normalize_aliases(&declaration.aliases)?;
    let mut syntax = if is_default {
        parent_syntax.to_string()
    } else {
        format!("{parent_syntax} {name}")
    };

    let meta = Arc::new(build_meta(
        &name,
        &declaration.description,
        declaration.permission.as_deref(),
        Some(parent_meta),
    ));

    let settings = resolve_requirements(declaration.requirements, registries, &name)?;

    let mut arguments = Vec::with_capacity(declaration.parameters.len());
    let mut seen = HashSet::new();
    let mut seen_optional = false;
    for parameter in declaration.parameters {
        if arguments.last().is_some_and(InternalArgument::is_limitless) {
            return Err(RegistrationError::ParameterAfterLimitless {
                command: name,
                parameter: parameter.name().to_string(),
            });
        }
        if seen_optional && !parameter.optional {
            return Err(RegistrationError::RequiredAfterOptional {
                command: name,
                parameter: parameter.name().to_string(),
            });
        }
        seen_optional |= parameter.optional;

        let internal = build_parameter(parameter, &name, registries)?;
        if !seen.insert(internal.name().to_string()) {
            return Err(RegistrationError::DuplicateParameter {
                command: name,
                parameter: internal.name().to_string(),
            });
        }
        if internal.optional() {
            syntax.push_str(&format!(" [{}]", internal.name()));
        } else {
            syntax.push_str(&format!(" <{}>", internal.name()));
        }
        arguments.push(internal);
    }
    register_permission(permissions, &syntax, &meta);

    Ok(LeafCommand {
        name,
        aliases,
        syntax,
        meta,
        settings,
        sender_type: declaration.sender_type,
        arguments,
        target: declaration.target,
    })
}

fn build_parameter<S>(
    declaration: ParameterDeclaration,
    command: &str,
    registries: &RegistryContainer<S>,
) -> Result<InternalArgument<S>, RegistrationError> {
    let ParameterDeclaration {
        name,
        description,
        optional,
        suggestion,
        kind,
    } = declaration;

    let (declared, kind) = match kind {
        ParameterKind::Typed(declared) => {
            let suggestion = resolve_suggestion(registries, &suggestion, declared, None);
            return typed_argument(
                registries,
                command,
                declared,
                &name,
                &description,
                optional,
                suggestion,
            );
        }
        ParameterKind::Enum(table) => {
            let declared = table.declared();
            (declared, ArgumentKind::Enum { table })
        }
        ParameterKind::Joined { delimiter } => (
            DeclaredType::of::<String>(),
            ArgumentKind::JoinedTail { delimiter },
        ),
        ParameterKind::Split {
            element,
            collection,
            separator,
        } => {
            let pattern = Regex::new(&separator).map_err(|source| {
                RegistrationError::InvalidSeparator {
                    command: command.to_string(),
                    parameter: name.clone(),
                    separator: separator.clone(),
                    source,
                }
            })?;
            let inner = element_argument(&name, element, registries, command)?;
            (
                element,
                ArgumentKind::SplitCollection {
                    separator,
                    pattern,
                    element: Box::new(inner),
                    collection,
                },
            )
        }
        ParameterKind::Collection {
            element,
            collection,
        } => {
            let inner = element_argument(&name, element, registries, command)?;
            (
                element,
                ArgumentKind::CollectionOf {
                    element: Box::new(inner),
                    collection,
                },
            )
        }
        ParameterKind::Keyed { flags, named } => {
            let keyed = build_keyed(&name, flags, named, registries, command)?;
            (DeclaredType::of::<KeyedArguments>(), ArgumentKind::Keyed(keyed))
        }
    };

    let suggestion = resolve_suggestion(registries, &suggestion, declared, Some(&kind));
    Ok(InternalArgument::new(
        name,
        description,
        declared,
        optional,
        suggestion,
        kind,
    ))
}

/// The element argument of a split or collection parameter.
fn element_argument<S>(
    name: &str,
    element: DeclaredType,
    registries: &RegistryContainer<S>,
    command: &str,
) -> Result<InternalArgument<S>, RegistrationError> {
    let suggestion = registries
        .suggestions
        .by_type(element.id())
        .unwrap_or(Suggestion::Empty);
    typed_argument(registries, command, element, name, "", false, suggestion)
}

fn build_keyed<S>(
    parameter: &str,
    flags: FlagsSource,
    named: NamedSource,
    registries: &RegistryContainer<S>,
    command: &str,
) -> Result<KeyedInternal<S>, RegistrationError> {
    let flags: Vec<Flag> = match flags {
        FlagsSource::Inline(flags) => flags,
        FlagsSource::Key(key) => registries
            .flags
            .get(&key)
            .ok_or_else(|| RegistrationError::UnknownFlagGroup {
                command: command.to_string(),
                key: key.name().to_string(),
            })?
            .to_vec(),
    };
    let named: Vec<NamedArg> = match named {
        NamedSource::Inline(named) => named,
        NamedSource::Key(key) => registries
            .named
            .get(&key)
            .ok_or_else(|| RegistrationError::UnknownNamedGroup {
                command: command.to_string(),
                key: key.name().to_string(),
            })?
            .to_vec(),
    };
    if flags.is_empty() && named.is_empty() {
        return Err(RegistrationError::EmptyKeyedParameter {
            command: command.to_string(),
            parameter: parameter.to_string(),
        });
    }

    let flags: Vec<Arc<Flag>> = flags.into_iter().map(Arc::new).collect();
    let named: Vec<Arc<NamedArg>> = named.into_iter().map(Arc::new).collect();

    let mut flag_arguments = IndexMap::new();
    for flag in &flags {
        let Some(declared) = flag.argument().copied() else {
            continue;
        };
        let suggestion = keyed_suggestion(registries, flag.suggestion(), declared);
        let internal = typed_argument(
            registries,
            command,
            declared,
            flag.key(),
            flag.description(),
            false,
            suggestion,
        )?;
        flag_arguments.insert(Arc::clone(flag), internal);
    }

    let mut named_arguments = IndexMap::new();
    for argument in &named {
        let declared = *argument.argument_type();
        let suggestion = keyed_suggestion(registries, argument.suggestion(), declared);
        let internal = match argument.collection() {
            Some((collection, separator)) => {
                let pattern = Regex::new(separator).map_err(|source| {
                    RegistrationError::InvalidSeparator {
                        command: command.to_string(),
                        parameter: argument.name().to_string(),
                        separator: separator.to_string(),
                        source,
                    }
                })?;
                let element = typed_argument(
                    registries,
                    command,
                    declared,
                    argument.name(),
                    "",
                    false,
                    suggestion.clone(),
                )?;
                InternalArgument::new(
                    argument.name(),
                    argument.description(),
                    declared,
                    false,
                    suggestion,
                    ArgumentKind::SplitCollection {
                        separator: separator.to_string(),
                        pattern,
                        element: Box::new(element),
                        collection,
                    },
                )
            }
            None => typed_argument(
                registries,
                command,
                declared,
                argument.name(),
                argument.description(),
                false,
                suggestion,
            )?,
        };
        named_arguments.insert(Arc::clone(argument), internal);
    }

    let parser = ArgumentParser::new(FlagGroup::new(&flags), NamedGroup::new(&named));
    Ok(KeyedInternal::new(flag_arguments, named_arguments, parser))
}

/// A single-token argument of `declared`: wired to the registered resolver,
/// or built wholesale by the type's factory when one is registered.
fn typed_argument<S>(
    registries: &RegistryContainer<S>,
    command: &str,
    declared: DeclaredType,
    name: &str,
    description: &str,
    optional: bool,
    suggestion: Suggestion<S>,
) -> Result<InternalArgument<S>, RegistrationError> {
    match registries.arguments.get(declared.id()) {
        Some(ArgumentEntry::Resolver(resolver)) => Ok(InternalArgument::new(
            name,
            description,
            declared,
            optional,
            suggestion,
            ArgumentKind::Single {
                resolver: Arc::clone(resolver),
            },
        )),
        Some(ArgumentEntry::Factory(factory)) => Ok(factory(ArgumentSpec {
            name,
            description,
            optional,
            suggestion,
        })),
        None => Err(RegistrationError::UnknownArgumentType {
            command: command.to_string(),
            type_name: declared.name().to_string(),
        }),
    }
}

fn resolve_suggestion<S>(
    registries: &RegistryContainer<S>,
    source: &SuggestionSource,
    declared: DeclaredType,
    kind: Option<&ArgumentKind<S>>,
) -> Suggestion<S> {
    match source {
        SuggestionSource::Key(key) => registries
            .suggestions
            .by_key(key)
            .unwrap_or(Suggestion::Empty),
        SuggestionSource::Inferred => match kind {
            // Enum parameters suggest their variant names out of the box.
            Some(ArgumentKind::Enum { table }) => {
                Suggestion::Static(table.names(), SuggestionMethod::StartsWith)
            }
            _ => registries
                .suggestions
                .by_type(declared.id())
                .unwrap_or(Suggestion::Empty),
        },
    }
}

fn keyed_suggestion<S>(
    registries: &RegistryContainer<S>,
    key: Option<&SuggestionKey>,
    declared: DeclaredType,
) -> Suggestion<S> {
    match key {
        Some(key) => registries
            .suggestions
            .by_key(key)
            .unwrap_or(Suggestion::Empty),
        None => registries
            .suggestions
            .by_type(declared.id())
            .unwrap_or(Suggestion::Empty),
    }
}

fn resolve_requirements<S>(
    declarations: Vec<RequirementDeclaration>,
    registries: &RegistryContainer<S>,
    command: &str,
) -> Result<Settings<S>, RegistrationError> {
    let mut requirements = Vec::with_capacity(declarations.len());
    for declaration in declarations {
        let resolver = registries.requirements.get(&declaration.key).ok_or_else(|| {
            RegistrationError::UnresolvedRequirement {
                command: command.to_string(),
                key: declaration.key.name().to_string(),
            }
        })?;
        requirements.push(Requirement::new(
            resolver,
            declaration.message,
            declaration.invert,
        ));
    }
    Ok(Settings::new(requirements))
}

fn build_meta(
    name: &str,
    description: &str,
    permission: Option<&str>,
    parent: Option<Arc<Meta>>,
) -> Meta {
    let mut builder = Meta::builder().add(&keys::NAME, name.to_string());
    if !description.is_empty() {
        builder = builder.add(&keys::DESCRIPTION, description.to_string());
    }
    if let Some(node) = permission {
        builder = builder.add(&keys::PERMISSION, node.to_string());
    }
    if let Some(parent) = parent {
        builder = builder.parent(parent);
    }
    builder.build()
}

/// Hands the adapter every permission guarding this command: its own node
/// first, then the inherited ones up the meta chain.
fn register_permission(permissions: Option<&dyn PermissionAdapter>, syntax: &str, meta: &Meta) {
    let Some(adapter) = permissions else {
        return;
    };
    for node in meta.chain(&keys::PERMISSION) {
        adapter.register(syntax, node);
    }
}

/// Trims and folds a declared name to lower-hyphen form; camelCase humps
/// become hyphen boundaries.
fn normalize_name(raw: &str) -> Result<String, RegistrationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RegistrationError::EmptyCommandName);
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        if ch.is_uppercase() {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

fn normalize_aliases(aliases: &[String]) -> Result<Vec<String>, RegistrationError> {
    aliases.iter().map(|alias| normalize_name(alias)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_fold_to_lower_hyphen() {
        assert_eq!(normalize_name("giveItem").unwrap(), "give-item");
        assert_eq!(normalize_name("  give  ").unwrap(), "give");
        assert_eq!(normalize_name("already-fine").unwrap(), "already-fine");
        assert!(matches!(
            normalize_name("   "),
            Err(RegistrationError::EmptyCommandName)
        ));
    }
}
