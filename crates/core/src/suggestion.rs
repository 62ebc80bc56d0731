//! Suggestion resolvers and filtering.

use std::sync::Arc;

/// Produces completion candidates for the current partial token.
pub type SuggestionResolver<S> = Arc<dyn Fn(&S, &str) -> Vec<String> + Send + Sync>;

/// Key under which a suggestion resolver is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuggestionKey(String);

impl SuggestionKey {
    pub fn of(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// How candidates are filtered against the current partial token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionMethod {
    StartsWith,
    Contains,
}

impl SuggestionMethod {
    fn matches(self, candidate: &str, current: &str) -> bool {
        if current.is_empty() {
            return true;
        }
        let candidate = candidate.to_lowercase();
        let current = current.to_lowercase();
        match self {
            Self::StartsWith => candidate.starts_with(&current),
            Self::Contains => candidate.contains(&current),
        }
    }
}

/// The suggestion source attached to an internal argument.
pub enum Suggestion<S> {
    /// No suggestions.
    Empty,
    /// A registered resolver plus its filtering method.
    Resolver(SuggestionResolver<S>, SuggestionMethod),
    /// A fixed candidate list (enum variant names use this).
    Static(Vec<String>, SuggestionMethod),
}

impl<S> Suggestion<S> {
    /// Candidates for `current`, filtered by the configured method.
    pub fn suggest(&self, sender: &S, current: &str) -> Vec<String> {
        match self {
            Self::Empty => Vec::new(),
            Self::Resolver(resolver, method) => resolver(sender, current)
                .into_iter()
                .filter(|candidate| method.matches(candidate, current))
                .collect(),
            Self::Static(candidates, method) => candidates
                .iter()
                .filter(|candidate| method.matches(candidate, current))
                .cloned()
                .collect(),
        }
    }
}

impl<S> Clone for Suggestion<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Resolver(resolver, method) => Self::Resolver(Arc::clone(resolver), *method),
            Self::Static(candidates, method) => Self::Static(candidates.clone(), *method),
        }
    }
}

impl<S> std::fmt::Debug for Suggestion<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Suggestion::Empty"),
            Self::Resolver(_, method) => write!(f, "Suggestion::Resolver({method:?})"),
            Self::Static(candidates, method) => {
                write!(f, "Suggestion::Static({} candidates, {method:?})", candidates.len())
            }
        }
    }
}
