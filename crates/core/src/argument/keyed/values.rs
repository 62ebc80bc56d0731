//! Resolved keyed arguments, as handed to command targets.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::ArgValue;

/// A resolved value together with the raw text it came from.
pub struct ArgumentValue {
    raw: String,
    value: Option<ArgValue>,
}

impl ArgumentValue {
    pub fn new(raw: String, value: Option<ArgValue>) -> Self {
        Self { raw, value }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value<T: Clone + 'static>(&self) -> Option<T> {
        self.value.as_ref()?.downcast_ref::<T>().cloned()
    }

    fn value_ref(&self) -> Option<&ArgValue> {
        self.value.as_ref()
    }
}

enum FlagEntry {
    /// A switch flag, present with no payload.
    Present,
    /// A payload flag. Shared between the short and long keys.
    Value(Arc<ArgumentValue>),
}

/// Everything a keyed parameter produced: named values, flags, and the
/// unmatched leftover tokens.
#[derive(Default)]
pub struct KeyedArguments {
    arguments: IndexMap<String, ArgumentValue>,
    flags: IndexMap<String, FlagEntry>,
    leftover: Vec<String>,
}

impl KeyedArguments {
    pub(crate) fn insert_argument(&mut self, name: &str, raw: String, value: ArgValue) {
        self.arguments
            .insert(name.to_string(), ArgumentValue::new(raw, Some(value)));
    }

    /// Records a switch flag under both of its forms.
    pub(crate) fn insert_flag(&mut self, short: Option<&str>, long: Option<&str>) {
        for key in [short, long].into_iter().flatten() {
            self.flags.insert(key.to_string(), FlagEntry::Present);
        }
    }

    /// Records a payload flag under both of its forms, sharing one value.
    pub(crate) fn insert_flag_value(
        &mut self,
        short: Option<&str>,
        long: Option<&str>,
        raw: String,
        value: Option<ArgValue>,
    ) {
        let shared = Arc::new(ArgumentValue::new(raw, value));
        for key in [short, long].into_iter().flatten() {
            self.flags
                .insert(key.to_string(), FlagEntry::Value(Arc::clone(&shared)));
        }
    }

    pub(crate) fn set_leftover(&mut self, leftover: Vec<String>) {
        self.leftover = leftover;
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.contains_key(key)
    }

    pub fn has_flags(&self) -> bool {
        !self.flags.is_empty()
    }

    /// The typed payload of a flag, under either form.
    pub fn flag_value<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        match self.flags.get(key)? {
            FlagEntry::Present => None,
            FlagEntry::Value(value) => value.value(),
        }
    }

    /// The raw payload text of a flag.
    pub fn flag_raw(&self, key: &str) -> Option<&str> {
        match self.flags.get(key)? {
            FlagEntry::Present => None,
            FlagEntry::Value(value) => Some(value.raw()),
        }
    }

    /// Every form a present flag was recorded under.
    pub fn all_flags(&self) -> Vec<&str> {
        self.flags.keys().map(String::as_str).collect()
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    pub fn has_arguments(&self) -> bool {
        !self.arguments.is_empty()
    }

    /// A single-value named argument.
    pub fn argument<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.arguments.get(name)?.value()
    }

    pub fn argument_raw(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).map(ArgumentValue::raw)
    }

    /// A list-valued named argument. `None` if absent or of another type.
    pub fn list_argument<T: Clone + 'static>(&self, name: &str) -> Option<Vec<T>> {
        let value = self.arguments.get(name)?.value_ref()?;
        let items = value.downcast_ref::<Vec<ArgValue>>()?;
        items
            .iter()
            .map(|item| item.downcast_ref::<T>().cloned())
            .collect()
    }

    /// A set-valued named argument. `None` if absent or of another type.
    pub fn set_argument<T: Clone + Eq + Hash + 'static>(&self, name: &str) -> Option<HashSet<T>> {
        Some(self.list_argument::<T>(name)?.into_iter().collect())
    }

    /// Name → value view over every resolved named argument.
    pub fn all_arguments(&self) -> impl Iterator<Item = (&str, &ArgumentValue)> {
        self.arguments
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Leftover tokens joined with spaces.
    pub fn text(&self) -> String {
        self.text_with(" ")
    }

    pub fn text_with(&self, delimiter: &str) -> String {
        self.leftover.join(delimiter)
    }

    pub fn leftover(&self) -> &[String] {
        &self.leftover
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_payload_shared_between_forms() {
        let mut keyed = KeyedArguments::default();
        keyed.insert_flag_value(
            Some("o"),
            Some("out"),
            "build".into(),
            Some(Box::new("build".to_string())),
        );

        assert!(keyed.has_flag("o"));
        assert!(keyed.has_flag("out"));
        assert_eq!(keyed.flag_value::<String>("o").as_deref(), Some("build"));
        assert_eq!(keyed.flag_raw("out"), Some("build"));
    }

    #[test]
    fn switch_flag_has_no_payload() {
        let mut keyed = KeyedArguments::default();
        keyed.insert_flag(Some("v"), Some("verbose"));

        assert!(keyed.has_flag("verbose"));
        assert_eq!(keyed.flag_value::<String>("v"), None);
        assert_eq!(keyed.flag_raw("v"), None);
    }

    #[test]
    fn list_argument_downcasts_elements() {
        let mut keyed = KeyedArguments::default();
        let items: Vec<ArgValue> = vec![Box::new(1_i32), Box::new(2_i32)];
        keyed.insert_argument("nums", "1,2".into(), Box::new(items));

        assert_eq!(keyed.list_argument::<i32>("nums").unwrap(), [1, 2]);
        assert!(keyed.list_argument::<String>("nums").is_none());
        assert_eq!(keyed.argument_raw("nums"), Some("1,2"));
    }

    #[test]
    fn leftover_text_joins_tokens() {
        let mut keyed = KeyedArguments::default();
        keyed.set_leftover(vec!["hello".into(), "world".into()]);

        assert_eq!(keyed.text(), "hello world");
        assert_eq!(keyed.text_with(", "), "hello, world");
        assert!(!keyed.has_flags());
        assert!(!keyed.has_arguments());
    }
}
