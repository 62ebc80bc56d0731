//! Single-pass token scanner for keyed arguments.
//!
//! Tokens that match a declared flag or named argument are committed;
//! everything else falls through to the leftover list. The parser also
//! reports what the *last* token was in the middle of (`waiting_flag`,
//! `waiting_argument`) so suggestions can complete payloads.

use std::sync::Arc;

use indexmap::IndexMap;

use super::{Flag, FlagGroup, NamedArg, NamedGroup};

/// How a flag payload was being supplied when input ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagWaitingKind {
    /// `-f value`
    Short,
    /// `--flag value`
    Long,
    /// `-f=value`
    ShortEq,
    /// `--flag=value`
    LongEq,
}

impl FlagWaitingKind {
    pub fn has_equals(self) -> bool {
        matches!(self, Self::ShortEq | Self::LongEq)
    }

    pub fn is_long(self) -> bool {
        matches!(self, Self::Long | Self::LongEq)
    }
}

/// Parse outcome. Duplicate occurrences are last-wins; order of first
/// occurrence is preserved.
#[derive(Default)]
pub struct ParsedKeyed {
    pub named: IndexMap<Arc<NamedArg>, String>,
    pub flags: IndexMap<Arc<Flag>, String>,
    pub leftover: Vec<String>,
    /// Set when the final token was a named argument still taking its value.
    pub waiting_argument: Option<Arc<NamedArg>>,
    /// Set when the final token was a flag still taking its payload.
    pub waiting_flag: Option<(Arc<Flag>, FlagWaitingKind)>,
    /// The raw text being completed (payload in progress, or the last
    /// unmatched token).
    pub current: String,
}

pub struct ArgumentParser {
    flags: FlagGroup,
    named: NamedGroup,
}

impl ArgumentParser {
    pub fn new(flags: FlagGroup, named: NamedGroup) -> Self {
        Self { flags, named }
    }

    pub fn flags(&self) -> &FlagGroup {
        &self.flags
    }

    pub fn named(&self) -> &NamedGroup {
        &self.named
    }

    pub fn parse(&self, tokens: &[String]) -> ParsedKeyed {
        let mut out = ParsedKeyed::default();
        let mut index = 0;

        while index < tokens.len() {
            let token = &tokens[index];
            let is_last = index == tokens.len() - 1;
            out.current = token.clone();
            out.waiting_argument = None;
            out.waiting_flag = None;
            index += 1;

            if let Some(body) = token.strip_prefix("--") {
                if body.is_empty() {
                    out.leftover.push(token.clone());
                    continue;
                }
                if !self.parse_long(body, tokens, &mut index, is_last, &mut out) {
                    out.leftover.push(token.clone());
                }
                continue;
            }

            if let Some(body) = token.strip_prefix('-') {
                if body.is_empty() {
                    out.leftover.push(token.clone());
                    continue;
                }
                if !self.parse_short(body, tokens, &mut index, is_last, &mut out) {
                    out.leftover.push(token.clone());
                }
                continue;
            }

            if let Some((name, rest)) = token.split_once(':') {
                if self.parse_named(name, rest, tokens, &mut index, is_last, &mut out) {
                    continue;
                }
            }

            out.leftover.push(token.clone());
        }

        out
    }

    /// `--flag`, `--flag=value`, or `--flag value`. Long forms match exactly.
    fn parse_long(
        &self,
        body: &str,
        tokens: &[String],
        index: &mut usize,
        is_last: bool,
        out: &mut ParsedKeyed,
    ) -> bool {
        if let Some((name, value)) = body.split_once('=') {
            let Some(flag) = self.flags.match_exact(name) else {
                return false;
            };
            if flag.has_argument() {
                if is_last {
                    out.current = value.to_string();
                    out.waiting_flag = Some((Arc::clone(&flag), FlagWaitingKind::LongEq));
                }
                out.flags.insert(flag, value.to_string());
            } else {
                out.flags.insert(flag, String::new());
            }
            return true;
        }

        let Some(flag) = self.flags.match_exact(body) else {
            return false;
        };
        if flag.has_argument() {
            self.take_payload(flag, FlagWaitingKind::Long, tokens, index, is_last, out);
        } else {
            out.flags.insert(flag, String::new());
        }
        true
    }

    /// `-f`, `-f=value`, `-f value`, a unique prefix of a short form, or a
    /// cluster like `-abc`. A payload flag inside a cluster consumes the
    /// remainder of the cluster (or the next token) and ends it.
    fn parse_short(
        &self,
        body: &str,
        tokens: &[String],
        index: &mut usize,
        is_last: bool,
        out: &mut ParsedKeyed,
    ) -> bool {
        if let Some((name, value)) = body.split_once('=') {
            let flag = match self.flags.match_exact(name) {
                Some(flag) => flag,
                None => match self.flags.match_partial_single(name) {
                    Some(flag) => flag,
                    None => return false,
                },
            };
            if flag.has_argument() {
                if is_last {
                    out.current = value.to_string();
                    out.waiting_flag = Some((Arc::clone(&flag), FlagWaitingKind::ShortEq));
                }
                out.flags.insert(flag, value.to_string());
            } else {
                out.flags.insert(flag, String::new());
            }
            return true;
        }

        if let Some(flag) = self
            .flags
            .match_exact(body)
            .or_else(|| self.flags.match_partial_single(body))
        {
            if flag.has_argument() {
                self.take_payload(flag, FlagWaitingKind::Short, tokens, index, is_last, out);
            } else {
                out.flags.insert(flag, String::new());
            }
            return true;
        }

        // Cluster of single-character flags. Any unknown character rejects
        // the whole token.
        let mut committed = Vec::new();
        let mut chars = body.char_indices();
        while let Some((position, ch)) = chars.next() {
            let Some(flag) = self.flags.match_exact(&ch.to_string()) else {
                return false;
            };
            if flag.has_argument() {
                let rest = &body[position + ch.len_utf8()..];
                for (flag, value) in committed {
                    out.flags.insert(flag, value);
                }
                if rest.is_empty() {
                    self.take_payload(flag, FlagWaitingKind::Short, tokens, index, is_last, out);
                } else {
                    if is_last {
                        out.current = rest.to_string();
                        out.waiting_flag = Some((Arc::clone(&flag), FlagWaitingKind::Short));
                    }
                    out.flags.insert(flag, rest.to_string());
                }
                return true;
            }
            committed.push((flag, String::new()));
        }
        for (flag, value) in committed {
            out.flags.insert(flag, value);
        }
        true
    }

    /// Commits a payload flag whose value comes from the next token.
    fn take_payload(
        &self,
        flag: Arc<Flag>,
        kind: FlagWaitingKind,
        tokens: &[String],
        index: &mut usize,
        is_last: bool,
        out: &mut ParsedKeyed,
    ) {
        if is_last {
            out.current = String::new();
            out.waiting_flag = Some((Arc::clone(&flag), kind));
            out.flags.insert(flag, String::new());
            return;
        }
        let value = tokens[*index].clone();
        let value_is_last = *index == tokens.len() - 1;
        *index += 1;
        if value_is_last {
            out.current = value.clone();
            out.waiting_flag = Some((Arc::clone(&flag), kind));
        }
        out.flags.insert(flag, value);
    }

    /// `name:value`, or `name:` taking the next token as its value. Names
    /// match exactly or by unique prefix.
    fn parse_named(
        &self,
        name: &str,
        rest: &str,
        tokens: &[String],
        index: &mut usize,
        is_last: bool,
        out: &mut ParsedKeyed,
    ) -> bool {
        let argument = match self.named.match_exact(name) {
            Some(argument) => argument,
            None => match self.named.match_partial_single(name) {
                Some(argument) => argument,
                None => return false,
            },
        };

        if !rest.is_empty() {
            if is_last {
                out.current = rest.to_string();
                out.waiting_argument = Some(Arc::clone(&argument));
            }
            out.named.insert(argument, rest.to_string());
            return true;
        }

        if is_last {
            out.current = String::new();
            out.waiting_argument = Some(Arc::clone(&argument));
            out.named.insert(argument, String::new());
            return true;
        }

        let value = tokens[*index].clone();
        let value_is_last = *index == tokens.len() - 1;
        *index += 1;
        if value_is_last {
            out.current = value.clone();
            out.waiting_argument = Some(Arc::clone(&argument));
        }
        out.named.insert(argument, value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ArgumentParser {
        let flags = vec![
            Arc::new(Flag::short("v").long("verbose").build()),
            Arc::new(Flag::short("o").long("out").argument::<String>().build()),
            Arc::new(Flag::short("f").build()),
        ];
        let named = vec![
            Arc::new(NamedArg::of::<String>("path").build()),
            Arc::new(NamedArg::of::<i32>("port").build()),
        ];
        ArgumentParser::new(FlagGroup::new(&flags), NamedGroup::new(&named))
    }

    fn tokens(input: &[&str]) -> Vec<String> {
        input.iter().map(|token| token.to_string()).collect()
    }

    fn flag_value<'a>(parsed: &'a ParsedKeyed, key: &str) -> Option<&'a str> {
        parsed
            .flags
            .iter()
            .find(|(flag, _)| flag.key() == key)
            .map(|(_, value)| value.as_str())
    }

    fn named_value<'a>(parsed: &'a ParsedKeyed, name: &str) -> Option<&'a str> {
        parsed
            .named
            .iter()
            .find(|(argument, _)| argument.name() == name)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn named_value_inline_and_split() {
        let parsed = parser().parse(&tokens(&["path:/tmp/x", "port:", "8080", "done"]));

        assert_eq!(named_value(&parsed, "path"), Some("/tmp/x"));
        assert_eq!(named_value(&parsed, "port"), Some("8080"));
        assert_eq!(parsed.leftover, ["done"]);
    }

    #[test]
    fn named_prefix_match() {
        let parsed = parser().parse(&tokens(&["pa:/x", "next"]));
        assert_eq!(named_value(&parsed, "path"), Some("/x"));
        // "p" is ambiguous between path and port.
        let parsed = parser().parse(&tokens(&["p:/x", "next"]));
        assert_eq!(parsed.leftover, ["p:/x", "next"]);
    }

    #[test]
    fn flag_forms() {
        let parsed = parser().parse(&tokens(&["-v", "--out=build", "rest"]));

        assert_eq!(flag_value(&parsed, "v"), Some(""));
        assert_eq!(flag_value(&parsed, "o"), Some("build"));
        assert_eq!(parsed.leftover, ["rest"]);
    }

    #[test]
    fn payload_from_next_token() {
        let parsed = parser().parse(&tokens(&["-o", "build", "rest"]));
        assert_eq!(flag_value(&parsed, "o"), Some("build"));
        assert_eq!(parsed.leftover, ["rest"]);
    }

    #[test]
    fn cluster_with_trailing_payload() {
        let parsed = parser().parse(&tokens(&["-vfo", "build", "x"]));

        assert_eq!(flag_value(&parsed, "v"), Some(""));
        assert_eq!(flag_value(&parsed, "f"), Some(""));
        assert_eq!(flag_value(&parsed, "o"), Some("build"));
        assert_eq!(parsed.leftover, ["x"]);
    }

    #[test]
    fn cluster_with_inline_payload() {
        let parsed = parser().parse(&tokens(&["-vobuild", "x"]));

        assert_eq!(flag_value(&parsed, "v"), Some(""));
        assert_eq!(flag_value(&parsed, "o"), Some("build"));
        assert_eq!(parsed.leftover, ["x"]);
    }

    #[test]
    fn unknown_cluster_character_rejects_token() {
        let parsed = parser().parse(&tokens(&["-vz", "x"]));
        assert!(parsed.flags.is_empty());
        assert_eq!(parsed.leftover, ["-vz", "x"]);
    }

    #[test]
    fn bare_hyphens_are_leftover() {
        let parsed = parser().parse(&tokens(&["-", "--", "x"]));
        assert_eq!(parsed.leftover, ["-", "--", "x"]);
    }

    #[test]
    fn waiting_flag_on_terminal_payload() {
        let parsed = parser().parse(&tokens(&["-o"]));
        let (flag, kind) = parsed.waiting_flag.as_ref().unwrap();
        assert_eq!(flag.key(), "o");
        assert_eq!(*kind, FlagWaitingKind::Short);
        assert_eq!(parsed.current, "");

        let parsed = parser().parse(&tokens(&["--out=bui"]));
        let (_, kind) = parsed.waiting_flag.as_ref().unwrap();
        assert_eq!(*kind, FlagWaitingKind::LongEq);
        assert_eq!(parsed.current, "bui");

        let parsed = parser().parse(&tokens(&["-o", "bui"]));
        assert!(parsed.waiting_flag.is_some());
        assert_eq!(parsed.current, "bui");
    }

    #[test]
    fn waiting_argument_on_terminal_value() {
        let parsed = parser().parse(&tokens(&["path:/tm"]));
        assert_eq!(parsed.waiting_argument.as_ref().unwrap().name(), "path");
        assert_eq!(parsed.current, "/tm");
    }

    #[test]
    fn no_waiting_hints_for_interior_tokens() {
        let parsed = parser().parse(&tokens(&["path:/tmp", "-o", "build", "trail"]));
        assert!(parsed.waiting_argument.is_none());
        assert!(parsed.waiting_flag.is_none());
        assert_eq!(parsed.current, "trail");
    }

    #[test]
    fn duplicates_last_wins() {
        let parsed = parser().parse(&tokens(&["path:/a", "path:/b", "end"]));
        assert_eq!(parsed.named.len(), 1);
        assert_eq!(named_value(&parsed, "path"), Some("/b"));
    }
}
