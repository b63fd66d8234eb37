#![warn(missing_docs)]
//! `cursor-core-lang` - data-driven language configuration helpers for `cursor-core`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any parsing or
//! highlighting systems. It provides small structs that hosts can use to configure
//! cursor/edit behavior in a language-aware way: bracket pairs for auto-closing, a
//! word-boundary definition for word-wise movement and deletion, and indentation hints
//! used when typing a newline.

use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;

/// A matching pair of bracket characters (e.g. `(` / `)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketPair {
    /// Opening character.
    pub open: char,
    /// Closing character.
    pub close: char,
}

impl BracketPair {
    /// Create a bracket pair.
    pub const fn new(open: char, close: char) -> Self {
        Self { open, close }
    }
}

/// Language configuration consumed by the editor kernel.
///
/// The kernel treats this as an opaque capability: it asks for bracket pairs, word
/// spans, and indentation hints, and does not interpret the language id itself.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    id: String,
    brackets: Vec<BracketPair>,
    word_definition: Regex,
    indent_unit: String,
    increase_indent_after: Vec<char>,
}

impl LanguageConfig {
    /// Default word definition: runs of word characters (Unicode-aware `\w`).
    pub fn default_word_definition() -> Regex {
        Regex::new(r"\w+").expect("static pattern")
    }

    /// A plain-text configuration: default word boundaries, no brackets, no indent rules.
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            brackets: Vec::new(),
            word_definition: Self::default_word_definition(),
            indent_unit: "    ".to_string(),
            increase_indent_after: Vec::new(),
        }
    }

    /// A C-like configuration: `()`, `[]`, `{}` pairs and quote auto-closing,
    /// with indentation increased after an open brace/bracket/paren.
    pub fn c_like(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            brackets: vec![
                BracketPair::new('(', ')'),
                BracketPair::new('[', ']'),
                BracketPair::new('{', '}'),
                BracketPair::new('"', '"'),
                BracketPair::new('\'', '\''),
            ],
            word_definition: Self::default_word_definition(),
            indent_unit: "    ".to_string(),
            increase_indent_after: vec!['(', '[', '{'],
        }
    }

    /// Replace the bracket pairs.
    pub fn with_brackets(mut self, brackets: Vec<BracketPair>) -> Self {
        self.brackets = brackets;
        self
    }

    /// Replace the word definition regex.
    pub fn with_word_definition(mut self, word_definition: Regex) -> Self {
        self.word_definition = word_definition;
        self
    }

    /// Replace the indentation unit inserted when indentation increases (default: 4 spaces).
    pub fn with_indent_unit(mut self, unit: impl Into<String>) -> Self {
        self.indent_unit = unit.into();
        self
    }

    /// Replace the set of characters after which a newline increases indentation.
    pub fn with_increase_indent_after(mut self, chars: Vec<char>) -> Self {
        self.increase_indent_after = chars;
        self
    }

    /// The language identifier this configuration was registered under.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Configured bracket pairs.
    pub fn brackets(&self) -> &[BracketPair] {
        &self.brackets
    }

    /// The indentation unit (inserted once per indent level).
    pub fn indent_unit(&self) -> &str {
        &self.indent_unit
    }

    /// Look up the pair whose opening character is `open`.
    pub fn bracket_for_open(&self, open: char) -> Option<BracketPair> {
        self.brackets.iter().copied().find(|b| b.open == open)
    }

    /// Returns `true` if a newline typed right after `ch` should increase indentation.
    pub fn increases_indent_after(&self, ch: char) -> bool {
        self.increase_indent_after.contains(&ch)
    }

    /// Returns `true` if `ch` is part of a word under this language's word definition.
    pub fn is_word_char(&self, ch: char) -> bool {
        let mut buf = [0u8; 4];
        self.word_definition.is_match(ch.encode_utf8(&mut buf))
    }

    /// Word spans within `line`, as half-open **character** ranges.
    ///
    /// The regex operates on bytes; spans are converted so callers can work in the
    /// char-based column space the editor kernel uses.
    pub fn word_spans(&self, line: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        for m in self.word_definition.find_iter(line) {
            let start = line[..m.start()].chars().count();
            let len = m.as_str().chars().count();
            spans.push(start..start + len);
        }
        spans
    }
}

/// Registry of language configurations, keyed by language id.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    configs: BTreeMap<String, LanguageConfig>,
}

impl LanguageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a configuration under its own id.
    pub fn register(&mut self, config: LanguageConfig) {
        self.configs.insert(config.id.clone(), config);
    }

    /// Look up a configuration by language id.
    pub fn get(&self, id: &str) -> Option<&LanguageConfig> {
        self.configs.get(id)
    }

    /// Look up a configuration, falling back to a plain-text configuration.
    pub fn get_or_plain(&self, id: &str) -> LanguageConfig {
        self.configs
            .get(id)
            .cloned()
            .unwrap_or_else(|| LanguageConfig::plain(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_spans_are_char_based() {
        let config = LanguageConfig::plain("plaintext");
        let spans = config.word_spans("héllo  wörld");
        assert_eq!(spans, vec![0..5, 7..12]);
    }

    #[test]
    fn bracket_lookup() {
        let config = LanguageConfig::c_like("rust");
        assert_eq!(
            config.bracket_for_open('{'),
            Some(BracketPair::new('{', '}'))
        );
        assert_eq!(config.bracket_for_open('>'), None);
        assert!(config.increases_indent_after('{'));
        assert!(!config.increases_indent_after('"'));
    }

    #[test]
    fn registry_fallback_is_plain() {
        let registry = LanguageRegistry::new();
        let config = registry.get_or_plain("unknown");
        assert_eq!(config.id(), "unknown");
        assert!(config.brackets().is_empty());
    }
}
