//! Identifier de-obfuscation over raw schema text.
//!
//! ## Algorithm Overview
//!
//! 1. Build a [`Trie`] from the admitted mapping keys
//! 2. Scan each line left to right, asking the trie for the longest key at
//!    the cursor
//! 3. Emit the replacement and jump past the match, or copy one character
//! 4. Append a `/*[key->value, ...]*/` note listing what was replaced
//!
//! Lines are independent once the trie is built, so [`TokenRewriter::rewrite_lines`]
//! fans them out over a rayon pool and collects them back in input order.

mod trie;

use crate::mapping::MappingTable;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

pub use trie::{Trie, TrieMatch, TrieNode};

/// Opening delimiter of the replacement note
pub const ANNOTATION_OPEN: &str = " /*[";
/// Closing delimiter of the replacement note
pub const ANNOTATION_CLOSE: &str = "]*/";

/// One rewritten line and the substitutions made in it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewrittenLine {
    /// The output text, including the note if one was appended
    pub text: String,
    /// `(matched, replacement)` pairs in first-occurrence order, one per distinct match
    pub replacements: Vec<(String, String)>,
}

impl RewrittenLine {
    /// Returns true if any key was replaced by a different value
    pub fn changed(&self) -> bool {
        !self.replacements.is_empty()
    }
}

impl From<&MappingTable> for Trie {
    fn from(table: &MappingTable) -> Self {
        table.iter().collect()
    }
}

/// Applies a [`Trie`] to lines of text
#[derive(Debug, Clone, Copy)]
pub struct TokenRewriter<'t> {
    trie: &'t Trie,
    annotate: bool,
}

impl<'t> TokenRewriter<'t> {
    /// Creates a rewriter that annotates changed lines
    pub fn new(trie: &'t Trie) -> Self {
        Self {
            trie,
            annotate: true,
        }
    }

    /// Sets whether the replacement note is appended
    pub fn annotate(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Rewrites a single line
    pub fn rewrite_line(&self, line: &str) -> RewrittenLine {
        if line.is_empty() || self.trie.is_empty() {
            return RewrittenLine {
                text: line.to_string(),
                replacements: Vec::new(),
            };
        }

        let mut text = String::with_capacity(line.len() * 2);
        let mut replacements: Vec<(String, String)> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut i = 0;

        while i < line.len() {
            match self.trie.longest_match_at(line, i) {
                Some(m) => {
                    let matched = &line[i..m.end];
                    text.push_str(m.replacement);
                    if matched != m.replacement && seen.insert(matched) {
                        replacements.push((matched.to_string(), m.replacement.to_string()));
                    }
                    i = m.end;
                }
                None => {
                    // `i` always sits on a char boundary: matches end on one
                    // and we advance by whole characters otherwise.
                    let c = line[i..].chars().next().unwrap_or_default();
                    text.push(c);
                    i += c.len_utf8().max(1);
                }
            }
        }

        if self.annotate && !replacements.is_empty() {
            text.push_str(ANNOTATION_OPEN);
            for (n, (from, to)) in replacements.iter().enumerate() {
                if n > 0 {
                    text.push_str(", ");
                }
                text.push_str(from);
                text.push_str("->");
                text.push_str(to);
            }
            text.push_str(ANNOTATION_CLOSE);
        }

        RewrittenLine { text, replacements }
    }

    /// Rewrites many lines in parallel, preserving their order
    pub fn rewrite_lines<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Vec<RewrittenLine> {
        let out: Vec<RewrittenLine> = lines
            .par_iter()
            .map(|line| self.rewrite_line(line.as_ref()))
            .collect();

        debug!(
            "Rewrote {} lines, {} changed",
            out.len(),
            out.iter().filter(|l| l.changed()).count()
        );
        out
    }
}
