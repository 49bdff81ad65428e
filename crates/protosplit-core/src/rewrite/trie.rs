//! Character prefix tree for multi-pattern longest-match lookup.
//!
//! Each node owns its children exclusively. A node is terminal when it
//! carries a replacement. The tree is built once and only read afterwards,
//! so a shared `&Trie` can be used from any number of threads.

use std::collections::HashMap;

/// A single node of the [`Trie`]
#[derive(Debug, Default)]
pub struct TrieNode {
    children: HashMap<char, TrieNode>,
    replacement: Option<String>,
}

impl TrieNode {
    /// Returns true if a key ends at this node
    pub fn is_terminal(&self) -> bool {
        self.replacement.is_some()
    }

    /// The replacement stored for the key ending here
    pub fn replacement(&self) -> Option<&str> {
        self.replacement.as_deref()
    }

    /// Follows the edge labelled `c`
    pub fn child(&self, c: char) -> Option<&TrieNode> {
        self.children.get(&c)
    }
}

/// A match reported by [`Trie::longest_match_at`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieMatch<'a> {
    /// Byte offset one past the last matched character
    pub end: usize,
    /// Replacement associated with the matched key
    pub replacement: &'a str,
}

/// Prefix tree mapping keys to replacement strings
#[derive(Debug, Default)]
pub struct Trie {
    root: TrieNode,
    len: usize,
}

impl Trie {
    /// Creates an empty trie
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys stored
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no key was inserted
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `key`, replacing any previous value for the same key.
    ///
    /// Empty keys are ignored: a match always consumes at least one character.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        if key.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for c in key.chars() {
            node = node.children.entry(c).or_default();
        }
        if node.replacement.replace(value.into()).is_none() {
            self.len += 1;
        }
    }

    /// Finds the longest key that is a prefix of `text[start..]`.
    ///
    /// The walk stops at the first character without an edge; the last
    /// terminal node seen wins. No word-boundary check is made on either
    /// side of the match.
    pub fn longest_match_at(&self, text: &str, start: usize) -> Option<TrieMatch<'_>> {
        let rest = text.get(start..)?;
        let mut node = &self.root;
        let mut best = None;

        for (offset, c) in rest.char_indices() {
            let Some(next) = node.child(c) else {
                break;
            };
            node = next;
            if let Some(replacement) = node.replacement() {
                best = Some(TrieMatch {
                    end: start + offset + c.len_utf8(),
                    replacement,
                });
            }
        }

        best
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Trie {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut trie = Trie::new();
        for (key, value) in iter {
            trie.insert(key.as_ref(), value);
        }
        trie
    }
}
