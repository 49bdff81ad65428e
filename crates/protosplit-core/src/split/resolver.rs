//! Import pruning and emission eligibility.

use super::block::Block;
use crate::error::Result;
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info};

/// Default pattern for names that are still obfuscated
pub const OBFUSCATED_NAME_PATTERN: &str = "^[A-Z]+$";

/// Why a block is or is not written out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Carries a command id
    Command,
    /// No command id, but another block imports it
    Dependency,
    /// Has a command id but the name still looks obfuscated
    Obfuscated,
    /// No command id and nothing imports it
    Unreferenced,
    /// Named in the blacklist
    Blacklisted,
}

impl Eligibility {
    /// Returns true if the block should be emitted
    pub fn is_emitted(self) -> bool {
        matches!(self, Eligibility::Command | Eligibility::Dependency)
    }
}

/// A finalized block and its emission decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBlock {
    /// The block, with its import list pruned and de-duplicated
    pub block: Block,
    /// Emission decision
    pub eligibility: Eligibility,
}

impl ResolvedBlock {
    /// Returns true if the block should be emitted
    pub fn is_emitted(&self) -> bool {
        self.eligibility.is_emitted()
    }

    /// The pruned import list
    pub fn imports(&self) -> &[String] {
        &self.block.referenced_types
    }
}

/// Finalizes parsed blocks and decides which are emitted
#[derive(Debug, Clone)]
pub struct ImportResolver {
    obfuscated_name: Option<Regex>,
    blacklist: HashSet<String>,
}

impl Default for ImportResolver {
    fn default() -> Self {
        Self {
            obfuscated_name: Regex::new(OBFUSCATED_NAME_PATTERN).ok(),
            blacklist: HashSet::new(),
        }
    }
}

impl ImportResolver {
    /// Creates a resolver with the default obfuscation heuristic
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the obfuscated-name pattern; an empty pattern disables the check
    pub fn obfuscated_name_pattern(mut self, pattern: &str) -> Result<Self> {
        self.obfuscated_name = if pattern.is_empty() {
            None
        } else {
            Some(Regex::new(pattern)?)
        };
        Ok(self)
    }

    /// Adds names that are never emitted
    pub fn blacklist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist.extend(names.into_iter().map(Into::into));
        self
    }

    fn looks_obfuscated(&self, name: &str) -> bool {
        self.obfuscated_name
            .as_ref()
            .is_some_and(|re| re.is_match(name))
    }

    /// Prunes every block, then decides eligibility against the union of
    /// all pruned import lists. Order of `blocks` is preserved.
    pub fn resolve(&self, blocks: Vec<Block>) -> Vec<ResolvedBlock> {
        let blocks: Vec<Block> = blocks
            .into_par_iter()
            .map(|mut block| {
                block.prune_references();
                block
            })
            .collect();

        let referenced: HashSet<&str> = blocks
            .iter()
            .flat_map(|b| b.referenced_types.iter().map(String::as_str))
            .collect();

        let eligibility: Vec<Eligibility> = blocks
            .iter()
            .map(|block| {
                let decision = if self.blacklist.contains(&block.name) {
                    Eligibility::Blacklisted
                } else if block.has_command_id() {
                    if self.looks_obfuscated(&block.name) {
                        Eligibility::Obfuscated
                    } else {
                        Eligibility::Command
                    }
                } else if referenced.contains(block.name.as_str()) {
                    Eligibility::Dependency
                } else {
                    Eligibility::Unreferenced
                };
                debug!("Block '{}': {:?}", block.name, decision);
                decision
            })
            .collect();

        let resolved: Vec<ResolvedBlock> = blocks
            .into_iter()
            .zip(eligibility)
            .map(|(block, eligibility)| ResolvedBlock { block, eligibility })
            .collect();

        info!(
            "Resolved {} blocks, {} eligible for emission",
            resolved.len(),
            resolved.iter().filter(|b| b.is_emitted()).count()
        );
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(name: &str, command_id: u32, refs: &[&str]) -> Block {
        let mut block = Block::new(name, command_id);
        block.referenced_types = refs.iter().map(|s| s.to_string()).collect();
        block
    }

    fn decisions(resolved: &[ResolvedBlock]) -> Vec<(&str, Eligibility)> {
        resolved
            .iter()
            .map(|r| (r.block.name.as_str(), r.eligibility))
            .collect()
    }

    #[test]
    fn test_local_names_are_not_imported() {
        let mut outer = block("Outer", 5, &["Foo", "Bar", "Foo"]);
        outer.nested_type_names.insert("Foo".to_string());
        let resolved = ImportResolver::new().resolve(vec![outer]);
        assert_eq!(resolved[0].imports().to_vec(), vec!["Bar"]);
    }

    #[test]
    fn test_eligibility_rules() {
        let resolved = ImportResolver::new().resolve(vec![
            block("FOOBAR", 10, &[]),
            block("GetPlayerReq", 11, &["PlayerInfo"]),
            block("PlayerInfo", 0, &[]),
            block("Orphan", 0, &[]),
            block("ABC", 0, &[]),
        ]);
        assert_eq!(
            decisions(&resolved),
            vec![
                ("FOOBAR", Eligibility::Obfuscated),
                ("GetPlayerReq", Eligibility::Command),
                ("PlayerInfo", Eligibility::Dependency),
                ("Orphan", Eligibility::Unreferenced),
                ("ABC", Eligibility::Unreferenced),
            ]
        );
    }

    #[test]
    fn test_obfuscated_command_block_skipped_even_if_referenced() {
        let resolved = ImportResolver::new().resolve(vec![
            block("QWERTY", 3, &[]),
            block("Req", 4, &["QWERTY"]),
        ]);
        assert_eq!(resolved[0].eligibility, Eligibility::Obfuscated);
    }

    #[test]
    fn test_self_nested_reference_does_not_make_dependency() {
        let mut holder = block("Holder", 0, &["Holder"]);
        holder.nested_type_names.insert("Holder".to_string());
        let resolved = ImportResolver::new().resolve(vec![holder]);
        assert_eq!(resolved[0].eligibility, Eligibility::Unreferenced);
    }

    #[test]
    fn test_disabled_heuristic_and_blacklist() {
        let resolver = ImportResolver::new()
            .obfuscated_name_pattern("")
            .unwrap()
            .blacklist(["Hidden"]);
        let resolved = resolver.resolve(vec![block("FOOBAR", 10, &[]), block("Hidden", 9, &[])]);
        assert_eq!(resolved[0].eligibility, Eligibility::Command);
        assert_eq!(resolved[1].eligibility, Eligibility::Blacklisted);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(ImportResolver::new().obfuscated_name_pattern("(").is_err());
    }
}
