//! Top-level block metadata.

use std::collections::HashSet;

/// One top-level `message` or `enum` extracted from the schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    /// Identifier following the nesting keyword on the opening line
    pub name: String,
    /// Command id from a preceding `// CmdId:` line, 0 if none
    pub command_id: u32,
    /// Every line of the block, opening line first, sentinel lines excluded
    pub body_lines: Vec<String>,
    /// Custom types referenced inside the block.
    ///
    /// Collected in line order with duplicates; after
    /// [`ImportResolver::resolve`](crate::split::ImportResolver::resolve)
    /// it holds the pruned, de-duplicated import list.
    pub referenced_types: Vec<String>,
    /// Names of nesting constructs opened inside this block
    pub nested_type_names: HashSet<String>,
}

impl Block {
    /// Creates an empty block
    pub fn new(name: impl Into<String>, command_id: u32) -> Self {
        Self {
            name: name.into(),
            command_id,
            ..Default::default()
        }
    }

    /// Output file name for this block
    pub fn file_name(&self) -> String {
        format!("{}.proto", self.name)
    }

    /// Returns true if the block carries a command id
    pub fn has_command_id(&self) -> bool {
        self.command_id != 0
    }

    /// Drops locally nested names from the references and de-duplicates them,
    /// keeping first-occurrence order.
    pub(crate) fn prune_references(&mut self) {
        let mut seen = HashSet::new();
        let nested = &self.nested_type_names;
        self.referenced_types
            .retain(|name| !nested.contains(name) && seen.insert(name.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_references() {
        let mut block = Block::new("Outer", 0);
        block.referenced_types = ["Foo", "Bar", "Foo", "Inner", "Baz", "Bar"]
            .map(String::from)
            .to_vec();
        block.nested_type_names.insert("Inner".to_string());

        block.prune_references();
        assert_eq!(block.referenced_types, vec!["Foo", "Bar", "Baz"]);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(Block::new("PlayerInfo", 0).file_name(), "PlayerInfo.proto");
        assert!(Block::new("X", 3).has_command_id());
    }
}
