//! Line-oriented block parser.
//!
//! This is not a grammar. Lines are classified by their trimmed prefix and
//! a nesting counter tracks how deep the cursor is. A nesting keyword at
//! depth 0 opens a new top-level [`Block`]; deeper ones are recorded as
//! names local to the current block. Every line after the first block is
//! appended to whichever block was opened last.

use super::block::Block;
use crate::error::{Error, Result};
use crate::vocabulary::{TokenClass, TypeVocabulary, Vocabulary};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{trace, warn};

/// Line that closes a nesting construct
pub const CLOSING_LINE: &str = "}";

static LEADING_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z0-9_]+)").expect("valid regex"));

static ENUM_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z0-9_]+\s*=\s*\d+\s*;").expect("valid regex"));

static LABELED_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+\s+([A-Za-z0-9_]+)").expect("valid regex"));

static MAP_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"map<\s*([A-Za-z0-9_]+)\s*,\s*([A-Za-z0-9_]+)\s*>").expect("valid regex")
});

/// Shared header lines plus every top-level block, in input order
#[derive(Debug, Clone, Default)]
pub struct ParsedSchema {
    /// `syntax`/`package`/`import` lines seen before the first block
    pub header_lines: Vec<String>,
    /// Top-level blocks
    pub blocks: Vec<Block>,
}

/// Streaming parser context; feed lines with [`BlockParser::push_line`]
#[derive(Debug)]
pub struct BlockParser<V = TypeVocabulary> {
    vocabulary: V,
    name_patterns: Vec<(String, Regex)>,
    depth: usize,
    pending_command_id: u32,
    current: Option<usize>,
    line_number: usize,
    schema: ParsedSchema,
}

impl BlockParser<TypeVocabulary> {
    /// Creates a parser over the default vocabulary
    pub fn new() -> Self {
        Self::with_vocabulary(TypeVocabulary::default())
    }
}

impl Default for BlockParser<TypeVocabulary> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Vocabulary> BlockParser<V> {
    /// Creates a parser over a custom vocabulary
    pub fn with_vocabulary(vocabulary: V) -> Self {
        let name_patterns = vocabulary
            .nesting_keywords()
            .iter()
            .map(|keyword| {
                let pattern = format!(r"^{}\s+([A-Za-z0-9_]+)", regex::escape(keyword));
                // Escaped literal plus a fixed suffix always compiles.
                let regex = Regex::new(&pattern).expect("valid regex");
                (format!("{} ", keyword), regex)
            })
            .collect();

        Self {
            vocabulary,
            name_patterns,
            depth: 0,
            pending_command_id: 0,
            current: None,
            line_number: 0,
            schema: ParsedSchema::default(),
        }
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Blocks opened so far
    pub fn blocks(&self) -> &[Block] {
        &self.schema.blocks
    }

    /// Parses every line of `text`
    pub fn parse_str(mut self, text: &str) -> Result<ParsedSchema> {
        for line in text.lines() {
            self.push_line(line)?;
        }
        self.finish()
    }

    /// Consumes one de-obfuscated line.
    ///
    /// Fails with [`Error::UnbalancedNesting`] when a closing line appears
    /// with nothing open.
    pub fn push_line(&mut self, line: &str) -> Result<()> {
        self.line_number += 1;
        let trimmed = line.trim();

        if self.current.is_none()
            && self
                .vocabulary
                .header_prefixes()
                .iter()
                .any(|p| trimmed.starts_with(p.as_str()))
        {
            self.schema.header_lines.push(line.to_string());
            return Ok(());
        }

        let marker = self.vocabulary.command_id_marker();
        if let Some(rest) = trimmed
            .strip_prefix(marker)
            .filter(|rest| rest.starts_with(' '))
        {
            self.pending_command_id = extract_command_id(rest).unwrap_or(0);
            trace!(
                "Line {}: pending command id {}",
                self.line_number,
                self.pending_command_id
            );
            return Ok(());
        }

        let nesting = self.open_nesting(trimmed);
        let reference = if nesting {
            None
        } else {
            self.referenced_type(trimmed)
        };

        if trimmed == CLOSING_LINE {
            self.depth = self
                .depth
                .checked_sub(1)
                .ok_or_else(|| Error::unbalanced_nesting(self.line_number))?;
        }

        if let Some(index) = self.current {
            let block = &mut self.schema.blocks[index];
            block.body_lines.push(line.to_string());
            if let Some(name) = reference {
                block.referenced_types.push(name);
            }
        }

        Ok(())
    }

    /// Ends the input and returns what was parsed.
    ///
    /// Blocks still open are kept as they are, with a warning.
    pub fn finish(self) -> Result<ParsedSchema> {
        if self.depth > 0 {
            warn!(
                "Schema ended with {} unclosed nesting level(s)",
                self.depth
            );
        }
        Ok(self.schema)
    }

    /// Handles a nesting keyword line; returns true if `trimmed` is one.
    fn open_nesting(&mut self, trimmed: &str) -> bool {
        let Some((_, pattern)) = self
            .name_patterns
            .iter()
            .find(|(prefix, _)| trimmed.starts_with(prefix.as_str()))
        else {
            return false;
        };

        let Some(name) = pattern
            .captures(trimmed)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
        else {
            return true;
        };

        match self.current {
            Some(index) if self.depth > 0 => {
                self.schema.blocks[index].nested_type_names.insert(name);
            }
            _ => {
                let command_id = std::mem::take(&mut self.pending_command_id);
                trace!(
                    "Line {}: block '{}' (command id {})",
                    self.line_number,
                    name,
                    command_id
                );
                self.schema.blocks.push(Block::new(name, command_id));
                self.current = Some(self.schema.blocks.len() - 1);
            }
        }
        self.depth += 1;
        true
    }

    /// Custom type referenced by a field line, if any
    fn referenced_type(&self, trimmed: &str) -> Option<String> {
        let token = LEADING_TOKEN.captures(trimmed)?.get(1)?.as_str();

        if ENUM_VALUE.is_match(trimmed) {
            return None;
        }

        let candidate = match self.vocabulary.classify(token) {
            TokenClass::Custom => return Some(token.to_string()),
            TokenClass::Label => LABELED_TYPE.captures(trimmed)?.get(1)?.as_str(),
            TokenClass::Map => MAP_TYPE.captures(trimmed)?.get(2)?.as_str(),
            TokenClass::Nesting
            | TokenClass::Scalar
            | TokenClass::Directive
            | TokenClass::Suppressed => return None,
        };

        self.vocabulary
            .classify(candidate)
            .is_custom()
            .then(|| candidate.to_string())
    }
}

/// Parses the leading integer of the text after the command id marker
fn extract_command_id(rest: &str) -> Option<u32> {
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> ParsedSchema {
        BlockParser::new().parse_str(text).unwrap()
    }

    #[test]
    fn test_header_lines_before_first_block() {
        let schema = parse(
            "syntax = \"proto3\";\npackage proto;\nimport \"other.proto\";\n\nmessage A {\n}\nimport \"late.proto\";\n",
        );
        assert_eq!(
            schema.header_lines,
            vec!["syntax = \"proto3\";", "package proto;", "import \"other.proto\";"]
        );
        assert_eq!(schema.blocks.len(), 1);
        assert_eq!(schema.blocks[0].body_lines.last().unwrap(), "import \"late.proto\";");
    }

    #[test]
    fn test_command_id_attaches_to_next_block_only() {
        let schema = parse("// CmdId: 7\nmessage A {\n}\nmessage B {\n}\n");
        assert_eq!(schema.blocks[0].command_id, 7);
        assert_eq!(schema.blocks[1].command_id, 0);
        assert_eq!(schema.blocks[0].body_lines, vec!["message A {", "}"]);
    }

    #[test]
    fn test_unparsable_command_id_is_zero() {
        let schema = parse("// CmdId: 99999999999\nmessage A {\n}\n// CmdId: x\nmessage B {\n}\n");
        assert_eq!(schema.blocks[0].command_id, 0);
        assert_eq!(schema.blocks[1].command_id, 0);
    }

    #[test]
    fn test_nested_types_are_local() {
        let schema = parse(
            "message Outer {\n  enum Kind {\n    NONE = 0;\n  }\n  message Inner {\n    Kind k = 1;\n  }\n  oneof choice {\n    Other o = 2;\n  }\n  Inner i = 3;\n}\n",
        );
        let outer = &schema.blocks[0];
        assert_eq!(schema.blocks.len(), 1);
        assert_eq!(outer.name, "Outer");
        let mut nested: Vec<_> = outer.nested_type_names.iter().cloned().collect();
        nested.sort();
        assert_eq!(nested, vec!["Inner", "Kind", "choice"]);
        assert_eq!(outer.referenced_types, vec!["Kind", "Other", "Inner"]);
    }

    #[test]
    fn test_field_reference_shapes() {
        let schema = parse(concat!(
            "message M {\n",
            "  uint32 a = 1;\n",
            "  repeated Item items = 2;\n",
            "  repeated string tags = 3;\n",
            "  map<uint32, Entry> entries = 4;\n",
            "  map<string, int64> counts = 5;\n",
            "  google.protobuf.Any data = 6;\n",
            "  optional Extra extra = 7;\n",
            "  Plain plain = 8; /*[XYZ->Plain]*/\n",
            "  option deprecated = true;\n",
            "  // comment\n",
            "}\n",
        ));
        assert_eq!(
            schema.blocks[0].referenced_types,
            vec!["Item", "Entry", "Extra", "Plain"]
        );
    }

    #[test]
    fn test_enum_values_never_reference() {
        let schema = parse("enum Retcode {\n  RET_SUCC = 0;\n  RetFail = 1; /*[A->B]*/\n}\n");
        assert!(schema.blocks[0].referenced_types.is_empty());
    }

    #[test]
    fn test_depth_returns_to_zero() {
        let mut parser = BlockParser::new();
        for line in ["message A {", "  message B {", "  }", "}"] {
            parser.push_line(line).unwrap();
        }
        assert_eq!(parser.depth(), 0);
        assert_eq!(parser.blocks().len(), 1);
    }

    #[test]
    fn test_extra_closing_brace_is_fatal() {
        let err = BlockParser::new()
            .parse_str("message A {\n}\n}\n")
            .unwrap_err();
        assert!(matches!(err, Error::UnbalancedNesting { line: 3 }));
    }

    #[test]
    fn test_unclosed_block_is_kept() {
        let schema = parse("message A {\n  B b = 1;\n");
        assert_eq!(schema.blocks.len(), 1);
        assert_eq!(schema.blocks[0].referenced_types, vec!["B"]);
    }

    #[test]
    fn test_nesting_keyword_without_name() {
        let mut parser = BlockParser::new();
        parser.push_line("message {").unwrap();
        assert_eq!(parser.depth(), 0);
        assert!(parser.blocks().is_empty());
    }

    #[test]
    fn test_extract_command_id() {
        assert_eq!(extract_command_id(" 46"), Some(46));
        assert_eq!(extract_command_id("   12 trailing"), Some(12));
        assert_eq!(extract_command_id(" 7;"), Some(7));
        assert_eq!(extract_command_id(" abc"), None);
        assert_eq!(extract_command_id(" "), None);
    }

    #[test]
    fn test_custom_command_id_marker() {
        let parser = || {
            BlockParser::with_vocabulary(TypeVocabulary::new().with_command_id_marker("// Op:"))
        };

        let schema = parser().parse_str("// Op: 5\nmessage A {\n}\n").unwrap();
        assert_eq!(schema.blocks[0].command_id, 5);
        assert_eq!(schema.blocks[0].body_lines, vec!["message A {", "}"]);

        let schema = parser().parse_str("// CmdId: 9\nmessage B {\n}\n").unwrap();
        assert_eq!(schema.blocks[0].command_id, 0);
    }
}
