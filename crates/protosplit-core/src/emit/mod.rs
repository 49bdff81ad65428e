//! Rendering of per-block `.proto` files.
//!
//! Every emitted file has the same layout:
//!
//! 1. Provenance comment lines, then a blank line
//! 2. The shared header lines (`syntax`, `package`, options), then a blank line
//! 3. One `import "<Name>.proto";` per pruned reference, then a blank line
//! 4. The block's body, with a `CmdId` enum injected after the opening line
//!    when the block carries a command id
//!
//! The [`OutputSink`] trait decides where rendered files end up.

mod writer;

use crate::split::{Block, ResolvedBlock};
use std::fmt::Write as FmtWrite;

pub use writer::{NullSink, OutputSink, StatsSink};

/// Name of the injected command id enum
pub const COMMAND_ID_ENUM: &str = "CmdId";

/// Configuration for file rendering
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Indentation string (default: one tab)
    pub indent_str: String,
    /// Comment lines written at the top of every file, without `// `
    pub provenance: Vec<String>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            indent_str: "\t".to_string(),
            provenance: Vec::new(),
        }
    }
}

impl EmitterConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Adds a provenance comment line
    pub fn provenance_line(mut self, line: impl Into<String>) -> Self {
        self.provenance.push(line.into());
        self
    }
}

/// A rendered block file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    /// File name relative to the output directory
    pub file_name: String,
    /// Name of the block it was rendered from
    pub block_name: String,
    /// The block's command id, 0 if none
    pub command_id: u32,
    /// Full file contents
    pub contents: String,
}

/// Renders blocks against a shared header
#[derive(Debug, Clone)]
pub struct ProtoEmitter<'a> {
    header_lines: &'a [String],
    config: EmitterConfig,
}

impl<'a> ProtoEmitter<'a> {
    /// Creates an emitter for the given shared header
    pub fn new(header_lines: &'a [String]) -> Self {
        Self {
            header_lines,
            config: EmitterConfig::default(),
        }
    }

    /// Creates a new emitter with custom config
    pub fn with_config(mut self, config: EmitterConfig) -> Self {
        self.config = config;
        self
    }

    /// Renders one resolved block
    pub fn render(&self, resolved: &ResolvedBlock) -> EmittedFile {
        let mut contents = String::new();
        self.write_block(&mut contents, &resolved.block, resolved.imports())
            .expect("String write cannot fail");

        EmittedFile {
            file_name: resolved.block.file_name(),
            block_name: resolved.block.name.clone(),
            command_id: resolved.block.command_id,
            contents,
        }
    }

    /// Renders the whole rewritten schema with the provenance header
    pub fn render_combined<S: AsRef<str>>(&self, lines: &[S]) -> String {
        let mut out = String::new();
        self.write_combined(&mut out, lines)
            .expect("String write cannot fail");
        out
    }

    fn write_provenance(&self, w: &mut impl FmtWrite) -> std::fmt::Result {
        for line in &self.config.provenance {
            writeln!(w, "// {}", line)?;
        }
        writeln!(w)
    }

    fn write_combined<S: AsRef<str>>(&self, w: &mut impl FmtWrite, lines: &[S]) -> std::fmt::Result {
        self.write_provenance(w)?;
        for line in lines {
            writeln!(w, "{}", line.as_ref())?;
        }
        Ok(())
    }

    /// Writes a block file to any `fmt::Write`
    pub fn write_block(
        &self,
        w: &mut impl FmtWrite,
        block: &Block,
        imports: &[String],
    ) -> std::fmt::Result {
        self.write_provenance(w)?;

        for line in self.header_lines {
            writeln!(w, "{}", line)?;
        }
        writeln!(w)?;

        for import in imports {
            writeln!(w, "import \"{}.proto\";", import)?;
        }
        writeln!(w)?;

        let mut lines = block.body_lines.iter();
        if let Some(opening) = lines.next() {
            writeln!(w, "{}", opening)?;
            if block.has_command_id() {
                self.write_command_id(w, block.command_id)?;
            }
        }
        for line in lines {
            writeln!(w, "{}", line)?;
        }

        Ok(())
    }

    fn write_command_id(&self, w: &mut impl FmtWrite, command_id: u32) -> std::fmt::Result {
        let indent = &self.config.indent_str;
        writeln!(w, "{}enum {} {{", indent, COMMAND_ID_ENUM)?;
        writeln!(w, "{}{}NONE = 0;", indent, indent)?;
        writeln!(w, "{}{}CMD_ID = {};", indent, indent, command_id)?;
        writeln!(w, "{}}}", indent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::Eligibility;
    use pretty_assertions::assert_eq;

    fn resolved(command_id: u32, imports: &[&str]) -> ResolvedBlock {
        let mut block = Block::new("GetPlayerReq", command_id);
        block.body_lines = vec![
            "message GetPlayerReq {".to_string(),
            "  PlayerInfo info = 1;".to_string(),
            "}".to_string(),
        ];
        block.referenced_types = imports.iter().map(|s| s.to_string()).collect();
        ResolvedBlock {
            block,
            eligibility: Eligibility::Command,
        }
    }

    #[test]
    fn test_render_with_command_id() {
        let header = vec!["syntax = \"proto3\";".to_string()];
        let config = EmitterConfig::new().provenance_line("Generated by test");
        let file = ProtoEmitter::new(&header)
            .with_config(config)
            .render(&resolved(46, &["PlayerInfo"]));

        assert_eq!(file.file_name, "GetPlayerReq.proto");
        assert_eq!(file.command_id, 46);
        assert_eq!(
            file.contents,
            concat!(
                "// Generated by test\n",
                "\n",
                "syntax = \"proto3\";\n",
                "\n",
                "import \"PlayerInfo.proto\";\n",
                "\n",
                "message GetPlayerReq {\n",
                "\tenum CmdId {\n",
                "\t\tNONE = 0;\n",
                "\t\tCMD_ID = 46;\n",
                "\t}\n",
                "  PlayerInfo info = 1;\n",
                "}\n",
            )
        );
    }

    #[test]
    fn test_render_without_command_id() {
        let header: Vec<String> = Vec::new();
        let file = ProtoEmitter::new(&header)
            .with_config(EmitterConfig::new().indent_str("  "))
            .render(&resolved(0, &[]));
        assert!(!file.contents.contains("CmdId"));
        assert!(file.contents.starts_with("\n\n\nmessage GetPlayerReq {\n"));
    }

    #[test]
    fn test_render_combined() {
        let header: Vec<String> = Vec::new();
        let config = EmitterConfig::new().provenance_line("usedTime: now");
        let out = ProtoEmitter::new(&header)
            .with_config(config)
            .render_combined(&["a", "b"]);
        assert_eq!(out, "// usedTime: now\n\na\nb\n");
    }
}
