//! Packet opcode table generated from emitted command ids.

use crate::split::ResolvedBlock;
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use tracing::warn;

/// File name of the generated table
pub const OPCODES_FILE_NAME: &str = "PacketOpcodes.java";

/// Command ids of every emitted block, sorted by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpcodeTable {
    entries: Vec<(String, u32)>,
}

impl OpcodeTable {
    /// Collects emitted blocks that carry a command id
    pub fn from_blocks(blocks: &[ResolvedBlock]) -> Self {
        let mut entries: Vec<(String, u32)> = blocks
            .iter()
            .filter(|b| b.is_emitted() && b.block.has_command_id())
            .map(|b| (b.block.name.clone(), b.block.command_id))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let table = Self { entries };
        for (id, names) in table.duplicates() {
            warn!("Command id {} is shared by {}", id, names.join(", "));
        }
        table
    }

    /// `(name, id)` pairs in id order
    pub fn entries(&self) -> &[(String, u32)] {
        &self.entries
    }

    /// Returns true if no emitted block has a command id
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Command ids used by more than one block, with the block names
    pub fn duplicates(&self) -> BTreeMap<u32, Vec<&str>> {
        let mut by_id: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
        for (name, id) in &self.entries {
            by_id.entry(*id).or_default().push(name);
        }
        by_id.retain(|_, names| names.len() > 1);
        by_id
    }

    /// Renders the table as a Java constants class
    pub fn render_java(&self, package_header: &str) -> String {
        let mut out = String::new();
        self.write_java(&mut out, package_header)
            .expect("String write cannot fail");
        out
    }

    fn write_java(&self, w: &mut impl FmtWrite, package_header: &str) -> std::fmt::Result {
        if !package_header.is_empty() {
            writeln!(w, "{}", package_header)?;
            writeln!(w)?;
        }
        writeln!(w, "public class PacketOpcodes {{")?;
        writeln!(w, "\t// Opcodes")?;
        writeln!(w, "\tpublic static final int NONE = 0;")?;
        for (name, id) in &self.entries {
            writeln!(w, "\tpublic static final int {} = {};", name, id)?;
        }
        writeln!(w, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::{Block, Eligibility};
    use pretty_assertions::assert_eq;

    fn resolved(name: &str, id: u32, eligibility: Eligibility) -> ResolvedBlock {
        ResolvedBlock {
            block: Block::new(name, id),
            eligibility,
        }
    }

    #[test]
    fn test_only_emitted_command_blocks() {
        let table = OpcodeTable::from_blocks(&[
            resolved("PingRsp", 20, Eligibility::Command),
            resolved("PingReq", 10, Eligibility::Command),
            resolved("QWERTY", 5, Eligibility::Obfuscated),
            resolved("PlayerInfo", 0, Eligibility::Dependency),
        ]);
        assert_eq!(
            table.entries().to_vec(),
            vec![("PingReq".to_string(), 10), ("PingRsp".to_string(), 20)]
        );
    }

    #[test]
    fn test_duplicates() {
        let table = OpcodeTable::from_blocks(&[
            resolved("A", 7, Eligibility::Command),
            resolved("B", 7, Eligibility::Command),
            resolved("C", 8, Eligibility::Command),
        ]);
        let dups = table.duplicates();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[&7], vec!["A", "B"]);
    }

    #[test]
    fn test_render_java() {
        let table = OpcodeTable::from_blocks(&[resolved("PingReq", 10, Eligibility::Command)]);
        assert_eq!(
            table.render_java("package emu.grasscutter.net.packet;"),
            concat!(
                "package emu.grasscutter.net.packet;\n",
                "\n",
                "public class PacketOpcodes {\n",
                "\t// Opcodes\n",
                "\tpublic static final int NONE = 0;\n",
                "\tpublic static final int PingReq = 10;\n",
                "}\n",
            )
        );
    }
}
