//! Extensible output sinks.
//!
//! This module provides the [`OutputSink`] trait for customizing where the
//! files produced by a run are written.

use super::EmittedFile;
use crate::error::Result;

/// Trait for consuming the files produced by a run.
///
/// Every method defaults to discarding its input. The CLI implements this
/// for the filesystem and for `--dry-run`.
///
/// # Example
///
/// ```
/// use protosplit_core::emit::{EmittedFile, OutputSink};
/// use protosplit_core::Result;
///
/// #[derive(Default)]
/// struct Names(Vec<String>);
///
/// impl OutputSink for Names {
///     fn write_block(&mut self, file: &EmittedFile) -> Result<()> {
///         self.0.push(file.file_name.clone());
///         Ok(())
///     }
/// }
/// ```
pub trait OutputSink {
    /// Write the whole rewritten schema
    fn write_combined(&mut self, file_name: &str, contents: &str) -> Result<()> {
        let _ = (file_name, contents);
        Ok(())
    }

    /// Write one block file
    fn write_block(&mut self, file: &EmittedFile) -> Result<()> {
        let _ = file;
        Ok(())
    }

    /// Write the opcode table
    fn write_opcodes(&mut self, file_name: &str, contents: &str) -> Result<()> {
        let _ = (file_name, contents);
        Ok(())
    }
}

/// A no-op sink that discards all output
pub struct NullSink;

impl OutputSink for NullSink {}

/// A sink that counts what would have been written
#[derive(Debug, Default)]
pub struct StatsSink {
    /// Number of block files
    pub block_count: usize,
    /// Block files carrying a command id
    pub command_count: usize,
    /// Total bytes across all files
    pub bytes: usize,
    /// Whether the combined schema was written
    pub wrote_combined: bool,
    /// Whether the opcode table was written
    pub wrote_opcodes: bool,
}

impl OutputSink for StatsSink {
    fn write_combined(&mut self, _file_name: &str, contents: &str) -> Result<()> {
        self.wrote_combined = true;
        self.bytes += contents.len();
        Ok(())
    }

    fn write_block(&mut self, file: &EmittedFile) -> Result<()> {
        self.block_count += 1;
        if file.command_id != 0 {
            self.command_count += 1;
        }
        self.bytes += file.contents.len();
        Ok(())
    }

    fn write_opcodes(&mut self, _file_name: &str, contents: &str) -> Result<()> {
        self.wrote_opcodes = true;
        self.bytes += contents.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(command_id: u32) -> EmittedFile {
        EmittedFile {
            file_name: "A.proto".to_string(),
            block_name: "A".to_string(),
            command_id,
            contents: "abc".to_string(),
        }
    }

    #[test]
    fn test_null_sink() {
        let mut sink = NullSink;
        assert!(sink.write_block(&file(1)).is_ok());
        assert!(sink.write_combined("all.proto", "").is_ok());
    }

    #[test]
    fn test_stats_sink() {
        let mut sink = StatsSink::default();
        sink.write_block(&file(1)).unwrap();
        sink.write_block(&file(0)).unwrap();
        sink.write_opcodes("PacketOpcodes.java", "xy").unwrap();

        assert_eq!(sink.block_count, 2);
        assert_eq!(sink.command_count, 1);
        assert_eq!(sink.bytes, 8);
        assert!(sink.wrote_opcodes);
        assert!(!sink.wrote_combined);
    }
}
