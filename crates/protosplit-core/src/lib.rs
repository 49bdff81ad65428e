//! # protosplit-core
//!
//! A library for de-obfuscating a monolithic `.proto` schema and splitting it
//! into one file per top-level type.
//!
//! This crate provides the core functionality for:
//! - Building an obfuscated-to-clear identifier mapping from TSV records
//! - Rewriting schema text with a longest-match trie
//! - Grouping the rewritten lines into top-level blocks and resolving imports
//! - Rendering per-block files with injected command ids
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`mapping`]: Mapping records, duplicate resolution, key normalization
//! - [`rewrite`]: Trie construction and line rewriting
//! - [`split`]: Block parsing and import resolution
//! - [`emit`]: File rendering and output sinks
//! - [`opcodes`]: Command id table generation
//! - [`pipeline`]: All stages wired together
//! - [`config`]: TOML configuration
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use protosplit_core::{MappingTable, SplitPipeline};
//!
//! let mapping: MappingTable = [("XYZ", "PlayerId")].into_iter().collect();
//! let schema = "// CmdId: 7\nmessage XYZ {\n  uint32 a = 1;\n}\n";
//!
//! let output = SplitPipeline::new().run(&mapping, schema)?;
//! assert_eq!(output.files.len(), 1);
//! assert_eq!(output.files[0].file_name, "PlayerId.proto");
//! assert!(output.files[0].contents.contains("CMD_ID = 7;"));
//! # Ok::<(), protosplit_core::Error>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`Vocabulary`]: Replace the keyword tables the parser classifies tokens with
//! - [`OutputSink`]: Customize where produced files are written
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod config;
pub mod emit;
pub mod error;
pub mod mapping;
pub mod opcodes;
pub mod pipeline;
pub mod rewrite;
pub mod split;
pub mod vocabulary;

// Re-export primary types for convenience
pub use config::Config;
pub use emit::{EmittedFile, EmitterConfig, NullSink, OutputSink, ProtoEmitter, StatsSink};
pub use error::{Error, Result};
pub use mapping::{load_mapping_file, MappingBuilder, MappingTable};
pub use opcodes::OpcodeTable;
pub use pipeline::{SplitOutput, SplitPipeline, COMBINED_FILE_NAME};
pub use rewrite::{RewrittenLine, TokenRewriter, Trie};
pub use split::{Block, BlockParser, Eligibility, ImportResolver, ParsedSchema, ResolvedBlock};
pub use vocabulary::{TokenClass, TypeVocabulary, Vocabulary};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
