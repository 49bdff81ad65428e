//! The full run: rewrite, parse, resolve, render.

use crate::config::Config;
use crate::emit::{EmittedFile, EmitterConfig, OutputSink, ProtoEmitter};
use crate::error::Result;
use crate::mapping::MappingTable;
use crate::opcodes::{OpcodeTable, OPCODES_FILE_NAME};
use crate::rewrite::{TokenRewriter, Trie};
use crate::split::{BlockParser, ImportResolver, ResolvedBlock};
use crate::vocabulary::TypeVocabulary;
use tracing::info;

/// File name of the de-obfuscated single-file schema
pub const COMBINED_FILE_NAME: &str = "replace_output.proto";

/// Everything a run produces, ready to hand to an [`OutputSink`]
#[derive(Debug, Clone)]
pub struct SplitOutput {
    /// The rewritten schema, one entry per input line
    pub rewritten_lines: Vec<String>,
    /// Number of lines that had at least one replacement
    pub changed_lines: usize,
    /// Shared header written into every block file
    pub header_lines: Vec<String>,
    /// Every top-level block with its emission decision
    pub blocks: Vec<ResolvedBlock>,
    /// The rewritten schema with the provenance header
    pub combined: String,
    /// One rendered file per eligible block, in input order
    pub files: Vec<EmittedFile>,
    /// Rendered opcode table, if enabled
    pub opcodes: Option<String>,
}

impl SplitOutput {
    /// Blocks that were rendered
    pub fn emitted_blocks(&self) -> impl Iterator<Item = &ResolvedBlock> {
        self.blocks.iter().filter(|b| b.is_emitted())
    }

    /// Sends every produced file to `sink`
    pub fn write_to<S: OutputSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.write_combined(COMBINED_FILE_NAME, &self.combined)?;
        for file in &self.files {
            sink.write_block(file)?;
        }
        if let Some(opcodes) = &self.opcodes {
            sink.write_opcodes(OPCODES_FILE_NAME, opcodes)?;
        }
        Ok(())
    }
}

/// Configured pipeline; cheap to run repeatedly
#[derive(Debug, Clone)]
pub struct SplitPipeline {
    vocabulary: TypeVocabulary,
    resolver: ImportResolver,
    annotate: bool,
    leading_header: Vec<String>,
    header_content: Vec<String>,
    emitter: EmitterConfig,
    opcodes_header: Option<String>,
}

impl Default for SplitPipeline {
    fn default() -> Self {
        Self {
            vocabulary: TypeVocabulary::default(),
            resolver: ImportResolver::default(),
            annotate: true,
            leading_header: Vec::new(),
            header_content: Vec::new(),
            emitter: EmitterConfig::default(),
            opcodes_header: None,
        }
    }
}

impl SplitPipeline {
    /// Creates a pipeline with default heuristics, no extra header and no opcode table
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a pipeline from a loaded configuration.
    ///
    /// Reads the blacklist file if one is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let vocabulary =
            TypeVocabulary::new().suppressed_types(config.parser.suppressed_types.clone());
        let resolver = ImportResolver::new()
            .obfuscated_name_pattern(&config.parser.obfuscated_name_pattern)?
            .blacklist(config.blacklist.resolve()?);

        Ok(Self {
            vocabulary,
            resolver,
            annotate: config.annotate_replacements,
            leading_header: vec![config.game_version_line(), String::new()],
            header_content: config.header_content.clone(),
            emitter: EmitterConfig::default(),
            opcodes_header: config
                .opcodes
                .enabled
                .then(|| config.opcodes.package_header.clone()),
        })
    }

    /// Sets the emitter configuration (provenance lines, indentation)
    pub fn emitter(mut self, config: EmitterConfig) -> Self {
        self.emitter = config;
        self
    }

    /// Replaces the import resolver
    pub fn resolver(mut self, resolver: ImportResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Enables the opcode table with the given package line
    pub fn opcodes(mut self, package_header: impl Into<String>) -> Self {
        self.opcodes_header = Some(package_header.into());
        self
    }

    /// Runs every stage over an in-memory schema.
    ///
    /// Nothing is written; a fatal parse error leaves no partial output.
    pub fn run(&self, mapping: &MappingTable, schema: &str) -> Result<SplitOutput> {
        let trie = Trie::from(mapping);
        let source: Vec<&str> = schema.lines().collect();
        let rewritten = TokenRewriter::new(&trie)
            .annotate(self.annotate)
            .rewrite_lines(&source);
        let changed_lines = rewritten.iter().filter(|l| l.changed()).count();
        let rewritten_lines: Vec<String> = rewritten.into_iter().map(|l| l.text).collect();
        info!(
            "Applied {} mapping keys: {} of {} lines changed",
            trie.len(),
            changed_lines,
            rewritten_lines.len()
        );

        let mut parser = BlockParser::with_vocabulary(self.vocabulary.clone());
        for line in &rewritten_lines {
            parser.push_line(line)?;
        }
        let parsed = parser.finish()?;

        let mut header_lines = self.leading_header.clone();
        header_lines.extend(parsed.header_lines);
        header_lines.extend(self.header_content.iter().cloned());

        let blocks = self.resolver.resolve(parsed.blocks);

        let emitter = ProtoEmitter::new(&header_lines).with_config(self.emitter.clone());
        let files: Vec<EmittedFile> = blocks
            .iter()
            .filter(|b| b.is_emitted())
            .map(|b| emitter.render(b))
            .collect();
        let combined = emitter.render_combined(&rewritten_lines);

        let opcodes = self
            .opcodes_header
            .as_deref()
            .map(|header| OpcodeTable::from_blocks(&blocks).render_java(header));

        info!("Split into {} files", files.len());

        Ok(SplitOutput {
            rewritten_lines,
            changed_lines,
            header_lines,
            blocks,
            combined,
            files,
            opcodes,
        })
    }
}
