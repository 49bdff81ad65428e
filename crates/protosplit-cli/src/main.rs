//! protosplit - De-obfuscate a monolithic .proto schema and split it per type
//!
//! This tool applies an obfuscated-to-clear name mapping to a single large
//! schema file, then writes one `.proto` file per top-level type with its
//! imports resolved and its command id injected.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use protosplit_core::config::DEFAULT_CONFIG_FILE;
use protosplit_core::{
    load_mapping_file, Config, EmittedFile, EmitterConfig, OutputSink, SplitOutput,
    SplitPipeline,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// De-obfuscate a monolithic .proto schema and split it into per-type files
#[derive(Parser, Debug)]
#[command(name = "protosplit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Obfuscated schema input, overrides `input_file`
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Tab-separated mapping file, overrides `mapping_file`
    #[arg(short, long)]
    mapping: Option<PathBuf>,

    /// Output directory for per-type files, overrides `split_output_dir`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output directory for the rewritten single file, overrides `replace_output_dir`
    #[arg(long)]
    replace_output: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dry run - don't write files, just show what would be written
    #[arg(long)]
    dry_run: bool,

    /// Only list the blocks that would be emitted
    #[arg(long)]
    list_only: bool,

    /// Keep existing files in the output directories
    #[arg(long)]
    keep_existing: bool,

    /// Conflict resolution strategy for blocks sharing a name
    #[arg(long, value_enum, default_value = "hash-suffix")]
    conflict_strategy: ConflictStrategy,
}

/// Strategy for resolving naming conflicts
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConflictStrategy {
    /// Append a short content hash: Name~a1b2c3d4.proto
    HashSuffix,
    /// Skip conflicting files (keep first occurrence only)
    SkipConflicts,
}

/// Tracks written file names for deduplication
#[derive(Default)]
struct FileRegistry {
    /// Maps file name -> content hashes already written under that name
    seen: HashMap<String, Vec<String>>,
    /// Statistics
    stats: RegistryStats,
}

#[derive(Default)]
struct RegistryStats {
    total_found: usize,
    duplicates_skipped: usize,
    conflicts_renamed: usize,
    written: usize,
}

impl FileRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// Compute a short hash of the content (first 8 chars of blake3)
    fn content_hash(content: &str) -> String {
        let hash = blake3::hash(content.as_bytes());
        hash.to_hex()[..8].to_string()
    }

    /// Check if this exact content was already seen for this file name
    fn is_duplicate(&self, file_name: &str, content_hash: &str) -> bool {
        self.seen
            .get(file_name)
            .map(|hashes| hashes.iter().any(|h| h == content_hash))
            .unwrap_or(false)
    }

    /// Register a file and return the resolved output path
    fn register(
        &mut self,
        file_name: &str,
        content_hash: &str,
        output_dir: &Path,
        strategy: ConflictStrategy,
    ) -> Option<PathBuf> {
        self.stats.total_found += 1;

        if self.is_duplicate(file_name, content_hash) {
            debug!("Skipping duplicate: {} (hash: {})", file_name, content_hash);
            self.stats.duplicates_skipped += 1;
            return None;
        }

        let first = self.seen.get(file_name).map_or(true, Vec::is_empty);
        let output_path = if first {
            output_dir.join(file_name)
        } else {
            match strategy {
                ConflictStrategy::SkipConflicts => {
                    debug!(
                        "Skipping conflict: {} (different content, hash: {})",
                        file_name, content_hash
                    );
                    self.stats.duplicates_skipped += 1;
                    return None;
                }
                ConflictStrategy::HashSuffix => {
                    let new_name = Self::add_suffix(file_name, &format!("~{}", content_hash));
                    info!(
                        "Conflict resolved: {} -> {} (content differs)",
                        file_name, new_name
                    );
                    self.stats.conflicts_renamed += 1;
                    output_dir.join(new_name)
                }
            }
        };

        self.seen
            .entry(file_name.to_string())
            .or_default()
            .push(content_hash.to_string());

        Some(output_path)
    }

    /// Add a suffix before the .proto extension
    fn add_suffix(file_name: &str, suffix: &str) -> String {
        if let Some(stem) = file_name.strip_suffix(".proto") {
            format!("{}{}.proto", stem, suffix)
        } else {
            format!("{}{}", file_name, suffix)
        }
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} found, {} duplicates skipped, {} conflicts renamed, {} written",
            self.stats.total_found,
            self.stats.duplicates_skipped,
            self.stats.conflicts_renamed,
            self.stats.written
        );
    }
}

/// Output directories for one run
#[derive(Debug, Clone)]
struct OutputDirs {
    split: PathBuf,
    replace: PathBuf,
    opcodes: PathBuf,
}

impl OutputDirs {
    fn from_config(config: &Config) -> Self {
        Self {
            split: config.split_output_dir.clone(),
            replace: config.replace_output_dir.clone(),
            opcodes: config.opcodes.output_dir.clone(),
        }
    }
}

/// Writes produced files to disk
struct DirectorySink {
    dirs: OutputDirs,
    strategy: ConflictStrategy,
    registry: FileRegistry,
}

impl DirectorySink {
    fn new(dirs: OutputDirs, strategy: ConflictStrategy) -> Self {
        Self {
            dirs,
            strategy,
            registry: FileRegistry::new(),
        }
    }
}

impl OutputSink for DirectorySink {
    fn write_combined(&mut self, file_name: &str, contents: &str) -> protosplit_core::Result<()> {
        let path = self.dirs.replace.join(file_name);
        write_file(&path, contents)?;
        info!("Mapping applied, wrote {}", path.display());
        Ok(())
    }

    fn write_block(&mut self, file: &EmittedFile) -> protosplit_core::Result<()> {
        let hash = FileRegistry::content_hash(&file.contents);
        if let Some(path) =
            self.registry
                .register(&file.file_name, &hash, &self.dirs.split, self.strategy)
        {
            write_file(&path, &file.contents)?;
            debug!("Wrote {}", path.display());
            self.registry.stats.written += 1;
        }
        Ok(())
    }

    fn write_opcodes(&mut self, file_name: &str, contents: &str) -> protosplit_core::Result<()> {
        let path = self.dirs.opcodes.join(file_name);
        write_file(&path, contents)?;
        info!("Wrote opcode table {}", path.display());
        Ok(())
    }
}

/// Prints what would be written
struct DryRunSink {
    dirs: OutputDirs,
    verbose: bool,
}

impl OutputSink for DryRunSink {
    fn write_combined(&mut self, file_name: &str, _contents: &str) -> protosplit_core::Result<()> {
        println!("Would write: {}", self.dirs.replace.join(file_name).display());
        Ok(())
    }

    fn write_block(&mut self, file: &EmittedFile) -> protosplit_core::Result<()> {
        println!("Would write: {}", self.dirs.split.join(&file.file_name).display());
        if self.verbose {
            println!("---");
            println!("{}", file.contents);
            println!("---");
        }
        Ok(())
    }

    fn write_opcodes(&mut self, file_name: &str, _contents: &str) -> protosplit_core::Result<()> {
        println!("Would write: {}", self.dirs.opcodes.join(file_name).display());
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let config = load_config(&cli)?;
    run(&cli, &config)
}

/// Load the configuration file and apply command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Config::load(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("Failed to load config: {}", DEFAULT_CONFIG_FILE))?,
        None => {
            info!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
            Config::default()
        }
    };

    if let Some(input) = &cli.input {
        config.input_file = input.clone();
    }
    if let Some(mapping) = &cli.mapping {
        config.mapping_file = mapping.clone();
    }
    if let Some(output) = &cli.output {
        config.split_output_dir = output.clone();
    }
    if let Some(replace) = &cli.replace_output {
        config.replace_output_dir = replace.clone();
    }
    if cli.keep_existing {
        config.clear_output_dirs = false;
    }

    Ok(config)
}

/// Run every stage; nothing touches the output directories until the
/// inputs have been read and parsed successfully.
fn run(cli: &Cli, config: &Config) -> Result<()> {
    if !config.input_file.is_file() {
        bail!("Input file does not exist: {}", config.input_file.display());
    }

    let mapping = load_mapping_file(&config.mapping_file).with_context(|| {
        format!("Failed to load mapping: {}", config.mapping_file.display())
    })?;
    let schema = fs::read_to_string(&config.input_file).with_context(|| {
        format!("Failed to read input file: {}", config.input_file.display())
    })?;

    let emitter = EmitterConfig::new()
        .provenance_line(format!("Generated by protosplit {}", protosplit_core::VERSION))
        .provenance_line(format!("usedTime: {}", timestamp()));
    let output = SplitPipeline::from_config(config)
        .context("Invalid configuration")?
        .emitter(emitter)
        .run(&mapping, &schema)
        .with_context(|| format!("Failed to split {}", config.input_file.display()))?;

    if cli.list_only {
        list_blocks(&output);
        return Ok(());
    }

    let dirs = OutputDirs::from_config(config);
    if cli.dry_run {
        let mut sink = DryRunSink {
            dirs,
            verbose: cli.verbose > 0,
        };
        output.write_to(&mut sink)?;
        return Ok(());
    }

    prepare_directory(&dirs.replace, config.clear_output_dirs)?;
    prepare_directory(&dirs.split, config.clear_output_dirs)?;
    if output.opcodes.is_some() {
        prepare_directory(&dirs.opcodes, config.clear_output_dirs)?;
    }

    let mut sink = DirectorySink::new(dirs, cli.conflict_strategy);
    output.write_to(&mut sink)?;

    println!(
        "Split {} blocks into {} files in {}",
        output.blocks.len(),
        sink.registry.stats.written,
        sink.dirs.split.display()
    );
    sink.registry.print_summary();

    Ok(())
}

/// Print emitted block names with their command ids
fn list_blocks(output: &SplitOutput) {
    for resolved in output.emitted_blocks() {
        let block = &resolved.block;
        if block.has_command_id() {
            println!("{}\t{}", block.name, block.command_id);
        } else {
            println!("{}", block.name);
        }
    }
}

/// Current UTC time as `yyyy-MM-dd HH:mm:ss`
fn timestamp() -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|e| {
            warn!("Failed to format timestamp: {}", e);
            String::new()
        })
}

/// Create `dir` and, if asked, remove everything inside it
fn prepare_directory(dir: &Path, clear: bool) -> protosplit_core::Result<()> {
    fs::create_dir_all(dir).map_err(|e| protosplit_core::Error::directory_create(dir, e))?;
    if !clear {
        return Ok(());
    }

    for entry in WalkDir::new(dir).min_depth(1).contents_first(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            protosplit_core::Error::directory_clear(path, e.into())
        })?;
        let path = entry.path();
        let removed = if entry.file_type().is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|e| protosplit_core::Error::directory_clear(path, e))?;
    }

    debug!("Cleared {}", dir.display());
    Ok(())
}

/// Write a file, creating its parent directory
fn write_file(path: &Path, contents: &str) -> protosplit_core::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| protosplit_core::Error::directory_create(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| protosplit_core::Error::file_write(path, e))
}
