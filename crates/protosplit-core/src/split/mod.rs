//! Partitioning the de-obfuscated schema into per-type blocks.
//!
//! ## Architecture
//!
//! 1. [`BlockParser`] walks the lines once, tracking nesting depth, and
//!    groups them into top-level [`Block`]s with their references
//! 2. [`ImportResolver`] prunes each block's references to a clean import
//!    list and decides which blocks are emitted
//!
//! Parsing is strictly sequential. Pruning runs per block in parallel; the
//! eligibility pass waits for all of it to finish.

mod block;
mod parser;
mod resolver;

pub use block::Block;
pub use parser::{BlockParser, ParsedSchema, CLOSING_LINE};
pub use resolver::{Eligibility, ImportResolver, ResolvedBlock, OBFUSCATED_NAME_PATTERN};
