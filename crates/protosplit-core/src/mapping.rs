//! Obfuscated-to-clear identifier mapping.
//!
//! Raw records come from a tab-separated file whose first line is a header.
//! [`MappingBuilder`] accumulates them and [`MappingBuilder::build`] keeps only
//! keys whose every record agrees on the clear value. Keys with interior
//! spaces are collapsed so they can match the schema text directly.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use tracing::{debug, info, trace, warn};

/// Column separator of the mapping file
pub const FIELD_SEPARATOR: char = '\t';

/// Per-key bookkeeping while records are read
#[derive(Debug)]
struct KeyState {
    value: String,
    occurrences: usize,
    inconsistent: bool,
}

/// Counters describing a finished build
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MappingStats {
    /// Records accepted by [`MappingBuilder::push`]
    pub records: usize,
    /// Records rejected as malformed
    pub malformed: usize,
    /// Keys dropped because their records disagree
    pub inconsistent: usize,
    /// Keys rewritten by space removal
    pub normalized: usize,
}

/// The finalized, space-free key set
#[derive(Debug, Default, Clone)]
pub struct MappingTable {
    entries: BTreeMap<String, String>,
    stats: MappingStats,
}

impl MappingTable {
    /// Returns the clear value for an obfuscated key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of admitted keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no key was admitted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(obfuscated, clear)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build statistics
    pub fn stats(&self) -> &MappingStats {
        &self.stats
    }
}

/// Accumulates raw mapping records and resolves duplicates
#[derive(Debug, Default)]
pub struct MappingBuilder {
    keys: HashMap<String, KeyState>,
    stats: MappingStats,
}

impl MappingBuilder {
    /// Creates an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one raw record.
    ///
    /// `line` is only used for error reporting. A record needs at least two
    /// columns with a non-empty key and value; extra columns are ignored.
    /// A [`Error::MalformedRecord`] is recoverable: the record is not stored.
    pub fn push<S: AsRef<str>>(&mut self, line: usize, columns: &[S]) -> Result<()> {
        let usable = columns
            .iter()
            .take(2)
            .take_while(|c| !c.as_ref().is_empty())
            .count();
        if usable < 2 {
            self.stats.malformed += 1;
            return Err(Error::malformed_record(line, usable));
        }

        let key = columns[0].as_ref();
        let value = columns[1].as_ref();
        self.stats.records += 1;

        match self.keys.get_mut(key) {
            Some(state) => {
                state.occurrences += 1;
                if state.value != value {
                    state.inconsistent = true;
                }
            }
            None => {
                self.keys.insert(
                    key.to_string(),
                    KeyState {
                        value: value.to_string(),
                        occurrences: 1,
                        inconsistent: false,
                    },
                );
            }
        }
        Ok(())
    }

    /// Reads a tab-separated mapping stream, skipping the header line.
    ///
    /// Malformed rows are logged and skipped; only I/O failures are fatal.
    pub fn read_tsv(&mut self, reader: impl BufRead) -> Result<()> {
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if index == 0 {
                trace!("Skipping mapping header: {}", line);
                continue;
            }
            let columns: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
            if let Err(e) = self.push(index + 1, &columns) {
                if !e.is_recoverable() {
                    return Err(e);
                }
                warn!("{}", e);
            }
        }
        Ok(())
    }

    /// Resolves duplicates and normalizes keys.
    pub fn build(self) -> MappingTable {
        let mut stats = self.stats;

        // Sort first so warnings and collision handling are deterministic.
        let mut admitted: Vec<(String, KeyState)> = self.keys.into_iter().collect();
        admitted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut entries: BTreeMap<String, String> = BTreeMap::new();
        let mut collided: Vec<String> = Vec::new();

        for (key, state) in admitted {
            if state.inconsistent {
                warn!("{}", Error::inconsistent_mapping(&key, state.occurrences));
                stats.inconsistent += 1;
                continue;
            }
            if state.occurrences > 1 {
                debug!(
                    "Key '{}' repeated {} times with the same value",
                    key, state.occurrences
                );
            }

            let lookup = if key.contains(' ') {
                let collapsed = key.replace(' ', "");
                debug!("Collapsed spaces in key '{}' -> '{}'", key, collapsed);
                stats.normalized += 1;
                collapsed
            } else {
                key
            };
            if lookup.is_empty() {
                continue;
            }

            match entries.get(&lookup) {
                Some(existing) if *existing != state.value => {
                    warn!(
                        "Key '{}' collapses onto an existing key with a different value, dropping it",
                        lookup
                    );
                    collided.push(lookup);
                }
                Some(_) => {}
                None => {
                    entries.insert(lookup, state.value);
                }
            }
        }

        for key in collided {
            if entries.remove(&key).is_some() {
                stats.inconsistent += 1;
            }
        }

        info!(
            "Mapping ready: {} keys admitted, {} inconsistent, {} malformed rows",
            entries.len(),
            stats.inconsistent,
            stats.malformed
        );

        MappingTable { entries, stats }
    }
}

/// Reads and builds a mapping table from a TSV file
///
/// This is a convenience function that opens the file and feeds it to a
/// fresh [`MappingBuilder`].
pub fn load_mapping_file(path: impl AsRef<std::path::Path>) -> Result<MappingTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| Error::file_read(path, e))?;
    let mut builder = MappingBuilder::new();
    builder
        .read_tsv(std::io::BufReader::new(file))
        .map_err(|e| match e {
            Error::Io(source) => Error::file_read(path, source),
            other => other,
        })?;
    Ok(builder.build())
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MappingTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut builder = MappingBuilder::new();
        for (line, (key, value)) in iter.into_iter().enumerate() {
            let columns: [String; 2] = [key.into(), value.into()];
            if let Err(e) = builder.push(line + 1, &columns) {
                warn!("{}", e);
            }
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistent_duplicates_are_admitted_once() {
        let table: MappingTable = [("ABC", "PlayerId"), ("ABC", "PlayerId")]
            .into_iter()
            .collect();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("ABC"), Some("PlayerId"));
    }

    #[test]
    fn test_inconsistent_keys_are_dropped_in_any_order() {
        let forward: MappingTable = [("ABC", "One"), ("ABC", "Two")].into_iter().collect();
        let backward: MappingTable = [("ABC", "Two"), ("ABC", "One")].into_iter().collect();
        assert!(forward.get("ABC").is_none());
        assert!(backward.get("ABC").is_none());
        assert_eq!(forward.stats().inconsistent, 1);
    }

    #[test]
    fn test_late_disagreement_drops_consistent_duplicate() {
        let table: MappingTable = [("K", "a"), ("K", "a"), ("K", "b")].into_iter().collect();
        assert!(table.is_empty());
    }

    #[test]
    fn test_spaces_are_collapsed_in_keys_only() {
        let table: MappingTable = [("AB CD E", "Clear Value")].into_iter().collect();
        assert_eq!(table.get("ABCDE"), Some("Clear Value"));
        assert!(table.get("AB CD E").is_none());
        assert_eq!(table.stats().normalized, 1);
    }

    #[test]
    fn test_collapsed_collision_with_different_value_is_dropped() {
        let table: MappingTable = [("A B", "x"), ("AB", "y"), ("CD", "z")]
            .into_iter()
            .collect();
        assert!(table.get("AB").is_none());
        assert_eq!(table.get("CD"), Some("z"));
    }

    #[test]
    fn test_malformed_record_is_recoverable() {
        let mut builder = MappingBuilder::new();
        let err = builder.push(3, &["only"]).unwrap_err();
        assert!(err.is_recoverable());
        let err = builder.push(4, &["key", ""]).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 4, columns: 1 }));
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_empty_pair_is_skipped() {
        let table: MappingTable = [("", "Nothing"), ("XYZ", "PlayerId")].into_iter().collect();
        assert_eq!(table.len(), 1);
        assert_eq!(table.stats().malformed, 1);
    }

    #[test]
    fn test_missing_mapping_file_is_fatal() {
        let err = load_mapping_file("/nonexistent/protosplit/mapping.tsv").unwrap_err();
        assert!(!err.is_recoverable());
        match err {
            Error::FileRead { path, .. } => {
                assert!(path.ends_with("mapping.tsv"));
            }
            other => panic!("expected FileRead, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_is_a_read_error() {
        let mut builder = MappingBuilder::new();
        let input: &[u8] = b"obfuscated\tclear\nAB\t\xff\xfe\n";
        let err = builder.read_tsv(input).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_read_tsv_skips_header_and_bad_rows() {
        let input = "obfuscated\tclear\nXYZ\tPlayerId\nbroken\n\nQRS\tSceneInfo\textra\n";
        let mut builder = MappingBuilder::new();
        builder.read_tsv(input.as_bytes()).unwrap();
        let table = builder.build();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("XYZ"), Some("PlayerId"));
        assert_eq!(table.get("QRS"), Some("SceneInfo"));
        assert!(table.get("obfuscated").is_none());
        assert_eq!(table.stats().malformed, 2);
    }
}
