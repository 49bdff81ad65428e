//! Keyword classification for the schema dialect.
//!
//! The block parser never looks at keywords directly. Everything it needs to
//! know about a token goes through the [`Vocabulary`] trait, so a grammar
//! aware implementation can replace [`TypeVocabulary`] without touching the
//! parser's state machine.

/// Sentinel comment that carries an injected command id (`// CmdId: 46`)
pub const COMMAND_ID_MARKER: &str = "// CmdId:";

/// Nesting keywords, in the order they are tried against a line
pub const NESTING_KEYWORDS: &[&str] = &["message", "enum", "oneof"];

/// Scalar field types
pub const SCALAR_TYPES: &[&str] = &[
    "bool", "string", "uint32", "uint64", "int32", "int64", "float", "double", "bytes", "fixed32",
    "fixed64", "sfixed32", "sfixed64",
];

/// Field labels that are followed by the element type
pub const LABEL_MARKERS: &[&str] = &["repeated", "optional", "required"];

/// Composite `map<K, V>` marker
pub const MAP_MARKER: &str = "map";

/// Statement keywords that never name a type
pub const DIRECTIVE_KEYWORDS: &[&str] = &[
    "option",
    "reserved",
    "extensions",
    "syntax",
    "package",
    "import",
];

/// Line prefixes collected into the shared header before the first block
pub const HEADER_PREFIXES: &[&str] = &["syntax", "package", "import"];

/// Leading tokens of fully-qualified vendor types that are never imported
pub const SUPPRESSED_TYPES: &[&str] = &["google"];

/// What a single token means to the block parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Opens a nested region (`message`, `enum`, `oneof`)
    Nesting,
    /// Built-in scalar type
    Scalar,
    /// Field label followed by the element type (`repeated`)
    Label,
    /// The `map<K, V>` composite
    Map,
    /// Statement keyword that never names a type
    Directive,
    /// Vendor type carve-out, never imported
    Suppressed,
    /// Anything else: a user-defined type name
    Custom,
}

impl TokenClass {
    /// Returns true if a token of this class can be an import candidate
    pub fn is_custom(self) -> bool {
        self == TokenClass::Custom
    }
}

/// Lookup interface over the dialect's keyword tables
pub trait Vocabulary: Send + Sync {
    /// Nesting keywords in priority order
    fn nesting_keywords(&self) -> &[String];

    /// Prefixes of header lines collected before the first block
    fn header_prefixes(&self) -> &[String];

    /// The command id sentinel prefix (without the trailing space)
    fn command_id_marker(&self) -> &str;

    /// Classifies a single identifier token
    fn classify(&self, token: &str) -> TokenClass;
}

/// Static keyword tables with configurable carve-outs
#[derive(Debug, Clone)]
pub struct TypeVocabulary {
    nesting: Vec<String>,
    scalars: Vec<String>,
    labels: Vec<String>,
    directives: Vec<String>,
    headers: Vec<String>,
    suppressed: Vec<String>,
    command_id_marker: String,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for TypeVocabulary {
    fn default() -> Self {
        Self {
            nesting: owned(NESTING_KEYWORDS),
            scalars: owned(SCALAR_TYPES),
            labels: owned(LABEL_MARKERS),
            directives: owned(DIRECTIVE_KEYWORDS),
            headers: owned(HEADER_PREFIXES),
            suppressed: owned(SUPPRESSED_TYPES),
            command_id_marker: COMMAND_ID_MARKER.to_string(),
        }
    }
}

impl TypeVocabulary {
    /// Creates the default vocabulary
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the vendor carve-out list
    pub fn suppressed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suppressed = types.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the command id sentinel prefix
    pub fn with_command_id_marker(mut self, marker: impl Into<String>) -> Self {
        self.command_id_marker = marker.into();
        self
    }

    /// Returns true if `token` is a built-in scalar type
    pub fn is_scalar(&self, token: &str) -> bool {
        self.scalars.iter().any(|s| s == token)
    }
}

impl Vocabulary for TypeVocabulary {
    fn nesting_keywords(&self) -> &[String] {
        &self.nesting
    }

    fn header_prefixes(&self) -> &[String] {
        &self.headers
    }

    fn command_id_marker(&self) -> &str {
        &self.command_id_marker
    }

    fn classify(&self, token: &str) -> TokenClass {
        let is = |table: &[String]| table.iter().any(|w| w == token);

        if is(&self.nesting) {
            TokenClass::Nesting
        } else if self.is_scalar(token) {
            TokenClass::Scalar
        } else if is(&self.labels) {
            TokenClass::Label
        } else if token == MAP_MARKER {
            TokenClass::Map
        } else if is(&self.directives) {
            TokenClass::Directive
        } else if is(&self.suppressed) {
            TokenClass::Suppressed
        } else {
            TokenClass::Custom
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        let vocab = TypeVocabulary::new();
        assert_eq!(vocab.classify("message"), TokenClass::Nesting);
        assert_eq!(vocab.classify("oneof"), TokenClass::Nesting);
        assert_eq!(vocab.classify("sfixed64"), TokenClass::Scalar);
        assert_eq!(vocab.classify("repeated"), TokenClass::Label);
        assert_eq!(vocab.classify("map"), TokenClass::Map);
        assert_eq!(vocab.classify("option"), TokenClass::Directive);
        assert_eq!(vocab.classify("google"), TokenClass::Suppressed);
        assert_eq!(vocab.classify("PlayerInfo"), TokenClass::Custom);
    }

    #[test]
    fn test_classification_is_case_exact() {
        let vocab = TypeVocabulary::new();
        assert_eq!(vocab.classify("Message"), TokenClass::Custom);
        assert_eq!(vocab.classify("UINT32"), TokenClass::Custom);
    }

    #[test]
    fn test_custom_suppressed_types() {
        let vocab = TypeVocabulary::new().suppressed_types(["vendor"]);
        assert_eq!(vocab.classify("vendor"), TokenClass::Suppressed);
        assert!(vocab.classify("google").is_custom());
    }

    #[test]
    fn test_nesting_priority_order() {
        let vocab = TypeVocabulary::new();
        assert_eq!(vocab.nesting_keywords().to_vec(), vec!["message", "enum", "oneof"]);
        assert_eq!(Vocabulary::command_id_marker(&vocab), "// CmdId:");

        let custom = TypeVocabulary::new().with_command_id_marker("// Op:");
        assert_eq!(Vocabulary::command_id_marker(&custom), "// Op:");
    }
}
