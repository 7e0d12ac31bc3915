//! Parse and stringify configuration.
//!
//! Options are plain structs passed explicitly through the call stack; the
//! `Default` impls carry the documented defaults, so `&Options::default()` is
//! the implicit-configuration entry point.

use crate::node::ScalarStyle;
use crate::schema::{SchemaId, Tag};

/// Which diagnostics are recorded on a document and forwarded to the `log`
/// facade.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    Debug,
}

impl LogLevel {
    pub fn keeps_warnings(self) -> bool {
        self >= LogLevel::Warn
    }
}

/// The YAML specification version a document is parsed and emitted under.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Version {
    V1_0,
    V1_1,
    V1_2,
}

impl Version {
    /// Versions before 1.2 use the permissive 1.1 scalar forms.
    pub fn is_pre_1_2(self) -> bool {
        !matches!(self, Version::V1_2)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Version::V1_0 => "1.0",
            Version::V1_1 => "1.1",
            Version::V1_2 => "1.2",
        }
    }
}

/// Top-level parse/stringify options.
#[derive(Clone, Debug)]
pub struct Options {
    /// Prefix used when generating anchor names.
    pub anchor_prefix: String,
    /// Spaces per nesting level when stringifying (min 1).
    pub indent: usize,
    /// Whether block sequences indent their `-` marker under a map key.
    pub indent_seq: bool,
    /// Keep a back-reference from each AST node to its CST node.
    pub keep_cst_nodes: bool,
    /// Keep scalar styles and node kinds on resolved nodes.
    pub keep_node_types: bool,
    /// Largest allowed alias expansion; `-1` disables the guard, `0`
    /// disallows all aliases.
    pub max_alias_count: i64,
    /// Render diagnostics with line/column positions and a caret snippet.
    pub pretty_errors: bool,
    /// Restrict mapping keys to plain scalars when stringifying.
    pub simple_keys: bool,
    /// Version assumed when the document carries no `%YAML` directive.
    pub version: Version,
    /// Built-in schema selecting the tag tables.
    pub schema: SchemaId,
    /// Extra tags layered over the schema, tried before the built-ins.
    pub custom_tags: Vec<Tag>,
    pub log_level: LogLevel,
    pub scalar: ScalarOptions,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            anchor_prefix: "a".to_string(),
            indent: 2,
            indent_seq: true,
            keep_cst_nodes: false,
            keep_node_types: true,
            max_alias_count: 100,
            pretty_errors: true,
            simple_keys: false,
            version: Version::V1_2,
            schema: SchemaId::Core,
            custom_tags: Vec::new(),
            log_level: LogLevel::Warn,
            scalar: ScalarOptions::default(),
        }
    }
}

/// Per-type scalar formatting options.
#[derive(Clone, Debug, Default)]
pub struct ScalarOptions {
    pub binary: BinaryOptions,
    pub bool_: BoolOptions,
    pub int: IntOptions,
    pub null: NullOptions,
    pub str_: StrOptions,
}

#[derive(Clone, Debug)]
pub struct BinaryOptions {
    /// Style used for `!!binary` output.
    pub default_type: ScalarStyle,
    /// Column at which base64 output wraps.
    pub line_width: usize,
}

impl Default for BinaryOptions {
    fn default() -> Self {
        BinaryOptions {
            default_type: ScalarStyle::Literal,
            line_width: 76,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BoolOptions {
    pub true_str: String,
    pub false_str: String,
}

impl Default for BoolOptions {
    fn default() -> Self {
        BoolOptions {
            true_str: "true".to_string(),
            false_str: "false".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IntOptions {
    /// Resolve integers as 128-bit values regardless of magnitude.
    pub as_big_int: bool,
}

#[derive(Clone, Debug)]
pub struct NullOptions {
    pub null_str: String,
}

impl Default for NullOptions {
    fn default() -> Self {
        NullOptions {
            null_str: "null".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StrOptions {
    pub default_type: ScalarStyle,
    pub default_key_type: ScalarStyle,
    /// Prefer single quotes when quoting is needed and no escapes are.
    pub default_quote_single: bool,
    pub double_quoted: DoubleQuotedOptions,
    pub fold: FoldOptions,
}

impl Default for StrOptions {
    fn default() -> Self {
        StrOptions {
            default_type: ScalarStyle::Plain,
            default_key_type: ScalarStyle::Plain,
            default_quote_single: false,
            double_quoted: DoubleQuotedOptions::default(),
            fold: FoldOptions::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DoubleQuotedOptions {
    /// Restrict escapes to the JSON-compatible set.
    pub json_encoding: bool,
    /// Shortest string that may be broken across lines when double-quoted.
    pub min_multi_line_length: usize,
}

impl Default for DoubleQuotedOptions {
    fn default() -> Self {
        DoubleQuotedOptions {
            json_encoding: false,
            min_multi_line_length: 40,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FoldOptions {
    /// Column to fold long lines at; `0` disables folding.
    pub line_width: usize,
    /// Never fold to lines shorter than this, however deep the indent.
    pub min_content_width: usize,
}

impl Default for FoldOptions {
    fn default() -> Self {
        FoldOptions {
            line_width: 80,
            min_content_width: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_defaults() {
        let opts = Options::default();
        assert_eq!(opts.anchor_prefix, "a");
        assert_eq!(opts.indent, 2);
        assert!(opts.indent_seq);
        assert_eq!(opts.max_alias_count, 100);
        assert!(opts.pretty_errors);
        assert_eq!(opts.version, Version::V1_2);
        assert_eq!(opts.schema, SchemaId::Core);
        assert_eq!(opts.log_level, LogLevel::Warn);
        assert_eq!(opts.scalar.binary.line_width, 76);
        assert_eq!(opts.scalar.str_.fold.line_width, 80);
        assert_eq!(opts.scalar.str_.fold.min_content_width, 20);
        assert_eq!(opts.scalar.str_.double_quoted.min_multi_line_length, 40);
    }

    #[test]
    fn log_level_gates_warnings() {
        assert!(LogLevel::Warn.keeps_warnings());
        assert!(LogLevel::Debug.keeps_warnings());
        assert!(!LogLevel::Error.keeps_warnings());
        assert!(!LogLevel::Silent.keeps_warnings());
    }
}
