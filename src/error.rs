//! Diagnostics produced by parsing and resolution.
//!
//! Errors never abort a parse; they collect on the owning document and the
//! caller inspects them. The high-level [`parse`](crate::parse) helper throws
//! the first one.

use crate::source::{LinePos, Range, Source};

/// The diagnostic family, mirroring the reported `name`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    Syntax,
    Semantic,
    Reference,
    Warning,
}

impl ErrorKind {
    /// The conventional diagnostic name for this kind.
    pub const fn name(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "YAMLSyntaxError",
            ErrorKind::Semantic => "YAMLSemanticError",
            ErrorKind::Reference => "YAMLReferenceError",
            ErrorKind::Warning => "YAMLWarning",
        }
    }
}

/// The syntactic construct a diagnostic is bound to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeType {
    Document,
    Directive,
    BlockMap,
    BlockSeq,
    FlowMap,
    FlowSeq,
    Plain,
    QuoteSingle,
    QuoteDouble,
    BlockLiteral,
    BlockFolded,
    Alias,
    Anchor,
    Tag,
    Comment,
}

impl NodeType {
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeType::Document => "DOCUMENT",
            NodeType::Directive => "DIRECTIVE",
            NodeType::BlockMap => "MAP",
            NodeType::BlockSeq => "SEQ",
            NodeType::FlowMap => "FLOW_MAP",
            NodeType::FlowSeq => "FLOW_SEQ",
            NodeType::Plain => "PLAIN",
            NodeType::QuoteSingle => "QUOTE_SINGLE",
            NodeType::QuoteDouble => "QUOTE_DOUBLE",
            NodeType::BlockLiteral => "BLOCK_LITERAL",
            NodeType::BlockFolded => "BLOCK_FOLDED",
            NodeType::Alias => "ALIAS",
            NodeType::Anchor => "ANCHOR",
            NodeType::Tag => "TAG",
            NodeType::Comment => "COMMENT",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parse or resolution diagnostic.
///
/// `range` addresses the normalized source bytes. After
/// [`make_pretty`](YamlError::make_pretty) the message carries a
/// caret-underlined source snippet and `line_pos` is populated; otherwise
/// `source` retains the offending text verbatim.
#[derive(Clone, PartialEq, Debug)]
pub struct YamlError {
    pub kind: ErrorKind,
    pub message: String,
    pub node_type: Option<NodeType>,
    pub range: Range,
    pub line_pos: Option<(LinePos, LinePos)>,
    pub source: Option<String>,
}

impl std::fmt::Display for YamlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for YamlError {}

impl YamlError {
    pub fn new(
        kind: ErrorKind,
        node_type: Option<NodeType>,
        range: Range,
        message: impl Into<String>,
    ) -> Self {
        YamlError {
            kind,
            message: message.into(),
            node_type,
            range,
            line_pos: None,
            source: None,
        }
    }

    pub fn syntax(node_type: NodeType, range: Range, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, Some(node_type), range, message)
    }

    pub fn semantic(node_type: NodeType, range: Range, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Semantic, Some(node_type), range, message)
    }

    pub fn reference(node_type: NodeType, range: Range, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reference, Some(node_type), range, message)
    }

    pub fn warning(range: Range, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Warning, None, range, message)
    }

    /// The conventional diagnostic name, e.g. `YAMLSemanticError`.
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub const fn is_warning(&self) -> bool {
        matches!(self.kind, ErrorKind::Warning)
    }

    /// Retain the offending source text for non-pretty reporting.
    pub(crate) fn capture_source(&mut self, src: &Source) {
        let text = src.text();
        let start = self.range.start.min(text.len());
        let end = self.range.end.min(text.len());
        if start < end {
            self.source = Some(text[start..end].to_string());
        }
    }

    /// Rewrite the message into its multi-line caret-underlined form, fill
    /// `line_pos`, and drop the raw source back-reference.
    pub(crate) fn make_pretty(&mut self, src: &Source) {
        let start = src.line_pos(self.range.start);
        // Ranges may point one past the end of input (missing-terminator
        // errors); keep the column span truthful anyway.
        let end = if self.range.end > src.text().len() {
            LinePos {
                line: start.line,
                col: start.col + self.range.len(),
            }
        } else {
            src.line_pos(self.range.end.max(self.range.start))
        };
        self.line_pos = Some((start, end));
        self.source = None;

        let line = src.line_text(start.line);
        if line.is_empty() {
            self.message = format!(
                "{} at line {}, column {}",
                self.message, start.line, start.col
            );
            return;
        }
        let caret_end = if end.line == start.line && end.col > start.col {
            end.col
        } else {
            start.col + 1
        };
        let width = (caret_end - start.col).max(1);
        let pad = " ".repeat(start.col.saturating_sub(1));
        let carets = "^".repeat(width);
        self.message = format!(
            "{} at line {}, column {}:\n\n{}\n{}{}",
            self.message, start.line, start.col, line, pad, carets
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_the_kind() {
        assert_eq!(ErrorKind::Syntax.name(), "YAMLSyntaxError");
        assert_eq!(ErrorKind::Semantic.name(), "YAMLSemanticError");
        assert_eq!(ErrorKind::Reference.name(), "YAMLReferenceError");
        assert_eq!(ErrorKind::Warning.name(), "YAMLWarning");
    }

    #[test]
    fn pretty_message_underlines_the_range() {
        let src = Source::new("abc: 123\ndef");
        let mut err = YamlError::semantic(
            NodeType::Plain,
            Range::new(9, 12),
            "Implicit map keys need to be followed by map values",
        );
        err.make_pretty(&src);
        let (start, end) = err.line_pos.unwrap();
        assert_eq!(start, LinePos { line: 2, col: 1 });
        assert_eq!(end, LinePos { line: 2, col: 4 });
        assert!(err.message.contains("at line 2, column 1"));
        assert!(err.message.ends_with("def\n^^^"));
        assert!(err.source.is_none());
    }

    #[test]
    fn raw_errors_keep_their_source() {
        let src = Source::new("{ , }");
        let mut err =
            YamlError::syntax(NodeType::FlowMap, Range::new(2, 3), "Unexpected , in flow map");
        err.capture_source(&src);
        assert_eq!(err.source.as_deref(), Some(","));
        assert!(err.line_pos.is_none());
    }
}
