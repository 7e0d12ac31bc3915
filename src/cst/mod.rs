//! The concrete syntax tree: a structurally faithful record of the input,
//! including comments, node properties, and raw scalar carriers.
//!
//! The CST is built mutably by the parser and frozen once returned. Every
//! node carries a byte [`Range`] into the normalized source; calling
//! [`CstStream::set_orig_ranges`] retrofits CR/LF-aware ranges.

mod parser;
mod scalars;

use std::sync::Arc;

use crate::error::{NodeType, YamlError};
use crate::node::ScalarStyle;
use crate::source::{Range, Source};

pub(crate) use parser::parse_stream;

/// A parsed stream: the CST documents in source order plus the shared
/// source map.
#[derive(Debug)]
pub struct CstStream {
    pub documents: Vec<CstDocument>,
    pub(crate) source: Arc<Source>,
}

impl CstStream {
    /// Retrofit `orig_range` on every node, mapping normalized offsets back
    /// to the original CR/LF input. Returns whether any CR was observed.
    pub fn set_orig_ranges(&mut self) -> bool {
        let source = Arc::clone(&self.source);
        for doc in &mut self.documents {
            doc.set_orig_ranges(&source);
        }
        source.has_cr()
    }

    pub(crate) fn source(&self) -> &Arc<Source> {
        &self.source
    }
}

/// A value with the byte range it was parsed from.
#[derive(Clone, PartialEq, Debug)]
pub struct Spanned<T> {
    pub value: T,
    pub range: Range,
}

impl<T> Spanned<T> {
    pub fn new(value: T, range: Range) -> Self {
        Spanned { value, range }
    }
}

/// A comment line (text excludes the leading `#`).
#[derive(Clone, PartialEq, Debug)]
pub struct Comment {
    pub text: String,
    pub range: Range,
    pub orig_range: Option<Range>,
}

/// A `%NAME param…` directive line, preserved verbatim.
#[derive(Clone, PartialEq, Debug)]
pub struct Directive {
    pub name: String,
    pub parameters: Vec<String>,
    pub range: Range,
    pub orig_range: Option<Range>,
}

/// An explicit tag property (`!suffix`, `!!suffix`, `!h!suffix`, `!<uri>`).
#[derive(Clone, PartialEq, Debug)]
pub struct TagProp {
    pub handle: String,
    pub suffix: String,
    pub verbatim: bool,
}

/// One CST document: directives, optional `---`/`...` markers, contents,
/// and the diagnostics discovered while parsing it.
#[derive(Debug, Default)]
pub struct CstDocument {
    pub directives: Vec<Directive>,
    pub has_directives_end: bool,
    pub contents: Option<CstNode>,
    pub has_document_end: bool,
    /// Document-level comments not attached to any content node.
    pub comments: Vec<Comment>,
    pub errors: Vec<YamlError>,
    pub range: Range,
    pub orig_range: Option<Range>,
}

impl CstDocument {
    fn set_orig_ranges(&mut self, src: &Source) {
        self.orig_range = Some(src.orig_range(self.range));
        for d in &mut self.directives {
            d.orig_range = Some(src.orig_range(d.range));
        }
        for c in &mut self.comments {
            c.orig_range = Some(src.orig_range(c.range));
        }
        if let Some(contents) = &mut self.contents {
            contents.set_orig_ranges(src);
        }
    }
}

/// A value node plus its decorating properties.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct CstNode {
    /// `&name` properties; more than one is a semantic error at resolution.
    pub anchors: Vec<Spanned<String>>,
    /// `!tag` properties; more than one is a semantic error at resolution.
    pub tags: Vec<Spanned<TagProp>>,
    pub comment_before: Option<String>,
    /// Trailing comment on the node's last line.
    pub comment: Option<String>,
    /// `None` for an empty node (e.g. the missing value of `key:`).
    pub value: Option<CstValue>,
    pub range: Range,
    pub orig_range: Option<Range>,
}

impl CstNode {
    /// The reported node type, for diagnostics.
    pub fn node_type(&self) -> NodeType {
        match &self.value {
            None => NodeType::Plain,
            Some(v) => v.node_type(),
        }
    }

    fn set_orig_ranges(&mut self, src: &Source) {
        self.orig_range = Some(src.orig_range(self.range));
        match &mut self.value {
            Some(CstValue::BlockMap(items)) => {
                for item in items {
                    if let Some(k) = &mut item.key {
                        k.set_orig_ranges(src);
                    }
                    if let Some(v) = &mut item.value {
                        v.set_orig_ranges(src);
                    }
                }
            }
            Some(CstValue::BlockSeq(items)) => {
                for item in items {
                    if let Some(v) = &mut item.value {
                        v.set_orig_ranges(src);
                    }
                }
            }
            Some(CstValue::FlowMap(items)) | Some(CstValue::FlowSeq(items)) => {
                for item in items {
                    if let Some(k) = &mut item.key {
                        k.set_orig_ranges(src);
                    }
                    if let Some(v) = &mut item.value {
                        v.set_orig_ranges(src);
                    }
                }
            }
            _ => {}
        }
    }
}

/// The value variants, one per textual construct.
#[derive(Clone, PartialEq, Debug)]
pub enum CstValue {
    Scalar(CstScalar),
    Alias(String),
    BlockMap(Vec<MapEntry>),
    BlockSeq(Vec<SeqEntry>),
    FlowMap(Vec<FlowEntry>),
    FlowSeq(Vec<FlowEntry>),
}

impl CstValue {
    pub fn node_type(&self) -> NodeType {
        match self {
            CstValue::Scalar(s) => match s.style {
                ScalarStyle::Plain => NodeType::Plain,
                ScalarStyle::SingleQuoted => NodeType::QuoteSingle,
                ScalarStyle::DoubleQuoted => NodeType::QuoteDouble,
                ScalarStyle::Literal => NodeType::BlockLiteral,
                ScalarStyle::Folded => NodeType::BlockFolded,
            },
            CstValue::Alias(_) => NodeType::Alias,
            CstValue::BlockMap(_) => NodeType::BlockMap,
            CstValue::BlockSeq(_) => NodeType::BlockSeq,
            CstValue::FlowMap(_) => NodeType::FlowMap,
            CstValue::FlowSeq(_) => NodeType::FlowSeq,
        }
    }
}

/// A raw scalar carrier: the presentation style plus the cooked string
/// value computed at lex time. The raw text is recoverable via `range`.
#[derive(Clone, PartialEq, Debug)]
pub struct CstScalar {
    pub style: ScalarStyle,
    pub value: String,
}

/// One `key: value` item of a block mapping.
#[derive(Clone, PartialEq, Debug)]
pub struct MapEntry {
    /// Column the item starts at.
    pub indent: usize,
    /// Whether the key used the explicit `?` form.
    pub explicit: bool,
    pub key: Option<CstNode>,
    pub value: Option<CstNode>,
}

/// One `- value` item of a block sequence.
#[derive(Clone, PartialEq, Debug)]
pub struct SeqEntry {
    /// Column of the `-` marker.
    pub indent: usize,
    pub value: Option<CstNode>,
}

/// One comma-separated item of a flow collection. Sequence items leave
/// `key` empty; `a: b` pairs fill both sides.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct FlowEntry {
    pub key: Option<CstNode>,
    pub value: Option<CstNode>,
}
