//! A YAML 1.0/1.1/1.2 parser and stringifier built around a three-layer
//! pipeline: a comment-preserving concrete syntax tree, a schema-typed
//! abstract syntax tree with anchors and aliases, and a style-aware
//! stringifier.
//!
//! Parsing never throws on bad input: diagnostics collect on the document
//! and the high-level [`parse`] helper surfaces the first one. A document
//! that carries errors refuses to stringify.
//!
//! Merge keys (`<<`) follow the yaml-1.1 schema only; under `core` and the
//! other schemas `<<` is an ordinary mapping key.
//!
//! # Example
//! ```rust
//! let value = yawl::parse("foo: 123").unwrap();
//! assert_eq!(value["foo"].as_i64(), Some(123));
//!
//! let out = yawl::stringify(&value).unwrap();
//! assert_eq!(out, "foo: 123\n");
//! ```

mod cst;
mod document;
mod error;
mod node;
mod options;
mod resolve;
mod schema;
mod source;
mod stringify;
mod value;
mod visit;

pub use cst::{
    Comment, CstDocument, CstNode, CstScalar, CstStream, CstValue, Directive, FlowEntry,
    MapEntry, SeqEntry, Spanned, TagProp,
};
pub use document::{Anchors, Document};
pub use error::{ErrorKind, NodeType, YamlError};
pub use node::{Alias, Map, Node, NodeKind, Pair, Scalar, ScalarStyle, Seq};
pub use options::{
    BinaryOptions, BoolOptions, DoubleQuotedOptions, FoldOptions, IntOptions, LogLevel,
    NullOptions, Options, ScalarOptions, StrOptions, Version,
};
pub use schema::{
    ResolveFn, ResolvedScalar, Schema, SchemaId, StringifyFn, Tag, TagContext, TestFn,
    ValidateFn, BINARY_TAG, BOOL_TAG, FLOAT_TAG, INT_TAG, MAP_TAG, MERGE_TAG, NULL_TAG, OMAP_TAG,
    PAIRS_TAG, SEQ_TAG, SET_TAG, STR_TAG, TIMESTAMP_TAG,
};
pub use source::{LinePos, Range};
pub use value::{Mapping, Value};
pub use visit::{visit, Visit, VisitKey};

use log::debug;

/// Parse the raw source into its concrete syntax trees, one per document.
pub fn parse_cst(input: &str) -> CstStream {
    cst::parse_stream(input)
}

/// Parse every document in the stream, in source order.
pub fn parse_all_documents(input: &str, options: &Options) -> Vec<Document> {
    let stream = cst::parse_stream(input);
    let source = std::sync::Arc::clone(stream.source());
    stream
        .documents
        .into_iter()
        .map(|doc| resolve::resolve_document(doc, &source, options))
        .collect()
}

/// Parse the first document. Surplus documents leave an error on the result.
pub fn parse_document(input: &str, options: &Options) -> Document {
    let stream = cst::parse_stream(input);
    let source = std::sync::Arc::clone(stream.source());
    let mut documents = stream.documents.into_iter();
    let first = documents.next();
    let surplus: Vec<cst::CstDocument> = documents.collect();
    let mut doc = match first {
        Some(cst_doc) => resolve::resolve_document(cst_doc, &source, options),
        None => {
            let mut doc = Document::new(options);
            doc.source = Some(source.clone());
            doc
        }
    };
    if let Some(extra) = surplus.first() {
        let mut err = YamlError::semantic(
            NodeType::Document,
            extra.range,
            "Source contains multiple documents; please use parse_all_documents()",
        );
        if options.pretty_errors {
            err.make_pretty(&source);
        } else {
            err.capture_source(&source);
        }
        doc.errors.push(err);
    }
    doc
}

/// Parse a single-document source into a host value, using the default
/// options. The first recorded error is returned; warnings go to the `log`
/// facade.
pub fn parse(input: &str) -> Result<Value, YamlError> {
    parse_with(input, &Options::default())
}

/// As [`parse`], with explicit options.
pub fn parse_with(input: &str, options: &Options) -> Result<Value, YamlError> {
    let doc = parse_document(input, options);
    debug!(
        "parsed document: {} error(s), {} warning(s)",
        doc.errors.len(),
        doc.warnings.len()
    );
    if let Some(err) = doc.errors.first() {
        return Err(err.clone());
    }
    doc.to_value()
}

/// Stringify a host value as a single YAML document under the default
/// options. Output always ends with a newline.
pub fn stringify(value: &Value) -> Result<String, YamlError> {
    stringify_with(value, &Options::default())
}

/// As [`stringify`], with explicit options.
pub fn stringify_with(value: &Value, options: &Options) -> Result<String, YamlError> {
    let mut doc = Document::new(options);
    doc.contents = Some(create_node(value.clone()));
    doc.to_yaml_string()
}

/// Wrap a host value into an AST node. Host types adapt through the
/// [`Value`] conversions (`impl Into<Value>`).
pub fn create_node(value: impl Into<Value>) -> Node {
    node_from_value(value.into())
}

/// As [`create_node`], attaching an explicit tag to the produced node.
///
/// # Panics
///
/// Panics when `tag` names a tag that is neither in the schema selected by
/// `options` nor a local (`!name`) tag: that is a bug in caller code.
pub fn create_node_with(value: impl Into<Value>, tag: Option<&str>, options: &Options) -> Node {
    let mut node = node_from_value(value.into());
    if let Some(tag) = tag {
        let schema = Schema::new(options.schema, &options.custom_tags);
        assert!(
            schema.find(tag).is_some() || tag.starts_with('!'),
            "tag {tag} is not present in the {} schema",
            options.schema.as_str()
        );
        match &mut node {
            Node::Scalar(s) => s.tag = Some(tag.to_string()),
            Node::Map(m) => m.tag = Some(tag.to_string()),
            Node::Seq(s) => s.tag = Some(tag.to_string()),
            Node::Alias(_) => {}
        }
    }
    node
}

fn node_from_value(value: Value) -> Node {
    match value {
        Value::Sequence(items) => Node::Seq(Seq {
            items: items.into_iter().map(node_from_value).collect(),
            ..Seq::default()
        }),
        Value::Mapping(entries) => Node::Map(Map {
            items: entries
                .into_iter()
                .map(|(k, v)| Pair::new(Some(node_from_value(k)), Some(node_from_value(v))))
                .collect(),
            ..Map::default()
        }),
        Value::Binary(bytes) => {
            let mut s = Scalar::new(Value::Binary(bytes));
            s.tag = Some(BINARY_TAG.to_string());
            s.style = ScalarStyle::Literal;
            Node::Scalar(s)
        }
        scalar => Node::Scalar(Scalar::new(scalar)),
    }
}
