//! The document: resolved contents plus everything the resolver learned.
//!
//! Anchored subtrees live in an arena owned by the document; aliases hold the
//! arena index they bound to at resolve time. Re-declaring an anchor name
//! points the name at a new arena slot without disturbing aliases that
//! already bound to the old one.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::cst::CstDocument;
use crate::error::{NodeType, YamlError};
use crate::node::{Node, Pair};
use crate::options::{Options, Version};
use crate::schema::{Schema, SchemaId, Tag, MERGE_TAG};
use crate::source::Source;
use crate::value::{Mapping, Value};

/// The anchor registry: an arena of anchored subtrees plus a name index
/// pointing at each name's latest declaration.
#[derive(Debug, Default, Clone)]
pub struct Anchors {
    nodes: Vec<Node>,
    names: IndexMap<String, usize>,
}

impl Anchors {
    /// Register a resolved subtree under `name`, shadowing any earlier
    /// declaration for subsequent aliases.
    pub fn register(&mut self, name: &str, node: Node) -> usize {
        let id = self.nodes.len();
        self.nodes.push(node);
        self.names.insert(name.to_string(), id);
        id
    }

    /// The arena index `name` currently points at.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Drop a name from the index. The arena slot stays so that aliases
    /// already bound to it keep resolving.
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.shift_remove(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The `prefix` plus the smallest unused integer suffix.
    pub fn generate_name(&self, prefix: &str) -> String {
        let mut n = 1usize;
        loop {
            let name = format!("{prefix}{n}");
            if !self.names.contains_key(&name) {
                return name;
            }
            n += 1;
        }
    }
}

/// A resolved YAML document.
#[derive(Debug)]
pub struct Document {
    pub contents: Option<Node>,
    pub errors: Vec<YamlError>,
    pub warnings: Vec<YamlError>,
    pub anchors: Anchors,
    /// `%TAG` handle → prefix table.
    pub tag_prefixes: IndexMap<String, String>,
    /// Version from a `%YAML` directive, if any.
    pub version: Option<Version>,
    pub has_directives_end: bool,
    pub has_document_end: bool,
    pub(crate) schema: Schema,
    pub(crate) options: Options,
    pub(crate) source: Option<Arc<Source>>,
    /// The originating CST document, kept when `keep_cst_nodes` is set.
    pub cst: Option<CstDocument>,
}

impl Document {
    pub fn new(options: &Options) -> Self {
        Document {
            contents: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            anchors: Anchors::default(),
            tag_prefixes: IndexMap::new(),
            version: None,
            has_directives_end: false,
            has_document_end: false,
            schema: Schema::new(options.schema, &options.custom_tags),
            options: options.clone(),
            source: None,
            cst: None,
        }
    }

    /// Rebind the schema; existing contents are not re-resolved.
    pub fn set_schema(&mut self, id: SchemaId, custom: &[Tag]) {
        self.schema = Schema::new(id, custom);
        self.options.schema = id;
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The version the document is effectively parsed and emitted under.
    pub fn effective_version(&self) -> Version {
        self.version.unwrap_or(self.options.version)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Set the contents from a host value.
    pub fn set_contents(&mut self, value: impl Into<Value>) {
        self.contents = Some(crate::create_node(value));
    }

    /// Anchor `node` and return an alias bound to it. Without an explicit
    /// `name`, one is generated from `anchor_prefix` plus the smallest
    /// unused integer suffix.
    pub fn create_alias(&mut self, node: &mut Node, name: Option<&str>) -> Node {
        let name = match name {
            Some(n) => n.to_string(),
            None => self.anchors.generate_name(&self.options.anchor_prefix),
        };
        node.set_anchor(Some(name.clone()));
        let id = self.anchors.register(&name, node.clone());
        Node::Alias(crate::node::Alias {
            id: Some(id),
            ..crate::node::Alias::new(name)
        })
    }

    /// Convert the resolved contents into a host value, expanding aliases
    /// and (under merge-enabled schemas) splicing `<<` merge keys.
    pub fn to_value(&self) -> Result<Value, YamlError> {
        match &self.contents {
            None => Ok(Value::Null),
            Some(node) => self.node_value(node, 0),
        }
    }

    /// Stringify this document. Documents carrying errors are refused.
    pub fn to_yaml_string(&self) -> Result<String, YamlError> {
        if let Some(err) = self.errors.first() {
            debug!("refusing to stringify document with {} error(s)", self.errors.len());
            let mut refusal = YamlError::semantic(
                err.node_type.unwrap_or(NodeType::Document),
                err.range,
                "Document with errors cannot be stringified",
            );
            refusal.line_pos = err.line_pos;
            return Err(refusal);
        }
        crate::stringify::stringify_document(self)
    }

    pub(crate) fn node_value(&self, node: &Node, depth: usize) -> Result<Value, YamlError> {
        if depth > 256 {
            return Err(YamlError::reference(
                NodeType::Alias,
                node.range().unwrap_or_default(),
                "Excessive alias nesting depth",
            ));
        }
        match node {
            Node::Scalar(s) => Ok(s.value.clone()),
            Node::Seq(seq) => {
                let mut items = Vec::with_capacity(seq.items.len());
                for item in &seq.items {
                    items.push(self.node_value(item, depth + 1)?);
                }
                Ok(Value::Sequence(items))
            }
            Node::Map(map) => {
                let mut out = Mapping::with_capacity(map.items.len());
                for pair in &map.items {
                    if self.schema.merge && is_merge_pair(pair) {
                        self.apply_merge(&mut out, pair, depth)?;
                        continue;
                    }
                    let key = match &pair.key {
                        Some(k) => self.node_value(k, depth + 1)?,
                        None => Value::Null,
                    };
                    let value = match &pair.value {
                        Some(v) => self.node_value(v, depth + 1)?,
                        None => Value::Null,
                    };
                    out.insert(key, value);
                }
                Ok(Value::Mapping(out))
            }
            Node::Alias(alias) => match alias.id.and_then(|id| self.anchors.node(id)) {
                Some(target) => self.node_value(target, depth + 1),
                // Unresolved aliases already carry a reference error;
                // best-effort conversion substitutes null.
                None => Ok(Value::Null),
            },
        }
    }

    /// Splice the pairs of each merge source that are not already present.
    fn apply_merge(&self, out: &mut Mapping, pair: &Pair, depth: usize) -> Result<(), YamlError> {
        let sources: Vec<&Node> = match &pair.value {
            Some(node @ Node::Alias(_)) => vec![node],
            Some(Node::Seq(seq)) => seq.items.iter().collect(),
            _ => return Ok(()),
        };
        for source in sources {
            let Node::Alias(alias) = source else { continue };
            let Some(target) = alias.id.and_then(|id| self.anchors.node(id)) else {
                continue;
            };
            if let Value::Mapping(m) = self.node_value(target, depth + 1)? {
                for (k, v) in m {
                    if !out.contains_key(&k) {
                        out.insert(k, v);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Whether a pair's key is a resolved `<<` merge key.
pub(crate) fn is_merge_pair(pair: &Pair) -> bool {
    matches!(
        &pair.key,
        Some(Node::Scalar(s)) if s.tag.as_deref() == Some(MERGE_TAG)
    )
}
