//! The AST resolver: one CST document in, one [`Document`] out.
//!
//! Resolution applies directives, expands tag shorthands through the
//! document's prefix table, binds anchors and aliases through the anchor
//! arena, types scalars through the schema, and accumulates every
//! diagnostic on the document instead of throwing.

use std::sync::Arc;

use log::warn;

use crate::cst::{CstDocument, CstNode, CstScalar, CstValue, FlowEntry, MapEntry, SeqEntry, Spanned, TagProp};
use crate::document::Document;
use crate::error::{NodeType, YamlError};
use crate::node::{Alias, Map, Node, NodeKind, Pair, Scalar, Seq};
use crate::options::{Options, Version};
use crate::schema::{
    Schema, TagContext, BOOL_TAG, FLOAT_TAG, INT_TAG, NULL_TAG, STR_TAG,
};
use crate::source::{Range, Source};
use crate::value::Value;

pub(crate) fn resolve_document(
    cst: CstDocument,
    source: &Arc<Source>,
    options: &Options,
) -> Document {
    let mut doc = Document::new(options);
    doc.source = Some(Arc::clone(source));
    doc.has_directives_end = cst.has_directives_end;
    doc.has_document_end = cst.has_document_end;

    apply_directives(&mut doc, &cst, options);

    // CST diagnostics come first: they were discovered first.
    for err in &cst.errors {
        if err.is_warning() {
            record_warning(&mut doc, err.clone(), options);
        } else {
            doc.errors.push(err.clone());
        }
    }

    let ctx = TagContext {
        version: doc.effective_version(),
        as_big_int: options.scalar.int.as_big_int,
    };
    let mut resolver = Resolver {
        doc,
        ctx,
        options,
        counter: 0,
    };
    if let Some(contents) = &cst.contents {
        let node = resolver.resolve_node(contents);
        resolver.doc.contents = Some(node);
    }
    let mut doc = resolver.doc;
    check_alias_limits(&mut doc, options.max_alias_count);

    finish_diagnostics(&mut doc, source, options);
    if options.keep_cst_nodes {
        doc.cst = Some(cst);
    }
    doc
}

fn record_warning(doc: &mut Document, warning: YamlError, options: &Options) {
    if options.log_level.keeps_warnings() {
        warn!("{}", warning.message);
        doc.warnings.push(warning);
    }
}

fn finish_diagnostics(doc: &mut Document, source: &Arc<Source>, options: &Options) {
    for err in doc.errors.iter_mut().chain(doc.warnings.iter_mut()) {
        if options.pretty_errors {
            err.make_pretty(source);
        } else {
            err.capture_source(source);
        }
    }
}

fn apply_directives(doc: &mut Document, cst: &CstDocument, options: &Options) {
    for directive in &cst.directives {
        match directive.name.as_str() {
            "YAML" => {
                if doc.version.is_some() {
                    record_warning(
                        doc,
                        YamlError::warning(
                            directive.range,
                            "The %YAML directive must only be given at most once",
                        ),
                        options,
                    );
                }
                match directive.parameters.first().map(String::as_str) {
                    Some("1.0") => doc.version = Some(Version::V1_0),
                    Some("1.1") => doc.version = Some(Version::V1_1),
                    Some("1.2") => doc.version = Some(Version::V1_2),
                    Some(other) => {
                        record_warning(
                            doc,
                            YamlError::warning(
                                directive.range,
                                format!("Unsupported YAML version {other}, treating as 1.2"),
                            ),
                            options,
                        );
                        doc.version = Some(Version::V1_2);
                    }
                    None => doc.errors.push(YamlError::semantic(
                        NodeType::Directive,
                        directive.range,
                        "Insufficient parameters given for %YAML directive",
                    )),
                }
            }
            "TAG" => match (directive.parameters.first(), directive.parameters.get(1)) {
                (Some(handle), Some(prefix)) if handle.starts_with('!') => {
                    doc.tag_prefixes.insert(handle.clone(), prefix.clone());
                }
                _ => doc.errors.push(YamlError::semantic(
                    NodeType::Directive,
                    directive.range,
                    "Insufficient parameters given for %TAG directive",
                )),
            },
            // Reserved directives were already warned about by the parser
            // and stay preserved on the CST.
            _ => {}
        }
    }
    if !cst.directives.is_empty() && !cst.has_directives_end {
        if let Some(last) = cst.directives.last() {
            doc.errors.push(YamlError::semantic(
                NodeType::Directive,
                last.range,
                "Missing directives-end indicator line",
            ));
        }
    }
}

struct Resolver<'a> {
    doc: Document,
    ctx: TagContext,
    options: &'a Options,
    counter: usize,
}

/// An expanded explicit tag property.
struct ExpandedTag {
    tag: Option<String>,
    /// The bare `!` non-specific tag: force the default type by shape.
    non_specific: bool,
    range: Range,
}

impl Resolver<'_> {
    fn warn(&mut self, range: Range, message: String) {
        if self.options.log_level.keeps_warnings() {
            warn!("{message}");
            self.doc.warnings.push(YamlError::warning(range, message));
        }
    }

    fn resolve_node(&mut self, cst: &CstNode) -> Node {
        let index = self.counter;
        self.counter += 1;
        let cst_ref = self.options.keep_cst_nodes.then_some(index);

        let anchor = self.node_anchor(cst);
        let tag = self.node_tag(cst);

        let mut node = match &cst.value {
            None => {
                let mut s = Scalar::new(Value::Null);
                s.range = Some(cst.range);
                Node::Scalar(s)
            }
            Some(CstValue::Scalar(sc)) => self.resolve_scalar(cst, sc, &tag),
            Some(CstValue::Alias(name)) => {
                if anchor.is_some() || tag.as_ref().is_some_and(|t| t.tag.is_some()) {
                    self.doc.errors.push(YamlError::semantic(
                        NodeType::Alias,
                        cst.range,
                        "An alias node must not specify any properties",
                    ));
                }
                let id = self.doc.anchors.lookup(name);
                if id.is_none() {
                    self.doc.errors.push(YamlError::reference(
                        NodeType::Alias,
                        cst.range,
                        format!("Aliased anchor not found: {name}"),
                    ));
                }
                Node::Alias(Alias {
                    name: name.clone(),
                    id,
                    comment_before: None,
                    comment: None,
                    range: Some(cst.range),
                })
            }
            Some(CstValue::BlockMap(entries)) => {
                let map = self.resolve_map_entries(entries, cst.range, false);
                self.finish_collection(Node::Map(map), &tag, cst.range)
            }
            Some(CstValue::BlockSeq(entries)) => {
                let seq = self.resolve_seq_entries(entries, cst.range, false);
                self.finish_collection(Node::Seq(seq), &tag, cst.range)
            }
            Some(CstValue::FlowMap(entries)) => {
                let map = self.resolve_flow_map(entries, cst.range);
                self.finish_collection(Node::Map(map), &tag, cst.range)
            }
            Some(CstValue::FlowSeq(entries)) => {
                let seq = self.resolve_flow_seq(entries, cst.range);
                self.finish_collection(Node::Seq(seq), &tag, cst.range)
            }
        };

        attach_comments(&mut node, cst);
        set_cst_ref(&mut node, cst_ref);
        if let Some(name) = anchor {
            node.set_anchor(Some(name.clone()));
            self.doc.anchors.register(&name, node.clone());
        }
        node
    }

    fn node_anchor(&mut self, cst: &CstNode) -> Option<String> {
        if cst.anchors.len() > 1 {
            self.doc.errors.push(YamlError::semantic(
                cst.node_type(),
                cst.range,
                "A node can have at most one anchor",
            ));
        }
        cst.anchors
            .first()
            .map(|a| a.value.clone())
            .filter(|name| !name.is_empty())
    }

    fn node_tag(&mut self, cst: &CstNode) -> Option<ExpandedTag> {
        if cst.tags.len() > 1 {
            self.doc.errors.push(YamlError::semantic(
                cst.node_type(),
                cst.range,
                "A node can have at most one tag",
            ));
        }
        cst.tags.first().map(|prop| self.expand_tag(prop))
    }

    /// Expand a tag shorthand through the document's prefix table.
    fn expand_tag(&mut self, prop: &Spanned<TagProp>) -> ExpandedTag {
        let TagProp {
            handle,
            suffix,
            verbatim,
        } = &prop.value;
        if *verbatim {
            return ExpandedTag {
                tag: Some(suffix.clone()),
                non_specific: false,
                range: prop.range,
            };
        }
        if handle == "!" && suffix.is_empty() {
            return ExpandedTag {
                tag: None,
                non_specific: true,
                range: prop.range,
            };
        }
        let prefix = self.doc.tag_prefixes.get(handle).cloned().or_else(|| {
            match handle.as_str() {
                "!!" => Some("tag:yaml.org,2002:".to_string()),
                "!" => Some("!".to_string()),
                _ => None,
            }
        });
        let tag = match prefix {
            Some(p) => format!("{p}{suffix}"),
            None => {
                self.warn(
                    prop.range,
                    format!("The {handle} tag handle is non-default and was not declared"),
                );
                format!("{handle}{suffix}")
            }
        };
        ExpandedTag {
            tag: Some(tag),
            non_specific: false,
            range: prop.range,
        }
    }

    fn resolve_scalar(&mut self, cst: &CstNode, sc: &CstScalar, tag: &Option<ExpandedTag>) -> Node {
        let raw = &sc.value;
        let mut scalar = Scalar::with_style(Value::Null, sc.style);
        scalar.source = Some(raw.clone());
        scalar.range = Some(cst.range);

        match tag {
            Some(t) if t.non_specific => {
                scalar.value = Value::String(raw.clone());
            }
            Some(ExpandedTag { tag: Some(uri), range, .. }) => {
                // Tag kinds and resolvers are plain function pointers, so
                // copy them out before touching the error list.
                let found = self.doc.schema.find(uri).map(|d| (d.kind, d.resolve));
                match found {
                    Some((NodeKind::Scalar, resolve)) => {
                        let resolved = match resolve {
                            Some(resolve) => resolve(raw, &self.ctx),
                            None => Ok(Value::String(raw.clone())),
                        };
                        match resolved {
                            Ok(value) => scalar.value = value,
                            Err(message) => {
                                self.doc.errors.push(YamlError::semantic(
                                    cst.node_type(),
                                    cst.range,
                                    message,
                                ));
                                scalar.value = Value::String(raw.clone());
                            }
                        }
                        scalar.tag = Some(uri.clone());
                    }
                    _ => {
                        self.warn(
                            *range,
                            format!("tag {uri} is unavailable, falling back to {STR_TAG}"),
                        );
                        scalar.value = Value::String(raw.clone());
                        // The tag survives on the node for round-tripping.
                        scalar.tag = Some(uri.clone());
                    }
                }
            }
            _ => {
                if sc.style == crate::node::ScalarStyle::Plain {
                    let resolved = self.doc.schema.resolve_scalar(raw, &self.ctx);
                    if let Some(message) = resolved.error {
                        self.doc.errors.push(YamlError::semantic(
                            cst.node_type(),
                            cst.range,
                            message,
                        ));
                    }
                    scalar.value = resolved.value;
                    // Tags the stringifier cannot re-derive from the value
                    // alone (merge, timestamp, custom) stay on the node.
                    let defaults = [STR_TAG, NULL_TAG, BOOL_TAG, INT_TAG, FLOAT_TAG];
                    if !defaults.contains(&resolved.tag.as_str()) {
                        scalar.tag = Some(resolved.tag);
                    }
                } else {
                    scalar.value = Value::String(raw.clone());
                }
            }
        }
        Node::Scalar(scalar)
    }

    /// Attach an explicit tag to a resolved collection, validating its
    /// shape; unknown or mismatched tags fall back by shape with a warning.
    fn finish_collection(&mut self, mut node: Node, tag: &Option<ExpandedTag>, range: Range) -> Node {
        let Some(ExpandedTag { tag: Some(uri), range: tag_range, non_specific }) = tag else {
            return node;
        };
        if *non_specific {
            return node;
        }
        let fallback = Schema::fallback_tag(node.kind());
        let found = self.doc.schema.find(uri).map(|d| (d.kind, d.validate));
        match found {
            Some((kind, validate)) if kind == node.kind() => {
                if let Some(validate) = validate {
                    if let Err(message) = validate(&node) {
                        self.doc.errors.push(YamlError::semantic(
                            node_type_of(&node),
                            range,
                            message,
                        ));
                    }
                }
            }
            _ if *uri == fallback => {}
            _ => {
                self.warn(
                    *tag_range,
                    format!("tag {uri} is unavailable, falling back to {fallback}"),
                );
            }
        }
        match &mut node {
            Node::Map(m) => m.tag = Some(uri.clone()),
            Node::Seq(s) => s.tag = Some(uri.clone()),
            _ => {}
        }
        node
    }

    fn resolve_map_entries(&mut self, entries: &[MapEntry], range: Range, flow: bool) -> Map {
        let mut map = Map {
            flow,
            range: Some(range),
            ..Map::default()
        };
        let mut seen_keys: Vec<Option<Value>> = Vec::with_capacity(entries.len());
        for entry in entries {
            let key = entry.key.as_ref().map(|k| self.resolve_node(k));
            let value = entry.value.as_ref().map(|v| self.resolve_node(v));
            let pair = Pair::new(key, value);
            self.check_merge_pair(&pair, range);
            let key_value = pair.key.as_ref().and_then(simple_value);
            if key_value.is_some() && seen_keys.contains(&key_value) {
                let text = key_text(pair.key.as_ref());
                self.warn(
                    pair.key.as_ref().and_then(Node::range).unwrap_or(range),
                    format!("Map keys must be unique; \"{text}\" is repeated"),
                );
            }
            seen_keys.push(key_value);
            map.items.push(pair);
        }
        map
    }

    fn resolve_seq_entries(&mut self, entries: &[SeqEntry], range: Range, flow: bool) -> Seq {
        let mut seq = Seq {
            flow,
            range: Some(range),
            ..Seq::default()
        };
        for entry in entries {
            match &entry.value {
                Some(v) => seq.items.push(self.resolve_node(v)),
                None => {
                    let mut s = Scalar::new(Value::Null);
                    s.range = Some(range);
                    seq.items.push(Node::Scalar(s));
                }
            }
        }
        seq
    }

    fn resolve_flow_map(&mut self, entries: &[FlowEntry], range: Range) -> Map {
        let converted: Vec<MapEntry> = entries
            .iter()
            .map(|e| MapEntry {
                indent: 0,
                explicit: false,
                key: e.key.clone(),
                value: e.value.clone(),
            })
            .collect();
        self.resolve_map_entries(&converted, range, true)
    }

    fn resolve_flow_seq(&mut self, entries: &[FlowEntry], range: Range) -> Seq {
        let mut seq = Seq {
            flow: true,
            range: Some(range),
            ..Seq::default()
        };
        for entry in entries {
            match (&entry.key, &entry.value) {
                // `a: b` inside a flow sequence is a single-pair map.
                (Some(k), value) => {
                    let key = self.resolve_node(k);
                    let value = value.as_ref().map(|v| self.resolve_node(v));
                    let map = Map {
                        items: vec![Pair::new(Some(key), value)],
                        flow: true,
                        range: Some(k.range),
                        ..Map::default()
                    };
                    seq.items.push(Node::Map(map));
                }
                (None, Some(v)) => seq.items.push(self.resolve_node(v)),
                (None, None) => {}
            }
        }
        seq
    }

    /// Validate a `<<` merge pair under merge-enabled schemas: its value
    /// must be an alias to a map, or a sequence of such aliases.
    fn check_merge_pair(&mut self, pair: &Pair, range: Range) {
        if !self.doc.schema.merge || !crate::document::is_merge_pair(pair) {
            return;
        }
        let sources: Vec<&Node> = match &pair.value {
            Some(node @ Node::Alias(_)) => vec![node],
            Some(Node::Seq(seq)) => seq.items.iter().collect(),
            _ => {
                self.doc.errors.push(YamlError::semantic(
                    NodeType::BlockMap,
                    pair.value.as_ref().and_then(Node::range).unwrap_or(range),
                    "Merge nodes can only have Alias nodes as values",
                ));
                return;
            }
        };
        for source in sources {
            let ok = match source {
                Node::Alias(alias) => alias
                    .id
                    .and_then(|id| self.doc.anchors.node(id))
                    .is_none_or(|target| matches!(target, Node::Map(_))),
                _ => false,
            };
            if !ok {
                self.doc.errors.push(YamlError::semantic(
                    NodeType::BlockMap,
                    source.range().unwrap_or(range),
                    "Merge sources must be maps",
                ));
            }
        }
    }
}

fn node_type_of(node: &Node) -> NodeType {
    match node {
        Node::Scalar(_) => NodeType::Plain,
        Node::Map(m) if m.flow => NodeType::FlowMap,
        Node::Map(_) => NodeType::BlockMap,
        Node::Seq(s) if s.flow => NodeType::FlowSeq,
        Node::Seq(_) => NodeType::BlockSeq,
        Node::Alias(_) => NodeType::Alias,
    }
}

fn attach_comments(node: &mut Node, cst: &CstNode) {
    let before = cst.comment_before.clone();
    let trailing = cst.comment.clone();
    match node {
        Node::Scalar(s) => {
            s.comment_before = before;
            s.comment = trailing;
        }
        Node::Map(m) => {
            m.comment_before = before;
            m.comment = trailing;
        }
        Node::Seq(s) => {
            s.comment_before = before;
            s.comment = trailing;
        }
        Node::Alias(a) => {
            a.comment_before = before;
            a.comment = trailing;
        }
    }
}

fn set_cst_ref(node: &mut Node, cst_ref: Option<usize>) {
    match node {
        Node::Scalar(s) => s.cst = cst_ref,
        Node::Map(m) => m.cst = cst_ref,
        Node::Seq(s) => s.cst = cst_ref,
        Node::Alias(_) => {}
    }
}

/// The resolved value of an alias-free subtree, used for duplicate-key
/// comparison (collections compare structurally).
fn simple_value(node: &Node) -> Option<Value> {
    match node {
        Node::Scalar(s) => Some(s.value.clone()),
        Node::Seq(seq) => {
            let mut items = Vec::with_capacity(seq.items.len());
            for item in &seq.items {
                items.push(simple_value(item)?);
            }
            Some(Value::Sequence(items))
        }
        Node::Map(map) => {
            let mut out = crate::value::Mapping::new();
            for pair in &map.items {
                let k = pair.key.as_ref().and_then(simple_value)?;
                let v = match &pair.value {
                    Some(v) => simple_value(v)?,
                    None => Value::Null,
                };
                out.insert(k, v);
            }
            Some(Value::Mapping(out))
        }
        Node::Alias(_) => None,
    }
}

fn key_text(key: Option<&Node>) -> String {
    match key {
        Some(Node::Scalar(s)) => s
            .source
            .clone()
            .unwrap_or_else(|| format!("{:?}", s.value)),
        Some(_) => "<collection>".to_string(),
        None => "<null>".to_string(),
    }
}

/// Enforce the per-alias expansion guard: each alias's resolved subtree
/// weight must stay within `max` (`-1` disables, `0` rejects every alias).
fn check_alias_limits(doc: &mut Document, max: i64) {
    if max < 0 {
        return;
    }
    let Some(contents) = &doc.contents else { return };
    let mut aliases = Vec::new();
    collect_aliases(contents, &mut aliases);
    let mut errors = Vec::new();
    for (id, range) in aliases {
        let weight = doc
            .anchors
            .node(id)
            .map_or(0, |target| subtree_weight(doc, target, 0));
        if weight > max as u64 || max == 0 {
            errors.push(YamlError::reference(
                NodeType::Alias,
                range,
                format!(
                    "Alias expansion of {weight} nodes exceeds the max_alias_count limit of {max}"
                ),
            ));
        }
    }
    doc.errors.extend(errors);
}

fn collect_aliases(node: &Node, out: &mut Vec<(usize, Range)>) {
    match node {
        Node::Alias(alias) => {
            if let Some(id) = alias.id {
                out.push((id, alias.range.unwrap_or_default()));
            }
        }
        Node::Seq(seq) => {
            for item in &seq.items {
                collect_aliases(item, out);
            }
        }
        Node::Map(map) => {
            for pair in &map.items {
                if let Some(k) = &pair.key {
                    collect_aliases(k, out);
                }
                if let Some(v) = &pair.value {
                    collect_aliases(v, out);
                }
            }
        }
        Node::Scalar(_) => {}
    }
}

/// Element count of a resolved subtree: scalars weigh 1, collections the
/// sum of their items, aliases the weight of their target.
fn subtree_weight(doc: &Document, node: &Node, depth: usize) -> u64 {
    if depth > 256 {
        return u64::MAX;
    }
    match node {
        Node::Scalar(_) => 1,
        Node::Seq(seq) => seq
            .items
            .iter()
            .map(|n| subtree_weight(doc, n, depth + 1))
            .sum(),
        Node::Map(map) => map
            .items
            .iter()
            .map(|pair| {
                let k = pair
                    .key
                    .as_ref()
                    .map_or(0, |n| subtree_weight(doc, n, depth + 1));
                let v = pair
                    .value
                    .as_ref()
                    .map_or(0, |n| subtree_weight(doc, n, depth + 1));
                k + v
            })
            .sum(),
        Node::Alias(alias) => alias
            .id
            .and_then(|id| doc.anchors.node(id))
            .map_or(0, |target| subtree_weight(doc, target, depth + 1)),
    }
}
