//! AST → YAML text.
//!
//! Output is canonical-ish: block style by default, flow where the node
//! asks for it (or where block nesting would be pathological), styles
//! respected when they round-trip, and a trailing newline always present.

mod fold;
mod scalar;

use indexmap::IndexMap;

use crate::document::Document;
use crate::error::{NodeType, YamlError};
use crate::node::{Map, Node, Pair, Seq};
use crate::options::{Options, Version};
use crate::schema::Schema;
use crate::source::Range;

/// Shared immutable context for one stringify run.
#[derive(Clone, Copy)]
pub(crate) struct Stringifier<'a> {
    opts: &'a Options,
    schema: &'a Schema,
    version: Version,
    prefixes: &'a IndexMap<String, String>,
    in_flow: bool,
}

pub(crate) fn stringify_document(doc: &Document) -> Result<String, YamlError> {
    let st = Stringifier {
        opts: &doc.options,
        schema: &doc.schema,
        version: doc.effective_version(),
        prefixes: &doc.tag_prefixes,
        in_flow: false,
    };
    let mut out = String::new();
    let mut has_directives = false;
    if let Some(version) = doc.version {
        out.push_str("%YAML ");
        out.push_str(version.as_str());
        out.push('\n');
        has_directives = true;
    }
    for (handle, prefix) in doc.tag_prefixes.iter() {
        out.push_str(&format!("%TAG {handle} {prefix}\n"));
        has_directives = true;
    }

    if let Some(comment) = doc.contents.as_ref().and_then(Node::comment_before) {
        for line in comment.split('\n') {
            out.push('#');
            out.push_str(line);
            out.push('\n');
        }
    }

    let body = match &doc.contents {
        None => doc.options.scalar.null.null_str.clone(),
        Some(node) => st.node_text(node, "", false)?,
    };

    let needs_marker = has_directives
        || doc.has_directives_end
        || body.starts_with('%')
        || body.starts_with("---");
    if needs_marker {
        let inline = matches!(
            doc.contents,
            None | Some(Node::Scalar(_)) | Some(Node::Alias(_))
        ) && !body.contains('\n');
        if inline {
            out.push_str("--- ");
        } else {
            out.push_str("---\n");
        }
    }
    out.push_str(&body);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

impl<'a> Stringifier<'a> {
    fn step(&self) -> String {
        " ".repeat(self.opts.indent.max(1))
    }

    fn flow(self) -> Self {
        Stringifier {
            in_flow: true,
            ..self
        }
    }

    /// Render a node. The first line carries no indent; continuation lines
    /// embed `indent` (plus steps) as needed.
    fn node_text(&self, node: &Node, indent: &str, for_key: bool) -> Result<String, YamlError> {
        let props = self.props_text(node);
        let body = match node {
            Node::Alias(alias) => format!("*{}", alias.name),
            Node::Scalar(s) => self.scalar_text(s, indent, for_key),
            Node::Seq(seq) => {
                if self.use_flow(seq.flow, seq.items.is_empty(), indent) {
                    self.flow_seq_text(seq, indent)?
                } else {
                    self.block_seq_text(seq, indent)?
                }
            }
            Node::Map(map) => {
                if self.use_flow(map.flow, map.items.is_empty(), indent) {
                    self.flow_map_text(map, indent)?
                } else {
                    self.block_map_text(map, indent)?
                }
            }
        };
        let mut text = if props.is_empty() {
            body
        } else if self.starts_on_own_line(node) {
            // Properties of a block collection sit on their own line, so
            // they bind to the collection rather than to its first key.
            format!("{}\n{indent}{body}", props.trim_end())
        } else {
            format!("{props}{body}")
        };
        if let Some(comment) = node.comment() {
            if !text.contains('\n') && !comment.contains('\n') {
                text.push_str(" #");
                text.push_str(comment);
            }
        }
        Ok(text)
    }

    fn starts_on_own_line(&self, node: &Node) -> bool {
        match node {
            Node::Seq(s) => !s.flow && !s.items.is_empty() && !self.in_flow,
            Node::Map(m) => !m.flow && !m.items.is_empty() && !self.in_flow,
            _ => false,
        }
    }

    /// Anchor and tag properties, each followed by a space.
    fn props_text(&self, node: &Node) -> String {
        let mut out = String::new();
        if let Some(anchor) = node.anchor() {
            out.push('&');
            out.push_str(anchor);
            out.push(' ');
        }
        if let Some(tag) = node.tag() {
            out.push_str(&self.tag_shorthand(tag));
            out.push(' ');
        }
        out
    }

    /// The shortest shorthand for a tag URI under the document's prefixes.
    fn tag_shorthand(&self, uri: &str) -> String {
        for (handle, prefix) in self.prefixes.iter() {
            if let Some(rest) = uri.strip_prefix(prefix.as_str()) {
                if !rest.is_empty() && rest.bytes().all(is_tag_suffix_byte) {
                    return format!("{handle}{rest}");
                }
            }
        }
        if let Some(rest) = uri.strip_prefix("tag:yaml.org,2002:") {
            if rest.bytes().all(is_tag_suffix_byte) {
                return format!("!!{rest}");
            }
        }
        if let Some(rest) = uri.strip_prefix('!') {
            if rest.bytes().all(is_tag_suffix_byte) {
                return uri.to_string();
            }
        }
        format!("!<{uri}>")
    }

    /// Deep block nesting switches to flow before the indent eats the
    /// whole line.
    fn use_flow(&self, flagged: bool, empty: bool, indent: &str) -> bool {
        if self.in_flow || flagged || empty {
            return true;
        }
        let width = self.opts.scalar.str_.fold.line_width;
        width > 0 && indent.len() + self.opts.indent >= width.saturating_sub(self.opts.scalar.str_.fold.min_content_width)
    }

    fn block_seq_text(&self, seq: &Seq, indent: &str) -> Result<String, YamlError> {
        let child_indent = format!("{indent}{}", self.step());
        let mut lines = Vec::with_capacity(seq.items.len());
        for item in &seq.items {
            let mut line = String::new();
            if let Some(comment) = item.comment_before() {
                for c in comment.split('\n') {
                    line.push('#');
                    line.push_str(c);
                    line.push('\n');
                    line.push_str(indent);
                }
            }
            line.push_str("- ");
            line.push_str(&self.node_text(item, &child_indent, false)?);
            lines.push(line);
        }
        Ok(lines.join(&format!("\n{indent}")))
    }

    fn flow_seq_text(&self, seq: &Seq, indent: &str) -> Result<String, YamlError> {
        let st = self.flow();
        let mut parts = Vec::with_capacity(seq.items.len());
        for item in &seq.items {
            parts.push(st.node_text(item, indent, false)?);
        }
        if parts.is_empty() {
            return Ok("[]".to_string());
        }
        Ok(format!("[ {} ]", parts.join(", ")))
    }

    fn flow_map_text(&self, map: &Map, indent: &str) -> Result<String, YamlError> {
        let st = self.flow();
        let mut parts = Vec::with_capacity(map.items.len());
        for pair in &map.items {
            let key = match &pair.key {
                Some(k) => st.node_text(k, indent, true)?,
                None => String::new(),
            };
            match &pair.value {
                Some(v) => parts.push(format!("{key}: {}", st.node_text(v, indent, false)?)),
                None => parts.push(key),
            }
        }
        if parts.is_empty() {
            return Ok("{}".to_string());
        }
        Ok(format!("{{ {} }}", parts.join(", ")))
    }

    fn block_map_text(&self, map: &Map, indent: &str) -> Result<String, YamlError> {
        let child_indent = format!("{indent}{}", self.step());
        let mut lines = Vec::with_capacity(map.items.len());
        for pair in &map.items {
            let mut line = String::new();
            if let Some(comment) = pair.key.as_ref().and_then(Node::comment_before) {
                for c in comment.split('\n') {
                    line.push('#');
                    line.push_str(c);
                    line.push('\n');
                    line.push_str(indent);
                }
            }
            line.push_str(&self.pair_text(pair, indent, &child_indent)?);
            lines.push(line);
        }
        Ok(lines.join(&format!("\n{indent}")))
    }

    fn pair_text(&self, pair: &Pair, indent: &str, child_indent: &str) -> Result<String, YamlError> {
        let simple_key = matches!(&pair.key, None | Some(Node::Scalar(_)) | Some(Node::Alias(_)));
        if !simple_key && self.opts.simple_keys {
            return Err(YamlError::semantic(
                NodeType::BlockMap,
                pair.key.as_ref().and_then(Node::range).unwrap_or(Range::default()),
                "With simple keys, collection keys are not allowed",
            ));
        }
        let key_text = match &pair.key {
            Some(k) if simple_key => self.node_text(k, indent, true)?,
            // Collection keys render in flow on an explicit `?` line.
            Some(k) => format!("? {}", self.flow().node_text(k, indent, true)?),
            None => String::new(),
        };
        let explicit = !simple_key;
        let value = match &pair.value {
            None => {
                return Ok(if explicit {
                    key_text
                } else {
                    format!("{key_text}:")
                });
            }
            Some(v) => v,
        };
        let sep_line = if explicit {
            format!("{key_text}\n{indent}:")
        } else {
            format!("{key_text}:")
        };
        match value {
            Node::Map(m) if !self.use_flow(m.flow, m.items.is_empty(), indent) => {
                let rendered = self.node_text(value, child_indent, false)?;
                Ok(format!("{sep_line}\n{child_indent}{rendered}"))
            }
            Node::Seq(s) if !self.use_flow(s.flow, s.items.is_empty(), indent) => {
                let seq_indent = if self.opts.indent_seq {
                    child_indent.to_string()
                } else {
                    indent.to_string()
                };
                let rendered = self.node_text(value, &seq_indent, false)?;
                Ok(format!("{sep_line}\n{seq_indent}{rendered}"))
            }
            _ => {
                let rendered = self.node_text(value, child_indent, false)?;
                Ok(format!("{sep_line} {rendered}"))
            }
        }
    }
}

fn is_tag_suffix_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'/' | b'%' | b'#' | b':')
}
