//! The resolved abstract syntax tree.
//!
//! Nodes are discriminated variants over the node kinds rather than a class
//! hierarchy. Each variant carries its own style/anchor/tag/comment
//! properties; aliases hold the anchor name plus the arena index they bound
//! to at resolve time (see [`crate::document::Anchors`]).

use crate::source::Range;
use crate::value::Value;

/// The five scalar presentation styles.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// Node kind, used for tag tables and shape checks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    Scalar,
    Map,
    Seq,
    Alias,
}

/// A resolved AST node.
#[derive(Clone, PartialEq, Debug)]
pub enum Node {
    Scalar(Scalar),
    Map(Map),
    Seq(Seq),
    Alias(Alias),
}

impl Node {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Node::Scalar(Scalar::new(value))
    }

    pub const fn kind(&self) -> NodeKind {
        match self {
            Node::Scalar(_) => NodeKind::Scalar,
            Node::Map(_) => NodeKind::Map,
            Node::Seq(_) => NodeKind::Seq,
            Node::Alias(_) => NodeKind::Alias,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => s.tag.as_deref(),
            Node::Map(m) => m.tag.as_deref(),
            Node::Seq(s) => s.tag.as_deref(),
            Node::Alias(_) => None,
        }
    }

    pub fn anchor(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => s.anchor.as_deref(),
            Node::Map(m) => m.anchor.as_deref(),
            Node::Seq(s) => s.anchor.as_deref(),
            Node::Alias(_) => None,
        }
    }

    pub fn set_anchor(&mut self, name: Option<String>) {
        match self {
            Node::Scalar(s) => s.anchor = name,
            Node::Map(m) => m.anchor = name,
            Node::Seq(s) => s.anchor = name,
            Node::Alias(_) => {}
        }
    }

    pub fn range(&self) -> Option<Range> {
        match self {
            Node::Scalar(s) => s.range,
            Node::Map(m) => m.range,
            Node::Seq(s) => s.range,
            Node::Alias(a) => a.range,
        }
    }

    pub fn comment_before(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => s.comment_before.as_deref(),
            Node::Map(m) => m.comment_before.as_deref(),
            Node::Seq(s) => s.comment_before.as_deref(),
            Node::Alias(a) => a.comment_before.as_deref(),
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => s.comment.as_deref(),
            Node::Map(m) => m.comment.as_deref(),
            Node::Seq(s) => s.comment.as_deref(),
            Node::Alias(a) => a.comment.as_deref(),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Node::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&Seq> {
        match self {
            Node::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_alias(&self) -> Option<&Alias> {
        match self {
            Node::Alias(a) => Some(a),
            _ => None,
        }
    }
}

/// A resolved scalar: the typed value plus everything needed to re-emit it.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Scalar {
    pub value: Value,
    pub style: ScalarStyle,
    pub tag: Option<String>,
    pub anchor: Option<String>,
    /// Original text, kept so numeric forms like `0x1f` or `.NaN` round-trip.
    pub source: Option<String>,
    pub comment_before: Option<String>,
    pub comment: Option<String>,
    pub range: Option<Range>,
    /// Index of the originating CST node when `keep_cst_nodes` is set.
    pub cst: Option<usize>,
}

impl Scalar {
    pub fn new(value: impl Into<Value>) -> Self {
        Scalar {
            value: value.into(),
            ..Scalar::default()
        }
    }

    pub fn with_style(value: impl Into<Value>, style: ScalarStyle) -> Self {
        Scalar {
            value: value.into(),
            style,
            ..Scalar::default()
        }
    }
}

/// A key/value pair inside a mapping. Either side may be missing.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Pair {
    pub key: Option<Node>,
    pub value: Option<Node>,
}

impl Pair {
    pub fn new(key: Option<Node>, value: Option<Node>) -> Self {
        Pair { key, value }
    }
}

/// A mapping. Items keep source order and duplicates are preserved.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Map {
    pub items: Vec<Pair>,
    pub flow: bool,
    pub tag: Option<String>,
    pub anchor: Option<String>,
    pub comment_before: Option<String>,
    pub comment: Option<String>,
    pub range: Option<Range>,
    pub cst: Option<usize>,
}

/// A sequence.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Seq {
    pub items: Vec<Node>,
    pub flow: bool,
    pub tag: Option<String>,
    pub anchor: Option<String>,
    pub comment_before: Option<String>,
    pub comment: Option<String>,
    pub range: Option<Range>,
    pub cst: Option<usize>,
}

/// An alias. `id` is the anchor-arena index bound at resolve time; `None`
/// means the alias referenced an anchor that was not yet defined.
#[derive(Clone, PartialEq, Debug)]
pub struct Alias {
    pub name: String,
    pub id: Option<usize>,
    pub comment_before: Option<String>,
    pub comment: Option<String>,
    pub range: Option<Range>,
}

impl Alias {
    pub fn new(name: impl Into<String>) -> Self {
        Alias {
            name: name.into(),
            id: None,
            comment_before: None,
            comment: None,
            range: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_accessors() {
        let node = Node::scalar("hello");
        assert_eq!(node.kind(), NodeKind::Scalar);
        assert_eq!(node.as_scalar().unwrap().value.as_str(), Some("hello"));
        assert!(node.anchor().is_none());

        let mut map = Node::Map(Map::default());
        map.set_anchor(Some("base".to_string()));
        assert_eq!(map.anchor(), Some("base"));
        assert_eq!(map.kind(), NodeKind::Map);
    }

    #[test]
    fn alias_starts_unbound() {
        let alias = Alias::new("x");
        assert_eq!(alias.name, "x");
        assert!(alias.id.is_none());
    }
}
