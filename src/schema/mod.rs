//! Tag tables and implicit scalar resolution.
//!
//! A schema is an ordered list of [`Tag`] resolvers. Explicit tags match by
//! URI; implicit resolution tries each scalar tag's `test` predicate in
//! registration order and the first match wins. Custom tags are layered in
//! front of the built-ins, so they shadow them.

mod core;
mod failsafe;
mod json;
mod yaml11;

use std::str::FromStr;

use crate::node::{Node, NodeKind, Scalar, ScalarStyle};
use crate::options::Version;
use crate::value::Value;

pub const NULL_TAG: &str = "tag:yaml.org,2002:null";
pub const BOOL_TAG: &str = "tag:yaml.org,2002:bool";
pub const INT_TAG: &str = "tag:yaml.org,2002:int";
pub const FLOAT_TAG: &str = "tag:yaml.org,2002:float";
pub const STR_TAG: &str = "tag:yaml.org,2002:str";
pub const MAP_TAG: &str = "tag:yaml.org,2002:map";
pub const SEQ_TAG: &str = "tag:yaml.org,2002:seq";
pub const BINARY_TAG: &str = "tag:yaml.org,2002:binary";
pub const TIMESTAMP_TAG: &str = "tag:yaml.org,2002:timestamp";
pub const OMAP_TAG: &str = "tag:yaml.org,2002:omap";
pub const PAIRS_TAG: &str = "tag:yaml.org,2002:pairs";
pub const SET_TAG: &str = "tag:yaml.org,2002:set";
pub const MERGE_TAG: &str = "tag:yaml.org,2002:merge";

/// The built-in schemas.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SchemaId {
    Failsafe,
    Json,
    Core,
    Yaml11,
}

impl SchemaId {
    pub const fn as_str(self) -> &'static str {
        match self {
            SchemaId::Failsafe => "failsafe",
            SchemaId::Json => "json",
            SchemaId::Core => "core",
            SchemaId::Yaml11 => "yaml-1.1",
        }
    }
}

impl FromStr for SchemaId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "failsafe" => Ok(SchemaId::Failsafe),
            "json" => Ok(SchemaId::Json),
            "core" => Ok(SchemaId::Core),
            "yaml-1.1" => Ok(SchemaId::Yaml11),
            _ => Err(format!("unknown schema name: {s:?}")),
        }
    }
}

/// Context threaded through tag tests and resolvers.
#[derive(Clone, Copy, Debug)]
pub struct TagContext {
    pub version: Version,
    pub as_big_int: bool,
}

pub type TestFn = fn(&str, &TagContext) -> bool;
pub type ResolveFn = fn(&str, &TagContext) -> Result<Value, String>;
pub type ValidateFn = fn(&Node) -> Result<(), String>;
pub type StringifyFn = fn(&Scalar, &TagContext) -> String;

/// One tag resolver.
#[derive(Clone, Debug)]
pub struct Tag {
    /// Full URI (`tag:yaml.org,2002:int`) or local shorthand (`!point`).
    pub tag: String,
    /// The node kind this tag accepts.
    pub kind: NodeKind,
    /// Implicit-resolution predicate on raw scalar text. `None` means the
    /// tag only matches explicitly.
    pub test: Option<TestFn>,
    /// Scalar value constructor. `None` keeps the raw text as a string.
    pub resolve: Option<ResolveFn>,
    /// Shape validation for collection tags, run after resolution.
    pub validate: Option<ValidateFn>,
    /// Custom scalar renderer; the returned text must stand on its own as
    /// a YAML scalar. `None` uses the built-in value-based rendering.
    pub stringify: Option<StringifyFn>,
    /// Preferred output style when stringifying under this tag.
    pub default_style: Option<ScalarStyle>,
}

impl Tag {
    pub fn scalar(tag: impl Into<String>, test: Option<TestFn>, resolve: ResolveFn) -> Self {
        Tag {
            tag: tag.into(),
            kind: NodeKind::Scalar,
            test,
            resolve: Some(resolve),
            validate: None,
            stringify: None,
            default_style: None,
        }
    }

    pub fn collection(tag: impl Into<String>, kind: NodeKind) -> Self {
        Tag {
            tag: tag.into(),
            kind,
            test: None,
            resolve: None,
            validate: None,
            stringify: None,
            default_style: None,
        }
    }
}

/// The outcome of implicit or explicit scalar resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedScalar {
    pub value: Value,
    pub tag: String,
    /// Resolver failure message, if the matched tag could not construct a
    /// value (the raw text is kept as a string in that case).
    pub error: Option<String>,
}

/// An ordered tag table bound to a schema id.
#[derive(Clone, Debug)]
pub struct Schema {
    pub id: SchemaId,
    pub tags: Vec<Tag>,
    /// Whether `<<` merge keys are active (yaml-1.1 only; see crate docs).
    pub merge: bool,
}

impl Schema {
    /// Build a schema, layering `custom` tags in front of the built-ins.
    ///
    /// # Panics
    ///
    /// Panics if a custom tag declares an empty tag URI; that is a bug in
    /// caller code, not in the parsed data.
    pub fn new(id: SchemaId, custom: &[Tag]) -> Self {
        for tag in custom {
            assert!(
                !tag.tag.is_empty(),
                "custom tag must declare a tag URI or shorthand"
            );
        }
        let mut tags = custom.to_vec();
        tags.extend(match id {
            SchemaId::Failsafe => failsafe::tags(),
            SchemaId::Json => json::tags(),
            SchemaId::Core => core::tags(),
            SchemaId::Yaml11 => yaml11::tags(),
        });
        Schema {
            id,
            tags,
            merge: id == SchemaId::Yaml11,
        }
    }

    /// Look up a tag by its (expanded) URI or shorthand.
    pub fn find(&self, tag: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.tag == tag)
    }

    /// Resolve a plain scalar's type by trying tests in registration order.
    pub fn resolve_scalar(&self, raw: &str, ctx: &TagContext) -> ResolvedScalar {
        for tag in &self.tags {
            if tag.kind != NodeKind::Scalar {
                continue;
            }
            let Some(test) = tag.test else { continue };
            if !test(raw, ctx) {
                continue;
            }
            return Self::apply(tag, raw, ctx);
        }
        ResolvedScalar {
            value: Value::String(raw.to_string()),
            tag: STR_TAG.to_string(),
            error: None,
        }
    }

    /// Resolve a scalar under an explicitly named tag.
    pub fn apply(tag: &Tag, raw: &str, ctx: &TagContext) -> ResolvedScalar {
        match tag.resolve {
            Some(resolve) => match resolve(raw, ctx) {
                Ok(value) => ResolvedScalar {
                    value,
                    tag: tag.tag.clone(),
                    error: None,
                },
                Err(error) => ResolvedScalar {
                    value: Value::String(raw.to_string()),
                    tag: tag.tag.clone(),
                    error: Some(error),
                },
            },
            None => ResolvedScalar {
                value: Value::String(raw.to_string()),
                tag: tag.tag.clone(),
                error: None,
            },
        }
    }

    /// The fallback tag for a node of the given kind.
    pub fn fallback_tag(kind: NodeKind) -> &'static str {
        match kind {
            NodeKind::Map => MAP_TAG,
            NodeKind::Seq => SEQ_TAG,
            _ => STR_TAG,
        }
    }
}
