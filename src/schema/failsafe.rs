//! The failsafe schema: `str`, `map`, and `seq` only.

use super::{Tag, TagContext, MAP_TAG, SEQ_TAG, STR_TAG};
use crate::node::NodeKind;
use crate::value::Value;

pub(super) fn tags() -> Vec<Tag> {
    vec![
        Tag::scalar(STR_TAG, None, resolve_str),
        Tag::collection(MAP_TAG, NodeKind::Map),
        Tag::collection(SEQ_TAG, NodeKind::Seq),
    ]
}

pub(super) fn resolve_str(raw: &str, _ctx: &TagContext) -> Result<Value, String> {
    Ok(Value::String(raw.to_string()))
}
