//! The json schema: failsafe plus strict JSON-syntax `null`, `bool`, `int`,
//! and `float`.

use super::{failsafe, Tag, TagContext, BOOL_TAG, FLOAT_TAG, INT_TAG, NULL_TAG};
use crate::value::Value;

pub(super) fn tags() -> Vec<Tag> {
    let mut tags = vec![
        Tag::scalar(NULL_TAG, Some(test_null as super::TestFn), resolve_null),
        Tag::scalar(BOOL_TAG, Some(test_bool as super::TestFn), resolve_bool),
        Tag::scalar(INT_TAG, Some(test_int as super::TestFn), resolve_int),
        Tag::scalar(FLOAT_TAG, Some(test_float as super::TestFn), resolve_float),
    ];
    tags.extend(failsafe::tags());
    tags
}

fn test_null(raw: &str, _ctx: &TagContext) -> bool {
    raw == "null"
}

fn resolve_null(_raw: &str, _ctx: &TagContext) -> Result<Value, String> {
    Ok(Value::Null)
}

fn test_bool(raw: &str, _ctx: &TagContext) -> bool {
    raw == "true" || raw == "false"
}

fn resolve_bool(raw: &str, _ctx: &TagContext) -> Result<Value, String> {
    Ok(Value::Bool(raw == "true"))
}

/// `-?(0|[1-9][0-9]*)`
pub(super) fn test_int(raw: &str, _ctx: &TagContext) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    match digits.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    }
}

pub(super) fn resolve_int(raw: &str, ctx: &TagContext) -> Result<Value, String> {
    super::core::parse_int(raw, 10, ctx)
}

/// `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][-+]?[0-9]+)?` with a fraction or
/// exponent present (otherwise `int` already claimed it).
fn test_float(raw: &str, ctx: &TagContext) -> bool {
    let mantissa_end = raw.find(['e', 'E']).unwrap_or(raw.len());
    let (mantissa, exponent) = raw.split_at(mantissa_end);
    let (int_part, frac) = match mantissa.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (mantissa, None),
    };
    if !test_int(int_part, ctx) {
        return false;
    }
    if let Some(frac) = frac {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    if !exponent.is_empty() {
        let digits = exponent[1..]
            .strip_prefix(['+', '-'])
            .unwrap_or(&exponent[1..]);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    frac.is_some() || !exponent.is_empty()
}

fn resolve_float(raw: &str, _ctx: &TagContext) -> Result<Value, String> {
    raw.parse::<f64>()
        .map(Value::Float)
        .map_err(|e| format!("failed to resolve float {raw:?}: {e}"))
}
