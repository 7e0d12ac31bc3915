//! The yaml-1.1 schema: the 1.1 scalar forms plus `binary`, `timestamp`,
//! `omap`, `pairs`, `set`, and `merge`.

use base64::Engine as _;

use super::{
    core, failsafe, Tag, TagContext, TestFn, ValidateFn, BINARY_TAG, BOOL_TAG, FLOAT_TAG,
    INT_TAG, MERGE_TAG, NULL_TAG, OMAP_TAG, PAIRS_TAG, SET_TAG, TIMESTAMP_TAG,
};
use crate::node::{Node, NodeKind, ScalarStyle};
use crate::value::Value;

pub(super) fn tags() -> Vec<Tag> {
    let mut tags = vec![
        Tag::scalar(MERGE_TAG, Some(test_merge as TestFn), resolve_merge),
        Tag::scalar(NULL_TAG, Some(core::test_null as TestFn), core::resolve_null),
        Tag::scalar(BOOL_TAG, Some(test_bool as TestFn), resolve_bool),
        Tag::scalar(INT_TAG, Some(test_int as TestFn), resolve_int),
        Tag::scalar(FLOAT_TAG, Some(test_float as TestFn), resolve_float),
        Tag::scalar(TIMESTAMP_TAG, Some(test_timestamp as TestFn), resolve_timestamp),
        binary_tag(),
    ];
    tags.push(collection_with_validate(OMAP_TAG, NodeKind::Seq, validate_omap));
    tags.push(collection_with_validate(PAIRS_TAG, NodeKind::Seq, validate_pairs));
    tags.push(collection_with_validate(SET_TAG, NodeKind::Map, validate_set));
    tags.extend(failsafe::tags());
    tags
}

fn collection_with_validate(tag: &'static str, kind: NodeKind, validate: ValidateFn) -> Tag {
    let mut t = Tag::collection(tag, kind);
    t.validate = Some(validate);
    t
}

fn binary_tag() -> Tag {
    // Base64 text is never resolved implicitly; the tag must be explicit.
    let mut t = Tag::scalar(BINARY_TAG, None, resolve_binary);
    t.default_style = Some(ScalarStyle::Literal);
    t
}

fn test_merge(raw: &str, _ctx: &TagContext) -> bool {
    raw == "<<"
}

fn resolve_merge(_raw: &str, _ctx: &TagContext) -> Result<Value, String> {
    Ok(Value::String("<<".to_string()))
}

fn test_bool(raw: &str, _ctx: &TagContext) -> bool {
    matches!(
        raw,
        "y" | "Y" | "yes" | "Yes" | "YES" | "n" | "N" | "no" | "No" | "NO" | "true" | "True"
            | "TRUE" | "false" | "False" | "FALSE" | "on" | "On" | "ON" | "off" | "Off" | "OFF"
    )
}

fn resolve_bool(raw: &str, _ctx: &TagContext) -> Result<Value, String> {
    Ok(Value::Bool(matches!(
        raw,
        "y" | "Y" | "yes" | "Yes" | "YES" | "true" | "True" | "TRUE" | "on" | "On" | "ON"
    )))
}

/// 1.1 integers: decimal with `_` separators, `0b` binary, `0x` hex, and
/// leading-zero octal. Sexagesimal forms are not resolved (see DESIGN.md).
fn test_int(raw: &str, _ctx: &TagContext) -> bool {
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let digits_ok = |s: &str, pred: fn(&u8) -> bool| {
        !s.is_empty()
            && s.bytes().any(|b| b != b'_')
            && s.bytes().all(|b| b == b'_' || pred(&b))
    };
    if let Some(bin) = unsigned.strip_prefix("0b") {
        return digits_ok(bin, |b: &u8| matches!(*b, b'0' | b'1'));
    }
    if let Some(hex) = unsigned.strip_prefix("0x") {
        return digits_ok(hex, u8::is_ascii_hexdigit);
    }
    if unsigned.len() > 1 && unsigned.starts_with('0') {
        return digits_ok(&unsigned[1..], |b: &u8| (b'0'..=b'7').contains(b));
    }
    digits_ok(unsigned, u8::is_ascii_digit)
}

fn resolve_int(raw: &str, ctx: &TagContext) -> Result<Value, String> {
    let cleaned: String = raw.chars().filter(|&c| c != '_').collect();
    let (sign, unsigned) = match cleaned.as_bytes().first() {
        Some(b'-') => (-1i128, &cleaned[1..]),
        Some(b'+') => (1, &cleaned[1..]),
        _ => (1, cleaned.as_str()),
    };
    let (digits, radix) = if let Some(bin) = unsigned.strip_prefix("0b") {
        (bin, 2)
    } else if let Some(hex) = unsigned.strip_prefix("0x") {
        (hex, 16)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (&unsigned[1..], 8)
    } else {
        (unsigned, 10)
    };
    let value = i128::from_str_radix(digits, radix)
        .map_err(|e| format!("failed to resolve int {raw:?}: {e}"))?
        * sign;
    if ctx.as_big_int {
        return Ok(Value::BigInt(value));
    }
    Ok(i64::try_from(value).map_or(Value::BigInt(value), Value::Int))
}

fn test_float(raw: &str, ctx: &TagContext) -> bool {
    if core::is_special_float(raw) {
        return true;
    }
    let cleaned: String = raw.chars().filter(|&c| c != '_').collect();
    core::test_float(&cleaned, ctx)
}

fn resolve_float(raw: &str, ctx: &TagContext) -> Result<Value, String> {
    let cleaned: String = raw.chars().filter(|&c| c != '_').collect();
    core::resolve_float(&cleaned, ctx)
}

/// `YYYY-MM-DD`, optionally followed by a time part separated by `T`/`t` or
/// whitespace, with optional fraction and timezone.
fn test_timestamp(raw: &str, _ctx: &TagContext) -> bool {
    let bytes = raw.as_bytes();
    if bytes.len() < 8 {
        return false;
    }
    let mut parts = raw.splitn(3, '-');
    let (Some(y), Some(m), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if y.len() != 4 || !y.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let month_ok = |s: &str| {
        (1..=2).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !month_ok(m) {
        return false;
    }
    let day_end = rest
        .find(|c: char| c == 'T' || c == 't' || c.is_whitespace())
        .unwrap_or(rest.len());
    let (day, time) = rest.split_at(day_end);
    if !month_ok(day) {
        return false;
    }
    if time.is_empty() {
        return true;
    }
    let time = time.trim_start_matches(['T', 't']).trim();
    // HH:MM:SS with optional .fraction and optional timezone suffix.
    let mut fields = time.splitn(3, ':');
    let (Some(h), Some(min), Some(rest)) = (fields.next(), fields.next(), fields.next()) else {
        return false;
    };
    if !month_ok(h) || min.len() != 2 || !min.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let sec_end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (sec, tz) = rest.split_at(sec_end);
    if sec.is_empty() || sec.starts_with('.') {
        return false;
    }
    let tz = tz.trim();
    tz.is_empty()
        || tz == "Z"
        || (tz.starts_with(['+', '-'])
            && tz[1..]
                .bytes()
                .all(|b| b.is_ascii_digit() || b == b':'))
}

/// Timestamps keep their canonical textual form; the tag records the type.
fn resolve_timestamp(raw: &str, _ctx: &TagContext) -> Result<Value, String> {
    Ok(Value::String(raw.trim().to_string()))
}

fn resolve_binary(raw: &str, _ctx: &TagContext) -> Result<Value, String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map(Value::Binary)
        .map_err(|e| format!("failed to resolve binary: {e}"))
}

fn validate_omap(node: &Node) -> Result<(), String> {
    validate_pairs(node)
}

fn validate_pairs(node: &Node) -> Result<(), String> {
    let Some(seq) = node.as_seq() else {
        return Err("Ordered maps must be sequences".to_string());
    };
    for item in &seq.items {
        let ok = item
            .as_map()
            .is_some_and(|m| m.items.len() == 1);
        if !ok {
            return Err("Ordered maps must only contain single-key maps".to_string());
        }
    }
    Ok(())
}

fn validate_set(node: &Node) -> Result<(), String> {
    let Some(map) = node.as_map() else {
        return Err("Sets must be mappings".to_string());
    };
    for pair in &map.items {
        let empty = match &pair.value {
            None => true,
            Some(Node::Scalar(s)) => s.value.is_null(),
            Some(_) => false,
        };
        if !empty {
            return Err("Set items must all have null values".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::{Schema, SchemaId, TagContext, BINARY_TAG, TIMESTAMP_TAG};
    use crate::options::Version;
    use crate::value::Value;

    fn ctx() -> TagContext {
        TagContext {
            version: Version::V1_1,
            as_big_int: false,
        }
    }

    #[test]
    fn eleven_style_scalars() {
        let schema = Schema::new(SchemaId::Yaml11, &[]);
        assert_eq!(schema.resolve_scalar("yes", &ctx()).value, Value::Bool(true));
        assert_eq!(schema.resolve_scalar("off", &ctx()).value, Value::Bool(false));
        assert_eq!(
            schema.resolve_scalar("1_000", &ctx()).value,
            Value::Int(1000)
        );
        assert_eq!(schema.resolve_scalar("0b1010", &ctx()).value, Value::Int(10));
        assert_eq!(schema.resolve_scalar("010", &ctx()).value, Value::Int(8));
        assert_eq!(
            schema.resolve_scalar("1_0.5", &ctx()).value,
            Value::Float(10.5)
        );
    }

    #[test]
    fn merge_key_resolves() {
        let schema = Schema::new(SchemaId::Yaml11, &[]);
        let r = schema.resolve_scalar("<<", &ctx());
        assert_eq!(r.tag, super::super::MERGE_TAG);
    }

    #[test]
    fn timestamps_stay_textual() {
        let schema = Schema::new(SchemaId::Yaml11, &[]);
        let r = schema.resolve_scalar("2001-12-14", &ctx());
        assert_eq!(r.tag, TIMESTAMP_TAG);
        assert_eq!(r.value, Value::String("2001-12-14".to_string()));
        let r = schema.resolve_scalar("2001-12-14 21:59:43.10 -5", &ctx());
        assert_eq!(r.tag, TIMESTAMP_TAG);
        // Not a timestamp: resolves as a plain string.
        let r = schema.resolve_scalar("2001-12", &ctx());
        assert_eq!(r.tag, super::super::STR_TAG);
    }

    #[test]
    fn binary_decodes_explicitly() {
        let schema = Schema::new(SchemaId::Yaml11, &[]);
        let tag = schema.find(BINARY_TAG).unwrap();
        let r = Schema::apply(tag, "aGVsbG8=", &ctx());
        assert_eq!(r.value, Value::Binary(b"hello".to_vec()));
        // Implicit resolution never produces binary.
        let r = schema.resolve_scalar("aGVsbG8=", &ctx());
        assert_eq!(r.tag, super::super::STR_TAG);
    }
}
