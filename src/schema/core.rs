//! The core schema: json with the permissive scalar forms of YAML 1.2's
//! core resolution (`Null`, `~`, `True`, hex/octal integers, `.inf`), plus
//! the 1.1 booleans (`yes`, `on`, …) when the document version predates 1.2.

use super::{failsafe, Tag, TagContext, TestFn, BOOL_TAG, FLOAT_TAG, INT_TAG, NULL_TAG};
use crate::value::Value;

pub(super) fn tags() -> Vec<Tag> {
    let mut tags = vec![
        Tag::scalar(NULL_TAG, Some(test_null as TestFn), resolve_null),
        Tag::scalar(BOOL_TAG, Some(test_bool as TestFn), resolve_bool),
        Tag::scalar(INT_TAG, Some(test_int as TestFn), resolve_int),
        Tag::scalar(FLOAT_TAG, Some(test_float as TestFn), resolve_float),
    ];
    tags.extend(failsafe::tags());
    tags
}

pub(super) fn test_null(raw: &str, _ctx: &TagContext) -> bool {
    matches!(raw, "" | "~" | "null" | "Null" | "NULL")
}

pub(super) fn resolve_null(_raw: &str, _ctx: &TagContext) -> Result<Value, String> {
    Ok(Value::Null)
}

fn test_bool(raw: &str, ctx: &TagContext) -> bool {
    match raw {
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => true,
        // 1.1 forms are only booleans under pre-1.2 documents.
        "yes" | "Yes" | "YES" | "no" | "No" | "NO" | "on" | "On" | "ON" | "off" | "Off"
        | "OFF" => ctx.version.is_pre_1_2(),
        _ => false,
    }
}

fn resolve_bool(raw: &str, _ctx: &TagContext) -> Result<Value, String> {
    Ok(Value::Bool(matches!(
        raw,
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON"
    )))
}

fn test_int(raw: &str, _ctx: &TagContext) -> bool {
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if let Some(hex) = unsigned.strip_prefix("0x") {
        return !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit());
    }
    if let Some(oct) = unsigned.strip_prefix("0o") {
        return !oct.is_empty() && oct.bytes().all(|b| (b'0'..=b'7').contains(&b));
    }
    !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit())
}

fn resolve_int(raw: &str, ctx: &TagContext) -> Result<Value, String> {
    let (sign, unsigned) = match raw.as_bytes().first() {
        Some(b'-') => (-1, &raw[1..]),
        Some(b'+') => (1, &raw[1..]),
        _ => (1, raw),
    };
    if let Some(hex) = unsigned.strip_prefix("0x") {
        return parse_radix(hex, 16, sign, raw, ctx);
    }
    if let Some(oct) = unsigned.strip_prefix("0o") {
        return parse_radix(oct, 8, sign, raw, ctx);
    }
    parse_int(raw, 10, ctx)
}

/// Parse a (possibly signed) decimal integer, widening on overflow: `i64`,
/// then `i128`, then the closest `f64`.
pub(super) fn parse_int(raw: &str, radix: u32, ctx: &TagContext) -> Result<Value, String> {
    if ctx.as_big_int {
        return i128::from_str_radix(raw, radix)
            .map(Value::BigInt)
            .map_err(|e| format!("failed to resolve int {raw:?}: {e}"));
    }
    if let Ok(i) = i64::from_str_radix(raw, radix) {
        return Ok(Value::Int(i));
    }
    if let Ok(i) = i128::from_str_radix(raw, radix) {
        return Ok(Value::BigInt(i));
    }
    raw.parse::<f64>()
        .map(Value::Float)
        .map_err(|e| format!("failed to resolve int {raw:?}: {e}"))
}

fn parse_radix(
    digits: &str,
    radix: u32,
    sign: i128,
    raw: &str,
    ctx: &TagContext,
) -> Result<Value, String> {
    let value = i128::from_str_radix(digits, radix)
        .map_err(|e| format!("failed to resolve int {raw:?}: {e}"))?
        * sign;
    if ctx.as_big_int {
        return Ok(Value::BigInt(value));
    }
    Ok(i64::try_from(value).map_or(Value::BigInt(value), Value::Int))
}

pub(super) fn test_float(raw: &str, _ctx: &TagContext) -> bool {
    if is_special_float(raw) {
        return true;
    }
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let mantissa_end = unsigned.find(['e', 'E']).unwrap_or(unsigned.len());
    let (mantissa, exponent) = unsigned.split_at(mantissa_end);
    let ok_mantissa = match mantissa.split_once('.') {
        Some((i, f)) => {
            (!i.is_empty() || !f.is_empty())
                && i.bytes().all(|b| b.is_ascii_digit())
                && f.bytes().all(|b| b.is_ascii_digit())
        }
        None => !mantissa.is_empty() && mantissa.bytes().all(|b| b.is_ascii_digit()),
    };
    if !ok_mantissa {
        return false;
    }
    if exponent.is_empty() {
        // A bare integer already resolved as int; require a dot.
        return mantissa.contains('.');
    }
    let digits = exponent[1..]
        .strip_prefix(['+', '-'])
        .unwrap_or(&exponent[1..]);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

pub(super) fn is_special_float(raw: &str) -> bool {
    matches!(
        raw,
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" | "-.inf" | "-.Inf" | "-.INF"
            | ".nan" | ".NaN" | ".NAN"
    )
}

pub(super) fn resolve_float(raw: &str, _ctx: &TagContext) -> Result<Value, String> {
    match raw {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Ok(Value::Float(f64::INFINITY)),
        "-.inf" | "-.Inf" | "-.INF" => Ok(Value::Float(f64::NEG_INFINITY)),
        ".nan" | ".NaN" | ".NAN" => Ok(Value::Float(f64::NAN)),
        _ => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| format!("failed to resolve float {raw:?}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Schema, SchemaId, TagContext};
    use crate::options::Version;
    use crate::value::Value;

    fn ctx_12() -> TagContext {
        TagContext {
            version: Version::V1_2,
            as_big_int: false,
        }
    }

    fn ctx_11() -> TagContext {
        TagContext {
            version: Version::V1_1,
            as_big_int: false,
        }
    }

    #[test]
    fn permissive_null_and_bool() {
        let schema = Schema::new(SchemaId::Core, &[]);
        for raw in ["", "~", "null", "Null", "NULL"] {
            assert_eq!(schema.resolve_scalar(raw, &ctx_12()).value, Value::Null);
        }
        assert_eq!(
            schema.resolve_scalar("True", &ctx_12()).value,
            Value::Bool(true)
        );
        // `yes` only resolves under a pre-1.2 document.
        assert_eq!(
            schema.resolve_scalar("yes", &ctx_12()).value,
            Value::String("yes".to_string())
        );
        assert_eq!(
            schema.resolve_scalar("yes", &ctx_11()).value,
            Value::Bool(true)
        );
    }

    #[test]
    fn hex_octal_and_widening() {
        let schema = Schema::new(SchemaId::Core, &[]);
        assert_eq!(
            schema.resolve_scalar("0x1f", &ctx_12()).value,
            Value::Int(31)
        );
        assert_eq!(
            schema.resolve_scalar("0o17", &ctx_12()).value,
            Value::Int(15)
        );
        assert_eq!(
            schema.resolve_scalar("-42", &ctx_12()).value,
            Value::Int(-42)
        );
        // Wider than i64 widens to i128.
        let wide = schema.resolve_scalar("170141183460469231731687303715", &ctx_12());
        assert!(matches!(wide.value, Value::BigInt(_)));
    }

    #[test]
    fn as_big_int_forces_wide_ints() {
        let schema = Schema::new(SchemaId::Core, &[]);
        let ctx = TagContext {
            version: Version::V1_2,
            as_big_int: true,
        };
        assert_eq!(schema.resolve_scalar("7", &ctx).value, Value::BigInt(7));
    }

    #[test]
    fn special_floats() {
        let schema = Schema::new(SchemaId::Core, &[]);
        assert_eq!(
            schema.resolve_scalar(".inf", &ctx_12()).value,
            Value::Float(f64::INFINITY)
        );
        assert_eq!(
            schema.resolve_scalar("-.INF", &ctx_12()).value,
            Value::Float(f64::NEG_INFINITY)
        );
        let nan = schema.resolve_scalar(".nan", &ctx_12()).value;
        assert!(matches!(nan, Value::Float(f) if f.is_nan()));
        assert_eq!(
            schema.resolve_scalar("6.02e23", &ctx_12()).value,
            Value::Float(6.02e23)
        );
    }
}
