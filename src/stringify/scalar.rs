//! Scalar rendering: value text, style choice, quoting, and block scalars.

use base64::Engine as _;

use super::fold::fold;
use super::Stringifier;
use crate::node::{Scalar, ScalarStyle};
use crate::schema::TagContext;
use crate::value::Value;

impl Stringifier<'_> {
    fn tag_ctx(&self) -> TagContext {
        TagContext {
            version: self.version,
            as_big_int: self.opts.scalar.int.as_big_int,
        }
    }

    /// Render one scalar at the given indent. `for_key` restricts the
    /// result to a single line.
    pub(super) fn scalar_text(&self, scalar: &Scalar, indent: &str, for_key: bool) -> String {
        let tag_def = scalar.tag.as_deref().and_then(|t| self.schema.find(t));
        if let Some(stringify) = tag_def.and_then(|t| t.stringify) {
            return stringify(scalar, &self.tag_ctx());
        }
        let mut requested = if self.opts.keep_node_types {
            scalar.style
        } else if for_key {
            self.opts.scalar.str_.default_key_type
        } else {
            self.opts.scalar.str_.default_type
        };
        if !self.opts.keep_node_types {
            if let Some(style) = tag_def.and_then(|t| t.default_style) {
                requested = style;
            }
        }
        match &scalar.value {
            Value::Null => self.fixed_scalar(scalar, &self.opts.scalar.null.null_str),
            Value::Bool(b) => {
                let text = if *b {
                    self.opts.scalar.bool_.true_str.clone()
                } else {
                    self.opts.scalar.bool_.false_str.clone()
                };
                self.fixed_scalar(scalar, &text)
            }
            Value::Int(i) => self.fixed_scalar(scalar, &i.to_string()),
            Value::BigInt(i) => self.fixed_scalar(scalar, &i.to_string()),
            Value::Float(f) => self.fixed_scalar(scalar, &float_text(*f)),
            Value::Binary(bytes) => self.binary_text(bytes, indent, requested),
            Value::String(s) => self.string_text(s, indent, for_key, requested),
            Value::Sequence(_) | Value::Mapping(_) => {
                // Collection values never live inside Scalar nodes built by
                // this crate; render a defensive empty value.
                String::new()
            }
        }
    }

    /// Non-string scalars keep their source text when it still resolves to
    /// the same value under the active schema.
    fn fixed_scalar(&self, scalar: &Scalar, fallback: &str) -> String {
        if let Some(source) = &scalar.source {
            if scalar.style == ScalarStyle::Plain && !source.is_empty() {
                let ctx = self.tag_ctx();
                if self.schema.resolve_scalar(source, &ctx).value == scalar.value {
                    return source.clone();
                }
            }
        }
        fallback.to_string()
    }

    fn binary_text(&self, bytes: &[u8], indent: &str, requested: ScalarStyle) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let width = self.opts.scalar.binary.line_width;
        let style = if matches!(requested, ScalarStyle::DoubleQuoted) {
            ScalarStyle::DoubleQuoted
        } else {
            self.opts.scalar.binary.default_type
        };
        if style == ScalarStyle::DoubleQuoted || width == 0 || encoded.len() <= width {
            if style == ScalarStyle::DoubleQuoted {
                return format!("\"{encoded}\"");
            }
            if encoded.is_empty() {
                return "\"\"".to_string();
            }
        }
        // Block literal, wrapped at the binary line width.
        let child = format!("{indent}{}", self.step());
        let mut out = String::from("|-");
        let mut rest = encoded.as_str();
        if rest.is_empty() {
            return "\"\"".to_string();
        }
        while !rest.is_empty() {
            let take = width.min(rest.len()).max(1);
            out.push('\n');
            out.push_str(&child);
            out.push_str(&rest[..take]);
            rest = &rest[take..];
        }
        out
    }

    fn string_text(&self, text: &str, indent: &str, for_key: bool, requested: ScalarStyle) -> String {
        let multiline = text.contains('\n');
        let block_requested = matches!(requested, ScalarStyle::Literal | ScalarStyle::Folded);
        if !for_key && !self.in_flow && block_requested && block_ok(text) {
            return self.block_scalar(text, requested == ScalarStyle::Folded, indent);
        }
        if multiline {
            if !for_key && !self.in_flow && block_ok(text) && self.opts.scalar.str_.default_type == ScalarStyle::Literal {
                return self.block_scalar(text, false, indent);
            }
            return self.double_quoted(text, indent, for_key);
        }
        if self.plain_ok(text) && !matches!(requested, ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted) {
            if for_key || self.in_flow {
                return text.to_string();
            }
            let f = &self.opts.scalar.str_.fold;
            return fold(text, indent, f.line_width, f.min_content_width);
        }
        let needs_escapes = text
            .chars()
            .any(|c| c.is_control() || matches!(c, '\u{85}' | '\u{a0}' | '\u{2028}' | '\u{2029}'));
        if needs_escapes
            || requested == ScalarStyle::DoubleQuoted
            || self.opts.scalar.str_.double_quoted.json_encoding
        {
            return self.double_quoted(text, indent, for_key);
        }
        // Quoting is needed but nothing needs escaping: single quotes,
        // unless the text itself is quote-heavy and doubling `''` would be
        // noisier than escaping.
        if !self.opts.scalar.str_.default_quote_single
            && requested != ScalarStyle::SingleQuoted
            && text.contains('\'')
        {
            return self.double_quoted(text, indent, for_key);
        }
        self.single_quoted(text, indent, for_key)
    }

    /// Whether `text` survives as a plain scalar: it must not resolve to a
    /// different type, collide with an indicator, or need escaping.
    fn plain_ok(&self, text: &str) -> bool {
        if text.is_empty() || text == "---" || text == "..." {
            return false;
        }
        let first = match text.chars().next() {
            Some(c) => c,
            None => return false,
        };
        if text.starts_with(' ') || text.ends_with(' ') || text.ends_with(':') {
            return false;
        }
        match first {
            ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%'
            | '@' | '`' => return false,
            '-' | '?' | ':' => {
                if text.len() == 1 || text[1..].starts_with(' ') {
                    return false;
                }
            }
            _ => {}
        }
        if text.chars().any(|c| c.is_control()) {
            return false;
        }
        if text.contains(": ") || text.contains(" #") {
            return false;
        }
        if self.in_flow && text.contains([',', '[', ']', '{', '}']) {
            return false;
        }
        let ctx = self.tag_ctx();
        matches!(self.schema.resolve_scalar(text, &ctx).value, Value::String(_))
    }

    fn single_quoted(&self, text: &str, indent: &str, for_key: bool) -> String {
        let quoted = format!("'{}'", text.replace('\'', "''"));
        if for_key || self.in_flow {
            return quoted;
        }
        let f = &self.opts.scalar.str_.fold;
        fold(&quoted, indent, f.line_width, f.min_content_width)
    }

    fn double_quoted(&self, text: &str, indent: &str, for_key: bool) -> String {
        let json = self.opts.scalar.str_.double_quoted.json_encoding;
        let mut quoted = String::with_capacity(text.len() + 2);
        quoted.push('"');
        for c in text.chars() {
            match c {
                '"' => quoted.push_str("\\\""),
                '\\' => quoted.push_str("\\\\"),
                '\n' => quoted.push_str("\\n"),
                '\t' => quoted.push_str("\\t"),
                '\r' => quoted.push_str("\\r"),
                '\x08' => quoted.push_str("\\b"),
                '\x0c' => quoted.push_str("\\f"),
                '\0' if !json => quoted.push_str("\\0"),
                '\x07' if !json => quoted.push_str("\\a"),
                '\x0b' if !json => quoted.push_str("\\v"),
                '\x1b' if !json => quoted.push_str("\\e"),
                '\u{85}' if !json => quoted.push_str("\\N"),
                '\u{a0}' if !json => quoted.push_str("\\_"),
                '\u{2028}' if !json => quoted.push_str("\\L"),
                '\u{2029}' if !json => quoted.push_str("\\P"),
                c if (c as u32) < 0x20 || (0x7f..0xa0).contains(&(c as u32)) => {
                    quoted.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => quoted.push(c),
            }
        }
        quoted.push('"');
        if for_key || self.in_flow || quoted.contains('\\') {
            return quoted;
        }
        let dq = &self.opts.scalar.str_.double_quoted;
        if quoted.len() < dq.min_multi_line_length {
            return quoted;
        }
        let f = &self.opts.scalar.str_.fold;
        fold(&quoted, indent, f.line_width, f.min_content_width)
    }

    /// Render a block literal (`|`) or folded (`>`) scalar. The header sits
    /// on the current line; content lines are indented one step further.
    fn block_scalar(&self, text: &str, folded: bool, indent: &str) -> String {
        let child = format!("{indent}{}", self.step());
        let trailing_breaks = text.len() - text.trim_end_matches('\n').len();
        let (indicator, content) = match trailing_breaks {
            0 => ("-", text),
            1 => ("", &text[..text.len() - 1]),
            _ => ("+", &text[..text.len() - 1]),
        };
        let lines: Vec<&str> = content.split('\n').collect();
        let folded = folded && !lines.iter().any(|l| l.starts_with(' ') || l.starts_with('\t'));
        let header_char = if folded { '>' } else { '|' };
        let mut out = format!("{header_char}{indicator}");
        if content.is_empty() {
            return out;
        }
        if folded {
            let f = &self.opts.scalar.str_.fold;
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    // An original newline needs a blank line to survive
                    // the fold when re-parsed.
                    out.push('\n');
                }
                out.push('\n');
                out.push_str(&child);
                out.push_str(&fold(line, &child, f.line_width, f.min_content_width));
            }
        } else {
            for line in &lines {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str(&child);
                    out.push_str(line);
                }
            }
        }
        out
    }
}

/// Floats always render with a decimal point or exponent; the special
/// values keep their YAML textual forms.
fn float_text(f: f64) -> String {
    if f.is_nan() {
        return ".nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { ".inf" } else { "-.inf" }.to_string();
    }
    let text = f.to_string();
    if text.contains('.') || text.contains('e') || text.contains('E') {
        text
    } else {
        format!("{text}.0")
    }
}

/// Block scalars cannot carry control characters other than line breaks,
/// and a leading blank would be misread as part of the indentation.
fn block_ok(text: &str) -> bool {
    !text.is_empty()
        && !text.starts_with(' ')
        && !text.starts_with('\t')
        && !text.chars().any(|c| c != '\n' && c.is_control())
}
