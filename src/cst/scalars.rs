//! Scalar lexing: plain, quoted, and block scalar carriers.
//!
//! Each scanner consumes from the shared cursor and returns the cooked
//! string value plus any diagnostics, leaving the cursor just past the
//! scalar's last consumed byte.

use super::parser::Cursor;
use super::Comment;
use crate::error::{NodeType, YamlError};
use crate::source::Range;

pub(super) struct ScannedScalar {
    pub value: String,
    pub range: Range,
    pub errors: Vec<YamlError>,
    /// Comment found inside a block scalar header.
    pub header_comment: Option<Comment>,
}

impl ScannedScalar {
    fn new(start: usize) -> Self {
        ScannedScalar {
            value: String::new(),
            range: Range::new(start, start),
            errors: Vec::new(),
            header_comment: None,
        }
    }
}

/// Whether `:` at `pos` terminates a plain scalar.
fn colon_ends_plain(cur: &Cursor<'_>, pos: usize, in_flow: bool) -> bool {
    match cur.byte_at(pos + 1) {
        None | Some(b' ') | Some(b'\t') | Some(b'\n') => true,
        Some(b',') | Some(b'[') | Some(b']') | Some(b'{') | Some(b'}') => in_flow,
        _ => false,
    }
}

/// Scan one line of plain scalar content starting at the cursor. Returns the
/// trimmed segment; the cursor stops before any terminator.
fn scan_plain_segment(cur: &mut Cursor<'_>, in_flow: bool) -> (String, usize) {
    let start = cur.pos;
    let mut end = cur.pos;
    loop {
        match cur.peek() {
            None | Some(b'\n') => break,
            Some(b'#') if cur.pos == start || matches!(cur.byte_at(cur.pos - 1), Some(b' ') | Some(b'\t')) => {
                break
            }
            Some(b':') if colon_ends_plain(cur, cur.pos, in_flow) => break,
            Some(b',') | Some(b'[') | Some(b']') | Some(b'{') | Some(b'}') if in_flow => break,
            Some(b' ') | Some(b'\t') => {
                cur.bump();
            }
            _ => {
                cur.bump();
                end = cur.pos;
            }
        }
    }
    // Back up over trailing blanks so they stay outside the scalar.
    while cur.pos > end {
        cur.unbump();
    }
    (cur.slice(start, end).to_string(), end)
}

/// Scan a single-line plain scalar at the cursor.
pub(super) fn scan_plain(cur: &mut Cursor<'_>, in_flow: bool) -> ScannedScalar {
    let start = cur.pos;
    let mut sc = ScannedScalar::new(start);
    let (segment, end) = scan_plain_segment(cur, in_flow);
    sc.value = segment;
    sc.range = Range::new(start, end);
    sc
}

/// Continue a plain scalar across following lines, folding line breaks.
/// `floor` is the enclosing indentation floor: continuation lines must be
/// strictly more indented.
pub(super) fn extend_plain(cur: &mut Cursor<'_>, sc: &mut ScannedScalar, floor: i32, in_flow: bool) {
    loop {
        if cur.peek() != Some(b'\n') {
            return;
        }
        let save = cur.save();
        let mut breaks = 0usize;
        // Consume the break(s) and find the next content line.
        let col = loop {
            if cur.peek() == Some(b'\n') {
                cur.bump();
                breaks += 1;
                continue;
            }
            let mut spaces = 0usize;
            while matches!(cur.peek(), Some(b' ') | Some(b'\t')) {
                if cur.peek() == Some(b' ') {
                    spaces += 1;
                }
                cur.bump();
            }
            match cur.peek() {
                Some(b'\n') => {
                    // Blank line: the spaces don't count as content.
                    continue;
                }
                None | Some(b'#') => {
                    cur.restore(save);
                    return;
                }
                _ => break spaces as i32,
            }
        };
        if col <= floor || cur.at_document_boundary() {
            cur.restore(save);
            return;
        }
        let (segment, end) = scan_plain_segment(cur, in_flow);
        if segment.is_empty() {
            cur.restore(save);
            return;
        }
        if breaks == 1 {
            sc.value.push(' ');
        } else {
            for _ in 1..breaks {
                sc.value.push('\n');
            }
        }
        sc.value.push_str(&segment);
        sc.range.end = end;
    }
}

const SINGLE_MISSING: &str = "Missing closing 'quote";
const DOUBLE_MISSING: &str = "Missing closing \"quote";

/// Scan a single-quoted scalar; the cursor is at the opening quote.
pub(super) fn scan_single_quoted(cur: &mut Cursor<'_>) -> ScannedScalar {
    let start = cur.pos;
    let mut sc = ScannedScalar::new(start);
    cur.bump();
    loop {
        match cur.peek() {
            None => {
                sc.errors.push(YamlError::semantic(
                    NodeType::QuoteSingle,
                    Range::new(cur.pos, cur.pos + 1),
                    SINGLE_MISSING,
                ));
                break;
            }
            Some(b'\'') => {
                cur.bump();
                if cur.peek() == Some(b'\'') {
                    sc.value.push('\'');
                    cur.bump();
                } else {
                    break;
                }
            }
            Some(b'\n') => fold_quoted_break(cur, &mut sc.value, 0),
            _ => {
                let c = cur.bump_char();
                sc.value.push(c);
            }
        }
    }
    sc.range = Range::new(start, cur.pos);
    sc
}

/// Scan a double-quoted scalar; the cursor is at the opening quote.
pub(super) fn scan_double_quoted(cur: &mut Cursor<'_>) -> ScannedScalar {
    let start = cur.pos;
    let mut sc = ScannedScalar::new(start);
    // Escaped characters must survive the fold's trailing-space trim.
    let mut protected = 0usize;
    cur.bump();
    loop {
        match cur.peek() {
            None => {
                sc.errors.push(YamlError::semantic(
                    NodeType::QuoteDouble,
                    Range::new(cur.pos, cur.pos + 1),
                    DOUBLE_MISSING,
                ));
                break;
            }
            Some(b'"') => {
                cur.bump();
                break;
            }
            Some(b'\\') => {
                scan_escape(cur, &mut sc);
                protected = sc.value.len();
            }
            Some(b'\n') => fold_quoted_break(cur, &mut sc.value, protected),
            _ => {
                let c = cur.bump_char();
                sc.value.push(c);
            }
        }
    }
    sc.range = Range::new(start, cur.pos);
    sc
}

/// Fold an unescaped line break inside a quoted scalar: trailing blanks are
/// trimmed (down to `protected`), one break folds to a space, further breaks
/// become literal newlines, and the continuation indent is skipped.
fn fold_quoted_break(cur: &mut Cursor<'_>, value: &mut String, protected: usize) {
    while value.len() > protected && value.ends_with([' ', '\t']) {
        value.pop();
    }
    let mut breaks = 0usize;
    loop {
        match cur.peek() {
            Some(b'\n') => {
                cur.bump();
                breaks += 1;
            }
            Some(b' ') | Some(b'\t') => {
                // Either indentation or a blank line; decide at the next break.
                while matches!(cur.peek(), Some(b' ') | Some(b'\t')) {
                    cur.bump();
                }
                if cur.peek() == Some(b'\n') {
                    continue;
                }
                break;
            }
            _ => break,
        }
    }
    if breaks <= 1 {
        value.push(' ');
    } else {
        for _ in 1..breaks {
            value.push('\n');
        }
    }
}

fn scan_escape(cur: &mut Cursor<'_>, sc: &mut ScannedScalar) {
    let esc_start = cur.pos;
    cur.bump(); // backslash
    let Some(b) = cur.peek() else {
        sc.errors.push(YamlError::syntax(
            NodeType::QuoteDouble,
            Range::new(esc_start, esc_start + 1),
            "Invalid escape sequence at end of input",
        ));
        return;
    };
    match b {
        b'\n' => {
            // Escaped line break: joins lines without inserting anything.
            cur.bump();
            while matches!(cur.peek(), Some(b' ') | Some(b'\t')) {
                cur.bump();
            }
        }
        b'x' => scan_hex_escape(cur, sc, esc_start, 2),
        b'u' => scan_hex_escape(cur, sc, esc_start, 4),
        b'U' => scan_hex_escape(cur, sc, esc_start, 8),
        _ => {
            let c = cur.bump_char();
            let resolved = match c {
                '0' => Some('\0'),
                'a' => Some('\x07'),
                'b' => Some('\x08'),
                't' | '\t' => Some('\t'),
                'n' => Some('\n'),
                'v' => Some('\x0b'),
                'f' => Some('\x0c'),
                'r' => Some('\r'),
                'e' => Some('\x1b'),
                ' ' => Some(' '),
                '"' => Some('"'),
                '/' => Some('/'),
                '\\' => Some('\\'),
                'N' => Some('\u{85}'),
                '_' => Some('\u{a0}'),
                'L' => Some('\u{2028}'),
                'P' => Some('\u{2029}'),
                _ => None,
            };
            match resolved {
                Some(c) => sc.value.push(c),
                None => {
                    sc.errors.push(YamlError::syntax(
                        NodeType::QuoteDouble,
                        Range::new(esc_start, cur.pos),
                        format!("Invalid escape sequence \\{c}"),
                    ));
                    sc.value.push('\\');
                    sc.value.push(c);
                }
            }
        }
    }
}

fn scan_hex_escape(cur: &mut Cursor<'_>, sc: &mut ScannedScalar, esc_start: usize, len: usize) {
    cur.bump(); // x/u/U
    let digits_start = cur.pos;
    let mut code = 0u32;
    for _ in 0..len {
        match cur.peek() {
            Some(b) if b.is_ascii_hexdigit() => {
                code = code * 16 + u32::from((b as char).to_digit(16).unwrap_or(0));
                cur.bump();
            }
            _ => {
                sc.errors.push(YamlError::syntax(
                    NodeType::QuoteDouble,
                    Range::new(esc_start, cur.pos.max(digits_start)),
                    "Invalid escape sequence: expected hex digits",
                ));
                return;
            }
        }
    }
    match char::from_u32(code) {
        Some(c) => sc.value.push(c),
        None => sc.errors.push(YamlError::syntax(
            NodeType::QuoteDouble,
            Range::new(esc_start, cur.pos),
            format!("Invalid escape sequence: \\u{code:x} is not a character"),
        )),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Chomp {
    Strip,
    Clip,
    Keep,
}

/// Scan a block literal (`|`) or folded (`>`) scalar; the cursor is at the
/// indicator. `parent_indent` is the enclosing node's indentation floor.
pub(super) fn scan_block_scalar(
    cur: &mut Cursor<'_>,
    literal: bool,
    parent_indent: i32,
) -> ScannedScalar {
    let start = cur.pos;
    let node_type = if literal {
        NodeType::BlockLiteral
    } else {
        NodeType::BlockFolded
    };
    let mut sc = ScannedScalar::new(start);
    cur.bump(); // | or >

    // Header: chomping indicator and explicit indent digit, either order.
    let mut chomp = Chomp::Clip;
    let mut explicit_indent: Option<usize> = None;
    loop {
        match cur.peek() {
            Some(b'+') => {
                chomp = Chomp::Keep;
                cur.bump();
            }
            Some(b'-') => {
                chomp = Chomp::Strip;
                cur.bump();
            }
            Some(b @ b'1'..=b'9') if explicit_indent.is_none() => {
                explicit_indent = Some(usize::from(b - b'0'));
                cur.bump();
            }
            Some(b'0') => {
                sc.errors.push(YamlError::semantic(
                    node_type,
                    Range::new(cur.pos, cur.pos + 1),
                    "Block scalar indentation indicator cannot be 0",
                ));
                cur.bump();
            }
            _ => break,
        }
    }
    while matches!(cur.peek(), Some(b' ') | Some(b'\t')) {
        cur.bump();
    }
    if cur.peek() == Some(b'#') {
        let c_start = cur.pos;
        cur.bump();
        let text_start = cur.pos;
        while !matches!(cur.peek(), None | Some(b'\n')) {
            cur.bump();
        }
        sc.header_comment = Some(Comment {
            text: cur.slice(text_start, cur.pos).trim_start().to_string(),
            range: Range::new(c_start, cur.pos),
            orig_range: None,
        });
    } else if !matches!(cur.peek(), None | Some(b'\n')) {
        let junk_start = cur.pos;
        while !matches!(cur.peek(), None | Some(b'\n')) {
            cur.bump();
        }
        sc.errors.push(YamlError::syntax(
            node_type,
            Range::new(junk_start, cur.pos),
            "Unexpected characters in block scalar header",
        ));
    }
    if cur.peek() == Some(b'\n') {
        cur.bump();
    }

    // Collect content lines. `None` text means a blank line.
    let min_indent = (parent_indent + 1).max(0) as usize;
    let mut content_indent = explicit_indent.map(|d| (parent_indent.max(0) as usize) + d);
    let mut lines: Vec<Option<String>> = Vec::new();
    let mut last_was_terminated = false;
    loop {
        if cur.at_end() {
            break;
        }
        let save = cur.save();
        let mut spaces = 0usize;
        while cur.peek() == Some(b' ') {
            spaces += 1;
            cur.bump();
        }
        match cur.peek() {
            None => {
                lines.push(None);
                last_was_terminated = false;
                break;
            }
            Some(b'\n') => {
                cur.bump();
                // Blank lines keep spaces beyond the content indent.
                let keep = content_indent.map_or(0, |ci| spaces.saturating_sub(ci));
                if keep > 0 {
                    lines.push(Some(" ".repeat(keep)));
                } else {
                    lines.push(None);
                }
                last_was_terminated = true;
                continue;
            }
            _ => {
                if content_indent.is_none() {
                    if spaces < min_indent {
                        cur.restore(save);
                        break;
                    }
                    content_indent = Some(spaces);
                }
                let ci = content_indent.unwrap_or(0);
                if spaces < ci || (spaces == 0 && cur.at_document_boundary()) {
                    cur.restore(save);
                    break;
                }
                let line_start = save.pos + ci;
                while !matches!(cur.peek(), None | Some(b'\n')) {
                    cur.bump();
                }
                lines.push(Some(cur.slice(line_start, cur.pos).to_string()));
                last_was_terminated = cur.peek() == Some(b'\n');
                if last_was_terminated {
                    cur.bump();
                }
            }
        }
    }

    // Split off trailing blank lines for chomping.
    let mut trailing = 0usize;
    while matches!(lines.last(), Some(None)) {
        lines.pop();
        trailing += 1;
    }
    let body = if literal {
        join_literal(&lines)
    } else {
        join_folded(&lines)
    };
    sc.value = match chomp {
        Chomp::Strip => body,
        Chomp::Clip => {
            if body.is_empty() {
                body
            } else {
                body + "\n"
            }
        }
        Chomp::Keep => {
            let final_break = usize::from(last_was_terminated || trailing > 0);
            let breaks = if lines.is_empty() {
                trailing.saturating_sub(1) + final_break
            } else {
                trailing + final_break
            };
            body + &"\n".repeat(breaks)
        }
    };
    sc.range = Range::new(start, cur.pos);
    sc
}

fn join_literal(lines: &[Option<String>]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if let Some(text) = line {
            out.push_str(text);
        }
    }
    out
}

fn join_folded(lines: &[Option<String>]) -> String {
    let mut out = String::new();
    let mut prev_text = false;
    let mut prev_more = false;
    for line in lines {
        match line {
            None => {
                out.push('\n');
                prev_text = false;
                prev_more = false;
            }
            Some(text) => {
                let more = text.starts_with(' ') || text.starts_with('\t');
                if prev_text && !more {
                    out.push(' ');
                } else if prev_text || prev_more {
                    out.push('\n');
                }
                out.push_str(text);
                prev_text = !more;
                prev_more = more;
            }
        }
    }
    out
}
