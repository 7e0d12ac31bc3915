//! Line folding for long scalars.

/// Fold `text` (a single logical line) at `width` columns, breaking only at
/// single-space boundaries. Continuation lines are prefixed with `indent`.
/// A `width` of 0 disables folding entirely.
pub(super) fn fold(text: &str, indent: &str, width: usize, min_content: usize) -> String {
    if width == 0 {
        return text.to_string();
    }
    let effective = width.saturating_sub(indent.len()).max(min_content);
    if text.chars().count() <= effective {
        return text.to_string();
    }
    let breaks = break_points(text);
    if breaks.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 16);
    let mut line_start = 0usize;
    let mut last_candidate: Option<usize> = None;
    let mut col = 0usize;
    for (i, _) in text.char_indices() {
        col += 1;
        if breaks.contains(&i) {
            last_candidate = Some(i);
        }
        if col > effective {
            if let Some(b) = last_candidate {
                if b > line_start {
                    out.push_str(&text[line_start..b]);
                    out.push('\n');
                    out.push_str(indent);
                    line_start = b + 1;
                    col = text[line_start..i].chars().count() + 1;
                    last_candidate = None;
                }
            }
        }
    }
    out.push_str(&text[line_start..]);
    out
}

/// Byte indices of spaces where a break keeps the fold reversible: a single
/// space with non-space neighbours.
fn break_points(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b' ' {
            continue;
        }
        let prev_ok = i > 0 && bytes[i - 1] != b' ' && bytes[i - 1] != b'\t';
        let next_ok = i + 1 < bytes.len() && bytes[i + 1] != b' ' && bytes[i + 1] != b'\t';
        if prev_ok && next_ok {
            out.push(i);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(fold("hello there", "", 80, 20), "hello there");
    }

    #[test]
    fn folds_at_spaces_never_inside_words() {
        let text = "alpha bravo charlie delta echo foxtrot";
        let folded = fold(text, "  ", 20, 5);
        for line in folded.split('\n') {
            let line = line.trim_start();
            assert!(text.contains(line), "line {line:?} must be a word run");
        }
        assert_eq!(folded.replace("\n  ", " "), text);
    }

    #[test]
    fn zero_width_disables_folding() {
        let text = "a ".repeat(200);
        assert_eq!(fold(&text, "", 0, 20), text);
    }

    #[test]
    fn double_spaces_are_not_break_points() {
        let text = "word  word2 word3 word4 word5 word6 word7";
        let folded = fold(text, "", 18, 5);
        // The two-space run must survive on a single line.
        assert!(folded.contains("word  word2"));
    }

    #[test]
    fn unbreakable_text_stays_whole() {
        let text = "x".repeat(200);
        assert_eq!(fold(&text, "", 80, 20), text);
    }
}
