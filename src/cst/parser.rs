//! The recursive-descent CST parser.
//!
//! A byte cursor walks the normalized source; block and flow constructs are
//! mutually recursive. The only lookahead beyond one character is the
//! implicit-key probe: a candidate inline node is parsed, and a following
//! `: ` turns it into the first key of a block mapping. Errors bind to the
//! offending node and parsing resumes at the nearest line of same or lesser
//! indent, flow separator, or document marker.

use std::sync::Arc;

use log::debug;
use smallvec::SmallVec;

use super::scalars::{self, ScannedScalar};
use super::{
    Comment, CstDocument, CstNode, CstScalar, CstStream, CstValue, Directive, FlowEntry,
    MapEntry, SeqEntry, Spanned, TagProp,
};
use crate::error::{ErrorKind, NodeType, YamlError};
use crate::node::ScalarStyle;
use crate::source::{Range, Source};

pub(crate) fn parse_stream(input: &str) -> CstStream {
    let source = Arc::new(Source::new(input));
    debug!("parsing {} bytes of YAML source", source.text().len());
    let documents = Parser::new(source.text()).parse_documents();
    debug!("parsed {} document(s)", documents.len());
    CstStream { documents, source }
}

/// Byte cursor over the normalized source.
pub(super) struct Cursor<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pub pos: usize,
    line_start: usize,
}

#[derive(Clone, Copy)]
pub(super) struct CursorSave {
    pub pos: usize,
    line_start: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Cursor {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            line_start: 0,
        }
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn col(&self) -> usize {
        self.pos - self.line_start
    }

    pub fn at_line_start(&self) -> bool {
        self.pos == self.line_start
    }

    /// Advance one byte. Multibyte characters may be consumed byte-wise:
    /// every structural byte is ASCII, so continuation bytes never match one.
    pub fn bump(&mut self) {
        if let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'\n' {
                self.line_start = self.pos;
            }
        }
    }

    /// Step back over a just-consumed non-newline byte.
    pub fn unbump(&mut self) {
        debug_assert!(self.pos > self.line_start);
        self.pos -= 1;
    }

    /// Consume and return one full character.
    pub fn bump_char(&mut self) -> char {
        let c = self.text[self.pos..].chars().next().unwrap_or('\u{fffd}');
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line_start = self.pos;
        }
        c
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[start..end]
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.text[self.pos..].starts_with(s)
    }

    pub fn save(&self) -> CursorSave {
        CursorSave {
            pos: self.pos,
            line_start: self.line_start,
        }
    }

    pub fn restore(&mut self, save: CursorSave) {
        self.pos = save.pos;
        self.line_start = save.line_start;
    }

    /// Consume a byte order mark, keeping the line-start bookkeeping right.
    pub fn skip_bom(&mut self) {
        if self.starts_with("\u{feff}") {
            self.pos += '\u{feff}'.len_utf8();
            self.line_start = self.pos;
        }
    }

    /// Whether the cursor sits at a `---` or `...` document marker.
    pub fn at_document_boundary(&self) -> bool {
        if !self.at_line_start() {
            return false;
        }
        (self.starts_with("---") || self.starts_with("..."))
            && matches!(
                self.byte_at(self.pos + 3),
                None | Some(b' ') | Some(b'\t') | Some(b'\n')
            )
    }
}

/// Where [`Parser::advance_to_content`] landed.
struct Landing {
    col: usize,
    at_end: bool,
    is_marker: bool,
}

struct ParserSave {
    cursor: CursorSave,
    errors_len: usize,
    pending_len: usize,
}

struct Parser<'a> {
    cur: Cursor<'a>,
    errors: Vec<YamlError>,
    /// Comment lines waiting to attach to the next node; nearly always tiny.
    pending_comments: SmallVec<[Comment; 4]>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            cur: Cursor::new(text),
            errors: Vec::new(),
            pending_comments: SmallVec::new(),
        }
    }

    fn save(&self) -> ParserSave {
        ParserSave {
            cursor: self.cur.save(),
            errors_len: self.errors.len(),
            pending_len: self.pending_comments.len(),
        }
    }

    fn restore(&mut self, save: ParserSave) {
        self.cur.restore(save.cursor);
        self.errors.truncate(save.errors_len);
        self.pending_comments.truncate(save.pending_len);
    }

    fn parse_documents(mut self) -> Vec<CstDocument> {
        let mut docs = Vec::new();
        loop {
            let doc = self.parse_document();
            let done = self.cur.at_end();
            docs.push(doc);
            if done {
                break;
            }
        }
        docs
    }

    // --- document structure -------------------------------------------------

    fn parse_document(&mut self) -> CstDocument {
        let start = self.cur.pos;
        self.cur.skip_bom();

        let mut doc = CstDocument::default();

        // START / DIRECTIVES
        loop {
            self.advance_to_content();
            if self.cur.at_line_start() && self.cur.peek() == Some(b'%') {
                let directive = self.parse_directive();
                doc.directives.push(directive);
            } else {
                break;
            }
        }
        if self.cur.at_document_boundary() && self.cur.starts_with("---") {
            self.cur.pos += 3;
            doc.has_directives_end = true;
            while matches!(self.cur.peek(), Some(b' ') | Some(b'\t')) {
                self.cur.bump();
            }
        }

        // CONTENT
        let landing = self.advance_to_content();
        if !landing.at_end && !landing.is_marker {
            doc.contents = Some(self.parse_node(-1, false));
        }

        // END
        let landing = self.advance_to_content();
        if landing.is_marker && self.cur.starts_with("...") {
            self.cur.pos += 3;
            doc.has_document_end = true;
            if let Some(comment) = self.take_trailing_comment() {
                self.pending_comments.push(comment);
            }
            self.advance_to_content();
        } else if !landing.at_end && !landing.is_marker {
            // Content past the first node without a separating marker.
            let bad_start = self.cur.pos;
            while !self.cur.at_end() && !self.cur.at_document_boundary() {
                while !matches!(self.cur.peek(), None | Some(b'\n')) {
                    self.cur.bump();
                }
                self.cur.bump();
            }
            let mut end = self.cur.pos;
            while end > bad_start && self.cur.byte_at(end - 1) == Some(b'\n') {
                end -= 1;
            }
            self.errors.push(YamlError::syntax(
                NodeType::Document,
                Range::new(bad_start, end),
                "Document contains trailing content",
            ));
        }

        doc.comments = self.pending_comments.drain(..).collect();
        doc.errors = std::mem::take(&mut self.errors);
        doc.range = Range::new(start, self.cur.pos);
        doc
    }

    fn parse_directive(&mut self) -> Directive {
        let start = self.cur.pos;
        while !matches!(self.cur.peek(), None | Some(b'\n')) {
            self.cur.bump();
        }
        let range = Range::new(start, self.cur.pos);
        let line = self.cur.slice(start, self.cur.pos);
        let mut parts = line.split_whitespace();
        let name = parts
            .next()
            .unwrap_or("%")
            .trim_start_matches('%')
            .to_string();
        let parameters: Vec<String> = parts.map(str::to_string).collect();
        if name != "YAML" && name != "TAG" {
            self.errors.push(YamlError::warning(
                range,
                format!("YAML only supports %TAG and %YAML directives, and not %{name}"),
            ));
        }
        Directive {
            name,
            parameters,
            range,
            orig_range: None,
        }
    }

    // --- whitespace, comments, separation -----------------------------------

    /// Consume blanks, line breaks, and comment lines up to the next content
    /// character. Comments collect as pending; tabs inside a structural
    /// indent span are reported once per line.
    fn advance_to_content(&mut self) -> Landing {
        self.advance_to_content_with(false)
    }

    /// As [`advance_to_content`], but `tabs_ok` suppresses the indentation
    /// tab error (tabs are valid separation inside flow collections).
    fn advance_to_content_with(&mut self, tabs_ok: bool) -> Landing {
        loop {
            // Same-line blanks are plain separation; blanks at a line start
            // are indentation and belong to the walk below, which watches
            // for tabs.
            if !self.cur.at_line_start() {
                while matches!(self.cur.peek(), Some(b' ') | Some(b'\t')) {
                    self.cur.bump();
                }
            }
            match self.cur.peek() {
                None => {
                    return Landing {
                        col: 0,
                        at_end: true,
                        is_marker: false,
                    };
                }
                Some(b'\n') => {
                    self.cur.bump();
                }
                Some(b'#') => {
                    let comment = self.scan_comment();
                    self.pending_comments.push(comment);
                }
                Some(_) => {
                    if self.cur.at_line_start() {
                        // Walk the indent span, watching for tabs.
                        let mut spaces = 0usize;
                        let mut tab_range: Option<Range> = None;
                        while matches!(self.cur.peek(), Some(b' ') | Some(b'\t')) {
                            if self.cur.peek() == Some(b'\t') {
                                let p = self.cur.pos;
                                tab_range.get_or_insert(Range::new(p, p + 1));
                            } else if tab_range.is_none() {
                                spaces += 1;
                            }
                            self.cur.bump();
                        }
                        match self.cur.peek() {
                            None | Some(b'\n') | Some(b'#') => continue,
                            Some(_) => {
                                if let Some(range) = tab_range {
                                    if !tabs_ok {
                                        self.errors.push(YamlError::new(
                                            ErrorKind::Semantic,
                                            None,
                                            range,
                                            "Tabs are not allowed as indentation",
                                        ));
                                    }
                                }
                                return Landing {
                                    col: spaces,
                                    at_end: false,
                                    is_marker: spaces == 0
                                        && tab_range.is_none()
                                        && self.cur.at_document_boundary(),
                                };
                            }
                        }
                    } else {
                        return Landing {
                            col: self.cur.col(),
                            at_end: false,
                            is_marker: self.cur.at_document_boundary(),
                        };
                    }
                }
            }
        }
    }

    fn scan_comment(&mut self) -> Comment {
        let start = self.cur.pos;
        self.cur.bump(); // '#'
        let text_start = self.cur.pos;
        while !matches!(self.cur.peek(), None | Some(b'\n')) {
            self.cur.bump();
        }
        Comment {
            text: self.cur.slice(text_start, self.cur.pos).to_string(),
            range: Range::new(start, self.cur.pos),
            orig_range: None,
        }
    }

    /// Capture a `# …` comment on the current line, if present.
    fn take_trailing_comment(&mut self) -> Option<Comment> {
        let save = self.cur.save();
        while matches!(self.cur.peek(), Some(b' ') | Some(b'\t')) {
            self.cur.bump();
        }
        if self.cur.peek() == Some(b'#') {
            Some(self.scan_comment())
        } else {
            self.cur.restore(save);
            None
        }
    }

    fn drain_pending(&mut self) -> Option<String> {
        if self.pending_comments.is_empty() {
            return None;
        }
        let text = self
            .pending_comments
            .drain(..)
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("\n");
        Some(text)
    }

    // --- node properties ----------------------------------------------------

    fn is_anchor_char(b: u8) -> bool {
        !matches!(
            b,
            b' ' | b'\t' | b'\n' | b',' | b'[' | b']' | b'{' | b'}'
        )
    }

    fn parse_anchor(&mut self) -> Spanned<String> {
        let start = self.cur.pos;
        self.cur.bump(); // '&'
        let name_start = self.cur.pos;
        while self.cur.peek().is_some_and(Self::is_anchor_char) {
            self.cur.bump();
        }
        let name = self.cur.slice(name_start, self.cur.pos).to_string();
        if name.is_empty() {
            self.errors.push(YamlError::syntax(
                NodeType::Anchor,
                Range::new(start, start + 1),
                "Anchor name is required after &",
            ));
        }
        Spanned::new(name, Range::new(start, self.cur.pos))
    }

    fn is_tag_char(b: u8) -> bool {
        !matches!(
            b,
            b' ' | b'\t' | b'\n' | b',' | b'[' | b']' | b'{' | b'}' | b'!'
        )
    }

    fn parse_tag(&mut self) -> Spanned<TagProp> {
        let start = self.cur.pos;
        self.cur.bump(); // '!'
        if self.cur.peek() == Some(b'<') {
            self.cur.bump();
            let uri_start = self.cur.pos;
            while !matches!(self.cur.peek(), None | Some(b'>') | Some(b'\n')) {
                self.cur.bump();
            }
            let suffix = self.cur.slice(uri_start, self.cur.pos).to_string();
            if self.cur.peek() == Some(b'>') {
                self.cur.bump();
            } else {
                self.errors.push(YamlError::syntax(
                    NodeType::Tag,
                    Range::new(start, self.cur.pos),
                    "Verbatim tags must end with a >",
                ));
            }
            return Spanned::new(
                TagProp {
                    handle: String::new(),
                    suffix,
                    verbatim: true,
                },
                Range::new(start, self.cur.pos),
            );
        }
        if self.cur.peek() == Some(b'!') {
            self.cur.bump();
            let suffix_start = self.cur.pos;
            while self.cur.peek().is_some_and(Self::is_tag_char) {
                self.cur.bump();
            }
            return Spanned::new(
                TagProp {
                    handle: "!!".to_string(),
                    suffix: self.cur.slice(suffix_start, self.cur.pos).to_string(),
                    verbatim: false,
                },
                Range::new(start, self.cur.pos),
            );
        }
        let word_start = self.cur.pos;
        while self.cur.peek().is_some_and(Self::is_tag_char) {
            self.cur.bump();
        }
        if self.cur.peek() == Some(b'!') {
            // Named handle: !word!suffix
            let handle = format!("!{}!", self.cur.slice(word_start, self.cur.pos));
            self.cur.bump();
            let suffix_start = self.cur.pos;
            while self.cur.peek().is_some_and(Self::is_tag_char) {
                self.cur.bump();
            }
            Spanned::new(
                TagProp {
                    handle,
                    suffix: self.cur.slice(suffix_start, self.cur.pos).to_string(),
                    verbatim: false,
                },
                Range::new(start, self.cur.pos),
            )
        } else {
            Spanned::new(
                TagProp {
                    handle: "!".to_string(),
                    suffix: self.cur.slice(word_start, self.cur.pos).to_string(),
                    verbatim: false,
                },
                Range::new(start, self.cur.pos),
            )
        }
    }

    // --- nodes --------------------------------------------------------------

    /// Parse one node at the cursor. `floor` is the enclosing indentation
    /// floor: this node's block children must sit at a strictly greater
    /// column.
    fn parse_node(&mut self, floor: i32, in_flow: bool) -> CstNode {
        let start = self.cur.pos;
        let start_col = self.cur.col();

        if !in_flow {
            match self.cur.peek() {
                Some(b'-') if self.boundary_after(1) => {
                    let mut node = CstNode {
                        comment_before: self.drain_pending(),
                        ..CstNode::default()
                    };
                    let items = self.parse_block_seq(start_col);
                    let end = items
                        .last()
                        .and_then(|e| e.value.as_ref())
                        .map_or(self.cur.pos, |v| v.range.end);
                    node.value = Some(CstValue::BlockSeq(items));
                    node.range = Range::new(start, end.max(start));
                    return node;
                }
                Some(b'?') if self.boundary_after(1) => {
                    let mut node = CstNode {
                        comment_before: self.drain_pending(),
                        ..CstNode::default()
                    };
                    let items = self.parse_block_map(start_col, floor, None);
                    node.value = Some(CstValue::BlockMap(items));
                    node.range = Range::new(start, self.cur.pos);
                    return node;
                }
                _ => {}
            }
            // Candidate inline node, then probe for `: ` to detect a map.
            let mut candidate = self.parse_inline_node(floor, false);
            let after_candidate = self.cur.save();
            while matches!(self.cur.peek(), Some(b' ') | Some(b'\t')) {
                self.cur.bump();
            }
            if self.cur.peek() == Some(b':') && self.boundary_after(1) {
                self.cur.restore(after_candidate);
                let comment_before = candidate.comment_before.take();
                let items = self.parse_block_map(start_col, floor, Some(candidate));
                return CstNode {
                    comment_before,
                    value: Some(CstValue::BlockMap(items)),
                    range: Range::new(start, self.cur.pos),
                    ..CstNode::default()
                };
            }
            self.cur.restore(after_candidate);
            // Not a key: a plain scalar may continue over following lines,
            // and a property-only line takes its value from the next one.
            if let Some(CstValue::Scalar(s)) = &candidate.value {
                if s.style == ScalarStyle::Plain {
                    let mut sc = ScannedScalar {
                        value: s.value.clone(),
                        range: candidate.range,
                        errors: Vec::new(),
                        header_comment: None,
                    };
                    scalars::extend_plain(&mut self.cur, &mut sc, floor, false);
                    candidate.value = Some(CstValue::Scalar(CstScalar {
                        style: ScalarStyle::Plain,
                        value: sc.value,
                    }));
                    candidate.range = Range::new(candidate.range.start, sc.range.end);
                }
            } else if candidate.value.is_none()
                && !(candidate.anchors.is_empty() && candidate.tags.is_empty())
            {
                let save = self.save();
                let landing = self.advance_to_content();
                if !landing.at_end && !landing.is_marker && (landing.col as i32) > floor {
                    let inner = self.parse_node(floor, false);
                    candidate.anchors.extend(inner.anchors);
                    candidate.tags.extend(inner.tags);
                    candidate.value = inner.value;
                    candidate.comment_before = match (candidate.comment_before, inner.comment_before)
                    {
                        (Some(a), Some(b)) => Some(format!("{a}\n{b}")),
                        (a, b) => a.or(b),
                    };
                    candidate.range = Range::new(start, inner.range.end);
                } else {
                    self.restore(save);
                }
            }
            if candidate.comment.is_none() && !self.cur.at_line_start() {
                if let Some(c) = self.take_trailing_comment() {
                    candidate.comment = Some(c.text);
                }
            }
            return candidate;
        }

        // Flow context: no block constructs, no implicit-key probe here
        // (pairs are handled by the flow collection itself).
        let mut node = self.parse_inline_node(floor, true);
        if node.comment.is_none() && !self.cur.at_line_start() {
            if let Some(c) = self.take_trailing_comment() {
                node.comment = Some(c.text);
            }
        }
        node
    }

    /// Parse properties plus a same-line value: alias, quoted or plain
    /// scalar, flow collection, or block scalar.
    fn parse_inline_node(&mut self, floor: i32, in_flow: bool) -> CstNode {
        let start = self.cur.pos;
        let mut node = CstNode {
            comment_before: self.drain_pending(),
            ..CstNode::default()
        };

        loop {
            match self.cur.peek() {
                Some(b'&') => node.anchors.push(self.parse_anchor()),
                Some(b'!') => node.tags.push(self.parse_tag()),
                _ => break,
            }
            while matches!(self.cur.peek(), Some(b' ') | Some(b'\t')) {
                self.cur.bump();
            }
            if matches!(self.cur.peek(), None | Some(b'\n') | Some(b'#')) {
                // Property-only line; the caller decides whether a value
                // follows on a later line.
                node.range = Range::new(start, self.cur.pos);
                return node;
            }
        }

        match self.cur.peek() {
            None | Some(b'\n') => {}
            Some(b'*') => {
                let a_start = self.cur.pos;
                self.cur.bump();
                let name_start = self.cur.pos;
                while self.cur.peek().is_some_and(Self::is_anchor_char) {
                    self.cur.bump();
                }
                let name = self.cur.slice(name_start, self.cur.pos).to_string();
                if name.is_empty() {
                    self.errors.push(YamlError::syntax(
                        NodeType::Alias,
                        Range::new(a_start, a_start + 1),
                        "Alias name is required after *",
                    ));
                }
                node.value = Some(CstValue::Alias(name));
            }
            Some(b'[') => {
                let items = self.parse_flow_collection(false);
                node.value = Some(CstValue::FlowSeq(items));
            }
            Some(b'{') => {
                let items = self.parse_flow_collection(true);
                node.value = Some(CstValue::FlowMap(items));
            }
            Some(b'"') => {
                let sc = scalars::scan_double_quoted(&mut self.cur);
                self.finish_scalar(&mut node, sc, ScalarStyle::DoubleQuoted);
            }
            Some(b'\'') => {
                let sc = scalars::scan_single_quoted(&mut self.cur);
                self.finish_scalar(&mut node, sc, ScalarStyle::SingleQuoted);
            }
            Some(b'|') if !in_flow => {
                let sc = scalars::scan_block_scalar(&mut self.cur, true, floor);
                self.finish_scalar(&mut node, sc, ScalarStyle::Literal);
            }
            Some(b'>') if !in_flow => {
                let sc = scalars::scan_block_scalar(&mut self.cur, false, floor);
                self.finish_scalar(&mut node, sc, ScalarStyle::Folded);
            }
            _ => {
                let mut sc = scalars::scan_plain(&mut self.cur, in_flow);
                if in_flow {
                    scalars::extend_plain(&mut self.cur, &mut sc, floor.max(0), true);
                }
                if !sc.value.is_empty() {
                    let range = sc.range;
                    self.finish_scalar(&mut node, sc, ScalarStyle::Plain);
                    node.range = Range::new(start, range.end);
                    return node;
                }
                // Nothing consumable here: an empty node.
                for e in sc.errors {
                    self.errors.push(e);
                }
            }
        }
        node.range = Range::new(start, self.cur.pos);
        node
    }

    fn finish_scalar(&mut self, node: &mut CstNode, sc: ScannedScalar, style: ScalarStyle) {
        for e in sc.errors {
            self.errors.push(e);
        }
        if let Some(c) = sc.header_comment {
            node.comment = Some(c.text);
        }
        node.value = Some(CstValue::Scalar(CstScalar {
            style,
            value: sc.value,
        }));
    }

    /// Whether the byte `offset` past the cursor ends a token (blank, line
    /// break, or end of input).
    fn boundary_after(&self, offset: usize) -> bool {
        matches!(
            self.cur.byte_at(self.cur.pos + offset),
            None | Some(b' ') | Some(b'\t') | Some(b'\n')
        )
    }

    // --- block collections --------------------------------------------------

    fn parse_block_seq(&mut self, col: usize) -> Vec<SeqEntry> {
        let mut items = Vec::new();
        loop {
            // Cursor at a `-` at `col`.
            self.cur.bump();
            let mut value = None;
            while matches!(self.cur.peek(), Some(b' ') | Some(b'\t')) {
                self.cur.bump();
            }
            match self.cur.peek() {
                None | Some(b'\n') | Some(b'#') => {
                    let save = self.save();
                    let landing = self.advance_to_content();
                    if !landing.at_end
                        && !landing.is_marker
                        && (landing.col > col
                            || (landing.col == col && self.at_seq_entry()))
                    {
                        if landing.col == col {
                            // The next `-` is a sibling, not a child.
                            self.restore(save);
                        } else {
                            value = Some(self.parse_node(col as i32, false));
                        }
                    } else {
                        self.restore(save);
                    }
                }
                _ => {
                    value = Some(self.parse_node(col as i32, false));
                }
            }
            items.push(SeqEntry { indent: col, value });

            let landing = self.advance_to_content();
            if landing.at_end || landing.is_marker || landing.col < col {
                break;
            }
            if landing.col == col {
                if self.at_seq_entry() {
                    continue;
                }
                break;
            }
            // More indented than the collection: misaligned item.
            let stray = self.parse_node(col as i32, false);
            self.errors.push(YamlError::semantic(
                NodeType::BlockSeq,
                stray.range,
                "All collection items must start at the same column",
            ));
            items.push(SeqEntry {
                indent: landing.col,
                value: Some(stray),
            });
        }
        items
    }

    fn at_seq_entry(&self) -> bool {
        self.cur.peek() == Some(b'-') && self.boundary_after(1)
    }

    fn parse_block_map(
        &mut self,
        col: usize,
        floor: i32,
        mut first: Option<CstNode>,
    ) -> Vec<MapEntry> {
        let mut items = Vec::new();
        loop {
            let iter_start = self.cur.pos;
            let mut explicit = false;
            let mut key: Option<CstNode>;
            let mut has_colon = false;

            if let Some(k) = first.take() {
                // The caller already parsed the key and saw the `:`.
                key = Some(k);
            } else if self.cur.peek() == Some(b'?') && self.boundary_after(1) {
                explicit = true;
                self.cur.bump();
                while matches!(self.cur.peek(), Some(b' ') | Some(b'\t')) {
                    self.cur.bump();
                }
                key = match self.cur.peek() {
                    None | Some(b'\n') | Some(b'#') => {
                        let save = self.save();
                        let landing = self.advance_to_content();
                        if !landing.at_end && !landing.is_marker && landing.col > col {
                            Some(self.parse_node(col as i32, false))
                        } else {
                            self.restore(save);
                            None
                        }
                    }
                    _ => Some(self.parse_node(col as i32, false)),
                };
                // The matching `:` sits on a following line at the item column.
                let save = self.save();
                let landing = self.advance_to_content();
                if !landing.at_end
                    && !landing.is_marker
                    && landing.col == col
                    && self.cur.peek() == Some(b':')
                    && self.boundary_after(1)
                {
                    // Fall through to the value below.
                } else {
                    self.restore(save);
                    items.push(MapEntry {
                        indent: col,
                        explicit,
                        key,
                        value: None,
                    });
                    if !self.advance_past_item(col, &mut items) {
                        break;
                    }
                    continue;
                }
            } else {
                key = Some(self.parse_inline_node(floor, false));
            }

            // Colon probe.
            while matches!(self.cur.peek(), Some(b' ') | Some(b'\t')) {
                self.cur.bump();
            }
            if self.cur.peek() == Some(b':') && self.boundary_after(1) {
                has_colon = true;
                self.cur.bump();
            }

            let mut value = None;
            if has_colon {
                while matches!(self.cur.peek(), Some(b' ') | Some(b'\t')) {
                    self.cur.bump();
                }
                match self.cur.peek() {
                    None | Some(b'\n') | Some(b'#') => {
                        if let Some(c) = self.take_trailing_comment() {
                            if let Some(k) = key.as_mut() {
                                k.comment = Some(c.text);
                            }
                        }
                        let save = self.save();
                        let landing = self.advance_to_content();
                        if !landing.at_end && !landing.is_marker && landing.col > col {
                            value = Some(self.parse_node(col as i32, false));
                        } else if !landing.at_end
                            && !landing.is_marker
                            && landing.col == col
                            && self.at_seq_entry()
                        {
                            // Indentless sequence as the value.
                            let v_start = self.cur.pos;
                            let seq = self.parse_block_seq(col);
                            value = Some(CstNode {
                                value: Some(CstValue::BlockSeq(seq)),
                                range: Range::new(v_start, self.cur.pos),
                                ..CstNode::default()
                            });
                        } else {
                            self.restore(save);
                        }
                    }
                    _ => {
                        value = Some(self.parse_node(col as i32, false));
                    }
                }
            } else {
                let range = key
                    .as_ref()
                    .map_or(Range::new(iter_start, iter_start + 1), |k| k.range);
                let node_type = key.as_ref().map_or(NodeType::Plain, CstNode::node_type);
                self.errors.push(YamlError::semantic(
                    node_type,
                    range,
                    "Implicit map keys need to be followed by map values",
                ));
            }
            items.push(MapEntry {
                indent: col,
                explicit,
                key,
                value,
            });

            // Guard against a stalled iteration.
            if self.cur.pos == iter_start && !self.cur.at_end() {
                self.cur.bump();
            }
            if !self.advance_past_item(col, &mut items) {
                break;
            }
        }
        items
    }

    /// Position at the next item of a block map at `col`. Returns false when
    /// the map ends. Misaligned deeper content is consumed as a keyless item
    /// with an error.
    fn advance_past_item(&mut self, col: usize, items: &mut Vec<MapEntry>) -> bool {
        loop {
            let landing = self.advance_to_content();
            if landing.at_end || landing.is_marker || landing.col < col {
                return false;
            }
            if landing.col == col {
                // A sequence entry at the key column ends the map.
                return !self.at_seq_entry();
            }
            let stray = self.parse_node(col as i32, false);
            self.errors.push(YamlError::semantic(
                NodeType::BlockMap,
                stray.range,
                "All collection items must start at the same column",
            ));
            items.push(MapEntry {
                indent: landing.col,
                explicit: false,
                key: None,
                value: Some(stray),
            });
        }
    }

    // --- flow collections ---------------------------------------------------

    fn parse_flow_collection(&mut self, is_map: bool) -> Vec<FlowEntry> {
        let (close, node_type, what, end_char) = if is_map {
            (b'}', NodeType::FlowMap, "flow map", "}")
        } else {
            (b']', NodeType::FlowSeq, "flow sequence", "]")
        };
        self.cur.bump(); // '[' or '{'
        let mut items = Vec::new();
        let mut after_comma: Option<Range> = None;
        loop {
            let landing = self.advance_to_content_with(true);
            if landing.at_end || landing.is_marker {
                self.errors.push(YamlError::semantic(
                    node_type,
                    Range::new(self.cur.pos, self.cur.pos + 1),
                    format!("Expected {what} to end with {end_char}"),
                ));
                break;
            }
            match self.cur.peek() {
                Some(b) if b == close => {
                    if let Some(range) = after_comma {
                        self.errors.push(YamlError::syntax(
                            node_type,
                            range,
                            format!("Unexpected , in {what}"),
                        ));
                    }
                    self.cur.bump();
                    break;
                }
                Some(b',') => {
                    self.errors.push(YamlError::syntax(
                        node_type,
                        Range::new(self.cur.pos, self.cur.pos + 1),
                        format!("Unexpected , in {what}"),
                    ));
                    self.cur.bump();
                    after_comma = None;
                }
                _ => {
                    after_comma = None;
                    if self.cur.peek() == Some(b'?') && self.flow_boundary_after(1) {
                        self.cur.bump();
                        self.advance_to_content_with(true);
                    }
                    let entry = self.parse_flow_entry(is_map, close);
                    items.push(entry);
                    self.advance_to_content_with(true);
                    match self.cur.peek() {
                        Some(b',') => {
                            after_comma = Some(Range::new(self.cur.pos, self.cur.pos + 1));
                            self.cur.bump();
                        }
                        Some(b) if b == close => {
                            self.cur.bump();
                            return items;
                        }
                        None => {
                            self.errors.push(YamlError::semantic(
                                node_type,
                                Range::new(self.cur.pos, self.cur.pos + 1),
                                format!("Expected {what} to end with {end_char}"),
                            ));
                            return items;
                        }
                        _ => {
                            self.errors.push(YamlError::syntax(
                                node_type,
                                Range::new(self.cur.pos, self.cur.pos + 1),
                                format!("Expected , or {end_char} in {what}"),
                            ));
                            self.cur.bump();
                        }
                    }
                }
            }
        }
        items
    }

    fn flow_boundary_after(&self, offset: usize) -> bool {
        matches!(
            self.cur.byte_at(self.cur.pos + offset),
            None | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b',') | Some(b'[') | Some(b']')
                | Some(b'{') | Some(b'}')
        )
    }

    fn parse_flow_entry(&mut self, is_map: bool, close: u8) -> FlowEntry {
        let first = self.parse_node(0, true);
        let first_is_json = matches!(
            first.value,
            Some(CstValue::Scalar(CstScalar {
                style: ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted,
                ..
            })) | Some(CstValue::FlowMap(_))
                | Some(CstValue::FlowSeq(_))
        );
        self.advance_to_content_with(true);
        if self.cur.peek() == Some(b':') && (self.flow_boundary_after(1) || first_is_json) {
            self.cur.bump();
            self.advance_to_content_with(true);
            let value = match self.cur.peek() {
                Some(b',') => None,
                Some(b) if b == close => None,
                None => None,
                _ => Some(self.parse_node(0, true)),
            };
            FlowEntry {
                key: Some(first),
                value,
            }
        } else if is_map {
            FlowEntry {
                key: Some(first),
                value: None,
            }
        } else {
            FlowEntry {
                key: None,
                value: Some(first),
            }
        }
    }
}
