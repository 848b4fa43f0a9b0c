//! Resumable, character-level tokenizer.
//!
//! Holds the whole (already-decoded) document as a byte buffer plus a
//! cursor, in the style of the donor's tag processor, but emits discrete
//! [`RawToken`]s through a pull-style `next_token` rather than mutating
//! lazily-applied edit state.

use html_char_refs::HtmlContext;
use log::{trace, warn};

use crate::element_table::{self, SpecialContent};
use crate::error::ScannerWarning;
use crate::events::{Attribute, DoctypeInfo, RawToken};
use crate::location::{Location, Span};
use crate::tag_name::TagName;
use crate::{strcspn, strspn};

fn strpos(s: &[u8], pattern: &[u8], offset: usize) -> Option<usize> {
    if offset > s.len() {
        return None;
    }
    memchr::memmem::find(&s[offset..], pattern).map(|p| p + offset)
}

fn stripos(s: &[u8], pattern: &[u8], offset: usize) -> Option<usize> {
    if offset > s.len() {
        return None;
    }
    let lower_s = s[offset..].to_ascii_lowercase();
    let lower_p = pattern.to_ascii_lowercase();
    memchr::memmem::find(&lower_s, &lower_p).map(|p| p + offset)
}

struct PendingSpecial {
    name: TagName,
    content: SpecialContent,
}

pub struct Scanner {
    source: Box<[u8]>,
    pos: usize,
    loc: Location,
    pending_special: Option<PendingSpecial>,
    /// A token already decided but held back because the text preceding it
    /// had to be flushed first; returned on the following `next_token` call.
    pending_token: Option<RawToken>,
    done: bool,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.as_bytes().into(),
            pos: 0,
            loc: Location::start(),
            pending_special: None,
            pending_token: None,
            done: false,
        }
    }

    /// Returns to the beginning of the document, discarding any in-progress
    /// special-content tracking. The scanner carries no state beyond the
    /// cursor, so this is a cheap, fully idempotent reset.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.loc = Location::start();
        self.pending_special = None;
        self.pending_token = None;
        self.done = false;
    }

    pub fn location(&self) -> Location {
        self.loc
    }

    fn advance_to(&mut self, new_pos: usize) {
        self.advance_from_to(self.pos, new_pos);
    }

    /// Like `advance_to`, but counts consumed bytes from `from` rather than
    /// from `self.pos`. Needed where a tag's name/attributes were scanned by
    /// directly advancing `self.pos` (see `scan_markup`'s tag-name branch)
    /// without passing through `advance_to` for every intermediate step;
    /// `from` is the last position location bookkeeping was synced to.
    fn advance_from_to(&mut self, from: usize, new_pos: usize) {
        debug_assert!(new_pos >= from);
        let consumed = &self.source[from..new_pos];
        self.loc.advance(consumed);
        self.pos = new_pos;
    }

    /// Pulls the next token, or `RawToken::Eof` once the document (and any
    /// trailing special content) has been fully consumed. Safe to call
    /// repeatedly past end-of-document.
    pub fn next_token(&mut self, warnings: &mut Vec<ScannerWarning>) -> RawToken {
        if let Some(token) = self.pending_token.take() {
            return token;
        }

        if self.done {
            return RawToken::Eof {
                span: Span::new(self.loc, self.loc),
            };
        }

        if let Some(special) = self.pending_special.take() {
            if let Some(token) = self.scan_special_content(&special, warnings) {
                return token;
            }
        }

        self.scan_next(warnings)
    }

    fn scan_special_content(
        &mut self,
        special: &PendingSpecial,
        warnings: &mut Vec<ScannerWarning>,
    ) -> Option<RawToken> {
        let len = self.source.len();

        if special.content == SpecialContent::Plaintext {
            if self.pos >= len {
                self.done = true;
                return None;
            }
            let start = self.pos;
            let begin_loc = self.loc;
            self.advance_to(len);
            self.done = true;
            return Some(RawToken::Text {
                span: Span::new(begin_loc, self.loc),
                text: String::from_utf8_lossy(&self.source[start..len]).into(),
            });
        }

        let close_at = match special.content {
            SpecialContent::ScriptData => find_script_data_end(&self.source, self.pos),
            SpecialContent::RcData | SpecialContent::RawText => {
                find_rawtext_end(&self.source, self.pos, &special.name)
            }
            SpecialContent::None | SpecialContent::Cdata => self.pos,
        };

        if close_at > self.pos {
            let start = self.pos;
            let begin_loc = self.loc;
            self.advance_to(close_at);
            let raw = &self.source[start..close_at];
            let text = if special.content == SpecialContent::RcData {
                html_char_refs::decode(&HtmlContext::BodyText, raw)
            } else {
                raw.into()
            };
            warn_if_unterminated(close_at, len, warnings);
            return Some(RawToken::Text {
                span: Span::new(begin_loc, self.loc),
                text: String::from_utf8_lossy(&text).into(),
            });
        }

        if close_at >= len {
            self.advance_to(len);
            self.done = true;
        }

        None
    }

    /// Scans forward from the cursor to the next token. Literal text may be
    /// interrupted by a markup-looking construct (e.g. the presumptuous
    /// `</>` tag) that turns out to produce no token of its own; rather than
    /// splitting the surrounding text at that point, the runs before and
    /// after such a dropped construct are accumulated in `chunks` and
    /// merged into one `Text` token once a real token (or EOF) is reached.
    /// A real token found after some text has accumulated is stashed in
    /// `pending_token` and returned on the following call.
    fn scan_next(&mut self, warnings: &mut Vec<ScannerWarning>) -> RawToken {
        let len = self.source.len();
        let was_at = self.pos;
        let begin_loc = self.loc;
        let mut chunks: Vec<(usize, usize)> = Vec::new();
        let mut chunk_start = was_at;
        let mut at = was_at;

        loop {
            if at >= len {
                if at > chunk_start {
                    chunks.push((chunk_start, at));
                }
                self.advance_to(len);
                self.done = true;
                return self.finish_text_run(chunks, begin_loc);
            }

            let next_lt = match strpos(&self.source, b"<", at) {
                Some(p) => p,
                None => {
                    chunks.push((chunk_start, len));
                    self.advance_to(len);
                    self.done = true;
                    return self.finish_text_run(chunks, begin_loc);
                }
            };
            at = next_lt;

            let next_byte = self.source.get(at + 1).copied();
            let looks_like_token_start =
                matches!(next_byte, Some(b'!' | b'/' | b'?') | Some(b'a'..=b'z') | Some(b'A'..=b'Z'));

            if !looks_like_token_start {
                at += 1;
                continue;
            }

            if at > chunk_start {
                chunks.push((chunk_start, at));
            }
            self.advance_to(at);
            let chunk_end_loc = self.loc;

            match self.scan_markup(at, warnings) {
                Some(token) => {
                    if chunks.is_empty() {
                        return token;
                    }
                    self.pending_token = Some(token);
                    let text = build_text(&self.source, &chunks);
                    return RawToken::Text {
                        span: Span::new(begin_loc, chunk_end_loc),
                        text,
                    };
                }
                None => {
                    // Dropped construct (e.g. `</>`); its bytes are already
                    // consumed via `self.pos` but excluded from `chunks`.
                    chunk_start = self.pos;
                    at = self.pos;
                }
            }
        }
    }

    fn finish_text_run(
        &mut self,
        chunks: Vec<(usize, usize)>,
        begin_loc: Location,
    ) -> RawToken {
        if chunks.is_empty() {
            return RawToken::Eof {
                span: Span::new(self.loc, self.loc),
            };
        }
        self.pending_token = Some(RawToken::Eof {
            span: Span::new(self.loc, self.loc),
        });
        RawToken::Text {
            span: Span::new(begin_loc, self.loc),
            text: build_text(&self.source, &chunks),
        }
    }

    /// Parses whatever markup construct starts at `at` (which is `self.pos`
    /// and a `<`). Returns `None` for constructs that don't produce a token
    /// of their own (the presumptuous empty tag), having already advanced
    /// `self.pos` past them.
    fn scan_markup(&mut self, at: usize, warnings: &mut Vec<ScannerWarning>) -> Option<RawToken> {
        let len = self.source.len();
        let entry_loc = self.loc;
        let is_closing = self.source.get(at + 1) == Some(&b'/');
        let name_at = if is_closing { at + 2 } else { at + 1 };

        if at + 1 >= len {
            self.advance_to(len);
            self.done = true;
            return Some(RawToken::Eof {
                span: Span::new(self.loc, self.loc),
            });
        }

        // `<!...` markup declarations: comments, DOCTYPE, CDATA, bogus comment.
        if !is_closing && self.source[at + 1] == b'!' {
            return Some(self.scan_markup_declaration(at, warnings));
        }

        // `</>` presumptuous tag: ignored entirely, no token emitted.
        if self.source.get(at + 1) == Some(&b'>') {
            push_warning(warnings, ScannerWarning::PresumptuousTag);
            self.advance_to(at + 2);
            return None;
        }
        if is_closing && self.source.get(at + 2) == Some(&b'>') {
            push_warning(warnings, ScannerWarning::PresumptuousTag);
            self.advance_to(at + 3);
            return None;
        }

        // `<?...>` bogus comment / processing-instruction lookalike.
        if !is_closing && self.source.get(at + 1) == Some(&b'?') {
            return Some(self.scan_pi_lookalike(at, warnings));
        }

        let name_prefix_len = strspn!(self.source, b'a'..=b'z' | b'A'..=b'Z', name_at);
        if name_prefix_len == 0 {
            // Non-alpha first character of a closing tag name: a "funky comment".
            if is_closing {
                return Some(self.scan_funky_comment(at, warnings));
            }
            // Shouldn't normally happen for start tags given the caller's
            // pre-check, but fall back to plain text defensively.
            self.advance_to(at + 1);
            return Some(RawToken::Text {
                span: Span::new(entry_loc, self.loc),
                text: "<".into(),
            });
        }

        let name_len = name_prefix_len
            + strcspn!(
                self.source,
                b' ' | b'\t' | 0x0c | b'\r' | b'\n' | b'/' | b'>',
                name_at + name_prefix_len
            );
        let name = TagName::from(&self.source[name_at..name_at + name_len]);
        let raw_name: Box<str> =
            String::from_utf8_lossy(&self.source[name_at..name_at + name_len]).into();

        self.pos = name_at + name_len;
        let attributes = if is_closing {
            // Closing tags may carry (and ignore) attribute-like junk before `>`.
            while self.parse_one_attribute(warnings).is_some() {}
            Vec::new()
        } else {
            self.parse_attributes(warnings)
        };

        let self_closing = !is_closing && self.skip_to_tag_close();
        let tag_end = self.pos;
        self.advance_from_to(at, tag_end);
        warn_if_unterminated(tag_end, len, warnings);

        let span = Span::new(entry_loc, self.loc);
        if is_closing {
            Some(RawToken::EndTag { span, name })
        } else {
            let descriptor = element_table::descriptor_for(&name);
            if descriptor.special_content != SpecialContent::None {
                trace!(
                    "entering {:?} content for <{}>",
                    descriptor.special_content,
                    name
                );
                self.pending_special = Some(PendingSpecial {
                    name: name.clone(),
                    content: descriptor.special_content,
                });
            }
            Some(RawToken::StartTag {
                span,
                name,
                raw_name,
                attributes,
                self_closing,
            })
        }
    }

    fn scan_markup_declaration(&mut self, at: usize, warnings: &mut Vec<ScannerWarning>) -> RawToken {
        let len = self.source.len();
        let entry_loc = self.loc;

        if self.source.len() > at + 4 && &self.source[at + 2..at + 4] == b"--" {
            return self.scan_comment(at, warnings);
        }

        if len > at + 8 && self.source[at + 2..at + 9].eq_ignore_ascii_case(b"DOCTYPE") {
            let closer = strpos(&self.source, b">", at + 9).unwrap_or(len);
            self.advance_to((closer + 1).min(len));
            warn_if_unterminated(closer, len, warnings);
            let span = Span::new(entry_loc, self.loc);
            let info = parse_doctype(span.slice(&self.source));
            return RawToken::Doctype { span, info };
        }

        if len > at + 8 && &self.source[at + 2..at + 9] == b"[CDATA[" {
            if let Some(closer) = strpos(&self.source, b"]]>", at + 9) {
                self.advance_to(closer + 3);
                let span = Span::new(entry_loc, self.loc);
                let text = String::from_utf8_lossy(&self.source[at + 9..closer]).into();
                return RawToken::CData { span, text };
            }
        }

        // Anything else is a bogus comment: scan to the nearest `>`.
        let closer = strpos(&self.source, b">", at + 1).unwrap_or(len);
        self.advance_to((closer + 1).min(len));
        push_warning(warnings, ScannerWarning::BogusComment);
        warn_if_unterminated(closer, len, warnings);
        let span = Span::new(entry_loc, self.loc);
        let text = String::from_utf8_lossy(&self.source[at + 2..closer.min(len)]).into();
        RawToken::Comment { span, text }
    }

    fn scan_comment(&mut self, at: usize, warnings: &mut Vec<ScannerWarning>) -> RawToken {
        let len = self.source.len();
        let entry_loc = self.loc;
        let mut closer_at = at + 4;

        if len <= closer_at {
            self.advance_to(len);
            self.done = true;
            push_warning(warnings, ScannerWarning::UnterminatedTag);
            let span = Span::new(entry_loc, self.loc);
            let text = String::from_utf8_lossy(&self.source[(at + 4).min(len)..len]).into();
            return RawToken::Comment { span, text };
        }

        let dashes = strspn!(self.source, b'-', closer_at);
        if self.source.get(closer_at + dashes) == Some(&b'>') {
            self.advance_to(closer_at + dashes + 1);
            push_warning(warnings, ScannerWarning::AbruptlyClosedComment);
            let span = Span::new(entry_loc, self.loc);
            let text = if dashes >= 2 {
                String::from_utf8_lossy(&self.source[at + 4..closer_at + dashes - 2]).into()
            } else {
                String::new().into_boxed_str()
            };
            return RawToken::Comment { span, text };
        }

        loop {
            closer_at += 1;
            if closer_at >= len {
                self.advance_to(len);
                self.done = true;
                push_warning(warnings, ScannerWarning::UnterminatedTag);
                let span = Span::new(entry_loc, self.loc);
                let text = String::from_utf8_lossy(&self.source[at + 4..len]).into();
                return RawToken::Comment { span, text };
            }
            let Some(next_closer) = strpos(&self.source, b"--", closer_at) else {
                self.advance_to(len);
                self.done = true;
                push_warning(warnings, ScannerWarning::UnterminatedTag);
                let span = Span::new(entry_loc, self.loc);
                let text = String::from_utf8_lossy(&self.source[at + 4..len]).into();
                return RawToken::Comment { span, text };
            };
            closer_at = next_closer;

            if self.source.get(closer_at + 2) == Some(&b'>') {
                self.advance_to(closer_at + 3);
                let span = Span::new(entry_loc, self.loc);
                let text = String::from_utf8_lossy(&self.source[at + 4..closer_at]).into();
                return RawToken::Comment { span, text };
            }

            if self.source.get(closer_at + 2) == Some(&b'!') && self.source.get(closer_at + 3) == Some(&b'>') {
                self.advance_to(closer_at + 4);
                push_warning(warnings, ScannerWarning::BogusComment);
                let span = Span::new(entry_loc, self.loc);
                let text = String::from_utf8_lossy(&self.source[at + 4..closer_at]).into();
                return RawToken::Comment { span, text };
            }
        }
    }

    fn scan_pi_lookalike(&mut self, at: usize, warnings: &mut Vec<ScannerWarning>) -> RawToken {
        let len = self.source.len();
        let entry_loc = self.loc;
        let closer = strpos(&self.source, b">", at + 2).unwrap_or(len);
        self.advance_to((closer + 1).min(len));
        warn_if_unterminated(closer, len, warnings);

        let span = Span::new(entry_loc, self.loc);
        let inner = &self.source[(at + 2).min(len)..closer.min(len)];

        let target_len = strspn!(inner, b'a'..=b'z' | b'A'..=b'Z' | b':' | b'_', 0);
        if target_len > 0 {
            let target_len = target_len
                + strspn!(inner, b'a'..=b'z' | b'A'..=b'Z' | b':' | b'_' | b'-' | b'.', target_len);
            let target = String::from_utf8_lossy(&inner[..target_len]).into_owned();
            let data_start = target_len + (inner.len() > target_len && inner[target_len] == b' ') as usize;
            let data = String::from_utf8_lossy(&inner[data_start.min(inner.len())..]).into();
            if target.eq_ignore_ascii_case("xml") {
                return RawToken::XmlDecl { span, text: data };
            }
            return RawToken::ProcessingInstruction {
                span,
                target: target.into_boxed_str(),
                data,
            };
        }

        push_warning(warnings, ScannerWarning::BogusComment);
        let text = String::from_utf8_lossy(inner).into();
        RawToken::Comment { span, text }
    }

    fn scan_funky_comment(&mut self, at: usize, warnings: &mut Vec<ScannerWarning>) -> RawToken {
        let len = self.source.len();
        let entry_loc = self.loc;
        let closer = strpos(&self.source, b">", at + 2).unwrap_or(len);
        self.advance_to((closer + 1).min(len));
        push_warning(warnings, ScannerWarning::FunkyComment);
        warn_if_unterminated(closer, len, warnings);
        let span = Span::new(entry_loc, self.loc);
        let text = String::from_utf8_lossy(&self.source[(at + 2).min(len)..closer.min(len)]).into();
        RawToken::Comment { span, text }
    }

    /// Advances past whitespace and an optional trailing `/`, then past
    /// `>`, reporting whether the tag was self-closed via `/>`.
    fn skip_to_tag_close(&mut self) -> bool {
        let len = self.source.len();
        self.pos += strspn!(self.source, b' ' | b'\t' | 0x0c | b'\r' | b'\n', self.pos);

        let mut self_closing = false;
        if self.pos < len && self.source[self.pos] == b'/' {
            self_closing = true;
            self.pos += 1;
            self.pos += strspn!(self.source, b' ' | b'\t' | 0x0c | b'\r' | b'\n', self.pos);
        }

        if self.pos < len && self.source[self.pos] == b'>' {
            self.pos += 1;
        } else {
            self.pos = strpos(&self.source, b">", self.pos).map(|p| p + 1).unwrap_or(len);
        }

        self_closing
    }

    fn parse_attributes(&mut self, warnings: &mut Vec<ScannerWarning>) -> Vec<Attribute> {
        let mut attributes: Vec<Attribute> = Vec::new();
        while let Some(attr) = self.parse_one_attribute(warnings) {
            if attributes.iter().any(|a: &Attribute| a.raw_name == attr.raw_name) {
                push_warning(
                    warnings,
                    ScannerWarning::DuplicateAttribute {
                        name: attr.raw_name.clone(),
                    },
                );
                continue;
            }
            attributes.push(attr);
        }
        attributes
    }

    fn parse_one_attribute(&mut self, _warnings: &mut [ScannerWarning]) -> Option<Attribute> {
        let len = self.source.len();
        self.pos += strspn!(self.source, b' ' | b'\t' | 0x0c | b'\r' | b'\n' | b'/', self.pos);
        if self.pos >= len || self.source[self.pos] == b'>' {
            return None;
        }

        let starts_with_equal = self.source[self.pos] == b'=';
        let shift = if starts_with_equal { 1 } else { 0 };
        let name_len = shift
            + strcspn!(
                self.source,
                b'=' | b'/' | b'>' | b' ' | b'\t' | 0x0c | b'\r' | b'\n',
                self.pos + shift
            );

        if name_len == 0 {
            return None;
        }

        let name_start = self.pos;
        self.pos += name_len;
        let raw_name = String::from_utf8_lossy(&self.source[name_start..self.pos]).into_owned();

        self.pos += strspn!(self.source, b' ' | b'\t' | 0x0c | b'\r' | b'\n', self.pos);

        let has_value = self.pos < len && self.source[self.pos] == b'=';
        let (value_bytes, non_normalized): (Box<[u8]>, Box<[u8]>) = if has_value {
            self.pos += 1;
            self.pos += strspn!(self.source, b' ' | b'\t' | 0x0c | b'\r' | b'\n', self.pos);
            if self.pos >= len {
                (Box::new([]), Box::new([]))
            } else {
                match self.source[self.pos] {
                    quote @ (b'\'' | b'"') => {
                        let value_start = self.pos + 1;
                        let end_quote = strpos(&self.source, &[quote], value_start).unwrap_or(len);
                        let raw = &self.source[value_start..end_quote];
                        self.pos = (end_quote + 1).min(len);
                        (raw.into(), raw.into())
                    }
                    _ => {
                        let value_start = self.pos;
                        let value_len =
                            strcspn!(self.source, b'>' | b' ' | b'\t' | 0x0c | b'\r' | b'\n', value_start);
                        let raw = &self.source[value_start..value_start + value_len];
                        self.pos = value_start + value_len;
                        (raw.into(), raw.into())
                    }
                }
            }
        } else {
            (Box::new([]), Box::new([]))
        };

        let decoded = html_char_refs::decode(&HtmlContext::Attribute, &value_bytes);

        Some(Attribute {
            raw_name: raw_name.clone().into_boxed_str(),
            prefix: None,
            local: raw_name.into_boxed_str(),
            namespace_uri: None,
            value: String::from_utf8_lossy(&decoded).into(),
            non_normalized_value: String::from_utf8_lossy(&non_normalized).into(),
            specified: true,
        })
    }
}

/// Decodes character references in ordinary body text. RCData, RawText and
/// Plaintext content modes bypass this: RawText/Plaintext never resolve
/// entities, RCData resolves them itself in `scan_special_content`.
fn decode_text(raw: &[u8]) -> Box<str> {
    let decoded = html_char_refs::decode(&HtmlContext::BodyText, raw);
    String::from_utf8_lossy(&decoded).into()
}

/// Concatenates and entity-decodes possibly-disjoint byte ranges into a
/// single text run (see `Scanner::scan_next`'s `chunks` accumulator).
fn build_text(source: &[u8], chunks: &[(usize, usize)]) -> Box<str> {
    if let [(start, end)] = chunks {
        return decode_text(&source[*start..*end]);
    }
    let mut out = String::new();
    for &(start, end) in chunks {
        out.push_str(&decode_text(&source[start..end]));
    }
    out.into_boxed_str()
}

fn warn_if_unterminated(closer_pos: usize, doc_len: usize, warnings: &mut Vec<ScannerWarning>) {
    if closer_pos >= doc_len {
        push_warning(warnings, ScannerWarning::UnterminatedTag);
    }
}

fn push_warning(warnings: &mut Vec<ScannerWarning>, warning: ScannerWarning) {
    warn!("{warning}");
    warnings.push(warning);
}

/// Finds where a RCDATA/RAWTEXT region ends: the byte offset of the `<` that
/// begins a matching, properly-terminated closing tag, or the end of the
/// document if none is found.
fn find_rawtext_end(source: &[u8], from: usize, tag_name: &TagName) -> usize {
    let needle = format!("</{}", tag_name.as_str());
    let mut at = from;
    let len = source.len();

    while at < len {
        let Some(candidate) = stripos(source, needle.as_bytes(), at) else {
            return len;
        };
        let after = candidate + needle.len();
        if after >= len
            || matches!(
                source[after],
                b' ' | b'\t' | b'\r' | b'\n' | b'/' | b'>'
            )
        {
            return candidate;
        }
        at = candidate + 1;
    }

    len
}

/// Finds where script data ends, honoring the escape / double-escape dance:
/// `<!--` (while unescaped) opens escaped mode, `-->` always closes back to
/// unescaped, and a bare (non-`</`) `<script` while escaped opens
/// double-escaped mode (closed again by `</script`).
fn find_script_data_end(source: &[u8], from: usize) -> usize {
    #[derive(PartialEq, Clone, Copy)]
    enum State {
        Unescaped,
        Escaped,
        DoubleEscaped,
    }

    let len = source.len();
    let mut state = State::Unescaped;
    let mut at = from;

    while at < len {
        at += strcspn!(source, b'-' | b'<', at);

        if at + 2 < len && &source[at..at + 3] == b"-->" {
            at += 3;
            state = State::Unescaped;
            continue;
        }

        if at >= len || source[at] != b'<' {
            at += 1;
            continue;
        }

        if at + 3 < len && &source[at + 1..at + 4] == b"!--" {
            at += 4;
            if state == State::Unescaped {
                state = State::Escaped;
            }
            continue;
        }

        let is_closing = source.get(at + 1) == Some(&b'/');
        let name_at = if is_closing { at + 2 } else { at + 1 };

        if name_at + 6 > len || !source[name_at..name_at + 6].eq_ignore_ascii_case(b"script") {
            at += 1;
            continue;
        }

        let after = name_at + 6;
        if after >= len
            || !matches!(source[after], b' ' | b'\t' | b'\r' | b'\n' | b'/' | b'>')
        {
            at += 1;
            continue;
        }

        match (state, is_closing) {
            (State::Escaped, false) => {
                state = State::DoubleEscaped;
                at = after;
            }
            (State::DoubleEscaped, true) => {
                state = State::Escaped;
                at = after;
            }
            (_, true) => return at,
            _ => at = after,
        }
    }

    len
}

fn parse_doctype(doctype_html: &[u8]) -> DoctypeInfo {
    let mut info = DoctypeInfo::default();

    if doctype_html.len() < 10 || !doctype_html[0..9].eq_ignore_ascii_case(b"<!DOCTYPE") {
        info.force_quirks = true;
        return info;
    }

    let end = doctype_html.len() - 1;
    let mut at = 9;

    at += strspn!(doctype_html, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at, end - at);
    if at >= end {
        info.force_quirks = true;
        return info;
    }

    let name_len = strcspn!(doctype_html, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at, end - at);
    info.name = Some(
        String::from_utf8_lossy(&doctype_html[at..at + name_len].to_ascii_lowercase())
            .into_owned()
            .into_boxed_str(),
    );
    at += name_len;
    at += strspn!(doctype_html, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at, end - at);
    if at >= end {
        return info;
    }

    if at + 6 >= end {
        info.force_quirks = true;
        return info;
    }

    enum Next {
        Public,
        System,
    }

    let next = if doctype_html[at..at + 6].eq_ignore_ascii_case(b"PUBLIC") {
        at += 6;
        at += strspn!(doctype_html, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at, end - at);
        if at >= end {
            info.force_quirks = true;
            return info;
        }
        Next::Public
    } else if doctype_html[at..at + 6].eq_ignore_ascii_case(b"SYSTEM") {
        at += 6;
        at += strspn!(doctype_html, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at, end - at);
        if at >= end {
            info.force_quirks = true;
            return info;
        }
        Next::System
    } else {
        info.force_quirks = true;
        return info;
    };

    if matches!(next, Next::Public) {
        let closer_quote = doctype_html[at];
        if closer_quote != b'"' && closer_quote != b'\'' {
            info.force_quirks = true;
            return info;
        }
        at += 1;
        let id_len = strcspn!(doctype_html, x if x == closer_quote, at, end - at);
        info.public_id = Some(String::from_utf8_lossy(&doctype_html[at..at + id_len]).into());
        at += id_len;
        if at >= end || doctype_html[at] != closer_quote {
            info.force_quirks = true;
            return info;
        }
        at += 1;
        at += strspn!(doctype_html, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at, end - at);
        if at >= end {
            return info;
        }
    }

    let closer_quote = doctype_html[at];
    if closer_quote != b'"' && closer_quote != b'\'' {
        info.force_quirks = true;
        return info;
    }
    at += 1;
    let id_len = strcspn!(doctype_html, x if x == closer_quote, at, end - at);
    info.system_id = Some(String::from_utf8_lossy(&doctype_html[at..at + id_len]).into());
    at += id_len;
    if at >= end || doctype_html[at] != closer_quote {
        info.force_quirks = true;
    }

    info
}
