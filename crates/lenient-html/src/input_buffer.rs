//! Encoding resolution and decode-to-UTF-8 for raw document bytes.
//!
//! Follows a deterministic, non-confidence-weighted priority order: BOM,
//! then an explicit caller-supplied encoding hint, then an in-document
//! declaration found within the prolog window, then an HTTP `Content-Type`
//! charset parameter, then a default of Windows-1252.

use encoding_rs::Encoding;

/// How many leading bytes of the raw document are scanned for an in-document
/// encoding declaration (`<meta charset>` or `<?xml ... encoding="...">`).
/// Matches the byte window browsers use for the same sniff.
pub const PROLOG_WINDOW_BYTES: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingSource {
    Bom,
    Caller,
    DocumentDeclaration,
    HttpContentType,
    Default,
}

pub struct DecodeResult {
    pub text: Box<str>,
    pub encoding: &'static Encoding,
    pub source: EncodingSource,
}

/// One entry of the "evaluate input source" stack: a nested document (e.g.
/// an `<iframe srcdoc>` payload) being parsed with its own encoding context,
/// pushed and popped around the nested parse.
pub struct SourceFrame {
    pub encoding: &'static Encoding,
    pub source: EncodingSource,
}

#[derive(Default)]
pub struct InputBuffer {
    stack: Vec<SourceFrame>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push_source(&mut self, frame: SourceFrame) {
        self.stack.push(frame);
    }

    pub fn pop_source(&mut self) -> Option<SourceFrame> {
        self.stack.pop()
    }

    pub fn current_source(&self) -> Option<&SourceFrame> {
        self.stack.last()
    }
}

/// Decodes `raw` to UTF-8, resolving its encoding per the priority order
/// above. `http_content_type` is the `Content-Type` header value, if any,
/// from the transport layer that delivered `raw`.
pub fn decode(raw: &[u8], http_content_type: Option<&str>) -> DecodeResult {
    decode_with_hint(raw, None, http_content_type)
}

/// Like [`decode`], but `caller_encoding` (e.g. a label supplied directly by
/// the embedder rather than sniffed from the transport or the document
/// itself) wins over everything except a BOM, which always wins since it is
/// unambiguous about the bytes that actually follow it.
pub fn decode_with_hint(
    raw: &[u8],
    caller_encoding: Option<&str>,
    http_content_type: Option<&str>,
) -> DecodeResult {
    if let Some((encoding, bom_len)) = Encoding::for_bom(raw) {
        let (text, _, _) = encoding.decode(&raw[bom_len..]);
        return DecodeResult {
            text: text.into_owned().into_boxed_str(),
            encoding,
            source: EncodingSource::Bom,
        };
    }

    if let Some(encoding) = caller_encoding.and_then(|label| Encoding::for_label(label.as_bytes())) {
        let (text, _, _) = encoding.decode(raw);
        return DecodeResult {
            text: text.into_owned().into_boxed_str(),
            encoding,
            source: EncodingSource::Caller,
        };
    }

    let window = &raw[..raw.len().min(PROLOG_WINDOW_BYTES)];
    if let Some(encoding) = sniff_document_declaration(window) {
        let (text, _, _) = encoding.decode(raw);
        return DecodeResult {
            text: text.into_owned().into_boxed_str(),
            encoding,
            source: EncodingSource::DocumentDeclaration,
        };
    }

    if let Some(label) = http_content_type.and_then(extract_charset_param) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            let (text, _, _) = encoding.decode(raw);
            return DecodeResult {
                text: text.into_owned().into_boxed_str(),
                encoding,
                source: EncodingSource::HttpContentType,
            };
        }
    }

    // No signal at all: default to Windows-1252, the legacy fallback real
    // browsers use for unlabeled documents, rather than assuming UTF-8.
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(raw);
    DecodeResult {
        text: text.into_owned().into_boxed_str(),
        encoding: encoding_rs::WINDOWS_1252,
        source: EncodingSource::Default,
    }
}

/// Looks for `<meta charset="...">`, `<meta http-equiv=Content-Type ... charset=...>`,
/// or an XML prolog's `encoding="..."` inside the prolog window.
fn sniff_document_declaration(window: &[u8]) -> Option<&'static Encoding> {
    if let Some(pos) = find_subslice(window, b"<?xml") {
        if let Some(enc_pos) = find_subslice(&window[pos..], b"encoding") {
            let rest = &window[pos + enc_pos + "encoding".len()..];
            if let Some(label) = extract_quoted_value(rest) {
                if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
                    return Some(encoding);
                }
            }
        }
    }

    let mut at = 0;
    while let Some(meta_pos) = find_subslice(&window[at..], b"<meta") {
        let tag_start = at + meta_pos;
        let tag_end = find_subslice(&window[tag_start..], b">")
            .map(|n| tag_start + n)
            .unwrap_or(window.len());
        let tag = &window[tag_start..tag_end];

        if let Some(charset_pos) = find_subslice_ci(tag, b"charset") {
            let rest = &tag[charset_pos + "charset".len()..];
            if let Some(label) = extract_attribute_value(rest) {
                if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
                    return Some(encoding);
                }
            }
        }

        at = tag_end + 1;
        if at >= window.len() {
            break;
        }
    }

    None
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    memchr::memmem::find(haystack, needle)
}

fn find_subslice_ci(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let lower = haystack.to_ascii_lowercase();
    memchr::memmem::find(&lower, needle)
}

/// Extracts a `="value"`, `='value'`, or bare `=value` following `rest`'s
/// leading `=` (skipping intervening whitespace), as used by the XML prolog.
fn extract_quoted_value(rest: &[u8]) -> Option<String> {
    extract_attribute_value(rest)
}

/// Reads an attribute value starting after the attribute name in `rest`,
/// which begins with optional whitespace, `=`, optional whitespace, then a
/// quoted or bare value.
fn extract_attribute_value(rest: &[u8]) -> Option<String> {
    let mut i = 0;
    while i < rest.len() && rest[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= rest.len() || rest[i] != b'=' {
        return None;
    }
    i += 1;
    while i < rest.len() && rest[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= rest.len() {
        return None;
    }

    let value = match rest[i] {
        quote @ (b'"' | b'\'') => {
            let start = i + 1;
            let end = find_subslice(&rest[start..], &[quote])? + start;
            &rest[start..end]
        }
        _ => {
            let start = i;
            let len = rest[start..]
                .iter()
                .position(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
                .unwrap_or(rest.len() - start);
            &rest[start..start + len]
        }
    };

    Some(String::from_utf8_lossy(value).into_owned())
}

fn extract_charset_param(content_type: &str) -> Option<String> {
    let lower = content_type.to_ascii_lowercase();
    let pos = lower.find("charset")?;
    extract_attribute_value(content_type[pos + "charset".len()..].as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_bom_takes_precedence() {
        let raw = b"\xEF\xBB\xBFhello";
        let result = decode(raw, None);
        assert_eq!(result.source, EncodingSource::Bom);
        assert_eq!(&*result.text, "hello");
    }

    #[test]
    fn meta_charset_is_honored() {
        let raw = b"<html><head><meta charset=\"windows-1252\"></head></html>";
        let result = decode(raw, None);
        assert_eq!(result.source, EncodingSource::DocumentDeclaration);
        assert_eq!(result.encoding.name(), "windows-1252");
    }

    #[test]
    fn http_content_type_is_fallback() {
        let raw = b"<html></html>";
        let result = decode(raw, Some("text/html; charset=iso-8859-1"));
        assert_eq!(result.source, EncodingSource::HttpContentType);
    }

    #[test]
    fn defaults_to_windows_1252() {
        let raw = b"<html></html>";
        let result = decode(raw, None);
        assert_eq!(result.source, EncodingSource::Default);
        assert_eq!(result.encoding, encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn caller_encoding_hint_is_honored_absent_other_signals() {
        let raw = b"<html></html>";
        let result = decode_with_hint(raw, Some("iso-8859-7"), None);
        assert_eq!(result.source, EncodingSource::Caller);
        assert_eq!(result.encoding.name(), "ISO-8859-7");
    }

    #[test]
    fn caller_encoding_hint_wins_over_document_declaration() {
        let raw = b"<html><head><meta charset=\"iso-8859-1\"></head></html>";
        let result = decode_with_hint(raw, Some("utf-16le"), None);
        assert_eq!(result.source, EncodingSource::Caller);
        assert_eq!(result.encoding.name(), "UTF-16LE");
    }
}
