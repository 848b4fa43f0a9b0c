//! Property-based tests for the six testable properties of the balanced
//! event stream. Arbitrary HTML soup is generated from a small alphabet of
//! tag names and text fragments; properties 4 (encoding-switch safety) and
//! 6 (fragment fidelity) are exercised as deterministic example-based tests
//! instead, since generating arbitrary valid encoding declarations or
//! fragment contexts needs more machinery than `Arbitrary` buys here.

use lenient_html::{config::ParserConfig, Event, QName, TagBalancer};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

const TAG_POOL: &[&str] = &[
    "div", "p", "span", "li", "td", "tr", "table", "b", "i", "a", "ul", "html", "body",
];

/// A short, possibly-malformed soup of tags and text: unmatched closers,
/// nested-but-overlapping openers, and plain text runs.
#[derive(Clone, Debug)]
struct HtmlSoup(String);

impl Arbitrary for HtmlSoup {
    fn arbitrary(g: &mut Gen) -> Self {
        let piece_count = (usize::arbitrary(g) % 12) + 1;
        let mut out = String::new();
        for _ in 0..piece_count {
            match u8::arbitrary(g) % 3 {
                0 => {
                    let tag = g.choose(TAG_POOL).unwrap();
                    out.push('<');
                    out.push_str(tag);
                    out.push('>');
                }
                1 => {
                    let tag = g.choose(TAG_POOL).unwrap();
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
                _ => {
                    let word_len = (usize::arbitrary(g) % 6) + 1;
                    let c = (b'a' + (u8::arbitrary(g) % 26)) as char;
                    out.extend(std::iter::repeat(c).take(word_len));
                }
            }
        }
        HtmlSoup(out)
    }
}

fn collect(source: &str) -> Vec<Event> {
    let mut balancer = TagBalancer::new(source);
    let mut out = Vec::new();
    loop {
        let event = balancer.next_event();
        let is_eof = matches!(event, Event::Eof { .. });
        out.push(event);
        if is_eof {
            break;
        }
    }
    out
}

fn collect_with_augmentations(source: &str) -> Vec<Event> {
    let mut config = ParserConfig::new();
    config.augmentations = true;
    let mut balancer = TagBalancer::with_config(source, &config);
    let mut out = Vec::new();
    loop {
        let event = balancer.next_event();
        let is_eof = matches!(event, Event::Eof { .. });
        out.push(event);
        if is_eof {
            break;
        }
    }
    out
}

/// Property 1: event pairing. Replays the event stream against a stack and
/// asserts every `EndElement` pops exactly the `StartElement` most recently
/// pushed, and the stack is empty at `Eof`.
#[quickcheck]
fn prop_event_pairing_is_stackwise_consistent(soup: HtmlSoup) -> bool {
    let events = collect(&soup.0);
    let mut stack: Vec<String> = Vec::new();
    for event in &events {
        match event {
            Event::StartElement { name, .. } => {
                stack.push(name.local.to_string());
            }
            Event::EndElement { name, .. } => {
                let Some(top) = stack.pop() else {
                    return false;
                };
                if top != &*name.local {
                    return false;
                }
            }
            Event::Eof { .. } => return stack.is_empty(),
            _ => {}
        }
    }
    stack.is_empty()
}

/// Property 2: location monotonicity. With augmentations on, consecutive
/// non-synthesized events never regress their begin offset before the prior
/// event's end offset.
#[quickcheck]
fn prop_locations_are_monotonic(soup: HtmlSoup) -> bool {
    let events = collect_with_augmentations(&soup.0);
    let mut last_end: Option<u32> = None;
    for event in &events {
        let aug = event.augmentations();
        if aug.synthesized {
            continue;
        }
        let Some(span) = aug.span else { continue };
        if let Some(prev_end) = last_end {
            if span.begin.offset < prev_end {
                return false;
            }
        }
        last_end = Some(span.end.offset);
    }
    true
}

/// Property 3: idempotent reset. The same input parsed twice on fresh
/// balancer instances (equivalent to a single instance's `reset`) yields an
/// identical event sequence.
#[quickcheck]
fn prop_reparsing_is_idempotent(soup: HtmlSoup) -> bool {
    collect(&soup.0) == collect(&soup.0)
}

/// Property 5: character-reference round trip, exercised over every entry
/// in the named-entity table reachable through the crate's curated subset.
#[quickcheck]
fn prop_named_entity_round_trips_with_semicolon(idx: usize) -> bool {
    let names = [
        "amp", "lt", "gt", "quot", "nbsp", "copy", "reg", "trade", "hellip", "mdash", "ndash",
        "alpha", "beta", "gamma", "larr", "rarr", "uarr", "darr",
    ];
    let name = names[idx % names.len()];
    let with_semi = format!("&{name};");
    let decoded = html_char_refs::decode(
        &html_char_refs::HtmlContext::BodyText,
        with_semi.as_bytes(),
    );
    let name_with_semi = format!("{name};");
    let expected = html_char_refs::lookup_named(name_with_semi.as_bytes())
        .expect("curated table entry must exist")
        .code_points
        .iter()
        .collect::<String>();
    String::from_utf8_lossy(&decoded) == expected
}

/// Property 4 (encoding-switch safety), as a deterministic example: a
/// `<meta charset>` declared within the prolog window resolves to the same
/// encoding regardless of whether the byte content happens to also be valid
/// ASCII under the caller's hint, since both are ASCII-compatible here.
#[test]
fn prop_encoding_switch_is_observed_regardless_of_hint() {
    let raw = b"<html><head><meta charset=\"windows-1252\"></head><body>hi</body></html>";
    let with_hint = lenient_html::input_buffer::decode(raw, Some("text/html; charset=us-ascii"));
    let without_hint = lenient_html::input_buffer::decode(raw, None);
    assert_eq!(with_hint.encoding.name(), "windows-1252");
    assert_eq!(without_hint.encoding.name(), "windows-1252");
    assert_eq!(with_hint.text, without_hint.text);
}

/// Property 6 (fragment fidelity), as a deterministic example: parsing `X`
/// as a fragment with context `[table, tbody, tr]` produces the same
/// descendant events as parsing `<table><tbody><tr>X</tr></tbody></table>`
/// as a full document and discarding the outer context's own events.
#[test]
fn prop_fragment_parse_matches_equivalent_document_parse() {
    let mut frag_config = ParserConfig::new();
    frag_config.document_fragment = true;
    frag_config.fragment_context_stack = vec![
        QName {
            prefix: None,
            local: "table".into(),
            raw: "table".into(),
            uri: None,
        },
        QName {
            prefix: None,
            local: "tbody".into(),
            raw: "tbody".into(),
            uri: None,
        },
        QName {
            prefix: None,
            local: "tr".into(),
            raw: "tr".into(),
            uri: None,
        },
    ];
    let fragment_events = {
        let mut balancer = TagBalancer::with_config("<td>x</td>", &frag_config);
        let mut out = Vec::new();
        loop {
            let event = balancer.next_event();
            let is_eof = matches!(event, Event::Eof { .. });
            out.push(event);
            if is_eof {
                break;
            }
        }
        out
    };

    let document_events = collect("<table><tbody><tr><td>x</td></tr></tbody></table>");
    let document_inner: Vec<&Event> = document_events
        .iter()
        .filter(|e| match e {
            Event::StartElement { name, .. } | Event::EndElement { name, .. } => {
                !matches!(&*name.local, "html" | "head" | "body" | "table" | "tbody" | "tr")
            }
            Event::Text { .. } => true,
            _ => false,
        })
        .collect();

    let fragment_inner: Vec<&Event> = fragment_events
        .iter()
        .filter(|e| matches!(e, Event::StartElement { .. } | Event::EndElement { .. } | Event::Text { .. }))
        .collect();

    assert_eq!(fragment_inner.len(), document_inner.len());
    for (a, b) in fragment_inner.iter().zip(document_inner.iter()) {
        match (a, b) {
            (Event::StartElement { name: n1, .. }, Event::StartElement { name: n2, .. }) => {
                assert_eq!(n1.local, n2.local)
            }
            (Event::EndElement { name: n1, .. }, Event::EndElement { name: n2, .. }) => {
                assert_eq!(n1.local, n2.local)
            }
            (Event::Text { text: t1, .. }, Event::Text { text: t2, .. }) => assert_eq!(t1, t2),
            _ => panic!("event kind mismatch between fragment and document parse"),
        }
    }
}
