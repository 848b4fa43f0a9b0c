//! A lenient, streaming HTML scanner and tag balancer.
//!
//! The pipeline is two stages: [`Scanner`] tokenizes raw bytes into
//! [`RawToken`]s without knowing anything about tree structure, and
//! [`TagBalancer`] consumes those tokens and emits structurally balanced
//! [`Event`]s, synthesizing or ignoring tags as needed per `element_table`'s
//! per-element rules. Use [`parse_document`] / [`parse_fragment`] for the
//! common case of going straight from bytes to a [`Document`] tree, or
//! drive [`TagBalancer::next_event`] directly for a streaming consumer.

#[macro_use]
mod macros;

pub mod attributes;
pub mod config;
pub mod doc_tree;
pub mod element_table;
pub mod error;
pub mod events;
pub mod filters;
pub mod input_buffer;
pub mod location;
pub mod scanner;
pub mod tag_balancer;
pub mod tag_name;

pub use config::{NameCasePolicy, ParserConfig};
pub use doc_tree::{Document, Node, NodeData};
pub use error::{BalancerNotice, ConfigError, ParseError, ScannerWarning};
pub use events::{Attribute, DoctypeInfo, Event, QName, RawToken};
pub use filters::{Filter, FilterAction};
pub use input_buffer::{DecodeResult, EncodingSource};
pub use scanner::Scanner;
pub use tag_balancer::TagBalancer;
pub use tag_name::TagName;

/// Decodes `raw` and parses it as a full document, returning the
/// resulting tree alongside any scanner warnings and balancer notices
/// raised along the way.
pub fn parse_document(
    raw: &[u8],
    http_content_type: Option<&str>,
) -> (Document, Vec<ScannerWarning>, Vec<BalancerNotice>) {
    parse_document_with_config(raw, http_content_type, ParserConfig::new())
}

/// Like [`parse_document`], but takes a caller-built [`ParserConfig`] so
/// its `filters` chain (and any other non-default option) actually reaches
/// the balancer.
pub fn parse_document_with_config(
    raw: &[u8],
    http_content_type: Option<&str>,
    mut config: ParserConfig,
) -> (Document, Vec<ScannerWarning>, Vec<BalancerNotice>) {
    let decoded = input_buffer::decode(raw, http_content_type);
    config.mark_parsing_started();
    let mut balancer = TagBalancer::with_owned_config(&decoded.text, config);
    let document = Document::build_collecting(&mut balancer);
    (document, balancer.take_warnings(), balancer.take_notices())
}

/// Decodes `raw` and parses it as a fragment whose children would be
/// inserted under `context_element` (e.g. `"td"` to parse the inner HTML
/// of a table cell), returning the resulting tree alongside any warnings
/// and notices.
pub fn parse_fragment(
    raw: &[u8],
    http_content_type: Option<&str>,
    context_element: &str,
) -> (Document, Vec<ScannerWarning>, Vec<BalancerNotice>) {
    parse_fragment_with_config(raw, http_content_type, context_element, ParserConfig::new())
}

/// Like [`parse_fragment`], but takes a caller-built [`ParserConfig`] so
/// its `filters` chain (and any other non-default option) actually reaches
/// the balancer.
pub fn parse_fragment_with_config(
    raw: &[u8],
    http_content_type: Option<&str>,
    context_element: &str,
    mut config: ParserConfig,
) -> (Document, Vec<ScannerWarning>, Vec<BalancerNotice>) {
    let decoded = input_buffer::decode(raw, http_content_type);
    config.document_fragment = true;
    config.fragment_context_stack = vec![QName {
        prefix: None,
        local: context_element.into(),
        raw: context_element.into(),
        uri: None,
    }];
    config.mark_parsing_started();
    let mut balancer = TagBalancer::with_owned_config(&decoded.text, config);
    let document = Document::build_collecting(&mut balancer);
    (document, balancer.take_warnings(), balancer.take_notices())
}
