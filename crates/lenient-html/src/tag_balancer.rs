//! The tag balancer: a pull-style tree constructor sitting on top of
//! [`Scanner`]. It turns a stream of [`RawToken`]s into a stream of
//! [`Event`]s by tracking an open-element stack and consulting
//! `element_table` for closes-on-open siblings and required ancestors,
//! the way the donor's tree builder consulted its own special-parents
//! table instead of hard-coding tag names into control flow.

use std::collections::VecDeque;

use log::{debug, trace, warn};

use crate::config::{NameCasePolicy, ParserConfig};
use crate::element_table::{self, ElementDescriptor, ParentRule};
use crate::error::{BalancerNotice, ScannerWarning};
use crate::events::{Attribute, Event, QName, RawToken};
use crate::filters::{self, Filter};
use crate::location::{Augmentations, Location, Span};
use crate::scanner::Scanner;
use crate::tag_name::TagName;

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements that stop an end tag's search for its matching opener: a stray
/// end tag that would otherwise pop through one of these is ignored rather
/// than closing an ancestor above it.
fn is_scope_limiting(name: &TagName) -> bool {
    matches!(name, TagName::TABLE | TagName::TEMPLATE | TagName::CAPTION)
}

fn apply_case_policy(name: &str, policy: NameCasePolicy) -> Box<str> {
    match policy {
        NameCasePolicy::Upper => name.to_ascii_uppercase().into_boxed_str(),
        NameCasePolicy::Lower => name.to_ascii_lowercase().into_boxed_str(),
        NameCasePolicy::MatchSource => name.into(),
    }
}

struct StackEntry {
    tag_name: TagName,
    descriptor: ElementDescriptor,
    name: QName,
    /// Seeded from the fragment context stack rather than opened by a real
    /// or synthesized start tag: it has no corresponding end event and end
    /// tags matching it are stray.
    is_fragment_context: bool,
}

/// Pull-style tree constructor. Call [`TagBalancer::next_event`] in a loop
/// until it returns [`Event::Eof`].
pub struct TagBalancer {
    scanner: Scanner,
    stack: Vec<StackEntry>,
    pending: VecDeque<Event>,
    warnings: Vec<ScannerWarning>,
    notices: Vec<BalancerNotice>,
    filters: Vec<Box<dyn Filter>>,

    is_fragment: bool,
    augmentations_enabled: bool,
    namespaces: bool,
    insert_namespaces: bool,
    names_elems: NameCasePolicy,
    names_attrs: NameCasePolicy,

    html_opened: bool,
    head_started: bool,
    head_done: bool,
    body_opened: bool,

    finished: bool,
}

impl TagBalancer {
    pub fn new(source: &str) -> Self {
        Self::with_config(source, &ParserConfig::new())
    }

    /// Builds a balancer from a borrowed config. `config.filters` is not
    /// wired in this way since trait objects can't be cloned out of a
    /// shared reference; use [`TagBalancer::with_owned_config`] to also
    /// install the filter chain.
    pub fn with_config(source: &str, config: &ParserConfig) -> Self {
        let mut stack = Vec::with_capacity(config.fragment_context_stack.len());
        for qname in &config.fragment_context_stack {
            let tag_name = TagName::from(qname.local.as_bytes());
            let descriptor = element_table::descriptor_for(&tag_name);
            stack.push(StackEntry {
                tag_name,
                descriptor,
                name: qname.clone(),
                is_fragment_context: true,
            });
        }

        let is_fragment = config.document_fragment;
        Self {
            scanner: Scanner::new(source),
            stack,
            pending: VecDeque::new(),
            warnings: Vec::new(),
            notices: Vec::new(),
            filters: Vec::new(),
            is_fragment,
            augmentations_enabled: config.augmentations,
            namespaces: config.namespaces,
            insert_namespaces: config.insert_namespaces,
            names_elems: config.names_elems,
            names_attrs: config.names_attrs,
            html_opened: is_fragment,
            head_started: is_fragment,
            head_done: is_fragment,
            body_opened: is_fragment,
            finished: false,
        }
    }

    /// Like [`TagBalancer::with_config`] but also takes ownership of the
    /// config's filter chain, installing it as the balancer's own.
    pub fn with_owned_config(source: &str, mut config: ParserConfig) -> Self {
        let filters = std::mem::take(&mut config.filters);
        let mut balancer = Self::with_config(source, &config);
        balancer.filters = filters;
        balancer
    }

    pub fn location(&self) -> Location {
        self.scanner.location()
    }

    /// Drains and returns scanner warnings accumulated since the last call.
    pub fn take_warnings(&mut self) -> Vec<ScannerWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Drains and returns balancer notices accumulated since the last call.
    pub fn take_notices(&mut self) -> Vec<BalancerNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Records a notice raised by a downstream tree builder (e.g.
    /// [`crate::doc_tree`]'s foster-parenting pass) so it surfaces through
    /// the same channel as notices the balancer raises itself.
    pub fn push_notice(&mut self, notice: BalancerNotice) {
        self.notices.push(notice);
    }

    /// Resets the balancer to parse `source` again from the start,
    /// preserving the fragment context stack it was constructed with.
    pub fn reset(&mut self, source: &str) {
        self.scanner = Scanner::new(source);
        self.stack.retain(|entry| entry.is_fragment_context);
        self.pending.clear();
        self.warnings.clear();
        self.notices.clear();
        self.finished = false;
        self.html_opened = self.is_fragment;
        self.head_started = self.is_fragment;
        self.head_done = self.is_fragment;
        self.body_opened = self.is_fragment;
    }

    /// Pulls the next tree-construction event. Returns `Event::Eof` once
    /// the stack has been fully drained; safe to keep calling afterward
    /// (it keeps returning `Event::Eof`).
    pub fn next_event(&mut self) -> Event {
        loop {
            if let Some(event) = self.pending.pop_front() {
                if filters::run_chain(&mut self.filters, &event) {
                    return event;
                }
                continue;
            }
            if self.finished {
                return Event::Eof {
                    augmentations: Augmentations::default(),
                };
            }
            self.pump();
        }
    }

    fn pump(&mut self) {
        let token = self.scanner.next_token(&mut self.warnings);
        let mut events = Vec::new();
        match token {
            RawToken::StartTag {
                span,
                name,
                raw_name,
                attributes,
                self_closing,
            } => self.handle_start_tag(name, raw_name, attributes, self_closing, Some(span), &mut events),
            RawToken::EndTag { span, name } => self.handle_end_tag(name, Some(span), &mut events),
            RawToken::Text { span, text } => self.handle_text(text, Some(span), &mut events),
            RawToken::Comment { span, text } => events.push(Event::Comment {
                text,
                augmentations: self.augmentations_for(Some(span), false),
            }),
            RawToken::CData { span, text } => events.push(Event::CData {
                text,
                augmentations: self.augmentations_for(Some(span), false),
            }),
            RawToken::ProcessingInstruction { span, target, data } => {
                events.push(Event::ProcessingInstruction {
                    target,
                    data,
                    augmentations: self.augmentations_for(Some(span), false),
                })
            }
            RawToken::Doctype { span, info } => events.push(Event::Doctype {
                info,
                augmentations: self.augmentations_for(Some(span), false),
            }),
            RawToken::XmlDecl { .. } => {
                // Consumed upstream for encoding resolution; it has no
                // structural representation in the event stream.
            }
            RawToken::Eof { .. } => {
                self.drain_at_eof(&mut events);
                self.finished = true;
            }
        }
        self.pending.extend(events);
    }

    fn handle_start_tag(
        &mut self,
        name: TagName,
        raw_name: Box<str>,
        attributes: Vec<Attribute>,
        self_closing: bool,
        span: Option<Span>,
        events: &mut Vec<Event>,
    ) {
        if self.is_fragment {
            self.open_element(name, &raw_name, attributes, self_closing, false, span, events);
            return;
        }

        match name {
            TagName::HTML => {
                if self.html_opened {
                    warn!("ignored duplicate <html> start tag");
                    self.notices.push(BalancerNotice::IgnoredStartTag {
                        name: "html".into(),
                    });
                } else {
                    self.open_element(TagName::HTML, &raw_name, attributes, self_closing, false, span, events);
                    self.html_opened = true;
                }
            }
            TagName::HEAD => {
                if self.head_done {
                    warn!("ignored duplicate <head> start tag");
                    self.notices.push(BalancerNotice::IgnoredStartTag {
                        name: "head".into(),
                    });
                    return;
                }
                self.ensure_html_opened(events);
                self.open_element(TagName::HEAD, &raw_name, attributes, self_closing, false, span, events);
                self.head_started = true;
            }
            TagName::BODY => {
                if self.body_opened {
                    warn!("ignored duplicate <body> start tag");
                    self.notices.push(BalancerNotice::IgnoredStartTag {
                        name: "body".into(),
                    });
                    return;
                }
                self.ensure_html_opened(events);
                self.ensure_head_done(events);
                self.open_element(TagName::BODY, &raw_name, attributes, self_closing, false, span, events);
                self.body_opened = true;
            }
            _ => {
                self.ensure_document_shell(events);
                self.open_element(name, &raw_name, attributes, self_closing, false, span, events);
            }
        }
    }

    fn handle_end_tag(&mut self, name: TagName, span: Option<Span>, events: &mut Vec<Event>) {
        match self.find_matching_open(&name) {
            None => {
                warn!("ignored end tag </{name}>: no matching open element in scope");
                self.notices.push(BalancerNotice::IgnoredEndTag {
                    name: name.as_str().into(),
                });
            }
            Some(idx) => {
                if idx + 1 < self.stack.len() {
                    trace!("</{name}> closes through {} misnested element(s)", self.stack.len() - idx - 1);
                    self.notices.push(BalancerNotice::MisnestedEndTag {
                        name: name.as_str().into(),
                    });
                }
                while self.stack.len() > idx + 1 {
                    self.close_top(events, true, None);
                }
                self.close_top(events, false, span);
                if name == TagName::HEAD {
                    self.head_done = true;
                }
            }
        }
    }

    fn handle_text(&mut self, text: Box<str>, span: Option<Span>, events: &mut Vec<Event>) {
        if !self.is_fragment && !text.trim().is_empty() {
            self.ensure_document_shell(events);
        }
        events.push(Event::Text {
            text,
            augmentations: self.augmentations_for(span, false),
        });
    }

    fn ensure_html_opened(&mut self, events: &mut Vec<Event>) {
        if !self.html_opened {
            self.open_element(TagName::HTML, TagName::HTML.as_str(), Vec::new(), false, true, None, events);
            self.html_opened = true;
        }
    }

    fn ensure_head_done(&mut self, events: &mut Vec<Event>) {
        if self.head_done {
            return;
        }
        if self.head_started {
            // A real `<head>` was opened and never explicitly closed;
            // body-ish content forces it shut first.
            self.close_top(events, true, None);
        } else {
            self.open_element(TagName::HEAD, TagName::HEAD.as_str(), Vec::new(), false, true, None, events);
            self.close_top(events, true, None);
            self.head_started = true;
        }
        self.head_done = true;
    }

    fn ensure_document_shell(&mut self, events: &mut Vec<Event>) {
        self.ensure_html_opened(events);
        self.ensure_head_done(events);
        if !self.body_opened {
            self.open_element(TagName::BODY, TagName::BODY.as_str(), Vec::new(), false, true, None, events);
            self.body_opened = true;
        }
    }

    fn open_element(
        &mut self,
        name: TagName,
        raw_name: &str,
        attributes: Vec<Attribute>,
        self_closing: bool,
        synthesized: bool,
        span: Option<Span>,
        events: &mut Vec<Event>,
    ) {
        self.apply_closes_on_open(&name, events);

        let descriptor = element_table::descriptor_for(&name);
        self.ensure_parent_rule(&descriptor.parent_rule.clone(), events);

        let is_shell_element = matches!(name, TagName::HTML | TagName::HEAD | TagName::BODY);
        let uri = self.resolve_uri(synthesized && is_shell_element);
        let qname = self.make_qname(&name, raw_name, uri);
        let attrs = self.normalize_attributes(attributes);
        let is_void = descriptor.is_void;

        let augmentations = self.augmentations_for(if synthesized { None } else { span }, synthesized);
        events.push(Event::StartElement {
            name: qname.clone(),
            attributes: attrs,
            self_closing: self_closing || is_void,
            augmentations,
        });

        if synthesized {
            debug!("synthesized <{name}> start tag");
            self.notices.push(BalancerNotice::SynthesizedStartTag {
                name: name.as_str().into(),
            });
        }

        self.stack.push(StackEntry {
            tag_name: name,
            descriptor,
            name: qname,
            is_fragment_context: false,
        });

        if is_void || self_closing {
            self.close_top(events, true, None);
        }
    }

    fn apply_closes_on_open(&mut self, new_name: &TagName, events: &mut Vec<Event>) {
        loop {
            let should_close = match self.stack.last() {
                Some(entry) if !entry.is_fragment_context => {
                    entry.descriptor.closes_on_open.iter().any(|n| n == new_name)
                }
                _ => false,
            };
            if !should_close {
                break;
            }
            self.close_top(events, true, None);
        }
    }

    fn ensure_parent_rule(&mut self, rule: &ParentRule, events: &mut Vec<Event>) {
        if let ParentRule::RequiresOneOf(allowed) = rule {
            let satisfied = matches!(
                self.stack.last(),
                Some(entry) if allowed.iter().any(|a| a == &entry.tag_name)
            );
            if !satisfied {
                let ancestor = allowed[0].clone();
                let raw_name = ancestor.as_str().to_string();
                self.open_element(ancestor, &raw_name, Vec::new(), false, true, None, events);
            }
        }
    }

    fn close_top(&mut self, events: &mut Vec<Event>, synthesized: bool, span: Option<Span>) {
        let Some(entry) = self.stack.pop() else {
            return;
        };
        let label: Box<str> = entry.tag_name.as_str().into();
        let augmentations = self.augmentations_for(if synthesized { None } else { span }, synthesized);
        events.push(Event::EndElement {
            name: entry.name,
            augmentations,
        });
        if synthesized {
            self.notices.push(BalancerNotice::SynthesizedEndTag { name: label });
        }
    }

    /// Finds the index of the innermost open element matching `name`,
    /// stopping (returning `None`) if a table-scope-limiting element or a
    /// fragment context boundary is reached first.
    fn find_matching_open(&self, name: &TagName) -> Option<usize> {
        for (i, entry) in self.stack.iter().enumerate().rev() {
            if entry.is_fragment_context {
                return None;
            }
            if &entry.tag_name == name {
                return Some(i);
            }
            if is_scope_limiting(&entry.tag_name) {
                return None;
            }
        }
        None
    }

    fn drain_at_eof(&mut self, events: &mut Vec<Event>) {
        while matches!(self.stack.last(), Some(entry) if !entry.is_fragment_context) {
            self.close_top(events, true, None);
        }
        events.push(Event::Eof {
            augmentations: self.augmentations_for(None, false),
        });
    }

    fn make_qname(&self, name: &TagName, raw_name: &str, uri: Option<&'static str>) -> QName {
        QName {
            prefix: None,
            local: apply_case_policy(name.as_str(), self.names_elems),
            raw: raw_name.into(),
            uri,
        }
    }

    fn normalize_attributes(&self, attributes: Vec<Attribute>) -> Vec<Attribute> {
        attributes
            .into_iter()
            .map(|mut attr| {
                attr.local = apply_case_policy(&attr.raw_name, self.names_attrs);
                attr
            })
            .collect()
    }

    fn resolve_uri(&self, is_synthesized_shell: bool) -> Option<&'static str> {
        if self.namespaces {
            Some(XHTML_NAMESPACE)
        } else if self.insert_namespaces && is_synthesized_shell {
            Some(XHTML_NAMESPACE)
        } else {
            None
        }
    }

    fn augmentations_for(&self, span: Option<Span>, synthesized: bool) -> Augmentations {
        if !self.augmentations_enabled {
            return Augmentations::default();
        }
        match span {
            Some(span) if !synthesized => Augmentations::from_span(span),
            _ => Augmentations::synthesized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn start_names(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::StartElement { name, .. } => Some(name.local.to_string()),
                _ => None,
            })
            .collect()
    }

    fn end_names(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::EndElement { name, .. } => Some(name.local.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn synthesizes_document_shell() {
        let events = collect("<html><body>hi</body></html>");
        assert_eq!(start_names(&events), vec!["html", "head", "body"]);
        assert_eq!(end_names(&events), vec!["head", "body", "html"]);
        assert!(matches!(events.last(), Some(Event::Eof { .. })));
    }

    #[test]
    fn bare_text_synthesizes_full_shell() {
        let events = collect("hi");
        assert_eq!(start_names(&events), vec!["html", "head", "body"]);
        assert!(events.iter().any(|e| matches!(e, Event::Text { text, .. } if &**text == "hi")));
    }

    #[test]
    fn repeated_p_closes_previous_p() {
        let events = collect("<p>x<p>y");
        let p_starts = events
            .iter()
            .filter(|e| matches!(e, Event::StartElement{name,..} if &*name.local=="p"))
            .count();
        let p_ends = events
            .iter()
            .filter(|e| matches!(e, Event::EndElement{name,..} if &*name.local=="p"))
            .count();
        assert_eq!(p_starts, 2);
        assert_eq!(p_ends, 2);
    }

    #[test]
    fn misnested_close_pops_intervening_elements() {
        let events = collect("<b><i>x</b>y</i>");
        let mut balancer_notices_seen = false;
        for e in &events {
            if let Event::EndElement { name, .. } = e {
                if &*name.local == "b" || &*name.local == "i" {
                    balancer_notices_seen = true;
                }
            }
        }
        assert!(balancer_notices_seen);
        // both b and i end up closed; stray trailing </i> does not reopen anything
        assert_eq!(end_names(&events).iter().filter(|n| n.as_str() == "i").count(), 1);
        assert_eq!(end_names(&events).iter().filter(|n| n.as_str() == "b").count(), 1);
    }

    #[test]
    fn bare_tr_synthesizes_table_and_tbody() {
        let events = collect("<tr><td>x</td></tr>");
        assert_eq!(
            start_names(&events),
            vec!["html", "head", "body", "table", "tbody", "tr", "td"]
        );
    }

    #[test]
    fn void_elements_get_a_synthesized_end() {
        let mut config = ParserConfig::new();
        config.augmentations = true;
        let mut balancer = TagBalancer::with_config("<br>", &config);
        let mut out = Vec::new();
        loop {
            let event = balancer.next_event();
            let is_eof = matches!(event, Event::Eof { .. });
            out.push(event);
            if is_eof {
                break;
            }
        }
        let br_end = out.iter().any(|e| matches!(e, Event::EndElement{name,augmentations,..} if &*name.local=="br" && augmentations.synthesized));
        assert!(br_end);
    }

    #[test]
    fn stray_end_tag_is_ignored_not_crashing() {
        let events = collect("</div>");
        assert!(!start_names(&events).iter().any(|n| n == "div"));
    }

    #[test]
    fn unknown_element_raw_casing_is_preserved_by_default() {
        let events = collect("<FooBar>x</FooBar>");
        let start = events
            .iter()
            .find(|e| matches!(e, Event::StartElement { .. }))
            .expect("start element present");
        let Event::StartElement { name, .. } = start else {
            unreachable!()
        };
        assert_eq!(&*name.local, "FooBar");
        assert_eq!(&*name.raw, "FooBar");
    }

    #[test]
    fn known_element_is_lowercased_by_default_even_when_source_is_uppercase() {
        let events = collect("<DIV>x</DIV>");
        let start = events
            .iter()
            .find(|e| matches!(e, Event::StartElement { name, .. } if &*name.local == "div"))
            .expect("lowercased div start element present");
        let Event::StartElement { name, .. } = start else {
            unreachable!()
        };
        assert_eq!(&*name.raw, "DIV");
    }

    #[test]
    fn upper_case_policy_folds_both_known_and_unknown_names() {
        let mut config = ParserConfig::new();
        config.names_elems = NameCasePolicy::Upper;
        let mut balancer = TagBalancer::with_config("<div><foobar></foobar></div>", &config);
        let mut out = Vec::new();
        loop {
            let event = balancer.next_event();
            let is_eof = matches!(event, Event::Eof { .. });
            out.push(event);
            if is_eof {
                break;
            }
        }
        assert!(start_names(&out).contains(&"DIV".to_string()));
        assert!(start_names(&out).contains(&"FOOBAR".to_string()));
    }

    #[test]
    fn attribute_raw_name_survives_case_normalization() {
        let mut config = ParserConfig::new();
        config.names_attrs = NameCasePolicy::Lower;
        let mut balancer = TagBalancer::with_config(r#"<div DATA-Foo="x"></div>"#, &config);
        let mut attrs = Vec::new();
        loop {
            let event = balancer.next_event();
            let is_eof = matches!(event, Event::Eof { .. });
            if let Event::StartElement { attributes, .. } = &event {
                attrs.extend(attributes.iter().cloned());
            }
            if is_eof {
                break;
            }
        }
        let attr = attrs.first().expect("attribute present");
        assert_eq!(&*attr.raw_name, "DATA-Foo");
        assert_eq!(&*attr.local, "data-foo");
    }

    #[test]
    fn fragment_context_is_seeded_without_events() {
        let mut config = ParserConfig::new();
        config.document_fragment = true;
        config.fragment_context_stack = vec![QName {
            prefix: None,
            local: "body".into(),
            raw: "body".into(),
            uri: None,
        }];
        let mut balancer = TagBalancer::with_config("hi", &config);
        let mut out = Vec::new();
        loop {
            let event = balancer.next_event();
            let is_eof = matches!(event, Event::Eof { .. });
            out.push(event);
            if is_eof {
                break;
            }
        }
        assert!(!start_names(&out).iter().any(|n| n == "body"));
        assert!(out.iter().any(|e| matches!(e, Event::Text{text,..} if &**text=="hi")));
    }

    #[test]
    fn stray_end_tag_matching_fragment_context_is_ignored() {
        let mut config = ParserConfig::new();
        config.document_fragment = true;
        config.fragment_context_stack = vec![QName {
            prefix: None,
            local: "body".into(),
            raw: "body".into(),
            uri: None,
        }];
        let events = {
            let mut balancer = TagBalancer::with_config("</body>x", &config);
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
        assert!(!end_names(&events).iter().any(|n| n == "body"));
    }
}
