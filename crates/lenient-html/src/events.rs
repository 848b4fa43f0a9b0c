//! Token and event types produced by the scanner and the balancer.

use crate::location::{Augmentations, Span};
use crate::tag_name::TagName;

/// A single parsed HTML or XML-ish attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub raw_name: Box<str>,
    pub prefix: Option<Box<str>>,
    pub local: Box<str>,
    pub namespace_uri: Option<&'static str>,
    pub value: Box<str>,
    pub non_normalized_value: Box<str>,
    /// False for a value reconstructed by the balancer (e.g. foster-parented
    /// attribute defaulting); true for anything read directly off the wire.
    pub specified: bool,
}

/// A qualified name as it appears on a tag: the original spelling plus any
/// namespace resolution the balancer performed.
#[derive(Clone, Debug, PartialEq)]
pub struct QName {
    pub prefix: Option<Box<str>>,
    pub local: Box<str>,
    pub raw: Box<str>,
    pub uri: Option<&'static str>,
}

/// Quirks-mode classification and declared identifiers of a DOCTYPE.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DoctypeInfo {
    pub name: Option<Box<str>>,
    pub public_id: Option<Box<str>>,
    pub system_id: Option<Box<str>>,
    pub force_quirks: bool,
}

/// Raw tokens as produced by the scanner, before tag balancing. Each variant
/// carries the byte span it was matched from.
#[derive(Clone, Debug, PartialEq)]
pub enum RawToken {
    StartTag {
        span: Span,
        name: TagName,
        /// The tag name exactly as spelled at the source, before any
        /// case-folding `TagName` applies for matching known elements.
        raw_name: Box<str>,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        span: Span,
        name: TagName,
    },
    Text {
        span: Span,
        text: Box<str>,
    },
    Comment {
        span: Span,
        text: Box<str>,
    },
    CData {
        span: Span,
        text: Box<str>,
    },
    ProcessingInstruction {
        span: Span,
        target: Box<str>,
        data: Box<str>,
    },
    Doctype {
        span: Span,
        info: DoctypeInfo,
    },
    XmlDecl {
        span: Span,
        text: Box<str>,
    },
    Eof {
        span: Span,
    },
}

impl RawToken {
    pub fn span(&self) -> Span {
        match self {
            Self::StartTag { span, .. }
            | Self::EndTag { span, .. }
            | Self::Text { span, .. }
            | Self::Comment { span, .. }
            | Self::CData { span, .. }
            | Self::ProcessingInstruction { span, .. }
            | Self::Doctype { span, .. }
            | Self::XmlDecl { span, .. }
            | Self::Eof { span } => *span,
        }
    }
}

/// Tree-construction events produced by the balancer. These mirror
/// `RawToken` one-for-one except that start/end tags may be ignored or
/// synthesized, and every event carries its `Augmentations`.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    StartElement {
        name: QName,
        attributes: Vec<Attribute>,
        self_closing: bool,
        augmentations: Augmentations,
    },
    EndElement {
        name: QName,
        augmentations: Augmentations,
    },
    Text {
        text: Box<str>,
        augmentations: Augmentations,
    },
    Comment {
        text: Box<str>,
        augmentations: Augmentations,
    },
    CData {
        text: Box<str>,
        augmentations: Augmentations,
    },
    ProcessingInstruction {
        target: Box<str>,
        data: Box<str>,
        augmentations: Augmentations,
    },
    Doctype {
        info: DoctypeInfo,
        augmentations: Augmentations,
    },
    Eof {
        augmentations: Augmentations,
    },
}

impl Event {
    pub fn augmentations(&self) -> &Augmentations {
        match self {
            Self::StartElement { augmentations, .. }
            | Self::EndElement { augmentations, .. }
            | Self::Text { augmentations, .. }
            | Self::Comment { augmentations, .. }
            | Self::CData { augmentations, .. }
            | Self::ProcessingInstruction { augmentations, .. }
            | Self::Doctype { augmentations, .. }
            | Self::Eof { augmentations } => augmentations,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.augmentations().synthesized
    }
}
