//! Static, process-wide table of per-element parsing rules.
//!
//! The balancer consults this table instead of hard-coding tag names in its
//! control flow: closes-on-open siblings, the set of permitted parents, and
//! whether an element switches the scanner into a special content mode all
//! live here as data.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::tag_name::TagName;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ParsingNamespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

/// What the scanner should do with the element's children until the
/// matching end tag (or document end) is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SpecialContent {
    #[default]
    None,
    RcData,
    RawText,
    ScriptData,
    Plaintext,
    Cdata,
}

/// Which elements, if any, are required to already be open for this element
/// to be inserted directly; anything else triggers ancestor synthesis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentRule {
    Any,
    RequiresOneOf(&'static [TagName]),
}

#[derive(Clone, Debug)]
pub struct ElementDescriptor {
    pub name: TagName,
    /// True for elements with no content and no end tag, e.g. `<br>`, `<img>`.
    pub is_void: bool,
    /// True for elements that participate in table/list/formatting scoping
    /// rules rather than plain nesting.
    pub is_special: bool,
    pub closes_on_open: &'static [TagName],
    pub parent_rule: ParentRule,
    pub special_content: SpecialContent,
}

macro_rules! void_elem {
    ($name:expr) => {
        ElementDescriptor {
            name: $name,
            is_void: true,
            is_special: false,
            closes_on_open: &[],
            parent_rule: ParentRule::Any,
            special_content: SpecialContent::None,
        }
    };
}

macro_rules! plain_elem {
    ($name:expr) => {
        ElementDescriptor {
            name: $name,
            is_void: false,
            is_special: false,
            closes_on_open: &[],
            parent_rule: ParentRule::Any,
            special_content: SpecialContent::None,
        }
    };
}

static P_CLOSERS: &[TagName] = &[
    TagName::ADDRESS,
    TagName::ARTICLE,
    TagName::ASIDE,
    TagName::BLOCKQUOTE,
    TagName::DETAILS,
    TagName::DIV,
    TagName::DL,
    TagName::FIELDSET,
    TagName::FIGCAPTION,
    TagName::FIGURE,
    TagName::FOOTER,
    TagName::FORM,
    TagName::H1,
    TagName::H2,
    TagName::H3,
    TagName::H4,
    TagName::H5,
    TagName::H6,
    TagName::HEADER,
    TagName::HGROUP,
    TagName::HR,
    TagName::MAIN,
    TagName::MENU,
    TagName::NAV,
    TagName::OL,
    TagName::P,
    TagName::PRE,
    TagName::SECTION,
    TagName::TABLE,
    TagName::UL,
];

fn build_table() -> FxHashMap<TagName, ElementDescriptor> {
    let mut t = FxHashMap::default();
    let mut add = |d: ElementDescriptor| {
        t.insert(d.name.clone(), d);
    };

    add(void_elem!(TagName::AREA));
    add(void_elem!(TagName::BASE));
    add(void_elem!(TagName::BASEFONT));
    add(void_elem!(TagName::BGSOUND));
    add(void_elem!(TagName::BR));
    add(void_elem!(TagName::COL));
    add(void_elem!(TagName::EMBED));
    add(void_elem!(TagName::FRAME));
    add(void_elem!(TagName::HR));
    add(void_elem!(TagName::IMG));
    add(void_elem!(TagName::INPUT));
    add(void_elem!(TagName::KEYGEN));
    add(void_elem!(TagName::LINK));
    add(void_elem!(TagName::META));
    add(void_elem!(TagName::PARAM));
    add(void_elem!(TagName::SOURCE));
    add(void_elem!(TagName::TRACK));
    add(void_elem!(TagName::WBR));

    add(ElementDescriptor {
        name: TagName::P,
        is_void: false,
        is_special: true,
        closes_on_open: P_CLOSERS,
        parent_rule: ParentRule::Any,
        special_content: SpecialContent::None,
    });

    add(ElementDescriptor {
        name: TagName::LI,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::LI],
        parent_rule: ParentRule::Any,
        special_content: SpecialContent::None,
    });

    add(ElementDescriptor {
        name: TagName::DT,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::DT, TagName::DD],
        parent_rule: ParentRule::Any,
        special_content: SpecialContent::None,
    });

    add(ElementDescriptor {
        name: TagName::DD,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::DT, TagName::DD],
        parent_rule: ParentRule::Any,
        special_content: SpecialContent::None,
    });

    add(ElementDescriptor {
        name: TagName::OPTION,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::OPTION],
        parent_rule: ParentRule::Any,
        special_content: SpecialContent::None,
    });

    add(ElementDescriptor {
        name: TagName::OPTGROUP,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::OPTION, TagName::OPTGROUP],
        parent_rule: ParentRule::Any,
        special_content: SpecialContent::None,
    });

    add(ElementDescriptor {
        name: TagName::THEAD,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::THEAD, TagName::TBODY, TagName::TFOOT],
        parent_rule: ParentRule::RequiresOneOf(&[TagName::TABLE]),
        special_content: SpecialContent::None,
    });
    add(ElementDescriptor {
        name: TagName::TBODY,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::THEAD, TagName::TBODY, TagName::TFOOT],
        parent_rule: ParentRule::RequiresOneOf(&[TagName::TABLE]),
        special_content: SpecialContent::None,
    });
    add(ElementDescriptor {
        name: TagName::TFOOT,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::THEAD, TagName::TBODY, TagName::TFOOT],
        parent_rule: ParentRule::RequiresOneOf(&[TagName::TABLE]),
        special_content: SpecialContent::None,
    });

    add(ElementDescriptor {
        name: TagName::TR,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::TR],
        parent_rule: ParentRule::RequiresOneOf(&[
            TagName::TBODY,
            TagName::THEAD,
            TagName::TFOOT,
            TagName::TABLE,
        ]),
        special_content: SpecialContent::None,
    });

    add(ElementDescriptor {
        name: TagName::TD,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::TD, TagName::TH],
        parent_rule: ParentRule::RequiresOneOf(&[TagName::TR]),
        special_content: SpecialContent::None,
    });
    add(ElementDescriptor {
        name: TagName::TH,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::TD, TagName::TH],
        parent_rule: ParentRule::RequiresOneOf(&[TagName::TR]),
        special_content: SpecialContent::None,
    });

    add(ElementDescriptor {
        name: TagName::COLGROUP,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::COLGROUP],
        parent_rule: ParentRule::RequiresOneOf(&[TagName::TABLE]),
        special_content: SpecialContent::None,
    });

    add(ElementDescriptor {
        name: TagName::CAPTION,
        is_void: false,
        is_special: true,
        closes_on_open: &[],
        parent_rule: ParentRule::RequiresOneOf(&[TagName::TABLE]),
        special_content: SpecialContent::None,
    });

    add(ElementDescriptor {
        name: TagName::RT,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::RT, TagName::RP],
        parent_rule: ParentRule::Any,
        special_content: SpecialContent::None,
    });
    add(ElementDescriptor {
        name: TagName::RP,
        is_void: false,
        is_special: true,
        closes_on_open: &[TagName::RT, TagName::RP],
        parent_rule: ParentRule::Any,
        special_content: SpecialContent::None,
    });

    for (name, content) in [
        (TagName::SCRIPT, SpecialContent::ScriptData),
        (TagName::STYLE, SpecialContent::RawText),
        (TagName::TEXTAREA, SpecialContent::RcData),
        (TagName::TITLE, SpecialContent::RcData),
        (TagName::IFRAME, SpecialContent::RawText),
        (TagName::NOEMBED, SpecialContent::RawText),
        (TagName::NOFRAMES, SpecialContent::RawText),
        (TagName::XMP, SpecialContent::RawText),
        (TagName::PLAINTEXT, SpecialContent::Plaintext),
    ] {
        add(ElementDescriptor {
            name: name.clone(),
            is_void: false,
            is_special: true,
            closes_on_open: &[],
            parent_rule: ParentRule::Any,
            special_content: content,
        });
    }

    for name in [
        TagName::A,
        TagName::ADDRESS,
        TagName::ARTICLE,
        TagName::ASIDE,
        TagName::B,
        TagName::BIG,
        TagName::BLOCKQUOTE,
        TagName::BUTTON,
        TagName::CENTER,
        TagName::CODE,
        TagName::DETAILS,
        TagName::DIALOG,
        TagName::DIR,
        TagName::DIV,
        TagName::DL,
        TagName::EM,
        TagName::FIELDSET,
        TagName::FIGCAPTION,
        TagName::FIGURE,
        TagName::FONT,
        TagName::FOOTER,
        TagName::FORM,
        TagName::H1,
        TagName::H2,
        TagName::H3,
        TagName::H4,
        TagName::H5,
        TagName::H6,
        TagName::HEADER,
        TagName::HGROUP,
        TagName::I,
        TagName::LISTING,
        TagName::MAIN,
        TagName::MARQUEE,
        TagName::MENU,
        TagName::NAV,
        TagName::NOBR,
        TagName::NOSCRIPT,
        TagName::OBJECT,
        TagName::OL,
        TagName::PRE,
        TagName::RB,
        TagName::RTC,
        TagName::RUBY,
        TagName::S,
        TagName::SECTION,
        TagName::SMALL,
        TagName::SPAN,
        TagName::STRIKE,
        TagName::STRONG,
        TagName::SUB,
        TagName::SUMMARY,
        TagName::SUP,
        TagName::TABLE,
        TagName::TT,
        TagName::U,
        TagName::UL,
        TagName::VAR,
        TagName::APPLET,
        TagName::SELECT,
        TagName::FRAMESET,
        TagName::TEMPLATE,
    ] {
        add(plain_elem!(name));
    }

    add(plain_elem!(TagName::HTML));
    add(plain_elem!(TagName::HEAD));
    add(plain_elem!(TagName::BODY));

    t
}

static TABLE: Lazy<FxHashMap<TagName, ElementDescriptor>> = Lazy::new(build_table);

/// Returns the static descriptor for a tag name, or a synthesized default
/// descriptor (ordinary flow content, no special behavior) for unknown tags.
pub fn descriptor_for(name: &TagName) -> ElementDescriptor {
    TABLE.get(name).cloned().unwrap_or_else(|| ElementDescriptor {
        name: name.clone(),
        is_void: false,
        is_special: false,
        closes_on_open: &[],
        parent_rule: ParentRule::Any,
        special_content: SpecialContent::None,
    })
}

pub fn is_void(name: &TagName) -> bool {
    descriptor_for(name).is_void
}
