//! Closed enum of well-known element names plus a catch-all for anything else.
//!
//! Matching against a closed set of variants lets the element table and the
//! balancer use `match` instead of byte comparisons on every lookup.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TagName {
    A,
    ADDRESS,
    APPLET,
    AREA,
    ARTICLE,
    ASIDE,
    B,
    BASE,
    BASEFONT,
    BGSOUND,
    BIG,
    BLOCKQUOTE,
    BODY,
    BR,
    BUTTON,
    CAPTION,
    CENTER,
    CODE,
    COL,
    COLGROUP,
    DD,
    DETAILS,
    DIALOG,
    DIR,
    DIV,
    DL,
    DT,
    EM,
    EMBED,
    FIELDSET,
    FIGCAPTION,
    FIGURE,
    FONT,
    FOOTER,
    FORM,
    FRAME,
    FRAMESET,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    HEAD,
    HEADER,
    HGROUP,
    HR,
    HTML,
    I,
    IFRAME,
    IMG,
    INPUT,
    KEYGEN,
    LI,
    LINK,
    LISTING,
    MAIN,
    MARQUEE,
    MENU,
    META,
    NAV,
    NOBR,
    NOEMBED,
    NOFRAMES,
    NOSCRIPT,
    OBJECT,
    OL,
    OPTGROUP,
    OPTION,
    P,
    PARAM,
    PLAINTEXT,
    PRE,
    RB,
    RP,
    RT,
    RTC,
    RUBY,
    S,
    SCRIPT,
    SECTION,
    SELECT,
    SMALL,
    SOURCE,
    SPAN,
    STRIKE,
    STRONG,
    STYLE,
    SUB,
    SUMMARY,
    SUP,
    TABLE,
    TBODY,
    TD,
    TEMPLATE,
    TEXTAREA,
    TFOOT,
    TH,
    THEAD,
    TITLE,
    TR,
    TRACK,
    TT,
    U,
    UL,
    VAR,
    WBR,
    XMP,
    /// The document's DOCTYPE, treated as a pseudo tag for table-driven purposes.
    Doctype,
    /// Anything not named above, stored with its original source casing.
    Other(Box<str>),
}

impl TagName {
    pub fn as_str(&self) -> &str {
        match self {
            Self::A => "a",
            Self::ADDRESS => "address",
            Self::APPLET => "applet",
            Self::AREA => "area",
            Self::ARTICLE => "article",
            Self::ASIDE => "aside",
            Self::B => "b",
            Self::BASE => "base",
            Self::BASEFONT => "basefont",
            Self::BGSOUND => "bgsound",
            Self::BIG => "big",
            Self::BLOCKQUOTE => "blockquote",
            Self::BODY => "body",
            Self::BR => "br",
            Self::BUTTON => "button",
            Self::CAPTION => "caption",
            Self::CENTER => "center",
            Self::CODE => "code",
            Self::COL => "col",
            Self::COLGROUP => "colgroup",
            Self::DD => "dd",
            Self::DETAILS => "details",
            Self::DIALOG => "dialog",
            Self::DIR => "dir",
            Self::DIV => "div",
            Self::DL => "dl",
            Self::DT => "dt",
            Self::EM => "em",
            Self::EMBED => "embed",
            Self::FIELDSET => "fieldset",
            Self::FIGCAPTION => "figcaption",
            Self::FIGURE => "figure",
            Self::FONT => "font",
            Self::FOOTER => "footer",
            Self::FORM => "form",
            Self::FRAME => "frame",
            Self::FRAMESET => "frameset",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
            Self::HEAD => "head",
            Self::HEADER => "header",
            Self::HGROUP => "hgroup",
            Self::HR => "hr",
            Self::HTML => "html",
            Self::I => "i",
            Self::IFRAME => "iframe",
            Self::IMG => "img",
            Self::INPUT => "input",
            Self::KEYGEN => "keygen",
            Self::LI => "li",
            Self::LINK => "link",
            Self::LISTING => "listing",
            Self::MAIN => "main",
            Self::MARQUEE => "marquee",
            Self::MENU => "menu",
            Self::META => "meta",
            Self::NAV => "nav",
            Self::NOBR => "nobr",
            Self::NOEMBED => "noembed",
            Self::NOFRAMES => "noframes",
            Self::NOSCRIPT => "noscript",
            Self::OBJECT => "object",
            Self::OL => "ol",
            Self::OPTGROUP => "optgroup",
            Self::OPTION => "option",
            Self::P => "p",
            Self::PARAM => "param",
            Self::PLAINTEXT => "plaintext",
            Self::PRE => "pre",
            Self::RB => "rb",
            Self::RP => "rp",
            Self::RT => "rt",
            Self::RTC => "rtc",
            Self::RUBY => "ruby",
            Self::S => "s",
            Self::SCRIPT => "script",
            Self::SECTION => "section",
            Self::SELECT => "select",
            Self::SMALL => "small",
            Self::SOURCE => "source",
            Self::SPAN => "span",
            Self::STRIKE => "strike",
            Self::STRONG => "strong",
            Self::STYLE => "style",
            Self::SUB => "sub",
            Self::SUMMARY => "summary",
            Self::SUP => "sup",
            Self::TABLE => "table",
            Self::TBODY => "tbody",
            Self::TD => "td",
            Self::TEMPLATE => "template",
            Self::TEXTAREA => "textarea",
            Self::TFOOT => "tfoot",
            Self::TH => "th",
            Self::THEAD => "thead",
            Self::TITLE => "title",
            Self::TR => "tr",
            Self::TRACK => "track",
            Self::TT => "tt",
            Self::U => "u",
            Self::UL => "ul",
            Self::VAR => "var",
            Self::WBR => "wbr",
            Self::XMP => "xmp",
            Self::Doctype => "#doctype",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&[u8]> for TagName {
    fn from(bytes: &[u8]) -> Self {
        let lower = bytes.to_ascii_lowercase();
        match lower.as_slice() {
            b"a" => Self::A,
            b"address" => Self::ADDRESS,
            b"applet" => Self::APPLET,
            b"area" => Self::AREA,
            b"article" => Self::ARTICLE,
            b"aside" => Self::ASIDE,
            b"b" => Self::B,
            b"base" => Self::BASE,
            b"basefont" => Self::BASEFONT,
            b"bgsound" => Self::BGSOUND,
            b"big" => Self::BIG,
            b"blockquote" => Self::BLOCKQUOTE,
            b"body" => Self::BODY,
            b"br" => Self::BR,
            b"button" => Self::BUTTON,
            b"caption" => Self::CAPTION,
            b"center" => Self::CENTER,
            b"code" => Self::CODE,
            b"col" => Self::COL,
            b"colgroup" => Self::COLGROUP,
            b"dd" => Self::DD,
            b"details" => Self::DETAILS,
            b"dialog" => Self::DIALOG,
            b"dir" => Self::DIR,
            b"div" => Self::DIV,
            b"dl" => Self::DL,
            b"dt" => Self::DT,
            b"em" => Self::EM,
            b"embed" => Self::EMBED,
            b"fieldset" => Self::FIELDSET,
            b"figcaption" => Self::FIGCAPTION,
            b"figure" => Self::FIGURE,
            b"font" => Self::FONT,
            b"footer" => Self::FOOTER,
            b"form" => Self::FORM,
            b"frame" => Self::FRAME,
            b"frameset" => Self::FRAMESET,
            b"h1" => Self::H1,
            b"h2" => Self::H2,
            b"h3" => Self::H3,
            b"h4" => Self::H4,
            b"h5" => Self::H5,
            b"h6" => Self::H6,
            b"head" => Self::HEAD,
            b"header" => Self::HEADER,
            b"hgroup" => Self::HGROUP,
            b"hr" => Self::HR,
            b"html" => Self::HTML,
            b"i" => Self::I,
            b"iframe" => Self::IFRAME,
            b"img" => Self::IMG,
            b"input" => Self::INPUT,
            b"keygen" => Self::KEYGEN,
            b"li" => Self::LI,
            b"link" => Self::LINK,
            b"listing" => Self::LISTING,
            b"main" => Self::MAIN,
            b"marquee" => Self::MARQUEE,
            b"menu" => Self::MENU,
            b"meta" => Self::META,
            b"nav" => Self::NAV,
            b"nobr" => Self::NOBR,
            b"noembed" => Self::NOEMBED,
            b"noframes" => Self::NOFRAMES,
            b"noscript" => Self::NOSCRIPT,
            b"object" => Self::OBJECT,
            b"ol" => Self::OL,
            b"optgroup" => Self::OPTGROUP,
            b"option" => Self::OPTION,
            b"p" => Self::P,
            b"param" => Self::PARAM,
            b"plaintext" => Self::PLAINTEXT,
            b"pre" => Self::PRE,
            b"rb" => Self::RB,
            b"rp" => Self::RP,
            b"rt" => Self::RT,
            b"rtc" => Self::RTC,
            b"ruby" => Self::RUBY,
            b"s" => Self::S,
            b"script" => Self::SCRIPT,
            b"section" => Self::SECTION,
            b"select" => Self::SELECT,
            b"small" => Self::SMALL,
            b"source" => Self::SOURCE,
            b"span" => Self::SPAN,
            b"strike" => Self::STRIKE,
            b"strong" => Self::STRONG,
            b"style" => Self::STYLE,
            b"sub" => Self::SUB,
            b"summary" => Self::SUMMARY,
            b"sup" => Self::SUP,
            b"table" => Self::TABLE,
            b"tbody" => Self::TBODY,
            b"td" => Self::TD,
            b"template" => Self::TEMPLATE,
            b"textarea" => Self::TEXTAREA,
            b"tfoot" => Self::TFOOT,
            b"th" => Self::TH,
            b"thead" => Self::THEAD,
            b"title" => Self::TITLE,
            b"tr" => Self::TR,
            b"track" => Self::TRACK,
            b"tt" => Self::TT,
            b"u" => Self::U,
            b"ul" => Self::UL,
            b"var" => Self::VAR,
            b"wbr" => Self::WBR,
            b"xmp" => Self::XMP,
            _ => Self::Other(String::from_utf8_lossy(bytes).into_owned().into_boxed_str()),
        }
    }
}

impl PartialEq<&str> for TagName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str().eq_ignore_ascii_case(other)
    }
}
