//! Parser configuration: a typed struct for the common knobs plus a
//! dynamic `set`/`get` pair (by string name) for collaborators that build
//! configuration from external data, mirroring the donor's habit of
//! validating configuration eagerly and returning a `Result` instead of
//! throwing.

use crate::error::ConfigError;
use crate::events::QName;
use crate::filters::Filter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameCasePolicy {
    MatchSource,
    Upper,
    Lower,
}

impl Default for NameCasePolicy {
    fn default() -> Self {
        Self::MatchSource
    }
}

impl NameCasePolicy {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "match-source" => Some(Self::MatchSource),
            "upper" => Some(Self::Upper),
            "lower" => Some(Self::Lower),
            _ => None,
        }
    }
}

pub struct ParserConfig {
    pub augmentations: bool,
    pub namespaces: bool,
    pub insert_namespaces: bool,
    pub balance_tags: bool,
    pub document_fragment: bool,
    pub fragment_context_stack: Vec<QName>,
    pub ignore_outside_content: bool,
    pub names_elems: NameCasePolicy,
    pub names_attrs: NameCasePolicy,
    pub report_errors: bool,
    pub filters: Vec<Box<dyn Filter>>,
    pub include_comments: bool,
    pub create_cdata_nodes: bool,

    /// Set once parsing has started; blocks mutation of parse-only properties.
    parsing_in_progress: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            augmentations: false,
            namespaces: false,
            insert_namespaces: false,
            balance_tags: true,
            document_fragment: false,
            fragment_context_stack: Vec::new(),
            ignore_outside_content: false,
            names_elems: NameCasePolicy::default(),
            names_attrs: NameCasePolicy::default(),
            report_errors: false,
            filters: Vec::new(),
            include_comments: true,
            create_cdata_nodes: true,
            parsing_in_progress: false,
        }
    }
}

/// Properties that may only be changed before parsing starts.
const PARSE_ONLY_PROPERTIES: &[&str] = &[
    "balance-tags/document-fragment",
    "balance-tags/fragment-context-stack",
    "namespaces",
    "insert-namespaces",
];

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mark_parsing_started(&mut self) {
        self.parsing_in_progress = true;
    }

    /// Sets a boolean/string-valued property by its configuration name, as
    /// listed in the external-interfaces table.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        if self.parsing_in_progress && PARSE_ONLY_PROPERTIES.contains(&name) {
            return Err(ConfigError::NotSupportedWhileParsing {
                name: name.into(),
            });
        }

        match name {
            "augmentations" => self.augmentations = parse_bool(name, value)?,
            "namespaces" => self.namespaces = parse_bool(name, value)?,
            "insert-namespaces" => self.insert_namespaces = parse_bool(name, value)?,
            "balance-tags" => self.balance_tags = parse_bool(name, value)?,
            "balance-tags/document-fragment" => self.document_fragment = parse_bool(name, value)?,
            "balance-tags/ignore-outside-content" => {
                self.ignore_outside_content = parse_bool(name, value)?
            }
            "names/elems" => {
                self.names_elems = NameCasePolicy::parse(value).ok_or_else(|| {
                    ConfigError::IncompatibleValue {
                        name: name.into(),
                        reason: "expected one of match-source, upper, lower".into(),
                    }
                })?
            }
            "names/attrs" => {
                self.names_attrs = NameCasePolicy::parse(value).ok_or_else(|| {
                    ConfigError::IncompatibleValue {
                        name: name.into(),
                        reason: "expected one of match-source, upper, lower".into(),
                    }
                })?
            }
            "report-errors" => self.report_errors = parse_bool(name, value)?,
            "include-comments" => self.include_comments = parse_bool(name, value)?,
            "create-cdata-nodes" => self.create_cdata_nodes = parse_bool(name, value)?,
            "balance-tags/fragment-context-stack" | "filters" => {
                return Err(ConfigError::NotSupported { name: name.into() })
            }
            _ => return Err(ConfigError::NotRecognized { name: name.into() }),
        }

        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<String, ConfigError> {
        let value = match name {
            "augmentations" => self.augmentations.to_string(),
            "namespaces" => self.namespaces.to_string(),
            "insert-namespaces" => self.insert_namespaces.to_string(),
            "balance-tags" => self.balance_tags.to_string(),
            "balance-tags/document-fragment" => self.document_fragment.to_string(),
            "balance-tags/ignore-outside-content" => self.ignore_outside_content.to_string(),
            "report-errors" => self.report_errors.to_string(),
            "include-comments" => self.include_comments.to_string(),
            "create-cdata-nodes" => self.create_cdata_nodes.to_string(),
            "names/elems" | "names/attrs" | "balance-tags/fragment-context-stack" | "filters" => {
                return Err(ConfigError::NotSupported { name: name.into() })
            }
            _ => return Err(ConfigError::NotRecognized { name: name.into() }),
        };
        Ok(value)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::IncompatibleValue {
            name: name.into(),
            reason: "expected true or false".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_property() {
        let mut config = ParserConfig::new();
        assert_eq!(
            config.set("not-a-real-property", "true"),
            Err(ConfigError::NotRecognized {
                name: "not-a-real-property".into()
            })
        );
    }

    #[test]
    fn rejects_mid_parse_mutation_of_parse_only_property() {
        let mut config = ParserConfig::new();
        config.mark_parsing_started();
        assert_eq!(
            config.set("namespaces", "true"),
            Err(ConfigError::NotSupportedWhileParsing {
                name: "namespaces".into()
            })
        );
    }

    #[test]
    fn accepts_valid_case_policy() {
        let mut config = ParserConfig::new();
        config.set("names/elems", "upper").unwrap();
        assert_eq!(config.names_elems, NameCasePolicy::Upper);
    }
}
