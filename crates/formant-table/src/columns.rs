//! Column selection by name list or regular expression

use crate::error::{Result, TableError};
use crate::table::FormantTable;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which columns of a table an operation works on
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ColumnSpecRepr", into = "ColumnSpecRepr")]
pub enum ColumnSpec {
    /// Explicit column names, used in the order given
    Names(Vec<String>),
    /// Columns whose full name matches the expression, sorted by name
    Pattern(Regex),
}

impl ColumnSpec {
    /// Select a single column
    pub fn name(name: impl Into<String>) -> Self {
        ColumnSpec::Names(vec![name.into()])
    }

    /// Select a list of columns
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSpec::Names(names.into_iter().map(Into::into).collect())
    }

    /// Select columns by regular expression, anchored at both ends
    pub fn pattern(pattern: &str) -> Result<Self> {
        let anchored = format!("^(?:{})$", pattern);
        Regex::new(&anchored)
            .map(ColumnSpec::Pattern)
            .map_err(|e| TableError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// The default formant columns `f0`..`f5`
    pub fn default_formants() -> Self {
        ColumnSpec::names((0..=5).map(|i| format!("f{}", i)))
    }

    /// Resolve against a table; every listed name must exist and a
    /// pattern must match at least one column
    pub fn resolve(&self, table: &FormantTable) -> Result<Vec<String>> {
        match self {
            ColumnSpec::Names(names) => {
                table.require_columns(names)?;
                Ok(names.clone())
            }
            ColumnSpec::Pattern(_) => {
                let matched = self.resolve_present(table);
                if matched.is_empty() {
                    return Err(TableError::NoColumnsMatched(self.to_string()));
                }
                Ok(matched)
            }
        }
    }

    /// The user-supplied expression, without the added anchors
    fn pattern_source(&self) -> Option<String> {
        match self {
            ColumnSpec::Pattern(regex) => {
                let s = regex.as_str();
                Some(
                    s.strip_prefix("^(?:")
                        .and_then(|s| s.strip_suffix(")$"))
                        .unwrap_or(s)
                        .to_string(),
                )
            }
            ColumnSpec::Names(_) => None,
        }
    }

    /// Resolve against a table, silently dropping absent names
    pub fn resolve_present(&self, table: &FormantTable) -> Vec<String> {
        match self {
            ColumnSpec::Names(names) => names
                .iter()
                .filter(|n| table.has_column(n))
                .cloned()
                .collect(),
            ColumnSpec::Pattern(regex) => {
                let mut matched: Vec<String> = table
                    .column_names()
                    .iter()
                    .filter(|n| regex.is_match(n))
                    .cloned()
                    .collect();
                matched.sort();
                matched
            }
        }
    }
}

impl std::fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnSpec::Names(names) => write!(f, "[{}]", names.join(", ")),
            ColumnSpec::Pattern(_) => write!(f, "/{}/", self.pattern_source().unwrap_or_default()),
        }
    }
}

impl PartialEq for ColumnSpec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ColumnSpec::Names(a), ColumnSpec::Names(b)) => a == b,
            (ColumnSpec::Pattern(a), ColumnSpec::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl From<&str> for ColumnSpec {
    fn from(name: &str) -> Self {
        ColumnSpec::name(name)
    }
}

impl From<String> for ColumnSpec {
    fn from(name: String) -> Self {
        ColumnSpec::name(name)
    }
}

impl From<Vec<&str>> for ColumnSpec {
    fn from(names: Vec<&str>) -> Self {
        ColumnSpec::names(names)
    }
}

impl From<Vec<String>> for ColumnSpec {
    fn from(names: Vec<String>) -> Self {
        ColumnSpec::Names(names)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ColumnSpecRepr {
    One(String),
    Many(Vec<String>),
    Pattern { pattern: String },
}

impl TryFrom<ColumnSpecRepr> for ColumnSpec {
    type Error = TableError;

    fn try_from(repr: ColumnSpecRepr) -> Result<Self> {
        match repr {
            ColumnSpecRepr::One(name) => Ok(ColumnSpec::name(name)),
            ColumnSpecRepr::Many(names) => Ok(ColumnSpec::Names(names)),
            ColumnSpecRepr::Pattern { pattern } => ColumnSpec::pattern(&pattern),
        }
    }
}

impl From<ColumnSpec> for ColumnSpecRepr {
    fn from(spec: ColumnSpec) -> Self {
        match spec {
            ColumnSpec::Names(mut names) if names.len() == 1 => {
                ColumnSpecRepr::One(names.remove(0))
            }
            ColumnSpec::Names(names) => ColumnSpecRepr::Many(names),
            pattern @ ColumnSpec::Pattern(_) => ColumnSpecRepr::Pattern {
                pattern: pattern.pattern_source().unwrap_or_default(),
            },
        }
    }
}
