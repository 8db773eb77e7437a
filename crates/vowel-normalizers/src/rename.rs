//! Output column naming
//!
//! Normalizers produce one output per source column (or new columns such
//! as `z1`). A [`Rename`] directive decides where each output is written.

use crate::error::Result;
use formant_table::{Column, FormantTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder replaced by the source column name in templates
pub const PLACEHOLDER: &str = "{}";

/// How normalized outputs are named
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RenameRepr", into = "RenameRepr")]
pub enum Rename {
    /// Every `{}` replaced by the source name, e.g. `{}_N`
    Template(String),
    /// `prefix1`, `prefix2`, ... numbered in output order
    Prefix(String),
    /// Per-column directives; unlisted columns keep their name
    Map(BTreeMap<String, RenameTarget>),
}

/// Per-column directive in a [`Rename::Map`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameTarget {
    /// Write to this column
    To(String),
    /// Write under the source name
    Keep,
    /// Do not write the output
    Remove,
}

impl Rename {
    /// Template if the text contains `{}`, prefix otherwise
    pub fn parse(text: &str) -> Self {
        if text.contains(PLACEHOLDER) {
            Rename::Template(text.to_string())
        } else {
            Rename::Prefix(text.to_string())
        }
    }

    /// Map directive from `(source, destination)` pairs
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Rename::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), RenameTarget::To(v.into())))
                .collect(),
        )
    }

    /// Destination for the `index`-th output (1-based) of `source`;
    /// `None` when the output is dropped
    pub fn destination(&self, source: &str, index: usize) -> Option<String> {
        match self {
            Rename::Template(template) => Some(template.replace(PLACEHOLDER, source)),
            Rename::Prefix(prefix) => Some(format!("{}{}", prefix, index)),
            Rename::Map(map) => match map.get(source) {
                Some(RenameTarget::To(dest)) => Some(dest.clone()),
                Some(RenameTarget::Remove) => None,
                Some(RenameTarget::Keep) | None => Some(source.to_string()),
            },
        }
    }
}

impl From<&str> for Rename {
    fn from(text: &str) -> Self {
        Rename::parse(text)
    }
}

/// Write outputs into `table`, returning the columns written.
///
/// Without a directive outputs overwrite their source column. A destination
/// that already exists is replaced in place, others are appended.
pub fn materialize(
    table: &mut FormantTable,
    outputs: Vec<(String, Column)>,
    rename: Option<&Rename>,
) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(outputs.len());
    for (k, (source, column)) in outputs.into_iter().enumerate() {
        let dest = match rename {
            Some(rename) => rename.destination(&source, k + 1),
            None => Some(source),
        };
        if let Some(dest) = dest {
            table.set_column(dest.clone(), column)?;
            written.push(dest);
        }
    }
    Ok(written)
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RenameRepr {
    Text(String),
    Map(BTreeMap<String, TargetRepr>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TargetRepr {
    Name(String),
    Flag(bool),
}

impl From<RenameRepr> for Rename {
    fn from(repr: RenameRepr) -> Self {
        match repr {
            RenameRepr::Text(text) => Rename::parse(&text),
            RenameRepr::Map(map) => Rename::Map(
                map.into_iter()
                    .map(|(k, v)| {
                        let target = match v {
                            TargetRepr::Name(name) => RenameTarget::To(name),
                            TargetRepr::Flag(true) => RenameTarget::Keep,
                            TargetRepr::Flag(false) => RenameTarget::Remove,
                        };
                        (k, target)
                    })
                    .collect(),
            ),
        }
    }
}

impl From<Rename> for RenameRepr {
    fn from(rename: Rename) -> Self {
        match rename {
            Rename::Template(text) | Rename::Prefix(text) => RenameRepr::Text(text),
            Rename::Map(map) => RenameRepr::Map(
                map.into_iter()
                    .map(|(k, v)| {
                        let repr = match v {
                            RenameTarget::To(name) => TargetRepr::Name(name),
                            RenameTarget::Keep => TargetRepr::Flag(true),
                            RenameTarget::Remove => TargetRepr::Flag(false),
                        };
                        (k, repr)
                    })
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FormantTable {
        FormantTable::from_columns(vec![
            ("speaker", Column::from(vec!["s1", "s1"])),
            ("f1", Column::from(vec![500.0, 600.0])),
            ("f2", Column::from(vec![1500.0, 1600.0])),
        ])
        .unwrap()
    }

    fn outputs() -> Vec<(String, Column)> {
        vec![
            ("f1".to_string(), Column::from(vec![1.0, 2.0])),
            ("f2".to_string(), Column::from(vec![3.0, 4.0])),
        ]
    }

    #[test]
    fn test_parse_template_or_prefix() {
        assert_eq!(Rename::parse("{}_N"), Rename::Template("{}_N".into()));
        assert_eq!(Rename::parse("pc"), Rename::Prefix("pc".into()));
    }

    #[test]
    fn test_absent_overwrites_in_place() {
        let mut t = table();
        materialize(&mut t, outputs(), None).unwrap();
        assert_eq!(t.column_names(), &["speaker", "f1", "f2"]);
        assert_eq!(t.numeric("f1").unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_template_appends() {
        let mut t = table();
        let written = materialize(&mut t, outputs(), Some(&"{}_N".into())).unwrap();
        assert_eq!(written, vec!["f1_N", "f2_N"]);
        assert_eq!(t.numeric("f1").unwrap(), &[500.0, 600.0]);
        assert_eq!(t.numeric("f2_N").unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn test_template_repeats_placeholder() {
        let rename = Rename::parse("{}-{}");
        assert_eq!(rename.destination("f1", 1).unwrap(), "f1-f1");
    }

    #[test]
    fn test_prefix_numbers_outputs() {
        let mut t = table();
        let written = materialize(&mut t, outputs(), Some(&"pc".into())).unwrap();
        assert_eq!(written, vec!["pc1", "pc2"]);
    }

    #[test]
    fn test_map_with_remove() {
        let mut map = BTreeMap::new();
        map.insert("f1".to_string(), RenameTarget::To("F1".into()));
        map.insert("f2".to_string(), RenameTarget::Remove);
        let mut t = table();
        let written = materialize(&mut t, outputs(), Some(&Rename::Map(map))).unwrap();
        assert_eq!(written, vec!["F1"]);
        assert_eq!(t.numeric("f2").unwrap(), &[1500.0, 1600.0]);
        assert!(t.has_column("F1"));
    }

    #[test]
    fn test_map_unlisted_keeps_name() {
        let rename = Rename::map([("f1", "F1")]);
        assert_eq!(rename.destination("f2", 2).unwrap(), "f2");
    }

    #[test]
    fn test_serde_forms() {
        let template: Rename = serde_json::from_str(r#""{}*""#).unwrap();
        assert_eq!(template, Rename::Template("{}*".into()));
        let map: Rename =
            serde_json::from_str(r#"{"z1": "f1-f0", "z2": false, "z3": true}"#).unwrap();
        assert_eq!(map.destination("z1", 1).unwrap(), "f1-f0");
        assert!(map.destination("z2", 2).is_none());
        assert_eq!(map.destination("z3", 3).unwrap(), "z3");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"z1":"f1-f0","z2":false,"z3":true}"#);
    }
}
