//! One-call normalization of files, readers and tables

use crate::base::Normalizer;
use crate::config::NormalizerConfig;
use crate::error::Result;
use crate::registry::get_normalizer;
use crate::rename::Rename;
use formant_table::{delimiter, read_csv, read_csv_path, write_csv, write_csv_path, FormantTable};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Where the input table comes from
pub enum DataSource {
    /// Delimited file
    Path(PathBuf),
    /// Delimited text stream
    Reader(Box<dyn Read>),
    /// Table already in memory
    Table(FormantTable),
}

impl From<PathBuf> for DataSource {
    fn from(path: PathBuf) -> Self {
        DataSource::Path(path)
    }
}

impl From<&std::path::Path> for DataSource {
    fn from(path: &std::path::Path) -> Self {
        DataSource::Path(path.to_path_buf())
    }
}

impl From<FormantTable> for DataSource {
    fn from(table: FormantTable) -> Self {
        DataSource::Table(table)
    }
}

/// Where the output table goes
pub enum DataSink {
    Path(PathBuf),
    Writer(Box<dyn Write>),
}

impl From<PathBuf> for DataSink {
    fn from(path: PathBuf) -> Self {
        DataSink::Path(path)
    }
}

impl From<&std::path::Path> for DataSink {
    fn from(path: &std::path::Path) -> Self {
        DataSink::Path(path.to_path_buf())
    }
}

/// Normalization method: a registry name or a ready instance
#[derive(Debug)]
pub enum Method {
    Name(String),
    Instance(Box<dyn Normalizer>),
}

impl From<&str> for Method {
    fn from(name: &str) -> Self {
        Method::Name(name.to_string())
    }
}

impl From<String> for Method {
    fn from(name: String) -> Self {
        Method::Name(name)
    }
}

impl From<Box<dyn Normalizer>> for Method {
    fn from(normalizer: Box<dyn Normalizer>) -> Self {
        Method::Instance(normalizer)
    }
}

/// Options of [`normalize`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Input delimiter
    pub sep: char,
    /// Output delimiter
    pub output_sep: char,
    /// Grouping columns; overrides `params.groupby` when set, so an empty
    /// list clears it
    pub groupby: Option<Vec<String>>,
    /// Output naming; overrides `params.rename` when set
    pub rename: Option<Rename>,
    /// Normalizer parameters
    pub params: NormalizerConfig,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            sep: ',',
            output_sep: ',',
            groupby: None,
            rename: None,
            params: NormalizerConfig::default(),
        }
    }
}

impl NormalizeOptions {
    /// Parameters with the option-level overrides applied
    pub fn effective_params(&self) -> NormalizerConfig {
        let mut params = self.params.clone();
        if let Some(groupby) = &self.groupby {
            params.groupby = groupby.clone();
        }
        if let Some(rename) = &self.rename {
            params.rename = Some(rename.clone());
        }
        params
    }

    fn has_overrides(&self) -> bool {
        self.groupby.is_some() || self.rename.is_some()
    }
}

fn load(source: DataSource, sep: char) -> Result<FormantTable> {
    let table = match source {
        DataSource::Path(path) => read_csv_path(&path, delimiter(sep)?)?,
        DataSource::Reader(reader) => read_csv(reader, delimiter(sep)?)?,
        DataSource::Table(table) => table,
    };
    Ok(table)
}

/// Normalize a table with the given method
pub fn normalize(
    source: impl Into<DataSource>,
    method: impl Into<Method>,
    options: &NormalizeOptions,
) -> Result<FormantTable> {
    let started = Instant::now();
    let table = load(source.into(), options.sep)?;
    let normalizer = match method.into() {
        Method::Name(name) => get_normalizer(&name, &options.effective_params())?,
        Method::Instance(normalizer) => {
            if options.has_overrides() {
                warn!(
                    "{}: groupby/rename options are ignored for normalizer instances",
                    normalizer.name()
                );
            }
            normalizer
        }
    };
    let output = normalizer.normalize(&table)?;
    info!(
        "{}: normalized {} rows, {} -> {} columns in {:?}",
        normalizer.name(),
        output.n_rows(),
        table.n_columns(),
        output.n_columns(),
        started.elapsed()
    );
    Ok(output)
}

/// Normalize and write the result with `options.output_sep`
pub fn normalize_to(
    source: impl Into<DataSource>,
    sink: impl Into<DataSink>,
    method: impl Into<Method>,
    options: &NormalizeOptions,
) -> Result<()> {
    let output = normalize(source, method, options)?;
    let sep = delimiter(options.output_sep)?;
    match sink.into() {
        DataSink::Path(path) => write_csv_path(&output, &path, sep)?,
        DataSink::Writer(writer) => write_csv(&output, writer, sep)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NormalizeError;
    use crate::speaker::{SpeakerMethod, SpeakerNormalizer};
    use formant_table::{Column, TableError};
    use std::io::Cursor;

    const DATA: &str = "speaker;vowel;f1;f2\n\
                        a;i;300;2300\n\
                        a;a;800;1300\n\
                        b;i;350;2500\n\
                        b;a;900;1500\n";

    #[test]
    fn test_reader_with_semicolons() {
        let options = NormalizeOptions {
            sep: ';',
            ..Default::default()
        };
        let out = normalize(
            DataSource::Reader(Box::new(Cursor::new(DATA))),
            "lobanov",
            &options,
        )
        .unwrap();
        assert_eq!(out.n_rows(), 4);
        let f1 = out.numeric("f1").unwrap();
        assert!((f1[0] + f1[1]).abs() < 1e-9);
        assert_eq!(out.labels("vowel").unwrap(), vec!["i", "a", "i", "a"]);
    }

    #[test]
    fn test_option_rename_overrides_params() {
        let table = FormantTable::from_columns(vec![("f1", Column::from(vec![500.0]))]).unwrap();
        let options = NormalizeOptions {
            rename: Some("{}_log".into()),
            params: NormalizerConfig {
                rename: Some("{}_ignored".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let out = normalize(table, "log10", &options).unwrap();
        assert!((out.numeric("f1_log").unwrap()[0] - 500f64.log10()).abs() < 1e-12);
        assert!(!out.has_column("f1_ignored"));
    }

    fn corpora() -> FormantTable {
        FormantTable::from_columns(vec![
            ("corpus", Column::from(vec!["c1", "c2", "c1", "c2"])),
            ("dialect", Column::from(vec!["d", "d", "d", "d"])),
            ("speaker", Column::from(vec!["s", "s", "s", "s"])),
            ("f1", Column::from(vec![100.0, 400.0, 300.0, 600.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_option_groupby_overrides_params() {
        let options = NormalizeOptions {
            groupby: Some(vec!["corpus".to_string()]),
            params: NormalizerConfig {
                groupby: vec!["dialect".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(options.effective_params().groupby, vec!["corpus"]);
        let out = normalize(corpora(), "gerstman", &options).unwrap();
        assert_eq!(out.numeric("f1").unwrap(), &[0.0, 0.0, 999.0, 999.0]);
    }

    #[test]
    fn test_empty_option_groupby_clears_params() {
        let options = NormalizeOptions {
            groupby: Some(Vec::new()),
            params: NormalizerConfig {
                groupby: vec!["corpus".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(options.effective_params().groupby.is_empty());
        let out = normalize(corpora(), "gerstman", &options).unwrap();
        let f1 = out.numeric("f1").unwrap();
        for (value, expected) in f1.iter().zip([0.0, 599.4, 399.6, 999.0]) {
            assert!((value - expected).abs() < 1e-9);
        }

        let unset = NormalizeOptions {
            params: NormalizerConfig {
                groupby: vec!["corpus".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(unset.effective_params().groupby, vec!["corpus"]);
    }

    #[test]
    fn test_instance_method() {
        let table = FormantTable::from_columns(vec![
            ("speaker", Column::from(vec!["a", "a"])),
            ("f1", Column::from(vec![200.0, 400.0])),
        ])
        .unwrap();
        let method: Box<dyn Normalizer> = Box::new(SpeakerNormalizer::new(SpeakerMethod::Lce));
        let out = normalize(table, method, &NormalizeOptions::default()).unwrap();
        assert_eq!(out.numeric("f1").unwrap(), &[0.5, 1.0]);
    }

    #[test]
    fn test_file_round_trip_uses_output_sep() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, DATA).unwrap();
        let options = NormalizeOptions {
            sep: ';',
            ..Default::default()
        };
        normalize_to(input.as_path(), output.as_path(), "neary", &options).unwrap();
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("speaker,vowel,f1,f2"));
    }

    #[test]
    fn test_unknown_method() {
        let table = FormantTable::from_columns(vec![("f1", Column::from(vec![1.0]))]).unwrap();
        assert!(matches!(
            normalize(table, "nonexistent", &NormalizeOptions::default()),
            Err(NormalizeError::UnknownName(_))
        ));
    }

    #[test]
    fn test_non_ascii_delimiter() {
        let options = NormalizeOptions {
            sep: '§',
            ..Default::default()
        };
        assert!(matches!(
            normalize(PathBuf::from("missing.csv"), "log", &options),
            Err(NormalizeError::Table(TableError::InvalidDelimiter('§')))
        ));
    }
}
