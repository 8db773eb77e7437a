//! Normalizer registry
//!
//! Maps method names to constructors. The process-wide registry is created
//! with every built-in method on first use and can be extended at runtime.

use crate::base::{Classification, Normalizer, Scope};
use crate::centroid::{CentroidMethod, CentroidNormalizer};
use crate::chain::ChainNormalizer;
use crate::config::NormalizerConfig;
use crate::error::{NormalizeError, Result};
use crate::gender::{BladenNormalizer, NordstromNormalizer};
use crate::projection::{Projection, ProjectionNormalizer};
use crate::speaker::{NearyGmNormalizer, SpeakerMethod, SpeakerNormalizer};
use crate::transform::{DefaultNormalizer, Scale, ScaleNormalizer};
use crate::vowel::{BarkDifferenceNormalizer, IeGmagmNormalizer, IeHtNormalizer};
use formant_stats::BarkMethod;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

/// Builds a normalizer from parameters
pub type Constructor =
    Arc<dyn Fn(&NormalizerConfig) -> Result<Box<dyn Normalizer>> + Send + Sync>;

/// A registered method
#[derive(Clone)]
pub struct RegistryEntry {
    classification: Classification,
    summary: String,
    constructor: Constructor,
}

impl RegistryEntry {
    /// Create an entry
    pub fn new<F>(
        classification: Classification,
        summary: impl Into<String>,
        constructor: F,
    ) -> Self
    where
        F: Fn(&NormalizerConfig) -> Result<Box<dyn Normalizer>> + Send + Sync + 'static,
    {
        Self {
            classification,
            summary: summary.into(),
            constructor: Arc::new(constructor),
        }
    }

    /// Construct a normalizer
    pub fn build(&self, config: &NormalizerConfig) -> Result<Box<dyn Normalizer>> {
        (self.constructor)(config)
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("classification", &self.classification)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

/// Description of a registered method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodInfo {
    pub name: String,
    pub classification: Classification,
    pub summary: String,
}

/// Name to constructor map with prefix lookup
#[derive(Debug, Default, Clone)]
pub struct Registry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in method
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, entry) in builtins() {
            // Built-in names are distinct
            let _ = registry.register(name, entry);
        }
        registry
    }

    /// Add a method; names are case-insensitive and must be unique
    pub fn register(&mut self, name: &str, entry: RegistryEntry) -> Result<()> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return Err(NormalizeError::NoMethod);
        }
        if self.entries.contains_key(&key) {
            return Err(NormalizeError::DuplicateName(key));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Canonical name for a (possibly abbreviated) method name.
    ///
    /// An exact match wins; otherwise the name must be a prefix of exactly
    /// one registered name.
    pub fn resolve(&self, name: &str) -> Result<&str> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Err(NormalizeError::NoMethod);
        }
        if let Some((key, _)) = self.entries.get_key_value(&needle) {
            return Ok(key);
        }
        let candidates: Vec<&String> = self
            .entries
            .keys()
            .filter(|k| k.starts_with(&needle))
            .collect();
        match candidates.as_slice() {
            [] => Err(NormalizeError::UnknownName(name.to_string())),
            [only] => Ok(only.as_str()),
            many => Err(NormalizeError::AmbiguousName {
                name: name.to_string(),
                candidates: many.iter().map(|c| c.to_string()).collect(),
            }),
        }
    }

    /// Entry for a method name
    pub fn get(&self, name: &str) -> Result<&RegistryEntry> {
        let key = self.resolve(name)?;
        self.entries
            .get(key)
            .ok_or_else(|| NormalizeError::UnknownName(name.to_string()))
    }

    /// Construct a normalizer by name
    pub fn create(&self, name: &str, config: &NormalizerConfig) -> Result<Box<dyn Normalizer>> {
        self.get(name)?.build(config)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Description of a method
    pub fn describe(&self, name: &str) -> Result<MethodInfo> {
        let key = self.resolve(name)?.to_string();
        let entry = self.get(&key)?;
        Ok(MethodInfo {
            name: key,
            classification: entry.classification,
            summary: entry.summary.clone(),
        })
    }
}

static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();

fn registry() -> &'static RwLock<Registry> {
    REGISTRY.get_or_init(|| RwLock::new(Registry::with_builtins()))
}

fn entry(name: &str) -> Result<RegistryEntry> {
    let guard = registry()
        .read()
        .map_err(|_| NormalizeError::RegistryPoisoned)?;
    guard.get(name).cloned()
}

/// Construct a normalizer from the process-wide registry
pub fn get_normalizer(name: &str, config: &NormalizerConfig) -> Result<Box<dyn Normalizer>> {
    // The lock is released before building, chain constructors look up
    // their steps
    let entry = entry(name)?;
    let normalizer = entry.build(config)?;
    debug!("Resolved normalizer {} to {}", name, normalizer.name());
    Ok(normalizer)
}

/// Names in the process-wide registry, sorted
pub fn list_normalizers() -> Result<Vec<String>> {
    let guard = registry()
        .read()
        .map_err(|_| NormalizeError::RegistryPoisoned)?;
    Ok(guard.names())
}

/// Describe a method in the process-wide registry
pub fn describe(name: &str) -> Result<MethodInfo> {
    let guard = registry()
        .read()
        .map_err(|_| NormalizeError::RegistryPoisoned)?;
    guard.describe(name)
}

/// Add a method to the process-wide registry
pub fn register_normalizer<F>(
    name: &str,
    classification: Classification,
    summary: impl Into<String>,
    constructor: F,
) -> Result<()>
where
    F: Fn(&NormalizerConfig) -> Result<Box<dyn Normalizer>> + Send + Sync + 'static,
{
    let mut guard = registry()
        .write()
        .map_err(|_| NormalizeError::RegistryPoisoned)?;
    guard.register(name, RegistryEntry::new(classification, summary, constructor))
}

fn boxed<N: Normalizer + 'static>(normalizer: N) -> Result<Box<dyn Normalizer>> {
    Ok(Box::new(normalizer))
}

fn builtins() -> Vec<(&'static str, RegistryEntry)> {
    use Scope::{Extrinsic as E, Intrinsic as I, None as N};
    let class = Classification::new;

    let mut entries = vec![
        (
            "default",
            RegistryEntry::new(class(N, N, N), "Formants returned unaltered", |c| {
                boxed(DefaultNormalizer::from_config(c))
            }),
        ),
        (
            "chain",
            RegistryEntry::new(class(N, N, N), "Named normalizers run in sequence", |c| {
                // Steps overwrite in place; the chain applies `rename` once
                let step_config = NormalizerConfig {
                    rename: None,
                    ..c.clone()
                };
                let steps = c
                    .normalizers
                    .iter()
                    .map(|name| get_normalizer(name, &step_config))
                    .collect::<Result<Vec<_>>>()?;
                boxed(ChainNormalizer::with_options(steps, c.common()))
            }),
        ),
        (
            "barkdiff",
            RegistryEntry::new(class(I, E, I), "Bark differences of consecutive formants", |c| {
                boxed(BarkDifferenceNormalizer::from_config(c))
            }),
        ),
        (
            "ie-gmagm",
            RegistryEntry::new(
                class(I, E, E),
                "Geometric mean normalization, mean denormalization",
                |c| boxed(IeGmagmNormalizer::from_config(c)),
            ),
        ),
        (
            "ie-ht",
            RegistryEntry::new(
                class(I, E, E),
                "Hypothesis-testing normalization with relabelling",
                |c| boxed(IeHtNormalizer::from_config(c)),
            ),
        ),
        (
            "nearygm",
            RegistryEntry::new(class(E, E, I), "Log formants minus the grand log mean", |c| {
                boxed(NearyGmNormalizer::from_config(false, c))
            }),
        ),
        (
            "nearygm-exp",
            RegistryEntry::new(class(E, E, I), "Exponentiated nearygm", |c| {
                boxed(NearyGmNormalizer::from_config(true, c))
            }),
        ),
        (
            "bladen",
            RegistryEntry::new(
                class(I, I, E),
                "Bark formants, one Bark lower for female speakers",
                |c| boxed(BladenNormalizer::from_config(c)?),
            ),
        ),
        (
            "nordstrom",
            RegistryEntry::new(
                class(I, I, E),
                "Female formants scaled by the male/female open-vowel F3 ratio",
                |c| boxed(NordstromNormalizer::from_config(c)?),
            ),
        ),
        (
            "pca",
            RegistryEntry::new(class(E, E, E), "Principal component projection", |c| {
                boxed(ProjectionNormalizer::from_config(Projection::Pca, c)?)
            }),
        ),
        (
            "lda",
            RegistryEntry::new(
                class(E, E, E),
                "Linear discriminant projection on vowel labels",
                |c| boxed(ProjectionNormalizer::from_config(Projection::Lda, c)?),
            ),
        ),
    ];

    for scale in [
        Scale::Log,
        Scale::Log10,
        Scale::Bark(BarkMethod::default()),
        Scale::Erb,
        Scale::Mel,
    ] {
        entries.push((
            scale.name(),
            RegistryEntry::new(class(I, I, I), format!("Hz to {} scale", scale.name()), move |c| {
                boxed(ScaleNormalizer::from_config(scale, c))
            }),
        ));
    }

    for (name, method, summary) in [
        ("gerstman", SpeakerMethod::Gerstman, "Per-speaker range scaling to 0..999"),
        ("lce", SpeakerMethod::Lce, "Per-speaker scaling by the maximum"),
        ("lobanov", SpeakerMethod::Lobanov, "Per-speaker z-scores"),
        ("neary", SpeakerMethod::Neary { exp: false }, "Per-speaker log-mean subtraction"),
        ("neary-exp", SpeakerMethod::Neary { exp: true }, "Exponentiated neary"),
    ] {
        entries.push((
            name,
            RegistryEntry::new(class(E, I, I), summary, move |c| {
                boxed(SpeakerNormalizer::from_config(method, c))
            }),
        ));
    }

    for (method, summary) in [
        (CentroidMethod::Centroid, "Division by the centroid of the apex vowels"),
        (CentroidMethod::ConvexHull, "Division by the barycentre of the vowel-space hull"),
        (CentroidMethod::WattFabricius1, "Watt & Fabricius S-centroid"),
        (CentroidMethod::WattFabricius2, "Watt & Fabricius, F2 from fleece and goose"),
        (CentroidMethod::WattFabricius3, "Watt & Fabricius, goose from minimum vowel means"),
        (CentroidMethod::Bigham, "Bigham's trapezoid centroid"),
        (CentroidMethod::Schwa, "Proportional distance from schwa"),
    ] {
        entries.push((
            method.name(),
            RegistryEntry::new(class(E, I, I), summary, move |c| {
                boxed(CentroidNormalizer::from_config(method, c))
            }),
        ));
    }

    entries
}
