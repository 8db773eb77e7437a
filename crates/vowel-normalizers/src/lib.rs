//! Vowel Normalizers
//!
//! Speaker, vowel and formant intrinsic/extrinsic normalization of vowel
//! formant data. Every method implements [`Normalizer`], is registered by
//! name in the process-wide registry and can be run in one call through
//! [`normalize`].

mod base;
mod centroid;
mod chain;
mod config;
mod dispatch;
mod error;
mod gender;
mod projection;
mod registry;
mod rename;
mod speaker;
mod transform;
mod vowel;

pub use base::{
    map_formants, run_pipeline, Classification, CommonOptions, FormantColumns, FormantSet,
    FormantSlots, Normalizer, Outputs, Scope, Slot,
};
pub use centroid::{CentroidMethod, CentroidNormalizer};
pub use chain::ChainNormalizer;
pub use config::NormalizerConfig;
pub use dispatch::{normalize, normalize_to, DataSink, DataSource, Method, NormalizeOptions};
pub use error::{NormalizeError, Result};
pub use gender::{BladenNormalizer, NordstromNormalizer};
pub use projection::{Projection, ProjectionNormalizer};
pub use registry::{
    describe, get_normalizer, list_normalizers, register_normalizer, Constructor, MethodInfo,
    Registry, RegistryEntry,
};
pub use rename::{materialize, Rename, RenameTarget, PLACEHOLDER};
pub use speaker::{NearyGmNormalizer, SpeakerMethod, SpeakerNormalizer};
pub use transform::{DefaultNormalizer, Scale, ScaleNormalizer};
pub use vowel::{BarkDifferenceNormalizer, IeGmagmNormalizer, IeHtNormalizer};
