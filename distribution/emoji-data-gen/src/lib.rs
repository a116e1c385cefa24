//! Offline bundle builder
//!
//! Merges the upstream emoji dataset, keyword lexicon and Unicode name table
//! into one bundle per (emoji version, vendor set) and writes them under
//! `sets/`.

pub mod emit;
pub mod icons;
pub mod merge;
pub mod sources;
pub mod text;

pub use emit::{build_matrix, bundle_path, emit_all, write_bundle, EmitReport};
pub use icons::IconIndex;
pub use merge::{build_bundle, BuildError, BuildResult, BuildTarget};
pub use sources::{SourceError, SourceResult, Sources};
