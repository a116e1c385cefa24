//! Bundle emission
//!
//! Every (version, set) pair gets its own file so a client can download the
//! smallest bundle its platform renders:
//!
//! ```text
//! sets/<version>/<set>.json   capped at <version>
//! sets/<set>.json             unconstrained
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use rayon::prelude::*;

use emoji_catalog::models::Bundle;
use emoji_catalog::{EmojiVersion, VendorSet};

use crate::icons::IconIndex;
use crate::merge::{build_bundle, BuildError, BuildResult, BuildTarget};
use crate::sources::Sources;

pub const SETS_DIR: &str = "sets";

#[derive(Debug, Default)]
pub struct EmitReport {
    pub bundles: usize,
    pub emojis: usize,
    /// Empty on a dry run
    pub written: Vec<PathBuf>,
}

pub fn bundle_path(root: &Path, target: &BuildTarget) -> PathBuf {
    let file = format!("{}.json", target.set);
    match target.version {
        Some(version) => root.join(SETS_DIR).join(version.to_string()).join(file),
        None => root.join(SETS_DIR).join(file),
    }
}

pub fn write_bundle(path: &Path, bundle: &Bundle) -> BuildResult<()> {
    let io_error = |source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let json = serde_json::to_vec(bundle)?;
    fs::write(path, json).map_err(io_error)
}

/// Version-major ordering: every set for the first version, then the next.
pub fn build_matrix(
    versions: &[EmojiVersion],
    sets: &[VendorSet],
    include_latest: bool,
) -> Vec<BuildTarget> {
    let mut plan: Vec<BuildTarget> = versions
        .iter()
        .flat_map(|version| {
            sets.iter()
                .map(move |set| BuildTarget::new(Some(*version), *set))
        })
        .collect();
    if include_latest {
        plan.extend(sets.iter().map(|set| BuildTarget::new(None, *set)));
    }
    plan
}

/// Build and write every target in `plan`.
///
/// The `sets` directory under `out_dir` is cleared first unless `dry_run`.
/// The first failing target aborts the run.
pub fn emit_all(
    sources: &Sources,
    icons: Option<&IconIndex>,
    plan: &[BuildTarget],
    out_dir: &Path,
    dry_run: bool,
    progress: Option<&ProgressBar>,
) -> BuildResult<EmitReport> {
    if !dry_run {
        let sets_dir = out_dir.join(SETS_DIR);
        match fs::remove_dir_all(&sets_dir) {
            Ok(()) => log::info!("Cleared {}", sets_dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(BuildError::Io {
                    path: sets_dir,
                    source,
                })
            }
        }
    }

    let results = plan
        .par_iter()
        .map(|target| -> BuildResult<(usize, Option<PathBuf>)> {
            let bundle = build_bundle(sources, target, icons)?;
            let count = bundle.emojis.len();
            let written = if dry_run {
                log::info!("[dry] {}: {} emoji", target, count);
                None
            } else {
                let path = bundle_path(out_dir, target);
                write_bundle(&path, &bundle)?;
                log::info!("Wrote {} ({} emoji)", path.display(), count);
                Some(path)
            };
            if let Some(pb) = progress {
                pb.inc(1);
            }
            Ok((count, written))
        })
        .collect::<BuildResult<Vec<_>>>()?;

    let mut report = EmitReport::default();
    for (count, written) in results {
        report.bundles += 1;
        report.emojis += count;
        report.written.extend(written);
    }
    Ok(report)
}
