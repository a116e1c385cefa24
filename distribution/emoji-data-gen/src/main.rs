//! Emoji bundle generator
//!
//! Merges the upstream emoji dataset, keyword lexicon and Unicode name table
//! into `sets/<version>/<set>.json` bundles.
//!
//! Run with: cargo run -p emoji-data-gen -- --dataset emoji.json \
//!     --keywords emojilib.json --names unicode-emoji.json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use emoji_catalog::{EmojiVersion, VendorSet};
use emoji_data_gen::{build_matrix, emit_all, IconIndex, Sources};

fn parse_version(value: &str) -> Result<EmojiVersion, String> {
    EmojiVersion::parse(value).ok_or_else(|| format!("unknown emoji version '{}'", value))
}

fn parse_set(value: &str) -> Result<VendorSet, String> {
    VendorSet::parse(value).ok_or_else(|| format!("unknown set '{}'", value))
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Canonical per-emoji dataset (JSON array)
    #[arg(long)]
    dataset: PathBuf,

    /// Keyword lexicon keyed by native emoji
    #[arg(long)]
    keywords: PathBuf,

    /// Unicode name table keyed by native emoji
    #[arg(long)]
    names: PathBuf,

    /// Root of the icon-asset tree used by the fluentui set
    #[arg(long)]
    icons: Option<PathBuf>,

    /// Directory that receives `sets/`
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Merge everything but write nothing
    #[arg(long)]
    dry: bool,

    /// Only build these emoji versions (repeatable)
    #[arg(long = "emoji-version", value_parser = parse_version)]
    versions: Vec<EmojiVersion>,

    /// Only build these sets (repeatable)
    #[arg(long = "set", value_parser = parse_set)]
    sets: Vec<VendorSet>,

    /// Also build the unconstrained `sets/<set>.json` bundles
    #[arg(long)]
    include_latest: bool,

    /// Base URL for icon references (defaults to CDN_BASE env var)
    #[arg(long)]
    cdn_base: Option<String>,

    /// Copy referenced icons here (defaults to COPY_DEST env var)
    #[arg(long)]
    copy_dest: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let sources = Sources::load(&args.dataset, &args.keywords, &args.names)
        .context("Failed to load upstream sources")?;
    println!("Loaded {} records", sources.records.len());

    let versions = if args.versions.is_empty() {
        EmojiVersion::ALL.to_vec()
    } else {
        args.versions.clone()
    };
    let mut sets = if args.sets.is_empty() {
        VendorSet::ALL.to_vec()
    } else {
        args.sets.clone()
    };

    let cdn_base = args
        .cdn_base
        .or_else(|| std::env::var("CDN_BASE").ok())
        .filter(|base| !base.is_empty());
    let copy_dest = args
        .copy_dest
        .or_else(|| std::env::var("COPY_DEST").ok().map(PathBuf::from));

    let icons = match (&args.icons, sets.contains(&VendorSet::Fluentui)) {
        (Some(root), true) => Some(
            IconIndex::load(root, cdn_base.as_deref())
                .with_context(|| format!("Failed to index icons under {}", root.display()))?,
        ),
        (None, true) => {
            log::warn!("No --icons tree given, skipping the fluentui set");
            sets.retain(|set| *set != VendorSet::Fluentui);
            None
        }
        _ => None,
    };

    if let (Some(icons), Some(dest)) = (&icons, &copy_dest) {
        if !args.dry {
            let copied = icons
                .copy_assets(dest)
                .with_context(|| format!("Failed to copy icons to {}", dest.display()))?;
            println!("Copied {} icons to {}", copied, dest.display());
        }
    }

    let plan = build_matrix(&versions, &sets, args.include_latest);

    let pb = ProgressBar::new(plan.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )?
            .progress_chars("#>-"),
    );

    let report = emit_all(
        &sources,
        icons.as_ref(),
        &plan,
        &args.out_dir,
        args.dry,
        Some(&pb),
    )
    .context("Bundle build failed")?;

    pb.finish_with_message("Build complete");
    if args.dry {
        println!("Dry run: built {} bundles, nothing written", report.bundles);
    } else {
        println!(
            "Wrote {} bundles ({} emoji total) to {}",
            report.written.len(),
            report.emojis,
            args.out_dir.join(emoji_data_gen::emit::SETS_DIR).display()
        );
    }
    Ok(())
}
