//! CLI for metastrip: strip metadata from PNG/JPEG files or whole directories.

use clap::Parser;
use indexmap::IndexMap;
use metastrip::jpeg::{self, Token};
use metastrip::png;
use metastrip::{detect_format, strip_with_options, Cleaned, ImageFormat, StripOptions};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Parser)]
#[command(name = "metastrip")]
#[command(about = "Remove metadata (EXIF, text chunks, comments, APPn) from PNG and JPEG files", long_about = None)]
struct Args {
    /// Path to a file or directory to process (use -d/--directory to process a whole directory)
    path: Option<String>,

    /// Process a whole directory (optionally with -r to recurse into subdirectories)
    #[arg(short = 'd', long = "directory", value_name = "DIR")]
    directory: Option<String>,

    /// When processing a directory, recurse into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// File extensions to process in a directory (comma-separated). No-extension files are always processed (type guessed from content). Use --all to ignore the filter.
    #[arg(short, long, default_value = "png,jpg,jpeg")]
    extensions: String,

    /// Process all files and guess type from content (ignore extension filter)
    #[arg(long)]
    all: bool,

    /// Write cleaned files here instead of next to the input
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Prefix for cleaned file names
    #[arg(long, default_value = metastrip::CLEANED_PREFIX)]
    prefix: String,

    /// Reject inputs larger than this many bytes
    #[arg(long, default_value_t = metastrip::MAX_INPUT_SIZE)]
    max_size: usize,

    /// Report what would be removed without writing anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// List chunks/segments instead of stripping
    #[arg(long)]
    inspect: bool,

    /// Output JSON per result (one line per file unless --pretty)
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON (use with --json)
    #[arg(long)]
    pretty: bool,

    /// Quiet: only print files that failed or had warnings
    #[arg(short, long)]
    quiet: bool,

    /// Log filter verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn options(&self) -> StripOptions {
        StripOptions {
            max_input_size: Some(self.max_size),
            file_name_prefix: self.prefix.clone(),
        }
    }
}

#[derive(Default)]
struct Totals {
    processed: u64,
    failed: u64,
    bytes_removed: u64,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);
    let exts: HashSet<String> = args
        .extensions
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let path_str = args
        .directory
        .as_ref()
        .or(args.path.as_ref())
        .ok_or("Missing path: give a file/directory as argument or use -d/--directory <DIR>")?;
    let path = Path::new(path_str.as_str());

    if !path.exists() {
        eprintln!("Not found: {}", path.display());
        std::process::exit(1);
    }
    if let Some(ref out) = args.out_dir {
        if !args.dry_run && !args.inspect {
            fs::create_dir_all(out)?;
        }
    }

    let mut totals = Totals::default();

    if path.is_file() {
        if args.directory.is_some() {
            eprintln!("--directory expects a directory, not a file: {}", path.display());
            std::process::exit(1);
        }
        process_file(path, None, &args, &mut totals)?;
    } else if path.is_dir() {
        if !args.quiet {
            eprintln!(
                "Processing directory: {} {}",
                path.display(),
                if args.recursive { "(recursive)" } else { "" }
            );
        }
        process_dir(path, &args, &exts, &mut totals)?;
        if !args.quiet && !args.inspect {
            eprintln!(
                "Processed {} files, {} failed, {} bytes of metadata removed",
                totals.processed, totals.failed, totals.bytes_removed
            );
        }
    } else {
        eprintln!("Not a file or directory: {}", path.display());
        std::process::exit(1);
    }

    if totals.failed > 0 {
        std::process::exit(2);
    }
    Ok(())
}

/// Filter for files found while walking a directory. Files named on the
/// command line are always processed.
fn wanted(path: &Path, all: bool, exts: &HashSet<String>, prefix: &str) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    // No extension => always process (guess from content).
    if !all && !ext.is_empty() && !exts.is_empty() && !exts.contains(&ext) {
        return false;
    }
    // Output of a previous run.
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    prefix.is_empty() || !name.starts_with(prefix)
}

fn process_dir(
    dir: &Path,
    args: &Args,
    exts: &HashSet<String>,
    totals: &mut Totals,
) -> Result<(), Box<dyn std::error::Error>> {
    let walker = if args.recursive {
        WalkDir::new(dir).into_iter()
    } else {
        WalkDir::new(dir).max_depth(1).into_iter()
    };

    let is_hidden = |e: &walkdir::DirEntry| {
        e.depth() > 0 && e.file_name().to_str().is_some_and(|s| s.starts_with('.'))
    };
    for entry in walker.filter_entry(|e| !is_hidden(e)) {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if !wanted(path, args.all, exts, &args.prefix) {
            if !args.quiet {
                eprintln!("Skip: {}", path.display());
            }
            continue;
        }
        if let Err(e) = process_file(path, Some(dir), args, totals) {
            totals.failed += 1;
            eprintln!("FAILED {}: {}", path.display(), e);
        }
    }
    Ok(())
}

/// `root` is the directory being walked, if any; outputs under `--out-dir`
/// keep the input's path relative to it.
fn process_file(
    path: &Path,
    root: Option<&Path>,
    args: &Args,
    totals: &mut Totals,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    if args.inspect {
        print_structure(path, &bytes);
        return Ok(());
    }

    let file_name = path.file_name().and_then(|n| n.to_str());
    totals.processed += 1;
    match strip_with_options(&bytes, None, file_name, &args.options()) {
        Ok(cleaned) => {
            totals.bytes_removed += cleaned.report.bytes_removed() as u64;
            let target = output_path(path, root, args.out_dir.as_deref(), &cleaned.file_name);
            if !args.dry_run {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, &cleaned.data)?;
            }
            print_cleaned(path, &target, &bytes, &cleaned, args)?;
        }
        Err(e) => {
            totals.failed += 1;
            if args.json {
                let mut out = IndexMap::<&str, serde_json::Value>::new();
                out.insert("path", path.display().to_string().into());
                out.insert("sha256", sha256_hex(&bytes).into());
                out.insert("error", e.to_string().into());
                out.insert("kind", e.kind().as_str().into());
                println!("{}", to_json(&out, args.pretty)?);
            } else {
                println!("FAILED {} [{}] {}", path.display(), e.kind().as_str(), e);
            }
        }
    }
    Ok(())
}

fn output_path(
    input: &Path,
    root: Option<&Path>,
    out_dir: Option<&Path>,
    file_name: &str,
) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    let dir = match out_dir {
        Some(out) => {
            let relative = root
                .and_then(|r| parent.strip_prefix(r).ok())
                .unwrap_or_else(|| Path::new(""));
            out.join(relative)
        }
        None => parent.to_path_buf(),
    };
    dir.join(file_name)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn print_cleaned(
    path: &Path,
    target: &Path,
    input: &[u8],
    cleaned: &Cleaned,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = &cleaned.report;
    if args.quiet && report.warnings.is_empty() {
        return Ok(());
    }
    if args.json {
        let mut out = IndexMap::<&str, serde_json::Value>::new();
        out.insert("path", path.display().to_string().into());
        out.insert("output", target.display().to_string().into());
        out.insert("written", (!args.dry_run).into());
        out.insert("sha256", sha256_hex(input).into());
        out.insert("sha256_cleaned", sha256_hex(&cleaned.data).into());
        out.insert("media_type", cleaned.media_type.into());
        out.insert("bytes_in", report.bytes_in.into());
        out.insert("bytes_out", report.bytes_out.into());
        out.insert("records", serde_json::to_value(&report.records)?);
        out.insert("warnings", serde_json::to_value(&report.warnings)?);
        println!("{}", to_json(&out, args.pretty)?);
        return Ok(());
    }

    let verb = if args.dry_run { "WOULD WRITE" } else { "CLEANED" };
    println!(
        "{} {} -> {} ({} -> {} bytes)",
        verb,
        path.display(),
        target.display(),
        report.bytes_in,
        report.bytes_out
    );
    if !args.quiet {
        println!("  format: {}", report.format);
        for r in report.dropped() {
            println!("  - removed {} at {} ({} bytes)", r.name, r.offset, r.size);
        }
    }
    for w in &report.warnings {
        println!("  warning: {}", w);
    }
    Ok(())
}

fn print_structure(path: &Path, bytes: &[u8]) {
    let format = detect_format(bytes);
    println!("{} ({}, {} bytes)", path.display(), format.label(), bytes.len());
    match format {
        ImageFormat::Png => {
            let mut walker = png::chunks(bytes);
            for c in walker.by_ref() {
                println!(
                    "  {:>10}  {}  {:>8} bytes  {}",
                    c.offset,
                    c.name(),
                    c.data.len(),
                    if png::is_retained(&c.tag) { "keep" } else { "drop" }
                );
            }
            println!("  end: {:?}", walker.end());
        }
        ImageFormat::Jpeg => {
            let mut walker = jpeg::segments(bytes);
            let mut scan_bytes = 0usize;
            for token in walker.by_ref() {
                match token {
                    Token::Data { bytes, .. } => scan_bytes += bytes.len(),
                    Token::Standalone { .. } => {}
                    Token::Segment(s) => println!(
                        "  {:>10}  {:<5}  {:>8} bytes  {}",
                        s.offset,
                        s.name(),
                        s.size(),
                        if jpeg::is_metadata_marker(s.marker) { "drop" } else { "keep" }
                    ),
                }
            }
            println!("  scan data: {} bytes", scan_bytes);
            println!("  end: {:?}", walker.end());
        }
        ImageFormat::Unrecognized => println!("  not a PNG or JPEG"),
    }
}
