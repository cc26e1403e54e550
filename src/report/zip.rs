use crate::core::error::Result;
use crate::core::model::GeneratedArtifactSet;
use anyhow::Context;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Download name for a bundle assembled at `now`.
pub fn bundle_file_name(now: NaiveDateTime) -> String {
    format!("ParGaMD_full_WE_bundle_{}.zip", now.format("%Y%m%d_%H%M%S"))
}

/// Subtrees of a prepared simulation directory copied into every bundle.
pub const INCLUDE_DIRS: [&str; 4] = ["cMD", "common_files", "bstates", "westpa_scripts"];

/// Root-level files copied when present.
pub const INCLUDE_ROOT_FILES: [&str; 10] = [
    "west.cfg",
    "run_WE.sh",
    "env.sh",
    "node.sh",
    "init.sh",
    "run_data.sh",
    "data_extract.py",
    "nodefilelist.txt",
    "simtime.py",
    "tstate.file",
];

#[derive(Clone, Debug)]
pub struct BundleLayout {
    pub root: PathBuf,
    pub include_dirs: Vec<String>,
    pub include_root_files: Vec<String>,
}

impl BundleLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_dirs: INCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            include_root_files: INCLUDE_ROOT_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BundleSummary {
    pub static_files: usize,
    pub overridden: usize,
    pub generated: usize,
}

/// Writes static files first, skipping any path a generated artifact will
/// supply, then every generated artifact. Each path appears exactly once and
/// generated content always wins.
pub fn write_bundle<W: Write + Seek>(
    writer: W,
    layout: &BundleLayout,
    artifacts: &GeneratedArtifactSet,
) -> Result<(W, BundleSummary)> {
    let generated: BTreeSet<String> = artifacts.keys().map(|k| normalize(k)).collect();
    let mut summary = BundleSummary::default();
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for (src, rel) in static_entries(layout)? {
        if generated.contains(&rel) {
            trace!(path = %rel, "static file replaced by generated artifact");
            summary.overridden += 1;
            continue;
        }
        let meta = fs::metadata(&src)?;
        zip.start_file(rel.as_str(), options.unix_permissions(file_mode(&meta)))?;
        let mut file = File::open(&src)?;
        io::copy(&mut file, &mut zip)?;
        summary.static_files += 1;
    }

    for (path, content) in artifacts {
        let mode = if path.ends_with(".sh") { 0o755 } else { 0o644 };
        zip.start_file(normalize(path), options.unix_permissions(mode))?;
        zip.write_all(content.as_bytes())?;
        summary.generated += 1;
    }

    let writer = zip.finish()?;
    debug!(
        static_files = summary.static_files,
        overridden = summary.overridden,
        generated = summary.generated,
        "bundle assembled"
    );
    Ok((writer, summary))
}

pub fn bundle_bytes(layout: &BundleLayout, artifacts: &GeneratedArtifactSet) -> Result<Vec<u8>> {
    let (cursor, _) = write_bundle(Cursor::new(Vec::new()), layout, artifacts)?;
    Ok(cursor.into_inner())
}

/// Writes the bundle next to `zip_path` and renames it into place, so a
/// failed run never leaves a truncated archive behind.
pub fn write_bundle_file(
    zip_path: &Path,
    layout: &BundleLayout,
    artifacts: &GeneratedArtifactSet,
) -> anyhow::Result<BundleSummary> {
    let mut tmp_name = zip_path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let file = File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    match write_bundle(file, layout, artifacts) {
        Ok((_, summary)) => {
            fs::rename(&tmp_path, zip_path)
                .with_context(|| format!("failed to move zip to {}", zip_path.display()))?;
            Ok(summary)
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(e).context("failed to assemble bundle")
        }
    }
}

/// Existing static files in archive order: include subtrees (sorted walk),
/// then listed root files. Missing entries are skipped.
fn static_entries(layout: &BundleLayout) -> Result<Vec<(PathBuf, String)>> {
    let mut out = Vec::new();
    for dir in &layout.include_dirs {
        let path = layout.root.join(dir);
        if !path.is_dir() {
            trace!(dir = %dir, "include directory absent");
            continue;
        }
        collect_tree(&path, &normalize(dir), &mut out)?;
    }
    for name in &layout.include_root_files {
        let path = layout.root.join(name);
        if path.is_file() {
            out.push((path, normalize(name)));
        }
    }
    Ok(out)
}

fn collect_tree(dir: &Path, rel: &str, out: &mut Vec<(PathBuf, String)>) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        let rel_path = format!("{}/{}", rel, entry.file_name().to_string_lossy());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_tree(&path, &rel_path, out)?;
        } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            out.push((path, rel_path));
        }
    }
    Ok(())
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(_meta: &fs::Metadata) -> u32 {
    0o644
}
