//! Category directory renaming
//!
//! Gives every video of one category a uniform name,
//! `word-<word>-<NNN>.<ext>`, numbered in file name order.

use signaug_core::{Error, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Extension used for files that have none
const FALLBACK_EXTENSION: &str = "mp4";

/// Renames every visible file of `dir` and returns the `(from, to)` pairs.
///
/// Numbering starts at `start`. With `dry_run` the plan is returned without
/// touching the disk. Renames go through temporary names, so a target that
/// is another file's current name is never clobbered.
pub fn rename(dir: &Path, word: &str, start: u32, dry_run: bool) -> Result<Vec<(PathBuf, PathBuf)>> {
    let plan = plan(dir, word, start)?;
    if dry_run || plan.is_empty() {
        return Ok(plan);
    }

    let sources: HashSet<&Path> = plan.iter().map(|(from, _)| from.as_path()).collect();
    if let Some((_, to)) = plan
        .iter()
        .find(|(_, to)| to.exists() && !sources.contains(to.as_path()))
    {
        return Err(Error::InvalidParameter(format!(
            "{} already exists and is not part of the rename",
            to.display()
        )));
    }

    apply_plan(dir, &plan)?;

    tracing::info!(dir = %dir.display(), files = plan.len(), "renamed category");
    Ok(plan)
}

/// Moves every `from` to its `to` through fresh temporary names.
///
/// On failure every file is moved back to its original name before the error
/// is returned.
fn apply_plan(dir: &Path, plan: &[(PathBuf, PathBuf)]) -> Result<()> {
    let salt = format!(
        "{}-{}",
        std::process::id(),
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0)
    );

    let mut staged: Vec<PathBuf> = Vec::with_capacity(plan.len());
    for (index, (from, _)) in plan.iter().enumerate() {
        let temp = free_temp_name(dir, &salt, index);
        if let Err(e) = fs::rename(from, &temp) {
            restore(&staged, plan);
            return Err(e.into());
        }
        staged.push(temp);
    }

    for (placed, (temp, (_, to))) in staged.iter().zip(plan).enumerate() {
        if let Err(e) = fs::rename(temp, to) {
            for (temp, (_, to)) in staged.iter().zip(plan).take(placed) {
                undo(to, temp);
            }
            restore(&staged, plan);
            return Err(e.into());
        }
        tracing::debug!(to = %to.display(), "renamed");
    }
    Ok(())
}

fn free_temp_name(dir: &Path, salt: &str, index: usize) -> PathBuf {
    let mut attempt = 0u32;
    loop {
        let temp = dir.join(format!(".signaug-rename-{salt}-{index:04}-{attempt}.tmp"));
        if !temp.exists() {
            return temp;
        }
        attempt += 1;
    }
}

/// Moves staged files back to the names they had before the rename
fn restore(staged: &[PathBuf], plan: &[(PathBuf, PathBuf)]) {
    for (temp, (from, _)) in staged.iter().zip(plan) {
        undo(temp, from);
    }
}

fn undo(current: &Path, original: &Path) {
    if let Err(e) = fs::rename(current, original) {
        tracing::warn!(
            current = %current.display(),
            original = %original.display(),
            "could not roll back rename: {}",
            e
        );
    }
}

/// Computes the new name of every visible file of `dir`
pub fn plan(dir: &Path, word: &str, start: u32) -> Result<Vec<(PathBuf, PathBuf)>> {
    let word = word.trim();
    if word.is_empty() {
        return Err(Error::InvalidParameter("rename word must not be empty".into()));
    }
    if word.contains(['/', '\\']) {
        return Err(Error::InvalidParameter(format!(
            "rename word must not contain path separators (got {word:?})"
        )));
    }
    if !dir.is_dir() {
        return Err(Error::SourceNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .map(|name| name.to_string_lossy().starts_with('.'))
            .unwrap_or(true);
        if !hidden && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    Ok(files
        .into_iter()
        .enumerate()
        .map(|(offset, from)| {
            let extension = from
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
            let number = start as u64 + offset as u64;
            let to = dir.join(format!("word-{word}-{number:03}.{extension}"));
            (from, to)
        })
        .collect())
}
