//! Report persistence — one text artifact per dispatch round
//!
//! Only successful outcomes are written. The artifact layout and the
//! collision-free naming scheme are load-bearing: downstream consumers of
//! existing report directories parse both.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::error::PersistError;
use crate::types::ResultSet;

const SEPARATOR: &str = "============================================================";

/// Write the successful sections of `results` into `target_dir`.
///
/// The filename derives from the question file's stem: `{stem}_answer.txt`,
/// then `{stem}_answer (1).txt`, `{stem}_answer (2).txt`, … until an unused
/// name is found. The content is written to a temp sibling and renamed into
/// place, so a returned path always refers to a complete artifact.
///
/// Callers must skip persistence entirely when the round produced no
/// successful outcome; [`PersistError::NoSuccessfulOutcomes`] guards that
/// contract.
pub fn persist(
    results: &ResultSet,
    source_question_path: &Path,
    target_dir: &Path,
) -> Result<PathBuf, PersistError> {
    if results.success_count() == 0 {
        return Err(PersistError::NoSuccessfulOutcomes);
    }

    let stem = source_question_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("question");
    let path = next_free_path(target_dir, stem);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("report");

    let mut body = String::new();
    body.push_str(SEPARATOR);
    body.push('\n');
    body.push_str(&format!(
        "Вопрос отправлен: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    body.push_str(&format!(
        "Исходный файл: {}\n",
        source_question_path.display()
    ));
    body.push_str(SEPARATOR);
    body.push_str("\n\n");

    for (provider, content) in results.successes() {
        body.push_str(&format!("--- {provider} ---\n"));
        body.push_str(content);
        body.push('\n');
        body.push_str(SEPARATOR);
        body.push_str("\n\n");
    }

    let tmp_path = target_dir.join(format!(".{file_name}.tmp"));
    debug!(path = %tmp_path.display(), "writing report to temp file");
    if let Err(err) = std::fs::write(&tmp_path, &body) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    if let Err(err) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err.into());
    }

    info!(
        path = %path.display(),
        sections = results.success_count(),
        "report saved"
    );
    Ok(path)
}

fn next_free_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{stem}_answer.txt"));
    if !first.exists() {
        return first;
    }
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{stem}_answer ({n}).txt"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
