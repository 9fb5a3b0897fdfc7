//! Question loading

use std::path::Path;

use anyhow::{Context, Result, bail};

/// Read a question from a UTF-8 text file.
///
/// Surrounding whitespace is stripped; an empty file is an error because a
/// blank question would be silently rejected by every provider anyway.
pub fn read_question(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question file {}", path.display()))?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        bail!("question file {} is empty", path.display());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reads_and_trims() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "\n  Сколько будет 2+2?  \n").unwrap();
        let question = read_question(file.path()).unwrap();
        assert_eq!(question, "Сколько будет 2+2?");
    }

    #[test]
    fn test_empty_file_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "   \n\t\n").unwrap();
        assert!(read_question(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_has_path_in_error() {
        let err = read_question(Path::new("/nonexistent/q.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/q.txt"));
    }
}
