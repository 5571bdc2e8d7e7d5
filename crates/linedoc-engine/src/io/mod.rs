pub mod backup;

pub use backup::{BackupPolicy, backup_directory, create_backup};

use std::fs;
use std::path::{Path, PathBuf};

/// The single line separator used for every document in memory and on disk
pub const NEW_LINE: char = '\n';

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Document has no file path")]
    NoFilePath,
}

/// Rewrite every line-ending style as [`NEW_LINE`].
///
/// Handles CRLF, CR, NEL, LS, PS and form feed.
pub fn normalize_line_endings(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                normalized.push(NEW_LINE);
            }
            '\u{0085}' | '\u{2028}' | '\u{2029}' | '\u{000C}' => normalized.push(NEW_LINE),
            _ => normalized.push(c),
        }
    }
    normalized
}

/// Split already-normalized text into lines.
///
/// Always yields at least one line; a trailing separator yields a trailing
/// empty line so that joining with [`NEW_LINE`] reproduces the input.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split(NEW_LINE).map(str::to_string).collect()
}

/// Read a document file, normalizing its line endings
pub fn read_text(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(IoError::Io)?;
    Ok(normalize_line_endings(&raw))
}

/// Write document text, creating parent directories if needed
pub fn write_text(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }
    fs::write(path, content).map_err(IoError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_dir, create_test_file};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_line_endings_mixed() {
        let text = "a\r\nb\rc\nd\u{2028}e\u{0085}f\u{000C}g";

        assert_eq!(normalize_line_endings(text), "a\nb\nc\nd\ne\nf\ng");
    }

    #[test]
    fn test_normalize_keeps_crlf_as_one_break() {
        assert_eq!(normalize_line_endings("\r\n\r\n"), "\n\n");
        assert_eq!(normalize_line_endings("\r\r"), "\n\n");
    }

    #[test]
    fn test_split_lines_edge_cases() {
        assert_eq!(split_lines(""), vec![""]);
        assert_eq!(split_lines("one"), vec!["one"]);
        assert_eq!(split_lines("one\n"), vec!["one", ""]);
        assert_eq!(split_lines("\n\n"), vec!["", "", ""]);
    }

    #[test]
    fn test_read_text_normalizes() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "run.tas", "  1,R\r\n  5,J\r\n");

        let text = read_text(&path).unwrap();

        assert_eq!(text, "  1,R\n  5,J\n");
    }

    #[test]
    fn test_read_text_not_found() {
        let dir = create_test_dir();

        let result = read_text(&dir.path().join("missing.tas"));

        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_read_text_rejects_invalid_utf8() {
        let dir = create_test_dir();
        let path = dir.path().join("binary.tas");
        std::fs::write(&path, [0xFF, 0xFE, 0xFD]).unwrap();

        let result = read_text(&path);

        assert!(matches!(result, Err(IoError::Io(_))));
    }

    #[test]
    fn test_write_text_creates_parent_directories() {
        let dir = create_test_dir();
        let path = dir.path().join("levels/chapter1/run.tas");

        write_text(&path, "  1,R").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "  1,R");
    }
}
