use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

use crate::editing::Anchor;

/// Create a temporary directory for document files
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a test script file with content
pub fn create_test_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}

/// An anchor whose removal callback bumps the returned counter
pub fn counted_anchor(row: usize, min_col: usize, max_col: usize) -> (Anchor, Rc<Cell<usize>>) {
    let removals = Rc::new(Cell::new(0));
    let counter = Rc::clone(&removals);
    let anchor = Anchor::new(row, min_col, max_col).on_removed(move |_| counter.set(counter.get() + 1));
    (anchor, removals)
}
