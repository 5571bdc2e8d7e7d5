use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::editing::history::{DEFAULT_HISTORY_CAPACITY, Entry, History};
use crate::editing::sync::{LineSync, LineSyncSender, LineUpdates};
use crate::editing::{
    Anchor, AnchorId, AnchorIndex, CaretPosition, ChangeListener, EditMode, ListenerId, Selection,
    TextChange,
};
use crate::io::{self, BackupPolicy, IoError, NEW_LINE};

/// Behaviour of a document around saving
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Save on every recorded change instead of only marking the document dirty
    pub auto_save: bool,
    /// Ring-buffer size of the undo history
    pub history_capacity: usize,
    /// Back the file up after each successful save
    pub backup: Option<BackupPolicy>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            auto_save: false,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            backup: None,
        }
    }
}

/// A line-based script document with anchors and snapshot undo.
///
/// ## Model
/// - **Lines** live in the current [`History`] entry and are only changed
///   through the methods here. Every line is joined with [`NEW_LINE`].
/// - **Anchors** are spans on single rows held in the same entry. Each edit
///   re-derives them: they grow, shrink, move rows, or are invalidated, which
///   fires their removal callback.
/// - **History** snapshots lines, anchors and caret before each recorded edit.
///   Undo and redo only move a cursor through the snapshots.
///
/// ## Edits
/// Every recorded edit pushes history, mutates the new entry, re-indexes the
/// anchors it touches and raises a [`TextChange`]. The built-in reaction saves
/// when `auto_save` is on and otherwise marks the document dirty; registered
/// listeners run after it, in registration order.
///
/// Columns count chars. Rows or columns outside the document are programming
/// errors and panic.
/// Every edit leaves the caret inside the text, pulling it back to the nearest
/// valid position when the edit shortened its row or removed it.
///
/// ```rust
/// # use linedoc_engine::{Anchor, CaretPosition, Document};
/// let mut doc = Document::from_text("   1,R\n  12,J");
/// let frames = doc.add_anchor(Anchor::new(0, 3, 4));
///
/// doc.insert(CaretPosition::new(0, 0), "  ");
/// assert_eq!(doc.anchor(frames).map(|a| (a.min_col(), a.max_col())), Some((5, 6)));
///
/// doc.undo();
/// assert_eq!(doc.text(), "   1,R\n  12,J");
/// ```
///
/// A document is bound to the thread that owns it; external line updates
/// arrive through [`Document::line_sync`].
pub struct Document {
    history: History,
    caret: CaretPosition,
    selection: Selection,
    file_path: PathBuf,
    dirty: bool,
    options: DocumentOptions,
    next_anchor_id: u64,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener_id: u64,
    line_sync: Option<LineSync>,
}

impl Document {
    /// Placeholder document with a single empty line
    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub fn from_text(text: &str) -> Self {
        Self::with_options(text, DocumentOptions::default())
    }

    pub fn with_options(text: &str, options: DocumentOptions) -> Self {
        let lines = io::split_lines(&io::normalize_line_endings(text));
        Self {
            history: History::with_capacity(options.history_capacity, Entry::new(lines)),
            caret: CaretPosition::ORIGIN,
            selection: Selection::default(),
            file_path: PathBuf::new(),
            dirty: false,
            options,
            next_anchor_id: 0,
            listeners: Vec::new(),
            next_listener_id: 0,
            line_sync: None,
        }
    }

    /// Load a document from disk with default options
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IoError> {
        Self::load_with_options(path, DocumentOptions::default())
    }

    pub fn load_with_options(path: impl AsRef<Path>, options: DocumentOptions) -> Result<Self, IoError> {
        let path = path.as_ref();
        let text = io::read_text(path).inspect_err(|e| {
            log::error!("failed to load {}: {e}", path.display());
        })?;

        let mut document = Self::with_options(&text, options);
        document.file_path = path.to_path_buf();
        log::info!(
            "loaded {} ({} lines)",
            path.display(),
            document.line_count()
        );
        Ok(document)
    }

    /// Write the text to `file_path`, then back it up if configured.
    ///
    /// A failed write is logged and leaves the document dirty. A failed backup
    /// is logged and does not fail the save.
    pub fn save(&mut self) -> Result<(), IoError> {
        if self.file_path.as_os_str().is_empty() {
            log::error!("cannot save a document without a file path");
            return Err(IoError::NoFilePath);
        }

        io::write_text(&self.file_path, &self.text()).inspect_err(|e| {
            log::error!("failed to save {}: {e}", self.file_path.display());
        })?;
        self.dirty = false;
        log::info!("saved {}", self.file_path.display());

        if let Some(policy) = &self.options.backup
            && let Err(e) = io::create_backup(&self.file_path, policy, SystemTime::now())
        {
            log::warn!("backup of {} failed: {e}", self.file_path.display());
        }
        Ok(())
    }

    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), IoError> {
        self.file_path = path.into();
        self.save()
    }

    // ============ Read access ============

    pub fn lines(&self) -> &[String] {
        &self.history.current().lines
    }

    pub fn line(&self, row: usize) -> &str {
        self.check_row(row);
        &self.lines()[row]
    }

    pub fn line_count(&self) -> usize {
        self.lines().len()
    }

    /// Every line joined by [`NEW_LINE`]
    pub fn text(&self) -> String {
        self.lines().join(&NEW_LINE.to_string())
    }

    pub fn start(&self) -> CaretPosition {
        CaretPosition::ORIGIN
    }

    pub fn end(&self) -> CaretPosition {
        let row = self.line_count() - 1;
        CaretPosition::new(row, char_len(&self.lines()[row]))
    }

    pub fn caret(&self) -> CaretPosition {
        self.caret
    }

    pub fn set_caret(&mut self, caret: CaretPosition) {
        self.caret = caret;
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn set_file_path(&mut self, path: impl Into<PathBuf>) {
        self.file_path = path.into();
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_path.file_name()?.to_str()
    }

    /// Directory receiving this document's backups, if backups are enabled
    pub fn backup_directory(&self) -> Option<PathBuf> {
        let policy = self.options.backup.as_ref()?;
        io::backup_directory(&self.file_path, &policy.root)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Text between two positions, lines joined by [`NEW_LINE`]
    pub fn get_text_in_range(&self, start: CaretPosition, end: CaretPosition) -> String {
        let (start, end) = ordered(start, end);
        self.check_row(end.row);
        let lines = self.lines();

        if start.row == end.row {
            let line = &lines[start.row];
            return line[byte_index(line, start.row, start.col)..byte_index(line, end.row, end.col)]
                .to_string();
        }

        let first = &lines[start.row];
        let last = &lines[end.row];
        let mut parts = Vec::with_capacity(end.row - start.row + 1);
        parts.push(&first[byte_index(first, start.row, start.col)..]);
        parts.extend(lines[start.row + 1..end.row].iter().map(String::as_str));
        parts.push(&last[..byte_index(last, end.row, end.col)]);
        parts.join(&NEW_LINE.to_string())
    }

    pub fn selected_text(&self) -> String {
        self.get_text_in_range(self.selection.start, self.selection.end)
    }

    // ============ Anchors ============

    /// Attach an anchor to the current text. Does not create a history entry.
    pub fn add_anchor(&mut self, mut anchor: Anchor) -> AnchorId {
        self.check_row(anchor.row);
        let len = char_len(&self.lines()[anchor.row]);
        assert!(
            anchor.max_col <= len,
            "anchor ends at column {} past the end of row {} ({len} chars)",
            anchor.max_col,
            anchor.row
        );

        self.next_anchor_id += 1;
        anchor.id = AnchorId(self.next_anchor_id);
        let id = anchor.id;
        self.history.current_mut().anchors.insert(anchor);
        id
    }

    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchor_index().get(id)
    }

    pub fn anchor_index(&self) -> &AnchorIndex {
        &self.history.current().anchors
    }

    pub fn anchors(&self) -> impl Iterator<Item = &Anchor> {
        self.anchor_index().iter()
    }

    pub fn anchors_on_row(&self, row: usize) -> impl Iterator<Item = &Anchor> {
        self.anchor_index().on_row(row)
    }

    /// Detach an anchor without firing its removal callback
    pub fn remove_anchor(&mut self, id: AnchorId) -> bool {
        self.history.current_mut().anchors.remove(id).is_some()
    }

    /// Detach matching anchors without firing their removal callbacks
    pub fn remove_anchors_if(&mut self, predicate: impl Fn(&Anchor) -> bool) -> usize {
        self.history.current_mut().anchors.remove_where(predicate).len()
    }

    pub fn find_first_anchor(&self, predicate: impl Fn(&Anchor) -> bool) -> Option<&Anchor> {
        self.anchors().find(|anchor| predicate(anchor))
    }

    pub fn find_anchors(&self, predicate: impl Fn(&Anchor) -> bool) -> impl Iterator<Item = &Anchor> {
        self.anchors().filter(move |anchor| predicate(anchor))
    }

    // ============ Change notification ============

    pub fn add_change_listener(
        &mut self,
        listener: impl FnMut(&Document, TextChange) + 'static,
    ) -> ListenerId {
        self.next_listener_id += 1;
        let id = ListenerId(self.next_listener_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_change_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() != before
    }

    fn notify_text_changed(&mut self, change: TextChange) {
        self.dirty = true;
        if self.options.auto_save {
            // Errors are logged by save and leave the document dirty
            let _ = self.save();
        }

        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in &mut listeners {
            listener(self, change);
        }
        self.listeners = listeners;
    }

    // ============ History ============

    pub fn undo(&mut self) {
        if let Some(caret) = self.history.undo() {
            log::debug!("undo, caret back to {caret}");
            self.caret = caret;
            self.notify_text_changed(TextChange::between(self.start(), self.end()));
        }
    }

    pub fn redo(&mut self) {
        if let Some(caret) = self.history.redo() {
            log::debug!("redo, caret at {caret}");
            self.caret = caret;
            self.notify_text_changed(TextChange::between(self.start(), self.end()));
        }
    }

    /// Record the current state without editing, e.g. before a batch of bulk edits
    pub fn push_undo_state(&mut self) {
        self.history.push(self.caret);
    }

    fn begin_edit(&mut self, mode: EditMode) {
        if mode == EditMode::Recorded {
            self.history.push(self.caret);
        }
    }

    fn finish_edit(
        &mut self,
        mode: EditMode,
        invalidated: Vec<Anchor>,
        a: CaretPosition,
        b: CaretPosition,
    ) {
        for anchor in invalidated {
            anchor.invalidate();
        }
        self.clamp_caret();
        let entry = self.history.current();
        entry.anchors.assert_valid(&entry.lines);

        if mode == EditMode::Recorded {
            self.notify_text_changed(TextChange::between(a, b));
        }
    }

    // ============ Edits ============

    /// Insert text at `pos`, returning the position just after it.
    ///
    /// Empty text is a no-op and records nothing.
    pub fn insert(&mut self, pos: CaretPosition, text: &str) -> CaretPosition {
        let text = io::normalize_line_endings(text);
        if text.is_empty() {
            return pos;
        }
        self.check_row(pos.row);
        let at = byte_index(&self.lines()[pos.row], pos.row, pos.col);
        let fragments = io::split_lines(&text);

        self.begin_edit(EditMode::Recorded);
        let entry = self.history.current_mut();

        let (new_pos, invalidated) = if fragments.len() == 1 {
            let len = char_len(&text);
            entry.anchors.apply_insert_in_row(pos.row, pos.col, len);
            entry.lines[pos.row].insert_str(at, &text);
            (CaretPosition::new(pos.row, pos.col + len), Vec::new())
        } else {
            let added = fragments.len() - 1;
            let last_len = char_len(&fragments[added]);
            let invalidated = entry.anchors.apply_split(pos.row, pos.col, added, last_len);

            let mut fragments = fragments.into_iter();
            let line = &mut entry.lines[pos.row];
            let right = line.split_off(at);
            line.push_str(&fragments.next().unwrap_or_default());

            let mut new_lines: Vec<String> = fragments.collect();
            if let Some(last) = new_lines.last_mut() {
                last.push_str(&right);
            }
            entry.lines.splice(pos.row + 1..pos.row + 1, new_lines);

            (CaretPosition::new(pos.row + added, last_len), invalidated)
        };

        self.finish_edit(EditMode::Recorded, invalidated, pos, new_pos);
        new_pos
    }

    /// Insert at the caret and move the caret after the text
    pub fn insert_at_caret(&mut self, text: &str) -> CaretPosition {
        self.caret = self.insert(self.caret, text);
        self.caret
    }

    pub fn insert_line_above(&mut self, text: &str) {
        self.insert_new_line(self.caret.row, text, EditMode::Recorded);
    }

    pub fn insert_line_below(&mut self, text: &str) {
        self.insert_new_line(self.caret.row + 1, text, EditMode::Recorded);
    }

    /// Insert whole lines before `row` (`row == line_count` appends).
    ///
    /// A caret at or below `row` ends up on the last inserted line.
    pub fn insert_new_line(&mut self, row: usize, text: &str, mode: EditMode) {
        assert!(
            row <= self.line_count(),
            "cannot insert before row {row} of a {}-line document",
            self.line_count()
        );
        let new_lines = io::split_lines(&io::normalize_line_endings(text));
        let count = new_lines.len();

        self.begin_edit(mode);
        let entry = self.history.current_mut();
        entry.anchors.apply_lines_inserted(row, count);
        entry.lines.splice(row..row, new_lines);

        if self.caret.row >= row {
            self.caret.row += count - 1;
        }

        let last = row + count - 1;
        let end = CaretPosition::new(last, char_len(&self.lines()[last]));
        self.finish_edit(mode, Vec::new(), CaretPosition::new(row, 0), end);
    }

    /// Replace the content of `row`; line breaks in `text` add rows below it
    pub fn replace_line(&mut self, row: usize, text: &str, mode: EditMode) {
        self.check_row(row);
        let mut new_lines = io::split_lines(&io::normalize_line_endings(text));
        let extra = new_lines.len() - 1;

        self.begin_edit(mode);
        let entry = self.history.current_mut();
        let first = new_lines.remove(0);
        let old_len = char_len(&entry.lines[row]);
        let invalidated = entry
            .anchors
            .apply_replace_in_row(row, 0, old_len, char_len(&first));
        entry.anchors.apply_lines_inserted(row + 1, extra);
        entry.lines[row] = first;
        entry.lines.splice(row + 1..row + 1, new_lines);

        let last = row + extra;
        let end = CaretPosition::new(last, char_len(&self.lines()[last]));
        self.finish_edit(mode, invalidated, CaretPosition::new(row, 0), end);
    }

    pub fn remove_selected_text(&mut self) {
        self.remove_range(self.selection.min(), self.selection.max());
    }

    /// Remove the text between two positions, in either order
    pub fn remove_range(&mut self, start: CaretPosition, end: CaretPosition) {
        if start.row == end.row {
            self.remove_range_in_line(start.row, start.col, end.col);
            return;
        }
        let (start, end) = ordered(start, end);
        self.check_row(end.row);
        let start_at = byte_index(&self.lines()[start.row], start.row, start.col);
        let end_at = byte_index(&self.lines()[end.row], end.row, end.col);

        self.begin_edit(EditMode::Recorded);
        let entry = self.history.current_mut();
        let invalidated = entry.anchors.apply_delete_across_rows(start, end);

        let right = entry.lines[end.row].split_off(end_at);
        let line = &mut entry.lines[start.row];
        line.truncate(start_at);
        line.push_str(&right);
        entry.lines.drain(start.row + 1..=end.row);

        self.finish_edit(EditMode::Recorded, invalidated, start, start);
    }

    /// Remove columns `[start_col, end_col)` of `row`, in either order
    pub fn remove_range_in_line(&mut self, row: usize, start_col: usize, end_col: usize) {
        self.check_row(row);
        let (start_col, end_col) = (start_col.min(end_col), start_col.max(end_col));
        let range = self.byte_range(row, start_col, end_col);

        self.begin_edit(EditMode::Recorded);
        let entry = self.history.current_mut();
        let invalidated = entry.anchors.apply_delete_in_row(row, start_col, end_col);
        entry.lines[row].replace_range(range, "");

        let at = CaretPosition::new(row, start_col);
        self.finish_edit(EditMode::Recorded, invalidated, at, at);
    }

    pub fn remove_line(&mut self, row: usize, mode: EditMode) {
        self.remove_lines(row, row, mode);
    }

    /// Remove rows `min..=max`. The document always keeps at least one line.
    pub fn remove_lines(&mut self, min: usize, max: usize, mode: EditMode) {
        assert!(min <= max, "row range {min}..={max} is inverted");
        self.check_row(max);

        self.begin_edit(mode);
        let entry = self.history.current_mut();
        let invalidated = entry.anchors.apply_lines_removed(min, max);
        entry.lines.drain(min..=max);
        if entry.lines.is_empty() {
            entry.lines.push(String::new());
        }

        let at = CaretPosition::new(min, 0);
        self.finish_edit(mode, invalidated, at, at);
    }

    /// Replace columns `[start_col, end_col)` of `row` with single-line `text`
    pub fn replace_range_in_line(&mut self, row: usize, start_col: usize, end_col: usize, text: &str) {
        assert!(
            !text.contains(['\n', '\r']),
            "replacement text for row {row} must not contain line breaks"
        );
        self.check_row(row);
        let (start_col, end_col) = (start_col.min(end_col), start_col.max(end_col));
        let len = char_len(text);
        let range = self.byte_range(row, start_col, end_col);

        self.begin_edit(EditMode::Recorded);
        let entry = self.history.current_mut();
        let invalidated = entry.anchors.apply_replace_in_row(row, start_col, end_col, len);
        entry.lines[row].replace_range(range, text);

        self.finish_edit(
            EditMode::Recorded,
            invalidated,
            CaretPosition::new(row, start_col),
            CaretPosition::new(row, start_col + len),
        );
    }

    // ============ External line sync ============

    /// Sender for replacing lines from another thread or process.
    ///
    /// Batches are applied when the owner calls [`Document::pump_line_sync`].
    /// Dropping the document closes the channel.
    pub fn line_sync(&mut self) -> LineSyncSender {
        self.line_sync.get_or_insert_with(LineSync::new).sender()
    }

    /// Apply every queued line-sync batch, returning how many were applied
    pub fn pump_line_sync(&mut self) -> usize {
        let batches = match &self.line_sync {
            Some(sync) => sync.drain(),
            None => return 0,
        };
        let count = batches.len();
        for updates in batches {
            self.apply_line_updates(updates);
        }
        count
    }

    /// Overwrite rows edited outside the document.
    ///
    /// The edit bypasses history, and anchors on each replaced row cannot be
    /// repositioned, so they are all invalidated. Rows out of range and texts
    /// containing line breaks are skipped.
    pub fn apply_line_updates(&mut self, updates: LineUpdates) {
        let entry = self.history.current_mut();
        let mut invalidated = Vec::new();
        let mut applied = 0;

        for (row, text) in updates {
            if row >= entry.lines.len() {
                log::warn!("ignoring line update for row {row} past the end of the document");
                continue;
            }
            if text.contains(['\n', '\r']) {
                log::warn!("ignoring multi-line update for row {row}");
                continue;
            }
            entry.lines[row] = text;
            invalidated.extend(entry.anchors.take_row(row));
            applied += 1;
        }

        if applied > 0 {
            self.dirty = true;
        }
        let start = CaretPosition::ORIGIN;
        self.finish_edit(EditMode::Bulk, invalidated, start, start);
    }

    // ============ Helpers ============

    fn check_row(&self, row: usize) {
        assert!(
            row < self.line_count(),
            "row {row} is past the end of a {}-line document",
            self.line_count()
        );
    }

    /// Byte range of char columns `[start_col, end_col)` on `row`
    fn byte_range(&self, row: usize, start_col: usize, end_col: usize) -> std::ops::Range<usize> {
        let line = &self.lines()[row];
        byte_index(line, row, start_col)..byte_index(line, row, end_col)
    }

    /// Keep the caret inside the text after an edit shortened it
    fn clamp_caret(&mut self) {
        let last = self.line_count() - 1;
        self.caret.row = self.caret.row.min(last);
        self.caret.col = self.caret.col.min(char_len(&self.lines()[self.caret.row]));
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("file_path", &self.file_path)
            .field("lines", &self.lines())
            .field("anchors", self.anchor_index())
            .field("caret", &self.caret)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn ordered(a: CaretPosition, b: CaretPosition) -> (CaretPosition, CaretPosition) {
    if a > b { (b, a) } else { (a, b) }
}

/// Byte offset of char column `col`; `col` may equal the line length
fn byte_index(line: &str, row: usize, col: usize) -> usize {
    line.char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(line.len()))
        .nth(col)
        .unwrap_or_else(|| {
            panic!(
                "column {col} is past the end of row {row} ({} chars)",
                char_len(line)
            )
        })
}
