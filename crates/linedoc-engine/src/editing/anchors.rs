use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::editing::CaretPosition;

/// Stable handle for an anchor inside one document
///
/// Handles survive edits and history snapshots: the copy of an anchor held by
/// an older history entry carries the same id as the live one.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

/// Callback fired when an edit invalidates an anchor
pub type RemovalCallback = Rc<dyn Fn(&Anchor)>;

/// A span `[min_col, max_col]` of one row that moves with the text it sits on.
///
/// As the text around it is edited the anchor grows, shrinks, moves to another
/// row or is invalidated. Invalidation removes it from the document and fires
/// `on_removed` exactly once for that instance, since the removed value is
/// consumed by [`Anchor::invalidate`].
///
/// User data and the callback are reference counted, so every history copy of
/// the anchor shares them.
#[derive(Clone)]
pub struct Anchor {
    pub(crate) id: AnchorId,
    pub(crate) row: usize,
    pub(crate) min_col: usize,
    pub(crate) max_col: usize,
    user_data: Option<Rc<dyn Any>>,
    on_removed: Option<RemovalCallback>,
}

impl Anchor {
    /// Create a detached anchor. Its id is assigned when it is added to a document.
    pub fn new(row: usize, min_col: usize, max_col: usize) -> Self {
        assert!(
            min_col <= max_col,
            "anchor min_col {min_col} is after max_col {max_col}"
        );
        Self {
            id: AnchorId(0),
            row,
            min_col,
            max_col,
            user_data: None,
            on_removed: None,
        }
    }

    pub fn with_user_data<T: Any>(mut self, data: T) -> Self {
        self.user_data = Some(Rc::new(data));
        self
    }

    pub fn on_removed(mut self, callback: impl Fn(&Anchor) + 'static) -> Self {
        self.on_removed = Some(Rc::new(callback));
        self
    }

    pub fn id(&self) -> AnchorId {
        self.id
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn min_col(&self) -> usize {
        self.min_col
    }

    pub fn max_col(&self) -> usize {
        self.max_col
    }

    pub fn is_empty(&self) -> bool {
        self.min_col == self.max_col
    }

    /// Downcast the attached user data
    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.user_data.as_deref()?.downcast_ref::<T>()
    }

    pub fn is_position_inside(&self, position: CaretPosition) -> bool {
        position.row == self.row && position.col >= self.min_col && position.col <= self.max_col
    }

    /// Consume the anchor, notifying its owner
    pub(crate) fn invalidate(self) {
        log::debug!(
            "anchor {:?} invalidated at {}:[{}, {}]",
            self.id,
            self.row,
            self.min_col,
            self.max_col
        );
        if let Some(callback) = &self.on_removed {
            callback(&self);
        }
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("id", &self.id)
            .field("row", &self.row)
            .field("min_col", &self.min_col)
            .field("max_col", &self.max_col)
            .field("user_data", &self.user_data.is_some())
            .field("on_removed", &self.on_removed.is_some())
            .finish()
    }
}

/// Arena of anchors plus a row index of handles.
///
/// The row key of every handle always equals the anchor's `row`. Within a row,
/// handles keep insertion order.
#[derive(Clone, Default)]
pub struct AnchorIndex {
    arena: HashMap<AnchorId, Anchor>,
    rows: BTreeMap<usize, Vec<AnchorId>>,
}

impl AnchorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn get(&self, id: AnchorId) -> Option<&Anchor> {
        self.arena.get(&id)
    }

    /// All anchors, by row then insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Anchor> {
        self.rows
            .values()
            .flat_map(move |ids| ids.iter().filter_map(move |id| self.arena.get(id)))
    }

    pub fn on_row(&self, row: usize) -> impl Iterator<Item = &Anchor> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(move |ids| ids.iter().filter_map(move |id| self.arena.get(id)))
    }

    pub(crate) fn insert(&mut self, anchor: Anchor) {
        self.rows.entry(anchor.row).or_default().push(anchor.id);
        self.arena.insert(anchor.id, anchor);
    }

    pub(crate) fn remove(&mut self, id: AnchorId) -> Option<Anchor> {
        let anchor = self.arena.remove(&id)?;
        if let Some(ids) = self.rows.get_mut(&anchor.row) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.rows.remove(&anchor.row);
            }
        }
        Some(anchor)
    }

    /// Remove every anchor matching `predicate`, returning them in index order
    pub(crate) fn remove_where(&mut self, predicate: impl Fn(&Anchor) -> bool) -> Vec<Anchor> {
        let doomed: Vec<AnchorId> = self
            .iter()
            .filter(|anchor| predicate(anchor))
            .map(|anchor| anchor.id)
            .collect();
        doomed.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Detach every anchor on `row`
    pub(crate) fn take_row(&mut self, row: usize) -> Vec<Anchor> {
        self.rows
            .remove(&row)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.arena.remove(&id))
            .collect()
    }

    fn remove_on_row_where(&mut self, row: usize, predicate: impl Fn(&Anchor) -> bool) -> Vec<Anchor> {
        let doomed: Vec<AnchorId> = self
            .on_row(row)
            .filter(|anchor| predicate(anchor))
            .map(|anchor| anchor.id)
            .collect();
        doomed.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    fn update_row(&mut self, row: usize, mut update: impl FnMut(&mut Anchor)) {
        if let Some(ids) = self.rows.get(&row) {
            for id in ids {
                if let Some(anchor) = self.arena.get_mut(id) {
                    update(anchor);
                }
            }
        }
    }

    fn move_to_row(&mut self, id: AnchorId, new_row: usize) {
        let Some(anchor) = self.arena.get_mut(&id) else {
            return;
        };
        let old_row = std::mem::replace(&mut anchor.row, new_row);
        if let Some(ids) = self.rows.get_mut(&old_row) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.rows.remove(&old_row);
            }
        }
        self.rows.entry(new_row).or_default().push(id);
    }

    /// Move every anchor on rows `>= first_row` by `delta` rows
    fn shift_rows(&mut self, first_row: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        let moved = self.rows.split_off(&first_row);
        for (row, ids) in moved {
            let Some(new_row) = row.checked_add_signed(delta) else {
                panic!("anchors on row {row} shifted by {delta} out of the document");
            };
            for id in &ids {
                if let Some(anchor) = self.arena.get_mut(id) {
                    anchor.row = new_row;
                }
            }
            self.rows.entry(new_row).or_default().extend(ids);
        }
    }

    // ============ Re-indexing rules ============
    //
    // Each rule runs against the index of the new history entry and returns
    // the anchors it invalidated, still unfired.

    /// Text of `len` chars inserted at `(row, col)` without a line break
    pub(crate) fn apply_insert_in_row(&mut self, row: usize, col: usize, len: usize) {
        self.update_row(row, |anchor| {
            if col < anchor.min_col {
                anchor.min_col += len;
            }
            if col <= anchor.max_col {
                anchor.max_col += len;
            }
        });
    }

    /// Text inserted at `(row, col)` adding `added_rows` line breaks, whose last
    /// fragment is `last_len` chars long
    pub(crate) fn apply_split(
        &mut self,
        row: usize,
        col: usize,
        added_rows: usize,
        last_len: usize,
    ) -> Vec<Anchor> {
        let invalidated =
            self.remove_on_row_where(row, |anchor| anchor.min_col <= col && col <= anchor.max_col);

        self.shift_rows(row + 1, added_rows as isize);

        // Anchors after the split point follow the text onto the last new row
        let new_row = row + added_rows;
        let moving: Vec<AnchorId> = self
            .on_row(row)
            .filter(|anchor| col < anchor.min_col)
            .map(|anchor| anchor.id)
            .collect();
        for id in moving {
            if let Some(anchor) = self.arena.get_mut(&id) {
                let offset = anchor.min_col - col;
                let width = anchor.max_col - anchor.min_col;
                anchor.min_col = offset + last_len;
                anchor.max_col = anchor.min_col + width;
            }
            self.move_to_row(id, new_row);
        }

        invalidated
    }

    /// Columns `[start, end)` of `row` deleted
    pub(crate) fn apply_delete_in_row(&mut self, row: usize, start: usize, end: usize) -> Vec<Anchor> {
        let deleted = end - start;
        let invalidated = self.remove_on_row_where(row, |anchor| {
            partially_overlaps(anchor, start, end)
                || (anchor.is_empty() && start <= anchor.min_col && anchor.min_col <= end)
        });

        self.update_row(row, |anchor| {
            if end <= anchor.min_col {
                anchor.min_col -= deleted;
            }
            if end <= anchor.max_col {
                anchor.max_col -= deleted;
            }
        });

        invalidated
    }

    /// Columns `[start, end)` of `row` replaced by `len` chars
    pub(crate) fn apply_replace_in_row(
        &mut self,
        row: usize,
        start: usize,
        end: usize,
        len: usize,
    ) -> Vec<Anchor> {
        let deleted = end - start;
        let invalidated = self.remove_on_row_where(row, |anchor| partially_overlaps(anchor, start, end));

        self.update_row(row, |anchor| {
            // A point anchor at the start takes in the new text
            if anchor.is_empty() && anchor.min_col == start {
                anchor.max_col += len;
                return;
            }
            if end <= anchor.min_col {
                anchor.min_col = anchor.min_col - deleted + len;
            }
            if end <= anchor.max_col {
                anchor.max_col = anchor.max_col - deleted + len;
            }
        });

        invalidated
    }

    /// Text from `start` to `end` deleted, where `start.row < end.row`
    pub(crate) fn apply_delete_across_rows(
        &mut self,
        start: CaretPosition,
        end: CaretPosition,
    ) -> Vec<Anchor> {
        debug_assert!(start.row < end.row);

        let mut invalidated = Vec::new();
        for row in start.row + 1..end.row {
            invalidated.extend(self.take_row(row));
        }
        invalidated.extend(self.remove_on_row_where(start.row, |anchor| anchor.max_col > start.col));
        invalidated.extend(self.remove_on_row_where(end.row, |anchor| anchor.min_col < end.col));

        // What is left on the end row joins the start row
        for mut anchor in self.take_row(end.row) {
            anchor.min_col = anchor.min_col - end.col + start.col;
            anchor.max_col = anchor.max_col - end.col + start.col;
            anchor.row = start.row;
            self.insert(anchor);
        }

        self.shift_rows(end.row + 1, -((end.row - start.row) as isize));

        invalidated
    }

    /// `count` whole lines inserted before `row`
    pub(crate) fn apply_lines_inserted(&mut self, row: usize, count: usize) {
        self.shift_rows(row, count as isize);
    }

    /// Lines `min..=max` removed
    pub(crate) fn apply_lines_removed(&mut self, min: usize, max: usize) -> Vec<Anchor> {
        let mut invalidated = Vec::new();
        for row in min..=max {
            invalidated.extend(self.take_row(row));
        }
        self.shift_rows(max + 1, -((max - min + 1) as isize));
        invalidated
    }

    /// Panic if any anchor escaped its row or inverted its bounds
    pub(crate) fn assert_valid(&self, lines: &[String]) {
        for (row, ids) in &self.rows {
            for id in ids {
                let Some(anchor) = self.arena.get(id) else {
                    panic!("anchor {id:?} indexed on row {row} is missing from the arena");
                };
                assert_eq!(
                    anchor.row, *row,
                    "anchor {id:?} is indexed on row {row} but records row {}",
                    anchor.row
                );
                assert!(
                    anchor.min_col <= anchor.max_col,
                    "anchor {id:?} has min_col {} after max_col {}",
                    anchor.min_col,
                    anchor.max_col
                );
                let Some(line) = lines.get(*row) else {
                    panic!("anchor {id:?} sits on row {row} past the last line");
                };
                let len = line.chars().count();
                assert!(
                    anchor.max_col <= len,
                    "anchor {id:?} ends at column {} past the end of row {row} ({len} chars)",
                    anchor.max_col
                );
            }
        }
    }
}

impl fmt::Debug for AnchorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// The deleted range cuts through one end of the span without covering it exactly
fn partially_overlaps(anchor: &Anchor, start: usize, end: usize) -> bool {
    (start < anchor.min_col && anchor.min_col < end) || (start < anchor.max_col && anchor.max_col < end)
}
