use crate::editing::{AnchorIndex, CaretPosition};

/// Number of snapshots kept when no capacity is configured
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// One full snapshot of the document.
///
/// `caret` is where the caret was when the edit leaving this state started,
/// which is what undoing back into this entry restores.
#[derive(Clone, Debug, Default)]
pub struct Entry {
    pub lines: Vec<String>,
    pub anchors: AnchorIndex,
    pub caret: CaretPosition,
}

impl Entry {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }
}

/// Fixed-capacity ring buffer of snapshots with a movable "current" cursor.
///
/// `tail` is the oldest retained slot and `head` the newest. Pushing past
/// capacity discards the oldest entry; pushing after an undo discards the
/// redo branch. Each push deep-copies the current entry, so slots never share
/// mutable state.
#[derive(Debug)]
pub struct History {
    slots: Vec<Entry>,
    curr: usize,
    head: usize,
    tail: usize,
}

impl History {
    pub fn new(initial: Entry) -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY, initial)
    }

    pub fn with_capacity(capacity: usize, initial: Entry) -> Self {
        assert!(
            capacity >= 2,
            "history capacity must hold at least two entries, got {capacity}"
        );
        let mut slots = vec![Entry::default(); capacity];
        slots[0] = initial;
        Self {
            slots,
            curr: 0,
            head: 0,
            tail: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn current(&self) -> &Entry {
        &self.slots[self.curr]
    }

    pub fn current_mut(&mut self) -> &mut Entry {
        &mut self.slots[self.curr]
    }

    pub fn can_undo(&self) -> bool {
        self.curr != self.tail
    }

    pub fn can_redo(&self) -> bool {
        self.curr != self.head
    }

    /// Snapshot the current entry into the next slot and make it current.
    ///
    /// `caret` is recorded on the entry being left behind.
    pub fn push(&mut self, caret: CaretPosition) {
        let capacity = self.capacity();
        let next = (self.curr + 1) % capacity;
        if next == self.tail {
            self.tail = (self.tail + 1) % capacity;
            log::debug!("history full, discarding oldest entry");
        }

        self.slots[self.curr].caret = caret;
        let mut entry = self.slots[self.curr].clone();
        entry.caret = caret;
        self.slots[next] = entry;

        self.curr = next;
        self.head = next;
    }

    /// Step back one entry, returning the caret to restore
    pub fn undo(&mut self) -> Option<CaretPosition> {
        if !self.can_undo() {
            return None;
        }
        self.curr = (self.curr + self.capacity() - 1) % self.capacity();
        Some(self.current().caret)
    }

    /// Step forward one entry, returning the caret to restore
    pub fn redo(&mut self) -> Option<CaretPosition> {
        if !self.can_redo() {
            return None;
        }
        self.curr = (self.curr + 1) % self.capacity();
        Some(self.current().caret)
    }
}
