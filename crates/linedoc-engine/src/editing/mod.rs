/*!
 * # Editing Core Module
 *
 * A line-based document model for frame-input scripts, built for editors that
 * decorate the text with spans which must follow it through every edit.
 *
 * ## Architecture Overview
 *
 * ### 1. Lines as the Source of Truth
 * - The document is an ordered list of lines, joined by a single `\n`
 * - Every line ending on load (CRLF, CR, NEL, LS, PS, FF) is normalised
 * - Positions are `(row, col)` pairs counting chars
 *
 * ### 2. Anchors
 * - An **Anchor** marks columns `[min_col, max_col]` of one row
 * - Each edit re-indexes the affected anchors: they grow, shrink, change row,
 *   or are invalidated, firing their removal callback once
 * - Anchors live in an arena with a per-row index, addressed by `AnchorId`
 *
 * ### 3. Snapshot History
 * - A fixed-capacity ring buffer of full snapshots (lines, anchors, caret)
 * - Recorded edits push a snapshot first; undo and redo move a cursor
 * - Bulk edits bypass history and notifications
 *
 * ### 4. Change Notification
 * - Each recorded edit raises a `TextChange` with the touched range
 * - The document saves (auto-save) or marks itself dirty, then calls listeners
 *
 * ### 5. External Line Sync
 * - Another thread may queue whole-line replacements through a channel
 * - The owner applies them with `Document::pump_line_sync`
 *
 * ## Module Structure
 *
 * - **`document`**: `Document` with every edit, query and persistence operation
 * - **`anchors`**: `Anchor`, `AnchorIndex` and the re-indexing rules
 * - **`history`**: snapshot ring buffer
 * - **`position`**: `CaretPosition` and `Selection`
 * - **`change`**: `TextChange`, `EditMode` and listener types
 * - **`sync`**: the line-sync channel
 *
 * ## Usage Pattern
 *
 * ```rust
 * use linedoc_engine::editing::*;
 *
 * let mut doc = Document::from_text("  10,R,J\n   5,L");
 *
 * // Track the frame count of the first line
 * let frames = doc.add_anchor(Anchor::new(0, 2, 4));
 *
 * // Edits keep the anchor on its text
 * doc.replace_range_in_line(0, 2, 4, "120");
 * assert_eq!(doc.anchor(frames).map(Anchor::max_col), Some(5));
 *
 * doc.insert(CaretPosition::new(1, 0), "  1,D\n");
 * assert_eq!(doc.line(2), "   5,L");
 *
 * doc.undo();
 * doc.undo();
 * assert_eq!(doc.text(), "  10,R,J\n   5,L");
 * ```
 */

pub mod anchors;
pub mod change;
pub mod document;
pub mod history;
pub mod position;
pub mod sync;

pub use anchors::{Anchor, AnchorId, AnchorIndex, RemovalCallback};
pub use change::{ChangeListener, EditMode, ListenerId, TextChange};
pub use document::{Document, DocumentOptions};
pub use history::{DEFAULT_HISTORY_CAPACITY, Entry, History};
pub use position::{CaretPosition, Selection};
pub use sync::{LineSyncClosed, LineSyncSender, LineUpdates};
