//! Boundary tests for how anchors follow edits.
//!
//! Each case puts one anchor on a known line, applies a single edit and checks
//! where the anchor ended up, or that it was invalidated with its removal
//! callback fired exactly once.

use linedoc_engine::{Anchor, AnchorId, CaretPosition, Document};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::cell::Cell;
use std::rc::Rc;

/// Where an anchor ended up: `Some((row, min_col, max_col))`, or `None` once invalidated
type Outcome = Option<(usize, usize, usize)>;

struct Tracked {
    doc: Document,
    id: AnchorId,
    removals: Rc<Cell<usize>>,
}

impl Tracked {
    fn new(text: &str, row: usize, min_col: usize, max_col: usize) -> Self {
        let mut doc = Document::from_text(text);
        let removals = Rc::new(Cell::new(0));
        let counter = Rc::clone(&removals);
        let id = doc.add_anchor(
            Anchor::new(row, min_col, max_col).on_removed(move |_| counter.set(counter.get() + 1)),
        );
        Self { doc, id, removals }
    }

    fn outcome(&self) -> Outcome {
        self.doc
            .anchor(self.id)
            .map(|anchor| (anchor.row(), anchor.min_col(), anchor.max_col()))
    }

    fn assert_outcome(&self, expected: Outcome) {
        assert_eq!(self.outcome(), expected);
        let expected_removals = usize::from(expected.is_none());
        assert_eq!(self.removals.get(), expected_removals);
    }
}

// ============ Single-row insert ============

#[rstest]
#[case::before_span("abcdef", (2, 4), 1, "XY", Some((0, 4, 6)))]
#[case::at_start_grows("Hello world", (2, 5), 2, "X", Some((0, 2, 6)))]
#[case::inside_grows("abcdef", (2, 4), 3, "X", Some((0, 2, 5)))]
#[case::at_end_grows("abcdef", (2, 4), 4, "X", Some((0, 2, 5)))]
#[case::after_span("abcdef", (2, 4), 5, "X", Some((0, 2, 4)))]
#[case::point_absorbs("abcdef", (3, 3), 3, "XYZ", Some((0, 3, 6)))]
fn test_insert_in_row(
    #[case] text: &str,
    #[case] span: (usize, usize),
    #[case] col: usize,
    #[case] inserted: &str,
    #[case] expected: Outcome,
) {
    let mut tracked = Tracked::new(text, 0, span.0, span.1);

    tracked.doc.insert(CaretPosition::new(0, col), inserted);

    tracked.assert_outcome(expected);
}

#[test]
fn test_insert_leaves_other_rows_alone() {
    let mut tracked = Tracked::new("abcdef\nabcdef", 1, 0, 2);

    tracked.doc.insert(CaretPosition::new(0, 0), "XY");

    tracked.assert_outcome(Some((1, 0, 2)));
}

// ============ Multi-line insert ============

#[rstest]
#[case::inside_span("Hello World", (2, 6), 4, "\n", None)]
#[case::at_span_start("Hello World", (2, 6), 2, "\n", None)]
#[case::at_span_end("Hello World", (2, 6), 6, "\n", None)]
#[case::before_span("Hello World", (2, 6), 1, "\n", Some((1, 1, 5)))]
#[case::before_span_long_tail("Hello World", (2, 6), 1, "A\nBC\nDEF", Some((2, 4, 8)))]
#[case::after_span("Hello World", (2, 6), 7, "XY\nZ", Some((0, 2, 6)))]
fn test_insert_line_break(
    #[case] text: &str,
    #[case] span: (usize, usize),
    #[case] col: usize,
    #[case] inserted: &str,
    #[case] expected: Outcome,
) {
    let mut tracked = Tracked::new(text, 0, span.0, span.1);

    tracked.doc.insert(CaretPosition::new(0, col), inserted);

    tracked.assert_outcome(expected);
}

#[test]
fn test_relocated_anchor_still_covers_its_text() {
    let mut tracked = Tracked::new("  10,R,J", 0, 5, 6);

    tracked.doc.insert(CaretPosition::new(0, 4), "\n  3");

    let (row, min_col, max_col) = tracked.outcome().unwrap();
    let line: Vec<char> = tracked.doc.line(row).chars().collect();
    assert_eq!(line[min_col..max_col].iter().collect::<String>(), "R");
}

#[test]
fn test_line_break_shifts_rows_below() {
    let mut tracked = Tracked::new("a\nb\nc", 2, 0, 1);

    tracked.doc.insert(CaretPosition::new(0, 1), "\n\n");

    tracked.assert_outcome(Some((4, 0, 1)));
}

// ============ Single-row delete ============

#[rstest]
#[case::before_span((2, 4), (0, 1), Some((0, 1, 3)))]
#[case::up_to_span((2, 4), (0, 2), Some((0, 0, 2)))]
#[case::cuts_start((2, 4), (1, 3), None)]
#[case::cuts_end((2, 4), (3, 5), None)]
#[case::covers_span((2, 4), (1, 5), None)]
#[case::exactly_span((2, 4), (2, 4), Some((0, 2, 2)))]
#[case::inside_span((1, 5), (2, 4), Some((0, 1, 3)))]
#[case::after_span((2, 4), (4, 6), Some((0, 2, 4)))]
#[case::point_inside((3, 3), (1, 5), None)]
#[case::point_at_start((1, 1), (1, 5), None)]
#[case::point_at_end((5, 5), (1, 5), None)]
#[case::point_before((0, 0), (1, 5), Some((0, 0, 0)))]
#[case::point_after((6, 6), (1, 5), Some((0, 2, 2)))]
#[case::empty_range_on_point((3, 3), (3, 3), None)]
#[case::empty_range_in_span((2, 4), (3, 3), Some((0, 2, 4)))]
fn test_remove_range_in_line(
    #[case] span: (usize, usize),
    #[case] deleted: (usize, usize),
    #[case] expected: Outcome,
) {
    let mut tracked = Tracked::new("abcdef", 0, span.0, span.1);

    tracked.doc.remove_range_in_line(0, deleted.0, deleted.1);

    tracked.assert_outcome(expected);
}

// ============ Single-row replace ============

#[rstest]
#[case::before_span((2, 4), (0, 1), "XYZ", Some((0, 4, 6)))]
#[case::exactly_span((2, 4), (2, 4), "Q", Some((0, 2, 3)))]
#[case::cuts_end((2, 4), (3, 5), "Q", None)]
#[case::cuts_start((2, 4), (1, 3), "Q", None)]
#[case::after_span((2, 4), (4, 6), "XY", Some((0, 2, 4)))]
#[case::point_at_start((2, 2), (2, 4), "QQQ", Some((0, 2, 5)))]
#[case::point_at_end((4, 4), (2, 4), "Q", Some((0, 3, 3)))]
#[case::point_strictly_inside((3, 3), (2, 4), "Q", None)]
#[case::span_inside_range((1, 5), (2, 4), "", Some((0, 1, 3)))]
fn test_replace_range_in_line(
    #[case] span: (usize, usize),
    #[case] replaced: (usize, usize),
    #[case] text: &str,
    #[case] expected: Outcome,
) {
    let mut tracked = Tracked::new("abcdef", 0, span.0, span.1);

    tracked.doc.replace_range_in_line(0, replaced.0, replaced.1, text);

    tracked.assert_outcome(expected);
}

// ============ Multi-row delete ============

/// Delete (0, 3)..(2, 2) of "first" / "second" / "third" / "fourth"
#[rstest]
#[case::start_row_before_cut(0, (0, 2), Some((0, 0, 2)))]
#[case::start_row_point_at_cut(0, (3, 3), Some((0, 3, 3)))]
#[case::start_row_crosses_cut(0, (2, 5), None)]
#[case::middle_row(1, (0, 6), None)]
#[case::middle_row_point(1, (0, 0), None)]
#[case::end_row_after_cut(2, (3, 5), Some((0, 4, 6)))]
#[case::end_row_point_at_cut(2, (2, 2), Some((0, 3, 3)))]
#[case::end_row_crosses_cut(2, (1, 3), None)]
#[case::row_below(3, (0, 6), Some((1, 0, 6)))]
fn test_remove_range_across_rows(
    #[case] row: usize,
    #[case] span: (usize, usize),
    #[case] expected: Outcome,
) {
    let mut tracked = Tracked::new("first\nsecond\nthird\nfourth", row, span.0, span.1);

    tracked
        .doc
        .remove_range(CaretPosition::new(0, 3), CaretPosition::new(2, 2));

    assert_eq!(tracked.doc.lines(), ["firird", "fourth"]);
    tracked.assert_outcome(expected);
}

// ============ History interplay ============

#[test]
fn test_undo_restores_invalidated_anchor_without_refiring() {
    let mut tracked = Tracked::new("abcdef", 0, 2, 4);

    tracked.doc.remove_range_in_line(0, 1, 3);
    tracked.assert_outcome(None);

    tracked.doc.undo();

    assert_eq!(tracked.outcome(), Some((0, 2, 4)));
    assert_eq!(tracked.removals.get(), 1);
}

#[test]
fn test_redo_reapplies_anchor_move() {
    let mut tracked = Tracked::new("abcdef", 0, 2, 4);

    tracked.doc.insert(CaretPosition::new(0, 0), "XY");
    tracked.doc.undo();
    assert_eq!(tracked.outcome(), Some((0, 2, 4)));

    tracked.doc.redo();
    assert_eq!(tracked.outcome(), Some((0, 4, 6)));
}

#[test]
fn test_anchor_added_after_edit_is_absent_after_undo() {
    let mut doc = Document::from_text("abcdef");
    doc.insert(CaretPosition::new(0, 0), "X");
    let id = doc.add_anchor(Anchor::new(0, 0, 1));

    doc.undo();

    assert!(doc.anchor(id).is_none());
}

#[test]
fn test_user_data_survives_history_copies() {
    let mut doc = Document::from_text("  10,R");
    let id = doc.add_anchor(Anchor::new(0, 2, 4).with_user_data(10_u32));

    doc.insert(CaretPosition::new(0, 0), " ");
    doc.insert(CaretPosition::new(0, 0), " ");

    assert_eq!(doc.anchor(id).and_then(Anchor::user_data::<u32>), Some(&10));
    doc.undo();
    assert_eq!(doc.anchor(id).and_then(Anchor::user_data::<u32>), Some(&10));
}
