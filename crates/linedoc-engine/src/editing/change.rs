use crate::editing::{CaretPosition, Document};

/// Range of the document touched by one recorded edit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextChange {
    pub min: CaretPosition,
    pub max: CaretPosition,
}

impl TextChange {
    /// Order the two ends of an edit
    pub fn between(a: CaretPosition, b: CaretPosition) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }
}

/// Whether a whole-line operation is recorded in history
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    /// Push a history entry and raise a change notification
    #[default]
    Recorded,
    /// Programmatic bulk edit: no history entry, no notification
    Bulk,
}

/// Handle returned when registering a change listener
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

pub type ChangeListener = Box<dyn FnMut(&Document, TextChange)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_orders_positions() {
        let change = TextChange::between(CaretPosition::new(4, 0), CaretPosition::new(1, 3));

        assert_eq!(change.min, CaretPosition::new(1, 3));
        assert_eq!(change.max, CaretPosition::new(4, 0));
    }

    #[test]
    fn test_default_mode_is_recorded() {
        assert_eq!(EditMode::default(), EditMode::Recorded);
    }
}
