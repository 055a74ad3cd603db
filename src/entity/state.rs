/// Lifecycle of an [`Entity`](crate::Entity)
///
/// `OriginalFetchedValue` and `NewRecord` only ever appear on the frozen
/// snapshot an entity keeps of its last persisted values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObjectState {
    #[default]
    Unset,
    New,
    Fetched,
    /// Built from a known key without reading the row
    Record,
    /// Built from an outside representation such as JSON
    ExternalRecord,
    ScheduledForDeletion,
    Deleted,
    Saved,
    OriginalFetchedValue,
    NewRecord,
}

impl ObjectState {
    pub fn is_snapshot(self) -> bool {
        matches!(self, ObjectState::OriginalFetchedValue | ObjectState::NewRecord)
    }

    pub fn is_marked_as_deleted(self) -> bool {
        matches!(self, ObjectState::ScheduledForDeletion | ObjectState::Deleted)
    }
}

impl std::fmt::Display for ObjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
