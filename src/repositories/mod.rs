pub(crate) mod assignments;
pub(crate) mod submissions;

/// Outcome of a conditional merge: `None` when no row matched, otherwise whether the
/// stored document actually changed.
pub(crate) type MergeResult = Option<bool>;
