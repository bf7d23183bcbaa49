//! Shared progress loading for cycle handlers and the dashboard.

use crate::domain::cycle::{Cycle, CycleProgress, ItemProgress};
use crate::domain::foundation::{DomainError, OwnedByUser, Timestamp};
use crate::ports::{StudyRecordReader, StudyWindow};

/// Computes a cycle's progress from windowed study-record sums.
///
/// The window is `[started_at, ended_at ?? now)`, so a closed cycle's
/// progress is naturally frozen while an active one tracks live.
pub(crate) async fn load_cycle_progress(
    cycle: &Cycle,
    reader: &dyn StudyRecordReader,
    now: Timestamp,
) -> Result<CycleProgress, DomainError> {
    let window = StudyWindow {
        start: cycle.started_at(),
        end: cycle.window_end(now),
    };

    let mut items = Vec::with_capacity(cycle.items().len());
    for item in cycle.items() {
        let sums = reader
            .sums_for_subject(cycle.owner_id(), &item.subject_id, window)
            .await?;
        items.push(ItemProgress::compute(item, sums.seconds, sums.questions));
    }

    Ok(CycleProgress::from_items(items))
}
