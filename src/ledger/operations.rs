use tracing::{debug, instrument};

use super::models::{NewPointEntry, PointEntry, SourceRef};
use crate::shared::ScoringError;
use crate::store::ScoringTransaction;

/// Replaces every entry of `source` with `new_entries`.
///
/// Existing rows are always discarded, never diffed. Passing no entries
/// simply clears the source.
#[instrument(
    skip(tx, source, new_entries),
    fields(source_kind = %source.kind, source_id = %source.id)
)]
pub async fn recreate_for_source(
    tx: &mut dyn ScoringTransaction,
    source: &SourceRef,
    new_entries: &[NewPointEntry],
) -> Result<Vec<PointEntry>, ScoringError> {
    if let Some(stray) = new_entries.iter().find(|entry| &entry.source != source) {
        return Err(ScoringError::Validation(format!(
            "Entry for {} {} cannot be stored under {} {}",
            stray.source.kind, stray.source.id, source.kind, source.id
        )));
    }

    tx.lock_source(source).await?;
    let removed = tx.delete_point_entries_for_source(source).await?;
    let inserted = if new_entries.is_empty() {
        Vec::new()
    } else {
        tx.insert_point_entries(new_entries).await?
    };

    debug!(removed, inserted = inserted.len(), "Recreated point entries");
    Ok(inserted)
}

#[instrument(
    skip(tx, source),
    fields(source_kind = %source.kind, source_id = %source.id)
)]
pub async fn delete_for_source(
    tx: &mut dyn ScoringTransaction,
    source: &SourceRef,
) -> Result<u64, ScoringError> {
    tx.lock_source(source).await?;
    let removed = tx.delete_point_entries_for_source(source).await?;
    debug!(removed, "Deleted point entries");
    Ok(removed)
}
