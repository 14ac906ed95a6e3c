use crate::dataset::Dataset;
use tracing::warn;

/// Folds `fresh` into `persisted`.
///
/// Weeks and viruses are unioned. Per (virus, week) the fresh value wins; persisted values
/// fill what the fresh run did not cover. The secondary series merges the same way. Metadata
/// (source, description) comes from `fresh`; `scale` falls back to the persisted one.
///
/// A persisted dataset with a different orientation is unusable and treated as absent.
pub fn merge(fresh: Dataset, persisted: Option<Dataset>) -> Dataset {
    let Some(old) = persisted else {
        return fresh;
    };
    if old.orientation != fresh.orientation {
        warn!(
            fresh = ?fresh.orientation,
            persisted = ?old.orientation,
            "persisted dataset has a different orientation; ignoring history"
        );
        return fresh;
    }

    let mut merged = Dataset {
        source: fresh.source,
        description: fresh.description,
        scale: fresh.scale.or(old.scale),
        orientation: fresh.orientation,
        viruses: old.viruses,
        weeks: old.weeks,
        values: old.values,
        secondary: old.secondary,
    };

    merged.viruses.extend(fresh.viruses);
    merged.weeks.extend(fresh.weeks);
    for (virus, row) in fresh.values {
        merged.values.entry(virus).or_default().extend(row);
    }

    if let Some(series) = fresh.secondary {
        merged.secondary.get_or_insert_with(Default::default).extend(series);
    }

    merged
}
