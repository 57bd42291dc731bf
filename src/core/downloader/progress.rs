// ─── Progress Reporting ───

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskCategory {
    Archive,
    Libraries,
    AssetIndex,
    Objects,
    Installer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    Verify,
    Download,
    Done,
}

/// One progress record delivered to the caller's sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub category: TaskCategory,
    pub current: u64,
    pub total: u64,
    pub label: String,
}

/// Progress callback; may borrow caller state for `'a`.
pub type ProgressSink<'a> = dyn Fn(ProgressEvent) + Send + Sync + 'a;

/// Sink that drops everything.
pub fn silent_progress(_: ProgressEvent) {}

/// Caller-owned accumulator summing per-category counts.
#[derive(Debug, Default, Clone)]
pub struct ProgressAggregator {
    categories: BTreeMap<TaskCategory, (u64, u64)>,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest counts for the event's category.
    pub fn update(&mut self, event: &ProgressEvent) {
        let current = event.current.min(event.total);
        self.categories.insert(event.category, (current, event.total));
    }

    /// `(current, total)` across all categories.
    pub fn totals(&self) -> (u64, u64) {
        self.categories
            .values()
            .fold((0, 0), |(c, t), (cur, tot)| (c + cur, t + tot))
    }

    pub fn percent(&self) -> f64 {
        let (current, total) = self.totals();
        if total == 0 {
            return 0.0;
        }
        current as f64 * 100.0 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(category: TaskCategory, current: u64, total: u64) -> ProgressEvent {
        ProgressEvent {
            phase: ProgressPhase::Download,
            category,
            current,
            total,
            label: "x".into(),
        }
    }

    #[test]
    fn sums_categories_and_clamps() {
        let mut agg = ProgressAggregator::new();
        agg.update(&event(TaskCategory::Libraries, 3, 10));
        agg.update(&event(TaskCategory::Objects, 50, 40));
        assert_eq!(agg.totals(), (43, 50));

        agg.update(&event(TaskCategory::Libraries, 10, 10));
        assert_eq!(agg.totals(), (50, 50));
        assert_eq!(agg.percent(), 100.0);
    }

    #[test]
    fn empty_is_zero_percent() {
        assert_eq!(ProgressAggregator::new().percent(), 0.0);
    }

    #[test]
    fn event_serializes_kebab_case() {
        let json = serde_json::to_value(event(TaskCategory::AssetIndex, 1, 1)).unwrap();
        assert_eq!(json["category"], "asset-index");
        assert_eq!(json["phase"], "download");
    }
}
