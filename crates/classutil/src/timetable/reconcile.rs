/// Duplicate stream removal
use super::types::{Course, SlotKey, Stream};
use std::collections::HashMap;
use tracing::debug;

/// Grouping key: component plus the ordered meeting slots (`None` for web streams).
type GroupKey = (String, Option<Vec<SlotKey>>);

/// Collapses streams that list the same physical class under different sections.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamReconciler;

impl StreamReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Removes duplicate streams from a course in place.
    ///
    /// Returns the number of streams removed.
    pub fn reconcile(&self, course: &mut Course) -> usize {
        let before = course.streams.len();
        course.streams = self.dedupe(std::mem::take(&mut course.streams));
        let removed = before - course.streams.len();

        if removed > 0 {
            debug!(course = %course.code, removed, "Removed duplicate streams");
        }

        removed
    }

    /// Reconciles every course. Returns the total number of streams removed.
    pub fn reconcile_all(&self, courses: &mut [Course]) -> usize {
        courses.iter_mut().map(|course| self.reconcile(course)).sum()
    }

    /// Keeps, for each (component, slots) group, the stream with the lowest
    /// fill ratio. Ties go to the earlier stream; order is preserved.
    pub fn dedupe(&self, streams: Vec<Stream>) -> Vec<Stream> {
        // index of the stream currently kept for each group
        let mut best: HashMap<GroupKey, usize> = HashMap::new();

        for (index, stream) in streams.iter().enumerate() {
            let key = (stream.component.clone(), stream.time_signature());
            best.entry(key)
                .and_modify(|kept| {
                    if stream.fill_ratio() < streams[*kept].fill_ratio() {
                        *kept = index;
                    }
                })
                .or_insert(index);
        }

        let mut keep = vec![false; streams.len()];
        for index in best.into_values() {
            keep[index] = true;
        }

        streams
            .into_iter()
            .zip(keep)
            .filter_map(|(stream, kept)| kept.then_some(stream))
            .collect()
    }
}
