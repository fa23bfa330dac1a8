//! Append-only measurement history.

use std::collections::HashMap;

use tracing::debug;

use crate::analysis_pipeline::measure::types::MeasurementRecord;

/// Every measurement event ever recorded, in order.
///
/// Records are never replaced. Measuring the same ROI again appends new
/// records whose label carries the event ordinal, e.g. `Nucleus (2)`.
#[derive(Debug, Default)]
pub struct MeasurementHistory {
    records: Vec<MeasurementRecord>,
    events: HashMap<String, usize>,
}

impl MeasurementHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one measurement event and returns the records as stored.
    ///
    /// All records of one ROI in `records` belong to the same event.
    pub fn record_event(&mut self, records: Vec<MeasurementRecord>) -> &[MeasurementRecord] {
        let start = self.records.len();
        let mut ordinals: HashMap<String, usize> = HashMap::new();

        for mut record in records {
            let ordinal = *ordinals.entry(record.roi_id.clone()).or_insert_with(|| {
                let count = self.events.entry(record.roi_id.clone()).or_insert(0);
                *count += 1;
                *count
            });
            if ordinal > 1 {
                record.label = format!("{} ({})", record.label, ordinal);
            }
            self.records.push(record);
        }

        debug!(
            "Recorded {} measurement rows, history holds {}",
            self.records.len() - start,
            self.records.len()
        );
        &self.records[start..]
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    /// Records belonging to one ROI, oldest first.
    pub fn records_for<'a>(&'a self, roi_id: &'a str) -> impl Iterator<Item = &'a MeasurementRecord> + 'a {
        self.records.iter().filter(move |r| r.roi_id == roi_id)
    }

    /// Number of measurement events recorded for `roi_id`.
    pub fn event_count(&self, roi_id: &str) -> usize {
        self.events.get(roi_id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
