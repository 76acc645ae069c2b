//! Accumulates classifier results into a chronological event list.

use vwatch_models::{DetectionEvent, SampleOffset, TimestampedEvent};

use crate::error::{PipelineError, PipelineResult};

/// Ordered event accumulator for one run.
///
/// Every accepted offset must be strictly later than the previous one.
/// [`EventAggregator::finish`] consumes the aggregator, so the list cannot be
/// changed after the run completes.
#[derive(Debug, Default)]
pub struct EventAggregator {
    events: Vec<TimestampedEvent>,
    last_offset: Option<SampleOffset>,
}

impl EventAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one timestamped event per detection, all sharing `offset`'s timestamp.
    ///
    /// Returns the number of events added.
    pub fn add(&mut self, offset: SampleOffset, events: Vec<DetectionEvent>) -> PipelineResult<usize> {
        if let Some(previous) = self.last_offset {
            if offset.seconds() <= previous.seconds() {
                return Err(PipelineError::OutOfOrder {
                    offset: offset.seconds(),
                    previous: previous.seconds(),
                });
            }
        }
        self.last_offset = Some(offset);

        let added = events.len();
        self.events
            .extend(events.into_iter().map(|event| TimestampedEvent::at(offset, event)));
        Ok(added)
    }

    /// Events accepted so far.
    pub fn events(&self) -> &[TimestampedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Final event list.
    pub fn finish(self) -> Vec<TimestampedEvent> {
        self.events
    }
}
