use crate::pipeline::snapshot::Termination;
use crate::prelude::TelemetryResult;
use crate::processing::RingBuffer;
use crate::record::Record;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What happened to a record offered to the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Stored,
    /// Stored after evicting the oldest queued record.
    Evicted(Record),
    /// The queue was closed; the record was discarded.
    Closed,
}

/// Everything taken from the queue by one drain.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueDrain {
    pub records: Vec<Record>,
    /// Present once the queue is closed and this drain emptied it.
    pub end_of_stream: Option<Termination>,
}

struct QueueState {
    records: RingBuffer<Record>,
    closed: Option<Termination>,
}

/// Bounded single-producer/single-consumer hand-off with drop-oldest overflow.
///
/// Closing records the cause; records queued before the close remain
/// drainable.
pub struct SampleQueue {
    state: Mutex<QueueState>,
    capacity: usize,
}

impl SampleQueue {
    pub fn new(capacity: usize) -> TelemetryResult<Self> {
        Ok(Self {
            state: Mutex::new(QueueState {
                records: RingBuffer::with_capacity(capacity)?,
                closed: None,
            }),
            capacity,
        })
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, record: Record) -> PushOutcome {
        let mut state = self.lock();
        if state.closed.is_some() {
            return PushOutcome::Closed;
        }
        match state.records.push(record) {
            Some(evicted) => PushOutcome::Evicted(evicted),
            None => PushOutcome::Stored,
        }
    }

    /// Takes every queued record in arrival order.
    pub fn drain(&self) -> QueueDrain {
        let mut state = self.lock();
        let records: Vec<Record> = state.records.drain().collect();
        QueueDrain {
            records,
            end_of_stream: state.closed.clone(),
        }
    }

    /// Marks end of stream. Only the first cause is kept.
    pub fn close(&self, reason: Termination) {
        let mut state = self.lock();
        if state.closed.is_none() {
            state.closed = Some(reason);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed.is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(adc: u16) -> Record {
        Record::new(adc, 0.0, 0.0, f64::from(adc))
    }

    #[test]
    fn overflow_drops_oldest() {
        let queue = SampleQueue::new(3).unwrap();
        for adc in 0..3 {
            assert_eq!(queue.push(record(adc)), PushOutcome::Stored);
        }
        assert_eq!(queue.push(record(3)), PushOutcome::Evicted(record(0)));
        assert_eq!(queue.len(), 3);

        let drained: Vec<u16> = queue.drain().records.iter().map(|r| r.adc).collect();
        assert_eq!(drained, vec![1, 2, 3]);
    }

    #[test]
    fn stored_items_never_exceed_capacity() {
        let queue = SampleQueue::new(5).unwrap();
        for adc in 0..50 {
            queue.push(record(adc));
            assert!(queue.len() <= queue.capacity());
        }
    }

    #[test]
    fn close_keeps_queued_records_drainable() {
        let queue = SampleQueue::new(4).unwrap();
        queue.push(record(7));
        queue.close(Termination::Stopped);
        assert_eq!(queue.push(record(8)), PushOutcome::Closed);

        let drain = queue.drain();
        assert_eq!(drain.records, vec![record(7)]);
        assert_eq!(drain.end_of_stream, Some(Termination::Stopped));
        assert!(queue.is_empty());
    }

    #[test]
    fn first_close_reason_wins() {
        let queue = SampleQueue::new(1).unwrap();
        queue.close(Termination::SourceLost("gone".into()));
        queue.close(Termination::Stopped);
        assert_eq!(
            queue.drain().end_of_stream,
            Some(Termination::SourceLost("gone".into()))
        );
    }

    #[test]
    fn open_queue_drain_has_no_end_marker() {
        let queue = SampleQueue::new(2).unwrap();
        queue.push(record(1));
        let drain = queue.drain();
        assert_eq!(drain.records.len(), 1);
        assert_eq!(drain.end_of_stream, None);
    }
}
