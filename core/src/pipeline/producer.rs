use crate::pipeline::queue::{PushOutcome, SampleQueue};
use crate::pipeline::snapshot::Termination;
use crate::pipeline::source::{ByteSource, SourcePoll};
use crate::prelude::TelemetryError;
use crate::record::{decode_line, DecodeError};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Longest partial line kept while waiting for its terminator.
pub const MAX_LINE_BYTES: usize = 4096;

const READ_CHUNK: usize = 1024;
const MAX_READS_PER_POLL: usize = 64;

/// Reassembles newline-terminated lines from arbitrary byte chunks.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
    overflowed: bool,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lines completed by `bytes`. Blank lines are skipped.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Result<String, DecodeError>> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                if let Some(line) = self.complete() {
                    lines.push(line);
                }
                continue;
            }
            if self.overflowed {
                continue;
            }
            if self.pending.len() >= MAX_LINE_BYTES {
                self.overflowed = true;
                self.pending.clear();
                continue;
            }
            self.pending.push(byte);
        }
        lines
    }

    /// Flushes an unterminated trailing line.
    pub fn finish(&mut self) -> Option<Result<String, DecodeError>> {
        self.complete()
    }

    fn complete(&mut self) -> Option<Result<String, DecodeError>> {
        if std::mem::take(&mut self.overflowed) {
            self.pending.clear();
            return Some(Err(DecodeError::LineTooLong {
                limit: MAX_LINE_BYTES,
            }));
        }
        let raw = std::mem::take(&mut self.pending);
        match String::from_utf8(raw) {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Ok(trimmed.to_string()))
                }
            }
            Err(_) => Some(Err(DecodeError::Encoding)),
        }
    }
}

/// Polls a source, decodes its lines, and feeds the sample queue.
pub struct Producer<S> {
    source: S,
    queue: Arc<SampleQueue>,
    metrics: Arc<MetricsRecorder>,
    cancel: Arc<AtomicBool>,
    poll_interval: Duration,
    splitter: LineSplitter,
    epoch: Instant,
    logger: LogManager,
}

impl<S: ByteSource> Producer<S> {
    pub fn new(
        source: S,
        queue: Arc<SampleQueue>,
        metrics: Arc<MetricsRecorder>,
        cancel: Arc<AtomicBool>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            queue,
            metrics,
            cancel,
            poll_interval,
            splitter: LineSplitter::new(),
            epoch: Instant::now(),
            logger: LogManager::new("producer"),
        }
    }

    /// Runs until cancelled, exhausted, or the source fails, then closes the
    /// source and the queue with the corresponding cause.
    pub fn run(mut self) -> Termination {
        self.logger
            .record(&format!("polling {}", self.source.describe()));
        let termination = self.poll_loop();
        self.source.close();
        self.queue.close(termination.clone());
        match &termination {
            Termination::SourceLost(message) => {
                self.logger.warn(&format!("source lost: {}", message))
            }
            other => self.logger.record(&format!("producer finished: {:?}", other)),
        }
        termination
    }

    fn poll_loop(&mut self) -> Termination {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                return Termination::Stopped;
            }

            let mut reads = 0;
            let idle = loop {
                match self.source.poll(&mut buf) {
                    Ok(SourcePoll::Data(count)) => {
                        self.ingest(&buf[..count]);
                        reads += 1;
                        if reads >= MAX_READS_PER_POLL {
                            break false;
                        }
                    }
                    Ok(SourcePoll::Idle) => break true,
                    Ok(SourcePoll::Closed) => {
                        if let Some(line) = self.splitter.finish() {
                            self.handle_line(line);
                        }
                        return Termination::Exhausted;
                    }
                    Err(err) => {
                        self.metrics.record_source_failure();
                        let message = match err {
                            TelemetryError::SourceUnavailable(message) => message,
                            other => other.to_string(),
                        };
                        return Termination::SourceLost(message);
                    }
                }
            };

            if idle {
                thread::sleep(self.poll_interval);
            }
        }
    }

    fn ingest(&mut self, bytes: &[u8]) {
        for line in self.splitter.feed(bytes) {
            self.handle_line(line);
        }
    }

    fn handle_line(&mut self, line: Result<String, DecodeError>) {
        let timestamp = self.epoch.elapsed().as_secs_f64();
        let record = match line.and_then(|text| decode_line(&text, timestamp)) {
            Ok(record) => record,
            Err(err) => {
                self.metrics.record_decode_error();
                self.logger
                    .detail(&TelemetryError::from(err).to_string());
                return;
            }
        };

        self.metrics.record_decoded();
        if let PushOutcome::Evicted(_) = self.queue.push(record) {
            self.metrics.record_overflow();
            self.logger.detail(
                &TelemetryError::QueueOverflow {
                    capacity: self.queue.capacity(),
                }
                .to_string(),
            );
        }
    }
}
