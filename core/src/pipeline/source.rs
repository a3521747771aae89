use crate::prelude::{TelemetryError, TelemetryResult};
use std::io::{ErrorKind, Read};

/// Result of one non-blocking read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePoll {
    /// `n` bytes were written to the front of the buffer.
    Data(usize),
    /// Nothing available right now.
    Idle,
    /// The source has no more data.
    Closed,
}

/// Byte stream the producer polls.
///
/// Implementations must return promptly. A returned error is treated as loss
/// of the transport and ends the pipeline.
pub trait ByteSource: Send {
    fn poll(&mut self, buf: &mut [u8]) -> TelemetryResult<SourcePoll>;

    fn close(&mut self) {}

    fn describe(&self) -> String {
        "byte source".to_string()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn poll(&mut self, buf: &mut [u8]) -> TelemetryResult<SourcePoll> {
        (**self).poll(buf)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Adapts any [`Read`] into a [`ByteSource`].
///
/// `WouldBlock`, `TimedOut` and `Interrupted` read errors count as idle polls,
/// so readers configured with a timeout work unchanged.
pub struct ReaderSource<R> {
    reader: Option<R>,
    label: String,
}

impl<R: Read + Send> ReaderSource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader: Some(reader),
            label: label.into(),
        }
    }
}

impl ReaderSource<std::io::Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(std::io::Cursor::new(bytes.into()), "in-memory")
    }
}

impl<R: Read + Send> ByteSource for ReaderSource<R> {
    fn poll(&mut self, buf: &mut [u8]) -> TelemetryResult<SourcePoll> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(SourcePoll::Closed);
        };
        match reader.read(buf) {
            Ok(0) => Ok(SourcePoll::Closed),
            Ok(count) => Ok(SourcePoll::Data(count)),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(SourcePoll::Idle)
            }
            Err(err) => Err(TelemetryError::SourceUnavailable(format!(
                "{}: {}",
                self.label, err
            ))),
        }
    }

    fn close(&mut self) {
        self.reader = None;
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "cable unplugged"))
        }
    }

    struct SleepyReader;

    impl Read for SleepyReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::TimedOut, "no data"))
        }
    }

    #[test]
    fn reads_until_closed() {
        let mut source = ReaderSource::from_bytes(b"1,2,3\n".to_vec());
        let mut buf = [0u8; 4];
        assert_eq!(source.poll(&mut buf).unwrap(), SourcePoll::Data(4));
        assert_eq!(source.poll(&mut buf).unwrap(), SourcePoll::Data(2));
        assert_eq!(source.poll(&mut buf).unwrap(), SourcePoll::Closed);
    }

    #[test]
    fn timeouts_are_idle_polls() {
        let mut source = ReaderSource::new(SleepyReader, "sleepy");
        let mut buf = [0u8; 8];
        assert_eq!(source.poll(&mut buf).unwrap(), SourcePoll::Idle);
    }

    #[test]
    fn read_failure_is_source_unavailable() {
        let mut source = ReaderSource::new(FailingReader, "ttyUSB0");
        let mut buf = [0u8; 8];
        match source.poll(&mut buf) {
            Err(TelemetryError::SourceUnavailable(message)) => {
                assert!(message.contains("ttyUSB0"))
            }
            other => panic!("unexpected poll result: {:?}", other),
        }
    }

    #[test]
    fn boxed_source_forwards() {
        let mut source: Box<dyn ByteSource> =
            Box::new(ReaderSource::new(SleepyReader, "sleepy"));
        let mut buf = [0u8; 8];
        assert_eq!(source.poll(&mut buf).unwrap(), SourcePoll::Idle);
        assert_eq!(source.describe(), "sleepy");
    }

    #[test]
    fn closed_source_stays_closed() {
        let mut source = ReaderSource::from_bytes(b"1,2,3\n".to_vec());
        source.close();
        let mut buf = [0u8; 8];
        assert_eq!(source.poll(&mut buf).unwrap(), SourcePoll::Closed);
    }
}
