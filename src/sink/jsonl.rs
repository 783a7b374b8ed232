//! JSON Lines sink: one line per sink call.

use super::{AnalyticsSink, SinkRecord};
use crate::model::error::SinkError;
use crate::model::{LevelId, SessionId, TaskRecord};
use std::io::Write;

/// Writes each sink call as a JSON object followed by a newline.
///
/// The writer is flushed after every `submit_report`.
#[derive(Debug)]
pub struct JsonlSink<W: Write> {
    writer: W,
    lines_written: usize,
}

impl<W: Write> JsonlSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_written: 0,
        }
    }

    /// Number of records successfully written.
    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(&mut self, record: &SinkRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.lines_written += 1;
        Ok(())
    }
}

impl<W: Write> AnalyticsSink for JsonlSink<W> {
    fn initialize(&mut self, app_name: &str, session_id: &SessionId) -> Result<(), SinkError> {
        self.write_record(&SinkRecord::Initialize {
            app_name: app_name.to_string(),
            session_id: session_id.clone(),
        })
    }

    fn start_level(&mut self, level_id: &LevelId) -> Result<(), SinkError> {
        self.write_record(&SinkRecord::StartLevel {
            level_id: level_id.clone(),
        })
    }

    fn record_task(&mut self, task: &TaskRecord) -> Result<(), SinkError> {
        self.write_record(&SinkRecord::RecordTask(task.clone()))
    }

    fn end_level(
        &mut self,
        level_id: &LevelId,
        success: bool,
        duration_ms: u64,
        xp: u64,
    ) -> Result<(), SinkError> {
        self.write_record(&SinkRecord::EndLevel {
            level_id: level_id.clone(),
            success,
            duration_ms,
            xp,
        })
    }

    fn add_raw_metric(&mut self, key: &str, value: &str) -> Result<(), SinkError> {
        self.write_record(&SinkRecord::AddRawMetric {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn submit_report(&mut self) -> Result<(), SinkError> {
        self.write_record(&SinkRecord::SubmitReport)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn writes_one_line_per_call() {
        let mut sink = JsonlSink::new(Vec::new());

        sink.start_level(&LevelId::reflex()).unwrap();
        sink.add_raw_metric("mode", "reflex").unwrap();
        sink.submit_report().unwrap();

        assert_eq!(sink.lines_written(), 3);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        insta::assert_snapshot!(out.trim_end(), @r#"
        {"call":"start_level","level_id":"reflex"}
        {"call":"add_raw_metric","key":"mode","value":"reflex"}
        {"call":"submit_report"}
        "#);
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_failure_surfaces_as_sink_error() {
        let mut sink = JsonlSink::new(BrokenWriter);

        let result = sink.submit_report();

        assert!(result.is_err());
        assert_eq!(sink.lines_written(), 0);
    }
}
