//! CSV result sinks.
//!
//! The streaming sink writes the header from the plan schema before the
//! first case and flushes every row as it arrives, so partial results
//! survive an interrupted sweep. The buffered sink holds all rows and
//! derives the header from the fields actually present.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use sf_study::OutputMode;
use sf_sweep::{CaseResult, FieldValue, ResultSink, SinkError};

use crate::ResultsResult;

/// Quote a cell if it contains a separator, quote or line break.
pub fn quote_cell(text: &str) -> String {
    if text.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn header_line(columns: &[&str]) -> String {
    let mut line = columns
        .iter()
        .map(|c| quote_cell(c))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn row_line(columns: &[&str], fields: &[(&'static str, FieldValue)]) -> String {
    let mut line = columns
        .iter()
        .map(|column| {
            fields
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| quote_cell(&value.to_string()))
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Writes the header at sweep start and one flushed row per case.
pub struct StreamingCsvSink<W: Write> {
    writer: W,
    schema: Option<Vec<&'static str>>,
}

impl StreamingCsvSink<BufWriter<File>> {
    pub fn create(path: &Path) -> ResultsResult<Self> {
        Ok(Self::new(BufWriter::new(create_file(path)?)))
    }
}

impl<W: Write> StreamingCsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            schema: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for StreamingCsvSink<W> {
    fn begin(&mut self, schema: &[&'static str]) -> Result<(), SinkError> {
        self.writer.write_all(header_line(schema).as_bytes())?;
        self.writer.flush()?;
        self.schema = Some(schema.to_vec());
        Ok(())
    }

    fn accept(&mut self, result: &CaseResult) -> Result<(), SinkError> {
        let Some(schema) = &self.schema else {
            return Err(SinkError::Other(
                "row received before the header was written".to_string(),
            ));
        };
        let line = row_line(schema, &result.fields());
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Collects every row and writes the file once the sweep is over.
pub struct BufferedCsvSink<W: Write> {
    writer: W,
    rows: Vec<Vec<(&'static str, FieldValue)>>,
}

impl BufferedCsvSink<BufWriter<File>> {
    pub fn create(path: &Path) -> ResultsResult<Self> {
        Ok(Self::new(BufWriter::new(create_file(path)?)))
    }
}

impl<W: Write> BufferedCsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            rows: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for BufferedCsvSink<W> {
    fn accept(&mut self, result: &CaseResult) -> Result<(), SinkError> {
        self.rows.push(result.fields());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        // Sorted union of every field name present in any row.
        let columns: Vec<&str> = self
            .rows
            .iter()
            .flat_map(|row| row.iter().map(|(name, _)| *name))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        self.writer.write_all(header_line(&columns).as_bytes())?;
        for row in &self.rows {
            self.writer.write_all(row_line(&columns, row).as_bytes())?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

fn create_file(path: &Path) -> ResultsResult<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Open the CSV sink for `mode` at `path`, truncating any existing file.
pub fn create_sink(path: &Path, mode: OutputMode) -> ResultsResult<Box<dyn ResultSink>> {
    tracing::debug!(path = %path.display(), mode = %mode, "Creating result sink");
    let sink: Box<dyn ResultSink> = match mode {
        OutputMode::Streaming => Box::new(StreamingCsvSink::create(path)?),
        OutputMode::Buffered => Box::new(BufferedCsvSink::create(path)?),
    };
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_sweep::case::{self, CaseKind};
    use sf_sweep::{
        CaseFailure, CaseOutcome, CaseOutputs, CaseParams, ColumnParams, FailureStage, PfrOutputs,
        PfrParams,
    };

    fn pfr_success(index: usize) -> CaseResult {
        CaseResult {
            index,
            params: CaseParams::Pfr(PfrParams::default()),
            outcome: CaseOutcome::Succeeded(CaseOutputs::Pfr(PfrOutputs {
                conversion: 0.5,
                outlet_b_flow_mol_s: 4.7,
                outlet_temperature_c: 100.0,
                heat_duty_kw: 0.0,
                outlet_pressure_bar: 1.0,
            })),
        }
    }

    fn column_failure(index: usize, message: &str) -> CaseResult {
        CaseResult {
            index,
            params: CaseParams::Column(ColumnParams::default()),
            outcome: CaseOutcome::Failed(CaseFailure {
                stage: FailureStage::Solve,
                message: message.to_string(),
            }),
        }
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn quoting_rules() {
        assert_eq!(quote_cell("plain"), "plain");
        assert_eq!(quote_cell("a,b"), "\"a,b\"");
        assert_eq!(quote_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_cell("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn streaming_writes_header_before_any_row() {
        let mut sink = StreamingCsvSink::new(Vec::new());
        let schema = CaseKind::Pfr.schema();
        let mut sorted = schema.clone();
        sorted.sort_unstable();

        sink.begin(&sorted).unwrap();
        let out = text(sink.into_inner());
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("case_index,case_type,conversion,"));
    }

    #[test]
    fn streaming_rows_follow_schema() {
        let mut schema: Vec<&'static str> =
            CaseKind::ALL.iter().flat_map(|k| k.schema()).collect();
        schema.sort_unstable();
        schema.dedup();

        let mut sink = StreamingCsvSink::new(Vec::new());
        sink.begin(&schema).unwrap();
        sink.accept(&pfr_success(0)).unwrap();
        sink.accept(&column_failure(1, "did not converge, giving up")).unwrap();
        sink.finish().unwrap();

        let out = text(sink.into_inner());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);

        let header: Vec<&str> = lines[0].split(',').collect();
        let cells: Vec<&str> = lines[1].split(',').collect();
        let at = |name: &str| header.iter().position(|h| *h == name).unwrap();
        assert_eq!(cells[at(case::CONVERSION)], "0.5");
        assert_eq!(cells[at(case::FIELD_SUCCESS)], "true");
        assert_eq!(cells[at(case::N_STAGES)], "");
        assert!(lines[2].contains("\"did not converge, giving up\""));
    }

    #[test]
    fn streaming_requires_begin() {
        let mut sink = StreamingCsvSink::new(Vec::new());
        assert!(sink.accept(&pfr_success(0)).is_err());
    }

    #[test]
    fn buffered_header_is_union_of_present_fields() {
        let mut sink = BufferedCsvSink::new(Vec::new());
        sink.accept(&pfr_success(0)).unwrap();
        sink.finish().unwrap();

        let out = text(sink.into_inner());
        let header = out.lines().next().unwrap();
        assert!(header.contains(case::CONVERSION));
        assert!(!header.contains(case::DISTILLATE_PURITY_LIGHT));

        let columns: Vec<&str> = header.split(',').collect();
        let mut sorted = columns.clone();
        sorted.sort_unstable();
        assert_eq!(columns, sorted);
    }

    #[test]
    fn buffered_mixed_kinds_leave_absent_fields_empty() {
        let mut sink = BufferedCsvSink::new(Vec::new());
        sink.accept(&pfr_success(0)).unwrap();
        sink.accept(&column_failure(1, "boom")).unwrap();
        sink.finish().unwrap();

        let out = text(sink.into_inner());
        let lines: Vec<&str> = out.lines().collect();
        let header: Vec<&str> = lines[0].split(',').collect();
        assert!(header.contains(&case::REFLUX_RATIO));
        assert!(header.contains(&case::VOLUME_M3));

        let reactor: Vec<&str> = lines[1].split(',').collect();
        let column: Vec<&str> = lines[2].split(',').collect();
        let at = |name: &str| header.iter().position(|h| *h == name).unwrap();
        assert_eq!(reactor[at(case::REFLUX_RATIO)], "");
        assert_eq!(column[at(case::VOLUME_M3)], "");
        assert_eq!(column[at(case::FIELD_FAILED_STAGE)], "solve");
    }
}
