use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use shopforge_core::TableFrame;

use crate::errors::Result;
use crate::output::StagedSummary;

/// Write a frame as CSV with a header row. Returns the bytes written.
pub fn write_frame_csv(path: &Path, frame: &TableFrame) -> Result<u64> {
    let writer = BufWriter::new(File::create(path)?);
    render_frame_csv(writer, frame)
}

/// Render a frame as CSV into any writer. Returns the bytes written.
pub fn render_frame_csv<W: Write>(writer: W, frame: &TableFrame) -> Result<u64> {
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(frame.column_names())?;
    for row in &frame.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}

/// Header, data row count and the first `sample` rows of a staged CSV.
pub fn read_csv_summary(path: &Path, sample: usize) -> Result<StagedSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let columns = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut rows = 0_u64;
    let mut sample_rows = Vec::with_capacity(sample);
    for record in reader.records() {
        let record = record?;
        if sample_rows.len() < sample {
            sample_rows.push(record.iter().map(str::to_string).collect());
        }
        rows += 1;
    }

    Ok(StagedSummary {
        columns,
        rows,
        sample: sample_rows,
    })
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use shopforge_core::{CellValue, ColumnKind, ColumnSpec, TableName};

    use super::*;

    #[test]
    fn renders_header_and_nulls() {
        let mut frame = TableFrame::new(
            TableName::Categories,
            vec![
                ColumnSpec::new("id", ColumnKind::Int32, false),
                ColumnSpec::new("parent_id", ColumnKind::Int32, true),
                ColumnSpec::new("name", ColumnKind::Text, false),
            ],
        );
        frame.rows.push(vec![
            CellValue::Int(1),
            CellValue::Null,
            CellValue::Text("Home, Living".to_string()),
        ]);

        let mut buffer = Vec::new();
        let bytes = render_frame_csv(&mut buffer, &frame).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "id,parent_id,name\n1,,\"Home, Living\"\n");
        assert_eq!(bytes, text.len() as u64);
    }
}
