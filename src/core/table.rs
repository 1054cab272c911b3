// CSV table storage: one-time header write, per-call appends, typed read-back.
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::error::{map_io_error_kind, Error, ErrorKind};
use crate::core::field::TableSchema;
use crate::core::record::Record;
use crate::core::value::{decode_field, encode_field};

/// Backing file for one tabular resource.
///
/// The first append truncates the file and writes the header row; every
/// later append grows the file by one record. Each append is a full
/// open-write-close cycle, so the file is readable between calls.
pub struct TableFile {
    path: PathBuf,
    schema: TableSchema,
    initialized: bool,
}

impl TableFile {
    pub fn new(path: impl Into<PathBuf>, schema: TableSchema) -> Self {
        Self {
            path: path.into(),
            schema,
            initialized: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Append one record in schema order, writing the header first on the
    /// first call of this instance.
    pub fn append(&mut self, record: &Record) -> Result<(), Error> {
        if !self.initialized {
            self.write_header()?;
            self.initialized = true;
        }
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                Error::new(map_io_error_kind(&err))
                    .with_message("failed to open table file for append")
                    .with_path(&self.path)
                    .with_source(err)
            })?;
        let mut writer = csv::Writer::from_writer(file);
        let mut row: Vec<String> = Vec::with_capacity(self.schema.fields.len());
        for field in &self.schema.fields {
            let value = record.get(&field.name).ok_or_else(|| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("record is missing field {:?}", field.name))
                    .with_field(&field.name)
            })?;
            row.push(encode_field(value, field)?);
        }
        writer
            .write_record(&row)
            .map_err(|err| map_csv_write_error(err, &self.path))?;
        writer
            .flush()
            .map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to flush appended row")
                    .with_path(&self.path)
                    .with_source(err)
            })?;
        Ok(())
    }

    fn write_header(&self) -> Result<(), Error> {
        info!(path = %self.path.display(), "writing csv resource");
        let file = File::create(&self.path).map_err(|err| {
            Error::new(map_io_error_kind(&err))
                .with_message("failed to create table file")
                .with_path(&self.path)
                .with_source(err)
        })?;
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(self.schema.header())
            .map_err(|err| map_csv_write_error(err, &self.path))?;
        writer.flush().map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to flush header row")
                .with_path(&self.path)
                .with_source(err)
        })?;
        Ok(())
    }
}

/// Lazy reader over a stored table file.
///
/// Schema fields are resolved against the stored header when the file is
/// opened; columns the schema does not name are ignored. One row is held in
/// memory at a time, and a fresh `open` restarts from the top.
pub struct StoredRows {
    reader: csv::Reader<File>,
    columns: Vec<usize>,
    schema: TableSchema,
    path: PathBuf,
    row: csv::StringRecord,
}

impl StoredRows {
    pub fn open(path: impl Into<PathBuf>, schema: TableSchema) -> Result<Self, Error> {
        let path = path.into();
        let file = File::open(&path).map_err(|err| {
            Error::new(map_io_error_kind(&err))
                .with_message("failed to open stored table file")
                .with_path(&path)
                .with_source(err)
        })?;
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
        let header = reader
            .headers()
            .map_err(|err| map_csv_read_error(err, &path))?
            .clone();
        let mut columns = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let index = header
                .iter()
                .position(|name| name == field.name)
                .ok_or_else(|| {
                    Error::new(ErrorKind::Format)
                        .with_message(format!(
                            "stored header is missing field {:?}",
                            field.name
                        ))
                        .with_path(&path)
                        .with_field(&field.name)
                })?;
            columns.push(index);
        }
        Ok(Self {
            reader,
            columns,
            schema,
            path,
            row: csv::StringRecord::new(),
        })
    }

    /// Next stored row with schema types restored; `None` at end of file.
    pub fn next_record(&mut self) -> Result<Option<Record>, Error> {
        let more = self
            .reader
            .read_record(&mut self.row)
            .map_err(|err| map_csv_read_error(err, &self.path))?;
        if !more {
            return Ok(None);
        }
        let mut record = Record::new();
        for (field, &index) in self.schema.fields.iter().zip(&self.columns) {
            let cell = self.row.get(index).unwrap_or("");
            record.push(field.name.clone(), decode_field(cell, field)?);
        }
        Ok(Some(record))
    }
}

fn map_csv_write_error(err: csv::Error, path: &Path) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("failed to write row")
        .with_path(path)
        .with_source(err)
}

fn map_csv_read_error(err: csv::Error, path: &Path) -> Error {
    let kind = if err.is_io_error() {
        ErrorKind::Io
    } else {
        ErrorKind::Format
    };
    Error::new(kind)
        .with_message("failed to read stored row")
        .with_path(path)
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::{StoredRows, TableFile};
    use crate::core::error::ErrorKind;
    use crate::core::field::{FieldDef, FieldType, TableSchema};
    use crate::core::record::Record;
    use crate::core::value::Value;
    use time::macros::datetime;

    fn sample_schema() -> TableSchema {
        TableSchema::new(vec![
            FieldDef::new("id", FieldType::Integer),
            FieldDef::new("scraped_at", FieldType::Datetime),
            FieldDef::new("title", FieldType::String),
        ])
    }

    fn sample_record(id: i64) -> Record {
        Record::from_pairs(vec![
            ("id", Value::Integer(id)),
            ("scraped_at", Value::Datetime(datetime!(2024-01-01 00:00:00 UTC))),
            ("title", Value::Text(format!("row {id}"))),
        ])
    }

    #[test]
    fn header_written_once_across_batched_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("items.csv");
        let mut table = TableFile::new(&path, sample_schema());
        for id in 0..3 {
            table.append(&sample_record(id)).expect("append");
        }
        let text = std::fs::read_to_string(&path).expect("read file");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "id,scraped_at,title");
    }

    #[test]
    fn append_then_read_back_restores_types() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("items.csv");
        let mut table = TableFile::new(&path, sample_schema());
        table.append(&sample_record(7)).expect("append");

        let mut rows = StoredRows::open(&path, sample_schema()).expect("open");
        let record = rows.next_record().expect("read").expect("one row");
        assert_eq!(record.get("id"), Some(&Value::Integer(7)));
        assert_eq!(
            record.get("scraped_at"),
            Some(&Value::Datetime(datetime!(2024-01-01 00:00:00 UTC)))
        );
        assert_eq!(record.get("title"), Some(&Value::Text("row 7".into())));
        assert!(rows.next_record().expect("read").is_none());
    }

    #[test]
    fn reopen_restarts_from_the_top() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("items.csv");
        let mut table = TableFile::new(&path, sample_schema());
        table.append(&sample_record(1)).expect("append");
        table.append(&sample_record(2)).expect("append");

        for _ in 0..2 {
            let mut rows = StoredRows::open(&path, sample_schema()).expect("open");
            let first = rows.next_record().expect("read").expect("row");
            assert_eq!(first.get("id"), Some(&Value::Integer(1)));
        }
    }

    #[test]
    fn record_missing_schema_field_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("items.csv");
        let mut table = TableFile::new(&path, sample_schema());
        let partial = Record::from_pairs(vec![("id", Value::Integer(1))]);
        let err = table.append(&partial).expect_err("must reject");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn stored_header_missing_schema_field_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("items.csv");
        std::fs::write(&path, "id,title\n1,only\n").expect("write file");
        let Err(err) = StoredRows::open(&path, sample_schema()) else {
            panic!("open must reject the stored header");
        };
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn columns_outside_the_schema_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("items.csv");
        std::fs::write(
            &path,
            "extra,id,scraped_at,title\nx,3,2024-01-01T00:00:00Z,ok\n",
        )
        .expect("write file");
        let mut rows = StoredRows::open(&path, sample_schema()).expect("open");
        let record = rows.next_record().expect("read").expect("row");
        assert_eq!(record.len(), 3);
        assert_eq!(record.get("id"), Some(&Value::Integer(3)));
        assert!(record.get("extra").is_none());
    }

    #[test]
    fn first_append_truncates_stale_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("items.csv");
        std::fs::write(&path, "stale content\n").expect("write file");
        let mut table = TableFile::new(&path, sample_schema());
        table.append(&sample_record(1)).expect("append");
        let text = std::fs::read_to_string(&path).expect("read file");
        assert!(text.starts_with("id,scraped_at,title\n"));
    }
}
