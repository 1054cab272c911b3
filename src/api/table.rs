//! Purpose: Tabular resources: skip-aware appends, generator-driven builds, dual-path fetch.
//! Exports: `TableResource`, `Records`.
//! Role: The row-oriented resource kind; one CSV file per resource under the package root.
//! Invariants: `fetch` prefers stored rows and never re-encodes generated ones.
//! Invariants: Append goes through the typed codec; the header is written once per instance.
#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use crate::api::generate::{RowGenerator, RowStream};
use crate::api::options::BuildOptions;
use crate::api::resource::{ApiResult, Resource, ResourceBase};
use crate::core::descriptor::{Descriptor, ResourcePath, ResourceState};
use crate::core::error::{Error, ErrorKind};
use crate::core::field::TableSchema;
use crate::core::record::Record;
use crate::core::table::{StoredRows, TableFile};

/// Lazy record sequence returned by `fetch`.
///
/// `Stored` holds an open file handle for its lifetime and restores schema
/// types through the codec; `Generated` passes generator records through
/// untouched; `Empty` is the skipped case.
pub enum Records {
    Stored(StoredRows),
    Generated(RowStream),
    Empty,
}

impl Iterator for Records {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Records::Stored(rows) => rows.next_record().transpose(),
            Records::Generated(stream) => stream.next(),
            Records::Empty => None,
        }
    }
}

/// A typed CSV table under the package root.
pub struct TableResource {
    base: ResourceBase,
    table: Option<TableFile>,
    generator: Option<Box<dyn RowGenerator>>,
}

impl TableResource {
    /// Resource whose rows land in `<parent_path>/<name>.csv`.
    pub fn new(
        name: impl Into<String>,
        schema: TableSchema,
        parent_path: impl Into<PathBuf>,
    ) -> Self {
        let name = name.into();
        let parent_path = parent_path.into();
        let file_name = format!("{name}.csv");
        let descriptor = Descriptor::new(&name)
            .with_path(ResourcePath::Single(file_name.clone()))
            .with_schema(schema.clone());
        let table = TableFile::new(parent_path.join(&file_name), schema);
        Self {
            base: ResourceBase::new(descriptor, Some(parent_path.join(&name))),
            table: Some(table),
            generator: None,
        }
    }

    /// Resource with no storage path; appends fail, `fetch` always
    /// falls through to the generator.
    pub fn transient(name: impl Into<String>, schema: TableSchema) -> Self {
        let descriptor = Descriptor::new(name).with_schema(schema);
        Self {
            base: ResourceBase::new(descriptor, None),
            table: None,
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: impl RowGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.base.descriptor_mut().description = Some(description.into());
        self
    }

    pub fn csv_path(&self) -> Option<&Path> {
        self.table.as_ref().map(TableFile::path)
    }

    /// Append one row now, outside of a generator-driven build.
    pub fn append(&mut self, record: &Record, options: &BuildOptions) -> ApiResult<()> {
        if self.base.evaluate_skip(options) {
            return Ok(());
        }
        append_to_table(self.table.as_mut(), self.base.name(), record)
    }
}

impl Resource for TableResource {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn state(&self) -> &ResourceState {
        self.base.state()
    }

    fn manifest_entry(&self) -> JsonValue {
        self.base.manifest_entry()
    }

    fn make(&mut self, options: &BuildOptions) -> ApiResult<bool> {
        if self.base.evaluate_skip(options) {
            return Ok(false);
        }
        let stream = match self.generator.as_mut() {
            Some(generator) => generator.rows(options)?,
            None => return Ok(true),
        };
        for row in stream {
            let record = row?;
            append_to_table(self.table.as_mut(), self.base.name(), &record)?;
        }
        Ok(true)
    }

    fn fetch(&mut self, options: &BuildOptions) -> ApiResult<Records> {
        if self.base.evaluate_skip(options) {
            return Ok(Records::Empty);
        }
        records_from(self.table.as_ref(), &mut self.generator, options)
    }
}

/// Append through the codec, or refuse when the resource has no storage.
pub(super) fn append_to_table(
    table: Option<&mut TableFile>,
    name: &str,
    record: &Record,
) -> ApiResult<()> {
    let table = table.ok_or_else(|| {
        Error::new(ErrorKind::Storage)
            .with_message("resource has no storage path, cannot append")
            .with_resource(name)
    })?;
    table.append(record)
}

/// The cache-or-compute branch: stored rows when the file exists, generator
/// records otherwise, nothing when there is neither.
pub(super) fn records_from(
    table: Option<&TableFile>,
    generator: &mut Option<Box<dyn RowGenerator>>,
    options: &BuildOptions,
) -> ApiResult<Records> {
    if let Some(table) = table {
        if table.exists() {
            let stored = StoredRows::open(table.path(), table.schema().clone())?;
            return Ok(Records::Stored(stored));
        }
    }
    match generator.as_mut() {
        Some(generator) => Ok(Records::Generated(generator.rows(options)?)),
        None => Ok(Records::Empty),
    }
}
