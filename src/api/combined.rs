// Combined resources: one name carrying both a typed table and a set of collected files.
#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use crate::api::files::record_file_path;
use crate::api::generate::{FileGenerator, RowGenerator};
use crate::api::options::BuildOptions;
use crate::api::resource::{ApiResult, Resource, ResourceBase};
use crate::api::table::{append_to_table, records_from, Records};
use crate::core::descriptor::{Descriptor, ResourcePath, ResourceState};
use crate::core::field::TableSchema;
use crate::core::record::Record;
use crate::core::table::TableFile;

/// A resource that is a table and a file collection at the same time.
///
/// The descriptor's path list starts with the table's own file and grows
/// with every collected file. There is no generic append; callers say which
/// half they mean via `append_csv` or `append_file`.
pub struct TableFilesResource {
    base: ResourceBase,
    table: Option<TableFile>,
    row_generator: Option<Box<dyn RowGenerator>>,
    file_generator: Option<Box<dyn FileGenerator>>,
}

impl TableFilesResource {
    pub fn new(
        name: impl Into<String>,
        schema: TableSchema,
        parent_path: impl Into<PathBuf>,
    ) -> Self {
        let name = name.into();
        let parent_path = parent_path.into();
        let file_name = format!("{name}.csv");
        let descriptor = Descriptor::new(&name)
            .with_path(ResourcePath::Many(vec![file_name.clone()]))
            .with_schema(schema.clone());
        let table = TableFile::new(parent_path.join(&file_name), schema);
        Self {
            base: ResourceBase::new(descriptor, Some(parent_path.join(&name))),
            table: Some(table),
            row_generator: None,
            file_generator: None,
        }
    }

    pub fn with_rows(mut self, generator: impl RowGenerator + 'static) -> Self {
        self.row_generator = Some(Box::new(generator));
        self
    }

    pub fn with_files(mut self, generator: impl FileGenerator + 'static) -> Self {
        self.file_generator = Some(Box::new(generator));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.base.descriptor_mut().description = Some(description.into());
        self
    }

    pub fn csv_path(&self) -> Option<&Path> {
        self.table.as_ref().map(TableFile::path)
    }

    /// Paths recorded so far, the table file first.
    pub fn paths(&self) -> &[String] {
        match &self.base.descriptor().path {
            Some(ResourcePath::Many(paths)) => paths,
            _ => &[],
        }
    }

    pub fn append_csv(&mut self, record: &Record, options: &BuildOptions) -> ApiResult<()> {
        if self.base.evaluate_skip(options) {
            return Ok(());
        }
        append_to_table(self.table.as_mut(), self.base.name(), record)
    }

    pub fn append_file(&mut self, file_path: &Path, options: &BuildOptions) -> ApiResult<()> {
        if self.base.evaluate_skip(options) {
            return Ok(());
        }
        record_file_path(&mut self.base, file_path)
    }
}

impl Resource for TableFilesResource {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn state(&self) -> &ResourceState {
        self.base.state()
    }

    fn manifest_entry(&self) -> JsonValue {
        self.base.manifest_entry()
    }

    /// Both halves run, files first; neither aborts the other. The build
    /// counts as produced only when each phase appended at least one item.
    fn make(&mut self, options: &BuildOptions) -> ApiResult<bool> {
        if self.base.evaluate_skip(options) {
            return Ok(false);
        }
        let file_stream = match self.file_generator.as_mut() {
            Some(generator) => Some(generator.files(options)?),
            None => None,
        };
        let mut files_appended = false;
        if let Some(stream) = file_stream {
            for path in stream {
                let path = path?;
                record_file_path(&mut self.base, &path)?;
                files_appended = true;
            }
        }
        let row_stream = match self.row_generator.as_mut() {
            Some(generator) => Some(generator.rows(options)?),
            None => None,
        };
        let mut rows_appended = false;
        if let Some(stream) = row_stream {
            for row in stream {
                let record = row?;
                append_to_table(self.table.as_mut(), self.base.name(), &record)?;
                rows_appended = true;
            }
        }
        Ok(files_appended && rows_appended)
    }

    fn fetch(&mut self, options: &BuildOptions) -> ApiResult<Records> {
        if self.base.evaluate_skip(options) {
            return Ok(Records::Empty);
        }
        records_from(self.table.as_ref(), &mut self.row_generator, options)
    }
}
