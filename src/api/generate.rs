// Generator seam: lazy row and file-path sources wired in by the driver.
#![allow(clippy::result_large_err)]

use std::path::PathBuf;

use crate::api::options::BuildOptions;
use crate::core::error::Error;
use crate::core::record::Record;

pub type RowStream = Box<dyn Iterator<Item = Result<Record, Error>>>;
pub type PathStream = Box<dyn Iterator<Item = Result<PathBuf, Error>>>;

/// Source of rows for a tabular resource. Implementations may hold cursor
/// state; a fresh call to `rows` restarts the sequence.
pub trait RowGenerator {
    fn rows(&mut self, options: &BuildOptions) -> Result<RowStream, Error>;
}

/// Source of already-materialized file paths for a file-set resource.
pub trait FileGenerator {
    fn files(&mut self, options: &BuildOptions) -> Result<PathStream, Error>;
}

/// Wrap a closure as a [`RowGenerator`].
pub fn rows_from_fn<F>(f: F) -> impl RowGenerator
where
    F: FnMut(&BuildOptions) -> Result<RowStream, Error>,
{
    RowFn(f)
}

/// Wrap a closure as a [`FileGenerator`].
pub fn files_from_fn<F>(f: F) -> impl FileGenerator
where
    F: FnMut(&BuildOptions) -> Result<PathStream, Error>,
{
    FileFn(f)
}

struct RowFn<F>(F);

impl<F> RowGenerator for RowFn<F>
where
    F: FnMut(&BuildOptions) -> Result<RowStream, Error>,
{
    fn rows(&mut self, options: &BuildOptions) -> Result<RowStream, Error> {
        (self.0)(options)
    }
}

struct FileFn<F>(F);

impl<F> FileGenerator for FileFn<F>
where
    F: FnMut(&BuildOptions) -> Result<PathStream, Error>,
{
    fn files(&mut self, options: &BuildOptions) -> Result<PathStream, Error> {
        (self.0)(options)
    }
}
