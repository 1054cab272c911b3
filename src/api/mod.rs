//! Purpose: Define the stable public API surface for building data packages.
//! Exports: Resource kinds, generators, options, and the package type.
//! Role: Public, additive-only surface; internal modules stay private.
//! Invariants: Everything a driver needs is reachable from this module.
//! Invariants: Skip filtering is enforced at every public entry point.

mod combined;
mod files;
mod generate;
mod options;
mod package;
mod resource;
mod table;

pub use crate::core::descriptor::{Descriptor, ResourcePath, ResourceState};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::field::{FieldDef, FieldType, TableSchema};
pub use crate::core::record::Record;
pub use crate::core::table::{StoredRows, TableFile};
pub use crate::core::value::{decode_field, encode_field, Value, NULL_TOKEN};
pub use combined::TableFilesResource;
pub use files::FileSetResource;
pub use generate::{
    files_from_fn, rows_from_fn, FileGenerator, PathStream, RowGenerator, RowStream,
};
pub use options::{evaluate_filters, BuildOptions, FilterDecision};
pub use package::{Package, MANIFEST_FILE_NAME};
pub use resource::{ApiResult, Resource, ResourceBase, SKIP_REASON_EXCLUDE, SKIP_REASON_INCLUDE};
pub use table::{Records, TableResource};
