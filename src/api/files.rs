// File-set resources: append-only collections of opaque files tracked by relative path.
#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use crate::api::generate::FileGenerator;
use crate::api::options::BuildOptions;
use crate::api::resource::{ApiResult, Resource, ResourceBase};
use crate::core::descriptor::{Descriptor, ResourcePath, ResourceState};
use crate::core::error::{Error, ErrorKind};

/// An ordered collection of already-materialized files under the resource's
/// base directory.
///
/// The resource records references only; generators are responsible for
/// putting file content on disk before yielding its path.
pub struct FileSetResource {
    base: ResourceBase,
    generator: Option<Box<dyn FileGenerator>>,
}

impl FileSetResource {
    pub fn new(name: impl Into<String>, parent_path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let base_path = parent_path.into().join(&name);
        let descriptor = Descriptor::new(name).with_path(ResourcePath::Many(Vec::new()));
        Self {
            base: ResourceBase::new(descriptor, Some(base_path)),
            generator: None,
        }
    }

    /// Resource with no storage path; recording files always fails.
    pub fn transient(name: impl Into<String>) -> Self {
        let descriptor = Descriptor::new(name).with_path(ResourcePath::Many(Vec::new()));
        Self {
            base: ResourceBase::new(descriptor, None),
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: impl FileGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.base.descriptor_mut().description = Some(description.into());
        self
    }

    /// Paths recorded so far, in append order.
    pub fn paths(&self) -> &[String] {
        match &self.base.descriptor().path {
            Some(ResourcePath::Many(paths)) => paths,
            _ => &[],
        }
    }

    /// Record one file, relative to the resource's base path when it lives
    /// under it; paths outside the base are recorded as given.
    pub fn append_file(&mut self, file_path: &Path, options: &BuildOptions) -> ApiResult<()> {
        if self.base.evaluate_skip(options) {
            return Ok(());
        }
        record_file_path(&mut self.base, file_path)
    }
}

impl Resource for FileSetResource {
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
            Some(generator) => generator.files(options)?,
            None => return Ok(true),
        };
        for path in stream {
            let path = path?;
            record_file_path(&mut self.base, &path)?;
        }
        Ok(true)
    }
}

/// Append one path to the descriptor's list, relative to the base path.
pub(super) fn record_file_path(base: &mut ResourceBase, file_path: &Path) -> ApiResult<()> {
    let relative = {
        let Some(base_path) = base.base_path() else {
            return Err(Error::new(ErrorKind::Storage)
                .with_message("resource has no storage path, cannot record files")
                .with_resource(base.name()));
        };
        file_path
            .strip_prefix(base_path)
            .unwrap_or(file_path)
            .to_string_lossy()
            .into_owned()
    };
    base.descriptor_mut().push_path(relative);
    Ok(())
}
