//! Purpose: Package orchestration: directory creation, resource builds, manifest writing.
//! Exports: `Package`, `MANIFEST_FILE_NAME`.
//! Role: The top-level entry point a driver holds; owns resources in insertion order.
//! Invariants: Resource build failures propagate; retry policy belongs to the driver.
//! Invariants: The manifest reflects post-build state and ends in a synced newline.
#![allow(clippy::result_large_err)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info;

use crate::api::options::BuildOptions;
use crate::api::resource::{ApiResult, Resource};
use crate::core::error::{map_io_error_kind, Error, ErrorKind};

pub const MANIFEST_FILE_NAME: &str = "datapackage.json";

/// An ordered collection of resources plus the directory they build into.
pub struct Package {
    name: String,
    base_path: PathBuf,
    resources: Vec<Box<dyn Resource>>,
}

impl Package {
    pub fn new(name: impl Into<String>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_path: base_path.into(),
            resources: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.base_path.join(MANIFEST_FILE_NAME)
    }

    pub fn add(&mut self, resource: impl Resource + 'static) {
        self.resources.push(Box::new(resource));
    }

    pub fn resources(&self) -> &[Box<dyn Resource>] {
        &self.resources
    }

    /// Build every resource in insertion order, then write the manifest.
    ///
    /// A resource failure aborts the build and leaves earlier resources on
    /// disk with no manifest; duplicate names are not checked here.
    pub fn make(&mut self, options: &BuildOptions) -> ApiResult<()> {
        info!(package = %self.name, path = %self.base_path.display(), "making package");
        self.ensure_base_dir()?;
        for resource in &mut self.resources {
            resource.make(options)?;
        }
        self.write_manifest()?;
        info!(package = %self.name, "package build complete");
        Ok(())
    }

    /// The resource named `name`; loud about zero or multiple matches.
    pub fn get_resource(&self, name: &str) -> ApiResult<&dyn Resource> {
        let mut matches = self
            .resources
            .iter()
            .filter(|resource| resource.name() == name);
        let Some(first) = matches.next() else {
            return Err(lookup_not_found(name));
        };
        if matches.next().is_some() {
            return Err(lookup_ambiguous(name));
        }
        Ok(first.as_ref())
    }

    pub fn get_resource_mut(&mut self, name: &str) -> ApiResult<&mut Box<dyn Resource>> {
        let mut matches = self
            .resources
            .iter_mut()
            .filter(|resource| resource.name() == name);
        let Some(first) = matches.next() else {
            return Err(lookup_not_found(name));
        };
        if matches.next().is_some() {
            return Err(lookup_ambiguous(name));
        }
        Ok(first)
    }

    fn ensure_base_dir(&self) -> ApiResult<()> {
        if self.base_path.exists() {
            if !self.base_path.is_dir() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("package path exists and is not a directory")
                    .with_path(&self.base_path));
            }
            return Ok(());
        }
        std::fs::create_dir_all(&self.base_path).map_err(|err| {
            Error::new(map_io_error_kind(&err))
                .with_message("failed to create package directory")
                .with_path(&self.base_path)
                .with_source(err)
        })
    }

    fn write_manifest(&self) -> ApiResult<()> {
        let manifest_path = self.manifest_path();
        info!(path = %manifest_path.display(), "writing package manifest");
        let entries: Vec<serde_json::Value> = self
            .resources
            .iter()
            .map(|resource| resource.manifest_entry())
            .collect();
        let document = json!({"name": self.name, "resources": entries});
        let mut text = serde_json::to_string_pretty(&document).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to serialize manifest")
                .with_source(err)
        })?;
        text.push('\n');
        let mut file = File::create(&manifest_path).map_err(|err| {
            Error::new(map_io_error_kind(&err))
                .with_message("failed to create manifest file")
                .with_path(&manifest_path)
                .with_source(err)
        })?;
        file.write_all(text.as_bytes()).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write manifest")
                .with_path(&manifest_path)
                .with_source(err)
        })?;
        file.sync_all().map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to sync manifest")
                .with_path(&manifest_path)
                .with_source(err)
        })
    }
}

fn lookup_not_found(name: &str) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message("could not find resource")
        .with_resource(name)
}

fn lookup_ambiguous(name: &str) -> Error {
    Error::new(ErrorKind::Ambiguous)
        .with_message("found more than one resource")
        .with_resource(name)
}

#[cfg(test)]
mod tests {
    use super::Package;
    use crate::api::files::FileSetResource;
    use crate::api::options::BuildOptions;
    use crate::api::resource::Resource;
    use crate::core::error::ErrorKind;

    #[test]
    fn lookup_is_loud_about_misses_and_duplicates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut package = Package::new("knesset", dir.path());
        package.add(FileSetResource::new("protocols", dir.path()));
        package.add(FileSetResource::new("protocols", dir.path()));
        package.add(FileSetResource::new("votes", dir.path()));

        let Err(err) = package.get_resource("missing") else {
            panic!("lookup must miss");
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let Err(err) = package.get_resource("protocols") else {
            panic!("duplicate lookup must fail");
        };
        assert_eq!(err.kind(), ErrorKind::Ambiguous);
        assert_eq!(
            package.get_resource("votes").expect("unique").name(),
            "votes"
        );
    }

    #[test]
    fn make_refuses_a_non_directory_base_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file_path = dir.path().join("taken");
        std::fs::write(&file_path, "occupied").expect("write file");
        let mut package = Package::new("knesset", &file_path);
        let err = package.make(&BuildOptions::new()).expect_err("must refuse");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn make_creates_nested_base_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("out/data/knesset");
        let mut package = Package::new("knesset", &base);
        package.make(&BuildOptions::new()).expect("make");
        assert!(base.is_dir());
        assert!(package.manifest_path().is_file());
    }
}
