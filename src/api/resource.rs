//! Purpose: Shared resource surface: descriptor state, filter policy, build contract.
//! Exports: `Resource`, `ResourceBase`, `ApiResult`, skip reason strings.
//! Role: Everything a `Package` needs from a resource, independent of its kind.
//! Invariants: Filters are re-evaluated at every entry point; the decision is logged once.
//! Invariants: Skipping flips tagged state only; descriptors are never nulled in place.
#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::api::options::{evaluate_filters, BuildOptions, FilterDecision};
use crate::api::table::Records;
use crate::core::descriptor::{Descriptor, ResourceState};
use crate::core::error::{Error, ErrorKind};

pub type ApiResult<T> = Result<T, Error>;

pub const SKIP_REASON_INCLUDE: &str = "resource skipped due to include filter";
pub const SKIP_REASON_EXCLUDE: &str = "resource skipped due to exclude filter";

/// One buildable unit of a data package.
pub trait Resource {
    fn name(&self) -> &str;

    fn state(&self) -> &ResourceState;

    /// Descriptor entry for the package manifest, reflecting skip state.
    fn manifest_entry(&self) -> JsonValue;

    /// Build this resource from its generator. `Ok(true)` means data was
    /// produced, `Ok(false)` means the filter skipped it.
    fn make(&mut self, options: &BuildOptions) -> ApiResult<bool>;

    /// Lazy records for this resource, stored or freshly generated.
    ///
    /// The default refuses: only tabular resources have a record form.
    fn fetch(&mut self, options: &BuildOptions) -> ApiResult<Records> {
        let _ = options;
        Err(Error::new(ErrorKind::Usage)
            .with_message("resource does not support fetch")
            .with_resource(self.name()))
    }
}

/// State shared by every resource kind.
pub struct ResourceBase {
    descriptor: Descriptor,
    base_path: Option<PathBuf>,
    state: ResourceState,
    decision_logged: bool,
}

impl ResourceBase {
    pub fn new(descriptor: Descriptor, base_path: Option<PathBuf>) -> Self {
        Self {
            descriptor,
            base_path,
            state: ResourceState::Active,
            decision_logged: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn descriptor_mut(&mut self) -> &mut Descriptor {
        &mut self.descriptor
    }

    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    pub fn manifest_entry(&self) -> JsonValue {
        self.descriptor.manifest_value(&self.state)
    }

    /// Apply the filter policy at one entry point; `true` means skip.
    ///
    /// The state is updated on every call so late option changes win, but
    /// the build-or-skip decision is logged only the first time to keep
    /// per-row appends from flooding the log.
    pub fn evaluate_skip(&mut self, options: &BuildOptions) -> bool {
        let decision = evaluate_filters(&self.descriptor.name, options);
        if !self.decision_logged {
            self.decision_logged = true;
            match decision {
                FilterDecision::Build => {
                    info!(resource = %self.descriptor.name, "making resource");
                }
                FilterDecision::SkipInclude => {
                    debug!(resource = %self.descriptor.name, "skipping resource due to include filter");
                }
                FilterDecision::SkipExclude => {
                    debug!(resource = %self.descriptor.name, "skipping resource due to exclude filter");
                }
            }
        }
        match decision {
            FilterDecision::Build => {
                self.state = ResourceState::Active;
                false
            }
            FilterDecision::SkipInclude => {
                self.state = ResourceState::Skipped(SKIP_REASON_INCLUDE.to_string());
                true
            }
            FilterDecision::SkipExclude => {
                self.state = ResourceState::Skipped(SKIP_REASON_EXCLUDE.to_string());
                true
            }
        }
    }
}
