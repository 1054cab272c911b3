// Build options shared by every resource: filter lists plus opaque pass-through keys.
use serde_json::{Map, Value as JsonValue};

/// Options handed to every `make`/`fetch` call.
///
/// `include` and `exclude` are resource-name prefix lists driving the skip
/// policy. Everything in `extra` is carried through to generators untouched;
/// the resource layer never reads it.
#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub extra: Map<String, JsonValue>,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include<I, S>(mut self, include: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(include.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(exclude.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterDecision {
    Build,
    SkipInclude,
    SkipExclude,
}

/// Pure filter policy: include is consulted first, exclude second.
///
/// An empty prefix never matches, but a non-empty include list with only
/// empty prefixes still skips everything, since nothing can match it.
pub fn evaluate_filters(name: &str, options: &BuildOptions) -> FilterDecision {
    if let Some(include) = &options.include {
        if !include.is_empty() {
            let matched = include
                .iter()
                .filter(|prefix| !prefix.is_empty())
                .any(|prefix| name.starts_with(prefix.as_str()));
            if !matched {
                return FilterDecision::SkipInclude;
            }
        }
    }
    if let Some(exclude) = &options.exclude {
        let matched = exclude
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .any(|prefix| name.starts_with(prefix.as_str()));
        if matched {
            return FilterDecision::SkipExclude;
        }
    }
    FilterDecision::Build
}
