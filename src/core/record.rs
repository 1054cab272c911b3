// One row of a tabular resource: field/value pairs in insertion order.
use crate::core::value::Value;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Record {
    pairs: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn from_pairs<N: Into<String>>(pairs: impl IntoIterator<Item = (N, Value)>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.pairs.push((name.into(), value));
    }

    /// First value stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.pairs
            .iter()
            .find(|(stored, _)| stored == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|(name, value)| (name.as_str(), value))
    }
}
