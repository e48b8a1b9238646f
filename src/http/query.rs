//! Query parameters
//!
//! An ordered multi-map of query parameters. Order of first insertion is kept
//! so that encoded URLs are stable, and keys may carry several values
//! (`include[]=a&include[]=b`).

use std::fmt;

/// A single caller-supplied query option
pub trait QueryOption: Send + Sync {
    /// Parameter name
    fn name(&self) -> String;

    /// Parameter value
    fn value(&self) -> String;
}

/// Generic key/value query option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opt {
    name: String,
    value: String,
}

impl Opt {
    /// Create a new option
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

impl QueryOption for Opt {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn value(&self) -> String {
        self.value.clone()
    }
}

/// Ordered multi-map of query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build parameters from a list of options, applied in order
    pub fn from_options<O: QueryOption>(options: &[O]) -> Self {
        let mut params = Self::new();
        for opt in options {
            params.apply(opt);
        }
        params
    }

    /// Append a value, keeping any existing values for the key
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Replace every value for the key with a single value
    ///
    /// The key keeps the position of its first occurrence.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter().position(|(k, _)| *k == key) {
            Some(idx) => {
                self.pairs[idx].1 = value;
                let mut seen = false;
                self.pairs.retain(|(k, _)| {
                    if *k != key {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.pairs.push((key, value)),
        }
    }

    /// Builder form of [`QueryParams::set`]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Apply a caller option
    ///
    /// Array-style keys (`name[]`) accumulate; every other key is last write wins.
    pub fn apply(&mut self, opt: &dyn QueryOption) {
        let name = opt.name();
        if name.ends_with("[]") {
            self.add(name, opt.value());
        } else {
            self.set(name, opt.value());
        }
    }

    /// Merge another parameter set into this one
    ///
    /// Every key present in `other` replaces all of this set's values for that key.
    pub fn join(&mut self, other: &QueryParams) {
        for key in other.keys() {
            self.pairs.retain(|(k, _)| k != key);
        }
        self.pairs.extend(other.pairs.iter().cloned());
    }

    /// First value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for a key, in insertion order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Distinct keys in first-insertion order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in &self.pairs {
            if !keys.contains(&k.as_str()) {
                keys.push(k);
            }
        }
        keys
    }

    /// Check if a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Iterate over all key/value pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Raw pairs, suitable for `reqwest::RequestBuilder::query`
    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Number of key/value pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no parameters
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// URL-encode the parameters (`a=1&b=2`)
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.add(k, v);
        }
        params
    }
}
