use std::{collections::BTreeMap, fmt};

use anyhow::{anyhow, Result};

const MAX_NAME_LENGTH: usize = 63;
const MAX_PREFIX_LENGTH: usize = 253;

/// Key/value labels attached to an object, kept sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels(pub BTreeMap<String, String>);

impl Labels {
    pub fn new() -> Self {
        Labels(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every label of `selector` is present with the same value.
    pub fn matches(&self, selector: &Labels) -> bool {
        selector
            .0
            .iter()
            .all(|(key, value)| self.0.get(key) == Some(value))
    }

    /// Render the labels as an equality-based label selector,
    /// e.g. `app=nginx,tier=frontend`.
    ///
    /// Fails if any key or value is not a valid label,
    /// or if there are no labels at all,
    /// since an empty selector selects every pod in the namespace.
    pub fn selector(&self) -> Result<String> {
        if self.is_empty() {
            return Err(anyhow!("Refusing to build a selector from an empty label set"));
        }
        for (key, value) in &self.0 {
            validate_key(key)?;
            validate_value(key, value)?;
        }
        Ok(self.to_string())
    }
}

impl From<Option<&BTreeMap<String, String>>> for Labels {
    fn from(labels: Option<&BTreeMap<String, String>>) -> Self {
        Labels(labels.cloned().unwrap_or_default())
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<none>");
        }
        let pairs = self
            .0
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>();
        write!(f, "{}", pairs.join(","))
    }
}

fn validate_key(key: &str) -> Result<()> {
    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            if !is_dns_subdomain(prefix) {
                return Err(anyhow!(
                    "Invalid label key {:?}: prefix must be a lowercase DNS subdomain of at most {} characters",
                    key,
                    MAX_PREFIX_LENGTH
                ));
            }
            name
        },
        None => key,
    };
    if name.is_empty() || !is_qualified_name(name) {
        return Err(anyhow!(
            "Invalid label key {:?}: name must be at most {} alphanumeric characters, '-', '_' or '.', \
             starting and ending with an alphanumeric character",
            key,
            MAX_NAME_LENGTH
        ));
    }
    Ok(())
}

fn validate_value(key: &str, value: &str) -> Result<()> {
    if value.is_empty() || is_qualified_name(value) {
        return Ok(());
    }
    Err(anyhow!(
        "Invalid value {:?} for label {:?}: must be empty or at most {} alphanumeric characters, \
         '-', '_' or '.', starting and ending with an alphanumeric character",
        value,
        key,
        MAX_NAME_LENGTH
    ))
}

fn is_qualified_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            bytes.len() <= MAX_NAME_LENGTH
                && first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes
                    .iter()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b'.'))
        },
        _ => false,
    }
}

fn is_dns_subdomain(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix.len() <= MAX_PREFIX_LENGTH
        && prefix.split('.').all(|part| {
            let bytes = part.as_bytes();
            match (bytes.first(), bytes.last()) {
                (Some(first), Some(last)) => {
                    is_lower_alphanumeric(*first)
                        && is_lower_alphanumeric(*last)
                        && bytes.iter().all(|c| is_lower_alphanumeric(*c) || *c == b'-')
                },
                _ => false,
            }
        })
}

fn is_lower_alphanumeric(c: u8) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}
