/// Fully qualified key of the gate library setting
pub const GATE_LIBRARY_KEY: &str = "CircuitSettings.gateLibrary";

/// Fully qualified key of the substitution library setting
pub const SUBSTITUTION_LIBRARY_KEY: &str = "CircuitSettings.substitutionLibrary";

/// Ordered set of configuration variables handed to every export
///
/// Keys are unique. Setting an existing key replaces its value in place, so
/// the last write wins while the original ordering of keys is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigVars {
    entries: Vec<(String, String)>,
}

impl ConfigVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, overwriting any earlier value for the same key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Variables in first-set order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of `self` with every variable of `later` applied on top
    pub fn merged(&self, later: &ConfigVars) -> ConfigVars {
        let mut out = self.clone();
        for (k, v) in later.iter() {
            out.set(k, v);
        }
        out
    }

    /// Gate library path; `None` leaves the host default in place
    pub fn gate_library(&self) -> Option<&str> {
        self.get(GATE_LIBRARY_KEY)
    }

    /// Substitution library path; `None` when absent or empty (disabled)
    pub fn substitution_library(&self) -> Option<&str> {
        self.get(SUBSTITUTION_LIBRARY_KEY).filter(|v| !v.is_empty())
    }
}

/// Expand the short CLI spellings of well-known keys
pub fn qualify_key(key: &str) -> &str {
    match key {
        "gateLibrary" => GATE_LIBRARY_KEY,
        "substitutionLibrary" => SUBSTITUTION_LIBRARY_KEY,
        other => other,
    }
}

/// Parse a `KEY=VALUE` assignment; the value may be empty
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{}`", s));
    }
    Ok((qualify_key(key).to_string(), value.to_string()))
}
