//! Locale file reading and writing.
//!
//! A locale file is a JSON object with string leaves, either flat
//! (`"forms__Login__confirm": "Confirm"`) or nested
//! (`{"forms": {"Login": {...}}}` with dot-joined keys). Nested files are
//! auto-flattened on read; the original nesting style is remembered and
//! preserved on write. The file is read once, mutated in memory, and written
//! once per run; a malformed file aborts the whole update rather than
//! risking a destructive overwrite.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use tracing::warn;

/// Ordered identifier → localized text mapping for one locale file.
#[derive(Debug, Clone)]
pub struct LocaleMap {
    entries: Map<String, Value>,
    /// True if the on-disk file used nested objects.
    nested: bool,
    path: PathBuf,
}

impl LocaleMap {
    /// Create an empty flat map that will be written to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            entries: Map::new(),
            nested: false,
            path: path.into(),
        }
    }

    /// Load a locale file. A missing file yields an empty flat map; a file
    /// that exists but fails to parse is a hard error, because guessing at
    /// malformed locale data risks destroying translations on the next write.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::empty(path));
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read locale file: {}", path.display()))?;
        let value: Value = serde_json::from_str(&content).with_context(|| {
            format!(
                "Failed to parse locale file {}; fix the JSON by hand and re-run",
                path.display()
            )
        })?;
        let Value::Object(root) = value else {
            bail!(
                "Locale file {} must contain a JSON object at the top level",
                path.display()
            );
        };

        let nested = root.values().any(Value::is_object);
        let mut entries = Map::new();
        flatten_into(&root, String::new(), path, &mut entries);
        Ok(Self {
            entries,
            nested,
            path: path.to_path_buf(),
        })
    }

    /// Load primary and optional override directories' files for one locale,
    /// with override entries winning.
    pub fn load_merged(primary: &Path, override_path: Option<&Path>) -> Result<Self> {
        let mut map = Self::load(primary)?;
        if let Some(over) = override_path {
            let over_map = Self::load(over)?;
            for (key, value) in over_map.entries {
                map.entries.insert(key, value);
            }
        }
        Ok(map)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).and_then(Value::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Insert or update an entry. Insertion order is preserved on write.
    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(id.into(), Value::String(text.into()));
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize back to the nesting style the file had when read.
    pub fn to_json_string(&self) -> Result<String> {
        let value = if self.nested {
            Value::Object(unflatten(&self.entries))
        } else {
            Value::Object(self.entries.clone())
        };
        let mut text =
            serde_json::to_string_pretty(&value).context("Failed to serialize locale map")?;
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    /// Write the map back to its file, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create locale directory: {}", parent.display())
            })?;
        }
        fs::write(&self.path, self.to_json_string()?)
            .with_context(|| format!("Failed to write locale file: {}", self.path.display()))
    }
}

/// Flatten nested objects into dot-joined keys; string leaves only.
fn flatten_into(object: &Map<String, Value>, prefix: String, path: &Path, out: &mut Map<String, Value>) {
    for (key, value) in object {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::String(_) => {
                out.insert(full_key, value.clone());
            }
            Value::Object(child) => flatten_into(child, full_key, path, out),
            _ => {
                warn!(
                    file = %path.display(),
                    key = %full_key,
                    "skipping non-string locale value"
                );
            }
        }
    }
}

/// Rebuild nested objects from dot-joined keys, preserving entry order.
fn unflatten(flat: &Map<String, Value>) -> Map<String, Value> {
    let mut root = Map::new();
    for (key, value) in flat {
        let parts: Vec<&str> = key.split('.').collect();
        insert_nested(&mut root, &parts, value.clone());
    }
    root
}

fn insert_nested(node: &mut Map<String, Value>, parts: &[&str], value: Value) {
    match parts {
        [] => {}
        [leaf] => {
            node.insert((*leaf).to_string(), value);
        }
        [head, rest @ ..] => {
            let child = node
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            // A flat entry may collide with a nested prefix; the nested
            // form wins and the colliding leaf is replaced by an object.
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child_map) = child {
                insert_nested(child_map, rest, value);
            }
        }
    }
}
