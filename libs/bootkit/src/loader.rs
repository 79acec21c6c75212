//! Definition documents.
//!
//! A document is YAML or JSON with a single `modules` list:
//!
//! ```yaml
//! modules:
//!   - id: amod
//!     priority: 100
//!     config:
//!       listen: ":${PORT:-8080}"
//!     inject:
//!       - { target: bmod, slot: sibling }
//! ```
//!
//! Strings inside `config` may reference `${NAME}` or `${NAME:-default}`.
//! `NAME` is looked up in the builder variables, then in the process
//! environment; an empty value falls back to the default. `$$` produces a
//! literal `$`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::{debug, info};

use crate::definition::{Definition, DefinitionSet};
use crate::error::LoadError;

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$|\$\{(?P<name>[A-Za-z_][A-Za-z0-9_.]*)(?::-(?P<default>[^}]*))?\}")
        .expect("placeholder pattern is valid")
});

/// Document syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Format implied by the file extension, if supported.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    #[serde(default)]
    modules: Vec<Definition>,
}

/// Parses definition documents and expands placeholders.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    variables: BTreeMap<String, String>,
}

impl Loader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    /// Parses one document. `origin` names it in errors.
    ///
    /// # Errors
    /// Syntax errors, definitions with an empty id and unresolved placeholders.
    pub fn parse_str(&self, content: &str, format: Format, origin: &str) -> Result<Vec<Definition>, LoadError> {
        let document: Document = match format {
            Format::Yaml => serde_saphyr::from_str(content).map_err(|e| LoadError::Yaml {
                origin: origin.to_owned(),
                message: e.to_string(),
            })?,
            Format::Json => serde_json::from_str(content).map_err(|source| LoadError::Json {
                origin: origin.to_owned(),
                source,
            })?,
        };

        let mut definitions = document.modules;
        for definition in &mut definitions {
            if definition.id.trim().is_empty() {
                return Err(LoadError::EmptyId {
                    origin: origin.to_owned(),
                });
            }
            definition
                .config
                .try_map_strings(&mut |text: &str| self.expand(text, origin))?;
        }
        debug!(origin, modules = definitions.len(), "definitions parsed");
        Ok(definitions)
    }

    /// Loads one file; the format follows its extension.
    ///
    /// # Errors
    /// I/O failures, unsupported extensions and anything
    /// [`parse_str`](Self::parse_str) rejects.
    pub fn load_file(&self, path: &Path) -> Result<Vec<Definition>, LoadError> {
        let format = Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_str(&content, format, &path.display().to_string())
    }

    /// Loads `paths` in the given order into one set.
    ///
    /// # Errors
    /// The first file that fails to load.
    pub fn load_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<DefinitionSet, LoadError> {
        let mut definitions = Vec::new();
        for path in paths {
            definitions.extend(self.load_file(path.as_ref())?);
        }
        Ok(DefinitionSet::new(definitions))
    }

    /// Loads every `*.yaml`, `*.yml` and `*.json` file directly inside `dir`,
    /// in file-name order. Other entries are ignored.
    ///
    /// # Errors
    /// An unreadable directory, or the first file that fails to load.
    pub fn load_dir(&self, dir: &Path) -> Result<DefinitionSet, LoadError> {
        let io_err = |source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && Format::from_path(&path).is_some() {
                files.push(path);
            }
        }
        files.sort();
        info!(dir = %dir.display(), files = files.len(), "loading module definitions");
        self.load_files(&files)
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.variables
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
            .filter(|value| !value.is_empty())
    }

    fn expand(&self, text: &str, origin: &str) -> Result<String, LoadError> {
        if !text.contains('$') {
            return Ok(text.to_owned());
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&text[last..whole.start()]);
            last = whole.end();
            out.push_str(&self.substitute(&caps, origin)?);
        }
        out.push_str(&text[last..]);
        Ok(out)
    }

    fn substitute(&self, caps: &Captures<'_>, origin: &str) -> Result<String, LoadError> {
        let Some(name) = caps.name("name") else {
            return Ok("$".to_owned());
        };
        self.lookup(name.as_str())
            .or_else(|| caps.name("default").map(|d| d.as_str().to_owned()))
            .ok_or_else(|| LoadError::UnresolvedVariable {
                origin: origin.to_owned(),
                name: name.as_str().to_owned(),
            })
    }
}
