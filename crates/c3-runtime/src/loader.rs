//! Reading command declaration files from disk.
//!
//! Each file holds one command declaration in YAML, TOML or JSON and is
//! decoded through figment's format providers. Files are visited in file-name
//! order so that registration (first wins) is deterministic. A bad file is
//! reported and skipped; it never aborts the load.

use std::path::{Path, PathBuf};

use c3_core::CommandDecl;
use figment::Figment;
use figment::providers::{Format, Json};
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use tracing::{debug, info, warn};

use crate::error::{LoadError, LoadResult};

/// Declarations read from one or more directories.
#[derive(Debug, Default)]
pub struct LoadedDeclarations {
    /// Successfully decoded declarations with their source file.
    pub declarations: Vec<(PathBuf, CommandDecl)>,
    /// Files or directories that were skipped.
    pub failures: Vec<LoadError>,
}

impl LoadedDeclarations {
    pub fn decls(&self) -> impl Iterator<Item = &CommandDecl> {
        self.declarations.iter().map(|(_, decl)| decl)
    }

    fn extend(&mut self, other: LoadedDeclarations) {
        self.declarations.extend(other.declarations);
        self.failures.extend(other.failures);
    }
}

/// Decodes one declaration file, dispatching on its extension.
pub fn load_declaration_file(path: &Path) -> LoadResult<CommandDecl> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let figment = match ext.as_str() {
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Figment::from(Yaml::file(path)),
        #[cfg(feature = "toml-config")]
        "toml" => Figment::from(Toml::file(path)),
        "json" => Figment::from(Json::file(path)),
        _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    };

    figment
        .extract::<CommandDecl>()
        .map_err(|e| LoadError::decode(path, e))
}

/// Reads every file in `dir` whose extension is listed in `extensions`.
///
/// Returns `Err` only when the directory itself is missing or unreadable;
/// per-file problems are collected in [`LoadedDeclarations::failures`].
pub fn load_declarations(dir: &Path, extensions: &[String]) -> LoadResult<LoadedDeclarations> {
    if !dir.is_dir() {
        return Err(LoadError::DirectoryNotFound(dir.to_path_buf()));
    }

    let read_error = |source| LoadError::ReadDirectory {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut loaded = LoadedDeclarations::default();
    for path in files {
        match load_declaration_file(&path) {
            Ok(decl) => {
                debug!(path = %path.display(), command = ?decl.name, "Loaded declaration");
                loaded.declarations.push((path, decl));
            }
            Err(e) => {
                warn!(error = %e, "Skipping declaration file");
                loaded.failures.push(e);
            }
        }
    }

    info!(
        dir = %dir.display(),
        loaded = loaded.declarations.len(),
        skipped = loaded.failures.len(),
        "Declaration directory loaded"
    );
    Ok(loaded)
}

/// Loads several directories in order; missing ones are recorded as failures.
pub fn load_directories<P: AsRef<Path>>(dirs: &[P], extensions: &[String]) -> LoadedDeclarations {
    let mut all = LoadedDeclarations::default();
    for dir in dirs {
        match load_declarations(dir.as_ref(), extensions) {
            Ok(loaded) => all.extend(loaded),
            Err(e) => {
                warn!(error = %e, "Skipping declaration directory");
                all.failures.push(e);
            }
        }
    }
    all
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
