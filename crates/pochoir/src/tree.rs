//! File tree provider: walking the styles root, reading inputs and writing
//! outputs.

use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use pochoir_atelier_style::SOURCE_EXTENSION;

use crate::error::{BuildError, BuildResult};

/// Extension of templates
pub const TEMPLATE_EXTENSION: &str = "hbs";

/// File every rewritten style module of a namespace is concatenated into
pub const AGGREGATE_FILE_NAME: &str = "pod-styles.scss";

/// What an input file is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// `*.scoped.scss`
    Style,
    /// `*.hbs`
    Template,
}

impl InputKind {
    /// Kind of the file at `path`, if it is an input at all.
    pub fn of(path: &str) -> Option<Self> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let has_extension = |extension: &str| {
            file_name
                .strip_suffix(extension)
                .and_then(|stem| stem.strip_suffix('.'))
                .is_some_and(|stem| !stem.is_empty())
        };
        if has_extension(SOURCE_EXTENSION) {
            Some(Self::Style)
        } else if has_extension(TEMPLATE_EXTENSION) {
            Some(Self::Template)
        } else {
            None
        }
    }
}

/// A file read from the styles root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub kind: InputKind,
    /// Path relative to the styles root, `/`-separated
    pub relative_path: String,
    pub contents: String,
}

impl InputFile {
    pub fn new(
        kind: InputKind,
        relative_path: impl Into<String>,
        contents: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            relative_path: relative_path.into(),
            contents: contents.into(),
        }
    }
}

/// A rewritten file, to be written under the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Path relative to the namespace output directory
    pub relative_path: String,
    pub contents: String,
}

/// Read every style module and template under `styles_root`, sorted by path.
///
/// The walk honours `.gitignore` and skips hidden files.
pub fn collect_inputs(styles_root: &Path) -> BuildResult<Vec<InputFile>> {
    if !styles_root.is_dir() {
        return Err(BuildError::MissingStylesRoot(styles_root.to_path_buf()));
    }

    let mut inputs = Vec::new();
    for entry in WalkBuilder::new(styles_root).build() {
        let entry = entry.map_err(|source| BuildError::Walk {
            path: styles_root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(styles_root) else {
            continue;
        };
        let relative_path = relative.to_string_lossy().replace('\\', "/");
        let Some(kind) = InputKind::of(&relative_path) else {
            continue;
        };

        let contents = fs::read_to_string(path).map_err(|source| BuildError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        inputs.push(InputFile::new(kind, relative_path, contents));
    }

    inputs.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    tracing::debug!("tree: {} inputs under {}", inputs.len(), styles_root.display());
    Ok(inputs)
}

/// Concatenate rewritten style modules in path order.
pub fn aggregate_styles(styles: &[OutputFile]) -> String {
    let mut sorted: Vec<_> = styles.iter().collect();
    sorted.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    let mut out = String::with_capacity(styles.iter().map(|s| s.contents.len() + 1).sum());
    for style in sorted {
        out.push_str(&style.contents);
        if !style.contents.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Write one file, creating its parent directories.
pub fn write_file(path: &Path, contents: &str) -> BuildResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `files` under `<out_dir>/<namespace>/`, returning the written paths.
pub fn write_outputs(
    out_dir: &Path,
    namespace: &str,
    files: &[OutputFile],
) -> BuildResult<Vec<PathBuf>> {
    let base = out_dir.join(namespace);
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = base.join(&file.relative_path);
        write_file(&path, &file.contents)?;
        written.push(path);
    }
    Ok(written)
}

/// Write the per-namespace aggregate to `<out_dir>/<namespace>/pod-styles.scss`.
pub fn write_aggregate(
    out_dir: &Path,
    namespace: &str,
    styles: &[OutputFile],
) -> BuildResult<PathBuf> {
    let path = out_dir.join(namespace).join(AGGREGATE_FILE_NAME);
    write_file(&path, &aggregate_styles(styles))?;
    Ok(path)
}
