//! Read-only workspace access.
//!
//! Every path handed to the tools is resolved against the workspace root and
//! rejected if it escapes it. Nothing here writes to disk.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context};
use lookout_core::utils::char_boundary;
use tracing::debug;

/// Directory and file names never shown in workspace summaries.
pub const SKIPPED_ENTRIES: &[&str] = &[
    "bin",
    "obj",
    "node_modules",
    "dist",
    "build",
    "__pycache__",
    "logs",
];

/// Appended to a workspace summary cut at its size budget.
pub const TRUNCATION_MARKER: &str = "\n... (truncated due to size limit)";

/// Line prefix reported in place of an unreadable directory.
pub const READ_ERROR_PREFIX: &str = "Error reading directory:";

// ─────────────────────────────────────────────
// FileSystem trait
// ─────────────────────────────────────────────

/// Read-only view of the workspace consumed by the tools and the loop.
pub trait FileSystem: Send + Sync {
    /// Workspace root as configured.
    fn root(&self) -> &Path;

    /// Read a UTF-8 file.
    fn read_file(&self, path: &str) -> anyhow::Result<String>;

    /// Entry names of a directory, sorted.
    fn list_directory(&self, path: &str) -> anyhow::Result<Vec<String>>;

    /// Whether the path exists inside the workspace.
    fn exists(&self, path: &str) -> bool;

    /// Pre-rendered tree of the workspace, one relative path per line.
    ///
    /// Never fails: unreadable directories are reported inline.
    fn describe_workspace(&self, max_size: usize, max_depth: usize) -> String;
}

// ─────────────────────────────────────────────
// ReadOnlyFileSystem
// ─────────────────────────────────────────────

/// `FileSystem` backed by the local disk, confined to one root directory.
#[derive(Clone, Debug)]
pub struct ReadOnlyFileSystem {
    root: PathBuf,
}

impl ReadOnlyFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root in the form used for containment checks.
    fn canonical_root(&self) -> PathBuf {
        self.root
            .canonicalize()
            .unwrap_or_else(|_| normalize_lexically(&self.root))
    }

    /// Resolve a user-supplied path, relative paths against the root.
    ///
    /// Returns `Err` if the resolved path is outside the workspace.
    fn resolve(&self, path: &str) -> anyhow::Result<PathBuf> {
        let root = self.canonical_root();
        let candidate = Path::new(path);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            root.join(candidate)
        };

        let resolved = match joined.canonicalize() {
            Ok(canon) => canon,
            Err(_) => normalize_lexically(&joined),
        };

        if !resolved.starts_with(&root) {
            bail!(
                "Access denied: path '{}' is outside workspace '{}'",
                path,
                root.display()
            );
        }
        Ok(resolved)
    }

    fn render_tree(&self, root: &Path, dir: &Path, depth: usize, max_depth: usize, out: &mut TreeWriter) {
        if depth > max_depth {
            return;
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(read) => read,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "unreadable directory");
                out.push_line(&format!("{READ_ERROR_PREFIX} {}", dir.display()));
                return;
            }
        };

        let mut entries: Vec<(String, bool, PathBuf)> = entries
            .filter_map(|e| e.ok())
            .map(|e| {
                let is_dir = e.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
                (e.file_name().to_string_lossy().to_string(), is_dir, e.path())
            })
            .filter(|(name, _, _)| !should_skip(name))
            .collect();

        // Directories first, then by name
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        for (_, is_dir, path) in entries {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_string_lossy().to_string();
            let line = if is_dir { format!("{relative}/") } else { relative };
            if !out.push_line(&line) {
                return;
            }
            if is_dir {
                self.render_tree(root, &path, depth + 1, max_depth, out);
                if out.truncated {
                    return;
                }
            }
        }
    }
}

impl FileSystem for ReadOnlyFileSystem {
    fn root(&self) -> &Path {
        &self.root
    }

    fn read_file(&self, path: &str) -> anyhow::Result<String> {
        let resolved = self.resolve(path)?;
        if !resolved.is_file() {
            bail!("File not found: {path}");
        }
        std::fs::read_to_string(&resolved).with_context(|| format!("Failed to read {path}"))
    }

    fn list_directory(&self, path: &str) -> anyhow::Result<Vec<String>> {
        let resolved = self.resolve(path)?;
        if !resolved.is_dir() {
            bail!("Not a directory: {path}");
        }
        let mut names: Vec<String> = std::fs::read_dir(&resolved)
            .with_context(|| format!("Failed to read directory {path}"))?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn describe_workspace(&self, max_size: usize, max_depth: usize) -> String {
        let root = self.canonical_root();
        let mut out = TreeWriter::new(max_size);
        self.render_tree(&root, &root, 0, max_depth, &mut out);
        out.finish()
    }
}

// ─────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────

fn should_skip(name: &str) -> bool {
    name.starts_with('.') || SKIPPED_ENTRIES.contains(&name)
}

/// Resolve `.` and `..` without touching the disk.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Size-bounded line accumulator for the workspace tree.
struct TreeWriter {
    out: String,
    chars: usize,
    max_size: usize,
    truncated: bool,
}

impl TreeWriter {
    fn new(max_size: usize) -> Self {
        Self {
            out: String::new(),
            chars: 0,
            max_size,
            truncated: false,
        }
    }

    /// Append one line; returns `false` once the budget is exhausted.
    fn push_line(&mut self, line: &str) -> bool {
        if self.truncated {
            return false;
        }
        self.out.push_str(line);
        self.out.push('\n');
        self.chars += line.chars().count() + 1;
        if self.chars > self.max_size {
            let cut = char_boundary(&self.out, self.max_size);
            self.out.truncate(cut);
            self.out.push_str(TRUNCATION_MARKER);
            self.truncated = true;
            return false;
        }
        true
    }

    fn finish(self) -> String {
        self.out
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
