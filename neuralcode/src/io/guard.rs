//! Path sandbox for every filesystem operation.
//!
//! Paths are resolved lexically: `~` expands to the home directory, relative
//! paths join the sandbox root, and `.`/`..` segments are folded without
//! touching the filesystem. Symlinks are not followed, so the decision is the
//! same whether or not the target exists.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::core::error::EngineError;
use crate::io::config::EngineConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGuard {
    root: PathBuf,
    home: Option<PathBuf>,
    denied: Vec<String>,
}

impl PathGuard {
    /// `root` must be absolute; it is normalized but not canonicalized.
    pub fn new(root: impl AsRef<Path>, home: Option<PathBuf>, denied: Vec<String>) -> Self {
        Self {
            root: normalize(root.as_ref()),
            home: home.map(|home| normalize(&home)),
            denied,
        }
    }

    /// Sandbox rooted at the process working directory.
    pub fn from_env(config: &EngineConfig) -> Result<Self> {
        let root = std::env::current_dir().context("read current directory")?;
        Ok(Self::new(
            root,
            dirs::home_dir(),
            config.denied_path_substrings.clone(),
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `user_path` to an absolute path inside the sandbox.
    pub fn resolve(&self, user_path: &str) -> Result<PathBuf, EngineError> {
        let expanded = self.expand_home(user_path);
        let absolute = if expanded.is_absolute() {
            expanded
        } else {
            self.root.join(expanded)
        };
        let resolved = normalize(&absolute);

        if !resolved.starts_with(&self.root) {
            warn!(path = %resolved.display(), root = %self.root.display(), "path outside sandbox");
            return Err(EngineError::OutOfScope {
                path: user_path.to_string(),
            });
        }

        let rendered = resolved.to_string_lossy();
        if let Some(pattern) = self
            .denied
            .iter()
            .find(|pattern| rendered.contains(pattern.as_str()))
        {
            warn!(path = %resolved.display(), pattern = %pattern, "path matches denylist");
            return Err(EngineError::DeniedPath {
                path: user_path.to_string(),
                pattern: pattern.clone(),
            });
        }

        Ok(resolved)
    }

    fn expand_home(&self, user_path: &str) -> PathBuf {
        if let Some(home) = &self.home {
            if user_path == "~" {
                return home.clone();
            }
            if let Some(rest) = user_path.strip_prefix("~/") {
                return home.join(rest);
            }
        }
        PathBuf::from(user_path)
    }
}

/// Fold `.` and `..` segments. `..` never climbs above the filesystem root.
fn normalize(path: &Path) -> PathBuf {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(root: &Path) -> PathGuard {
        PathGuard::new(
            root,
            Some(PathBuf::from("/home/dev")),
            vec!["/.nvm".to_string()],
        )
    }

    #[test]
    fn relative_paths_resolve_under_root() {
        let g = guard(Path::new("/work/project"));
        assert_eq!(
            g.resolve("src/main.rs").expect("resolve"),
            PathBuf::from("/work/project/src/main.rs")
        );
        assert_eq!(
            g.resolve("./a/../b.txt").expect("resolve"),
            PathBuf::from("/work/project/b.txt")
        );
        assert_eq!(g.resolve(".").expect("resolve"), PathBuf::from("/work/project"));
    }

    #[test]
    fn escaping_paths_are_out_of_scope() {
        let g = guard(Path::new("/work/project"));
        for path in ["../secret", "src/../../x", "/etc/passwd", "/work", "~/notes.txt"] {
            let err = g.resolve(path).expect_err(path);
            assert!(
                matches!(err, EngineError::OutOfScope { .. }),
                "{path}: {err}"
            );
        }
    }

    /// Sibling directories sharing the root's name as a string prefix are
    /// still outside.
    #[test]
    fn sibling_with_common_prefix_is_out_of_scope() {
        let g = guard(Path::new("/work/project"));
        let err = g.resolve("/work/project-evil/x").expect_err("sibling");
        assert!(matches!(err, EngineError::OutOfScope { .. }));
    }

    #[test]
    fn absolute_path_inside_root_is_allowed() {
        let g = guard(Path::new("/work/project"));
        assert_eq!(
            g.resolve("/work/project/lib/x.rs").expect("resolve"),
            PathBuf::from("/work/project/lib/x.rs")
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        let g = guard(Path::new("/home/dev"));
        assert_eq!(
            g.resolve("~/app/main.go").expect("resolve"),
            PathBuf::from("/home/dev/app/main.go")
        );
        assert_eq!(g.resolve("~").expect("resolve"), PathBuf::from("/home/dev"));
    }

    #[test]
    fn denylisted_substring_is_rejected_inside_root() {
        let g = guard(Path::new("/home/dev"));
        let err = g.resolve("~/.nvm/versions/node").expect_err("denied");
        match err {
            EngineError::DeniedPath { pattern, .. } => assert_eq!(pattern, "/.nvm"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(g.resolve(".nvmrc").is_err());
    }

    #[test]
    fn scope_is_checked_before_denylist() {
        let g = guard(Path::new("/work/project"));
        let err = g.resolve("/home/dev/.nvm/x").expect_err("outside");
        assert!(matches!(err, EngineError::OutOfScope { .. }));
    }

    #[test]
    fn missing_home_leaves_tilde_literal() {
        let g = PathGuard::new("/work/project", None, Vec::new());
        assert_eq!(
            g.resolve("~/x").expect("resolve"),
            PathBuf::from("/work/project/~/x")
        );
    }

    #[test]
    fn guards_with_different_roots_coexist() {
        let a = guard(Path::new("/work/a"));
        let b = guard(Path::new("/work/b"));
        assert!(a.resolve("/work/a/f").is_ok());
        assert!(b.resolve("/work/a/f").is_err());
        assert_eq!(a.root(), Path::new("/work/a"));
    }

    #[test]
    fn from_env_sandboxes_the_working_directory() {
        let g = PathGuard::from_env(&EngineConfig::default()).expect("guard");
        let cwd = std::env::current_dir().expect("cwd");
        assert_eq!(g.root(), normalize(&cwd).as_path());
        assert!(g.resolve("Cargo.toml").is_ok());
        assert!(g.resolve("../outside").is_err());
    }
}
