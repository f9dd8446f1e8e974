//! Path normalization for values declared in configuration files.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against the directory of the file that declared it.
///
/// Absolute paths are returned cleaned but otherwise unchanged. The result
/// never contains `.` or `..` components.
pub fn ensure_absolute(path: &str, file: &Path) -> String {
    let path = Path::new(path);
    if path.is_absolute() {
        return clean(path).to_string_lossy().into_owned();
    }

    let dir = file.parent().unwrap_or_else(|| Path::new(""));
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
    };

    clean(&dir.join(path)).to_string_lossy().into_owned()
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_unchanged() {
        let file = Path::new("/blueprints/consul/main.kdl");
        assert_eq!(ensure_absolute("/opt/charts/consul", file), "/opt/charts/consul");
    }

    #[test]
    fn test_relative_to_declaring_file() {
        let file = Path::new("/blueprints/consul/main.kdl");
        assert_eq!(
            ensure_absolute("./helm/consul", file),
            "/blueprints/consul/helm/consul"
        );
        assert_eq!(
            ensure_absolute("../shared/values.yaml", file),
            "/blueprints/shared/values.yaml"
        );
    }

    #[test]
    fn test_relative_file_is_made_absolute() {
        let resolved = ensure_absolute("data", Path::new("blueprint/main.kdl"));
        assert!(Path::new(&resolved).is_absolute());
        assert!(resolved.ends_with("blueprint/data"));
    }
}
