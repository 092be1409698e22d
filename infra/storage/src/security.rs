use crate::error::{StorageError, StorageErrorExt};
use std::path::{Component, Path, PathBuf};

/// Resolves caller-supplied path segments to a location guaranteed to stay inside `root`.
///
/// Segments are joined component by component: `.` is dropped, `..` pops the last joined
/// component and root or prefix components are ignored, so an absolute-looking segment is
/// re-rooted under `root`. A single segment may contain separators.
///
/// The joined path must keep the absolute form of `root` as a component-wise prefix, which
/// also rejects sibling directories such as `/data/images-evil` for `/data/images`. Neither
/// `root` nor the target has to exist. When part of the target exists, its deepest existing
/// ancestor is canonicalized and must still live under the canonical root.
///
/// # Errors
///
/// Returns [`StorageError::PathTraversalAttempt`] when the result would leave `root`.
/// Returns [`StorageError::Io`] if the current directory is needed and unavailable.
///
/// # Examples
///
/// ```rust
/// use fc_storage::resolve;
/// use std::path::Path;
///
/// let path = resolve("/data/images", ["a/b/../c"]).unwrap();
/// assert_eq!(path, Path::new("/data/images/a/c"));
///
/// assert!(resolve("/data/images", ["../../etc/passwd"]).is_err());
/// ```
pub fn resolve<I, S>(root: impl AsRef<Path>, segments: I) -> Result<PathBuf, StorageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<Path>,
{
    let root = absolute_root(root.as_ref())?;
    let mut joined = root.clone();

    for segment in segments {
        for component in segment.as_ref().components() {
            match component {
                Component::Normal(part) => joined.push(part),
                Component::ParentDir => {
                    joined.pop();
                },
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {},
            }
        }
    }

    if !joined.starts_with(&root) {
        return Err(StorageError::PathTraversalAttempt {
            message: joined.display().to_string().into(),
            context: Some(format!("Path escapes storage root {}", root.display()).into()),
        });
    }

    validate_ancestors(&root, &joined)?;
    Ok(joined)
}

/// Absolute, lexically normalized form of `root`. The directory need not exist.
fn absolute_root(root: &Path) -> Result<PathBuf, StorageError> {
    let absolute = std::path::absolute(root)
        .context(format!("Failed to make storage root absolute: {}", root.display()))?;

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            },
            Component::CurDir => {},
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Walks up from `joined` to the first existing ancestor below `root` and checks that its
/// physical location is still inside the canonical root.
///
/// Symlinks swapped in after this check are not detected.
fn validate_ancestors(root: &Path, joined: &Path) -> Result<(), StorageError> {
    let mut current = Some(joined);

    while let Some(path) = current {
        if path == root {
            return Ok(());
        }

        if path.exists() {
            let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
            return match path.canonicalize() {
                Ok(canonical) if canonical.starts_with(&canonical_root) => Ok(()),
                Ok(canonical) => Err(StorageError::PathTraversalAttempt {
                    message: canonical.display().to_string().into(),
                    context: Some("Existing ancestor is a symlink outside storage root".into()),
                }),
                Err(e) => Err(StorageError::Io {
                    source: e,
                    context: Some(format!("Failed to verify ancestor {}", path.display()).into()),
                }),
            };
        }

        current = path.parent();
    }

    Err(StorageError::PathTraversalAttempt {
        message: joined.display().to_string().into(),
        context: Some("No ancestor found within storage root".into()),
    })
}
