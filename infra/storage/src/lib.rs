//! A confined, write-once image store.
//!
//! Every path the store touches is derived from untrusted, caller-supplied segments and is
//! guaranteed to stay inside a single storage root. All examples use temporary directories to
//! avoid writing to the real filesystem.
//!
//! # Core Features
//!
//! - **Confinement**: Component-wise path resolution with canonicalization of existing ancestors.
//! - **Object Identifiers**: Twelve-byte, time-ordered ids minted without coordination.
//! - **Write-Once**: Temp write + `fsync` + no-clobber hard link; existing files are never replaced.
//! - **Pruning**: Post-order removal of directories left empty by deletions, never the root.
//! - **Self-Healing**: Stale temp files are purged and empty directories pruned during `connect`.
//!
//! # Examples
//!
//! ```rust
//! use fc_storage::{Storage, StorageError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let root = tmp.path().join("images");
//!     let storage = Storage::builder().root(&root).create(true).connect().await?;
//!
//!     let segments = ["guild", "user", "507f1f77bcf86cd799439011"];
//!     let stored = storage.put(b"image bytes", &segments).await?;
//!
//!     // Deleting the only image prunes `guild/user/<charid>` entirely.
//!     storage.delete_one(&[stored.relative.as_str()]).await?;
//!     assert!(!root.join("guild").exists());
//!     assert!(root.exists());
//!
//!     Ok(())
//! }
//! ```

mod builder;
mod engine;
mod error;
mod maintenance;
mod object_id;
mod security;

pub use builder::StorageBuilder;
pub use engine::{DEFAULT_EXTENSION, Storage, StoredObject};
pub use error::{StorageError, StorageErrorExt};
pub use maintenance::prune_empty_dirs;
pub use object_id::{OBJECT_ID_HEX_LEN, OBJECT_ID_LEN, ObjectId, ObjectIdGenerator};
pub use security::resolve;
