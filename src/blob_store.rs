//! Storage for uploaded files such as receipt images.

use std::{
    ffi::OsStr,
    fmt::Debug,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::Error;

/// The URL path prefix under which stored blobs are served.
pub const PUBLIC_PREFIX: &str = "uploads";

/// Stores blobs of bytes by name and hands back a reference that clients can
/// use to fetch them.
pub trait BlobStore: Send + Sync + Debug {
    /// Store `bytes` under `name` and return the public reference to the blob.
    ///
    /// # Errors
    ///
    /// Returns an [Error::BlobExists] if a blob called `name` is already
    /// stored, or an [Error::BlobStorage] if the bytes could not be written.
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String, Error>;

    /// Remove the blob that `reference` points to.
    ///
    /// # Errors
    ///
    /// Returns an [Error::BlobStorage] if the reference is not one that this
    /// store handed out or the blob could not be removed.
    fn remove(&self, reference: &str) -> Result<(), Error>;
}

/// A [BlobStore] that writes blobs as files in a single directory.
///
/// References have the form `uploads/<name>`, so the directory should be
/// served at `/uploads`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store that writes into `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an [Error::BlobStorage] if the directory could not be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();

        fs::create_dir_all(&root).map_err(|error| {
            Error::BlobStorage(format!(
                "could not create upload directory {}: {error}",
                root.display()
            ))
        })?;

        Ok(Self { root })
    }

    /// The directory the blobs are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, Error> {
        // Only bare file names, so that a name cannot escape the root directory.
        if name.is_empty() || Path::new(name).file_name() != Some(OsStr::new(name)) {
            return Err(Error::BlobStorage(format!("invalid blob name \"{name}\"")));
        }

        Ok(self.root.join(name))
    }
}

impl BlobStore for LocalBlobStore {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String, Error> {
        let path = self.path_for(name)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|error| match error.kind() {
                io::ErrorKind::AlreadyExists => Error::BlobExists(name.to_owned()),
                _ => Error::BlobStorage(format!("could not create {}: {error}", path.display())),
            })?;

        if let Err(error) = file.write_all(bytes).and_then(|_| file.sync_all()) {
            // Do not leave a truncated file behind.
            let _ = fs::remove_file(&path);
            return Err(Error::BlobStorage(format!(
                "could not write {}: {error}",
                path.display()
            )));
        }

        tracing::debug!("Stored {} bytes at {}", bytes.len(), path.display());

        Ok(format!("{PUBLIC_PREFIX}/{name}"))
    }

    fn remove(&self, reference: &str) -> Result<(), Error> {
        let name = reference
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| Error::BlobStorage(format!("unknown blob reference \"{reference}\"")))?;
        let path = self.path_for(name)?;

        fs::remove_file(&path).map_err(|error| {
            Error::BlobStorage(format!("could not remove {}: {error}", path.display()))
        })
    }
}

#[cfg(test)]
mod local_blob_store_tests {
    use std::fs;

    use tempfile::tempdir;

    use crate::{BlobStore, Error, LocalBlobStore};

    #[test]
    fn put_writes_file_and_returns_reference() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();

        let reference = store.put("image-1.png", b"not really a png").unwrap();

        assert_eq!(reference, "uploads/image-1.png");
        assert_eq!(
            fs::read(dir.path().join("image-1.png")).unwrap(),
            b"not really a png"
        );
    }

    #[test]
    fn new_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("public").join("uploads");

        let store = LocalBlobStore::new(&root).unwrap();

        assert!(store.root().is_dir());
    }

    #[test]
    fn put_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();
        store.put("image-1.png", b"first").unwrap();

        let result = store.put("image-1.png", b"second");

        assert_eq!(result, Err(Error::BlobExists("image-1.png".to_owned())));
        assert_eq!(fs::read(dir.path().join("image-1.png")).unwrap(), b"first");
    }

    #[test]
    fn put_rejects_names_with_paths() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("uploads")).unwrap();

        for name in ["../escape.png", "nested/image.png", ""] {
            assert!(
                matches!(store.put(name, b"x"), Err(Error::BlobStorage(_))),
                "want an error for {name:?}"
            );
        }
    }

    #[test]
    fn remove_deletes_file() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();
        let reference = store.put("image-1.jpg", b"bytes").unwrap();

        store.remove(&reference).unwrap();

        assert!(!dir.path().join("image-1.jpg").exists());
    }

    #[test]
    fn remove_rejects_foreign_reference() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();

        assert!(matches!(
            store.remove("elsewhere/image-1.jpg"),
            Err(Error::BlobStorage(_))
        ));
    }
}
