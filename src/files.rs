use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::auth::Credential;
use crate::error::{Result, ShareError};

/// An opened upload ready to be streamed back to a client.
#[derive(Debug)]
pub struct FetchedFile {
    pub file: tokio::fs::File,
    pub len: u64,
}

/// A flat directory of uploaded files, addressed by file name.
///
/// The directory listing is the only record of what has been uploaded. Writes
/// are not locked: two uploads of the same name race and the last one wins.
#[derive(Clone, Debug)]
pub struct FileDirectory {
    root: PathBuf,
    credential: Credential,
}

/// Accept `name` only if it is exactly one normal path segment.
fn checked_name(name: &str) -> Result<&str> {
    let single_segment = {
        let mut components = Path::new(name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    };

    if name.is_empty() || !single_segment || name.contains(['/', '\\', '\0']) {
        return Err(ShareError::invalid(format!("invalid file name {name:?}")));
    }
    Ok(name)
}

async fn copy_to_file<S>(file: &mut tokio::fs::File, content: S) -> Result<u64>
where
    S: Stream<Item = Result<Bytes>>,
{
    let mut content = std::pin::pin!(content);
    let mut written = 0u64;
    while let Some(chunk) = content.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

impl FileDirectory {
    pub fn new(root: impl Into<PathBuf>, credential: Credential) -> Self {
        Self {
            root: root.into(),
            credential,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn create_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(checked_name(name)?))
    }

    /// Names of everything in the directory, in the order the filesystem returns them.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    /// Start storing the files of one upload request.
    pub fn store(&self) -> StoreBatch<'_> {
        StoreBatch {
            dir: self,
            stored: 0,
        }
    }

    pub async fn fetch(&self, name: &str) -> Result<FetchedFile> {
        let path = self.path_of(name)?;

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ShareError::NotFound(name.to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(ShareError::NotFound(name.to_owned()));
        }

        Ok(FetchedFile {
            file,
            len: metadata.len(),
        })
    }

    /// Remove `name` after checking `password` against the configured hash.
    ///
    /// Like [`fetch`](Self::fetch), anything that is not a regular file is `NotFound`.
    pub async fn delete(&self, name: &str, password: &str) -> Result<()> {
        if !self.credential.verify(password) {
            tracing::warn!(name, "file delete rejected: wrong password");
            return Err(ShareError::Unauthorized("wrong password".to_owned()));
        }

        let path = self.path_of(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Err(ShareError::NotFound(name.to_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ShareError::NotFound(name.to_owned()));
            }
            Err(e) => return Err(e.into()),
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(name, "file deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ShareError::NotFound(name.to_owned())),
            Err(e) => Err(e.into()),
        }
    }
}

/// The files of one upload request, written to disk as they arrive.
///
/// Each file's name is checked when it arrives. The first failure aborts the
/// batch: files completed earlier are kept, the partly written one is removed.
#[derive(Debug)]
pub struct StoreBatch<'a> {
    dir: &'a FileDirectory,
    stored: usize,
}

impl StoreBatch<'_> {
    /// Stream `content` into `name`, replacing any file of that name.
    pub async fn add<S>(&mut self, name: &str, content: S) -> Result<u64>
    where
        S: Stream<Item = Result<Bytes>>,
    {
        let path = self.dir.path_of(name)?;

        let mut file = match tokio::fs::File::create(&path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(name, error = %e, "upload create failed");
                return Err(e.into());
            }
        };

        match copy_to_file(&mut file, content).await {
            Ok(size) => {
                self.stored += 1;
                tracing::info!(name, size, "file stored");
                Ok(size)
            }
            Err(e) => {
                drop(file);
                tracing::warn!(name, error = %e, "upload aborted");
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(name, error = %rm, "partial upload not removed");
                }
                Err(e)
            }
        }
    }

    /// Close the batch, returning how many files it stored.
    pub fn finish(self) -> Result<usize> {
        if self.stored == 0 {
            return Err(ShareError::invalid("no files were uploaded"));
        }
        Ok(self.stored)
    }
}
