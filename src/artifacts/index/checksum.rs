use crate::artifacts::index::CHECKSUM_SIZE;
use crate::errors::RepositoryError;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};

/// Stream wrapper hashing every byte that passes through it.
///
/// Reading feeds the digest so the trailer can be verified at the end;
/// writing feeds it so the trailer can be appended.
#[derive(Debug)]
pub struct Checksum<T> {
    inner: T,
    digest: Sha1,
}

impl<T> Checksum<T> {
    pub fn new(inner: T) -> Self {
        Checksum {
            inner,
            digest: Sha1::new(),
        }
    }
}

impl<R: Read> Checksum<R> {
    pub fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.inner.read_exact(&mut buffer).map_err(|_| {
            RepositoryError::InvalidRepositoryState(
                "unexpected end-of-file while reading index".into(),
            )
        })?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    /// Consume the rest of the stream and check it ends with the digest of
    /// everything before the trailer. Unknown extensions are hashed, not parsed.
    pub fn verify(mut self) -> anyhow::Result<()> {
        let mut rest = Vec::new();
        self.inner.read_to_end(&mut rest)?;

        if rest.len() < CHECKSUM_SIZE {
            return Err(RepositoryError::InvalidRepositoryState(
                "index file is missing its checksum".into(),
            )
            .into());
        }

        let (extensions, expected_checksum) = rest.split_at(rest.len() - CHECKSUM_SIZE);
        self.digest.update(extensions);
        let actual_checksum = self.digest.finalize();

        if expected_checksum != actual_checksum.as_slice() {
            return Err(RepositoryError::InvalidRepositoryState(
                "index checksum does not match value stored on disk".into(),
            )
            .into());
        }

        Ok(())
    }
}

impl<W: Write> Checksum<W> {
    pub fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.inner.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    /// Append the trailer and hand back the underlying writer.
    pub fn write_checksum(mut self) -> anyhow::Result<W> {
        let checksum = self.digest.finalize();
        self.inner.write_all(checksum.as_slice())?;

        Ok(self.inner)
    }
}
