//! Encrypt-on-read splitter: the first stage of the upload pipeline.

use std::io::SeekFrom;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use crate::crypto::{self, KEY_LEN};
use crate::errors::SdkError;

/// Reads a byte source in fixed-size steps and seals each step with a
/// counter-derived subkey.
///
/// [`Splitter::new`] splits at block granularity under `block_{n}` labels
/// and requires a key. The upload pipeline splits at chunk granularity
/// through [`Splitter::for_chunks`], sealing under `chunk_{n}` labels only
/// when a root key is configured.
pub struct Splitter<R> {
    key: Option<[u8; KEY_LEN]>,
    reader: R,
    step_size: usize,
    label: &'static str,
    counter: u64,
    eof: bool,
}

impl<R> Splitter<R> {
    pub fn new(key: &[u8], reader: R, block_size: usize) -> Result<Self, SdkError> {
        if key.is_empty() {
            return Err(SdkError::Config("encryption key cannot be empty".into()));
        }
        if key.len() != KEY_LEN {
            return Err(SdkError::Config(
                "encryption key must be 32 bytes long".into(),
            ));
        }
        let mut fixed = [0u8; KEY_LEN];
        fixed.copy_from_slice(key);
        Ok(Self {
            key: Some(fixed),
            reader,
            step_size: block_size,
            label: "block",
            counter: 0,
            eof: false,
        })
    }

    /// Chunk-granularity splitter feeding the upload pipeline. Without a
    /// key the payloads pass through unsealed.
    pub(crate) fn for_chunks(key: Option<[u8; KEY_LEN]>, reader: R, chunk_size: usize) -> Self {
        Self {
            key,
            reader,
            step_size: chunk_size,
            label: "chunk",
            counter: 0,
            eof: false,
        }
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}

impl<R: AsyncRead + Unpin> Splitter<R> {
    /// Reads and seals the next payload, or `None` at end of stream. A
    /// short final read still yields a (smaller) payload.
    pub async fn next_block(&mut self) -> Result<Option<Vec<u8>>, SdkError> {
        if self.eof {
            return Ok(None);
        }
        let mut buf = vec![0u8; self.step_size];
        let filled = read_full(&mut self.reader, &mut buf).await?;
        if filled == 0 {
            self.eof = true;
            return Ok(None);
        }
        if filled < self.step_size {
            self.eof = true;
        }
        buf.truncate(filled);

        let payload = match &self.key {
            Some(key) => {
                let info = format!("{}_{}", self.label, self.counter);
                crypto::encrypt(key, &buf, info.as_bytes())?
            }
            None => buf,
        };
        self.counter += 1;
        Ok(Some(payload))
    }
}

impl<R: AsyncRead + AsyncSeek + Unpin> Splitter<R> {
    /// Seeks the source back to the start and zeroes the counter.
    pub async fn reset(&mut self) -> Result<(), SdkError> {
        self.reader.seek(SeekFrom::Start(0)).await?;
        self.counter = 0;
        self.eof = false;
        Ok(())
    }
}

/// Fills `buf` from `reader`, tolerating short reads; returns the number of
/// bytes read, which is only smaller than `buf` at end of stream.
pub(crate) async fn read_full<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<usize, SdkError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Advances a non-seekable reader to `position` by reading and discarding.
pub async fn skip_to_position<R: AsyncRead + Unpin>(
    reader: &mut R,
    position: u64,
) -> Result<(), SdkError> {
    let mut take = reader.take(position);
    let copied = tokio::io::copy(&mut take, &mut tokio::io::sink()).await?;
    if copied < position {
        return Err(SdkError::Validation(format!(
            "source ended at {} before reaching position {}",
            copied, position
        )));
    }
    Ok(())
}
