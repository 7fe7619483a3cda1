//! Streaming download: chunk discovery, concurrent verified block fetch,
//! erasure recovery and reassembly into the caller's sink.

use futures::stream::{self, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tracing::{debug, instrument, warn};

use crate::chain::RetryPolicy;
use crate::cid::Cid;
use crate::config::SdkConfig;
use crate::connection::ConnectionPool;
use crate::crypto;
use crate::dag;
use crate::erasure::ErasureCoder;
use crate::errors::SdkError;
use crate::proto::{self, node_api_client::NodeApiClient};

pub(crate) struct Downloader<'a> {
    pub config: &'a SdkConfig,
    pub pool: &'a ConnectionPool,
    pub metadata: NodeApiClient<Channel>,
    pub erasure: Option<&'a ErasureCoder>,
    pub retry: RetryPolicy,
    pub cancel: CancellationToken,
}

impl<'a> Downloader<'a> {
    #[instrument(skip(self, writer), fields(bucket = bucket_name, file = file_name))]
    pub(crate) async fn run<W: AsyncWrite + Unpin>(
        &self,
        bucket_name: &str,
        file_name: &str,
        writer: &mut W,
        range: Option<(u64, u64)>,
    ) -> Result<(), SdkError> {
        let file_key = match self.config.root_key() {
            Some(root) => Some(crypto::derive_path_key(&root, &[bucket_name, file_name])?),
            None => None,
        };

        let mut metadata = self.metadata.clone();
        let response = match range {
            None => metadata
                .file_download_create(proto::FileDownloadCreateRequest {
                    bucket_name: bucket_name.to_string(),
                    file_name: file_name.to_string(),
                })
                .await
                .map_err(|s| SdkError::from_status("FileDownloadCreate", s))?
                .into_inner(),
            Some((start, end)) => metadata
                .file_download_range_create(proto::FileDownloadRangeCreateRequest {
                    bucket_name: bucket_name.to_string(),
                    file_name: file_name.to_string(),
                    start,
                    end,
                })
                .await
                .map_err(|s| SdkError::from_status("FileDownloadRangeCreate", s))?
                .into_inner(),
        };

        let mut chunks = response.chunks;
        chunks.sort_by_key(|chunk| chunk.index);

        for chunk in &chunks {
            if self.cancel.is_cancelled() {
                return Err(SdkError::Cancelled("download cancelled".into()));
            }
            let chunk_cid = chunk.validate()?;
            debug!(index = chunk.index, cid = %chunk_cid, "fetching chunk");

            let sealed = self.fetch_chunk(&response.bucket_id, &chunk_cid, chunk).await?;
            let plain = match &file_key {
                Some(key) => crypto::decrypt(
                    key,
                    &sealed,
                    format!("chunk_{}", chunk.index).as_bytes(),
                )?,
                None => sealed,
            };
            writer.write_all(&plain).await?;
        }

        writer.flush().await?;
        Ok(())
    }

    /// Fetches all blocks of one chunk concurrently and reassembles the
    /// sealed chunk payload, recovering through the erasure coder when
    /// blocks are lost or fail verification.
    async fn fetch_chunk(
        &self,
        bucket_id: &bytes::Bytes,
        chunk_cid: &Cid,
        chunk: &proto::ChunkMeta,
    ) -> Result<Vec<u8>, SdkError> {
        let mut metadata = self.metadata.clone();
        let blocks = metadata
            .file_download_chunk_create(proto::FileDownloadChunkCreateRequest {
                bucket_id: bucket_id.clone(),
                chunk_cid: chunk_cid.to_bytes(),
            })
            .await
            .map_err(|s| SdkError::from_status("FileDownloadChunkCreate", s))?
            .into_inner()
            .blocks;
        if blocks.is_empty() {
            return Err(SdkError::NotFound(format!("no blocks for chunk {}", chunk_cid)));
        }

        let erasure = self
            .erasure
            .filter(|coder| blocks.len() == coder.total_blocks());
        let tolerate_losses = erasure.is_some();

        let results: Vec<(usize, Result<Vec<u8>, SdkError>)> =
            stream::iter(blocks.iter().enumerate().map(|(index, meta)| async move {
                (index, self.fetch_block(chunk_cid, meta).await)
            }))
            .buffer_unordered(self.config.max_concurrency)
            .collect()
            .await;

        let mut payloads: Vec<Option<Vec<u8>>> = vec![None; blocks.len()];
        for (index, result) in results {
            match result {
                Ok(payload) => payloads[index] = Some(payload),
                Err(e) if tolerate_losses => {
                    warn!(block = index, error = %e, "treating failed block as erasure");
                }
                Err(e) => return Err(e),
            }
        }

        assemble_chunk(payloads, erasure, chunk.size as usize)
    }

    /// Streams one block from its node and verifies it against its CID.
    async fn fetch_block(
        &self,
        chunk_cid: &Cid,
        meta: &proto::DownloadBlockMeta,
    ) -> Result<Vec<u8>, SdkError> {
        if self.cancel.is_cancelled() {
            return Err(SdkError::Cancelled("download cancelled".into()));
        }
        let block_cid = meta.validate()?;
        let node_address = if meta.node_address.is_empty() {
            self.config.address.as_str()
        } else {
            meta.node_address.as_str()
        };

        let mut attempt = 0u32;
        let data = loop {
            let mut client = self
                .pool
                .create_client(node_address, self.config.use_connection_pool)
                .await?;
            let result = async {
                let mut parts = client
                    .file_download_block(proto::FileDownloadBlockRequest {
                        chunk_cid: chunk_cid.to_bytes(),
                        block_cid: block_cid.to_bytes(),
                        permit: meta.permit.clone(),
                    })
                    .await?
                    .into_inner();
                let mut data = Vec::new();
                while let Some(part) = parts.message().await? {
                    data.extend_from_slice(&part.data);
                }
                Ok::<Vec<u8>, tonic::Status>(data)
            }
            .await;

            match result {
                Ok(data) => break data,
                Err(status) => {
                    let err = SdkError::from_status("FileDownloadBlock", status);
                    if err.is_retryable() && attempt < self.retry.max_attempts {
                        debug!(attempt, block = %block_cid, "retrying block fetch");
                        tokio::time::sleep(self.retry.backoff(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        };

        if !block_cid.matches(&data) {
            return Err(SdkError::Crypto(format!(
                "block {} failed content verification",
                block_cid
            )));
        }
        Ok(dag::extract_block_data(&block_cid, &data)?.to_vec())
    }
}

/// Rebuilds the sealed chunk payload from per-block payload slots: erasure
/// decode when a coder is active, plain link-order concatenation otherwise.
pub(crate) fn assemble_chunk(
    payloads: Vec<Option<Vec<u8>>>,
    erasure: Option<&ErasureCoder>,
    stored_size: usize,
) -> Result<Vec<u8>, SdkError> {
    match erasure {
        Some(coder) => coder.decode(payloads, stored_size),
        None => {
            let mut out = Vec::with_capacity(stored_size);
            for (index, payload) in payloads.into_iter().enumerate() {
                let payload = payload.ok_or_else(|| {
                    SdkError::Transport(format!("block {} missing without erasure coding", index))
                })?;
                out.extend_from_slice(&payload);
            }
            if out.len() != stored_size {
                return Err(SdkError::Crypto(format!(
                    "chunk reassembled to {} bytes, expected {}",
                    out.len(),
                    stored_size
                )));
            }
            Ok(out)
        }
    }
}
