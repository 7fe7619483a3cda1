//! Streaming upload: the encrypt-on-read splitter feeding erasure coding
//! and DAG building, authorized block push and the on-chain create/commit
//! bracket.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use ethers::types::U256;
use futures::stream::{self, StreamExt, TryStreamExt};
use rand::RngCore;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tracing::{debug, instrument};

use crate::chain::{ChainClient, RetryPolicy};
use crate::cid::Cid;
use crate::config::{SdkConfig, BLOCK_SIZE, ENCRYPTION_OVERHEAD, MIN_FILE_SIZE};
use crate::connection::ConnectionPool;
use crate::crypto;
use crate::dag::{self, ChunkDag, DagRoot};
use crate::eip712::StorageData;
use crate::erasure::ErasureCoder;
use crate::errors::SdkError;
use crate::proto::{self, node_api_client::NodeApiClient};
use crate::splitter::Splitter;

/// How long a signed block authorization stays valid.
const BLOCK_AUTH_TTL_SECS: u64 = 3600;

/// Outcome of a completed upload.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub root_cid: Cid,
    pub bucket_name: String,
    pub file_name: String,
    /// Bytes consumed from the source.
    pub size: u64,
    /// Bytes committed on-chain: the DAG-encoded total.
    pub encoded_size: u64,
}

/// One chunk ready for transport, produced ahead of the uploaders through a
/// bounded queue.
#[derive(Debug)]
pub(crate) struct PreparedChunk {
    pub(crate) index: u64,
    /// Source bytes consumed by this chunk.
    pub(crate) plain_size: u64,
    /// Sealed payload length, what erasure decoding must recover.
    pub(crate) stored_size: u64,
    pub(crate) dag: ChunkDag,
}

pub(crate) struct Uploader<'a> {
    pub config: &'a SdkConfig,
    pub pool: &'a ConnectionPool,
    pub chain: &'a ChainClient,
    pub metadata: NodeApiClient<Channel>,
    pub erasure: Option<&'a ErasureCoder>,
    pub retry: RetryPolicy,
    pub cancel: CancellationToken,
}

impl<'a> Uploader<'a> {
    #[instrument(skip(self, reader), fields(bucket = bucket_name, file = file_name))]
    pub(crate) async fn run<R: AsyncRead + Unpin>(
        &self,
        bucket_name: &str,
        file_name: &str,
        reader: R,
    ) -> Result<UploadResult, SdkError> {
        let owner = self.chain.owner_bytes();
        let bucket_id = derive_bucket_id(bucket_name, &owner);
        let file_id = derive_file_id(&bucket_id, file_name);
        let file_key = match self.config.root_key() {
            Some(root) => Some(crypto::derive_path_key(&root, &[bucket_name, file_name])?),
            None => None,
        };

        let read_size = chunk_read_size(self.config);
        let seal_overhead = if file_key.is_some() {
            ENCRYPTION_OVERHEAD as u64
        } else {
            0
        };
        let mut splitter = Splitter::for_chunks(file_key, reader, read_size);

        let first = splitter
            .next_block()
            .await?
            .ok_or_else(|| SdkError::Validation("cannot upload an empty file".into()))?;
        let first_plain = first.len() as u64 - seal_overhead;
        if first_plain < read_size as u64 && first_plain < MIN_FILE_SIZE {
            return Err(SdkError::Validation(format!(
                "file of {} bytes is below the minimum of {} bytes",
                first_plain, MIN_FILE_SIZE
            )));
        }

        // reserve the name before moving any data
        self.chain
            .create_file(bucket_name, file_name, file_id, U256::zero())
            .await?;
        let mut metadata = self.metadata.clone();
        metadata
            .file_upload_create(proto::FileUploadCreateRequest {
                bucket_id: Bytes::copy_from_slice(&bucket_id),
                file_name: file_name.to_string(),
            })
            .await
            .map_err(|s| SdkError::from_status("FileUploadCreate", s))?;

        let (sender, mut receiver) = mpsc::channel::<PreparedChunk>(self.config.chunk_buffer);

        let producer = {
            let cancel = self.cancel.clone();
            let mut pending = Some(first);
            async move {
                let mut index = 0u64;
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let sealed = match pending.take() {
                        Some(sealed) => sealed,
                        None => match splitter.next_block().await? {
                            Some(sealed) => sealed,
                            None => break,
                        },
                    };
                    let plain_size = sealed.len() as u64 - seal_overhead;
                    let chunk =
                        prepare_chunk(index, sealed, plain_size, self.erasure, BLOCK_SIZE)?;
                    if sender.send(chunk).await.is_err() {
                        // consumer bailed out; its error wins
                        break;
                    }
                    index += 1;
                }
                Ok::<(), SdkError>(())
            }
        };

        // the receiver must drop with this future, or an errored consumer
        // leaves the producer blocked on a full queue
        let consumer = async move {
            let mut root = DagRoot::new();
            let mut total_plain = 0u64;
            while let Some(chunk) = receiver.recv().await {
                if self.cancel.is_cancelled() {
                    return Err(cancelled_mid_upload(bucket_name, file_name));
                }
                debug!(index = chunk.index, blocks = chunk.dag.blocks.len(), "uploading chunk");
                self.upload_chunk(&chunk, &bucket_id, file_name).await?;
                root.add_link(&chunk.dag.cid, chunk.stored_size, chunk.dag.encoded_size);
                total_plain += chunk.plain_size;
            }
            Ok((root, total_plain))
        };

        let (produced, consumed) = futures::join!(producer, consumer);
        produced?;
        let (root, total_plain) = consumed?;
        if self.cancel.is_cancelled() {
            return Err(cancelled_mid_upload(bucket_name, file_name));
        }

        let (root_cid, _, total_encoded) = root.build()?;
        self.chain
            .commit_file(
                bucket_name,
                file_name,
                U256::from(total_encoded),
                &root_cid.to_bytes(),
            )
            .await?;

        Ok(UploadResult {
            root_cid,
            bucket_name: bucket_name.to_string(),
            file_name: file_name.to_string(),
            size: total_plain,
            encoded_size: total_encoded,
        })
    }

    async fn upload_chunk(
        &self,
        chunk: &PreparedChunk,
        bucket_id: &[u8; 32],
        file_name: &str,
    ) -> Result<(), SdkError> {
        let request = proto::FileUploadChunkCreateRequest {
            bucket_id: Bytes::copy_from_slice(bucket_id),
            file_name: file_name.to_string(),
            chunk_cid: chunk.dag.cid.to_bytes(),
            chunk_index: chunk.index,
            raw_size: chunk.stored_size,
            blocks: chunk
                .dag
                .blocks
                .iter()
                .map(|block| proto::BlockDescriptor {
                    cid: block.cid.to_bytes(),
                    size: block.data.len() as u64,
                })
                .collect(),
        };
        let mut metadata = self.metadata.clone();
        let placements = metadata
            .file_upload_chunk_create(request)
            .await
            .map_err(|s| SdkError::from_status("FileUploadChunkCreate", s))?
            .into_inner()
            .blocks;
        if placements.len() != chunk.dag.blocks.len() {
            return Err(SdkError::Transport(format!(
                "expected {} block placements, got {}",
                chunk.dag.blocks.len(),
                placements.len()
            )));
        }

        stream::iter(
            chunk
                .dag
                .blocks
                .iter()
                .zip(&placements)
                .enumerate()
                .map(|(block_index, (block, placement))| {
                    self.upload_block(chunk, block_index as u8, block, placement, bucket_id)
                }),
        )
        .buffer_unordered(self.config.max_concurrency)
        .try_collect::<Vec<()>>()
        .await?;
        Ok(())
    }

    /// Signs and streams one block to its assigned node, in
    /// `block_part_size` fragments. Recoverable transport failures are
    /// retried with backoff; an in-flight write is never abandoned on
    /// cancellation.
    async fn upload_block(
        &self,
        chunk: &PreparedChunk,
        block_index: u8,
        block: &dag::Block,
        placement: &proto::UploadBlockPlacement,
        bucket_id: &[u8; 32],
    ) -> Result<(), SdkError> {
        if self.cancel.is_cancelled() {
            return Err(SdkError::Cancelled("upload cancelled".into()));
        }
        let node_address = if placement.node_address.is_empty() {
            self.config.address.as_str()
        } else {
            placement.node_address.as_str()
        };

        let mut nonce = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut nonce);
        let deadline = now_unix() + BLOCK_AUTH_TTL_SECS;
        let authorization = StorageData {
            chunk_cid: chunk.dag.cid.to_bytes().to_vec(),
            block_cid: *block.cid.digest(),
            chunk_index: chunk.index,
            block_index,
            node_id: placement.node_id32(),
            nonce,
            deadline,
            bucket_id: *bucket_id,
        };
        let signature = self.chain.sign_block(&authorization)?;

        let header = proto::FileUploadBlockRequest {
            cid: block.cid.to_bytes(),
            index: block_index as u32,
            chunk_cid: chunk.dag.cid.to_bytes(),
            chunk_index: chunk.index,
            node_id: Bytes::copy_from_slice(&authorization.node_id),
            signature: Bytes::copy_from_slice(&signature),
            deadline: deadline as i64,
            nonce: Bytes::copy_from_slice(&nonce),
            bucket_id: Bytes::copy_from_slice(bucket_id),
            data: Bytes::new(),
        };
        let parts = block_parts(header, &block.data, self.config.block_part_size);

        let mut attempt = 0u32;
        loop {
            let mut client = self
                .pool
                .create_client(node_address, self.config.use_connection_pool)
                .await?;
            match client
                .file_upload_block(tokio_stream::iter(parts.clone()))
                .await
            {
                Ok(_ack) => return Ok(()),
                Err(status) => {
                    let err = SdkError::from_status("FileUploadBlock", status);
                    if err.is_retryable() && attempt < self.retry.max_attempts {
                        debug!(attempt, block = %block.cid, "retrying block push");
                        tokio::time::sleep(self.retry.backoff(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }
}

fn cancelled_mid_upload(bucket_name: &str, file_name: &str) -> SdkError {
    SdkError::Cancelled(format!(
        "upload cancelled; {}/{} stays reserved on-chain without a commit",
        bucket_name, file_name
    ))
}

/// `keccak256(bucketName ‖ owner)`.
pub(crate) fn derive_bucket_id(bucket_name: &str, owner: &[u8; 20]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(bucket_name.len() + owner.len());
    buf.extend_from_slice(bucket_name.as_bytes());
    buf.extend_from_slice(owner);
    crypto::keccak256(&buf)
}

/// `keccak256(bucketId ‖ fileName)`.
pub(crate) fn derive_file_id(bucket_id: &[u8; 32], file_name: &str) -> [u8; 32] {
    let mut buf = Vec::with_capacity(bucket_id.len() + file_name.len());
    buf.extend_from_slice(bucket_id);
    buf.extend_from_slice(file_name.as_bytes());
    crypto::keccak256(&buf)
}

/// Source bytes consumed per chunk, keeping the sealed payload inside the
/// block budget.
pub(crate) fn chunk_read_size(config: &SdkConfig) -> usize {
    let data_blocks = if config.parity_blocks_count > 0 {
        config.data_blocks_in_chunk()
    } else {
        config.streaming_max_blocks_in_chunk
    };
    let budget = data_blocks * BLOCK_SIZE;
    if config.encryption_key.is_empty() {
        budget
    } else {
        budget - ENCRYPTION_OVERHEAD
    }
}

/// Erasure-codes and DAG-encodes one chunk payload as produced by the
/// splitter (already sealed when a key is configured).
pub(crate) fn prepare_chunk(
    index: u64,
    sealed: Vec<u8>,
    plain_size: u64,
    erasure: Option<&ErasureCoder>,
    block_size: usize,
) -> Result<PreparedChunk, SdkError> {
    let stored_size = sealed.len() as u64;

    let dag = match erasure {
        Some(coder) => {
            let shards = coder.encode(&sealed)?;
            let shard_size = shards[0].len() as u64;
            let payloads: Vec<(Bytes, u64)> = shards
                .iter()
                .enumerate()
                .map(|(i, shard)| {
                    let raw_size = if i < coder.data_blocks() {
                        let start = i as u64 * shard_size;
                        u64::min(shard_size, stored_size.saturating_sub(start))
                    } else {
                        shard_size
                    };
                    (Bytes::copy_from_slice(shard), raw_size)
                })
                .collect();
            dag::build_chunk_dag_from_payloads(&payloads)?
        }
        None => dag::build_chunk_dag(&sealed, block_size)?,
    };

    Ok(PreparedChunk {
        index,
        plain_size,
        stored_size,
        dag,
    })
}

/// Prepends the header part and cuts the payload into `part_size`
/// fragments; every fragment except the last is exactly `part_size` long.
fn block_parts(
    header: proto::FileUploadBlockRequest,
    data: &Bytes,
    part_size: usize,
) -> Vec<proto::FileUploadBlockRequest> {
    let mut parts = Vec::with_capacity(1 + data.len() / part_size.max(1) + 1);
    parts.push(header);
    let mut offset = 0;
    while offset < data.len() {
        let end = usize::min(offset + part_size, data.len());
        parts.push(proto::FileUploadBlockRequest {
            data: data.slice(offset..end),
            ..Default::default()
        });
        offset = end;
    }
    parts
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
