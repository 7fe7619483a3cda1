//! The SDK facade: construction, validation and bucket/file lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tracing::instrument;

use crate::chain::{BucketInfo, ChainClient, RetryPolicy};
use crate::cid::Cid;
use crate::config::{SdkConfig, MIN_BUCKET_NAME_LENGTH};
use crate::connection::ConnectionPool;
use crate::download::Downloader;
use crate::erasure::ErasureCoder;
use crate::errors::SdkError;
use crate::proto::{self, node_api_client::NodeApiClient};
use crate::upload::{derive_bucket_id, derive_file_id, UploadResult, Uploader};

/// How long to wait for a transaction receipt.
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
/// Receipt poll interval.
const RECEIPT_POLL_LATENCY: Duration = Duration::from_millis(500);

/// A bucket as reported by the node.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub name: String,
    pub created_at: i64,
}

/// File metadata as reported by the node. `root_cid` is `None` until the
/// upload committed.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMeta {
    pub root_cid: Option<Cid>,
    pub bucket_name: String,
    pub name: String,
    pub size: u64,
    pub encoded_size: u64,
    pub created_at: i64,
    pub committed_at: i64,
}

/// Client SDK for the storage fabric.
///
/// Owns the connection pool and the chain client; upload/download pipelines
/// borrow both. Dropping the SDK closes every pooled channel.
pub struct Sdk {
    config: SdkConfig,
    pool: Arc<ConnectionPool>,
    chain: Arc<ChainClient>,
    metadata: NodeApiClient<Channel>,
    erasure: Option<ErasureCoder>,
    retry: RetryPolicy,
}

impl Sdk {
    /// Validates the configuration, connects to the node, discovers the
    /// contract deployment and dials the chain endpoint.
    ///
    /// The chain endpoint is `config.ipc_address` when set, otherwise the
    /// `dial_uri` advertised by the node, otherwise `config.address`.
    pub async fn connect(config: SdkConfig) -> Result<Self, SdkError> {
        config.validate()?;
        if config.private_key.is_empty() {
            return Err(SdkError::Config(
                "private key is required for chain operations".into(),
            ));
        }

        let pool = Arc::new(ConnectionPool::new(config.connection_timeout));
        let channel = pool.get(&config.address).await?;
        let mut metadata = NodeApiClient::new(channel);

        let params = metadata
            .connection_params(proto::ConnectionParamsRequest {})
            .await
            .map_err(|s| SdkError::from_status("ConnectionParams", s))?
            .into_inner();
        if params.storage_address.is_empty() {
            return Err(SdkError::Config(
                "node did not advertise a storage contract address".into(),
            ));
        }
        let storage_address = params
            .storage_address
            .parse()
            .map_err(|e| SdkError::Config(format!("invalid storage contract address: {}", e)))?;
        let access_manager_address = if params.access_address.is_empty() {
            None
        } else {
            Some(params.access_address.parse().map_err(|e| {
                SdkError::Config(format!("invalid access manager address: {}", e))
            })?)
        };

        let rpc_url = config
            .ipc_address
            .clone()
            .or_else(|| (!params.dial_uri.is_empty()).then(|| params.dial_uri.clone()))
            .unwrap_or_else(|| format!("http://{}", config.address));

        let retry = RetryPolicy::default();
        let chain = ChainClient::dial(
            &rpc_url,
            &config.private_key,
            storage_address,
            access_manager_address,
            retry.clone(),
            RECEIPT_TIMEOUT,
            RECEIPT_POLL_LATENCY,
        )
        .await?;

        let erasure = if config.parity_blocks_count > 0 {
            Some(ErasureCoder::new(
                config.data_blocks_in_chunk(),
                config.parity_blocks_count,
            )?)
        } else {
            None
        };

        Ok(Self {
            config,
            pool,
            chain: Arc::new(chain),
            metadata,
            erasure,
            retry,
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Creates a bucket on-chain and returns its registry record.
    #[instrument(skip(self))]
    pub async fn create_bucket(&self, name: &str) -> Result<BucketInfo, SdkError> {
        validate_bucket_name(name)?;
        self.chain.create_bucket(name).await?;
        self.chain.get_bucket(name).await
    }

    /// Bucket metadata as the node sees it.
    pub async fn view_bucket(&self, name: &str) -> Result<Bucket, SdkError> {
        validate_bucket_name(name)?;
        let response = self
            .metadata
            .clone()
            .bucket_view(proto::BucketViewRequest {
                bucket_name: name.to_string(),
            })
            .await
            .map_err(|s| SdkError::from_status("BucketView", s))?
            .into_inner();
        let bucket = response
            .bucket
            .ok_or_else(|| SdkError::NotFound(format!("bucket {}", name)))?;
        Ok(Bucket {
            name: bucket.name,
            created_at: bucket.created_at,
        })
    }

    pub async fn list_buckets(&self) -> Result<Vec<Bucket>, SdkError> {
        let response = self
            .metadata
            .clone()
            .bucket_list(proto::BucketListRequest {})
            .await
            .map_err(|s| SdkError::from_status("BucketList", s))?
            .into_inner();
        Ok(response
            .buckets
            .into_iter()
            .map(|bucket| Bucket {
                name: bucket.name,
                created_at: bucket.created_at,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn delete_bucket(&self, name: &str) -> Result<(), SdkError> {
        validate_bucket_name(name)?;
        self.chain.delete_bucket(name).await
    }

    pub async fn file_info(&self, bucket_name: &str, file_name: &str) -> Result<FileMeta, SdkError> {
        validate_file_name(file_name)?;
        validate_bucket_name(bucket_name)?;
        let response = self
            .metadata
            .clone()
            .file_view(proto::FileViewRequest {
                bucket_name: bucket_name.to_string(),
                file_name: file_name.to_string(),
            })
            .await
            .map_err(|s| SdkError::from_status("FileView", s))?
            .into_inner();
        let file = response.file.ok_or_else(|| {
            SdkError::NotFound(format!("file {}/{}", bucket_name, file_name))
        })?;
        file_meta_from_proto(file)
    }

    pub async fn list_files(&self, bucket_name: &str) -> Result<Vec<FileMeta>, SdkError> {
        validate_bucket_name(bucket_name)?;
        let response = self
            .metadata
            .clone()
            .file_list(proto::FileListRequest {
                bucket_name: bucket_name.to_string(),
            })
            .await
            .map_err(|s| SdkError::from_status("FileList", s))?
            .into_inner();
        response.files.into_iter().map(file_meta_from_proto).collect()
    }

    #[instrument(skip(self))]
    pub async fn delete_file(&self, bucket_name: &str, file_name: &str) -> Result<(), SdkError> {
        validate_file_name(file_name)?;
        validate_bucket_name(bucket_name)?;
        self.chain.delete_file(bucket_name, file_name).await
    }

    /// Grants or revokes public read access for a committed file.
    #[instrument(skip(self))]
    pub async fn set_file_public(
        &self,
        bucket_name: &str,
        file_name: &str,
        public: bool,
    ) -> Result<(), SdkError> {
        validate_file_name(file_name)?;
        validate_bucket_name(bucket_name)?;
        let bucket_id = derive_bucket_id(bucket_name, &self.chain.owner_bytes());
        let file_id = derive_file_id(&bucket_id, file_name);
        self.chain.set_public_access(file_id, public).await
    }

    /// Uploads `reader` as `bucket_name/file_name`.
    pub async fn upload<R: AsyncRead + Unpin>(
        &self,
        bucket_name: &str,
        file_name: &str,
        reader: R,
    ) -> Result<UploadResult, SdkError> {
        self.upload_with_cancel(bucket_name, file_name, reader, CancellationToken::new())
            .await
    }

    /// Like [`Sdk::upload`], stopping early when `cancel` fires. A cancelled
    /// upload finishes its in-flight block writes, skips the commit and
    /// leaves the reserved file on-chain.
    pub async fn upload_with_cancel<R: AsyncRead + Unpin>(
        &self,
        bucket_name: &str,
        file_name: &str,
        reader: R,
        cancel: CancellationToken,
    ) -> Result<UploadResult, SdkError> {
        validate_file_name(file_name)?;
        validate_bucket_name(bucket_name)?;
        let uploader = Uploader {
            config: &self.config,
            pool: self.pool.as_ref(),
            chain: self.chain.as_ref(),
            metadata: self.metadata.clone(),
            erasure: self.erasure.as_ref(),
            retry: self.retry.clone(),
            cancel,
        };
        uploader.run(bucket_name, file_name, reader).await
    }

    /// Downloads `bucket_name/file_name` into `writer`.
    pub async fn download<W: AsyncWrite + Unpin>(
        &self,
        bucket_name: &str,
        file_name: &str,
        writer: &mut W,
    ) -> Result<(), SdkError> {
        self.download_with_cancel(bucket_name, file_name, writer, None, CancellationToken::new())
            .await
    }

    /// Downloads the byte range `[start, end)` of a file. Delivery is chunk
    /// granular: the node returns every chunk overlapping the range.
    pub async fn download_range<W: AsyncWrite + Unpin>(
        &self,
        bucket_name: &str,
        file_name: &str,
        writer: &mut W,
        start: u64,
        end: u64,
    ) -> Result<(), SdkError> {
        if end <= start {
            return Err(SdkError::Validation(format!(
                "empty range {}..{}",
                start, end
            )));
        }
        self.download_with_cancel(
            bucket_name,
            file_name,
            writer,
            Some((start, end)),
            CancellationToken::new(),
        )
        .await
    }

    pub async fn download_with_cancel<W: AsyncWrite + Unpin>(
        &self,
        bucket_name: &str,
        file_name: &str,
        writer: &mut W,
        range: Option<(u64, u64)>,
        cancel: CancellationToken,
    ) -> Result<(), SdkError> {
        validate_file_name(file_name)?;
        validate_bucket_name(bucket_name)?;
        let downloader = Downloader {
            config: &self.config,
            pool: self.pool.as_ref(),
            metadata: self.metadata.clone(),
            erasure: self.erasure.as_ref(),
            retry: self.retry.clone(),
            cancel,
        };
        downloader.run(bucket_name, file_name, writer, range).await
    }

    /// Closes all pooled channels.
    pub fn close(&self) {
        self.pool.close();
    }
}

pub(crate) fn validate_file_name(name: &str) -> Result<(), SdkError> {
    if name.is_empty() {
        return Err(SdkError::Validation("empty file name".into()));
    }
    Ok(())
}

pub(crate) fn validate_bucket_name(name: &str) -> Result<(), SdkError> {
    if name.len() < MIN_BUCKET_NAME_LENGTH {
        return Err(SdkError::Validation(format!(
            "invalid bucket name '{}', must be at least {} characters",
            name, MIN_BUCKET_NAME_LENGTH
        )));
    }
    Ok(())
}

fn file_meta_from_proto(file: proto::FileMeta) -> Result<FileMeta, SdkError> {
    let root_cid = if file.root_cid.is_empty() {
        None
    } else {
        Some(Cid::from_bytes(&file.root_cid)?)
    };
    Ok(FileMeta {
        root_cid,
        bucket_name: file.bucket_name,
        name: file.name,
        size: file.size,
        encoded_size: file.encoded_size,
        created_at: file.created_at,
        committed_at: file.committed_at,
    })
}
