use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::SdkError;

/// Maximum payload of a single block, and upper bound for `block_part_size`.
pub const BLOCK_SIZE: usize = 1 << 20;
/// Bucket names shorter than this are rejected.
pub const MIN_BUCKET_NAME_LENGTH: usize = 3;
/// AES-GCM framing overhead: 12-byte nonce plus 16-byte tag.
pub const ENCRYPTION_OVERHEAD: usize = 28;
/// Smallest uploadable file.
pub const MIN_FILE_SIZE: u64 = 127;
/// Default bound on `k + m` blocks per chunk.
pub const DEFAULT_MAX_BLOCKS_IN_CHUNK: usize = 32;

/// Frozen SDK configuration.
///
/// Built once, validated by [`SdkConfig::validate`] during
/// [`crate::Sdk::connect`], and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// gRPC data-plane endpoint, `host:port`.
    pub address: String,
    /// Blockchain-facing JSON-RPC endpoint. Falls back to the endpoint
    /// advertised by the node, then to `address`.
    pub ipc_address: Option<String>,
    /// 32-byte secp256k1 key, hex encoded (with or without `0x`).
    pub private_key: String,
    /// 32-byte root encryption key, or empty to upload plaintext.
    pub encryption_key: Vec<u8>,
    /// Upper bound on in-flight block operations.
    pub max_concurrency: usize,
    /// Stream fragment size; every fragment except the last is exactly this
    /// long.
    pub block_part_size: usize,
    /// Share gRPC channels across operations.
    pub use_connection_pool: bool,
    /// Bound on `k + m` blocks per chunk.
    pub streaming_max_blocks_in_chunk: usize,
    /// Parity blocks `m`; 0 disables erasure coding.
    pub parity_blocks_count: usize,
    /// Number of prepared chunks buffered ahead of the uploaders.
    pub chunk_buffer: usize,
    /// Per-RPC deadline.
    pub connection_timeout: Duration,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            ipc_address: None,
            private_key: String::new(),
            encryption_key: Vec::new(),
            max_concurrency: 10,
            block_part_size: 128 * 1024,
            use_connection_pool: true,
            streaming_max_blocks_in_chunk: DEFAULT_MAX_BLOCKS_IN_CHUNK,
            parity_blocks_count: 0,
            chunk_buffer: 2,
            connection_timeout: Duration::from_secs(10),
        }
    }
}

impl SdkConfig {
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.address.trim().is_empty() {
            return Err(SdkError::Config("address must not be empty".into()));
        }
        if self.block_part_size == 0 || self.block_part_size > BLOCK_SIZE {
            return Err(SdkError::Config(format!(
                "invalid block_part_size {}, valid range is 1-{}",
                self.block_part_size, BLOCK_SIZE
            )));
        }
        if !self.encryption_key.is_empty() && self.encryption_key.len() != 32 {
            return Err(SdkError::Config(
                "encryption key length should be 32 bytes long".into(),
            ));
        }
        if self.streaming_max_blocks_in_chunk < 2 {
            return Err(SdkError::Config(
                "streaming_max_blocks_in_chunk must be at least 2".into(),
            ));
        }
        if self.parity_blocks_count > self.streaming_max_blocks_in_chunk / 2 {
            return Err(SdkError::Config(format!(
                "parity blocks count {} should be <= {}",
                self.parity_blocks_count,
                self.streaming_max_blocks_in_chunk / 2
            )));
        }
        if self.max_concurrency == 0 {
            return Err(SdkError::Config("max_concurrency must be positive".into()));
        }
        if self.chunk_buffer == 0 {
            return Err(SdkError::Config("chunk_buffer must be positive".into()));
        }
        Ok(())
    }

    /// Data blocks `k` per chunk once parity is reserved.
    pub fn data_blocks_in_chunk(&self) -> usize {
        self.streaming_max_blocks_in_chunk - self.parity_blocks_count
    }

    /// Root encryption key as a fixed array, if one is configured.
    pub fn root_key(&self) -> Option<[u8; 32]> {
        if self.encryption_key.is_empty() {
            None
        } else {
            let mut key = [0u8; 32];
            key.copy_from_slice(&self.encryption_key);
            Some(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid() -> SdkConfig {
        SdkConfig {
            address: "localhost:5000".into(),
            private_key: "ab".repeat(32),
            ..Default::default()
        }
    }

    #[test]
    fn default_passes_with_address() {
        assert!(valid().validate().is_ok());
    }

    #[rstest]
    #[case(0)]
    #[case(BLOCK_SIZE + 1)]
    fn rejects_block_part_size_out_of_range(#[case] size: usize) {
        let cfg = SdkConfig {
            block_part_size: size,
            ..valid()
        };
        assert!(matches!(cfg.validate(), Err(SdkError::Config(_))));
    }

    #[test]
    fn accepts_block_part_size_bounds() {
        for size in [1, BLOCK_SIZE] {
            let cfg = SdkConfig {
                block_part_size: size,
                ..valid()
            };
            assert!(cfg.validate().is_ok());
        }
    }

    #[rstest]
    #[case(16)]
    #[case(33)]
    fn rejects_wrong_key_length(#[case] len: usize) {
        let cfg = SdkConfig {
            encryption_key: vec![1; len],
            ..valid()
        };
        assert!(matches!(cfg.validate(), Err(SdkError::Config(_))));
    }

    #[test]
    fn accepts_32_byte_key() {
        let cfg = SdkConfig {
            encryption_key: vec![7; 32],
            ..valid()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.root_key(), Some([7u8; 32]));
    }

    #[test]
    fn rejects_excess_parity() {
        let cfg = SdkConfig {
            streaming_max_blocks_in_chunk: 32,
            parity_blocks_count: 17,
            ..valid()
        };
        assert!(matches!(cfg.validate(), Err(SdkError::Config(_))));
    }

    #[test]
    fn parity_at_half_is_allowed() {
        let cfg = SdkConfig {
            streaming_max_blocks_in_chunk: 32,
            parity_blocks_count: 16,
            ..valid()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.data_blocks_in_chunk(), 16);
    }

    #[test]
    fn empty_key_means_no_encryption() {
        assert_eq!(valid().root_key(), None);
    }
}
