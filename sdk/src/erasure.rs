//! Reed–Solomon erasure coding over `k + m` equal-length shards.

use reed_solomon_erasure::galois_8::ReedSolomon;

use crate::errors::SdkError;

/// Stripe-parallel GF(2^8) Reed–Solomon coder with `k` data shards and `m`
/// parity shards.
pub struct ErasureCoder {
    data_blocks: usize,
    parity_blocks: usize,
    rs: ReedSolomon,
}

impl std::fmt::Debug for ErasureCoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErasureCoder")
            .field("data_blocks", &self.data_blocks)
            .field("parity_blocks", &self.parity_blocks)
            .finish()
    }
}

impl ErasureCoder {
    pub fn new(data_blocks: usize, parity_blocks: usize) -> Result<Self, SdkError> {
        if data_blocks == 0 || parity_blocks == 0 {
            return Err(SdkError::Config(
                "data and parity shards must be > 0".into(),
            ));
        }
        let rs = ReedSolomon::new(data_blocks, parity_blocks)
            .map_err(|e| SdkError::Config(format!("reed-solomon setup failed: {}", e)))?;
        Ok(Self {
            data_blocks,
            parity_blocks,
            rs,
        })
    }

    pub fn data_blocks(&self) -> usize {
        self.data_blocks
    }

    pub fn parity_blocks(&self) -> usize {
        self.parity_blocks
    }

    pub fn total_blocks(&self) -> usize {
        self.data_blocks + self.parity_blocks
    }

    /// Shard length for an input of `len` bytes, after zero-padding.
    pub fn shard_size(&self, len: usize) -> usize {
        (len + self.data_blocks - 1) / self.data_blocks
    }

    /// Splits `data` into `k` zero-padded data shards and appends `m`
    /// computed parity shards. Output order is data shards then parity.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<Vec<u8>>, SdkError> {
        if data.is_empty() {
            return Err(SdkError::Erasure("cannot encode empty input".into()));
        }
        let shard_size = self.shard_size(data.len());

        let mut shards: Vec<Vec<u8>> = Vec::with_capacity(self.total_blocks());
        for i in 0..self.data_blocks {
            let mut shard = vec![0u8; shard_size];
            let start = i * shard_size;
            if start < data.len() {
                let end = usize::min(start + shard_size, data.len());
                shard[..end - start].copy_from_slice(&data[start..end]);
            }
            shards.push(shard);
        }
        for _ in 0..self.parity_blocks {
            shards.push(vec![0u8; shard_size]);
        }

        self.rs
            .encode(&mut shards)
            .map_err(|e| SdkError::Erasure(e.to_string()))?;
        Ok(shards)
    }

    /// Reconstructs the original `original_size` bytes from `k + m` shard
    /// slots, where lost shards are `None`. Fails once more than `m` shards
    /// are missing.
    pub fn decode(
        &self,
        mut shards: Vec<Option<Vec<u8>>>,
        original_size: usize,
    ) -> Result<Vec<u8>, SdkError> {
        if shards.len() != self.total_blocks() {
            return Err(SdkError::Erasure(format!(
                "expected {} shard slots, got {}",
                self.total_blocks(),
                shards.len()
            )));
        }
        let present = shards.iter().filter(|s| s.is_some()).count();
        if present < self.data_blocks {
            return Err(SdkError::Erasure(format!(
                "need {} shards, got {}",
                self.data_blocks, present
            )));
        }

        self.rs
            .reconstruct(&mut shards)
            .map_err(|e| SdkError::Erasure(e.to_string()))?;

        let mut out = Vec::with_capacity(original_size);
        for shard in shards.into_iter().take(self.data_blocks) {
            out.extend_from_slice(&shard.expect("reconstruct fills all shards"));
        }
        out.truncate(original_size);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn rejects_zero_shard_counts() {
        assert!(ErasureCoder::new(0, 2).is_err());
        assert!(ErasureCoder::new(4, 0).is_err());
    }

    #[test]
    fn encode_shape() {
        let coder = ErasureCoder::new(4, 2).unwrap();
        let shards = coder.encode(&sample(401)).unwrap();
        assert_eq!(shards.len(), 6);
        // 401 bytes over 4 data shards pads to 101 each
        assert!(shards.iter().all(|s| s.len() == 101));
    }

    #[test]
    fn roundtrip_with_no_losses() {
        let coder = ErasureCoder::new(4, 2).unwrap();
        let data = sample(1000);
        let shards = coder.encode(&data).unwrap();
        let slots = shards.into_iter().map(Some).collect();
        assert_eq!(coder.decode(slots, data.len()).unwrap(), data);
    }

    /// Losing any m shards still reconstructs the original 400 bytes.
    #[rstest]
    #[case(&[1, 4])]
    #[case(&[0, 5])]
    #[case(&[2, 3])]
    #[case(&[4, 5])]
    fn recovers_after_losing_m_shards(#[case] lost: &[usize]) {
        let coder = ErasureCoder::new(4, 2).unwrap();
        let data = sample(400);
        let shards = coder.encode(&data).unwrap();

        let mut slots: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        for &index in lost {
            slots[index] = None;
        }
        assert_eq!(coder.decode(slots, data.len()).unwrap(), data);
    }

    #[test]
    fn fails_beyond_parity_tolerance() {
        let coder = ErasureCoder::new(4, 2).unwrap();
        let shards = coder.encode(&sample(400)).unwrap();

        let mut slots: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        slots[0] = None;
        slots[2] = None;
        slots[5] = None;
        let err = coder.decode(slots, 400).unwrap_err();
        assert!(matches!(err, SdkError::Erasure(_)));
    }

    #[test]
    fn rejects_wrong_slot_count() {
        let coder = ErasureCoder::new(4, 2).unwrap();
        let err = coder.decode(vec![None; 5], 10).unwrap_err();
        assert!(matches!(err, SdkError::Erasure(_)));
    }

    #[test]
    fn short_input_pads_and_truncates() {
        let coder = ErasureCoder::new(4, 2).unwrap();
        let data = vec![0xab, 0xcd];
        let shards = coder.encode(&data).unwrap();
        assert!(shards.iter().all(|s| s.len() == 1));

        let mut slots: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        slots[1] = None;
        assert_eq!(coder.decode(slots, 2).unwrap(), data);
    }

    #[test]
    fn encode_rejects_empty_input() {
        let coder = ErasureCoder::new(2, 1).unwrap();
        assert!(coder.encode(&[]).is_err());
    }
}
