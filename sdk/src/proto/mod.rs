//! Wire types of the node data-plane API.
//!
//! The message and client definitions under `gen/` are checked-in
//! `prost-build`/`tonic-build` output for `protos/node.proto`; helpers on
//! the raw messages live here.

use crate::cid::{self, Cid};

include!("gen/weft.node.v1.rs");

impl ChunkMeta {
    /// Parses and returns the chunk CID, checking well-formedness.
    pub fn validate(&self) -> Result<Cid, cid::Error> {
        Cid::from_bytes(&self.cid)
    }
}

impl DownloadBlockMeta {
    /// Parses and returns the block CID, checking well-formedness.
    pub fn validate(&self) -> Result<Cid, cid::Error> {
        Cid::from_bytes(&self.cid)
    }
}

impl UploadBlockPlacement {
    /// The assigned node id as a fixed 32-byte array, zero-padded or
    /// truncated from the wire value.
    pub fn node_id32(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        let len = usize::min(self.node_id.len(), 32);
        out[..len].copy_from_slice(&self.node_id[..len]);
        out
    }
}
