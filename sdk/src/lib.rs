//! Client SDK for a chain-anchored content-addressed storage fabric.
//!
//! Files are split into chunks and blocks, optionally sealed with AES-GCM,
//! optionally Reed–Solomon coded across storage nodes, and linked into a
//! UnixFS/DAG-PB merkle DAG whose root CID identifies the file. Bucket and
//! file ownership live in an on-chain registry; every block write is
//! authorized by a locally-produced EIP-712 signature.

pub mod chain;
pub mod cid;
pub mod config;
pub mod connection;
pub mod crypto;
pub mod dag;
mod download;
pub mod eip712;
pub mod erasure;
mod errors;
pub mod fixtures;
pub mod proto;
mod sdk;
pub mod splitter;
mod upload;

pub use cid::{Cid, CODEC_DAG_PB, CODEC_RAW};
pub use config::{SdkConfig, BLOCK_SIZE, MIN_BUCKET_NAME_LENGTH, MIN_FILE_SIZE};
pub use errors::SdkError;
pub use sdk::{Bucket, FileMeta, Sdk};
pub use upload::UploadResult;

#[cfg(test)]
mod tests;
