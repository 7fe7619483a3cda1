//! Calldata encoding and return decoding for the Storage and AccessManager
//! contracts.

use ethers::abi::{self, ParamType, Token};
use ethers::types::{Address, Bytes, U256};

use crate::crypto::keccak256;
use crate::errors::SdkError;

/// On-chain bucket record as returned by `getBucket`.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketInfo {
    pub name: String,
    pub created_at: u64,
    pub owner: Address,
}

/// On-chain file record as returned by `getFile`.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub name: String,
    pub id: [u8; 32],
    pub size: u64,
    pub created_at: u64,
}

fn encode_call(signature: &str, tokens: &[Token]) -> Bytes {
    let selector = keccak256(signature.as_bytes());
    let mut data = Vec::with_capacity(4 + 32 * tokens.len());
    data.extend_from_slice(&selector[..4]);
    data.extend_from_slice(&abi::encode(tokens));
    data.into()
}

pub fn create_bucket(name: &str) -> Bytes {
    encode_call("createBucket(string)", &[Token::String(name.into())])
}

pub fn delete_bucket(name: &str) -> Bytes {
    encode_call("deleteBucket(string)", &[Token::String(name.into())])
}

pub fn get_bucket(name: &str) -> Bytes {
    encode_call("getBucket(string)", &[Token::String(name.into())])
}

pub fn create_file(bucket_name: &str, file_name: &str, file_id: [u8; 32], size: U256) -> Bytes {
    encode_call(
        "createFile(string,string,bytes32,uint256)",
        &[
            Token::String(bucket_name.into()),
            Token::String(file_name.into()),
            Token::FixedBytes(file_id.to_vec()),
            Token::Uint(size),
        ],
    )
}

pub fn commit_file(bucket_name: &str, file_name: &str, size: U256, root_cid: &[u8]) -> Bytes {
    encode_call(
        "commitFile(string,string,uint256,bytes)",
        &[
            Token::String(bucket_name.into()),
            Token::String(file_name.into()),
            Token::Uint(size),
            Token::Bytes(root_cid.to_vec()),
        ],
    )
}

pub fn delete_file(bucket_name: &str, file_name: &str) -> Bytes {
    encode_call(
        "deleteFile(string,string)",
        &[
            Token::String(bucket_name.into()),
            Token::String(file_name.into()),
        ],
    )
}

pub fn get_file(bucket_name: &str, file_name: &str) -> Bytes {
    encode_call(
        "getFile(string,string)",
        &[
            Token::String(bucket_name.into()),
            Token::String(file_name.into()),
        ],
    )
}

pub fn set_public_access(file_id: [u8; 32], public: bool) -> Bytes {
    encode_call(
        "setPublicAccess(bytes32,bool)",
        &[Token::FixedBytes(file_id.to_vec()), Token::Bool(public)],
    )
}

pub fn decode_bucket(output: &[u8]) -> Result<BucketInfo, SdkError> {
    let tokens = abi::decode(
        &[ParamType::Tuple(vec![
            ParamType::String,
            ParamType::Uint(256),
            ParamType::Address,
        ])],
        output,
    )
    .map_err(|e| SdkError::Chain(format!("malformed getBucket output: {}", e)))?;

    match tokens.into_iter().next() {
        Some(Token::Tuple(fields)) => {
            let mut fields = fields.into_iter();
            match (fields.next(), fields.next(), fields.next()) {
                (
                    Some(Token::String(name)),
                    Some(Token::Uint(created_at)),
                    Some(Token::Address(owner)),
                ) => Ok(BucketInfo {
                    name,
                    created_at: created_at.low_u64(),
                    owner,
                }),
                _ => Err(SdkError::Chain("malformed getBucket tuple".into())),
            }
        }
        _ => Err(SdkError::Chain("malformed getBucket output".into())),
    }
}

pub fn decode_file(output: &[u8]) -> Result<FileInfo, SdkError> {
    let tokens = abi::decode(
        &[ParamType::Tuple(vec![
            ParamType::String,
            ParamType::FixedBytes(32),
            ParamType::Uint(256),
            ParamType::Uint(256),
        ])],
        output,
    )
    .map_err(|e| SdkError::Chain(format!("malformed getFile output: {}", e)))?;

    match tokens.into_iter().next() {
        Some(Token::Tuple(fields)) => {
            let mut fields = fields.into_iter();
            match (fields.next(), fields.next(), fields.next(), fields.next()) {
                (
                    Some(Token::String(name)),
                    Some(Token::FixedBytes(id)),
                    Some(Token::Uint(size)),
                    Some(Token::Uint(created_at)),
                ) if id.len() == 32 => Ok(FileInfo {
                    name,
                    id: id.try_into().expect("checked length"),
                    size: size.low_u64(),
                    created_at: created_at.low_u64(),
                }),
                _ => Err(SdkError::Chain("malformed getFile tuple".into())),
            }
        }
        _ => Err(SdkError::Chain("malformed getFile output".into())),
    }
}
