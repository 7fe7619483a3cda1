//! EIP-712 typed structured data hashing and signing.
//!
//! Implements the standard `hashStruct`/`encodeData` scheme over a declared
//! field table, plus the concrete [`StorageData`] message that authorizes a
//! single block write. The hashing functions are pure.

use k256::ecdsa::SigningKey;

use crate::crypto::{self, keccak256};
use crate::errors::SdkError;

/// One field of a typed-data struct: solidity type plus field name.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub type_name: &'static str,
    pub name: &'static str,
}

/// A typed-data field value. The declared [`FieldDef::type_name`] must match
/// the variant, otherwise encoding fails.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Bytes(Vec<u8>),
    Bytes32([u8; 32]),
    Uint8(u8),
    Uint64(u64),
    Uint256([u8; 32]),
    Address([u8; 20]),
}

/// Builds the canonical type string, e.g. `Mail(address from,address to)`.
pub fn encode_type(primary_type: &str, fields: &[FieldDef]) -> String {
    let mut out = String::from(primary_type);
    out.push('(');
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(field.type_name);
        out.push(' ');
        out.push_str(field.name);
    }
    out.push(')');
    out
}

pub fn type_hash(primary_type: &str, fields: &[FieldDef]) -> [u8; 32] {
    keccak256(encode_type(primary_type, fields).as_bytes())
}

fn encode_value(declared: &str, value: &Value) -> Result<[u8; 32], SdkError> {
    let mut word = [0u8; 32];
    match (declared, value) {
        ("string", Value::String(s)) => Ok(keccak256(s.as_bytes())),
        ("bytes", Value::Bytes(b)) => Ok(keccak256(b)),
        ("bytes32", Value::Bytes32(b)) => Ok(*b),
        ("uint8", Value::Uint8(v)) => {
            word[31] = *v;
            Ok(word)
        }
        ("uint64", Value::Uint64(v)) => {
            word[24..].copy_from_slice(&v.to_be_bytes());
            Ok(word)
        }
        ("uint256", Value::Uint256(b)) => Ok(*b),
        ("uint256", Value::Uint64(v)) => {
            word[24..].copy_from_slice(&v.to_be_bytes());
            Ok(word)
        }
        ("address", Value::Address(a)) => {
            word[12..].copy_from_slice(a);
            Ok(word)
        }
        _ => Err(SdkError::Crypto(format!(
            "cannot encode {:?} as {}",
            value, declared
        ))),
    }
}

/// `keccak256(typeHash ‖ enc(value_1) ‖ … ‖ enc(value_n))`.
pub fn hash_struct(
    primary_type: &str,
    fields: &[FieldDef],
    values: &[Value],
) -> Result<[u8; 32], SdkError> {
    if fields.len() != values.len() {
        return Err(SdkError::Crypto(format!(
            "{}: expected {} values, got {}",
            primary_type,
            fields.len(),
            values.len()
        )));
    }
    let mut buf = Vec::with_capacity(32 * (fields.len() + 1));
    buf.extend_from_slice(&type_hash(primary_type, fields));
    for (field, value) in fields.iter().zip(values) {
        buf.extend_from_slice(&encode_value(field.type_name, value)?);
    }
    Ok(keccak256(&buf))
}

const DOMAIN_FIELDS: [FieldDef; 4] = [
    FieldDef { type_name: "string", name: "name" },
    FieldDef { type_name: "string", name: "version" },
    FieldDef { type_name: "uint256", name: "chainId" },
    FieldDef { type_name: "address", name: "verifyingContract" },
];

/// The EIP-712 domain binding signatures to one Storage contract deployment.
#[derive(Debug, Clone)]
pub struct Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: [u8; 20],
}

impl Domain {
    /// The storage fabric domain: `{name: "Storage", version: "1"}`.
    pub fn storage(chain_id: u64, verifying_contract: [u8; 20]) -> Self {
        Self {
            name: "Storage".into(),
            version: "1".into(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn separator(&self) -> [u8; 32] {
        hash_struct(
            "EIP712Domain",
            &DOMAIN_FIELDS,
            &[
                Value::String(self.name.clone()),
                Value::String(self.version.clone()),
                Value::Uint64(self.chain_id),
                Value::Address(self.verifying_contract),
            ],
        )
        .expect("domain fields are well-typed")
    }
}

/// `keccak256(0x19 0x01 ‖ domainSeparator ‖ hashStruct(message))`.
pub fn hash_typed_data(
    domain: &Domain,
    primary_type: &str,
    fields: &[FieldDef],
    values: &[Value],
) -> Result<[u8; 32], SdkError> {
    let separator = domain.separator();
    let struct_hash = hash_struct(primary_type, fields, values)?;

    let mut buf = [0u8; 66];
    buf[0] = 0x19;
    buf[1] = 0x01;
    buf[2..34].copy_from_slice(&separator);
    buf[34..66].copy_from_slice(&struct_hash);
    Ok(keccak256(&buf))
}

/// The message authorizing one block write. Field order is normative: any
/// deviation invalidates signatures against the on-chain verifier.
#[derive(Debug, Clone)]
pub struct StorageData {
    /// Full binary CID of the enclosing chunk.
    pub chunk_cid: Vec<u8>,
    /// sha2-256 digest of the block node.
    pub block_cid: [u8; 32],
    pub chunk_index: u64,
    pub block_index: u8,
    pub node_id: [u8; 32],
    /// Random 32-byte replay-protection nonce, big-endian uint256.
    pub nonce: [u8; 32],
    /// Unix timestamp after which the authorization expires.
    pub deadline: u64,
    pub bucket_id: [u8; 32],
}

impl StorageData {
    pub const PRIMARY_TYPE: &'static str = "StorageData";

    pub const FIELDS: [FieldDef; 8] = [
        FieldDef { type_name: "bytes", name: "chunkCID" },
        FieldDef { type_name: "bytes32", name: "blockCID" },
        FieldDef { type_name: "uint256", name: "chunkIndex" },
        FieldDef { type_name: "uint8", name: "blockIndex" },
        FieldDef { type_name: "bytes32", name: "nodeId" },
        FieldDef { type_name: "uint256", name: "nonce" },
        FieldDef { type_name: "uint256", name: "deadline" },
        FieldDef { type_name: "bytes32", name: "bucketId" },
    ];

    fn values(&self) -> [Value; 8] {
        [
            Value::Bytes(self.chunk_cid.clone()),
            Value::Bytes32(self.block_cid),
            Value::Uint64(self.chunk_index),
            Value::Uint8(self.block_index),
            Value::Bytes32(self.node_id),
            Value::Uint256(self.nonce),
            Value::Uint64(self.deadline),
            Value::Bytes32(self.bucket_id),
        ]
    }

    /// The 32-byte digest signed for this authorization.
    pub fn digest(&self, domain: &Domain) -> Result<[u8; 32], SdkError> {
        hash_typed_data(domain, Self::PRIMARY_TYPE, &Self::FIELDS, &self.values())
    }

    /// Signs the digest, returning `r ‖ s ‖ v` with `v ∈ {27, 28}`.
    pub fn sign(&self, domain: &Domain, key: &SigningKey) -> Result<[u8; 65], SdkError> {
        crypto::sign_digest(key, &self.digest(domain)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{address_of, parse_signing_key, recover_address};
    use hex_literal::hex;

    fn test_domain() -> Domain {
        let mut contract = [0u8; 20];
        contract[19] = 0x01;
        Domain::storage(1, contract)
    }

    fn zero_message() -> StorageData {
        StorageData {
            chunk_cid: Vec::new(),
            block_cid: [0u8; 32],
            chunk_index: 0,
            block_index: 0,
            node_id: [0u8; 32],
            nonce: [0u8; 32],
            deadline: 0,
            bucket_id: [0u8; 32],
        }
    }

    #[test]
    fn storage_data_type_string() {
        assert_eq!(
            encode_type(StorageData::PRIMARY_TYPE, &StorageData::FIELDS),
            "StorageData(bytes chunkCID,bytes32 blockCID,uint256 chunkIndex,\
             uint8 blockIndex,bytes32 nodeId,uint256 nonce,uint256 deadline,\
             bytes32 bucketId)"
        );
    }

    #[test]
    fn domain_type_hash_matches_reference() {
        // keccak256("EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")
        assert_eq!(
            type_hash("EIP712Domain", &DOMAIN_FIELDS),
            hex!("8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f")
        );
    }

    #[test]
    fn digest_is_envelope_of_separator_and_struct_hash() {
        let domain = test_domain();
        let message = zero_message();

        let mut buf = [0u8; 66];
        buf[0] = 0x19;
        buf[1] = 0x01;
        buf[2..34].copy_from_slice(&domain.separator());
        buf[34..66].copy_from_slice(
            &hash_struct(
                StorageData::PRIMARY_TYPE,
                &StorageData::FIELDS,
                &message.values(),
            )
            .unwrap(),
        );

        assert_eq!(message.digest(&domain).unwrap(), keccak256(&buf));
    }

    #[test]
    fn zero_message_signature_has_canonical_v() {
        let key = parse_signing_key(&"42".repeat(32)).unwrap();
        let signature = zero_message().sign(&test_domain(), &key).unwrap();
        assert!(signature[64] == 27 || signature[64] == 28);
    }

    #[test]
    fn signature_recovers_to_signer() {
        let key = parse_signing_key(&"13".repeat(32)).unwrap();
        let domain = test_domain();
        let message = StorageData {
            chunk_cid: vec![0x01, 0x70, 0x12, 0x20],
            chunk_index: 3,
            block_index: 7,
            deadline: 1_700_000_000,
            ..zero_message()
        };
        let signature = message.sign(&domain, &key).unwrap();
        let digest = message.digest(&domain).unwrap();
        assert_eq!(recover_address(&digest, &signature).unwrap(), address_of(&key));
    }

    #[test]
    fn digest_changes_with_domain_and_fields() {
        let key_domain = test_domain();
        let other_domain = Domain::storage(5, key_domain.verifying_contract);
        let message = zero_message();
        assert_ne!(
            message.digest(&key_domain).unwrap(),
            message.digest(&other_domain).unwrap()
        );

        let other_message = StorageData {
            block_index: 1,
            ..zero_message()
        };
        assert_ne!(
            message.digest(&key_domain).unwrap(),
            other_message.digest(&key_domain).unwrap()
        );
    }

    #[test]
    fn uint_encodings_are_left_padded() {
        let word = encode_value("uint64", &Value::Uint64(0x0102)).unwrap();
        assert_eq!(&word[..30], &[0u8; 30]);
        assert_eq!(&word[30..], &[0x01, 0x02]);

        let word = encode_value("uint8", &Value::Uint8(0xff)).unwrap();
        assert_eq!(&word[..31], &[0u8; 31]);
        assert_eq!(word[31], 0xff);
    }

    #[test]
    fn address_is_right_aligned() {
        let word = encode_value("address", &Value::Address([0xaa; 20])).unwrap();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], &[0xaa; 20]);
    }

    #[test]
    fn mismatched_declaration_is_rejected() {
        assert!(encode_value("bytes32", &Value::Bytes(vec![0u8; 32])).is_err());
        assert!(encode_value("uint128", &Value::Uint64(1)).is_err());
    }
}
