use std::str::FromStr;
use std::sync::LazyLock;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use data_encoding::{Encoding, Specification};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Multicodec code for DAG-PB nodes.
pub const CODEC_DAG_PB: u64 = 0x70;
/// Multicodec code for raw leaves.
pub const CODEC_RAW: u64 = 0x55;

const CID_VERSION: u64 = 1;
const MULTIHASH_SHA2_256: u64 = 0x12;
pub const DIGEST_LEN: usize = 32;

/// Lower-case RFC 4648 base32 without padding, the multibase `b` alphabet.
static BASE32_LOWER: LazyLock<Encoding> = LazyLock::new(|| {
    let mut spec = Specification::new();
    spec.symbols.push_str("abcdefghijklmnopqrstuvwxyz234567");
    spec.encoding().expect("valid base32 alphabet")
});

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("invalid digest length: {0}")]
    InvalidDigestLen(usize),
    #[error("unsupported cid version: {0}")]
    UnsupportedVersion(u64),
    #[error("unsupported codec: {0:#x}")]
    UnsupportedCodec(u64),
    #[error("unsupported multihash: {0:#x}")]
    UnsupportedMultihash(u64),
    #[error("truncated cid bytes")]
    Truncated,
    #[error("invalid multibase prefix")]
    InvalidMultibase,
    #[error("invalid base32: {0}")]
    InvalidBase32(String),
}

/// A CIDv1 content identifier: a codec plus a sha2-256 multihash.
///
/// The textual form is multibase base32-lower (prefix `b`); the binary form
/// is `varint(1) ‖ varint(codec) ‖ 0x12 0x20 ‖ digest`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Cid {
    codec: u64,
    digest: [u8; DIGEST_LEN],
}

impl Cid {
    /// Hashes `data` with sha2-256 and wraps the digest under `codec`.
    pub fn sum(codec: u64, data: &[u8]) -> Self {
        let digest: [u8; DIGEST_LEN] = Sha256::digest(data).into();
        Self { codec, digest }
    }

    pub fn new_v1(codec: u64, digest: [u8; DIGEST_LEN]) -> Self {
        Self { codec, digest }
    }

    pub fn codec(&self) -> u64 {
        self.codec
    }

    /// The raw sha2-256 digest inside the multihash.
    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// Binary (multicodec) form.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(4 + DIGEST_LEN);
        prost::encoding::encode_varint(CID_VERSION, &mut buf);
        prost::encoding::encode_varint(self.codec, &mut buf);
        prost::encoding::encode_varint(MULTIHASH_SHA2_256, &mut buf);
        buf.put_u8(DIGEST_LEN as u8);
        buf.put_slice(&self.digest);
        buf.freeze()
    }

    /// Parses the binary (multicodec) form.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let mut buf = data;

        let version = read_varint(&mut buf)?;
        if version != CID_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        let codec = read_varint(&mut buf)?;
        if codec != CODEC_DAG_PB && codec != CODEC_RAW {
            return Err(Error::UnsupportedCodec(codec));
        }
        let hash_code = read_varint(&mut buf)?;
        if hash_code != MULTIHASH_SHA2_256 {
            return Err(Error::UnsupportedMultihash(hash_code));
        }
        let digest_len = read_varint(&mut buf)? as usize;
        if digest_len != DIGEST_LEN {
            return Err(Error::InvalidDigestLen(digest_len));
        }
        if buf.remaining() != DIGEST_LEN {
            return Err(Error::Truncated);
        }
        let mut digest = [0u8; DIGEST_LEN];
        buf.copy_to_slice(&mut digest);
        Ok(Self { codec, digest })
    }

    /// Whether `data` hashes to this CID's digest.
    pub fn matches(&self, data: &[u8]) -> bool {
        let digest: [u8; DIGEST_LEN] = Sha256::digest(data).into();
        digest == self.digest
    }
}

fn read_varint(buf: &mut &[u8]) -> Result<u64, Error> {
    prost::encoding::decode_varint(buf).map_err(|_| Error::Truncated)
}

impl FromStr for Cid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix('b').ok_or(Error::InvalidMultibase)?;
        let raw = BASE32_LOWER
            .decode(rest.as_bytes())
            .map_err(|e| Error::InvalidBase32(e.to_string()))?;
        Self::from_bytes(&raw)
    }
}

impl TryFrom<&[u8]> for Cid {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

impl From<Cid> for Bytes {
    fn from(value: Cid) -> Self {
        value.to_bytes()
    }
}

impl std::fmt::Display for Cid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b{}", BASE32_LOWER.encode(&self.to_bytes()))
    }
}

impl std::fmt::Debug for Cid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_layout() {
        let cid = Cid::sum(CODEC_DAG_PB, b"some block");
        let bytes = cid.to_bytes();
        assert_eq!(bytes.len(), 36);
        assert_eq!(&bytes[..4], &[0x01, 0x70, 0x12, 0x20]);
        assert_eq!(&bytes[4..], cid.digest());
    }

    #[test]
    fn bytes_roundtrip() {
        let cid = Cid::sum(CODEC_RAW, b"payload");
        let parsed = Cid::from_bytes(&cid.to_bytes()).unwrap();
        assert_eq!(parsed, cid);
        assert_eq!(parsed.codec(), CODEC_RAW);
    }

    #[test]
    fn text_roundtrip() {
        let cid = Cid::sum(CODEC_DAG_PB, b"hello");
        let text = cid.to_string();
        assert_eq!(text.chars().next(), Some('b'));
        // dag-pb v1 sha2-256 CIDs render with the well-known bafyb prefix.
        assert!(text.starts_with("bafyb"), "got {}", text);
        assert_eq!(text.parse::<Cid>().unwrap(), cid);
    }

    #[test]
    fn raw_text_prefix() {
        let cid = Cid::sum(CODEC_RAW, b"hello");
        assert!(cid.to_string().starts_with("bafkr"));
    }

    #[test]
    fn sum_is_deterministic() {
        assert_eq!(Cid::sum(CODEC_RAW, b"abc"), Cid::sum(CODEC_RAW, b"abc"));
        assert_ne!(Cid::sum(CODEC_RAW, b"abc"), Cid::sum(CODEC_RAW, b"abd"));
        assert_ne!(
            Cid::sum(CODEC_RAW, b"abc"),
            Cid::sum(CODEC_DAG_PB, b"abc")
        );
    }

    #[test]
    fn matches_verifies_content() {
        let cid = Cid::sum(CODEC_RAW, b"block data");
        assert!(cid.matches(b"block data"));
        assert!(!cid.matches(b"tampered"));
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(Cid::from_bytes(&[]), Err(Error::Truncated));
        assert_eq!(
            Cid::from_bytes(&[0x00, 0x70]),
            Err(Error::UnsupportedVersion(0))
        );
        assert_eq!(
            Cid::from_bytes(&[0x01, 0x71]),
            Err(Error::UnsupportedCodec(0x71))
        );
        assert_eq!("zabc".parse::<Cid>(), Err(Error::InvalidMultibase));
        assert!(matches!(
            "b!!!!".parse::<Cid>(),
            Err(Error::InvalidBase32(_))
        ));
    }

    #[test]
    fn rejects_truncated_digest() {
        let mut bytes = Cid::sum(CODEC_RAW, b"x").to_bytes().to_vec();
        bytes.pop();
        assert_eq!(Cid::from_bytes(&bytes), Err(Error::Truncated));
    }
}
