//! Crypto primitives shared by the pipelines: keccak-256 hashing, HKDF key
//! derivation, AES-GCM sealing and secp256k1 signatures with recovery.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hkdf::Hkdf;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::errors::SdkError;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const SIGNATURE_LEN: usize = 65;
pub const ADDRESS_LEN: usize = 20;

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// HKDF-SHA256 extract+expand of `parent` over `info`, always 32 bytes.
pub fn derive_key(parent: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN], SdkError> {
    let hk = Hkdf::<Sha256>::new(None, parent);
    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| SdkError::Crypto(format!("key derivation failed: {}", e)))?;
    Ok(okm)
}

/// Derives a key for a slash-joined path, e.g. `bucket/file`.
pub fn derive_path_key(parent: &[u8], parts: &[&str]) -> Result<[u8; KEY_LEN], SdkError> {
    derive_key(parent, parts.join("/").as_bytes())
}

/// Sealing subkey and AEAD nonce for one `(key, info)` pair, both from a
/// single HKDF expand. The subkey equals [`derive_key`] of the same pair
/// (HKDF output prefix), so opening only needs `derive_key` plus the wire
/// nonce.
fn derive_sealing_material(
    key: &[u8; KEY_LEN],
    info: &[u8],
) -> Result<([u8; KEY_LEN], [u8; NONCE_LEN]), SdkError> {
    let hk = Hkdf::<Sha256>::new(None, key);
    let mut okm = [0u8; KEY_LEN + NONCE_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| SdkError::Crypto(format!("key derivation failed: {}", e)))?;

    let mut subkey = [0u8; KEY_LEN];
    subkey.copy_from_slice(&okm[..KEY_LEN]);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&okm[KEY_LEN..]);
    Ok((subkey, nonce))
}

/// Seals `plaintext` under a subkey of `key` derived from `info`.
///
/// Output layout is `nonce(12) ‖ ciphertext ‖ tag(16)`; `info` only enters
/// the key derivation, the AEAD runs without additional data. Sealing is
/// deterministic in `(key, info)`: content addresses over sealed payloads
/// must not change across runs, and an info string must never seal more
/// than one payload.
pub fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8], info: &[u8]) -> Result<Vec<u8>, SdkError> {
    let (subkey, nonce) = derive_sealing_material(key, info)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&subkey));
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| SdkError::Crypto("encryption failed".into()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Opens a payload produced by [`encrypt`] with the same `key` and `info`.
pub fn decrypt(key: &[u8; KEY_LEN], data: &[u8], info: &[u8]) -> Result<Vec<u8>, SdkError> {
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(SdkError::Crypto(format!(
            "sealed payload too short: {} bytes",
            data.len()
        )));
    }
    let derived = derive_key(key, info)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived));
    let (nonce, sealed) = data.split_at(NONCE_LEN);
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| SdkError::Crypto("decryption failed".into()))
}

/// Parses a hex-encoded 32-byte secp256k1 private key.
pub fn parse_signing_key(private_key: &str) -> Result<SigningKey, SdkError> {
    let stripped = private_key.strip_prefix("0x").unwrap_or(private_key);
    let raw = hex::decode(stripped)
        .map_err(|e| SdkError::Config(format!("invalid private key hex: {}", e)))?;
    SigningKey::from_slice(&raw)
        .map_err(|_| SdkError::Config("invalid secp256k1 private key".into()))
}

/// Signs a 32-byte digest, returning `r ‖ s ‖ v` with `v ∈ {27, 28}`.
pub fn sign_digest(key: &SigningKey, digest: &[u8; 32]) -> Result<[u8; SIGNATURE_LEN], SdkError> {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest)
        .map_err(|e| SdkError::Crypto(format!("signing failed: {}", e)))?;

    let mut out = [0u8; SIGNATURE_LEN];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = recovery_id.to_byte() + 27;
    Ok(out)
}

/// Recovers the 20-byte signer address from a digest and a 65-byte signature.
pub fn recover_address(
    digest: &[u8; 32],
    signature: &[u8; SIGNATURE_LEN],
) -> Result<[u8; ADDRESS_LEN], SdkError> {
    let v = signature[64];
    let recovery_byte = if v >= 27 { v - 27 } else { v };
    let recovery_id = RecoveryId::from_byte(recovery_byte)
        .ok_or_else(|| SdkError::Crypto(format!("invalid recovery id {}", v)))?;
    let parsed = Signature::from_slice(&signature[..64])
        .map_err(|e| SdkError::Crypto(format!("malformed signature: {}", e)))?;
    let verifying_key = VerifyingKey::recover_from_prehash(digest, &parsed, recovery_id)
        .map_err(|e| SdkError::Crypto(format!("recovery failed: {}", e)))?;
    Ok(address_of_verifying_key(&verifying_key))
}

/// The Ethereum address of a signing key.
pub fn address_of(key: &SigningKey) -> [u8; ADDRESS_LEN] {
    address_of_verifying_key(key.verifying_key())
}

fn address_of_verifying_key(key: &VerifyingKey) -> [u8; ADDRESS_LEN] {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; ADDRESS_LEN];
    address.copy_from_slice(&hash[12..]);
    address
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn keccak_empty_vector() {
        assert_eq!(
            keccak256(b""),
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn derive_key_is_deterministic() {
        let parent = [3u8; 32];
        let a = derive_key(&parent, b"chunk_0").unwrap();
        let b = derive_key(&parent, b"chunk_0").unwrap();
        let c = derive_key(&parent, b"chunk_1").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn derive_path_key_joins_with_slash() {
        let parent = [9u8; 32];
        assert_eq!(
            derive_path_key(&parent, &["bucket", "file"]).unwrap(),
            derive_key(&parent, b"bucket/file").unwrap()
        );
    }

    #[test]
    fn seal_roundtrip() {
        let key = [5u8; 32];
        let sealed = encrypt(&key, b"block payload", b"block_0").unwrap();
        assert_eq!(sealed.len(), 13 + NONCE_LEN + TAG_LEN);
        let opened = decrypt(&key, &sealed, b"block_0").unwrap();
        assert_eq!(opened, b"block payload");
    }

    #[test]
    fn sealing_is_deterministic_per_key_and_info() {
        let key = [5u8; 32];
        let a = encrypt(&key, b"chunk payload", b"chunk_0").unwrap();
        let b = encrypt(&key, b"chunk payload", b"chunk_0").unwrap();
        assert_eq!(a, b);

        // a different info or key moves both nonce and ciphertext
        let c = encrypt(&key, b"chunk payload", b"chunk_1").unwrap();
        assert_ne!(a, c);
        let d = encrypt(&[6u8; 32], b"chunk payload", b"chunk_0").unwrap();
        assert_ne!(a, d);
    }

    #[test]
    fn seal_rejects_wrong_info_or_key() {
        let key = [5u8; 32];
        let sealed = encrypt(&key, b"secret", b"block_0").unwrap();
        assert!(decrypt(&key, &sealed, b"block_1").is_err());
        assert!(decrypt(&[6u8; 32], &sealed, b"block_0").is_err());
    }

    #[test]
    fn open_rejects_short_payload() {
        assert!(decrypt(&[0u8; 32], &[0u8; 10], b"i").is_err());
    }

    #[test]
    fn sign_and_recover() {
        let key = parse_signing_key(&"11".repeat(32)).unwrap();
        let digest = keccak256(b"authorize block 0");
        let signature = sign_digest(&key, &digest).unwrap();
        assert!(signature[64] == 27 || signature[64] == 28);

        let recovered = recover_address(&digest, &signature).unwrap();
        assert_eq!(recovered, address_of(&key));
    }

    #[test]
    fn recover_rejects_garbage_v() {
        let key = parse_signing_key(&"22".repeat(32)).unwrap();
        let digest = keccak256(b"msg");
        let mut signature = sign_digest(&key, &digest).unwrap();
        signature[64] = 99;
        assert!(recover_address(&digest, &signature).is_err());
    }

    #[test]
    fn parse_signing_key_accepts_0x_prefix() {
        let bare = parse_signing_key(&"aa".repeat(32)).unwrap();
        let prefixed = parse_signing_key(&format!("0x{}", "aa".repeat(32))).unwrap();
        assert_eq!(address_of(&bare), address_of(&prefixed));
        assert!(parse_signing_key("zz").is_err());
    }
}
