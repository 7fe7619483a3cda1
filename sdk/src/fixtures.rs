//! Shared test fixtures.

use std::sync::LazyLock;

pub const ROOT_KEY: [u8; 32] = [0x42; 32];

// 1 KiB
pub static PAYLOAD_SMALL: LazyLock<Vec<u8>> =
    LazyLock::new(|| (0..1024).map(|i| (i % 251) as u8).collect());

// spans several small blocks
pub static PAYLOAD_CHUNKY: LazyLock<Vec<u8>> =
    LazyLock::new(|| (0..5000).map(|i| (i % 241) as u8).collect());
