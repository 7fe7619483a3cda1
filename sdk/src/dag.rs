//! UnixFS/DAG-PB chunk DAG construction and decoding.
//!
//! Nodes are encoded by hand on top of [`prost::encoding`] primitives: the
//! interoperable DAG-PB byte form requires Links (field 2) to be serialized
//! before Data (field 1), which a derived message cannot produce.

use bytes::{Buf, BufMut, Bytes};
use prost::encoding::{
    decode_key, decode_varint, encode_key, encode_varint, skip_field, DecodeContext, WireType,
};
use thiserror::Error;

use crate::cid::{Cid, CODEC_DAG_PB, CODEC_RAW};

const UNIXFS_TYPE_FILE: u64 = 2;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("empty input")]
    EmptyInput,
    #[error("node has no data field")]
    MissingData,
    #[error("unexpected codec: {0:#x}")]
    UnexpectedCodec(u64),
    #[error("malformed node: {0}")]
    Decode(String),
}

impl From<prost::DecodeError> for Error {
    fn from(value: prost::DecodeError) -> Self {
        Error::Decode(value.to_string())
    }
}

/// One uploadable leaf: the encoded DAG-PB node bytes and their CID.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub cid: Cid,
    /// Encoded node bytes as pushed over the wire.
    pub data: Bytes,
    /// Unpadded payload length recorded in the UnixFS `filesize` field.
    pub raw_size: u64,
}

/// The DAG of one chunk: its root CID plus the leaves in byte order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDag {
    pub cid: Cid,
    pub blocks: Vec<Block>,
    pub raw_size: u64,
    pub encoded_size: u64,
}

/// Wraps a payload into a UnixFS file leaf. `raw_size` may be smaller than
/// the payload when erasure padding was applied; it is what `filesize`
/// reports.
pub fn build_leaf(payload: &[u8], raw_size: u64) -> Block {
    let unixfs = encode_unixfs_file(Some(payload), raw_size, &[]);
    let node = encode_pb_node(&[], &unixfs);
    let cid = Cid::sum(CODEC_DAG_PB, &node);
    Block {
        cid,
        data: node.into(),
        raw_size,
    }
}

/// Builds the DAG for a chunk of raw bytes, slicing into `block_size` leaves.
pub fn build_chunk_dag(data: &[u8], block_size: usize) -> Result<ChunkDag, Error> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }
    if data.len() <= block_size {
        let block = build_leaf(data, data.len() as u64);
        let encoded_size = block.data.len() as u64;
        return Ok(ChunkDag {
            cid: block.cid.clone(),
            raw_size: block.raw_size,
            encoded_size,
            blocks: vec![block],
        });
    }
    let payloads: Vec<(Bytes, u64)> = data
        .chunks(block_size)
        .map(|slice| (Bytes::copy_from_slice(slice), slice.len() as u64))
        .collect();
    build_chunk_dag_from_payloads(&payloads)
}

/// Builds the DAG for a chunk whose block payloads are already cut, e.g. the
/// `k + m` shards of the erasure coder. Link order matches payload order.
pub fn build_chunk_dag_from_payloads(payloads: &[(Bytes, u64)]) -> Result<ChunkDag, Error> {
    if payloads.is_empty() {
        return Err(Error::EmptyInput);
    }
    if payloads.len() == 1 {
        let (payload, raw_size) = &payloads[0];
        let block = build_leaf(payload, *raw_size);
        let encoded_size = block.data.len() as u64;
        return Ok(ChunkDag {
            cid: block.cid.clone(),
            raw_size: block.raw_size,
            encoded_size,
            blocks: vec![block],
        });
    }

    let blocks: Vec<Block> = payloads
        .iter()
        .map(|(payload, raw_size)| build_leaf(payload, *raw_size))
        .collect();

    let links: Vec<Vec<u8>> = blocks
        .iter()
        .map(|block| encode_pb_link(&block.cid.to_bytes(), "", block.data.len() as u64))
        .collect();
    let blocksizes: Vec<u64> = blocks.iter().map(|block| block.raw_size).collect();
    let raw_size = blocksizes.iter().sum();
    let encoded_size = blocks.iter().map(|block| block.data.len() as u64).sum();

    let root_data = encode_unixfs_file(None, raw_size, &blocksizes);
    let root = encode_pb_node(&links, &root_data);

    Ok(ChunkDag {
        cid: Cid::sum(CODEC_DAG_PB, &root),
        blocks,
        raw_size,
        encoded_size,
    })
}

/// Undoes [`build_leaf`]: returns the UnixFS payload of a dag-pb leaf, or
/// the bytes as-is for raw-codec leaves.
pub fn extract_block_data(cid: &Cid, data: &[u8]) -> Result<Bytes, Error> {
    match cid.codec() {
        CODEC_RAW => Ok(Bytes::copy_from_slice(data)),
        CODEC_DAG_PB => {
            let node = decode_pb_node(data)?;
            let unixfs_bytes = node.data.ok_or(Error::MissingData)?;
            let unixfs = decode_unixfs(&unixfs_bytes)?;
            unixfs.data.ok_or(Error::MissingData)
        }
        codec => Err(Error::UnexpectedCodec(codec)),
    }
}

/// Accumulates per-chunk links in index order and produces the file root.
#[derive(Debug, Default)]
pub struct DagRoot {
    links: Vec<Vec<u8>>,
    blocksizes: Vec<u64>,
    total_raw: u64,
    total_encoded: u64,
}

impl DagRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_link(&mut self, cid: &Cid, raw_size: u64, encoded_size: u64) {
        self.links
            .push(encode_pb_link(&cid.to_bytes(), "", encoded_size));
        self.blocksizes.push(raw_size);
        self.total_raw += raw_size;
        self.total_encoded += encoded_size;
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Returns `(root_cid, total_raw_size, total_encoded_size)`.
    pub fn build(self) -> Result<(Cid, u64, u64), Error> {
        if self.links.is_empty() {
            return Err(Error::EmptyInput);
        }
        let data = encode_unixfs_file(None, self.total_raw, &self.blocksizes);
        let node = encode_pb_node(&self.links, &data);
        Ok((
            Cid::sum(CODEC_DAG_PB, &node),
            self.total_raw,
            self.total_encoded,
        ))
    }
}

fn encode_unixfs_file(data: Option<&[u8]>, filesize: u64, blocksizes: &[u64]) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_key(1, WireType::Varint, &mut buf);
    encode_varint(UNIXFS_TYPE_FILE, &mut buf);
    if let Some(data) = data {
        encode_key(2, WireType::LengthDelimited, &mut buf);
        encode_varint(data.len() as u64, &mut buf);
        buf.put_slice(data);
    }
    encode_key(3, WireType::Varint, &mut buf);
    encode_varint(filesize, &mut buf);
    for size in blocksizes {
        encode_key(4, WireType::Varint, &mut buf);
        encode_varint(*size, &mut buf);
    }
    buf
}

fn encode_pb_link(hash: &[u8], name: &str, tsize: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_key(1, WireType::LengthDelimited, &mut buf);
    encode_varint(hash.len() as u64, &mut buf);
    buf.put_slice(hash);
    encode_key(2, WireType::LengthDelimited, &mut buf);
    encode_varint(name.len() as u64, &mut buf);
    buf.put_slice(name.as_bytes());
    encode_key(3, WireType::Varint, &mut buf);
    encode_varint(tsize, &mut buf);
    buf
}

// Links (field 2) strictly before Data (field 1).
fn encode_pb_node(links: &[Vec<u8>], data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    for link in links {
        encode_key(2, WireType::LengthDelimited, &mut buf);
        encode_varint(link.len() as u64, &mut buf);
        buf.put_slice(link);
    }
    encode_key(1, WireType::LengthDelimited, &mut buf);
    encode_varint(data.len() as u64, &mut buf);
    buf.put_slice(data);
    buf
}

#[derive(Debug, Default)]
struct UnixFsData {
    type_: u64,
    data: Option<Bytes>,
    filesize: Option<u64>,
    blocksizes: Vec<u64>,
}

fn decode_unixfs(mut buf: &[u8]) -> Result<UnixFsData, Error> {
    let mut out = UnixFsData::default();
    while buf.has_remaining() {
        let (tag, wire_type) = decode_key(&mut buf)?;
        match (tag, wire_type) {
            (1, WireType::Varint) => out.type_ = decode_varint(&mut buf)?,
            (2, WireType::LengthDelimited) => out.data = Some(read_bytes(&mut buf)?),
            (3, WireType::Varint) => out.filesize = Some(decode_varint(&mut buf)?),
            (4, WireType::Varint) => out.blocksizes.push(decode_varint(&mut buf)?),
            (tag, wire_type) => skip_field(wire_type, tag, &mut buf, DecodeContext::default())?,
        }
    }
    Ok(out)
}

#[derive(Debug)]
struct PbLink {
    hash: Bytes,
    #[allow(dead_code)]
    name: String,
    tsize: u64,
}

#[derive(Debug, Default)]
struct PbNode {
    data: Option<Bytes>,
    links: Vec<PbLink>,
}

fn decode_pb_node(mut buf: &[u8]) -> Result<PbNode, Error> {
    let mut out = PbNode::default();
    while buf.has_remaining() {
        let (tag, wire_type) = decode_key(&mut buf)?;
        match (tag, wire_type) {
            (1, WireType::LengthDelimited) => out.data = Some(read_bytes(&mut buf)?),
            (2, WireType::LengthDelimited) => {
                let raw = read_bytes(&mut buf)?;
                out.links.push(decode_pb_link(&raw)?);
            }
            (tag, wire_type) => skip_field(wire_type, tag, &mut buf, DecodeContext::default())?,
        }
    }
    Ok(out)
}

fn decode_pb_link(mut buf: &[u8]) -> Result<PbLink, Error> {
    let mut hash = Bytes::new();
    let mut name = String::new();
    let mut tsize = 0;
    while buf.has_remaining() {
        let (tag, wire_type) = decode_key(&mut buf)?;
        match (tag, wire_type) {
            (1, WireType::LengthDelimited) => hash = read_bytes(&mut buf)?,
            (2, WireType::LengthDelimited) => {
                name = String::from_utf8_lossy(&read_bytes(&mut buf)?).into_owned()
            }
            (3, WireType::Varint) => tsize = decode_varint(&mut buf)?,
            (tag, wire_type) => skip_field(wire_type, tag, &mut buf, DecodeContext::default())?,
        }
    }
    Ok(PbLink { hash, name, tsize })
}

fn read_bytes(buf: &mut &[u8]) -> Result<Bytes, Error> {
    let len = decode_varint(buf)? as usize;
    if len > buf.remaining() {
        return Err(Error::Decode(format!(
            "length-delimited field of {} bytes exceeds remaining {}",
            len,
            buf.remaining()
        )));
    }
    let out = Bytes::copy_from_slice(&buf[..len]);
    buf.advance(len);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_leaf_roundtrip() {
        let dag = build_chunk_dag(b"tiny payload", 1024).unwrap();
        assert_eq!(dag.blocks.len(), 1);
        assert_eq!(dag.cid, dag.blocks[0].cid);
        assert_eq!(dag.cid.codec(), CODEC_DAG_PB);
        assert_eq!(dag.raw_size, 12);
        assert_eq!(dag.encoded_size, dag.blocks[0].data.len() as u64);

        let extracted = extract_block_data(&dag.cid, &dag.blocks[0].data).unwrap();
        assert_eq!(&extracted[..], b"tiny payload");
    }

    #[test]
    fn leaf_encoding_starts_with_data_field() {
        let block = build_leaf(b"abc", 3);
        // no links, so the first byte is the Data key (field 1, wire type 2)
        assert_eq!(block.data[0], 0x0a);
    }

    #[test]
    fn multi_leaf_links_in_byte_order() {
        let data: Vec<u8> = (0u8..=9).collect();
        let dag = build_chunk_dag(&data, 4).unwrap();
        assert_eq!(dag.blocks.len(), 3);
        assert_eq!(dag.raw_size, 10);
        assert_eq!(
            dag.blocks.iter().map(|b| b.raw_size).collect::<Vec<_>>(),
            vec![4, 4, 2]
        );

        let mut reassembled = Vec::new();
        for block in &dag.blocks {
            reassembled.extend_from_slice(&extract_block_data(&block.cid, &block.data).unwrap());
        }
        assert_eq!(reassembled, data);
    }

    #[test]
    fn root_serializes_links_before_data() {
        let dag = build_chunk_dag(&[7u8; 100], 40).unwrap();
        let links: Vec<Vec<u8>> = dag
            .blocks
            .iter()
            .map(|b| encode_pb_link(&b.cid.to_bytes(), "", b.data.len() as u64))
            .collect();
        let blocksizes: Vec<u64> = dag.blocks.iter().map(|b| b.raw_size).collect();
        let root = encode_pb_node(&links, &encode_unixfs_file(None, 100, &blocksizes));

        // field 2 (Links) opens the node
        assert_eq!(root[0], 0x12);
        assert_eq!(Cid::sum(CODEC_DAG_PB, &root), dag.cid);

        let decoded = decode_pb_node(&root).unwrap();
        assert_eq!(decoded.links.len(), 3);
        for (link, block) in decoded.links.iter().zip(&dag.blocks) {
            assert_eq!(&link.hash[..], &block.cid.to_bytes()[..]);
            assert_eq!(link.tsize, block.data.len() as u64);
        }
        let unixfs = decode_unixfs(decoded.data.as_ref().unwrap()).unwrap();
        assert_eq!(unixfs.type_, UNIXFS_TYPE_FILE);
        assert_eq!(unixfs.filesize, Some(100));
        assert_eq!(unixfs.blocksizes, vec![40, 40, 20]);
    }

    #[test]
    fn cid_is_deterministic() {
        let data = vec![42u8; 5000];
        let a = build_chunk_dag(&data, 1024).unwrap();
        let b = build_chunk_dag(&data, 1024).unwrap();
        assert_eq!(a.cid, b.cid);

        let c = build_chunk_dag(&data, 2048).unwrap();
        assert_ne!(a.cid, c.cid);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(build_chunk_dag(b"", 1024), Err(Error::EmptyInput));
        assert_eq!(build_chunk_dag_from_payloads(&[]), Err(Error::EmptyInput));
        assert_eq!(DagRoot::new().build(), Err(Error::EmptyInput));
    }

    #[test]
    fn padded_leaf_reports_unpadded_filesize() {
        // erasure padding: payload is padded to shard size, filesize is not
        let padded = [1, 2, 3, 0, 0, 0, 0, 0];
        let block = build_leaf(&padded, 3);
        let node = decode_pb_node(&block.data).unwrap();
        let unixfs = decode_unixfs(node.data.as_ref().unwrap()).unwrap();
        assert_eq!(unixfs.filesize, Some(3));
        assert_eq!(unixfs.data.as_ref().unwrap().len(), 8);
    }

    #[test]
    fn extract_raw_codec_passthrough() {
        let cid = Cid::sum(CODEC_RAW, b"raw leaf");
        assert_eq!(
            &extract_block_data(&cid, b"raw leaf").unwrap()[..],
            b"raw leaf"
        );
    }

    #[test]
    fn extract_rejects_garbage_node() {
        let cid = Cid::sum(CODEC_DAG_PB, &[0xff, 0xff, 0xff]);
        assert!(extract_block_data(&cid, &[0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn dag_root_accumulates_in_order() {
        let chunk_a = build_chunk_dag(&[1u8; 300], 100).unwrap();
        let chunk_b = build_chunk_dag(&[2u8; 150], 100).unwrap();

        let mut root = DagRoot::new();
        root.add_link(&chunk_a.cid, chunk_a.raw_size, chunk_a.encoded_size);
        root.add_link(&chunk_b.cid, chunk_b.raw_size, chunk_b.encoded_size);
        assert_eq!(root.len(), 2);
        let (cid, raw, encoded) = root.build().unwrap();
        assert_eq!(raw, 450);
        assert_eq!(encoded, chunk_a.encoded_size + chunk_b.encoded_size);

        // same links, same root; swapped order, different root
        let mut again = DagRoot::new();
        again.add_link(&chunk_a.cid, chunk_a.raw_size, chunk_a.encoded_size);
        again.add_link(&chunk_b.cid, chunk_b.raw_size, chunk_b.encoded_size);
        assert_eq!(again.build().unwrap().0, cid);

        let mut swapped = DagRoot::new();
        swapped.add_link(&chunk_b.cid, chunk_b.raw_size, chunk_b.encoded_size);
        swapped.add_link(&chunk_a.cid, chunk_a.raw_size, chunk_a.encoded_size);
        assert_ne!(swapped.build().unwrap().0, cid);
    }
}
