//! Compression codecs for raw dataset bytes.
//!
//! A structure's [`Compression`] tag says how its raw data is compressed.
//! Row streams resolve the tag to a [`Codec`] through [`get_codec`] and
//! decompress sources / compress sinks transparently.  `None` is the default
//! and is omitted from canonical encodings.

use std::fmt;
use std::io::{Read, Write};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DatasetError, Result};

/// Zstd level used when compressing written data.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    #[default]
    None,
    Zstd,
    Lz4,
    Brotli,
    Lzma,
}

impl Compression {
    pub fn name(self) -> &'static str {
        match self {
            Compression::None   => "none",
            Compression::Zstd   => "zstd",
            Compression::Lz4    => "lz4",
            Compression::Brotli => "brotli",
            Compression::Lzma   => "lzma",
        }
    }

    /// Parse a lowercase name.  The empty string means no compression.
    pub fn from_name(s: &str) -> Result<Self> {
        match s {
            "" | "none" => Ok(Compression::None),
            "zstd"      => Ok(Compression::Zstd),
            "lz4"       => Ok(Compression::Lz4),
            "brotli"    => Ok(Compression::Brotli),
            "lzma"      => Ok(Compression::Lzma),
            _           => Err(DatasetError::Parse(format!("invalid compression {s:?}"))),
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Compression::None
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Compression {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Compression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Compression::from_name(&s).map_err(serde::de::Error::custom)
    }
}

// ── Codec trait ──────────────────────────────────────────────────────────────

pub trait Codec: Send + Sync {
    fn compression(&self) -> Compression;
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

pub struct NoneCodec;
impl Codec for NoneCodec {
    fn compression(&self) -> Compression { Compression::None }
    fn compress(&self, data: &[u8])   -> Result<Vec<u8>> { Ok(data.to_vec()) }
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> { Ok(data.to_vec()) }
}

pub struct ZstdCodec;
impl Codec for ZstdCodec {
    fn compression(&self) -> Compression { Compression::Zstd }
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        zstd::encode_all(data, DEFAULT_COMPRESSION_LEVEL).map_err(codec_err)
    }
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        zstd::decode_all(data).map_err(codec_err)
    }
}

pub struct Lz4Codec;
impl Codec for Lz4Codec {
    fn compression(&self) -> Compression { Compression::Lz4 }
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(data))
    }
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        lz4_flex::decompress_size_prepended(data).map_err(codec_err)
    }
}

pub struct BrotliCodec;
impl Codec for BrotliCodec {
    fn compression(&self) -> Compression { Compression::Brotli }
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut w = brotli::CompressorWriter::new(&mut out, 4096, 9, 22);
            w.write_all(data).map_err(codec_err)?;
        }
        Ok(out)
    }
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        brotli::Decompressor::new(data, 4096)
            .read_to_end(&mut out)
            .map_err(codec_err)?;
        Ok(out)
    }
}

pub struct LzmaCodec;
impl Codec for LzmaCodec {
    fn compression(&self) -> Compression { Compression::Lzma }
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        lzma_rs::lzma_compress(&mut std::io::Cursor::new(data), &mut out).map_err(codec_err)?;
        Ok(out)
    }
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        lzma_rs::lzma_decompress(&mut std::io::Cursor::new(data), &mut out)
            .map_err(codec_err)?;
        Ok(out)
    }
}

fn codec_err<E: fmt::Display>(e: E) -> DatasetError {
    DatasetError::Codec(e.to_string())
}

// ── Factory ──────────────────────────────────────────────────────────────────

pub fn get_codec(c: Compression) -> Box<dyn Codec> {
    match c {
        Compression::None   => Box::new(NoneCodec),
        Compression::Zstd   => Box::new(ZstdCodec),
        Compression::Lz4    => Box::new(Lz4Codec),
        Compression::Brotli => Box::new(BrotliCodec),
        Compression::Lzma   => Box::new(LzmaCodec),
    }
}

/// Read `source` to the end and decompress it.
pub fn decompress_reader<R: Read>(c: Compression, mut source: R) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    source.read_to_end(&mut raw)?;
    get_codec(c).decompress(&raw)
}
