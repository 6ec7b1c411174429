//! Binary container for named arrays with random access.
//!
//! Layout:
//!
//! ```text
//! magic[8] | version: u32 LE | toc_len: u64 LE | toc (bincode) | blob 0 | blob 1 | ...
//! ```
//!
//! The table of contents records the container key (the region) and, for
//! each named array, its byte offset from the end of the TOC and its length.
//! A reader parses only the header and TOC, then seeks straight to the array
//! it wants.
//!
//! Blobs are stored uncompressed so that a blob's offset and length in the
//! TOC are also its offset and length on disk.

use crate::nav_error::NavError;
use bytes::{Buf, BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

const MAGIC: &[u8; 8] = b"RNAVIDX\0";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8 + 4 + 8;
/// Refuse TOCs larger than this; a real TOC is a few hundred bytes.
const MAX_TOC_LEN: u64 = 1 << 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct TocEntry {
    name: String,
    offset: u64,
    len: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Toc {
    key: String,
    entries: Vec<TocEntry>,
}

/// Accumulates named arrays and writes them as one container.
#[derive(Debug)]
pub struct ContainerWriter {
    key: String,
    sections: Vec<(String, Vec<u8>)>,
}

impl ContainerWriter {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sections: Vec::new(),
        }
    }

    /// Encode `value` under `name`.
    ///
    /// # Errors
    /// [`NavError::IndexFormat`] on a repeated name or an encoding failure.
    pub fn add<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<(), NavError> {
        if self.sections.iter().any(|(n, _)| n == name) {
            return Err(NavError::IndexFormat(format!(
                "array `{name}` added twice"
            )));
        }
        let blob = bincode::serialize(value)?;
        self.sections.push((name.to_string(), blob));
        Ok(())
    }

    /// Write header, TOC, and all arrays to `w`.
    pub fn finish<W: Write>(self, mut w: W) -> Result<(), NavError> {
        let mut offset = 0u64;
        let entries = self
            .sections
            .iter()
            .map(|(name, blob)| {
                let entry = TocEntry {
                    name: name.clone(),
                    offset,
                    len: blob.len() as u64,
                };
                offset += blob.len() as u64;
                entry
            })
            .collect();
        let toc = Toc {
            key: self.key,
            entries,
        };
        let toc_bytes = bincode::serialize(&toc)?;

        let mut head = BytesMut::with_capacity(HEADER_LEN + toc_bytes.len());
        head.put_slice(MAGIC);
        head.put_u32_le(FORMAT_VERSION);
        head.put_u64_le(toc_bytes.len() as u64);
        head.put_slice(&toc_bytes);
        w.write_all(&head)?;
        for (_, blob) in &self.sections {
            w.write_all(blob)?;
        }
        w.flush()?;
        Ok(())
    }
}

/// Reads named arrays out of a container on demand.
#[derive(Debug)]
pub struct ContainerReader<R> {
    inner: R,
    toc: Toc,
    data_start: u64,
}

impl ContainerReader<BufReader<File>> {
    /// Open a container file and parse its TOC.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NavError> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read + Seek> ContainerReader<R> {
    /// Parse the header and TOC from `inner`.
    pub fn new(mut inner: R) -> Result<Self, NavError> {
        inner.seek(SeekFrom::Start(0))?;
        let mut header = [0u8; HEADER_LEN];
        inner.read_exact(&mut header)?;
        let mut buf = &header[..];
        if &buf[..MAGIC.len()] != MAGIC {
            return Err(NavError::IndexFormat("not a navigator index (bad magic)".into()));
        }
        buf.advance(MAGIC.len());
        let version = buf.get_u32_le();
        if version != FORMAT_VERSION {
            return Err(NavError::IndexFormat(format!(
                "unsupported index version {version} (expected {FORMAT_VERSION})"
            )));
        }
        let toc_len = buf.get_u64_le();
        if toc_len > MAX_TOC_LEN {
            return Err(NavError::IndexFormat(format!(
                "table of contents of {toc_len} bytes is implausible"
            )));
        }
        let mut toc_bytes = vec![0u8; toc_len as usize];
        inner.read_exact(&mut toc_bytes)?;
        let toc: Toc = bincode::deserialize(&toc_bytes)?;
        Ok(Self {
            inner,
            toc,
            data_start: HEADER_LEN as u64 + toc_len,
        })
    }

    /// Key the container was written under.
    pub fn key(&self) -> &str {
        &self.toc.key
    }

    /// Array names in write order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.toc.entries.iter().map(|e| e.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.toc.entries.iter().any(|e| e.name == name)
    }

    /// Seek to and decode the array stored under `name`.
    pub fn read<T: DeserializeOwned>(&mut self, name: &str) -> Result<T, NavError> {
        let entry = self
            .toc
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| NavError::IndexFormat(format!("array `{name}` not in index")))?;
        let len = usize::try_from(entry.len)
            .map_err(|_| NavError::IndexFormat(format!("array `{name}` too large")))?;
        self.inner
            .seek(SeekFrom::Start(self.data_start + entry.offset))?;
        let mut blob = vec![0u8; len];
        self.inner.read_exact(&mut blob)?;
        Ok(bincode::deserialize(&blob)?)
    }
}
