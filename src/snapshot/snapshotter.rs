//! Snapshot writer and loader
//!
//! Encodes the scalar namespace into a single checksummed file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{CairnError, Result};
use crate::store::ScalarValue;

/// Serialized image of the scalar namespace
///
/// A `BTreeMap` so that identical namespaces produce identical bytes.
pub type ScalarMap = BTreeMap<String, ScalarValue>;

/// File magic: "CKVS"
pub const MAGIC: [u8; 4] = *b"CKVS";

/// Current snapshot format version
pub const VERSION: u16 = 1;

/// Header size: magic (4) + version (2) + crc (4) + payload_len (8)
pub const HEADER_SIZE: usize = 18;

/// Writes and reads the scalar snapshot file
#[derive(Debug, Clone)]
pub struct Snapshotter {
    /// Final snapshot location
    path: PathBuf,

    /// Staging file, renamed over `path` once fully written
    tmp_path: PathBuf,
}

impl Snapshotter {
    /// Create a snapshotter for the given file path
    ///
    /// Nothing touches the filesystem until `save` or `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");

        Self {
            path,
            tmp_path: PathBuf::from(tmp),
        }
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the snapshot with the full namespace
    ///
    /// Steps:
    /// 1. Encode header + payload in memory
    /// 2. Write and fsync the staging file
    /// 3. Rename it over the live snapshot
    pub fn save(&self, data: &ScalarMap) -> Result<()> {
        let bytes = encode(data)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        fs::rename(&self.tmp_path, &self.path)?;

        tracing::trace!(
            "Snapshot written: {} keys, {} bytes",
            data.len(),
            bytes.len()
        );
        Ok(())
    }

    /// Read the snapshot back into a namespace
    ///
    /// Fails with `Io` when the file is missing and with
    /// `SnapshotCorruption`/`Serialization` when it cannot be decoded.
    pub fn load(&self) -> Result<ScalarMap> {
        let mut file = File::open(&self.path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        decode(&bytes)
    }

    /// Load the snapshot, falling back to an empty namespace
    ///
    /// A missing file is the normal first-start case; any other failure is
    /// logged and the store starts empty.
    pub fn load_or_empty(&self) -> ScalarMap {
        match self.load() {
            Ok(data) => {
                tracing::info!(
                    "Loaded snapshot {} ({} keys)",
                    self.path.display(),
                    data.len()
                );
                data
            }
            Err(CairnError::Io(ref e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No snapshot at {}, starting empty", self.path.display());
                ScalarMap::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable snapshot {}: {}",
                    self.path.display(),
                    e
                );
                ScalarMap::new()
            }
        }
    }
}

/// Encode a namespace into snapshot bytes
fn encode(data: &ScalarMap) -> Result<Vec<u8>> {
    let payload = bincode::serialize(data)?;
    let crc = crc32fast::hash(&payload);

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_slice(&MAGIC);
    buf.put_u16(VERSION);
    buf.put_u32(crc);
    buf.put_u64(payload.len() as u64);
    buf.put_slice(&payload);

    Ok(buf.to_vec())
}

/// Decode snapshot bytes, validating header and checksum
fn decode(bytes: &[u8]) -> Result<ScalarMap> {
    if bytes.len() < HEADER_SIZE {
        return Err(CairnError::SnapshotCorruption(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];

    let mut magic = [0u8; 4];
    header.copy_to_slice(&mut magic);
    if magic != MAGIC {
        return Err(CairnError::SnapshotCorruption(format!(
            "Bad magic: {:02x?}",
            magic
        )));
    }

    let version = header.get_u16();
    if version != VERSION {
        return Err(CairnError::SnapshotCorruption(format!(
            "Unsupported version: {}",
            version
        )));
    }

    let expected_crc = header.get_u32();
    let payload_len = header.get_u64() as usize;

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != payload_len {
        return Err(CairnError::SnapshotCorruption(format!(
            "Payload length mismatch: header says {}, file has {}",
            payload_len,
            payload.len()
        )));
    }

    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(CairnError::SnapshotCorruption(format!(
            "CRC mismatch: expected {:08x}, got {:08x}",
            expected_crc, actual_crc
        )));
    }

    Ok(bincode::deserialize(payload)?)
}
