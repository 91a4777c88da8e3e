//! zlib-compressed JSON files.
//!
//! Files carry the `.zz` extension so `pigz -dz` can inspect them. Writes go
//! to a temporary file in the destination directory which is then renamed
//! over the target, so a crash mid-write never leaves a truncated file.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZjsonError {
    #[error("{path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Compress `value` as JSON into `writer`
pub fn encode<W: Write, T: Serialize>(writer: W, value: &T) -> Result<(), ZjsonError> {
    let mut zw = ZlibEncoder::new(writer, Compression::best());
    serde_json::to_writer(&mut zw, value)?;
    zw.finish()?;
    Ok(())
}

/// Decompress and parse a JSON value from `reader`
pub fn decode<R: Read, T: DeserializeOwned>(reader: R) -> Result<T, ZjsonError> {
    Ok(serde_json::from_reader(ZlibDecoder::new(reader))?)
}

/// Atomically replace `path` with the encoded `value`
pub fn store<T: Serialize>(path: &Path, value: &T) -> Result<(), ZjsonError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{}.", prefix))
        .tempfile_in(dir)?;
    encode(&mut tmp, value)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read and decode `path`
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, ZjsonError> {
    let file = File::open(path).map_err(|source| ZjsonError::Open {
        path: path.display().to_string(),
        source,
    })?;
    decode(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        f1: i32,
        f2: String,
        f3: f64,
    }

    fn sample() -> Sample {
        Sample {
            f1: 42,
            f2: "compressed".to_string(),
            f3: 2.5,
        }
    }

    #[test]
    fn test_encode_decode() {
        let mut buf = Vec::new();
        encode(&mut buf, &sample()).unwrap();
        // zlib header, not plain JSON
        assert_eq!(buf[0], 0x78);
        let out: Sample = decode(buf.as_slice()).unwrap();
        assert_eq!(out, sample());
    }

    #[test]
    fn test_decode_plain_json_fails() {
        let result: Result<Sample, _> = decode(&b"{\"f1\":1}"[..]);
        assert!(result.is_err());
    }

    #[test]
    fn test_store_replaces_file_and_leaves_no_temporaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.zz");

        store(&path, &sample()).unwrap();
        let mut updated = sample();
        updated.f1 = 7;
        store(&path, &updated).unwrap();

        let loaded: Sample = load(&path).unwrap();
        assert_eq!(loaded.f1, 7);
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.zz");
        let err = load::<Sample>(&path).unwrap_err();
        assert!(matches!(err, ZjsonError::Open { .. }));
        assert!(err.to_string().contains("absent.zz"));
    }
}
