//! Binary array files
//!
//! Layout (native endianness):
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬─────┬──────────┐
//! │ N: i32   │ v0: i32  │ v1: i32  │ ... │ vN-1: i32│
//! └──────────┴──────────┴──────────┴─────┴──────────┘
//! ```
//!
//! `N` must be a power of two. A payload shorter than `N` values is accepted:
//! the missing tail reads as zero.

use crate::error::{AllocationError, FormatError, InputError, InputResult, Result};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const VALUE_SIZE: usize = std::mem::size_of::<i32>();

/// An input file whose header has been read and validated
#[derive(Debug)]
pub struct InputFile {
    path: PathBuf,
    reader: BufReader<File>,
    len: usize,
}

impl InputFile {
    /// Open `path` and validate its header
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| InputError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let mut header = [0u8; VALUE_SIZE];
        reader.read_exact(&mut header).map_err(|e| InputError::Header {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let size = i32::from_ne_bytes(header);
        if size < 0 {
            return Err(FormatError::NegativeSize { size }.into());
        }
        let len = size as usize;
        if !len.is_power_of_two() {
            return Err(FormatError::NotPowerOfTwo { size: len }.into());
        }

        debug!(path = %path.display(), len, "Input header read");
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            len,
        })
    }

    /// Number of values announced by the header
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the payload
    ///
    /// Always returns `len()` values; values missing from a short file are
    /// zero and a trailing partial value is ignored.
    pub fn read_values(mut self) -> Result<Vec<i32>> {
        let mut values = Vec::new();
        values
            .try_reserve_exact(self.len)
            .map_err(|e| AllocationError::new("array", self.len, e))?;

        let mut buf = [0u8; VALUE_SIZE];
        while values.len() < self.len {
            match self.reader.read_exact(&mut buf) {
                Ok(()) => values.push(i32::from_ne_bytes(buf)),
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(source) => {
                    return Err(InputError::Read {
                        path: self.path,
                        source,
                    }
                    .into())
                }
            }
        }

        if values.len() < self.len {
            warn!(
                path = %self.path.display(),
                expected = self.len,
                read = values.len(),
                "Input shorter than its header, padding with zeros"
            );
            values.resize(self.len, 0);
        }

        Ok(values)
    }
}

/// Read a whole array file
pub fn read_array(path: &Path) -> Result<Vec<i32>> {
    InputFile::open(path)?.read_values()
}

/// Write `values` in the input format
pub fn write_array(path: &Path, values: &[i32]) -> InputResult<()> {
    let write_err = |source| InputError::Write {
        path: path.to_path_buf(),
        source,
    };

    let size = i32::try_from(values.len()).map_err(|_| {
        write_err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("{} values do not fit the i32 header", values.len()),
        ))
    })?;

    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(&size.to_ne_bytes()).map_err(write_err)?;
    for value in values {
        writer.write_all(&value.to_ne_bytes()).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    Ok(())
}

/// Random values for a test input
pub fn random_values(count: usize, seed: Option<u64>) -> Vec<i32> {
    let mut rng = match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    (0..count).map(|_| rng.i32(..)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_raw(path: &Path, words: &[i32], extra: &[u8]) {
        let mut bytes = Vec::new();
        for w in words {
            bytes.extend_from_slice(&w.to_ne_bytes());
        }
        bytes.extend_from_slice(extra);
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("values.bin");

        write_array(&path, &[7, -3, 0, i32::MIN]).unwrap();
        let file = InputFile::open(&path).unwrap();
        assert_eq!(file.len(), 4);
        assert_eq!(file.read_values().unwrap(), vec![7, -3, 0, i32::MIN]);
    }

    #[test]
    fn test_short_payload_zero_filled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bin");
        // Header says 4, two full values and half of a third.
        write_raw(&path, &[4, 10, 20], &[0xff, 0xff]);

        assert_eq!(read_array(&path).unwrap(), vec![10, 20, 0, 0]);
    }

    #[test]
    fn test_extra_payload_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.bin");
        write_raw(&path, &[2, 1, 2, 3, 4], &[]);

        assert_eq!(read_array(&path).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_bad_headers() {
        let dir = tempdir().unwrap();

        let path = dir.path().join("empty.bin");
        write_raw(&path, &[], &[1, 2]);
        assert!(matches!(
            InputFile::open(&path),
            Err(crate::error::SortError::Input(InputError::Header { .. }))
        ));

        let path = dir.path().join("six.bin");
        write_raw(&path, &[6, 1, 2, 3, 4, 5, 6], &[]);
        assert!(matches!(
            InputFile::open(&path),
            Err(crate::error::SortError::Format(FormatError::NotPowerOfTwo { size: 6 }))
        ));

        let path = dir.path().join("negative.bin");
        write_raw(&path, &[-8], &[]);
        assert!(matches!(
            InputFile::open(&path),
            Err(crate::error::SortError::Format(FormatError::NegativeSize { size: -8 }))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_array(&dir.path().join("nope.bin")).unwrap_err();
        assert!(err.to_string().contains("nope.bin"));

        // Path first, then the io error, each reported once.
        let chained = anyhow::Error::from(err);
        assert_eq!(chained.chain().count(), 2);
        assert_eq!(format!("{:#}", chained).matches("nope.bin").count(), 1);
    }

    #[test]
    fn test_random_values_seeded() {
        assert_eq!(random_values(16, Some(1)), random_values(16, Some(1)));
        assert_eq!(random_values(0, None).len(), 0);
    }
}
