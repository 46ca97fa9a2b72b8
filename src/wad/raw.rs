//! Doom-format WAD loader.
//!
//! * Reads the entire IWAD into RAM.
//! * Provides zero-copy access to individual lumps, with bounds-checked
//!   access reported through [`WadError`] rather than panics — callers
//!   (`wad::level`, `wad::loader`) decode many lumps per map and need to
//!   surface which one was malformed.
//!
//! Only the "IWAD" magic is accepted for now (PWAD support can be added
//! later).

use byteorder::{LittleEndian as LE, ReadBytesExt};
use std::{
    collections::HashMap,
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};
use thiserror::Error;

/// Size (in bytes) of one directory entry.
const DIR_ENTRY_SIZE: usize = 16;

/// One entry in the lump directory (16 bytes on disk).
#[derive(Clone, Debug)]
pub struct LumpInfo {
    pub name: [u8; 8],
    pub offset: u32,
    pub size: u32,
}

/// Entire WAD in memory (raw bytes + parsed directory).
#[derive(Debug)]
pub struct Wad {
    pub lumps: Vec<LumpInfo>,
    bytes: Vec<u8>,
    by_name: HashMap<String, usize>,
}

/// Loader / lookup errors.
#[derive(Error, Debug)]
pub enum WadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("file is not an IWAD")]
    BadMagic,

    #[error("directory extends beyond end of file")]
    DirectoryOutOfBounds,

    #[error("lump index {0} out of range")]
    BadIndex(usize),

    #[error("lump {name} (# {index}) slice {offset}+{size} past EOF ({file_size})")]
    BadOffset {
        index: usize,
        name: String,
        offset: u32,
        size: u32,
        file_size: usize,
    },

    #[error("lump {name} (# {index}) size {size} not multiple of element {elem_size}")]
    BadLumpSize {
        index: usize,
        name: String,
        size: usize,
        elem_size: usize,
    },
}

impl Wad {
    // ------------------------------------------------------------------ //
    // Loading
    // ------------------------------------------------------------------ //

    /// Load a WAD from disk into memory. The whole file is read into a
    /// `Vec<u8>` so subsequent lump requests are plain slice operations.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WadError> {
        let mut file = File::open(path)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != b"IWAD" {
            return Err(WadError::BadMagic);
        }

        let num_lumps = file.read_u32::<LE>()?;
        let dir_offset = file.read_u32::<LE>()?;

        let mut bytes = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut bytes)?;

        let dir_end = dir_offset as usize + num_lumps as usize * DIR_ENTRY_SIZE;
        if dir_end > bytes.len() {
            return Err(WadError::DirectoryOutOfBounds);
        }

        let mut lumps = Vec::with_capacity(num_lumps as usize);
        let mut cur = &bytes[dir_offset as usize..dir_end];

        for _ in 0..num_lumps {
            let offset = cur.read_u32::<LE>()?;
            let size = cur.read_u32::<LE>()?;
            let mut name = [0u8; 8];
            cur.read_exact(&mut name)?;
            lumps.push(LumpInfo { name, offset, size });
        }

        for (i, l) in lumps.iter().enumerate() {
            let end = l.offset as usize + l.size as usize;
            if end > bytes.len() {
                return Err(WadError::BadOffset {
                    index: i,
                    name: Self::lump_name_str(&l.name).into(),
                    offset: l.offset,
                    size: l.size,
                    file_size: bytes.len(),
                });
            }
        }

        // scan backwards so later lumps (PWAD overrides) shadow earlier ones
        let mut by_name = HashMap::with_capacity(lumps.len());
        for (i, l) in lumps.iter().enumerate().rev() {
            by_name
                .entry(Self::lump_name_str(&l.name).to_owned())
                .or_insert(i);
        }

        Ok(Self {
            lumps,
            bytes,
            by_name,
        })
    }

    // ------------------------------------------------------------------ //
    // Convenience helpers
    // ------------------------------------------------------------------ //

    pub fn lumps(&self) -> &[LumpInfo] {
        &self.lumps
    }

    /// Convert an eight-byte, NUL-padded lump name into a printable string.
    pub fn lump_name_str(raw: &[u8; 8]) -> &str {
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        std::str::from_utf8(&raw[..end]).unwrap_or("?")
    }

    /// Raw bytes of lump `idx` (slice into the in-memory file).
    pub fn lump_bytes(&self, idx: usize) -> Result<&[u8], WadError> {
        let l = self.lumps.get(idx).ok_or(WadError::BadIndex(idx))?;
        let start = l.offset as usize;
        let end = start + l.size as usize;
        if end > self.bytes.len() {
            return Err(WadError::BadOffset {
                index: idx,
                name: Self::lump_name_str(&l.name).into(),
                offset: l.offset,
                size: l.size,
                file_size: self.bytes.len(),
            });
        }
        Ok(&self.bytes[start..end])
    }

    /// Locate the last lump with `name` (case-sensitive like vanilla Doom;
    /// a PWAD's replacement shadows the IWAD original).
    pub fn find_lump(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

// ==========================================================================
// Tests
// ==========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};

    fn doom_wad() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("assets")
            .join("doom1.wad")
    }

    #[test]
    fn opens_and_reads_header() {
        let wad = Wad::from_file(doom_wad()).expect("cannot open doom1.wad");
        assert!(wad.lumps.len() > 100, "suspiciously few lumps");
    }

    #[test]
    fn essential_lumps_exist() {
        let wad = Wad::from_file(doom_wad()).unwrap();
        for needed in ["PLAYPAL", "COLORMAP"] {
            assert!(
                wad.lumps
                    .iter()
                    .any(|l| Wad::lump_name_str(&l.name) == needed),
                "required lump {needed} missing"
            );
        }
    }

    #[test]
    fn lump_slice_len_matches_directory() {
        let wad = Wad::from_file(doom_wad()).unwrap();
        for (i, l) in wad.lumps.iter().enumerate() {
            assert_eq!(wad.lump_bytes(i).unwrap().len() as u32, l.size);
        }
    }

    #[test]
    fn rejects_garbage_file() {
        let bogus = doom_wad().with_extension("tmp_garbage");
        fs::write(&bogus, b"NOTWAD_____").unwrap();
        let err = Wad::from_file(&bogus).unwrap_err();
        fs::remove_file(&bogus).unwrap();
        assert!(matches!(err, WadError::BadMagic));
    }

    #[test]
    fn bad_index_is_reported() {
        let wad = Wad::from_file(doom_wad()).unwrap();
        let err = wad.lump_bytes(usize::MAX).unwrap_err();
        assert!(matches!(err, WadError::BadIndex(_)));
    }
}
