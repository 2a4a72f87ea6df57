//! Persisted language data bundle.
//!
//! Reference upstream implementation: `ccutil/unicity_table.h` /
//! `ccmain/tessedit.cpp`'s traineddata load path (entry-count-prefixed flat
//! file with an offset table), plus an alternative zip archive form keyed by
//! file suffix. Entry bytes are opaque here; content interpretation belongs
//! to `DictionaryOracle`/`UnicharRepertoire` implementations, out of scope
//! here.
//!
//! Serialization idiom (bincode + serde, `File`/`BufReader`/`BufWriter`)
//! mirrors `word_bigram.rs`'s and `ngram.rs`'s `load`/`save` pairs.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Safety bound: an entry count above this is treated as byte-swapped
/// (written by a big-endian host).
pub const MAX_ENTRIES: u32 = 1000;

/// Errors from bundle (de)serialization.
#[derive(Debug)]
pub enum BundleError {
    Io(std::io::Error),
    Bincode(bincode::Error),
    Zip(zip::result::ZipError),
    /// The flat form's entry count, even after a byte-swap attempt, is still
    /// implausible.
    ImplausibleEntryCount(u32),
    MissingEntry(&'static str),
}

impl std::fmt::Display for BundleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundleError::Io(e) => write!(f, "bundle I/O error: {e}"),
            BundleError::Bincode(e) => write!(f, "bundle encoding error: {e}"),
            BundleError::Zip(e) => write!(f, "bundle zip error: {e}"),
            BundleError::ImplausibleEntryCount(n) => {
                write!(f, "implausible bundle entry count: {n}")
            }
            BundleError::MissingEntry(name) => write!(f, "missing bundle entry: {name}"),
        }
    }
}

impl std::error::Error for BundleError {}

impl From<std::io::Error> for BundleError {
    fn from(e: std::io::Error) -> Self {
        BundleError::Io(e)
    }
}

impl From<bincode::Error> for BundleError {
    fn from(e: bincode::Error) -> Self {
        BundleError::Bincode(e)
    }
}

impl From<zip::result::ZipError> for BundleError {
    fn from(e: zip::result::ZipError) -> Self {
        BundleError::Zip(e)
    }
}

/// One entry kind in a language data bundle, tagged by file suffix below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Config,
    Unicharset,
    UnicharAmbigs,
    IntTemp,
    PffmTable,
    NormProto,
    PuncDawg,
    WordDawg,
    NumberDawg,
    FreqDawg,
    ShapeTable,
    BigramDawg,
    UnambigDawg,
    ParamsModel,
    Lstm,
    LstmPuncDawg,
    LstmWordDawg,
    LstmNumberDawg,
    LstmUnicharset,
    LstmRecoder,
    Version,
}

impl EntryKind {
    /// File-name suffix used when an entry is stored inside a zip archive.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            EntryKind::Config => "config",
            EntryKind::Unicharset => "unicharset",
            EntryKind::UnicharAmbigs => "unicharambigs",
            EntryKind::IntTemp => "inttemp",
            EntryKind::PffmTable => "pffmtable",
            EntryKind::NormProto => "normproto",
            EntryKind::PuncDawg => "punc-dawg",
            EntryKind::WordDawg => "word-dawg",
            EntryKind::NumberDawg => "number-dawg",
            EntryKind::FreqDawg => "freq-dawg",
            EntryKind::ShapeTable => "shapetable",
            EntryKind::BigramDawg => "bigram-dawg",
            EntryKind::UnambigDawg => "unambig-dawg",
            EntryKind::ParamsModel => "params-model",
            EntryKind::Lstm => "lstm",
            EntryKind::LstmPuncDawg => "lstm-punc-dawg",
            EntryKind::LstmWordDawg => "lstm-word-dawg",
            EntryKind::LstmNumberDawg => "lstm-number-dawg",
            EntryKind::LstmUnicharset => "lstm-unicharset",
            EntryKind::LstmRecoder => "lstm-recoder",
            EntryKind::Version => "version",
        }
    }

    /// All kinds, in the fixed order the flat form writes them.
    pub fn all() -> &'static [EntryKind] {
        use EntryKind::*;
        &[
            Config, Unicharset, UnicharAmbigs, IntTemp, PffmTable, NormProto, PuncDawg, WordDawg,
            NumberDawg, FreqDawg, ShapeTable, BigramDawg, UnambigDawg, ParamsModel, Lstm,
            LstmPuncDawg, LstmWordDawg, LstmNumberDawg, LstmUnicharset, LstmRecoder, Version,
        ]
    }
}

/// One opaque entry. Content interpretation belongs to the consumer
/// (`DictionaryOracle`, `UnicharRepertoire`, ...); this crate only moves
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleEntry {
    pub kind: EntryKind,
    pub bytes: Vec<u8>,
}

/// A full language data bundle: the flat-file/zip-archive container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDataBundle {
    entries: Vec<BundleEntry>,
}

impl LanguageDataBundle {
    pub fn new() -> Self {
        LanguageDataBundle { entries: Vec::new() }
    }

    pub fn insert(&mut self, kind: EntryKind, bytes: Vec<u8>) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.kind == kind) {
            existing.bytes = bytes;
        } else {
            self.entries.push(BundleEntry { kind, bytes });
        }
    }

    pub fn get(&self, kind: EntryKind) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.bytes.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &BundleEntry> {
        self.entries.iter()
    }

    /// Flat form: a little-endian `u32` entry count, one `EntryKind` tag
    /// byte per entry (the upstream format fixes kinds by position in a
    /// per-version table; tagging them explicitly here keeps the bundle
    /// self-describing across `EntryKind` additions), an offset table of
    /// `i64` byte offsets (one per entry, relative to the start of the
    /// concatenated-entries region), then the concatenated entry bytes.
    /// This crate only ever produces native-endian bundles; the "swap on
    /// read" rule in `read_flat` exists solely to read bundles a
    /// big-endian host produced.
    pub fn write_flat(&self, mut w: impl Write) -> Result<(), BundleError> {
        let count = self.entries.len() as u32;
        w.write_all(&count.to_le_bytes())?;

        for e in &self.entries {
            w.write_all(&[e.kind as u8])?;
        }

        let mut offset = 0i64;
        for e in &self.entries {
            w.write_all(&offset.to_le_bytes())?;
            offset += e.bytes.len() as i64;
        }
        for e in &self.entries {
            w.write_all(&e.bytes)?;
        }
        Ok(())
    }

    pub fn read_flat(mut r: impl Read) -> Result<Self, BundleError> {
        let mut count_buf = [0u8; 4];
        r.read_exact(&mut count_buf)?;
        let mut count = u32::from_le_bytes(count_buf);
        let mut swapped = false;
        if count > MAX_ENTRIES {
            count = count.swap_bytes();
            swapped = true;
            if count > MAX_ENTRIES {
                return Err(BundleError::ImplausibleEntryCount(count));
            }
        }

        let mut kinds = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut tag = [0u8; 1];
            r.read_exact(&mut tag)?;
            let kind = *EntryKind::all()
                .get(tag[0] as usize)
                .ok_or(BundleError::MissingEntry("kind"))?;
            kinds.push(kind);
        }

        let mut offsets = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut buf = [0u8; 8];
            r.read_exact(&mut buf)?;
            let mut off = i64::from_le_bytes(buf);
            if swapped {
                off = off.swap_bytes();
            }
            offsets.push(off);
        }

        let mut concatenated = Vec::new();
        r.read_to_end(&mut concatenated)?;

        let mut entries = Vec::with_capacity(count as usize);
        for i in 0..offsets.len() {
            let start = offsets[i] as usize;
            let end = offsets
                .get(i + 1)
                .map(|&o| o as usize)
                .unwrap_or(concatenated.len());
            let bytes = concatenated.get(start..end).unwrap_or(&[]).to_vec();
            entries.push(BundleEntry { kind: kinds[i], bytes });
        }

        Ok(LanguageDataBundle { entries })
    }

    /// Zip archive form: one file per entry, named by
    /// `EntryKind::file_suffix()`.
    pub fn write_zip(&self, w: impl Write + std::io::Seek) -> Result<(), BundleError> {
        let mut zip = zip::ZipWriter::new(w);
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for e in &self.entries {
            zip.start_file(e.kind.file_suffix(), options)?;
            zip.write_all(&e.bytes)?;
        }
        zip.finish()?;
        Ok(())
    }

    pub fn read_zip(r: impl Read + std::io::Seek) -> Result<Self, BundleError> {
        let mut archive = zip::ZipArchive::new(r)?;
        let mut entries = Vec::new();
        for kind in EntryKind::all() {
            let name = kind.file_suffix();
            if let Ok(mut file) = archive.by_name(name) {
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes)?;
                entries.push(BundleEntry { kind: *kind, bytes });
            }
        }
        Ok(LanguageDataBundle { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn flat_round_trip_is_byte_identical() {
        let mut bundle = LanguageDataBundle::new();
        bundle.insert(EntryKind::Config, b"cfg-bytes".to_vec());
        bundle.insert(EntryKind::Unicharset, b"unicharset-bytes-longer".to_vec());
        bundle.insert(EntryKind::Version, b"1".to_vec());

        let mut buf = Vec::new();
        bundle.write_flat(&mut buf).unwrap();
        let back = LanguageDataBundle::read_flat(Cursor::new(buf)).unwrap();

        assert_eq!(back.len(), bundle.len());
        assert_eq!(back.get(EntryKind::Config), bundle.get(EntryKind::Config));
        assert_eq!(
            back.get(EntryKind::Unicharset),
            bundle.get(EntryKind::Unicharset)
        );
        assert_eq!(back.get(EntryKind::Version), bundle.get(EntryKind::Version));
    }

    #[test]
    fn zip_round_trip_is_byte_identical() {
        let mut bundle = LanguageDataBundle::new();
        bundle.insert(EntryKind::WordDawg, b"word-dawg-bytes".to_vec());
        bundle.insert(EntryKind::FreqDawg, b"freq-dawg-bytes".to_vec());

        let mut buf = Cursor::new(Vec::new());
        bundle.write_zip(&mut buf).unwrap();
        buf.set_position(0);
        let back = LanguageDataBundle::read_zip(buf).unwrap();

        assert_eq!(back.get(EntryKind::WordDawg), bundle.get(EntryKind::WordDawg));
        assert_eq!(back.get(EntryKind::FreqDawg), bundle.get(EntryKind::FreqDawg));
    }

    #[test]
    fn empty_bundle_round_trips() {
        let bundle = LanguageDataBundle::new();
        let mut buf = Vec::new();
        bundle.write_flat(&mut buf).unwrap();
        let back = LanguageDataBundle::read_flat(Cursor::new(buf)).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn implausible_entry_count_is_rejected() {
        // A count that remains above MAX_ENTRIES even after a byte swap.
        let bogus = (MAX_ENTRIES + 1).to_le_bytes();
        let err = LanguageDataBundle::read_flat(Cursor::new(bogus.to_vec()));
        assert!(err.is_err());
    }
}
