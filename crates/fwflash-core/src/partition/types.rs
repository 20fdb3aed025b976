//! Partition table types

use crate::offset::FlashOffset;
use std::fmt;

/// Filesystem kinds that can live in a data partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsSubtype {
    /// LittleFS
    LittleFs,
    /// SPIFFS
    Spiffs,
}

impl FsSubtype {
    /// Recognise a partition subtype (case-insensitive)
    pub fn from_subtype(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("littlefs") {
            Some(Self::LittleFs)
        } else if s.eq_ignore_ascii_case("spiffs") {
            Some(Self::Spiffs)
        } else {
            None
        }
    }

    /// Lowercase name as written in partition tables
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LittleFs => "littlefs",
            Self::Spiffs => "spiffs",
        }
    }
}

impl fmt::Display for FsSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One data row of a partition table
///
/// Fields missing from a short row are left empty (`None` for the numeric
/// ones). `offset_text` keeps the raw offset cell so a row with an
/// unparseable offset can still be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionEntry {
    /// Partition name
    pub name: String,
    /// Partition type (`app`, `data`, ...)
    pub kind: String,
    /// Partition subtype (`nvs`, `spiffs`, `ota_0`, ...)
    pub subtype: String,
    /// Raw offset cell, if the row has one
    pub offset_text: Option<String>,
    /// Parsed start address
    pub offset: Option<FlashOffset>,
    /// Parsed size in bytes
    pub size: Option<u32>,
}

impl PartitionEntry {
    /// Check if this is a data partition holding a filesystem
    pub fn filesystem(&self) -> Option<FsSubtype> {
        if !self.kind.eq_ignore_ascii_case("data") {
            return None;
        }
        FsSubtype::from_subtype(&self.subtype)
    }
}

/// Where the filesystem partition lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilesystemPartition {
    /// Start address of the partition
    pub offset: FlashOffset,
    /// Filesystem kind
    pub subtype: FsSubtype,
}

/// A parsed partition table
#[derive(Debug, Clone, Default)]
pub struct PartitionTable {
    /// Column names from the header, lowercased
    pub columns: Vec<String>,
    /// Data rows in file order
    pub entries: Vec<PartitionEntry>,
}

impl PartitionTable {
    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the filesystem partition
    ///
    /// The first data/littlefs or data/spiffs row carrying an offset cell is
    /// the filesystem partition; later matches are ignored. If that row's
    /// offset does not parse, there is no usable filesystem partition.
    pub fn filesystem_partition(&self) -> Option<FilesystemPartition> {
        let (entry, subtype) = self
            .entries
            .iter()
            .filter(|e| e.offset_text.is_some())
            .find_map(|e| e.filesystem().map(|st| (e, st)))?;

        Some(FilesystemPartition {
            offset: entry.offset?,
            subtype,
        })
    }

    /// Find a partition by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&PartitionEntry> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: &str, subtype: &str, offset: Option<u32>) -> PartitionEntry {
        PartitionEntry {
            name: subtype.to_string(),
            kind: kind.to_string(),
            subtype: subtype.to_string(),
            offset_text: Some(offset.map(|o| format!("{:#x}", o)).unwrap_or_default()),
            offset: offset.map(FlashOffset),
            size: None,
        }
    }

    #[test]
    fn test_subtype_case_insensitive() {
        assert_eq!(FsSubtype::from_subtype("LittleFS"), Some(FsSubtype::LittleFs));
        assert_eq!(FsSubtype::from_subtype("SPIFFS"), Some(FsSubtype::Spiffs));
        assert_eq!(FsSubtype::from_subtype("fat"), None);
        assert_eq!(FsSubtype::LittleFs.to_string(), "littlefs");
    }

    #[test]
    fn test_only_data_partitions_count() {
        assert_eq!(entry("app", "spiffs", Some(0)).filesystem(), None);
        assert_eq!(
            entry("DATA", "spiffs", Some(0)).filesystem(),
            Some(FsSubtype::Spiffs)
        );
    }

    #[test]
    fn test_unparsed_offset_on_first_match_is_not_found() {
        let table = PartitionTable {
            columns: vec![],
            entries: vec![
                entry("data", "spiffs", None),
                entry("data", "littlefs", Some(0x300000)),
            ],
        };
        assert_eq!(table.filesystem_partition(), None);
    }
}
