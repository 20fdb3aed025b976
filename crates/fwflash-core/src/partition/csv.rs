//! Partition table CSV parsing
//!
//! The first non-blank line is the header. A leading `#` on it is dropped and
//! the column names are matched case-insensitively, so both
//!
//! ```text
//! # Name, Type, SubType, Offset, Size, Flags
//! name,type,subtype,offset,size
//! ```
//!
//! work, in any column order. Every later line is a data row; rows starting
//! with `#` are comments. Cells are zipped against the header, so a short
//! row simply lacks its trailing fields.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::{FilesystemPartition, PartitionEntry, PartitionTable};
use crate::error::{Error, Result};
use crate::offset::FlashOffset;

/// Split the header line into lowercased column names
fn parse_header(line: &str) -> Vec<String> {
    line.trim_start_matches('#')
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .collect()
}

/// Zip a data row against the header
fn parse_row<'a>(columns: &'a [String], line: &'a str) -> HashMap<&'a str, &'a str> {
    columns
        .iter()
        .map(String::as_str)
        .zip(line.split(',').map(str::trim))
        .collect()
}

/// Parse a partition size: plain integer or with a `K`/`M` suffix
fn parse_size(s: &str) -> Option<u32> {
    let s = s.trim();
    let (num, multiplier) = if let Some(n) = s.strip_suffix(['K', 'k']) {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix(['M', 'm']) {
        (n, 1024 * 1024)
    } else {
        (s, 1)
    };

    FlashOffset::parse_auto(num)
        .ok()
        .and_then(|n| n.value().checked_mul(multiplier))
}

impl PartitionTable {
    /// Load a partition table from a CSV file
    pub fn from_csv_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;
        Ok(Self::from_csv_str(&content))
    }

    /// Parse a partition table from CSV text
    ///
    /// Parsing is lenient: cells that do not parse are left as `None` so the
    /// whole table can still be shown.
    pub fn from_csv_str(content: &str) -> Self {
        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());

        let Some(header) = lines.next() else {
            return Self::default();
        };
        let columns = parse_header(header);

        let mut entries = Vec::new();
        for line in lines {
            if line.starts_with('#') {
                continue;
            }

            let fields = parse_row(&columns, line);
            let text = |key: &str| fields.get(key).copied().unwrap_or_default().to_string();
            let offset_text = fields.get("offset").map(|s| s.to_string());

            entries.push(PartitionEntry {
                name: text("name"),
                kind: text("type"),
                subtype: text("subtype"),
                offset: offset_text.as_deref().and_then(|o| {
                    FlashOffset::parse_auto(o)
                        .map_err(|e| log::debug!("Partition row {:?}: {}", line, e))
                        .ok()
                }),
                offset_text,
                size: fields.get("size").and_then(|s| parse_size(s)),
            });
        }

        Self { columns, entries }
    }
}

/// Find the filesystem partition in partition table CSV text
///
/// Returns [`Error::PartitionNotFound`] when the table is empty, has no
/// data/littlefs or data/spiffs row, or the first such row has a malformed
/// offset.
pub fn find_filesystem_partition(content: &str) -> Result<FilesystemPartition> {
    PartitionTable::from_csv_str(content)
        .filesystem_partition()
        .ok_or(Error::PartitionNotFound)
}

/// Find the filesystem partition in a partition table file
///
/// Any failure, including an unreadable or non-UTF-8 file, is reported as
/// [`Error::PartitionNotFound`]: the caller is expected to fall back to
/// asking for the offset.
pub fn locate_filesystem_partition(path: impl AsRef<Path>) -> Result<FilesystemPartition> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Cannot read partition table {}: {}", path.display(), e);
            return Err(Error::PartitionNotFound);
        }
    };

    let found = find_filesystem_partition(&content);
    match &found {
        Ok(fs) => log::info!(
            "Found {} partition at {} in {}",
            fs.subtype,
            fs.offset,
            path.display()
        ),
        Err(_) => log::warn!(
            "No spiffs/littlefs data partition in {}",
            path.display()
        ),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::FsSubtype;
    use std::io::Write;

    const DEFAULT_CSV: &str = "\
# Name,   Type, SubType, Offset,  Size, Flags
nvs,      data, nvs,     0x9000,  0x5000,
otadata,  data, ota,     0xe000,  0x2000,
app0,     app,  ota_0,   0x10000, 0x140000,
app1,     app,  ota_1,   0x150000,0x140000,
spiffs,   data, spiffs,  0x290000,0x160000,
coredump, data, coredump,0x3F0000,0x10000,
";

    #[test]
    fn test_finds_spiffs() {
        let fs = find_filesystem_partition(DEFAULT_CSV).unwrap();
        assert_eq!(fs.offset, FlashOffset(0x290000));
        assert_eq!(fs.offset.to_string(), "0x290000");
        assert_eq!(fs.subtype, FsSubtype::Spiffs);
    }

    #[test]
    fn test_finds_littlefs_case_insensitive() {
        let csv = "NAME,TYPE,SUBTYPE,OFFSET,SIZE\nfs,DATA,LittleFS,0x300000,0x100000\n";
        let fs = find_filesystem_partition(csv).unwrap();
        assert_eq!(fs.offset.to_string(), "0x300000");
        assert_eq!(fs.subtype.as_str(), "littlefs");
    }

    #[test]
    fn test_no_filesystem_row() {
        let csv = "# Name,Type,SubType,Offset,Size\n\
                   nvs,data,nvs,0x9000,0x5000\n\
                   app0,app,factory,0x10000,1M\n";
        assert!(matches!(
            find_filesystem_partition(csv),
            Err(Error::PartitionNotFound)
        ));
    }

    #[test]
    fn test_first_match_wins() {
        let csv = "\
# Name, Type, SubType, Offset, Size
first,  data, littlefs, 0x200000, 0x10000
second, data, spiffs,   0x300000, 0x10000
";
        let fs = find_filesystem_partition(csv).unwrap();
        assert_eq!(fs.offset, FlashOffset(0x200000));
        assert_eq!(fs.subtype, FsSubtype::LittleFs);
    }

    #[test]
    fn test_decimal_offset_renders_as_hex() {
        let csv = "name,type,subtype,offset,size\nfs,data,spiffs,2686976,1441792\n";
        let fs = find_filesystem_partition(csv).unwrap();
        assert_eq!(fs.offset.to_string(), "0x290000");
    }

    #[test]
    fn test_column_order_is_free() {
        let csv = "offset,subtype,name,type\n0x290000,spiffs,fs,data\n";
        let fs = find_filesystem_partition(csv).unwrap();
        assert_eq!(fs.offset.to_string(), "0x290000");
    }

    #[test]
    fn test_short_rows_and_comments_are_skipped() {
        let csv = "\
# Name, Type, SubType, Offset, Size

# a comment row
short, data, spiffs

fs, data, spiffs, 0x310000, 0x10000
";
        let fs = find_filesystem_partition(csv).unwrap();
        assert_eq!(fs.offset.to_string(), "0x310000");
    }

    #[test]
    fn test_malformed_offset_is_not_found() {
        let csv = "name,type,subtype,offset\nfs,data,spiffs,0xZZ\n";
        assert!(matches!(
            find_filesystem_partition(csv),
            Err(Error::PartitionNotFound)
        ));
    }

    #[test]
    fn test_header_only_or_empty() {
        assert!(find_filesystem_partition("").is_err());
        assert!(find_filesystem_partition("\n\n").is_err());
        assert!(find_filesystem_partition("# Name,Type,SubType,Offset,Size\n").is_err());
    }

    #[test]
    fn test_table_listing() {
        let table = PartitionTable::from_csv_str(DEFAULT_CSV);
        assert_eq!(table.columns, vec!["name", "type", "subtype", "offset", "size", "flags"]);
        assert_eq!(table.len(), 6);
        let app0 = table.find("APP0").unwrap();
        assert_eq!(app0.kind, "app");
        assert_eq!(app0.offset, Some(FlashOffset(0x10000)));
        assert_eq!(app0.size, Some(0x140000));
    }

    #[test]
    fn test_size_suffixes() {
        assert_eq!(parse_size("1M"), Some(1024 * 1024));
        assert_eq!(parse_size("64K"), Some(64 * 1024));
        assert_eq!(parse_size("0x5000"), Some(0x5000));
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn test_locate_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DEFAULT_CSV.as_bytes()).unwrap();
        let fs = locate_filesystem_partition(file.path()).unwrap();
        assert_eq!(fs.offset.to_string(), "0x290000");
    }

    #[test]
    fn test_locate_unreadable_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            locate_filesystem_partition(&missing),
            Err(Error::PartitionNotFound)
        ));

        let binary = dir.path().join("binary.csv");
        fs::write(&binary, [0xFFu8, 0xFE, 0x00, 0x80]).unwrap();
        assert!(matches!(
            locate_filesystem_partition(&binary),
            Err(Error::PartitionNotFound)
        ));
    }
}
