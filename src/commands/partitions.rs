//! Partition table command implementation

use fwflash_core::partition::PartitionTable;
use std::path::Path;

/// Show a partition table and the filesystem partition found in it
pub fn cmd_partitions(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let table = PartitionTable::from_csv_file(file)?;
    print_table(&table);
    Ok(())
}

/// Print a partition table in human-readable form
pub fn print_table(table: &PartitionTable) {
    println!("Partition Table");
    println!("===============");

    println!("\nPartitions ({}):", table.len());
    println!(
        "{:<16} {:<8} {:<10} {:>10} {:>10}",
        "Name", "Type", "SubType", "Offset", "Size"
    );
    println!("{:-<58}", "");

    for entry in &table.entries {
        let offset = match (entry.offset, &entry.offset_text) {
            (Some(offset), _) => format!("{:#010X}", offset.value()),
            (None, Some(text)) => format!("?{}", text),
            (None, None) => "-".to_string(),
        };
        let size = entry
            .size
            .map(super::format_size)
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<16} {:<8} {:<10} {:>10} {:>10}",
            entry.name, entry.kind, entry.subtype, offset, size
        );
    }

    println!();
    match table.filesystem_partition() {
        Some(fs) => println!("Filesystem: {} at {}", fs.subtype, fs.offset),
        None => println!("Filesystem: no spiffs/littlefs partition found"),
    }
}
