//! CLI command implementations
//!
//! `flash` and `plan` turn flags and config into a flash request and hand
//! it to `fwflash-seq`; `partitions` only reads a partition table.

pub mod flash;
pub mod partitions;
pub mod plan;

/// Format a byte count the way partition tables usually write it
fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 && bytes % (1024 * 1024) == 0 {
        format!("{}M", bytes / (1024 * 1024))
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{}K", bytes / 1024)
    } else {
        format!("{:#x}", bytes)
    }
}
