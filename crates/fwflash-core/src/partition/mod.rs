//! Partition table support
//!
//! ESP-IDF style partition tables are small CSV files:
//!
//! ```text
//! # Name,   Type, SubType, Offset,   Size
//! nvs,      data, nvs,     0x9000,   0x5000
//! otadata,  data, ota,     0xe000,   0x2000
//! app0,     app,  ota_0,   0x10000,  0x140000
//! spiffs,   data, spiffs,  0x290000, 0x170000
//! ```
//!
//! The only thing fwflash really needs from them is where the filesystem
//! partition starts and which filesystem it holds:
//!
//! ```ignore
//! let fs = locate_filesystem_partition("partitions.csv")?;
//! println!("{} at {}", fs.subtype, fs.offset);
//! ```

mod csv;
mod types;

pub use csv::{find_filesystem_partition, locate_filesystem_partition};
pub use types::*;
