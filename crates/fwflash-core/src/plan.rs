//! Flash plans
//!
//! A [`FlashPlan`] is the ordered list of `(offset, image)` pairs handed to a
//! single `write_flash` invocation. Plans are built per request and never
//! stored.

use crate::offset::FlashOffset;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// One region to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashRegion {
    /// Where the image goes
    pub offset: FlashOffset,
    /// Image to write there; `None` means the region is skipped
    pub payload: Option<PathBuf>,
}

impl FlashRegion {
    /// Create a region with a payload
    pub fn new(offset: impl Into<FlashOffset>, payload: impl Into<PathBuf>) -> Self {
        Self {
            offset: offset.into(),
            payload: Some(payload.into()),
        }
    }

    /// Create a region that will be skipped
    pub fn empty(offset: impl Into<FlashOffset>) -> Self {
        Self {
            offset: offset.into(),
            payload: None,
        }
    }

    /// The payload path, if present and non-empty
    pub fn image(&self) -> Option<&Path> {
        self.payload
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// An ordered set of regions for one flashing utility invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlashPlan {
    /// Regions in write order
    pub regions: Vec<FlashRegion>,
}

impl FlashPlan {
    /// Create an empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a region
    pub fn push(&mut self, region: FlashRegion) {
        self.regions.push(region);
    }

    /// Builder-style append
    pub fn with(mut self, region: FlashRegion) -> Self {
        self.push(region);
        self
    }

    /// Regions that will actually be written
    pub fn active_regions(&self) -> impl Iterator<Item = (FlashOffset, &Path)> {
        self.regions
            .iter()
            .filter_map(|r| r.image().map(|img| (r.offset, img)))
    }

    /// Check whether nothing would be written
    pub fn is_empty(&self) -> bool {
        self.active_regions().next().is_none()
    }

    /// Render as `<offset> <path>` argument pairs
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        for (offset, image) in self.active_regions() {
            args.push(OsString::from(offset.to_string()));
            args.push(image.as_os_str().to_os_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_args_keeps_order() {
        let plan = FlashPlan::new()
            .with(FlashRegion::new(0x1000, "bootloader.bin"))
            .with(FlashRegion::new(0x8000, "partitions.bin"))
            .with(FlashRegion::new(0x10000, "firmware.bin"));

        let args: Vec<_> = plan.to_args();
        assert_eq!(
            args,
            vec![
                "0x1000",
                "bootloader.bin",
                "0x8000",
                "partitions.bin",
                "0x10000",
                "firmware.bin"
            ]
        );
    }

    #[test]
    fn test_skips_regions_without_payload() {
        let plan = FlashPlan::new()
            .with(FlashRegion::empty(0x1000))
            .with(FlashRegion::new(0x10000, "firmware.bin"))
            .with(FlashRegion::new(0x290000, ""));

        assert_eq!(plan.active_regions().count(), 1);
        assert_eq!(plan.to_args(), vec!["0x10000", "firmware.bin"]);
        assert!(FlashPlan::new().with(FlashRegion::empty(0)).is_empty());
    }
}
