use std::{collections::TryReserveError, time::SystemTimeError};

use crate::{disk::Drive, format::FormatVolumeOptionsBuilderError};

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Invalid total sector count: {0}. Must be positive.")]
    InvalidTotalSectors(u32),
    #[error("Invalid volume label: {0:?}. Only printable ASCII characters are allowed.")]
    InvalidLabel(String),
    #[error("Invalid date: {year}-{month}-{day}. Years must be between `1980` and `2107`.")]
    InvalidDate { year: u64, month: u8, day: u8 },
    #[error("Invalid time: {hour}:{minute}:{second}.{millis:03}.")]
    InvalidTime {
        hour: u8,
        minute: u8,
        second: u8,
        millis: u16,
    },
    #[error("Unable to allocate the volume image: {0}.")]
    Allocation(#[from] TryReserveError),
    #[error("Incomplete format options: {0}.")]
    Options(#[from] FormatVolumeOptionsBuilderError),
    #[error("Unable to read the system clock: {0}.")]
    Clock(#[from] SystemTimeError),
    #[error("Unable to lay out the volume: {0}")]
    Layout(#[from] LayoutError),
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("{0}")]
    Format(#[from] FormatError),
    #[error("I/O error: {0}.")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DiskError {
    #[error("Drive {0:?} has no attached buffer.")]
    NotInitialized(Drive),
    #[error("Invalid drive number: {0}.")]
    InvalidDrive(u8),
    #[error("Transfer of {count} sector(s) starting at sector {sector} exceeds the attached buffer.")]
    OutOfRange { sector: u64, count: u32 },
    #[error("Buffer of {actual} bytes cannot hold {needed} bytes.")]
    BufferTooSmall { needed: usize, actual: usize },
    #[error("Unsupported control command: {0}.")]
    UnsupportedCommand(u8),
    #[error("Drive is write protected.")]
    WriteProtected,
}

/// Result code reported for a write to a protected drive.
pub const RES_WRPRT: u8 = 2;
/// Result code reported when the drive is not ready.
pub const RES_NOTRDY: u8 = 3;
/// Result code reported for invalid parameters.
pub const RES_PARERR: u8 = 4;

impl DiskError {
    /// Numeric result code of the block-device interface this error maps to.
    pub fn result_code(&self) -> u8 {
        match self {
            DiskError::NotInitialized(_) => RES_NOTRDY,
            DiskError::WriteProtected => RES_WRPRT,
            DiskError::InvalidDrive(_)
            | DiskError::OutOfRange { .. }
            | DiskError::BufferTooSmall { .. }
            | DiskError::UnsupportedCommand(_) => RES_PARERR,
        }
    }

    /// Whether the caller can recover by correcting the request itself.
    pub fn is_parameter_error(&self) -> bool {
        self.result_code() == RES_PARERR
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Region needs {expected} bytes, but only {actual} are available.")]
    Truncated { expected: usize, actual: usize },
    #[error("Invalid boot sector signature: {0:#06x}.")]
    InvalidSignature(u16),
    #[error("No allocation table: {copies} cop(ies) of {length} bytes.")]
    NoAllocationTable { length: usize, copies: u8 },
    #[error("Cluster #{0} is outside of the allocation table.")]
    ClusterOutOfRange(u32),
    #[error("Block device error: {0}")]
    Disk(#[from] DiskError),
}

#[test]
fn result_codes() {
    assert_eq!(DiskError::NotInitialized(Drive::Raw).result_code(), RES_NOTRDY);
    assert_eq!(DiskError::WriteProtected.result_code(), RES_WRPRT);
    assert!(DiskError::UnsupportedCommand(4).is_parameter_error());
    assert!(DiskError::OutOfRange { sector: 3, count: 1 }.is_parameter_error());
    assert!(!DiskError::NotInitialized(Drive::Sector).is_parameter_error());
}
