use bitflags::bitflags;

use crate::error::DiskError;

/// RAM disk backing store
pub mod ram;

/// Drives a block device answers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Drive {
    /// Backed by one contiguous byte buffer.
    Raw = 0,
    /// Backed by a table of individual sectors.
    Sector = 1,
}

impl TryFrom<u8> for Drive {
    type Error = DiskError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Drive::Raw),
            1 => Ok(Drive::Sector),
            _ => Err(DiskError::InvalidDrive(value)),
        }
    }
}

bitflags! {
    /// Status of a drive. An empty set means the drive is ready.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct DiskStatus: u8 {
        /// No buffer is attached to the drive.
        const NOINIT = 0x01;
        /// The medium is write protected.
        const PROTECT = 0x04;
    }
}

impl DiskStatus {
    pub fn is_ready(self) -> bool {
        !self.contains(DiskStatus::NOINIT)
    }
}

/// Control commands of [`DiskIo::ioctl`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IoctlCommand {
    /// Flush pending writes.
    Sync = 0,
    /// Number of addressable sectors.
    GetSectorCount = 1,
    /// Sector size in bytes.
    GetSectorSize = 2,
    /// Erase block size in sectors.
    GetBlockSize = 3,
    /// Mark a sector range as unused.
    Trim = 4,
}

impl IoctlCommand {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for IoctlCommand {
    type Error = DiskError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(IoctlCommand::Sync),
            1 => Ok(IoctlCommand::GetSectorCount),
            2 => Ok(IoctlCommand::GetSectorSize),
            3 => Ok(IoctlCommand::GetBlockSize),
            4 => Ok(IoctlCommand::Trim),
            _ => Err(DiskError::UnsupportedCommand(value)),
        }
    }
}

/// Answer to a control command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IoctlResponse {
    /// The command carries no data.
    Done,
    SectorCount(u64),
    SectorSize(u16),
    BlockSize(u32),
}

/// Sector addressed storage a FAT driver mounts volumes from.
pub trait DiskIo {
    fn status(&self, drive: Drive) -> DiskStatus;

    /// Prepares the drive for use and reports its status afterward.
    fn initialize(&mut self, drive: Drive) -> DiskStatus;

    /// Reads `count` sectors starting at `sector` into the front of `buffer`.
    fn read(
        &self,
        drive: Drive,
        buffer: &mut [u8],
        sector: u64,
        count: u32,
    ) -> Result<(), DiskError>;

    /// Writes `count` sectors from the front of `buffer` starting at `sector`.
    fn write(
        &mut self,
        drive: Drive,
        buffer: &[u8],
        sector: u64,
        count: u32,
    ) -> Result<(), DiskError>;

    fn ioctl(&self, drive: Drive, command: IoctlCommand) -> Result<IoctlResponse, DiskError>;
}

impl<T: DiskIo + ?Sized> DiskIo for &mut T {
    fn status(&self, drive: Drive) -> DiskStatus {
        (**self).status(drive)
    }

    fn initialize(&mut self, drive: Drive) -> DiskStatus {
        (**self).initialize(drive)
    }

    fn read(
        &self,
        drive: Drive,
        buffer: &mut [u8],
        sector: u64,
        count: u32,
    ) -> Result<(), DiskError> {
        (**self).read(drive, buffer, sector, count)
    }

    fn write(
        &mut self,
        drive: Drive,
        buffer: &[u8],
        sector: u64,
        count: u32,
    ) -> Result<(), DiskError> {
        (**self).write(drive, buffer, sector, count)
    }

    fn ioctl(&self, drive: Drive, command: IoctlCommand) -> Result<IoctlResponse, DiskError> {
        (**self).ioctl(drive, command)
    }
}

#[test]
fn drive_numbers() {
    assert_eq!(Drive::try_from(0), Ok(Drive::Raw));
    assert_eq!(Drive::try_from(1), Ok(Drive::Sector));
    assert_eq!(Drive::try_from(2), Err(DiskError::InvalidDrive(2)));
}

#[test]
fn command_codes() {
    for code in 0..=4 {
        assert_eq!(IoctlCommand::try_from(code).unwrap().code(), code);
    }
    assert_eq!(
        IoctlCommand::try_from(0x30),
        Err(DiskError::UnsupportedCommand(0x30))
    );
}

#[test]
fn status_flags() {
    assert!(DiskStatus::empty().is_ready());
    assert!(DiskStatus::PROTECT.is_ready());
    assert!(!DiskStatus::NOINIT.is_ready());
    assert!(!(DiskStatus::NOINIT | DiskStatus::PROTECT).is_ready());
    assert_eq!(DiskStatus::all().bits(), 0x05);
}
