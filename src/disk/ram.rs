use std::ops::Range;

use checked_num::CheckedU64;

use crate::{SECTOR_SIZE, error::DiskError};

use super::{DiskIo, DiskStatus, Drive, IoctlCommand, IoctlResponse};

/// A block device backed by caller owned memory.
///
/// [`Drive::Raw`] serves one contiguous byte buffer, [`Drive::Sector`] a table of individual
/// sectors. Both drives start out uninitialized and become ready once a buffer is attached.
#[derive(Debug, Default)]
pub struct RamDisk<'a> {
    raw: Option<&'a mut [u8]>,
    sectors: Option<&'a mut [[u8; SECTOR_SIZE]]>,
    read_only: bool,
}

impl<'a> RamDisk<'a> {
    /// Creates a writable device with no buffers attached.
    pub fn new() -> RamDisk<'a> {
        Self::default()
    }

    /// Creates a write protected device with no buffers attached.
    pub fn read_only() -> RamDisk<'a> {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Binds `image` to the raw drive and returns the previously attached buffer, if any.
    pub fn attach(&mut self, image: &'a mut [u8]) -> Option<&'a mut [u8]> {
        log::debug!("attaching {} bytes to the raw drive", image.len());
        self.raw.replace(image)
    }

    /// Binds a sector table to the sector drive and returns the previously attached table, if any.
    pub fn attach_sectors(
        &mut self,
        sectors: &'a mut [[u8; SECTOR_SIZE]],
    ) -> Option<&'a mut [[u8; SECTOR_SIZE]]> {
        log::debug!("attaching {} sectors to the sector drive", sectors.len());
        self.sectors.replace(sectors)
    }

    /// Unbinds the raw drive's buffer and hands it back.
    pub fn detach(&mut self) -> Option<&'a mut [u8]> {
        log::debug!("detaching the raw drive");
        self.raw.take()
    }

    /// Unbinds the sector drive's table and hands it back.
    pub fn detach_sectors(&mut self) -> Option<&'a mut [[u8; SECTOR_SIZE]]> {
        log::debug!("detaching the sector drive");
        self.sectors.take()
    }

    /// Contents of the raw drive.
    pub fn raw(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// Length of the buffer attached to `drive` in bytes.
    fn attached_len(&self, drive: Drive) -> Option<usize> {
        match drive {
            Drive::Raw => self.raw.as_deref().map(<[u8]>::len),
            Drive::Sector => self.sectors.as_deref().map(size_of_val),
        }
    }
}

/// Byte range covered by a transfer of `count` sectors starting at `sector`.
///
/// The sector following the transfer must exist as well. An empty transfer at sector `0` is
/// always in range.
fn transfer_range(len: usize, sector: u64, count: u32) -> Result<Range<usize>, DiskError> {
    if sector == 0 && count == 0 {
        return Ok(0..0);
    }

    let out_of_range = DiskError::OutOfRange { sector, count };
    let end = ((CheckedU64::new(sector) + count as u64 + 1) * SECTOR_SIZE as u64)
        .ok_or(out_of_range)?;
    if end > len as u64 {
        return Err(out_of_range);
    }

    // both bounds are below `len`, so they fit into usize
    let start = sector as usize * SECTOR_SIZE;
    Ok(start..start + count as usize * SECTOR_SIZE)
}

fn buffer_too_small(needed: usize, actual: usize) -> DiskError {
    DiskError::BufferTooSmall { needed, actual }
}

impl DiskIo for RamDisk<'_> {
    fn status(&self, drive: Drive) -> DiskStatus {
        let mut status = match self.attached_len(drive) {
            Some(_) => DiskStatus::empty(),
            None => DiskStatus::NOINIT,
        };
        if self.read_only {
            status |= DiskStatus::PROTECT;
        }
        status
    }

    fn initialize(&mut self, drive: Drive) -> DiskStatus {
        let status = self.status(drive);
        log::debug!("initialized drive {drive:?}: {status:?}");
        status
    }

    fn read(
        &self,
        drive: Drive,
        buffer: &mut [u8],
        sector: u64,
        count: u32,
    ) -> Result<(), DiskError> {
        let len = self
            .attached_len(drive)
            .ok_or(DiskError::NotInitialized(drive))?;
        let range = transfer_range(len, sector, count)?;
        let actual = buffer.len();
        let buffer = buffer
            .get_mut(..range.len())
            .ok_or_else(|| buffer_too_small(range.len(), actual))?;

        log::trace!("reading {count} sector(s) at {sector} from drive {drive:?}");

        match drive {
            Drive::Raw => {
                let image = self.raw.as_deref().ok_or(DiskError::NotInitialized(drive))?;
                buffer.copy_from_slice(&image[range]);
            }
            Drive::Sector => {
                let table = self
                    .sectors
                    .as_deref()
                    .ok_or(DiskError::NotInitialized(drive))?;
                let first = range.start / SECTOR_SIZE;
                let sources = &table[first..first + count as usize];
                for (chunk, source) in buffer.chunks_exact_mut(SECTOR_SIZE).zip(sources) {
                    chunk.copy_from_slice(source);
                }
            }
        }

        Ok(())
    }

    fn write(
        &mut self,
        drive: Drive,
        buffer: &[u8],
        sector: u64,
        count: u32,
    ) -> Result<(), DiskError> {
        let len = self
            .attached_len(drive)
            .ok_or(DiskError::NotInitialized(drive))?;
        if self.read_only {
            return Err(DiskError::WriteProtected);
        }
        let range = transfer_range(len, sector, count)?;
        let buffer = buffer
            .get(..range.len())
            .ok_or_else(|| buffer_too_small(range.len(), buffer.len()))?;

        log::trace!("writing {count} sector(s) at {sector} to drive {drive:?}");

        match drive {
            Drive::Raw => {
                let image = self
                    .raw
                    .as_deref_mut()
                    .ok_or(DiskError::NotInitialized(drive))?;
                image[range].copy_from_slice(buffer);
            }
            Drive::Sector => {
                let table = self
                    .sectors
                    .as_deref_mut()
                    .ok_or(DiskError::NotInitialized(drive))?;
                let first = range.start / SECTOR_SIZE;
                let targets = &mut table[first..first + count as usize];
                for (target, chunk) in targets.iter_mut().zip(buffer.chunks_exact(SECTOR_SIZE)) {
                    target.copy_from_slice(chunk);
                }
            }
        }

        Ok(())
    }

    fn ioctl(&self, drive: Drive, command: IoctlCommand) -> Result<IoctlResponse, DiskError> {
        match (command, self.attached_len(drive)) {
            // nothing is buffered
            (IoctlCommand::Sync, _) => Ok(IoctlResponse::Done),
            (IoctlCommand::Trim, _) => Err(DiskError::UnsupportedCommand(command.code())),
            (_, None) => Err(DiskError::NotInitialized(drive)),
            (IoctlCommand::GetSectorCount, Some(len)) => {
                Ok(IoctlResponse::SectorCount((len / SECTOR_SIZE) as u64))
            }
            (IoctlCommand::GetSectorSize, Some(_)) => {
                Ok(IoctlResponse::SectorSize(SECTOR_SIZE as u16))
            }
            (IoctlCommand::GetBlockSize, Some(_)) => Ok(IoctlResponse::BlockSize(1)),
        }
    }
}

#[test]
fn uninitialized_drives() {
    let mut disk = RamDisk::new();
    let mut buffer = [0u8; SECTOR_SIZE];

    for drive in [Drive::Raw, Drive::Sector] {
        assert_eq!(disk.status(drive), DiskStatus::NOINIT);
        assert_eq!(disk.initialize(drive), DiskStatus::NOINIT);
        assert_eq!(
            disk.read(drive, &mut buffer, 0, 1),
            Err(DiskError::NotInitialized(drive))
        );
        assert_eq!(
            disk.write(drive, &buffer, 0, 1),
            Err(DiskError::NotInitialized(drive))
        );
        assert_eq!(
            disk.ioctl(drive, IoctlCommand::GetSectorCount),
            Err(DiskError::NotInitialized(drive))
        );
        assert_eq!(disk.ioctl(drive, IoctlCommand::Sync), Ok(IoctlResponse::Done));
    }
}

#[test]
fn transfer_bounds() {
    const SECTORS: u64 = 8;
    let mut image = vec![0u8; SECTORS as usize * SECTOR_SIZE];
    let mut disk = RamDisk::new();
    disk.attach(&mut image);

    let mut buffer = vec![0u8; SECTORS as usize * SECTOR_SIZE];
    for sector in 0..=SECTORS + 1 {
        for count in 0..=SECTORS as u32 + 1 {
            let in_range = (sector + count as u64 + 1) * SECTOR_SIZE as u64
                <= SECTORS * SECTOR_SIZE as u64
                || (sector == 0 && count == 0);

            assert_eq!(disk.read(Drive::Raw, &mut buffer, sector, count).is_ok(), in_range);
            assert_eq!(disk.write(Drive::Raw, &buffer, sector, count).is_ok(), in_range);
        }
    }

    // the last sector is never addressable
    assert_eq!(
        disk.read(Drive::Raw, &mut buffer, SECTORS - 1, 1),
        Err(DiskError::OutOfRange {
            sector: SECTORS - 1,
            count: 1
        })
    );
    assert!(disk.read(Drive::Raw, &mut buffer, u64::MAX, u32::MAX).is_err());
}

#[test]
fn empty_transfer() {
    let mut image = [0u8; 16];
    let mut disk = RamDisk::new();
    disk.attach(&mut image);

    assert!(disk.initialize(Drive::Raw).is_ready());
    assert_eq!(disk.read(Drive::Raw, &mut [], 0, 0), Ok(()));
    assert_eq!(disk.write(Drive::Raw, &[], 0, 0), Ok(()));
    assert!(disk.read(Drive::Raw, &mut [], 0, 1).is_err());
}

#[test]
fn read_write_raw() {
    let mut image = vec![0u8; 4 * SECTOR_SIZE];
    let mut disk = RamDisk::new();
    disk.attach(&mut image);

    let data: Vec<u8> = (0..2 * SECTOR_SIZE).map(|i| i as u8).collect();
    disk.write(Drive::Raw, &data, 1, 2).unwrap();

    let mut read_back = vec![0u8; 3 * SECTOR_SIZE];
    disk.read(Drive::Raw, &mut read_back, 1, 2).unwrap();
    assert_eq!(&read_back[..2 * SECTOR_SIZE], &data[..]);
    assert!(read_back[2 * SECTOR_SIZE..].iter().all(|&b| b == 0));

    assert_eq!(
        disk.read(Drive::Raw, &mut read_back[..SECTOR_SIZE], 0, 2),
        Err(DiskError::BufferTooSmall {
            needed: 2 * SECTOR_SIZE,
            actual: SECTOR_SIZE
        })
    );

    let image = disk.detach().unwrap();
    assert_eq!(&image[SECTOR_SIZE..3 * SECTOR_SIZE], &data[..]);
    assert!(image[..SECTOR_SIZE].iter().all(|&b| b == 0));
}

#[test]
fn sector_count() {
    let mut image = vec![0u8; 512 * SECTOR_SIZE];
    let mut disk = RamDisk::new();
    disk.attach(&mut image);

    assert_eq!(
        disk.ioctl(Drive::Raw, IoctlCommand::GetSectorCount),
        Ok(IoctlResponse::SectorCount(512))
    );
    assert_eq!(
        disk.ioctl(Drive::Raw, IoctlCommand::GetSectorSize),
        Ok(IoctlResponse::SectorSize(512))
    );
    assert_eq!(
        disk.ioctl(Drive::Raw, IoctlCommand::GetBlockSize),
        Ok(IoctlResponse::BlockSize(1))
    );
    assert_eq!(
        disk.ioctl(Drive::Raw, IoctlCommand::Trim),
        Err(DiskError::UnsupportedCommand(4))
    );
}

#[test]
fn write_protection() {
    let mut image = vec![0x5Au8; 4 * SECTOR_SIZE];
    let mut disk = RamDisk::read_only();
    disk.attach(&mut image);

    assert_eq!(disk.status(Drive::Raw), DiskStatus::PROTECT);
    assert!(disk.status(Drive::Raw).is_ready());
    assert_eq!(
        disk.write(Drive::Raw, &[0u8; SECTOR_SIZE], 0, 1),
        Err(DiskError::WriteProtected)
    );

    let mut buffer = [0u8; SECTOR_SIZE];
    disk.read(Drive::Raw, &mut buffer, 2, 1).unwrap();
    assert!(buffer.iter().all(|&b| b == 0x5A));
}

#[test]
fn detach_and_reattach() {
    let mut first = vec![1u8; 2 * SECTOR_SIZE];
    let mut second = vec![2u8; 2 * SECTOR_SIZE];
    let mut disk = RamDisk::new();

    assert!(disk.attach(&mut first).is_none());
    let previous = disk.attach(&mut second).unwrap();
    assert!(previous.iter().all(|&b| b == 1));

    let mut buffer = [0u8; SECTOR_SIZE];
    disk.read(Drive::Raw, &mut buffer, 0, 1).unwrap();
    assert!(buffer.iter().all(|&b| b == 2));

    assert!(disk.detach().is_some());
    assert_eq!(disk.status(Drive::Raw), DiskStatus::NOINIT);
    assert!(disk.detach().is_none());
    assert!(disk.raw().is_none());
}

#[test]
fn sector_table_drive() {
    let mut table = vec![[0u8; SECTOR_SIZE]; 4];
    let mut disk = RamDisk::new();
    disk.attach_sectors(&mut table);

    assert!(disk.initialize(Drive::Sector).is_ready());
    assert_eq!(disk.status(Drive::Raw), DiskStatus::NOINIT);
    assert_eq!(
        disk.ioctl(Drive::Sector, IoctlCommand::GetSectorCount),
        Ok(IoctlResponse::SectorCount(4))
    );

    let mut data = vec![0xAAu8; SECTOR_SIZE];
    data.extend([0xBB; SECTOR_SIZE]);
    disk.write(Drive::Sector, &data, 1, 2).unwrap();
    assert!(disk.write(Drive::Sector, &data, 2, 2).is_err());

    let mut read_back = vec![0u8; 2 * SECTOR_SIZE];
    disk.read(Drive::Sector, &mut read_back, 1, 2).unwrap();
    assert_eq!(read_back, data);

    let table = disk.detach_sectors().unwrap();
    assert!(table[0].iter().all(|&b| b == 0));
    assert!(table[1].iter().all(|&b| b == 0xAA));
    assert!(table[2].iter().all(|&b| b == 0xBB));
}
