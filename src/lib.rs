//! # FAT12 RAM disk
//!
//! Builds FAT12 volume images in memory and serves them through a sector-addressed block device.
//!
//! ## Usage
//!
//! ```rust
//! use fat12_ramdisk::{
//!     boot_sector::BootSector,
//!     disk::{DiskIo, Drive, IoctlCommand, IoctlResponse, ram::RamDisk},
//!     format::{Fat12, FormatVolumeOptionsBuilder, Label},
//! };
//!
//! let label = Label::new("MYVOL").unwrap();
//!
//! let format_options = FormatVolumeOptionsBuilder::default()
//!     .label(label)
//!     .total_sectors(2880)
//!     .build()
//!     .unwrap();
//!
//! let formatter = Fat12::try_from(format_options).unwrap();
//! let mut image = formatter.build().unwrap();
//!
//! let mut disk = RamDisk::new();
//! disk.attach(&mut image);
//! assert!(disk.initialize(Drive::Raw).is_ready());
//!
//! let boot_sector = BootSector::read_from(&disk, Drive::Raw).unwrap();
//! assert_eq!(&boot_sector.volume_label(), b"MYVOL      ");
//! assert_eq!(
//!     disk.ioctl(Drive::Raw, IoctlCommand::GetSectorCount).unwrap(),
//!     IoctlResponse::SectorCount(2880)
//! );
//! ```
//!
//! ## Limitations
//! Only the FAT12 layout of a 1.44MB floppy (one reserved sector, two FATs of nine sectors, 224
//! root directory entries) is produced. Cluster allocation and file contents are left to the
//! filesystem driver mounted on top of the block device.

/// Boot sector record
pub mod boot_sector;
/// Block device interface and its in-memory implementation
pub mod disk;
/// Directory entry record
pub mod entry;
pub mod error;
/// FAT12 allocation table access
pub mod fat;
/// Volume image construction
pub mod format;
/// Packed FAT date & time fields
pub mod timestamp;

/// Size of a sector in bytes. The only sector size the image and the block device use.
pub const SECTOR_SIZE: usize = 512;
