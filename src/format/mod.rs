use std::io::Write;

use checked_num::CheckedU64;
use derive_builder::Builder;
use util::DEFAULT_VOLUME_ID;

use crate::{
    SECTOR_SIZE,
    boot_sector::BootSector,
    entry::DIR_ENTRY_SIZE,
    error::{FormatError, ImageError},
    timestamp::Timestamp,
};

pub mod boot;
pub mod fat;
pub mod root;
pub mod util;

pub use util::Label;

#[derive(Builder, Copy, Clone, Debug)]
pub struct FormatVolumeOptions {
    /// Stored in the boot sector and as the first root directory entry.
    #[builder(default)]
    label: Label,
    /// Size of the volume (in sectors)
    total_sectors: u32,
    /// Stamped onto the volume label entry.
    #[builder(default)]
    timestamp: Timestamp,
    #[builder(default = "DEFAULT_VOLUME_ID")]
    volume_id: u32,
    /// Reserve FAT entries `0` and `1`. Without them both tables stay zeroed.
    #[builder(default = "true")]
    seed_fat: bool,
}

/// A FAT12 volume ready to be built.
#[derive(Copy, Clone, Debug)]
pub struct Fat12 {
    pub(super) label: Label,
    pub(super) total_sectors: u32,
    /// Size of the image (in bytes)
    pub(super) size: usize,
    pub(super) timestamp: Timestamp,
    pub(super) volume_id: u32,
    pub(super) seed_fat: bool,
}

impl TryFrom<FormatVolumeOptions> for Fat12 {
    type Error = FormatError;

    fn try_from(format_options: FormatVolumeOptions) -> Result<Self, Self::Error> {
        let total_sectors = format_options.total_sectors;
        if total_sectors == 0 {
            return Err(FormatError::InvalidTotalSectors(total_sectors));
        }

        let size = (CheckedU64::new(total_sectors as u64) * SECTOR_SIZE as u64)
            .ok_or(FormatError::InvalidTotalSectors(total_sectors))?;
        let size =
            usize::try_from(size).map_err(|_| FormatError::InvalidTotalSectors(total_sectors))?;

        Ok(Self {
            label: format_options.label,
            total_sectors,
            size,
            timestamp: format_options.timestamp,
            volume_id: format_options.volume_id,
            seed_fat: format_options.seed_fat,
        })
    }
}

impl Fat12 {
    /// Allocates a zeroed image and lays out the boot sector, both FATs and the root directory.
    ///
    /// Regions that lie (partially) beyond the end of a tiny image are left out, see
    /// [`Fat12::fat_fits`] and [`Fat12::label_entry_fits`]. The boot sector always fits.
    pub fn build(&self) -> Result<Vec<u8>, FormatError> {
        let mut image = Vec::new();
        image.try_reserve_exact(self.size)?;
        image.resize(self.size, 0);

        let boot_sector = self.write_boot_sector(&mut image);

        if !self.seed_fat {
            log::debug!("allocation tables left zeroed");
        } else if self.fat_fits() {
            self.write_fat(&mut image, &boot_sector)?;
        } else {
            log::debug!("allocation tables end past the image, left out");
        }

        if self.label_entry_fits() {
            self.write_root_directory(&mut image, &boot_sector)?;
        } else {
            log::debug!("root directory starts past the image, volume label entry left out");
        }

        log::debug!(
            "built {} byte FAT12 image ({} sectors)",
            self.size,
            self.total_sectors
        );

        Ok(image)
    }

    /// Builds the image and writes it to `f` in one piece.
    pub fn write<T: Write>(&self, f: &mut T) -> Result<(), ImageError> {
        let image = self.build()?;

        f.write_all(&image)?;
        f.flush()?;

        Ok(())
    }

    /// Whether every copy of the allocation table lies within the image.
    pub fn fat_fits(&self) -> bool {
        self.boot_sector().root_dir_offset() <= self.size
    }

    /// Whether the image reaches past the first root directory slot.
    pub fn label_entry_fits(&self) -> bool {
        self.boot_sector().root_dir_offset() + DIR_ENTRY_SIZE <= self.size
    }

    /// The boot sector [`Fat12::build`] places at the start of the image.
    pub fn boot_sector(&self) -> BootSector {
        BootSector::new(self)
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn total_sectors(&self) -> u32 {
        self.total_sectors
    }

    /// Size of the image (in bytes)
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Builds a volume image of `total_sectors` sectors labeled `volume_label`, using the defaults of
/// [`FormatVolumeOptionsBuilder`] for everything else.
pub fn build_image(volume_label: &str, total_sectors: u32) -> Result<Vec<u8>, FormatError> {
    let format_options = FormatVolumeOptionsBuilder::default()
        .label(Label::new(volume_label)?)
        .total_sectors(total_sectors)
        .build()?;

    Fat12::try_from(format_options)?.build()
}

#[test]
fn rejects_empty_volume() {
    assert!(matches!(
        build_image("EMPTY", 0),
        Err(FormatError::InvalidTotalSectors(0))
    ));
}

#[test]
fn missing_total_sectors() {
    let format_options = FormatVolumeOptionsBuilder::default()
        .label(Label::new("NOSIZE").unwrap())
        .build();

    assert!(format_options.is_err());
}

#[test]
fn image_size() {
    for total_sectors in [1, 19, 20, 2880, 65536] {
        let image = build_image("SIZES", total_sectors).unwrap();
        assert_eq!(image.len(), total_sectors as usize * SECTOR_SIZE);
        assert_eq!(&image[510..512], &[0x55, 0xAA]);
    }
}

#[test]
fn regions_of_tiny_images() {
    let geometry = |total_sectors: u32| {
        let format_options = FormatVolumeOptionsBuilder::default()
            .total_sectors(total_sectors)
            .build()
            .unwrap();
        let meta = Fat12::try_from(format_options).unwrap();
        (meta.fat_fits(), meta.label_entry_fits())
    };

    assert_eq!(geometry(1), (false, false));
    // the first table fits, the second one does not
    assert_eq!(geometry(10), (false, false));
    assert_eq!(geometry(19), (true, false));
    assert_eq!(geometry(20), (true, true));
    assert_eq!(geometry(2880), (true, true));

    // a partially covered region is left untouched
    let image = build_image("PARTIAL", 10).unwrap();
    assert!(image[SECTOR_SIZE..].iter().all(|&b| b == 0));

    let image = build_image("SEEDED", 19).unwrap();
    assert_eq!(&image[SECTOR_SIZE..SECTOR_SIZE + 3], &[0xF0, 0xFF, 0xFF]);
    assert_eq!(&image[10 * SECTOR_SIZE..10 * SECTOR_SIZE + 3], &[0xF0, 0xFF, 0xFF]);
}

#[test]
fn write_to_sink() {
    let format_options = FormatVolumeOptionsBuilder::default()
        .label(Label::new("SINK").unwrap())
        .total_sectors(2880)
        .build()
        .unwrap();
    let formatter = Fat12::try_from(format_options).unwrap();

    let mut f = std::io::Cursor::new(Vec::new());
    formatter.write(&mut f).unwrap();

    assert_eq!(f.into_inner(), formatter.build().unwrap());
}

#[test]
fn unseeded_tables() {
    let format_options = FormatVolumeOptionsBuilder::default()
        .total_sectors(2880)
        .seed_fat(false)
        .build()
        .unwrap();
    let image = Fat12::try_from(format_options).unwrap().build().unwrap();

    assert!(image[SECTOR_SIZE..19 * SECTOR_SIZE].iter().all(|&b| b == 0));
    // the label entry is still written
    assert_eq!(&image[9728..9739], b"NO NAME    ");
}
