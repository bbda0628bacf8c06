use crate::{
    boot_sector::BootSector,
    error::LayoutError,
    fat::{Fat12Table, FatEntry},
};

use super::Fat12;

impl Fat12 {
    /// Reserves the first two entries of both allocation tables: the media descriptor followed by
    /// an end of chain marker.
    pub(super) fn write_fat(&self, image: &mut [u8], boot: &BootSector) -> Result<(), LayoutError> {
        let mut fat = Fat12Table::new(image, boot)?;

        // write entry 0 (media type)
        fat.set(0, FatEntry::media_type(boot.media_descriptor()))?;

        // write entry 1 (reserved)
        fat.set(1, FatEntry::eof())?;

        Ok(())
    }
}

#[test]
fn seeded_tables() {
    let image = super::build_image("SEEDED", 2880).unwrap();
    let boot = BootSector::from_bytes(&image).unwrap();

    let first = boot.fat_offset();
    let second = first + boot.fat_length();
    assert_eq!(&image[first..first + 3], &[0xF0, 0xFF, 0xFF]);
    assert_eq!(&image[second..second + 3], &[0xF0, 0xFF, 0xFF]);
    assert!(image[first + 3..second].iter().all(|&b| b == 0));

    let mut image = image;
    let fat = Fat12Table::new(&mut image, &boot).unwrap();
    assert!(fat.copies_match());
    assert_eq!(fat.get(0).unwrap(), FatEntry(0xFF0));
    assert!(fat.get(1).unwrap().is_eof());
    assert!(fat.get(2).unwrap().is_free());
}

#[test]
fn tables_beyond_tiny_image() {
    // a single sector holds the boot sector only
    let image = super::build_image("TINY", 1).unwrap();
    assert_eq!(image.len(), 512);
    assert_eq!(&image[510..], &[0x55, 0xAA]);

    let boot = BootSector::from_bytes(&image).unwrap();
    let meta = Fat12::try_from(
        super::FormatVolumeOptionsBuilder::default()
            .total_sectors(1)
            .build()
            .unwrap(),
    )
    .unwrap();
    let mut image = image;
    assert!(matches!(
        meta.write_fat(&mut image, &boot),
        Err(LayoutError::Truncated { .. })
    ));
}
