use crate::{
    boot_sector::BootSector,
    entry::{DIR_ENTRY_SIZE, DirEntry, first_free_slot},
    error::LayoutError,
};

use super::Fat12;

impl Fat12 {
    /// Places the volume label entry into the first free slot of the root directory. The part of
    /// the directory past the end of the image is ignored.
    pub(super) fn write_root_directory(
        &self,
        image: &mut [u8],
        boot: &BootSector,
    ) -> Result<(), LayoutError> {
        let offset = boot.root_dir_offset();
        let truncated = LayoutError::Truncated {
            expected: offset + DIR_ENTRY_SIZE,
            actual: image.len(),
        };

        let start = offset.min(image.len());
        let end = (offset + boot.root_dir_length()).min(image.len());
        let region = &mut image[start..end];

        let slot = first_free_slot(region).ok_or(truncated)?;
        let entry = DirEntry::volume_label(&self.label, &self.timestamp);

        let slot_offset = slot * DIR_ENTRY_SIZE;
        region[slot_offset..slot_offset + DIR_ENTRY_SIZE].copy_from_slice(entry.bytes());

        Ok(())
    }
}

#[test]
fn volume_label_entry() {
    use crate::{entry::find_volume_label, timestamp::Timestamp};

    let image = super::build_image("MYVOL", 2880).unwrap();
    let boot = BootSector::from_bytes(&image).unwrap();
    let root = &image[boot.root_dir_offset()..][..boot.root_dir_length()];

    assert_eq!(find_volume_label(root), Some(0));
    assert_eq!(first_free_slot(root), Some(1));

    let entry = DirEntry::from_bytes(root).unwrap();
    assert_eq!(&entry.raw_name(), b"MYVOL      ");
    assert!(entry.is_volume_label());
    assert_eq!(entry.last_written(), Timestamp::default());
    assert_eq!(entry.first_cluster(), 0);
    assert_eq!(entry.file_size(), 0);
}

#[test]
fn custom_timestamp() {
    use crate::timestamp::{Date, Time, Timestamp};

    let timestamp = Timestamp::new(
        Date::new(1999, 12, 31).unwrap(),
        Time::new(23, 59, 58).unwrap(),
    );
    let format_options = super::FormatVolumeOptionsBuilder::default()
        .total_sectors(2880)
        .timestamp(timestamp)
        .build()
        .unwrap();
    let image = Fat12::try_from(format_options).unwrap().build().unwrap();

    let entry = DirEntry::from_bytes(&image[9728..]).unwrap();
    assert_eq!(entry.last_written(), timestamp);
}

#[test]
fn directory_beyond_tiny_image() {
    // the root directory starts right at the end of a 19 sector image
    let image = super::build_image("EDGE", 19).unwrap();
    assert_eq!(image.len(), 9728);

    let image = super::build_image("EDGE", 20).unwrap();
    assert_eq!(&image[9728..9739], b"EDGE       ");
    assert_eq!(image[9739], 0x08);
}

#[test]
fn stamped_with_creation_time() {
    use crate::timestamp::{Date, Time, Timestamp};

    // 2001-09-09 01:46:40 UTC
    let created = Timestamp::from_unix(1_000_000_000, 0).unwrap();
    let format_options = super::FormatVolumeOptionsBuilder::default()
        .total_sectors(2880)
        .timestamp(created)
        .build()
        .unwrap();
    let image = Fat12::try_from(format_options).unwrap().build().unwrap();

    let entry = DirEntry::from_bytes(&image[9728..]).unwrap();
    assert_eq!(entry.last_written().date(), Date::new(2001, 9, 9).unwrap());
    assert_eq!(entry.last_written().time(), Time::new(1, 46, 40).unwrap());
}
