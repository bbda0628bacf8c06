use crate::{SECTOR_SIZE, boot_sector::BootSector};

use super::{
    Fat12,
    util::{
        BOOT_CODE_FILL, BOOT_SIGNATURE, DRIVE_NUMBER, EXTENDED_BOOT_SIGNATURE, FAT_SECTORS,
        FAT_TABLE_COUNT, FILESYSTEM_TYPE, JUMP_BOOT, MAX_SHORT_TOTAL_SECTORS, MEDIA_DESCRIPTOR,
        NUMBER_OF_HEADS, OEM_NAME, RESERVED_SECTORS, ROOT_DIR_ENTRIES, SECTORS_PER_CLUSTER,
        SECTORS_PER_TRACK,
    },
};

impl BootSector {
    /// Creates the boot sector of a 1.44MB floppy layout. Volumes of more than 65535 sectors
    /// record their size in the 32 bit field only.
    pub(super) fn new(meta: &Fat12) -> BootSector {
        let (total_sectors_16, total_sectors_32) = if meta.total_sectors > MAX_SHORT_TOTAL_SECTORS
        {
            (0, meta.total_sectors)
        } else {
            (meta.total_sectors as u16, 0)
        };

        Self {
            jump_boot: JUMP_BOOT,
            oem_name: OEM_NAME,
            bytes_per_sector: (SECTOR_SIZE as u16).to_le(),
            sectors_per_cluster: SECTORS_PER_CLUSTER,
            reserved_sectors: RESERVED_SECTORS.to_le(),
            number_of_fats: FAT_TABLE_COUNT,
            root_entries: ROOT_DIR_ENTRIES.to_le(),
            total_sectors_16: total_sectors_16.to_le(),
            media_descriptor: MEDIA_DESCRIPTOR,
            sectors_per_fat: FAT_SECTORS.to_le(),
            sectors_per_track: SECTORS_PER_TRACK.to_le(),
            number_of_heads: NUMBER_OF_HEADS.to_le(),
            hidden_sectors: 0,
            total_sectors_32: total_sectors_32.to_le(),
            drive_number: DRIVE_NUMBER,
            _reserved: 0,
            extended_boot_signature: EXTENDED_BOOT_SIGNATURE,
            volume_id: meta.volume_id.to_le(),
            volume_label: *meta.label.as_bytes(),
            filesystem_type: FILESYSTEM_TYPE,
            boot_code: [BOOT_CODE_FILL; 448],
            boot_signature: BOOT_SIGNATURE.to_le(),
        }
    }
}

impl Fat12 {
    /// Writes the boot sector into the first sector of `image` and returns it.
    pub(super) fn write_boot_sector(&self, image: &mut [u8]) -> BootSector {
        let boot_sector = BootSector::new(self);
        image[..SECTOR_SIZE].copy_from_slice(boot_sector.bytes());
        boot_sector
    }
}

#[cfg(test)]
fn boot_sector_of(label: &str, total_sectors: u32) -> BootSector {
    use super::{FormatVolumeOptionsBuilder, Label};

    let format_options = FormatVolumeOptionsBuilder::default()
        .label(Label::new(label).unwrap())
        .total_sectors(total_sectors)
        .build()
        .unwrap();

    let meta = Fat12::try_from(format_options).unwrap();
    BootSector::new(&meta)
}

#[test]
fn floppy() {
    let boot_sector = boot_sector_of("MYVOL", 2880);

    assert_eq!(boot_sector.jump_boot(), [0xEB, 0x3C, 0x90]);
    assert_eq!(&boot_sector.oem_name(), b"MSDOS5.0");
    assert_eq!(boot_sector.bytes_per_sector(), 512);
    assert_eq!(boot_sector.sectors_per_cluster(), 1);
    assert_eq!(boot_sector.reserved_sectors(), 1);
    assert_eq!(boot_sector.number_of_fats(), 2);
    assert_eq!(boot_sector.root_entries(), 224);
    assert_eq!(boot_sector.total_sectors_16(), 2880);
    assert_eq!(boot_sector.total_sectors_32(), 0);
    assert_eq!(boot_sector.media_descriptor(), 0xF0);
    assert_eq!(boot_sector.sectors_per_fat(), 9);
    assert_eq!(boot_sector.sectors_per_track(), 18);
    assert_eq!(boot_sector.number_of_heads(), 2);
    assert_eq!(boot_sector.hidden_sectors(), 0);
    assert_eq!(boot_sector.drive_number(), 0x80);
    assert_eq!(boot_sector.extended_boot_signature(), 0x29);
    assert_eq!(boot_sector.volume_id(), 0x12345678);
    assert_eq!(&boot_sector.volume_label(), b"MYVOL      ");
    assert_eq!(&boot_sector.filesystem_type(), b"FAT12   ");
    assert_eq!(boot_sector.signature(), BOOT_SIGNATURE);

    assert_eq!(boot_sector.fat_offset(), 512);
    assert_eq!(boot_sector.root_dir_offset(), 9728);
    assert_eq!(boot_sector.root_dir_length(), 7168);
}

#[test]
fn total_sector_fields() {
    for total_sectors in [1, 2880, 65535, 65536, 131072] {
        let boot_sector = boot_sector_of("SIZES", total_sectors);
        let bytes = boot_sector.bytes();

        assert_eq!(&bytes[510..], &[0x55, 0xAA]);
        assert_eq!(boot_sector.total_sectors(), total_sectors);

        if total_sectors > 65535 {
            assert_eq!(boot_sector.total_sectors_16(), 0);
            assert_eq!(boot_sector.total_sectors_32(), total_sectors);
        } else {
            assert_eq!(boot_sector.total_sectors_16() as u32, total_sectors);
            assert_eq!(boot_sector.total_sectors_32(), 0);
        }
    }
}

#[test]
fn serialized_layout() {
    let boot_sector = boot_sector_of("A LONGER LABEL", 131072);
    let bytes = boot_sector.bytes();

    assert_eq!(&bytes[19..21], &[0, 0]);
    assert_eq!(&bytes[32..36], &131072u32.to_le_bytes());
    assert_eq!(&bytes[39..43], &[0x78, 0x56, 0x34, 0x12]);
    assert_eq!(&bytes[43..54], b"A LONGER LA");
    assert_eq!(bytes[62], BOOT_CODE_FILL);

    let parsed = BootSector::from_bytes(bytes).unwrap();
    assert_eq!(parsed.total_sectors(), 131072);
}
