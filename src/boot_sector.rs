use bytemuck::{Pod, Zeroable};

use crate::{
    SECTOR_SIZE,
    disk::{DiskIo, Drive},
    entry::DIR_ENTRY_SIZE,
    error::LayoutError,
    format::util::BOOT_SIGNATURE,
};

/// The boot sector of a FAT12 volume, including the BIOS Parameter Block and the extended boot
/// record. Multi-byte fields are stored little-endian, use the accessors to read them.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BootSector {
    /// Jump over the parameter block into `boot_code`.
    /// - `0xEB 0x3C 0x90` (short jump to offset `0x3E`, followed by a `NOP`).
    pub(crate) jump_boot: [u8; 3],

    /// Name of the system that formatted the volume, e.g. `"MSDOS5.0"`.
    pub(crate) oem_name: [u8; 8],

    /// Bytes per logical sector.
    pub(crate) bytes_per_sector: u16,

    /// Allocation unit size in sectors.
    pub(crate) sectors_per_cluster: u8,

    /// Sectors in front of the first FAT, the boot sector included.
    pub(crate) reserved_sectors: u16,

    /// Number of FAT copies.
    pub(crate) number_of_fats: u8,

    /// Number of 32 byte slots in the fixed size root directory.
    pub(crate) root_entries: u16,

    /// Total sector count if it fits into 16 bits, `0` otherwise.
    pub(crate) total_sectors_16: u16,

    /// Media descriptor, repeated in the low byte of FAT entry `0`.
    /// - `0xF0` for a 3.5" 1.44MB floppy.
    pub(crate) media_descriptor: u8,

    /// Length of a single FAT in sectors.
    pub(crate) sectors_per_fat: u16,

    /// CHS geometry: sectors per track.
    pub(crate) sectors_per_track: u16,

    /// CHS geometry: number of heads.
    pub(crate) number_of_heads: u16,

    /// Sectors preceding the volume on the medium.
    pub(crate) hidden_sectors: u32,

    /// Total sector count if it does not fit into `total_sectors_16`, `0` otherwise.
    pub(crate) total_sectors_32: u32,

    /// INT 13h drive number.
    /// - `0x80` for the first fixed disk.
    pub(crate) drive_number: u8,

    /// Reserved. Must be zero.
    pub(crate) _reserved: u8,

    /// Extended boot signature.
    /// - `0x29` marks the following three fields as present.
    pub(crate) extended_boot_signature: u8,

    /// Volume serial number.
    pub(crate) volume_id: u32,

    /// Volume label, padded with spaces.
    pub(crate) volume_label: [u8; 11],

    /// Informational filesystem type, `"FAT12   "`.
    pub(crate) filesystem_type: [u8; 8],

    /// Bootstrapping code executed after `jump_boot`.
    pub(crate) boot_code: [u8; 448],

    /// Identifies this sector as a boot sector.
    /// - Must be `0xAA55` to be considered valid.
    pub(crate) boot_signature: u16,
}

const _: () = assert!(size_of::<BootSector>() == SECTOR_SIZE);

impl BootSector {
    /// Parses a boot sector from the first 512 bytes of `bytes` and checks its signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<BootSector, LayoutError> {
        let bytes = bytes
            .get(..size_of::<BootSector>())
            .ok_or(LayoutError::Truncated {
                expected: size_of::<BootSector>(),
                actual: bytes.len(),
            })?;

        let boot_sector: BootSector = bytemuck::pod_read_unaligned(bytes);
        if boot_sector.signature() != BOOT_SIGNATURE {
            return Err(LayoutError::InvalidSignature(boot_sector.signature()));
        }

        Ok(boot_sector)
    }

    /// Reads sector `0` of the given drive and parses it.
    pub fn read_from<D: DiskIo + ?Sized>(disk: &D, drive: Drive) -> Result<BootSector, LayoutError> {
        let mut sector = [0u8; SECTOR_SIZE];
        disk.read(drive, &mut sector, 0, 1)?;

        Self::from_bytes(&sector)
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl BootSector {
    pub fn jump_boot(&self) -> [u8; 3] {
        self.jump_boot
    }

    pub fn oem_name(&self) -> [u8; 8] {
        self.oem_name
    }

    pub fn bytes_per_sector(&self) -> u16 {
        u16::from_le(self.bytes_per_sector)
    }

    pub fn sectors_per_cluster(&self) -> u8 {
        self.sectors_per_cluster
    }

    pub fn reserved_sectors(&self) -> u16 {
        u16::from_le(self.reserved_sectors)
    }

    pub fn number_of_fats(&self) -> u8 {
        self.number_of_fats
    }

    pub fn root_entries(&self) -> u16 {
        u16::from_le(self.root_entries)
    }

    pub fn total_sectors_16(&self) -> u16 {
        u16::from_le(self.total_sectors_16)
    }

    pub fn total_sectors_32(&self) -> u32 {
        u32::from_le(self.total_sectors_32)
    }

    /// The total sector count, taken from whichever of the two fields is in use.
    pub fn total_sectors(&self) -> u32 {
        match self.total_sectors_16() {
            0 => self.total_sectors_32(),
            short => short as u32,
        }
    }

    pub fn media_descriptor(&self) -> u8 {
        self.media_descriptor
    }

    pub fn sectors_per_fat(&self) -> u16 {
        u16::from_le(self.sectors_per_fat)
    }

    pub fn sectors_per_track(&self) -> u16 {
        u16::from_le(self.sectors_per_track)
    }

    pub fn number_of_heads(&self) -> u16 {
        u16::from_le(self.number_of_heads)
    }

    pub fn hidden_sectors(&self) -> u32 {
        u32::from_le(self.hidden_sectors)
    }

    pub fn drive_number(&self) -> u8 {
        self.drive_number
    }

    pub fn extended_boot_signature(&self) -> u8 {
        self.extended_boot_signature
    }

    pub fn volume_id(&self) -> u32 {
        u32::from_le(self.volume_id)
    }

    pub fn volume_label(&self) -> [u8; 11] {
        self.volume_label
    }

    pub fn filesystem_type(&self) -> [u8; 8] {
        self.filesystem_type
    }

    pub fn signature(&self) -> u16 {
        u16::from_le(self.boot_signature)
    }
}

// region layout, in bytes
impl BootSector {
    /// Offset of the first FAT.
    pub fn fat_offset(&self) -> usize {
        self.reserved_sectors() as usize * self.bytes_per_sector() as usize
    }

    /// Length of a single FAT.
    pub fn fat_length(&self) -> usize {
        self.sectors_per_fat() as usize * self.bytes_per_sector() as usize
    }

    /// Offset of the root directory, right behind the last FAT.
    pub fn root_dir_offset(&self) -> usize {
        self.fat_offset() + self.number_of_fats() as usize * self.fat_length()
    }

    /// Length of the root directory.
    pub fn root_dir_length(&self) -> usize {
        self.root_entries() as usize * DIR_ENTRY_SIZE
    }
}

#[test]
fn field_offsets() {
    use core::mem::offset_of;

    assert_eq!(offset_of!(BootSector, bytes_per_sector), 11);
    assert_eq!(offset_of!(BootSector, reserved_sectors), 14);
    assert_eq!(offset_of!(BootSector, root_entries), 17);
    assert_eq!(offset_of!(BootSector, total_sectors_16), 19);
    assert_eq!(offset_of!(BootSector, media_descriptor), 21);
    assert_eq!(offset_of!(BootSector, hidden_sectors), 28);
    assert_eq!(offset_of!(BootSector, total_sectors_32), 32);
    assert_eq!(offset_of!(BootSector, volume_id), 39);
    assert_eq!(offset_of!(BootSector, volume_label), 43);
    assert_eq!(offset_of!(BootSector, filesystem_type), 54);
    assert_eq!(offset_of!(BootSector, boot_code), 62);
    assert_eq!(offset_of!(BootSector, boot_signature), 510);
}

#[test]
fn rejects_bad_input() {
    assert!(matches!(
        BootSector::from_bytes(&[0u8; 100]),
        Err(LayoutError::Truncated {
            expected: 512,
            actual: 100
        })
    ));
    assert!(matches!(
        BootSector::from_bytes(&[0u8; SECTOR_SIZE]),
        Err(LayoutError::InvalidSignature(0))
    ));
}
