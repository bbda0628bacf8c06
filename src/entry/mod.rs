use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::{
    error::LayoutError,
    format::util::Label,
    timestamp::{Date, Time, Timestamp},
};

/// Size of a directory entry in bytes
pub const DIR_ENTRY_SIZE: usize = 32;
/// First name byte of a slot that was never used. No used slots follow it.
pub const END_OF_DIRECTORY: u8 = 0x00;
/// First name byte of a deleted entry
pub const DELETED_ENTRY_MARKER: u8 = 0xE5;

bitflags! {
    /// Attributes of a directory entry.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN = 0x02;
        const SYSTEM = 0x04;
        /// The entry holds the volume label in its name & extension.
        const VOLUME_LABEL = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE = 0x20;
    }
}

/// An 8.3 directory entry.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DirEntry {
    /// Base name, padded with spaces. The first byte doubles as slot marker.
    pub(crate) name: [u8; 8],
    /// Extension, padded with spaces.
    pub(crate) extension: [u8; 3],
    /// See [`Attributes`].
    pub(crate) attributes: u8,
    pub(crate) _reserved: u8,
    /// Creation time remainder in units of 10ms.
    pub(crate) create_time_tenths: u8,
    pub(crate) create_time: u16,
    pub(crate) create_date: u16,
    pub(crate) last_access_date: u16,
    /// Always `0` on FAT12.
    pub(crate) first_cluster_high: u16,
    pub(crate) write_time: u16,
    pub(crate) write_date: u16,
    pub(crate) first_cluster_low: u16,
    pub(crate) file_size: u32,
}

const _: () = assert!(size_of::<DirEntry>() == DIR_ENTRY_SIZE);

impl DirEntry {
    /// Creates an entry with all timestamps set to `timestamp`.
    pub fn new(
        name: [u8; 11],
        attributes: Attributes,
        first_cluster: u16,
        file_size: u32,
        timestamp: &Timestamp,
    ) -> DirEntry {
        let mut entry = Self::zeroed();
        entry.set_name(name);
        entry.attributes = attributes.bits();
        entry.create_time_tenths = timestamp.time().tenths();
        entry.create_time = timestamp.time().to_packed().to_le();
        entry.create_date = timestamp.date().to_packed().to_le();
        entry.last_access_date = timestamp.date().to_packed().to_le();
        entry.write_time = timestamp.time().to_packed().to_le();
        entry.write_date = timestamp.date().to_packed().to_le();
        entry.first_cluster_low = first_cluster.to_le();
        entry.file_size = file_size.to_le();
        entry
    }

    /// Creates the volume label entry. Only the last write time & date are recorded.
    pub fn volume_label(label: &Label, timestamp: &Timestamp) -> DirEntry {
        let mut entry = Self::zeroed();
        entry.set_name(*label.as_bytes());
        entry.attributes = Attributes::VOLUME_LABEL.bits();
        entry.write_time = timestamp.time().to_packed().to_le();
        entry.write_date = timestamp.date().to_packed().to_le();
        entry
    }

    /// Parses an entry from the first 32 bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<DirEntry, LayoutError> {
        bytes
            .get(..DIR_ENTRY_SIZE)
            .map(bytemuck::pod_read_unaligned)
            .ok_or(LayoutError::Truncated {
                expected: DIR_ENTRY_SIZE,
                actual: bytes.len(),
            })
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    fn set_name(&mut self, name: [u8; 11]) {
        self.name.copy_from_slice(&name[..8]);
        self.extension.copy_from_slice(&name[8..]);
    }
}

impl DirEntry {
    /// Name and extension as stored, 11 bytes without the dot.
    pub fn raw_name(&self) -> [u8; 11] {
        let mut name = [0u8; 11];
        name[..8].copy_from_slice(&{ self.name });
        name[8..].copy_from_slice(&{ self.extension });
        name
    }

    pub fn attributes(&self) -> Attributes {
        Attributes::from_bits_truncate(self.attributes)
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes().contains(Attributes::VOLUME_LABEL)
    }

    pub fn is_directory(&self) -> bool {
        self.attributes().contains(Attributes::DIRECTORY)
    }

    /// The slot has never been used, neither have the slots after it.
    pub fn is_end(&self) -> bool {
        self.name[0] == END_OF_DIRECTORY
    }

    pub fn is_deleted(&self) -> bool {
        self.name[0] == DELETED_ENTRY_MARKER
    }

    /// The slot can take a new entry.
    pub fn is_free(&self) -> bool {
        self.is_end() || self.is_deleted()
    }

    /// Frees the slot while leaving the rest of the entry intact.
    pub fn mark_deleted(&mut self) {
        self.name[0] = DELETED_ENTRY_MARKER;
    }

    pub fn first_cluster(&self) -> u32 {
        (u16::from_le(self.first_cluster_high) as u32) << 16
            | u16::from_le(self.first_cluster_low) as u32
    }

    pub fn file_size(&self) -> u32 {
        u32::from_le(self.file_size)
    }

    pub fn created(&self) -> Timestamp {
        Timestamp::new(
            Date::from_packed(u16::from_le(self.create_date)),
            Time::from_packed_with_tenths(u16::from_le(self.create_time), self.create_time_tenths),
        )
    }

    pub fn last_written(&self) -> Timestamp {
        Timestamp::new(
            Date::from_packed(u16::from_le(self.write_date)),
            Time::from_packed(u16::from_le(self.write_time)),
        )
    }

    pub fn last_accessed(&self) -> Date {
        Date::from_packed(u16::from_le(self.last_access_date))
    }
}

/// Iterates over the slots of a directory region, stopping at a trailing partial slot.
pub fn slots(region: &[u8]) -> impl Iterator<Item = DirEntry> + '_ {
    region
        .chunks_exact(DIR_ENTRY_SIZE)
        .map(bytemuck::pod_read_unaligned)
}

/// Index of the first slot of a directory region that can take a new entry.
pub fn first_free_slot(region: &[u8]) -> Option<usize> {
    slots(region).position(|entry| entry.is_free())
}

/// Index of the volume label entry of a directory region. Scanning ends at the first never used
/// slot.
pub fn find_volume_label(region: &[u8]) -> Option<usize> {
    slots(region)
        .take_while(|entry| !entry.is_end())
        .position(|entry| !entry.is_deleted() && entry.is_volume_label())
}

#[test]
fn field_offsets() {
    use core::mem::offset_of;

    assert_eq!(offset_of!(DirEntry, attributes), 11);
    assert_eq!(offset_of!(DirEntry, create_time_tenths), 13);
    assert_eq!(offset_of!(DirEntry, create_time), 14);
    assert_eq!(offset_of!(DirEntry, last_access_date), 18);
    assert_eq!(offset_of!(DirEntry, first_cluster_high), 20);
    assert_eq!(offset_of!(DirEntry, write_time), 22);
    assert_eq!(offset_of!(DirEntry, write_date), 24);
    assert_eq!(offset_of!(DirEntry, first_cluster_low), 26);
    assert_eq!(offset_of!(DirEntry, file_size), 28);
}

#[test]
fn volume_label_entry() {
    let label = Label::new("MYVOL").unwrap();
    let entry = DirEntry::volume_label(&label, &Timestamp::default());
    let bytes = entry.bytes();

    assert_eq!(&bytes[..11], b"MYVOL      ");
    assert_eq!(bytes[11], 0x08);
    // 12:00:00 and 2024-01-01
    assert_eq!(&bytes[22..24], &(12u16 << 11).to_le_bytes());
    assert_eq!(&bytes[24..26], &((44u16 << 9) | (1 << 5) | 1).to_le_bytes());
    assert!(bytes[12..22].iter().all(|&b| b == 0));
    assert!(bytes[26..].iter().all(|&b| b == 0));

    let parsed = DirEntry::from_bytes(bytes).unwrap();
    assert!(parsed.is_volume_label());
    assert!(!parsed.is_free());
    assert_eq!(parsed.last_written(), Timestamp::default());
}

#[test]
fn file_entry() {
    let timestamp = Timestamp::new(
        Date::new(2001, 9, 9).unwrap(),
        Time::with_millis(1, 46, 41, 730).unwrap(),
    );
    let entry = DirEntry::new(
        *b"README  TXT",
        Attributes::ARCHIVE | Attributes::READ_ONLY,
        5,
        1234,
        &timestamp,
    );

    assert_eq!(&entry.raw_name(), b"README  TXT");
    assert_eq!(entry.attributes(), Attributes::ARCHIVE | Attributes::READ_ONLY);
    assert_eq!(entry.first_cluster(), 5);
    assert_eq!(entry.file_size(), 1234);
    assert_eq!(entry.created(), timestamp);
    assert_eq!(entry.last_accessed(), timestamp.date());
    assert_eq!(entry.last_written().time().second(), 40);
}

#[test]
fn free_slots() {
    let timestamp = Timestamp::default();
    let mut region = [0u8; DIR_ENTRY_SIZE * 4];

    assert_eq!(first_free_slot(&region), Some(0));
    assert_eq!(find_volume_label(&region), None);

    let mut file = DirEntry::new(*b"A       BIN", Attributes::ARCHIVE, 2, 0, &timestamp);
    region[..DIR_ENTRY_SIZE].copy_from_slice(file.bytes());
    let label = DirEntry::volume_label(&Label::new("DISK").unwrap(), &timestamp);
    region[DIR_ENTRY_SIZE..2 * DIR_ENTRY_SIZE].copy_from_slice(label.bytes());

    assert_eq!(first_free_slot(&region), Some(2));
    assert_eq!(find_volume_label(&region), Some(1));

    file.mark_deleted();
    assert!(file.is_deleted() && file.is_free() && !file.is_end());
    region[..DIR_ENTRY_SIZE].copy_from_slice(file.bytes());
    assert_eq!(first_free_slot(&region), Some(0));
}

#[test]
fn truncated_entry() {
    assert!(matches!(
        DirEntry::from_bytes(&[0u8; 31]),
        Err(LayoutError::Truncated {
            expected: 32,
            actual: 31
        })
    ));
}
