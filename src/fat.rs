use checked_num::CheckedU64;

use crate::{boot_sector::BootSector, error::LayoutError};

/// Mask of the 12 significant bits of an entry
const ENTRY_MASK: u16 = 0x0FFF;

/// A 12 bit FAT entry.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct FatEntry(pub u16);

impl FatEntry {
    /// The cluster is not allocated.
    pub const FREE: FatEntry = FatEntry(0);

    /// Entry `0`: the media descriptor in the low byte, all other bits set.
    pub fn media_type(media_descriptor: u8) -> FatEntry {
        Self(0x0F00 | media_descriptor as u16)
    }

    /// Marks the end of a cluster chain.
    pub fn eof() -> FatEntry {
        Self(0x0FFF)
    }

    /// Marks a cluster with a defective sector.
    pub fn bad() -> FatEntry {
        Self(0x0FF7)
    }

    pub fn value(self) -> u16 {
        self.0 & ENTRY_MASK
    }

    pub fn is_free(self) -> bool {
        self.value() == 0
    }

    pub fn is_eof(self) -> bool {
        self.value() >= 0x0FF8
    }
}

/// The allocation tables of a FAT12 image.
///
/// Entries are read from the first table. Every update is written to all copies so they never
/// diverge.
#[derive(Debug)]
pub struct Fat12Table<'a> {
    image: &'a mut [u8],
    offset: usize,
    length: usize,
    copies: u8,
}

impl<'a> Fat12Table<'a> {
    /// Locates the tables of `image` as described by `boot`. There must be at least one non-empty
    /// table and all copies must lie within the image.
    pub fn new(image: &'a mut [u8], boot: &BootSector) -> Result<Fat12Table<'a>, LayoutError> {
        let offset = boot.fat_offset();
        let length = boot.fat_length();
        let copies = boot.number_of_fats();
        if length == 0 || copies == 0 {
            return Err(LayoutError::NoAllocationTable { length, copies });
        }

        let expected = (CheckedU64::new(length as u64) * copies as u64 + offset as u64)
            .ok_or(LayoutError::Truncated {
                expected: usize::MAX,
                actual: image.len(),
            })?;
        if expected > image.len() as u64 {
            return Err(LayoutError::Truncated {
                expected: expected as usize,
                actual: image.len(),
            });
        }

        Ok(Self {
            image,
            offset,
            length,
            copies,
        })
    }

    /// Number of entries a single table holds.
    pub fn entry_count(&self) -> u32 {
        (self.length * 2 / 3) as u32
    }

    pub fn get(&self, cluster: u32) -> Result<FatEntry, LayoutError> {
        let position = self.position(cluster)?;
        let table = &self.image[self.offset..self.offset + self.length];
        let pair = u16::from_le_bytes([table[position], table[position + 1]]);

        let value = if cluster & 1 == 0 {
            pair & ENTRY_MASK
        } else {
            pair >> 4
        };
        Ok(FatEntry(value))
    }

    /// Stores `entry` for `cluster` in every copy of the table.
    pub fn set(&mut self, cluster: u32, entry: FatEntry) -> Result<(), LayoutError> {
        let position = self.position(cluster)?;
        let value = entry.value();

        for copy in 0..self.copies as usize {
            let start = self.offset + copy * self.length + position;
            let bytes = &mut self.image[start..start + 2];
            let pair = u16::from_le_bytes([bytes[0], bytes[1]]);

            // odd entries share their low nibble with the preceding even entry
            let pair = if cluster & 1 == 0 {
                (pair & !ENTRY_MASK) | value
            } else {
                (pair & 0x000F) | (value << 4)
            };
            bytes.copy_from_slice(&pair.to_le_bytes());
        }

        Ok(())
    }

    /// Whether all copies of the table hold the same bytes.
    pub fn copies_match(&self) -> bool {
        let mut tables = self.image[self.offset..]
            .chunks_exact(self.length)
            .take(self.copies as usize);

        match tables.next() {
            Some(first) => tables.all(|table| table == first),
            None => true,
        }
    }

    /// Byte offset of the entry pair holding `cluster` within a table.
    fn position(&self, cluster: u32) -> Result<usize, LayoutError> {
        if cluster >= self.entry_count() {
            return Err(LayoutError::ClusterOutOfRange(cluster));
        }
        Ok(cluster as usize * 3 / 2)
    }
}

#[cfg(test)]
fn test_boot_sector() -> BootSector {
    use crate::format::{Fat12, FormatVolumeOptionsBuilder};

    let format_options = FormatVolumeOptionsBuilder::default()
        .total_sectors(2880)
        .build()
        .unwrap();
    Fat12::try_from(format_options).unwrap().boot_sector()
}

#[test]
fn entry_packing() {
    let boot = test_boot_sector();
    let mut image = vec![0u8; 2880 * 512];
    let mut fat = Fat12Table::new(&mut image, &boot).unwrap();

    assert_eq!(fat.entry_count(), 3072);

    fat.set(2, FatEntry(0x123)).unwrap();
    fat.set(3, FatEntry(0x456)).unwrap();
    assert_eq!(fat.get(2).unwrap(), FatEntry(0x123));
    assert_eq!(fat.get(3).unwrap(), FatEntry(0x456));

    // overwriting one half of a pair leaves the other intact
    fat.set(2, FatEntry::eof()).unwrap();
    assert_eq!(fat.get(3).unwrap(), FatEntry(0x456));
    fat.set(3, FatEntry::FREE).unwrap();
    assert!(fat.get(2).unwrap().is_eof());
    assert!(fat.get(3).unwrap().is_free());

    fat.set(3071, FatEntry::bad()).unwrap();
    assert_eq!(fat.get(3071).unwrap(), FatEntry::bad());
    assert!(fat.copies_match());

    // cluster 2 starts 3 bytes into the first table
    assert_eq!(&image[512 + 3..512 + 5], &[0xFF, 0x0F]);
    assert_eq!(&image[512 + 9 * 512 + 3..512 + 9 * 512 + 5], &[0xFF, 0x0F]);
}

#[test]
fn media_type_entries() {
    let boot = test_boot_sector();
    let mut image = vec![0u8; 2880 * 512];
    let mut fat = Fat12Table::new(&mut image, &boot).unwrap();

    fat.set(0, FatEntry::media_type(0xF0)).unwrap();
    fat.set(1, FatEntry::eof()).unwrap();

    assert_eq!(fat.get(0).unwrap(), FatEntry(0xFF0));
    assert_eq!(&image[512..515], &[0xF0, 0xFF, 0xFF]);
}

#[test]
fn out_of_range() {
    let boot = test_boot_sector();
    let mut image = vec![0u8; 2880 * 512];
    let mut fat = Fat12Table::new(&mut image, &boot).unwrap();

    assert!(matches!(
        fat.get(3072),
        Err(LayoutError::ClusterOutOfRange(3072))
    ));
    assert!(fat.set(u32::MAX, FatEntry::eof()).is_err());

    let mut short = vec![0u8; 10 * 512];
    assert!(matches!(
        Fat12Table::new(&mut short, &boot),
        Err(LayoutError::Truncated {
            expected: 9728,
            actual: 5120
        })
    ));
}

#[test]
fn diverged_copies() {
    let boot = test_boot_sector();
    let mut image = vec![0u8; 2880 * 512];
    image[512 + 9 * 512 + 7] = 0x42;

    let fat = Fat12Table::new(&mut image, &boot).unwrap();
    assert!(!fat.copies_match());
}

#[test]
fn empty_tables() {
    let mut image = crate::format::build_image("NOFAT", 2880).unwrap();

    // zero sectors per FAT
    image[22..24].copy_from_slice(&[0, 0]);
    let boot = BootSector::from_bytes(&image).unwrap();
    assert!(matches!(
        Fat12Table::new(&mut image, &boot),
        Err(LayoutError::NoAllocationTable {
            length: 0,
            copies: 2
        })
    ));

    // no FAT copies
    image[22..24].copy_from_slice(&9u16.to_le_bytes());
    image[16] = 0;
    let boot = BootSector::from_bytes(&image).unwrap();
    assert!(matches!(
        Fat12Table::new(&mut image, &boot),
        Err(LayoutError::NoAllocationTable {
            length: 4608,
            copies: 0
        })
    ));
}
