// volume geometry of a 1.44MB floppy

use crate::error::FormatError;

/// Sectors in front of the first FAT (only the boot sector)
pub const RESERVED_SECTORS: u16 = 1;
/// Number of FAT copies
pub const FAT_TABLE_COUNT: u8 = 2;
/// Length of each FAT (in sectors)
pub const FAT_SECTORS: u16 = 9;
/// Slots in the root directory
pub const ROOT_DIR_ENTRIES: u16 = 224;
pub const SECTORS_PER_CLUSTER: u8 = 1;
pub const SECTORS_PER_TRACK: u16 = 18;
pub const NUMBER_OF_HEADS: u16 = 2;
/// Media descriptor of a 3.5" high density floppy
pub const MEDIA_DESCRIPTOR: u8 = 0xF0;
pub const DRIVE_NUMBER: u8 = 0x80;
/// Largest sector count stored in the 16 bit total sector field
pub const MAX_SHORT_TOTAL_SECTORS: u32 = 0xFFFF;

pub const JUMP_BOOT: [u8; 3] = [0xEB, 0x3C, 0x90];
pub const OEM_NAME: [u8; 8] = *b"MSDOS5.0";
pub const FILESYSTEM_TYPE: [u8; 8] = *b"FAT12   ";
/// Marks the volume ID, label and filesystem type fields as present
pub const EXTENDED_BOOT_SIGNATURE: u8 = 0x29;
/// Signature of regular boot sector
pub const BOOT_SIGNATURE: u16 = 0xAA55;
/// Boot code filler (`HLT`), the boot jump lands on it
pub const BOOT_CODE_FILL: u8 = 0xF4;
pub const DEFAULT_VOLUME_ID: u32 = 0x12345678;

/// Maximum length of a volume label in bytes
pub const LABEL_LENGTH: usize = 11;

/// A volume label: up to 11 printable ASCII characters, padded with spaces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Label(pub(crate) [u8; LABEL_LENGTH]);

impl Label {
    /// Creates a label from `label`. Anything past the 11th character is dropped.
    pub fn new(label: &str) -> Result<Label, FormatError> {
        let bytes = label.as_bytes();
        if bytes.iter().any(|b| !b.is_ascii() || b.is_ascii_control()) {
            return Err(FormatError::InvalidLabel(label.to_string()));
        }

        let mut inner = [b' '; LABEL_LENGTH];
        let len = bytes.len().min(LABEL_LENGTH);
        inner[..len].copy_from_slice(&bytes[..len]);

        Ok(Label(inner))
    }

    pub fn as_bytes(&self) -> &[u8; LABEL_LENGTH] {
        &self.0
    }
}

impl Default for Label {
    fn default() -> Self {
        Label(*b"NO NAME    ")
    }
}

impl TryFrom<&str> for Label {
    type Error = FormatError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Label::new(value)
    }
}

#[test]
fn label_padding() {
    assert_eq!(Label::new("MYVOL").unwrap().as_bytes(), b"MYVOL      ");
    assert_eq!(Label::new("").unwrap().as_bytes(), b"           ");
    assert_eq!(Label::new("ABCDEFGHIJK").unwrap().as_bytes(), b"ABCDEFGHIJK");
}

#[test]
fn label_truncation() {
    assert_eq!(
        Label::new("A VERY LONG LABEL").unwrap().as_bytes(),
        b"A VERY LONG"
    );
}

#[test]
fn label_rejects_non_ascii() {
    assert!(matches!(
        Label::new("VOLUMÉ"),
        Err(FormatError::InvalidLabel(_))
    ));
    assert!(Label::new("TAB\tNAME").is_err());
}
