use fat12_ramdisk::{
    SECTOR_SIZE,
    boot_sector::BootSector,
    disk::{DiskIo, DiskStatus, Drive, IoctlCommand, IoctlResponse, ram::RamDisk},
    entry::{DirEntry, find_volume_label},
    error::{DiskError, LayoutError, RES_NOTRDY, RES_PARERR},
    fat::{Fat12Table, FatEntry},
    format::build_image,
};

#[test]
fn mounted_floppy_reports_label() {
    let mut image = build_image("MYVOL", 2880).unwrap();
    let mut disk = RamDisk::new();
    disk.attach(&mut image);

    assert!(disk.initialize(Drive::Raw).is_ready());

    let boot_sector = BootSector::read_from(&disk, Drive::Raw).unwrap();
    assert_eq!(&boot_sector.volume_label(), b"MYVOL      ");

    let mut root = vec![0u8; SECTOR_SIZE];
    let root_sector = (boot_sector.root_dir_offset() / SECTOR_SIZE) as u64;
    disk.read(Drive::Raw, &mut root, root_sector, 1).unwrap();

    let entry = DirEntry::from_bytes(&root).unwrap();
    assert_eq!(&entry.raw_name(), b"MYVOL      ");
    assert!(entry.is_volume_label());
    assert_eq!(find_volume_label(&root), Some(0));

    assert_eq!(
        disk.ioctl(Drive::Raw, IoctlCommand::GetSectorCount),
        Ok(IoctlResponse::SectorCount(2880))
    );
}

#[test]
fn total_sector_rule() {
    for total_sectors in [1u32, 2880, 65536, 131072] {
        let image = build_image("SIZES", total_sectors).unwrap();
        assert_eq!(&image[510..512], &[0x55, 0xAA]);

        let short = u16::from_le_bytes([image[19], image[20]]);
        let long = u32::from_le_bytes([image[32], image[33], image[34], image[35]]);
        if total_sectors > 65535 {
            assert_eq!((short, long), (0, total_sectors));
        } else {
            assert_eq!((short as u32, long), (total_sectors, 0));
        }
    }
}

#[test]
fn allocation_tables_stay_in_sync() {
    let mut image = build_image("SYNC", 2880).unwrap();
    let boot_sector = BootSector::from_bytes(&image).unwrap();

    let mut fat = Fat12Table::new(&mut image, &boot_sector).unwrap();
    assert!(fat.copies_match());

    // a three cluster chain
    fat.set(2, FatEntry(3)).unwrap();
    fat.set(3, FatEntry(4)).unwrap();
    fat.set(4, FatEntry::eof()).unwrap();
    assert!(fat.copies_match());
    assert_eq!(fat.get(3).unwrap(), FatEntry(4));

    let first = boot_sector.fat_offset();
    let second = first + boot_sector.fat_length();
    assert_eq!(image[first..second], image[second..second + boot_sector.fat_length()]);
}

#[test]
fn driver_round_trip() {
    let mut image = build_image("DATA", 2880).unwrap();
    let mut disk = RamDisk::new();
    disk.attach(&mut image);

    let data_sector = 33;
    let payload = [0xC3u8; SECTOR_SIZE];
    disk.write(Drive::Raw, &payload, data_sector, 1).unwrap();
    disk.ioctl(Drive::Raw, IoctlCommand::Sync).unwrap();

    let mut read_back = [0u8; SECTOR_SIZE];
    disk.read(Drive::Raw, &mut read_back, data_sector, 1).unwrap();
    assert_eq!(read_back, payload);

    // the boot sector is untouched
    let boot_sector = BootSector::read_from(&disk, Drive::Raw).unwrap();
    assert_eq!(boot_sector.total_sectors(), 2880);

    let image = disk.detach().unwrap();
    assert_eq!(&image[33 * SECTOR_SIZE..34 * SECTOR_SIZE], &payload[..]);
}

#[test]
fn unmounted_drive() {
    let disk = RamDisk::new();

    assert_eq!(disk.status(Drive::Raw), DiskStatus::NOINIT);
    match BootSector::read_from(&disk, Drive::Raw) {
        Err(LayoutError::Disk(err)) => {
            assert_eq!(err, DiskError::NotInitialized(Drive::Raw));
            assert_eq!(err.result_code(), RES_NOTRDY);
        }
        other => panic!("expected a disk error, got {other:?}"),
    }
}

#[test]
fn last_sector_is_out_of_reach() {
    let mut image = build_image("EDGE", 2880).unwrap();
    let mut disk = RamDisk::new();
    disk.attach(&mut image);

    let mut buffer = [0u8; SECTOR_SIZE];
    assert!(disk.read(Drive::Raw, &mut buffer, 2878, 1).is_ok());

    let err = disk.read(Drive::Raw, &mut buffer, 2879, 1).unwrap_err();
    assert_eq!(err.result_code(), RES_PARERR);
}
