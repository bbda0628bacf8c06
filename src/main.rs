use std::fs::OpenOptions;

use fat12_ramdisk::{
    boot_sector::BootSector,
    disk::{DiskIo, Drive, IoctlCommand, ram::RamDisk},
    format::{Fat12, FormatVolumeOptionsBuilder, Label},
    timestamp::Timestamp,
};
use log::{LevelFilter, Log, Metadata, Record};

/// Prints records to stderr as "[LEVEL] message"
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn main() {
    log::set_logger(&LOGGER)
        .map(|()| {
            log::set_max_level(
                #[cfg(debug_assertions)]
                LevelFilter::Debug,
                #[cfg(not(debug_assertions))]
                LevelFilter::Info,
            )
        })
        .expect("Logger initialization failed");

    let format_options = FormatVolumeOptionsBuilder::default()
        .label(Label::new("MYVOL").unwrap())
        .total_sectors(2880)
        .timestamp(Timestamp::now().unwrap())
        .build()
        .unwrap();

    let formatter = Fat12::try_from(format_options).unwrap();
    let mut image = formatter.build().unwrap();

    let mut disk = RamDisk::new();
    disk.attach(&mut image);
    assert!(disk.initialize(Drive::Raw).is_ready());

    let boot_sector = BootSector::read_from(&disk, Drive::Raw).unwrap();
    println!(
        "label {:?}, {} sectors, {:?}",
        String::from_utf8_lossy(&boot_sector.volume_label()),
        boot_sector.total_sectors(),
        disk.ioctl(Drive::Raw, IoctlCommand::GetSectorCount).unwrap()
    );

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open("fat12.img")
        .unwrap();

    formatter.write(&mut file).unwrap();
    println!("done");
}
