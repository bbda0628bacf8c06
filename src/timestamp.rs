use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::FormatError;

/// First year representable in a packed date.
pub const FAT_EPOCH_YEAR: u16 = 1980;
/// Last year representable in a packed date (7 bit offset from the epoch).
pub const MAX_YEAR: u16 = FAT_EPOCH_YEAR + 0x7F;

const SECONDS_PER_DAY: u64 = 86_400;

/// A calendar date between 1980-01-01 and 2107-12-31.
///
/// Only the ranges of the individual components are checked, so `1999-02-31` is accepted like it
/// is by the on-disk encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    year: u16,
    month: u8,
    day: u8,
}

impl Date {
    pub fn new(year: u16, month: u8, day: u8) -> Result<Date, FormatError> {
        if !(FAT_EPOCH_YEAR..=MAX_YEAR).contains(&year)
            || !(1..=12).contains(&month)
            || !(1..=31).contains(&day)
        {
            return Err(FormatError::InvalidDate {
                year: year.into(),
                month,
                day,
            });
        }
        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    /// Packs the date as `YYYYYYYM MMMDDDDD`, the year counted from 1980.
    pub fn to_packed(self) -> u16 {
        (((self.year - FAT_EPOCH_YEAR) & 0x7F) << 9)
            | ((self.month as u16 & 0xF) << 5)
            | (self.day as u16 & 0x1F)
    }

    /// Unpacks a date word. No range checks are applied, a zeroed word yields month and day `0`.
    pub fn from_packed(packed: u16) -> Date {
        Self {
            year: FAT_EPOCH_YEAR + ((packed >> 9) & 0x7F),
            month: ((packed >> 5) & 0xF) as u8,
            day: (packed & 0x1F) as u8,
        }
    }
}

/// A time of day with millisecond precision.
///
/// The packed word only holds seconds at a 2 second resolution; the odd second and the
/// milliseconds go into the separate tenths byte (see [`Time::tenths`]).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    hour: u8,
    minute: u8,
    second: u8,
    millis: u16,
}

impl Time {
    pub fn new(hour: u8, minute: u8, second: u8) -> Result<Time, FormatError> {
        Self::with_millis(hour, minute, second, 0)
    }

    pub fn with_millis(hour: u8, minute: u8, second: u8, millis: u16) -> Result<Time, FormatError> {
        if hour > 23 || minute > 59 || second > 59 || millis > 999 {
            return Err(FormatError::InvalidTime {
                hour,
                minute,
                second,
                millis,
            });
        }
        Ok(Self {
            hour,
            minute,
            second,
            millis,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    pub fn millis(&self) -> u16 {
        self.millis
    }

    /// Packs the time as `HHHHHMMM MMMSSSSS`, seconds halved.
    pub fn to_packed(self) -> u16 {
        ((self.hour as u16 & 0x1F) << 11)
            | ((self.minute as u16 & 0x3F) << 5)
            | ((self.second as u16 / 2) & 0x1F)
    }

    /// The sub 2 second remainder in units of 10ms (`0..=199`).
    pub fn tenths(self) -> u8 {
        (((self.second as u16 & 1) * 1000 + self.millis) / 10) as u8
    }

    /// Unpacks a time word. The seconds come back rounded down to an even value.
    pub fn from_packed(packed: u16) -> Time {
        Self {
            hour: ((packed >> 11) & 0x1F) as u8,
            minute: ((packed >> 5) & 0x3F) as u8,
            second: ((packed & 0x1F) * 2) as u8,
            millis: 0,
        }
    }

    /// Unpacks a time word together with its tenths byte, restoring odd seconds and milliseconds
    /// at a 10ms resolution.
    pub fn from_packed_with_tenths(packed: u16, tenths: u8) -> Time {
        let mut time = Self::from_packed(packed);
        let tenths = tenths.min(199);
        time.second += tenths / 100;
        time.millis = (tenths % 100) as u16 * 10;
        time
    }
}

/// A date & time pair as stored in directory entries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    date: Date,
    time: Time,
}

/// Timestamp stamped onto a freshly built volume unless configured otherwise: 2024-01-01 12:00:00.
pub const CONSTRUCTION_TIMESTAMP: Timestamp = Timestamp {
    date: Date {
        year: 2024,
        month: 1,
        day: 1,
    },
    time: Time {
        hour: 12,
        minute: 0,
        second: 0,
        millis: 0,
    },
};

impl Default for Timestamp {
    fn default() -> Self {
        CONSTRUCTION_TIMESTAMP
    }
}

impl Timestamp {
    pub fn new(date: Date, time: Time) -> Timestamp {
        Self { date, time }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn time(&self) -> Time {
        self.time
    }

    /// The current UTC time of the system clock.
    pub fn now() -> Result<Timestamp, FormatError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?;
        Self::from_unix(now.as_secs(), now.subsec_millis() as u16)
    }

    /// Converts seconds since the unix epoch (UTC) into a timestamp. Fails for instants outside
    /// of the representable years.
    pub fn from_unix(secs: u64, millis: u16) -> Result<Timestamp, FormatError> {
        let (year, month, day) = civil_from_days(secs / SECONDS_PER_DAY);
        let year = u16::try_from(year).map_err(|_| FormatError::InvalidDate { year, month, day })?;
        let date = Date::new(year, month, day)?;

        let of_day = secs % SECONDS_PER_DAY;
        let time = Time::with_millis(
            (of_day / 3600) as u8,
            (of_day % 3600 / 60) as u8,
            (of_day % 60) as u8,
            millis,
        )?;

        Ok(Self { date, time })
    }
}

/// Converts days since 1970-01-01 into a proleptic gregorian `(year, month, day)`.
fn civil_from_days(days: u64) -> (u64, u8, u8) {
    // shift the epoch to 0000-03-01 so leap days end a year
    let z = days + 719_468;
    let era = z / 146_097;
    let day_of_era = z - era * 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = (day_of_year - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = year_of_era + era * 400 + u64::from(month <= 2);

    (year, month, day)
}

#[test]
fn date_round_trip() {
    for year in FAT_EPOCH_YEAR..=MAX_YEAR {
        for month in 1..=12 {
            for day in 1..=31 {
                let date = Date::new(year, month, day).unwrap();
                assert_eq!(Date::from_packed(date.to_packed()), date);
            }
        }
    }
}

#[test]
fn time_round_trip() {
    for hour in 0..=23 {
        for minute in 0..=59 {
            for second in 0..=59 {
                let decoded = Time::from_packed(Time::new(hour, minute, second).unwrap().to_packed());
                assert_eq!(decoded.hour(), hour);
                assert_eq!(decoded.minute(), minute);
                assert_eq!(decoded.second(), second & !1);
            }
        }
    }
}

#[test]
fn packed_layout() {
    let date = Date::new(2024, 1, 1).unwrap();
    assert_eq!(date.to_packed(), (44 << 9) | (1 << 5) | 1);

    let time = Time::new(12, 0, 0).unwrap();
    assert_eq!(time.to_packed(), 12 << 11);

    let time = Time::new(23, 59, 59).unwrap();
    assert_eq!(time.to_packed(), (23 << 11) | (59 << 5) | 29);
}

#[test]
fn tenths() {
    assert_eq!(Time::with_millis(0, 0, 0, 0).unwrap().tenths(), 0);
    assert_eq!(Time::with_millis(0, 0, 1, 0).unwrap().tenths(), 100);
    assert_eq!(Time::with_millis(0, 0, 3, 999).unwrap().tenths(), 199);
    assert_eq!(Time::with_millis(0, 0, 2, 250).unwrap().tenths(), 25);

    let time = Time::with_millis(8, 30, 17, 420).unwrap();
    let restored = Time::from_packed_with_tenths(time.to_packed(), time.tenths());
    assert_eq!(restored, time);
}

#[test]
fn out_of_range() {
    assert!(Date::new(1979, 12, 31).is_err());
    assert!(Date::new(2108, 1, 1).is_err());
    assert!(Date::new(2000, 13, 1).is_err());
    assert!(Date::new(2000, 1, 0).is_err());
    assert!(Time::new(24, 0, 0).is_err());
    assert!(Time::new(0, 60, 0).is_err());
    assert!(Time::with_millis(0, 0, 0, 1000).is_err());
}

#[test]
fn unix_conversion() {
    let timestamp = Timestamp::from_unix(1_704_110_400, 0).unwrap();
    assert_eq!(timestamp, CONSTRUCTION_TIMESTAMP);

    // 2000-02-29 23:59:58
    let leap = Timestamp::from_unix(951_868_798, 500).unwrap();
    assert_eq!(leap.date(), Date::new(2000, 2, 29).unwrap());
    assert_eq!(leap.time(), Time::with_millis(23, 59, 58, 500).unwrap());

    // 1979-12-31 is before the FAT epoch
    assert!(Timestamp::from_unix(315_532_799, 0).is_err());
    assert!(Timestamp::from_unix(315_532_800, 0).is_ok());
}

#[test]
fn system_clock() {
    let now = Timestamp::now().unwrap();
    assert!(now > CONSTRUCTION_TIMESTAMP);
}
