// src/calendar.rs
use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;

/// A date in the Bikram Sambat calendar. Months run 1 (Baisakh) to 12 (Chaitra).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BsDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for BsDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{}", self.day, self.month, self.year)
    }
}

/// BS⇄AD primitive. `None` means the date does not exist or is out of range.
pub trait CalendarConverter: Send + Sync {
    fn to_ad(&self, date: BsDate) -> Option<NaiveDate>;
    fn from_ad(&self, date: NaiveDate) -> Option<BsDate>;
}

const FIRST_YEAR: i32 = 1975;

// Days per month for BS years 1975..=2100, as published in the Nepali calendar.
// Years after 2090 follow the projected almanac.
const MONTH_DAYS: [[u8; 12]; 126] = [
    [31, 31, 32, 32, 30, 31, 30, 29, 30, 29, 30, 30], // 1975
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [30, 32, 31, 32, 31, 31, 29, 30, 29, 30, 29, 31],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31], // 1980
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 30, 30], // 1985
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30], // 1990
    [31, 32, 31, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 30], // 1995
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31], // 2000
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30], // 2005
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 29, 31],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30], // 2010
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31], // 2015
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30], // 2020
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30], // 2025
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 32, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31], // 2030
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [30, 32, 31, 32, 31, 31, 29, 30, 30, 29, 29, 31], // 2035
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30], // 2040
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 29, 30, 29, 30, 30], // 2045
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31], // 2050
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30], // 2055
    [31, 31, 32, 31, 32, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30], // 2060
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [30, 32, 31, 32, 31, 31, 29, 30, 29, 30, 29, 31],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31], // 2065
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 29, 31],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 30, 30], // 2070
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30], // 2075
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 30], // 2080
    [31, 31, 32, 32, 31, 30, 30, 30, 29, 30, 30, 30],
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30],
    [31, 31, 32, 31, 31, 30, 30, 30, 29, 30, 30, 30],
    [31, 31, 32, 31, 31, 30, 30, 30, 29, 30, 30, 30],
    [31, 32, 31, 32, 30, 31, 30, 30, 29, 30, 30, 30], // 2085
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 30, 29, 30, 30, 30],
    [30, 31, 32, 32, 30, 31, 30, 30, 29, 30, 30, 30],
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30],
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30], // 2090
    [31, 31, 32, 31, 31, 31, 30, 30, 29, 30, 30, 30],
    [30, 31, 32, 32, 31, 30, 30, 30, 29, 30, 30, 30],
    [30, 32, 31, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 30, 30, 30, 29, 30, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 30, 30, 30], // 2095
    [30, 31, 32, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30],
    [31, 31, 32, 31, 31, 31, 29, 30, 29, 30, 30, 31],
    [31, 31, 32, 31, 31, 31, 30, 29, 29, 30, 30, 30],
    [31, 32, 31, 32, 30, 31, 30, 29, 30, 29, 30, 30], // 2100
];

/// Table-driven Bikram Sambat calendar anchored at 1 Baisakh 1975 = 13 April 1918.
#[derive(Clone, Copy, Debug, Default)]
pub struct BsCalendar;

impl BsCalendar {
    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(1918, 4, 13).unwrap_or_default()
    }

    fn months(year: i32) -> Option<&'static [u8; 12]> {
        let index = usize::try_from(year - FIRST_YEAR).ok()?;
        MONTH_DAYS.get(index)
    }

    fn year_length(months: &[u8; 12]) -> i64 {
        months.iter().map(|&d| i64::from(d)).sum()
    }

    pub fn last_year() -> i32 {
        FIRST_YEAR + MONTH_DAYS.len() as i32 - 1
    }

    pub fn is_valid(date: BsDate) -> bool {
        Self::months(date.year)
            .and_then(|m| m.get((date.month as usize).checked_sub(1)?))
            .is_some_and(|&len| date.day >= 1 && date.day <= u32::from(len))
    }
}

impl CalendarConverter for BsCalendar {
    fn to_ad(&self, date: BsDate) -> Option<NaiveDate> {
        if !Self::is_valid(date) {
            return None;
        }
        let mut offset: i64 = (FIRST_YEAR..date.year)
            .filter_map(Self::months)
            .map(Self::year_length)
            .sum();
        let months = Self::months(date.year)?;
        offset += months[..(date.month as usize - 1)]
            .iter()
            .map(|&d| i64::from(d))
            .sum::<i64>();
        offset += i64::from(date.day) - 1;
        Self::anchor().checked_add_signed(Duration::days(offset))
    }

    fn from_ad(&self, date: NaiveDate) -> Option<BsDate> {
        let mut remaining = (date - Self::anchor()).num_days();
        if remaining < 0 {
            return None;
        }
        for (index, months) in MONTH_DAYS.iter().enumerate() {
            let year_len = Self::year_length(months);
            if remaining >= year_len {
                remaining -= year_len;
                continue;
            }
            for (m, &len) in months.iter().enumerate() {
                let len = i64::from(len);
                if remaining < len {
                    return Some(BsDate {
                        year: FIRST_YEAR + index as i32,
                        month: m as u32 + 1,
                        day: remaining as u32 + 1,
                    });
                }
                remaining -= len;
            }
        }
        None
    }
}

/// Formats an AD date as `DD/MM/YYYY`.
pub fn format_ad(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month(), date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bs(year: i32, month: u32, day: u32) -> BsDate {
        BsDate { year, month, day }
    }

    fn ad(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_year_anchors() {
        let cal = BsCalendar;
        assert_eq!(cal.to_ad(bs(2000, 1, 1)), Some(ad(1943, 4, 14)));
        assert_eq!(cal.to_ad(bs(2057, 1, 1)), Some(ad(2000, 4, 13)));
        assert_eq!(cal.to_ad(bs(2078, 1, 1)), Some(ad(2021, 4, 14)));
        assert_eq!(cal.to_ad(bs(2080, 1, 1)), Some(ad(2023, 4, 14)));
        assert_eq!(cal.to_ad(bs(2081, 1, 1)), Some(ad(2024, 4, 13)));
    }

    #[test]
    fn from_ad_inverts_to_ad() {
        let cal = BsCalendar;
        assert_eq!(cal.from_ad(ad(2021, 4, 14)), Some(bs(2078, 1, 1)));
        assert_eq!(cal.from_ad(ad(2021, 4, 13)), Some(bs(2077, 12, 31)));
        for date in [bs(2078, 5, 15), bs(2045, 12, 30), bs(2000, 1, 1), bs(2090, 12, 30)] {
            let converted = cal.to_ad(date).expect("valid date");
            assert_eq!(cal.from_ad(converted), Some(date));
        }
    }

    #[test]
    fn rejects_impossible_dates() {
        let cal = BsCalendar;
        assert_eq!(cal.to_ad(bs(2078, 13, 1)), None);
        assert_eq!(cal.to_ad(bs(2078, 0, 1)), None);
        assert_eq!(cal.to_ad(bs(2078, 1, 0)), None);
        // Baisakh 2078 has 31 days
        assert_eq!(cal.to_ad(bs(2078, 1, 32)), None);
        assert!(cal.to_ad(bs(2078, 1, 31)).is_some());
    }

    #[test]
    fn table_spans_1975_to_2100() {
        let cal = BsCalendar;
        assert_eq!(cal.to_ad(bs(1975, 1, 1)), Some(ad(1918, 4, 13)));
        assert_eq!(cal.from_ad(ad(1918, 4, 13)), Some(bs(1975, 1, 1)));
        assert_eq!(cal.to_ad(bs(2100, 12, 30)), Some(ad(2044, 4, 12)));
        assert_eq!(cal.from_ad(ad(2044, 4, 12)), Some(bs(2100, 12, 30)));
        assert_eq!(BsCalendar::last_year(), 2100);

        for date in [ad(1935, 1, 1), ad(2035, 6, 15), ad(2040, 1, 1)] {
            let bs_date = cal.from_ad(date).expect("inside the table");
            assert_eq!(cal.to_ad(bs_date), Some(date));
        }
        assert!(cal.to_ad(bs(1990, 1, 1)).is_some());
        assert!(cal.to_ad(bs(2095, 1, 1)).is_some());
    }

    #[test]
    fn rejects_years_outside_table() {
        let cal = BsCalendar;
        assert_eq!(cal.to_ad(bs(1974, 12, 1)), None);
        assert_eq!(cal.to_ad(bs(2101, 1, 1)), None);
        assert_eq!(cal.from_ad(ad(1918, 4, 12)), None);
        assert_eq!(cal.from_ad(ad(2044, 4, 13)), None);
    }

    #[test]
    fn display_pads_day_and_month() {
        assert_eq!(bs(2078, 5, 3).to_string(), "03/05/2078");
        assert_eq!(format_ad(ad(2021, 8, 31)), "31/08/2021");
    }
}
