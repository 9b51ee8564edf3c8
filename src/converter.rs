// src/converter.rs
use chrono::{NaiveDate, NaiveDateTime};

use crate::calendar::{BsDate, CalendarConverter, format_ad};
use crate::error::AppError;

/// A single spreadsheet cell as read from an uploaded workbook.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }
}

/// Header row plus data rows of the first worksheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    BsToAd,
    AdToBs,
}

impl Direction {
    /// Calendar the source column is expected to hold.
    pub fn source_label(self) -> &'static str {
        match self {
            Direction::BsToAd => "BS",
            Direction::AdToBs => "AD",
        }
    }

    pub fn output_column(self) -> &'static str {
        match self {
            Direction::BsToAd => "Converted_Date",
            Direction::AdToBs => "Miti",
        }
    }

    pub fn file_prefix(self) -> &'static str {
        match self {
            Direction::BsToAd => "converted_bs_to_ad_",
            Direction::AdToBs => "converted_ad_to_bs_",
        }
    }

    pub fn convert(self, calendar: &dyn CalendarConverter, cell: &Cell) -> Option<String> {
        match self {
            Direction::BsToAd => convert_bs_to_ad(calendar, cell),
            Direction::AdToBs => convert_ad_to_bs(calendar, cell),
        }
    }
}

/// Splits `D/M/Y` or `D-M-Y` text into its three numeric fields.
fn split_fields(raw: &str) -> Option<[i64; 3]> {
    let normalized = raw.replace('-', "/");
    let parts: Vec<&str> = normalized.trim().split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let mut fields = [0i64; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        *slot = part.trim().parse().ok()?;
    }
    Some(fields)
}

fn bs_date(year: i64, month: i64, day: i64) -> Option<BsDate> {
    Some(BsDate {
        year: i32::try_from(year).ok()?,
        month: u32::try_from(month).ok()?,
        day: u32::try_from(day).ok()?,
    })
}

/// Converts a BS text cell to an AD `DD/MM/YYYY` string. Native date cells are formatted as they are.
pub fn convert_bs_to_ad(calendar: &dyn CalendarConverter, cell: &Cell) -> Option<String> {
    if cell.is_missing() {
        return None;
    }
    let date = match cell {
        // a native date cell is already Gregorian
        Cell::DateTime(dt) => return Some(format_ad(dt.date())),
        Cell::Text(s) => {
            let [first, month, last] = split_fields(s)?;
            // year-first when the leading field can only be a year
            if first > 2000 {
                bs_date(first, month, last)?
            } else {
                bs_date(last, month, first)?
            }
        }
        _ => return None,
    };
    calendar.to_ad(date).map(format_ad)
}

/// Converts an AD cell (`DD/MM/YYYY` text or a native date) to a BS `DD/MM/YYYY` string.
pub fn convert_ad_to_bs(calendar: &dyn CalendarConverter, cell: &Cell) -> Option<String> {
    if cell.is_missing() {
        return None;
    }
    let date = match cell {
        Cell::DateTime(dt) => dt.date(),
        Cell::Text(s) => NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").ok()?,
        _ => return None,
    };
    calendar.from_ad(date).map(|bs| bs.to_string())
}

/// Index of the first column, scanning left to right, holding at least one convertible cell.
pub fn find_date_column(
    calendar: &dyn CalendarConverter,
    dataset: &Dataset,
    direction: Direction,
) -> Result<usize, AppError> {
    (0..dataset.columns.len())
        .find(|&col| {
            (0..dataset.rows.len()).any(|row| {
                let cell = dataset.cell(row, col);
                !cell.is_missing() && direction.convert(calendar, cell).is_some()
            })
        })
        .ok_or(AppError::NoDateColumnFound(direction))
}

/// Returns the dataset with the converted column added (or replaced, if the name is taken).
pub fn convert_dataset(
    calendar: &dyn CalendarConverter,
    mut dataset: Dataset,
    direction: Direction,
) -> Result<Dataset, AppError> {
    let source = find_date_column(calendar, &dataset, direction)?;
    let converted: Vec<Cell> = (0..dataset.rows.len())
        .map(|row| {
            direction
                .convert(calendar, dataset.cell(row, source))
                .map(Cell::Text)
                .unwrap_or(Cell::Empty)
        })
        .collect();

    let name = direction.output_column();
    let target = match dataset.columns.iter().position(|c| c == name) {
        Some(existing) => existing,
        None => {
            dataset.columns.push(name.to_string());
            dataset.columns.len() - 1
        }
    };
    for (row, value) in dataset.rows.iter_mut().zip(converted) {
        if row.len() <= target {
            row.resize(target + 1, Cell::Empty);
        }
        row[target] = value;
    }
    tracing::debug!(
        source_column = %dataset.columns[source],
        rows = dataset.rows.len(),
        output = name,
        "dataset converted"
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::BsCalendar;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn bs_to_ad(s: &str) -> Option<String> {
        convert_bs_to_ad(&BsCalendar, &text(s))
    }

    fn ad_to_bs(s: &str) -> Option<String> {
        convert_ad_to_bs(&BsCalendar, &text(s))
    }

    #[test]
    fn bs_to_ad_accepts_day_first_and_dashes() {
        assert_eq!(bs_to_ad("01/01/2078").as_deref(), Some("14/04/2021"));
        assert_eq!(bs_to_ad("1-1-2078").as_deref(), Some("14/04/2021"));
        assert_eq!(bs_to_ad(" 01/01/2078 ").as_deref(), Some("14/04/2021"));
    }

    #[test]
    fn bs_to_ad_reads_year_first_when_leading_field_exceeds_2000() {
        assert_eq!(bs_to_ad("2078/01/01").as_deref(), Some("14/04/2021"));
        assert_eq!(bs_to_ad("2078-05-15"), bs_to_ad("15/05/2078"));
    }

    #[test]
    fn bs_to_ad_produces_a_valid_ad_string() {
        let out = bs_to_ad("15/05/2078").expect("valid BS date");
        assert!(NaiveDate::parse_from_str(&out, "%d/%m/%Y").is_ok());
        assert_eq!(out.len(), 10);
    }

    #[test]
    fn bs_to_ad_soft_fails() {
        assert_eq!(bs_to_ad("99/99/2078"), None);
        assert_eq!(bs_to_ad("15/05"), None);
        assert_eq!(bs_to_ad("15/05/2078/1"), None);
        assert_eq!(bs_to_ad("ab/05/2078"), None);
        assert_eq!(bs_to_ad("   "), None);
        assert_eq!(convert_bs_to_ad(&BsCalendar, &Cell::Empty), None);
        assert_eq!(convert_bs_to_ad(&BsCalendar, &Cell::Float(2078.0)), None);
    }

    #[test]
    fn bs_to_ad_passes_native_dates_through() {
        let dt = NaiveDate::from_ymd_opt(2021, 4, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            convert_bs_to_ad(&BsCalendar, &Cell::DateTime(dt)).as_deref(),
            Some("14/04/2021")
        );
    }

    #[test]
    fn native_date_column_is_copied_as_ad() {
        let dt = NaiveDate::from_ymd_opt(2021, 4, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let ds = dataset(&["When"], vec![vec![Cell::DateTime(dt)]]);
        let out = convert_dataset(&BsCalendar, ds, Direction::BsToAd).unwrap();
        assert_eq!(out.rows[0][1], text("14/04/2021"));
    }

    #[test]
    fn ad_to_bs_converts_strict_day_first_text() {
        let out = ad_to_bs("15/01/2021").expect("valid AD date");
        assert_eq!(out, "02/10/2077");
        assert_eq!(ad_to_bs("14/04/2021").as_deref(), Some("01/01/2078"));
    }

    #[test]
    fn ad_to_bs_soft_fails() {
        assert_eq!(ad_to_bs("32/01/2021"), None);
        assert_eq!(ad_to_bs("2021-01-15"), None);
        assert_eq!(ad_to_bs("hello"), None);
        assert_eq!(ad_to_bs("01/01/1900"), None);
        assert_eq!(convert_ad_to_bs(&BsCalendar, &Cell::Int(44197)), None);
    }

    #[test]
    fn ad_to_bs_accepts_native_datetimes() {
        let dt = NaiveDate::from_ymd_opt(2021, 4, 14)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            convert_ad_to_bs(&BsCalendar, &Cell::DateTime(dt)).as_deref(),
            Some("01/01/2078")
        );
    }

    #[test]
    fn round_trip_returns_the_same_bs_day() {
        for bs in ["15/05/2078", "01/01/2000", "30/12/2090", "29/02/2060", "2045/12/30"] {
            let ad = bs_to_ad(bs).expect("valid BS date");
            let back = ad_to_bs(&ad).expect("valid AD date");
            assert_eq!(bs_to_ad(&back), Some(ad.clone()), "round trip of {bs}");
        }
        assert_eq!(
            ad_to_bs(&bs_to_ad("15/05/2078").unwrap()).as_deref(),
            Some("15/05/2078")
        );
    }

    fn dataset(columns: &[&str], rows: Vec<Vec<Cell>>) -> Dataset {
        Dataset {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn first_column_with_any_success_wins() {
        let ds = dataset(
            &["Name", "Notes", "Date"],
            vec![
                vec![text("Ram"), text("n/a"), text("01/01/2078")],
                vec![text("Sita"), text("15/05/2078"), text("02/01/2078")],
            ],
        );
        let col = find_date_column(&BsCalendar, &ds, Direction::BsToAd).expect("column");
        assert_eq!(col, 1);
    }

    #[test]
    fn no_parseable_column_is_an_error() {
        let ds = dataset(
            &["Name", "Amount"],
            vec![vec![text("Ram"), Cell::Float(10.5)], vec![Cell::Empty, Cell::Int(3)]],
        );
        let err = find_date_column(&BsCalendar, &ds, Direction::AdToBs).unwrap_err();
        assert!(matches!(err, AppError::NoDateColumnFound(Direction::AdToBs)));
        assert!(convert_dataset(&BsCalendar, ds, Direction::AdToBs).is_err());
    }

    #[test]
    fn convert_dataset_appends_column_with_empty_failures() {
        let ds = dataset(
            &["Date", "Amount"],
            vec![
                vec![text("14/04/2021"), Cell::Int(1)],
                vec![text("garbage"), Cell::Int(2)],
                vec![Cell::Empty],
            ],
        );
        let out = convert_dataset(&BsCalendar, ds, Direction::AdToBs).expect("converted");
        assert_eq!(out.columns, vec!["Date", "Amount", "Miti"]);
        assert_eq!(out.rows[0][2], text("01/01/2078"));
        assert_eq!(out.rows[1][2], Cell::Empty);
        assert_eq!(out.rows[2].len(), 3);
        assert_eq!(out.rows[2][2], Cell::Empty);
        assert_eq!(out.rows[0][1], Cell::Int(1));
    }

    #[test]
    fn convert_dataset_replaces_existing_output_column() {
        let ds = dataset(
            &["Miti", "Converted_Date"],
            vec![vec![text("01/01/2078"), text("old")]],
        );
        let out = convert_dataset(&BsCalendar, ds, Direction::BsToAd).expect("converted");
        assert_eq!(out.columns, vec!["Miti", "Converted_Date"]);
        assert_eq!(out.rows[0][1], text("14/04/2021"));
    }
}
