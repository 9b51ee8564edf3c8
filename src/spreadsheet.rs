// src/spreadsheet.rs
use calamine::{Data, DataType, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};
use std::io::Cursor;

use crate::converter::{Cell, Dataset};
use crate::error::AppError;

fn read_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => {
            data.as_datetime().map(Cell::DateTime).unwrap_or(Cell::Empty)
        }
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn header_name(data: &Data, index: usize) -> String {
    match data {
        Data::Empty => format!("Unnamed: {}", index),
        other => other.to_string(),
    }
}

/// Reads the first worksheet of an uploaded xls/xlsx body; the first row names the columns.
pub fn read_dataset(bytes: &[u8]) -> Result<Dataset, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        tracing::warn!(error = %e, size = bytes.len(), "unreadable workbook");
        AppError::InvalidFileFormat
    })?;
    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "unreadable worksheet");
            return Err(AppError::InvalidFileFormat);
        }
        None => return Err(AppError::InvalidFileFormat),
    };

    let mut rows = range.rows();
    let columns: Vec<String> = rows
        .next()
        .map(|header| {
            header
                .iter()
                .enumerate()
                .map(|(i, d)| header_name(d, i))
                .collect()
        })
        .unwrap_or_default();
    let rows = rows.map(|r| r.iter().map(read_cell).collect()).collect();
    Ok(Dataset { columns, rows })
}

fn excel_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    (*dt - epoch).num_milliseconds() as f64 / 86_400_000.0
}

/// Serializes a dataset as an `.xlsx` workbook with a single sheet.
pub fn to_xlsx_bytes(dataset: &Dataset) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let sheet = workbook.add_worksheet();

    for (c, name) in dataset.columns.iter().enumerate() {
        let col = u16::try_from(c).map_err(|_| AppError::InvalidFileFormat)?;
        sheet.write_string(0, col, name.as_str())?;
    }
    for (r, cells) in dataset.rows.iter().enumerate() {
        let row = u32::try_from(r + 1).map_err(|_| AppError::InvalidFileFormat)?;
        for (c, cell) in cells.iter().enumerate() {
            let col = u16::try_from(c).map_err(|_| AppError::InvalidFileFormat)?;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(row, col, s.as_str())?;
                }
                Cell::Int(i) => {
                    sheet.write_number(row, col, *i as f64)?;
                }
                Cell::Float(f) => {
                    sheet.write_number(row, col, *f)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                Cell::DateTime(dt) => {
                    sheet.write_number_with_format(row, col, excel_serial(dt), &date_format)?;
                }
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}
