//! Excel生成
//!
//! Worklistシート（明細または集約行）とSummaryシート（合計・レート）を出力する。

use crate::error::{RadRvuError, Result};
use rad_rvu_common::Session;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

impl From<XlsxError> for RadRvuError {
    fn from(e: XlsxError) -> Self {
        RadRvuError::ExcelGeneration(e.to_string())
    }
}

const HEADERS: &[&str] = &["CPT", "Description", "Qty", "wRVU", "Subtotal", "Confidence", "Source Text"];

pub fn generate_excel(session: &Session, output_path: &Path, consolidated: bool) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let number = Format::new().set_num_format("0.00");

    let sheet = workbook.add_worksheet();
    sheet.set_name("Worklist")?;
    write_worklist(sheet, session, consolidated, &bold, &number)?;

    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;
    write_summary(summary, session, &bold, &number)?;

    workbook.save(output_path)?;
    Ok(())
}

fn write_worklist(
    sheet: &mut Worksheet,
    session: &Session,
    consolidated: bool,
    bold: &Format,
    number: &Format,
) -> Result<()> {
    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, bold)?;
    }
    sheet.set_column_width(1, 40)?;
    sheet.set_column_width(6, 30)?;

    if consolidated {
        for (i, row) in session.consolidated_view().iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_string(r, 0, &row.code)?;
            sheet.write_string(r, 1, &row.description)?;
            sheet.write_number(r, 2, row.quantity)?;
            sheet.write_number_with_format(r, 3, row.value, number)?;
            sheet.write_number_with_format(r, 4, row.subtotal(), number)?;
            sheet.write_number_with_format(r, 5, row.confidence, number)?;
        }
    } else {
        for (i, entry) in session.worklist().entries().iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_string(r, 0, &entry.code)?;
            sheet.write_string(r, 1, &entry.description)?;
            sheet.write_number(r, 2, entry.quantity)?;
            sheet.write_number_with_format(r, 3, entry.value, number)?;
            sheet.write_number_with_format(r, 4, entry.subtotal(), number)?;
            sheet.write_number_with_format(r, 5, entry.confidence, number)?;
            sheet.write_string(r, 6, entry.source_text.as_deref().unwrap_or(""))?;
        }
    }
    Ok(())
}

fn write_summary(sheet: &mut Worksheet, session: &Session, bold: &Format, number: &Format) -> Result<()> {
    let totals = session.totals();
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();

    sheet.set_column_width(0, 24)?;
    sheet.write_string_with_format(0, 0, "Generated", bold)?;
    sheet.write_string(0, 1, &generated)?;
    sheet.write_string_with_format(1, 0, "Studies", bold)?;
    sheet.write_number(1, 1, totals.entry_count as f64)?;
    sheet.write_string_with_format(2, 0, "Total wRVU", bold)?;
    sheet.write_number_with_format(2, 1, totals.total_value, number)?;
    sheet.write_string_with_format(3, 0, "Rate ($ per RVU)", bold)?;
    sheet.write_number_with_format(3, 1, session.rate().value(), number)?;
    sheet.write_string_with_format(4, 0, "Estimated Earnings ($)", bold)?;
    sheet.write_number_with_format(4, 1, totals.total_earnings, number)?;
    Ok(())
}
