pub mod excel;

use crate::cli::ExportFormat;
use crate::error::Result;
use rad_rvu_common::{ConsolidatedRow, Session, Totals, WorklistEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 明細そのもの、または (コード, 説明) ごとの集約行
#[derive(Serialize)]
#[serde(untagged)]
enum JsonRows<'a> {
    Entries(&'a [WorklistEntry]),
    Consolidated(Vec<ConsolidatedRow>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    rate: f64,
    totals: Totals,
    consolidated: bool,
    entries: JsonRows<'a>,
}

fn output_path_for_format(output: &Path, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("worklist.{}", extension))
    } else {
        output.to_path_buf()
    }
}

pub fn export_worklist(
    session: &Session,
    format: &ExportFormat,
    output: &Path,
    consolidated: bool,
) -> Result<PathBuf> {
    match format {
        ExportFormat::Excel => {
            let output_path = output_path_for_format(output, "xlsx");
            excel::generate_excel(session, &output_path, consolidated)?;
            Ok(output_path)
        }
        ExportFormat::Json => {
            let output_path = output_path_for_format(output, "json");
            let report = JsonReport {
                rate: session.rate().value(),
                totals: session.totals(),
                consolidated,
                entries: if consolidated {
                    JsonRows::Consolidated(session.consolidated_view())
                } else {
                    JsonRows::Entries(session.worklist().entries())
                },
            };
            std::fs::write(&output_path, serde_json::to_string_pretty(&report)?)?;
            Ok(output_path)
        }
    }
}
