//! 课程热力图导出（XLSX）

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::error;

use super::CourseService;
use super::heatmap::load_heatmap;
use crate::models::courses::entities::HeatmapStatus;
use crate::models::courses::responses::CourseHeatmapResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{CourseAccess, current_user, load_course};
use crate::services::{storage_error, try_response};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub async fn export_heatmap(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    let course = try_response!(load_course(&storage, &user, course_id, CourseAccess::Manage).await);

    let heatmap = match load_heatmap(&storage, course).await {
        Ok(heatmap) => heatmap,
        Err(e) => {
            return Ok(storage_error(
                "Failed to build course heatmap",
                ErrorCode::InternalServerError,
                e,
            ));
        }
    };

    match generate_xlsx(&heatmap) {
        Ok(buffer) => {
            let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
            let filename = format!("course_{course_id}_heatmap_{timestamp}.xlsx");

            Ok(HttpResponse::Ok()
                .content_type(XLSX_CONTENT_TYPE)
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{filename}\""),
                ))
                .body(buffer))
        }
        Err(e) => {
            error!("Failed to generate heatmap workbook: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::ExportFailed,
                    "Failed to export course heatmap, please try again later",
                )),
            )
        }
    }
}

/// 生成 XLSX：提交矩阵与作业汇总两个工作表
pub(crate) fn generate_xlsx(heatmap: &CourseHeatmapResponse) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let matrix = workbook
        .add_worksheet()
        .set_name("Submissions")
        .map_err(|e| e.to_string())?;
    write_matrix_sheet(matrix, &header_format, heatmap)?;

    let summary = workbook
        .add_worksheet()
        .set_name("Assignments")
        .map_err(|e| e.to_string())?;
    write_summary_sheet(summary, &header_format, heatmap)?;

    workbook.save_to_buffer().map_err(|e| e.to_string())
}

/// 已评分显示分数，其余显示状态
fn cell_text(status: HeatmapStatus, score: Option<f64>) -> String {
    match (status, score) {
        (HeatmapStatus::Graded, Some(score)) => score.to_string(),
        (status, _) => status.as_str().to_string(),
    }
}

fn write_matrix_sheet(
    sheet: &mut Worksheet,
    header_format: &Format,
    heatmap: &CourseHeatmapResponse,
) -> Result<(), String> {
    sheet
        .write_string_with_format(0, 0, "Student", header_format)
        .map_err(|e| e.to_string())?;
    for (col, assignment) in heatmap.assignments.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16 + 1, &assignment.title, header_format)
            .map_err(|e| e.to_string())?;
    }

    for (row, student) in heatmap.rows.iter().enumerate() {
        let row = row as u32 + 1;
        sheet
            .write_string(row, 0, &student.student_name)
            .map_err(|e| e.to_string())?;
        for (col, cell) in student.cells.iter().enumerate() {
            let col = col as u16 + 1;
            match (cell.status, cell.score) {
                (HeatmapStatus::Graded, Some(score)) => {
                    sheet
                        .write_number(row, col, score)
                        .map_err(|e| e.to_string())?;
                }
                (status, score) => {
                    sheet
                        .write_string(row, col, cell_text(status, score))
                        .map_err(|e| e.to_string())?;
                }
            }
        }
    }

    sheet.set_column_width(0, 24).map_err(|e| e.to_string())?;
    Ok(())
}

fn write_summary_sheet(
    sheet: &mut Worksheet,
    header_format: &Format,
    heatmap: &CourseHeatmapResponse,
) -> Result<(), String> {
    for (col, title) in ["Assignment", "Deadline (UTC)", "Max score", "Submission rate"]
        .into_iter()
        .enumerate()
    {
        sheet
            .write_string_with_format(0, col as u16, title, header_format)
            .map_err(|e| e.to_string())?;
    }

    for (row, assignment) in heatmap.assignments.iter().enumerate() {
        let row = row as u32 + 1;
        sheet
            .write_string(row, 0, &assignment.title)
            .map_err(|e| e.to_string())?;
        sheet
            .write_string(row, 1, assignment.deadline.format("%Y-%m-%d %H:%M").to_string())
            .map_err(|e| e.to_string())?;
        sheet
            .write_number(row, 2, assignment.max_score)
            .map_err(|e| e.to_string())?;
        let percent = (assignment.submission_rate * 100.0 * 100.0).round() / 100.0;
        sheet
            .write_string(row, 3, format!("{percent}%"))
            .map_err(|e| e.to_string())?;
    }

    sheet.set_column_width(0, 30).map_err(|e| e.to_string())?;
    sheet.set_column_width(1, 20).map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::courses::heatmap::build_heatmap;
    use crate::services::courses::heatmap::tests::{assignment, course, student, submission};

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(HeatmapStatus::Graded, Some(7.5)), "7.5");
        assert_eq!(cell_text(HeatmapStatus::Late, None), "late");
        assert_eq!(cell_text(HeatmapStatus::Missing, None), "missing");
    }

    #[test]
    fn test_generate_xlsx_produces_zip() {
        let heatmap = build_heatmap(
            course(),
            vec![assignment(1, "ER model")],
            vec![student(2, "Ada")],
            vec![submission(1, 2, false, Some(9.0))],
        );
        let buffer = generate_xlsx(&heatmap).unwrap();
        // XLSX 为 ZIP 容器
        assert!(buffer.starts_with(b"PK"));
    }

    #[test]
    fn test_generate_xlsx_reports_cell_write_errors() {
        // 超过 Excel 单元格字符串长度上限
        let long_name = "x".repeat(40_000);
        let heatmap = build_heatmap(
            course(),
            vec![assignment(1, "ER model")],
            vec![student(2, &long_name)],
            vec![],
        );
        assert!(generate_xlsx(&heatmap).is_err());
    }
}
