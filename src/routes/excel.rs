use std::io::Cursor;
use std::sync::OnceLock;

use axum::{
    Router,
    routing::{get, post},
    extract::{Extension, Multipart},
    http::{header, StatusCode},
    response::Json as RespJson,
};
use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use serde::Serialize;
use serde_json;
use sqlx::PgPool;

use crate::model::user::CreateUserRequest;
use crate::routes::users::is_unique_violation;
use crate::validation::validate_user;

const TEMPLATE_HEADERS: [&str; 5] = [
    "First Name",
    "Last Name",
    "Email",
    "Phone Number",
    "PAN Number",
];

const TEMPLATE_SAMPLE: [&str; 5] = [
    "Parichaye",
    "Grover",
    "parichaye@example.com",
    "1234567890",
    "ABCDE1234F",
];

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// Template workbook, generated once per process and reused afterwards.
static TEMPLATE_XLSX: OnceLock<Vec<u8>> = OnceLock::new();

// One failed spreadsheet row, numbered 1-based against the original file
#[derive(Debug, Serialize)]
struct RowError {
    row: u32,
    error: String,
}

// Everything found while scanning a workbook; nothing is persisted until
// the error list is known to be empty
struct ScanReport {
    users: Vec<CreateUserRequest>,
    errors: Vec<RowError>,
}

// Create excel router (template download + bulk upload)
pub fn excel_router() -> Router {
    Router::new()
        .route("/download-template", get(download_template))
        .route("/upload-excel", post(upload_excel))
}

fn build_template() -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, title) in TEMPLATE_HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }
    for (col, value) in TEMPLATE_SAMPLE.iter().enumerate() {
        sheet.write_string(1, col as u16, *value)?;
    }

    workbook.save_to_buffer()
}

fn template_bytes() -> Result<&'static Vec<u8>, rust_xlsxwriter::XlsxError> {
    if let Some(bytes) = TEMPLATE_XLSX.get() {
        return Ok(bytes);
    }
    let built = build_template()?;
    Ok(TEMPLATE_XLSX.get_or_init(|| built))
}

// Download Excel template
async fn download_template(
) -> Result<impl axum::response::IntoResponse, (StatusCode, RespJson<serde_json::Value>)> {
    let bytes = template_bytes().map_err(|e| {
        println!("🚨 Template generation error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            RespJson(serde_json::json!({
                "error": "Failed to generate template"
            })),
        )
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sample_template.xlsx\"",
            ),
        ],
        bytes.clone(),
    ))
}

// Spreadsheet cells arrive typed; a phone entered as a number comes back as
// a float, so integral floats lose the trailing ".0"
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

// Scan every data row of the first worksheet, validating each one and
// collecting row errors without short-circuiting. Row 1 is the header and
// is always skipped; reported row numbers are 1-based file positions.
fn scan_workbook(bytes: &[u8]) -> Result<ScanReport, String> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| format!("Could not read workbook: {}", e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "Workbook has no sheets".to_string())?
        .map_err(|e| format!("Could not read worksheet: {}", e))?;

    let first_row = range.start().map(|(row, _)| row).unwrap_or(0);

    let mut users = Vec::new();
    let mut errors = Vec::new();

    for (offset, row) in range.rows().enumerate() {
        let row_number = first_row + offset as u32 + 1;
        if row_number == 1 {
            continue;
        }

        let cells: Vec<String> = (0..5)
            .map(|i| row.get(i).map(cell_to_string).unwrap_or_default())
            .collect();

        let field_errors = validate_user(&cells[0], &cells[1], &cells[2], &cells[3], &cells[4]);
        if field_errors.is_empty() {
            users.push(CreateUserRequest {
                first_name: cells[0].clone(),
                last_name: cells[1].clone(),
                email: cells[2].clone(),
                phone: cells[3].clone(),
                pan: cells[4].clone(),
            });
        } else {
            let message = field_errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.error))
                .collect::<Vec<_>>()
                .join("; ");
            errors.push(RowError {
                row: row_number,
                error: message,
            });
        }
    }

    Ok(ScanReport { users, errors })
}

// Upload Excel for bulk insert
async fn upload_excel(
    Extension(pool): Extension<PgPool>,
    mut multipart: Multipart,
) -> Result<RespJson<serde_json::Value>, (StatusCode, RespJson<serde_json::Value>)> {
    let mut file_name: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        println!("🚨 Multipart read error: {}", e);
        (
            StatusCode::BAD_REQUEST,
            RespJson(serde_json::json!({
                "error": "Could not read upload"
            })),
        )
    })? {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field.bytes().await.map_err(|e| {
                println!("🚨 Failed to read uploaded file: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    RespJson(serde_json::json!({
                        "error": "Could not read uploaded file"
                    })),
                )
            })?;
            file_data = Some(bytes.to_vec());
        }
    }

    let data = file_data.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            RespJson(serde_json::json!({
                "error": "No 'file' field found in upload"
            })),
        )
    })?;

    if !file_name.unwrap_or_default().ends_with(".xlsx") {
        return Err((
            StatusCode::BAD_REQUEST,
            RespJson(serde_json::json!({
                "error": "File must be .xlsx format"
            })),
        ));
    }

    let report = scan_workbook(&data).map_err(|message| {
        println!("❌ Unreadable upload: {}", message);
        (
            StatusCode::BAD_REQUEST,
            RespJson(serde_json::json!({ "error": message })),
        )
    })?;

    // All-or-nothing: any row error voids the whole batch
    if !report.errors.is_empty() {
        println!("❌ Upload rejected with {} row errors", report.errors.len());
        return Err((
            StatusCode::BAD_REQUEST,
            RespJson(serde_json::json!({ "errors": report.errors })),
        ));
    }

    let mut tx = pool.begin().await.map_err(|e| {
        println!("🚨 Database error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            RespJson(serde_json::json!({
                "error": "Database error"
            })),
        )
    })?;

    for user in &report.users {
        sqlx::query(
            "INSERT INTO users (first_name, last_name, email, phone, pan)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.pan)
        .execute(&mut tx)
        .await
        .map_err(|e| {
            // dropping the transaction rolls the batch back
            if is_unique_violation(&e) {
                (
                    StatusCode::BAD_REQUEST,
                    RespJson(serde_json::json!({
                        "error": format!("User with email {} already exists", user.email)
                    })),
                )
            } else {
                println!("🚨 DATABASE INSERT ERROR: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RespJson(serde_json::json!({
                        "error": "Database error"
                    })),
                )
            }
        })?;
    }

    tx.commit().await.map_err(|e| {
        println!("🚨 Database error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            RespJson(serde_json::json!({
                "error": "Database error"
            })),
        )
    })?;

    println!("✅ {} users added from upload", report.users.len());
    Ok(RespJson(serde_json::json!({
        "message": format!("{} users successfully added.", report.users.len())
    })))
}
