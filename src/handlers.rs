use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::extractor::{is_valid_pan, parse_credit_report};
use crate::models::{CreditReportRecord, ListQuery, Pagination};
use crate::storage::ReportStore;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Report storage backend (Postgres or in-memory).
    pub store: ReportStore,
    /// Application configuration.
    pub config: Config,
}

/// Builds the API router over the given state.
///
/// The health route is mounted separately by the binary so it stays outside
/// the rate-limited route group.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/credit-reports/upload", post(upload_report))
        .route("/api/credit-reports", get(list_reports))
        .route(
            "/api/credit-reports/pan/:pan/latest",
            get(get_latest_by_pan),
        )
        .route("/api/credit-reports/pan/:pan", get(get_reports_by_pan))
        .route(
            "/api/credit-reports/:id",
            get(get_report).delete(delete_report),
        )
        .with_state(state)
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "creditsea-api",
            "version": "0.1.0"
        })),
    )
}

/// GET /
///
/// Service banner with the available endpoints.
pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "message": "CreditSea API is running",
        "endpoints": {
            "upload": "POST /api/credit-reports/upload",
            "list": "GET /api/credit-reports",
            "detail": "GET /api/credit-reports/:id",
            "byPan": "GET /api/credit-reports/pan/:pan",
            "latestByPan": "GET /api/credit-reports/pan/:pan/latest",
            "delete": "DELETE /api/credit-reports/:id",
            "health": "GET /health"
        }
    }))
}

/// POST /api/credit-reports/upload
///
/// Accepts a multipart upload carrying one XML file in the `xmlFile` field,
/// runs the extraction pipeline, and persists the validated report. Rejected
/// uploads (wrong field, wrong type, empty file, malformed or invalid XML)
/// are not persisted.
pub async fn upload_report(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name != "xmlFile" {
            return Err(AppError::BadRequest(
                "Unexpected field name. Use \"xmlFile\" as the field name.".to_string(),
            ));
        }

        let file_name = field.file_name().unwrap_or("upload.xml").to_string();
        let content_type = field.content_type().map(str::to_string);
        if !is_xml_upload(&file_name, content_type.as_deref()) {
            return Err(AppError::BadRequest("Only XML files are allowed".to_string()));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read uploaded file: {}", e)))?;
        if data.len() > state.config.max_file_size {
            return Err(AppError::BadRequest(
                "File too large. Maximum size is 10MB.".to_string(),
            ));
        }

        upload = Some((file_name, data.to_vec()));
    }

    let (file_name, data) = upload.ok_or_else(|| {
        AppError::BadRequest("No file uploaded. Please upload an XML file.".to_string())
    })?;
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    tracing::info!("Processing uploaded XML file: {}", file_name);

    let extracted = parse_credit_report(&data, &file_name)?;
    let record = CreditReportRecord::from_extracted(extracted, &file_name);
    state
        .store
        .save(&record)
        .await
        .context("saving credit report")?;

    tracing::info!(
        "Credit report saved: id={}, pan={}, score={}",
        record.id,
        record.pan,
        record.credit_score
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Credit report processed successfully",
            "data": {
                "reportId": record.id,
                "pan": record.pan,
                "name": record.name,
                "creditScore": record.credit_score,
                "reportDate": record.report_date,
                "fileName": record.xml_file_name,
            }
        })),
    ))
}

/// GET /api/credit-reports
///
/// Paginated list of reports in the list-view projection (no embedded
/// account or address arrays).
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if query.page < 1 {
        return Err(AppError::BadRequest(
            "Page must be a positive integer".to_string(),
        ));
    }
    if query.limit < 1 || query.limit > 100 {
        return Err(AppError::BadRequest(
            "Limit must be between 1 and 100".to_string(),
        ));
    }

    let (reports, total_count) = state.store.find_page(&query).await?;
    let total_pages = if total_count == 0 {
        0
    } else {
        total_count.div_ceil(query.limit)
    };
    let pagination = Pagination {
        current_page: query.page,
        total_pages,
        total_count,
        has_next_page: query.page < total_pages,
        has_prev_page: query.page > 1,
        limit: query.limit,
    };

    Ok(Json(json!({
        "success": true,
        "data": {
            "reports": reports,
            "pagination": pagination,
        }
    })))
}

/// GET /api/credit-reports/:id
///
/// Full report detail, embedded collections included.
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_report_id(&id)?;
    let report = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Credit report not found".to_string()))?;

    Ok(Json(json!({ "success": true, "data": report })))
}

/// GET /api/credit-reports/pan/:pan
///
/// All reports for a PAN, newest report date first. An empty list is a
/// successful response, not a 404.
pub async fn get_reports_by_pan(
    State(state): State<Arc<AppState>>,
    Path(pan): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let pan = normalize_pan_param(&pan)?;
    let reports = state.store.find_by_pan(&pan).await?;
    let count = reports.len();

    Ok(Json(json!({
        "success": true,
        "data": {
            "pan": pan,
            "reports": reports,
            "count": count,
        }
    })))
}

/// GET /api/credit-reports/pan/:pan/latest
///
/// Most recent report for a PAN by report date; 404 when none exist.
pub async fn get_latest_by_pan(
    State(state): State<Arc<AppState>>,
    Path(pan): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let pan = normalize_pan_param(&pan)?;
    let report = state
        .store
        .find_latest_by_pan(&pan)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No credit reports found for PAN: {}", pan)))?;

    Ok(Json(json!({ "success": true, "data": report })))
}

/// DELETE /api/credit-reports/:id
///
/// Removes a report, echoing back its id and PAN.
pub async fn delete_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_report_id(&id)?;
    let deleted = state
        .store
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Credit report not found".to_string()))?;

    tracing::info!("Credit report deleted: id={}, pan={}", deleted.id, deleted.pan);

    Ok(Json(json!({
        "success": true,
        "message": "Credit report deleted successfully",
        "data": {
            "deletedId": deleted.id,
            "pan": deleted.pan,
        }
    })))
}

fn parse_report_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::BadRequest("Invalid report ID format".to_string()))
}

fn normalize_pan_param(raw: &str) -> Result<String, AppError> {
    let pan = raw.to_uppercase();
    if !is_valid_pan(&pan) {
        return Err(AppError::BadRequest("Invalid PAN format".to_string()));
    }
    Ok(pan)
}

// Content-type gate mirrors what browsers and HTTP clients actually send for
// XML uploads; a .xml extension is accepted even under a generic type.
fn is_xml_upload(file_name: &str, content_type: Option<&str>) -> bool {
    const ALLOWED: &[&str] = &[
        "application/xml",
        "text/xml",
        "application/xml-dtd",
        "text/plain",
    ];
    if let Some(ct) = content_type {
        if ALLOWED.contains(&ct) {
            return true;
        }
    }
    file_name.to_lowercase().ends_with(".xml")
}
