//! Report persistence.
//!
//! Two interchangeable backends sit behind [`ReportStore`]: Postgres for real
//! deployments and an in-memory map for development and tests. The backend is
//! chosen once at startup and never changes for the life of the process.
//! Embedded collections (summary, accounts, addresses) are stored as JSONB
//! columns; list and lookup paths only touch the indexed scalar columns.

use crate::errors::AppError;
use crate::models::{
    CreditReportRecord, ListQuery, ProcessingStatus, ReportListItem, SortField, SortOrder,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS credit_reports (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    mobile_phone TEXT NOT NULL,
    pan TEXT NOT NULL,
    credit_score INTEGER NOT NULL,
    report_summary JSONB NOT NULL,
    credit_accounts JSONB NOT NULL,
    addresses JSONB NOT NULL,
    report_date TIMESTAMPTZ NOT NULL,
    xml_file_name TEXT NOT NULL,
    processing_status TEXT NOT NULL,
    error_message TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_credit_reports_pan ON credit_reports (pan);
CREATE INDEX IF NOT EXISTS idx_credit_reports_created_at ON credit_reports (created_at DESC);
CREATE INDEX IF NOT EXISTS idx_credit_reports_report_date ON credit_reports (report_date DESC);
"#;

/// In-memory backend: a map guarded by an async lock.
///
/// Holds records only for the life of the process; useful when no
/// DATABASE_URL is configured and in router tests.
#[derive(Default)]
pub struct MemoryStore {
    reports: RwLock<HashMap<Uuid, CreditReportRecord>>,
}

/// The storage handle shared across handlers.
pub enum ReportStore {
    Postgres(PgPool),
    Memory(MemoryStore),
}

impl ReportStore {
    /// Connects to Postgres, probes the connection, and ensures the schema.
    pub async fn connect_postgres(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&pool).await?;
        }

        tracing::info!("Connected to Postgres and ensured credit_reports schema");
        Ok(ReportStore::Postgres(pool))
    }

    /// Creates the in-memory backend.
    pub fn memory() -> Self {
        ReportStore::Memory(MemoryStore::default())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            ReportStore::Postgres(_) => "postgres",
            ReportStore::Memory(_) => "memory",
        }
    }

    /// Persists a new report record.
    pub async fn save(&self, record: &CreditReportRecord) -> Result<(), AppError> {
        match self {
            ReportStore::Postgres(pool) => {
                sqlx::query(
                    "INSERT INTO credit_reports \
                     (id, name, mobile_phone, pan, credit_score, report_summary, \
                      credit_accounts, addresses, report_date, xml_file_name, \
                      processing_status, error_message, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
                )
                .bind(record.id)
                .bind(&record.name)
                .bind(&record.mobile_phone)
                .bind(&record.pan)
                .bind(record.credit_score)
                .bind(to_json(&record.report_summary)?)
                .bind(to_json(&record.credit_accounts)?)
                .bind(to_json(&record.addresses)?)
                .bind(record.report_date)
                .bind(&record.xml_file_name)
                .bind(status_as_str(record.processing_status))
                .bind(&record.error_message)
                .bind(record.created_at)
                .bind(record.updated_at)
                .execute(pool)
                .await?;
                Ok(())
            }
            ReportStore::Memory(store) => {
                store
                    .reports
                    .write()
                    .await
                    .insert(record.id, record.clone());
                Ok(())
            }
        }
    }

    /// Fetches a full record by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CreditReportRecord>, AppError> {
        match self {
            ReportStore::Postgres(pool) => {
                let row = sqlx::query("SELECT * FROM credit_reports WHERE id = $1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;
                row.map(|r| record_from_row(&r)).transpose()
            }
            ReportStore::Memory(store) => Ok(store.reports.read().await.get(&id).cloned()),
        }
    }

    /// Total number of stored reports.
    pub async fn count(&self) -> Result<u64, AppError> {
        match self {
            ReportStore::Postgres(pool) => {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credit_reports")
                    .fetch_one(pool)
                    .await?;
                Ok(total as u64)
            }
            ReportStore::Memory(store) => Ok(store.reports.read().await.len() as u64),
        }
    }

    /// One page of list-view projections plus the total record count.
    pub async fn find_page(
        &self,
        query: &ListQuery,
    ) -> Result<(Vec<ReportListItem>, u64), AppError> {
        // Saturate throughout: page/limit come from the query string, and the
        // offset is later bound as i64 on the Postgres path.
        let offset = query
            .page
            .saturating_sub(1)
            .saturating_mul(query.limit)
            .min(i64::MAX as u64);
        let total = self.count().await?;
        match self {
            ReportStore::Postgres(pool) => {
                // Column and direction come from closed enums, never from the
                // raw query string.
                let sql = format!(
                    "SELECT * FROM credit_reports ORDER BY {} {} LIMIT $1 OFFSET $2",
                    sort_column(query.sort_by),
                    sort_direction(query.sort_order),
                );
                let rows = sqlx::query(&sql)
                    .bind(query.limit as i64)
                    .bind(offset as i64)
                    .fetch_all(pool)
                    .await?;
                let items = rows
                    .iter()
                    .map(|r| record_from_row(r).map(|rec| ReportListItem::from(&rec)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((items, total))
            }
            ReportStore::Memory(store) => {
                let reports = store.reports.read().await;
                let mut records: Vec<&CreditReportRecord> = reports.values().collect();
                sort_records(&mut records, query.sort_by, query.sort_order);
                let items = records
                    .into_iter()
                    .skip(offset as usize)
                    .take(query.limit as usize)
                    .map(ReportListItem::from)
                    .collect();
                Ok((items, total))
            }
        }
    }

    /// All reports for a PAN, newest report date first.
    pub async fn find_by_pan(&self, pan: &str) -> Result<Vec<CreditReportRecord>, AppError> {
        match self {
            ReportStore::Postgres(pool) => {
                let rows = sqlx::query(
                    "SELECT * FROM credit_reports WHERE pan = $1 ORDER BY report_date DESC",
                )
                .bind(pan)
                .fetch_all(pool)
                .await?;
                rows.iter().map(record_from_row).collect()
            }
            ReportStore::Memory(store) => {
                let reports = store.reports.read().await;
                let mut matches: Vec<CreditReportRecord> = reports
                    .values()
                    .filter(|r| r.pan == pan)
                    .cloned()
                    .collect();
                matches.sort_by(|a, b| b.report_date.cmp(&a.report_date));
                Ok(matches)
            }
        }
    }

    /// Most recent report for a PAN, by report date.
    pub async fn find_latest_by_pan(
        &self,
        pan: &str,
    ) -> Result<Option<CreditReportRecord>, AppError> {
        match self {
            ReportStore::Postgres(pool) => {
                let row = sqlx::query(
                    "SELECT * FROM credit_reports WHERE pan = $1 \
                     ORDER BY report_date DESC LIMIT 1",
                )
                .bind(pan)
                .fetch_optional(pool)
                .await?;
                row.map(|r| record_from_row(&r)).transpose()
            }
            ReportStore::Memory(store) => {
                let reports = store.reports.read().await;
                Ok(reports
                    .values()
                    .filter(|r| r.pan == pan)
                    .max_by_key(|r| r.report_date)
                    .cloned())
            }
        }
    }

    /// Deletes a record, returning it when it existed.
    pub async fn delete(&self, id: Uuid) -> Result<Option<CreditReportRecord>, AppError> {
        match self {
            ReportStore::Postgres(pool) => {
                let row = sqlx::query("DELETE FROM credit_reports WHERE id = $1 RETURNING *")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;
                row.map(|r| record_from_row(&r)).transpose()
            }
            ReportStore::Memory(store) => Ok(store.reports.write().await.remove(&id)),
        }
    }
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::CreatedAt => "created_at",
        SortField::ReportDate => "report_date",
        SortField::CreditScore => "credit_score",
    }
}

fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

fn sort_records(records: &mut [&CreditReportRecord], field: SortField, order: SortOrder) {
    records.sort_by(|a, b| {
        let ordering = match field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::ReportDate => a.report_date.cmp(&b.report_date),
            SortField::CreditScore => a.credit_score.cmp(&b.credit_score),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn status_as_str(status: ProcessingStatus) -> &'static str {
    match status {
        ProcessingStatus::Processing => "processing",
        ProcessingStatus::Completed => "completed",
        ProcessingStatus::Failed => "failed",
    }
}

fn status_from_str(s: &str) -> ProcessingStatus {
    match s {
        "processing" => ProcessingStatus::Processing,
        "failed" => ProcessingStatus::Failed,
        _ => ProcessingStatus::Completed,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::InternalError(format!("failed to serialize record field: {}", e)))
}

fn from_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::InternalError(format!("corrupt JSONB column: {}", e)))
}

fn record_from_row(row: &PgRow) -> Result<CreditReportRecord, AppError> {
    let status: String = row.try_get("processing_status")?;
    Ok(CreditReportRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        mobile_phone: row.try_get("mobile_phone")?,
        pan: row.try_get("pan")?,
        credit_score: row.try_get("credit_score")?,
        report_summary: from_json(row.try_get("report_summary")?)?,
        credit_accounts: from_json(row.try_get("credit_accounts")?)?,
        addresses: from_json(row.try_get("addresses")?)?,
        report_date: row.try_get("report_date")?,
        xml_file_name: row.try_get("xml_file_name")?,
        processing_status: status_from_str(&status),
        error_message: row.try_get("error_message")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_columns_are_whitelisted_identifiers() {
        for field in [
            SortField::CreatedAt,
            SortField::ReportDate,
            SortField::CreditScore,
        ] {
            let column = sort_column(field);
            assert!(column.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            ProcessingStatus::Processing,
            ProcessingStatus::Completed,
            ProcessingStatus::Failed,
        ] {
            assert_eq!(status_from_str(status_as_str(status)), status);
        }
    }
}
