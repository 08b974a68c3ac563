use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============ Domain Enumerations ============

/// Normalized account type for a credit account.
///
/// Free-text type strings from the bureau XML are folded into this closed set
/// by the extractor's substring normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Credit card accounts.
    CreditCard,
    /// Unsecured personal loans.
    PersonalLoan,
    /// Home / housing loans.
    HomeLoan,
    /// Auto / vehicle loans.
    AutoLoan,
    /// Anything that did not match a known category.
    Other,
}

/// Normalized lifecycle status of a credit account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account in good standing (also the default when the XML is silent).
    Active,
    /// Closed or terminated account.
    Closed,
    /// Temporarily suspended account.
    Suspended,
    /// Written-off account.
    WrittenOff,
}

/// Kind of address attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    /// Current residential address (default).
    Current,
    /// Previous address.
    Previous,
    /// Permanent address.
    Permanent,
}

/// Processing state of an uploaded report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Upload accepted, extraction in flight.
    Processing,
    /// Extraction and validation succeeded.
    Completed,
    /// Extraction or validation failed.
    Failed,
}

// ============ Report Entities ============

/// Aggregate counts and amounts from the report's summary section.
///
/// Every field defaults to zero when no candidate path resolves; a present
/// zero and an absent field are indistinguishable by design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Total number of accounts on file.
    pub total_accounts: i64,
    /// Number of currently active accounts.
    pub active_accounts: i64,
    /// Number of closed accounts.
    pub closed_accounts: i64,
    /// Sum of current balances across accounts.
    pub current_balance_amount: f64,
    /// Outstanding amount across secured accounts.
    pub secured_accounts_amount: f64,
    /// Outstanding amount across unsecured accounts.
    pub unsecured_accounts_amount: f64,
    /// Credit enquiries in the last 7 days.
    #[serde(rename = "last7DaysCreditEnquiries")]
    pub last_7_days_credit_enquiries: i64,
}

/// A single credit account extracted from the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditAccount {
    /// Account number, or the "N/A" sentinel when unresolvable.
    pub account_number: String,
    /// Normalized account type.
    pub account_type: AccountType,
    /// Lender name, or the "Unknown Bank" sentinel.
    pub bank_name: String,
    /// Current outstanding balance.
    pub current_balance: f64,
    /// Amount overdue.
    pub amount_overdue: f64,
    /// Sanctioned credit limit, when reported.
    pub credit_limit: Option<f64>,
    /// Normalized account status.
    pub account_status: AccountStatus,
    /// Date the account was opened, when parseable.
    pub opened_date: Option<NaiveDate>,
    /// Date of the last recorded payment, when parseable.
    pub last_payment_date: Option<NaiveDate>,
    /// Monthly EMI amount, when reported.
    pub emi_amount: Option<f64>,
}

/// A postal address extracted from the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Address kind.
    #[serde(rename = "type")]
    pub address_type: AddressType,
    /// Full address line, or the "N/A" sentinel.
    pub address: String,
    /// City, empty when absent.
    pub city: String,
    /// State, empty when absent.
    pub state: String,
    /// Postal PIN code, empty when absent.
    pub pincode: String,
    /// Country, defaulting to "India".
    pub country: String,
}

/// Validated output of one extraction run, before persistence metadata is
/// attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditReportData {
    /// Applicant name.
    pub name: String,
    /// Applicant mobile number, stored verbatim.
    pub mobile_phone: String,
    /// PAN, uppercase and pattern-checked.
    pub pan: String,
    /// Credit score in [300, 900].
    pub credit_score: i32,
    /// Summary aggregates.
    pub report_summary: ReportSummary,
    /// Extracted credit accounts; may be empty, never missing.
    pub credit_accounts: Vec<CreditAccount>,
    /// Extracted addresses; may be empty, never missing.
    pub addresses: Vec<Address>,
}

/// The persisted credit report entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditReportRecord {
    /// Generated identifier.
    pub id: Uuid,
    /// Applicant name.
    pub name: String,
    /// Applicant mobile number.
    pub mobile_phone: String,
    /// PAN, always uppercase for any persisted record.
    pub pan: String,
    /// Credit score, always in [300, 900] for any persisted record.
    pub credit_score: i32,
    /// Summary aggregates.
    pub report_summary: ReportSummary,
    /// Embedded credit accounts (owned, no independent lifecycle).
    pub credit_accounts: Vec<CreditAccount>,
    /// Embedded addresses.
    pub addresses: Vec<Address>,
    /// Report date, defaulting to extraction time.
    pub report_date: DateTime<Utc>,
    /// Name of the uploaded XML file.
    pub xml_file_name: String,
    /// Processing state of the upload.
    pub processing_status: ProcessingStatus,
    /// Failure reason, when processing failed.
    pub error_message: Option<String>,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update (bumped by the storage layer).
    pub updated_at: DateTime<Utc>,
}

impl CreditReportRecord {
    /// Builds a completed record from validated extraction output.
    pub fn from_extracted(data: CreditReportData, xml_file_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: data.name,
            mobile_phone: data.mobile_phone,
            pan: data.pan,
            credit_score: data.credit_score,
            report_summary: data.report_summary,
            credit_accounts: data.credit_accounts,
            addresses: data.addresses,
            report_date: now,
            xml_file_name: xml_file_name.to_string(),
            processing_status: ProcessingStatus::Completed,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// List-view projection of a report: everything except the embedded account
/// and address arrays, which are only needed on detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListItem {
    /// Record identifier.
    pub id: Uuid,
    /// Applicant name.
    pub name: String,
    /// Applicant mobile number.
    pub mobile_phone: String,
    /// PAN.
    pub pan: String,
    /// Credit score.
    pub credit_score: i32,
    /// Summary aggregates.
    pub report_summary: ReportSummary,
    /// Report date.
    pub report_date: DateTime<Utc>,
    /// Uploaded file name.
    pub xml_file_name: String,
    /// Processing state.
    pub processing_status: ProcessingStatus,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: DateTime<Utc>,
}

impl From<&CreditReportRecord> for ReportListItem {
    fn from(record: &CreditReportRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            mobile_phone: record.mobile_phone.clone(),
            pan: record.pan.clone(),
            credit_score: record.credit_score,
            report_summary: record.report_summary.clone(),
            report_date: record.report_date,
            xml_file_name: record.xml_file_name.clone(),
            processing_status: record.processing_status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

// ============ Query Parameters ============

/// Sortable columns for the report list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Sort by creation time (default).
    CreatedAt,
    /// Sort by report date.
    ReportDate,
    /// Sort by credit score.
    CreditScore,
}

/// Sort direction for the report list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending (default).
    Desc,
}

/// Query parameters for the paginated report list.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListQuery {
    /// 1-based page number.
    pub page: u64,
    /// Page size, 1..=100.
    pub limit: u64,
    /// Sort column.
    pub sort_by: SortField,
    /// Sort direction.
    pub sort_order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort_by: SortField::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

/// Pagination block returned alongside the report list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current 1-based page.
    pub current_page: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Total record count.
    pub total_count: u64,
    /// Whether a next page exists.
    pub has_next_page: bool,
    /// Whether a previous page exists.
    pub has_prev_page: bool,
    /// Page size used.
    pub limit: u64,
}
