//! Credit report extraction pipeline.
//!
//! Turns a parsed XML tree into a validated [`CreditReportData`]. Bureau
//! exports disagree on tag names and nesting for the same logical field, so
//! every extractor probes an ordered list of candidate paths and takes the
//! first hit. Loose values are coerced (parse-or-zero for numbers,
//! parse-or-none for dates) and free-text type/status strings are folded into
//! closed enums before the validator gates the result.

use crate::models::{
    AccountStatus, AccountType, Address, AddressType, CreditAccount, CreditReportData,
    ReportSummary,
};
use crate::xml_tree::{parse_xml_tree, XmlTree, XmlValue};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Failure taxonomy for one extraction run.
///
/// Every failure is terminal for the invocation; there is no partial-success
/// mode and no internal retry.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// Malformed XML; nothing was extracted.
    Syntax(String),
    /// Shape assumption violated while walking the tree.
    Extraction(String),
    /// Business-rule violation on the extracted values, with the offending
    /// field names.
    Validation {
        /// Human-readable reason, surfaced verbatim to the caller.
        message: String,
        /// The fields that failed the check.
        fields: Vec<String>,
    },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Syntax(msg) => write!(f, "Failed to parse XML file: {}", msg),
            ExtractError::Extraction(msg) => write!(f, "Data extraction failed: {}", msg),
            ExtractError::Validation { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Parses and extracts a credit report from raw XML bytes.
///
/// The file name is used only for log attribution. The call is a pure
/// transformation: one buffer in, one validated record or terminal failure
/// out, no I/O, no shared state.
pub fn parse_credit_report(xml: &[u8], file_name: &str) -> Result<CreditReportData, ExtractError> {
    let tree = parse_xml_tree(xml).map_err(|e| {
        tracing::error!("Error parsing XML file {}: {}", file_name, e);
        ExtractError::Syntax(e)
    })?;

    tracing::info!("Successfully parsed XML file: {}", file_name);

    extract_credit_data(&tree).map_err(|e| {
        tracing::error!("Error extracting credit data from {}: {}", file_name, e);
        e
    })
}

/// Extracts and validates all report fields from a parsed tree.
pub fn extract_credit_data(tree: &XmlTree) -> Result<CreditReportData, ExtractError> {
    if tree.is_empty() {
        return Err(ExtractError::Extraction(
            "document has no extractable elements".to_string(),
        ));
    }

    let name = string_at(
        tree,
        &[&["personalinfo", "name"], &["applicant", "name"], &["name"]],
    );
    let mobile_phone = string_at(
        tree,
        &[
            &["personalinfo", "mobile"],
            &["applicant", "mobile"],
            &["mobile"],
        ],
    );
    let pan = string_at(
        tree,
        &[&["personalinfo", "pan"], &["applicant", "pan"], &["pan"]],
    );
    let credit_score = number_at(tree, &[&["creditscore"], &["score"], &["credit", "score"]]);

    let report_summary = extract_report_summary(tree);
    let credit_accounts = extract_credit_accounts(tree);
    let addresses = extract_addresses(tree);

    validate_report(
        name,
        mobile_phone,
        pan,
        credit_score,
        report_summary,
        credit_accounts,
        addresses,
    )
}

// ============ Path Resolver ============

/// Walks the tree one key at a time, returning the value at `path`.
///
/// Absence is a normal outcome: `None` is returned as soon as a key is
/// missing or the current node is not a mapping. Callers probe an ordered
/// candidate list, most-specific path first; the first hit wins.
pub fn resolve<'a>(tree: &'a XmlTree, path: &[&str]) -> Option<&'a XmlValue> {
    let (first, rest) = path.split_first()?;
    let mut current = tree.get(*first)?;
    for key in rest {
        current = current.as_node()?.get(*key)?;
    }
    Some(current)
}

// ============ Scalar Coercers ============

/// Numeric coercion: parse-or-zero.
///
/// Absent values, non-numeric strings, and non-scalar nodes all coerce to
/// 0.0 — never an error, never NaN. A genuine zero is therefore
/// indistinguishable from an absent field; fallback chains rely on this.
/// Trailing garbage after a numeric prefix is ignored, so "750 points"
/// coerces to 750 the way dirty bureau values are reported.
pub fn coerce_number(value: Option<&XmlValue>) -> f64 {
    value
        .and_then(XmlValue::as_scalar)
        .and_then(parse_number_prefix)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

// Longest leading float (sign, digits, fraction, exponent); None when the
// input doesn't start with a number.
fn parse_number_prefix(s: &str) -> Option<f64> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }
    if !bytes[digits_start..end].iter().any(u8::is_ascii_digit) {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok()
}

/// Date coercion: parse-or-none.
///
/// Unlike the numeric coercer there is no sentinel date; an unparsable value
/// yields `None`. Accepts RFC 3339 plus the date formats seen in bureau files.
pub fn coerce_date(value: Option<&XmlValue>) -> Option<NaiveDate> {
    parse_date_str(value?.as_scalar()?)
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// First non-empty scalar found across the candidate paths, trimmed.
fn string_at(tree: &XmlTree, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| resolve(tree, path))
        .filter_map(XmlValue::as_scalar)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First nonzero coercion across the candidate paths, else 0.
///
/// A resolved-but-zero value falls through to the next candidate, matching
/// the legacy fallback behavior this pipeline preserves.
fn number_at(tree: &XmlTree, paths: &[&[&str]]) -> f64 {
    paths
        .iter()
        .map(|path| coerce_number(resolve(tree, path)))
        .find(|v| *v != 0.0)
        .unwrap_or(0.0)
}

/// Scalar lookup over a single node with per-field tag synonyms.
fn node_string(node: &HashMap<String, XmlValue>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| node.get(*key))
        .filter_map(XmlValue::as_scalar)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn nonzero(v: f64) -> Option<f64> {
    if v == 0.0 {
        None
    } else {
        Some(v)
    }
}

// Empty scalars don't count as data when probing container paths.
fn has_data(value: &XmlValue) -> bool {
    !matches!(value, XmlValue::Scalar(s) if s.is_empty())
}

// ============ Field Extractors ============

fn extract_report_summary(tree: &XmlTree) -> ReportSummary {
    ReportSummary {
        total_accounts: number_at(
            tree,
            &[
                &["reportsummary", "totalaccounts"],
                &["summary", "totalaccounts"],
                &["totalaccounts"],
            ],
        ) as i64,
        active_accounts: number_at(
            tree,
            &[
                &["reportsummary", "activeaccounts"],
                &["summary", "activeaccounts"],
                &["activeaccounts"],
            ],
        ) as i64,
        closed_accounts: number_at(
            tree,
            &[
                &["reportsummary", "closedaccounts"],
                &["summary", "closedaccounts"],
                &["closedaccounts"],
            ],
        ) as i64,
        current_balance_amount: number_at(
            tree,
            &[
                &["reportsummary", "currentbalanceamount"],
                &["summary", "currentbalance"],
                &["currentbalance"],
            ],
        ),
        secured_accounts_amount: number_at(
            tree,
            &[
                &["reportsummary", "securedaccountsamount"],
                &["summary", "securedamount"],
                &["securedamount"],
            ],
        ),
        unsecured_accounts_amount: number_at(
            tree,
            &[
                &["reportsummary", "unsecuredaccountsamount"],
                &["summary", "unsecuredamount"],
                &["unsecuredamount"],
            ],
        ),
        last_7_days_credit_enquiries: number_at(
            tree,
            &[
                &["reportsummary", "recentenquiries"],
                &["summary", "recentenquiries"],
                &["recentenquiries"],
            ],
        ) as i64,
    }
}

const ACCOUNT_CONTAINER_PATHS: &[&[&str]] = &[
    &["creditaccounts", "account"],
    &["accounts", "account"],
    &["creditaccounts"],
    &["accounts"],
];

/// Extracts the credit account list.
///
/// The first container path that yields any data wins outright; later paths
/// are not probed even when the winner filters down to zero usable accounts.
/// A bare account object is treated as a one-element sequence; non-mapping
/// elements are silently skipped.
pub fn extract_credit_accounts(tree: &XmlTree) -> Vec<CreditAccount> {
    for path in ACCOUNT_CONTAINER_PATHS {
        if let Some(container) = resolve(tree, path).filter(|v| has_data(v)) {
            return container
                .iter_sequence()
                .into_iter()
                .filter_map(XmlValue::as_node)
                .map(account_from_node)
                .collect();
        }
    }
    Vec::new()
}

fn account_from_node(node: &HashMap<String, XmlValue>) -> CreditAccount {
    CreditAccount {
        account_number: node_string(node, &["accountnumber", "account_number", "number"])
            .unwrap_or_else(|| "N/A".to_string()),
        account_type: normalize_account_type(
            node_string(node, &["type", "accounttype"]).as_deref(),
        ),
        bank_name: node_string(node, &["bankname", "bank_name", "bank"])
            .unwrap_or_else(|| "Unknown Bank".to_string()),
        current_balance: coerce_number(node.get("currentbalance")),
        amount_overdue: coerce_number(node.get("amountoverdue")),
        // Zero from the coercer means "not reported" for optional amounts.
        credit_limit: nonzero(coerce_number(node.get("creditlimit"))),
        account_status: normalize_account_status(node_string(node, &["status"]).as_deref()),
        opened_date: node_string(node, &["openeddate", "opened_date"])
            .as_deref()
            .and_then(parse_date_str),
        last_payment_date: node_string(node, &["lastpaymentdate", "last_payment"])
            .as_deref()
            .and_then(parse_date_str),
        emi_amount: nonzero(coerce_number(node.get("emiamount"))),
    }
}

const ADDRESS_CONTAINER_PATHS: &[&[&str]] = &[
    &["addresses", "address"],
    &["address"],
    &["personalinfo", "addresses", "address"],
];

/// Extracts the address list; same first-path-wins shape as the accounts.
pub fn extract_addresses(tree: &XmlTree) -> Vec<Address> {
    for path in ADDRESS_CONTAINER_PATHS {
        if let Some(container) = resolve(tree, path).filter(|v| has_data(v)) {
            return container
                .iter_sequence()
                .into_iter()
                .filter_map(XmlValue::as_node)
                .map(address_from_node)
                .collect();
        }
    }
    Vec::new()
}

fn address_from_node(node: &HashMap<String, XmlValue>) -> Address {
    Address {
        address_type: normalize_address_type(node_string(node, &["type"]).as_deref()),
        address: node_string(node, &["address", "fulladdress"]).unwrap_or_else(|| "N/A".to_string()),
        city: node_string(node, &["city"]).unwrap_or_default(),
        state: node_string(node, &["state"]).unwrap_or_default(),
        pincode: node_string(node, &["pincode", "pin"]).unwrap_or_default(),
        country: node_string(node, &["country"]).unwrap_or_else(|| "India".to_string()),
    }
}

// ============ Normalizers ============

/// Maps a free-text account type onto the closed enum.
///
/// Ordered substring rules, first match wins; absent input defaults to
/// `Other` without matching.
pub fn normalize_account_type(raw: Option<&str>) -> AccountType {
    let Some(raw) = raw else {
        return AccountType::Other;
    };
    let t = raw.to_lowercase();
    if t.contains("credit") || t.contains("card") {
        AccountType::CreditCard
    } else if t.contains("personal") {
        AccountType::PersonalLoan
    } else if t.contains("home") || t.contains("housing") {
        AccountType::HomeLoan
    } else if t.contains("auto") || t.contains("vehicle") {
        AccountType::AutoLoan
    } else {
        AccountType::Other
    }
}

/// Maps a free-text account status onto the closed enum; absent input
/// defaults to `Active`.
pub fn normalize_account_status(raw: Option<&str>) -> AccountStatus {
    let Some(raw) = raw else {
        return AccountStatus::Active;
    };
    let s = raw.to_lowercase();
    if s.contains("closed") || s.contains("terminated") {
        AccountStatus::Closed
    } else if s.contains("suspended") {
        AccountStatus::Suspended
    } else if s.contains("written") || s.contains("off") {
        AccountStatus::WrittenOff
    } else {
        AccountStatus::Active
    }
}

fn normalize_address_type(raw: Option<&str>) -> AddressType {
    match raw.map(str::to_lowercase).as_deref() {
        Some("previous") => AddressType::Previous,
        Some("permanent") => AddressType::Permanent,
        _ => AddressType::Current,
    }
}

// ============ Validator ============

/// Checks a (pre-uppercased) PAN against the standard 5-letter, 4-digit,
/// 1-letter pattern. The pattern is compiled once and reused.
pub fn is_valid_pan(pan: &str) -> bool {
    static PAN_PATTERN: OnceLock<Regex> = OnceLock::new();
    PAN_PATTERN
        .get_or_init(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap())
        .is_match(pan)
}

/// Final gate: required-field presence, PAN pattern, score bounds.
///
/// A coerced score of 0 counts as missing. Any failure aborts the whole
/// extraction; partial records are never returned.
#[allow(clippy::too_many_arguments)]
fn validate_report(
    name: Option<String>,
    mobile_phone: Option<String>,
    pan: Option<String>,
    credit_score: f64,
    report_summary: ReportSummary,
    credit_accounts: Vec<CreditAccount>,
    addresses: Vec<Address>,
) -> Result<CreditReportData, ExtractError> {
    let mut missing: Vec<String> = Vec::new();
    if name.is_none() {
        missing.push("name".to_string());
    }
    if mobile_phone.is_none() {
        missing.push("mobilePhone".to_string());
    }
    if pan.is_none() {
        missing.push("pan".to_string());
    }
    if credit_score == 0.0 {
        missing.push("creditScore".to_string());
    }
    if !missing.is_empty() {
        return Err(ExtractError::Validation {
            message: format!("Missing required fields: {}", missing.join(", ")),
            fields: missing,
        });
    }

    let pan = pan.unwrap_or_default().to_uppercase();
    if !is_valid_pan(&pan) {
        return Err(ExtractError::Validation {
            message: "Invalid PAN format".to_string(),
            fields: vec!["pan".to_string()],
        });
    }

    if !(300.0..=900.0).contains(&credit_score) {
        return Err(ExtractError::Validation {
            message: "Credit score must be between 300 and 900".to_string(),
            fields: vec!["creditScore".to_string()],
        });
    }

    Ok(CreditReportData {
        name: name.unwrap_or_default(),
        mobile_phone: mobile_phone.unwrap_or_default(),
        pan,
        credit_score: credit_score as i32,
        report_summary,
        credit_accounts,
        addresses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml_tree::parse_xml_tree;

    fn tree_of(xml: &str) -> XmlTree {
        parse_xml_tree(xml.as_bytes()).expect("valid xml")
    }

    #[test]
    fn resolver_returns_higher_priority_path() {
        let tree = tree_of(
            "<r><personalinfo><name>Specific</name></personalinfo><name>Generic</name></r>",
        );
        let got = string_at(
            &tree,
            &[&["personalinfo", "name"], &["applicant", "name"], &["name"]],
        );
        assert_eq!(got.as_deref(), Some("Specific"));
    }

    #[test]
    fn resolver_falls_through_to_bare_tag() {
        let tree = tree_of("<r><name>Generic</name></r>");
        let got = string_at(
            &tree,
            &[&["personalinfo", "name"], &["applicant", "name"], &["name"]],
        );
        assert_eq!(got.as_deref(), Some("Generic"));
    }

    #[test]
    fn resolver_absence_is_none_not_error() {
        let tree = tree_of("<r><a>1</a></r>");
        assert!(resolve(&tree, &["b"]).is_none());
        assert!(resolve(&tree, &["a", "b"]).is_none());
        assert!(resolve(&tree, &["a", "b", "c"]).is_none());
    }

    #[test]
    fn numeric_coercion_is_parse_or_zero() {
        let n = XmlValue::Scalar("750".into());
        assert_eq!(coerce_number(Some(&n)), 750.0);
        let f = XmlValue::Scalar("123.45".into());
        assert_eq!(coerce_number(Some(&f)), 123.45);
        let junk = XmlValue::Scalar("abc".into());
        assert_eq!(coerce_number(Some(&junk)), 0.0);
        assert_eq!(coerce_number(None), 0.0);
        let nan = XmlValue::Scalar("NaN".into());
        assert_eq!(coerce_number(Some(&nan)), 0.0);
    }

    #[test]
    fn numeric_coercion_takes_the_leading_prefix() {
        let suffixed = XmlValue::Scalar("750 points".into());
        assert_eq!(coerce_number(Some(&suffixed)), 750.0);
        let lakh = XmlValue::Scalar("12.5L".into());
        assert_eq!(coerce_number(Some(&lakh)), 12.5);
        let signed = XmlValue::Scalar("-300.25 INR".into());
        assert_eq!(coerce_number(Some(&signed)), -300.25);
        let exponent = XmlValue::Scalar("1e3 approx".into());
        assert_eq!(coerce_number(Some(&exponent)), 1000.0);
        // Prefix must start the value; a currency symbol kills the parse.
        let prefixed = XmlValue::Scalar("Rs 45000".into());
        assert_eq!(coerce_number(Some(&prefixed)), 0.0);
        let dot_only = XmlValue::Scalar(".-5".into());
        assert_eq!(coerce_number(Some(&dot_only)), 0.0);
    }

    #[test]
    fn date_coercion_is_parse_or_none() {
        let iso = XmlValue::Scalar("2020-01-15".into());
        assert_eq!(
            coerce_date(Some(&iso)),
            NaiveDate::from_ymd_opt(2020, 1, 15)
        );
        let indian = XmlValue::Scalar("15/01/2020".into());
        assert_eq!(
            coerce_date(Some(&indian)),
            NaiveDate::from_ymd_opt(2020, 1, 15)
        );
        let junk = XmlValue::Scalar("not a date".into());
        assert_eq!(coerce_date(Some(&junk)), None);
        assert_eq!(coerce_date(None), None);
    }

    #[test]
    fn account_type_normalization_table() {
        assert_eq!(
            normalize_account_type(Some("Credit Card")),
            AccountType::CreditCard
        );
        assert_eq!(
            normalize_account_type(Some("HOUSING LOAN")),
            AccountType::HomeLoan
        );
        assert_eq!(
            normalize_account_type(Some("personal loan")),
            AccountType::PersonalLoan
        );
        assert_eq!(
            normalize_account_type(Some("Vehicle Finance")),
            AccountType::AutoLoan
        );
        assert_eq!(normalize_account_type(Some("foo")), AccountType::Other);
        assert_eq!(normalize_account_type(None), AccountType::Other);
    }

    #[test]
    fn type_rules_apply_in_fixed_order() {
        // "card" matches before "personal" ever gets a look.
        assert_eq!(
            normalize_account_type(Some("personal card")),
            AccountType::CreditCard
        );
    }

    #[test]
    fn account_status_normalization_table() {
        assert_eq!(
            normalize_account_status(Some("Closed")),
            AccountStatus::Closed
        );
        assert_eq!(
            normalize_account_status(Some("TERMINATED")),
            AccountStatus::Closed
        );
        assert_eq!(
            normalize_account_status(Some("suspended")),
            AccountStatus::Suspended
        );
        assert_eq!(
            normalize_account_status(Some("written off")),
            AccountStatus::WrittenOff
        );
        assert_eq!(
            normalize_account_status(Some("current")),
            AccountStatus::Active
        );
        assert_eq!(normalize_account_status(None), AccountStatus::Active);
    }

    #[test]
    fn missing_required_fields_are_listed_together() {
        let tree = tree_of("<r><name>John</name></r>");
        let err = extract_credit_data(&tree).unwrap_err();
        match err {
            ExtractError::Validation { message, fields } => {
                assert_eq!(fields, vec!["mobilePhone", "pan", "creditScore"]);
                assert!(message.contains("mobilePhone"));
                assert!(message.contains("creditScore"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_score_is_rejected() {
        let tree = tree_of(
            "<r><name>John</name><mobile>9876543210</mobile><pan>ABCDE1234F</pan><creditscore>950</creditscore></r>",
        );
        let err = extract_credit_data(&tree).unwrap_err();
        match err {
            ExtractError::Validation { message, fields } => {
                assert!(message.contains("between 300 and 900"));
                assert_eq!(fields, vec!["creditScore"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn lowercase_pan_passes_after_normalization() {
        let tree = tree_of(
            "<r><name>John</name><mobile>9876543210</mobile><pan>abcde1234f</pan><creditscore>700</creditscore></r>",
        );
        let data = extract_credit_data(&tree).expect("lowercase pan normalizes");
        assert_eq!(data.pan, "ABCDE1234F");
    }

    #[test]
    fn malformed_pan_is_rejected() {
        let tree = tree_of(
            "<r><name>John</name><mobile>9876543210</mobile><pan>AB1234567Z</pan><creditscore>700</creditscore></r>",
        );
        let err = extract_credit_data(&tree).unwrap_err();
        match err {
            ExtractError::Validation { message, .. } => {
                assert_eq!(message, "Invalid PAN format");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn first_account_container_path_wins_outright() {
        // creditaccounts.account resolves to a scalar: the path "wins" but
        // filters to zero accounts, and accounts.account is never probed.
        let tree = tree_of(
            "<r><creditaccounts><account>garbage</account></creditaccounts>\
             <accounts><account><number>123</number></account></accounts></r>",
        );
        assert!(extract_credit_accounts(&tree).is_empty());
    }

    #[test]
    fn bare_account_object_becomes_one_element_list() {
        let tree = tree_of(
            "<r><creditaccounts><account><accountnumber>AC1</accountnumber><bankname>HDFC</bankname></account></creditaccounts></r>",
        );
        let accounts = extract_credit_accounts(&tree);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_number, "AC1");
        assert_eq!(accounts[0].bank_name, "HDFC");
    }

    #[test]
    fn account_sentinels_fill_unresolvable_fields() {
        let tree = tree_of(
            "<r><creditaccounts><account><somefield>x</somefield></account></creditaccounts></r>",
        );
        let accounts = extract_credit_accounts(&tree);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_number, "N/A");
        assert_eq!(accounts[0].bank_name, "Unknown Bank");
        assert_eq!(accounts[0].account_type, AccountType::Other);
        assert_eq!(accounts[0].account_status, AccountStatus::Active);
        assert_eq!(accounts[0].current_balance, 0.0);
        assert_eq!(accounts[0].credit_limit, None);
        assert_eq!(accounts[0].emi_amount, None);
    }

    #[test]
    fn account_field_synonyms_resolve() {
        let tree = tree_of(
            "<r><accounts><account><account_number>XY9</account_number><bank>SBI</bank>\
             <accounttype>home loan</accounttype><opened_date>2019-06-01</opened_date></account></accounts></r>",
        );
        let accounts = extract_credit_accounts(&tree);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_number, "XY9");
        assert_eq!(accounts[0].bank_name, "SBI");
        assert_eq!(accounts[0].account_type, AccountType::HomeLoan);
        assert_eq!(
            accounts[0].opened_date,
            NaiveDate::from_ymd_opt(2019, 6, 1)
        );
    }

    #[test]
    fn zero_credit_limit_is_not_reported() {
        let tree = tree_of(
            "<r><creditaccounts><account><creditlimit>0</creditlimit><emiamount>2500</emiamount></account></creditaccounts></r>",
        );
        let accounts = extract_credit_accounts(&tree);
        assert_eq!(accounts[0].credit_limit, None);
        assert_eq!(accounts[0].emi_amount, Some(2500.0));
    }

    #[test]
    fn addresses_extract_with_defaults() {
        let tree = tree_of(
            "<r><addresses><address><type>permanent</type><address>12 MG Road</address>\
             <city>Pune</city><pin>411001</pin></address></addresses></r>",
        );
        let addresses = extract_addresses(&tree);
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].address_type, AddressType::Permanent);
        assert_eq!(addresses[0].address, "12 MG Road");
        assert_eq!(addresses[0].city, "Pune");
        assert_eq!(addresses[0].state, "");
        assert_eq!(addresses[0].pincode, "411001");
        assert_eq!(addresses[0].country, "India");
    }

    #[test]
    fn address_under_personalinfo_is_found() {
        let tree = tree_of(
            "<r><personalinfo><addresses><address><fulladdress>4 Park St</fulladdress></address></addresses></personalinfo></r>",
        );
        let addresses = extract_addresses(&tree);
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].address, "4 Park St");
        assert_eq!(addresses[0].address_type, AddressType::Current);
    }

    #[test]
    fn summary_falls_back_across_tiers() {
        let tree = tree_of(
            "<r><reportsummary><totalaccounts>5</totalaccounts></reportsummary>\
             <summary><activeaccounts>3</activeaccounts></summary>\
             <currentbalance>125000.50</currentbalance></r>",
        );
        let summary = extract_report_summary(&tree);
        assert_eq!(summary.total_accounts, 5);
        assert_eq!(summary.active_accounts, 3);
        assert_eq!(summary.current_balance_amount, 125000.50);
        assert_eq!(summary.closed_accounts, 0);
        assert_eq!(summary.last_7_days_credit_enquiries, 0);
    }

    #[test]
    fn score_falls_back_to_nested_path() {
        let tree = tree_of(
            "<r><name>John</name><mobile>9876543210</mobile><pan>ABCDE1234F</pan>\
             <credit><score>640</score></credit></r>",
        );
        let data = extract_credit_data(&tree).expect("nested score resolves");
        assert_eq!(data.credit_score, 640);
    }
}
