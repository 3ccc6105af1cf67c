//! # Bulk Order CSV Validator
//!
//! Validates a CSV file of gift card orders, one recipient per row.
//!
//! ## Validation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Bulk Order Upload                                   │
//! │                                                                         │
//! │  STRUCTURAL (fail fast, one error, row 0)                               │
//! │  1. extension in allowed set     "Invalid file type..."                 │
//! │  2. size <= max_file_size_mb     "File size exceeds maximum of 5MB"     │
//! │  3. header + at least one row    "CSV file must contain headers..."     │
//! │  4. required columns present     "Missing required columns: ..."        │
//! │  5. data rows <= max_rows        "Too many rows: found N, maximum..."   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  PER ROW (accumulate every error, every row)                            │
//! │  row 2 ──► name, email, phone, amount, message, theme                   │
//! │  row 3 ──► ...                                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  rows with zero errors become BulkOrderCsvRow                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 1 and 2 run on file metadata, before the file is read; see
//! [`check_file_metadata`].

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::discount::{
    apply_multiple_discounts, calculate_bulk_discount, qualifies_for_bulk_discount,
};
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::DesignTheme;
use crate::validation::{
    parse_amount, validate_design_theme, validate_email, validate_gift_card_amount,
    validate_message, validate_phone, validate_recipient_name,
};
use crate::{MAX_GIFT_CARD_AMOUNT, MIN_GIFT_CARD_AMOUNT};

const BYTES_PER_MB: u64 = 1024 * 1024;

const NO_DATA_ROWS: &str = "CSV file must contain headers and at least one data row";

const UNREADABLE_CSV: &str = "Failed to parse CSV file";

const BOM: char = '\u{feff}';

/// Row number reported for whole-file errors.
pub const FILE_LEVEL_ROW: usize = 0;

/// Row number of the first data row (the header is row 1).
pub const FIRST_DATA_ROW: usize = 2;

// =============================================================================
// Columns
// =============================================================================

/// A column of the bulk order file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumn {
    pub name: &'static str,
    pub required: bool,
}

/// Every column, in template order. The template and the validator both
/// read this table.
pub const BULK_ORDER_COLUMNS: [CsvColumn; 6] = [
    CsvColumn { name: "recipient_name", required: true },
    CsvColumn { name: "recipient_email", required: true },
    CsvColumn { name: "recipient_phone", required: true },
    CsvColumn { name: "amount", required: true },
    CsvColumn { name: "custom_message", required: false },
    CsvColumn { name: "design_theme", required: true },
];

const TEMPLATE_SAMPLE_ROW: &str =
    "Priya Sharma,priya@example.com,+91 98765 43210,5000,Happy birthday!,birthday";

/// Names of the columns a file must have.
pub fn required_columns() -> Vec<&'static str> {
    BULK_ORDER_COLUMNS
        .iter()
        .filter(|c| c.required)
        .map(|c| c.name)
        .collect()
}

/// Header row plus one sample row that passes validation.
///
/// ```rust
/// use lustre_core::bulk_order::generate_csv_template;
///
/// let template = generate_csv_template();
/// assert!(template.starts_with("recipient_name,recipient_email,"));
/// assert_eq!(template.lines().count(), 2);
/// ```
pub fn generate_csv_template() -> String {
    let header: Vec<&str> = BULK_ORDER_COLUMNS.iter().map(|c| c.name).collect();
    format!("{}\n{}", header.join(","), TEMPLATE_SAMPLE_ROW)
}

/// Canonical form of a header cell: trimmed, lowercase, inner whitespace
/// collapsed to `_`.
pub fn normalize_header(cell: &str) -> String {
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

// =============================================================================
// Limits
// =============================================================================

/// Upload limits. Defaults match the storefront's published rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkOrderLimits {
    /// Lowercase, with the dot (`.csv`).
    pub allowed_extensions: Vec<String>,
    pub max_file_size_mb: u64,
    pub max_rows: usize,
    pub min_amount: Money,
    pub max_amount: Money,
}

impl Default for BulkOrderLimits {
    fn default() -> Self {
        BulkOrderLimits {
            allowed_extensions: vec![".csv".to_string()],
            max_file_size_mb: 5,
            max_rows: 500,
            min_amount: Money::from_major_units(MIN_GIFT_CARD_AMOUNT),
            max_amount: Money::from_major_units(MAX_GIFT_CARD_AMOUNT),
        }
    }
}

impl BulkOrderLimits {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Case-insensitive extension match on the file name.
    pub fn allows_file_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.allowed_extensions
            .iter()
            .any(|ext| name.ends_with(&ext.to_lowercase()))
    }
}

// =============================================================================
// Results
// =============================================================================

/// One problem in the uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CsvError {
    /// 0 for whole-file errors, otherwise the 1-indexed line (header = 1).
    pub row: usize,
    /// Column name, or `file`.
    pub field: String,
    pub message: String,
}

impl CsvError {
    pub fn file(message: impl Into<String>) -> Self {
        CsvError {
            row: FILE_LEVEL_ROW,
            field: "file".to_string(),
            message: message.into(),
        }
    }

    fn for_field(row: usize, field: &str, err: ValidationError) -> Self {
        CsvError {
            row,
            field: field.to_string(),
            message: err.to_string(),
        }
    }
}

/// A fully validated order row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkOrderCsvRow {
    pub recipient_name: String,
    pub recipient_email: String,
    pub recipient_phone: String,
    pub amount: Money,
    pub custom_message: Option<String>,
    pub design_theme: DesignTheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CsvValidationResult {
    /// True when there are no errors at all.
    pub valid: bool,
    /// Data rows found, 0 when a structural check failed before counting.
    pub total_rows: usize,
    pub valid_rows: Vec<BulkOrderCsvRow>,
    pub errors: Vec<CsvError>,
}

impl CsvValidationResult {
    /// A structural failure: one error, nothing validated.
    pub fn rejected(error: CsvError, total_rows: usize) -> Self {
        CsvValidationResult {
            valid: false,
            total_rows,
            valid_rows: Vec::new(),
            errors: vec![error],
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// File-name and size checks, run before reading the content.
pub fn check_file_metadata(name: &str, size: u64, limits: &BulkOrderLimits) -> Result<(), CsvError> {
    if !limits.allows_file_name(name) {
        return Err(CsvError::file("Invalid file type. Please upload a CSV file"));
    }

    if size > limits.max_file_size_bytes() {
        return Err(CsvError::file(format!(
            "File size exceeds maximum of {}MB",
            limits.max_file_size_mb
        )));
    }

    Ok(())
}

/// Splits CSV text into records.
///
/// ## Rules
/// - Fields wrapped in `"` may hold commas and line breaks; `""` is one `"`
/// - Records end at `\n` or `\r\n`; rows may have any number of cells
/// - Blank lines and a leading UTF-8 byte order mark are dropped
///
/// ```rust
/// use lustre_core::bulk_order::read_records;
///
/// let records = read_records("a,b\r\n\"x, y\",\"say \"\"hi\"\"\"\r\n").unwrap();
/// assert_eq!(&records[1][0], "x, y");
/// assert_eq!(&records[1][1], "say \"hi\"");
/// ```
pub fn read_records(text: &str) -> Result<Vec<StringRecord>, csv::Error> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let blank = record.len() == 1 && record[0].trim().is_empty();
        if !blank {
            records.push(record);
        }
    }
    Ok(records)
}

/// Validates already-read CSV text.
pub fn validate_csv_content(text: &str, limits: &BulkOrderLimits) -> CsvValidationResult {
    let records = match read_records(text) {
        Ok(records) => records,
        Err(_) => return CsvValidationResult::rejected(CsvError::file(UNREADABLE_CSV), 0),
    };
    let mut records = records.into_iter();

    let Some(header) = records.next() else {
        return CsvValidationResult::rejected(CsvError::file(NO_DATA_ROWS), 0);
    };
    let data: Vec<StringRecord> = records.collect();
    if data.is_empty() {
        return CsvValidationResult::rejected(CsvError::file(NO_DATA_ROWS), 0);
    }

    // first occurrence wins for duplicate headers
    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, cell) in header.iter().enumerate() {
        index.entry(normalize_header(cell)).or_insert(i);
    }

    let missing: Vec<&str> = required_columns()
        .into_iter()
        .filter(|name| !index.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return CsvValidationResult::rejected(
            CsvError::file(format!("Missing required columns: {}", missing.join(", "))),
            data.len(),
        );
    }

    if data.len() > limits.max_rows {
        return CsvValidationResult::rejected(
            CsvError::file(format!(
                "Too many rows: found {}, maximum is {}",
                data.len(),
                limits.max_rows
            )),
            data.len(),
        );
    }

    let mut valid_rows = Vec::new();
    let mut errors = Vec::new();

    for (offset, record) in data.iter().enumerate() {
        let cells = RowCells { record, index: &index };
        match validate_row(offset + FIRST_DATA_ROW, &cells, limits) {
            Ok(row) => valid_rows.push(row),
            Err(row_errors) => errors.extend(row_errors),
        }
    }

    CsvValidationResult {
        valid: errors.is_empty(),
        total_rows: data.len(),
        valid_rows,
        errors,
    }
}

struct RowCells<'a> {
    record: &'a StringRecord,
    index: &'a HashMap<String, usize>,
}

impl RowCells<'_> {
    /// Cell under `column`, empty when the column or the cell is absent.
    fn get(&self, column: &str) -> &str {
        self.index
            .get(column)
            .and_then(|&i| self.record.get(i))
            .unwrap_or("")
    }
}

/// Keeps the value, or records the error against `field`.
fn take<T>(
    row: usize,
    field: &str,
    result: Result<T, ValidationError>,
    errors: &mut Vec<CsvError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(CsvError::for_field(row, field, e));
            None
        }
    }
}

fn validate_row(
    row: usize,
    cells: &RowCells<'_>,
    limits: &BulkOrderLimits,
) -> Result<BulkOrderCsvRow, Vec<CsvError>> {
    let mut errors = Vec::new();

    let recipient_name = take(
        row,
        "recipient_name",
        validate_recipient_name(cells.get("recipient_name")),
        &mut errors,
    );
    let recipient_email = take(
        row,
        "recipient_email",
        validate_email(cells.get("recipient_email")),
        &mut errors,
    );
    let recipient_phone = take(
        row,
        "recipient_phone",
        validate_phone(cells.get("recipient_phone")),
        &mut errors,
    );

    let amount = match take(row, "amount", parse_amount(cells.get("amount")), &mut errors) {
        Some(amount) => {
            let amount_errors =
                validate_gift_card_amount(amount, limits.min_amount, limits.max_amount);
            if amount_errors.is_empty() {
                Some(amount)
            } else {
                errors.extend(
                    amount_errors
                        .into_iter()
                        .map(|e| CsvError::for_field(row, "amount", e)),
                );
                None
            }
        }
        None => None,
    };

    let custom_message = take(
        row,
        "custom_message",
        validate_message("Custom message", cells.get("custom_message")),
        &mut errors,
    );
    let design_theme = take(
        row,
        "design_theme",
        validate_design_theme(cells.get("design_theme")),
        &mut errors,
    );

    let (
        Some(recipient_name),
        Some(recipient_email),
        Some(recipient_phone),
        Some(amount),
        Some(custom_message),
        Some(design_theme),
    ) = (
        recipient_name,
        recipient_email,
        recipient_phone,
        amount,
        custom_message,
        design_theme,
    )
    else {
        return Err(errors);
    };

    Ok(BulkOrderCsvRow {
        recipient_name,
        recipient_email,
        recipient_phone,
        amount,
        custom_message,
        design_theme,
    })
}

// =============================================================================
// Quote
// =============================================================================

/// What a batch of valid rows costs, with the wholesale discount applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkOrderQuote {
    pub quantity: usize,
    pub subtotal: Money,
    pub qualifies_for_bulk_discount: bool,
    pub bulk_discount: Money,
    pub final_amount: Money,
}

impl BulkOrderQuote {
    pub fn from_rows(rows: &[BulkOrderCsvRow]) -> Self {
        let quantity = rows.len();
        let subtotal: Money = rows.iter().map(|r| r.amount).sum();
        let qualifies = qualifies_for_bulk_discount(quantity);

        let bulk_discount = if qualifies {
            calculate_bulk_discount(subtotal)
        } else {
            Money::zero()
        };
        let summary = apply_multiple_discounts(subtotal, &[bulk_discount]);

        BulkOrderQuote {
            quantity,
            subtotal,
            qualifies_for_bulk_discount: qualifies,
            bulk_discount: summary.total_discount,
            final_amount: summary.final_amount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
