use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::records::repo::RecordRow;

lazy_static! {
    static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref MONTH_RE: Regex = Regex::new(r"^\d{4}-\d{2}$").unwrap();
}

pub(crate) fn is_valid_date(value: &str) -> bool {
    DATE_RE.is_match(value)
}

pub(crate) fn is_valid_month(value: &str) -> bool {
    MONTH_RE.is_match(value)
}

#[derive(Debug, Deserialize)]
pub struct ListRecordsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size", rename = "pageSize")]
    pub page_size: i64,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(rename = "categoryId")]
    pub category_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

/// Body for both create and update; missing keys surface as validation
/// errors rather than deserialization rejections.
#[derive(Debug, Deserialize)]
pub struct SaveRecordRequest {
    pub amount: Option<f64>,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub record_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordIdQuery {
    pub id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecordPage {
    pub records: Vec<RecordRow>,
    pub total: i64,
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
}

#[derive(Debug, Serialize)]
pub struct CreatedRecord {
    pub id: i64,
}
