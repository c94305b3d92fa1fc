//! Paged list response wrapper

use serde::Deserialize;

/// Generic paging response with a results array and total count
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct PagingResponse<T> {
    #[serde(rename = "count")]
    pub count: Option<i64>,

    #[serde(rename = "results", default)]
    pub results: Vec<T>,

    #[serde(rename = "endOfRecords")]
    pub end_of_records: Option<bool>,
}
