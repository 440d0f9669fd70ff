use axum::{
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Success envelope shared by every JSON endpoint: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { success: true, data })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// JSON body extractor whose rejections use the error envelope instead of axum's plain text.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query-string extractor with enveloped rejections.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: u32, limit: u32) -> Self {
        let pages = (total as f64 / limit.max(1) as f64).ceil() as u32;
        Self {
            data,
            total,
            page,
            limit,
            pages,
        }
    }
}

/// Page number (1-based) and page size clamped to `1..=100`, defaulting to 20.
pub fn page_window(page: Option<u32>, limit: Option<u32>) -> (u32, u32, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20).clamp(1, 100);
    let offset = ((page - 1) as i64) * limit as i64;
    (page, limit, offset)
}

/// Query-string field where a blank value (`?fecha=`) means the filter is absent.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Body of the `DELETE` endpoints, which carry the record id in JSON.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteRequest {
    pub id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults() {
        assert_eq!(page_window(None, None), (1, 20, 0));
    }

    #[test]
    fn test_page_window_clamps() {
        assert_eq!(page_window(Some(0), Some(500)), (1, 100, 0));
        assert_eq!(page_window(Some(3), Some(0)), (3, 1, 2));
        assert_eq!(page_window(Some(2), Some(25)), (2, 25, 25));
    }

    #[derive(Debug, Deserialize)]
    struct Filters {
        #[serde(default, deserialize_with = "empty_as_none")]
        fecha: Option<chrono::NaiveDate>,
        #[serde(default, deserialize_with = "empty_as_none")]
        page: Option<u32>,
        #[serde(default, deserialize_with = "empty_as_none")]
        estado: Option<String>,
    }

    fn query(uri: &'static str) -> Result<Filters, axum::extract::rejection::QueryRejection> {
        let uri: axum::http::Uri = uri.parse().unwrap();
        axum::extract::Query::<Filters>::try_from_uri(&uri).map(|q| q.0)
    }

    #[test]
    fn test_blank_query_values_are_absent() {
        let filters = query("/x?fecha=&page=&estado=%20").unwrap();
        assert!(filters.fecha.is_none());
        assert!(filters.page.is_none());
        assert!(filters.estado.is_none());

        let filters = query("/x?fecha=2026-03-01&page=2").unwrap();
        assert_eq!(filters.fecha, chrono::NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(filters.page, Some(2));

        assert!(query("/x?page=abc").is_err());
    }

    #[test]
    fn test_pages_rounds_up() {
        let page: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 41, 1, 20);
        assert_eq!(page.pages, 3);
        let empty: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 0, 1, 20);
        assert_eq!(empty.pages, 0);
    }
}
