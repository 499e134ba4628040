use crate::core::retry::RetryCategory;
use chrono::prelude::*;
use std::collections::HashMap;
use url::Url;

use super::HttpRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Html,
    Json,
    Text,
    Binary,
}

/// A fetched page: where it came from and its decoded markup.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: Url,
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub retry_count: usize,
    pub retry_history: HashMap<RetryCategory, usize>,
    pub response_type: ResponseType,
    pub from_request: Box<HttpRequest>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn detect_type(headers: &HashMap<String, String>, body: &str) -> ResponseType {
        if let Some(content_type) = headers.get("content-type") {
            if content_type.contains("text/html") {
                ResponseType::Html
            } else if content_type.contains("application/json") {
                ResponseType::Json
            } else if content_type.contains("text/") {
                ResponseType::Text
            } else {
                ResponseType::Binary
            }
        } else {
            let head = body.trim_start();
            if head.starts_with('{') || head.starts_with('[') {
                ResponseType::Json
            } else if head.starts_with("<!DOCTYPE")
                || head.starts_with("<!doctype")
                || head.starts_with("<html")
            {
                ResponseType::Html
            } else {
                ResponseType::Text
            }
        }
    }
}
