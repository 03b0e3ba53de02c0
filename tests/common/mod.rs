#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use unifex::core::kernel::{HttpClient, HttpRequest, HttpResponse};
use unifex::ExchangeError;

/// Transport that replays queued responses and records every request.
///
/// Clones share the same queue and log, so a test keeps one handle while
/// the connector owns the other.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<HttpResponse>>>,
    sent: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: &Value) -> &Self {
        self.respond_raw(status, &body.to_string())
    }

    pub fn respond_raw(&self, status: u16, body: &str) -> &Self {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }

    pub fn request_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError> {
        self.sent.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ExchangeError::Network {
                exchange: "mock".to_string(),
                message: "no canned response left".to_string(),
            })
    }
}

/// Query string of a URL parsed into decoded pairs.
pub fn query_pairs(url: &str) -> Vec<(String, String)> {
    url.split_once('?')
        .map(|(_, query)| {
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| {
                    (
                        urlencoding::decode(k).unwrap().into_owned(),
                        urlencoding::decode(v).unwrap().into_owned(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn dec(value: &str) -> rust_decimal::Decimal {
    value.parse().unwrap()
}
