//! Wire types and status normalization for the 5sim API.

use crate::errors::AdapterError;
use crate::types::{CountryCode, NumberStatus, ServiceCode};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// Response from `GET /v1/user/profile`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    #[allow(dead_code)]
    pub id: i64,
    #[allow(dead_code)]
    #[serde(default)]
    pub email: String,
    pub balance: f64,
}

/// One country entry from `GET /v1/guest/countries`.
///
/// The map key is the purchase code; `iso` carries the alpha-2 code(s)
/// the flag is derived from.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryInfo {
    #[serde(default)]
    pub iso: HashMap<String, u8>,
    pub text_en: String,
}

/// One product entry from `GET /v1/guest/products/{country}/any`.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Qty")]
    pub qty: u32,
    #[serde(rename = "Price")]
    pub price: f64,
}

/// Response from `GET /v1/user/buy/activation/{country}/any/{product}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BuyResponse {
    pub id: i64,
    pub phone: String,
    pub status: String,
    pub expires: DateTime<Utc>,
    pub price: f64,
}

/// Response from `GET /v1/user/check/{id}` and `/v1/user/cancel/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    pub status: String,
    #[serde(default)]
    pub sms: Vec<SmsMessage>,
}

/// One received message on an order. The verification code is the `code`
/// field of the first element.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsMessage {
    #[serde(default)]
    pub code: String,
    #[allow(dead_code)]
    #[serde(default)]
    pub text: String,
}

/// Map a 5sim order status onto the shared lifecycle enum.
///
/// `PENDING` is pre-delivery preparation, `RECEIVED` means the number is
/// live and listening. Unknown vocabulary is an upstream-format error,
/// never a guess.
pub(super) fn normalize_status(raw: &str) -> Result<NumberStatus, AdapterError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "PENDING" => Ok(NumberStatus::Pending),
        "RECEIVED" => Ok(NumberStatus::Active),
        "FINISHED" => Ok(NumberStatus::Completed),
        "CANCELED" | "BANNED" => Ok(NumberStatus::Cancelled),
        "TIMEOUT" => Ok(NumberStatus::Expired),
        _ => Err(AdapterError::UpstreamFormat {
            raw: raw.to_string(),
        }),
    }
}

/// Known plain-text error bodies the API returns with HTTP 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ApiErrorBody {
    NoFreePhones,
    NotEnoughBalance,
    NotEnoughRating,
    OrderNotFound,
    OrderExpired,
    BadCountry,
    BadProduct,
}

impl ApiErrorBody {
    pub fn from_body(body: &str) -> Option<Self> {
        match body.trim().to_ascii_lowercase().as_str() {
            "no free phones" => Some(Self::NoFreePhones),
            "not enough user balance" => Some(Self::NotEnoughBalance),
            "not enough rating" => Some(Self::NotEnoughRating),
            "order not found" => Some(Self::OrderNotFound),
            "order expired" => Some(Self::OrderExpired),
            "country is incorrect" => Some(Self::BadCountry),
            "product is incorrect" => Some(Self::BadProduct),
            _ => None,
        }
    }

    /// Generic conversion for non-purchase operations.
    pub fn into_adapter_error(self, raw: &str) -> AdapterError {
        match self {
            Self::NotEnoughBalance | Self::NotEnoughRating => {
                AdapterError::InsufficientUpstreamBalance
            }
            _ => AdapterError::Status {
                status: 400,
                body: raw.trim().to_string(),
            },
        }
    }

    /// Conversion with purchase context, so inventory exhaustion carries
    /// the country and service it was reported for.
    pub fn into_purchase_error(
        self,
        country: &CountryCode,
        service: &ServiceCode,
    ) -> AdapterError {
        match self {
            Self::NoFreePhones => AdapterError::NoInventory {
                country: country.clone(),
                service: service.clone(),
            },
            other => other.into_adapter_error(""),
        }
    }
}

/// Derive the emoji flag glyph for an ISO alpha-2 code.
pub(super) fn flag_emoji(iso2: &str) -> String {
    iso2.trim()
        .to_ascii_uppercase()
        .chars()
        .filter(char::is_ascii_uppercase)
        .take(2)
        .filter_map(|c| char::from_u32(0x1F1E6 + (c as u32) - ('A' as u32)))
        .collect()
}
