//! Core types shared by the gateway and every provider adapter.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// VendorOrderId
// =============================================================================

/// Vendor-native identifier for an acquired number.
///
/// Returned by the vendor when a number is purchased and used for all
/// subsequent status and cancellation calls against that vendor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorOrderId(String);

impl VendorOrderId {
    /// Create a new VendorOrderId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for VendorOrderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for VendorOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for VendorOrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for VendorOrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// SmsCode (OTP)
// =============================================================================

/// SMS verification code (OTP) received for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsCode(pub String);

impl SmsCode {
    /// Create a new SmsCode.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SmsCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SmsCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SmsCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

// =============================================================================
// PhoneNumber
// =============================================================================

/// Error when validating a phone number string.
#[derive(Debug, Clone, Error)]
pub enum PhoneNumberError {
    /// Number contains non-digit characters.
    #[error("phone number must contain only digits")]
    NonDigit,
    /// Number has invalid length.
    #[error("phone number must be between 5 and 15 digits")]
    InvalidLength,
}

/// Full dialable phone number including the country prefix (e.g. "380501234567").
///
/// Vendors return numbers with the prefix attached; the gateway stores and
/// forwards them as-is. A leading '+' is stripped on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Create a new PhoneNumber, validating digits and length.
    pub fn new(s: impl AsRef<str>) -> Result<Self, PhoneNumberError> {
        let n = s.as_ref().trim().trim_start_matches('+');
        if !n.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneNumberError::NonDigit);
        }
        if !(5..=15).contains(&n.len()) {
            return Err(PhoneNumberError::InvalidLength);
        }
        Ok(Self(n.to_string()))
    }

    /// Get the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// CountryCode / ServiceCode
// =============================================================================

/// Vendor-facing country code (e.g. "usa" for the JSON vendor, "0" for the
/// legacy vendor). Opaque to the gateway; normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
    /// Create a new CountryCode, trimming and lowercasing the input.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_lowercase())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CountryCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CountryCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Vendor-facing service code the number is rented for (e.g. "telegram", "wa").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceCode(String);

impl ServiceCode {
    /// Create a new ServiceCode, trimming and lowercasing the input.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_lowercase())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ServiceCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ServiceCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

// =============================================================================
// NumberStatus
// =============================================================================

/// Normalized lifecycle status of an acquired number.
///
/// Every adapter maps its vendor-native vocabulary onto this enum.
/// `Completed`, `Cancelled` and `Expired` are terminal: an order in one of
/// them is never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberStatus {
    /// Number requested, vendor has not confirmed readiness yet.
    Pending,
    /// Number is live and waiting for an SMS.
    Active,
    /// A verification code arrived.
    Completed,
    /// Cancelled by the user, an admin, or the vendor.
    Cancelled,
    /// Lifetime elapsed without a code.
    Expired,
}

impl NumberStatus {
    /// Whether the status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }
}

impl Display for NumberStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_order_id_from_string() {
        let id = VendorOrderId::from("12345");
        assert_eq!(id.to_string(), "12345");
        assert_eq!(id.as_ref(), "12345");
    }

    #[test]
    fn test_sms_code() {
        let code = SmsCode::new("482913");
        assert_eq!(code.as_str(), "482913");
        assert_eq!(code.to_string(), "482913");
    }

    #[test]
    fn test_phone_number_valid() {
        let num = PhoneNumber::new("380501234567").unwrap();
        assert_eq!(num.as_str(), "380501234567");
    }

    #[test]
    fn test_phone_number_strips_plus() {
        let num = PhoneNumber::new("+380501234567").unwrap();
        assert_eq!(num.as_str(), "380501234567");
    }

    #[test]
    fn test_phone_number_non_digit() {
        assert!(matches!(
            PhoneNumber::new("38050x234"),
            Err(PhoneNumberError::NonDigit)
        ));
    }

    #[test]
    fn test_phone_number_length() {
        assert!(matches!(
            PhoneNumber::new("123"),
            Err(PhoneNumberError::InvalidLength)
        ));
        assert!(matches!(
            PhoneNumber::new("1234567890123456"),
            Err(PhoneNumberError::InvalidLength)
        ));
    }

    #[test]
    fn test_country_code_normalized() {
        assert_eq!(CountryCode::new(" USA ").as_str(), "usa");
    }

    #[test]
    fn test_service_code_normalized() {
        assert_eq!(ServiceCode::new("Telegram").as_str(), "telegram");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!NumberStatus::Pending.is_terminal());
        assert!(!NumberStatus::Active.is_terminal());
        assert!(NumberStatus::Completed.is_terminal());
        assert!(NumberStatus::Cancelled.is_terminal());
        assert!(NumberStatus::Expired.is_terminal());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&NumberStatus::Active).unwrap();
        assert_eq!(json, r#""active""#);
        let status: NumberStatus = serde_json::from_str(r#""expired""#).unwrap();
        assert_eq!(status, NumberStatus::Expired);
    }
}
