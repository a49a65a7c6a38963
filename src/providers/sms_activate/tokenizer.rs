//! Sentinel tokenizer for the legacy colon-delimited text protocol.
//!
//! Every lifecycle response from the vendor is a single line of the form
//! `PREFIX`, `PREFIX:value` or `PREFIX:value:value`. This module is the
//! only place that splits those lines; callers switch on the sentinel and
//! read values positionally.

use crate::errors::AdapterError;

/// Recognized response prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// `ACCESS_NUMBER:<id>:<number>` — number rented.
    AccessNumber,
    /// `ACCESS_BALANCE:<amount>` — account balance.
    AccessBalance,
    /// `ACCESS_CANCEL` — activation cancelled.
    AccessCancel,
    /// `STATUS_OK:<code>` — verification code arrived.
    StatusOk,
    /// `STATUS_WAIT_CODE` — still waiting for the SMS.
    StatusWaitCode,
    /// `STATUS_WAIT_RETRY:<last_code>` — waiting for a further SMS.
    StatusWaitRetry,
    /// `STATUS_WAIT_RESEND` — waiting for the SMS to be re-sent.
    StatusWaitResend,
    /// `STATUS_CANCEL` — activation cancelled on the vendor side.
    StatusCancel,
    /// `NO_NUMBERS` — vendor has no numbers for the request.
    NoNumbers,
    /// `NO_BALANCE` — vendor account out of funds.
    NoBalance,
    /// `BAD_KEY` — credentials rejected.
    BadKey,
}

impl Sentinel {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "ACCESS_NUMBER" => Some(Self::AccessNumber),
            "ACCESS_BALANCE" => Some(Self::AccessBalance),
            "ACCESS_CANCEL" => Some(Self::AccessCancel),
            "STATUS_OK" => Some(Self::StatusOk),
            "STATUS_WAIT_CODE" => Some(Self::StatusWaitCode),
            "STATUS_WAIT_RETRY" => Some(Self::StatusWaitRetry),
            "STATUS_WAIT_RESEND" => Some(Self::StatusWaitResend),
            "STATUS_CANCEL" => Some(Self::StatusCancel),
            "NO_NUMBERS" => Some(Self::NoNumbers),
            "NO_BALANCE" => Some(Self::NoBalance),
            "BAD_KEY" => Some(Self::BadKey),
            _ => None,
        }
    }
}

/// One tokenized response line: the sentinel plus its colon-delimited fields.
#[derive(Debug, Clone)]
pub struct SentinelLine {
    pub sentinel: Sentinel,
    pub fields: Vec<String>,
    /// Original line, kept for error reporting.
    pub raw: String,
}

impl SentinelLine {
    /// Positional field access.
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Everything from the given field onward, re-joined with colons.
    /// Used for values that may themselves contain colons, like SMS text.
    pub fn rest(&self, from: usize) -> Option<String> {
        if self.fields.len() <= from {
            return None;
        }
        Some(self.fields[from..].join(":"))
    }
}

/// Tokenize one response line.
///
/// Unrecognized prefixes fail with [`AdapterError::UpstreamFormat`] rather
/// than guessing at the vendor's meaning.
pub fn tokenize(line: &str) -> Result<SentinelLine, AdapterError> {
    let trimmed = line.trim();
    let mut parts = trimmed.split(':');
    let prefix = parts.next().unwrap_or_default();

    let sentinel = Sentinel::from_prefix(prefix).ok_or_else(|| AdapterError::UpstreamFormat {
        raw: trimmed.to_string(),
    })?;

    Ok(SentinelLine {
        sentinel,
        fields: parts.map(str::to_string).collect(),
        raw: trimmed.to_string(),
    })
}
