//! SMS Activate integration (legacy colon-delimited `handler_api` protocol).

mod client;
mod provider;
mod tokenizer;

pub use client::{DEFAULT_API_URL, SmsActivateClient, SmsActivateClientBuilder};
pub use provider::SmsActivateProvider;
pub use tokenizer::{Sentinel, SentinelLine, tokenize};
