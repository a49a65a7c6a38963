//! 5sim adapter: bearer-token JSON/REST vendor.

mod client;
mod provider;
mod types;

pub use client::{DEFAULT_API_URL, FiveSimClient, FiveSimClientBuilder};
pub use provider::FiveSimProvider;
pub use types::{BuyResponse, CountryInfo, OrderResponse, ProfileResponse, Product, SmsMessage};
