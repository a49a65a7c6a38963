//! # SMS Rental
//!
//! A disposable phone number rental gateway with provider abstraction.
//!
//! This library normalizes unrelated "virtual number" vendors behind one
//! adapter contract, orchestrates purchases against prepaid user balances,
//! and tracks acquired numbers through a bounded-lifetime state machine
//! until a verification code arrives, the user cancels, or the number
//! expires.
//!
//! ## Supported Vendors
//!
//! | Vendor | Protocol | Module |
//! |--------|----------|--------|
//! | 5SIM | JSON/REST, bearer auth | `providers::five_sim` |
//! | SMS Activate | legacy colon-delimited text | `providers::sms_activate` |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sms_rental::{
//!     MemoryStore, ProviderConfig, ProviderId, RentalGateway, Store, User, UserId,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     store
//!         .upsert_provider(ProviderConfig::new(
//!             ProviderId::from("main"),
//!             "5sim",
//!             "your_api_key",
//!         ))
//!         .await?;
//!     store
//!         .upsert_user(User { id: UserId::from("alice"), balance: 10.0 })
//!         .await?;
//!
//!     let gateway = RentalGateway::new(store);
//!
//!     // Rent a number
//!     let order = gateway
//!         .acquire_number(
//!             &UserId::from("alice"),
//!             &ProviderId::from("main"),
//!             &"usa".into(),
//!             &"telegram".into(),
//!         )
//!         .await?;
//!     println!("Got number: {}", order.number);
//!
//!     // Poll for the verification code
//!     let order = gateway.check_order(&order.id).await?;
//!     if let Some(code) = &order.sms_code {
//!         println!("Got code: {code}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! RentalGateway<S: Store>
//!         │
//!         ▼
//! registry::resolve        (vendor code → adapter)
//!         │
//!         ▼
//! Arc<dyn ProviderAdapter> (FiveSimProvider, SmsActivateProvider, …)
//! ```

pub mod errors;
pub mod gateway;
pub mod model;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod retry;
pub mod store;
pub mod types;

// Re-export commonly used types at the crate root
pub use errors::{AdapterError, GatewayError, RetryableError, StoreError};
pub use gateway::{GatewayConfig, RentalGateway};
pub use model::{
    LedgerEntry, LedgerKind, LedgerStatus, Order, OrderId, ProviderConfig, ProviderId,
    ProviderSettings, User, UserId,
};
pub use provider::{
    ProviderAdapter, VendorBalance, VendorCountry, VendorPoll, VendorPurchase, VendorService,
};
pub use retry::RetryConfig;
pub use store::{MemoryStore, Store};
pub use types::{CountryCode, NumberStatus, PhoneNumber, ServiceCode, SmsCode, VendorOrderId};
