//! Vendor adapter implementations.

pub mod five_sim;
mod null;
pub mod sms_activate;

pub use null::{NullAdapter, StubAdapter};
