//! Data models: invoice payload, extraction records and configuration.

pub mod config;
mod deserializers;
pub mod extraction;
pub mod invoice;

pub use deserializers::parse_amount;
