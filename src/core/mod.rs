//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod form;
pub mod log;

// Re-export main types for cleaner imports
pub use currency::{ConversionQuote, CurrencyTable, RateProvider};
pub use form::{ConversionForm, FormEvent, FormState};
