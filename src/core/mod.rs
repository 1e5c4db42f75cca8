//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod router;

// Re-export main types for cleaner imports
pub use cache::{RateCache, RateEntry};
pub use currency::{CurrencyCode, CurrencyRateProvider};
pub use error::{FetchError, FetchStage, UnknownCurrencyCode};
pub use router::{MessageRouter, PhraseRule, PhraseTable, ReplyTemplates};
