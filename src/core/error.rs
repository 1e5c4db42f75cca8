//! Typed errors raised by the rate lookup core

use super::currency::CurrencyCode;
use std::fmt::Display;
use thiserror::Error;

/// Step of the upstream fetch that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Network,
    HttpStatus,
    Parse,
    MissingField,
}

impl Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FetchStage::Network => "network",
            FetchStage::HttpStatus => "http-status",
            FetchStage::Parse => "parse",
            FetchStage::MissingField => "missing-field",
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("failed to fetch {code} rate ({stage}): {message}")]
pub struct FetchError {
    pub code: CurrencyCode,
    pub stage: FetchStage,
    pub message: String,
}

impl FetchError {
    pub fn new(code: CurrencyCode, stage: FetchStage, message: impl Into<String>) -> Self {
        Self {
            code,
            stage,
            message: message.into(),
        }
    }
}

/// A currency code outside the supported set, found while loading the phrase table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown currency code: {0}")]
pub struct UnknownCurrencyCode(pub String);
