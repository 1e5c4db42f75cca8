//! Terminal front-end for the bot

pub mod rates;
pub mod setup;
pub mod ui;
