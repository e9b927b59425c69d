//! Deckpack CLI - package playing-card decks as OCI artifacts.

pub mod commands;
pub mod output;
