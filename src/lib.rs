//! Fifteen-twenty (十五二十): a gesture + voice finger-guessing game
//!
//! Noisy recognition events from two producers are debounced, fused into one
//! player input per cycle, and arbitrated into rounds by the session controller.

pub mod arbiter;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod error;
pub mod fusion;
pub mod game;
pub mod lexicon;
pub mod producer;
pub mod render;
pub mod replay;
pub mod session;
pub mod state;
pub mod stats;
pub mod voice_state;
