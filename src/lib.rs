//! provider-sim: key-validating LLM provider simulator.
//!
//! Emulates an external inference provider's HTTP API so gateways and agents
//! can be tested end-to-end: protected routes demand the configured key in the
//! `X-Provider-Api-Key` header and answer with OpenAI-compatible canned replies.

pub mod config;
pub mod server;

pub use config::{Cli, Config, ConfigError};
pub use server::openai_api::AppState;
pub use server::router::build_router;
