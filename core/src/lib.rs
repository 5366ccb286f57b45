//! Blocking client for The Gym Group mobile API.
//!
//! # Overview
//! Logs a member in, keeps the session cookies on disk so restarts skip the
//! login, and reports how busy a gym currently is.
//!
//! # Design
//! - `GymClient` owns the session, credentials and the identifiers learned
//!   at login; there is no global state.
//! - Requests and responses are plain data (`http` module). A `Transport`
//!   executes them, which lets tests script the server side.
//! - An expired session (HTTP 403) costs one re-login and one replay, never
//!   more.
//! - The state file is a flat `{cookies, login_resp}` snapshot; any problem
//!   reading it just means "log in again".

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod state;

pub use client::GymClient;
pub use config::ClientConfig;
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use session::Session;
pub use state::{Identity, PersistedState, StateStore};
