//! mailbridge: Google Workspace access: OAuth credentials, Gmail and Calendar.

pub mod calendar;
pub mod client;
pub mod credentials;
pub mod gmail;
pub mod types;

pub use calendar::{validate_timestamp, within_free_busy_window, Calendar, MAX_FREE_BUSY_DAYS};
pub use client::GoogleClient;
pub use credentials::{CredentialPaths, Credentials, DEFAULT_REDIRECT_URI};
pub use gmail::Gmail;
pub use types::*;
