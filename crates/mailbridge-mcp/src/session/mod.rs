//! Session bookkeeping shared by the HTTP transports.

pub mod store;

pub use store::{
    IdSource, Session, SessionStore, TransportHandle, TransportKind, IDLE_SWEEP_INTERVAL,
    SESSION_IDLE_TIMEOUT,
};
