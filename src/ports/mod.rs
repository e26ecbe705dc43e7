//! Port traits at the boundaries of the domain.

pub mod config_port;
pub mod exchange_port;
