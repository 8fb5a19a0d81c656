//! External service integrations

pub mod sap;
