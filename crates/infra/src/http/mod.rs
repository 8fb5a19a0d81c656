//! HTTP client plumbing shared by the ERP integration

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
