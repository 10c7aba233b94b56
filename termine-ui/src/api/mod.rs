//! API Client
//!
//! HTTP communication with the Termine admin API.

pub mod client;

pub use client::AdminApi;
