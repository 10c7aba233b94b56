//! Termine Back Office
//!
//! Admin frontend for the Termine booking service built with Leptos (WASM).
//!
//! # Features
//!
//! - User table with admin toggle and inline coupon editing
//! - Background refresh every 60 seconds with a refresh spinner
//! - Add users and create appointment slots
//!
//! # Architecture
//!
//! This is a client-side rendered (CSR) Leptos application that compiles to
//! WebAssembly. The table state machine comes from the `termine-admin` crate;
//! this crate only wires it to signals, browser timers and `gloo-net`.

use leptos::*;

mod api;
mod app;
mod components;
mod config;
mod pages;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    let config = config::AdminConfig::from_local_storage();
    web_sys::console::log_1(&format!("Admin API: {}", config.api_base_url).into());

    mount_to_body(move || view! { <app::App config=config /> });
}
