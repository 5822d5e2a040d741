//! Sideboard mobile bridge
//!
//! FFI surface for the Flutter app. Everything runs against one process-global
//! [`app::App`], created by [`api::init_app`].

pub mod api;
mod app;
mod logging;
