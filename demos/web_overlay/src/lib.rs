// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Demo: attach the veneer overlay to a webmail page.
//!
//! Loads the overlay with the default configuration and a console trace
//! sink, runs the initial scan, and leaves the observers connected for the
//! lifetime of the page.
//!
//! Build with: `wasm-pack build --target web demos/web_overlay`
//!
//! Then include the generated module from the webmail skin's templates (or
//! any page that mimics its structure — missing anchors simply leave the
//! corresponding enhancements dormant).

// This crate only runs in the browser; suppress dead-code warnings when
// cargo-checking on a native host target.
#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::boxed::Box;

use wasm_bindgen::prelude::*;

use veneer_backend_web::{ConsoleSink, WebOverlay};
use veneer_core::overlay::OverlayConfig;

/// Entry point — called automatically by `wasm_bindgen(start)`.
#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    let overlay = WebOverlay::attach(OverlayConfig::default(), Some(Box::new(ConsoleSink)))?;

    // Keep the overlay alive — there is no graceful shutdown on the web.
    core::mem::forget(overlay);

    Ok(())
}
