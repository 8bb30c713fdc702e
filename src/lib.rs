// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>
// Patent Pending — DE Gebrauchsmuster, filed 2026-02-23

//! Clonevox — a voice-cloning web front-end and relay.
//!
//! The gateway serves a form, accepts `text` + `audio_file` uploads on
//! `/api/clone-voice`, and relays them (with a fixed language) to an
//! upstream voice-cloning API. The `client` module drives the same flow
//! from the command line.

pub mod client;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod providers;
