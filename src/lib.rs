// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Check-in mini-program backend.
//!
//! Users log in with a WeChat `wx.login` code, receive a short-lived session
//! token, and record daily check-ins. The service reports totals, the
//! current month's count and the current streak of consecutive days.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::{IdentityProvider, TokenService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Database>,
    pub tokens: TokenService,
    pub identity: Arc<dyn IdentityProvider>,
}
