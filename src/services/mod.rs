// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod stats;
pub mod token;
pub mod wechat;

pub use stats::{compute_stats, CheckinTimeline};
pub use token::TokenService;
pub use wechat::{ExternalIdentity, IdentityProvider, WechatClient};
