// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, security headers).

pub mod ingest_auth;
pub mod security;

pub use ingest_auth::{require_ingest_key, INGEST_KEY_HEADER};
