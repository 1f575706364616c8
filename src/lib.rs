// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Place2Be API - Users & Games JSON API
//!
//! This crate hosts the bearer token authentication core of the API and the
//! HTTP shell around it. Tokens are Auth0-issued RS256 JWTs verified against
//! the tenant's published JWKS.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token verification, key set cache, extractor and middleware
//! - `config` - Environment configuration
//! - `telemetry` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod state;
pub mod telemetry;
