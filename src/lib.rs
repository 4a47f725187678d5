// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! An interactive coding agent: mediates between an operator and an LLM,
//! with a sandboxed filesystem/shell tool catalog and a cost ledger.
//!
//! Core modules: [`agent`] (the control loop), [`providers`] (vendor
//! backends), [`tools`] (the sandboxed tool catalog), [`safety`] (the
//! confirmation-gated policy layer), [`cost`] (tiered usage accounting),
//! and [`config`] (environment-variable startup resolution).

pub mod agent;
pub mod config;
pub mod cost;
pub mod error;
pub mod providers;
pub mod safety;
pub mod tools;
pub mod types;
