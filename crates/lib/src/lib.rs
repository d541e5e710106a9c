//! barf-lib: Core types and logic for barf (Build And Run Flow)
//!
//! This crate provides the pieces a flow is assembled from:
//! - `Component`: a named build unit loaded from a `comp.yml` manifest
//! - `ComponentGraph`: all loaded components keyed by name
//! - `BuildList`: the dependency-first order produced by the resolver
//! - `Job`: a scratch workspace that external tools run in
//! - `Flow`: the surface that ties loading, resolution and execution together

pub mod component;
pub mod config;
pub mod consts;
pub mod execute;
pub mod flow;
pub mod script;
pub mod workspace;

#[cfg(test)]
pub mod testutil;
