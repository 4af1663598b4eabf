//! Core library modules for routeviz
//!
//! This module contains the internal implementation details of the
//! routeviz library: geometry primitives, the two renderers, the
//! overlay managers, and the provider clients they consume.

pub mod congestion;
pub mod elevation;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod providers;
pub mod route_layer;
pub mod traffic;
