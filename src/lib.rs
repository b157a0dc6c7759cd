//! Nodepack Registry Library
//!
//! This library discovers node operations in nodepack directories and
//! serves their schemas to the visual editor.

pub mod api;
pub mod config;
pub mod error;
pub mod nodes;
pub mod registry;
