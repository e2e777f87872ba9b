// SPDX-License-Identifier: MIT

//! Unidirectional state management
//!
//! - [`algebra`] - paths, prisms, effects and reducers, plus the combinators
//!   that compose feature reducers into an application reducer
//! - [`runtime`] - the `Store` that owns state, serializes actions, runs
//!   effects and derives child stores
//! - [`app`] - a small demo application built on both

pub mod algebra;
pub mod app;
pub mod runtime;

pub use algebra::{combine, Effect, Path, Prism, Reducer};
pub use runtime::{ReflowError, Result, Store, StoreConfig, Subscription};
