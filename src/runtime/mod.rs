// SPDX-License-Identifier: MIT

//! Store runtime - state ownership, serialized dispatch and effect lifecycle
//!
//! This module provides:
//! - `Store` - owns state, serializes `send`, runs effects, derives child stores
//! - `Scheduler` - where in-flight effects run (`TokioScheduler`, `CurrentThreadScheduler`)
//! - `StoreConfig` - YAML/environment configuration for a store
//! - `Connector` and `Binding` - thin view-facing adapters over `Store::derived`

mod binding;
mod config;
mod derived;
mod error;
mod observer;
mod registry;
mod scheduler;
mod store;

pub use binding::Binding;
pub use config::{SchedulerKind, StoreConfig};
pub use derived::Connector;
pub use error::{ReflowError, Result};
pub use observer::Subscription;
pub use registry::EffectRegistry;
pub use scheduler::{CurrentThreadScheduler, Scheduler, SharedScheduler, TokioScheduler};
pub use store::{StateStream, Store, StoreBuilder};
