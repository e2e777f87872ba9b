// SPDX-License-Identifier: MIT

//! Reducer algebra - the pure half of the runtime
//!
//! This module provides:
//! - `Path` - addressable paths (lenses) into composite state
//! - `Prism` - action adapters between parent and child action spaces
//! - `Effect` - asynchronous streams of follow-up actions
//! - `Reducer` - state transitions and the `lift`/`indexed`/`optional`/`combine` combinators

mod effect;
mod path;
mod prism;
mod reducer;

pub use effect::Effect;
pub use path::Path;
pub use prism::Prism;
pub use reducer::{combine, IndexedCollection, Reducer};
