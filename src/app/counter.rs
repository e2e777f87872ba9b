// SPDX-License-Identifier: MIT

//! Counter feature
//!
//! A count that can be changed immediately or after a delay, plus a "fact"
//! lookup that runs through an async service and reports failures as an
//! action.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::algebra::{Effect, Reducer};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterState {
    pub count: i64,
    pub fact: Option<String>,
    pub fact_error: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CounterAction {
    Increment,
    Decrement,
    /// Increment once the environment's delay has elapsed
    DelayedIncrement,
    FactRequested,
    FactResponse(Result<String, FactError>),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FactError {
    #[error("no fact known about {0}")]
    Unknown(i64),
}

/// Source of facts about numbers
#[async_trait]
pub trait FactClient: Send + Sync {
    async fn fact(&self, n: i64) -> Result<String, FactError>;
}

/// Facts computed locally
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFacts;

#[async_trait]
impl FactClient for LocalFacts {
    async fn fact(&self, n: i64) -> Result<String, FactError> {
        if n < 0 {
            return Err(FactError::Unknown(n));
        }
        let parity = if n % 2 == 0 { "even" } else { "odd" };
        let kind = if is_prime(n) { "a prime" } else { "not a prime" };
        Ok(format!("{} is {} and {}", n, parity, kind))
    }
}

fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    (2i64..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

#[derive(Clone)]
pub struct CounterEnvironment {
    pub facts: Arc<dyn FactClient>,
    pub delay: Duration,
}

impl CounterEnvironment {
    pub fn new(facts: Arc<dyn FactClient>, delay: Duration) -> Self {
        Self { facts, delay }
    }
}

impl Default for CounterEnvironment {
    fn default() -> Self {
        Self::new(Arc::new(LocalFacts), Duration::from_millis(250))
    }
}

pub fn reducer() -> Reducer<CounterState, CounterAction, CounterEnvironment> {
    Reducer::new(
        |state: &mut CounterState, action, env: &CounterEnvironment| match action {
            CounterAction::Increment => {
                state.count += 1;
                Effect::none()
            }
            CounterAction::Decrement => {
                state.count -= 1;
                Effect::none()
            }
            CounterAction::DelayedIncrement => {
                let delay = env.delay;
                Effect::future(async move {
                    tokio::time::sleep(delay).await;
                    CounterAction::Increment
                })
            }
            CounterAction::FactRequested => {
                state.loading = true;
                let facts = Arc::clone(&env.facts);
                let n = state.count;
                Effect::future(async move { CounterAction::FactResponse(facts.fact(n).await) })
            }
            CounterAction::FactResponse(Ok(fact)) => {
                state.loading = false;
                state.fact = Some(fact);
                state.fact_error = None;
                Effect::none()
            }
            CounterAction::FactResponse(Err(e)) => {
                state.loading = false;
                state.fact = None;
                state.fact_error = Some(e.to_string());
                Effect::none()
            }
        },
    )
}
