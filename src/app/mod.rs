// SPDX-License-Identifier: MIT

//! Demo application assembled from independent features
//!
//! `counter` and `todos` know nothing about each other or about `AppState`;
//! they are lifted into the application with paths and prisms and combined
//! with a small application-level reducer.

pub mod counter;
pub mod todos;

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::algebra::{combine, Effect, Reducer};
use crate::runtime::{Connector, Store};
use crate::{path, prism};

use counter::{CounterAction, CounterEnvironment, CounterState};
use todos::{TodosAction, TodosEnvironment, TodosState};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub counter: CounterState,
    pub todos: TodosState,
    pub actions_processed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Counter(CounterAction),
    Todos(TodosAction),
    Reset,
}

#[derive(Clone, Default)]
pub struct AppEnvironment {
    pub counter: CounterEnvironment,
    pub todos: TodosEnvironment,
}

impl AppEnvironment {
    pub fn live() -> Self {
        Self::default()
    }
}

fn bookkeeping() -> Reducer<AppState, AppAction, AppEnvironment> {
    Reducer::new(|state: &mut AppState, action, _: &AppEnvironment| {
        if let AppAction::Reset = action {
            *state = AppState::default();
        }
        state.actions_processed += 1;
        Effect::none()
    })
}

/// Reducer for the whole application
pub fn reducer() -> Reducer<AppState, AppAction, AppEnvironment> {
    combine(vec![
        counter::reducer().lift(
            path!(AppState => counter),
            prism!(AppAction::Counter),
            |env: &AppEnvironment| env.counter.clone(),
        ),
        todos::reducer().lift(
            path!(AppState => todos),
            prism!(AppAction::Todos),
            |env: &AppEnvironment| env.todos.clone(),
        ),
        bookkeeping(),
    ])
}

/// One-line summary of the application state
pub struct StatusLine;

impl Connector for StatusLine {
    type State = AppState;
    type Action = AppAction;
    type ViewState = String;
    type ViewAction = ();

    fn project_state(&self, state: &AppState) -> String {
        format!(
            "count={} todos={}/{}",
            state.counter.count,
            state.todos.remaining(),
            state.todos.items.len()
        )
    }

    fn lift_action(&self, _: ()) -> AppAction {
        AppAction::Reset
    }
}

/// Wait until `store` has no effects in flight
///
/// Effects queued on a caller-driven scheduler are driven from here.
/// Returns `false` if effects are still running when `timeout` elapses.
pub async fn settle<S, A>(store: &Store<S, A>, timeout: Duration) -> bool
where
    S: Clone + Send + 'static,
    A: Send + 'static,
{
    let deadline = Instant::now() + timeout;
    loop {
        store.run_pending_effects();
        if store.inflight_effects() == 0 {
            return true;
        }
        if Instant::now() >= deadline {
            log::warn!(
                "[{}] {} effects still in flight after {:?}",
                store.label(),
                store.inflight_effects(),
                timeout
            );
            return false;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::counter::LocalFacts;
    use std::sync::Arc;

    fn environment() -> AppEnvironment {
        AppEnvironment {
            counter: CounterEnvironment::new(Arc::new(LocalFacts), Duration::from_millis(5)),
            todos: TodosEnvironment::default(),
        }
    }

    #[test]
    fn test_feature_actions_stay_in_their_slice() {
        let reducer = reducer();
        let env = environment();
        let mut state = AppState::default();

        let _ = reducer.reduce(&mut state, AppAction::Counter(CounterAction::Increment), &env);
        let _ = reducer.reduce(&mut state, AppAction::Todos(TodosAction::Add("x".into())), &env);

        assert_eq!(state.counter.count, 1);
        assert_eq!(state.todos.items.len(), 1);
        assert_eq!(state.actions_processed, 2);
    }

    #[test]
    fn test_reset() {
        let reducer = reducer();
        let env = environment();
        let mut state = AppState::default();
        let _ = reducer.reduce(&mut state, AppAction::Counter(CounterAction::Increment), &env);
        let _ = reducer.reduce(&mut state, AppAction::Reset, &env);

        assert_eq!(state.counter, CounterState::default());
        assert_eq!(state.actions_processed, 1);
    }

    #[tokio::test]
    async fn test_lifted_effects_are_reembedded() {
        let reducer = reducer();
        let env = environment();
        let mut state = AppState::default();
        let effect = reducer.reduce(
            &mut state,
            AppAction::Counter(CounterAction::DelayedIncrement),
            &env,
        );
        assert_eq!(
            effect.collect().await,
            vec![AppAction::Counter(CounterAction::Increment)]
        );
    }

    #[tokio::test]
    async fn test_settle_waits_for_delayed_effects() {
        let store = Store::new(AppState::default(), reducer(), environment());
        let status = store.connect(StatusLine);

        store.send(AppAction::Counter(CounterAction::DelayedIncrement));
        assert_eq!(status.state(), "count=0 todos=0/0");

        assert!(settle(&store, Duration::from_secs(5)).await);
        assert_eq!(store.state().counter.count, 1);
        assert_eq!(status.state(), "count=1 todos=0/0");
    }
}
