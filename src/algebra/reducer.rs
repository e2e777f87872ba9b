// SPDX-License-Identifier: MIT

//! Reducers and the combinators that compose them
//!
//! A [`Reducer`] is a pure state transition `(&mut S, A, &E) -> Effect<A>`.
//! Reducers written for a small piece of state are lifted into reducers for
//! the whole application state with:
//!
//! - [`Reducer::lift`] - focus on one field and one action case
//! - [`Reducer::indexed`] - focus on one element of a keyed or positional collection
//! - [`Reducer::optional`] - tolerate state that may be absent
//! - [`combine`] - run several reducers over the same state in order
//!
//! Combinators never fail. An action that a reducer does not handle, an
//! action whose adapter does not match, and an action addressed at state
//! that no longer exists all produce [`Effect::none`] and leave state alone.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use super::effect::Effect;
use super::path::Path;
use super::prism::Prism;

type ReduceFn<S, A, E> = dyn Fn(&mut S, A, &E) -> Effect<A> + Send + Sync;

/// A state transition that may schedule follow-up actions
pub struct Reducer<S, A, E> {
    reduce: Arc<ReduceFn<S, A, E>>,
}

impl<S, A, E> Reducer<S, A, E>
where
    S: 'static,
    A: Send + 'static,
    E: 'static,
{
    pub fn new<F>(reduce: F) -> Self
    where
        F: Fn(&mut S, A, &E) -> Effect<A> + Send + Sync + 'static,
    {
        Self {
            reduce: Arc::new(reduce),
        }
    }

    /// A reducer that ignores every action
    pub fn empty() -> Self {
        Self::new(|_, _, _| Effect::none())
    }

    /// Apply the reducer to `state`
    pub fn reduce(&self, state: &mut S, action: A, environment: &E) -> Effect<A> {
        (self.reduce)(state, action, environment)
    }

    /// Focus this reducer on one field of a parent state and one case of a
    /// parent action
    ///
    /// Parent actions that `prism` cannot extract are ignored without
    /// touching state. Emitted child actions are embedded back through
    /// `prism`; the child environment is derived with `environment`.
    pub fn lift<PS, PA, PE, M>(
        self,
        path: Path<PS, S>,
        prism: Prism<PA, A>,
        environment: M,
    ) -> Reducer<PS, PA, PE>
    where
        PS: 'static,
        PA: Send + 'static,
        PE: 'static,
        M: Fn(&PE) -> E + Send + Sync + 'static,
    {
        Reducer::new(move |state: &mut PS, action: PA, parent_env: &PE| {
            let Some(action) = prism.extract(action) else {
                return Effect::none();
            };
            let env = environment(parent_env);
            let prism = prism.clone();
            self.reduce(path.get_mut(state), action, &env)
                .map(move |action| prism.embed(action))
        })
    }

    /// Accept state that may be absent
    ///
    /// When the state is `None` the wrapped reducer is never invoked and the
    /// result is the empty effect. Removing an element from its container is
    /// what makes stale actions addressed at it harmless.
    pub fn optional(self) -> Reducer<Option<S>, A, E> {
        Reducer::new(move |state: &mut Option<S>, action: A, env: &E| match state {
            Some(state) => self.reduce(state, action, env),
            None => Effect::none(),
        })
    }

    /// Focus this reducer on one element of a collection
    ///
    /// `prism` extracts a `(key, action)` pair. A key with no element in the
    /// collection (a removed map entry, an out-of-bounds index) is treated as
    /// absent state: nothing runs. Emitted actions are re-embedded with the
    /// same key.
    pub fn indexed<PS, PA, PE, C, M>(
        self,
        path: Path<PS, C>,
        prism: Prism<PA, (C::Key, A)>,
        environment: M,
    ) -> Reducer<PS, PA, PE>
    where
        PS: 'static,
        PA: Send + 'static,
        PE: 'static,
        C: IndexedCollection<Item = S> + 'static,
        C::Key: Clone + fmt::Debug + Send + 'static,
        M: Fn(&PE) -> E + Send + Sync + 'static,
    {
        Reducer::new(move |state: &mut PS, action: PA, parent_env: &PE| {
            let Some((key, action)) = prism.extract(action) else {
                return Effect::none();
            };
            let Some(element) = path.get_mut(state).element_mut(&key) else {
                log::trace!("Dropping action for missing element {:?}", key);
                return Effect::none();
            };
            let env = environment(parent_env);
            let prism = prism.clone();
            self.reduce(element, action, &env)
                .map(move |action| prism.embed((key.clone(), action)))
        })
    }

    /// Run several reducers over the same state, in order
    ///
    /// See [`combine`].
    pub fn combine<I>(reducers: I) -> Self
    where
        I: IntoIterator<Item = Reducer<S, A, E>>,
        A: Clone,
    {
        combine(reducers)
    }
}

/// Run several reducers over the same state, in order
///
/// Each reducer sees the state as left by the one before it; that order is
/// the only ordering guarantee. The effects of all reducers are merged and
/// run concurrently, so their emissions may interleave arbitrarily.
pub fn combine<S, A, E, I>(reducers: I) -> Reducer<S, A, E>
where
    S: 'static,
    A: Clone + Send + 'static,
    E: 'static,
    I: IntoIterator<Item = Reducer<S, A, E>>,
{
    let reducers: Vec<Reducer<S, A, E>> = reducers.into_iter().collect();
    Reducer::new(move |state: &mut S, action: A, env: &E| {
        Effect::merge(
            reducers
                .iter()
                .map(|reducer| reducer.reduce(state, action.clone(), env))
                .collect::<Vec<_>>(),
        )
    })
}

impl<S, A, E> Clone for Reducer<S, A, E> {
    fn clone(&self) -> Self {
        Self {
            reduce: Arc::clone(&self.reduce),
        }
    }
}

impl<S, A, E> fmt::Debug for Reducer<S, A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reducer")
            .field("state", &std::any::type_name::<S>())
            .field("action", &std::any::type_name::<A>())
            .finish()
    }
}

/// Collections whose elements can be addressed by [`Reducer::indexed`]
///
/// Maps are addressed by key; `Vec` is addressed by position and treats an
/// out-of-bounds index as a missing element.
pub trait IndexedCollection {
    type Key;
    type Item;

    fn element_mut(&mut self, key: &Self::Key) -> Option<&mut Self::Item>;
}

impl<K: Eq + Hash, V> IndexedCollection for HashMap<K, V> {
    type Key = K;
    type Item = V;

    fn element_mut(&mut self, key: &K) -> Option<&mut V> {
        self.get_mut(key)
    }
}

impl<K: Ord, V> IndexedCollection for BTreeMap<K, V> {
    type Key = K;
    type Item = V;

    fn element_mut(&mut self, key: &K) -> Option<&mut V> {
        self.get_mut(key)
    }
}

impl<V> IndexedCollection for Vec<V> {
    type Key = usize;
    type Item = V;

    fn element_mut(&mut self, index: &usize) -> Option<&mut V> {
        self.get_mut(*index)
    }
}
