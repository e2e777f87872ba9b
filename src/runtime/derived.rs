// SPDX-License-Identifier: MIT

//! Derived stores - read projections that forward writes to their parent
//!
//! A derived store caches `derive_state(parent_state)` and never changes it
//! from its own `send`: every action sent to it is embedded into the parent's
//! action space and forwarded. The cache is refreshed by a subscription on
//! the parent, and only replaced (and observers notified) when the projected
//! value actually changed.
//!
//! The derived store holds the parent weakly; the parent does not know its
//! derived stores exist.

use std::sync::Arc;

use super::config::StoreConfig;
use super::store::{Dispatch, Store, StoreBuilder, StoreInner};

impl<S, A> StoreInner<S, A>
where
    S: Clone + PartialEq + Send + 'static,
    A: Send + 'static,
{
    /// Replace the cached state if the new projection differs
    pub(crate) fn resync(&self, projected: S) {
        let committed = {
            let mut state = self.state.lock();
            if *state == projected {
                return;
            }
            *state = projected;
            (!self.observers.is_empty()).then(|| state.clone())
        };
        if let Some(committed) = committed {
            self.observers.notify(&committed);
        }
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + 'static,
    A: Send + 'static,
{
    /// Project this store onto a smaller state and action space
    ///
    /// The derived store starts at `derive_state` of the current state and
    /// follows every change of this store whose projection differs from the
    /// cached value. Actions sent to it are wrapped with `embed_action` and
    /// sent here. Deriving from a derived store works the same way, with
    /// embeddings composing.
    pub fn derived<DS, DA, FS, FA>(&self, derive_state: FS, embed_action: FA) -> Store<DS, DA>
    where
        DS: Clone + PartialEq + Send + 'static,
        DA: Send + 'static,
        FS: Fn(&S) -> DS + Send + Sync + 'static,
        FA: Fn(DA) -> A + Send + Sync + 'static,
    {
        let derive_state = Arc::new(derive_state);
        let label = format!("{}/derived", self.label());

        let parent = self.downgrade();
        let forward_label = label.clone();
        let forward = move |action: DA| match parent.upgrade() {
            Some(parent) => parent.send(embed_action(action)),
            None => log::warn!("[{}] Parent store is gone, dropping action", forward_label),
        };

        let initial = self.with_state(|state| derive_state(state));
        let config = StoreConfig {
            label,
            inflight_warning: self.inner.inflight_warning,
            ..StoreConfig::default()
        };
        let child = StoreBuilder::from_dispatch(initial, Dispatch::Forward(Box::new(forward)))
            .config(config)
            .scheduler(Arc::clone(&self.inner.scheduler))
            .build();

        let target = child.downgrade();
        let projection = Arc::clone(&derive_state);
        let subscription = self.subscribe(move |state: &S| {
            if let Some(child) = target.upgrade() {
                child.resync(projection(state));
            }
        });
        *child.inner.upstream.lock() = Some(subscription);

        // Catch up with anything committed between the first projection and
        // the subscription. The parent's state stays locked until the child
        // holds the projection, so a concurrent commit is either seen here or
        // notified afterwards. The child has no observers yet.
        self.with_state(|state| child.inner.resync(derive_state(state)));

        log::debug!("[{}] Derived store attached", child.label());
        child
    }

    /// Derive a view store through a [`Connector`]
    pub fn connect<C>(&self, connector: C) -> Store<C::ViewState, C::ViewAction>
    where
        C: Connector<State = S, Action = A>,
    {
        let connector = Arc::new(connector);
        let lift = Arc::clone(&connector);
        self.derived(
            move |state: &S| connector.project_state(state),
            move |action| lift.lift_action(action),
        )
    }
}

/// Maps a full store onto the state and actions a view works with
pub trait Connector: Send + Sync + 'static {
    type State;
    type Action;
    type ViewState: Clone + PartialEq + Send + 'static;
    type ViewAction: Send + 'static;

    fn project_state(&self, state: &Self::State) -> Self::ViewState;

    fn lift_action(&self, action: Self::ViewAction) -> Self::Action;
}
