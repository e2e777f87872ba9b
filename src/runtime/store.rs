// SPDX-License-Identifier: MIT

//! The store - single owner of application state
//!
//! A [`Store`] holds one state value and the reducer (closed over its
//! environment) that is allowed to change it. Every action goes through
//! [`Store::send`]:
//!
//! 1. The action is admitted to the store's mailbox.
//! 2. If no other call is draining the mailbox, the caller drains it: each
//!    action is reduced under the state lock, observers are notified with the
//!    committed state, and the returned effect is started.
//! 3. An effect is polled once on the caller's thread. Values it has ready
//!    are admitted straight back to the mailbox; if it finishes there it is
//!    never registered. Otherwise it is registered under a fresh id and handed
//!    to the store's scheduler, and each later value re-enters `send`.
//!
//! Consequently state mutations happen in admission order, one at a time,
//! and everything that follows synchronously from an action (ready effect
//! values, sends made by observers) is applied before the outermost `send`
//! returns. Values produced asynchronously arrive later, through the
//! scheduler. Effect chains may recurse without limit; keeping them finite
//! is up to the reducers.

use futures::future::abortable;
use futures::stream::{BoxStream, Stream, StreamExt};
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use super::config::StoreConfig;
use super::error::Result;
use super::observer::{Observers, Subscription};
use super::registry::EffectRegistry;
use super::scheduler::{CurrentThreadScheduler, SharedScheduler};
use crate::algebra::{Effect, Reducer};

type ReduceFn<S, A> = dyn Fn(&mut S, A) -> Effect<A> + Send + Sync;
type ForwardFn<A> = dyn Fn(A) + Send + Sync;

/// What a store does with an admitted action
pub(crate) enum Dispatch<S, A> {
    /// Run a reducer against the store's own state
    Reduce(Box<ReduceFn<S, A>>),
    /// Hand the action to another store; local state is left alone
    Forward(Box<ForwardFn<A>>),
}

struct Mailbox<A> {
    queue: VecDeque<A>,
    draining: bool,
}

/// Pops admitted actions until the mailbox is empty, then gives up the
/// draining role. The role is also released if a reducer panics.
struct Drain<'a, A> {
    mailbox: &'a Mutex<Mailbox<A>>,
    finished: bool,
}

impl<A> Iterator for Drain<'_, A> {
    type Item = A;

    fn next(&mut self) -> Option<A> {
        let mut mailbox = self.mailbox.lock();
        let next = mailbox.queue.pop_front();
        if next.is_none() {
            mailbox.draining = false;
            self.finished = true;
        }
        next
    }
}

impl<A> Drop for Drain<'_, A> {
    fn drop(&mut self) {
        if !self.finished {
            self.mailbox.lock().draining = false;
        }
    }
}

pub(crate) struct StoreInner<S, A> {
    pub(crate) label: String,
    pub(crate) state: Mutex<S>,
    dispatch: Dispatch<S, A>,
    mailbox: Mutex<Mailbox<A>>,
    pub(crate) observers: Arc<Observers<S>>,
    effects: EffectRegistry,
    pub(crate) scheduler: SharedScheduler,
    pub(crate) inflight_warning: Option<usize>,
    /// Derived stores: the subscription that keeps this store in sync with its parent
    pub(crate) upstream: Mutex<Option<Subscription>>,
}

impl<S, A> StoreInner<S, A>
where
    S: Clone + Send + 'static,
    A: Send + 'static,
{
    pub(crate) fn send(self: &Arc<Self>, action: A) {
        {
            let mut mailbox = self.mailbox.lock();
            mailbox.queue.push_back(action);
            if mailbox.draining {
                return;
            }
            mailbox.draining = true;
        }

        let drain = Drain {
            mailbox: &self.mailbox,
            finished: false,
        };
        for action in drain {
            self.process(action);
        }
    }

    fn process(self: &Arc<Self>, action: A) {
        let reduce = match &self.dispatch {
            Dispatch::Reduce(reduce) => reduce,
            Dispatch::Forward(forward) => {
                forward(action);
                return;
            }
        };

        let (effect, committed) = {
            let mut state = self.state.lock();
            let effect = reduce(&mut *state, action);
            let committed = (!self.observers.is_empty()).then(|| state.clone());
            (effect, committed)
        };

        if let Some(committed) = committed {
            self.observers.notify(&committed);
        }
        self.start_effect(effect);
    }

    fn start_effect(self: &Arc<Self>, effect: Effect<A>) {
        let Some(mut stream) = effect.into_stream() else {
            return;
        };

        {
            let _runtime = self.scheduler.enter();
            loop {
                match stream.next().now_or_never() {
                    Some(Some(action)) => self.mailbox.lock().queue.push_back(action),
                    Some(None) => {
                        log::trace!("[{}] Effect completed synchronously", self.label);
                        return;
                    }
                    None => break,
                }
            }
        }

        let id = Uuid::new_v4();
        let (task, handle) = abortable(deliver(Arc::downgrade(self), stream));
        let inflight = self.effects.register(id, handle);
        log::debug!(
            "[{}] Effect {} scheduled on {} ({} in flight)",
            self.label,
            id,
            self.scheduler.name(),
            inflight
        );
        if let Some(limit) = self.inflight_warning {
            if inflight > limit {
                log::warn!(
                    "[{}] {} effects in flight, above the warning threshold of {}",
                    self.label,
                    inflight,
                    limit
                );
            }
        }

        let store = Arc::downgrade(self);
        self.scheduler.spawn(Box::pin(async move {
            let outcome = task.await;
            if let Some(store) = store.upgrade() {
                store.effects.release(&id);
                match outcome {
                    Ok(()) => log::debug!("[{}] Effect {} completed", store.label, id),
                    Err(_) => log::debug!("[{}] Effect {} cancelled", store.label, id),
                }
            }
        }));
    }
}

/// Feed every remaining value of an effect back into the store
async fn deliver<S, A>(store: Weak<StoreInner<S, A>>, mut stream: BoxStream<'static, A>)
where
    S: Clone + Send + 'static,
    A: Send + 'static,
{
    while let Some(action) = stream.next().await {
        match store.upgrade() {
            Some(store) => store.send(action),
            None => break,
        }
    }
}

impl<S, A> Drop for StoreInner<S, A> {
    fn drop(&mut self) {
        let released = self.effects.abort_all();
        if released > 0 {
            log::debug!(
                "[{}] Store dropped, released {} in-flight effects",
                self.label,
                released
            );
        }
    }
}

/// Handle to a store
///
/// Cloning the handle shares the same store. The store, and every effect it
/// still has in flight, is released when the last handle is dropped.
pub struct Store<S, A> {
    pub(crate) inner: Arc<StoreInner<S, A>>,
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + 'static,
    A: Send + 'static,
{
    /// Create a store with the default configuration
    pub fn new<E>(initial_state: S, reducer: Reducer<S, A, E>, environment: E) -> Self
    where
        E: Send + Sync + 'static,
    {
        Self::builder(initial_state, reducer, environment).build()
    }

    /// Start configuring a store
    pub fn builder<E>(
        initial_state: S,
        reducer: Reducer<S, A, E>,
        environment: E,
    ) -> StoreBuilder<S, A>
    where
        E: Send + Sync + 'static,
    {
        let reduce = move |state: &mut S, action: A| reducer.reduce(state, action, &environment);
        StoreBuilder::from_dispatch(initial_state, Dispatch::Reduce(Box::new(reduce)))
    }

    /// Admit an action
    pub fn send(&self, action: A) {
        self.inner.send(action);
    }

    /// Snapshot of the current state
    pub fn state(&self) -> S {
        self.inner.state.lock().clone()
    }

    /// Read the current state without cloning it
    ///
    /// The state is locked while `f` runs: `f` must not send to this store.
    pub fn with_state<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        f(&self.inner.state.lock())
    }

    /// Observe every committed state
    ///
    /// The observer is called after each mutation with the new state; it is
    /// not called with the state current at subscription time.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.inner.observers.attach(observer)
    }

    /// Committed states as a stream, one item per notification
    pub fn states(&self) -> StateStream<S> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |state: &S| {
            let _ = tx.send(state.clone());
        });
        StateStream {
            receiver: UnboundedReceiverStream::new(rx),
            _subscription: subscription,
        }
    }

    /// Number of effects currently registered as in flight
    pub fn inflight_effects(&self) -> usize {
        self.inner.effects.len()
    }

    /// Drive effects queued on a caller-driven scheduler
    ///
    /// Returns how many effect tasks finished. Always 0 for schedulers that
    /// run their own executor.
    pub fn run_pending_effects(&self) -> usize {
        self.inner.scheduler.run_until_stalled()
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn scheduler(&self) -> &SharedScheduler {
        &self.inner.scheduler
    }

    pub(crate) fn downgrade(&self) -> Weak<StoreInner<S, A>> {
        Arc::downgrade(&self.inner)
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("label", &self.inner.label)
            .field("state", &*self.inner.state.lock())
            .field("inflight", &self.inner.effects.len())
            .finish()
    }
}

/// Configures and builds a [`Store`]
pub struct StoreBuilder<S, A> {
    state: S,
    dispatch: Dispatch<S, A>,
    config: StoreConfig,
    scheduler: Option<SharedScheduler>,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Clone + Send + 'static,
    A: Send + 'static,
{
    pub(crate) fn from_dispatch(state: S, dispatch: Dispatch<S, A>) -> Self {
        Self {
            state,
            dispatch,
            config: StoreConfig::default(),
            scheduler: None,
        }
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    /// Run effects on this scheduler instead of the configured kind
    pub fn scheduler(mut self, scheduler: SharedScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Build the store, failing if the configured scheduler is unavailable
    pub fn try_build(mut self) -> Result<Store<S, A>> {
        let scheduler = match self.scheduler.take() {
            Some(scheduler) => scheduler,
            None => self.config.scheduler.resolve()?,
        };
        Ok(self.assemble(scheduler))
    }

    /// Build the store, falling back to a current-thread scheduler if the
    /// configured one is unavailable
    pub fn build(mut self) -> Store<S, A> {
        let scheduler = match self.scheduler.take() {
            Some(scheduler) => scheduler,
            None => self.config.scheduler.resolve().unwrap_or_else(|e| {
                log::warn!(
                    "[{}] {}, falling back to the current-thread scheduler",
                    self.config.label,
                    e
                );
                Arc::new(CurrentThreadScheduler::new())
            }),
        };
        self.assemble(scheduler)
    }

    fn assemble(self, scheduler: SharedScheduler) -> Store<S, A> {
        log::debug!(
            "[{}] Store created on {} scheduler",
            self.config.label,
            scheduler.name()
        );
        Store {
            inner: Arc::new(StoreInner {
                label: self.config.label,
                state: Mutex::new(self.state),
                dispatch: self.dispatch,
                mailbox: Mutex::new(Mailbox {
                    queue: VecDeque::new(),
                    draining: false,
                }),
                observers: Arc::new(Observers::new()),
                effects: EffectRegistry::new(),
                scheduler,
                inflight_warning: self.config.inflight_warning,
                upstream: Mutex::new(None),
            }),
        }
    }
}

/// Stream of committed states returned by [`Store::states`]
///
/// Stays subscribed until dropped.
pub struct StateStream<S> {
    receiver: UnboundedReceiverStream<S>,
    _subscription: Subscription,
}

impl<S> Stream for StateStream<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}
