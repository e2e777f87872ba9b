// SPDX-License-Identifier: MIT

//! Effects - asynchronous producers of follow-up actions
//!
//! An [`Effect`] yields zero or more actions and then completes. It has no
//! error channel: an effect that can fail reports the failure as an action.
//! [`Effect::none`] is the one canonical empty effect; combinators and the
//! store never need to distinguish "no effect" from "an effect that emits
//! nothing".

use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::fmt;
use std::future::Future;

/// A stream of actions to feed back into a store
#[must_use = "effects do nothing unless returned to a store"]
pub struct Effect<A> {
    kind: EffectKind<A>,
}

enum EffectKind<A> {
    None,
    Stream(BoxStream<'static, A>),
}

impl<A: Send + 'static> Effect<A> {
    /// The empty effect
    pub fn none() -> Self {
        Self {
            kind: EffectKind::None,
        }
    }

    /// Emit a single action as soon as the effect is run
    pub fn send(action: A) -> Self {
        Self::from_stream(stream::once(async move { action }))
    }

    /// Emit the output of a future
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        Self::from_stream(stream::once(future))
    }

    /// Run a future for its side effects only; nothing is fed back
    pub fn fire_and_forget<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self::from_stream(stream::once(future).filter_map(|()| async { None }))
    }

    /// Emit every item of an arbitrary stream
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = A> + Send + 'static,
    {
        Self {
            kind: EffectKind::Stream(stream.boxed()),
        }
    }

    /// Run several effects concurrently
    ///
    /// Items from different effects interleave in whatever order they become
    /// ready. Merging only empty effects yields [`Effect::none`].
    pub fn merge<I>(effects: I) -> Self
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut streams: Vec<BoxStream<'static, A>> = effects
            .into_iter()
            .filter_map(|effect| effect.into_stream())
            .collect();

        match streams.len() {
            0 => Self::none(),
            1 => Self {
                kind: EffectKind::Stream(streams.remove(0)),
            },
            _ => Self::from_stream(stream::select_all(streams)),
        }
    }

    /// Run several effects one after another
    pub fn concat<I>(effects: I) -> Self
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let streams: Vec<BoxStream<'static, A>> = effects
            .into_iter()
            .filter_map(|effect| effect.into_stream())
            .collect();

        if streams.is_empty() {
            Self::none()
        } else {
            Self::from_stream(stream::iter(streams).flatten())
        }
    }

    /// Transform every emitted action
    pub fn map<B, F>(self, f: F) -> Effect<B>
    where
        B: Send + 'static,
        F: FnMut(A) -> B + Send + 'static,
    {
        match self.kind {
            EffectKind::None => Effect::none(),
            EffectKind::Stream(stream) => Effect::from_stream(stream.map(f)),
        }
    }

    /// Whether this is the empty effect
    pub fn is_none(&self) -> bool {
        matches!(self.kind, EffectKind::None)
    }

    /// The underlying stream, or `None` for the empty effect
    pub fn into_stream(self) -> Option<BoxStream<'static, A>> {
        match self.kind {
            EffectKind::None => None,
            EffectKind::Stream(stream) => Some(stream),
        }
    }

    /// Collect every emitted action
    ///
    /// Mostly useful for exercising reducers without a store.
    pub fn collect(self) -> BoxFuture<'static, Vec<A>> {
        match self.into_stream() {
            None => Box::pin(async { Vec::new() }),
            Some(stream) => Box::pin(stream.collect()),
        }
    }
}

impl<A: Send + 'static> Default for Effect<A> {
    fn default() -> Self {
        Self::none()
    }
}

impl<A: Send + 'static> FromIterator<Effect<A>> for Effect<A> {
    fn from_iter<I: IntoIterator<Item = Effect<A>>>(iter: I) -> Self {
        Self::merge(iter)
    }
}

impl<A> fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EffectKind::None => f.write_str("Effect::None"),
            EffectKind::Stream(_) => f.write_str("Effect::Stream(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_none_is_empty() {
        let effect = Effect::<u8>::none();
        assert!(effect.is_none());
        assert!(effect.collect().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_emits_once() {
        let effect = Effect::send(5u8);
        assert!(!effect.is_none());
        assert_eq!(effect.collect().await, vec![5]);
    }

    #[tokio::test]
    async fn test_future() {
        let effect = Effect::future(async { "done" });
        assert_eq!(effect.collect().await, vec!["done"]);
    }

    #[tokio::test]
    async fn test_fire_and_forget_runs_but_emits_nothing() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let effect = Effect::<u8>::fire_and_forget(async move {
            flag.store(true, Ordering::SeqCst);
        });
        assert!(effect.collect().await.is_empty());
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_merge_of_nones_is_none() {
        let merged = Effect::<u8>::merge(vec![Effect::none(), Effect::none()]);
        assert!(merged.is_none());
        let merged: Effect<u8> = std::iter::empty().collect();
        assert!(merged.is_none());
    }

    #[tokio::test]
    async fn test_merge_yields_everything() {
        let merged = Effect::merge(vec![
            Effect::send(1u8),
            Effect::none(),
            Effect::from_stream(stream::iter(vec![2, 3])),
        ]);
        let mut items = merged.collect().await;
        items.sort();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_concat_preserves_order() {
        let effect = Effect::concat(vec![
            Effect::from_stream(stream::iter(vec![1u8, 2])),
            Effect::none(),
            Effect::send(3),
        ]);
        assert_eq!(effect.collect().await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_map() {
        let effect = Effect::send(2u8).map(|n| n * 10);
        assert_eq!(effect.collect().await, vec![20]);
        assert!(Effect::<u8>::none().map(|n| n + 1).is_none());
    }
}
