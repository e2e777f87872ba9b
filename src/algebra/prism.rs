// SPDX-License-Identifier: MIT

//! Action adapters between a parent action space and a child action space
//!
//! A [`Prism`] is a partial isomorphism: `embed` always succeeds, `extract`
//! only succeeds for values that `embed` could have produced, and
//! `extract(embed(c)) == Some(c)` must hold for every child action `c`.

use std::fmt;
use std::sync::Arc;

type Embed<P, C> = dyn Fn(C) -> P + Send + Sync;
type Extract<P, C> = dyn Fn(P) -> Option<C> + Send + Sync;

/// Bidirectional mapping between parent actions `P` and child actions `C`
pub struct Prism<P, C> {
    embed: Arc<Embed<P, C>>,
    extract: Arc<Extract<P, C>>,
}

impl<P: 'static, C: 'static> Prism<P, C> {
    pub fn new<E, X>(embed: E, extract: X) -> Self
    where
        E: Fn(C) -> P + Send + Sync + 'static,
        X: Fn(P) -> Option<C> + Send + Sync + 'static,
    {
        Self {
            embed: Arc::new(embed),
            extract: Arc::new(extract),
        }
    }

    /// Lift a child action into the parent action space
    pub fn embed(&self, child: C) -> P {
        (self.embed)(child)
    }

    /// Recover the child action, or `None` if the parent belongs elsewhere
    pub fn extract(&self, parent: P) -> Option<C> {
        (self.extract)(parent)
    }

    /// Compose with a prism one layer further down
    ///
    /// Embedding through the result wraps twice; extracting unwraps twice.
    pub fn then<G: 'static>(self, next: Prism<C, G>) -> Prism<P, G> {
        let (outer_embed, outer_extract) = (self.embed, self.extract);
        let (inner_embed, inner_extract) = (next.embed, next.extract);
        Prism::new(
            move |grandchild| outer_embed(inner_embed(grandchild)),
            move |parent| outer_extract(parent).and_then(|child| inner_extract(child)),
        )
    }
}

impl<A: 'static> Prism<A, A> {
    /// The prism that accepts every action unchanged
    pub fn identity() -> Self {
        Self::new(|action| action, Some)
    }
}

impl<P, C> Clone for Prism<P, C> {
    fn clone(&self) -> Self {
        Self {
            embed: Arc::clone(&self.embed),
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<P, C> fmt::Debug for Prism<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prism")
            .field("parent", &std::any::type_name::<P>())
            .field("child", &std::any::type_name::<C>())
            .finish()
    }
}

/// Build a [`Prism`] for a single-field tuple variant
///
/// ```
/// use reflow_rs::prism;
///
/// #[derive(Debug, PartialEq)]
/// enum Child { Tap }
/// #[derive(Debug, PartialEq)]
/// enum Parent { Child(Child), Other }
///
/// let child = prism!(Parent::Child);
/// assert_eq!(child.embed(Child::Tap), Parent::Child(Child::Tap));
/// assert_eq!(child.extract(Parent::Other), None);
/// ```
#[macro_export]
macro_rules! prism {
    ($variant:path) => {
        $crate::algebra::Prism::new($variant, |parent| match parent {
            $variant(child) => Some(child),
            #[allow(unreachable_patterns)]
            _ => None,
        })
    };
}
