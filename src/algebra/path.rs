// SPDX-License-Identifier: MIT

//! Addressable paths into composite state
//!
//! A [`Path`] focuses a reducer on one field of a larger state value without
//! the reducer knowing the shape of its parent. It is a lens: besides the
//! borrowing accessors it offers `get_cloned`/`set`, and every path handed to
//! a combinator is expected to satisfy
//!
//! - `path.get_cloned(&path.set(o, v)) == v`
//! - `path.set(o.clone(), path.get_cloned(&o)) == o`
//!
//! Nothing checks these laws at runtime.

use std::fmt;
use std::sync::Arc;

type Getter<O, V> = dyn Fn(&O) -> &V + Send + Sync;
type MutGetter<O, V> = dyn Fn(&mut O) -> &mut V + Send + Sync;

/// Read/write accessor from an owner value `O` to a field of type `V`
pub struct Path<O, V> {
    get: Arc<Getter<O, V>>,
    get_mut: Arc<MutGetter<O, V>>,
}

impl<O: 'static, V: 'static> Path<O, V> {
    /// Create a path from a shared and a mutable accessor
    ///
    /// Both accessors must point at the same place.
    pub fn new<G, M>(get: G, get_mut: M) -> Self
    where
        G: Fn(&O) -> &V + Send + Sync + 'static,
        M: Fn(&mut O) -> &mut V + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            get_mut: Arc::new(get_mut),
        }
    }

    /// Borrow the focused value
    pub fn get<'a>(&self, owner: &'a O) -> &'a V {
        (self.get)(owner)
    }

    /// Mutably borrow the focused value
    pub fn get_mut<'a>(&self, owner: &'a mut O) -> &'a mut V {
        (self.get_mut)(owner)
    }

    /// Copy the focused value out of the owner
    pub fn get_cloned(&self, owner: &O) -> V
    where
        V: Clone,
    {
        self.get(owner).clone()
    }

    /// Replace the focused value, returning the updated owner
    pub fn set(&self, mut owner: O, value: V) -> O {
        *self.get_mut(&mut owner) = value;
        owner
    }

    /// Replace the focused value in place
    pub fn set_in(&self, owner: &mut O, value: V) {
        *self.get_mut(owner) = value;
    }

    /// Focus further into the value this path points at
    pub fn then<W: 'static>(self, next: Path<V, W>) -> Path<O, W> {
        let (outer_get, outer_mut) = (self.get, self.get_mut);
        let (inner_get, inner_mut) = (next.get, next.get_mut);
        Path::new(
            move |owner: &O| inner_get(outer_get(owner)),
            move |owner: &mut O| inner_mut(outer_mut(owner)),
        )
    }
}

impl<O: 'static> Path<O, O> {
    /// The path that focuses on the whole value
    pub fn identity() -> Self {
        Self::new(|owner: &O| owner, |owner: &mut O| owner)
    }
}

impl<O, V> Clone for Path<O, V> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            get_mut: Arc::clone(&self.get_mut),
        }
    }
}

impl<O, V> fmt::Debug for Path<O, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("owner", &std::any::type_name::<O>())
            .field("value", &std::any::type_name::<V>())
            .finish()
    }
}

/// Build a [`Path`] to a (possibly nested) field
///
/// ```
/// use reflow_rs::path;
///
/// struct Settings { volume: u8 }
/// struct App { settings: Settings }
///
/// let volume = path!(App => settings.volume);
/// let mut app = App { settings: Settings { volume: 3 } };
/// *volume.get_mut(&mut app) += 1;
/// assert_eq!(*volume.get(&app), 4);
/// ```
#[macro_export]
macro_rules! path {
    ($owner:ty => $($field:tt).+) => {
        $crate::algebra::Path::new(
            |owner: &$owner| &owner.$($field).+,
            |owner: &mut $owner| &mut owner.$($field).+,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Inner {
        value: i32,
        label: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Outer {
        inner: Inner,
        flag: bool,
    }

    fn sample() -> Outer {
        Outer {
            inner: Inner {
                value: 7,
                label: "seven".to_string(),
            },
            flag: true,
        }
    }

    #[test]
    fn test_get_set_law() {
        let path = path!(Outer => inner.value);
        let updated = path.set(sample(), 42);
        assert_eq!(path.get_cloned(&updated), 42);
    }

    #[test]
    fn test_set_get_law() {
        let path = path!(Outer => inner);
        let owner = sample();
        let roundtrip = path.set(owner.clone(), path.get_cloned(&owner));
        assert_eq!(roundtrip, owner);
    }

    #[test]
    fn test_set_leaves_other_fields() {
        let path = path!(Outer => inner.label);
        let updated = path.set(sample(), "eight".to_string());
        assert_eq!(updated.inner.value, 7);
        assert!(updated.flag);
        assert_eq!(updated.inner.label, "eight");
    }

    #[test]
    fn test_then_composes() {
        let composed = path!(Outer => inner).then(path!(Inner => value));
        let mut owner = sample();
        composed.set_in(&mut owner, 1);
        assert_eq!(owner.inner.value, 1);
        assert_eq!(*composed.get(&owner), 1);
    }

    #[test]
    fn test_identity() {
        let path = Path::<Outer, Outer>::identity();
        let replacement = Outer {
            flag: false,
            ..sample()
        };
        assert_eq!(path.set(sample(), replacement.clone()), replacement);
    }
}
