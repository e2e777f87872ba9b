// SPDX-License-Identifier: MIT

//! Two-way handles for view inputs

use std::fmt;
use std::sync::Arc;

use super::store::Store;

/// A value read from a store that is written back by sending an action
pub struct Binding<V> {
    get: Arc<dyn Fn() -> V + Send + Sync>,
    set: Arc<dyn Fn(V) + Send + Sync>,
}

impl<V: 'static> Binding<V> {
    pub fn new<G, W>(get: G, set: W) -> Self
    where
        G: Fn() -> V + Send + Sync + 'static,
        W: Fn(V) + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// A binding that always reads `value` and ignores writes
    pub fn constant(value: V) -> Self
    where
        V: Clone + Send + Sync,
    {
        Self::new(move || value.clone(), |_| {})
    }

    pub fn get(&self) -> V {
        (self.get)()
    }

    pub fn set(&self, value: V) {
        (self.set)(value)
    }
}

impl<V> Clone for Binding<V> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<V> fmt::Debug for Binding<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("value", &std::any::type_name::<V>())
            .finish()
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + 'static,
    A: Send + 'static,
{
    /// Bind a piece of state to the action that changes it
    pub fn binding<V, G, T>(&self, get: G, to_action: T) -> Binding<V>
    where
        V: 'static,
        G: Fn(&S) -> V + Send + Sync + 'static,
        T: Fn(V) -> A + Send + Sync + 'static,
    {
        let reader = self.clone();
        let writer = self.clone();
        Binding::new(
            move || reader.with_state(|state| get(state)),
            move |value| writer.send(to_action(value)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{Effect, Reducer};

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Form {
        name: String,
    }

    #[derive(Debug, Clone)]
    enum FormAction {
        NameChanged(String),
    }

    #[test]
    fn test_binding_reads_and_sends() {
        let reducer = Reducer::new(|state: &mut Form, action, _: &()| {
            match action {
                FormAction::NameChanged(name) => state.name = name,
            }
            Effect::none()
        });
        let store = Store::new(Form::default(), reducer, ());
        let name = store.binding(|s: &Form| s.name.clone(), FormAction::NameChanged);

        assert_eq!(name.get(), "");
        name.set("Ada".to_string());
        assert_eq!(name.get(), "Ada");
        assert_eq!(store.state().name, "Ada");
    }

    #[test]
    fn test_constant() {
        let binding = Binding::constant(3);
        binding.set(4);
        assert_eq!(binding.get(), 3);
        assert_eq!(binding.clone().get(), 3);
    }
}
