// SPDX-License-Identifier: MIT

//! Todo list feature
//!
//! Items live in a map keyed by id and are driven by a per-item reducer
//! through `indexed`; the optional editor is driven through `optional`.
//! Removing an item or closing the editor turns late actions addressed at
//! them into no-ops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::algebra::{combine, Effect, Prism, Reducer};
use crate::{path, prism};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TodoAction {
    Toggle,
    Rename(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Editor {
    pub todo: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    Type(String),
    Clear,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodosState {
    pub items: HashMap<Uuid, Todo>,
    pub editing: Option<Editor>,
}

impl TodosState {
    /// Items oldest first
    pub fn ordered(&self) -> Vec<&Todo> {
        let mut items: Vec<&Todo> = self.items.values().collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        items
    }

    pub fn remaining(&self) -> usize {
        self.items.values().filter(|todo| !todo.done).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TodosAction {
    Add(String),
    Remove(Uuid),
    ClearCompleted,
    Todo(Uuid, TodoAction),
    Edit(Uuid),
    Editor(EditorAction),
    Save,
    Cancel,
}

/// Current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone)]
pub struct TodosEnvironment {
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn Fn() -> Uuid + Send + Sync>,
}

impl TodosEnvironment {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn Fn() -> Uuid + Send + Sync>) -> Self {
        Self { clock, ids }
    }
}

impl Default for TodosEnvironment {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(Uuid::new_v4))
    }
}

fn todo_reducer() -> Reducer<Todo, TodoAction, ()> {
    Reducer::new(|todo: &mut Todo, action, _: &()| {
        match action {
            TodoAction::Toggle => todo.done = !todo.done,
            TodoAction::Rename(title) => todo.title = title,
        }
        Effect::none()
    })
}

fn editor_reducer() -> Reducer<Editor, EditorAction, ()> {
    Reducer::new(|editor: &mut Editor, action, _: &()| {
        match action {
            EditorAction::Type(text) => editor.text.push_str(&text),
            EditorAction::Clear => editor.text.clear(),
        }
        Effect::none()
    })
}

fn item_prism() -> Prism<TodosAction, (Uuid, TodoAction)> {
    Prism::new(
        |(id, action)| TodosAction::Todo(id, action),
        |action| match action {
            TodosAction::Todo(id, action) => Some((id, action)),
            _ => None,
        },
    )
}

fn list_reducer() -> Reducer<TodosState, TodosAction, TodosEnvironment> {
    Reducer::new(|state: &mut TodosState, action, env: &TodosEnvironment| {
        match action {
            TodosAction::Add(title) => {
                let id = (env.ids)();
                let todo = Todo {
                    id,
                    title,
                    done: false,
                    created_at: env.clock.now(),
                };
                state.items.insert(id, todo);
            }
            TodosAction::Remove(id) => {
                state.items.remove(&id);
                if state.editing.as_ref().is_some_and(|e| e.todo == id) {
                    state.editing = None;
                }
            }
            TodosAction::ClearCompleted => {
                state.items.retain(|_, todo| !todo.done);
                let editing_removed = state
                    .editing
                    .as_ref()
                    .is_some_and(|e| !state.items.contains_key(&e.todo));
                if editing_removed {
                    state.editing = None;
                }
            }
            TodosAction::Edit(id) => {
                if let Some(todo) = state.items.get(&id) {
                    state.editing = Some(Editor {
                        todo: id,
                        text: todo.title.clone(),
                    });
                }
            }
            TodosAction::Save => {
                if let Some(editor) = state.editing.take() {
                    let rename = TodoAction::Rename(editor.text);
                    return Effect::send(TodosAction::Todo(editor.todo, rename));
                }
            }
            TodosAction::Cancel => state.editing = None,
            TodosAction::Todo(..) | TodosAction::Editor(_) => {}
        }
        Effect::none()
    })
}

pub fn reducer() -> Reducer<TodosState, TodosAction, TodosEnvironment> {
    combine(vec![
        todo_reducer().indexed(
            path!(TodosState => items),
            item_prism(),
            |_: &TodosEnvironment| (),
        ),
        editor_reducer().optional().lift(
            path!(TodosState => editing),
            prism!(TodosAction::Editor),
            |_: &TodosEnvironment| (),
        ),
        list_reducer(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn environment() -> TodosEnvironment {
        let next = Arc::new(AtomicU64::new(1));
        TodosEnvironment::new(
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())),
            Arc::new(move || Uuid::from_u128(next.fetch_add(1, Ordering::SeqCst) as u128)),
        )
    }

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn run(state: &mut TodosState, actions: Vec<TodosAction>) -> Vec<Effect<TodosAction>> {
        let reducer = reducer();
        let env = environment();
        actions
            .into_iter()
            .map(|action| reducer.reduce(state, action, &env))
            .collect()
    }

    #[test]
    fn test_add_and_toggle() {
        let mut state = TodosState::default();
        let reducer = reducer();
        let env = environment();
        let _ = reducer.reduce(&mut state, TodosAction::Add("milk".into()), &env);
        let _ = reducer.reduce(&mut state, TodosAction::Add("bread".into()), &env);
        let _ = reducer.reduce(&mut state, TodosAction::Todo(id(2), TodoAction::Toggle), &env);

        assert_eq!(state.items.len(), 2);
        assert!(!state.items[&id(1)].done);
        assert!(state.items[&id(2)].done);
        assert_eq!(state.remaining(), 1);
        let titles: Vec<&str> = state.ordered().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["milk", "bread"]);
    }

    #[test]
    fn test_action_for_removed_item_is_swallowed() {
        let mut state = TodosState::default();
        let effects = run(
            &mut state,
            vec![
                TodosAction::Add("milk".into()),
                TodosAction::Remove(id(1)),
                TodosAction::Todo(id(1), TodoAction::Toggle),
            ],
        );
        assert!(effects.iter().all(|e| e.is_none()));
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_clear_completed() {
        let mut state = TodosState::default();
        run(
            &mut state,
            vec![
                TodosAction::Add("a".into()),
                TodosAction::Add("b".into()),
                TodosAction::Add("c".into()),
                TodosAction::Todo(id(1), TodoAction::Toggle),
                TodosAction::Todo(id(3), TodoAction::Toggle),
                TodosAction::Edit(id(3)),
                TodosAction::ClearCompleted,
            ],
        );
        assert_eq!(state.items.keys().collect::<Vec<_>>(), vec![&id(2)]);
        assert_eq!(state.editing, None);
    }

    #[tokio::test]
    async fn test_edit_and_save() {
        let mut state = TodosState::default();
        let mut effects = run(
            &mut state,
            vec![
                TodosAction::Add("wlak dog".into()),
                TodosAction::Edit(id(1)),
                TodosAction::Editor(EditorAction::Clear),
                TodosAction::Editor(EditorAction::Type("walk ".into())),
                TodosAction::Editor(EditorAction::Type("dog".into())),
                TodosAction::Save,
            ],
        );
        assert_eq!(state.editing, None);
        // The rename arrives as a follow-up action
        assert_eq!(state.items[&id(1)].title, "wlak dog");

        let follow_up = effects.pop().unwrap().collect().await;
        assert_eq!(
            follow_up,
            vec![TodosAction::Todo(id(1), TodoAction::Rename("walk dog".into()))]
        );
        run(&mut state, follow_up);
        assert_eq!(state.items[&id(1)].title, "walk dog");
    }

    #[test]
    fn test_editor_actions_without_editor_are_noops() {
        let mut state = TodosState::default();
        let effects = run(
            &mut state,
            vec![
                TodosAction::Editor(EditorAction::Type("ghost".into())),
                TodosAction::Save,
                TodosAction::Edit(id(9)),
            ],
        );
        assert!(effects.iter().all(|e| e.is_none()));
        assert_eq!(state, TodosState::default());
    }
}
