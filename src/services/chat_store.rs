// src/services/chat_store.rs
use std::{
    collections::VecDeque,
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use serde_json::Value;

use crate::{
    message::ChatMessage,
    state::{ChatState, DEFAULT_MODEL},
};

type Listener = Arc<dyn Fn(&ChatState) + Send + Sync>;

struct Inner {
    state: Arc<ChatState>,
    default_model: String,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
    last_message_id: u64,
    // Notifications waiting to be delivered, in transition order. Only the
    // outermost `update` drains it.
    pending: VecDeque<(Listener, Arc<ChatState>)>,
    notifying: bool,
}

/// Session-scoped chat state with synchronous change notification.
///
/// Cloning gives another handle to the same store.
#[derive(Clone)]
pub struct ChatStore {
    inner: Arc<Mutex<Inner>>,
}

impl Debug for ChatStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.lock();
        f.debug_struct("ChatStore")
            .field("messages", &guard.state.messages.len())
            .field("is_loading", &guard.state.is_loading)
            .field("selected_model", &guard.state.selected_model)
            .field("listeners", &guard.listeners.len())
            .finish()
    }
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatStore {
    pub fn new() -> Self {
        Self::with_default_model(DEFAULT_MODEL)
    }

    pub fn with_default_model(default_model: impl Into<String>) -> Self {
        let default_model = default_model.into();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: Arc::new(ChatState::new(default_model.clone())),
                default_model,
                listeners: Vec::new(),
                next_listener_id: 0,
                last_message_id: 0,
                pending: VecDeque::new(),
                notifying: false,
            })),
        }
    }

    // A panicking listener runs outside the lock, so a poisoned guard still
    // holds a consistent state.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Arc<ChatState> {
        Arc::clone(&self.lock().state)
    }

    /// Registers `listener`, calls it once with the current state, and then
    /// again after every change until the subscription is dropped via
    /// [`Subscription::unsubscribe`] or the store is disposed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ChatState) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let (id, current) = {
            let mut guard = self.lock();
            let id = guard.next_listener_id;
            guard.next_listener_id += 1;
            guard.listeners.push((id, Arc::clone(&listener)));
            (id, Arc::clone(&guard.state))
        };
        listener(&current);
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn add_message(&self, text: impl Into<String>, is_user: bool) {
        self.add_message_with_recipes(text, is_user, false, None);
    }

    /// Recipes are only kept when `include_recipes` is set.
    pub fn add_message_with_recipes(
        &self,
        text: impl Into<String>,
        is_user: bool,
        include_recipes: bool,
        recipes: Option<Value>,
    ) {
        let text = text.into();
        let recipes = if include_recipes {
            recipes
        } else {
            if recipes.is_some() {
                tracing::debug!("dropping recipes on a message without include_recipes");
            }
            None
        };

        self.update(move |inner, state| {
            let timestamp = Utc::now();
            let millis = u64::try_from(timestamp.timestamp_millis()).unwrap_or(0);
            let id = millis.max(inner.last_message_id + 1);
            inner.last_message_id = id;

            state.messages.push(ChatMessage {
                id,
                text,
                is_user,
                timestamp,
                include_recipes,
                recipes,
            });
        });
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.update(|_, state| state.is_loading = is_loading);
    }

    pub fn set_model(&self, model: impl Into<String>) {
        let model = model.into();
        self.update(move |_, state| state.selected_model = model);
    }

    /// Back to the initial state, including the default model.
    pub fn clear(&self) {
        self.update(|inner, state| {
            *state = ChatState::new(inner.default_model.clone());
        });
    }

    /// Drops every listener. The store keeps working, silently.
    pub fn dispose(&self) {
        let dropped = std::mem::take(&mut self.lock().listeners);
        tracing::debug!(listeners = dropped.len(), "chat store disposed");
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut Inner, &mut ChatState),
    {
        {
            let mut guard = self.lock();
            let mut next = (*guard.state).clone();
            apply(&mut *guard, &mut next);
            let state = Arc::new(next);
            guard.state = Arc::clone(&state);

            let queued: Vec<_> = guard
                .listeners
                .iter()
                .map(|(_, l)| (Arc::clone(l), Arc::clone(&state)))
                .collect();
            guard.pending.extend(queued);

            // A listener called back into the store; the outer drain will
            // deliver this transition after the ones already queued.
            if guard.notifying {
                return;
            }
            guard.notifying = true;
        }

        let _reset = DrainReset(self);
        loop {
            let next = {
                let mut guard = self.lock();
                let next = guard.pending.pop_front();
                if next.is_none() {
                    guard.notifying = false;
                }
                next
            };
            match next {
                Some((listener, state)) => listener(&state),
                None => break,
            }
        }
    }
}

// Unblocks the queue if a listener panics mid-drain.
struct DrainReset<'a>(&'a ChatStore);

impl Drop for DrainReset<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut guard = self.0.lock();
            guard.pending.clear();
            guard.notifying = false;
        }
    }
}

/// Handle returned by [`ChatStore::subscribe`].
#[must_use = "dropping a Subscription does not unsubscribe; call `unsubscribe`"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    store: std::sync::Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.store.upgrade() {
            let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            guard.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
