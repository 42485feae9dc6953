//! Event Registry - ordered lifecycle event dispatch
//!
//! Handlers are registered per [`EventKey`]: either a specific
//! `category.action` key or a bare category matching every action of it.
//! One registry belongs to one `OAuthApp`; nothing is process-wide.
//!
//! # Dispatch
//!
//! ```text
//! emit(token.created)
//!     │
//!     ├─► handlers["token.created"]   H1 ─await─► H2 ─await─► ...
//!     │
//!     └─► handlers["token"]           H3 ─await─► ...
//! ```
//!
//! Handlers run one at a time in registration order; each is awaited to
//! completion before the next starts, regardless of how long it takes. The
//! first handler error aborts the emission and is returned to the caller.
//!
//! # Usage
//!
//! ```ignore
//! let registry = EventRegistry::new();
//!
//! registry.register(EventKey::TOKEN_CREATED, |ctx: EventContext| async move {
//!     tracing::info!(token = ctx.token_preview(), "token created");
//!     Ok::<(), anyhow::Error>(())
//! });
//!
//! // One handler for several keys
//! registry.register([EventKey::TOKEN, EventKey::AUTHORIZATION], audit_handler);
//! ```

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{EventContext, EventKey};
use crate::error::{OAuthAppError, Result};

/// Lifecycle event handler
///
/// Implemented for every `Fn(EventContext) -> impl Future<Output = anyhow::Result<()>>`,
/// so plain async closures can be registered directly.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, context: EventContext) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
    F: Fn(EventContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn handle(&self, context: EventContext) -> anyhow::Result<()> {
        (self)(context).await
    }
}

/// One or many event keys
pub trait IntoEventKeys {
    fn into_event_keys(self) -> Vec<EventKey>;
}

impl IntoEventKeys for EventKey {
    fn into_event_keys(self) -> Vec<EventKey> {
        vec![self]
    }
}

impl IntoEventKeys for Vec<EventKey> {
    fn into_event_keys(self) -> Vec<EventKey> {
        self
    }
}

impl<const N: usize> IntoEventKeys for [EventKey; N] {
    fn into_event_keys(self) -> Vec<EventKey> {
        self.to_vec()
    }
}

impl IntoEventKeys for &[EventKey] {
    fn into_event_keys(self) -> Vec<EventKey> {
        self.to_vec()
    }
}

/// Registry of event handlers with sequential emission
#[derive(Default)]
pub struct EventRegistry {
    handlers: RwLock<HashMap<EventKey, Vec<Arc<dyn EventHandler>>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under one or many keys.
    ///
    /// For a list of keys the handler is appended once per key, in order.
    /// Registering the same handler twice under one key makes it fire twice.
    pub fn register<K, H>(&self, keys: K, handler: H)
    where
        K: IntoEventKeys,
        H: EventHandler + 'static,
    {
        self.register_arc(keys, Arc::new(handler));
    }

    pub fn register_arc<K: IntoEventKeys>(&self, keys: K, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write();
        for key in keys.into_event_keys() {
            debug!(event = %key, "[EventRegistry] Registered handler");
            handlers.entry(key).or_default().push(handler.clone());
        }
    }

    /// Number of handlers registered under exactly `key`
    pub fn handler_count(&self, key: EventKey) -> usize {
        self.handlers.read().get(&key).map_or(0, Vec::len)
    }

    /// Emit an event.
    ///
    /// Runs the handlers for `name.action` and then those for the bare
    /// `name` category, awaiting each in registration order.
    pub async fn emit(&self, context: EventContext) -> Result<()> {
        for key in [context.key(), context.category()] {
            // Snapshot so no lock is held while handlers run
            let handlers = self.handlers.read().get(&key).cloned().unwrap_or_default();
            if handlers.is_empty() {
                continue;
            }

            debug!(
                event = %context.key(),
                key = %key,
                handlers = handlers.len(),
                "[EventRegistry] Dispatching event"
            );

            for handler in handlers {
                if let Err(source) = handler.handle(context.clone()).await {
                    warn!(
                        event = %context.key(),
                        key = %key,
                        error = %source,
                        "[EventRegistry] Event handler failed"
                    );
                    return Err(OAuthAppError::EventHandler { key, source });
                }
            }
        }
        Ok(())
    }
}
