use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use interactive_core::error::Result;

use crate::connection::{Connection, IncomingCall};

/// Handler for one server-initiated method.
#[async_trait]
pub trait CallHandler: Send + Sync {
    /// Method name this handler answers.
    fn method(&self) -> &str;
    async fn handle(&self, call: IncomingCall) -> Result<()>;
}

/// [`CallHandler`] backed by an async closure.
pub struct FnHandler<F> {
    method: String,
    f: F,
}

#[async_trait]
impl<F, Fut> CallHandler for FnHandler<F>
where
    F: Fn(IncomingCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn method(&self) -> &str {
        &self.method
    }

    async fn handle(&self, call: IncomingCall) -> Result<()> {
        (self.f)(call).await
    }
}

/// Wrap an async closure as a handler for `method`.
pub fn handler_fn<F, Fut>(method: impl Into<String>, f: F) -> Arc<FnHandler<F>>
where
    F: Fn(IncomingCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(FnHandler {
        method: method.into(),
        f,
    })
}

/// Routes queued server-initiated methods to handlers by method name.
#[derive(Default)]
pub struct Dispatcher {
    handlers: DashMap<String, Arc<dyn CallHandler>>,
    fallback: RwLock<Option<Arc<dyn CallHandler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: Arc<dyn CallHandler>) {
        self.handlers.insert(handler.method().to_string(), handler);
    }

    /// Handler for methods nobody registered.
    pub fn set_fallback(&self, handler: Arc<dyn CallHandler>) {
        *self.fallback.write().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    pub fn registered_methods(&self) -> Vec<String> {
        self.handlers.iter().map(|e| e.key().clone()).collect()
    }

    pub async fn dispatch(&self, call: IncomingCall) -> Result<()> {
        let handler = self
            .handlers
            .get(call.name())
            .map(|e| e.value().clone())
            .or_else(|| {
                self.fallback
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            });

        match handler {
            Some(handler) => handler.handle(call).await,
            None => {
                tracing::debug!(method = %call.name(), "no handler for inbound method");
                Ok(())
            }
        }
    }

    /// Drain everything queued on `conn` without waiting, dispatching each
    /// call in arrival order. Returns the drained calls.
    ///
    /// A failing handler is logged and does not stop the drain.
    pub async fn pump(&self, conn: &Connection) -> Vec<IncomingCall> {
        let mut drained = Vec::new();
        while let Some(call) = conn.get_packet() {
            drained.push(call.clone());
            let method = call.name().to_string();
            if let Err(e) = self.dispatch(call).await {
                tracing::warn!(%method, error = %e, "inbound handler failed");
            }
        }
        drained
    }

    /// Dispatch every call as it arrives until the connection closes and the
    /// queue is drained.
    pub fn pump_async(self: Arc<Self>, conn: Connection) -> JoinHandle<()> {
        tokio::spawn(async move {
            while conn.has_packet().await {
                self.pump(&conn).await;
            }
            tracing::debug!("inbound pump stopped");
        })
    }
}
