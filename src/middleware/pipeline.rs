//! Update pipeline
//!
//! Middleware follow the Telegraf `(ctx, next)` convention: each step gets the
//! context and a [`Next`] handle, and decides whether to run the rest of the
//! chain. A pipeline ends in an optional fallback handler that receives every
//! update nothing else consumed.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::state::UpdateContext;
use crate::utils::errors::Result;

/// Boxed async handler over the update context
pub type Handler = Arc<dyn for<'a> Fn(&'a mut UpdateContext) -> BoxFuture<'a, Result<()>> + Send + Sync>;

/// Wrap a closure into a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: for<'a> Fn(&'a mut UpdateContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One pipeline step
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, ctx: &mut UpdateContext, next: Next<'_>) -> Result<()>;
}

/// The remainder of the pipeline after the current step
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    fallback: Option<&'a Handler>,
}

impl<'a> Next<'a> {
    /// A continuation that does nothing
    pub fn noop() -> Next<'static> {
        Next {
            chain: &[],
            fallback: None,
        }
    }

    /// Run the remaining steps
    pub async fn run(self, ctx: &mut UpdateContext) -> Result<()> {
        match self.chain.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    chain: rest,
                    fallback: self.fallback,
                };
                head.handle(ctx, next).await
            }
            None => match self.fallback {
                Some(fallback) => fallback(ctx).await,
                None => Ok(()),
            },
        }
    }
}

/// Ordered middleware chain with an optional fallback
#[derive(Clone, Default)]
pub struct Pipeline {
    middleware: Vec<Arc<dyn Middleware>>,
    fallback: Option<Handler>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    pub fn with<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Append an already shared step
    pub fn with_shared(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Handler for updates that fall through every step
    pub fn fallback<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut UpdateContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(f));
        self
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Run one update through the pipeline
    pub async fn handle(&self, ctx: &mut UpdateContext) -> Result<()> {
        let next = Next {
            chain: &self.middleware,
            fallback: self.fallback.as_ref(),
        };
        next.run(ctx).await
    }
}
