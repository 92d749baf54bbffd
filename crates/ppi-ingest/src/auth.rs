//! Authorization context propagation
//!
//! Persistence runs on a spawned consumer task, but it must be authorized as
//! the caller that started the load. The supervisor captures the caller's
//! context as a plain value and passes it into the consumer's entry point,
//! which installs it as a task-local before processing the first item. Sinks
//! read it back through [`AuthContext::current`].

use std::future::Future;

use serde::{Deserialize, Serialize};

tokio::task_local! {
    static CURRENT_AUTH: AuthContext;
}

/// Opaque, clonable principal under which persistence calls are authorized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    principal: String,
    roles: Vec<String>,
}

impl AuthContext {
    pub fn new(principal: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            principal: principal.into(),
            roles,
        }
    }

    /// Fallback context for unattended runs (CLI, scheduled jobs)
    pub fn system() -> Self {
        Self::new("system", vec!["loader".to_string()])
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// The context installed on the current task, if any
    pub fn current() -> Option<AuthContext> {
        CURRENT_AUTH.try_with(|ctx| ctx.clone()).ok()
    }

    /// Run `fut` with this context installed on the current task
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT_AUTH.scope(self, fut).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_context_outside_scope() {
        assert!(AuthContext::current().is_none());
    }

    #[tokio::test]
    async fn test_context_visible_inside_scope() {
        let ctx = AuthContext::new("curator", vec!["writer".to_string()]);
        let observed = ctx.clone().scope(async { AuthContext::current() }).await;
        assert_eq!(observed, Some(ctx));
    }

    #[tokio::test]
    async fn test_context_crosses_spawn_when_installed() {
        let ctx = AuthContext::new("curator", vec![]);
        let handle = tokio::spawn(
            ctx.clone()
                .scope(async { AuthContext::current().map(|c| c.principal().to_string()) }),
        );
        let principal = handle.await.unwrap();
        assert_eq!(principal.as_deref(), Some("curator"));
    }
}
