//! Save-time context merged into entries by the store, never by the core.

/// Supplies the contextual metadata columns (acting user, client hostname,
/// application module) at append time. Values already set on the entry win.
pub trait ContextProvider: Send + Sync {
    fn user_id(&self) -> Option<String> {
        None
    }

    fn hostname(&self) -> Option<String> {
        None
    }

    fn module(&self) -> Option<String> {
        None
    }
}

/// No context: all columns stay null unless set on the entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullContext;

impl ContextProvider for NullContext {}

/// Fixed context, typically configured once per process or per request.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    pub user_id: Option<String>,
    pub hostname: Option<String>,
    pub module: Option<String>,
}

impl ContextProvider for StaticContext {
    fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    fn hostname(&self) -> Option<String> {
        self.hostname.clone()
    }

    fn module(&self) -> Option<String> {
        self.module.clone()
    }
}
