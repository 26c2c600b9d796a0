use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value as J;

use crate::core::schema::ToolSchema;
use crate::core::tool::{Tool, ToolContext, ToolError, ToolResult};

/// Thread-safe name -> tool map.
///
/// One mutex guards every read, write and iteration. Lookups hand out an
/// `Arc<Tool>` so the lock is released before any handler runs. Names are
/// kept sorted, which makes `tools/list` output stable.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    by_name: Arc<Mutex<BTreeMap<String, Arc<Tool>>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Tool>,
    {
        let reg = Self::new();
        for t in iter {
            reg.register(t);
        }
        reg
    }

    /// Inserts or replaces by name (last write wins). Nameless tools are ignored.
    pub fn register(&self, tool: Tool) {
        if tool.name().is_empty() {
            tracing::warn!("ignoring tool registration with empty name");
            return;
        }
        let name = tool.name().to_string();
        let replaced = self.map().insert(name.clone(), Arc::new(tool)).is_some();
        tracing::debug!(tool = %name, replaced, "tool registered");
    }

    pub fn register_fn<F>(&self, name: impl Into<String>, description: impl Into<String>, schema: ToolSchema, handler: F)
    where
        F: Fn(&J, &ToolContext) -> Result<ToolResult, ToolError> + Send + Sync + 'static,
    {
        self.register(Tool::new(name, description, schema, handler));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Tool>> {
        self.map().get(name).cloned()
    }

    /// `tools/list` descriptors, sorted by name.
    pub fn descriptors(&self) -> Vec<J> {
        self.map().values().map(|t| t.descriptor()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.map().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    // Handlers never run under this lock, so a poisoned map is still consistent.
    fn map(&self) -> MutexGuard<'_, BTreeMap<String, Arc<Tool>>> {
        self.by_name.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
