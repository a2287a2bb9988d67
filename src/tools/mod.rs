mod backend;
mod builtin;
mod registry;

pub use backend::BackendClient;
pub use builtin::{AdvancedSearchTool, GenerateDiagramTool, RetrieveDocumentationTool, SearchRecordsTool};
pub use registry::{ToolHandler, ToolRegistry, ToolRegistryBuilder};

#[cfg(test)]
pub(crate) use registry::tests::EchoTool;

use crate::error::Result;
use std::sync::Arc;

/// Registry holding the four business-data tools, all backed by `backend`
pub fn builtin_registry(backend: Arc<BackendClient>) -> Result<ToolRegistry> {
    Ok(ToolRegistry::builder()
        .register(SearchRecordsTool::new(Arc::clone(&backend)))?
        .register(AdvancedSearchTool::new(Arc::clone(&backend)))?
        .register(RetrieveDocumentationTool::new(Arc::clone(&backend)))?
        .register(GenerateDiagramTool::new(backend))?
        .build())
}
