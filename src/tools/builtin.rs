use super::backend::BackendClient;
use super::registry::ToolHandler;
use crate::connector::{ToolDescriptor, ToolParams};
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::fmt::Write;
use std::sync::Arc;

const DEFAULT_LIMIT: u64 = 20;
const DOC_ATTRIBUTES: [&str; 6] = ["string", "type", "required", "readonly", "help", "relation"];

fn required_str(params: &ToolParams, key: &str) -> Result<String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            BridgeError::InvalidRequest(format!("missing required string parameter '{}'", key))
        })
}

fn optional_limit(params: &ToolParams) -> Result<u64> {
    match params.get("limit") {
        None | Some(Value::Null) => Ok(DEFAULT_LIMIT),
        Some(value) => value.as_u64().ok_or_else(|| {
            BridgeError::InvalidRequest("'limit' must be a non-negative integer".to_string())
        }),
    }
}

fn model_schema(extra: Value) -> Value {
    let mut properties = Map::new();
    properties.insert(
        "model_name".to_string(),
        json!({"type": "string", "description": "Technical model name, e.g. res.partner"}),
    );
    if let Value::Object(extra) = extra {
        properties.extend(extra);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["model_name"],
    })
}

/// `search_records`: name search on a model
pub struct SearchRecordsTool {
    backend: Arc<BackendClient>,
}

impl SearchRecordsTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ToolHandler for SearchRecordsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "search_records".to_string(),
            description: Some("Search records of a model by display name".to_string()),
            input_schema: model_schema(json!({
                "query": {"type": "string"},
                "limit": {"type": "integer", "minimum": 0},
            })),
        }
    }

    async fn call(&self, params: ToolParams) -> Result<Value> {
        let model = required_str(&params, "model_name")?;
        let query = required_str(&params, "query")?;
        let limit = optional_limit(&params)?;

        let found = self
            .backend
            .execute_kw(&model, "name_search", json!([query]), json!({"limit": limit}))
            .await?;

        let records: Vec<Value> = found
            .as_array()
            .map(|pairs| {
                pairs
                    .iter()
                    .filter_map(|pair| match pair.as_array().map(Vec::as_slice) {
                        Some([id, name]) => Some(json!({"id": id, "name": name})),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(json!({
            "model": model,
            "count": records.len(),
            "records": records,
        }))
    }
}

/// `advanced_search`: domain-filtered `search_read`
pub struct AdvancedSearchTool {
    backend: Arc<BackendClient>,
}

impl AdvancedSearchTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ToolHandler for AdvancedSearchTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "advanced_search".to_string(),
            description: Some(
                "Read records matching a domain, with field selection and ordering".to_string(),
            ),
            input_schema: model_schema(json!({
                "domain": {"type": "array"},
                "fields": {"type": "array", "items": {"type": "string"}},
                "limit": {"type": "integer", "minimum": 0},
                "order": {"type": "string"},
            })),
        }
    }

    async fn call(&self, params: ToolParams) -> Result<Value> {
        let model = required_str(&params, "model_name")?;
        let limit = optional_limit(&params)?;

        let domain = match params.get("domain") {
            None | Some(Value::Null) => json!([]),
            Some(domain @ Value::Array(_)) => domain.clone(),
            Some(_) => {
                return Err(BridgeError::InvalidRequest(
                    "'domain' must be an array".to_string(),
                ));
            }
        };

        let mut kwargs = Map::new();
        kwargs.insert("limit".to_string(), json!(limit));
        match params.get("fields") {
            None | Some(Value::Null) => {}
            Some(fields @ Value::Array(_)) => {
                kwargs.insert("fields".to_string(), fields.clone());
            }
            Some(_) => {
                return Err(BridgeError::InvalidRequest(
                    "'fields' must be an array of field names".to_string(),
                ));
            }
        }
        if let Some(order) = params.get("order").and_then(Value::as_str) {
            kwargs.insert("order".to_string(), json!(order));
        }

        let records = self
            .backend
            .execute_kw(&model, "search_read", json!([domain]), Value::Object(kwargs))
            .await?;

        Ok(json!({
            "model": model,
            "count": records.as_array().map_or(0, Vec::len),
            "records": records,
        }))
    }
}

/// `retrieve_odoo_documentation`: field reference for a model
pub struct RetrieveDocumentationTool {
    backend: Arc<BackendClient>,
}

impl RetrieveDocumentationTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ToolHandler for RetrieveDocumentationTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "retrieve_odoo_documentation".to_string(),
            description: Some("Describe the fields of a model".to_string()),
            input_schema: model_schema(json!({
                "required_only": {"type": "boolean"},
            })),
        }
    }

    async fn call(&self, params: ToolParams) -> Result<Value> {
        let model = required_str(&params, "model_name")?;
        let required_only = params
            .get("required_only")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let fields = self
            .backend
            .execute_kw(&model, "fields_get", json!([]), json!({"attributes": DOC_ATTRIBUTES}))
            .await?;

        let fields: Map<String, Value> = fields
            .as_object()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, meta)| {
                !required_only || meta.get("required").and_then(Value::as_bool) == Some(true)
            })
            .collect();

        Ok(json!({
            "model": model,
            "field_count": fields.len(),
            "fields": fields,
        }))
    }
}

/// `generate_npx`: Mermaid ER diagram of a model's relations plus the
/// `npx` command line that renders it
pub struct GenerateDiagramTool {
    backend: Arc<BackendClient>,
}

impl GenerateDiagramTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

fn entity(model: &str) -> String {
    model.replace('.', "_").to_uppercase()
}

pub(crate) fn er_diagram(model: &str, fields: &Map<String, Value>) -> String {
    let mut diagram = String::from("erDiagram\n");
    let source = entity(model);

    for (name, meta) in fields {
        let Some(relation) = meta.get("relation").and_then(Value::as_str) else {
            continue;
        };
        let cardinality = match meta.get("type").and_then(Value::as_str) {
            Some("many2one") => "}o--||",
            Some("one2many") => "||--o{",
            Some("many2many") => "}o--o{",
            _ => continue,
        };
        let _ = writeln!(
            diagram,
            "    {} {} {} : {}",
            source,
            cardinality,
            entity(relation),
            name
        );
    }

    diagram
}

#[async_trait]
impl ToolHandler for GenerateDiagramTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "generate_npx".to_string(),
            description: Some(
                "Generate a Mermaid ER diagram of a model and the npx command to render it"
                    .to_string(),
            ),
            input_schema: model_schema(json!({
                "output": {"type": "string", "description": "Rendered file name, e.g. partner.svg"},
            })),
        }
    }

    async fn call(&self, params: ToolParams) -> Result<Value> {
        let model = required_str(&params, "model_name")?;
        let output = params
            .get("output")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.svg", model.replace('.', "_")));

        let fields = self
            .backend
            .execute_kw(
                &model,
                "fields_get",
                json!([]),
                json!({"attributes": ["type", "relation"]}),
            )
            .await?;
        let fields = fields.as_object().cloned().unwrap_or_default();

        let diagram = er_diagram(&model, &fields);
        let source = format!("{}.mmd", model.replace('.', "_"));

        Ok(json!({
            "model": model,
            "diagram": diagram,
            "source_file": source,
            "command": format!("npx -p @mermaid-js/mermaid-cli mmdc -i {} -o {}", source, output),
        }))
    }
}
