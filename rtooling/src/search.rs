//! Retrieval-backed tools for medication knowledge and web lookup.

use std::sync::Arc;

use rcommon::BoxFuture;
use rprovider::ToolDefinition;
use serde::Deserialize;
use serde_json::json;

use crate::{Tool, ToolError, ToolExecutionContext, ToolFuture};

const DEFAULT_KNOWLEDGE_LIMIT: usize = 2;

/// Source of ranked passages from the medication knowledge base.
pub trait KnowledgeSearch: Send + Sync {
    fn search<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<String>, ToolError>>;
}

/// Source of live web results for queries the knowledge base cannot answer.
pub trait WebSearch: Send + Sync {
    fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<String>, ToolError>>;
}

#[derive(Debug, Deserialize)]
struct SearchArguments {
    query: String,
}

fn parse_query(args_json: &str) -> Result<String, ToolError> {
    let arguments: SearchArguments = serde_json::from_str(args_json).map_err(|error| {
        ToolError::invalid_arguments(format!("expected {{\"query\": ...}}: {error}"))
    })?;

    if arguments.query.trim().is_empty() {
        return Err(ToolError::invalid_arguments("query must not be empty"));
    }

    Ok(arguments.query)
}

pub struct KnowledgeSearchTool {
    source: Arc<dyn KnowledgeSearch>,
    limit: usize,
}

impl KnowledgeSearchTool {
    pub fn new(source: Arc<dyn KnowledgeSearch>) -> Self {
        Self {
            source,
            limit: DEFAULT_KNOWLEDGE_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl Tool for KnowledgeSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_knowledge_base".to_string(),
            description: "Searches the medication knowledge base and returns the most relevant \
                          passages for a query about symptoms or remedies."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The symptom or medication question to look up"
                    }
                },
                "required": ["query"]
            })
            .to_string(),
        }
    }

    fn invoke<'a>(
        &'a self,
        args_json: &'a str,
        _context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<String, ToolError>> {
        Box::pin(async move {
            let query = parse_query(args_json)?;
            let passages = self.source.search(&query, self.limit).await?;
            Ok(json!({ "page_contents": passages }).to_string())
        })
    }
}

pub struct WebSearchTool {
    source: Arc<dyn WebSearch>,
}

impl WebSearchTool {
    pub fn new(source: Arc<dyn WebSearch>) -> Self {
        Self { source }
    }
}

impl Tool for WebSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_web".to_string(),
            description: "Searches the web for current information when the knowledge base has \
                          no answer."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The question to search for"
                    }
                },
                "required": ["query"]
            })
            .to_string(),
        }
    }

    fn invoke<'a>(
        &'a self,
        args_json: &'a str,
        _context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<String, ToolError>> {
        Box::pin(async move {
            let query = parse_query(args_json)?;
            let results = self.source.search(&query).await?;
            Ok(json!({ "results": results }).to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rcommon::UserId;

    use super::*;

    struct StaticKnowledge {
        passages: Vec<String>,
        requested_limits: Mutex<Vec<usize>>,
    }

    impl KnowledgeSearch for StaticKnowledge {
        fn search<'a>(
            &'a self,
            _query: &'a str,
            limit: usize,
        ) -> BoxFuture<'a, Result<Vec<String>, ToolError>> {
            self.requested_limits.lock().unwrap().push(limit);
            let passages = self.passages.iter().take(limit).cloned().collect();
            Box::pin(async move { Ok(passages) })
        }
    }

    fn context() -> ToolExecutionContext {
        ToolExecutionContext::new(UserId::from(42), "sess-42")
    }

    #[tokio::test]
    async fn knowledge_tool_returns_page_contents_capped_at_two() {
        let source = Arc::new(StaticKnowledge {
            passages: vec![
                "Ibuprofen eases tension headaches.".to_string(),
                "Stay hydrated and rest.".to_string(),
                "Third passage never surfaces.".to_string(),
            ],
            requested_limits: Mutex::new(Vec::new()),
        });
        let tool = KnowledgeSearchTool::new(source.clone());

        let output = tool
            .invoke(r#"{"query":"headache"}"#, &context())
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let passages = parsed["page_contents"].as_array().unwrap();
        assert_eq!(passages.len(), 2);
        assert_eq!(*source.requested_limits.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn malformed_arguments_are_rejected_before_searching() {
        let source = Arc::new(StaticKnowledge {
            passages: Vec::new(),
            requested_limits: Mutex::new(Vec::new()),
        });
        let tool = KnowledgeSearchTool::new(source.clone());

        let error = tool.invoke(r#"{"q":"typo"}"#, &context()).await.unwrap_err();

        assert_eq!(error.kind, crate::ToolErrorKind::InvalidArguments);
        assert!(source.requested_limits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_queries_are_invalid() {
        let source = Arc::new(StaticKnowledge {
            passages: Vec::new(),
            requested_limits: Mutex::new(Vec::new()),
        });
        let tool = KnowledgeSearchTool::new(source);

        let error = tool
            .invoke(r#"{"query":"   "}"#, &context())
            .await
            .unwrap_err();

        assert_eq!(error.kind, crate::ToolErrorKind::InvalidArguments);
    }
}
