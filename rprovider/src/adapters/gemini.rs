//! Gemini transport trait and reqwest-based HTTP implementation.
//!
//! The provider reads the active key from the shared [`CredentialPool`] on
//! every call, so a rotation performed between retry attempts is picked up
//! by the next upstream request without rebuilding the provider.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    BoxedEventStream, CredentialPool, Embedder, Message, ModelProvider, ModelRequest,
    ModelResponse, OutputItem, ProviderError, ProviderFuture, ProviderId, Role, StopReason,
    StreamEvent, TokenUsage, ToolCall,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "functionCall", skip_serializing_if = "Option::is_none")]
    pub function_call: Option<GeminiFunctionCall>,
    #[serde(rename = "functionResponse", skip_serializing_if = "Option::is_none")]
    pub function_response: Option<GeminiFunctionResponse>,
}

impl GeminiPart {
    fn text(value: impl Into<String>) -> Self {
        Self {
            text: Some(value.into()),
            function_call: None,
            function_response: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiFunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiFunctionResponse {
    pub name: String,
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeminiFunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeminiToolConfig {
    #[serde(rename = "functionDeclarations")]
    pub function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<GeminiToolConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
    #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GeminiUsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    pub prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    pub candidates_token_count: u32,
    #[serde(rename = "totalTokenCount", default)]
    pub total_token_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    pub usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Request/response mapping
// ---------------------------------------------------------------------------

pub fn build_wire_request(request: &ModelRequest) -> Result<GeminiRequest, ProviderError> {
    request.validate()?;

    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for message in &request.messages {
        match message.role {
            Role::System => system_parts.push(GeminiPart::text(message.content.clone())),
            Role::User => contents.push(GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart::text(message.content.clone())],
            }),
            Role::Assistant => contents.push(GeminiContent {
                role: Some("model".to_string()),
                parts: vec![GeminiPart::text(message.content.clone())],
            }),
            Role::Tool => contents.push(GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart::text(message.content.clone())],
            }),
        }
    }

    for result in &request.tool_results {
        contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: None,
                function_call: None,
                function_response: Some(GeminiFunctionResponse {
                    name: result.tool_call_id.clone(),
                    response: serde_json::json!({ "output": result.output }),
                }),
            }],
        });
    }

    let mut declarations = Vec::new();
    for tool in &request.tools {
        let parameters: serde_json::Value =
            serde_json::from_str(&tool.input_schema).map_err(|err| {
                ProviderError::invalid_request(format!(
                    "tool '{}' has a malformed input schema: {err}",
                    tool.name
                ))
            })?;
        declarations.push(GeminiFunctionDeclaration {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters,
        });
    }

    let generation_config =
        if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

    Ok(GeminiRequest {
        contents,
        system_instruction: (!system_parts.is_empty()).then_some(GeminiContent {
            role: None,
            parts: system_parts,
        }),
        generation_config,
        tools: if declarations.is_empty() {
            Vec::new()
        } else {
            vec![GeminiToolConfig {
                function_declarations: declarations,
            }]
        },
    })
}

pub fn parse_finish_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("STOP") => StopReason::EndTurn,
        Some("MAX_TOKENS") => StopReason::MaxTokens,
        Some("TOOL_CALL" | "FUNCTION_CALL") => StopReason::ToolUse,
        _ => StopReason::Other,
    }
}

fn usage_from_metadata(metadata: Option<GeminiUsageMetadata>) -> TokenUsage {
    let metadata = metadata.unwrap_or_default();
    TokenUsage {
        input_tokens: metadata.prompt_token_count,
        output_tokens: metadata.candidates_token_count,
        total_tokens: metadata.total_token_count,
    }
}

pub fn map_response(model: &str, wire: GeminiResponse) -> Result<ModelResponse, ProviderError> {
    let mut output = Vec::new();
    let mut stop_reason = StopReason::Other;
    let mut call_counter = 0_u32;

    for candidate in wire.candidates {
        stop_reason = parse_finish_reason(candidate.finish_reason.as_deref());
        let Some(content) = candidate.content else {
            continue;
        };

        for part in content.parts {
            if let Some(text) = part.text {
                output.push(OutputItem::Message(Message::new(Role::Assistant, text)));
            }

            if let Some(call) = part.function_call {
                call_counter += 1;
                output.push(OutputItem::ToolCall(ToolCall {
                    id: format!("call_{call_counter}"),
                    name: call.name,
                    arguments: call.args.to_string(),
                }));
                stop_reason = StopReason::ToolUse;
            }
        }
    }

    Ok(ModelResponse {
        provider: ProviderId::Gemini,
        model: model.to_string(),
        output,
        stop_reason,
        usage: usage_from_metadata(wire.usage_metadata),
    })
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

pub type GeminiChunkStream<'a> =
    Pin<Box<dyn Stream<Item = Result<GeminiResponse, ProviderError>> + Send + 'a>>;

pub trait GeminiTransport: Send + Sync {
    fn complete<'a>(
        &'a self,
        model: &'a str,
        api_key: String,
        request: GeminiRequest,
    ) -> ProviderFuture<'a, Result<GeminiResponse, ProviderError>>;

    fn stream<'a>(
        &'a self,
        model: &'a str,
        api_key: String,
        request: GeminiRequest,
    ) -> ProviderFuture<'a, Result<GeminiChunkStream<'a>, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct GeminiHttpTransport {
    client: Client,
    base_url: String,
}

impl GeminiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, model: &str, verb: &str) -> String {
        format!(
            "{}/models/{model}:{verb}",
            self.base_url.trim_end_matches('/')
        )
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GeminiErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.error)
            .and_then(|detail| detail.message)
            .unwrap_or_else(|| format!("Gemini request failed with status {status}"));

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::authentication(message)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                ProviderError::quota_exceeded(format!("429: {message}"))
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                ProviderError::timeout(message)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ProviderError::invalid_request(message)
            }
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                ProviderError::unavailable(message)
            }
            _ => ProviderError::classify(message),
        }
    }

    fn send_error(err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::timeout(err.to_string())
        } else {
            ProviderError::transport(err.to_string())
        }
    }
}

impl GeminiTransport for GeminiHttpTransport {
    fn complete<'a>(
        &'a self,
        model: &'a str,
        api_key: String,
        request: GeminiRequest,
    ) -> ProviderFuture<'a, Result<GeminiResponse, ProviderError>> {
        Box::pin(async move {
            let url = self.endpoint(model, "generateContent");
            let response = self
                .client
                .post(url)
                .header("x-goog-api-key", api_key)
                .json(&request)
                .send()
                .await
                .map_err(Self::send_error)?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            response
                .json::<GeminiResponse>()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))
        })
    }

    fn stream<'a>(
        &'a self,
        model: &'a str,
        api_key: String,
        request: GeminiRequest,
    ) -> ProviderFuture<'a, Result<GeminiChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            let url = format!("{}?alt=sse", self.endpoint(model, "streamGenerateContent"));
            let response = self
                .client
                .post(url)
                .header("x-goog-api-key", api_key)
                .json(&request)
                .send()
                .await
                .map_err(Self::send_error)?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let stream = try_stream! {
                let mut chunks = response.bytes_stream();
                let mut sse_buffer = String::new();

                while let Some(chunk) = chunks.next().await {
                    let chunk = chunk.map_err(|err| ProviderError::transport(err.to_string()))?;
                    sse_buffer.push_str(&String::from_utf8_lossy(&chunk));

                    while let Some(boundary) = sse_buffer.find('\n') {
                        let line = sse_buffer[..boundary].trim_end_matches('\r').to_string();
                        sse_buffer.drain(..=boundary);

                        let Some(payload) = line.strip_prefix("data:") else {
                            continue;
                        };
                        let payload = payload.trim();
                        if payload.is_empty() || payload == "[DONE]" {
                            continue;
                        }

                        let parsed: GeminiResponse = serde_json::from_str(payload)
                            .map_err(|err| {
                                ProviderError::transport(format!("malformed SSE chunk: {err}"))
                            })?;
                        yield parsed;
                    }
                }
            };

            Ok(Box::pin(stream) as GeminiChunkStream<'a>)
        })
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

pub struct GeminiProvider {
    transport: Arc<dyn GeminiTransport>,
    pool: Arc<CredentialPool>,
    model: String,
}

impl GeminiProvider {
    pub fn new(client: Client, pool: Arc<CredentialPool>, model: impl Into<String>) -> Self {
        Self {
            transport: Arc::new(GeminiHttpTransport::new(client)),
            pool,
            model: model.into(),
        }
    }

    pub fn with_transport(
        transport: Arc<dyn GeminiTransport>,
        pool: Arc<CredentialPool>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            pool,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn active_key(&self) -> Result<String, ProviderError> {
        self.pool.current(str::to_string)
    }
}

impl ModelProvider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let wire = build_wire_request(&request)?;
            let api_key = self.active_key()?;
            let response = self.transport.complete(&self.model, api_key, wire).await?;
            map_response(&request.model, response)
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let wire = build_wire_request(&request)?;
            let api_key = self.active_key()?;
            let mut chunks = self.transport.stream(&self.model, api_key, wire).await?;
            let model = request.model.clone();

            let stream = try_stream! {
                let mut text = String::new();
                let mut tool_calls: Vec<ToolCall> = Vec::new();
                let mut stop_reason = StopReason::Other;
                let mut usage = None;
                let mut call_counter = 0_u32;

                while let Some(chunk) = chunks.next().await {
                    let chunk = chunk?;
                    if chunk.usage_metadata.is_some() {
                        usage = chunk.usage_metadata;
                    }

                    for candidate in chunk.candidates {
                        if candidate.finish_reason.is_some() {
                            stop_reason =
                                parse_finish_reason(candidate.finish_reason.as_deref());
                        }

                        let Some(content) = candidate.content else {
                            continue;
                        };

                        for part in content.parts {
                            if let Some(delta) = part.text {
                                text.push_str(&delta);
                                yield StreamEvent::TextDelta(delta);
                            }

                            if let Some(call) = part.function_call {
                                call_counter += 1;
                                let tool_call = ToolCall {
                                    id: format!("call_{call_counter}"),
                                    name: call.name,
                                    arguments: call.args.to_string(),
                                };
                                tool_calls.push(tool_call.clone());
                                stop_reason = StopReason::ToolUse;
                                yield StreamEvent::ToolCallDelta(tool_call);
                            }
                        }
                    }
                }

                let mut output = Vec::new();
                if !text.is_empty() {
                    output.push(OutputItem::Message(Message::new(Role::Assistant, text)));
                }
                output.extend(tool_calls.into_iter().map(OutputItem::ToolCall));

                yield StreamEvent::ResponseComplete(ModelResponse {
                    provider: ProviderId::Gemini,
                    model,
                    output,
                    stop_reason,
                    usage: usage_from_metadata(usage),
                });
            };

            Ok(Box::pin(stream) as BoxedEventStream<'a>)
        })
    }
}

// ---------------------------------------------------------------------------
// Embedding
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GeminiEmbedRequest {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiEmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbeddingValues {
    values: Vec<f32>,
}

/// Embedder bound to one API key; pair with
/// [`RotatingEmbedder`](crate::RotatingEmbedder) through a factory closure
/// for quota-driven key rotation.
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiEmbedder {
    pub fn new(client: Client, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = format!(
            "{}/models/{}:embedContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let request = GeminiEmbedRequest {
            content: GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(text)],
            },
        };

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.clone())
            .json(&request)
            .send()
            .await
            .map_err(GeminiHttpTransport::send_error)?;

        if !response.status().is_success() {
            return Err(GeminiHttpTransport::parse_error(response).await);
        }

        let parsed: GeminiEmbedResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::transport(err.to_string()))?;
        Ok(parsed.embedding.values)
    }
}

impl Embedder for GeminiEmbedder {
    fn embed_query<'a>(
        &'a self,
        text: &'a str,
    ) -> ProviderFuture<'a, Result<Vec<f32>, ProviderError>> {
        Box::pin(self.embed_one(text))
    }

    fn embed_documents<'a>(
        &'a self,
        texts: &'a [String],
    ) -> ProviderFuture<'a, Result<Vec<Vec<f32>>, ProviderError>> {
        Box::pin(async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed_one(text).await?);
            }
            Ok(vectors)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolDefinition;

    fn sample_request() -> ModelRequest {
        ModelRequest::new(
            "gemini-2.0-flash",
            vec![
                Message::new(Role::System, "be concise"),
                Message::new(Role::User, "headache for 3 days"),
            ],
        )
        .with_temperature(0.4)
        .with_tools(vec![ToolDefinition {
            name: "search_knowledge_base".to_string(),
            description: "Search the medical knowledge base".to_string(),
            input_schema: r#"{"type":"object","properties":{"query":{"type":"string"}}}"#
                .to_string(),
        }])
    }

    #[test]
    fn wire_request_splits_system_instruction_from_contents() {
        let wire = build_wire_request(&sample_request()).expect("request should map");

        let system = wire.system_instruction.expect("system instruction");
        assert_eq!(system.parts.len(), 1);
        assert_eq!(system.parts[0].text.as_deref(), Some("be concise"));

        assert_eq!(wire.contents.len(), 1);
        assert_eq!(wire.contents[0].role.as_deref(), Some("user"));
        assert_eq!(wire.tools.len(), 1);
        assert_eq!(
            wire.tools[0].function_declarations[0].name,
            "search_knowledge_base"
        );
    }

    #[test]
    fn wire_request_rejects_malformed_tool_schema() {
        let request = ModelRequest::new(
            "gemini-2.0-flash",
            vec![Message::new(Role::User, "hi")],
        )
        .with_tools(vec![ToolDefinition {
            name: "broken".to_string(),
            description: "broken".to_string(),
            input_schema: "{not json".to_string(),
        }]);

        let err = build_wire_request(&request).expect_err("should fail");
        assert_eq!(err.kind, crate::ProviderErrorKind::InvalidRequest);
    }

    #[test]
    fn response_mapping_collects_text_and_function_calls() {
        let wire: GeminiResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            {"text": "Checking the knowledge base."},
                            {"functionCall": {"name": "search_knowledge_base", "args": {"query": "headache"}}}
                        ]
                    },
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 6, "totalTokenCount": 18}
            }"#,
        )
        .expect("sample should parse");

        let response = map_response("gemini-2.0-flash", wire).expect("should map");
        assert_eq!(response.output.len(), 2);
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.usage.total_tokens, 18);

        match &response.output[1] {
            OutputItem::ToolCall(call) => {
                assert_eq!(call.name, "search_knowledge_base");
                assert!(call.arguments.contains("headache"));
            }
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn finish_reason_mapping_is_stable() {
        assert_eq!(parse_finish_reason(Some("STOP")), StopReason::EndTurn);
        assert_eq!(parse_finish_reason(Some("MAX_TOKENS")), StopReason::MaxTokens);
        assert_eq!(parse_finish_reason(Some("TOOL_CALL")), StopReason::ToolUse);
        assert_eq!(parse_finish_reason(None), StopReason::Other);
    }
}
