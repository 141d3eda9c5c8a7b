//! Agent loop: drives the model provider, executes tool calls, and streams
//! assistant text fragments for one turn.

use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;
use rcommon::BoxFuture;
use rprovider::{
    Message, ModelProvider, ModelRequest, OutputItem, Role, StreamEvent, ToolCall, ToolResult,
};
use rsession::UserSession;
use rtooling::{ToolExecutionContext, ToolRuntime};

use crate::{ChatError, FragmentStream};

const DEFAULT_MAX_TOOL_ROUNDS: u32 = 4;

/// Produces the fragment stream for a single turn. Implementations read the
/// session's memory context for history and record the exchange once the
/// turn finishes cleanly.
pub trait AgentRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        session: &'a UserSession,
        query: &'a str,
    ) -> BoxFuture<'a, Result<FragmentStream<'a>, ChatError>>;
}

/// Default runner wiring a [`ModelProvider`] to a [`ToolRuntime`].
///
/// Each turn streams model output, surfacing text deltas as fragments as
/// they arrive. When the model requests tool calls, the runner executes
/// them, feeds the results back, and streams the follow-up response, up to
/// `max_tool_rounds` rounds per turn.
pub struct AgentLoop {
    provider: Arc<dyn ModelProvider>,
    runtime: Arc<dyn ToolRuntime>,
    model: String,
    system_prompt: Option<String>,
    temperature: Option<f32>,
    max_tool_rounds: u32,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        runtime: Arc<dyn ToolRuntime>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            runtime,
            model: model.into(),
            system_prompt: None,
            temperature: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: u32) -> Self {
        self.max_tool_rounds = max_tool_rounds.max(1);
        self
    }
}

impl AgentRunner for AgentLoop {
    fn run<'a>(
        &'a self,
        session: &'a UserSession,
        query: &'a str,
    ) -> BoxFuture<'a, Result<FragmentStream<'a>, ChatError>> {
        Box::pin(async move {
            let prior = session.memory.snapshot()?;

            let mut messages = Vec::new();
            if let Some(system_prompt) = &self.system_prompt {
                messages.push(Message::new(Role::System, system_prompt.clone()));
            }
            messages.extend(prior);
            messages.push(Message::new(Role::User, query));

            let stream: FragmentStream<'a> = Box::pin(try_stream! {
                let mut messages = messages;
                let mut tool_results: Vec<ToolResult> = Vec::new();
                let mut full_text = String::new();
                let mut round = 0_u32;

                loop {
                    let mut request = ModelRequest::new(self.model.clone(), messages.clone())
                        .enable_streaming();

                    let definitions = self.runtime.definitions();
                    if !definitions.is_empty() {
                        request = request.with_tools(definitions);
                    }

                    if !tool_results.is_empty() {
                        request = request.with_tool_results(tool_results.clone());
                    }

                    if let Some(temperature) = self.temperature {
                        request = request.with_temperature(temperature);
                    }

                    request.validate()?;

                    let mut events = self.provider.stream(request).await?;
                    let mut round_text = String::new();
                    let mut tool_calls: Vec<ToolCall> = Vec::new();

                    while let Some(event) = events.next().await {
                        match event? {
                            StreamEvent::TextDelta(delta) => {
                                round_text.push_str(&delta);
                                full_text.push_str(&delta);
                                yield delta;
                            }
                            StreamEvent::ToolCallDelta(call) => tool_calls.push(call),
                            StreamEvent::MessageComplete(_) => {}
                            StreamEvent::ResponseComplete(response) => {
                                for item in response.output {
                                    if let OutputItem::ToolCall(call) = item
                                        && !tool_calls.iter().any(|known| known.id == call.id)
                                    {
                                        tool_calls.push(call);
                                    }
                                }
                            }
                        }
                    }

                    if tool_calls.is_empty() {
                        break;
                    }

                    round += 1;
                    if round > self.max_tool_rounds {
                        Err(ChatError::tooling(format!(
                            "tool loop exceeded {} rounds",
                            self.max_tool_rounds
                        )))?;
                    }

                    if !round_text.is_empty() {
                        messages.push(Message::new(Role::Assistant, round_text.clone()));
                    }

                    let context =
                        ToolExecutionContext::new(session.user_id, session.session_id.clone());
                    tool_results.clear();
                    for call in &tool_calls {
                        let result = self.runtime.execute(call, &context).await?;
                        messages.push(Message::new(Role::Tool, result.output.clone()));
                        tool_results.push(result.into_tool_result());
                    }
                }

                session.memory.record_exchange(query, full_text)?;
            });

            Ok(stream)
        })
    }
}
