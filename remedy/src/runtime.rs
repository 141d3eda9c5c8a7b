//! Runtime wiring: composes the credential pool, provider, tools, sessions,
//! orchestrator, framer, embedder, and history backend into one bundle.

use std::sync::Arc;

use rchat::{
    AgentLoop, AgentRunner, ChatStream, ConversationOrchestrator, FramedStream, StreamFramer,
    TurnHooks,
};
use rcommon::UserId;
use rhistory::{HistoryBackend, create_history_backend};
use rprovider::{CredentialHooks, CredentialPool, EmbedderFactory, RotatingEmbedder};
use rsession::SessionRegistry;
use rtooling::{
    DefaultToolRuntime, KnowledgeSearch, KnowledgeSearchTool, ToolRegistry, ToolRuntime,
    ToolRuntimeHooks, WebSearch, WebSearchTool,
};

use robserve::TracingObservabilityHooks;

use crate::{
    ModelProvider, ProviderError, RemedyConfig, build_gemini_provider, build_rotating_embedder,
    default_http_client,
};

/// Fully wired assistant runtime.
#[derive(Clone)]
pub struct AssistantRuntime {
    pub credentials: Arc<CredentialPool>,
    pub sessions: Arc<SessionRegistry>,
    pub tools: Arc<dyn ToolRuntime>,
    pub orchestrator: Arc<ConversationOrchestrator>,
    pub framer: StreamFramer,
    pub embedder: Arc<RotatingEmbedder>,
    pub history: Arc<dyn HistoryBackend>,
}

impl std::fmt::Debug for AssistantRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantRuntime").finish_non_exhaustive()
    }
}

impl AssistantRuntime {
    /// Runs one turn and returns the raw event stream.
    pub fn respond(&self, user_id: UserId, query: impl Into<String>) -> ChatStream<'_> {
        self.orchestrator.respond(user_id, query)
    }

    /// Runs one turn and returns the client-framed stream, closed by the
    /// `[DONE]` sentinel or an error envelope.
    pub fn respond_framed(&self, user_id: UserId, query: impl Into<String>) -> FramedStream<'_> {
        self.framer.frame(self.orchestrator.respond(user_id, query))
    }
}

pub fn build_runtime(config: RemedyConfig) -> Result<AssistantRuntime, ProviderError> {
    AssistantRuntimeBuilder::new(config).build()
}

/// Builder with injection points for every component the default wiring
/// would otherwise construct from the config.
pub struct AssistantRuntimeBuilder {
    config: RemedyConfig,
    provider: Option<Arc<dyn ModelProvider>>,
    tool_runtime: Option<Arc<dyn ToolRuntime>>,
    knowledge: Option<Arc<dyn KnowledgeSearch>>,
    web: Option<Arc<dyn WebSearch>>,
    embedder_factory: Option<Arc<dyn EmbedderFactory>>,
    history: Option<Arc<dyn HistoryBackend>>,
    credential_hooks: Option<Arc<dyn CredentialHooks>>,
    tool_hooks: Option<Arc<dyn ToolRuntimeHooks>>,
    turn_hooks: Option<Arc<dyn TurnHooks>>,
    without_backoff: bool,
}

impl AssistantRuntimeBuilder {
    pub fn new(config: RemedyConfig) -> Self {
        Self {
            config,
            provider: None,
            tool_runtime: None,
            knowledge: None,
            web: None,
            embedder_factory: None,
            history: None,
            credential_hooks: None,
            tool_hooks: None,
            turn_hooks: None,
            without_backoff: false,
        }
    }

    pub fn provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool_runtime(mut self, tool_runtime: Arc<dyn ToolRuntime>) -> Self {
        self.tool_runtime = Some(tool_runtime);
        self
    }

    pub fn knowledge_source(mut self, knowledge: Arc<dyn KnowledgeSearch>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn web_source(mut self, web: Arc<dyn WebSearch>) -> Self {
        self.web = Some(web);
        self
    }

    pub fn embedder_factory(mut self, factory: Arc<dyn EmbedderFactory>) -> Self {
        self.embedder_factory = Some(factory);
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryBackend>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn credential_hooks(mut self, hooks: Arc<dyn CredentialHooks>) -> Self {
        self.credential_hooks = Some(hooks);
        self
    }

    pub fn tool_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.tool_hooks = Some(hooks);
        self
    }

    pub fn turn_hooks(mut self, hooks: Arc<dyn TurnHooks>) -> Self {
        self.turn_hooks = Some(hooks);
        self
    }

    /// Test wiring: retries keep their semantics but skip wall-clock waits.
    pub fn without_backoff(mut self) -> Self {
        self.without_backoff = true;
        self
    }

    pub fn build(self) -> Result<AssistantRuntime, ProviderError> {
        self.config.validate()?;
        let verbose = self.config.verbose;

        let credential_hooks = self.credential_hooks.or_else(|| {
            verbose.then(|| Arc::new(TracingObservabilityHooks) as Arc<dyn CredentialHooks>)
        });
        let pool = match credential_hooks {
            Some(hooks) => CredentialPool::with_hooks(self.config.api_keys.clone(), hooks)?,
            None => CredentialPool::new(self.config.api_keys.clone())?,
        };
        let pool = Arc::new(pool);

        let client = default_http_client(self.config.http_timeout)?;

        let provider = match self.provider {
            Some(provider) => provider,
            None => build_gemini_provider(
                client.clone(),
                Arc::clone(&pool),
                self.config.model.clone(),
            )?,
        };

        let tools = match self.tool_runtime {
            Some(runtime) => runtime,
            None => {
                let mut registry = ToolRegistry::new();
                if let Some(knowledge) = self.knowledge {
                    registry.register(KnowledgeSearchTool::new(knowledge));
                }
                if let Some(web) = self.web {
                    registry.register(WebSearchTool::new(web));
                }

                let tool_hooks = self.tool_hooks.or_else(|| {
                    verbose
                        .then(|| Arc::new(TracingObservabilityHooks) as Arc<dyn ToolRuntimeHooks>)
                });
                let mut runtime = DefaultToolRuntime::new(registry);
                if let Some(hooks) = tool_hooks {
                    runtime = runtime.with_hooks(hooks);
                }
                Arc::new(runtime) as Arc<dyn ToolRuntime>
            }
        };

        let mut agent =
            AgentLoop::new(provider, Arc::clone(&tools), self.config.model.clone());
        if let Some(system_prompt) = self.config.system_prompt.clone() {
            agent = agent.with_system_prompt(system_prompt);
        }
        if let Some(temperature) = self.config.temperature {
            agent = agent.with_temperature(temperature);
        }
        let runner: Arc<dyn AgentRunner> = Arc::new(agent);

        let sessions = Arc::new(match self.config.session_capacity {
            Some(capacity) => SessionRegistry::with_capacity(capacity),
            None => SessionRegistry::new(),
        });

        let mut orchestrator = ConversationOrchestrator::new(
            Arc::clone(&sessions),
            runner,
            Arc::clone(&pool),
        );
        let turn_hooks = self
            .turn_hooks
            .or_else(|| verbose.then(|| Arc::new(TracingObservabilityHooks) as Arc<dyn TurnHooks>));
        if let Some(hooks) = turn_hooks {
            orchestrator = orchestrator.with_hooks(hooks);
        }
        if self.without_backoff {
            orchestrator = orchestrator.without_backoff();
        }

        let embedder = match self.embedder_factory {
            Some(factory) => RotatingEmbedder::new(Arc::clone(&pool), factory)?,
            None => build_rotating_embedder(
                client,
                Arc::clone(&pool),
                self.config.embedding_model.clone(),
            )?,
        };

        let history = match self.history {
            Some(history) => history,
            None => create_history_backend(self.config.history.clone())
                .map_err(|err| ProviderError::other(format!("history backend: {err}")))?,
        };

        Ok(AssistantRuntime {
            credentials: pool,
            sessions,
            tools,
            orchestrator: Arc::new(orchestrator),
            framer: StreamFramer::new(),
            embedder: Arc::new(embedder),
            history,
        })
    }
}
