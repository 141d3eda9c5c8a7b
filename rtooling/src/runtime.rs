//! Tool runtime that resolves calls against a registry and executes them.

use std::sync::Arc;
use std::time::Instant;

use rcommon::BoxFuture;
use rprovider::ToolCall;

use crate::{
    NoopToolRuntimeHooks, ToolError, ToolExecutionContext, ToolExecutionResult, ToolRegistry,
    ToolRuntimeHooks,
};

pub trait ToolRuntime: Send + Sync {
    fn execute<'a>(
        &'a self,
        tool_call: &'a ToolCall,
        context: &'a ToolExecutionContext,
    ) -> BoxFuture<'a, Result<ToolExecutionResult, ToolError>>;

    fn definitions(&self) -> Vec<rprovider::ToolDefinition>;
}

pub struct DefaultToolRuntime {
    registry: ToolRegistry,
    hooks: Arc<dyn ToolRuntimeHooks>,
}

impl DefaultToolRuntime {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    async fn execute_inner(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
    ) -> Result<ToolExecutionResult, ToolError> {
        let tool = self.registry.get(&tool_call.name).ok_or_else(|| {
            ToolError::not_found(format!("no registered tool named '{}'", tool_call.name))
                .with_tool_name(tool_call.name.clone())
                .with_tool_call_id(tool_call.id.clone())
        })?;

        let output = tool
            .invoke(&tool_call.arguments, context)
            .await
            .map_err(|error| {
                error
                    .with_tool_name(tool_call.name.clone())
                    .with_tool_call_id(tool_call.id.clone())
            })?;

        Ok(ToolExecutionResult::from_call(tool_call, output))
    }
}

impl ToolRuntime for DefaultToolRuntime {
    fn execute<'a>(
        &'a self,
        tool_call: &'a ToolCall,
        context: &'a ToolExecutionContext,
    ) -> BoxFuture<'a, Result<ToolExecutionResult, ToolError>> {
        Box::pin(async move {
            self.hooks.on_execution_start(tool_call, context);
            let started = Instant::now();

            match self.execute_inner(tool_call, context).await {
                Ok(result) => {
                    self.hooks
                        .on_execution_success(tool_call, context, &result, started.elapsed());
                    Ok(result)
                }
                Err(error) => {
                    self.hooks
                        .on_execution_failure(tool_call, context, &error, started.elapsed());
                    Err(error)
                }
            }
        })
    }

    fn definitions(&self) -> Vec<rprovider::ToolDefinition> {
        self.registry.definitions()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use rcommon::UserId;
    use rprovider::ToolDefinition;

    use super::*;

    fn echo_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register_fn(
            ToolDefinition {
                name: "echo".to_string(),
                description: "Echoes its arguments".to_string(),
                input_schema: r#"{"type":"object"}"#.to_string(),
            },
            |args, _context| async move { Ok(args) },
        );
        registry
    }

    fn call(name: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: r#"{"query":"hi"}"#.to_string(),
        }
    }

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
    }

    impl ToolRuntimeHooks for RecordingHooks {
        fn on_execution_start(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}", tool_call.name));
        }

        fn on_execution_success(
            &self,
            tool_call: &ToolCall,
            _context: &ToolExecutionContext,
            _result: &ToolExecutionResult,
            _elapsed: Duration,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("success:{}", tool_call.name));
        }

        fn on_execution_failure(
            &self,
            tool_call: &ToolCall,
            _context: &ToolExecutionContext,
            error: &ToolError,
            _elapsed: Duration,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("failure:{}:{:?}", tool_call.name, error.kind));
        }
    }

    #[tokio::test]
    async fn registered_tools_execute_and_report_success() {
        let hooks = Arc::new(RecordingHooks::default());
        let runtime = DefaultToolRuntime::new(echo_registry()).with_hooks(hooks.clone());
        let context = ToolExecutionContext::new(UserId::from(7), "sess-7");

        let result = runtime.execute(&call("echo"), &context).await.unwrap();

        assert_eq!(result.tool_call_id, "call_1");
        assert_eq!(result.output, r#"{"query":"hi"}"#);
        assert_eq!(
            *hooks.events.lock().unwrap(),
            vec!["start:echo".to_string(), "success:echo".to_string()]
        );
    }

    #[tokio::test]
    async fn unknown_tools_fail_with_not_found() {
        let hooks = Arc::new(RecordingHooks::default());
        let runtime = DefaultToolRuntime::new(echo_registry()).with_hooks(hooks.clone());
        let context = ToolExecutionContext::new(UserId::from(7), "sess-7");

        let error = runtime.execute(&call("missing"), &context).await.unwrap_err();

        assert_eq!(error.kind, crate::ToolErrorKind::NotFound);
        assert_eq!(error.tool_name.as_deref(), Some("missing"));
        assert_eq!(
            *hooks.events.lock().unwrap(),
            vec![
                "start:missing".to_string(),
                "failure:missing:NotFound".to_string()
            ]
        );
    }
}
