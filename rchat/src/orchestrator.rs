//! Turn orchestration: per-user session lookup, the retry-with-rotation
//! attempt loop, and terminal turn events.

use std::sync::Arc;
use std::time::Duration;

use async_stream::try_stream;
use futures_util::StreamExt;
use rcommon::UserId;
use rprovider::{CredentialPool, NoopSleeper, RetryPolicy, Sleeper, TimerSleeper};
use rsession::SessionRegistry;

use crate::{AgentRunner, ChatError, ChatEvent, ChatStream, NoopTurnHooks, TurnHooks, TurnResult};

/// Front door for conversational turns.
///
/// Every failed attempt rotates the credential pool before the next one, so
/// an exhausted turn leaves the cursor advanced by the full attempt budget.
/// Once a fragment has been delivered the turn is no longer retried: a
/// mid-stream failure rotates once and then surfaces as the terminal error,
/// since replaying already-delivered text would duplicate output.
pub struct ConversationOrchestrator {
    sessions: Arc<SessionRegistry>,
    runner: Arc<dyn AgentRunner>,
    credentials: Arc<CredentialPool>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    hooks: Arc<dyn TurnHooks>,
}

impl ConversationOrchestrator {
    pub fn new(
        sessions: Arc<SessionRegistry>,
        runner: Arc<dyn AgentRunner>,
        credentials: Arc<CredentialPool>,
    ) -> Self {
        Self {
            sessions,
            runner,
            credentials,
            policy: RetryPolicy::fixed(5, Duration::from_secs(5)),
            sleeper: Arc::new(TimerSleeper),
            hooks: Arc::new(NoopTurnHooks),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Test wiring: identical retry semantics without wall-clock waits.
    pub fn without_backoff(self) -> Self {
        self.with_sleeper(Arc::new(NoopSleeper))
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn TurnHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Runs one turn for `user_id`, lazily: nothing executes until the
    /// returned stream is polled.
    pub fn respond<'a>(&'a self, user_id: UserId, query: impl Into<String>) -> ChatStream<'a> {
        let query = query.into();

        Box::pin(try_stream! {
            if query.trim().is_empty() {
                Err(ChatError::invalid_request("query must not be empty"))?;
            }

            let session = self.sessions.get_or_create(user_id)?;
            let mut full_text = String::new();
            let mut attempt = 1_u32;

            loop {
                self.hooks.on_attempt_start(user_id, attempt);

                let mut emitted = false;
                let mut failed: Option<ChatError> = None;

                match self.runner.run(&session, &query).await {
                    Ok(mut fragments) => {
                        while let Some(item) = fragments.next().await {
                            match item {
                                Ok(fragment) => {
                                    emitted = true;
                                    full_text.push_str(&fragment);
                                    yield ChatEvent::Fragment(fragment);
                                }
                                Err(error) => {
                                    failed = Some(error);
                                    break;
                                }
                            }
                        }
                    }
                    Err(error) => failed = Some(error),
                }

                match failed {
                    None => {
                        self.hooks.on_turn_complete(user_id, attempt);
                        yield ChatEvent::TurnComplete(TurnResult {
                            session_id: session.session_id.clone(),
                            user_id,
                            full_text: full_text.clone(),
                            attempts: attempt,
                        });
                        break;
                    }
                    Some(error) => {
                        // Rotation precedes the retry decision: even a
                        // terminal failure advances the cursor so the next
                        // turn starts on a fresh credential.
                        self.credentials.rotate()?;

                        if emitted || !self.policy.should_retry(attempt) {
                            self.hooks.on_turn_failed(user_id, attempt, &error);
                            Err(error)?;
                        } else {
                            let delay = self.policy.backoff_for_attempt(attempt);
                            self.hooks.on_retry_scheduled(user_id, attempt, delay, &error);
                            self.sleeper.sleep(delay).await;
                            attempt += 1;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rcommon::BoxFuture;
    use rsession::UserSession;

    use super::*;
    use crate::{ChatErrorKind, FragmentStream};

    enum Outcome {
        FailToStart(ChatError),
        Fragments(Vec<&'static str>),
        FailAfter(Vec<&'static str>, ChatError),
    }

    struct ScriptedRunner {
        outcomes: Mutex<Vec<Outcome>>,
        runs: Mutex<u32>,
    }

    impl ScriptedRunner {
        fn new(outcomes: Vec<Outcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                runs: Mutex::new(0),
            }
        }

        fn runs(&self) -> u32 {
            *self.runs.lock().expect("runs lock")
        }
    }

    impl AgentRunner for ScriptedRunner {
        fn run<'a>(
            &'a self,
            _session: &'a UserSession,
            _query: &'a str,
        ) -> BoxFuture<'a, Result<FragmentStream<'a>, ChatError>> {
            Box::pin(async move {
                *self.runs.lock().expect("runs lock") += 1;
                let mut outcomes = self.outcomes.lock().expect("outcomes lock");
                if outcomes.is_empty() {
                    return Err(ChatError::provider("no scripted outcome left"));
                }

                match outcomes.remove(0) {
                    Outcome::FailToStart(error) => Err(error),
                    Outcome::Fragments(fragments) => {
                        let items: Vec<Result<String, ChatError>> =
                            fragments.into_iter().map(|f| Ok(f.to_string())).collect();
                        Ok(Box::pin(futures_util::stream::iter(items)) as FragmentStream<'a>)
                    }
                    Outcome::FailAfter(fragments, error) => {
                        let mut items: Vec<Result<String, ChatError>> =
                            fragments.into_iter().map(|f| Ok(f.to_string())).collect();
                        items.push(Err(error));
                        Ok(Box::pin(futures_util::stream::iter(items)) as FragmentStream<'a>)
                    }
                }
            })
        }
    }

    fn orchestrator(
        runner: Arc<ScriptedRunner>,
        keys: Vec<String>,
    ) -> (ConversationOrchestrator, Arc<CredentialPool>) {
        let credentials = Arc::new(CredentialPool::new(keys).expect("pool"));
        let orchestrator = ConversationOrchestrator::new(
            Arc::new(SessionRegistry::new()),
            runner,
            credentials.clone(),
        )
        .without_backoff();
        (orchestrator, credentials)
    }

    async fn collect(stream: ChatStream<'_>) -> Vec<Result<ChatEvent, ChatError>> {
        stream.collect::<Vec<_>>().await
    }

    #[tokio::test]
    async fn successful_turn_ends_with_turn_complete() {
        let runner = Arc::new(ScriptedRunner::new(vec![Outcome::Fragments(vec![
            "It ", "could ", "be...",
        ])]));
        let (orchestrator, credentials) = orchestrator(runner, vec!["a".into(), "b".into()]);

        let events = collect(orchestrator.respond(UserId::new(42), "headache for 3 days")).await;

        assert_eq!(events.len(), 4);
        let turn = match events[3].as_ref().expect("terminal event") {
            ChatEvent::TurnComplete(turn) => turn.clone(),
            other => panic!("expected TurnComplete, got {other:?}"),
        };
        assert_eq!(turn.full_text, "It could be...");
        assert_eq!(turn.attempts, 1);
        assert_eq!(turn.session_id.as_str(), "sess-42");
        assert_eq!(credentials.active_index().expect("index"), 0);
    }

    #[tokio::test]
    async fn pre_stream_failure_rotates_and_retries() {
        let runner = Arc::new(ScriptedRunner::new(vec![
            Outcome::FailToStart(ChatError::provider("429: quota exceeded")),
            Outcome::Fragments(vec!["fine now"]),
        ]));
        let (orchestrator, credentials) = orchestrator(runner.clone(), vec!["a".into(), "b".into()]);

        let events = collect(orchestrator.respond(UserId::new(1), "question")).await;

        assert_eq!(runner.runs(), 2);
        assert_eq!(credentials.active_index().expect("index"), 1);
        assert!(matches!(
            events.last().expect("events").as_ref().expect("terminal"),
            ChatEvent::TurnComplete(turn) if turn.attempts == 2
        ));
    }

    #[tokio::test]
    async fn exhaustion_rotates_once_per_attempt() {
        let runner = Arc::new(ScriptedRunner::new(
            (0..5)
                .map(|_| Outcome::FailToStart(ChatError::provider("unavailable")))
                .collect(),
        ));
        let (orchestrator, credentials) =
            orchestrator(runner.clone(), vec!["a".into(), "b".into(), "c".into()]);

        let events = collect(orchestrator.respond(UserId::new(1), "question")).await;

        assert_eq!(runner.runs(), 5);
        // Five rotations over a three-key ring: 5 % 3 == 2.
        assert_eq!(credentials.active_index().expect("index"), 2);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_err());
    }

    #[tokio::test]
    async fn mid_stream_failure_is_terminal_after_one_rotation() {
        let runner = Arc::new(ScriptedRunner::new(vec![Outcome::FailAfter(
            vec!["partial "],
            ChatError::provider("connection reset"),
        )]));
        let (orchestrator, credentials) = orchestrator(runner.clone(), vec!["a".into(), "b".into()]);

        let events = collect(orchestrator.respond(UserId::new(1), "question")).await;

        assert_eq!(runner.runs(), 1);
        assert_eq!(credentials.active_index().expect("index"), 1);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0].as_ref().expect("fragment"),
            ChatEvent::Fragment(text) if text == "partial "
        ));
        assert!(events[1].is_err());
    }

    #[tokio::test]
    async fn empty_queries_fail_without_touching_the_pool() {
        let runner = Arc::new(ScriptedRunner::new(Vec::new()));
        let (orchestrator, credentials) = orchestrator(runner.clone(), vec!["a".into()]);

        let events = collect(orchestrator.respond(UserId::new(1), "   ")).await;

        assert_eq!(runner.runs(), 0);
        assert_eq!(credentials.active_index().expect("index"), 0);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].as_ref().expect_err("error").kind,
            ChatErrorKind::InvalidRequest
        );
    }

    #[tokio::test]
    async fn empty_fragment_stream_still_completes_the_turn() {
        let runner = Arc::new(ScriptedRunner::new(vec![Outcome::Fragments(Vec::new())]));
        let (orchestrator, _credentials) = orchestrator(runner, vec!["a".into()]);

        let events = collect(orchestrator.respond(UserId::new(1), "question")).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].as_ref().expect("terminal"),
            ChatEvent::TurnComplete(turn) if turn.full_text.is_empty()
        ));
    }

    #[tokio::test]
    async fn hooks_observe_the_attempt_sequence() {
        #[derive(Default)]
        struct Recorder {
            events: Mutex<Vec<String>>,
        }

        impl TurnHooks for Recorder {
            fn on_attempt_start(&self, user_id: UserId, attempt: u32) {
                self.events
                    .lock()
                    .expect("events lock")
                    .push(format!("start:{user_id}:{attempt}"));
            }

            fn on_retry_scheduled(
                &self,
                user_id: UserId,
                attempt: u32,
                _delay: Duration,
                _error: &ChatError,
            ) {
                self.events
                    .lock()
                    .expect("events lock")
                    .push(format!("retry:{user_id}:{attempt}"));
            }

            fn on_turn_complete(&self, user_id: UserId, attempts: u32) {
                self.events
                    .lock()
                    .expect("events lock")
                    .push(format!("complete:{user_id}:{attempts}"));
            }

            fn on_turn_failed(&self, user_id: UserId, attempts: u32, _error: &ChatError) {
                self.events
                    .lock()
                    .expect("events lock")
                    .push(format!("failed:{user_id}:{attempts}"));
            }
        }

        let runner = Arc::new(ScriptedRunner::new(vec![
            Outcome::FailToStart(ChatError::provider("unavailable")),
            Outcome::Fragments(vec!["ok"]),
        ]));
        let recorder = Arc::new(Recorder::default());
        let credentials = Arc::new(CredentialPool::new(vec!["a".into()]).expect("pool"));
        let orchestrator = ConversationOrchestrator::new(
            Arc::new(SessionRegistry::new()),
            runner,
            credentials,
        )
        .without_backoff()
        .with_hooks(recorder.clone());

        let _ = collect(orchestrator.respond(UserId::new(8), "question")).await;

        let events = recorder.events.lock().expect("events lock").clone();
        assert_eq!(
            events,
            vec!["start:8:1", "retry:8:1", "start:8:2", "complete:8:2"]
        );
    }
}
