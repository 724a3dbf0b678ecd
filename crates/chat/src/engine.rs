use std::sync::Arc;

use {
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {
    mantle_assistant::{AssistantBackend, poll, select},
    mantle_channels::{ChannelOutbound, InboundMessage, chunk::chunk_text, gating},
    mantle_sessions::SessionRegistry,
};

use crate::error::{Error, Result};

/// The one user-visible sentence an interaction can fail with.
pub const FALLBACK_REPLY: &str = "I'm having trouble processing your request right now.";

/// Routes inbound messages through the session store and the assistant
/// backend, and delivers the reply in platform-sized chunks.
pub struct ChatEngine {
    registry: SessionRegistry,
    backend: Arc<dyn AssistantBackend>,
    outbound: Arc<dyn ChannelOutbound>,
    assistant_id: String,
    message_limit: usize,
    cancel: CancellationToken,
}

impl ChatEngine {
    pub fn new(
        registry: SessionRegistry,
        backend: Arc<dyn AssistantBackend>,
        outbound: Arc<dyn ChannelOutbound>,
        assistant_id: impl Into<String>,
        message_limit: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            backend,
            outbound,
            assistant_id: assistant_id.into(),
            message_limit,
            cancel,
        }
    }

    /// Process one inbound message.
    ///
    /// Bot-authored and broadcast-mention messages are dropped outright.
    /// Everything else refreshes the session's activity clock (and sweeps
    /// idle sessions while at it); only messages that mention the bot go on
    /// to produce a reply.
    pub async fn handle(&self, message: &InboundMessage) {
        if message.author_is_bot {
            return;
        }
        if gating::has_broadcast_mention(&message.content) {
            debug!(channel_id = %message.channel_id, "ignoring broadcast-mention message");
            return;
        }

        self.registry.touch(&message.channel_id);
        self.registry.sweep_expired();

        if !message.mentions_bot {
            return;
        }

        let text = message.clean_content.trim();
        if text.is_empty() {
            debug!(channel_id = %message.channel_id, "mention carried no text");
            return;
        }

        info!(
            channel_id = %message.channel_id,
            author = %message.author_id,
            sender = message.author_name.as_deref().unwrap_or("unknown"),
            "relaying mention: {}",
            text,
        );

        match self.reply_pipeline(&message.channel_id, text).await {
            Ok(()) => {},
            Err(e) if e.is_cancelled() => {
                info!(channel_id = %message.channel_id, "interaction aborted by shutdown");
            },
            Err(Error::Outbound { source }) => {
                // The reply may be partially delivered; pushing a fallback
                // through the same failing channel would only add noise.
                error!(channel_id = %message.channel_id, error = %source, "reply delivery failed");
            },
            Err(e) => {
                error!(channel_id = %message.channel_id, error = %e, "interaction failed");
                if let Err(send_err) = self
                    .outbound
                    .send_text(&message.channel_id, FALLBACK_REPLY)
                    .await
                {
                    warn!(
                        channel_id = %message.channel_id,
                        error = %send_err,
                        "failed to deliver fallback reply"
                    );
                }
            },
        }
    }

    /// The guarded resolve → thread → submit → poll → select → send path.
    ///
    /// Holds the session's pipeline guard from resolution through the last
    /// chunk send. Either the full reply goes out or nothing does; the
    /// caller turns any error into the single fallback message.
    async fn reply_pipeline(&self, channel_id: &str, text: &str) -> Result<()> {
        let session = self.registry.resolve(channel_id);
        let mut guard = session.begin().await;

        // Typing stays on while the backend thinks; the guard drops (and the
        // indicator stops) before chunks go out, failure or not.
        let typing = match self.outbound.start_typing(channel_id).await {
            Ok(guard) => Some(guard),
            Err(e) => {
                debug!(channel_id, error = %e, "typing indicator unavailable");
                None
            },
        };

        let thread = guard.ensure_thread(self.backend.as_ref()).await?;
        self.backend
            .create_message(&thread, text)
            .await
            .map_err(|source| Error::Submission { source })?;
        let run = self
            .backend
            .create_run(&thread, &self.assistant_id)
            .await
            .map_err(|source| Error::Submission { source })?;

        poll::await_completion(self.backend.as_ref(), &thread, &run.id, &self.cancel)
            .await
            .map_err(|source| Error::Poll { source })?;

        let messages = self
            .backend
            .list_messages(&thread)
            .await
            .map_err(|source| Error::Retrieval { source })?;
        let reply = select::latest_reply(&messages, run.created_at)
            .unwrap_or(select::NO_REPLY)
            .to_string();
        drop(typing);

        debug!(channel_id, reply_len = reply.len(), "sending reply");
        for chunk in chunk_text(&reply, self.message_limit) {
            self.outbound
                .send_text(channel_id, &chunk)
                .await
                .map_err(|source| Error::Outbound { source })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;

    use {
        super::*,
        mantle_assistant::{Role, Run, RunId, RunStatus, ThreadId, ThreadMessage},
        mantle_channels::TypingGuard,
    };

    const HOUR: Duration = Duration::from_secs(3600);

    // ── Mock backend ────────────────────────────────────────────────────

    struct MockBackend {
        calls: Mutex<Vec<&'static str>>,
        threads_created: AtomicUsize,
        fail_thread_creations: AtomicUsize,
        statuses: Mutex<VecDeque<RunStatus>>,
        messages: Mutex<Vec<ThreadMessage>>,
        run_created_at: i64,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                threads_created: AtomicUsize::new(0),
                fail_thread_creations: AtomicUsize::new(0),
                statuses: Mutex::new(VecDeque::new()),
                messages: Mutex::new(Vec::new()),
                run_created_at: 0,
            }
        }

        fn with_statuses(self, statuses: &[RunStatus]) -> Self {
            *self.statuses.lock().unwrap() = statuses.iter().copied().collect();
            self
        }

        fn with_reply(self, created_at: i64, content: &str) -> Self {
            self.messages.lock().unwrap().push(ThreadMessage {
                role: Role::Assistant,
                created_at,
                content: content.into(),
            });
            self
        }

        fn with_run_created_at(mut self, created_at: i64) -> Self {
            self.run_created_at = created_at;
            self
        }

        fn failing_thread_creations(self, n: usize) -> Self {
            self.fail_thread_creations.store(n, Ordering::SeqCst);
            self
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn call_count(&self, name: &str) -> usize {
            self.calls().iter().filter(|c| **c == name).count()
        }

        fn record(&self, name: &'static str) {
            self.calls.lock().unwrap().push(name);
        }
    }

    #[async_trait]
    impl AssistantBackend for MockBackend {
        async fn create_thread(&self) -> mantle_assistant::Result<ThreadId> {
            self.record("create_thread");
            if self
                .fail_thread_creations
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(mantle_assistant::Error::message("backend unavailable"));
            }
            let n = self.threads_created.fetch_add(1, Ordering::SeqCst);
            Ok(ThreadId(format!("thread_{n}")))
        }

        async fn create_message(
            &self,
            _thread: &ThreadId,
            _content: &str,
        ) -> mantle_assistant::Result<()> {
            self.record("create_message");
            Ok(())
        }

        async fn create_run(
            &self,
            _thread: &ThreadId,
            _assistant_id: &str,
        ) -> mantle_assistant::Result<Run> {
            self.record("create_run");
            Ok(Run {
                id: RunId("run_1".into()),
                created_at: self.run_created_at,
            })
        }

        async fn run_status(
            &self,
            _thread: &ThreadId,
            _run: &RunId,
        ) -> mantle_assistant::Result<RunStatus> {
            self.record("run_status");
            let next = self.statuses.lock().unwrap().pop_front();
            Ok(next.unwrap_or(RunStatus::Completed))
        }

        async fn list_messages(
            &self,
            _thread: &ThreadId,
        ) -> mantle_assistant::Result<Vec<ThreadMessage>> {
            self.record("list_messages");
            Ok(self.messages.lock().unwrap().clone())
        }
    }

    // ── Mock outbound ───────────────────────────────────────────────────

    struct NoopTyping;

    impl TypingGuard for NoopTyping {}

    struct RecordingOutbound {
        sent: Mutex<Vec<(String, String)>>,
        typing_started: AtomicUsize,
    }

    impl RecordingOutbound {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                typing_started: AtomicUsize::new(0),
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }

        fn sent_texts(&self) -> Vec<String> {
            self.sent().into_iter().map(|(_, text)| text).collect()
        }
    }

    #[async_trait]
    impl ChannelOutbound for RecordingOutbound {
        async fn send_text(&self, to: &str, text: &str) -> mantle_channels::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), text.to_string()));
            Ok(())
        }

        async fn start_typing(
            &self,
            _to: &str,
        ) -> mantle_channels::Result<Box<dyn TypingGuard>> {
            self.typing_started.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NoopTyping))
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn engine_with_limit(
        backend: Arc<MockBackend>,
        outbound: Arc<RecordingOutbound>,
        limit: usize,
    ) -> ChatEngine {
        ChatEngine::new(
            SessionRegistry::new(HOUR),
            backend,
            outbound,
            "asst_test",
            limit,
            CancellationToken::new(),
        )
    }

    fn engine(backend: Arc<MockBackend>, outbound: Arc<RecordingOutbound>) -> ChatEngine {
        engine_with_limit(backend, outbound, 2000)
    }

    fn mention(text: &str) -> InboundMessage {
        InboundMessage {
            channel_id: "chan_1".into(),
            author_id: "user_1".into(),
            author_name: Some("pat".into()),
            author_is_bot: false,
            content: format!("<@42> {text}"),
            clean_content: text.into(),
            mentions_bot: true,
        }
    }

    // ── Filters ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn bot_authors_are_ignored_entirely() {
        let backend = Arc::new(MockBackend::new());
        let outbound = Arc::new(RecordingOutbound::new());
        let engine = engine(Arc::clone(&backend), Arc::clone(&outbound));

        let mut message = mention("hello");
        message.author_is_bot = true;
        engine.handle(&message).await;

        assert!(backend.calls().is_empty());
        assert!(outbound.sent().is_empty());
        assert!(engine.registry.is_empty());
    }

    #[tokio::test]
    async fn broadcast_mentions_are_ignored_entirely() {
        let backend = Arc::new(MockBackend::new());
        let outbound = Arc::new(RecordingOutbound::new());
        let engine = engine(Arc::clone(&backend), Arc::clone(&outbound));

        let mut message = mention("ping");
        message.content = "@everyone urgent!".into();
        engine.handle(&message).await;

        assert!(backend.calls().is_empty());
        assert!(outbound.sent().is_empty());
        assert!(engine.registry.is_empty());
    }

    #[tokio::test]
    async fn unmentioned_messages_touch_the_session_but_stay_silent() {
        let backend = Arc::new(MockBackend::new());
        let outbound = Arc::new(RecordingOutbound::new());
        let engine = engine(Arc::clone(&backend), Arc::clone(&outbound));

        let mut message = mention("just chatting");
        message.mentions_bot = false;
        engine.handle(&message).await;

        assert_eq!(engine.registry.len(), 1);
        assert!(backend.calls().is_empty());
        assert!(outbound.sent().is_empty());
    }

    #[tokio::test]
    async fn mention_with_only_whitespace_is_dropped() {
        let backend = Arc::new(MockBackend::new());
        let outbound = Arc::new(RecordingOutbound::new());
        let engine = engine(Arc::clone(&backend), Arc::clone(&outbound));

        engine.handle(&mention("   ")).await;

        assert!(backend.calls().is_empty());
        assert!(outbound.sent().is_empty());
    }

    // ── Reply pipeline ──────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn mention_relays_the_newest_assistant_reply() {
        let backend = Arc::new(
            MockBackend::new()
                .with_statuses(&[RunStatus::InProgress, RunStatus::Completed])
                .with_reply(10, "A")
                .with_reply(20, "B"),
        );
        let outbound = Arc::new(RecordingOutbound::new());
        let engine = engine(Arc::clone(&backend), Arc::clone(&outbound));

        engine.handle(&mention("what's new?")).await;

        assert_eq!(outbound.sent(), vec![("chan_1".to_string(), "B".to_string())]);
        assert_eq!(
            backend.calls(),
            vec![
                "create_thread",
                "create_message",
                "create_run",
                "run_status",
                "run_status",
                "list_messages",
            ]
        );
        assert_eq!(outbound.typing_started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn long_replies_are_sent_as_ordered_chunks() {
        let backend = Arc::new(MockBackend::new().with_reply(10, "alpha beta gamma"));
        let outbound = Arc::new(RecordingOutbound::new());
        let engine = engine_with_limit(Arc::clone(&backend), Arc::clone(&outbound), 7);

        engine.handle(&mention("talk to me")).await;

        assert_eq!(outbound.sent_texts(), vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_mention_reuses_the_thread() {
        let backend = Arc::new(MockBackend::new().with_reply(10, "hi"));
        let outbound = Arc::new(RecordingOutbound::new());
        let engine = engine(Arc::clone(&backend), Arc::clone(&outbound));

        engine.handle(&mention("first")).await;
        engine.handle(&mention("second")).await;

        assert_eq!(backend.call_count("create_thread"), 1);
        assert_eq!(backend.call_count("create_run"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_run_with_no_reply_sends_the_sentinel() {
        let backend = Arc::new(MockBackend::new());
        let outbound = Arc::new(RecordingOutbound::new());
        let engine = engine(Arc::clone(&backend), Arc::clone(&outbound));

        engine.handle(&mention("anyone home?")).await;

        assert_eq!(outbound.sent_texts(), vec![select::NO_REPLY]);
    }

    #[tokio::test(start_paused = true)]
    async fn replies_from_before_the_run_are_not_relayed() {
        let backend = Arc::new(
            MockBackend::new()
                .with_reply(10, "stale answer")
                .with_run_created_at(15),
        );
        let outbound = Arc::new(RecordingOutbound::new());
        let engine = engine(Arc::clone(&backend), Arc::clone(&outbound));

        engine.handle(&mention("fresh question")).await;

        assert_eq!(outbound.sent_texts(), vec![select::NO_REPLY]);
    }

    // ── Failure handling ────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn thread_creation_failure_sends_one_fallback_and_retries_cold() {
        let backend = Arc::new(
            MockBackend::new()
                .with_reply(10, "recovered")
                .failing_thread_creations(1),
        );
        let outbound = Arc::new(RecordingOutbound::new());
        let engine = engine(Arc::clone(&backend), Arc::clone(&outbound));

        engine.handle(&mention("first try")).await;
        assert_eq!(outbound.sent_texts(), vec![FALLBACK_REPLY]);
        // The failed attempt never reached submission.
        assert_eq!(backend.call_count("create_message"), 0);

        engine.handle(&mention("second try")).await;
        assert_eq!(backend.call_count("create_thread"), 2);
        assert_eq!(
            outbound.sent_texts(),
            vec![FALLBACK_REPLY.to_string(), "recovered".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_sends_one_fallback() {
        let backend = Arc::new(MockBackend::new().with_statuses(&[
            RunStatus::InProgress,
            RunStatus::Failed,
        ]));
        let outbound = Arc::new(RecordingOutbound::new());
        let engine = engine(Arc::clone(&backend), Arc::clone(&outbound));

        engine.handle(&mention("doomed")).await;

        assert_eq!(outbound.sent_texts(), vec![FALLBACK_REPLY]);
        assert_eq!(backend.call_count("list_messages"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_failure_never_adds_a_fallback() {
        struct FlakyOutbound {
            sent: Mutex<Vec<String>>,
            remaining_ok: AtomicUsize,
        }

        #[async_trait]
        impl ChannelOutbound for FlakyOutbound {
            async fn send_text(&self, _to: &str, text: &str) -> mantle_channels::Result<()> {
                if self
                    .remaining_ok
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
                {
                    self.sent.lock().unwrap().push(text.to_string());
                    Ok(())
                } else {
                    Err(mantle_channels::Error::unavailable("gateway dropped"))
                }
            }

            async fn start_typing(
                &self,
                _to: &str,
            ) -> mantle_channels::Result<Box<dyn TypingGuard>> {
                Ok(Box::new(NoopTyping))
            }
        }

        let backend = Arc::new(MockBackend::new().with_reply(10, "alpha beta gamma"));
        let outbound = Arc::new(FlakyOutbound {
            sent: Mutex::new(Vec::new()),
            remaining_ok: AtomicUsize::new(1),
        });
        let engine = ChatEngine::new(
            SessionRegistry::new(HOUR),
            backend,
            Arc::clone(&outbound) as Arc<dyn ChannelOutbound>,
            "asst_test",
            7,
            CancellationToken::new(),
        );

        engine.handle(&mention("hello")).await;

        // Only the chunk that made it through; no fallback sentence follows.
        assert_eq!(*outbound.sent.lock().unwrap(), vec!["alpha".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_polling_sends_nothing() {
        let backend = Arc::new(MockBackend::new().with_statuses(&[
            RunStatus::InProgress,
            RunStatus::InProgress,
            RunStatus::InProgress,
        ]));
        let outbound = Arc::new(RecordingOutbound::new());
        let cancel = CancellationToken::new();
        let engine = ChatEngine::new(
            SessionRegistry::new(HOUR),
            Arc::clone(&backend) as Arc<dyn AssistantBackend>,
            Arc::clone(&outbound) as Arc<dyn ChannelOutbound>,
            "asst_test",
            2000,
            cancel.clone(),
        );
        cancel.cancel();

        engine.handle(&mention("shutting down")).await;

        assert!(outbound.sent().is_empty());
    }
}
