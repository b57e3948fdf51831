// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Session lifecycle controller.
//!
//! Drives one request/response cycle at a time: builds the request, owns the
//! cancellation token, pumps the decode/assemble/route pipeline and keeps the
//! observable [`ChatState`] current. Retry and resume reuse the same pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::auth::CredentialProvider;
use crate::chat::accumulator::AccumulatorState;
use crate::chat::classify::{classify_failure, requires_reauth, ChatError};
use crate::chat::message::{ChatMessage, ChatTurnRequest, ResumeRequest};
use crate::chat::observer::ChatObserver;
use crate::chat::router::{EventRouter, RouteAction};
use crate::error::{ApiError, Result, SeerError};
use crate::locale::{Locale, LocaleProvider};
use crate::session::SessionRepository;
use crate::sse::{AssembledEvent, SseStream};
use crate::transport::{ChatTransport, Endpoint, OutgoingRequest};
use crate::utils::{lock_or_recover, preview};

const USER_MESSAGE_DELAY_MS: u64 = 100;

/// Per-controller defaults applied to every turn
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerOptions {
    /// Mode used by retry/resume when no turn has been sent yet
    pub default_mode: String,
    /// Title hint sent with each turn
    pub title: String,
    /// Pause between emitting the user message and opening the request
    pub user_message_delay: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            default_mode: "chat".to_string(),
            title: "New conversation".to_string(),
            user_message_delay: Duration::from_millis(USER_MESSAGE_DELAY_MS),
        }
    }
}

/// Where the controller is in its request/response cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    /// Request built, waiting for the response headers
    Sending,
    /// Reading the response body
    Streaming,
}

/// Snapshot of everything a UI needs to render the conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub phase: TurnPhase,
    pub is_loading: bool,
    pub session_id: Option<String>,
    /// Live partial assistant text of the in-flight turn
    pub current_assistant_message: String,
    /// Live thinking text of the in-flight turn
    pub current_thinking_message: String,
    pub last_error: Option<ChatError>,
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed { session_id: Option<String> },
    Errored(ChatError),
    /// Cancelled by `disconnect()` or superseded by a newer turn
    Aborted,
    /// Nothing was sent (retry/resume without a session or message)
    Skipped,
}

/// Why the read loop stopped without failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnd {
    /// `[DONE]`, a final chunk, or a limit notice
    Finished,
    /// The transport ended the body
    Exhausted,
    /// A newer turn took over
    Superseded,
}

#[derive(Debug)]
struct StreamReport {
    end: StreamEnd,
    in_band_error: Option<ChatError>,
}

/// Inputs needed to re-send the last turn
#[derive(Debug, Clone, Default)]
struct LastTurn {
    mode: Option<String>,
    attachments: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
struct TurnContext {
    turn: u64,
    token: CancellationToken,
    mode: String,
}

/// Owns one conversation's streaming lifecycle
pub struct ChatController {
    transport: Arc<dyn ChatTransport>,
    credentials: Arc<dyn CredentialProvider>,
    locale: Arc<dyn LocaleProvider>,
    observer: Arc<dyn ChatObserver>,
    sessions: Option<Arc<dyn SessionRepository>>,
    options: ControllerOptions,
    router: EventRouter,
    state: Mutex<ChatState>,
    accumulator: Mutex<AccumulatorState>,
    inflight: Mutex<Option<CancellationToken>>,
    generation: AtomicU64,
    last_turn: Mutex<LastTurn>,
}

impl ChatController {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        credentials: Arc<dyn CredentialProvider>,
        observer: Arc<dyn ChatObserver>,
    ) -> Self {
        Self {
            transport,
            credentials,
            locale: Arc::new(Locale::default()),
            observer,
            sessions: None,
            options: ControllerOptions::default(),
            router: EventRouter::new(),
            state: Mutex::new(ChatState::default()),
            accumulator: Mutex::new(AccumulatorState::new()),
            inflight: Mutex::new(None),
            generation: AtomicU64::new(0),
            last_turn: Mutex::new(LastTurn::default()),
        }
    }

    pub fn with_locale(mut self, locale: Arc<dyn LocaleProvider>) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_session_repository(mut self, sessions: Arc<dyn SessionRepository>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Continue an existing server session.
    pub fn with_session(self, session_id: impl Into<String>) -> Self {
        lock_or_recover(&self.state).session_id = Some(session_id.into());
        self
    }

    /// Current observable state.
    pub fn state(&self) -> ChatState {
        lock_or_recover(&self.state).clone()
    }

    pub fn session_id(&self) -> Option<String> {
        lock_or_recover(&self.state).session_id.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock_or_recover(&self.state).is_loading
    }

    /// Send one user message and stream the assistant's answer.
    ///
    /// Unless `is_retry` is set, the user message is emitted through
    /// `on_message` before the request goes out. Starting a send abandons
    /// any turn still in flight.
    pub async fn send(
        &self,
        message: &str,
        mode: &str,
        attachments: Option<Vec<String>>,
        is_retry: bool,
    ) -> TurnOutcome {
        let ctx = self.begin_turn(mode);
        *lock_or_recover(&self.last_turn) = LastTurn {
            mode: Some(mode.to_string()),
            attachments: attachments.clone(),
        };

        tracing::info!(
            target: "seer.chat.controller",
            turn = ctx.turn,
            mode,
            is_retry,
            message = %preview(message, 60),
            "sending chat turn"
        );

        if !is_retry {
            self.observer.on_message(&ChatMessage::user(message));
            tokio::select! {
                biased;
                _ = ctx.token.cancelled() => {
                    return self.finish_turn(&ctx, Err(ApiError::Cancelled.into())).await;
                }
                _ = tokio::time::sleep(self.options.user_message_delay) => {}
            }
        }

        let request = self.build_turn_request(message, mode, attachments, is_retry);
        self.run_turn(&ctx, request).await
    }

    /// Re-send the most recent user message in `history` as a retry.
    pub async fn retry_last_message(&self, history: &[ChatMessage]) -> TurnOutcome {
        if self.session_id().is_none() {
            tracing::warn!(target: "seer.chat.controller", "retry requested without a session");
            return TurnOutcome::Skipped;
        }
        let Some(last_user) = history.iter().rev().find(|m| m.is_user()) else {
            tracing::warn!(target: "seer.chat.controller", "retry requested without a user message");
            return TurnOutcome::Skipped;
        };

        let LastTurn { mode, attachments } = lock_or_recover(&self.last_turn).clone();
        let mode = mode.unwrap_or_else(|| self.options.default_mode.clone());
        self.send(&last_user.content, &mode, attachments, true).await
    }

    /// Ask the server to replay the interrupted turn of the current session.
    pub async fn resume_conversation(&self) -> TurnOutcome {
        let Some(session_id) = self.session_id() else {
            tracing::warn!(target: "seer.chat.controller", "resume requested without a session");
            return TurnOutcome::Skipped;
        };

        let mode = lock_or_recover(&self.last_turn)
            .mode
            .clone()
            .unwrap_or_else(|| self.options.default_mode.clone());
        let ctx = self.begin_turn(&mode);

        tracing::info!(
            target: "seer.chat.controller",
            turn = ctx.turn,
            session_id = %session_id,
            "resuming conversation"
        );

        let language = self.locale.locale().language_code();
        let request = serde_json::to_value(ResumeRequest::new(session_id, language))
            .map(|body| (Endpoint::Resume, body))
            .map_err(SeerError::from);
        self.run_turn(&ctx, request).await
    }

    /// Abort the in-flight turn, if any, without reporting an error.
    pub fn disconnect(&self) {
        let token = lock_or_recover(&self.inflight).take();
        if let Some(token) = token {
            tracing::debug!(target: "seer.chat.controller", "disconnecting in-flight turn");
            token.cancel();
        }
        lock_or_recover(&self.accumulator).close();
        let mut state = lock_or_recover(&self.state);
        state.phase = TurnPhase::Idle;
        state.is_loading = false;
        state.current_assistant_message.clear();
        state.current_thinking_message.clear();
    }

    fn begin_turn(&self, mode: &str) -> TurnContext {
        let token = CancellationToken::new();
        let turn = {
            let mut inflight = lock_or_recover(&self.inflight);
            let turn = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(previous) = inflight.replace(token.clone()) {
                tracing::debug!(target: "seer.chat.controller", turn, "abandoning previous turn");
                previous.cancel();
            }
            turn
        };

        lock_or_recover(&self.accumulator).open(turn);
        {
            let mut state = lock_or_recover(&self.state);
            state.phase = TurnPhase::Sending;
            state.is_loading = true;
            state.last_error = None;
            state.current_assistant_message.clear();
            state.current_thinking_message.clear();
        }

        TurnContext {
            turn,
            token,
            mode: mode.to_string(),
        }
    }

    fn build_turn_request(
        &self,
        message: &str,
        mode: &str,
        attachments: Option<Vec<String>>,
        is_retry: bool,
    ) -> Result<(Endpoint, Value)> {
        let language = self.locale.locale().language_code();
        let request = ChatTurnRequest::new(message, mode, language)
            .with_session(self.session_id())
            .with_title(self.options.title.clone())
            .with_retry(is_retry)
            .with_attachments(attachments.unwrap_or_default())?;
        Ok((Endpoint::Chat, serde_json::to_value(request)?))
    }

    async fn run_turn(&self, ctx: &TurnContext, request: Result<(Endpoint, Value)>) -> TurnOutcome {
        let result = match request {
            Ok((endpoint, body)) => self.stream_turn(ctx, endpoint, body).await,
            Err(err) => Err(err),
        };
        self.finish_turn(ctx, result).await
    }

    async fn stream_turn(
        &self,
        ctx: &TurnContext,
        endpoint: Endpoint,
        body: Value,
    ) -> Result<StreamReport> {
        let bearer_token = self.credentials.bearer_token().await?;
        let request = OutgoingRequest {
            endpoint,
            body,
            bearer_token,
        };

        let mut stream = tokio::select! {
            biased;
            _ = ctx.token.cancelled() => return Err(ApiError::Cancelled.into()),
            opened = self.transport.open(request) => opened?,
        };

        self.update_state(ctx.turn, |state| state.phase = TurnPhase::Streaming);
        tracing::debug!(target: "seer.chat.controller", turn = ctx.turn, %endpoint, "stream opened");

        let mut sse = SseStream::new();
        let mut in_band_error = None;
        loop {
            let next = tokio::select! {
                biased;
                _ = ctx.token.cancelled() => return Err(ApiError::Cancelled.into()),
                next = stream.next() => next,
            };

            let (events, exhausted) = match next {
                Some(chunk) => (sse.feed(&chunk?), false),
                None => (sse.finish().into_iter().collect(), true),
            };

            for event in &events {
                if let Some(end) = self.dispatch(ctx.turn, event, &mut in_band_error) {
                    return Ok(StreamReport { end, in_band_error });
                }
            }

            if exhausted {
                return Ok(StreamReport {
                    end: StreamEnd::Exhausted,
                    in_band_error,
                });
            }
        }
    }

    /// Route one event and apply its effects. Returns `Some` when the read
    /// loop must stop.
    fn dispatch(
        &self,
        turn: u64,
        event: &AssembledEvent,
        in_band_error: &mut Option<ChatError>,
    ) -> Option<StreamEnd> {
        let routed = {
            let mut acc = lock_or_recover(&self.accumulator);
            self.router.route(event, turn, &mut acc)
        };

        if let Some(session_id) = routed.session_id {
            self.update_state(turn, |state| {
                if state.session_id.is_none() {
                    tracing::debug!(target: "seer.chat.controller", %session_id, "adopted session id");
                    state.session_id = Some(session_id);
                }
            });
        }

        match routed.action {
            RouteAction::Done => Some(StreamEnd::Finished),
            RouteAction::Final(message) | RouteAction::LimitReached(message) => {
                self.clear_live_text(turn);
                // The turn already failed in-band; its answer is failed too.
                let message = if in_band_error.is_some() {
                    message.failed()
                } else {
                    message
                };
                self.observer.on_message(&message);
                Some(StreamEnd::Finished)
            }
            RouteAction::Error(error) => {
                tracing::warn!(
                    target: "seer.chat.controller",
                    turn,
                    kind = %error.kind,
                    message = %error.message,
                    "server reported an error"
                );
                self.update_state(turn, |state| state.last_error = Some(error.clone()));
                self.observer.on_error(&error);
                *in_band_error = Some(error);
                None
            }
            RouteAction::Partial(text) => {
                self.update_state(turn, |state| state.current_assistant_message = text.clone());
                self.observer.on_partial(&text);
                None
            }
            RouteAction::Thinking(text) => {
                self.update_state(turn, |state| state.current_thinking_message = text.clone());
                self.observer.on_thinking(&text);
                None
            }
            RouteAction::RefreshCharacters(payload) => {
                self.observer.on_refresh_characters(&payload);
                None
            }
            RouteAction::RefreshReports(payload) => {
                self.observer.on_refresh_reports(&payload);
                None
            }
            RouteAction::FunctionResult(message) => {
                self.observer.on_message(&message);
                None
            }
            RouteAction::Stale => Some(StreamEnd::Superseded),
            RouteAction::Ignored(_) => None,
        }
    }

    async fn finish_turn(&self, ctx: &TurnContext, result: Result<StreamReport>) -> TurnOutcome {
        let outcome = match result {
            Err(err) if ctx.token.is_cancelled() || err.is_cancelled() => {
                tracing::debug!(target: "seer.chat.controller", turn = ctx.turn, "turn aborted");
                TurnOutcome::Aborted
            }
            Err(err) => self.fail_turn(ctx, &err).await,
            Ok(report) => match (report.end, report.in_band_error) {
                (StreamEnd::Superseded, _) => {
                    tracing::debug!(target: "seer.chat.controller", turn = ctx.turn, "turn superseded");
                    TurnOutcome::Aborted
                }
                (_, Some(error)) => {
                    if let Some((text, thinking)) = self.drain_accumulator(ctx.turn) {
                        let message = ChatMessage::assistant(text).with_thinking(thinking).failed();
                        self.observer.on_message(&message);
                    }
                    TurnOutcome::Errored(error)
                }
                (end, None) => {
                    // Text left over after `[DONE]` or end of body never got a final chunk.
                    if let Some((text, thinking)) = self.drain_accumulator(ctx.turn) {
                        tracing::debug!(target: "seer.chat.controller", turn = ctx.turn, ?end, "emitting unfinalized text");
                        let message = ChatMessage::assistant(text).with_thinking(thinking);
                        self.observer.on_message(&message);
                    }
                    TurnOutcome::Completed {
                        session_id: self.session_id(),
                    }
                }
            },
        };

        self.release(ctx.turn);

        if let TurnOutcome::Completed { session_id } = &outcome {
            tracing::info!(
                target: "seer.chat.controller",
                turn = ctx.turn,
                session_id = ?session_id,
                "turn completed"
            );
            if let (Some(sessions), Some(id)) = (&self.sessions, session_id) {
                sessions.record_turn(id, &ctx.mode, &self.options.title);
            }
            self.observer.on_complete(session_id.as_deref());
        }

        outcome
    }

    async fn fail_turn(&self, ctx: &TurnContext, err: &SeerError) -> TurnOutcome {
        if requires_reauth(err) {
            self.credentials.reauthenticate().await;
        }

        let Some(error) = classify_failure(err) else {
            return TurnOutcome::Aborted;
        };

        tracing::warn!(
            target: "seer.chat.controller",
            turn = ctx.turn,
            kind = %error.kind,
            retryable = error.retryable,
            error = %err,
            "chat turn failed"
        );
        self.update_state(ctx.turn, |state| state.last_error = Some(error.clone()));
        self.observer.on_error(&error);
        TurnOutcome::Errored(error)
    }

    /// Take whatever text the turn accumulated, if any.
    fn drain_accumulator(&self, turn: u64) -> Option<(String, String)> {
        let mut acc = lock_or_recover(&self.accumulator);
        if !acc.is_active(turn) {
            return None;
        }
        let (text, thinking) = acc.take();
        (!text.is_empty()).then_some((text, thinking))
    }

    /// Return to idle and drop the token, unless a newer turn has started.
    fn release(&self, turn: u64) {
        {
            let mut inflight = lock_or_recover(&self.inflight);
            if self.generation.load(Ordering::SeqCst) != turn {
                return;
            }
            inflight.take();
        }

        {
            let mut acc = lock_or_recover(&self.accumulator);
            if acc.is_active(turn) {
                acc.close();
            }
        }

        let mut state = lock_or_recover(&self.state);
        state.phase = TurnPhase::Idle;
        state.is_loading = false;
        state.current_assistant_message.clear();
        state.current_thinking_message.clear();
    }

    fn clear_live_text(&self, turn: u64) {
        self.update_state(turn, |state| {
            state.current_assistant_message.clear();
            state.current_thinking_message.clear();
        });
    }

    /// Mutate the observable state on behalf of `turn`; no-op once a newer
    /// turn has started.
    fn update_state(&self, turn: u64, f: impl FnOnce(&mut ChatState)) {
        if self.generation.load(Ordering::SeqCst) != turn {
            return;
        }
        f(&mut lock_or_recover(&self.state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticCredentials;
    use crate::chat::classify::ErrorKind;
    use crate::chat::observer::RecordingObserver;
    use crate::transport::{ScriptedResponse, ScriptedTransport};

    fn controller(transport: &ScriptedTransport) -> (ChatController, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::new());
        let controller = ChatController::new(
            Arc::new(transport.clone()),
            Arc::new(StaticCredentials::with_token("token")),
            observer.clone(),
        )
        .with_options(ControllerOptions {
            user_message_delay: Duration::ZERO,
            ..ControllerOptions::default()
        });
        (controller, observer)
    }

    #[tokio::test]
    async fn test_idle_after_completed_turn() {
        let transport = ScriptedTransport::new().with_response(ScriptedResponse::body(
            "data: {\"session_id\":\"s1\",\"content\":{\"text\":\"Hi\"},\"partial\":false}\n",
        ));
        let (controller, observer) = controller(&transport);

        let outcome = controller.send("hello", "chat", None, false).await;

        assert_eq!(
            outcome,
            TurnOutcome::Completed {
                session_id: Some("s1".to_string())
            }
        );
        let state = controller.state();
        assert_eq!(state.phase, TurnPhase::Idle);
        assert!(!state.is_loading);
        assert_eq!(observer.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_too_many_attachments_is_invalid_request() {
        let transport = ScriptedTransport::new();
        let (controller, observer) = controller(&transport);

        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let outcome = controller.send("hello", "chat", Some(ids), false).await;

        match outcome {
            TurnOutcome::Errored(error) => assert_eq!(error.kind, ErrorKind::InvalidRequest),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(transport.open_count(), 0);
        assert_eq!(observer.errors().len(), 1);
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_resume_without_session_is_skipped() {
        let transport = ScriptedTransport::new();
        let (controller, _observer) = controller(&transport);

        assert_eq!(controller.resume_conversation().await, TurnOutcome::Skipped);
        assert_eq!(transport.open_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_when_idle_is_harmless() {
        let transport = ScriptedTransport::new();
        let (controller, observer) = controller(&transport);

        controller.disconnect();

        assert_eq!(controller.state(), ChatState::default());
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn test_with_session_is_sent() {
        let transport = ScriptedTransport::new();
        let (controller, _observer) = controller(&transport);
        let controller = controller.with_session("existing");

        controller.send("hi", "chat", None, false).await;

        let request = transport.last_request().unwrap();
        assert_eq!(request.body["session_id"], "existing");
        assert_eq!(request.bearer_token.as_deref(), Some("token"));
    }
}
