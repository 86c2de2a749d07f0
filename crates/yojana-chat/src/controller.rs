//! Conversation controller: wires state, responder, and speech adapters.
//!
//! A send appends the user message synchronously, then spawns a reply task
//! that waits out the configured latency, appends the bot message, and
//! speaks it unless muted. Only one reply is ever in flight.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use yojana_core::config::ChatConfig;
use yojana_core::language::Language;
use yojana_core::types::{Message, SessionId};

use crate::error::ChatError;
use crate::events::{ChatEvent, EVENT_CHANNEL_CAPACITY};
use crate::response::ResponseGenerator;
use crate::state::ConversationState;
use crate::suggestions::{self, PREDEFINED_QUESTIONS};
use crate::voice::{SpeechInput, SpeechOutput, VoiceCapabilities};

/// Handle to a scheduled bot reply.
#[derive(Debug)]
pub struct PendingReply {
    handle: JoinHandle<Option<Message>>,
}

impl PendingReply {
    /// Wait for the reply task.
    ///
    /// Resolves to `None` when the reply was cancelled or arrived after the
    /// turn had already been closed.
    pub async fn wait(self) -> Result<Option<Message>, ChatError> {
        self.handle
            .await
            .map_err(|e| ChatError::TaskFailed(e.to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Everything a reply task needs, cloned out of the controller.
struct ReplyTask {
    state: Arc<Mutex<ConversationState>>,
    generator: Arc<ResponseGenerator>,
    speech_out: Arc<dyn SpeechOutput>,
    events: broadcast::Sender<ChatEvent>,
    cancel: CancellationToken,
    delay: Duration,
}

impl ReplyTask {
    async fn run(self, question: String) -> Option<Message> {
        tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("Reply cancelled before it was produced");
                return None;
            }
            _ = tokio::time::sleep(self.delay) => {}
        }

        let reply = self.generator.respond(&question);

        let (message, muted) = {
            let mut state = lock(&self.state);
            match state.append_bot(&reply.text).cloned() {
                Ok(message) => (message, state.is_muted()),
                Err(e) => {
                    // Turn was closed underneath us (shutdown raced the timer).
                    debug!(error = %e, "Dropping stale reply");
                    return None;
                }
            }
        };

        info!(topic = %reply.topic, message_id = %message.id, "Bot replied");
        let _ = self.events.send(ChatEvent::MessageAppended {
            message: message.clone(),
        });
        let _ = self
            .events
            .send(ChatEvent::ProcessingChanged { processing: false });

        if !muted && self.speech_out.is_supported() {
            if let Err(e) = self.speech_out.speak(&message.text) {
                warn!(error = %e, "Speech output failed; continuing text-only");
            }
        }

        Some(message)
    }
}

/// Drives one chat session.
pub struct ConversationController {
    state: Arc<Mutex<ConversationState>>,
    generator: Arc<ResponseGenerator>,
    speech_in: Arc<dyn SpeechInput>,
    speech_out: Arc<dyn SpeechOutput>,
    events: broadcast::Sender<ChatEvent>,
    cancel: CancellationToken,
    reply_delay: Duration,
}

impl ConversationController {
    /// Create a controller for a fresh session.
    pub fn new(
        config: &ChatConfig,
        speech_in: Arc<dyn SpeechInput>,
        speech_out: Arc<dyn SpeechOutput>,
    ) -> Self {
        let state = ConversationState::new(&config.greeting);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let controller = Self {
            state: Arc::new(Mutex::new(state)),
            generator: Arc::new(ResponseGenerator::from_config(&config.rules)),
            speech_in,
            speech_out,
            events,
            cancel: CancellationToken::new(),
            reply_delay: Duration::from_millis(config.reply_delay_ms),
        };

        let caps = controller.capabilities();
        if caps.needs_advisory() {
            warn!(
                recognition = caps.recognition,
                synthesis = caps.synthesis,
                "Some voice features are unavailable"
            );
        }
        info!(session_id = %controller.session_id(), "Conversation started");
        controller
    }

    /// Set the initial mute flag.
    pub fn muted(self, muted: bool) -> Self {
        lock(&self.state).set_muted(muted);
        self
    }

    /// Subscribe to state-change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    pub fn session_id(&self) -> SessionId {
        lock(&self.state).session_id()
    }

    /// Snapshot of the conversation in display order.
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state).messages().to_vec()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).is_empty()
    }

    pub fn is_processing(&self) -> bool {
        lock(&self.state).is_processing()
    }

    pub fn is_muted(&self) -> bool {
        lock(&self.state).is_muted()
    }

    pub fn is_listening(&self) -> bool {
        lock(&self.state).is_listening()
    }

    pub fn input(&self) -> String {
        lock(&self.state).input().to_string()
    }

    /// Whether the send control should be enabled.
    pub fn can_send(&self) -> bool {
        lock(&self.state).can_send()
    }

    pub fn capabilities(&self) -> VoiceCapabilities {
        VoiceCapabilities::probe(self.speech_in.as_ref(), self.speech_out.as_ref())
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // -----------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------

    /// Replace the input buffer.
    pub fn set_input(&self, text: impl Into<String>) {
        let text = text.into();
        lock(&self.state).set_input(text.clone());
        let _ = self.events.send(ChatEvent::InputChanged { text });
    }

    /// Copy a non-empty speech transcript into the input buffer.
    ///
    /// Returns the transcript when it was copied.
    pub fn sync_transcript(&self) -> Option<String> {
        let transcript = self.speech_in.transcript();
        if transcript.is_empty() {
            return None;
        }
        {
            let mut state = lock(&self.state);
            if state.input() == transcript {
                return None;
            }
            state.set_input(transcript.clone());
        }
        let _ = self.events.send(ChatEvent::InputChanged {
            text: transcript.clone(),
        });
        Some(transcript)
    }

    /// Send `text`, or the input buffer when `text` is absent or blank.
    ///
    /// Returns `Ok(None)` without touching the conversation when there is
    /// nothing to send or a reply is already in flight.
    pub fn send(&self, text: Option<&str>) -> Result<Option<PendingReply>, ChatError> {
        if self.cancel.is_cancelled() {
            return Err(ChatError::Cancelled);
        }

        let (message, question) = {
            let mut state = lock(&self.state);
            let question = match text {
                Some(t) if !t.trim().is_empty() => t.to_string(),
                _ => state.input().to_string(),
            };
            match state.begin_turn(&question) {
                Ok(message) => (message, question),
                Err(ChatError::EmptyMessage) => {
                    debug!("Ignoring empty send");
                    return Ok(None);
                }
                Err(ChatError::ReplyInFlight) => {
                    debug!("Ignoring send while a reply is in flight");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        };

        self.speech_in.clear_text();
        info!(message_id = %message.id, "User message sent");
        let _ = self.events.send(ChatEvent::MessageAppended { message });
        let _ = self.events.send(ChatEvent::InputChanged {
            text: String::new(),
        });
        let _ = self
            .events
            .send(ChatEvent::ProcessingChanged { processing: true });

        let task = ReplyTask {
            state: Arc::clone(&self.state),
            generator: Arc::clone(&self.generator),
            speech_out: Arc::clone(&self.speech_out),
            events: self.events.clone(),
            cancel: self.cancel.child_token(),
            delay: self.reply_delay,
        };
        let handle = tokio::spawn(task.run(question));
        Ok(Some(PendingReply { handle }))
    }

    /// Put suggested question `index` (zero-based) in the input and send it.
    pub fn ask_suggested(&self, index: usize) -> Result<Option<PendingReply>, ChatError> {
        let question = suggestions::question(index).ok_or(ChatError::SuggestionOutOfRange {
            index,
            len: PREDEFINED_QUESTIONS.len(),
        })?;
        self.set_input(question);
        self.send(Some(question))
    }

    /// Start listening (clearing any old transcript) or stop and keep it.
    ///
    /// Returns the new listening flag.
    pub fn toggle_listening(&self) -> Result<bool, ChatError> {
        if !self.speech_in.is_supported() {
            return Err(ChatError::VoiceUnavailable(
                "speech recognition is not supported".to_string(),
            ));
        }

        if self.speech_in.is_listening() {
            self.speech_in.stop_listening();
            self.sync_transcript();
        } else {
            self.speech_in.clear_text();
            self.speech_in.start_listening()?;
        }

        let listening = self.speech_in.is_listening();
        lock(&self.state).set_listening(listening);
        debug!(listening, "Listening toggled");
        let _ = self.events.send(ChatEvent::ListeningChanged { listening });
        Ok(listening)
    }

    /// Stop any speech in progress, then flip the mute flag.
    ///
    /// Returns the new mute flag.
    pub fn toggle_mute(&self) -> bool {
        if self.speech_out.is_speaking() {
            self.speech_out.stop();
        }
        let muted = {
            let mut state = lock(&self.state);
            let muted = !state.is_muted();
            state.set_muted(muted);
            muted
        };
        debug!(muted, "Mute toggled");
        let _ = self.events.send(ChatEvent::MuteChanged { muted });
        muted
    }

    /// Point both speech adapters at `language`.
    pub fn set_language(&self, language: &Language) {
        self.speech_in.set_language(language.code);
        self.speech_out.set_language(language.code);
        info!(language = language.id, code = language.code, "Voice language changed");
    }

    /// Cancel any in-flight reply and release the speech adapters.
    ///
    /// Later sends fail with [`ChatError::Cancelled`].
    pub fn shutdown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();

        let cancelled = {
            let mut state = lock(&self.state);
            state.is_processing() && state.set_processing(false).is_ok()
        };
        if cancelled {
            info!("In-flight reply cancelled at shutdown");
            let _ = self.events.send(ChatEvent::ReplyCancelled);
            let _ = self
                .events
                .send(ChatEvent::ProcessingChanged { processing: false });
        }

        self.speech_in.stop_listening();
        self.speech_out.stop();
        lock(&self.state).set_listening(false);
        info!(session_id = %self.session_id(), "Conversation shut down");
    }
}

impl Drop for ConversationController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Lock the state, recovering it if a previous holder panicked.
fn lock(state: &Mutex<ConversationState>) -> MutexGuard<'_, ConversationState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use yojana_core::types::Sender;

    use crate::rules::{EMPLOYMENT_REPLY, FARMER_REPLY, PENSION_REPLY};
    use crate::voice::{BufferedSpeechInput, NoSpeechInput, NoSpeechOutput};

    /// Speech output that records what it was asked to say.
    #[derive(Default)]
    struct RecordingOutput {
        spoken: Mutex<Vec<String>>,
        speaking: AtomicBool,
        stops: Mutex<usize>,
    }

    impl SpeechOutput for RecordingOutput {
        fn is_supported(&self) -> bool {
            true
        }

        fn is_speaking(&self) -> bool {
            self.speaking.load(Ordering::SeqCst)
        }

        fn speak(&self, text: &str) -> Result<(), ChatError> {
            self.spoken.lock().unwrap().push(text.to_string());
            self.speaking.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self) {
            *self.stops.lock().unwrap() += 1;
            self.speaking.store(false, Ordering::SeqCst);
        }
    }

    fn config(delay_ms: u64) -> ChatConfig {
        ChatConfig {
            reply_delay_ms: delay_ms,
            ..ChatConfig::default()
        }
    }

    fn text_only(delay_ms: u64) -> ConversationController {
        ConversationController::new(
            &config(delay_ms),
            Arc::new(NoSpeechInput),
            Arc::new(NoSpeechOutput),
        )
    }

    fn with_voice(
        delay_ms: u64,
    ) -> (
        ConversationController,
        Arc<BufferedSpeechInput>,
        Arc<RecordingOutput>,
    ) {
        let input = Arc::new(BufferedSpeechInput::new());
        let output = Arc::new(RecordingOutput::default());
        let controller = ConversationController::new(
            &config(delay_ms),
            input.clone(),
            output.clone(),
        );
        (controller, input, output)
    }

    #[tokio::test]
    async fn test_pension_scenario() {
        let controller = text_only(20);
        assert_eq!(controller.len(), 1);

        let pending = controller
            .send(Some("What pension schemes are available for senior citizens?"))
            .unwrap()
            .expect("send should be accepted");

        assert_eq!(controller.len(), 2);
        assert_eq!(controller.messages().last().unwrap().sender, Sender::User);
        assert!(controller.is_processing());

        let reply = pending.wait().await.unwrap().unwrap();
        assert_eq!(controller.len(), 3);
        let last = controller.messages().last().unwrap().clone();
        assert_eq!(last, reply);
        assert_eq!(last.sender, Sender::Bot);
        assert!(last.text.contains("National Pension Scheme"));
        assert!(!controller.is_processing());
    }

    #[tokio::test]
    async fn test_empty_send_is_noop() {
        let controller = text_only(0);
        assert!(controller.send(Some("")).unwrap().is_none());
        assert!(controller.send(None).unwrap().is_none());
        assert!(controller.send(Some("   ")).unwrap().is_none());
        assert_eq!(controller.len(), 1);
        assert!(!controller.is_processing());
    }

    #[tokio::test]
    async fn test_send_uses_input_buffer_when_text_blank() {
        let controller = text_only(0);
        controller.set_input("job please");
        let pending = controller.send(Some("  ")).unwrap().unwrap();
        assert!(controller.input().is_empty());
        let reply = pending.wait().await.unwrap().unwrap();
        assert_eq!(reply.text, EMPLOYMENT_REPLY);

        let messages = controller.messages();
        assert_eq!(messages[1].text, "job please");
    }

    #[tokio::test]
    async fn test_explicit_text_wins_over_input_buffer() {
        let controller = text_only(0);
        controller.set_input("job");
        let pending = controller.send(Some("pension")).unwrap().unwrap();
        assert_eq!(pending.wait().await.unwrap().unwrap().text, PENSION_REPLY);
        assert!(controller.input().is_empty());
    }

    #[tokio::test]
    async fn test_send_while_processing_is_noop() {
        let controller = text_only(50);
        let pending = controller.send(Some("pension")).unwrap().unwrap();
        assert_eq!(controller.len(), 2);

        assert!(controller.send(Some("job")).unwrap().is_none());
        assert_eq!(controller.len(), 2);

        pending.wait().await.unwrap();
        assert_eq!(controller.len(), 3);
    }

    #[tokio::test]
    async fn test_successful_send_adds_exactly_two() {
        let controller = text_only(0);
        for q in ["pension", "farmer", "nothing relevant"] {
            let before = controller.len();
            controller.send(Some(q)).unwrap().unwrap().wait().await.unwrap();
            assert_eq!(controller.len(), before + 2);
        }
    }

    #[tokio::test]
    async fn test_muted_reply_is_not_spoken() {
        let (controller, _input, output) = with_voice(0);
        assert!(controller.toggle_mute());
        let reply = controller.send(Some("farmer")).unwrap().unwrap().wait().await.unwrap();
        assert_eq!(reply.unwrap().text, FARMER_REPLY);
        assert!(output.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unmuted_reply_is_spoken_once() {
        let (controller, _input, output) = with_voice(0);
        controller
            .send(Some("job opportunities"))
            .unwrap()
            .unwrap()
            .wait()
            .await
            .unwrap();
        let spoken = output.spoken.lock().unwrap();
        assert_eq!(spoken.as_slice(), &[EMPLOYMENT_REPLY.to_string()]);
    }

    #[tokio::test]
    async fn test_mute_read_when_reply_lands() {
        let (controller, _input, output) = with_voice(30);
        let pending = controller.send(Some("job")).unwrap().unwrap();
        controller.toggle_mute();
        pending.wait().await.unwrap();
        assert!(output.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_output_degrades_to_text() {
        let controller = text_only(0);
        let reply = controller.send(Some("job")).unwrap().unwrap().wait().await.unwrap();
        assert_eq!(reply.unwrap().text, EMPLOYMENT_REPLY);
    }

    #[test]
    fn test_toggle_mute_stops_speech_first() {
        let (controller, _input, output) = with_voice(0);
        output.speak("something").unwrap();
        assert!(controller.toggle_mute());
        assert_eq!(*output.stops.lock().unwrap(), 1);
        assert!(!output.is_speaking());

        assert!(!controller.toggle_mute());
        assert_eq!(*output.stops.lock().unwrap(), 1);
    }

    #[test]
    fn test_toggle_listening_cycle() {
        let (controller, input, _output) = with_voice(0);
        input.start_listening().unwrap();
        input.push_transcript("stale words");
        input.stop_listening();

        assert!(controller.toggle_listening().unwrap());
        assert!(controller.is_listening());
        assert!(input.transcript().is_empty());

        input.push_transcript("housing schemes");
        assert!(!controller.toggle_listening().unwrap());
        assert!(!controller.is_listening());
        assert_eq!(input.transcript(), "housing schemes");
        assert_eq!(controller.input(), "housing schemes");
    }

    #[test]
    fn test_toggle_listening_unsupported() {
        let controller = text_only(0);
        let err = controller.toggle_listening().unwrap_err();
        assert!(matches!(err, ChatError::VoiceUnavailable(_)));
        assert!(!controller.is_listening());
    }

    #[tokio::test]
    async fn test_send_clears_transcript() {
        let (controller, input, _output) = with_voice(0);
        controller.toggle_listening().unwrap();
        input.push_transcript("pension");
        controller.sync_transcript();
        assert_eq!(controller.input(), "pension");

        let pending = controller.send(None).unwrap().unwrap();
        assert!(input.transcript().is_empty());
        assert!(controller.input().is_empty());
        pending.wait().await.unwrap();
    }

    #[test]
    fn test_sync_transcript_ignores_empty() {
        let (controller, _input, _output) = with_voice(0);
        controller.set_input("typed");
        assert!(controller.sync_transcript().is_none());
        assert_eq!(controller.input(), "typed");
    }

    #[tokio::test]
    async fn test_ask_suggested() {
        let controller = text_only(0);
        let reply = controller.ask_suggested(0).unwrap().unwrap().wait().await.unwrap();
        assert_eq!(reply.unwrap().text, PENSION_REPLY);
        assert_eq!(
            controller.messages()[1].text,
            "What pension schemes are available for senior citizens?"
        );
        assert!(controller.input().is_empty());
    }

    #[tokio::test]
    async fn test_ask_suggested_out_of_range() {
        let controller = text_only(0);
        let err = controller.ask_suggested(6).unwrap_err();
        assert!(matches!(err, ChatError::SuggestionOutOfRange { index: 6, len: 6 }));
        assert_eq!(controller.len(), 1);
    }

    #[tokio::test]
    async fn test_can_send() {
        let controller = text_only(50);
        assert!(!controller.can_send());
        controller.set_input("job");
        assert!(controller.can_send());
        let pending = controller.send(None).unwrap().unwrap();
        controller.set_input("pension");
        assert!(!controller.can_send());
        pending.wait().await.unwrap();
        assert!(controller.can_send());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_in_flight_reply() {
        let (controller, _input, output) = with_voice(10_000);
        let pending = controller.send(Some("pension")).unwrap().unwrap();
        controller.shutdown();

        let reply = tokio::time::timeout(Duration::from_secs(2), pending.wait())
            .await
            .expect("cancelled reply should resolve promptly")
            .unwrap();
        assert!(reply.is_none());
        assert_eq!(controller.len(), 2);
        assert!(!controller.is_processing());
        assert!(output.spoken.lock().unwrap().is_empty());
        assert!(controller.is_shut_down());
    }

    #[tokio::test]
    async fn test_send_after_shutdown_fails() {
        let controller = text_only(0);
        controller.shutdown();
        controller.shutdown();
        assert!(matches!(
            controller.send(Some("pension")),
            Err(ChatError::Cancelled)
        ));
        assert_eq!(controller.len(), 1);
    }

    #[tokio::test]
    async fn test_drop_mid_delay_does_not_panic() {
        let controller = text_only(10_000);
        let pending = controller.send(Some("pension")).unwrap().unwrap();
        drop(controller);
        let reply = tokio::time::timeout(Duration::from_secs(2), pending.wait())
            .await
            .unwrap()
            .unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_events_for_a_turn() {
        let controller = text_only(0);
        let mut rx = controller.subscribe();
        controller.send(Some("job")).unwrap().unwrap().wait().await.unwrap();

        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name());
        }
        assert_eq!(
            names,
            vec![
                "message_appended",
                "input_changed",
                "processing_changed",
                "message_appended",
                "processing_changed",
            ]
        );
    }

    #[tokio::test]
    async fn test_events_for_toggles() {
        let (controller, _input, _output) = with_voice(0);
        let mut rx = controller.subscribe();
        controller.toggle_mute();
        controller.toggle_listening().unwrap();

        assert_eq!(rx.try_recv().unwrap(), ChatEvent::MuteChanged { muted: true });
        assert_eq!(
            rx.try_recv().unwrap(),
            ChatEvent::ListeningChanged { listening: true }
        );
    }

    #[test]
    fn test_initial_mute_flag() {
        let controller = text_only(0).muted(true);
        assert!(controller.is_muted());
    }

    #[test]
    fn test_set_language_reaches_adapters() {
        let (controller, input, _output) = with_voice(0);
        let hindi = yojana_core::language::find("hindi").unwrap();
        controller.set_language(hindi);
        assert_eq!(input.language(), "hi-IN");
    }

    #[test]
    fn test_capabilities() {
        assert!(text_only(0).capabilities().needs_advisory());
        let (controller, _input, _output) = with_voice(0);
        assert!(!controller.capabilities().needs_advisory());
    }
}
