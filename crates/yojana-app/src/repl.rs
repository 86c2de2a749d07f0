//! Interactive terminal loop.
//!
//! Takes input lines from a channel, turns them into controller intents, and
//! renders controller events as they arrive. Typed lines double as the speech
//! transcript while the microphone is on.

use std::io::{BufRead, Write};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use yojana_chat::{BufferedSpeechInput, ChatError, ChatEvent, ConversationController, PendingReply};
use yojana_core::DictionaryTranslator;

use crate::render;

#[derive(Debug, Error)]
pub enum ReplError {
    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Event encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lines buffered between the stdin thread and the loop.
const INPUT_CHANNEL_CAPACITY: usize = 16;

/// Read stdin on a dedicated thread and forward each line.
///
/// The channel closes at end of input. A blocking read on this thread never
/// holds up runtime shutdown.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
        debug!("Stdin reader finished");
    });
    rx
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free text, kept as typed. Blank sends the input buffer.
    Send(String),
    Mic,
    Mute,
    /// Zero-based suggested question index.
    Ask(usize),
    Questions,
    Lang(Option<String>),
    History,
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Send(line.to_string());
        };
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match name.as_str() {
            "mic" => Command::Mic,
            "mute" => Command::Mute,
            "ask" => match arg.and_then(|a| a.parse::<usize>().ok()) {
                Some(n) if n >= 1 => Command::Ask(n - 1),
                _ => Command::Invalid("usage: /ask <number>".to_string()),
            },
            "questions" => Command::Questions,
            "lang" => Command::Lang(arg.map(str::to_string)),
            "history" => Command::History,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => Command::Invalid(format!("unknown command '/{}', try /help", other)),
        }
    }
}

/// Whether the loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

enum Input {
    Line(Option<String>),
    Event(Result<ChatEvent, RecvError>),
}

pub struct Repl<W: Write> {
    controller: ConversationController,
    translator: DictionaryTranslator,
    speech_in: Option<Arc<BufferedSpeechInput>>,
    events: broadcast::Receiver<ChatEvent>,
    pending: Option<PendingReply>,
    json_events: bool,
    // Display state, following the event stream.
    listening: bool,
    input: String,
    out: W,
}

impl<W: Write> Repl<W> {
    /// `speech_in` is the buffer typed lines are pushed into while listening.
    pub fn new(
        controller: ConversationController,
        translator: DictionaryTranslator,
        speech_in: Option<Arc<BufferedSpeechInput>>,
        out: W,
    ) -> Self {
        let events = controller.subscribe();
        Self {
            controller,
            translator,
            speech_in,
            events,
            pending: None,
            json_events: false,
            listening: false,
            input: String::new(),
            out,
        }
    }

    pub fn json_events(mut self, enabled: bool) -> Self {
        self.json_events = enabled;
        self
    }

    #[cfg(test)]
    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Print the title, advisory, existing messages, and suggestions.
    pub fn banner(&mut self) -> Result<(), ReplError> {
        self.say(render::header(&self.translator))?;
        self.say(render::intro(&self.translator))?;
        if let Some(line) = render::advisory(&self.translator, self.controller.capabilities()) {
            self.say(line)?;
        }
        self.say("")?;
        for message in self.controller.messages() {
            self.say(render::message(&message))?;
        }
        self.say("")?;
        self.say(render::questions(&self.translator))?;
        self.say(render::prompt_hint(&self.translator))?;
        Ok(())
    }

    /// Act on one input line.
    pub fn handle_line(&mut self, line: &str) -> Result<Flow, ReplError> {
        let command = Command::parse(line);
        debug!(?command, "Input line");

        match command {
            Command::Send(text) if self.controller.is_listening() => {
                if let Some(ref speech) = self.speech_in {
                    if speech.push_transcript(&text) {
                        self.controller.sync_transcript();
                    }
                }
            }
            Command::Send(text) => {
                let sent = self.controller.send(Some(&text));
                self.track(sent)?;
            }
            Command::Mic => {
                if let Err(e) = self.controller.toggle_listening() {
                    self.report(e)?;
                }
            }
            Command::Mute => {
                self.controller.toggle_mute();
            }
            Command::Ask(index) => {
                let sent = self.controller.ask_suggested(index);
                self.track(sent)?;
            }
            Command::Questions => self.say(render::questions(&self.translator))?,
            Command::Lang(None) => self.say(render::languages(&self.translator))?,
            Command::Lang(Some(id)) => match self.translator.set_language(&id) {
                Ok(lang) => {
                    self.controller.set_language(lang);
                    self.say(render::header(&self.translator))?;
                }
                Err(e) => self.say(format!("error: {}", e))?,
            },
            Command::History => {
                for message in self.controller.messages() {
                    self.say(render::message(&message))?;
                }
            }
            Command::Help => self.say(render::help())?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Invalid(msg) => self.say(msg)?,
        }
        Ok(Flow::Continue)
    }

    /// Render one controller event.
    pub fn handle_event(&mut self, event: &ChatEvent) -> Result<(), ReplError> {
        if self.json_events {
            let line = serde_json::to_string(event)?;
            return self.say(line);
        }

        match event {
            ChatEvent::MessageAppended { message } => self.say(render::message(message)),
            ChatEvent::ProcessingChanged { processing: true } => self.say(render::processing()),
            ChatEvent::ProcessingChanged { processing: false } => Ok(()),
            ChatEvent::InputChanged { text } => {
                self.input = text.clone();
                if self.listening && !text.is_empty() {
                    self.say(render::listening(&self.translator, text))
                } else {
                    Ok(())
                }
            }
            ChatEvent::ListeningChanged { listening } => {
                self.listening = *listening;
                self.say(render::mic_status(&self.translator, *listening))?;
                if !self.listening && !self.input.is_empty() {
                    let line = render::pending_input(&self.translator, &self.input);
                    self.say(line)?;
                }
                Ok(())
            }
            ChatEvent::MuteChanged { muted } => {
                self.say(render::mute_status(&self.translator, *muted))
            }
            ChatEvent::ReplyCancelled => self.say("(reply cancelled)"),
        }
    }

    /// Render every event already queued.
    pub fn drain_events(&mut self) -> Result<(), ReplError> {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.handle_event(&event)?,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Terminal fell behind conversation events");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Ok(()),
            }
        }
    }

    /// Wait for the in-flight reply, if any, and render what it produced.
    pub async fn finish_pending(&mut self) -> Result<(), ReplError> {
        if let Some(pending) = self.pending.take() {
            if let Err(e) = pending.wait().await {
                warn!(error = %e, "Reply task failed");
            }
        }
        self.drain_events()
    }

    /// Run until `/quit` or until `lines` closes.
    ///
    /// When input closes the in-flight reply is awaited so piped questions
    /// still get their answer.
    pub async fn run(&mut self, mut lines: mpsc::Receiver<String>) -> Result<(), ReplError> {
        loop {
            let input = tokio::select! {
                line = lines.recv() => Input::Line(line),
                event = self.events.recv() => Input::Event(event),
            };

            match input {
                Input::Line(line) => match line {
                    Some(line) => {
                        if self.handle_line(&line)? == Flow::Quit {
                            break;
                        }
                    }
                    None => {
                        debug!("Input closed");
                        self.finish_pending().await?;
                        break;
                    }
                },
                Input::Event(Ok(event)) => self.handle_event(&event)?,
                Input::Event(Err(RecvError::Lagged(skipped))) => {
                    warn!(skipped, "Terminal fell behind conversation events");
                }
                Input::Event(Err(RecvError::Closed)) => break,
            }
        }
        self.drain_events()
    }

    /// Cancel any pending reply and release the speech adapters.
    pub fn shutdown(&mut self) -> Result<(), ReplError> {
        self.controller.shutdown();
        self.pending = None;
        self.drain_events()
    }

    fn track(
        &mut self,
        sent: std::result::Result<Option<PendingReply>, ChatError>,
    ) -> Result<(), ReplError> {
        match sent {
            Ok(Some(pending)) => {
                self.pending = Some(pending);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => self.report(e),
        }
    }

    fn report(&mut self, err: ChatError) -> Result<(), ReplError> {
        match err {
            ChatError::VoiceUnavailable(_) => {
                let line = render::advisory(&self.translator, self.controller.capabilities())
                    .unwrap_or_else(|| format!("error: {}", err));
                self.say(line)
            }
            ChatError::SuggestionOutOfRange { len, .. } => {
                self.say(format!("usage: /ask <1-{}>", len))
            }
            other => self.say(format!("error: {}", other)),
        }
    }

    fn say(&mut self, line: impl AsRef<str>) -> Result<(), ReplError> {
        writeln!(self.out, "{}", line.as_ref())?;
        self.out.flush()?;
        Ok(())
    }
}
