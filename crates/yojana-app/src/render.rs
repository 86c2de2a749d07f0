//! Plain-text rendering of the conversation for the terminal.
//!
//! Every function returns the text to print; nothing here writes to stdout,
//! so the layout can be checked in tests.

use yojana_chat::{VoiceCapabilities, PREDEFINED_QUESTIONS, VOICE_ADVISORY_KEY};
use yojana_core::language::LANGUAGES;
use yojana_core::types::{Message, Sender};
use yojana_core::Translator;

/// Title line with the current language.
pub fn header(t: &dyn Translator) -> String {
    let lang = t.current_language();
    format!(
        "{} {}  |  {}: {} ({})",
        lang.flag,
        t.translate("Government Scheme Assistant"),
        t.translate("Language"),
        lang.name,
        lang.id
    )
}

/// The "AI Assistance" blurb shown above the chat.
pub fn intro(t: &dyn Translator) -> String {
    format!(
        "{}: {}\n{}",
        t.translate("AI Assistance"),
        t.translate("Get Personalized Guidance"),
        t.translate(
            "Chat with our AI assistant to learn more about government schemes, \
             eligibility criteria, and application processes."
        )
    )
}

/// One message as `[HH:MM] Sender: text`.
pub fn message(msg: &Message) -> String {
    let label = match msg.sender {
        Sender::User => "You",
        Sender::Bot => "Assistant",
    };
    format!("[{}] {}: {}", msg.display_time(), label, msg.text)
}

/// Advisory line, only when some voice feature is missing.
pub fn advisory(t: &dyn Translator, caps: VoiceCapabilities) -> Option<String> {
    caps.needs_advisory()
        .then(|| format!("(!) {}", t.translate(VOICE_ADVISORY_KEY)))
}

/// Typing indicator shown while a reply is pending.
pub fn processing() -> String {
    "  . . .".to_string()
}

/// Live transcript while the microphone is on.
pub fn listening(t: &dyn Translator, transcript: &str) -> String {
    if transcript.is_empty() {
        format!("[mic] {}", t.translate("Listening..."))
    } else {
        format!("[mic] {} {}", t.translate("Listening..."), transcript)
    }
}

/// Microphone state after a toggle, naming what `/mic` does next.
pub fn mic_status(t: &dyn Translator, listening: bool) -> String {
    if listening {
        format!(
            "[mic] on. Type what you say. /mic: {}",
            t.translate("Stop listening")
        )
    } else {
        format!("[mic] off. /mic: {}", t.translate("Start voice input"))
    }
}

/// Input buffer waiting to be sent.
pub fn pending_input(t: &dyn Translator, text: &str) -> String {
    format!("> {}   (Enter: {})", text, t.translate("Send message"))
}

/// Mute state after a toggle, naming what `/mute` does next.
pub fn mute_status(t: &dyn Translator, muted: bool) -> String {
    if muted {
        format!("[muted] /mute: {}", t.translate("Unmute responses"))
    } else {
        format!("[sound on] /mute: {}", t.translate("Mute responses"))
    }
}

/// Input hint shown at startup.
pub fn prompt_hint(t: &dyn Translator) -> String {
    format!("{}  (/help)", t.translate("Type your message or use voice input..."))
}

/// Numbered suggested questions in the current language.
pub fn questions(t: &dyn Translator) -> String {
    let mut out = t.translate("Popular Questions:");
    for (i, q) in PREDEFINED_QUESTIONS.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", i + 1, t.translate(q)));
    }
    out
}

/// Language registry with the current one marked.
pub fn languages(t: &dyn Translator) -> String {
    let current = t.current_language();
    let mut out = t.translate("Language");
    for lang in LANGUAGES.iter() {
        let marker = if lang.id == current.id { "*" } else { " " };
        out.push_str(&format!(
            "\n {} {} {:<10} {}",
            marker, lang.flag, lang.id, lang.name
        ));
    }
    out
}

pub fn help() -> String {
    [
        "Commands:",
        "  <text>        send a message (empty line sends the input buffer)",
        "  /mic          start or stop voice input",
        "  /mute         mute or unmute spoken replies",
        "  /ask <n>      send suggested question n",
        "  /questions    list suggested questions",
        "  /lang [id]    list languages, or switch to one",
        "  /history      reprint the conversation",
        "  /help         show this help",
        "  /quit         leave",
    ]
    .join("\n")
}
