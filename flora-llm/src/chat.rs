//! The Flora chat assistant session.

use flora_core::Flower;
use serde::{Deserialize, Serialize};

use crate::{ChatMessage, ContentProvider};

/// Assistant reply appended when the provider call fails.
pub const CHAT_FAILURE_MESSAGE: &str = "😔 Sorry, I had trouble processing that. Please try again!";

/// Opening assistant message, depending on whether a record is in view.
pub fn greeting(flower: Option<&Flower>) -> String {
    match flower {
        Some(flower) => format!(
            "Hi! I'm Flora 🌸 I see you're looking at {}. What would you like to know about this beautiful flower?",
            flower.name
        ),
        None => "Hi! I'm Flora 🌸 Your friendly flower expert! How can I help you today?".to_string(),
    }
}

/// Suggested questions offered under the conversation.
pub fn quick_questions(flower: Option<&Flower>) -> Vec<String> {
    match flower {
        Some(flower) => vec![
            format!("How do I care for {}?", flower.name),
            format!("When does {} bloom?", flower.name),
            "Tell me fun facts about this flower".to_string(),
            "What flowers are similar to this?".to_string(),
        ],
        None => vec![
            "What flower should I grow indoors?".to_string(),
            "Tell me about roses".to_string(),
            "Best flowers for beginners?".to_string(),
        ],
    }
}

/// A conversation with Flora, optionally about one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    flower: Option<Flower>,
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl ChatSession {
    /// Start a conversation with the greeting for `flower`.
    pub fn new(flower: Option<Flower>) -> Self {
        let messages = vec![ChatMessage::assistant(greeting(flower.as_ref()))];
        Self {
            flower,
            messages,
            pending: false,
        }
    }

    pub fn flower(&self) -> Option<&Flower> {
        self.flower.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a reply is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn quick_questions(&self) -> Vec<String> {
        quick_questions(self.flower.as_ref())
    }

    /// Record a user message and mark a reply as pending.
    ///
    /// Returns the history to send with the message (everything before it),
    /// or `None` when the text is blank or a reply is already pending.
    pub fn begin(&mut self, text: &str) -> Option<(String, Vec<ChatMessage>)> {
        let text = text.trim();
        if text.is_empty() || self.pending {
            return None;
        }
        let history = self.messages.clone();
        self.messages.push(ChatMessage::user(text));
        self.pending = true;
        Some((text.to_string(), history))
    }

    /// Append the assistant's reply (or the failure message) and clear the
    /// pending flag.
    pub fn finish(&mut self, reply: Result<String, flora_core::ProviderError>) {
        let content = match reply {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "chat reply failed");
                CHAT_FAILURE_MESSAGE.to_string()
            }
        };
        self.messages.push(ChatMessage::assistant(content));
        self.pending = false;
    }

    /// Send a message and wait for the reply.
    ///
    /// Returns the assistant message appended, or `None` if nothing was sent.
    pub async fn send(&mut self, provider: &dyn ContentProvider, text: &str) -> Option<&ChatMessage> {
        let (message, history) = self.begin(text)?;
        let reply = provider.chat(&message, self.flower.as_ref(), &history).await;
        self.finish(reply);
        self.messages.last()
    }
}
