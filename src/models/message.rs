use serde::{Deserialize, Serialize};

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message exchanged with the completion endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Ordered message history for one task: a single system message, then
/// chronological user/assistant turns.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    /// Keep at most this many non-system messages (0 = unbounded)
    cap: usize,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>, cap: usize) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
            cap,
        }
    }

    /// Replace the system message in place
    pub fn set_system(&mut self, system_prompt: impl Into<String>) {
        match self.messages.first_mut() {
            Some(first) if first.role == Role::System => first.content = system_prompt.into(),
            _ => self.messages.insert(0, ChatMessage::system(system_prompt)),
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    /// Drop the last message if it is an unanswered user turn
    pub fn pop_unanswered(&mut self) -> Option<ChatMessage> {
        match self.messages.last() {
            Some(m) if m.role == Role::User => self.messages.pop(),
            _ => None,
        }
    }

    fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.cap > 0 {
            let turns = self.messages.len() - 1;
            if turns > self.cap {
                self.messages.drain(1..1 + (turns - self.cap));
                // History resumes on a user turn
                while self.messages.len() > 1 && self.messages[1].role != Role::User {
                    self.messages.remove(1);
                }
            }
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
