//! Conversation memory
//!
//! Append-only, insertion-ordered message log backing each model call.
//! Owned exclusively by one agent session; a run never rewrites or deletes a
//! prior message.

use crate::core::Message;

/// Append-only conversation memory for one session
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    /// Message log in insertion order
    messages: Vec<Message>,
}

impl ConversationMemory {
    /// Create an empty memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory seeded with a system message
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    /// Append a message to the log
    pub fn put(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get a snapshot of the full log
    ///
    /// Returns a copy; mutating it does not affect the stored log.
    pub fn get(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Discard everything except the leading system message, if present
    ///
    /// For reuse of a session between runs; never called within a run.
    pub fn reset(&mut self) {
        let system = self
            .messages
            .first()
            .filter(|m| m.role == "system")
            .cloned();
        self.messages.clear();
        if let Some(msg) = system {
            self.messages.push(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_order() {
        let mut memory = ConversationMemory::with_system_prompt("sys");
        memory.put(Message::user("question"));
        memory.put(Message::assistant("answer"));

        let roles: Vec<_> = memory.get().iter().map(|m| m.role.clone()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
    }

    #[test]
    fn test_get_is_idempotent() {
        let mut memory = ConversationMemory::new();
        memory.put(Message::user("one"));

        let first = memory.get();
        let second = memory.get();
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].content, second[0].content);
    }

    #[test]
    fn test_snapshot_isolation() {
        let mut memory = ConversationMemory::new();
        memory.put(Message::user("original"));

        let mut snapshot = memory.get();
        snapshot.push(Message::assistant("injected"));
        snapshot[0].content = "mutated".to_string();

        assert_eq!(memory.len(), 1);
        assert_eq!(memory.get()[0].content, "original");
    }

    #[test]
    fn test_reset_keeps_system_prompt() {
        let mut memory = ConversationMemory::with_system_prompt("sys");
        memory.put(Message::user("question"));
        memory.reset();

        assert_eq!(memory.len(), 1);
        assert_eq!(memory.get()[0].role, "system");

        let mut bare = ConversationMemory::new();
        bare.put(Message::user("question"));
        bare.reset();
        assert!(bare.is_empty());
    }
}
