use crate::llm::{ChatMessage, Role};

/// Conversation history bounded by an estimated token budget.
///
/// Everything is kept; [`get`](Self::get) returns the newest messages that
/// fit in `token_limit`.
#[derive(Debug, Clone)]
pub struct ChatMemoryBuffer {
    token_limit: usize,
    messages: Vec<ChatMessage>,
}

impl ChatMemoryBuffer {
    pub fn new(token_limit: usize) -> Self {
        Self {
            token_limit,
            messages: Vec::new(),
        }
    }

    pub fn token_limit(&self) -> usize {
        self.token_limit
    }

    pub fn put(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// The newest suffix of the history within the token limit. The result
    /// never starts with an assistant message.
    pub fn get(&self) -> Vec<ChatMessage> {
        let mut used = 0;
        let mut start = self.messages.len();
        for (i, message) in self.messages.iter().enumerate().rev() {
            used += estimate_tokens(&message.content);
            if used > self.token_limit {
                break;
            }
            start = i;
        }

        while self.messages.get(start).is_some_and(|m| m.role == Role::Assistant) {
            start += 1;
        }
        self.messages[start..].to_vec()
    }

    /// Full history regardless of the limit.
    pub fn all(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }
}

impl Default for ChatMemoryBuffer {
    fn default() -> Self {
        Self::new(4096)
    }
}

/// Rough token count: one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens("abcdefghi"), 3);
    }

    #[test]
    fn test_everything_fits() {
        let mut memory = ChatMemoryBuffer::new(100);
        memory.put(ChatMessage::user("Who won?"));
        memory.put(ChatMessage::assistant("Spain."));

        assert_eq!(memory.get().len(), 2);
    }

    #[test]
    fn test_oldest_dropped_over_limit() {
        let mut memory = ChatMemoryBuffer::new(5);
        memory.put(ChatMessage::user("aaaaaaaa")); // 2 tokens
        memory.put(ChatMessage::assistant("bbbbbbbb")); // 2 tokens
        memory.put(ChatMessage::user("cccccccc")); // 2 tokens
        memory.put(ChatMessage::assistant("dddddddd")); // 2 tokens

        let kept = memory.get();

        // last two fit (4 tokens), a third would make 6
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].content, "cccccccc");
        assert_eq!(memory.all().len(), 4);
    }

    #[test]
    fn test_never_starts_with_assistant() {
        let mut memory = ChatMemoryBuffer::new(6);
        memory.put(ChatMessage::user("aaaaaaaa"));
        memory.put(ChatMessage::assistant("bbbbbbbb"));
        memory.put(ChatMessage::user("cccccccc"));
        memory.put(ChatMessage::assistant("dddddddd"));
        memory.put(ChatMessage::user("eeee"));

        // budget admits the last three messages: assistant, user... trimmed
        let kept = memory.get();
        assert_eq!(kept.first().map(|m| m.role), Some(Role::User));
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_single_message_over_limit() {
        let mut memory = ChatMemoryBuffer::new(1);
        memory.put(ChatMessage::user("much too long for the buffer"));
        assert!(memory.get().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut memory = ChatMemoryBuffer::default();
        memory.put(ChatMessage::user("hi"));
        memory.reset();
        assert!(memory.get().is_empty());
        assert_eq!(memory.token_limit(), 4096);
    }
}
