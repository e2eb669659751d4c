use crate::message::{Message, Role};

/// In-memory transcript storage.
#[derive(Default, Clone, Debug)]
pub struct ConversationMemory {
    messages: Vec<Message>,
}

impl ConversationMemory {
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> + '_ {
        self.messages.iter()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Render the transcript as prefixed lines, one per turn.
    pub fn buffer_string(&self, human_prefix: &str, ai_prefix: &str) -> String {
        self.messages
            .iter()
            .map(|message| {
                let prefix = match message.role {
                    Role::System => "System",
                    Role::User => human_prefix,
                    Role::Assistant => ai_prefix,
                };
                format!("{prefix}: {}", message.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_buffer_in_order() {
        let mut memory = ConversationMemory::default();
        memory.push(Message::user("hello"));
        memory.push(Message::assistant("hi there"));

        assert_eq!(memory.buffer_string("Human", "AI"), "Human: hello\nAI: hi there");
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.last().unwrap().content, "hi there");
    }

    #[test]
    fn empty_buffer_is_empty_string() {
        assert_eq!(ConversationMemory::default().buffer_string("Human", "AI"), "");
    }
}
