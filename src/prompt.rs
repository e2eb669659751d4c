//! `{placeholder}` prompt templates and chat prompt assembly.

use std::collections::HashMap;

use crate::error::{PlaygroundError, Result};
use crate::message::{Message, Role};

pub type PromptVars = HashMap<String, String>;

/// Build a [`PromptVars`] map: `prompt_vars! { "topic" => "Docker" }`.
#[macro_export]
macro_rules! prompt_vars {
    () => { $crate::prompt::PromptVars::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut vars = $crate::prompt::PromptVars::new();
        $( vars.insert(::std::string::ToString::to_string(&$key), ::std::string::ToString::to_string(&$value)); )+
        vars
    }};
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
    partials: PromptVars,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let source = template.into();
        let segments = parse(&source)?;
        Ok(Self {
            source,
            segments,
            partials: PromptVars::new(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of first appearance, excluding pre-bound partials.
    pub fn input_variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for segment in &self.segments {
            if let Segment::Variable(name) = segment {
                if !self.partials.contains_key(name) && !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    pub fn partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partials.insert(name.into(), value.into());
        self
    }

    pub fn format(&self, vars: &PromptVars) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = vars
                        .get(name)
                        .or_else(|| self.partials.get(name))
                        .ok_or_else(|| {
                            PlaygroundError::Template(format!("missing variable `{name}`"))
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn parse(source: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(PlaygroundError::Template(format!(
                                "unclosed `{{` in template near `{{{name}`"
                            )))
                        }
                        Some(ch) => name.push(ch),
                    }
                }
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(PlaygroundError::Template("empty placeholder `{}`".into()));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(name));
            }
            '}' => {
                return Err(PlaygroundError::Template(
                    "single `}` in template; use `}}` for a literal brace".into(),
                ))
            }
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// An ordered list of role-tagged templates rendered into chat messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPromptTemplate {
    messages: Vec<(Role, PromptTemplate)>,
}

impl ChatPromptTemplate {
    pub fn from_messages<S: Into<String>>(
        messages: impl IntoIterator<Item = (Role, S)>,
    ) -> Result<Self> {
        let messages = messages
            .into_iter()
            .map(|(role, template)| Ok((role, PromptTemplate::new(template)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { messages })
    }

    /// A single user message.
    pub fn from_template(template: impl Into<String>) -> Result<Self> {
        Self::from_messages([(Role::User, template.into())])
    }

    pub fn input_variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (_, template) in &self.messages {
            for name in template.input_variables() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn partial(mut self, name: &str, value: &str) -> Self {
        self.messages = self
            .messages
            .into_iter()
            .map(|(role, template)| (role, template.partial(name, value)))
            .collect();
        self
    }

    pub fn format_messages(&self, vars: &PromptVars) -> Result<Vec<Message>> {
        self.messages
            .iter()
            .map(|(role, template)| Ok(Message::new(*role, template.format(vars)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_placeholders() {
        let template =
            PromptTemplate::new("Write a concise, friendly 3-sentence summary about {topic}.")
                .unwrap();
        let out = template.format(&prompt_vars! { "topic" => "Rust" }).unwrap();
        assert_eq!(out, "Write a concise, friendly 3-sentence summary about Rust.");
    }

    #[test]
    fn lists_variables_once_in_order() {
        let template = PromptTemplate::new("{b} and {a} then {b}").unwrap();
        assert_eq!(template.input_variables(), vec!["b", "a"]);
    }

    #[test]
    fn escaped_braces_are_literal() {
        let template = PromptTemplate::new(r#"Reply with {{"word": "{word}"}}"#).unwrap();
        assert!(template.input_variables() == vec!["word"]);
        let out = template.format(&prompt_vars! { "word" => "hi" }).unwrap();
        assert_eq!(out, r#"Reply with {"word": "hi"}"#);
    }

    #[test]
    fn missing_variable_is_an_error() {
        let template = PromptTemplate::new("Hello {name}").unwrap();
        let err = template.format(&PromptVars::new()).unwrap_err();
        assert!(matches!(err, PlaygroundError::Template(_)));
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        assert!(PromptTemplate::new("Hello {name").is_err());
        assert!(PromptTemplate::new("Hello name}").is_err());
        assert!(PromptTemplate::new("Hello {}").is_err());
    }

    #[test]
    fn partials_fill_and_hide_variables() {
        let template = PromptTemplate::new("{greeting}, {name}")
            .unwrap()
            .partial("greeting", "Bonjour");
        assert_eq!(template.input_variables(), vec!["name"]);
        let out = template.format(&prompt_vars! { "name" => "Ada" }).unwrap();
        assert_eq!(out, "Bonjour, Ada");
    }

    #[test]
    fn chat_template_renders_roles_in_order() {
        let prompt = ChatPromptTemplate::from_messages([
            (Role::System, "You are a helpful assistant who provides concise answers."),
            (
                Role::User,
                "What is the primary benefit of using {topic} in software development?",
            ),
        ])
        .unwrap();

        let messages = prompt
            .format_messages(&prompt_vars! { "topic" => "Docker containers" })
            .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(
            messages[1].content,
            "What is the primary benefit of using Docker containers in software development?"
        );
        assert_eq!(prompt.input_variables(), vec!["topic"]);
    }
}
