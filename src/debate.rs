//! Two-party debate simulations.
//!
//! [`Debate`] keeps a running transcript per debater and feeds each reply to
//! the opponent. [`EthicsDebate`] uses stateless [`FramedDebater`]s that only
//! ever see the topic and the latest argument.

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::llm::{ChatOptions, LanguageModel};
use crate::memory::ConversationMemory;
use crate::message::{Message, Role};
use crate::prompt::{ChatPromptTemplate, PromptVars};

pub const MODERATOR: &str = "Moderator";

pub const SOCIAL_MEDIA_TOPIC: &str = "Is social media more harmful or beneficial for society?";

pub const OPTIMIST_PERSONA: &str = "You are a tech optimist. You believe social media is a powerful tool for connection, education, and positive change. You focus on its benefits.";

pub const PESSIMIST_PERSONA: &str = "You are a social critic. You believe social media is detrimental, causing anxiety, misinformation, and echo chambers. You focus on its harms.";

pub const SELF_DRIVING_DILEMMA: &str = "The AI Dilemma: A self-driving car's brakes have failed.
It is on a path to crash into a barrier, which will kill the ONE (1) passenger inside.
The car has the option to swerve into a crowd of FIVE (5) pedestrians, killing all of them but saving the passenger.
What is the most ethical action for the car to take?";

pub const KANTIAN_PERSONA: &str = "You are a philosopher adhering strictly to Kantian deontology.
Your reasoning is based on the Categorical Imperative: \"Act only according to that maxim whereby you can, at the same time, will that it should become a universal law.\"
This means:
1.  **You do not care about consequences.** You care about the rightness or wrongness of the action itself.
2.  **You must not \"use\" people as a \"mere means\" to an end.** Killing the 5 pedestrians to save the 1 passenger is using them as a tool, which is morally forbidden.
3.  An action is either a \"perfect duty\" (like \"do not kill an innocent person\") or it is not.

You will debate another philosopher about the correct action.
Your first argument should state your position on the dilemma.";

pub const UTILITARIAN_PERSONA: &str = "You are a philosopher adhering strictly to Act Utilitarianism.
Your reasoning is based on the Principle of Utility: \"The most ethical action is the one that maximizes overall happiness and minimizes overall suffering.\"
This means:
1.  **You ONLY care about consequences.** The intention behind the action does not matter, only the outcome.
2.  **You are impartial.** The passenger's life is not more or less valuable than a pedestrian's life.
3.  **You must perform a 'moral calculus'.** You will weigh the outcomes:
    - Option 1 (Do not swerve): 1 death.
    - Option 2 (Swerve): 5 deaths.
    - 1 death is less suffering than 5 deaths.

You will debate another philosopher about the correct action.
Your first argument should state your position on the dilemma.";

const OPENING_QUESTION: &str = "What is your initial position on this dilemma?";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebateTurn {
    pub speaker: String,
    pub round: usize,
    pub statement: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    pub topic: String,
    pub turns: Vec<DebateTurn>,
}

impl Transcript {
    fn record(&mut self, speaker: &str, round: usize, statement: &str, on_turn: &mut impl FnMut(&DebateTurn)) {
        let turn = DebateTurn {
            speaker: speaker.to_string(),
            round,
            statement: statement.to_string(),
        };
        on_turn(&turn);
        self.turns.push(turn);
    }

    pub fn by(&self, speaker: &str) -> impl Iterator<Item = &DebateTurn> + '_ {
        let speaker = speaker.to_string();
        self.turns.iter().filter(move |turn| turn.speaker == speaker)
    }
}

/// A debater that remembers everything said to it and by it.
#[derive(Debug, Clone)]
pub struct DebateAgent {
    name: String,
    persona: String,
    history: ConversationMemory,
}

impl DebateAgent {
    pub fn new(name: impl Into<String>, persona: impl Into<String>) -> Self {
        let name = name.into();
        let persona = persona.into();
        let mut history = ConversationMemory::default();
        history.push(Message::system(format!(
            "{persona}\n\nYour name is {name}. You are in a debate. \
Respond to the last statement from the other debater. Be concise."
        )));
        Self {
            name,
            persona,
            history,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn history(&self) -> &ConversationMemory {
        &self.history
    }

    /// Reply to `statement` with the full history as context.
    pub async fn invoke<M: LanguageModel + ?Sized>(
        &mut self,
        model: &M,
        options: &ChatOptions,
        statement: &str,
    ) -> Result<String> {
        info!(debater = %self.name, "thinking");
        let mut request = self.history.messages().to_vec();
        request.push(Message::user(statement));
        let reply = model.complete_chat(&request, options).await?;
        let reply = reply.trim().to_string();
        // History only grows by whole exchanges.
        self.history.push(Message::user(statement));
        self.history.push(Message::assistant(&reply));
        Ok(reply)
    }
}

pub struct Debate {
    first: DebateAgent,
    second: DebateAgent,
    max_turns: usize,
    options: ChatOptions,
}

impl Debate {
    pub fn new(first: DebateAgent, second: DebateAgent) -> Self {
        Self {
            first,
            second,
            max_turns: 4,
            options: ChatOptions::default().with_temperature(0.7),
        }
    }

    /// Optimist vs Pessimist on [`SOCIAL_MEDIA_TOPIC`].
    pub fn social_media() -> Self {
        Self::new(
            DebateAgent::new("Optimist", OPTIMIST_PERSONA),
            DebateAgent::new("Pessimist", PESSIMIST_PERSONA),
        )
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn first(&self) -> &DebateAgent {
        &self.first
    }

    pub fn second(&self) -> &DebateAgent {
        &self.second
    }

    /// Run the debate. Each reply becomes the other debater's next input;
    /// `on_turn` sees every turn as soon as it is produced.
    pub async fn run<M: LanguageModel + ?Sized>(
        &mut self,
        model: &M,
        topic: &str,
        mut on_turn: impl FnMut(&DebateTurn),
    ) -> Result<Transcript> {
        let mut transcript = Transcript {
            topic: topic.to_string(),
            turns: Vec::new(),
        };
        let mut statement = format!("Let's begin the debate. The topic is: {topic}");
        transcript.record(MODERATOR, 0, &statement, &mut on_turn);

        for turn in 1..=self.max_turns {
            statement = self.first.invoke(model, &self.options, &statement).await?;
            transcript.record(&self.first.name, turn, &statement, &mut on_turn);

            statement = self.second.invoke(model, &self.options, &statement).await?;
            transcript.record(&self.second.name, turn, &statement, &mut on_turn);
        }
        Ok(transcript)
    }
}

/// A stateless debater: every call sees only its persona, the topic and the latest argument.
#[derive(Debug, Clone)]
pub struct FramedDebater {
    name: String,
    prompt: ChatPromptTemplate,
}

impl FramedDebater {
    pub fn new(name: impl Into<String>, persona: &str) -> Result<Self> {
        let prompt = ChatPromptTemplate::from_messages([
            (Role::System, "{persona}"),
            (Role::User, "The debate topic is: {topic}"),
            (Role::Assistant, "I am ready to begin the debate."),
            (Role::User, "{argument}"),
        ])?
        .partial("persona", persona);
        Ok(Self {
            name: name.into(),
            prompt,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn respond<M: LanguageModel + ?Sized>(
        &self,
        model: &M,
        options: &ChatOptions,
        topic: &str,
        argument: &str,
    ) -> Result<String> {
        let mut vars = PromptVars::new();
        vars.insert("topic".into(), topic.to_string());
        vars.insert("argument".into(), argument.to_string());
        let messages = self.prompt.format_messages(&vars)?;
        info!(debater = %self.name, "arguing");
        let reply = model.complete_chat(&messages, options).await?;
        Ok(reply.trim().to_string())
    }
}

pub struct EthicsDebate {
    opener: FramedDebater,
    responder: FramedDebater,
    rounds: usize,
    options: ChatOptions,
}

impl EthicsDebate {
    pub fn new(opener: FramedDebater, responder: FramedDebater) -> Self {
        Self {
            opener,
            responder,
            rounds: 2,
            options: ChatOptions::default().with_temperature(0.7),
        }
    }

    /// Kantian opens, Utilitarian responds.
    pub fn kantian_vs_utilitarian() -> Result<Self> {
        Ok(Self::new(
            FramedDebater::new("Kantian", KANTIAN_PERSONA)?,
            FramedDebater::new("Utilitarian", UTILITARIAN_PERSONA)?,
        ))
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn run<M: LanguageModel + ?Sized>(
        &self,
        model: &M,
        topic: &str,
        mut on_turn: impl FnMut(&DebateTurn),
    ) -> Result<Transcript> {
        let mut transcript = Transcript {
            topic: topic.to_string(),
            turns: Vec::new(),
        };

        let mut current = self
            .opener
            .respond(model, &self.options, topic, OPENING_QUESTION)
            .await?;
        transcript.record(&self.opener.name, 1, &current, &mut on_turn);

        for i in 0..self.rounds {
            let rebuttal = self
                .responder
                .respond(model, &self.options, topic, &current)
                .await?;
            transcript.record(&self.responder.name, i + 1, &rebuttal, &mut on_turn);

            current = self
                .opener
                .respond(model, &self.options, topic, &rebuttal)
                .await?;
            transcript.record(&self.opener.name, i + 2, &current, &mut on_turn);
        }
        Ok(transcript)
    }
}
