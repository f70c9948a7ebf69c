//! Conversation driver — a linear cursor over the scripted question list.
//!
//! Holds the message transcript, the accumulated profile, and the progress
//! cursor. The driver is purely synchronous; the single async suspension
//! point (the generation call) lives with the caller, which reports the
//! outcome back via [`Conversation::finish_with_routine`] or
//! [`Conversation::fail_generation`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::script::{GENERATION_APOLOGY, INITIAL_GREETING, STEPS, Step};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Bot,
    User,
}

/// One transcript entry. Immutable once appended; transcript order is
/// display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub is_markdown: bool,
}

impl Message {
    fn bot(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Bot, false)
    }

    fn bot_markdown(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Bot, true)
    }

    fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User, false)
    }

    fn new(text: impl Into<String>, sender: Sender, is_markdown: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            is_markdown,
        }
    }
}

/// The accumulated answers, keyed by step field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    answers: BTreeMap<String, String>,
}

impl Profile {
    pub fn insert(&mut self, field: &str, answer: &str) {
        self.answers.insert(field.to_string(), answer.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.answers.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Whether every step in `steps` has an answer.
    pub fn covers(&self, steps: &[Step]) -> bool {
        steps.iter().all(|s| self.answers.contains_key(s.field))
    }

    /// Render the profile as the bullet-list section of the generation
    /// prompt, in step order. Unanswered fields render as "No especificado".
    pub fn to_prompt_section(&self, steps: &[Step]) -> String {
        steps
            .iter()
            .map(|step| {
                let answer = self.get(step.field).unwrap_or("No especificado");
                format!("- **{}:** {}", step.label, answer)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The conversation cursor.
///
/// Progresses linearly: AwaitingGreeting → Asking(0) → … →
/// Asking(last) → Generating → Finished. `Generating` is re-entered on a
/// failed generation so the user can re-send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    AwaitingGreeting,
    Asking(usize),
    Generating,
    Finished,
}

impl Progress {
    /// The next cursor position for a script of `total` steps, if any.
    pub fn next(&self, total: usize) -> Option<Progress> {
        match *self {
            Progress::AwaitingGreeting => Some(Progress::Asking(0)),
            Progress::Asking(i) if i + 1 < total => Some(Progress::Asking(i + 1)),
            Progress::Asking(_) => Some(Progress::Generating),
            Progress::Generating => Some(Progress::Finished),
            Progress::Finished => None,
        }
    }

    /// Whether the conversation is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Progress::Finished)
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::AwaitingGreeting
    }
}

/// Outcome of a user submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Input was empty/whitespace, or the conversation is not accepting
    /// input. Nothing was appended and no state changed.
    Ignored,
    /// The answer was recorded and the next scripted question was appended.
    Asked(&'static Step),
    /// Every step is answered; the profile is ready for one generation call.
    ReadyToGenerate,
}

/// A single in-memory chat session. No persistence across runs.
#[derive(Debug)]
pub struct Conversation {
    steps: &'static [Step],
    messages: Vec<Message>,
    profile: Profile,
    progress: Progress,
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_steps(STEPS)
    }

    /// Build a conversation over a custom script (used by tests).
    pub fn with_steps(steps: &'static [Step]) -> Self {
        Self {
            steps,
            messages: Vec::new(),
            profile: Profile::default(),
            progress: Progress::AwaitingGreeting,
        }
    }

    /// Append the fixed greeting and move the cursor to the first step.
    /// Returns `None` if the conversation has already started.
    pub fn greet(&mut self) -> Option<&Message> {
        if self.progress != Progress::AwaitingGreeting {
            return None;
        }
        self.messages.push(Message::bot(INITIAL_GREETING));
        self.progress = Progress::Asking(0);
        self.messages.last()
    }

    /// Process one user input.
    ///
    /// While asking: records the answer under the current step's field and
    /// advances the cursor by exactly one. While generating (after a failed
    /// attempt): appends the user message and asks for another attempt
    /// without touching the profile.
    pub fn submit(&mut self, input: &str) -> Submission {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Submission::Ignored;
        }

        match self.progress {
            Progress::AwaitingGreeting | Progress::Finished => Submission::Ignored,
            Progress::Asking(i) => {
                self.messages.push(Message::user(trimmed));
                self.profile.insert(self.steps[i].field, trimmed);
                match self.progress.next(self.steps.len()) {
                    Some(Progress::Asking(next)) => {
                        self.progress = Progress::Asking(next);
                        let step = &self.steps[next];
                        self.messages.push(Message::bot(step.question));
                        Submission::Asked(step)
                    }
                    _ => {
                        self.progress = Progress::Generating;
                        Submission::ReadyToGenerate
                    }
                }
            }
            Progress::Generating => {
                // A previous attempt failed; the re-send triggers one more.
                self.messages.push(Message::user(trimmed));
                Submission::ReadyToGenerate
            }
        }
    }

    /// Record a successful generation: the routine is appended as a markdown
    /// bot message and the conversation finishes.
    pub fn finish_with_routine(&mut self, routine: impl Into<String>) {
        if self.progress != Progress::Generating {
            tracing::warn!(progress = ?self.progress, "routine delivered outside generation");
            return;
        }
        self.messages.push(Message::bot_markdown(routine));
        self.progress = Progress::Finished;
    }

    /// Record a failed generation: the fixed apology is appended (plain
    /// text) and the cursor stays at `Generating` so the user can re-send.
    pub fn fail_generation(&mut self) {
        if self.progress != Progress::Generating {
            tracing::warn!(progress = ?self.progress, "generation failure outside generation");
            return;
        }
        self.messages.push(Message::bot(GENERATION_APOLOGY));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn steps(&self) -> &'static [Step] {
        self.steps
    }

    /// The step currently awaiting an answer, if any.
    pub fn current_step(&self) -> Option<&'static Step> {
        match self.progress {
            Progress::Asking(i) => self.steps.get(i),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.progress.is_terminal()
    }

    /// `wa.me` deep link pre-filled with the last bot message, if any.
    /// Fire-and-forget: the link is handed to the user, never fetched.
    pub fn whatsapp_share_url(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Bot)
            .map(|m| format!("https://wa.me/?text={}", urlencoding::encode(&m.text)))
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: &[Step] = &[
        Step {
            id: "a",
            field: "basics",
            label: "Datos Básicos",
            question: "¿Nombre?",
            placeholder: "Juan",
            options: &[],
        },
        Step {
            id: "b",
            field: "goals",
            label: "Objetivos",
            question: "¿Objetivos?",
            placeholder: "Fuerza",
            options: &["Fuerza", "Resistencia"],
        },
    ];

    #[test]
    fn progress_walks_linearly() {
        let total = SHORT.len();
        let mut p = Progress::AwaitingGreeting;
        let expected = [
            Progress::Asking(0),
            Progress::Asking(1),
            Progress::Generating,
            Progress::Finished,
        ];
        for want in expected {
            p = p.next(total).unwrap();
            assert_eq!(p, want);
        }
        assert!(p.next(total).is_none());
        assert!(p.is_terminal());
    }

    #[test]
    fn greet_starts_the_script_once() {
        let mut convo = Conversation::with_steps(SHORT);
        assert_eq!(convo.progress(), Progress::AwaitingGreeting);
        assert!(convo.current_step().is_none());

        let greeting = convo.greet().expect("first greet must emit");
        assert_eq!(greeting.sender, Sender::Bot);
        assert!(!greeting.is_markdown);
        assert_eq!(convo.progress(), Progress::Asking(0));

        assert!(convo.greet().is_none());
        assert_eq!(convo.messages().len(), 1);
    }

    #[test]
    fn submit_before_greeting_is_ignored() {
        let mut convo = Conversation::with_steps(SHORT);
        assert_eq!(convo.submit("hola"), Submission::Ignored);
        assert!(convo.messages().is_empty());
        assert!(convo.profile().is_empty());
    }

    #[test]
    fn whitespace_input_changes_nothing() {
        let mut convo = Conversation::with_steps(SHORT);
        convo.greet();
        let before = convo.messages().len();

        for input in ["", "   ", "\n\t "] {
            assert_eq!(convo.submit(input), Submission::Ignored);
        }
        assert_eq!(convo.messages().len(), before);
        assert!(convo.profile().is_empty());
        assert_eq!(convo.progress(), Progress::Asking(0));
    }

    #[test]
    fn answers_land_under_the_step_field() {
        let mut convo = Conversation::with_steps(SHORT);
        convo.greet();

        let outcome = convo.submit("  Juan, 25, Hombre  ");
        assert_eq!(outcome, Submission::Asked(&SHORT[1]));
        assert_eq!(convo.profile().get("basics"), Some("Juan, 25, Hombre"));
        assert_eq!(convo.progress(), Progress::Asking(1));

        // The next question was appended as a bot message.
        let last = convo.messages().last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.text, SHORT[1].question);
    }

    #[test]
    fn cursor_advances_by_one_and_profile_gets_one_entry_per_step() {
        let mut convo = Conversation::with_steps(SHORT);
        convo.greet();

        let answers = ["Juan, 25, Hombre", "Fuerza"];
        for (i, answer) in answers.iter().enumerate() {
            assert_eq!(convo.progress(), Progress::Asking(i));
            convo.submit(answer);
        }

        assert_eq!(convo.progress(), Progress::Generating);
        assert_eq!(convo.profile().len(), SHORT.len());
        assert!(convo.profile().covers(SHORT));
    }

    #[test]
    fn last_answer_yields_ready_to_generate() {
        let mut convo = Conversation::with_steps(SHORT);
        convo.greet();
        convo.submit("Juan");
        assert_eq!(convo.submit("Fuerza"), Submission::ReadyToGenerate);
        assert!(convo.current_step().is_none());
    }

    #[test]
    fn successful_generation_is_markdown_and_terminal() {
        let mut convo = Conversation::with_steps(SHORT);
        convo.greet();
        convo.submit("Juan");
        convo.submit("Fuerza");

        convo.finish_with_routine("*Rutina* 💪");
        let last = convo.messages().last().unwrap();
        assert_eq!(last.text, "*Rutina* 💪");
        assert!(last.is_markdown);
        assert_eq!(last.sender, Sender::Bot);
        assert!(convo.is_finished());

        // Finished conversations accept no further input.
        assert_eq!(convo.submit("otra cosa"), Submission::Ignored);
    }

    #[test]
    fn failed_generation_apologizes_and_allows_resend() {
        let mut convo = Conversation::with_steps(SHORT);
        convo.greet();
        convo.submit("Juan");
        convo.submit("Fuerza");

        convo.fail_generation();
        let last = convo.messages().last().unwrap();
        assert_eq!(last.text, GENERATION_APOLOGY);
        assert!(!last.is_markdown);
        assert!(!convo.is_finished());

        // Re-send requests another attempt without touching the profile.
        let profile_len = convo.profile().len();
        assert_eq!(convo.submit("inténtalo otra vez"), Submission::ReadyToGenerate);
        assert_eq!(convo.profile().len(), profile_len);

        convo.finish_with_routine("Rutina");
        assert!(convo.is_finished());
    }

    #[test]
    fn routine_outside_generation_is_dropped() {
        let mut convo = Conversation::with_steps(SHORT);
        convo.greet();
        convo.finish_with_routine("demasiado pronto");
        assert_eq!(convo.progress(), Progress::Asking(0));
        assert_eq!(convo.messages().len(), 1);
    }

    #[test]
    fn share_url_encodes_last_bot_message() {
        let mut convo = Conversation::with_steps(SHORT);
        assert!(convo.whatsapp_share_url().is_none());

        convo.greet();
        convo.submit("Juan");
        convo.submit("Fuerza");
        convo.finish_with_routine("Día 1: flexiones & sentadillas");

        let url = convo.whatsapp_share_url().unwrap();
        assert!(url.starts_with("https://wa.me/?text="));
        assert!(url.contains("D%C3%ADa"));
        assert!(url.contains("%26"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn prompt_section_renders_in_step_order() {
        let mut profile = Profile::default();
        profile.insert("goals", "Fuerza");

        let section = profile.to_prompt_section(SHORT);
        let lines: Vec<&str> = section.lines().collect();
        assert_eq!(lines[0], "- **Datos Básicos:** No especificado");
        assert_eq!(lines[1], "- **Objetivos:** Fuerza");
    }
}
