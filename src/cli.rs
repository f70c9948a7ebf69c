//! Terminal chat session — stdin/stdout REPL over the conversation driver.
//!
//! Bot messages go to stdout; the prompt, quick-reply strip, and status
//! glyphs go to stderr so transcripts stay pipeable.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::coach::RoutineGenerator;
use crate::conversation::{Conversation, Submission};
use crate::error::Result;
use crate::script::Step;

/// Short pause before bot messages, for conversational pacing.
const TYPING_PAUSE: Duration = Duration::from_millis(600);

/// One interactive chat session.
pub struct ChatSession {
    generator: RoutineGenerator,
}

impl ChatSession {
    pub fn new(generator: RoutineGenerator) -> Self {
        Self { generator }
    }

    /// Run the session to completion (routine delivered, `/quit`, or EOF).
    pub async fn run(&self) -> Result<()> {
        let mut convo = Conversation::new();

        let stdin = tokio::io::stdin();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        tokio::time::sleep(TYPING_PAUSE).await;
        if let Some(greeting) = convo.greet() {
            print_bot(&greeting.text);
        }
        show_prompt(convo.current_step());

        while let Some(line) = lines.next_line().await? {
            let line = line.trim().to_string();
            if line == "/quit" {
                break;
            }

            let input = resolve_quick_reply(convo.current_step(), &line);
            match convo.submit(&input) {
                Submission::Ignored => {
                    show_prompt(convo.current_step());
                }
                Submission::Asked(step) => {
                    tokio::time::sleep(TYPING_PAUSE).await;
                    print_bot(step.question);
                    show_prompt(Some(step));
                }
                Submission::ReadyToGenerate => {
                    // Input stays closed while the call is in flight: the
                    // loop simply isn't reading.
                    eprintln!("⏳ Generando tu rutina personalizada...");
                    match self.generator.generate(convo.profile()).await {
                        Ok(routine) => {
                            convo.finish_with_routine(routine);
                            if let Some(last) = convo.messages().last() {
                                print_bot(&last.text);
                            }
                            if let Some(url) = convo.whatsapp_share_url() {
                                eprintln!("📲 Compartir por WhatsApp: {url}");
                            }
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "routine generation failed");
                            convo.fail_generation();
                            if let Some(last) = convo.messages().last() {
                                print_bot(&last.text);
                            }
                            eprintln!("   Envía cualquier mensaje para intentarlo de nuevo.");
                            show_prompt(None);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Map a numbered quick-reply selection to the option's text. Anything that
/// isn't an in-range number passes through unchanged (free text is always
/// accepted).
fn resolve_quick_reply(step: Option<&'static Step>, input: &str) -> String {
    if let Some(step) = step {
        if !step.options.is_empty() {
            if let Ok(n) = input.trim().parse::<usize>() {
                if (1..=step.options.len()).contains(&n) {
                    return step.options[n - 1].to_string();
                }
            }
        }
    }
    input.to_string()
}

fn print_bot(text: &str) {
    println!("\n{text}\n");
}

fn show_prompt(step: Option<&'static Step>) {
    if let Some(step) = step {
        if !step.options.is_empty() {
            let strip: Vec<String> = step
                .options
                .iter()
                .enumerate()
                .map(|(i, opt)| format!("[{}] {opt}", i + 1))
                .collect();
            eprintln!("   {}", strip.join("  "));
        }
        eprintln!("   ({})", step.placeholder);
    }
    eprint!("> ");
}
