//! Interactive terminal interview.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{Confirm, Input};

use interviewer_core::{
    InterviewError, InterviewService, InterviewState, Report, Step, StepResult,
};
use interviewer_logging::TranscriptWriter;

pub struct InterviewOptions {
    pub email: Option<String>,
    pub resume: Option<String>,
    pub transcript: bool,
}

pub async fn run_interview(service: Arc<InterviewService>, options: InterviewOptions) -> Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let handle = interrupted.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted. Finish the current line to stop; answers so far are saved.");
        handle.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let (conversation_id, mut step, mut question, transcript) = match options.resume {
        Some(id) => {
            let state = service
                .store()
                .load(&id)
                .with_context(|| format!("Cannot resume conversation {}", id))?;
            if state.is_complete {
                print_final(&state);
                return Ok(());
            }
            let question = state
                .pending_question()
                .map(String::from)
                .context("Saved interview has no pending question")?;
            eprintln!("{} {}", "Resuming".bright_cyan(), id);
            let transcript = options.transcript.then(|| open_transcript(&id)).flatten();
            (id, state.current_step, question, transcript)
        }
        None => {
            let email = match options.email {
                Some(email) => email,
                None => read_line("Your email").await?,
            };
            let conversation = service.create_conversation(&email)?;

            eprintln!();
            eprintln!("{}", "=== Excel Skills Interview ===".bright_blue().bold());
            eprintln!(
                "{}",
                "Six questions: background, theory, practical and three advanced topics.".dimmed()
            );
            eprintln!();

            let opening =
                read_line("Introduce yourself and your Excel experience level").await?;
            let started = service
                .start_interview(&conversation.id, &opening)
                .await
                .context("Could not start the interview")?;

            let transcript = options
                .transcript
                .then(|| open_transcript(&conversation.id))
                .flatten();
            if let Some(ref t) = transcript {
                let info = &started.state.candidate_info;
                t.write_start(
                    &conversation.id,
                    &opening,
                    info.experience_level.as_str(),
                    info.name.as_deref(),
                );
            }
            (conversation.id, Step::first(), started.question, transcript)
        }
    };

    loop {
        print_question(step, &question);

        let answer = read_line("Your answer").await?;
        if interrupted.load(Ordering::SeqCst) {
            eprintln!(
                "Stopped. Resume with: {}",
                format!("interviewer interview --resume {}", conversation_id).bold()
            );
            return Ok(());
        }

        let result = match submit_with_retry(&service, &conversation_id, step, &answer).await? {
            Some(result) => result,
            None => {
                eprintln!(
                    "Stopped. Resume with: {}",
                    format!("interviewer interview --resume {}", conversation_id).bold()
                );
                return Ok(());
            }
        };

        if let Some(ref t) = transcript {
            record_exchange(t, result.state());
        }

        match result {
            StepResult::Continue {
                next_step,
                next_question,
                questions_remaining,
                ..
            } => {
                eprintln!(
                    "{}",
                    format!("{} question(s) left after this one", questions_remaining).dimmed()
                );
                step = next_step;
                question = next_question;
            }
            StepResult::Completed {
                state,
                report,
                approval,
            } => {
                if let Some(ref t) = transcript {
                    t.write_end(
                        report.as_ref().map(|r| r.overall_score),
                        report.as_ref().map(|r| r.visual_indicator.label()),
                        approval.as_str(),
                    );
                    eprintln!("{} {}", "Transcript:".dimmed(), t.path().display());
                }
                print_final(&state);
                return Ok(());
            }
        }
    }
}

/// Submit an answer, offering a retry when the next question cannot be generated.
/// Returns None if the user gives up.
async fn submit_with_retry(
    service: &InterviewService,
    conversation_id: &str,
    step: Step,
    answer: &str,
) -> Result<Option<StepResult>> {
    loop {
        match service.submit_answer(conversation_id, step, answer).await {
            Ok(result) => return Ok(Some(result)),
            Err(InterviewError::QuestionGeneration { source, .. }) => {
                eprintln!(
                    "{} {}",
                    "Could not generate the next question:".bright_red(),
                    source
                );
                if !confirm("Retry?").await? {
                    return Ok(None);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn open_transcript(conversation_id: &str) -> Option<TranscriptWriter> {
    match TranscriptWriter::new(conversation_id) {
        Ok(writer) => Some(writer),
        Err(e) => {
            tracing::warn!(error = %e, "Transcript disabled");
            None
        }
    }
}

fn record_exchange(transcript: &TranscriptWriter, state: &InterviewState) {
    if let Some(pair) = state.qa_pairs.last() {
        let evaluation = state.evaluations.get(&pair.step);
        transcript.write_exchange(
            pair.step.as_str(),
            &pair.question,
            &pair.answer,
            evaluation.map_or(0.0, |e| e.score),
            evaluation.map_or("", |e| e.feedback.as_str()),
            pair.timestamp,
        );
    }
}

fn print_question(step: Step, question: &str) {
    eprintln!();
    eprintln!(
        "{} {}",
        format!("[{}/{}]", step.question_number(), interviewer_core::TOTAL_QUESTIONS)
            .bright_blue(),
        step.as_str().dimmed()
    );
    println!("{}", question);
}

fn print_final(state: &InterviewState) {
    eprintln!();
    match &state.final_results {
        Some(report) => print_report(report),
        None => {
            eprintln!("{}", "=== Interview Complete ===".bright_blue().bold());
            eprintln!("Thank you. Your results are being reviewed.");
        }
    }
}

pub fn print_report(report: &Report) {
    println!("{}", format!("=== {} ===", report.title).bright_blue().bold());
    println!("{}  {}", "Score:".dimmed(), report.score_line());
    println!("{}  {}", "Rationale:".dimmed(), report.rationale);
    println!(
        "{}  {}",
        "Date:".dimmed(),
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();
    println!("{}", report.summary);
}

async fn read_line(prompt: &'static str) -> Result<String> {
    let line = tokio::task::spawn_blocking(move || {
        Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
    })
    .await
    .context("Input task failed")??;
    Ok(line.trim().to_string())
}

async fn confirm(prompt: &'static str) -> Result<bool> {
    let answer = tokio::task::spawn_blocking(move || {
        Confirm::new().with_prompt(prompt).default(true).interact()
    })
    .await
    .context("Input task failed")??;
    Ok(answer)
}
