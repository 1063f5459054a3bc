use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use interviewer_core::{
    Conversation, ConversationStatus, ConversationSummary, InterviewStore, Role,
};

use crate::interview::print_report;

#[derive(Subcommand, Debug)]
pub enum ConversationsAction {
    /// List all conversations, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a conversation with its interview history
    Show {
        /// Conversation ID (launches interactive picker if omitted)
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a conversation's status (active, completed, archived)
    SetStatus { id: String, status: String },
}

pub fn handle_conversations_command(
    store: &dyn InterviewStore,
    action: ConversationsAction,
) -> Result<()> {
    match action {
        ConversationsAction::List { json } => {
            let summaries = list_summaries(store)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!("{}", "No conversations found.".dimmed());
            } else {
                print_conversations_table(&summaries);
            }
        }
        ConversationsAction::Show { id, json } => {
            let id = resolve_conversation_id(store, id)?;
            let conversation = store.get(&id)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&conversation)?);
            } else {
                print_conversation_detail(&conversation);
            }
        }
        ConversationsAction::SetStatus { id, status } => {
            let status: ConversationStatus = status.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            store.update_status(&id, status)?;
            println!("{} {} -> {}", "Updated".bright_green(), id, status);
        }
    }

    Ok(())
}

fn list_summaries(store: &dyn InterviewStore) -> Result<Vec<ConversationSummary>> {
    Ok(store.list()?.iter().map(Conversation::summary).collect())
}

fn resolve_conversation_id(store: &dyn InterviewStore, id: Option<String>) -> Result<String> {
    if let Some(id) = id {
        return Ok(id);
    }

    // Interactive picker
    let summaries = list_summaries(store)?;
    if summaries.is_empty() {
        anyhow::bail!("No conversations found.");
    }

    let items: Vec<String> = summaries
        .iter()
        .map(|s| {
            format!(
                "{} | {:9} | {} ({} messages)",
                s.created_at.format("%Y-%m-%d %H:%M"),
                s.status,
                s.email,
                s.message_count
            )
        })
        .collect();

    let selection = dialoguer::FuzzySelect::new()
        .with_prompt("Select a conversation")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(summaries[selection].conversation_id.clone())
}

fn colored_status(status: ConversationStatus) -> String {
    match status {
        ConversationStatus::Active => status.as_str().bright_cyan().to_string(),
        ConversationStatus::Completed => status.as_str().bright_green().to_string(),
        ConversationStatus::Archived => status.as_str().dimmed().to_string(),
    }
}

fn print_conversations_table(summaries: &[ConversationSummary]) {
    println!(
        "{:<38} {:<18} {:<10} {:<6} {}",
        "ID".dimmed(),
        "CREATED".dimmed(),
        "STATUS".dimmed(),
        "MSGS".dimmed(),
        "EMAIL".dimmed(),
    );

    for s in summaries {
        println!(
            "{:<38} {:<18} {:<10} {:<6} {}",
            s.conversation_id,
            s.created_at.format("%Y-%m-%d %H:%M").to_string(),
            colored_status(s.status),
            s.message_count,
            s.email
        );
    }
}

fn print_conversation_detail(conversation: &Conversation) {
    println!("{}", "=== Conversation Detail ===".bright_blue().bold());
    println!("{}  {}", "ID:".dimmed(), conversation.id);
    println!("{}  {}", "Email:".dimmed(), conversation.email);
    println!("{}  {}", "Status:".dimmed(), colored_status(conversation.status));
    println!(
        "{}  {}",
        "Created:".dimmed(),
        conversation.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let Some(ref state) = conversation.state else {
        println!();
        println!("{}", "Interview not started.".dimmed());
        return;
    };

    println!(
        "{}  {} ({})",
        "Candidate:".dimmed(),
        state.candidate_info.display_name(),
        state.candidate_info.experience_level
    );
    println!(
        "{}  {}/{}",
        "Progress:".dimmed(),
        state.completed_steps.len(),
        state.total_questions
    );

    println!();
    println!(
        "{}",
        format!("--- Messages ({}) ---", state.messages.len()).dimmed()
    );
    for message in &state.messages {
        let who = match message.role {
            Role::User => "candidate".bright_green(),
            Role::Assistant => "interviewer".bright_blue(),
        };
        let step = message
            .step
            .map(|s| format!(" [{}]", s))
            .unwrap_or_default();
        println!(
            "  {} {}{}",
            message.timestamp.format("%H:%M:%S").to_string().dimmed(),
            who,
            step.dimmed()
        );
        println!("    {}", message.content);
    }

    if !state.evaluations.is_empty() {
        println!();
        println!("{}", "--- Evaluations ---".dimmed());
        for (step, evaluation) in &state.evaluations {
            println!(
                "  {:<10} {}  {}",
                step.as_str(),
                evaluation.short_description(),
                evaluation.feedback
            );
        }
    }

    if let Some(ref outcome) = state.approval_outcome {
        println!();
        println!("{}  {}", "Approval:".dimmed(), outcome);
    }
    if let Some(ref report) = state.final_results {
        println!();
        print_report(report);
    }
}
