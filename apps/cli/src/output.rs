//! Terminal output: spinner, plain-text tables, JSON, and UI events.

use std::time::Duration;

use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use sourcechat_core::UiEvent;
use sourcechat_shared::{Chat, ChatMessage, KnowledgeSource, Project, UserProfile};

// ---------------------------------------------------------------------------
// Spinner
// ---------------------------------------------------------------------------

/// Spinner shown on stderr while a request is in flight.
pub(crate) struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    pub(crate) fn start(message: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    pub(crate) fn finish(self) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Print pending UI events to stderr.
pub(crate) fn print_events(events: &[UiEvent]) {
    for event in events {
        match event {
            UiEvent::Message(text) => eprintln!("{text}"),
            UiEvent::SignedIn => eprintln!("Signed in."),
            UiEvent::SignedOut => eprintln!("Signed out."),
            UiEvent::SessionExpired => eprintln!(
                "Your session has expired. Sign in again with `sourcechat auth send-otp`."
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Renders results as text or, with `--json`, as pretty JSON on stdout.
#[derive(Clone, Copy)]
pub(crate) struct Printer {
    pub json: bool,
}

impl Printer {
    fn emit_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub(crate) fn chats(&self, chats: &[Chat]) -> Result<()> {
        if self.json {
            return self.emit_json(chats);
        }
        if chats.is_empty() {
            println!("No chats yet.");
            return Ok(());
        }
        for chat in chats {
            println!(
                "{:<24} {:<32} {}",
                chat.id,
                truncate(&chat.title, 32),
                chat.updated_at.format("%Y-%m-%d %H:%M")
            );
        }
        Ok(())
    }

    pub(crate) fn chat(&self, chat: &Chat) -> Result<()> {
        if self.json {
            return self.emit_json(chat);
        }
        println!("  ID:      {}", chat.id);
        println!("  Title:   {}", chat.title);
        if let Some(project) = &chat.project_id {
            println!("  Project: {project}");
        }
        println!("  Updated: {}", chat.updated_at.to_rfc3339());
        Ok(())
    }

    pub(crate) fn messages(&self, messages: &[ChatMessage]) -> Result<()> {
        if self.json {
            return self.emit_json(messages);
        }
        for message in messages {
            self.message_text(message);
        }
        Ok(())
    }

    pub(crate) fn message(&self, message: &ChatMessage) -> Result<()> {
        if self.json {
            return self.emit_json(message);
        }
        self.message_text(message);
        Ok(())
    }

    fn message_text(&self, message: &ChatMessage) {
        println!("[{}] {}", message.role, message.content);
        if !message.source_ids.is_empty() {
            println!("    sources: {}", message.source_ids.join(", "));
        }
    }

    pub(crate) fn projects(&self, projects: &[Project]) -> Result<()> {
        if self.json {
            return self.emit_json(projects);
        }
        if projects.is_empty() {
            println!("No projects yet.");
            return Ok(());
        }
        for project in projects {
            println!(
                "{:<24} {:<32} {:>3} chats {:>3} sources",
                project.id,
                truncate(&project.name, 32),
                project.chat_count,
                project.source_count
            );
        }
        Ok(())
    }

    pub(crate) fn project(&self, project: &Project) -> Result<()> {
        if self.json {
            return self.emit_json(project);
        }
        println!("  ID:          {}", project.id);
        println!("  Name:        {}", project.name);
        if let Some(description) = &project.description {
            println!("  Description: {description}");
        }
        println!("  Chats:       {}", project.chat_count);
        println!("  Sources:     {}", project.source_count);
        println!("  Updated:     {}", project.updated_at.to_rfc3339());
        Ok(())
    }

    pub(crate) fn sources(&self, sources: &[KnowledgeSource]) -> Result<()> {
        if self.json {
            return self.emit_json(sources);
        }
        if sources.is_empty() {
            println!("No knowledge sources yet.");
            return Ok(());
        }
        for source in sources {
            self.source_line(source);
        }
        Ok(())
    }

    pub(crate) fn source(&self, source: &KnowledgeSource) -> Result<()> {
        if self.json {
            return self.emit_json(source);
        }
        self.source_line(source);
        Ok(())
    }

    fn source_line(&self, source: &KnowledgeSource) {
        println!(
            "{:<24} {:<40} {:<10}",
            source.id,
            truncate(&source.name, 40),
            source.status
        );
    }

    pub(crate) fn profile(&self, profile: &UserProfile) -> Result<()> {
        if self.json {
            return self.emit_json(profile);
        }
        println!("  ID:     {}", profile.id);
        println!("  Email:  {}", profile.email);
        println!(
            "  Name:   {}",
            profile.display_name.as_deref().unwrap_or("(not set)")
        );
        if let Some(avatar) = &profile.avatar_url {
            println!("  Avatar: {avatar}");
        }
        Ok(())
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `…`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo wörld", 6), "héllo…");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
