//! Insight formatter: turns numeric summaries into a prompt, relays it to an
//! external text generator, and hands back whatever comes out.
//!
//! The generator sits behind the [`TextGenerator`] trait. The composition
//! root builds one (see [`gemini::GeminiClient`]) and passes it into
//! [`InsightService`]; nothing here reads configuration or environment.

pub mod gemini;

use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::warn;

use crate::models::stats::{StatsSummary, UserSummary};
use crate::{AppError, Result};

/// A prompt-in, text-out generation capability.
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] on network, auth, quota, or payload failure.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// Generator used when no provider is configured; every call fails.
#[derive(Debug, Clone)]
pub struct DisabledGenerator {
    reason: String,
}

impl DisabledGenerator {
    /// Create a generator that always fails with `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl TextGenerator for DisabledGenerator {
    fn generate<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move { Err(AppError::Service(self.reason.clone())) })
    }
}

/// Build the dashboard-summary prompt.
#[must_use]
pub fn summary_prompt(stats: &StatsSummary, user: Option<&UserSummary>) -> String {
    let mut prompt = String::from(
        "You are a project management assistant reviewing a team's task tracker.\n\n",
    );
    push_stats(&mut prompt, stats);
    if let Some(user) = user {
        push_user(&mut prompt, user);
    }
    prompt.push_str(
        "\nWrite a short executive summary (3-5 sentences) of the team's progress, \
         point out risks such as blocked or stalled work, and suggest one or two \
         concrete next steps.",
    );
    prompt
}

/// Build the free-text question prompt.
#[must_use]
pub fn question_prompt(stats: &StatsSummary, user: Option<&UserSummary>, question: &str) -> String {
    let mut prompt = String::from(
        "You are a project management assistant answering questions about a team's \
         task tracker. Use only the figures below.\n\n",
    );
    push_stats(&mut prompt, stats);
    if let Some(user) = user {
        push_user(&mut prompt, user);
    }
    let _ = write!(prompt, "\nQuestion: {}\nAnswer concisely.", question.trim());
    prompt
}

fn push_stats(prompt: &mut String, stats: &StatsSummary) {
    let _ = writeln!(prompt, "Overall task statistics:");
    let _ = writeln!(prompt, "- Total tasks: {}", stats.total);
    let _ = writeln!(prompt, "- Open: {}", stats.open);
    let _ = writeln!(prompt, "- In Progress: {}", stats.in_progress);
    let _ = writeln!(prompt, "- Completed: {}", stats.completed);
    let _ = writeln!(prompt, "- Blocked: {}", stats.blocked);
    let _ = writeln!(prompt, "- Closed today: {}", stats.closed_today);
    let _ = writeln!(prompt, "- Closed in the last hour: {}", stats.closed_last_hour);
    let _ = writeln!(prompt, "- Completion rate: {}%", stats.completion_rate);
}

fn push_user(prompt: &mut String, user: &UserSummary) {
    let _ = writeln!(prompt, "\nStatistics for {}:", user.user);
    let _ = writeln!(prompt, "- Assigned tasks: {}", user.total);
    let _ = writeln!(prompt, "- Open: {}", user.open);
    let _ = writeln!(prompt, "- In Progress: {}", user.in_progress);
    let _ = writeln!(prompt, "- Completed: {}", user.completed);
    let _ = writeln!(prompt, "- Blocked: {}", user.blocked);
    let _ = writeln!(prompt, "- Completion rate: {}%", user.completion_rate);
}

/// Text shown in place of a generated answer when the service fails.
#[must_use]
pub fn fallback_message(err: &AppError) -> String {
    format!("AI insight unavailable: {err}")
}

/// Relay between summaries and a [`TextGenerator`].
#[derive(Clone)]
pub struct InsightService {
    generator: Arc<dyn TextGenerator>,
}

impl InsightService {
    /// Wrap an explicitly constructed generator.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Send `prompt` and return the generated text verbatim, or the fallback
    /// message when the call fails. Never errors.
    pub async fn relay(&self, prompt: &str) -> String {
        match self.generator.generate(prompt).await {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "text generation failed");
                fallback_message(&err)
            }
        }
    }

    /// Summarize the dashboard figures.
    pub async fn summarize(&self, stats: &StatsSummary, user: Option<&UserSummary>) -> String {
        self.relay(&summary_prompt(stats, user)).await
    }

    /// Answer a free-text question about the figures.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EmptyQuery`] when `question` is blank.
    pub async fn answer(
        &self,
        stats: &StatsSummary,
        user: Option<&UserSummary>,
        question: &str,
    ) -> Result<String> {
        if question.trim().is_empty() {
            return Err(AppError::EmptyQuery);
        }
        Ok(self.relay(&question_prompt(stats, user, question)).await)
    }
}
