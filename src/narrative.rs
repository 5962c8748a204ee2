//! Optional free-text summary of a statement by an external text generator.
//!
//! The numeric report never depends on this: a missing credential, a timeout
//! or a refusal all end up as [`NarrativeStatus::Failed`] with a warning.

use crate::error::ServiceError;
use crate::ledger::Ledger;
use crate::schema::NarrativeConfig;
use futures::future::BoxFuture;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A text-generation backend. Implemented by the HTTP client behind the
/// `openai` feature and by test doubles.
pub trait NarrativeService: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ServiceError>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum NarrativeStatus {
    Skipped,
    Generated(String),
    Failed(String),
}

impl NarrativeStatus {
    pub fn text(&self) -> Option<&str> {
        match self {
            NarrativeStatus::Generated(text) => Some(text),
            _ => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            NarrativeStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Values interpolated into the prompt template.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMetrics {
    pub currency: String,
    pub earnings: f64,
    pub expenses: f64,
    pub balance: f64,
    pub average_monthly_expense: Option<f64>,
    pub savings: f64,
    pub recommended_salary: Option<f64>,
}

/// Replaces `{name}` placeholders; unknown placeholders are left as written.
pub fn render_prompt(template: &str, metrics: &PromptMetrics) -> String {
    let money = |v: f64| format!("{:.2}", v);
    let optional = |v: Option<f64>| v.map(money).unwrap_or_else(|| "n/a".to_string());

    template
        .replace("{currency}", &metrics.currency)
        .replace("{earnings}", &money(metrics.earnings))
        .replace("{expenses}", &money(metrics.expenses))
        .replace("{balance}", &money(metrics.balance))
        .replace(
            "{average_monthly_expense}",
            &optional(metrics.average_monthly_expense),
        )
        .replace("{savings}", &money(metrics.savings))
        .replace("{recommended_salary}", &optional(metrics.recommended_salary))
}

/// Plain-text table of the ledger, one transaction per line.
pub fn ledger_excerpt(ledger: &Ledger) -> String {
    let cell = |v: Option<f64>| v.map(|x| format!("{:.2}", x)).unwrap_or_default();

    let mut out = String::from("date | debit | credit | balance | category | description\n");
    for tx in ledger {
        out.push_str(&format!(
            "{} | {} | {} | {} | {} | {}\n",
            tx.date.format("%Y-%m-%d"),
            cell(tx.debit),
            cell(tx.credit),
            cell(tx.balance),
            tx.category,
            tx.description.as_deref().unwrap_or("")
        ));
    }
    out
}

/// Cuts `excerpt` so prompt and excerpt together fit the context budget.
/// Token counts are estimated as `ceil(chars / chars_per_token)`.
pub fn truncate_excerpt(
    prompt: &str,
    excerpt: &str,
    max_context_tokens: usize,
    chars_per_token: usize,
) -> String {
    let chars_per_token = chars_per_token.max(1);
    let prompt_tokens = prompt.chars().count().div_ceil(chars_per_token);
    let available_tokens = max_context_tokens.saturating_sub(prompt_tokens);
    let budget = available_tokens.saturating_mul(chars_per_token);
    excerpt.chars().take(budget).collect()
}

/// Final text sent to the service: the prompt, then the bounded excerpt.
pub fn build_request(prompt: &str, ledger: &Ledger, config: &NarrativeConfig) -> String {
    let excerpt = truncate_excerpt(
        prompt,
        &ledger_excerpt(ledger),
        config.max_context_tokens,
        config.chars_per_token,
    );
    format!("{}\n{}\n", prompt, excerpt)
}

/// Runs the service under `timeout`. Never fails: every problem is folded
/// into [`NarrativeStatus::Failed`].
pub async fn narrate<S>(service: &S, request: &str, timeout: Duration) -> NarrativeStatus
where
    S: NarrativeService + ?Sized,
{
    match tokio::time::timeout(timeout, service.generate(request)).await {
        Ok(Ok(text)) => {
            info!("Narrative summary generated ({} chars)", text.len());
            NarrativeStatus::Generated(text)
        }
        Ok(Err(err)) => {
            warn!("Narrative summary unavailable: {}", err);
            NarrativeStatus::Failed(err.to_string())
        }
        Err(_) => {
            let err = ServiceError::Timeout(timeout.as_secs());
            warn!("Narrative summary unavailable: {}", err);
            NarrativeStatus::Failed(err.to_string())
        }
    }
}
