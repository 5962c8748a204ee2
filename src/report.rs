//! End-to-end pipeline: bytes in, read-only report out.

use crate::categories::{
    category_month_rows, totals_by_category, transactions_above_average, CategoryMonthTotal,
};
use crate::detect::{decode_statement, sniff_delimiter};
use crate::error::{Result, StatementError};
use crate::ingestion::{read_pasted_table, read_table, RawTable, TableFormat};
use crate::ledger::{Ledger, LedgerDiagnostics, Transaction};
use crate::narrative::{
    build_request, narrate, render_prompt, NarrativeService, NarrativeStatus, PromptMetrics,
};
use crate::schema::AnalyzerConfig;
use crate::summary::{
    average_daily_expense, average_monthly_expense, current_month_totals, monthly_totals,
    recommended_salary, recommended_salary_range, savings_share_percent, MonthTotals,
    PeriodTotals, SalaryRange,
};
use crate::utils::{today, YearMonth};
use crate::window::{rolling_comparisons, WindowComparison};
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Everything the presentation layer shows for one uploaded statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementReport {
    /// Encoding the upload was decoded with; `None` for pasted text.
    pub encoding: Option<String>,
    /// Set when the encoding was inferred from byte statistics rather than
    /// a BOM, valid UTF-8 or the configuration.
    #[serde(default)]
    pub encoding_guessed: bool,
    pub delimiter: char,
    pub reference_date: NaiveDate,
    pub currency_symbol: String,
    pub ledger: Ledger,
    pub diagnostics: LedgerDiagnostics,
    pub current_month: MonthTotals,
    pub average_daily_expense: Option<f64>,
    pub average_monthly_expense: Option<f64>,
    pub desired_monthly_savings: f64,
    pub recommended_salary: Option<f64>,
    pub savings_share_percent: Option<f64>,
    pub salary_range: SalaryRange,
    pub windows: Vec<WindowComparison>,
    pub category_totals: BTreeMap<String, f64>,
    pub category_months: Vec<CategoryMonthTotal>,
    pub monthly_totals: BTreeMap<YearMonth, PeriodTotals>,
    pub outlier_threshold: Option<f64>,
    pub outliers: Vec<Transaction>,
    pub balance_series: Vec<(NaiveDate, f64)>,
    pub narrative: NarrativeStatus,
}

impl StatementReport {
    pub fn prompt_metrics(&self) -> PromptMetrics {
        PromptMetrics {
            currency: self.currency_symbol.clone(),
            earnings: self.current_month.earnings,
            expenses: self.current_month.expenses,
            balance: self.current_month.balance,
            average_monthly_expense: self.average_monthly_expense,
            savings: self.desired_monthly_savings,
            recommended_salary: self.recommended_salary,
        }
    }
}

pub struct StatementAnalyzer;

impl StatementAnalyzer {
    /// Runs the full pipeline with windows anchored at today's date.
    pub fn analyze(bytes: &[u8], config: &AnalyzerConfig) -> Result<StatementReport> {
        Self::analyze_at(bytes, config, today())
    }

    pub fn analyze_at(
        bytes: &[u8],
        config: &AnalyzerConfig,
        reference_date: NaiveDate,
    ) -> Result<StatementReport> {
        let decoded = decode_statement(bytes, config.encoding.as_deref())?;
        info!(
            "Decoded statement upload ({} bytes) as {}",
            bytes.len(),
            decoded.encoding.name()
        );

        let format = resolve_format(&decoded.text, config);
        let table = read_table(&decoded.text, &format)?;
        let mut report = Self::analyze_table(&table, &format, config, reference_date)?;
        report.encoding = Some(decoded.encoding.name().to_string());
        report.encoding_guessed = decoded.is_guess();
        Ok(report)
    }

    /// Same as [`analyze_at`](Self::analyze_at) for text pasted by the user.
    pub fn analyze_text(
        text: &str,
        config: &AnalyzerConfig,
        reference_date: NaiveDate,
    ) -> Result<StatementReport> {
        let format = resolve_format(text, config);
        let table = read_pasted_table(text, &format)?;
        Self::analyze_table(&table, &format, config, reference_date)
    }

    /// Runs the pipeline, then asks `service` for a narrative summary. The
    /// numeric report is returned whatever the service does.
    pub async fn analyze_with_narrative(
        bytes: &[u8],
        config: &AnalyzerConfig,
        service: Option<&dyn NarrativeService>,
    ) -> Result<StatementReport> {
        let mut report = Self::analyze(bytes, config)?;
        Self::attach_narrative(&mut report, config, service).await;
        Ok(report)
    }

    pub async fn attach_narrative(
        report: &mut StatementReport,
        config: &AnalyzerConfig,
        service: Option<&dyn NarrativeService>,
    ) {
        let Some(service) = service else {
            report.narrative = NarrativeStatus::Skipped;
            return;
        };

        let prompt = render_prompt(&config.narrative.prompt_template, &report.prompt_metrics());
        let request = build_request(&prompt, &report.ledger, &config.narrative);
        debug!(
            "Requesting narrative summary ({} chars, prompt {} chars)",
            request.len(),
            prompt.len()
        );

        let timeout = Duration::from_secs(config.narrative.timeout_secs);
        report.narrative = narrate(service, &request, timeout).await;
    }

    fn analyze_table(
        table: &RawTable,
        format: &TableFormat,
        config: &AnalyzerConfig,
        reference_date: NaiveDate,
    ) -> Result<StatementReport> {
        let (ledger, diagnostics) = Ledger::build(table, &config.mapping)?;

        let current_month = current_month_totals(&ledger, reference_date);
        let average_daily = average_daily_expense(&ledger);
        let average_monthly = average_monthly_expense(&ledger);
        let savings = config.desired_monthly_savings;

        let windows = rolling_comparisons(&ledger, &config.windows, reference_date)?;

        let outlier_threshold = config.outlier_threshold.or(average_daily);
        let outliers = outlier_threshold
            .map(|threshold| transactions_above_average(&ledger, threshold))
            .unwrap_or_default();

        let report = StatementReport {
            encoding: None,
            encoding_guessed: false,
            delimiter: char::from(
                format.delimiter.unwrap_or(crate::detect::DEFAULT_DELIMITER),
            ),
            reference_date,
            currency_symbol: config.currency_symbol.clone(),
            diagnostics,
            current_month,
            average_daily_expense: average_daily,
            average_monthly_expense: average_monthly,
            desired_monthly_savings: savings,
            recommended_salary: average_monthly.map(|avg| recommended_salary(avg, savings)),
            savings_share_percent: average_monthly
                .and_then(|avg| savings_share_percent(avg, savings)),
            salary_range: recommended_salary_range(current_month.balance),
            windows,
            category_totals: totals_by_category(&ledger),
            category_months: category_month_rows(&ledger),
            monthly_totals: monthly_totals(&ledger),
            outlier_threshold,
            outliers,
            balance_series: ledger.balance_series(),
            ledger,
            narrative: NarrativeStatus::Skipped,
        };

        info!(
            "Report built for {} transaction(s), {} window(s), {} categor(ies), {} outlier(s)",
            report.ledger.len(),
            report.windows.len(),
            report.category_totals.len(),
            report.outliers.len()
        );

        Ok(report)
    }
}

fn resolve_format(text: &str, config: &AnalyzerConfig) -> TableFormat {
    let mut format = config.table_format();
    if format.delimiter.is_none() {
        format.delimiter = Some(sniff_delimiter(text, format.skip_rows));
    }
    format
}

/// Outcome of one upload-and-map cycle, passed to the presentation layer
/// instead of a global "file uploaded" flag.
#[derive(Debug)]
pub enum SessionState {
    NoFileYet,
    Processed(Box<StatementReport>),
    Error(StatementError),
}

impl SessionState {
    pub fn from_upload(upload: Option<&[u8]>, config: &AnalyzerConfig) -> Self {
        Self::from_upload_at(upload, config, today())
    }

    pub fn from_upload_at(
        upload: Option<&[u8]>,
        config: &AnalyzerConfig,
        reference_date: NaiveDate,
    ) -> Self {
        match upload {
            None => SessionState::NoFileYet,
            Some(bytes) => match StatementAnalyzer::analyze_at(bytes, config, reference_date) {
                Ok(report) => SessionState::Processed(Box::new(report)),
                Err(err) => SessionState::Error(err),
            },
        }
    }

    pub fn report(&self) -> Option<&StatementReport> {
        match self {
            SessionState::Processed(report) => Some(report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&StatementError> {
        match self {
            SessionState::Error(err) => Some(err),
            _ => None,
        }
    }
}
