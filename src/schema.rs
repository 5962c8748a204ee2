use crate::error::Result;
use crate::ingestion::TableFormat;
use crate::mapping::ColumnMapping;
use crate::summary::DEFAULT_MONTHLY_SAVINGS;
use crate::window::DEFAULT_WINDOWS;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY_SYMBOL: &str = "€";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are a personal finance assistant. \
Below is an excerpt of a bank statement (amounts in {currency}). \
This month the account holder earned {currency}{earnings} and spent {currency}{expenses}, \
leaving a balance of {currency}{balance}. Their average monthly expense is \
{currency}{average_monthly_expense} and the recommended salary to save \
{currency}{savings} per month is {currency}{recommended_salary}. \
Summarize their spending habits, point out unusual expenses and suggest where they could save.";

/// Everything one upload-and-map cycle needs. Loaded from JSON or built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzerConfig {
    #[serde(default)]
    #[schemars(
        description = "Number of metadata lines before the header row (commonly 0, 4 or 5)"
    )]
    pub skip_rows: usize,

    #[serde(default = "default_delimiter")]
    #[schemars(description = "Field delimiter. Null sniffs it from the header line.")]
    pub delimiter: Option<char>,

    #[serde(default)]
    #[schemars(
        description = "Encoding label such as 'utf-8' or 'windows-1252'. Null auto-detects."
    )]
    pub encoding: Option<String>,

    pub mapping: ColumnMapping,

    #[serde(default = "default_currency_symbol")]
    #[schemars(description = "Display symbol only; no conversion is performed")]
    pub currency_symbol: String,

    #[serde(default = "default_monthly_savings")]
    pub desired_monthly_savings: f64,

    #[serde(default = "default_windows")]
    #[schemars(description = "Rolling window lengths in days")]
    pub windows: Vec<u32>,

    #[serde(default)]
    #[schemars(
        description = "Debit above which a transaction is flagged. Null uses the mean debit."
    )]
    pub outlier_threshold: Option<f64>,

    #[serde(default)]
    pub narrative: NarrativeConfig,
}

fn default_delimiter() -> Option<char> {
    Some(';')
}

fn default_currency_symbol() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}

fn default_monthly_savings() -> f64 {
    DEFAULT_MONTHLY_SAVINGS
}

fn default_windows() -> Vec<u32> {
    DEFAULT_WINDOWS.to_vec()
}

impl AnalyzerConfig {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self {
            skip_rows: 0,
            delimiter: default_delimiter(),
            encoding: None,
            mapping,
            currency_symbol: default_currency_symbol(),
            desired_monthly_savings: DEFAULT_MONTHLY_SAVINGS,
            windows: default_windows(),
            outlier_threshold: None,
            narrative: NarrativeConfig::default(),
        }
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    pub fn with_delimiter(mut self, delimiter: Option<char>) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn with_savings(mut self, desired_monthly_savings: f64) -> Self {
        self.desired_monthly_savings = desired_monthly_savings;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Delimiters outside ASCII cannot be used by the CSV reader and fall
    /// back to sniffing.
    pub fn table_format(&self) -> TableFormat {
        TableFormat {
            delimiter: self
                .delimiter
                .filter(char::is_ascii)
                .map(|c| c as u8),
            skip_rows: self.skip_rows,
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalyzerConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Settings for the optional narrative summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NarrativeConfig {
    #[serde(default = "default_max_context_tokens")]
    #[schemars(description = "Context size of the model, minus a reserve for the answer")]
    pub max_context_tokens: usize,

    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_prompt_template")]
    #[schemars(
        description = "Prompt template; supports {currency}, {earnings}, {expenses}, {balance}, \
                       {average_monthly_expense}, {savings} and {recommended_salary}"
    )]
    pub prompt_template: String,

    #[serde(default = "default_max_response_tokens")]
    pub max_response_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_model")]
    pub model: String,
}

fn default_max_context_tokens() -> usize {
    4096 - 1689
}

fn default_chars_per_token() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_prompt_template() -> String {
    DEFAULT_PROMPT_TEMPLATE.to_string()
}

fn default_max_response_tokens() -> u32 {
    540
}

fn default_temperature() -> f32 {
    0.9
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
            chars_per_token: default_chars_per_token(),
            timeout_secs: default_timeout_secs(),
            prompt_template: default_prompt_template(),
            max_response_tokens: default_max_response_tokens(),
            temperature: default_temperature(),
            model: default_model(),
        }
    }
}
