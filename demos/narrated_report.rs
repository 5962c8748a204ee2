use bank_statement_analyzer::llm::OpenAiClient;
use bank_statement_analyzer::*;
use dotenv::dotenv;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: narrated_report <statement.csv> [config.json]")?;
    let bytes = std::fs::read(&path)?;

    let config = match std::env::args().nth(2) {
        Some(config_path) => AnalyzerConfig::from_json_str(&std::fs::read_to_string(config_path)?)?,
        None => AnalyzerConfig::new(
            ColumnMapping::new("Date", "Debit", "Credit", "Category").with_balance("Balance"),
        ),
    };

    // A missing key still produces the numeric report
    let client = match OpenAiClient::from_env() {
        Ok(client) => Some(client.with_settings(&config.narrative)?),
        Err(err) => {
            println!("⚠️  {}; continuing without a narrative summary", err);
            None
        }
    };

    println!("📄 Analyzing {}...", path);
    let report = StatementAnalyzer::analyze_with_narrative(
        &bytes,
        &config,
        client.as_ref().map(|c| c as &dyn NarrativeService),
    )
    .await?;

    println!(
        "✅ {} transactions, this month +{:.2} / -{:.2}",
        report.ledger.len(),
        report.current_month.earnings,
        report.current_month.expenses
    );

    match &report.narrative {
        NarrativeStatus::Generated(text) => println!("\n🤖 Summary\n{}", text),
        NarrativeStatus::Failed(reason) => println!("\n⚠️  Summary unavailable: {}", reason),
        NarrativeStatus::Skipped => {}
    }

    println!("\n{}", serde_json::to_string_pretty(&report.current_month)?);

    Ok(())
}
