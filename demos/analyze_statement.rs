use bank_statement_analyzer::*;
use anyhow::{anyhow, Context, Result};

const SAMPLE: &str = "\
Date;Description;Debit;Credit;Balance;Category
01-03-2024;Employer;;2.500,00;3.000,00;Salary
02-03-2024;Landlord;850,00;;2.150,00;Rent
04-03-2024;Supermarket;62,40;;2.087,60;Groceries
09-03-2024;Cinema;18,00;;2.069,60;Leisure
15-03-2024;Supermarket;55,15;;2.014,45;Groceries
21-03-2024;Pharmacy;-;;2.014,45;Health
";

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let bytes = match args.get(1) {
        Some(path) => std::fs::read(path).with_context(|| format!("reading {}", path))?,
        None => SAMPLE.as_bytes().to_vec(),
    };

    let config = match args.get(2) {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path))?;
            AnalyzerConfig::from_json_str(&json)?
        }
        None => AnalyzerConfig::new(
            ColumnMapping::new("Date", "Debit", "Credit", "Category")
                .with_balance("Balance")
                .with_description("Description"),
        ),
    };

    let reference_date = match args.get(1) {
        Some(_) => today(),
        None => chrono::NaiveDate::from_ymd_opt(2024, 3, 31)
            .ok_or_else(|| anyhow!("invalid date"))?,
    };

    println!("📄 Analyzing statement ({} bytes)...\n", bytes.len());

    let state = SessionState::from_upload_at(Some(&bytes), &config, reference_date);
    let report = match state {
        SessionState::Processed(report) => report,
        SessionState::Error(err) => {
            eprintln!("❌ {}", err);
            return Err(err.into());
        }
        SessionState::NoFileYet => return Ok(()),
    };

    if report.encoding_guessed {
        println!(
            "⚠️  Encoding guessed as {}; pass an explicit encoding if text looks wrong",
            report.encoding.as_deref().unwrap_or("unknown")
        );
    }

    let cur = &report.currency_symbol;
    let fmt = config.mapping.number_format();

    println!(
        "✅ {} transactions ({} rows dropped, {} unreadable amounts)",
        report.ledger.len(),
        report.diagnostics.dropped_rows(),
        report.diagnostics.malformed_amounts
    );
    for issue in &report.diagnostics.issues {
        println!("   line {}: {} '{}' ({})", issue.line, issue.role, issue.raw, issue.reason);
    }

    println!("\n📅 {}", report.current_month.month.label());
    println!("   Earnings: {}{}", cur, format_amount(report.current_month.earnings, fmt));
    println!("   Expenses: {}{}", cur, format_amount(report.current_month.expenses, fmt));
    println!("   Balance:  {}{}", cur, format_amount(report.current_month.balance, fmt));

    if let (Some(avg), Some(salary)) = (report.average_monthly_expense, report.recommended_salary) {
        println!("\n💡 Average monthly expense: {}{}", cur, format_amount(avg, fmt));
        println!(
            "   Recommended salary to save {}{}: {}{}",
            cur,
            format_amount(report.desired_monthly_savings, fmt),
            cur,
            format_amount(salary, fmt)
        );
    }

    println!("\n📈 Rolling windows");
    for window in &report.windows {
        let delta = window
            .expenses
            .delta_percent()
            .map(|p| format!("{:+.1}%", p))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "   {:>3} days: spent {}{} (previous {}{}, {})",
            window.window_days,
            cur,
            format_amount(window.expenses.current_total, fmt),
            cur,
            format_amount(window.expenses.previous_total, fmt),
            delta
        );
    }

    println!("\n🏷️  By category");
    for (category, total) in &report.category_totals {
        println!("   {:<12} {}{}", category, cur, format_amount(*total, fmt));
    }

    if !report.outliers.is_empty() {
        println!("\n⚠️  Above-average expenses");
        for tx in &report.outliers {
            println!(
                "   {} {:<12} {}{}",
                tx.date,
                tx.category,
                cur,
                format_amount(tx.debit_or_zero(), fmt)
            );
        }
    }

    Ok(())
}
