use bank_statement_analyzer::*;
use chrono::NaiveDate;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn series_to_csv(series: &DailySeries) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["day", "date", "cumulative_debit", "cumulative_credit"])?;
    for point in &series.points {
        writer.write_record([
            point.day_index.to_string(),
            point.date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", point.cumulative_debit),
            format!("{:.2}", point.cumulative_credit),
        ])?;
    }
    Ok(String::from_utf8(writer.into_inner()?)?)
}

fn household_config() -> AnalyzerConfig {
    AnalyzerConfig::new(
        ColumnMapping::new("Datum", "Af", "Bij", "Categorie")
            .with_balance("Saldo")
            .with_description("Omschrijving"),
    )
    .with_skip_rows(5)
}

const HOUSEHOLD_EXPORT: &str = "\
Rekeningoverzicht
Rekening;NL00BANK0123456789
Periode;01-04-2024 t/m 30-06-2024
Valuta;EUR
Aangemaakt;01-07-2024
Datum;Omschrijving;Af;Bij;Saldo;Categorie
01-04-2024;Werkgever BV;;3.150,00;4.150,00;Salaris
02-04-2024;Verhuurder;1.150,00;;3.000,00;Wonen
05-04-2024;Supermarkt;84,35;;2.915,65;Boodschappen
18-04-2024;Energie;142,00;;2.773,65;Wonen
01-05-2024;Werkgever BV;;3.150,00;5.923,65;Salaris
02-05-2024;Verhuurder;1.150,00;;4.773,65;Wonen
12-05-2024;Supermarkt;96,10;;4.677,55;Boodschappen
31-05-2024;Onbekend;?;;4.677,55;Overig
;;;;;
03-06-2024;Werkgever BV;;3.150,00;7.827,55;Salaris
03-06-2024;Verhuurder;1.150,00;;6.677,55;Wonen
14-06-2024;Supermarkt;71,80;;6.605,75;Boodschappen
32-06-2024;Foutieve regel;10,00;;6.595,75;Overig
25-06-2024;Restaurant;64,50;;6.541,25;
";

#[test]
fn test_household_statement_end_to_end() {
    let report = StatementAnalyzer::analyze_at(
        HOUSEHOLD_EXPORT.as_bytes(),
        &household_config(),
        d(2024, 6, 30),
    )
    .unwrap();

    println!("\nHousehold statement, {} transactions", report.ledger.len());
    println!(
        "June: earned {:.2}, spent {:.2}, left {:.2}",
        report.current_month.earnings, report.current_month.expenses, report.current_month.balance
    );

    assert_eq!(report.ledger.len(), 12);
    assert_eq!(report.diagnostics.total_rows, 14);
    assert_eq!(report.diagnostics.empty_rows, 1);
    assert_eq!(report.diagnostics.invalid_date_rows, 1);
    assert_eq!(report.diagnostics.malformed_amounts, 1);

    // first source row sits on line 7: five metadata lines and the header
    assert_eq!(report.ledger.transactions()[0].source_line, 7);

    assert_eq!(report.current_month.earnings, 3150.0);
    assert!((report.current_month.expenses - 1286.3).abs() < 1e-9);

    assert_eq!(report.category_totals[UNCATEGORIZED], 64.5);
    assert_eq!(report.category_totals["Overig"], 0.0);
    assert!((report.category_totals["Wonen"] - 3592.0).abs() < 1e-9);

    // the unreadable amount is excluded from the mean, not counted as zero
    let debits = [1150.0, 84.35, 142.0, 1150.0, 96.10, 1150.0, 71.80, 64.50];
    let mean = debits.iter().sum::<f64>() / debits.len() as f64;
    assert!((report.average_daily_expense.unwrap() - mean).abs() < 1e-9);

    let rent: Vec<&Transaction> = report.outliers.iter().collect();
    assert_eq!(rent.len(), 3);
    assert!(rent.iter().all(|t| t.category == "Wonen"));

    for pair in report.ledger.transactions().windows(2) {
        assert!(pair[0].date <= pair[1].date);
    }
}

#[test]
fn test_rolling_windows_against_fixed_anchor() {
    let report = StatementAnalyzer::analyze_at(
        HOUSEHOLD_EXPORT.as_bytes(),
        &household_config(),
        d(2024, 6, 30),
    )
    .unwrap();

    for window in &report.windows {
        println!(
            "{:>3} days: expenses {:>9.2} vs {:>9.2} ({:?})",
            window.window_days,
            window.expenses.current_total,
            window.expenses.previous_total,
            window.expenses.delta_percent()
        );
        let n = window.window_days as usize + 1;
        assert_eq!(window.current.len(), n);
        assert_eq!(window.previous.len(), n);
        assert_eq!(window.previous.end, window.current.start);
    }

    // 30 days: [31-05, 30-06] vs [01-05, 31-05]
    let month = report.windows.iter().find(|w| w.window_days == 30).unwrap();
    assert!((month.expenses.current_total - 1286.3).abs() < 1e-9);
    assert!((month.expenses.previous_total - 1246.1).abs() < 1e-9);
    assert_eq!(month.earnings.current_total, 3150.0);
    assert_eq!(month.earnings.previous_total, 3150.0);
    assert_eq!(month.earnings.delta, Some(0.0));

    let csv = series_to_csv(&month.current).unwrap();
    assert_eq!(csv.lines().count(), 32);
    assert!(csv.lines().last().unwrap().starts_with("31,2024-06-30,1286.30,3150.00"));
}

#[test]
fn test_staircase_series_over_five_days() {
    let text = "Date;Debit;Credit;Category\n\
01-03-2024;;1.000,00;Salary\n\
03-03-2024;200,00;;Rent\n";
    let table = read_pasted_table(text, &TableFormat::default()).unwrap();
    let mapping = ColumnMapping::new("Date", "Debit", "Credit", "Category");
    let (ledger, _) = build_ledger(&table, &mapping).unwrap();

    let series = daily_series(&ledger, d(2024, 3, 1), d(2024, 3, 5)).unwrap();
    let debits: Vec<f64> = series.points.iter().map(|p| p.cumulative_debit).collect();
    assert_eq!(debits, vec![0.0, 0.0, 200.0, 200.0, 200.0]);
    assert_eq!(series.points[4].cumulative_credit, 1000.0);
}

#[test]
fn test_undefined_delta_when_previous_window_is_empty() {
    let text = "Date;Debit;Credit;Category\n28-06-2024;50,00;;Food\n";
    let report = StatementAnalyzer::analyze_text(
        text,
        &AnalyzerConfig::new(ColumnMapping::new("Date", "Debit", "Credit", "Category")),
        d(2024, 6, 30),
    )
    .unwrap();

    let week = &report.windows[0];
    assert_eq!(week.expenses.current_total, 50.0);
    assert_eq!(week.expenses.previous_total, 0.0);
    assert_eq!(week.expenses.delta, None);

    let json = serde_json::to_value(&report.windows[0].expenses).unwrap();
    assert!(json["delta"].is_null());
}

#[test]
fn test_dash_amount_is_missing() {
    let text = "Date;Debit;Credit;Category\n\
01-06-2024;-;;Fees\n\
02-06-2024;;;Fees\n\
03-06-2024;10,00;;Fees\n";
    let mapping = ColumnMapping::new("Date", "Debit", "Credit", "Category");
    let table = read_pasted_table(text, &TableFormat::default()).unwrap();
    let (ledger, diagnostics) = build_ledger(&table, &mapping).unwrap();

    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.transactions()[0].debit, None);
    assert_eq!(ledger.transactions()[1].debit, None);
    assert_eq!(diagnostics.malformed_amounts, 1);
    assert_eq!(ledger.total_debit(), 10.0);
    assert_eq!(average_daily_expense(&ledger), Some(10.0));
    assert!(parse_amount("-", NumberFormat::european()).is_err());
    assert!(parse_amount("", NumberFormat::european()).is_err());
}

#[test]
fn test_unparseable_date_drops_row() {
    let text = "Date;Debit;Credit;Category\n01-06-2024;1,00;;A\n2024-06-02;2,00;;B\n";
    let table = read_pasted_table(text, &TableFormat::default()).unwrap();
    let (ledger, diagnostics) =
        build_ledger(&table, &ColumnMapping::new("Date", "Debit", "Credit", "Category")).unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(diagnostics.invalid_date_rows, 1);
    assert_eq!(diagnostics.dropped_rows(), 1);
}

#[test]
fn test_role_collision_is_rejected_before_parsing() {
    // every data row is broken; the mapping must fail first
    let text = "Date;Debit;Credit\nnot-a-date;x;y\n";
    let mapping = ColumnMapping::new("Date", "Debit", "Credit", "Date");
    let config = AnalyzerConfig::new(mapping);

    let err = StatementAnalyzer::analyze_text(text, &config, d(2024, 1, 1)).unwrap_err();
    match err {
        StatementError::Configuration(ConfigurationError::DuplicateColumn { column, roles }) => {
            assert_eq!(column, "Date");
            assert_eq!(roles, vec![Role::Date, Role::Category]);
        }
        other => panic!("expected duplicate column error, got {other}"),
    }
}

#[test]
fn test_ledger_build_is_idempotent() {
    let config = household_config();
    let bytes = HOUSEHOLD_EXPORT.as_bytes();
    let a = StatementAnalyzer::analyze_at(bytes, &config, d(2024, 6, 30)).unwrap();
    let b = StatementAnalyzer::analyze_at(bytes, &config, d(2024, 6, 30)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_windows_1252_upload() {
    let bytes: &[u8] = b"Date;Libell\xE9;D\xE9bit;Cr\xE9dit;Cat\xE9gorie\n\
01-02-2024;Caf\xE9;3,50;;Loisirs\n\
02-02-2024;Salaire;;2.000,00;Revenus\n";
    let mapping = ColumnMapping::new("Date", "D\u{e9}bit", "Cr\u{e9}dit", "Cat\u{e9}gorie")
        .with_description("Libell\u{e9}");
    let config = AnalyzerConfig::new(mapping).with_encoding("latin1");

    let report = StatementAnalyzer::analyze_at(bytes, &config, d(2024, 2, 29)).unwrap();
    assert_eq!(report.encoding.as_deref(), Some("windows-1252"));
    assert_eq!(
        report.ledger.transactions()[0].description.as_deref(),
        Some("Caf\u{e9}")
    );
    assert_eq!(report.current_month.earnings, 2000.0);
}

#[test]
fn test_undeclared_windows_1252_upload_is_flagged_as_guessed() {
    let bytes: &[u8] = b"Date;Libell\xE9;D\xE9bit;Cr\xE9dit;Cat\xE9gorie\n\
01-02-2024;Caf\xE9 de la gare;3,50;;Loisirs\n\
02-02-2024;Boulangerie \xE9l\xE9gante;2,10;;Alimentation\n\
03-02-2024;Soci\xE9t\xE9 g\xE9n\xE9rale;;2.000,00;Revenus\n\
04-02-2024;Pr\xE9l\xE8vement \xE9lectricit\xE9;45,00;;Maison\n";
    let mapping = ColumnMapping::new("Date", "D\u{e9}bit", "Cr\u{e9}dit", "Cat\u{e9}gorie");
    let config = AnalyzerConfig::new(mapping);

    let state = SessionState::from_upload_at(Some(bytes), &config, d(2024, 2, 29));
    let report = state.report().unwrap();
    assert!(report.encoding_guessed);
    assert_eq!(report.ledger.len(), 4);

    let declared = config.with_encoding("windows-1252");
    let report = StatementAnalyzer::analyze_at(bytes, &declared, d(2024, 2, 29)).unwrap();
    assert!(!report.encoding_guessed);
}

#[test]
fn test_sniffed_delimiter_tolerates_short_rows() {
    let text = "Date,Debit,Credit,Category\n\
01-01-2024,5.00,,Food\n\
02-01-2024,,10.00,Salary\n\
03-01-2024,3.00\n";
    let mapping = ColumnMapping::new("Date", "Debit", "Credit", "Category")
        .with_separators('.', ',');
    let config = AnalyzerConfig::new(mapping).with_delimiter(None);

    let report = StatementAnalyzer::analyze_text(text, &config, d(2024, 1, 31)).unwrap();
    assert_eq!(report.delimiter, ',');
    assert_eq!(report.current_month.earnings, 10.0);
}

#[test]
fn test_declared_utf8_on_latin1_bytes_is_a_decoding_error() {
    let bytes: &[u8] = b"Date;D\xE9bit\n01-01-2024;1,00\n";
    let config = AnalyzerConfig::new(ColumnMapping::new("Date", "D\u{e9}bit", "Credit", "Category"))
        .with_encoding("utf-8");
    let state = SessionState::from_upload_at(Some(bytes), &config, d(2024, 1, 1));
    assert!(matches!(state.error(), Some(StatementError::Decoding { .. })));
}

#[test]
fn test_english_number_format_and_iso_dates() {
    let text = "Posted,Out,In,Type\n2024-01-03,\"1,234.56\",,Rent\n2024-01-04,,99.5,Refund\n";
    let mapping = ColumnMapping::new("Posted", "Out", "In", "Type")
        .with_date_format("%Y-%m-%d")
        .with_separators('.', ',');
    let config = AnalyzerConfig::new(mapping).with_delimiter(None);

    let report = StatementAnalyzer::analyze_text(text, &config, d(2024, 1, 31)).unwrap();
    assert_eq!(report.delimiter, ',');
    assert!((report.current_month.expenses - 1234.56).abs() < 1e-9);
    assert_eq!(report.current_month.earnings, 99.5);
}

#[test]
fn test_schema_generation() {
    let schema = AnalyzerConfig::schema_as_json().unwrap();
    println!("Schema is {} bytes", schema.len());
    assert!(schema.contains("mapping"));
    assert!(schema.contains("decimal_separator"));
    assert!(schema.contains("windows"));
}
