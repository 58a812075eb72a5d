use chrono::Local;
use colored::Colorize;
use rust_decimal::prelude::*;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};

use super::table;

const TITLE: &str = "Property Development Feasibility Summary";

const DISCLAIMER: &str = "Disclaimer: This calculator provides estimates only. Results are for \
general guidance and should not be relied upon for investment decisions. Always verify with \
professional advice and detailed feasibility analysis before making acquisition or funding \
decisions.";

/// Print a feasibility envelope as a sectioned summary.
///
/// Anything that is not a feasibility result falls back to the table view.
pub fn print_report(value: &Value) {
    let generated = Local::now().format("%d/%m/%Y, %I:%M:%S %P").to_string();
    match render_report(value, &generated) {
        Some(report) => println!("{}", report),
        None => table::print_table(value),
    }
}

/// Render the summary, or `None` when `value` has no residual land value.
pub fn render_report(value: &Value, generated: &str) -> Option<String> {
    let result = value.get("result")?;
    result.get("rlv")?;
    let assumptions = value.get("assumptions").unwrap_or(&Value::Null);
    let money = |path: &[&str]| format_currency(decimal_at(result, path));
    let pct = |path: &[&str]| format_percent(decimal_at(result, path));

    let mut sections: Vec<String> = Vec::new();

    let title = match assumptions.get("project_name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => format!("{} - {}", TITLE, name.trim()),
        _ => TITLE.to_string(),
    };
    sections.push(format!("{}\nGenerated: {}", title.bold(), generated));

    sections.push(section(
        "Project Summary",
        ["Metric", "Value"],
        vec![
            row("Current Market Value (As-Is)", format_currency(decimal_at(assumptions, &["land_value"]))),
            row(
                "On-Completion Value (As-Complete)",
                format_currency(decimal_at(assumptions, &["on_completion_grv"])),
            ),
        ],
    ));

    sections.push(section(
        "Project Health",
        ["Metric", "Value"],
        vec![
            row("Forecast LVR (Loan/GRV)", pct(&["ltv"])),
            row("Loan to Cost (LTC)", pct(&["ltc"])),
            row("Debt Coverage Ratio (DCR)", format_multiple(decimal_at(result, &["dcr"]))),
        ],
    ));

    sections.push(section(
        "Profitability",
        ["Metric", "Value"],
        vec![
            row("Net Value Creation", money(&["net_value_created"])),
            row("Return on Equity (ROE)", pct(&["roe"])),
            row("Profit margin %", pct(&["profit_margin_pct"])),
            row("Developer profit", money(&["developer_profit"])),
            row("RLV per lot", money(&["rlv_per_lot"])),
        ],
    ));

    sections.push(section(
        "The Bottom Line",
        ["Metric", "Value"],
        vec![row("Residual Land Value (RLV)", money(&["rlv"]))],
    ));

    let fee_label = match decimal_at(assumptions, &["funding_fee_pct"]) {
        Some(fee) => format!("Establishment fee ({}%)", fee.normalize()),
        None => "Establishment fee".to_string(),
    };
    let deductions = [
        ("Construction cost".to_string(), decimal_at(assumptions, &["construction_cost"])),
        ("Professional fees".to_string(), decimal_at(result, &["costs", "professional_fees"])),
        ("Finance costs".to_string(), decimal_at(result, &["costs", "finance_costs"])),
        (fee_label, decimal_at(result, &["costs", "funding_fee"])),
        ("Sales & marketing".to_string(), decimal_at(result, &["costs", "sales_marketing"])),
        ("Contingency".to_string(), decimal_at(result, &["costs", "contingency"])),
        ("Other costs".to_string(), decimal_at(assumptions, &["other_costs"])),
        ("Developer margin".to_string(), decimal_at(result, &["costs", "developer_margin"])),
    ];
    let mut breakdown = vec![row("Gross Sales", money(&["gdv"]))];
    for (label, amount) in deductions {
        if let Some(amount) = amount.filter(|a| !rounds_to_zero(*a)) {
            breakdown.push([label, format_deduction(amount)]);
        }
    }
    breakdown.push(row("Residual Land Value", money(&["rlv"])));
    sections.push(section("Breakdown", ["Item", "Amount"], breakdown));

    let deduct = |path: &[&str]| {
        decimal_at(result, path)
            .map(format_deduction)
            .unwrap_or_else(|| format_currency(None))
    };
    sections.push(section(
        "Net Settlement Position",
        ["Item", "Amount"],
        vec![
            row("Gross Sales", money(&["settlement", "gross_sales"])),
            row("Less Selling Costs", deduct(&["settlement", "selling_costs"])),
            row("Less Facility Repayment", deduct(&["settlement", "facility_repayment"])),
            row("Less Other Costs", deduct(&["settlement", "other_costs"])),
            row("Cash Result", money(&["settlement", "cash_result"])),
        ],
    ));

    let sensitivity_rows: Vec<[String; 3]> = result
        .get("sensitivity")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|r| {
                    [
                        shock_label(decimal_at(r, &["shock_pct"])),
                        format_currency(decimal_at(r, &["gdv_alt"])),
                        format_currency(decimal_at(r, &["rlv_alt"])),
                    ]
                })
                .collect()
        })
        .unwrap_or_default();
    sections.push(section(
        "Sensitivity Analysis",
        ["Price Movement", "Gross Sales", "RLV"],
        sensitivity_rows,
    ));

    if let Some(warnings) = value.get("warnings").and_then(Value::as_array) {
        let lines: Vec<String> = warnings
            .iter()
            .filter_map(Value::as_str)
            .map(|w| format!("  - {}", w))
            .collect();
        if !lines.is_empty() {
            sections.push(format!("{}\n{}", "Warnings".bold().yellow(), lines.join("\n")));
        }
    }

    sections.push(DISCLAIMER.dimmed().to_string());
    Some(sections.join("\n\n"))
}

fn row(label: &str, value: String) -> [String; 2] {
    [label.to_string(), value]
}

fn section<const N: usize>(title: &str, head: [&str; N], rows: Vec<[String; N]>) -> String {
    let mut builder = Builder::default();
    builder.push_record(head);
    for r in rows {
        builder.push_record(r);
    }
    let mut table = builder.build();
    table
        .with(Style::psql())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()));
    format!("{}\n{}", title.bold().blue(), table)
}

/// Decimal at a nested path; accepts string or number encodings.
fn decimal_at(value: &Value, path: &[&str]) -> Option<Decimal> {
    let leaf = path.iter().try_fold(value, |v, key| v.get(*key))?;
    match leaf {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        _ => None,
    }
}

/// Magnitude of `n` rounded to whole units, halves toward positive infinity
/// (-1234.5 rounds to -1234).
fn round_whole(n: Decimal) -> Decimal {
    let strategy = if n.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    n.round_dp_with_strategy(0, strategy).abs()
}

fn rounds_to_zero(n: Decimal) -> bool {
    round_whole(n).is_zero()
}

/// Whole-dollar amount with thousands separators; `−` (U+2212) for
/// negatives and `—` when missing.
pub fn format_currency(n: Option<Decimal>) -> String {
    let Some(n) = n else {
        return "—".to_string();
    };
    let digits = format!("{:.0}", round_whole(n));
    let grouped = group_thousands(&digits);
    if n.is_sign_negative() && !n.is_zero() {
        format!("−${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// A cost shown as a deduction: `−$1,234`.
fn format_deduction(n: Decimal) -> String {
    format_currency(Some(-n))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_percent(n: Option<Decimal>) -> String {
    match n {
        Some(n) => format!("{:.1}%", n.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)),
        None => "—".to_string(),
    }
}

pub fn format_multiple(n: Option<Decimal>) -> String {
    match n {
        Some(n) => format!("{:.2}x", n.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)),
        None => "—".to_string(),
    }
}

fn shock_label(shock_pct: Option<Decimal>) -> String {
    match shock_pct {
        Some(s) if s.is_zero() => "Base".to_string(),
        Some(s) if s > Decimal::ZERO => format!("+{}%", s.normalize()),
        Some(s) => format!("{}%", s.normalize()),
        None => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devfeas_core::{evaluate_feasibility, FeasibilityInput};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_currency_grouping_and_rounding() {
        assert_eq!(format_currency(Some(dec!(0))), "$0");
        assert_eq!(format_currency(Some(dec!(999.4))), "$999");
        assert_eq!(format_currency(Some(dec!(999.5))), "$1,000");
        assert_eq!(format_currency(Some(dec!(1234567.89))), "$1,234,568");
        assert_eq!(format_currency(Some(dec!(100000))), "$100,000");
    }

    #[test]
    fn test_currency_negative_and_missing() {
        assert_eq!(format_currency(Some(dec!(-35000))), "−$35,000");
        assert_eq!(format_currency(Some(dec!(-1234.5))), "−$1,234");
        assert_eq!(format_currency(Some(dec!(-1234.51))), "−$1,235");
        assert_eq!(format_currency(Some(dec!(-0.4))), "−$0");
        assert_eq!(format_currency(None), "—");
        assert_eq!(format_deduction(dec!(2800000)), "−$2,800,000");
    }

    #[test]
    fn test_ratio_formats() {
        assert_eq!(format_percent(Some(dec!(58.333333))), "58.3%");
        assert_eq!(format_percent(Some(dec!(12))), "12.0%");
        assert_eq!(format_percent(None), "—");
        assert_eq!(format_multiple(Some(dec!(1.9876))), "1.99x");
        assert_eq!(format_multiple(None), "—");
    }

    #[test]
    fn test_shock_labels() {
        assert_eq!(shock_label(Some(dec!(-10.00))), "-10%");
        assert_eq!(shock_label(Some(dec!(0))), "Base");
        assert_eq!(shock_label(Some(dec!(5.0))), "+5%");
    }

    #[test]
    fn test_decimal_at_reads_strings_and_numbers() {
        let value = json!({"costs": {"funding_fee": "1500.25"}, "dcr": 1.5, "lots": 4});
        assert_eq!(decimal_at(&value, &["costs", "funding_fee"]), Some(dec!(1500.25)));
        assert_eq!(decimal_at(&value, &["dcr"]), Some(dec!(1.5)));
        assert_eq!(decimal_at(&value, &["lots"]), Some(dec!(4)));
        assert_eq!(decimal_at(&value, &["missing"]), None);
    }

    #[test]
    fn test_report_sections() {
        let input = FeasibilityInput {
            project_name: Some("Hilltop Lots".into()),
            land_value: dec!(800000),
            on_completion_grv: dec!(2400000),
            num_lots: 4,
            lots_expected_to_sell: 4,
            avg_sale_price: dec!(600000),
            construction_cost: dec!(900000),
            interest_rate_pct: dec!(9),
            construction_amount_required: dec!(900000),
            construction_period_months: 8,
            facility_term_months: 12,
            developer_margin_pct: dec!(15),
            ..FeasibilityInput::default()
        };
        let value = serde_json::to_value(evaluate_feasibility(&input)).unwrap();
        let report = render_report(&value, "01/01/2026, 09:00:00 am").unwrap();

        for heading in [
            "Property Development Feasibility Summary - Hilltop Lots",
            "Project Summary",
            "Project Health",
            "Profitability",
            "The Bottom Line",
            "Breakdown",
            "Net Settlement Position",
            "Sensitivity Analysis",
        ] {
            assert!(report.contains(heading), "missing {heading}");
        }
        assert!(report.contains("$2,400,000"));
        assert!(report.contains("Establishment fee (3%)"));
        // Zero-valued cost lines are left out of the breakdown
        assert!(!report.contains("Professional fees"));
        assert!(!report.contains("Contingency"));
        for label in ["-10%", "-5%", "Base", "+5%", "+10%"] {
            assert!(report.contains(label), "missing {label}");
        }
    }

    #[test]
    fn test_non_feasibility_output_is_not_a_report() {
        let value = json!({"result": {"solution": {"facility_size": "100"}}});
        assert!(render_report(&value, "now").is_none());
    }
}
