//! Text renderings of the engine reports.

use chrono::NaiveDate;
use daybook_core::{CustomerLedger, DaybookStatistics, OutstandingReport, StreamTotals};
use daybook_domain::{FuelType, RateTimeline};
use rust_decimal::Decimal;

use crate::cli::output::{current_preferences, styled, MessageKind};
use crate::cli::table::{Table, TableColumn};

/// Two-decimal rendering used for every amount and volume.
pub fn money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

pub fn money_with_currency(amount: Decimal, currency: &str) -> String {
    format!("{currency} {}", money(amount))
}

fn section(title: impl std::fmt::Display) -> String {
    styled(MessageKind::Section, title, &current_preferences())
}

fn stream_row(label: &str, totals: &StreamTotals) -> Vec<String> {
    vec![
        label.to_string(),
        money(totals.fuel_sales),
        money(totals.credit_total),
        money(totals.expense_total),
        money(totals.income_total),
        money(totals.settlement_total),
        money(totals.cash()),
    ]
}

pub fn render_statistics(stats: &DaybookStatistics, currency: &str) -> String {
    let mut table = Table::new(vec![
        TableColumn::left("Stream"),
        TableColumn::right("Fuel sales"),
        TableColumn::right("Credit"),
        TableColumn::right("Expenses"),
        TableColumn::right("Income"),
        TableColumn::right("Settlements"),
        TableColumn::right("Cash"),
    ]);
    table.push_row(stream_row("Regular", &stats.regular));
    if stats.has_mpp_data {
        table.push_row(stream_row("MPP", &stats.mpp));
    }

    let mut out = vec![section(format!("Statistics {}", stats.range)), table.render(), String::new()];
    out.push(format!("Cash in hand:          {}", money_with_currency(stats.cash_in_hand, currency)));
    if stats.has_mpp_data {
        out.push(format!("MPP cash:              {}", money_with_currency(stats.mpp_cash, currency)));
    }
    out.push(format!(
        "Total available cash:  {}",
        money_with_currency(stats.total_available_cash, currency)
    ));

    if !stats.fuel_by_type.is_empty() {
        let mut fuels = Table::new(vec![
            TableColumn::left("Fuel"),
            TableColumn::right("Liters"),
            TableColumn::right("Amount"),
        ]);
        for (fuel, totals) in &stats.fuel_by_type {
            fuels.push_row(vec![fuel.to_string(), money(totals.liters), money(totals.amount)]);
        }
        fuels.set_footer(vec![
            "Total".into(),
            money(stats.total_liters),
            money(stats.fuel_by_type.values().map(|totals| totals.amount).sum()),
        ]);
        out.push(String::new());
        out.push(fuels.render());
    }
    out.join("\n")
}

pub fn render_ledger(ledger: &CustomerLedger, currency: &str) -> String {
    let title = if ledger.is_mpp {
        format!("Ledger {} (MPP) {}", ledger.customer_name, ledger.range)
    } else {
        format!("Ledger {} {}", ledger.customer_name, ledger.range)
    };
    let mut out = vec![
        section(title),
        format!("Opening balance: {}", money_with_currency(ledger.opening_balance, currency)),
    ];

    if ledger.is_empty() {
        out.push("No ledger entries in range.".into());
    } else {
        let mut table = Table::new(vec![
            TableColumn::left("Date"),
            TableColumn::left("Description").max_width(40),
            TableColumn::right("Credit"),
            TableColumn::right("Received"),
            TableColumn::right("Outstanding"),
        ]);
        for row in &ledger.rows {
            table.push_row(vec![
                row.date.to_string(),
                row.description.clone(),
                money(row.credit),
                money(row.received),
                money(row.outstanding),
            ]);
        }
        table.set_footer(vec![
            "Total".into(),
            String::new(),
            money(ledger.total_credit),
            money(ledger.total_received),
            money(ledger.closing_balance),
        ]);
        out.push(table.render());
    }
    out.push(format!("Closing balance: {}", money_with_currency(ledger.closing_balance, currency)));
    out.join("\n")
}

pub fn render_outstanding(report: &OutstandingReport, currency: &str) -> String {
    let mut out = vec![section(format!("Outstanding till {}", report.till))];
    if report.rows.is_empty() {
        out.push("No customers to report.".into());
        return out.join("\n");
    }

    let mut table = Table::new(vec![
        TableColumn::left("Customer").max_width(32),
        TableColumn::right("Starting"),
        TableColumn::right("Credit"),
        TableColumn::right("Received"),
        TableColumn::right("Outstanding"),
    ]);
    for row in &report.rows {
        table.push_row(vec![
            row.name.clone(),
            money(row.starting_balance),
            money(row.total_credit),
            money(row.total_received),
            money(row.outstanding),
        ]);
    }
    table.set_footer(vec![
        "Total".into(),
        String::new(),
        String::new(),
        String::new(),
        money(report.total_outstanding),
    ]);
    out.push(table.render());
    out.push(format!(
        "Total outstanding: {}",
        money_with_currency(report.total_outstanding, currency)
    ));
    out.join("\n")
}

pub fn render_rate(fuel: &FuelType, date: NaiveDate, rate: Decimal, currency: &str) -> String {
    format!("{fuel} on {date}: {}", money_with_currency(rate, currency))
}

pub fn render_rates_on(rates: &RateTimeline, date: NaiveDate, currency: &str) -> String {
    let resolved = rates.rates_on(date);
    let mut out = vec![section(format!("Rates on {date}"))];
    if resolved.is_empty() {
        out.push("No rates configured.".into());
        return out.join("\n");
    }
    let mut table = Table::new(vec![TableColumn::left("Fuel"), TableColumn::right(currency)]);
    for (fuel, rate) in resolved {
        table.push_row(vec![fuel.to_string(), money(rate)]);
    }
    out.push(table.render());
    out.join("\n")
}
