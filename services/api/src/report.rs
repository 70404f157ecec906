use crate::infra::{parse_date, reporting_instant, ConfiguredSource};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use paytrack::config::{AppConfig, DashboardConfig};
use paytrack::dashboard::{DashboardOverview, DashboardService, PaymentSnapshotView};
use paytrack::error::AppError;
use paytrack::ledger::{ClientId, ClientSummary, DistributionEntry};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct PortfolioReportArgs {
    /// Directory holding the CSV exports. Defaults to APP_DATA_DIR, then sample records.
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Reporting date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) now: Option<NaiveDate>,
    /// Emit the overview as JSON instead of text.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ClientReportArgs {
    /// Client identifier
    pub(crate) id: String,
    /// Directory holding the CSV exports. Defaults to APP_DATA_DIR, then sample records.
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Reporting date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) now: Option<NaiveDate>,
    /// Emit the summary as JSON instead of text.
    #[arg(long)]
    pub(crate) json: bool,
}

fn load_service(
    data_dir: Option<PathBuf>,
    now: DateTime<Utc>,
) -> Result<DashboardService<ConfiguredSource>, AppError> {
    let mut config = AppConfig::load()?;
    if data_dir.is_some() {
        config.data.dir = data_dir;
    }
    config.ensure_data_source()?;
    Ok(service_at(config.data.dir, config.dashboard, now))
}

/// Lays out the records against the same instant the report is built for.
fn service_at(
    data_dir: Option<PathBuf>,
    dashboard: DashboardConfig,
    now: DateTime<Utc>,
) -> DashboardService<ConfiguredSource> {
    let source = ConfiguredSource::resolve(data_dir, now.date_naive());
    DashboardService::new(Arc::new(source), dashboard)
}

pub(crate) fn run_portfolio_report(args: PortfolioReportArgs) -> Result<(), AppError> {
    let PortfolioReportArgs {
        data_dir,
        now,
        json,
    } = args;

    let now = reporting_instant(now);
    let service = load_service(data_dir, now)?;
    let overview = service.overview(now);

    if json {
        let rendered = serde_json::to_string_pretty(&overview).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        print!("{}", OverviewReport(&overview));
    }
    Ok(())
}

pub(crate) fn run_client_report(args: ClientReportArgs) -> Result<(), AppError> {
    let ClientReportArgs {
        id,
        data_dir,
        now,
        json,
    } = args;

    let now = reporting_instant(now);
    let service = load_service(data_dir, now)?;
    let Some(summary) = service.client_summary(&ClientId(id.clone()), now)? else {
        println!("No client found with id '{id}'.");
        return Ok(());
    };

    if json {
        let rendered = serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        print!("{}", ClientReport(&summary));
    }
    Ok(())
}

/// Plain-text portfolio report.
pub(crate) struct OverviewReport<'a>(pub(crate) &'a DashboardOverview);

impl fmt::Display for OverviewReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let overview = self.0;
        let totals = &overview.totals;

        writeln!(
            f,
            "Payment dashboard as of {}",
            overview.generated_at.format("%Y-%m-%d")
        )?;
        writeln!(
            f,
            "- {} clients | {} payments totalling {:.2}",
            totals.clients, totals.payments, totals.payment_amount
        )?;
        writeln!(
            f,
            "- spent {:.2} | paid {:.2} | outstanding {:.2}",
            totals.total_spent, totals.paid_amount, totals.outstanding_amount
        )?;
        if let Some(average) = totals.average_score {
            writeln!(f, "- average trust score {average:.1}")?;
        }

        writeln!(f, "\nStatus distribution:")?;
        write_distribution(f, &overview.distribution)?;

        writeln!(f, "\nClients by outstanding balance:")?;
        for client in &overview.clients {
            writeln!(
                f,
                "  - {} ({}): score {} | outstanding {:.2} | {} overdue",
                client.name,
                client.client_id.0,
                client.score.value(),
                client.outstanding_amount,
                client.overdue_payments
            )?;
        }

        write_snapshots(f, "Overdue payments", &overview.overdue_payments)?;
        write_snapshots(f, "Upcoming payments", &overview.upcoming_payments)
    }
}

/// Plain-text summary for one client.
pub(crate) struct ClientReport<'a>(pub(crate) &'a ClientSummary);

impl fmt::Display for ClientReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;

        writeln!(
            f,
            "{} ({}) | standing: {}",
            summary.name, summary.client_id.0, summary.status_label
        )?;
        writeln!(
            f,
            "- trust score {} (recorded {})",
            summary.score.value(),
            summary.recorded_score.value()
        )?;
        for component in &summary.score_components {
            writeln!(f, "  {:+4}  {}", component.points, component.notes)?;
        }
        writeln!(
            f,
            "- spent {:.2} | paid {:.2} | outstanding {:.2}",
            summary.total_spent, summary.paid_amount, summary.outstanding_amount
        )?;
        let last_order = summary
            .last_order_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "none".to_string());
        let next_payment = summary
            .next_payment_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "none".to_string());
        writeln!(f, "- last order {last_order} | next payment {next_payment}")?;
        if !summary.tags.is_empty() {
            writeln!(f, "- tags: {}", summary.tags.join(", "))?;
        }

        writeln!(f, "\nPayments by status:")?;
        write_distribution(f, &summary.distribution)
    }
}

fn write_distribution(f: &mut fmt::Formatter<'_>, entries: &[DistributionEntry]) -> fmt::Result {
    for entry in entries {
        writeln!(
            f,
            "  - {}: {} payments ({:.0}%) | {:.2} ({:.0}%)",
            entry.status_label,
            entry.count,
            entry.count_share,
            entry.total_amount,
            entry.amount_share
        )?;
    }
    Ok(())
}

fn write_snapshots(
    f: &mut fmt::Formatter<'_>,
    heading: &str,
    snapshots: &[PaymentSnapshotView],
) -> fmt::Result {
    if snapshots.is_empty() {
        return Ok(());
    }
    writeln!(f, "\n{heading}:")?;
    for snapshot in snapshots {
        let owner = snapshot.client_name.as_deref().unwrap_or("unassigned");
        let timing = if snapshot.days_past_due > 0 {
            format!("{} days late", snapshot.days_past_due)
        } else {
            format!("due in {} days", -snapshot.days_past_due)
        };
        writeln!(
            f,
            "  - {} [{}] {:.2} due {} ({timing})",
            snapshot.payment_id.0, owner, snapshot.amount, snapshot.due_date
        )?;
    }
    Ok(())
}
