//! Plain-text rendering of a list view.

use buildlens_core::BuildRecord;
use buildlens_stream::{IndicatorsView, LastPage, ListView};
use std::io::{self, Write};

pub fn render_view<W: Write>(view: &ListView<'_>, out: &mut W) -> io::Result<()> {
    let marker = if view.tab_exact { "" } else { " (custom filters)" };
    writeln!(out, "== {}{} ==", view.tab_label, marker)?;
    if !view.chips.is_empty() {
        let chips: Vec<String> = view
            .chips
            .iter()
            .map(|chip| format!("{}: {}", chip.label, chip.value))
            .collect();
        writeln!(out, "filters: {}", chips.join(" | "))?;
    }
    if let Some(column) = &view.sort.column {
        writeln!(out, "sort: {} {:?}", column, view.sort.direction)?;
    }

    for record in view.records {
        writeln!(out, "{}", format_record(record))?;
    }
    if let Some(message) = view.empty_message {
        writeln!(out, "{message}")?;
    }

    match view.indicators {
        IndicatorsView::Ready(snapshot) => {
            let pairs: Vec<String> = snapshot.iter().map(|(k, v)| format!("{k}={v}")).collect();
            writeln!(out, "indicators: {}", pairs.join(", "))?;
        }
        IndicatorsView::Loading(_) => writeln!(out, "indicators: loading")?,
        IndicatorsView::NoData => writeln!(out, "indicators: no data")?,
        IndicatorsView::Unavailable { show_retry } => {
            let hint = if show_retry { " (retry available)" } else { "" };
            writeln!(out, "indicators: service unavailable{hint}")?;
        }
        IndicatorsView::Hidden => {}
    }

    match view.last_page {
        Some(LastPage::AllLoaded) => writeln!(out, "-- all {} builds loaded --", view.records.len())?,
        Some(LastPage::MaximumReached) => writeln!(
            out,
            "-- maximum reached after {} builds; narrow the filters to see more --",
            view.records.len()
        )?,
        Some(LastPage::More) => writeln!(out, "-- more builds available --")?,
        None => {}
    }
    if let Some(error) = view.error {
        writeln!(out, "error: {error}")?;
    }
    Ok(())
}

fn format_record(record: &BuildRecord) -> String {
    let sha: String = record.commit_sha.chars().take(8).collect();
    let duration = record
        .duration_secs
        .map(|secs| format!("{}m{:02}s", secs / 60, secs % 60))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "#{:<6} {:<9} {:<24} {} {:<12} {}",
        record.number,
        record.status.as_str(),
        record.branch,
        sha,
        record.author,
        duration
    )
}
