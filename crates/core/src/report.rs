use crate::models::MetricsReport;
use anyhow::Context;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

pub fn columns(reports: &[MetricsReport]) -> Vec<String> {
    let metrics: BTreeSet<&str> = reports
        .iter()
        .flat_map(|r| r.metrics.keys().map(String::as_str))
        .collect();
    metrics
        .into_iter()
        .map(str::to_string)
        .chain(["strategy".to_string(), "dataset".to_string()])
        .collect()
}

fn row(report: &MetricsReport, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|col| match col.as_str() {
            "strategy" => report.strategy.clone(),
            "dataset" => report.dataset.clone(),
            metric => report
                .metrics
                .get(metric)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        })
        .collect()
}

pub fn write_csv<W: Write>(writer: W, reports: &[MetricsReport]) -> anyhow::Result<()> {
    let columns = columns(reports);
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&columns).context("write report header")?;
    for report in reports {
        out.write_record(row(report, &columns))
            .context("write report row")?;
    }
    out.flush().context("flush report")?;
    Ok(())
}

pub fn save_csv(path: &Path, reports: &[MetricsReport]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let file = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(file, reports)
}

pub fn render_table(reports: &[MetricsReport]) -> String {
    let columns = columns(reports);
    let rows: Vec<Vec<String>> = reports
        .iter()
        .map(|r| {
            row(r, &columns)
                .into_iter()
                .zip(&columns)
                .map(|(cell, col)| match r.metrics.get(col) {
                    Some(v) if col != "total_queries" => format!("{v:.4}"),
                    _ => cell,
                })
                .collect()
        })
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            rows.iter()
                .map(|r| r[i].len())
                .chain([col.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    out.push_str(&line(columns.as_slice()));
    out.push('\n');
    for r in &rows {
        out.push_str(&line(r.as_slice()));
        out.push('\n');
    }
    out
}
