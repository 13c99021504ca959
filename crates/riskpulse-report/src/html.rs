//! HTML report generation
//!
//! Generates a single self-contained HTML document with embedded CSS.
//! No decision logic lives here: rows and alerts arrive already scored.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use riskpulse_core::{Band, ScoreResult, MAX_SCORE};

/// Number of rows listed under "Top Risky Files".
pub const TOP_FILES: usize = 10;

/// Everything needed to render one report.
pub struct Report<'a> {
    /// Heading label, usually `owner/name`.
    pub title: &'a str,
    /// Shown under the heading.
    pub generated_at: DateTime<Utc>,
    /// Every scored file, in scoring order.
    pub rows: &'a [ScoreResult],
    /// Paths that were critical two runs in a row.
    pub alerts: &'a [String],
}

/// Render a report as a complete HTML document.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use riskpulse_core::{Band, ScoreResult};
/// use riskpulse_report::html::{render_html, Report};
///
/// let rows = vec![ScoreResult {
///     path: "src/auth/login.rs".into(),
///     score: 5,
///     band: Band::Critical,
///     reasons: vec!["High churn".into()],
/// }];
/// let alerts = vec!["src/auth/login.rs".to_string()];
/// let html = render_html(&Report {
///     title: "octocat/hello",
///     generated_at: Utc::now(),
///     rows: &rows,
///     alerts: &alerts,
/// });
/// assert!(html.starts_with("<!doctype html>"));
/// assert!(html.contains("score 5/6 (critical)"));
/// ```
pub fn render_html(report: &Report<'_>) -> String {
    let title = escape(report.title);
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Risk Report – {title}</title>
  <style>{css}</style>
</head>
<body>
  <h1>Risk Report – {title}</h1>
  <p class="meta">Generated {generated}</p>
{summary}
{alerts}
  <h2>Top Risky Files</h2>
{top}
</body>
</html>
"#,
        css = inline_css(),
        generated = report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        summary = render_summary(report),
        alerts = render_alerts(report.alerts),
        top = render_top(report.rows),
    )
}

/// Count rows per band.
pub fn band_counts(rows: &[ScoreResult]) -> [(Band, usize); 4] {
    Band::ALL.map(|band| (band, rows.iter().filter(|r| r.band == band).count()))
}

/// Highest-scoring rows; equal scores keep their input order.
pub fn top_rows(rows: &[ScoreResult], limit: usize) -> Vec<&ScoreResult> {
    let mut ranked: Vec<&ScoreResult> = rows.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(limit);
    ranked
}

fn render_summary(report: &Report<'_>) -> String {
    let mut out = String::from("  <h2>Summary</h2>\n  <ul>\n");
    let _ = writeln!(out, "    <li>Files analyzed: {}</li>", report.rows.len());
    for (band, count) in band_counts(report.rows).into_iter().rev() {
        let _ = writeln!(out, "    <li>{}: {count}</li>", capitalize(band.as_str()));
    }
    let _ = writeln!(out, "    <li>Alerts triggered: {}</li>", report.alerts.len());
    out.push_str("  </ul>");
    out
}

fn render_alerts(alerts: &[String]) -> String {
    alerts
        .iter()
        .map(|path| {
            format!(
                "  <div class=\"alert\">Alert: <strong>{}</strong> – critical two runs in a row, review recommended</div>\n",
                escape(path)
            )
        })
        .collect()
}

fn render_top(rows: &[ScoreResult]) -> String {
    let mut out = String::new();
    for row in top_rows(rows, TOP_FILES) {
        let reasons: Vec<String> = row.reasons.iter().map(|r| escape(r)).collect();
        let _ = write!(
            out,
            r#"  <div class="card {band}">
    <strong>{path}</strong> – score {score}/{max} ({band})
    <div class="reasons">{reasons}</div>
  </div>
"#,
            band = row.band,
            path = escape(&row.path),
            score = row.score,
            max = MAX_SCORE,
            reasons = reasons.join(", "),
        );
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn inline_css() -> &'static str {
    r#"
    body { font-family: system-ui, sans-serif; margin: 2rem; }
    .meta { color: #6b7280; }
    .card { border: 1px solid #ddd; border-radius: 6px; padding: 1rem; margin-bottom: 1rem; }
    .critical { border-left: 6px solid #d73a49; }
    .high { border-left: 6px solid #e36209; }
    .watch { border-left: 6px solid #dbab09; }
    .reasons { color: #555; font-size: 0.9rem; }
    .alert { background: #fff5f5; border: 1px solid #fdb8c0; padding: 0.8rem; border-radius: 4px; margin-bottom: 0.5rem; }
  "#
}
