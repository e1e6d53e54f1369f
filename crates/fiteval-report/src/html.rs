//! HTML report generator.
//!
//! Produces self-contained HTML files with all CSS/JS inlined: one for a
//! single evaluation summary, one for a participant's progress history.

use anyhow::{Context, Result};
use std::path::Path;

use fiteval_core::model::{Category, EvaluationSummary};
use fiteval_core::statistics::ProgressHistory;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn open_document(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

fn close_document(html: &mut String) {
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");
    html.push_str("</body>\n</html>");
}

fn score_class(score: u8) -> &'static str {
    if score >= 80 {
        "good"
    } else if score >= 50 {
        "fair"
    } else {
        "poor"
    }
}

/// Generate an HTML page for one evaluation.
pub fn generate_summary_html(summary: &EvaluationSummary) -> String {
    let mut html = String::new();
    let who = summary
        .participant_id
        .as_deref()
        .unwrap_or("anonymous participant");
    open_document(&mut html, &format!("fiteval summary — {who}"));

    html.push_str("<header>\n");
    html.push_str("<h1>Fitness evaluation</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Participant: <strong>{}</strong> | {} | evaluation {}</p>\n",
        html_escape(who),
        summary.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.id
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"dashboard\">\n");
    html.push_str(&format!(
        "<p class=\"overall {}\">Overall <span>{}</span></p>\n",
        score_class(summary.overall),
        summary.overall
    ));
    if !summary.bmi.is_empty() {
        let band = summary
            .bmi_category
            .map(|c| format!(" ({c})"))
            .unwrap_or_default();
        html.push_str(&format!(
            "<p class=\"meta\">BMI: <strong>{}</strong>{}</p>\n",
            html_escape(&summary.bmi),
            band
        ));
    }
    let bars: Vec<(String, u8)> = Category::ALL
        .iter()
        .map(|c| (c.to_string(), summary.score(*c)))
        .collect();
    html.push_str(&generate_bar_chart(&bars));
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Results</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Category</th><th onclick=\"sortTable(1)\">Raw value</th><th onclick=\"sortTable(2)\">Score</th><th onclick=\"sortTable(3)\">Recorded</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for r in &summary.results {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{:.2}</td><td class=\"{}\">{}</td><td>{}</td></tr>\n",
            r.category(),
            r.raw_value(),
            score_class(r.score()),
            r.score(),
            r.timestamp().format("%H:%M:%S")
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(summary).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    close_document(&mut html);
    html
}

/// Generate an HTML page for a progress history.
pub fn generate_progress_html(history: &ProgressHistory) -> String {
    let mut html = String::new();
    let who = history
        .participant_id()
        .unwrap_or("anonymous participant");
    open_document(&mut html, &format!("fiteval progress — {who}"));

    html.push_str("<header>\n");
    html.push_str("<h1>Progress</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Participant: <strong>{}</strong> | {} evaluation(s)</p>\n",
        html_escape(who),
        history.len()
    ));
    html.push_str("</header>\n");

    let averages = history.averages();
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Averages</h2>\n");
    html.push_str(&format!(
        "<p class=\"overall {}\">General <span>{}</span></p>\n",
        score_class(averages.general),
        averages.general
    ));
    let bars: Vec<(String, u8)> = Category::ALL
        .iter()
        .map(|c| {
            let trend = history.trend(*c);
            (format!("{c} ({trend:+})"), averages.score(*c))
        })
        .collect();
    html.push_str(&generate_bar_chart(&bars));
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>History</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Date</th><th onclick=\"sortTable(1)\">Strength</th><th onclick=\"sortTable(2)\">Speed</th><th onclick=\"sortTable(3)\">Flexibility</th><th onclick=\"sortTable(4)\">Resistance</th><th onclick=\"sortTable(5)\">Overall</th><th onclick=\"sortTable(6)\">BMI</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for e in history.entries() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}</td></tr>\n",
            e.date,
            e.strength,
            e.speed,
            e.flexibility,
            e.resistance,
            score_class(e.overall()),
            e.overall(),
            html_escape(&e.bmi)
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    close_document(&mut html);
    html
}

fn write_file(html: String, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

/// Write an evaluation summary page to a file.
pub fn write_summary_html(summary: &EvaluationSummary, path: &Path) -> Result<()> {
    write_file(generate_summary_html(summary), path)
}

/// Write a progress page to a file.
pub fn write_progress_html(history: &ProgressHistory, path: &Path) -> Result<()> {
    write_file(generate_progress_html(history), path)
}

/// Horizontal bars for 0–100 scores.
fn generate_bar_chart(bars: &[(String, u8)]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = bars.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (label, score)) in bars.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = *score as usize * max_width / 100;

        let color = if *score >= 80 {
            "#22c55e"
        } else if *score >= 50 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            score
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --good: #dcfce7; --fair: #fef9c3; --poor: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --good: #064e3b; --fair: #713f12; --poor: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.overall { font-size: 1.5rem; padding: 0.5rem 1rem; border-radius: 8px; display: inline-block; }
.overall span { font-weight: bold; margin-left: 0.5rem; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.good { background: var(--good); }
.fair { background: var(--fair); }
.poor { background: var(--poor); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
