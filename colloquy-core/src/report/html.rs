//! Static HTML rendering of an aggregate report
//!
//! Produces one self-contained page: a summary header, a failed-only filter,
//! and a collapsible card per test with its turns, rendered images, criteria,
//! and assertion outcomes. Image paths are probed against the results
//! directory; a missing file gets a placeholder in the turn and a line in
//! the missing-images section instead of a broken tag.

use std::path::Path;

use crate::record::RecordedEvent;

use super::aggregate::{AggregateReport, TestReport};
use super::turns::TurnRecord;

const STYLE: &str = r#"
    body {
      font-family: system-ui, -apple-system, sans-serif;
      margin: 0;
      padding: 20px;
      background: #f9f9f9;
    }
    h1 { margin-top: 0; }
    .summary { margin-bottom: 12px; }
    .controls { margin-bottom: 20px; }
    .controls label { font-size: 13px; display: inline-flex; gap: 8px; align-items: center; }
    details {
      background: #fff;
      border-radius: 8px;
      margin-bottom: 12px;
      box-shadow: 0 2px 4px rgba(0,0,0,0.08);
    }
    summary {
      cursor: pointer;
      padding: 12px 16px;
      display: flex;
      justify-content: space-between;
      background: #fafafa;
    }
    .test-failed > summary {
      background: #fff1f0;
      border-left: 4px solid #c62828;
    }
    .test-badge {
      font-size: 11px;
      text-transform: uppercase;
      letter-spacing: 0.04em;
      padding: 2px 6px;
      border-radius: 999px;
      font-weight: 600;
    }
    .test-badge-failed { color: #b71c1c; background: #ffebee; }
    .test-body { padding: 16px; }
    .script-error { background: #fff1f0; border: 1px solid #ef9a9a; padding: 8px; border-radius: 4px; margin-bottom: 12px; }
    .turn { border: 1px solid #e0e0e0; padding: 12px; border-radius: 6px; margin-bottom: 12px; }
    .turn-header { font-weight: 600; margin-bottom: 8px; }
    .turn-body { display: flex; flex-direction: column; gap: 12px; }
    .turn-image img { max-width: 100%; border: 1px solid #ddd; border-radius: 4px; }
    .image-placeholder {
      border: 1px dashed #ccc;
      border-radius: 4px;
      padding: 24px;
      text-align: center;
      color: #999;
      font-size: 12px;
    }
    .image-path { font-size: 11px; color: #666; margin-top: 6px; word-break: break-all; }
    .section-label { font-size: 12px; font-weight: 600; text-transform: uppercase; letter-spacing: 0.04em; color: #4a4a4a; margin-bottom: 6px; }
    .turn-prompt pre { background: #f5f5f5; padding: 8px; border-radius: 4px; margin: 0; }
    .criteria-list { margin: 0; padding-left: 20px; }
    .no-criteria { font-size: 12px; color: #666; padding: 8px; border: 1px dashed #ccc; border-radius: 4px; }
    .assertion {
      border: 1px solid #e0e0e0;
      padding: 8px;
      border-radius: 4px;
      margin-bottom: 8px;
    }
    .assertion.pass { border-left: 4px solid #2e7d32; }
    .assertion.fail { border-left: 4px solid #c62828; }
    .assertion-values { margin-top: 4px; color: #4a4a4a; font-size: 12px; }
    .assertion-error { margin-top: 4px; color: #c62828; font-size: 12px; }
    .d2-details summary, .tool-details summary { cursor: pointer; font-size: 12px; }
    .missing-section { background: #fff3e0; border: 1px solid #ffcc80; padding: 10px; border-radius: 6px; margin-bottom: 16px; font-size: 12px; }
    pre { white-space: pre-wrap; }
    body.filter-failed details.test-card[data-failed="false"] { display: none; }
"#;

const FILTER_SCRIPT: &str = r#"
    const filter = document.getElementById("filter-failed");
    if (filter) {
      filter.addEventListener("change", () => {
        document.body.classList.toggle("filter-failed", filter.checked);
      });
    }
"#;

fn esc(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

/// Render the report as one self-contained HTML page.
///
/// `results_dir` is where rendered turn images are expected; each turn's
/// `pngPath` is resolved against it to decide between an image tag and a
/// placeholder.
pub fn render_html(report: &AggregateReport, results_dir: &Path) -> String {
    let mut missing: Vec<String> = Vec::new();
    let cards: String = report
        .tests
        .iter()
        .map(|test| render_test(test, results_dir, &mut missing))
        .collect();

    let scenarios = report.scenarios();
    let scenario_passed = scenarios.iter().filter(|s| s.passed).count();
    let summary = &report.summary;

    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n  <title>Agent Evaluation Report</title>\n  <style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n  <h1>Agent Evaluation Report</h1>\n");

    html.push_str(&format!(
        "  <div class=\"summary\">\n    <div>Total tests: {}</div>\n    <div>Scenario success rate: {}/{} ({:.1}%)</div>\n    <div>Test success rate: {}/{} ({:.1}%)</div>\n    <div>Assertion success rate: {}/{} ({:.1}%)</div>\n    <div>Total turns: {}</div>\n    <div>Generated {} (run {})</div>\n  </div>\n",
        summary.total_tests,
        scenario_passed,
        scenarios.len(),
        rate(scenario_passed, scenarios.len()),
        summary.passed_tests,
        summary.total_tests,
        rate(summary.passed_tests, summary.total_tests),
        summary.passed_assertions,
        summary.total_assertions,
        rate(summary.passed_assertions, summary.total_assertions),
        summary.total_turns,
        esc(&report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        esc(&report.run_id),
    ));

    html.push_str(
        "  <div class=\"controls\">\n    <label><input type=\"checkbox\" id=\"filter-failed\"> Show only failed tests</label>\n  </div>\n",
    );

    if !missing.is_empty() {
        let items: String = missing
            .iter()
            .map(|path| format!("<li>{}</li>", esc(path)))
            .collect();
        html.push_str(&format!(
            "  <div class='missing-section'><strong>Missing images:</strong><ul>{items}</ul></div>\n"
        ));
    }

    html.push_str(&cards);
    html.push_str("  <script>");
    html.push_str(FILTER_SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn render_test(test: &TestReport, results_dir: &Path, missing: &mut Vec<String>) -> String {
    let failed_class = if test.passed { "" } else { " test-failed" };
    let badge = if test.passed {
        ""
    } else {
        "<span class='test-badge test-badge-failed'>Failed</span>"
    };

    let error_block = test
        .error
        .as_ref()
        .map(|error| {
            format!(
                "<div class=\"script-error\"><div class=\"section-label\">Error</div><pre>{}</pre></div>\n",
                esc(error)
            )
        })
        .unwrap_or_default();

    let turn_blocks: String = test
        .turns
        .iter()
        .map(|turn| render_turn(turn, results_dir, missing))
        .collect();

    format!(
        "<details class=\"test-card{failed_class}\" data-failed=\"{}\">\n  <summary>\n    <span>{}</span>\n    {badge}\n  </summary>\n  <div class=\"test-body\">\n{error_block}{turn_blocks}{}\n  </div>\n</details>\n",
        !test.passed,
        esc(&test.full_name),
        render_assertions(test),
    )
}

fn render_turn(turn: &TurnRecord, results_dir: &Path, missing: &mut Vec<String>) -> String {
    let image_block = match &turn.png_path {
        Some(path) => {
            let candidate = results_dir.join(path.trim_start_matches("./"));
            if candidate.exists() {
                format!(
                    "<div class=\"turn-image\"><img src=\"{0}\" alt=\"Turn rendering\" onerror=\"this.style.display='none'\"><div class=\"image-path\">{0}</div></div>\n",
                    esc(path)
                )
            } else {
                missing.push(path.clone());
                format!(
                    "<div class=\"turn-image\"><div class=\"image-placeholder\">Image not rendered</div><div class=\"image-path\">{}</div></div>\n",
                    esc(path)
                )
            }
        }
        None => String::new(),
    };

    let criteria_block = if turn.criteria.is_empty() {
        "<div class='no-criteria'>No criteria defined for this turn.</div>".to_string()
    } else {
        let items: String = turn
            .criteria
            .iter()
            .map(|criterion| format!("<li>{}</li>", esc(criterion)))
            .collect();
        format!("<ul class=\"criteria-list\">{items}</ul>")
    };

    let tool_lines: Vec<String> = turn
        .turn_events
        .iter()
        .filter_map(|record| match &record.event {
            RecordedEvent::ToolCall { tool_name, args } => Some(format!(
                "{tool_name}({})",
                serde_json::to_string(args).unwrap_or_default()
            )),
            RecordedEvent::ToolResult { tool_name, result } => Some(format!(
                "{tool_name} returned {}",
                serde_json::to_string(result).unwrap_or_default()
            )),
            _ => None,
        })
        .collect();
    let tool_block = if tool_lines.is_empty() {
        String::new()
    } else {
        format!(
            "<details class=\"tool-details\"><summary>Tool activity</summary><pre>{}</pre></details>\n",
            esc(&tool_lines.join("\n"))
        )
    };

    format!(
        "<div class=\"turn\">\n  <div class=\"turn-header\">Turn {}</div>\n  <div class=\"turn-body\">\n    <div class=\"turn-prompt\">\n      <div class=\"section-label\">User prompt</div>\n      <pre>{}</pre>\n    </div>\n    {image_block}    <details class=\"d2-details\">\n      <summary>Show D2</summary>\n      <pre>{}</pre>\n    </details>\n    {tool_block}    <div class=\"turn-criteria\">\n      <div class=\"section-label\">Criteria</div>\n      {criteria_block}\n    </div>\n  </div>\n</div>\n",
        turn.turn_index,
        esc(&turn.prompt),
        esc(turn.d2_content.as_deref().unwrap_or("")),
    )
}

fn render_assertions(test: &TestReport) -> String {
    let items: String = test
        .events
        .iter()
        .filter_map(|record| match &record.event {
            RecordedEvent::Assertion {
                passed,
                matcher,
                actual,
                expected,
                description,
                error,
            } => {
                let status = if *passed { "pass" } else { "fail" };
                let label = description.clone().unwrap_or_else(|| matcher.clone());
                let values = format!(
                    "{} expected {}, actual {}",
                    matcher,
                    serde_json::to_string(expected).unwrap_or_default(),
                    serde_json::to_string(actual).unwrap_or_default(),
                );
                let error_line = error
                    .as_ref()
                    .map(|e| format!("<div class=\"assertion-error\">{}</div>", esc(e)))
                    .unwrap_or_default();
                Some(format!(
                    "<div class=\"assertion {status}\"><div>{}</div><div class=\"assertion-values\">{}</div>{error_line}</div>",
                    esc(&label),
                    esc(&values),
                ))
            }
            _ => None,
        })
        .collect();

    if items.is_empty() {
        String::new()
    } else {
        format!(
            "<div class=\"assertions\">\n  <div class=\"section-label\">Assertions</div>\n  {items}\n</div>"
        )
    }
}
