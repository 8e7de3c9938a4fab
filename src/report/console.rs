//! Boxed plain-text summary of a pass

use crate::config::SUMMARY_WIDTH;
use crate::report::{SUMMARY_TITLE, update_noun, updates_found};
use crate::update::outcome::{UpdateOutcome, UpdateReport};

const LEFT_PADDING: usize = 1;

/// Render the summary box, one string per output line
pub fn render_summary(reports: &[UpdateReport]) -> Vec<String> {
    let width = SUMMARY_WIDTH;
    let rule = "═".repeat(width);
    let mut lines = vec![format!("╔{}╗", rule), title_line(width)];
    lines.push(format!("╠{}╣", rule));

    if reports.is_empty() {
        lines.extend(wrap_line("No plugins were configured for auto-update.", width));
    } else {
        for report in reports {
            lines.extend(wrap_line(&report_line(report), width));
        }
    }

    lines.push(format!("╠{}╣", rule));
    let count = updates_found(reports);
    let footer = if count > 0 {
        format!(
            "Found {} {}. A FULL SERVER RESTART is required to apply changes.",
            count,
            update_noun(count)
        )
    } else {
        "No new updates found. Everything is up to date.".to_string()
    };
    lines.extend(wrap_line(&footer, width));
    lines.push(format!("╚{}╝", rule));
    lines
}

fn title_line(width: usize) -> String {
    let title_len = SUMMARY_TITLE.chars().count();
    let left = width.saturating_sub(title_len) / 2;
    let right = width.saturating_sub(title_len + left);
    format!("║{}{}{}║", " ".repeat(left), SUMMARY_TITLE, " ".repeat(right))
}

fn report_line(report: &UpdateReport) -> String {
    let marker = match report.outcome {
        UpdateOutcome::Updated { .. } => "[↑]",
        UpdateOutcome::UpToDate { .. } => "[✓]",
        _ => "[X]",
    };
    format!(
        "{} {} [{}]: {}",
        marker,
        report.name,
        report.origin.as_str(),
        report.outcome
    )
}

/// Greedy word wrap into boxed lines; a single overlong word is kept whole
fn wrap_line(text: &str, width: usize) -> Vec<String> {
    let text_width = width - LEFT_PADDING - 1;
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split(' ') {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + word_len + 1 > text_width {
            lines.push(boxed(&current, current_len, text_width));
            current.clear();
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if current_len > 0 {
        lines.push(boxed(&current, current_len, text_width));
    }
    lines
}

fn boxed(text: &str, len: usize, text_width: usize) -> String {
    format!(
        "║{}{}{} ║",
        " ".repeat(LEFT_PADDING),
        text,
        " ".repeat(text_width.saturating_sub(len))
    )
}
