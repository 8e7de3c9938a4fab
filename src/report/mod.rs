//! Reporting sinks for the outcomes of a pass
//!
//! Sinks only read the reports; a sink failure never changes the pass.

pub mod console;
pub mod discord;

use crate::update::outcome::UpdateReport;

pub const SUMMARY_TITLE: &str = "AutoUpdate - Scan Summary";

/// Number of targets that were replaced during the pass
pub fn updates_found(reports: &[UpdateReport]) -> usize {
    reports.iter().filter(|r| r.outcome.is_updated()).count()
}

/// "update" or "updates" for `count`
pub fn update_noun(count: usize) -> &'static str {
    if count == 1 { "update" } else { "updates" }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "updates")]
    #[case(1, "update")]
    #[case(2, "updates")]
    fn update_noun_pluralizes(#[case] count: usize, #[case] expected: &str) {
        assert_eq!(update_noun(count), expected);
    }

    #[test]
    fn updates_found_counts_only_updated() {
        let reports = vec![
            updated("Alpha", "1.0", "1.1"),
            up_to_date("Beta", "2.0"),
            updated("Gamma", "0.1", "0.2"),
        ];

        assert_eq!(updates_found(&reports), 2);
    }
}
