use crate::cli::SummaryLength;

/// Word budget for a tier: the lesser of the tier ceiling and its share of the source.
///
/// The share rounds up, so any non-empty text keeps at least one word
/// (15 words at the short tier give 2).
pub fn target_length(total_words: usize, tier: SummaryLength) -> usize {
    tier.ceiling().min(total_words.div_ceil(tier.divisor()))
}

/// Extractive summary: the first N words, with `...` appended when truncated
pub fn summarize_text(text: &str, tier: SummaryLength) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let target = target_length(words.len(), tier);

    let mut summary = words[..target].join(" ");
    if words.len() > target {
        summary.push_str("...");
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn word_count(text: &str) -> usize {
        text.split_whitespace().count()
    }

    #[test]
    fn test_thousand_words_bounded_by_fraction() {
        let text = words(1000);
        assert_eq!(word_count(&summarize_text(&text, SummaryLength::Short)), 100);
        assert_eq!(word_count(&summarize_text(&text, SummaryLength::Medium)), 250);
        assert_eq!(word_count(&summarize_text(&text, SummaryLength::Long)), 500);
    }

    #[test]
    fn test_long_text_bounded_by_ceiling() {
        let text = words(10_000);
        assert_eq!(word_count(&summarize_text(&text, SummaryLength::Short)), 100);
        assert_eq!(word_count(&summarize_text(&text, SummaryLength::Medium)), 300);
        assert_eq!(word_count(&summarize_text(&text, SummaryLength::Long)), 600);
    }

    #[test]
    fn test_budget_never_exceeds_either_bound() {
        for total in [0, 1, 3, 9, 11, 37, 399, 1001, 2403] {
            for tier in [SummaryLength::Short, SummaryLength::Medium, SummaryLength::Long] {
                let summary = summarize_text(&words(total), tier);
                let count = word_count(&summary);
                assert!(count <= tier.ceiling());
                assert!(count <= total.div_ceil(tier.divisor()));
            }
        }
    }

    #[test]
    fn test_truncation_appends_ellipsis() {
        let summary = summarize_text("one two three four five six seven eight nine ten eleven", SummaryLength::Short);
        assert_eq!(summary, "one two...");
    }

    #[test]
    fn test_text_within_budget_has_no_ellipsis() {
        assert_eq!(summarize_text("hello", SummaryLength::Long), "hello");
        assert_eq!(summarize_text("", SummaryLength::Medium), "");
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let summary = summarize_text("alpha\n beta\tgamma  delta", SummaryLength::Long);
        assert_eq!(summary, "alpha beta...");
    }

    #[test]
    fn test_share_rounds_up() {
        assert_eq!(target_length(15, SummaryLength::Short), 2);
        assert_eq!(target_length(5, SummaryLength::Short), 1);
        assert_eq!(summarize_text(&words(15), SummaryLength::Short), "word word...");
    }
}
