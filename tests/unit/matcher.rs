#[cfg(test)]
mod tests {
    use super::super::*;

    const THRESHOLD: f64 = 0.2;

    fn spans(mres: &MatchResult) -> Vec<(i32, usize, usize)> {
        mres.elems()
            .iter()
            .map(|m| (m.dist, m.beg, m.end))
            .collect()
    }

    fn matched(p: &str, s: &str) -> MatchResult {
        let mut mres = fast_match(p, s, THRESHOLD);
        mres.clear_invalid(5);
        mres
    }

    fn matched_reverse(s: &str, p: &str) -> MatchResult {
        let mut mres = fast_match_reverse(s, p, THRESHOLD);
        mres.clear_invalid(5);
        mres
    }

    #[test]
    fn exact_occurrence_matches_at_zero_cost() {
        assert_eq!(spans(&matched("hello", "hello")), vec![(0, 0, 5)]);
        assert_eq!(
            spans(&matched("hello", "aaaaahellobbbbbbbbbbbbbb")),
            vec![(0, 5, 10)]
        );
    }

    #[test]
    fn every_occurrence_is_reported() {
        assert_eq!(
            spans(&matched("hello", "helloworldhello")),
            vec![(0, 0, 5), (0, 10, 15)]
        );
    }

    #[test]
    fn occurrence_over_the_cost_ceiling_is_dropped() {
        assert!(!matched("ahello", "zzzhallozzz").has_matches());
    }

    #[test]
    fn ascii_matching_ignores_case() {
        assert_eq!(
            spans(&matched("lowerCaseStuff", "this string has LOWERCASESTUFF")),
            vec![(0, 16, 30)]
        );
    }

    #[test]
    fn injected_payload_matches_inside_larger_script() {
        assert_eq!(
            spans(&matched(
                "abc'; alert('xss'); //",
                "var q = 'abc'; alert('xss'); //';"
            )),
            vec![(0, 9, 31)]
        );
    }

    #[test]
    fn exact_match_script_is_all_keeps() {
        let mres = matched("hello", "aaaaahellobbbbbbbbbbbbbb");
        let ops = &mres.elems()[0].ops;
        assert_eq!(ops.len(), 5);
        assert!(ops.iter().all(|&op| op == EditOp::Keep));
    }

    #[test]
    fn empty_or_oversized_pattern_never_matches() {
        assert!(!matched("", "some text").has_matches());
        assert!(!matched("a longer pattern", "short").has_matches());
    }

    #[test]
    fn non_ascii_text_matches_exactly() {
        let mres = matched("您好世界您好世界您好世界", "您好世界您好世界您好世界");
        assert_eq!(mres.best_dist(), 0);
        assert!(mres.has_matches());
    }

    #[test]
    fn non_ascii_substitution_costs_like_ascii() {
        let mres = matched("您好世界您好世界您好世界", "您好a界您好世界您好世界");
        assert_eq!(mres.best_dist(), 30);
    }

    #[test]
    fn non_ascii_insertions_cost_like_ascii() {
        let mres = matched("您好世界您好世界世界", "您好世界您好世界您好世界");
        assert_eq!(mres.best_dist(), 40);
    }

    #[test]
    fn reverse_match_reports_spans_in_content_coordinates() {
        assert_eq!(
            spans(&matched_reverse(
                "<script>alert('xss')</script>",
                "alert('xss');"
            )),
            vec![(20, 0, 12)]
        );
        assert_eq!(
            spans(&matched_reverse(
                "<script>alert('xss')</script>",
                "bbalert('xss')a"
            )),
            vec![(60, 2, 14)]
        );
        assert_eq!(
            spans(&matched_reverse(
                "<script>alert('xss')</script>",
                "blert('xss']"
            )),
            vec![(40, 1, 11)]
        );
    }

    #[test]
    fn reverse_match_tolerates_sanitized_quotes() {
        assert_eq!(
            spans(&matched_reverse(
                "<script>alert(\"xss attack\");</script>",
                "alert('xss attack');"
            )),
            vec![(60, 0, 20)]
        );
    }

    #[test]
    fn reverse_cost_equals_forward_cost() {
        let s = "<script>alert('xss')</script>";
        let p = "alert('xss');";
        assert_eq!(
            fast_match_reverse(s, p, THRESHOLD).best_dist(),
            fast_match(p, s, THRESHOLD).best_dist()
        );
    }

    #[test]
    fn clear_invalid_enforces_minimum_length() {
        let mut mres = fast_match("hello", "helloworldhello", THRESHOLD);
        mres.clear_invalid(6);
        assert!(!mres.has_matches());
    }

    // One exact occurrence and one single-substitution variant. A tight
    // threshold hides the variant from the prefilter, the default one
    // rejects it in the acceptance band, a loose one reports both.
    #[test]
    fn threshold_widens_the_accepted_band() {
        let p = "helloworld";
        let s = "xxxxxxxxxxhelloworldxxxxxxxxxxhell0worldxxxxxxxxxx";

        let mut tight = fast_match(p, s, 0.05);
        tight.clear_invalid(5);
        assert_eq!(spans(&tight), vec![(0, 10, 20)]);

        let mut default = fast_match(p, s, THRESHOLD);
        default.clear_invalid(5);
        assert_eq!(spans(&default), vec![(0, 10, 20)]);

        let mut loose = fast_match(p, s, 0.4);
        loose.clear_invalid(5);
        assert_eq!(spans(&loose), vec![(0, 10, 20), (30, 30, 40)]);
    }
}
