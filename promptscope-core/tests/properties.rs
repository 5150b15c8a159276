//! Property-based tests for the metrics calculator using proptest

use proptest::prelude::*;
use promptscope::{Metric, MetricsCalculator, ScoreRecord};

// =========================================================================
// Text generation strategies
// =========================================================================

/// Fragments that trigger most of the scoring rules
fn arb_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ,.!?]{0,40}",
        Just("# Heading\n".to_string()),
        Just("- bullet item\n".to_string()),
        Just("\n\n".to_string()),
        Just("```javascript\nconst x = f();\ntry { x(); } catch (e) {}\n```".to_string()),
        Just("`inline()`".to_string()),
        Just("Finally, the server is ready. ".to_string()),
        Just("However, for example, 42ms [1] ".to_string()),
        Just("The api means a contract. ".to_string()),
    ]
}

fn arb_markdown() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_fragment(), 0..12).prop_map(|parts| parts.concat())
}

fn assert_bounded(record: &ScoreRecord) {
    for (metric, score) in record.iter() {
        let score = score.unwrap_or_else(|| panic!("{} missing", metric));
        assert!(score.is_finite(), "{} not finite", metric);
        assert!((0.0..=1.0).contains(&score), "{} out of range: {}", metric, score);
    }
}

// =========================================================================
// Properties
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn scores_are_bounded_for_any_text(text in any::<String>()) {
        let record = MetricsCalculator::new().calculate(&text);
        assert_bounded(&record);
    }

    #[test]
    fn scores_are_bounded_for_markdown(text in arb_markdown()) {
        let record = MetricsCalculator::new().calculate(&text);
        assert_bounded(&record);
    }

    #[test]
    fn scoring_is_deterministic(text in arb_markdown()) {
        let calc = MetricsCalculator::new();
        let first = calc.calculate(&text);
        prop_assert_eq!(first, calc.calculate(&text));
        prop_assert_eq!(first, calc.calculate_concurrent(&text));
    }

    #[test]
    fn single_metric_matches_record(text in arb_markdown()) {
        let calc = MetricsCalculator::new();
        let record = calc.calculate(&text);
        for metric in Metric::ALL {
            prop_assert_eq!(Some(calc.score_metric(metric, &text)), record.get(metric));
        }
    }

    #[test]
    fn bytes_match_text_when_valid(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let calc = MetricsCalculator::new();
        let record = calc.calculate_bytes(&bytes);
        match std::str::from_utf8(&bytes) {
            Ok(text) => prop_assert_eq!(record, calc.calculate(text)),
            Err(_) => prop_assert!(record.is_null()),
        }
    }

    #[test]
    fn records_survive_json(text in arb_markdown()) {
        let record = MetricsCalculator::new().calculate(&text);
        let json = serde_json::to_string(&record).unwrap();
        let back: ScoreRecord = serde_json::from_str(&json).unwrap();
        for metric in Metric::ALL {
            let (a, b) = (record.get(metric).unwrap(), back.get(metric).unwrap());
            prop_assert!((a - b).abs() < 1e-3);
        }
        prop_assert_eq!(record, back);
    }
}
