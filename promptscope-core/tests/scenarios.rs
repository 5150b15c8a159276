//! End-to-end scoring scenarios through the public API

use promptscope::{
    AccuracyAnalyzer, CoherenceAnalyzer, Metric, MetricsCalculator, RelevancyAnalyzer,
    ScoreRecord, TextAnalyzer,
};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

// =========================================================================
// Fixed inputs
// =========================================================================

#[test]
fn test_code_answer_scores_accuracy() {
    let text = "Here's how to implement this: ```javascript\nfunction add(a,b){return a+b;} // adds\n```";
    let record = MetricsCalculator::new().calculate(text);

    let accuracy = record.accuracy_score.unwrap();
    assert!(accuracy > 0.3, "accuracy was {}", accuracy);
    // "function" term, the fence read as an inline span, and a block with
    // language tag, keyword and comment
    assert_close(accuracy, 0.55);
}

#[test]
fn test_empty_text_is_all_zero() {
    let record = MetricsCalculator::new().calculate("");
    assert_eq!(record, ScoreRecord::zeroed());
    assert_eq!(record.composite(), Some(0.0));
}

#[test]
fn test_related_paragraphs_are_coherent() {
    let text = "The cache keeps recent data in memory.\n\nHowever, the cache can grow too large.";
    let coherence = MetricsCalculator::new().score_metric(Metric::Coherence, text);
    assert!(coherence > 0.5, "coherence was {}", coherence);
    assert_close(coherence, 0.6);
}

#[test]
fn test_structured_markdown_relevancy() {
    let text = "# Setup\n\n- install the crate\n- run it\n\n```rust\nfn main() {}\n```";
    let relevancy = RelevancyAnalyzer.analyze(text);
    // structure component is 0.8 and carries a weight of 0.3
    assert!(relevancy >= 0.8 * 0.3);
    assert_close(relevancy, 0.53);
}

#[test]
fn test_all_fields_present_for_text() {
    let record = promptscope::calculate("plain words");
    assert!(record.is_complete());
    assert_close(record.accuracy_score.unwrap(), 0.0);
    assert_close(record.relevancy_score.unwrap(), 0.27);
    assert_close(record.coherence_score.unwrap(), 0.27);
    assert_close(record.completeness_score.unwrap(), 0.32);
}

// =========================================================================
// Absent and malformed input
// =========================================================================

#[test]
fn test_absent_text_is_null() {
    let calc = MetricsCalculator::new();
    let record = calc.calculate_optional(None);
    assert!(record.is_null());
    assert_eq!(record.composite(), None);

    let json = serde_json::to_value(record).unwrap();
    for metric in Metric::ALL {
        assert!(json[metric.column()].is_null());
    }
}

#[test]
fn test_non_utf8_bytes_are_null() {
    let calc = MetricsCalculator::new();
    assert!(calc.calculate_bytes(b"caf\xe9 au lait").is_null());
    assert!(calc.calculate_bytes(b"").is_complete());
}

// =========================================================================
// Behavioural checks
// =========================================================================

#[test]
fn test_code_block_does_not_lower_accuracy() {
    let plain = "The server returns data.";
    let with_code = format!(
        "{}\n\n```javascript\nconst data = fetch(url);\ntry {{ parse(data); }} catch (e) {{ /* ignore */ }}\n```",
        plain
    );

    let before = AccuracyAnalyzer.analyze(plain);
    let after = AccuracyAnalyzer.analyze(&with_code);
    assert!(after >= before, "{} < {}", after, before);
    assert_close(before, 0.05);
    assert_close(after, 0.65);
}

#[test]
fn test_scoring_is_idempotent() {
    let calc = MetricsCalculator::new();
    let text = "First, open the file.\n\n## Details\n\nThe api is simple: call `open()` then `read()`.\n\nFinally, close it.";
    let first = calc.calculate(text);
    let second = calc.calculate(text);
    assert_eq!(first, second);
    assert_eq!(calc.calculate_concurrent(text), first);
}

#[test]
fn test_concurrent_callers_agree() {
    let calc = MetricsCalculator::new();
    let text = "However, the client retries.\n\nThen the server responds with data.";
    let expected = calc.calculate(text);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| calc.calculate(text))).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_analyzers_are_independent_of_order() {
    let calc = MetricsCalculator::new();
    let text = "This works. Specifically, the handler catches errors.";

    let forward: Vec<f64> = calc.analyzers().iter().map(|a| a.analyze(text)).collect();
    let mut backward: Vec<f64> = calc.analyzers().iter().rev().map(|a| a.analyze(text)).collect();
    backward.reverse();

    assert_eq!(forward, backward);
    assert_eq!(CoherenceAnalyzer.metric(), Metric::Coherence);
}
