/*!
 * Tests for volume and structure validation
 */

use chapterguard::segmentation::char_len;
use chapterguard::validation::{IntegrityValidator, LineMode, ValidationConfig, Verdict};

use crate::common::{line_oriented_text, uniform_paragraphs};

/// `count` paragraphs whose total length is close to `total_chars`
fn paragraphs_totalling(count: usize, total_chars: usize) -> String {
    let separators = 2 * (count - 1);
    let each = (total_chars - separators) / count;
    (0..count)
        .map(|_| "t".repeat(each))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[test]
fn test_validate_withFaithfulTranslation_shouldPassWithoutWarnings() {
    let validator = IntegrityValidator::new();
    let original = uniform_paragraphs(10, 100);
    let transformed = uniform_paragraphs(10, 110);

    let report = validator.validate(&original, &transformed);

    assert!(report.valid);
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    assert_eq!(report.verdict(), Verdict::Valid);
    assert_eq!(report.original_paragraph_count, 10);
    assert_eq!(report.transformed_paragraph_count, 10);
    assert!(report.length_ratio > 1.0);
}

#[test]
fn test_validate_withTruncatedOutput_shouldReportLengthCritical() {
    let validator = IntegrityValidator::new();
    let report = validator.validate(&"a".repeat(1000), &"b".repeat(300));

    assert!(!report.valid);
    assert_eq!(report.critical_issues.len(), 1);
    assert!(report.critical_issues[0].contains("too short"));
    assert!((report.length_ratio - 0.3).abs() < 1e-9);
}

#[test]
fn test_validate_withLineOrientedSource_shouldOverrideParagraphRatio() {
    let validator = IntegrityValidator::new();
    let original = line_oriented_text(3, 20);
    let target_len = char_len(&original) * 8 / 10;
    let transformed = paragraphs_totalling(50, target_len);

    let report = validator.validate(&original, &transformed);

    assert!(report.length_ratio > 0.75 && report.length_ratio < 0.85);
    assert_eq!(report.paragraph_ratio, 1.0);
    assert_eq!(report.line_mode, LineMode::Overridden);
    assert!(report.valid);
    // The length ratio alone still earns an advisory warning
    assert_eq!(report.verdict(), Verdict::Warned);
}

#[test]
fn test_validate_atCriticalBoundary_shouldAcceptExactRatio() {
    let validator = IntegrityValidator::new();

    let at_threshold = validator.validate(&"a".repeat(1000), &"b".repeat(600));
    assert!(at_threshold.valid);
    assert_eq!(at_threshold.verdict(), Verdict::Warned);

    let below_threshold = validator.validate(&"a".repeat(10000), &"b".repeat(5999));
    assert!(!below_threshold.valid);
}

#[test]
fn test_validate_withIdenticalText_shouldHaveUnitRatios() {
    let validator = IntegrityValidator::new();
    let text = line_oriented_text(4, 3);

    let report = validator.validate(&text, &text);

    assert_eq!(report.length_ratio, 1.0);
    assert_eq!(report.paragraph_ratio, 1.0);
    assert!(report.valid);
}

#[test]
fn test_validate_withShrinkingOutput_shouldNeverImproveLengthRatio() {
    let validator = IntegrityValidator::new();
    let original = uniform_paragraphs(5, 200);

    let mut previous = f64::INFINITY;
    for keep in (0..=char_len(&original)).rev().step_by(97) {
        let transformed: String = original.chars().take(keep).collect();
        let report = validator.validate(&original, &transformed);

        assert!(report.length_ratio <= previous);
        previous = report.length_ratio;
    }
}

#[test]
fn test_validate_withMergedParagraphs_shouldReportStructuralLoss() {
    let validator = IntegrityValidator::new();
    let original = uniform_paragraphs(10, 80);
    let transformed = original.replace("\n\n", " ");

    let report = validator.validate(&original, &transformed);

    assert!(!report.valid);
    assert!(report.length_ratio > 0.9);
    assert!(report.paragraph_ratio < 0.6);
    assert!(report.critical_issues[0].contains("structural loss"));
}

#[test]
fn test_validate_withCustomThresholds_shouldUseThem() {
    let validator = IntegrityValidator::with_config(ValidationConfig {
        critical_length_ratio: 0.2,
        warning_length_ratio: 0.25,
        ..Default::default()
    });

    let report = validator.validate(&"a".repeat(1000), &"b".repeat(300));

    assert!(report.valid);
    assert!(report.warnings.is_empty());
}

#[test]
fn test_validationReport_summary_shouldNameVerdictAndCounts() {
    let validator = IntegrityValidator::new();
    let report = validator.validate(&uniform_paragraphs(3, 50), &uniform_paragraphs(3, 50));

    let summary = report.summary();
    assert!(summary.starts_with("Valid"));
    assert!(summary.contains("3 -> 3"));
}

#[test]
fn test_validate_withSoftPassAndStructuralLoss_shouldBeCritical() {
    let validator = IntegrityValidator::with_config(ValidationConfig {
        override_min_length_ratio: 0.99,
        ..Default::default()
    });
    let original = line_oriented_text(40, 5);
    let transformed = paragraphs_totalling(22, char_len(&original) * 9 / 10);

    let report = validator.validate(&original, &transformed);

    assert_eq!(report.line_mode, LineMode::SoftPass);
    assert!(!report.valid);
    assert_eq!(report.critical_issues.len(), 1);
    assert!(report.critical_issues[0].contains("structural loss"));
}
