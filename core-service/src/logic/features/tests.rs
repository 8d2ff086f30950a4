//! Integration Tests for the frame → features → classifier path

#[cfg(test)]
mod integration_tests {
    use crate::logic::features::{
        layout::{layout_hash, FEATURE_LAYOUT, FEATURE_VERSION},
        FeatureExtractor, FEATURE_COUNT,
    };
    use crate::logic::frame::{parse, FieldError};
    use crate::logic::model::{FatigueClassifier, FatigueLabel};
    use crate::logic::testing::ThresholdModel;

    const LINE: &str = "EMP:101,HR:72,SLEEP:7.5,STEPS:4200,MOOD:3,TEMP:31.2,HUM:55,DIST:120,IR:0";

    /// Same frame, same vector, same label
    #[test]
    fn test_extract_then_classify_is_deterministic() {
        let classifier = FatigueClassifier::new(Box::new(ThresholdModel)).unwrap();
        let frame = parse(LINE);

        let first = FeatureExtractor::extract(&frame).unwrap();
        let second = FeatureExtractor::extract(&parse(LINE)).unwrap();
        assert_eq!(first, second);

        let labels: Vec<FatigueLabel> = (0..10)
            .map(|_| classifier.classify(&first).unwrap())
            .collect();
        assert!(labels.iter().all(|l| *l == FatigueLabel::Rested));
    }

    #[test]
    fn test_environment_fields_do_not_reach_classifier() {
        let vector = FeatureExtractor::extract(&parse(LINE)).unwrap();
        assert_eq!(vector.values.len(), FEATURE_COUNT);
        assert!(vector.to_log_entry()["named_values"].get("TEMP").is_none());
        assert_eq!(vector.values, [72.0, 7.5, 4200.0, 3.0]);
    }

    #[test]
    fn test_extraction_does_not_default_missing_fields() {
        for skipped in FEATURE_LAYOUT.iter().copied() {
            let line: String = LINE
                .split(',')
                .filter(|token| !token.starts_with(&format!("{}:", skipped)))
                .collect::<Vec<_>>()
                .join(",");
            let err = FeatureExtractor::extract(&parse(&line)).unwrap_err();
            assert_eq!(err, FieldError::Missing(skipped));
        }
    }

    #[test]
    fn test_log_entry_carries_layout_identity() {
        let vector = FeatureExtractor::extract(&parse(LINE)).unwrap();
        let entry = vector.to_log_entry();
        assert_eq!(entry["feature_version"], FEATURE_VERSION);
        assert_eq!(entry["layout_hash"], layout_hash());
        assert_eq!(entry["named_values"]["SLEEP"], 7.5);
    }
}
