// tests/end_to_end.rs
//
// Train → classify through the detector, corpus parsing, forest labeling,
// cross-validation and config loading.

use insult_detector::evaluate::{cross_validate, f1_score, DEFAULT_FOLDS};
use insult_detector::{
    label_forest, labeled_samples, parse_corpus, DetectorConfig, InsultDetector, InsultError,
    LabeledSample,
};

fn detector() -> InsultDetector {
    InsultDetector::new(DetectorConfig::default()).expect("default detector builds")
}

fn two_samples() -> Vec<LabeledSample> {
    vec![
        LabeledSample::new("you idiot", true),
        LabeledSample::new("have a nice day", false),
    ]
}

#[test]
fn two_message_corpus_is_recovered() {
    let d = detector();
    let info = d.train(&two_samples()).expect("training succeeds");
    assert_eq!(info.generation, 1);
    assert_eq!(info.samples, 2);

    let labels = d.classify(&["you idiot", "have a nice day"]).unwrap();
    assert_eq!(labels, vec![true, false]);
}

#[test]
fn classify_before_training_reports_not_ready() {
    let err = detector().classify(&["anything"]).unwrap_err();
    assert!(matches!(err, InsultError::ModelNotReady));
}

#[test]
fn single_class_corpus_fails_and_keeps_previous_model() {
    let d = detector();
    d.train(&two_samples()).unwrap();

    let bad = vec![LabeledSample::new("hi", false), LabeledSample::new("yo", false)];
    assert!(matches!(d.train(&bad), Err(InsultError::Training(_))));
    assert_eq!(d.model_info().unwrap().generation, 1);
}

const CORPUS: &str = r#"[
  {"root": {"text": "you idiot", "insult": true, "id": "a1",
            "children": [{"text": "have a nice day", "insult": false},
                         {"text": "", "insult": false}]}},
  {"root": {"children": [{"text": "you idiot"}]}, "forum": "news"}
]"#;

#[test]
fn corpus_trains_and_labels_forest() {
    let corpus = parse_corpus(CORPUS).expect("corpus parses");
    let samples = labeled_samples(&corpus);
    assert_eq!(samples, two_samples());

    let d = detector();
    d.train_discussions(&corpus).unwrap();

    let out = label_forest(&corpus, &d).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].root.insult, Some(true));
    assert_eq!(out[0].root.children()[0].insult, Some(false));
    assert_eq!(out[0].root.children()[1].insult, Some(false));
    // text-less root is traversed but not labeled
    assert_eq!(out[1].root.insult, None);
    assert_eq!(out[1].root.children()[0].insult, Some(true));

    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json[0]["root"]["id"], "a1");
    assert_eq!(json[1]["forum"], "news");
}

#[test]
fn corpus_without_labels_cannot_train() {
    let corpus = parse_corpus(r#"[{"root": {"text": "hello"}}]"#).unwrap();
    let err = detector().train_discussions(&corpus).unwrap_err();
    assert!(matches!(err, InsultError::Training(_)));
}

#[test]
fn cross_validation_reports_one_score_per_fold() {
    let samples: Vec<LabeledSample> = [
        ("you idiot", true),
        ("you are a moron", true),
        ("shut up you stupid fool", true),
        ("your ideas are garbage you clown", true),
        ("what a pathetic loser you are", true),
        ("have a nice day", false),
        ("thanks for the link", false),
        ("I agree with the article", false),
        ("see you at the game tonight", false),
        ("great point about the budget", false),
    ]
    .into_iter()
    .map(|(t, l)| LabeledSample::new(t, l))
    .collect();

    let cv = cross_validate(|| InsultDetector::new(DetectorConfig::default()), &samples, DEFAULT_FOLDS)
        .expect("cross-validation runs");
    assert_eq!(cv.fold_scores.len(), DEFAULT_FOLDS);
    assert!(cv.fold_scores.iter().all(|s| (0.0..=1.0).contains(s)));
    assert!((0.0..=1.0).contains(&cv.mean));

    let too_many = cross_validate(|| InsultDetector::new(DetectorConfig::default()), &samples, 11);
    assert!(matches!(too_many, Err(InsultError::Training(_))));
}

#[test]
fn f1_on_positive_class() {
    let truth = [true, true, false, false];
    let pred = [true, false, true, false];
    assert!((f1_score(&truth, &pred) - 0.5).abs() < 1e-12);
}

#[test]
fn config_file_in_repo_builds_a_detector() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/detector.toml");
    let cfg = DetectorConfig::from_path(&path).expect("shipped config parses");
    let d = InsultDetector::new(cfg).expect("shipped config is valid");
    let a = d.explain("You idiot!!");
    assert_eq!(a.window.directed_hits, 1);
}
