//! Property tests for scan → redact → restore.

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use std::sync::Arc;
use vl_redact::{
    find_placeholders, AllocatorOptions, Category, Detector, DictionaryDetector, Document,
    JurisdictionRuleset, PatternDetector, RedactionSession,
};

fn session(dedupe_values: bool) -> RedactionSession {
    RedactionSession::new(Arc::new(JurisdictionRuleset::builtin()), &["GDPR", "HIPAA"])
        .unwrap()
        .with_allocator_options(AllocatorOptions { dedupe_values })
        .with_created_at(
            DateTime::parse_from_rfc3339("2026-06-30T23:59:59Z")
                .unwrap()
                .with_timezone(&Utc),
        )
}

fn detectors() -> Vec<Box<dyn Detector>> {
    let mut names = DictionaryDetector::new();
    names
        .add_terms(Category::NAME, ["John Doe", "Jane Roe", "Zoë Müller", "John"], false)
        .unwrap();
    let mut orgs = DictionaryDetector::new().with_id("orgs");
    orgs.add_terms(Category::ORGANIZATION, ["Acme", "Doe Labs"], true).unwrap();
    vec![Box::new(PatternDetector::new()), Box::new(names), Box::new(orgs)]
}

fn word() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z]{1,8}",
        1 => Just("John Doe".to_string()),
        1 => Just("Jane Roe".to_string()),
        1 => Just("Zoë Müller".to_string()),
        1 => Just("acme".to_string()),
        1 => Just("Doe Labs".to_string()),
        1 => "[0-9]{3}-[0-9]{2}-[0-9]{4}",
        1 => "[a-z]{2,6}@[a-z]{2,6}\\.(com|org)",
        1 => "[0-9]{3}-[0-9]{3}-[0-9]{4}",
        1 => Just("4111 1111 1111 1111".to_string()),
        1 => Just("\n".to_string()),
        1 => Just("—".to_string()),
    ]
}

fn document_text() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 0..40).prop_map(|words| words.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn restore_inverts_redact(text in document_text(), dedupe in any::<bool>()) {
        let session = session(dedupe);
        let document = Document::new(text);
        let plan = session.scan(&document, &detectors()).unwrap();
        let redaction = session.redact(&document, &plan.resolved_spans).unwrap();

        let restored = session
            .restore(&redaction.clean_document, &redaction.audit_log)
            .unwrap();
        prop_assert_eq!(restored.content(), document.content());
    }

    #[test]
    fn resolved_spans_are_ordered_and_disjoint(text in document_text()) {
        let session = session(false);
        let document = Document::new(text);
        let plan = session.scan(&document, &detectors()).unwrap();

        for pair in plan.resolved_spans.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start);
        }
        for span in &plan.resolved_spans {
            prop_assert_eq!(document.slice(span.start, span.end), Some(span.original_value.as_str()));
        }
    }

    #[test]
    fn redaction_is_deterministic(text in document_text()) {
        let session = session(false);
        let document = Document::new(text);
        let detectors = detectors();

        let first = session
            .redact(&document, &session.scan(&document, &detectors).unwrap().resolved_spans)
            .unwrap();
        let second = session
            .redact(&document, &session.scan(&document, &detectors).unwrap().resolved_spans)
            .unwrap();

        prop_assert_eq!(first.clean_document.content(), second.clean_document.content());
        prop_assert_eq!(first.audit_log.to_json().unwrap(), second.audit_log.to_json().unwrap());
    }

    #[test]
    fn one_token_per_mapping(text in document_text()) {
        let session = session(false);
        let document = Document::new(text);
        let plan = session.scan(&document, &detectors()).unwrap();
        let redaction = session.redact(&document, &plan.resolved_spans).unwrap();

        let tokens = find_placeholders(redaction.clean_document.content());
        prop_assert_eq!(tokens.len(), redaction.audit_log.mappings.len());
        for (token, mapping) in tokens.iter().zip(&redaction.audit_log.mappings) {
            prop_assert_eq!(token.id, mapping.placeholder_id.as_str());
        }
    }
}
