//! Fuzz target for restore against arbitrary clean text.
//!
//! The audit log is fixed and valid; any edit to the clean text must be
//! rejected with an error. Placeholder scanning runs on the raw text too.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vl_redact::{
    apply, find_placeholders, restore, AuditLogBuilder, Category, CleanDocument, Document,
    PlaceholderAllocator, ResolvedSpan, Span,
};

const ORIGINAL: &str = "Patient John Doe, SSN 123-45-6789";
const CLEAN: &str = "Patient [REDACTED_NAME_1], SSN [REDACTED_SSN_1]";

fuzz_target!(|data: &str| {
    let _ = find_placeholders(data);

    let document = Document::new(ORIGINAL);
    let spans: Vec<ResolvedSpan> = [(8, 16, Category::NAME), (22, 33, Category::SSN)]
        .into_iter()
        .filter_map(|(start, end, category)| {
            let value = document.slice(start, end)?;
            Some(ResolvedSpan::from_span(Span::new(start, end, category, "fuzz"), value))
        })
        .collect();
    let mappings = PlaceholderAllocator::default().allocate(&spans);
    let Ok(clean) = apply(&document, &mappings) else {
        return;
    };
    let log = AuditLogBuilder::new(&document, &clean).mappings(mappings).build();

    let result = restore(&CleanDocument::from_text(data), &log);
    if data == CLEAN {
        assert!(result.is_ok());
    } else {
        assert!(result.is_err());
    }
});
