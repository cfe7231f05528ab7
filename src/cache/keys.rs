// Key namespaces shared by the cache and the rate limiter
// Author: kelexine (https://github.com/kelexine)

use crate::analysis::AnalysisField;

pub const ANALYSIS_PREFIX: &str = "analysis";
pub const FINGERPRINT_PREFIX: &str = "fingerprint";
pub const FIELD_PREFIX: &str = "field";
pub const RATE_WINDOW_PREFIX: &str = "ratewindow";
pub const USER_DOCUMENTS_PREFIX: &str = "user_documents";

pub fn analysis_key(doc_id: &str) -> String {
    format!("{}:{}", ANALYSIS_PREFIX, doc_id)
}

pub fn fingerprint_key(doc_id: &str) -> String {
    format!("{}:{}", FINGERPRINT_PREFIX, doc_id)
}

pub fn field_key(field: AnalysisField, doc_id: &str) -> String {
    format!("{}:{}:{}", FIELD_PREFIX, field.as_str(), doc_id)
}

/// Every key derived from one document: analysis, fingerprint and all fields.
pub fn document_keys(doc_id: &str) -> Vec<String> {
    let mut keys = vec![analysis_key(doc_id), fingerprint_key(doc_id)];
    keys.extend(AnalysisField::ALL.iter().map(|f| field_key(*f, doc_id)));
    keys
}

pub fn rate_window_key(purpose: &str, identity: &str, window_index: i64) -> String {
    format!("{}:{}:{}:{}", RATE_WINDOW_PREFIX, purpose, identity, window_index)
}

pub fn user_documents_key(owner_id: &str) -> String {
    format!("{}:{}", USER_DOCUMENTS_PREFIX, owner_id)
}
