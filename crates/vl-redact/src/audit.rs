//! Audit logs: the reversible mapping plus integrity metadata.
//!
//! An audit log contains every original value it replaced. It is owned by the
//! session that created it and must never travel with a shareable export.

use crate::error::{RedactError, Result};
use crate::hash::{is_content_hash, KeyManager, KeyMaterial, SEAL_ALGORITHM};
use crate::placeholder::{parse_placeholder, PlaceholderMapping};
use crate::{Category, CleanDocument, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{info, warn};

/// Current audit log schema version.
pub const AUDIT_SCHEMA_VERSION: u32 = 1;

/// Keyed integrity seal over an audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSeal {
    pub key_id: String,
    pub algorithm: String,
    /// Hex HMAC over the canonical JSON of the log without its seal.
    pub mac: String,
}

/// Reversible mapping and integrity metadata for one redaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    /// Content hash of the original document.
    pub document_hash: String,
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub mappings: Vec<PlaceholderMapping>,
    /// Content hash the matching clean document must carry.
    pub clean_document_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruleset_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seal: Option<AuditSeal>,
}

/// Builds an [`AuditLog`] from the artifacts of one redaction.
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
    document_hash: String,
    clean_document_hash: String,
    created_at: DateTime<Utc>,
    ruleset_version: Option<String>,
    mappings: Vec<PlaceholderMapping>,
}

impl AuditLogBuilder {
    pub fn new(document: &Document, clean: &CleanDocument) -> Self {
        Self {
            document_hash: document.hash().to_string(),
            clean_document_hash: clean.hash().to_string(),
            created_at: Utc::now(),
            ruleset_version: None,
            mappings: Vec::new(),
        }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn ruleset_version(mut self, version: impl Into<String>) -> Self {
        self.ruleset_version = Some(version.into());
        self
    }

    pub fn mappings(mut self, mappings: Vec<PlaceholderMapping>) -> Self {
        self.mappings = mappings;
        self
    }

    pub fn build(self) -> AuditLog {
        AuditLog {
            document_hash: self.document_hash,
            schema_version: AUDIT_SCHEMA_VERSION,
            created_at: self.created_at,
            mappings: self.mappings,
            clean_document_hash: self.clean_document_hash,
            ruleset_version: self.ruleset_version,
            seal: None,
        }
    }
}

/// Per-category redaction counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionSummary {
    pub total: usize,
    pub distinct_values: usize,
    pub by_category: BTreeMap<Category, usize>,
}

fn malformed(message: impl Into<String>) -> RedactError {
    RedactError::MalformedAuditLog(message.into())
}

impl AuditLog {
    /// Parse and validate an audit log.
    pub fn from_json(json: &str) -> Result<Self> {
        let log: AuditLog = serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;
        log.validate()?;
        Ok(log)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        info!(
            path = %path.as_ref().display(),
            mappings = self.mappings.len(),
            "Wrote audit log"
        );
        Ok(())
    }

    /// Check the log against its schema.
    ///
    /// Mappings must carry well-formed ids matching their category, cover
    /// ascending disjoint spans whose length matches the stored value, and
    /// number each category 1, 2, 3... in order of first appearance. A
    /// repeated id must repeat the same value.
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != AUDIT_SCHEMA_VERSION {
            return Err(malformed(format!(
                "unsupported schema version {}",
                self.schema_version
            )));
        }
        if !is_content_hash(&self.document_hash) {
            return Err(malformed("documentHash is not a SHA-256 hex digest"));
        }
        if !is_content_hash(&self.clean_document_hash) {
            return Err(malformed("cleanDocumentHash is not a SHA-256 hex digest"));
        }

        let mut next_ordinal: BTreeMap<&Category, u32> = BTreeMap::new();
        let mut values: BTreeMap<&str, &str> = BTreeMap::new();
        let mut previous_end = 0usize;

        for (index, mapping) in self.mappings.iter().enumerate() {
            let (category, ordinal) = parse_placeholder(&mapping.placeholder_id)
                .ok_or_else(|| malformed(format!("mapping {} has an invalid placeholder id", index)))?;
            if category != mapping.category {
                return Err(malformed(format!(
                    "mapping {} id {} does not match category {}",
                    index, mapping.placeholder_id, mapping.category
                )));
            }
            if mapping.span_start >= mapping.span_end
                || mapping.span_end - mapping.span_start != mapping.original_value.len()
            {
                return Err(malformed(format!("mapping {} has an inconsistent span", index)));
            }
            if index > 0 && mapping.span_start < previous_end {
                return Err(malformed(format!(
                    "mapping {} is out of order or overlaps the previous one",
                    index
                )));
            }
            previous_end = mapping.span_end;

            match values.get(mapping.placeholder_id.as_str()) {
                Some(&value) if value != mapping.original_value => {
                    return Err(malformed(format!(
                        "placeholder {} maps to more than one value",
                        mapping.placeholder_id
                    )));
                }
                Some(_) => {}
                None => {
                    let expected = next_ordinal.entry(&mapping.category).or_insert(1);
                    if ordinal != *expected {
                        return Err(malformed(format!(
                            "placeholder {} is out of sequence (expected ordinal {})",
                            mapping.placeholder_id, expected
                        )));
                    }
                    *expected += 1;
                    values.insert(&mapping.placeholder_id, &mapping.original_value);
                }
            }
        }

        if let Some(seal) = &self.seal {
            if seal.algorithm != SEAL_ALGORITHM {
                return Err(malformed(format!(
                    "unsupported seal algorithm '{}'",
                    seal.algorithm
                )));
            }
        }

        Ok(())
    }

    fn signing_payload(&self) -> Result<Vec<u8>> {
        let unsealed = AuditLog {
            seal: None,
            ..self.clone()
        };
        Ok(serde_json::to_vec(&unsealed)?)
    }

    /// Attach an HMAC seal computed with `key`, replacing any existing seal.
    pub fn seal(&mut self, key: &KeyMaterial) -> Result<()> {
        let mac = key.sign(&self.signing_payload()?)?;
        self.seal = Some(AuditSeal {
            key_id: key.key_id.clone(),
            algorithm: SEAL_ALGORITHM.to_string(),
            mac,
        });
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.seal.is_some()
    }

    /// Verify the seal with `key`. A missing seal fails verification.
    pub fn verify_seal(&self, key: &KeyMaterial) -> Result<()> {
        let Some(seal) = &self.seal else {
            return Err(RedactError::integrity("audit seal", "present", "missing"));
        };
        if seal.key_id != key.key_id {
            return Err(RedactError::integrity(
                "audit seal key",
                key.key_id.as_str(),
                seal.key_id.as_str(),
            ));
        }
        if !key.verify(&self.signing_payload()?, &seal.mac)? {
            warn!(
                key_id = %seal.key_id,
                document_hash = %self.document_hash,
                "Audit seal verification failed"
            );
            return Err(RedactError::integrity("audit seal", "valid mac", "invalid mac"));
        }
        Ok(())
    }

    /// Verify the seal using the key it names from a key file.
    pub fn verify_seal_with(&self, keys: &KeyManager) -> Result<()> {
        let Some(seal) = &self.seal else {
            return Err(RedactError::integrity("audit seal", "present", "missing"));
        };
        // A seal under a key the verifier never issued cannot be trusted.
        if !keys.keys.contains_key(&seal.key_id) {
            warn!(
                key_id = %seal.key_id,
                document_hash = %self.document_hash,
                "Audit seal names an unknown key"
            );
            return Err(RedactError::integrity(
                "audit seal key",
                "a key from the key file",
                seal.key_id.as_str(),
            ));
        }
        let key = keys.key(&seal.key_id)?;
        self.verify_seal(&key)
    }

    /// Counts of redacted occurrences.
    pub fn summary(&self) -> RedactionSummary {
        let mut by_category = BTreeMap::new();
        let mut distinct = BTreeSet::new();
        for mapping in &self.mappings {
            *by_category.entry(mapping.category.clone()).or_insert(0) += 1;
            distinct.insert((&mapping.category, mapping.original_value.as_str()));
        }
        RedactionSummary {
            total: self.mappings.len(),
            distinct_values: distinct.len(),
            by_category,
        }
    }
}
