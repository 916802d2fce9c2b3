//! Identifier, filename and content-hash helpers.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const MAX_FILENAME_LEN: usize = 255;

/// `{prefix}_{YYYYmmddHHMMSS}_{8 hex chars}`.
pub fn prefixed_id(prefix: &str, at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}_{}", at.format("%Y%m%d%H%M%S"), &suffix[..8])
}

pub fn document_id() -> String {
    prefixed_id("doc", Utc::now())
}

pub fn analysis_id() -> String {
    prefixed_id("analysis", Utc::now())
}

pub fn report_id() -> String {
    prefixed_id("report", Utc::now())
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Replaces characters outside `[A-Za-z0-9_.-]` with `_` and caps the
/// length at 255, keeping the extension when truncating.
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') { c } else { '_' })
        .collect();

    if sanitized.len() <= MAX_FILENAME_LEN {
        return sanitized;
    }

    match sanitized.rfind('.') {
        Some(dot) if sanitized.len() - dot < MAX_FILENAME_LEN => {
            let extension = &sanitized[dot..];
            format!("{}{extension}", &sanitized[..MAX_FILENAME_LEN - extension.len()])
        }
        _ => sanitized[..MAX_FILENAME_LEN].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_prefixed_id_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        let id = prefixed_id("doc", at);

        assert!(id.starts_with("doc_20240301090507_"));
        assert_eq!(id.len(), "doc_20240301090507_".len() + 8);
        assert!(id[19..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(document_id(), document_id());
        assert!(analysis_id().starts_with("analysis_"));
        assert!(report_id().starts_with("report_"));
    }

    #[test]
    fn test_content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Vendor Contract (v2).pdf"), "Vendor_Contract__v2_.pdf");
        assert_eq!(sanitize_filename("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_filename("résumé.pdf"), "r_sum_.pdf");
    }

    #[test]
    fn test_sanitize_filename_truncates_keeping_extension() {
        let long = format!("{}.pdf", "a".repeat(400));
        let sanitized = sanitize_filename(&long);

        assert_eq!(sanitized.len(), 255);
        assert!(sanitized.ends_with(".pdf"));
    }
}
