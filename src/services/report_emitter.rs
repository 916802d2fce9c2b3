//! Renders an analysis and stores the artifact plus its metadata row.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::ids;
use crate::domain::errors::DomainResult;
use crate::domain::models::{AnalysisResult, Report, ReportFormat, ReportType};
use crate::domain::ports::{BlobStore, ReportRenderer, ReportRepository};

pub struct ReportEmitter {
    renderer: Arc<dyn ReportRenderer>,
    blobs: Arc<dyn BlobStore>,
    reports: Arc<dyn ReportRepository>,
    bucket: String,
}

impl ReportEmitter {
    pub fn new(
        renderer: Arc<dyn ReportRenderer>,
        blobs: Arc<dyn BlobStore>,
        reports: Arc<dyn ReportRepository>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            renderer,
            blobs,
            reports,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Blob key for a report: `reports/{report_id}.{json|txt}`.
    pub fn blob_key(report_id: &str, format: ReportFormat) -> String {
        format!("reports/{report_id}.{}", format.extension())
    }

    pub async fn emit(
        &self,
        analysis: &AnalysisResult,
        report_type: ReportType,
        format: ReportFormat,
    ) -> DomainResult<Report> {
        let bytes = self.renderer.render(analysis, report_type, format)?;
        let report_id = ids::report_id();
        let blob_key = Self::blob_key(&report_id, format);

        let mut metadata = BTreeMap::new();
        metadata.insert("analysis_id".to_string(), analysis.analysis_id.clone());
        metadata.insert("document_id".to_string(), analysis.document_id.clone());
        metadata.insert("report_type".to_string(), report_type.as_str().to_string());
        metadata.insert("format".to_string(), format.as_str().to_string());

        let stored = self.blobs.put(&self.bucket, &blob_key, &bytes, &metadata).await?;

        let report = Report {
            report_id,
            analysis_id: analysis.analysis_id.clone(),
            document_id: analysis.document_id.clone(),
            report_type,
            format,
            file_size_bytes: stored.size,
            blob_key,
            created_at: Utc::now(),
        };
        self.reports.create(&report).await?;

        info!(
            report_id = %report.report_id,
            analysis_id = %report.analysis_id,
            report_type = report_type.as_str(),
            format = format.as_str(),
            bytes = report.file_size_bytes,
            "Report stored"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::ports::{BlobEntry, StoredBlob};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct EchoRenderer;

    impl ReportRenderer for EchoRenderer {
        fn render(&self, analysis: &AnalysisResult, report_type: ReportType, format: ReportFormat) -> DomainResult<Vec<u8>> {
            Ok(format!("{}:{}:{}", analysis.analysis_id, report_type.as_str(), format.as_str()).into_bytes())
        }
    }

    #[derive(Default)]
    struct MemoryBlobs {
        puts: Mutex<Vec<(String, String, Vec<u8>)>>,
    }

    #[async_trait]
    impl BlobStore for MemoryBlobs {
        async fn put(&self, bucket: &str, key: &str, bytes: &[u8], _metadata: &BTreeMap<String, String>) -> DomainResult<StoredBlob> {
            self.puts
                .lock()
                .unwrap()
                .push((bucket.to_string(), key.to_string(), bytes.to_vec()));
            Ok(StoredBlob {
                size: bytes.len() as u64,
                hash: ids::content_hash(bytes),
                url: format!("memory://{bucket}/{key}"),
            })
        }
        async fn get(&self, bucket: &str, key: &str) -> DomainResult<Vec<u8>> {
            Err(DomainError::not_found("Blob", format!("{bucket}/{key}")))
        }
        async fn list(&self, _bucket: &str, _prefix: &str) -> DomainResult<Vec<BlobEntry>> {
            Ok(Vec::new())
        }
        async fn delete(&self, _bucket: &str, _key: &str) -> DomainResult<bool> {
            Ok(false)
        }
    }

    #[derive(Default)]
    struct MemoryReports {
        rows: Mutex<Vec<Report>>,
    }

    #[async_trait]
    impl ReportRepository for MemoryReports {
        async fn create(&self, report: &Report) -> DomainResult<()> {
            self.rows.lock().unwrap().push(report.clone());
            Ok(())
        }
        async fn get(&self, report_id: &str) -> DomainResult<Option<Report>> {
            Ok(self.rows.lock().unwrap().iter().find(|r| r.report_id == report_id).cloned())
        }
        async fn list_for_document(&self, document_id: &str) -> DomainResult<Vec<Report>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.document_id == document_id)
                .cloned()
                .collect())
        }
    }

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            analysis_id: "analysis_1".into(),
            document_id: "doc_1".into(),
            agent_analyses: vec![],
            overall_risk_score: 0.4,
            agent_count: 0,
            analysis_type: AnalysisResult::FULL_COMPLIANCE.into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_emit_stores_blob_and_metadata() {
        let blobs = Arc::new(MemoryBlobs::default());
        let reports = Arc::new(MemoryReports::default());
        let emitter = ReportEmitter::new(
            Arc::new(EchoRenderer),
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
            Arc::clone(&reports) as Arc<dyn ReportRepository>,
            "compliance-reports",
        );

        let report = emitter
            .emit(&analysis(), ReportType::DetailedAudit, ReportFormat::Text)
            .await
            .unwrap();

        assert!(report.report_id.starts_with("report_"));
        assert_eq!(report.blob_key, format!("reports/{}.txt", report.report_id));
        let expected = b"analysis_1:detailed_audit:text";
        assert_eq!(report.file_size_bytes, expected.len() as u64);

        {
            let puts = blobs.puts.lock().unwrap();
            assert_eq!(puts.len(), 1);
            assert_eq!(puts[0].0, "compliance-reports");
            assert_eq!(puts[0].2, expected.to_vec());
        }

        assert_eq!(reports.list_for_document("doc_1").await.unwrap(), vec![report]);
    }

    #[test]
    fn test_blob_key_extension() {
        assert_eq!(ReportEmitter::blob_key("report_x", ReportFormat::Json), "reports/report_x.json");
        assert_eq!(ReportEmitter::blob_key("report_x", ReportFormat::Text), "reports/report_x.txt");
    }
}
