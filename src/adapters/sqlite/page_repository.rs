//! SQLite implementation of the PageRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{parse_json_or_default, to_usize};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::OcrPage;
use crate::domain::ports::PageRepository;

#[derive(Clone)]
pub struct SqlitePageRepository {
    pool: SqlitePool,
}

impl SqlitePageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PageRepository for SqlitePageRepository {
    async fn upsert_pages(&self, document_id: &str, pages: &[OcrPage]) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        for page in pages {
            sqlx::query(
                r#"INSERT INTO ocr_pages (document_id, page_number, text, word_count, line_count, confidence, lines, tables, images)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                   ON CONFLICT(document_id, page_number) DO UPDATE SET
                       text = excluded.text,
                       word_count = excluded.word_count,
                       line_count = excluded.line_count,
                       confidence = excluded.confidence,
                       lines = excluded.lines,
                       tables = excluded.tables,
                       images = excluded.images"#,
            )
            .bind(document_id)
            .bind(i64::from(page.page_number))
            .bind(&page.text)
            .bind(page.word_count as i64)
            .bind(page.line_count as i64)
            .bind(page.confidence)
            .bind(serde_json::to_string(&page.lines)?)
            .bind(serde_json::to_string(&page.tables)?)
            .bind(serde_json::to_string(&page.images)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_pages(&self, document_id: &str) -> DomainResult<Vec<OcrPage>> {
        let rows: Vec<PageRow> = sqlx::query_as(
            "SELECT page_number, text, word_count, line_count, confidence, lines, tables, images FROM ocr_pages WHERE document_id = ? ORDER BY page_number",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OcrPage::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct PageRow {
    page_number: i64,
    text: String,
    word_count: i64,
    line_count: i64,
    confidence: f64,
    lines: Option<String>,
    tables: Option<String>,
    images: Option<String>,
}

impl TryFrom<PageRow> for OcrPage {
    type Error = DomainError;

    fn try_from(row: PageRow) -> Result<Self, Self::Error> {
        let page_number = u32::try_from(row.page_number)
            .map_err(|_| DomainError::Serialization(format!("Invalid page number: {}", row.page_number)))?;

        Ok(Self {
            page_number,
            text: row.text,
            word_count: to_usize(row.word_count),
            line_count: to_usize(row.line_count),
            confidence: row.confidence,
            lines: parse_json_or_default(row.lines)?,
            tables: parse_json_or_default(row.tables)?,
            images: parse_json_or_default(row.images)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, fixtures};
    use crate::domain::models::OcrLine;

    fn page(number: u32, text: &str) -> OcrPage {
        OcrPage {
            page_number: number,
            text: text.to_string(),
            word_count: text.split_whitespace().count(),
            line_count: 1,
            confidence: 91.5,
            lines: vec![OcrLine { text: text.to_string(), confidence: 91.5, geometry: None, words: vec![] }],
            tables: vec![],
            images: vec![],
        }
    }

    #[tokio::test]
    async fn test_upsert_pages_replaces_by_page_number() {
        let pool = create_migrated_test_pool().await.unwrap();
        fixtures::insert_document(&pool, "doc_1").await;
        let repo = SqlitePageRepository::new(pool);

        repo.upsert_pages("doc_1", &[page(2, "second"), page(1, "first")]).await.unwrap();
        repo.upsert_pages("doc_1", &[page(1, "first again")]).await.unwrap();

        let pages = repo.list_pages("doc_1").await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].text, "first again");
        assert_eq!(pages[0].lines[0].text, "first again");
        assert_eq!(pages[1].text, "second");
    }
}
