//! Knowledge base maintenance: ingesting documents and learned answers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

use super::{GenerationError, SessionManager};
use crate::domain::knowledge::{DocumentChunk, TextSplitter};
use crate::ports::{DocumentStore, EmbeddedChunk, EmbeddingProvider};

const INGESTED_EXTENSIONS: &[&str] = &["txt", "md", "pdf"];

/// Outcome of learning from a past response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedResponse {
    /// The text that was indexed.
    pub content: String,
    /// Source name it was stored under.
    pub source: String,
    pub chunks_added: usize,
}

/// Outcome of a directory ingest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub chunks_added: usize,
}

/// Splits, embeds and stores knowledge text.
pub struct KnowledgeService {
    splitter: TextSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn DocumentStore>,
    sessions: Arc<SessionManager>,
    knowledge_dir: Option<PathBuf>,
    subdirs: Vec<String>,
}

impl KnowledgeService {
    pub fn new(
        splitter: TextSplitter,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn DocumentStore>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            splitter,
            embedder,
            store,
            sessions,
            knowledge_dir: None,
            subdirs: Vec::new(),
        }
    }

    /// Also write added content as files into `dir`, so it is re-ingested
    /// on the next start.
    pub fn with_knowledge_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.knowledge_dir = Some(dir.into());
        self
    }

    /// Restrict [`ingest_directory`](Self::ingest_directory) to these
    /// subdirectories of the directory it is given.
    pub fn with_subdirs(mut self, subdirs: Vec<String>) -> Self {
        self.subdirs = subdirs;
        self
    }

    /// Number of chunks in the knowledge base.
    pub async fn document_count(&self) -> Result<usize, GenerationError> {
        Ok(self.store.len().await?)
    }

    /// Adds free text to the knowledge base. Returns the number of new chunks.
    ///
    /// Without a `source_name`, a name derived from the content hash is used.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for blank content or a source name that is not a
    ///   plain file name
    /// - `UpstreamUnavailable` / `UpstreamTimeout` if embedding fails
    pub async fn add_content(
        &self,
        content: &str,
        source_name: Option<&str>,
    ) -> Result<usize, GenerationError> {
        if content.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "content must not be empty".to_string(),
            ));
        }

        let source = match source_name.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => plain_file_name(name)?,
            None => {
                let hash = DocumentChunk::new(content, "").id;
                format!("generated_{}.txt", &hash.as_str()[..12])
            }
        };

        if let Some(dir) = &self.knowledge_dir {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| GenerationError::Internal(e.to_string()))?;
            fs::write(dir.join(&source), content)
                .await
                .map_err(|e| GenerationError::Internal(e.to_string()))?;
        }

        self.index(content, &source).await
    }

    /// Stores a past exchange of a session as knowledge.
    ///
    /// `response_index` counts from the start, or from the end when
    /// negative; `None` means the latest turn.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` for an unknown session
    /// - `InvalidRequest` if the session has no turns or the index is out of range
    pub async fn learn_from_response(
        &self,
        session_id: &str,
        response_index: Option<i64>,
        save_as: Option<&str>,
    ) -> Result<LearnedResponse, GenerationError> {
        let session = self.sessions.history(session_id).await?;
        let index = response_index.unwrap_or(-1);
        let turn = session.turn_at(index)?;

        let content = format!("Question: {}\n\nAnswer: {}", turn.query, turn.response_text());
        let source = match save_as.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("learned_{}_{}.txt", session.id(), turn.sequence),
        };

        let chunks_added = self.add_content(&content, Some(&source)).await?;
        tracing::info!(session_id = %session.id(), sequence = turn.sequence, chunks_added, "Learned from response");

        Ok(LearnedResponse {
            content,
            source,
            chunks_added,
        })
    }

    /// Indexes every `.txt`, `.md` and `.pdf` file directly inside `dir`, or
    /// inside each configured subdirectory of it.
    ///
    /// A missing directory is not an error; nothing is ingested. Files are
    /// processed in name order, subdirectories in configured order. Files
    /// that cannot be read or yield no text are skipped with a warning.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestReport, GenerationError> {
        if !dir.is_dir() {
            tracing::warn!(path = %dir.display(), "Knowledge directory not found, skipping ingest");
            return Ok(IngestReport::default());
        }

        let roots: Vec<PathBuf> = if self.subdirs.is_empty() {
            vec![dir.to_path_buf()]
        } else {
            self.subdirs.iter().map(|sub| dir.join(sub)).collect()
        };

        let mut paths = Vec::new();
        for root in &roots {
            if !root.is_dir() {
                tracing::warn!(path = %root.display(), "Knowledge subdirectory not found, skipping");
                continue;
            }
            paths.extend(ingestible_files(root).await?);
        }

        let mut report = IngestReport::default();
        for path in paths {
            let text = match load_text(&path).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    tracing::warn!(path = %path.display(), "Knowledge file has no text, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable knowledge file");
                    continue;
                }
            };
            let source = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();

            report.chunks_added += self.index(&text, &source).await?;
            report.files += 1;
        }

        tracing::info!(
            path = %dir.display(),
            files = report.files,
            chunks_added = report.chunks_added,
            "Ingested knowledge directory"
        );
        Ok(report)
    }

    async fn index(&self, text: &str, source: &str) -> Result<usize, GenerationError> {
        let pieces = self.splitter.split(text);
        if pieces.is_empty() {
            return Ok(0);
        }

        let vectors = self.embedder.embed_documents(&pieces).await?;
        if vectors.len() != pieces.len() {
            return Err(GenerationError::UpstreamUnavailable(format!(
                "embedding model returned {} vectors for {} chunks",
                vectors.len(),
                pieces.len()
            )));
        }

        let chunks = pieces
            .into_iter()
            .zip(vectors)
            .map(|(piece, vector)| EmbeddedChunk {
                chunk: DocumentChunk::new(piece, source),
                vector,
            })
            .collect();

        let added = self.store.add(chunks).await?;
        tracing::debug!(source, added, "Indexed knowledge text");
        Ok(added)
    }
}

fn plain_file_name(name: &str) -> Result<String, GenerationError> {
    match Path::new(name).file_name().and_then(|n| n.to_str()) {
        Some(file) if file == name => Ok(file.to_string()),
        _ => Err(GenerationError::InvalidRequest(format!(
            "source name '{}' must be a plain file name",
            name
        ))),
    }
}

/// Files in `root` (not recursive) with an ingested extension, sorted by name.
async fn ingestible_files(root: &Path) -> Result<Vec<PathBuf>, GenerationError> {
    let mut entries = fs::read_dir(root)
        .await
        .map_err(|e| GenerationError::Internal(e.to_string()))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| GenerationError::Internal(e.to_string()))?
    {
        let path = entry.path();
        if extension_of(&path).is_some_and(|e| INGESTED_EXTENSIONS.contains(&e.as_str()))
            && path.is_file()
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Reads a knowledge file as text. PDFs go through `pdf-extract` on the
/// blocking pool; a panic inside the extractor surfaces as an error.
async fn load_text(path: &Path) -> Result<String, GenerationError> {
    if extension_of(path).as_deref() == Some("pdf") {
        let bytes = fs::read(path)
            .await
            .map_err(|e| GenerationError::Internal(e.to_string()))?;
        return tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| GenerationError::Internal(format!("PDF extraction aborted: {}", e)))?
            .map_err(|e| GenerationError::Internal(format!("PDF extraction failed: {}", e)));
    }

    fs::read_to_string(path)
        .await
        .map_err(|e| GenerationError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embeddings::HashingEmbedder;
    use crate::adapters::storage::InMemorySessionRepository;
    use crate::adapters::vector::InMemoryDocumentStore;
    use crate::domain::artifacts::{ArtifactEnvelope, ResponseStatus, TargetSchema};
    use tempfile::TempDir;

    struct Fixture {
        service: KnowledgeService,
        store: Arc<InMemoryDocumentStore>,
        sessions: Arc<SessionManager>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryDocumentStore::new());
        let sessions = Arc::new(SessionManager::new(Arc::new(InMemorySessionRepository::new())));
        let service = KnowledgeService::new(
            TextSplitter::new(200, 40).unwrap(),
            Arc::new(HashingEmbedder::default()),
            store.clone(),
            sessions.clone(),
        );
        Fixture {
            service,
            store,
            sessions,
        }
    }

    #[tokio::test]
    async fn add_content_indexes_chunks_once() {
        let f = fixture();
        let text = (0..30)
            .map(|i| format!("Sentence {} about agile delivery.", i))
            .collect::<Vec<_>>()
            .join(" ");

        let added = f.service.add_content(&text, Some("scrum.txt")).await.unwrap();
        assert!(added > 1);
        assert_eq!(f.store.len().await.unwrap(), added);

        let again = f.service.add_content(&text, Some("scrum.txt")).await.unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn blank_content_is_rejected() {
        let f = fixture();
        assert!(matches!(
            f.service.add_content("   ", None).await.unwrap_err(),
            GenerationError::InvalidRequest(_)
        ));
    }

    #[tokio::test]
    async fn path_like_source_names_are_rejected() {
        let f = fixture();
        let err = f.service.add_content("text", Some("../escape.txt")).await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn added_content_is_written_to_knowledge_dir() {
        let temp_dir = TempDir::new().unwrap();
        let f = fixture();
        let service = f.service.with_knowledge_dir(temp_dir.path());

        service.add_content("Kanban limits work in progress", Some("kanban.md")).await.unwrap();

        let saved = std::fs::read_to_string(temp_dir.path().join("kanban.md")).unwrap();
        assert_eq!(saved, "Kanban limits work in progress");
    }

    #[tokio::test]
    async fn learn_from_latest_response_by_default() {
        let f = fixture();
        let mut session = f.sessions.resolve_session("").await.unwrap();
        for query in ["first question", "second question"] {
            let envelope = ArtifactEnvelope::with_text(ResponseStatus::GeneralResponse, query, "answer");
            f.sessions
                .append_turn(&mut session, TargetSchema::Requirements, query, envelope, vec![])
                .await
                .unwrap();
        }
        let id = session.id().to_string();
        drop(session);

        let learned = f.service.learn_from_response(&id, None, None).await.unwrap();
        assert!(learned.content.starts_with("Question: second question\n\nAnswer: "));
        assert_eq!(learned.source, format!("learned_{}_1.txt", id));
        assert!(learned.chunks_added >= 1);

        let first = f.service.learn_from_response(&id, Some(0), Some("first.txt")).await.unwrap();
        assert!(first.content.starts_with("Question: first question"));
        assert_eq!(first.source, "first.txt");
    }

    #[tokio::test]
    async fn learn_from_response_reports_bad_indexes() {
        let f = fixture();
        let unknown = f.service.learn_from_response("not-a-session", None, None).await;
        assert!(matches!(unknown.unwrap_err(), GenerationError::SessionNotFound(_)));

        let mut session = f.sessions.resolve_session("").await.unwrap();
        let envelope = ArtifactEnvelope::with_text(ResponseStatus::GeneralResponse, "q", "a");
        f.sessions
            .append_turn(&mut session, TargetSchema::Requirements, "q", envelope, vec![])
            .await
            .unwrap();
        let id = session.id().to_string();
        drop(session);

        let out_of_range = f.service.learn_from_response(&id, Some(5), None).await;
        assert!(matches!(out_of_range.unwrap_err(), GenerationError::InvalidRequest(_)));
    }

    /// Single-page PDF drawing `text` in Helvetica, with a correct xref table.
    fn minimal_pdf(text: &str) -> Vec<u8> {
        let stream = format!("BT /F1 12 Tf 72 712 Td ({}) Tj ET", text);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>".to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", stream.len(), stream),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
        ];

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
        }
        let xref = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for offset in offsets {
            pdf.push_str(&format!("{:010} 00000 n \n", offset));
        }
        pdf.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        ));
        pdf.into_bytes()
    }

    #[tokio::test]
    async fn ingest_directory_skips_unsupported_and_unreadable_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.md"), "Epics group user stories").unwrap();
        std::fs::write(temp_dir.path().join("b.txt"), "Backlog refinement keeps items ready").unwrap();
        std::fs::write(temp_dir.path().join("c.pdf"), "not really a pdf").unwrap();
        std::fs::write(temp_dir.path().join("d.csv"), "id,title").unwrap();

        let f = fixture();
        let report = f.service.ingest_directory(temp_dir.path()).await.unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.chunks_added, 2);
        assert_eq!(f.store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn pdf_text_is_extracted_and_indexed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("guide.pdf");
        std::fs::write(&path, minimal_pdf("Sprint reviews inspect the increment")).unwrap();

        let text = load_text(&path).await.unwrap();
        assert!(text.contains("Sprint"));

        let f = fixture();
        let report = f.service.ingest_directory(temp_dir.path()).await.unwrap();
        assert_eq!(report.files, 1);
        assert_eq!(report.chunks_added, 1);
    }

    #[tokio::test]
    async fn ingest_is_limited_to_configured_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("agile")).unwrap();
        std::fs::create_dir(temp_dir.path().join("other")).unwrap();
        std::fs::write(temp_dir.path().join("agile").join("a.txt"), "Stories fit in one sprint").unwrap();
        std::fs::write(temp_dir.path().join("other").join("b.txt"), "Unrelated notes").unwrap();
        std::fs::write(temp_dir.path().join("root.txt"), "Top level file").unwrap();

        let f = fixture();
        let service = f
            .service
            .with_subdirs(vec!["agile".to_string(), "missing".to_string()]);
        let report = service.ingest_directory(temp_dir.path()).await.unwrap();
        assert_eq!(report.files, 1);
        assert_eq!(report.chunks_added, 1);
        assert_eq!(f.store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_directory_ingests_nothing() {
        let f = fixture();
        let report = f
            .service
            .ingest_directory(Path::new("/definitely/not/here"))
            .await
            .unwrap();
        assert_eq!(report, IngestReport::default());
    }
}
