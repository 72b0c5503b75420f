//! Knowledge Store - 읽기 전용 FAQ 지식 저장소
//!
//! 소스별 질문/답변 쌍을 메모리에 적재합니다. 적재 후에는 변경되지 않으며,
//! 다시 읽으려면 새 저장소를 만들어 통째로 교체합니다.
//!
//! JSON 형식:
//! ```json
//! {
//!   "squareos": {
//!     "source": "Manual SquareOS",
//!     "data": { "o que é o squareos?": "Um sistema operacional ..." }
//!   }
//! }
//! ```
//! 소스 순서와 소스 내 질문 순서는 문서에 적힌 순서를 그대로 유지합니다.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

// ============================================================================
// Types
// ============================================================================

/// 질문/답변 엔트리
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub question: String,
    pub answer: String,
}

/// 지식 소스 (질문 -> 답변 순서 보존 매핑)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// 소스 키
    pub name: String,
    /// 표시용 라벨 (JSON의 "source" 필드)
    pub label: String,
    entries: Vec<Entry>,
}

impl Source {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            entries: Vec::new(),
        }
    }

    /// 엔트리 추가 (같은 질문이 있으면 답변을 교체하고 위치는 유지)
    pub fn with_entry(mut self, question: impl Into<String>, answer: impl Into<String>) -> Self {
        self.insert(question.into(), answer.into());
        self
    }

    fn insert(&mut self, question: String, answer: String) {
        match self.entries.iter_mut().find(|e| e.question == question) {
            Some(existing) => existing.answer = answer,
            None => self.entries.push(Entry { question, answer }),
        }
    }

    /// 엔트리 목록 (삽입 순서)
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// 질문으로 답변 조회 (정확히 일치)
    pub fn answer(&self, question: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.question == question)
            .map(|e| e.answer.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 소스 라벨이 붙은 엔트리 참조 (순회용)
#[derive(Debug, Clone, Copy)]
pub struct EntryRef<'a> {
    pub source: &'a Source,
    pub entry: &'a Entry,
}

/// 저장소 통계
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub source_count: usize,
    pub entry_count: usize,
    /// 적재한 문서의 SHA-256 (hex)
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
    pub path: Option<PathBuf>,
}

/// JSON 소스 레코드
#[derive(Debug, Deserialize)]
struct SourceRecord {
    source: String,
    data: Map<String, Value>,
}

// ============================================================================
// KnowledgeStore
// ============================================================================

/// Knowledge Store - 읽기 전용 지식 저장소
///
/// 프로세스 시작 시 한 번 만들고 `Arc`로 공유합니다.
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    sources: Vec<Source>,
    fingerprint: String,
    loaded_at: DateTime<Utc>,
    path: Option<PathBuf>,
}

impl KnowledgeStore {
    /// 빈 저장소
    pub fn empty() -> Self {
        Self::from_sources(Vec::new())
    }

    /// 소스 목록으로 생성 (테스트, 임베딩 용도)
    ///
    /// 같은 이름의 소스가 여러 번 오면 나중 것이 앞 것의 자리를 대신합니다.
    pub fn from_sources(sources: Vec<Source>) -> Self {
        let mut unique: Vec<Source> = Vec::with_capacity(sources.len());
        for source in sources {
            match unique.iter_mut().find(|s| s.name == source.name) {
                Some(existing) => *existing = source,
                None => unique.push(source),
            }
        }

        let fingerprint = fingerprint_sources(&unique);

        Self {
            sources: unique,
            fingerprint,
            loaded_at: Utc::now(),
            path: None,
        }
    }

    /// JSON 파일에서 적재
    ///
    /// # Arguments
    /// * `path` - 지식베이스 JSON 파일 경로
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge base: {}", path.display()))?;

        let mut store = Self::from_json_str(&raw)
            .with_context(|| format!("Failed to parse knowledge base: {}", path.display()))?;
        store.path = Some(path.to_path_buf());

        tracing::info!(
            "Loaded knowledge base from {:?} ({} sources, {} entries)",
            path,
            store.sources.len(),
            store.entry_count()
        );

        Ok(store)
    }

    /// JSON 문자열에서 적재
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let root: Map<String, Value> =
            serde_json::from_str(raw).context("Knowledge base must be a JSON object")?;

        let mut sources = Vec::with_capacity(root.len());

        for (name, value) in root {
            let record: SourceRecord = serde_json::from_value(value)
                .with_context(|| format!("Invalid source record '{}'", name))?;

            let mut source = Source::new(name.clone(), record.source);
            for (question, answer) in record.data {
                let Value::String(answer) = answer else {
                    bail!(
                        "Answer for '{}' in source '{}' must be a string",
                        question,
                        name
                    );
                };
                // Map이 이미 중복 키를 제거했으므로 그대로 추가
                source.entries.push(Entry { question, answer });
            }

            sources.push(source);
        }

        Ok(Self {
            sources,
            fingerprint: sha256_hex(raw.as_bytes()),
            loaded_at: Utc::now(),
            path: None,
        })
    }

    /// 소스 목록 (삽입 순서)
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// 이름으로 소스 조회
    pub fn source(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// 전체 엔트리 순회 (소스 순서 -> 질문 순서)
    pub fn entries(&self) -> impl Iterator<Item = EntryRef<'_>> {
        self.sources.iter().flat_map(|source| {
            source
                .entries
                .iter()
                .map(move |entry| EntryRef { source, entry })
        })
    }

    pub fn entry_count(&self) -> usize {
        self.sources.iter().map(Source::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// 적재 경로 (파일에서 읽은 경우)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 저장소 통계
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            source_count: self.sources.len(),
            entry_count: self.entry_count(),
            fingerprint: self.fingerprint.clone(),
            loaded_at: self.loaded_at,
            path: self.path.clone(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// 메모리에서 만든 저장소용 지문 (라벨/질문/답변을 NUL로 구분)
fn fingerprint_sources(sources: &[Source]) -> String {
    let mut hasher = Sha256::new();
    for source in sources {
        for part in [&source.name, &source.label] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        for entry in &source.entries {
            hasher.update(entry.question.as_bytes());
            hasher.update([0u8]);
            hasher.update(entry.answer.as_bytes());
            hasher.update([0u8]);
        }
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Tests
// ============================================================================
