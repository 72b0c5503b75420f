//! 검색기 - 전체 코퍼스 스코어링 + 임계값 필터 + 정렬
//!
//! 쿼리를 한 번 정규화한 뒤 모든 (소스, 질문, 답변)에 대해 점수를 계산합니다.
//! 결과는 점수 내림차순이며, 동점이면 코퍼스 순회 순서를 유지합니다 (안정 정렬).

use super::normalize::normalize;
use super::similarity::{default_scorer, SimilarityScorer};
use super::store::KnowledgeStore;

/// 기본 포함 임계값
pub const DEFAULT_THRESHOLD: f64 = 0.4;

// ============================================================================
// Types
// ============================================================================

/// 검색 매칭 결과
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// 유사도 점수 (0.0 ~ 1.0)
    pub score: f64,
    /// 원본 질문 (정규화 전)
    pub question: String,
    /// 원본 답변
    pub answer: String,
    /// 소스 표시 라벨
    pub source_label: String,
}

// ============================================================================
// Retriever
// ============================================================================

/// 유사도 검색기
///
/// 상태를 갖지 않으므로 여러 스레드에서 동시에 호출해도 안전합니다.
pub struct Retriever {
    scorer: Box<dyn SimilarityScorer>,
}

impl Retriever {
    pub fn new(scorer: Box<dyn SimilarityScorer>) -> Self {
        Self { scorer }
    }

    /// 시퀀스 비율 스코어러 사용
    pub fn with_defaults() -> Self {
        Self::new(default_scorer())
    }

    /// 쿼리와 비슷한 질문 검색
    ///
    /// # Arguments
    /// * `query` - 사용자 쿼리 (정규화 전)
    /// * `store` - 지식 저장소
    /// * `threshold` - 포함 최소 점수 (이상)
    ///
    /// # Returns
    /// 점수 내림차순 매칭 목록. 아무것도 넘지 못하면 빈 목록.
    pub fn retrieve(&self, query: &str, store: &KnowledgeStore, threshold: f64) -> Vec<Match> {
        let normalized_query = normalize(query);
        let mut matches = Vec::new();

        for item in store.entries() {
            let score = self
                .scorer
                .score(&normalized_query, &normalize(&item.entry.question));

            if score >= threshold {
                matches.push(Match {
                    score,
                    question: item.entry.question.clone(),
                    answer: item.entry.answer.clone(),
                    source_label: item.source.label.clone(),
                });
            }
        }

        // sort_by는 안정 정렬
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::debug!(
            "Retrieved {} matches for {:?} (threshold={}, scorer={})",
            matches.len(),
            normalized_query,
            threshold,
            self.scorer.name()
        );

        matches
    }
}

impl Default for Retriever {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Tests
// ============================================================================
