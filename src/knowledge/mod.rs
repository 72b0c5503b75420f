//! Knowledge 모듈 - FAQ 지식 저장소 + 유사도 검색
//!
//! - Store: 소스별 질문/답변 (읽기 전용, 순서 보존)
//! - Normalize: 소문자 + 앞뒤 공백 제거
//! - Similarity: Ratcliff/Obershelp 시퀀스 매칭 비율
//! - Retriever: 전체 스코어링 + 임계값 필터 + 안정 정렬

mod normalize;
mod retriever;
mod similarity;
mod store;

// Re-exports
pub use normalize::{is_blank, normalize};
pub use retriever::{Match, Retriever, DEFAULT_THRESHOLD};
pub use similarity::{
    default_scorer, sequence_ratio, MatchingBlock, SequenceMatcher, SequenceRatio,
    SimilarityScorer,
};
pub use store::{Entry, EntryRef, KnowledgeStore, Source, StoreStats};
