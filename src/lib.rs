//! palank-faq - 로컬 FAQ RAG 콘솔
//!
//! 소스별 질문/답변 지식베이스에서 시퀀스 유사도로 가까운 질문을 찾고,
//! 상위 답변을 합쳐 출처와 함께 응답합니다.
//!
//! ```rust,ignore
//! let store = Arc::new(KnowledgeStore::load(Path::new("bases_data.json"))?);
//! let pipeline = ChatPipeline::new(store, PipelineConfig::default());
//! let result = pipeline.answer("Como instalar o SquareOS?")?;
//! ```

pub mod chat;
pub mod cli;
pub mod config;
pub mod knowledge;

// Re-exports
pub use chat::{
    ChatError, ChatHandler, ChatPipeline, ChatReply, ChatRequest, ChatResult, ChatStatus,
    ResponseComposer,
};
pub use config::{get_data_dir, resolve_kb_path, HandlerConfig, PipelineConfig};
pub use knowledge::{
    normalize, sequence_ratio, KnowledgeStore, Match, Retriever, SequenceRatio,
    SimilarityScorer, Source, StoreStats, DEFAULT_THRESHOLD,
};
