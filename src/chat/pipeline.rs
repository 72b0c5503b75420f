//! 질의 파이프라인 - 검증 -> 검색 -> 합성
//!
//! 지식 저장소는 `Arc`로 공유하고 파이프라인 자체도 상태를 갖지 않으므로
//! 같은 인스턴스를 여러 스레드/태스크에서 동시에 호출할 수 있습니다.

use std::sync::Arc;

use thiserror::Error;

use crate::config::PipelineConfig;
use crate::knowledge::{is_blank, KnowledgeStore, Match, Retriever};

use super::composer::{ChatResult, ResponseComposer};

/// 빈 쿼리 오류 메시지 (클라이언트에 그대로 노출)
pub const EMPTY_QUERY_ERROR: &str = "Consulta vazia";

/// 파이프라인 오류
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    /// 빈 쿼리 또는 공백만 있는 쿼리 (검색 전에 거부)
    #[error("Consulta vazia")]
    EmptyQuery,

    /// 검색/합성 중 예상치 못한 실패 (경계에서만 생성)
    #[error("Internal pipeline failure: {0}")]
    Internal(String),
}

/// 질의 파이프라인
pub struct ChatPipeline {
    store: Arc<KnowledgeStore>,
    retriever: Retriever,
    composer: ResponseComposer,
    config: PipelineConfig,
}

impl ChatPipeline {
    /// 기본 스코어러로 생성
    pub fn new(store: Arc<KnowledgeStore>, config: PipelineConfig) -> Self {
        Self::with_retriever(store, config, Retriever::with_defaults())
    }

    /// 검색기를 지정하여 생성
    pub fn with_retriever(
        store: Arc<KnowledgeStore>,
        config: PipelineConfig,
        retriever: Retriever,
    ) -> Self {
        let composer = ResponseComposer::new(config.max_matches);
        Self {
            store,
            retriever,
            composer,
            config,
        }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 쿼리에 대한 최종 응답
    ///
    /// 매칭이 없는 것은 오류가 아니라 `ChatStatus::NoMatch` 결과입니다.
    pub fn answer(&self, query: &str) -> Result<ChatResult, ChatError> {
        if is_blank(query) {
            return Err(ChatError::EmptyQuery);
        }

        let matches = self.search(query);
        let result = self.composer.compose(&matches);

        tracing::debug!(
            "Answered query with status {} ({} matches)",
            result.status.as_str(),
            matches.len()
        );

        Ok(result)
    }

    /// 순위가 매겨진 매칭 목록만 반환 (합성 없이)
    pub fn search(&self, query: &str) -> Vec<Match> {
        self.retriever
            .retrieve(query, &self.store, self.config.threshold)
    }
}

// ============================================================================
// Tests
// ============================================================================
