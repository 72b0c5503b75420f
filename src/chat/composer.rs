//! 응답 합성기
//!
//! 상위 매칭의 답변을 글머리표 줄로 이어 붙이고, 출처 라벨을 중복 제거해서
//! 응답 끝에 붙입니다. 매칭이 없으면 고정 안내 문구를 반환합니다.

use serde::Serialize;

use crate::config::DEFAULT_MAX_MATCHES;
use crate::knowledge::Match;

/// 매칭 없음 응답의 출처 라벨
pub const NO_SOURCE_LABEL: &str = "Nenhuma Fonte Encontrada";

/// 매칭 없음 안내 문구
pub const NO_MATCH_RESPONSE: &str = "Desculpe, não encontrei uma resposta precisa na base de conhecimento. \
     Tente reformular sua pergunta ou pergunte sobre **SquareOS**, **LINEAX**, **Segurança**, ou outros módulos.";

/// 내부 오류 응답의 출처 라벨
pub const SYSTEM_SOURCE_LABEL: &str = "Sistema";

/// 내부 오류 안내 문구
pub const INTERNAL_ERROR_RESPONSE: &str = "Ocorreu um erro inesperado no console RAG/LLM.";

/// 출처 줄 접두어
pub const SOURCES_FOOTER_PREFIX: &str = "Fonte(s) de referência: ";

const LABEL_SEPARATOR: &str = ", ";

// ============================================================================
// Types
// ============================================================================

/// 응답 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChatStatus {
    /// 매칭된 답변으로 응답 완료
    #[serde(rename = "COMPLETO")]
    Complete,
    /// 임계값을 넘는 매칭 없음
    #[serde(rename = "FALHA")]
    NoMatch,
    /// 처리 중 예상치 못한 실패
    #[serde(rename = "ERRO INTERNO")]
    InternalError,
}

impl ChatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Complete => "COMPLETO",
            ChatStatus::NoMatch => "FALHA",
            ChatStatus::InternalError => "ERRO INTERNO",
        }
    }
}

/// 질의 1건의 최종 결과
///
/// JSON: `{"status": ..., "response": ..., "source": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatResult {
    pub status: ChatStatus,
    pub response: String,
    pub source: String,
}

impl ChatResult {
    /// 매칭 없음 결과
    pub fn no_match() -> Self {
        Self {
            status: ChatStatus::NoMatch,
            response: NO_MATCH_RESPONSE.to_string(),
            source: NO_SOURCE_LABEL.to_string(),
        }
    }

    /// 내부 오류 결과 (세부 정보는 담지 않음)
    pub fn internal_error() -> Self {
        Self {
            status: ChatStatus::InternalError,
            response: INTERNAL_ERROR_RESPONSE.to_string(),
            source: SYSTEM_SOURCE_LABEL.to_string(),
        }
    }
}

// ============================================================================
// ResponseComposer
// ============================================================================

/// 응답 합성기
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    max_matches: usize,
}

impl ResponseComposer {
    /// # Arguments
    /// * `max_matches` - 응답에 합칠 최대 매칭 수 (0이면 1로 취급)
    pub fn new(max_matches: usize) -> Self {
        Self {
            max_matches: max_matches.max(1),
        }
    }

    pub fn max_matches(&self) -> usize {
        self.max_matches
    }

    /// 순위가 매겨진 매칭 목록으로 응답 생성
    ///
    /// 출처 라벨 순서는 의미가 없습니다 (집합으로 비교할 것).
    /// 현재 구현은 처음 등장한 순서를 유지합니다.
    pub fn compose(&self, matches: &[Match]) -> ChatResult {
        if matches.is_empty() {
            return ChatResult::no_match();
        }

        let selected = &matches[..matches.len().min(self.max_matches)];

        let mut combined = String::new();
        for m in selected {
            combined.push_str("- ");
            combined.push_str(&m.answer);
            combined.push('\n');
        }

        let sources = unique_labels(selected).join(LABEL_SEPARATOR);
        let response = format!("{}\n\n{}{}", combined, SOURCES_FOOTER_PREFIX, sources);

        ChatResult {
            status: ChatStatus::Complete,
            response,
            source: sources,
        }
    }
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MATCHES)
    }
}

/// 중복 제거된 출처 라벨 (처음 등장 순)
fn unique_labels(matches: &[Match]) -> Vec<&str> {
    let mut labels: Vec<&str> = Vec::with_capacity(matches.len());
    for m in matches {
        if !labels.contains(&m.source_label.as_str()) {
            labels.push(&m.source_label);
        }
    }
    labels
}

// ============================================================================
// Tests
// ============================================================================
