//! Chat 모듈 - 질의 파이프라인 + 응답 합성 + 요청 경계
//!
//! 쿼리 -> 검증 -> 검색 (Retriever) -> 합성 (ResponseComposer) -> ChatResult

mod composer;
mod handler;
mod pipeline;

// Re-exports
pub use composer::{
    ChatResult, ChatStatus, ResponseComposer, INTERNAL_ERROR_RESPONSE, NO_MATCH_RESPONSE,
    NO_SOURCE_LABEL, SOURCES_FOOTER_PREFIX, SYSTEM_SOURCE_LABEL,
};
pub use handler::{
    ChatHandler, ChatReply, ChatRequest, ErrorBody, ReplyBody, STATUS_BAD_REQUEST,
    STATUS_INTERNAL_ERROR, STATUS_OK,
};
pub use pipeline::{ChatError, ChatPipeline, EMPTY_QUERY_ERROR};
