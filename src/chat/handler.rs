//! 채팅 요청 경계
//!
//! 전송 계층(HTTP, CLI, REPL)과 무관하게 JSON 요청 본문을 받아
//! 상태 코드 + JSON 응답으로 변환합니다.
//!
//! - 200: `ChatResult` (COMPLETO / FALHA)
//! - 400: `{"error": "Consulta vazia"}`
//! - 500: 내부 오류 `ChatResult` (세부 정보 없음)

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::HandlerConfig;

use super::composer::ChatResult;
use super::pipeline::{ChatError, ChatPipeline, EMPTY_QUERY_ERROR};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

// ============================================================================
// Types
// ============================================================================

/// 요청 본문
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: String,
}

/// 오류 응답 본문
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// 응답 본문
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyBody {
    Result(ChatResult),
    Error(ErrorBody),
}

/// 경계 응답 (상태 코드 + 본문)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub status_code: u16,
    pub body: ReplyBody,
}

impl ChatReply {
    fn ok(result: ChatResult) -> Self {
        Self {
            status_code: STATUS_OK,
            body: ReplyBody::Result(result),
        }
    }

    fn bad_request(message: &str) -> Self {
        Self {
            status_code: STATUS_BAD_REQUEST,
            body: ReplyBody::Error(ErrorBody {
                error: message.to_string(),
            }),
        }
    }

    fn internal_error() -> Self {
        Self {
            status_code: STATUS_INTERNAL_ERROR,
            body: ReplyBody::Result(ChatResult::internal_error()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    /// 결과 본문 (오류 본문이면 None)
    pub fn result(&self) -> Option<&ChatResult> {
        match &self.body {
            ReplyBody::Result(result) => Some(result),
            ReplyBody::Error(_) => None,
        }
    }

    /// JSON 직렬화
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.body)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.body)
    }
}

// ============================================================================
// ChatHandler
// ============================================================================

/// 채팅 요청 핸들러
pub struct ChatHandler {
    pipeline: Arc<ChatPipeline>,
    config: HandlerConfig,
}

impl ChatHandler {
    pub fn new(pipeline: Arc<ChatPipeline>, config: HandlerConfig) -> Self {
        Self { pipeline, config }
    }

    pub fn pipeline(&self) -> &ChatPipeline {
        &self.pipeline
    }

    /// JSON 요청 본문 처리
    ///
    /// 파싱할 수 없는 본문이나 문자열이 아닌 `query`는 빈 쿼리로 취급합니다.
    pub async fn handle(&self, body: &str) -> ChatReply {
        let request = match serde_json::from_str::<ChatRequest>(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Malformed chat request: {}", e);
                ChatRequest::default()
            }
        };

        self.handle_query(&request.query).await
    }

    /// 이미 추출된 쿼리 처리
    pub async fn handle_query(&self, query: &str) -> ChatReply {
        let query = query.trim();
        if query.is_empty() {
            tracing::warn!("Rejected empty chat query");
            return ChatReply::bad_request(EMPTY_QUERY_ERROR);
        }

        // 검색 지연
        self.simulate_latency().await;

        let result = self.answer_blocking(query).await;

        match result {
            Ok(result) => {
                // 생성 지연
                self.simulate_latency().await;
                ChatReply::ok(result)
            }
            Err(ChatError::EmptyQuery) => ChatReply::bad_request(EMPTY_QUERY_ERROR),
            Err(ChatError::Internal(message)) => {
                tracing::error!("Chat pipeline failed: {}", message);
                ChatReply::internal_error()
            }
        }
    }

    /// 파이프라인 호출 (blocking 스레드 풀에서 실행)
    ///
    /// 전체 코퍼스 스코어링이 런타임 스레드를 막지 않도록 `spawn_blocking`으로 넘깁니다.
    /// 패닉은 `ChatError::Internal`로 변환합니다.
    async fn answer_blocking(&self, query: &str) -> Result<ChatResult, ChatError> {
        let pipeline = Arc::clone(&self.pipeline);
        let query = query.to_string();

        match tokio::task::spawn_blocking(move || pipeline.answer(&query)).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(ChatError::Internal(panic_message(e.into_panic()))),
            Err(e) => Err(ChatError::Internal(e.to_string())),
        }
    }

    async fn simulate_latency(&self) {
        if !self.config.simulated_latency.is_zero() {
            tokio::time::sleep(self.config.simulated_latency).await;
        }
    }
}

/// 패닉 페이로드에서 메시지 추출
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::composer::ChatStatus;
    use crate::config::PipelineConfig;
    use crate::knowledge::{KnowledgeStore, Retriever, SimilarityScorer, Source};
    use std::time::{Duration, Instant};

    fn store() -> Arc<KnowledgeStore> {
        Arc::new(KnowledgeStore::from_sources(vec![
            Source::new("docs", "DocsA").with_entry("how to install", "run setup.sh")
        ]))
    }

    fn handler() -> ChatHandler {
        let pipeline = ChatPipeline::new(store(), PipelineConfig::default());
        ChatHandler::new(Arc::new(pipeline), HandlerConfig::default())
    }

    /// 항상 패닉하는 스코어러
    struct PanickingScorer;

    impl SimilarityScorer for PanickingScorer {
        fn score(&self, _a: &str, _b: &str) -> f64 {
            panic!("corrupted entry");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    /// 호출마다 오래 걸리는 스코어러
    struct SlowScorer(Duration);

    impl SimilarityScorer for SlowScorer {
        fn score(&self, _a: &str, _b: &str) -> f64 {
            std::thread::sleep(self.0);
            1.0
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_handle_complete() {
        let reply = handler().handle(r#"{"query": "How To Install?"}"#).await;

        assert_eq!(reply.status_code, 200);
        assert!(reply.is_success());

        let result = reply.result().unwrap();
        assert_eq!(result.status, ChatStatus::Complete);
        assert_eq!(result.source, "DocsA");

        let json: serde_json::Value = serde_json::from_str(&reply.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "COMPLETO");
        assert_eq!(json["source"], "DocsA");
        assert!(json["response"]
            .as_str()
            .unwrap()
            .contains("- run setup.sh"));
    }

    #[tokio::test]
    async fn test_handle_no_match_is_ok() {
        let reply = handler().handle(r#"{"query": "zzz"}"#).await;

        assert_eq!(reply.status_code, 200);
        assert_eq!(reply.result().unwrap().status, ChatStatus::NoMatch);
    }

    #[tokio::test]
    async fn test_handle_empty_or_missing_query() {
        let h = handler();

        for body in [
            r#"{"query": ""}"#,
            r#"{"query": "   "}"#,
            r#"{}"#,
            r#"{"query": 42}"#,
            "not json",
        ] {
            let reply = h.handle(body).await;
            assert_eq!(reply.status_code, 400, "body: {}", body);
            assert_eq!(
                reply.body,
                ReplyBody::Error(ErrorBody {
                    error: "Consulta vazia".to_string()
                })
            );
            assert_eq!(reply.to_json().unwrap(), r#"{"error":"Consulta vazia"}"#);
        }
    }

    #[tokio::test]
    async fn test_handle_internal_failure() {
        let pipeline = ChatPipeline::with_retriever(
            store(),
            PipelineConfig::default(),
            Retriever::new(Box::new(PanickingScorer)),
        );
        let h = ChatHandler::new(Arc::new(pipeline), HandlerConfig::default());

        let reply = h.handle_query("how to install").await;

        assert_eq!(reply.status_code, 500);
        let result = reply.result().unwrap();
        assert_eq!(result.status, ChatStatus::InternalError);
        assert_eq!(result.source, "Sistema");
        assert!(!result.response.contains("corrupted"));
    }

    #[tokio::test]
    async fn test_handle_is_idempotent() {
        let h = handler();
        let first = h.handle(r#"{"query": "how to install"}"#).await;
        let second = h.handle(r#"{"query": "how to install"}"#).await;
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[tokio::test]
    async fn test_simulated_latency() {
        let pipeline = ChatPipeline::new(store(), PipelineConfig::default());
        let h = ChatHandler::new(Arc::new(pipeline), HandlerConfig::with_latency_ms(10));

        let start = Instant::now();
        let reply = h.handle_query("how to install").await;
        assert!(reply.is_success());
        // 검색 전 + 생성 후
        assert!(start.elapsed() >= Duration::from_millis(20));

        let reply = h.handle_query("").await;
        assert_eq!(reply.status_code, 400);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_scan_does_not_block_runtime() {
        let pipeline = ChatPipeline::with_retriever(
            store(),
            PipelineConfig::default(),
            Retriever::new(Box::new(SlowScorer(Duration::from_millis(300)))),
        );
        let h = ChatHandler::new(Arc::new(pipeline), HandlerConfig::default());

        let start = Instant::now();
        let ticker = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            start.elapsed()
        });

        let reply = h.handle_query("how to install").await;
        let query_elapsed = start.elapsed();
        let ticked_at = ticker.await.unwrap();

        assert!(reply.is_success());
        assert!(query_elapsed >= Duration::from_millis(300));
        // 스캔 중에도 1ms 타이머가 먼저 깨어남
        assert!(ticked_at < Duration::from_millis(150), "ticker at {:?}", ticked_at);
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let h = Arc::new(handler());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let h = Arc::clone(&h);
                tokio::spawn(async move { h.handle_query("how to install").await })
            })
            .collect();

        for task in tasks {
            let reply = task.await.unwrap();
            assert_eq!(reply.result().unwrap().source, "DocsA");
        }
    }
}
