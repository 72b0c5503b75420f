//! CLI 모듈
//!
//! palank-faq CLI 명령어 정의 및 구현

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::chat::{ChatHandler, ChatPipeline, ChatReply, ReplyBody};
use crate::config::{resolve_kb_path, HandlerConfig, PipelineConfig};
use crate::knowledge::KnowledgeStore;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "palank-faq")]
#[command(version, about = "로컬 FAQ RAG 콘솔", long_about = None)]
pub struct Cli {
    /// 지식베이스 JSON 경로 (기본: $PALANK_FAQ_KB 또는 ./bases_data.json)
    #[arg(long, global = true)]
    pub kb: Option<PathBuf>,

    /// 응답 지연 시뮬레이션 (ms, 검색 전/생성 후 각각)
    #[arg(long, global = true, default_value = "0")]
    pub latency_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 질문 1건에 답변
    Ask {
        /// 질문
        query: String,

        /// 응답 JSON 그대로 출력
        #[arg(long)]
        json: bool,

        /// 매칭 점수 목록도 출력
        #[arg(long)]
        scores: bool,

        /// 포함 최소 점수 (0.0 ~ 1.0)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// 응답에 합칠 최대 매칭 수
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// 대화형 모드 (exit 또는 EOF로 종료)
    Chat {
        /// 포함 최소 점수 (0.0 ~ 1.0)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// 응답에 합칠 최대 매칭 수
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// JSON 요청 본문을 그대로 처리 (예: '{"query": "..."}')
    Request {
        /// 요청 본문
        body: String,
    },

    /// 지식 소스 목록
    Sources,

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let kb_path = resolve_kb_path(cli.kb.as_deref());
    let handler_config = HandlerConfig::with_latency_ms(cli.latency_ms);

    match cli.command {
        Commands::Ask {
            query,
            json,
            scores,
            threshold,
            limit,
        } => {
            let handler = open_handler(&kb_path, threshold, limit, handler_config)?;
            cmd_ask(&handler, &query, json, scores).await
        }
        Commands::Chat { threshold, limit } => {
            let handler = open_handler(&kb_path, threshold, limit, handler_config)?;
            cmd_chat(&handler).await
        }
        Commands::Request { body } => {
            let handler = open_handler(&kb_path, None, None, handler_config)?;
            cmd_request(&handler, &body).await
        }
        Commands::Sources => cmd_sources(&kb_path),
        Commands::Status => cmd_status(&kb_path),
    }
}

/// 지식베이스를 적재하고 핸들러 생성
///
/// 적재 실패는 치명적 오류입니다 (지식베이스 없이 응답하지 않음).
fn open_handler(
    kb_path: &Path,
    threshold: Option<f64>,
    limit: Option<usize>,
    handler_config: HandlerConfig,
) -> Result<ChatHandler> {
    let store = KnowledgeStore::load(kb_path).context("지식베이스 적재 실패")?;
    let config = PipelineConfig::from_env()?.with_overrides(threshold, limit)?;

    let pipeline = ChatPipeline::new(Arc::new(store), config);
    Ok(ChatHandler::new(Arc::new(pipeline), handler_config))
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 질문 명령어 (ask)
async fn cmd_ask(handler: &ChatHandler, query: &str, json: bool, scores: bool) -> Result<()> {
    if scores && !query.trim().is_empty() {
        let matches = handler.pipeline().search(query);
        println!("[*] 매칭 ({} 건):", matches.len());
        for (i, m) in matches.iter().enumerate() {
            println!(
                "  {}. [점수: {:.4}] [{}] {}",
                i + 1,
                m.score,
                m.source_label,
                truncate_text(&m.question, 60)
            );
        }
        println!();
    }

    let reply = handler.handle_query(query).await;

    if json {
        println!("{}", reply.to_json_pretty().context("응답 직렬화 실패")?);
        return Ok(());
    }

    print_reply(&reply)?;
    Ok(())
}

/// 대화형 명령어 (chat)
async fn cmd_chat(handler: &ChatHandler) -> Result<()> {
    let stats = handler.pipeline().store().stats();
    println!(
        "[OK] 지식베이스: {} 소스, {} 질문",
        stats.source_count, stats.entry_count
    );
    println!("     종료: exit 또는 Ctrl+D");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().context("stdout flush 실패")?;

        let Some(line) = lines.next_line().await.context("입력 읽기 실패")? else {
            println!();
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let reply = handler.handle_query(line).await;
        if let Err(e) = print_reply(&reply) {
            println!("[!] {}", e);
        }
        println!();
    }

    Ok(())
}

/// 원시 요청 명령어 (request)
///
/// 상태 코드와 JSON 응답을 출력합니다. 400/500도 정상 종료합니다.
async fn cmd_request(handler: &ChatHandler, body: &str) -> Result<()> {
    let reply = handler.handle(body).await;

    println!("HTTP {}", reply.status_code);
    println!("{}", reply.to_json_pretty().context("응답 직렬화 실패")?);

    Ok(())
}

/// 소스 목록 명령어 (sources)
fn cmd_sources(kb_path: &Path) -> Result<()> {
    let store = KnowledgeStore::load(kb_path).context("지식베이스 적재 실패")?;

    if store.sources().is_empty() {
        println!("[!] 등록된 소스가 없습니다.");
        return Ok(());
    }

    println!("[OK] 지식 소스 ({} 건):\n", store.sources().len());

    for source in store.sources() {
        println!("  {} [{}] - {} 질문", source.name, source.label, source.len());
        for entry in source.entries().iter().take(3) {
            println!("        Q: {}", truncate_text(&entry.question, 60));
        }
        if source.len() > 3 {
            println!("        ... 외 {} 건", source.len() - 3);
        }
        println!();
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(kb_path: &Path) -> Result<()> {
    println!("palank-faq v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 지식베이스 경로: {}", kb_path.display());

    match std::fs::metadata(kb_path) {
        Ok(meta) => println!("     파일 크기: {}", format_bytes(meta.len() as usize)),
        Err(e) => {
            println!("[!] 지식베이스 파일 없음: {}", e);
            return Ok(());
        }
    }

    match KnowledgeStore::load(kb_path) {
        Ok(store) => {
            let stats = store.stats();
            println!(
                "[OK] 소스: {} 건, 질문: {} 건",
                stats.source_count, stats.entry_count
            );
            println!("     SHA-256: {}", stats.fingerprint);
            println!(
                "     적재 시각: {}",
                stats.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        Err(e) => {
            println!("[!] 지식베이스 적재 실패: {:#}", e);
        }
    }

    match PipelineConfig::from_env() {
        Ok(config) => {
            println!(
                "[OK] 임계값: {}, 최대 매칭: {}",
                config.threshold, config.max_matches
            );
        }
        Err(e) => {
            println!("[!] 설정 오류: {:#}", e);
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 사람이 읽는 형식으로 응답 출력
fn print_reply(reply: &ChatReply) -> Result<()> {
    match &reply.body {
        ReplyBody::Result(result) => {
            println!("[{}]", result.status.as_str());
            println!("{}", result.response);
            println!();
            println!("출처: {}", result.source);
            Ok(())
        }
        ReplyBody::Error(error) => bail!("요청 거부 ({}): {}", reply.status_code, error.error),
    }
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from([
            "palank-faq",
            "--kb",
            "base.json",
            "ask",
            "como instalar?",
            "--json",
            "-t",
            "0.5",
        ]);

        assert_eq!(cli.kb, Some(PathBuf::from("base.json")));
        assert_eq!(cli.latency_ms, 0);
        match cli.command {
            Commands::Ask {
                query,
                json,
                threshold,
                limit,
                ..
            } => {
                assert_eq!(query, "como instalar?");
                assert!(json);
                assert_eq!(threshold, Some(0.5));
                assert_eq!(limit, None);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_print_reply_rejects_error_body() {
        let reply = ChatReply {
            status_code: 400,
            body: ReplyBody::Error(crate::chat::ErrorBody {
                error: "Consulta vazia".to_string(),
            }),
        };
        let err = print_reply(&reply).unwrap_err();
        assert!(err.to_string().contains("Consulta vazia"));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_truncate_unicode() {
        let text = "Segurança de rede";
        assert_eq!(truncate_text(text, 9), "Segurança...");
    }
}
