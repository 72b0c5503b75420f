//! 설정 모듈
//!
//! 지식베이스 경로, 검색 임계값, 응답 지연 시뮬레이션 설정을 해석합니다.
//!
//! 우선순위: CLI 인자 > 환경변수 > 기본값

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::knowledge::DEFAULT_THRESHOLD;

/// 지식베이스 경로 환경변수
pub const ENV_KB_PATH: &str = "PALANK_FAQ_KB";
/// 임계값 환경변수
pub const ENV_THRESHOLD: &str = "PALANK_FAQ_THRESHOLD";
/// 기본 지식베이스 파일명
pub const DEFAULT_KB_FILE: &str = "bases_data.json";
/// 응답 하나에 합치는 기본 최대 매칭 수
pub const DEFAULT_MAX_MATCHES: usize = 3;

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.palank-faq/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".palank-faq")
}

// ============================================================================
// PipelineConfig
// ============================================================================

/// 질의 파이프라인 설정
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 포함 최소 점수 (0.0 ~ 1.0, 이상)
    pub threshold: f64,
    /// 응답에 합칠 최대 매칭 수
    pub max_matches: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }
}

impl PipelineConfig {
    /// 환경변수를 반영한 설정
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_THRESHOLD) {
            if !raw.trim().is_empty() {
                config.threshold = parse_threshold(&raw)
                    .with_context(|| format!("Invalid {}", ENV_THRESHOLD))?;
                tracing::debug!("Using threshold from {}: {}", ENV_THRESHOLD, config.threshold);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// CLI 인자 덮어쓰기
    pub fn with_overrides(mut self, threshold: Option<f64>, max_matches: Option<usize>) -> Result<Self> {
        if let Some(threshold) = threshold {
            self.threshold = threshold;
        }
        if let Some(max_matches) = max_matches {
            self.max_matches = max_matches;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            bail!(
                "Invalid threshold: {}. Must be between 0.0 and 1.0",
                self.threshold
            );
        }
        if self.max_matches == 0 {
            bail!("Invalid max_matches: 0. Must be at least 1");
        }
        Ok(())
    }
}

fn parse_threshold(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a number", raw.trim()))?;
    Ok(value)
}

// ============================================================================
// HandlerConfig
// ============================================================================

/// 요청 경계 설정
#[derive(Debug, Clone, Default)]
pub struct HandlerConfig {
    /// 검색 전/생성 후 각각 대기할 시간 (LLM 응답 지연 흉내, 0이면 없음)
    pub simulated_latency: Duration,
}

impl HandlerConfig {
    pub fn with_latency_ms(ms: u64) -> Self {
        Self {
            simulated_latency: Duration::from_millis(ms),
        }
    }
}

// ============================================================================
// Knowledge Base Path
// ============================================================================

/// 지식베이스 경로 결정
///
/// 우선순위:
/// 1. `--kb` 인자
/// 2. `PALANK_FAQ_KB` 환경변수
/// 3. 현재 디렉토리의 `bases_data.json` (있을 때)
/// 4. `~/.palank-faq/bases_data.json`
pub fn resolve_kb_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ENV_KB_PATH) {
        if !path.is_empty() {
            tracing::debug!("Using knowledge base from {}", ENV_KB_PATH);
            return PathBuf::from(path);
        }
    }

    let local = PathBuf::from(DEFAULT_KB_FILE);
    if local.exists() {
        return local;
    }

    get_data_dir().join(DEFAULT_KB_FILE)
}

// ============================================================================
// Tests
// ============================================================================
