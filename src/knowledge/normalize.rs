//! 텍스트 정규화
//!
//! 쿼리와 저장된 질문을 같은 방식으로 정규화해야 유사도 점수가 의미를 가집니다.

/// 비교용 텍스트 정규화 (소문자 변환 + 앞뒤 공백 제거)
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// 정규화 후 비어있는지 확인
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

// ============================================================================
// Tests
// ============================================================================
