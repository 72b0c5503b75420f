//! 시퀀스 유사도 - Ratcliff/Obershelp 비율
//!
//! 두 문자열에서 가장 긴 공통 연속 부분 문자열을 찾고, 그 좌우의 남은 구간에서
//! 재귀적으로 같은 작업을 반복합니다. 점수는 `2 * M / T` 입니다.
//! (M: 매칭 블록 길이 합, T: 두 문자열 길이 합)
//!
//! ref: https://docs.python.org/3/library/difflib.html#sequencematcher-objects
//!
//! 토큰이 아닌 문자(char) 단위이며 순서에 민감합니다.

use std::collections::HashMap;

/// `b`가 이 길이 이상이면 자주 등장하는 문자를 시드에서 제외 (auto-junk)
const AUTOJUNK_MIN_LEN: usize = 200;

// ============================================================================
// SimilarityScorer Trait
// ============================================================================

/// 유사도 스코어러 트레이트
///
/// 정규화된 두 문자열의 유사도를 0.0 ~ 1.0 으로 반환합니다.
/// 같은 입력에는 항상 같은 점수를 반환해야 합니다.
pub trait SimilarityScorer: Send + Sync {
    /// 유사도 계산 (`a`: 쿼리, `b`: 저장된 질문)
    fn score(&self, a: &str, b: &str) -> f64;

    /// 스코어러 이름
    fn name(&self) -> &'static str;
}

/// 기본 스코어러 (시퀀스 매칭 비율)
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRatio;

impl SimilarityScorer for SequenceRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        sequence_ratio(a, b)
    }

    fn name(&self) -> &'static str {
        "sequence-ratio"
    }
}

/// 기본 스코어러 생성
pub fn default_scorer() -> Box<dyn SimilarityScorer> {
    Box::new(SequenceRatio)
}

/// 두 문자열의 시퀀스 매칭 비율
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    SequenceMatcher::new(a, b).ratio()
}

// ============================================================================
// SequenceMatcher
// ============================================================================

/// 매칭 블록: `a[a_start..a_start + size] == b[b_start..b_start + size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// 문자 시퀀스 매처
///
/// `b` 쪽 인덱스(문자 -> 위치 목록)를 한 번 만들어 두고 재사용합니다.
pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    pub fn new(a: &str, b: &str) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let b2j = index_positions(&b);

        Self { a, b, b2j }
    }

    /// `a[alo..ahi]`, `b[blo..bhi]` 구간에서 가장 긴 공통 블록 찾기
    ///
    /// 길이가 같은 후보가 여럿이면 `a`에서 가장 먼저 시작하는 것,
    /// 그 중에서도 `b`에서 가장 먼저 시작하는 것을 고릅니다.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchingBlock {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // j -> b[j]에서 끝나는 현재 매칭 길이
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut new_j2len: HashMap<usize, usize> = HashMap::new();

            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }

                    let prev = j
                        .checked_sub(1)
                        .and_then(|p| j2len.get(&p))
                        .copied()
                        .unwrap_or(0);
                    let k = prev + 1;
                    new_j2len.insert(j, k);

                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }

            j2len = new_j2len;
        }

        // auto-junk로 빠진 문자도 매칭 확장에는 포함
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        MatchingBlock {
            a_start: best_i,
            b_start: best_j,
            size: best_size,
        }
    }

    /// 전체 매칭 블록 목록 (위치 순 정렬, 인접 블록 병합)
    pub fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }

            blocks.push(block);

            if alo < block.a_start && blo < block.b_start {
                queue.push((alo, block.a_start, blo, block.b_start));
            }
            if block.a_start + block.size < ahi && block.b_start + block.size < bhi {
                queue.push((
                    block.a_start + block.size,
                    ahi,
                    block.b_start + block.size,
                    bhi,
                ));
            }
        }

        blocks.sort();

        let mut merged: Vec<MatchingBlock> = Vec::with_capacity(blocks.len());
        for block in blocks {
            if let Some(last) = merged.last_mut() {
                if last.a_start + last.size == block.a_start
                    && last.b_start + last.size == block.b_start
                {
                    last.size += block.size;
                    continue;
                }
            }
            merged.push(block);
        }

        merged
    }

    /// 유사도 비율 (0.0 ~ 1.0)
    ///
    /// 두 문자열이 모두 비어있으면 1.0
    pub fn ratio(&self) -> f64 {
        let matches: usize = self.matching_blocks().iter().map(|b| b.size).sum();
        let total = self.a.len() + self.b.len();

        if total == 0 {
            return 1.0;
        }

        2.0 * matches as f64 / total as f64
    }
}

/// 문자 -> 등장 위치 목록 (오름차순)
///
/// 길이가 `AUTOJUNK_MIN_LEN` 이상이면 `len / 100 + 1`회 넘게 등장하는 문자를 제거합니다.
fn index_positions(b: &[char]) -> HashMap<char, Vec<usize>> {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();

    for (j, &c) in b.iter().enumerate() {
        b2j.entry(c).or_default().push(j);
    }

    if b.len() >= AUTOJUNK_MIN_LEN {
        let limit = b.len() / 100 + 1;
        b2j.retain(|_, positions| positions.len() <= limit);
    }

    b2j
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_identical_is_one() {
        assert_eq!(sequence_ratio("how to install", "how to install"), 1.0);
        assert_eq!(sequence_ratio("x", "x"), 1.0);
    }

    #[test]
    fn test_disjoint_is_zero() {
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(sequence_ratio("", ""), 1.0);
        assert_eq!(sequence_ratio("a", ""), 0.0);
        assert_eq!(sequence_ratio("", "a"), 0.0);
    }

    #[test]
    fn test_known_ratios() {
        assert!(approx_eq(sequence_ratio("abcd", "bcde"), 0.75));
        assert!(approx_eq(sequence_ratio("abxcd", "abcd"), 8.0 / 9.0));
        assert!(approx_eq(sequence_ratio(" abcd", "abcd abcd"), 10.0 / 14.0));
        assert!(approx_eq(
            sequence_ratio("how to install?", "how to install"),
            28.0 / 29.0
        ));
        assert!(approx_eq(
            sequence_ratio("como instalar", "how to install"),
            2.0 / 3.0
        ));
    }

    #[test]
    fn test_longest_match_prefers_earliest() {
        let matcher = SequenceMatcher::new(" abcd", "abcd abcd");
        let block = matcher.find_longest_match(0, 5, 0, 9);
        assert_eq!(
            block,
            MatchingBlock {
                a_start: 0,
                b_start: 4,
                size: 5
            }
        );
    }

    #[test]
    fn test_matching_blocks() {
        let matcher = SequenceMatcher::new("abxcd", "abcd");
        let blocks = matcher.matching_blocks();
        assert_eq!(
            blocks,
            vec![
                MatchingBlock { a_start: 0, b_start: 0, size: 2 },
                MatchingBlock { a_start: 3, b_start: 2, size: 2 },
            ]
        );
    }

    #[test]
    fn test_autojunk_popular_chars_do_not_seed() {
        // 'a'가 201자 중 200번 등장 -> 시드에서 제외되고 'x'만 매칭
        let b = format!("{}x", "a".repeat(200));
        let ratio = sequence_ratio("xaaa", &b);
        assert!(approx_eq(ratio, 2.0 / 205.0));
    }

    #[test]
    fn test_autojunk_extension_across_popular_chars() {
        // 시드는 없지만 경계에서 같은 문자로 확장됨
        let b = "a".repeat(200);
        let ratio = sequence_ratio("aaa", &b);
        assert!(approx_eq(ratio, 6.0 / 203.0));
    }

    #[test]
    fn test_unicode_counts_chars_not_bytes() {
        // "é"는 2바이트지만 1문자
        assert!(approx_eq(sequence_ratio("é", "é"), 1.0));
        assert!(approx_eq(sequence_ratio("aé", "a"), 2.0 / 3.0));
    }

    #[test]
    fn test_deterministic() {
        let first = sequence_ratio("o que é o squareos?", "o que é o squareos");
        let second = sequence_ratio("o que é o squareos?", "o que é o squareos");
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_scorer_trait() {
        let scorer = default_scorer();
        assert_eq!(scorer.name(), "sequence-ratio");
        assert_eq!(scorer.score("abc", "abc"), 1.0);
    }
}
