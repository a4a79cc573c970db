//! Answer checking: normalization, edit-distance tolerance and trailing
//! particle stripping for Japanese answers. Total over all inputs.

use crate::quiz::types::QuestionKind;

/// 学習者が省略しても誤答にしない末尾の助詞・助動詞。
const JAPANESE_PARTICLES: &[&str] = &[
    "は", "が", "を", "に", "で", "と", "から", "まで", "より", "だ", "です",
];

/// Expected answers shorter than this (in code points) must match
/// exactly; otherwise a single edit is tolerated.
const FUZZY_MIN_EXPECTED_LEN: usize = 4;

/// Lowercase, trim, and collapse internal whitespace runs to one space.
/// Lossy on purpose: casing and spacing differences should not count as
/// wrong answers.
pub fn normalize(input: &str) -> String {
    input
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Standard dynamic-programming edit distance over unicode code points,
/// two-row variant. Strings here are short, so no caching.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(prev[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b.len()]
}

/// Check a submitted answer against the expected one.
///
/// Multiple choice only ever accepts the exact (normalized) option text,
/// since the learner picks from rendered strings. Text answers tolerate
/// one edit when the expected answer is long enough, and an answer in
/// Japanese additionally matches when it only omits one trailing
/// particle.
pub fn validate(submitted: &str, expected: &str, kind: QuestionKind) -> bool {
    let submitted = normalize(submitted);
    let expected = normalize(expected);

    if submitted == expected {
        return true;
    }

    if kind == QuestionKind::MultipleChoice {
        return false;
    }

    let threshold = usize::from(expected.chars().count() >= FUZZY_MIN_EXPECTED_LEN);
    if levenshtein(&submitted, &expected) <= threshold {
        return true;
    }

    // 期待解が日本語（英→日）の場合のみ助詞落ちを許容する。
    if kind == QuestionKind::EnToJp {
        for particle in JAPANESE_PARTICLES {
            if let Some(stripped) = expected.strip_suffix(particle) {
                if submitted == stripped {
                    return true;
                }
            }
        }
    }

    false
}
