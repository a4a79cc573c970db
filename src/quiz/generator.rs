//! Quiz assembly: weighted draw over the vocabulary pool, per-question
//! kind selection and multiple-choice distractor construction.

use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

use crate::quiz::sampler::select_weighted;
use crate::quiz::shuffle::shuffle;
use crate::quiz::types::{Question, QuestionKind, QuizError, WeightedItem, DEFAULT_WEIGHT};
use crate::store::operations::vocabulary::VocabularyItem;

const QUESTION_KINDS: [QuestionKind; 3] = [
    QuestionKind::EnToJp,
    QuestionKind::JpToEn,
    QuestionKind::MultipleChoice,
];

/// Build a quiz of up to `question_count` questions from the pool,
/// drawing items by the learner's weights (1.0 for unseen entries).
/// The draw order becomes the fixed presentation order of the quiz.
///
/// A pool smaller than `question_count` yields a shorter quiz; an empty
/// pool is an error. Pools smaller than `option_count` produce
/// multiple-choice questions with fewer options (see DESIGN.md).
pub fn synthesize<R: Rng + ?Sized>(
    pool: &[VocabularyItem],
    weights: &HashMap<String, f64>,
    question_count: usize,
    option_count: usize,
    rng: &mut R,
) -> Result<Vec<Question>, QuizError> {
    if pool.is_empty() {
        return Err(QuizError::InsufficientVocabulary {
            available: 0,
            needed: question_count.max(1),
        });
    }

    let weighted: Vec<WeightedItem<&VocabularyItem>> = pool
        .iter()
        .map(|item| WeightedItem {
            id: item.id.clone(),
            weight: weights.get(&item.id).copied().unwrap_or(DEFAULT_WEIGHT),
            data: item,
        })
        .collect();

    let drawn = select_weighted(weighted, question_count, rng);

    let questions = drawn
        .into_iter()
        .map(|picked| {
            let kind = QUESTION_KINDS[rng.gen_range(0..QUESTION_KINDS.len())];
            build_question(picked.data, pool, kind, option_count, rng)
        })
        .collect();

    Ok(questions)
}

fn build_question<R: Rng + ?Sized>(
    vocab: &VocabularyItem,
    pool: &[VocabularyItem],
    kind: QuestionKind,
    option_count: usize,
    rng: &mut R,
) -> Question {
    let (prompt, correct_answer, options) = match kind {
        QuestionKind::EnToJp => (
            format!(
                "次の英単語の意味を日本語で答えてください:\n\n*{}*",
                vocab.english
            ),
            vocab.japanese.clone(),
            None,
        ),
        QuestionKind::JpToEn => (
            format!(
                "次の日本語に対応する英単語を答えてください:\n\n*{}*",
                vocab.japanese
            ),
            vocab.english.clone(),
            None,
        ),
        QuestionKind::MultipleChoice => {
            let options = build_options(vocab, pool, option_count, rng);
            (
                format!("次の英単語の意味を選んでください:\n\n*{}*", vocab.english),
                vocab.japanese.clone(),
                Some(options),
            )
        }
    };

    Question {
        id: Uuid::new_v4().to_string(),
        vocabulary_id: vocab.id.clone(),
        kind,
        prompt,
        correct_answer,
        options,
        english: vocab.english.clone(),
        japanese: vocab.japanese.clone(),
    }
}

/// Distractors come from other pool entries, so they never equal the
/// correct answer by id. Duplicate Japanese terms inside the pool can
/// still produce duplicate option text; the pool is curated, so that is
/// accepted.
fn build_options<R: Rng + ?Sized>(
    vocab: &VocabularyItem,
    pool: &[VocabularyItem],
    option_count: usize,
    rng: &mut R,
) -> Vec<String> {
    let distractor_pool: Vec<&VocabularyItem> =
        pool.iter().filter(|entry| entry.id != vocab.id).collect();

    let wrong_count = option_count.saturating_sub(1);
    let mut options: Vec<String> = shuffle(&distractor_pool, rng)
        .into_iter()
        .take(wrong_count)
        .map(|entry| entry.japanese.clone())
        .collect();
    options.push(vocab.japanese.clone());

    shuffle(&options, rng)
}
