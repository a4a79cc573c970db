//! Block Kit payload builders. Pure data: nothing here touches the
//! transport, callers pass the results to the Slack client.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::quiz::progression::{AnswerFeedback, CompletionSummary};
use crate::quiz::types::{Question, QuestionKind};

pub const MSG_NO_ACTIVE_QUIZ: &str = "現在進行中のテストがありません。次のテストをお待ちください。";
pub const MSG_ANSWER_WITH_BUTTON: &str = "この問題はボタンで回答してください。";
pub const MSG_QUESTION_ALREADY_ANSWERED: &str = "この質問はすでに回答済みです。";
pub const MSG_LEARNER_NOT_FOUND: &str = "ユーザー情報が見つかりませんでした。";
pub const MSG_GENERIC_ERROR: &str = "エラーが発生しました。もう一度お試しください。";

/// What a multiple-choice button carries; echoed back verbatim by Slack
/// when the learner clicks, so the answer turn can be matched to the
/// question the button was rendered for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ButtonValue {
    pub session_id: String,
    pub question_id: String,
    pub answer: String,
}

/// Plain-text message body.
pub fn plain_text(text: &str) -> Value {
    json!({ "text": text })
}

/// Question message: header with progress, the prompt, and either an
/// input hint (text questions) or one button per option.
pub fn format_question(
    question: &Question,
    question_number: usize,
    total_questions: usize,
    session_id: &str,
) -> Value {
    let header = json!({
        "type": "header",
        "text": {
            "type": "plain_text",
            "text": format!("📝 問題 {question_number}/{total_questions}"),
            "emoji": true,
        },
    });
    let prompt = json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": question.prompt },
    });

    match question.kind {
        QuestionKind::MultipleChoice => {
            let options = question.options.as_deref().unwrap_or_default();
            let buttons: Vec<Value> = options
                .iter()
                .enumerate()
                .map(|(index, option)| {
                    let value = ButtonValue {
                        session_id: session_id.to_string(),
                        question_id: question.id.clone(),
                        answer: option.clone(),
                    };
                    json!({
                        "type": "button",
                        "text": { "type": "plain_text", "text": option, "emoji": true },
                        "value": serde_json::to_string(&value).unwrap_or_default(),
                        "action_id": format!("answer_{index}"),
                    })
                })
                .collect();

            json!({
                "blocks": [
                    header,
                    prompt,
                    { "type": "actions", "elements": buttons },
                ]
            })
        }
        _ => json!({
            "blocks": [
                header,
                prompt,
                {
                    "type": "context",
                    "elements": [
                        { "type": "mrkdwn", "text": "💬 回答を入力してください" },
                    ],
                },
            ]
        }),
    }
}

pub fn format_feedback(feedback: &AnswerFeedback) -> Value {
    let (emoji, result) = if feedback.is_correct {
        ("✅", "正解！")
    } else {
        ("❌", "不正解")
    };

    let mut blocks = vec![json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": format!("{emoji} *{result}*") },
    })];

    if !feedback.is_correct {
        blocks.push(json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "正しい答え: *{}*\nあなたの答え: {}",
                    feedback.correct_answer, feedback.submitted
                ),
            },
        }));
    }

    blocks.push(json!({
        "type": "context",
        "elements": [
            {
                "type": "mrkdwn",
                "text": format!("現在のスコア: {}/{}", feedback.score, feedback.total),
            },
        ],
    }));

    json!({ "blocks": blocks })
}

pub fn format_completion(summary: &CompletionSummary) -> Value {
    let tier = summary.tier;
    json!({
        "blocks": [
            {
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!("{} テスト完了！", tier.emoji()),
                    "emoji": true,
                },
            },
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": format!(
                        "*最終スコア: {}/{} ({}%)*\n\n{}",
                        summary.score, summary.total, summary.percentage, tier.message()
                    ),
                },
            },
            { "type": "divider" },
            {
                "type": "context",
                "elements": [
                    { "type": "mrkdwn", "text": "次のテストは1時間後に配信されます 📚" },
                ],
            },
        ]
    })
}

pub fn format_welcome() -> Value {
    json!({
        "blocks": [
            {
                "type": "header",
                "text": { "type": "plain_text", "text": "📚 英単語学習Bot", "emoji": true },
            },
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": "ようこそ！このBotは毎時間、英単語のテストを送信します。",
                },
            },
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": "*テストの種類:*\n• 英単語 → 日本語（テキスト入力）\n• 日本語 → 英単語（テキスト入力）\n• 4択問題（ボタン選択）",
                },
            },
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": "*仕組み:*\n正解率が低い単語ほど、出題される確率が高くなります。\n効率的に苦手な単語を克服できます！",
                },
            },
            { "type": "divider" },
            {
                "type": "context",
                "elements": [
                    { "type": "mrkdwn", "text": "次のテストまでお待ちください 🕐" },
                ],
            },
        ]
    })
}
