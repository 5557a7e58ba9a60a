use axum::{
    extract::{Path, Query, State},
    Json,
};
use diesel::{pg::PgConnection, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{NewQuestionSetRow, QuestionSetRow},
    schema::question_set_rows,
    state::AppState,
};

#[derive(Deserialize)]
pub struct CreateQsetRequest {
    #[serde(rename = "setName", default)]
    pub set_name: String,
    #[serde(default)]
    pub questions: Vec<String>,
}

#[derive(Deserialize)]
pub struct ReplaceQsetRequest {
    #[serde(default)]
    pub questions: Vec<String>,
}

#[derive(Deserialize)]
pub struct QsetListQuery {
    pub grouped: Option<String>,
}

#[derive(Serialize)]
pub struct QuestionRowResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "setName")]
    pub set_name: String,
    #[serde(rename = "questionId")]
    pub question_id: String,
    pub question: String,
}

impl From<QuestionSetRow> for QuestionRowResponse {
    fn from(row: QuestionSetRow) -> Self {
        Self {
            id: row.id,
            set_name: row.set_name,
            question_id: row.question_id,
            question: row.question,
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct QsetSummary {
    #[serde(rename = "setName")]
    pub set_name: String,
    pub questions: Vec<String>,
    pub count: usize,
}

pub async fn create_qset(
    State(state): State<AppState>,
    Json(payload): Json<CreateQsetRequest>,
) -> AppResult<Json<Value>> {
    if payload.set_name.trim().is_empty() || payload.questions.is_empty() {
        return Err(AppError::bad_request("setName and questions[] are required"));
    }

    let mut conn = state.db()?;
    let inserted = replace_rows(&mut conn, &payload.set_name, &payload.questions)?;

    Ok(Json(json!({ "success": true, "inserted": inserted })))
}

/// Saving with no questions clears the set entirely, which is deliberate:
/// it matches delete semantics and keeps ordinal ids gapless on every write.
pub async fn replace_qset(
    State(state): State<AppState>,
    Path(set_name): Path<String>,
    Json(payload): Json<ReplaceQsetRequest>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db()?;
    let replaced = replace_rows(&mut conn, &set_name, &payload.questions)?;

    Ok(Json(json!({ "success": true, "replaced": replaced })))
}

pub async fn delete_qset(
    State(state): State<AppState>,
    Path(set_name): Path<String>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db()?;

    // Deleting an absent set reports zero rows, not an error.
    let deleted =
        diesel::delete(question_set_rows::table.filter(question_set_rows::set_name.eq(&set_name)))
            .execute(&mut conn)?;

    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

pub async fn list_qsets(
    State(state): State<AppState>,
    Query(params): Query<QsetListQuery>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db()?;

    // Lexicographic ordering on question_id is intentional ("10.1" before
    // "2.1"); consumers rely on the stored textual order.
    let rows: Vec<QuestionSetRow> = question_set_rows::table
        .order((
            question_set_rows::set_name.asc(),
            question_set_rows::question_id.asc(),
        ))
        .load(&mut conn)?;

    if params.grouped.as_deref() != Some("true") {
        let items: Vec<QuestionRowResponse> =
            rows.into_iter().map(QuestionRowResponse::from).collect();
        return Ok(Json(json!({ "items": items })));
    }

    Ok(Json(json!({ "data": group_rows(rows) })))
}

/// Delete-then-insert inside one transaction, so a set is always either its
/// previous rows or the full new sequence with gapless ordinal ids.
fn replace_rows(
    conn: &mut PgConnection,
    set_name: &str,
    questions: &[String],
) -> Result<usize, diesel::result::Error> {
    conn.transaction(|conn| {
        diesel::delete(question_set_rows::table.filter(question_set_rows::set_name.eq(set_name)))
            .execute(conn)?;

        if questions.is_empty() {
            return Ok(0);
        }

        let rows = build_rows(set_name, questions);
        diesel::insert_into(question_set_rows::table)
            .values(&rows)
            .execute(conn)
    })
}

fn build_rows(set_name: &str, questions: &[String]) -> Vec<NewQuestionSetRow> {
    let base = derive_set_number(set_name);
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| NewQuestionSetRow {
            id: Uuid::new_v4(),
            set_name: set_name.to_string(),
            question_id: format!("{}.{}", base, index + 1),
            question: question.clone(),
        })
        .collect()
}

/// The numeric base for ordinal ids: the trailing dot-separated digit group
/// of the set name ("Round 2" -> "2", "v1.2.3" -> "1.2.3"), else every digit
/// in the name, else the raw name when it has none.
fn derive_set_number(set_name: &str) -> String {
    let trimmed = set_name.trim_end();
    let chars: Vec<char> = trimmed.chars().collect();

    let mut start = chars.len();
    while start > 0 && chars[start - 1].is_ascii_digit() {
        start -= 1;
    }

    if start < chars.len() {
        // Extend leftward over additional ".digits" groups.
        loop {
            if start > 1 && chars[start - 1] == '.' {
                let mut group_start = start - 1;
                while group_start > 0 && chars[group_start - 1].is_ascii_digit() {
                    group_start -= 1;
                }
                if group_start < start - 1 {
                    start = group_start;
                    continue;
                }
            }
            break;
        }
        return chars[start..].iter().collect();
    }

    let digits: String = set_name.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        set_name.to_string()
    } else {
        digits
    }
}

/// Rows arrive sorted by set name, so groups are contiguous; first-seen
/// order after the sort is preserved.
fn group_rows(rows: Vec<QuestionSetRow>) -> Vec<QsetSummary> {
    let mut groups: Vec<QsetSummary> = Vec::new();
    for row in rows {
        match groups.last_mut() {
            Some(group) if group.set_name == row.set_name => {
                group.questions.push(row.question);
                group.count += 1;
            }
            _ => groups.push(QsetSummary {
                set_name: row.set_name,
                questions: vec![row.question],
                count: 1,
            }),
        }
    }
    groups
}
