use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = admins)]
pub struct Admin {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = admins)]
pub struct NewAdmin {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: String,
}

/// A submitted recording as written by the ingestion/transcription pipeline.
/// The console never creates these outside of tests.
#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = recordings)]
pub struct Recording {
    pub id: Uuid,
    pub email: Option<String>,
    pub file_name: Option<String>,
    pub s3_url: Option<String>,
    pub s3_key: Option<String>,
    pub uploaded_at: NaiveDateTime,
    pub interviewer: Option<String>,
    pub interviewee_name: Option<String>,
    pub question_set: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
    pub suggestions: Vec<String>,
    pub sentiment: Option<String>,
    pub summarized_at: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = recordings)]
pub struct NewRecording {
    pub id: Uuid,
    pub email: Option<String>,
    pub file_name: Option<String>,
    pub s3_url: Option<String>,
    pub s3_key: Option<String>,
    pub uploaded_at: NaiveDateTime,
    pub interviewer: Option<String>,
    pub interviewee_name: Option<String>,
    pub question_set: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
    pub suggestions: Vec<String>,
    pub sentiment: Option<String>,
    pub summarized_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = question_set_rows)]
pub struct QuestionSetRow {
    pub id: Uuid,
    pub set_name: String,
    pub question_id: String,
    pub question: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = question_set_rows)]
pub struct NewQuestionSetRow {
    pub id: Uuid,
    pub set_name: String,
    pub question_id: String,
    pub question: String,
}
