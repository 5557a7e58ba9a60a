use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::{dsl::count_star, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedAdmin,
    error::{AppError, AppResult},
    models::Recording,
    schema::recordings,
    state::AppState,
};

pub const AUDIO_URL_EXPIRY_SECONDS: u64 = 600;

#[derive(Deserialize)]
pub struct RecordingListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Deserialize)]
pub struct RecordingDetailQuery {
    #[serde(rename = "includeAudio")]
    pub include_audio: Option<String>,
}

impl RecordingDetailQuery {
    fn wants_audio(&self) -> bool {
        self.include_audio
            .as_deref()
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

/// The response contract for a recording. `s3_url` is only present when the
/// caller explicitly asked for audio and a URL could be resolved, so default
/// listings never leak direct storage links. `interviewee_name` only appears
/// on listing rows.
#[derive(Serialize)]
pub struct RecordingResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: Option<String>,
    pub file_name: Option<String>,
    pub uploaded_at: String,
    pub interviewer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interviewee_name: Option<String>,
    pub question_set: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
    pub suggestions: Vec<String>,
    pub sentiment: Option<String>,
    pub summarized_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_url: Option<String>,
}

#[derive(Serialize)]
pub struct RecordingListResponse {
    pub total: i64,
    pub items: Vec<RecordingResponse>,
}

#[derive(Serialize)]
pub struct AudioUrlResponse {
    pub audio_url: String,
    pub expires_in: u64,
}

/// Publicly reachable; authentication is deliberately not required here.
pub async fn list_recordings(
    State(state): State<AppState>,
    Query(params): Query<RecordingListQuery>,
) -> AppResult<Json<RecordingListResponse>> {
    let page = params.page.max(1);
    let limit = params.limit.max(1);
    let skip = (page - 1) * limit;

    let mut conn = state.db()?;

    let total: i64 = recordings::table.select(count_star()).first(&mut conn)?;
    let rows: Vec<Recording> = recordings::table
        .order(recordings::uploaded_at.desc())
        .offset(skip)
        .limit(limit)
        .load(&mut conn)?;

    Ok(Json(RecordingListResponse {
        total,
        items: rows.into_iter().map(shape_listing_row).collect(),
    }))
}

pub async fn get_recording(
    State(state): State<AppState>,
    Path(recording_id): Path<Uuid>,
    Query(query): Query<RecordingDetailQuery>,
    _caller: AuthenticatedAdmin,
) -> AppResult<Json<RecordingResponse>> {
    let mut conn = state.db()?;
    let rec: Recording = recordings::table
        .find(recording_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Not found"))?;
    drop(conn);

    let audio_url = if query.wants_audio() {
        resolve_audio_url(&state, &rec).await
    } else {
        None
    };

    Ok(Json(shape_recording(rec, audio_url)))
}

pub async fn get_recording_by_file(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
    Query(query): Query<RecordingDetailQuery>,
    _caller: AuthenticatedAdmin,
) -> AppResult<Json<RecordingResponse>> {
    let mut conn = state.db()?;
    let rec: Recording = recordings::table
        .filter(recordings::file_name.eq(&file_name))
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Not found"))?;
    drop(conn);

    let audio_url = if query.wants_audio() {
        resolve_audio_url(&state, &rec).await
    } else {
        None
    };

    Ok(Json(shape_recording(rec, audio_url)))
}

pub async fn recording_audio_url(
    State(state): State<AppState>,
    Path(recording_id): Path<Uuid>,
    _caller: AuthenticatedAdmin,
) -> AppResult<Json<AudioUrlResponse>> {
    let mut conn = state.db()?;
    let rec: Recording = recordings::table
        .find(recording_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Not found"))?;
    drop(conn);

    let mut url = rec.s3_url.clone();
    if url.is_none() {
        if let (Some(storage), Some(key)) = (
            state.storage.as_ref(),
            rec.s3_key.as_deref().or(rec.file_name.as_deref()),
        ) {
            let presigned = storage
                .presign_get_object(key, Duration::from_secs(AUDIO_URL_EXPIRY_SECONDS))
                .await
                .map_err(|err| AppError::internal(format!("failed to presign audio: {err}")))?;
            url = Some(presigned);
        }
    }

    let audio_url = url.ok_or_else(|| AppError::not_found("Audio unavailable"))?;
    Ok(Json(AudioUrlResponse {
        audio_url,
        expires_in: AUDIO_URL_EXPIRY_SECONDS,
    }))
}

/// Best-effort audio resolution for detail fetches: a stored URL wins, else a
/// fresh presign when storage is configured and a key exists. Failures are
/// swallowed so the recording fetch itself never breaks on storage trouble.
/// The resolved URL is never written back to the row.
async fn resolve_audio_url(state: &AppState, rec: &Recording) -> Option<String> {
    if let Some(url) = &rec.s3_url {
        return Some(url.clone());
    }
    let storage = state.storage.as_ref()?;
    let key = rec.s3_key.as_deref().or(rec.file_name.as_deref())?;
    match storage
        .presign_get_object(key, Duration::from_secs(AUDIO_URL_EXPIRY_SECONDS))
        .await
    {
        Ok(url) => Some(url),
        Err(err) => {
            debug!(error = %err, "audio presign failed; returning recording without audio");
            None
        }
    }
}

pub(crate) fn shape_recording(rec: Recording, audio_url: Option<String>) -> RecordingResponse {
    RecordingResponse {
        id: rec.id,
        email: rec.email,
        file_name: rec.file_name,
        uploaded_at: to_iso(rec.uploaded_at),
        interviewer: rec.interviewer,
        interviewee_name: None,
        question_set: rec.question_set,
        transcript: rec.transcript,
        summary: rec.summary,
        key_points: rec.key_points,
        action_items: rec.action_items,
        suggestions: rec.suggestions,
        sentiment: rec.sentiment,
        summarized_at: rec.summarized_at.map(to_iso),
        s3_url: audio_url,
    }
}

/// Listing rows carry the interviewee name with stray quotation marks from
/// the transcription pipeline removed.
fn shape_listing_row(rec: Recording) -> RecordingResponse {
    let interviewee_name = rec
        .interviewee_name
        .clone()
        .map(|name| name.replace('"', ""));
    let mut shaped = shape_recording(rec, None);
    shaped.interviewee_name = interviewee_name;
    shaped
}

pub(crate) fn to_iso(dt: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).to_rfc3339()
}
