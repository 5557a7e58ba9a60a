use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use diesel::{prelude::*, result::DatabaseErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{password, AuthenticatedAdmin},
    error::{AppError, AppResult},
    models::{NewUser, User},
    schema::{recordings, users},
    state::AppState,
};

use super::recordings::{shape_recording, to_iso, RecordingResponse};

#[derive(Deserialize)]
pub struct UserListQuery {
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub role: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            phone: user.phone,
            name: user.name,
            title: user.title,
            department: user.department,
            role: user.role,
            created_at: to_iso(user.created_at),
            updated_at: to_iso(user.updated_at),
        }
    }
}

#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone: String,
}

/// Creation acknowledges with the identifying fields only.
#[derive(Serialize)]
pub struct CreatedUserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct UserRecordingsResponse {
    pub items: Vec<RecordingResponse>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListQuery>,
    _caller: AuthenticatedAdmin,
) -> AppResult<Json<UserListResponse>> {
    let mut conn = state.db()?;

    let mut query = users::table.into_boxed();
    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(q));
        query = query.filter(
            users::email
                .ilike(pattern.clone())
                .nullable()
                .or(users::username.ilike(pattern.clone()).nullable())
                .or(users::phone.ilike(pattern.clone()).nullable())
                .or(users::name.ilike(pattern)),
        );
    }

    let list: Vec<User> = query.order(users::created_at.desc()).load(&mut conn)?;

    Ok(Json(UserListResponse {
        users: list.into_iter().map(UserResponse::from).collect(),
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    _caller: AuthenticatedAdmin,
) -> AppResult<Json<UserResponse>> {
    let mut conn = state.db()?;

    let user: User = users::table
        .find(user_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Not found"))?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn create_user(
    State(state): State<AppState>,
    _caller: AuthenticatedAdmin,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<CreatedUserResponse>)> {
    if payload.username.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request(
            "username, email and password are required",
        ));
    }

    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();
    let phone = payload.phone.trim().to_string();

    let mut conn = state.db()?;

    let existing: Option<User> = users::table
        .filter(users::email.eq(&email).or(users::username.eq(&username)))
        .first(&mut conn)
        .optional()?;
    if existing.is_some() {
        return Err(AppError::conflict("Username or email already exists"));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let new_user = NewUser {
        id: Uuid::new_v4(),
        username,
        email,
        password_hash,
        phone,
        role: "user".to_string(),
    };

    match diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            // Lost the race against a concurrent create; same answer as the
            // pre-insert check.
            return Err(AppError::conflict("Username or email already exists"));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let created: User = users::table.find(new_user.id).first(&mut conn)?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            id: created.id,
            username: created.username,
            email: created.email,
            phone: created.phone,
            created_at: to_iso(created.created_at),
            updated_at: to_iso(created.updated_at),
        }),
    ))
}

pub async fn list_user_recordings(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    _caller: AuthenticatedAdmin,
) -> AppResult<Json<UserRecordingsResponse>> {
    let mut conn = state.db()?;

    let user: User = users::table
        .find(user_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    // Recordings reference users by email value only; there is no foreign
    // key, so rows may exist for emails with no matching user and vice versa.
    let rows: Vec<crate::models::Recording> = recordings::table
        .filter(recordings::email.eq(&user.email))
        .order(recordings::uploaded_at.desc())
        .load(&mut conn)?;

    Ok(Json(UserRecordingsResponse {
        items: rows
            .into_iter()
            .map(|rec| shape_recording(rec, None))
            .collect(),
    }))
}

/// Escapes LIKE wildcards so a search for "100%" matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
