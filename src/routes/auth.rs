use axum::{extract::State, Json};
use diesel::{dsl::count_star, prelude::*, result::DatabaseErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{password, AuthenticatedAdmin},
    error::{AppError, AppResult},
    models::{Admin, NewAdmin},
    schema::{admins, recordings, users},
    state::AppState,
};

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Profile shape safe to hand to clients; the password hash never leaves
/// the database layer.
#[derive(Serialize)]
pub struct SafeAdmin {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
}

impl From<Admin> for SafeAdmin {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            role: admin.role,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateAdminRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(rename = "totalRecordings")]
    pub total_recordings: i64,
    #[serde(rename = "totalAdmins")]
    pub total_admins: i64,
    #[serde(rename = "totalUsers")]
    pub total_users: i64,
    #[serde(rename = "totalInterviewers")]
    pub total_interviewers: i64,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Email and password required"));
    }

    let mut conn = state.db()?;

    // Unknown email and wrong password produce the same message so the
    // endpoint cannot be used to enumerate accounts.
    let admin: Admin = admins::table
        .filter(admins::email.eq(&payload.email))
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

    let valid = password::verify_password(&payload.password, &admin.password_hash)
        .map_err(|_| AppError::unauthorized("Invalid email or password"))?;
    if !valid {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let token = state.jwt.issue_token(&admin)?;
    Ok(Json(LoginResponse { token }))
}

pub async fn me(
    State(state): State<AppState>,
    caller: AuthenticatedAdmin,
) -> AppResult<Json<SafeAdmin>> {
    let mut conn = state.db()?;

    let admin: Admin = admins::table
        .find(caller.admin_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Not found"))?;

    Ok(Json(SafeAdmin::from(admin)))
}

pub async fn create_admin(
    State(state): State<AppState>,
    _caller: AuthenticatedAdmin,
    Json(payload): Json<CreateAdminRequest>,
) -> AppResult<Json<SafeAdmin>> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Email & password required"));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let new_admin = NewAdmin {
        id: Uuid::new_v4(),
        name: payload.name,
        email: payload.email,
        password_hash,
        role: payload.role.unwrap_or_else(|| "admin".to_string()),
    };

    let mut conn = state.db()?;
    match diesel::insert_into(admins::table)
        .values(&new_admin)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(AppError::conflict("Admin email already exists"));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let admin: Admin = admins::table.find(new_admin.id).first(&mut conn)?;
    Ok(Json(SafeAdmin::from(admin)))
}

pub async fn stats(
    State(state): State<AppState>,
    _caller: AuthenticatedAdmin,
) -> AppResult<Json<StatsResponse>> {
    let mut conn = state.db()?;

    let total_recordings: i64 = recordings::table.select(count_star()).first(&mut conn)?;
    let total_admins: i64 = admins::table.select(count_star()).first(&mut conn)?;
    let total_users: i64 = users::table.select(count_star()).first(&mut conn)?;

    Ok(Json(StatsResponse {
        total_recordings,
        total_admins,
        total_users,
        // The console does not track interviewers separately; admins stand in.
        total_interviewers: total_admins,
    }))
}
