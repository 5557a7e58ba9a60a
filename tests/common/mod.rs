use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration as ChronoDuration, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use interview_console::auth::jwt::JwtService;
use interview_console::auth::password;
use interview_console::config::AppConfig;
use interview_console::db::{self, PgPool};
use interview_console::models::{NewAdmin, NewRecording, NewUser};
use interview_console::routes;
use interview_console::state::AppState;
use interview_console::storage::ObjectStorage;
use once_cell::sync::Lazy;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Presigns every key without talking to any backend; the URL encodes the
/// inputs so tests can assert on them.
pub struct FakeStorage;

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn presign_get_object(&self, key: &str, expires_in: Duration) -> Result<String> {
        Ok(format!(
            "https://fake-storage/{key}?expires_in={}",
            expires_in.as_secs()
        ))
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// Returns None (with a note on stderr) when TEST_DATABASE_URL is not
    /// set, so the suite degrades to a skip instead of failing outright.
    pub async fn try_new() -> Result<Option<Self>> {
        Self::build(true).await
    }

    /// An app with presigning disabled, as when S3_BUCKET is unset.
    #[allow(dead_code)]
    pub async fn try_new_without_storage() -> Result<Option<Self>> {
        Self::build(false).await
    }

    async fn build(with_storage: bool) -> Result<Option<Self>> {
        let Ok(database_url) = env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping integration test");
            return Ok(None);
        };

        let config = AppConfig {
            database_url,
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_days: 7,
            cors_allowed_origin: None,
            aws_endpoint_url: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_region: "us-east-1".to_string(),
            s3_bucket: with_storage.then(|| "test-bucket".to_string()),
            seed_admin_email: None,
            seed_admin_password: None,
            seed_admin_password_hash: None,
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        prepare_database(&pool).await?;

        let storage: Option<Arc<dyn ObjectStorage>> =
            with_storage.then(|| Arc::new(FakeStorage) as Arc<dyn ObjectStorage>);
        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(pool, config, storage, jwt);
        let router = routes::create_router(state.clone());

        Ok(Some(Self { state, router }))
    }

    pub async fn cleanup(&self) -> Result<()> {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get cleanup connection: {err}"))?;
            truncate_all(&mut conn)?;
            Ok(())
        })
        .await
        .context("cleanup task panicked")?
    }

    pub async fn insert_admin(&self, name: &str, email: &str, pass: &str) -> Result<Uuid> {
        let name = name.to_string();
        let email = email.to_string();
        let pass = pass.to_string();
        self.with_conn(move |conn| {
            let admin = NewAdmin {
                id: Uuid::new_v4(),
                name: Some(name),
                email,
                password_hash: password::hash_password(&pass)?,
                role: "admin".to_string(),
            };
            diesel::insert_into(interview_console::schema::admins::table)
                .values(&admin)
                .execute(conn)
                .context("failed to insert admin")?;
            Ok(admin.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_user(&self, username: &str, email: &str, pass: &str) -> Result<Uuid> {
        let username = username.to_string();
        let email = email.to_string();
        let pass = pass.to_string();
        self.with_conn(move |conn| {
            let user = NewUser {
                id: Uuid::new_v4(),
                username,
                email,
                password_hash: password::hash_password(&pass)?,
                phone: String::new(),
                role: "user".to_string(),
            };
            diesel::insert_into(interview_console::schema::users::table)
                .values(&user)
                .execute(conn)
                .context("failed to insert user")?;
            Ok(user.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_recording(&self, recording: NewRecording) -> Result<Uuid> {
        self.with_conn(move |conn| {
            let id = recording.id;
            diesel::insert_into(interview_console::schema::recordings::table)
                .values(&recording)
                .execute(conn)
                .context("failed to insert recording")?;
            Ok(id)
        })
        .await
    }

    pub async fn login_token(&self, email: &str, pass: &str) -> Result<String> {
        #[derive(Serialize)]
        struct LoginPayload<'a> {
            email: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json(
                "/api/admin/login",
                &LoginPayload {
                    email,
                    password: pass,
                },
                None,
            )
            .await?;

        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        let body = body_to_vec(response.into_body()).await?;
        #[derive(serde::Deserialize)]
        struct LoginResponse {
            token: String,
        }
        let parsed: LoginResponse = serde_json::from_slice(&body)?;
        Ok(parsed.token)
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PUT, path, payload, token).await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let builder = Request::builder().method(Method::DELETE).uri(path);
        let builder = if let Some(token) = token {
            builder.header("authorization", format!("Bearer {token}"))
        } else {
            builder
        };
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

/// A minimal pipeline-shaped recording row, `minutes_ago` old.
#[allow(dead_code)]
pub fn recording_fixture(email: &str, file_name: &str, minutes_ago: i64) -> NewRecording {
    NewRecording {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
        file_name: Some(file_name.to_string()),
        s3_url: None,
        s3_key: None,
        uploaded_at: (Utc::now() - ChronoDuration::minutes(minutes_ago)).naive_utc(),
        interviewer: None,
        interviewee_name: None,
        question_set: None,
        transcript: None,
        summary: None,
        key_points: vec![],
        action_items: vec![],
        suggestions: vec![],
        sentiment: None,
        summarized_at: None,
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    use http_body_util::BodyExt;

    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        db::run_migrations(&mut conn)?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE question_set_rows, recordings, users, admins RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
