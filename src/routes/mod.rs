use axum::http::HeaderValue;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedAdmin, state::AppState};

pub mod auth;
pub mod health;
pub mod qsets;
pub mod recordings;
pub mod users;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    // Auth is enforced per handler here: login and the recordings listing
    // are reachable without a token, everything else extracts
    // AuthenticatedAdmin itself.
    let admin_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/create", post(auth::create_admin))
        .route("/stats", get(auth::stats))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/recordings", get(users::list_user_recordings))
        .route("/recordings", get(recordings::list_recordings))
        .route("/recordings/:id", get(recordings::get_recording))
        .route(
            "/recordings/by-file/:file_name",
            get(recordings::get_recording_by_file),
        )
        .route("/recordings/:id/audio", get(recordings::recording_audio_url));

    // Question sets require a token on every route, reads included.
    let qsets_state = state.clone();
    let qsets_routes = Router::new()
        .route("/", get(qsets::list_qsets).post(qsets::create_qset))
        .route(
            "/:set_name",
            put(qsets::replace_qset).delete(qsets::delete_qset),
        )
        .layer(middleware::from_extractor_with_state::<AuthenticatedAdmin, _>(qsets_state));

    Router::new()
        .nest("/api/admin", admin_routes)
        .nest("/api/qsets", qsets_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
}
