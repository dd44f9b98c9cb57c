use std::path::Path;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::handlers::{auth, google, todos};
use super::state::AppState;

/// Builds the application router with every route, layer and shared state
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.ui_url);
    let static_dir = state.config.static_dir.clone();

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/signin", post(auth::signin))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/logout", get(auth::logout))
        .route("/google", get(google::google_login))
        .route("/google/callback", get(google::google_callback));

    let user_routes = Router::new()
        .route("/profile", get(auth::get_profile))
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route(
            "/todos/:id",
            put(todos::update_todo).delete(todos::delete_todo),
        );

    let mut app = Router::new()
        .route("/health", get(auth::health_check))
        .nest("/auth", auth_routes)
        .nest("/user", user_routes);

    if let Some(dir) = static_dir {
        let index = Path::new(&dir).join("index.html");
        tracing::info!(dir = %dir, "Serving frontend assets");
        app = app.fallback_service(ServeDir::new(&dir).fallback(ServeFile::new(index)));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Credentialed CORS for the single frontend origin
fn cors_layer(ui_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(ui_url.trim_end_matches('/')) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!(ui_url = %ui_url, "UI_URL is not a valid origin, CORS disabled: {}", e);
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
