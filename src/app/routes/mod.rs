// ==========================================
// 学习成果评估系统 - HTTP 路由
// ==========================================
// 职责: 组装 axum Router, 挂载认证中间件与公共层
// 红线: 除 /health 与 register/login/forgot-password 外均需会话
// ==========================================

pub mod auth;
pub mod common;
pub mod health;
pub mod learning_outcome;
pub mod program;
pub mod prueba;
pub mod user;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app::state::AppState;

pub use common::{ErrorResponse, MessageResponse};

/// 构建完整路由
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.upload_limit_bytes;

    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/users/register", post(user::register))
        .route("/api/users/login", post(user::login))
        .route("/api/users/forgot-password", post(user::forgot_password));

    let protected = Router::new()
        .merge(user_routes())
        .merge(program_routes())
        .merge(outcome_routes())
        .merge(prueba_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    public
        .merge(protected)
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(user::list_users))
        .route("/api/users/logout/:username", get(user::logout))
        .route("/api/users/update/:username", put(user::update_user))
        .route(
            "/api/users/delete/:username",
            axum::routing::delete(user::delete_user),
        )
        .route("/api/users/:username", get(user::get_user))
}

fn program_routes() -> Router<AppState> {
    Router::new()
        .route("/api/programs", get(program::list_programs))
        .route("/api/programs/create", post(program::create_program))
        .route("/api/programs/update/:id", put(program::update_program))
        .route(
            "/api/programs/delete/:id",
            axum::routing::delete(program::delete_program),
        )
        .route("/api/programs/:id", get(program::get_program))
}

fn outcome_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ra", get(learning_outcome::list_outcomes))
        .route(
            "/api/ra/rap",
            get(learning_outcome::list_outcomes_with_programs),
        )
        .route("/api/ra/create", post(learning_outcome::create_outcome))
        .route("/api/ra/add-programs", post(learning_outcome::add_programs))
        .route(
            "/api/ra/remove-programs",
            post(learning_outcome::remove_programs),
        )
        .route("/api/ra/update/:id", put(learning_outcome::update_outcome))
        .route(
            "/api/ra/delete/:id",
            axum::routing::delete(learning_outcome::delete_outcome),
        )
        .route(
            "/api/ra/program/:program_id",
            get(learning_outcome::list_by_program),
        )
        .route("/api/ra/:id", get(learning_outcome::get_outcome))
}

fn prueba_routes() -> Router<AppState> {
    Router::new()
        .route("/api/pruebas", get(prueba::list_pruebas))
        .route("/api/pruebas/create-prueba", post(prueba::create_prueba))
        .route(
            "/api/pruebas/:id",
            get(prueba::get_prueba)
                .put(prueba::edit_prueba)
                .delete(prueba::delete_prueba),
        )
        .route("/api/pruebas/:id/grupos/:group_id", get(prueba::get_group))
        .route(
            "/api/pruebas/:id/grupos/:group_id/importar-estudiantes",
            post(prueba::import_roster),
        )
        .route(
            "/api/pruebas/:id/grupos/:group_id/estudiantes",
            post(prueba::create_student),
        )
        .route(
            "/api/pruebas/:id/grupos/:group_id/estudiantes/:student_id",
            put(prueba::upsert_student).delete(prueba::delete_student),
        )
}
