use crate::{
    admin::admin_authorization,
    auth::{auth_dto::*, auth_handlers},
    dto::{DeleteRequest, DeletedResponse},
    error::{method_not_allowed, AppError},
    middleware::auth_middleware,
    notification::{notification_dto::*, notification_handlers, notification_models::*},
    state::AppState,
    stats::{stats_handlers, stats_models::*},
    upload::{upload_handlers, upload_storage::UploadResponse},
    user::{user_dto::*, user_handlers, user_models::*},
    visit::{visit_dto::CreateVisitRequest, visit_handlers, visit_models::*},
};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart boundaries and the text fields on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth_handlers::auth,
        user_handlers::get_users,
        user_handlers::create_user,
        user_handlers::update_user,
        user_handlers::delete_user,
        notification_handlers::get_notifications,
        notification_handlers::create_notification,
        notification_handlers::update_notification,
        notification_handlers::delete_notification,
        notification_handlers::assignment_stream,
        visit_handlers::get_visits,
        visit_handlers::create_visit,
        stats_handlers::get_stats,
        upload_handlers::upload_file,
    ),
    components(
        schemas(
            LoginRequest,
            VerifyRequest,
            ChangePasswordRequest,
            SessionResponse,
            MessageResponse,
            User,
            UserProfile,
            Role,
            CreateUserRequest,
            UpdateUserRequest,
            Notification,
            NotificationWithAgent,
            NotificationStatus,
            NotificationType,
            VisitResult,
            PaymentMethod,
            FailureReason,
            CreateNotificationRequest,
            UpdateNotificationRequest,
            AssignRequest,
            RegisterResultRequest,
            Visit,
            VisitDetail,
            CreateVisitRequest,
            GeneralStats,
            TypeCount,
            ResultCount,
            AgentPerformance,
            ZoneStats,
            DailyStats,
            UploadResponse,
            DeleteRequest,
            DeletedResponse,
        )
    ),
    tags(
        (name = "auth", description = "Session endpoints"),
        (name = "usuarios", description = "User management"),
        (name = "notificaciones", description = "Notices, assignments and visit results"),
        (name = "visitas", description = "Visit history"),
        (name = "stats", description = "Dashboard statistics"),
        (name = "upload", description = "Evidence uploads")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    // Public routes (no auth required)
    let auth_routes = Router::new().route(
        "/auth",
        post(auth_handlers::auth).fallback(method_not_allowed),
    );

    // Reads are open to any signed-in user; writes need an administrator
    let user_writes = post(user_handlers::create_user)
        .put(user_handlers::update_user)
        .delete(user_handlers::delete_user)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_authorization,
        ));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/notificaciones",
            get(notification_handlers::get_notifications)
                .post(notification_handlers::create_notification)
                .put(notification_handlers::update_notification)
                .delete(notification_handlers::delete_notification)
                .fallback(method_not_allowed),
        )
        .route(
            "/notificaciones/stream",
            get(notification_handlers::assignment_stream).fallback(method_not_allowed),
        )
        .route(
            "/usuarios",
            get(user_handlers::get_users)
                .merge(user_writes)
                .fallback(method_not_allowed),
        )
        .route(
            "/visitas",
            get(visit_handlers::get_visits)
                .post(visit_handlers::create_visit)
                .fallback(method_not_allowed),
        )
        .route(
            "/stats",
            get(stats_handlers::get_stats).fallback(method_not_allowed),
        )
        .route(
            "/upload",
            post(upload_handlers::upload_file)
                .layer(DefaultBodyLimit::max(upload_limit))
                .fallback(method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new().merge(auth_routes).merge(protected_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .fallback(|| async { AppError::NotFound("Route not found".to_string()) })
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
