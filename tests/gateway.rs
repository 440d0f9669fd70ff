use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use notice_dispatch::{
    client::{
        ApiClient, ClientConfig, ClientContext, GatewayError, MemoryStore, Submission, SyncEvent,
    },
    notification::notification_dto::{CreateNotificationRequest, RegisterResultRequest},
};
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    uri: String,
    authorization: Option<String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

fn notification_json(id: Value, body: &Value) -> Value {
    let now = chrono::Utc::now();
    json!({
        "id": id,
        "fecha_carga": now,
        "usuario_carga": "admin@juzgado.gob.ar",
        "estado": "pendiente",
        "tipo_notificacion": body.get("tipo_notificacion").cloned().unwrap_or(json!("cedulas")),
        "n_expediente": body.get("n_expediente").cloned().unwrap_or(json!("EXP-1/2026")),
        "caratula": "Gómez c/ Pérez",
        "origen": "Juzgado Civil 3",
        "letrado": null,
        "destinatario_especial": null,
        "destinatario_nombre": "Juan Pérez",
        "domicilio": "San Martín 123",
        "zona": "norte",
        "tipo_troquel": null,
        "sin_troquel": false,
        "n_troquel": null,
        "medio_pago": null,
        "costo": 0.0,
        "observaciones_iniciales": null,
        "asignado_a": null,
        "fecha_asignacion": null,
        "asignado_por": null,
        "resultado_diligencia": body.get("resultado").cloned(),
        "fecha_diligencia": null,
        "ubicacion_lat": null,
        "ubicacion_lng": null,
        "evidencia_foto": null,
        "observacion_audio": null,
        "transcripcion_audio": null,
        "es_carga_diferida": false,
        "motivo_falla_senal": null,
        "observaciones_resultado": null,
        "diligenciado_por": null,
        "created_at": now,
        "updated_at": now,
        "updated_by": null
    })
}

async fn notificaciones(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    log.lock().unwrap().push(Recorded {
        method: method.clone(),
        uri: uri.to_string(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(String::from),
        body: body.clone(),
    });

    match method {
        Method::POST => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "data": notification_json(json!(Uuid::new_v4()), &body) })),
        )
            .into_response(),
        Method::PUT if body.get("action") == Some(&json!("result")) => Json(json!({
            "success": true,
            "data": notification_json(body["id"].clone(), &body)
        }))
        .into_response(),
        Method::PUT => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "Notification not found" })),
        )
            .into_response(),
        Method::DELETE => Json(json!({ "success": true, "data": { "deleted": true } })).into_response(),
        _ => Json(json!({
            "success": true,
            "data": { "data": [], "total": 0, "page": 1, "limit": 50, "pages": 0 }
        }))
        .into_response(),
    }
}

async fn spawn_server() -> (String, Log) {
    let log: Log = Arc::default();
    let app = Router::new()
        .route("/api/notificaciones", any(notificaciones))
        .route(
            "/api/auth",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "success": false, "error": "Invalid credentials" })),
                )
            }),
        )
        .route(
            "/api/usuarios",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream unavailable") }),
        )
        .route("/api/stats", get(|| async { "<html>maintenance</html>" }))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), log)
}

fn sample_request() -> CreateNotificationRequest {
    CreateNotificationRequest {
        tipo_notificacion: "cedulas".to_string(),
        n_expediente: "EXP-55/2026".to_string(),
        caratula: "Gómez c/ Pérez".to_string(),
        origen: "Juzgado Civil 3".to_string(),
        destinatario_nombre: "Juan Pérez".to_string(),
        domicilio: "San Martín 123".to_string(),
        zona: "norte".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn unwraps_success_envelope_and_sends_bearer_token() {
    let (base, log) = spawn_server().await;
    let api = ApiClient::new(base);
    api.set_token(Some("session-jwt".to_string())).await;

    let deleted = api.delete_notification(Uuid::new_v4()).await.unwrap();
    assert!(deleted.deleted);

    let page = api.list_notifications(&Default::default()).await.unwrap();
    assert_eq!(page.total, 0);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].method, Method::DELETE);
    assert_eq!(log[0].authorization.as_deref(), Some("Bearer session-jwt"));
}

#[tokio::test]
async fn register_result_sends_result_action_with_id() {
    let (base, log) = spawn_server().await;
    let api = ApiClient::new(base);
    let id = Uuid::new_v4();

    let notification = api
        .register_result(
            id,
            &RegisterResultRequest {
                resultado: "atiende".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(notification.id, id);
    assert_eq!(notification.resultado_diligencia.as_deref(), Some("atiende"));

    let log = log.lock().unwrap();
    assert_eq!(log[0].method, Method::PUT);
    assert_eq!(log[0].body["action"], "result");
    assert_eq!(log[0].body["id"], json!(id));
    assert_eq!(log[0].body["resultado"], "atiende");
    assert!(log[0].authorization.is_none());
}

#[tokio::test]
async fn error_envelope_becomes_rejection_with_status() {
    let (base, _log) = spawn_server().await;
    let api = ApiClient::new(base);

    let err = api.login("a@b.c", "wrong").await.unwrap_err();

    match err {
        GatewayError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("unexpected error {other:?}"),
    }

    let err = api
        .update_notification(Uuid::new_v4(), &Default::default())
        .await
        .unwrap_err();
    assert!(err.is_client_rejection());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn non_json_error_keeps_http_status() {
    let (base, _log) = spawn_server().await;
    let api = ApiClient::new(base);

    let err = api.list_users().await.unwrap_err();

    match &err {
        GatewayError::Rejected { status, message } => {
            assert_eq!(*status, 502);
            assert!(message.starts_with("HTTP 502"), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn non_json_success_is_a_decode_error() {
    let (base, _log) = spawn_server().await;
    let api = ApiClient::new(base);

    let err = api.general_stats().await.unwrap_err();

    assert!(matches!(err, GatewayError::Decode(_)), "{err:?}");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = ApiClient::new(format!("http://{}/api", addr));
    let err = api.create_notification(&sample_request()).await.unwrap_err();

    assert!(matches!(err, GatewayError::Transport(_)), "{err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn offline_writes_reach_the_server_after_reconnecting() {
    let (base, log) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::new(base.clone(), dir.path());
    let api = ApiClient::new(base);
    let ctx = ClientContext::from_parts(
        api.clone(),
        Arc::new(api),
        Arc::new(MemoryStore::new()),
        &config,
    )
    .await;
    let mut events = ctx.subscribe();

    ctx.set_online(false).await;
    let submission = ctx.create_notification(sample_request()).await.unwrap();
    let queued_id = match submission {
        Submission::Queued(id) => id,
        other => panic!("expected queued write, got {other:?}"),
    };
    assert!(log.lock().unwrap().is_empty());

    let report = ctx.set_online(true).await.expect("queue should drain");

    assert_eq!(report.synced, vec![queued_id]);
    assert_eq!(ctx.queue().pending_count().await, 0);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].method, Method::POST);
    assert_eq!(log[0].body["n_expediente"], "EXP-55/2026");

    let mut saw_synced = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SyncEvent::Synced { count: 1 }) {
            saw_synced = true;
        }
    }
    assert!(saw_synced);
}
