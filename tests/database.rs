//! Service tests against a real Postgres. Run with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use notice_dispatch::{
    db::{create_pool, run_migrations},
    notification::notification_dto::{CreateNotificationRequest, RegisterResultRequest},
    state::{AppState, Config},
    user::user_dto::CreateUserRequest,
};
use uuid::Uuid;

async fn state() -> AppState {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(&database_url, 2).await.unwrap();
    run_migrations(&pool).await.unwrap();

    AppState::new(
        pool,
        Config {
            database_url,
            db_max_connections: 2,
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            upload_dir: std::env::temp_dir(),
            max_upload_bytes: 1024,
            public_base_url: None,
            cors_allowed_origins: Vec::new(),
        },
    )
}

fn notice(expediente: &str) -> CreateNotificationRequest {
    CreateNotificationRequest {
        tipo_notificacion: "cedulas".to_string(),
        n_expediente: expediente.to_string(),
        caratula: "  Gómez c/ <b>Pérez</b> s/ daños & perjuicios ".to_string(),
        origen: "Juzgado Civil 3".to_string(),
        destinatario_nombre: "Juan Pérez".to_string(),
        domicilio: "San Martín 123".to_string(),
        zona: "norte".to_string(),
        medio_pago: Some("efectivo".to_string()),
        costo: Some(1500.0),
        ..Default::default()
    }
}

async fn agent(state: &AppState) -> Uuid {
    state
        .user_service
        .create_user(CreateUserRequest {
            email: format!("ujier-{}@juzgado.gob.ar", Uuid::new_v4()),
            nombre: "Ujier de prueba".to_string(),
            rol: "ujier".to_string(),
            password: Some("secreto".to_string()),
            foto: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn created_notice_reads_back_sanitized() {
    let state = state().await;
    let expediente = format!("EXP-{}/2026", Uuid::new_v4().simple());

    let created = state
        .notification_service
        .create(notice(&expediente), "admin@juzgado.gob.ar")
        .await
        .unwrap();
    let fetched = state.notification_service.get(created.id).await.unwrap();

    let n = fetched.notification;
    assert_eq!(n.n_expediente, expediente);
    assert_eq!(n.caratula, "Gómez c/ Pérez s/ daños &amp; perjuicios");
    assert_eq!(n.estado, "pendiente");
    assert_eq!(n.usuario_carga.as_deref(), Some("admin@juzgado.gob.ar"));
    assert_eq!(n.medio_pago.as_deref(), Some("efectivo"));
    assert_eq!(n.costo, 1500.0);
    assert!(fetched.ujier_nombre.is_none());

    state.notification_service.delete(created.id).await.unwrap();
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn registering_a_result_appends_a_visit() {
    let state = state().await;
    let ujier = agent(&state).await;
    let created = state
        .notification_service
        .create(notice("EXP-RESULT/2026"), "admin@juzgado.gob.ar")
        .await
        .unwrap();

    let updated = state
        .notification_service
        .register_result(
            created.id,
            RegisterResultRequest {
                resultado: "no_atiende".to_string(),
                observaciones: Some("Nadie en el domicilio".to_string()),
                es_carga_diferida: true,
                motivo_falla_senal: Some("sin_senal_domicilio".to_string()),
                ..Default::default()
            },
            ujier,
        )
        .await
        .unwrap();

    assert_eq!(updated.estado, "diferida");
    assert_eq!(updated.resultado_diligencia.as_deref(), Some("no_atiende"));
    assert_eq!(updated.diligenciado_por, Some(ujier));

    let visits = state
        .visit_service
        .for_notification(created.id)
        .await
        .unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].visit.ujier_id, Some(ujier));
    assert_eq!(visits[0].visit.resultado.as_deref(), Some("no_atiende"));

    state.notification_service.delete(created.id).await.unwrap();
    assert!(state
        .visit_service
        .for_notification(created.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn deactivated_user_leaves_active_listing() {
    let state = state().await;
    let ujier = agent(&state).await;

    state.user_service.deactivate_user(ujier).await.unwrap();

    let active = state.user_service.list_active(Some("ujier")).await.unwrap();
    assert!(active.iter().all(|u| u.id != ujier));
    let user = state.user_service.get_user(ujier).await.unwrap();
    assert!(!user.activo);
}
