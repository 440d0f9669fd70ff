use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Declares a closed set of wire values with their Spanish display labels.
macro_rules! catalogue {
    ($(#[$meta:meta])* $name:ident, $what:literal { $($variant:ident => $value:tt, $label:literal;)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(#[serde(rename = $value)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(format!(concat!("Unknown ", $what, " '{}'"), other)),
                }
            }
        }
    };
}

catalogue!(
    /// Lifecycle state of a notice.
    NotificationStatus, "estado" {
        Pendiente => "pendiente", "Pendiente";
        Diligenciada => "diligenciada", "Diligenciada";
        Diferida => "diferida", "Diferida";
    }
);

catalogue!(NotificationType, "tipo_notificacion" {
    Cedulas => "cedulas", "Cédulas";
    CedulasUrgenteNorte => "cedulas_urgente_norte", "Cédulas Urgente Norte";
    CedulasUrgenteSur => "cedulas_urgente_sur", "Cédulas Urgente Sur";
    CedulasMandamientos22172 => "cedulas_mandamientos_22172", "Cédulas o Mandamientos Ley 22172";
    CedulasCorrespondencia => "cedulas_correspondencia", "Cédulas por Correspondencia (Interior)";
    Mandamientos => "mandamientos", "Mandamientos";
    MandamientosHabilitacionNorte => "mandamientos_habilitacion_norte", "Mandamientos con habilitación Norte";
    MandamientosHabilitacionSur => "mandamientos_habilitacion_sur", "Mandamientos con habilitación Sur";
});

catalogue!(
    /// Outcome recorded by the agent at the door.
    VisitResult, "resultado" {
        Atiende => "atiende", "Atiende";
        NoAtiende => "no_atiende", "No atiende";
        PreAviso => "pre_aviso", "Pre aviso";
        Estrados => "estrados", "Estrados";
        DomicilioInexistente => "domicilio_inexistente", "Domicilio inexistente";
        DiligenciadorAusente => "diligenciador_ausente", "Diligenciador ausente";
    }
);

catalogue!(PaymentMethod, "medio_pago" {
    Gratuito => "gratuito", "Gratuito";
    Efectivo => "efectivo", "Efectivo";
    Transferencia => "transferencia", "Transferencia";
    Qr => "qr", "QR";
});

catalogue!(
    /// Why a result was uploaded after the fact instead of on site.
    FailureReason, "motivo_falla_senal" {
        SinSenalDomicilio => "sin_senal_domicilio", "Falta de señal en domicilio";
        FallaDatos => "falla_datos", "Falla temporal de datos";
        Otro => "otro", "Otro";
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub fecha_carga: DateTime<Utc>,
    pub usuario_carga: Option<String>,
    pub estado: String,
    pub tipo_notificacion: String,
    pub n_expediente: String,
    pub caratula: String,
    pub origen: String,
    pub letrado: Option<String>,
    pub destinatario_especial: Option<String>,
    pub destinatario_nombre: String,
    pub domicilio: String,
    pub zona: String,
    pub tipo_troquel: Option<String>,
    pub sin_troquel: bool,
    pub n_troquel: Option<String>,
    pub medio_pago: Option<String>,
    pub costo: f64,
    pub observaciones_iniciales: Option<String>,
    pub asignado_a: Option<Uuid>,
    pub fecha_asignacion: Option<DateTime<Utc>>,
    pub asignado_por: Option<Uuid>,
    pub resultado_diligencia: Option<String>,
    pub fecha_diligencia: Option<DateTime<Utc>>,
    pub ubicacion_lat: Option<f64>,
    pub ubicacion_lng: Option<f64>,
    pub evidencia_foto: Option<String>,
    pub observacion_audio: Option<String>,
    pub transcripcion_audio: Option<String>,
    pub es_carga_diferida: bool,
    pub motivo_falla_senal: Option<String>,
    pub observaciones_resultado: Option<String>,
    pub diligenciado_por: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// Notification row joined with the assigned agent's name and email.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct NotificationWithAgent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub notification: Notification,
    pub ujier_nombre: Option<String>,
    pub ujier_email: Option<String>,
}
