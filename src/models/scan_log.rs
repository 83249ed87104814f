use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Registro de scan (collection "scan_logs")
///
/// Imutável: inserido uma vez por scan e nunca atualizado. Sobrevive à
/// deleção do cartão e do dono: histórico de auditoria.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub card_id: String,

    /// Dono do cartão no momento do scan (desnormalizado)
    pub user_id: String,

    pub ip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub user_agent: Option<String>,
    pub platform: Option<String>,

    pub scanned_at: BsonDateTime,
}

/// Linha de scan retornada nos endpoints de histórico
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ScanLogResponse {
    pub id: String,
    pub card_id: String,
    pub ip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub user_agent: Option<String>,
    pub platform: Option<String>,
    pub scanned_at: String,
}

impl From<ScanLog> for ScanLogResponse {
    fn from(log: ScanLog) -> Self {
        ScanLogResponse {
            id: log.id.map(|id| id.to_hex()).unwrap_or_default(),
            card_id: log.card_id,
            ip: log.ip,
            latitude: log.latitude,
            longitude: log.longitude,
            city: log.city,
            country: log.country,
            user_agent: log.user_agent,
            platform: log.platform,
            scanned_at: log
                .scanned_at
                .try_to_rfc3339_string()
                .unwrap_or_default(),
        }
    }
}
