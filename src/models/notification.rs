use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Notificação (collection "notifications")
///
/// Criada como efeito colateral de mutações (registro, CRUD de cartão, scans,
/// cobrança). Só o flag is_read muda depois de criada.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Destinatário
    pub user_id: String,

    pub title: String,
    pub message: String,

    /// Entidade relacionada (card_id, user_id, ...) + tipo ("vcard", "scan",
    /// "user", "billing", "complaint", "feedback")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_type: Option<String>,

    #[serde(default)]
    pub is_read: bool,

    pub created_at: BsonDateTime,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct NotificationResponse {
    pub id: String,
    pub title: String,
    pub message: String,
    pub related_id: Option<String>,
    pub related_type: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        NotificationResponse {
            id: n.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: n.title,
            message: n.message,
            related_id: n.related_id,
            related_type: n.related_type,
            is_read: n.is_read,
            created_at: n.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}
