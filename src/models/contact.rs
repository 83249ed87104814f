use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Reclamação enviada pelo formulário de contato (collection "complain")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub title: String,
    pub description: String,
    pub created_at: BsonDateTime,
}

/// Feedback livre (collection "feedback")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: BsonDateTime,
}
