use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cartão de visita digital (collection "vcards")
///
/// Socials ficam em BTreeMap para manter ordem estável: o arquivo de contato
/// gerado no scan precisa ser byte-idêntico entre chamadas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VCard {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// ID do cartão (ObjectId hex), usado no link público e no QR
    pub card_id: String,

    /// Dono do cartão
    pub user_id: String,

    /// Nome completo exibido no cartão
    pub name: String,

    /// Cargo/título opcional
    pub title: Option<String>,

    pub phones: Vec<String>,
    pub emails: Vec<String>,

    /// Rede social -> URL (ex: "linkedin" -> "https://...")
    pub socials: BTreeMap<String, String>,

    pub other_links: Vec<String>,

    /// Foto do cartão (path relativo em /uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,

    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

/// Request para criar cartão
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateVCardRequest {
    pub name: String,
    pub title: Option<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub socials: BTreeMap<String, String>,
    #[serde(default, rename = "otherLinks")]
    pub other_links: Vec<String>,
}

/// Request para atualizar cartão
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateVCardRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub phones: Option<Vec<String>>,
    pub emails: Option<Vec<String>>,
    pub socials: Option<BTreeMap<String, String>>,
    #[serde(rename = "otherLinks")]
    pub other_links: Option<Vec<String>>,
}

/// Response de cartão
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VCardResponse {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub title: Option<String>,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub socials: BTreeMap<String, String>,
    #[serde(rename = "otherLinks")]
    pub other_links: Vec<String>,
    pub photo: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<VCard> for VCardResponse {
    fn from(card: VCard) -> Self {
        VCardResponse {
            id: card.card_id,
            user_id: card.user_id,
            name: card.name,
            title: card.title,
            phones: card.phones,
            emails: card.emails,
            socials: card.socials,
            other_links: card.other_links,
            photo: card.photo,
            created_at: card
                .created_at
                .map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
            updated_at: card
                .updated_at
                .map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
        }
    }
}
