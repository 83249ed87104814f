use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Papel do usuário no sistema (role)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Agility {
    /// Super admin
    Supa,
    /// Staff member
    Staff,
    /// Regular user
    Yuza,
}

impl Agility {
    /// Supa and staff both receive admin notifications and can manage users
    pub fn is_admin(&self) -> bool {
        matches!(self, Agility::Supa | Agility::Staff)
    }
}

impl fmt::Display for Agility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Agility::Supa => write!(f, "supa"),
            Agility::Staff => write!(f, "staff"),
            Agility::Yuza => write!(f, "yuza"),
        }
    }
}

/// Status de cobrança; gates card creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum Bills {
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "not paid")]
    NotPaid,
    #[serde(rename = "suspended")]
    Suspended,
}

impl fmt::Display for Bills {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bills::Paid => write!(f, "paid"),
            Bills::NotPaid => write!(f, "not paid"),
            Bills::Suspended => write!(f, "suspended"),
        }
    }
}

/// Documento da collection "users"
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,  // PRIMARY IDENTIFIER (ObjectId hex)
    pub username: String,
    pub email: String,
    pub password: String,  // bcrypt hash, never leaves the service
    pub agility: Agility,
    pub bills: Bills,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,  // relative path under /uploads
    /// OTP de reset de senha (6 dígitos) + expiração em unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_expires_at: Option<i64>,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

/// User info returned to clients (no password hash)
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub agility: Agility,
    pub bills: Bills,
    pub photo: Option<String>,
    pub created_at: Option<String>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.user_id,
            username: user.username,
            email: user.email,
            agility: user.agility,
            bills: user.bills,
            photo: user.photo,
            created_at: user
                .created_at
                .map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agility_wire_strings() {
        assert_eq!(serde_json::to_string(&Agility::Supa).unwrap(), "\"supa\"");
        assert_eq!(serde_json::to_string(&Agility::Staff).unwrap(), "\"staff\"");
        assert_eq!(serde_json::to_string(&Agility::Yuza).unwrap(), "\"yuza\"");

        let parsed: Agility = serde_json::from_str("\"yuza\"").unwrap();
        assert_eq!(parsed, Agility::Yuza);
    }

    #[test]
    fn test_bills_wire_strings() {
        // "not paid" carrega espaço, formato herdado do schema antigo
        assert_eq!(serde_json::to_string(&Bills::NotPaid).unwrap(), "\"not paid\"");
        assert_eq!(serde_json::to_string(&Bills::Suspended).unwrap(), "\"suspended\"");

        let parsed: Bills = serde_json::from_str("\"not paid\"").unwrap();
        assert_eq!(parsed, Bills::NotPaid);
        assert_eq!(parsed.to_string(), "not paid");
    }

    #[test]
    fn test_is_admin() {
        assert!(Agility::Supa.is_admin());
        assert!(Agility::Staff.is_admin());
        assert!(!Agility::Yuza.is_admin());
    }
}
