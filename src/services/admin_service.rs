// ==================== ADMINISTRATION ====================
// Gestão de staff e usuários, cobrança e visão geral de cartões. As
// listagens com contagens usam uma agregação $group por coleção e juntam
// em memória: número constante de queries, independente do tamanho da
// lista (a forma da resposta é a mesma do modelo antigo de um count por
// linha).

use crate::{
    database::MongoDB,
    models::{Agility, Bills, User, UserInfo, VCard},
    services::{email_service, notification_service, scan_service, user_service},
};
use bcrypt::{hash, DEFAULT_COST};
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==================== REQUEST/RESPONSE MODELS ====================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateStaffRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreateStaffResponse {
    pub success: bool,
    pub user: UserInfo,
    /// Entrega das credenciais é best-effort; a conta existe mesmo se o
    /// email falhar
    pub email_sent: bool,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateBillsRequest {
    pub bills: Bills,
}

/// Usuário + contagens para os painéis admin
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserWithStats {
    pub id: String,
    pub username: String,
    pub email: String,
    pub agility: Agility,
    pub bills: Bills,
    pub photo: Option<String>,
    pub created_at: Option<String>,
    pub cards_count: i64,
    pub scans_count: i64,
}

/// Cartão + contagem de scans para a visão geral admin
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CardWithStats {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub title: Option<String>,
    pub photo: Option<String>,
    pub created_at: Option<String>,
    pub scans_count: i64,
}

// ==================== LISTINGS ====================

async fn card_counts_by_user(db: &MongoDB) -> Result<HashMap<String, i64>, String> {
    let pipeline = vec![doc! {
        "$group": { "_id": "$user_id", "count": { "$sum": 1 } }
    }];

    let mut cursor = db
        .collection::<Document>("vcards")
        .aggregate(pipeline)
        .await
        .map_err(|e| format!("Aggregation error: {}", e))?;

    let mut counts = HashMap::new();
    while let Some(result) = cursor.next().await {
        let document = result.map_err(|e| format!("Aggregation cursor error: {}", e))?;
        let key = document.get_str("_id").unwrap_or_default().to_string();
        let count = document
            .get_i64("count")
            .unwrap_or_else(|_| document.get_i32("count").unwrap_or(0) as i64);
        if !key.is_empty() {
            counts.insert(key, count);
        }
    }

    Ok(counts)
}

/// Lista usuários de um papel com contagem de cartões e scans
pub async fn list_with_stats(db: &MongoDB, role: Agility) -> Result<Vec<UserWithStats>, String> {
    let mut cursor = db
        .collection::<User>("users")
        .find(doc! { "agility": role.to_string() })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let mut users = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(user) => users.push(user),
            Err(e) => log::warn!("⚠️ Skipping unreadable user row: {}", e),
        }
    }

    let card_counts = card_counts_by_user(db).await?;
    let scan_counts = scan_service::scan_counts_by_user(db).await?;

    let mut stats: Vec<UserWithStats> = users
        .into_iter()
        .map(|user| {
            let cards_count = card_counts.get(&user.user_id).copied().unwrap_or(0);
            let scans_count = scan_counts.get(&user.user_id).copied().unwrap_or(0);
            let info = UserInfo::from(user);
            UserWithStats {
                id: info.id,
                username: info.username,
                email: info.email,
                agility: info.agility,
                bills: info.bills,
                photo: info.photo,
                created_at: info.created_at,
                cards_count,
                scans_count,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(stats)
}

/// Todos os cartões do sistema com contagem de scans
pub async fn cards_overview(db: &MongoDB) -> Result<Vec<CardWithStats>, String> {
    let mut cursor = db
        .collection::<VCard>("vcards")
        .find(doc! {})
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let scan_counts = scan_service::scan_counts_by_card(db).await?;

    let mut cards = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(card) => {
                let scans_count = scan_counts.get(&card.card_id).copied().unwrap_or(0);
                cards.push(CardWithStats {
                    id: card.card_id,
                    user_id: card.user_id,
                    name: card.name,
                    title: card.title,
                    photo: card.photo,
                    created_at: card
                        .created_at
                        .map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
                    scans_count,
                });
            }
            Err(e) => log::warn!("⚠️ Skipping unreadable card row: {}", e),
        }
    }

    cards.sort_by(|a, b| b.scans_count.cmp(&a.scans_count));

    Ok(cards)
}

// ==================== STAFF MANAGEMENT ====================

fn generate_temp_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

pub async fn create_staff(
    db: &MongoDB,
    request: &CreateStaffRequest,
) -> Result<CreateStaffResponse, String> {
    if request.username.trim().is_empty() {
        return Err("Username is required".to_string());
    }
    if !request.email.contains('@') {
        return Err("A valid email is required".to_string());
    }

    let collection = db.collection::<User>("users");

    let existing = collection
        .find_one(doc! { "email": &request.email })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    if existing.is_some() {
        return Err("Email already registered".to_string());
    }

    let temp_password = generate_temp_password();
    let hashed = hash(&temp_password, DEFAULT_COST)
        .map_err(|e| format!("Failed to hash password: {}", e))?;

    let user_id = ObjectId::new().to_hex();

    let staff = User {
        id: None,
        user_id: user_id.clone(),
        username: request.username.trim().to_string(),
        email: request.email.trim().to_string(),
        password: hashed,
        agility: Agility::Staff,
        bills: Bills::Paid,
        photo: None,
        otp_code: None,
        otp_expires_at: None,
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
    };

    collection
        .insert_one(&staff)
        .await
        .map_err(|e| format!("Failed to create staff: {}", e))?;

    // Credenciais por email; falha não desfaz a conta
    let email_sent = match email_service::send_staff_credentials_email(
        &staff.email,
        &staff.username,
        &temp_password,
    )
    .await
    {
        Ok(()) => true,
        Err(e) => {
            log::error!("❌ Failed to email staff credentials to {}: {}", staff.email, e);
            false
        }
    };

    notification_service::notify_admins(
        db,
        "New staff member",
        &format!("Staff account created for {} ({})", staff.username, staff.email),
        Some(&user_id),
        Some("user"),
    )
    .await?;

    notification_service::notify_user(
        db,
        &user_id,
        "Welcome to the team",
        "Your staff account was created. Check your email for the credentials.",
        None,
        None,
    )
    .await?;

    log::info!("✅ Staff {} created (email_sent: {})", staff.email, email_sent);

    Ok(CreateStaffResponse {
        success: true,
        user: UserInfo::from(staff),
        email_sent,
    })
}

/// Remove uma conta de um papel específico (staff ou yuza) com o cascade de
/// user_service::delete_account. Contas de outro papel respondem como
/// inexistentes: DELETE /staff não derruba supa nem usuário comum.
pub async fn remove_account(
    db: &MongoDB,
    user_id: &str,
    expected_role: Agility,
) -> Result<UserInfo, String> {
    let target = db
        .collection::<User>("users")
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let not_found = match expected_role {
        Agility::Staff => "Staff member not found",
        _ => "User not found",
    };

    let target = target.ok_or_else(|| not_found.to_string())?;
    if target.agility != expected_role {
        return Err(not_found.to_string());
    }

    let deleted = user_service::delete_account(db, user_id).await?;

    let (title, message) = match expected_role {
        Agility::Staff => (
            "Staff removed",
            format!("Staff account {} ({}) was removed", deleted.username, deleted.email),
        ),
        _ => (
            "User removed",
            format!("User account {} ({}) was removed", deleted.username, deleted.email),
        ),
    };

    notification_service::notify_admins(db, title, &message, Some(user_id), Some("user")).await?;

    Ok(UserInfo::from(deleted))
}

// ==================== BILLING ====================

/// Atualiza o status de cobrança. Sem deduplicação: dois PUTs concorrentes
/// geram dois conjuntos de notificações e vence o que commitar por último.
pub async fn update_bills(
    db: &MongoDB,
    user_id: &str,
    bills: Bills,
) -> Result<UserInfo, String> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    collection
        .update_one(
            doc! { "user_id": user_id },
            doc! { "$set": { "bills": bills.to_string(), "updated_at": BsonDateTime::now() } },
        )
        .await
        .map_err(|e| format!("Failed to update billing: {}", e))?;

    notification_service::notify_admins(
        db,
        "Billing updated",
        &format!("Billing for {} set to '{}'", user.username, bills),
        Some(user_id),
        Some("billing"),
    )
    .await?;

    notification_service::notify_user(
        db,
        user_id,
        "Billing status changed",
        &format!("Your billing status is now '{}'", bills),
        Some(user_id),
        Some("billing"),
    )
    .await?;

    get_updated_info(db, user_id).await
}

async fn get_updated_info(db: &MongoDB, user_id: &str) -> Result<UserInfo, String> {
    let user = db
        .collection::<User>("users")
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    Ok(UserInfo::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_password_shape() {
        let password = generate_temp_password();
        assert_eq!(password.len(), 12);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));

        // Duas gerações seguidas não devem colidir
        assert_ne!(generate_temp_password(), generate_temp_password());
    }
}
