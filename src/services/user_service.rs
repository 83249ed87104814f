// ==================== USER PROFILE ====================
// Perfil, troca de senha, avatar e deleção de conta com cascade de cartões.

use crate::{
    database::MongoDB,
    models::{User, UserInfo, VCard},
    services::notification_service,
    utils::upload,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use futures::stream::StreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

pub async fn get_profile(db: &MongoDB, user_id: &str) -> Result<UserInfo, String> {
    let user = db
        .collection::<User>("users")
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    Ok(UserInfo::from(user))
}

pub async fn update_profile(
    db: &MongoDB,
    user_id: &str,
    request: UpdateProfileRequest,
) -> Result<UserInfo, String> {
    let collection = db.collection::<User>("users");

    let mut set_doc = doc! { "updated_at": BsonDateTime::now() };

    if let Some(username) = &request.username {
        if username.trim().is_empty() {
            return Err("Username cannot be empty".to_string());
        }
        set_doc.insert("username", username.trim());
    }

    if let Some(email) = &request.email {
        if !email.contains('@') {
            return Err("A valid email is required".to_string());
        }

        // Email continua único entre usuários
        let taken = collection
            .find_one(doc! { "email": email, "user_id": { "$ne": user_id } })
            .await
            .map_err(|e| format!("Database error: {}", e))?;

        if taken.is_some() {
            return Err("Email already registered".to_string());
        }

        set_doc.insert("email", email.trim());
    }

    let result = collection
        .update_one(doc! { "user_id": user_id }, doc! { "$set": set_doc })
        .await
        .map_err(|e| format!("Failed to update profile: {}", e))?;

    if result.matched_count == 0 {
        return Err("User not found".to_string());
    }

    get_profile(db, user_id).await
}

pub async fn change_password(
    db: &MongoDB,
    user_id: &str,
    request: &ChangePasswordRequest,
) -> Result<(), String> {
    if request.new_password.len() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }

    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    let valid = verify(&request.old_password, &user.password)
        .map_err(|e| format!("Password verification error: {}", e))?;

    if !valid {
        return Err("Current password is incorrect".to_string());
    }

    let hashed = hash(&request.new_password, DEFAULT_COST)
        .map_err(|e| format!("Failed to hash password: {}", e))?;

    collection
        .update_one(
            doc! { "user_id": user_id },
            doc! { "$set": { "password": hashed, "updated_at": BsonDateTime::now() } },
        )
        .await
        .map_err(|e| format!("Failed to update password: {}", e))?;

    Ok(())
}

/// Troca o avatar e devolve o path antigo (para limpeza do arquivo).
/// Troca de avatar é evento admin-relevante e entra no fan-out.
pub async fn set_avatar(
    db: &MongoDB,
    user_id: &str,
    photo_path: &str,
) -> Result<Option<String>, String> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    collection
        .update_one(
            doc! { "user_id": user_id },
            doc! { "$set": { "photo": photo_path, "updated_at": BsonDateTime::now() } },
        )
        .await
        .map_err(|e| format!("Failed to set avatar: {}", e))?;

    notification_service::notify_admins(
        db,
        "Avatar updated",
        &format!("{} changed their profile photo", user.username),
        Some(user_id),
        Some("user"),
    )
    .await?;

    Ok(user.photo)
}

pub async fn remove_avatar(db: &MongoDB, user_id: &str) -> Result<Option<String>, String> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    collection
        .update_one(
            doc! { "user_id": user_id },
            doc! {
                "$unset": { "photo": "" },
                "$set": { "updated_at": BsonDateTime::now() },
            },
        )
        .await
        .map_err(|e| format!("Failed to remove avatar: {}", e))?;

    Ok(user.photo)
}

/// Deleta a conta e cascateia: todos os cartões do usuário e as notificações
/// endereçadas a ele somem junto. Scan logs ficam: histórico de scan
/// sobrevive ao dono por design. Fotos em disco são removidas best-effort.
pub async fn delete_account(db: &MongoDB, user_id: &str) -> Result<User, String> {
    let users = db.collection::<User>("users");

    let user = users
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    // Junta as fotos dos cartões antes de deletar as rows
    let vcards = db.collection::<VCard>("vcards");
    let mut photos: Vec<String> = Vec::new();

    let mut cursor = vcards
        .find(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    while let Some(result) = cursor.next().await {
        if let Ok(card) = result {
            if let Some(photo) = card.photo {
                photos.push(photo);
            }
        }
    }

    let deleted_cards = vcards
        .delete_many(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Failed to delete cards: {}", e))?;

    db.collection::<mongodb::bson::Document>("notifications")
        .delete_many(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Failed to delete notifications: {}", e))?;

    users
        .delete_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Failed to delete user: {}", e))?;

    let dir = upload::uploads_dir();
    if let Some(photo) = &user.photo {
        upload::remove_photo(&dir, photo).await;
    }
    for photo in &photos {
        upload::remove_photo(&dir, photo).await;
    }

    log::info!(
        "🗑️ Account {} deleted ({} cards cascaded, scan logs preserved)",
        user_id,
        deleted_cards.deleted_count
    );

    Ok(user)
}
