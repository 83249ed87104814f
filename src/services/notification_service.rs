// ==================== NOTIFICATION FAN-OUT ====================
// Toda mutação relevante (registro, CRUD de cartão, scan, cobrança, staff,
// reclamação/feedback, avatar) escreve uma notificação por admin atual,
// mais opcionalmente uma para o usuário afetado. O conjunto de admins é
// consultado no momento do evento, nunca retroativo.

use crate::{
    database::MongoDB,
    models::{Notification, User},
};
use futures::stream::StreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use mongodb::ClientSession;

const COLLECTION: &str = "notifications";

fn build_notification(
    user_id: &str,
    title: &str,
    message: &str,
    related_id: Option<&str>,
    related_type: Option<&str>,
) -> Notification {
    Notification {
        id: None,
        user_id: user_id.to_string(),
        title: title.to_string(),
        message: message.to_string(),
        related_id: related_id.map(|s| s.to_string()),
        related_type: related_type.map(|s| s.to_string()),
        is_read: false,
        created_at: BsonDateTime::now(),
    }
}

/// IDs de todos os usuários com papel de admin (supa + staff) neste instante
async fn find_admin_ids(db: &MongoDB) -> Result<Vec<String>, String> {
    let collection = db.collection::<User>("users");

    let mut cursor = collection
        .find(doc! { "agility": { "$in": ["supa", "staff"] } })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let mut ids = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(user) => ids.push(user.user_id),
            Err(e) => log::warn!("⚠️ Skipping unreadable admin row: {}", e),
        }
    }

    Ok(ids)
}

/// Uma notificação por admin atual. Zero admins → zero linhas (no-op
/// silencioso). Custo cresce linearmente com o número de admins.
pub async fn notify_admins(
    db: &MongoDB,
    title: &str,
    message: &str,
    related_id: Option<&str>,
    related_type: Option<&str>,
) -> Result<u64, String> {
    let admin_ids = find_admin_ids(db).await?;
    if admin_ids.is_empty() {
        return Ok(0);
    }

    let docs: Vec<Notification> = admin_ids
        .iter()
        .map(|id| build_notification(id, title, message, related_id, related_type))
        .collect();

    db.collection::<Notification>(COLLECTION)
        .insert_many(&docs)
        .await
        .map_err(|e| format!("Failed to insert notifications: {}", e))?;

    Ok(docs.len() as u64)
}

/// Variante transacional usada pelo fluxo de scan
pub async fn notify_admins_in_session(
    db: &MongoDB,
    session: &mut ClientSession,
    title: &str,
    message: &str,
    related_id: Option<&str>,
    related_type: Option<&str>,
) -> Result<u64, String> {
    let admin_ids = find_admin_ids(db).await?;
    if admin_ids.is_empty() {
        return Ok(0);
    }

    let docs: Vec<Notification> = admin_ids
        .iter()
        .map(|id| build_notification(id, title, message, related_id, related_type))
        .collect();

    db.collection::<Notification>(COLLECTION)
        .insert_many(&docs)
        .session(&mut *session)
        .await
        .map_err(|e| format!("Failed to insert notifications: {}", e))?;

    Ok(docs.len() as u64)
}

/// Notificação única para o usuário afetado
pub async fn notify_user(
    db: &MongoDB,
    user_id: &str,
    title: &str,
    message: &str,
    related_id: Option<&str>,
    related_type: Option<&str>,
) -> Result<(), String> {
    let notification = build_notification(user_id, title, message, related_id, related_type);

    db.collection::<Notification>(COLLECTION)
        .insert_one(&notification)
        .await
        .map_err(|e| format!("Failed to insert notification: {}", e))?;

    Ok(())
}

pub async fn notify_user_in_session(
    db: &MongoDB,
    session: &mut ClientSession,
    user_id: &str,
    title: &str,
    message: &str,
    related_id: Option<&str>,
    related_type: Option<&str>,
) -> Result<(), String> {
    let notification = build_notification(user_id, title, message, related_id, related_type);

    db.collection::<Notification>(COLLECTION)
        .insert_one(&notification)
        .session(&mut *session)
        .await
        .map_err(|e| format!("Failed to insert notification: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_notification_defaults() {
        let n = build_notification(
            "u1",
            "Card scanned",
            "Your card was scanned in Lisboa, Portugal",
            Some("c1"),
            Some("scan"),
        );

        assert_eq!(n.user_id, "u1");
        assert!(!n.is_read);
        assert_eq!(n.related_id.as_deref(), Some("c1"));
        assert_eq!(n.related_type.as_deref(), Some("scan"));
        assert!(n.id.is_none());
    }
}
