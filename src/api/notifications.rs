use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{Notification, NotificationResponse},
};
use actix_web::{web, HttpResponse, Responder};
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId};

const COLLECTION: &str = "notifications";

#[utoipa::path(
    get,
    path = "/charm/notifications",
    tag = "Notifications",
    responses(
        (status = 200, description = "Notifications for the authenticated user")
    ),
    security(("bearer_auth" = []))
)]
/// GET /charm/notifications - Inbox do usuário, mais recentes primeiro
pub async fn list_notifications(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> impl Responder {
    let collection = db.collection::<Notification>(COLLECTION);

    match collection
        .find(doc! { "user_id": &user.sub })
        .sort(doc! { "created_at": -1 })
        .await
    {
        Ok(mut cursor) => {
            let mut notifications = Vec::new();
            while let Some(result) = cursor.next().await {
                match result {
                    Ok(notification) => notifications.push(NotificationResponse::from(notification)),
                    Err(e) => log::warn!("⚠️ Skipping unreadable notification row: {}", e),
                }
            }

            let unread = notifications.iter().filter(|n| !n.is_read).count();

            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "notifications": notifications,
                "total": notifications.len(),
                "unread": unread
            }))
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to fetch notifications: {}", e)
        })),
    }
}

/// PUT /charm/notifications/{id}/read - Marca uma notificação própria como lida
pub async fn mark_read(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    let notification_id = path.into_inner();

    let object_id = match ObjectId::parse_str(&notification_id) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": "Invalid notification ID"
            }))
        }
    };

    let collection = db.collection::<Notification>(COLLECTION);

    // Filtro com user_id: ninguém marca notificação alheia
    match collection
        .update_one(
            doc! { "_id": object_id, "user_id": &user.sub },
            doc! { "$set": { "is_read": true } },
        )
        .await
    {
        Ok(result) if result.matched_count == 0 => {
            HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": "Notification not found"
            }))
        }
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Notification marked as read"
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to update notification: {}", e)
        })),
    }
}

/// PUT /charm/notifications/read-all - Marca todas as não lidas do usuário
pub async fn mark_all_read(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    let collection = db.collection::<Notification>(COLLECTION);

    match collection
        .update_many(
            doc! { "user_id": &user.sub, "is_read": false },
            doc! { "$set": { "is_read": true } },
        )
        .await
    {
        Ok(result) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "updated": result.modified_count
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to update notifications: {}", e)
        })),
    }
}

/// DELETE /charm/notifications/{id}
pub async fn delete_notification(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    let notification_id = path.into_inner();

    let object_id = match ObjectId::parse_str(&notification_id) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": "Invalid notification ID"
            }))
        }
    };

    let collection = db.collection::<Notification>(COLLECTION);

    match collection
        .delete_one(doc! { "_id": object_id, "user_id": &user.sub })
        .await
    {
        Ok(result) if result.deleted_count == 0 => {
            HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": "Notification not found"
            }))
        }
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Notification deleted"
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to delete notification: {}", e)
        })),
    }
}

/// DELETE /charm/notifications - Limpa o inbox inteiro do usuário
pub async fn delete_all_notifications(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> impl Responder {
    let collection = db.collection::<Notification>(COLLECTION);

    match collection.delete_many(doc! { "user_id": &user.sub }).await {
        Ok(result) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "deleted": result.deleted_count
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to delete notifications: {}", e)
        })),
    }
}
