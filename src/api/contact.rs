use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{Complaint, Feedback},
    services::notification_service,
};
use actix_web::{web, HttpResponse, Responder};
use futures::stream::StreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ComplaintRequest {
    pub name: String,
    pub email: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct FeedbackRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// POST /charm/complain - Formulário público de reclamação
pub async fn submit_complaint(
    db: web::Data<MongoDB>,
    request: web::Json<ComplaintRequest>,
) -> impl Responder {
    if request.title.trim().is_empty() || request.description.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Title and description are required"
        }));
    }

    let complaint = Complaint {
        id: None,
        name: request.name.trim().to_string(),
        email: request.email.trim().to_string(),
        title: request.title.trim().to_string(),
        description: request.description.trim().to_string(),
        created_at: BsonDateTime::now(),
    };

    let collection = db.collection::<Complaint>("complain");

    match collection.insert_one(&complaint).await {
        Ok(inserted) => {
            let related_id = inserted
                .inserted_id
                .as_object_id()
                .map(|id| id.to_hex());

            if let Err(e) = notification_service::notify_admins(
                &db,
                "New complaint",
                &format!("{} submitted a complaint: '{}'", complaint.name, complaint.title),
                related_id.as_deref(),
                Some("complaint"),
            )
            .await
            {
                log::error!("❌ Complaint fan-out failed: {}", e);
            }

            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "message": "Complaint submitted"
            }))
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to save complaint: {}", e)
        })),
    }
}

/// POST /charm/feedback - Formulário público de feedback
pub async fn submit_feedback(
    db: web::Data<MongoDB>,
    request: web::Json<FeedbackRequest>,
) -> impl Responder {
    if request.message.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Message is required"
        }));
    }

    let feedback = Feedback {
        id: None,
        name: request.name.trim().to_string(),
        email: request.email.trim().to_string(),
        message: request.message.trim().to_string(),
        created_at: BsonDateTime::now(),
    };

    let collection = db.collection::<Feedback>("feedback");

    match collection.insert_one(&feedback).await {
        Ok(inserted) => {
            let related_id = inserted
                .inserted_id
                .as_object_id()
                .map(|id| id.to_hex());

            if let Err(e) = notification_service::notify_admins(
                &db,
                "New feedback",
                &format!("{} left feedback", feedback.name),
                related_id.as_deref(),
                Some("feedback"),
            )
            .await
            {
                log::error!("❌ Feedback fan-out failed: {}", e);
            }

            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "message": "Feedback submitted"
            }))
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to save feedback: {}", e)
        })),
    }
}

/// GET /charm/complain - Reclamações (admin)
pub async fn list_complaints(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    if !user.is_admin() {
        return HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": "Admin access required"
        }));
    }

    let collection = db.collection::<Complaint>("complain");

    match collection
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await
    {
        Ok(mut cursor) => {
            let mut complaints = Vec::new();
            while let Some(result) = cursor.next().await {
                match result {
                    Ok(complaint) => complaints.push(serde_json::json!({
                        "id": complaint.id.map(|id| id.to_hex()).unwrap_or_default(),
                        "name": complaint.name,
                        "email": complaint.email,
                        "title": complaint.title,
                        "description": complaint.description,
                        "created_at": complaint.created_at.try_to_rfc3339_string().unwrap_or_default(),
                    })),
                    Err(e) => log::warn!("⚠️ Skipping unreadable complaint row: {}", e),
                }
            }

            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "complaints": complaints,
                "total": complaints.len()
            }))
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to fetch complaints: {}", e)
        })),
    }
}

/// GET /charm/feedback - Feedback (admin)
pub async fn list_feedback(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    if !user.is_admin() {
        return HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": "Admin access required"
        }));
    }

    let collection = db.collection::<Feedback>("feedback");

    match collection
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await
    {
        Ok(mut cursor) => {
            let mut feedback_rows = Vec::new();
            while let Some(result) = cursor.next().await {
                match result {
                    Ok(feedback) => feedback_rows.push(serde_json::json!({
                        "id": feedback.id.map(|id| id.to_hex()).unwrap_or_default(),
                        "name": feedback.name,
                        "email": feedback.email,
                        "message": feedback.message,
                        "created_at": feedback.created_at.try_to_rfc3339_string().unwrap_or_default(),
                    })),
                    Err(e) => log::warn!("⚠️ Skipping unreadable feedback row: {}", e),
                }
            }

            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "feedback": feedback_rows,
                "total": feedback_rows.len()
            }))
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to fetch feedback: {}", e)
        })),
    }
}
