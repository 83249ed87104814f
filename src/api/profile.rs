use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    services::{notification_service, user_service},
    services::user_service::{ChangePasswordRequest, UpdateProfileRequest},
    utils::{error::AppError, upload},
};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures::StreamExt;

/// GET /charm/profile - Dados do usuário autenticado
pub async fn get_profile(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    match user_service::get_profile(&db, &user.sub).await {
        Ok(info) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": info
        })),
        Err(e) if e == "User not found" => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

/// PUT /charm/profile - Atualiza username/email
pub async fn update_profile(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    log::info!("🔧 PUT /charm/profile - user {}", user.sub);

    match user_service::update_profile(&db, &user.sub, request.into_inner()).await {
        Ok(info) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": info
        })),
        Err(e) if e == "Email already registered" => {
            HttpResponse::Conflict().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
        Err(e) if e == "User not found" => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) if e.contains("cannot be empty") || e.contains("required") => {
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

/// PUT /charm/profile/password - Troca de senha autenticada
pub async fn change_password(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<ChangePasswordRequest>,
) -> impl Responder {
    log::info!("🔑 PUT /charm/profile/password - user {}", user.sub);

    match user_service::change_password(&db, &user.sub, &request).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Password updated"
        })),
        Err(e) if e == "Current password is incorrect" => {
            HttpResponse::Unauthorized().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
        Err(e) if e.contains("at least") => HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

/// POST /charm/profile/avatar - Upload multipart da foto de perfil
pub async fn upload_avatar(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    mut payload: Multipart,
) -> impl Responder {
    log::info!("🖼️ POST /charm/profile/avatar - user {}", user.sub);

    let dir = upload::uploads_dir();

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(e) => {
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "success": false,
                    "error": format!("Malformed upload: {}", e)
                }))
            }
        };

        // Só interessa o primeiro field com arquivo
        let has_file = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some();
        if !has_file {
            continue;
        }

        let path = match upload::save_photo(&mut field, &dir).await {
            Ok(path) => path,
            Err(AppError::InvalidRequest(msg)) => {
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "success": false,
                    "error": msg
                }))
            }
            Err(e) => {
                log::error!("❌ Avatar upload failed: {}", e);
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "success": false,
                    "error": e.to_string()
                }));
            }
        };

        return match user_service::set_avatar(&db, &user.sub, &path).await {
            Ok(old_photo) => {
                if let Some(old) = old_photo {
                    upload::remove_photo(&dir, &old).await;
                }
                HttpResponse::Ok().json(serde_json::json!({
                    "success": true,
                    "photo": path
                }))
            }
            Err(e) => {
                // A row não foi atualizada; não deixa o arquivo órfão
                upload::remove_photo(&dir, &path).await;
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "success": false,
                    "error": e
                }))
            }
        };
    }

    HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "error": "No file field in upload"
    }))
}

/// DELETE /charm/profile/avatar
pub async fn remove_avatar(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    match user_service::remove_avatar(&db, &user.sub).await {
        Ok(old_photo) => {
            if let Some(old) = old_photo {
                upload::remove_photo(&upload::uploads_dir(), &old).await;
            }
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Avatar removed"
            }))
        }
        Err(e) if e == "User not found" => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

/// DELETE /charm/profile - Deleta a própria conta (cascade de cartões)
pub async fn delete_account(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    log::info!("🗑️ DELETE /charm/profile - user {}", user.sub);

    match user_service::delete_account(&db, &user.sub).await {
        Ok(deleted) => {
            if let Err(e) = notification_service::notify_admins(
                &db,
                "Account deleted",
                &format!("{} ({}) deleted their account", deleted.username, deleted.email),
                Some(&user.sub),
                Some("user"),
            )
            .await
            {
                log::error!("❌ Fan-out after account deletion failed: {}", e);
            }

            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Account deleted"
            }))
        }
        Err(e) if e == "User not found" => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}
