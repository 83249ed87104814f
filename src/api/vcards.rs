use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{CreateVCardRequest, UpdateVCardRequest, VCardResponse},
    services::{admin_service, scan_service, vcard_service},
    utils::{error::AppError, upload},
};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures::StreamExt;
use std::env;

/// POST /charm/cards - Cria cartão (exige cobrança em dia)
pub async fn create_card(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateVCardRequest>,
) -> impl Responder {
    log::info!("📇 POST /charm/cards - user {}", user.sub);

    match vcard_service::create_card(&db, &user.sub, request.into_inner()).await {
        Ok(card) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "card": card
        })),
        Err(e) if e.contains("paid billing") => {
            log::warn!("💳 Card creation blocked for user {} (billing)", user.sub);
            HttpResponse::Forbidden().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
        Err(e) if e.contains("required") => HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) => {
            log::error!("❌ Card creation failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// GET /charm/cards - Cartões do usuário autenticado
pub async fn list_cards(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    match vcard_service::list_cards(&db, &user.sub).await {
        Ok(cards) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "cards": cards,
            "total": cards.len()
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

/// GET /charm/cards/overview - Todos os cartões + contagem de scans (admin)
pub async fn cards_overview(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    if !user.is_admin() {
        return HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": "Admin access required"
        }));
    }

    match admin_service::cards_overview(&db).await {
        Ok(cards) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "cards": cards,
            "total": cards.len()
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

/// GET /charm/cards/{card_id}
pub async fn get_card(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    let card_id = path.into_inner();

    match vcard_service::get_card(&db, &user.sub, &card_id).await {
        Ok(card) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "card": card
        })),
        Err(e) if e == "Card not found" => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

/// PUT /charm/cards/{card_id}
pub async fn update_card(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateVCardRequest>,
) -> impl Responder {
    let card_id = path.into_inner();
    log::info!("🔧 PUT /charm/cards/{} - user {}", card_id, user.sub);

    match vcard_service::update_card(&db, &user.sub, &card_id, request.into_inner()).await {
        Ok(card) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "card": card
        })),
        Err(e) if e == "Card not found" => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) if e.contains("cannot be empty") => {
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

/// DELETE /charm/cards/{card_id}
pub async fn delete_card(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    let card_id = path.into_inner();
    log::info!("🗑️ DELETE /charm/cards/{} - user {}", card_id, user.sub);

    match vcard_service::delete_card(&db, &user.sub, &card_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Card deleted"
        })),
        Err(e) if e == "Card not found" => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

/// POST /charm/cards/{card_id}/photo - Upload multipart da foto do cartão
pub async fn upload_card_photo(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    mut payload: Multipart,
) -> impl Responder {
    let card_id = path.into_inner();
    log::info!("🖼️ POST /charm/cards/{}/photo - user {}", card_id, user.sub);

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

        let has_file = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some();
        if !has_file {
            continue;
        }

        let photo_path = match upload::save_photo(&mut field, &dir).await {
            Ok(path) => path,
            Err(AppError::InvalidRequest(msg)) => {
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "success": false,
                    "error": msg
                }))
            }
            Err(e) => {
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "success": false,
                    "error": e.to_string()
                }))
            }
        };

        return match vcard_service::set_card_photo(&db, &user.sub, &card_id, &photo_path).await {
            Ok(()) => HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "photo": photo_path
            })),
            Err(e) => {
                upload::remove_photo(&dir, &photo_path).await;
                if e == "Card not found" {
                    HttpResponse::NotFound().json(serde_json::json!({
                        "success": false,
                        "error": e
                    }))
                } else {
                    HttpResponse::InternalServerError().json(serde_json::json!({
                        "success": false,
                        "error": e
                    }))
                }
            }
        };
    }

    HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "error": "No file field in upload"
    }))
}

/// GET /charm/cards/{card_id}/scans - Histórico de scans de um cartão próprio
pub async fn card_scans(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    let card_id = path.into_inner();

    match scan_service::list_scans_for_card(&db, &user.sub, &card_id).await {
        Ok(scans) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "scans": scans,
            "total": scans.len()
        })),
        Err(e) if e == "Card not found" => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

#[utoipa::path(
    get,
    path = "/charm/cards/{card_id}/public",
    tag = "Cards",
    params(("card_id" = String, Path, description = "Card id from the QR link")),
    responses(
        (status = 200, description = "Public card payload", body = VCardResponse),
        (status = 404, description = "Card not found")
    )
)]
/// GET /charm/cards/{card_id}/public - Payload público da landing do QR
pub async fn public_card(db: web::Data<MongoDB>, path: web::Path<String>) -> impl Responder {
    let card_id = path.into_inner();

    match vcard_service::find_card(&db, &card_id).await {
        Ok(Some(card)) => {
            let base = env::var("PUBLIC_BASE_URL").unwrap_or_default();
            let photo_url = card.photo.as_ref().map(|photo| {
                format!("{}/{}", base.trim_end_matches('/'), photo)
            });

            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "card": VCardResponse::from(card),
                "photo_url": photo_url
            }))
        }
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Card not found"
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}
