use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    services::scan_service,
    services::scan_service::{ScanTelemetry, TrackRequest},
};
use actix_web::{web, HttpRequest, HttpResponse, Responder};

#[utoipa::path(
    post,
    path = "/charm/track/{card_id}",
    tag = "Scans",
    request_body = TrackRequest,
    params(("card_id" = String, Path, description = "Scanned card id")),
    responses(
        (status = 200, description = "Scan recorded; contact file returned", body = String, content_type = "text/vcard"),
        (status = 404, description = "Card not found, nothing recorded")
    )
)]
/// POST /charm/track/{card_id} - Endpoint público chamado pela página do QR.
/// Grava o scan + notificações numa transação e devolve o .vcf do cartão.
pub async fn track_scan(
    req: HttpRequest,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    body: web::Json<TrackRequest>,
) -> impl Responder {
    let card_id = path.into_inner();
    log::info!("📡 POST /charm/track/{}", card_id);

    let telemetry = ScanTelemetry {
        // Atrás do proxy vem do X-Forwarded-For; senão, socket
        ip: req
            .connection_info()
            .realip_remote_addr()
            .map(|ip| ip.to_string()),
        user_agent: req
            .headers()
            .get("User-Agent")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string()),
        platform: req
            .headers()
            .get("x-platform")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string()),
    };

    match scan_service::track_scan(&db, &card_id, body.into_inner(), telemetry).await {
        Ok(outcome) => {
            // filename ascii + filename* UTF-8 para nomes acentuados
            let utf8_name = format!("{}.vcf", urlencoding::encode(&outcome.card_name));
            HttpResponse::Ok()
                .content_type("text/vcard; charset=utf-8")
                .insert_header((
                    "Content-Disposition",
                    format!(
                        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                        outcome.file_name, utf8_name
                    ),
                ))
                .body(outcome.contact_file)
        }
        Err(e) if e == "Card not found" => {
            log::warn!("❌ Scan on unknown card {}", card_id);
            HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
        Err(e) => {
            log::error!("❌ Scan tracking failed for card {}: {}", card_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// GET /charm/scans - Todos os scans dos cartões do usuário autenticado
pub async fn my_scans(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    match scan_service::list_scans_for_user(&db, &user.sub).await {
        Ok(scans) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "scans": scans,
            "total": scans.len()
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}
