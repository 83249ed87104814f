use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::Agility,
    services::admin_service,
    services::admin_service::{CreateStaffRequest, UpdateBillsRequest, UserWithStats},
};
use actix_web::{web, HttpResponse, Responder};

fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(serde_json::json!({
        "success": false,
        "error": "Admin access required"
    }))
}

#[utoipa::path(
    get,
    path = "/charm/staff",
    tag = "Admin",
    responses(
        (status = 200, description = "Staff members with card and scan counts", body = [UserWithStats]),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
/// GET /charm/staff - Staff com contagem de cartões e scans
pub async fn list_staff(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    if !user.is_admin() {
        return forbidden();
    }

    match admin_service::list_with_stats(&db, Agility::Staff).await {
        Ok(staff) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "staff": staff,
            "total": staff.len()
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

/// POST /charm/staff - Cria conta de staff e envia as credenciais por email
pub async fn create_staff(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateStaffRequest>,
) -> impl Responder {
    if !user.is_admin() {
        return forbidden();
    }

    log::info!("📝 POST /charm/staff - {} by {}", request.email, user.sub);

    match admin_service::create_staff(&db, &request).await {
        Ok(response) => HttpResponse::Created().json(response),
        Err(e) if e == "Email already registered" => {
            HttpResponse::Conflict().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
        Err(e) if e.contains("required") => HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) => {
            log::error!("❌ Staff creation failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// DELETE /charm/staff/{user_id}
pub async fn delete_staff(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    if !user.is_admin() {
        return forbidden();
    }

    let target_id = path.into_inner();
    log::info!("🗑️ DELETE /charm/staff/{} by {}", target_id, user.sub);

    match admin_service::remove_account(&db, &target_id, Agility::Staff).await {
        Ok(removed) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": removed
        })),
        Err(e) if e.ends_with("not found") => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

/// GET /charm/users - Usuários comuns com contagem de cartões e scans
pub async fn list_users(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    if !user.is_admin() {
        return forbidden();
    }

    match admin_service::list_with_stats(&db, Agility::Yuza).await {
        Ok(users) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "users": users,
            "total": users.len()
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": e
        })),
    }
}

/// DELETE /charm/users/{user_id} - Remove usuário (cascade de cartões)
pub async fn delete_user(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    if !user.is_admin() {
        return forbidden();
    }

    let target_id = path.into_inner();
    log::info!("🗑️ DELETE /charm/users/{} by {}", target_id, user.sub);

    match admin_service::remove_account(&db, &target_id, Agility::Yuza).await {
        Ok(removed) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": removed
        })),
        Err(e) if e.ends_with("not found") => HttpResponse::NotFound().json(serde_json::json!({
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
    put,
    path = "/charm/bills/{user_id}",
    tag = "Admin",
    request_body = UpdateBillsRequest,
    params(("user_id" = String, Path, description = "Target user id")),
    responses(
        (status = 200, description = "Billing status updated"),
        (status = 404, description = "User not found"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
/// PUT /charm/bills/{user_id} - Atualiza status de cobrança. Último write
/// vence; cada chamada gera seu próprio conjunto de notificações.
pub async fn update_bills(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateBillsRequest>,
) -> impl Responder {
    if !user.is_admin() {
        return forbidden();
    }

    let target_id = path.into_inner();
    log::info!(
        "💳 PUT /charm/bills/{} -> '{}' by {}",
        target_id,
        request.bills,
        user.sub
    );

    match admin_service::update_bills(&db, &target_id, request.bills).await {
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
