use crate::{database::MongoDB, services::auth_service};
use crate::services::auth_service::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    VerifyOtpRequest,
};
use actix_web::{web, HttpResponse};

#[utoipa::path(
    post,
    path = "/charm/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    db: web::Data<MongoDB>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse {
    log::info!("📝 POST /charm/register - email: {}", request.email);

    match auth_service::register(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Registration successful: {}", request.email);
            HttpResponse::Created().json(response)
        }
        Err(e) if e == "Email already registered" => {
            log::warn!("⚠️ Registration conflict: {}", request.email);
            HttpResponse::Conflict().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
        Err(e) if e.contains("required") || e.contains("at least") => {
            log::warn!("❌ Registration rejected: {} - {}", request.email, e);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
        Err(e) => {
            log::error!("❌ Registration failed: {} - {}", request.email, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

#[utoipa::path(
    post,
    path = "/charm/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(db: web::Data<MongoDB>, request: web::Json<LoginRequest>) -> HttpResponse {
    log::info!("🔐 POST /charm/login - email: {}", request.email);

    match auth_service::login(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) if e == "Invalid credentials" => {
            log::warn!("❌ Login failed: {}", request.email);
            HttpResponse::Unauthorized().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
        Err(e) => {
            log::error!("❌ Login error: {} - {}", request.email, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

#[utoipa::path(
    post,
    path = "/charm/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "OTP sent"),
        (status = 404, description = "User not found")
    )
)]
pub async fn forgot_password(
    db: web::Data<MongoDB>,
    request: web::Json<ForgotPasswordRequest>,
) -> HttpResponse {
    log::info!("📧 POST /charm/forgot-password - email: {}", request.email);

    match auth_service::forgot_password(&db, &request.email).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "OTP sent to your email"
        })),
        Err(e) if e == "User not found" => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) => {
            log::error!("❌ Forgot password failed: {} - {}", request.email, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

pub async fn verify_otp(
    db: web::Data<MongoDB>,
    request: web::Json<VerifyOtpRequest>,
) -> HttpResponse {
    log::info!("🔢 POST /charm/verify-otp - email: {}", request.email);

    match auth_service::verify_otp(&db, &request.email, &request.otp).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "OTP verified"
        })),
        Err(e) if e == "User not found" => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) if e == "Invalid or expired OTP" => {
            HttpResponse::Unauthorized().json(serde_json::json!({
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

pub async fn reset_password(
    db: web::Data<MongoDB>,
    request: web::Json<ResetPasswordRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /charm/reset-password - email: {}", request.email);

    match auth_service::reset_password(&db, &request).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Password updated"
        })),
        Err(e) if e == "User not found" => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": e
        })),
        Err(e) if e == "Invalid or expired OTP" => {
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
