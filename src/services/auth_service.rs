use crate::{
    database::MongoDB,
    models::{Agility, Bills, User, UserInfo},
    services::{email_service, notification_service},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user_id
    pub username: String,
    pub email: String,
    pub agility: Agility,
    pub bills: Bills,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID
    pub aud: String,           // audience
    pub iss: String,           // issuer
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.agility.is_admin()
    }
}

// ==================== REQUEST/RESPONSE MODELS ====================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

// ==================== JWT ====================

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "charm-service".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "charm-app".to_string())
}

// Generate JWT token
pub fn generate_jwt(user: &User) -> Result<String, String> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let jti = uuid::Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user.user_id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        agility: user.agility,
        bills: user.bills,
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| format!("Failed to generate token: {}", e))
}

// Verify JWT token
pub fn verify_token(token: &str) -> Result<Claims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);

    let mut issuers = HashSet::new();
    issuers.insert(get_jwt_issuer());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

// ==================== OTP ====================

/// OTP de 6 dígitos para reset de senha
fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

const OTP_TTL_MINUTES: i64 = 10;

// ==================== SERVICE FUNCTIONS ====================

// User registration
pub async fn register(db: &MongoDB, request: &RegisterRequest) -> Result<AuthResponse, String> {
    let collection = db.collection::<User>("users");

    if request.username.trim().is_empty() {
        return Err("Username is required".to_string());
    }
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err("A valid email is required".to_string());
    }
    if request.password.len() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }

    // Check if user already exists
    let existing = collection
        .find_one(doc! { "email": &request.email })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    if existing.is_some() {
        return Err("Email already registered".to_string());
    }

    let hashed_password = hash(&request.password, DEFAULT_COST)
        .map_err(|e| format!("Failed to hash password: {}", e))?;

    let new_user_id = ObjectId::new().to_hex();

    let new_user = User {
        id: None,
        user_id: new_user_id.clone(),
        username: request.username.trim().to_string(),
        email: request.email.trim().to_string(),
        password: hashed_password,
        agility: Agility::Yuza,
        bills: Bills::NotPaid,
        photo: None,
        otp_code: None,
        otp_expires_at: None,
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
    };

    collection
        .insert_one(&new_user)
        .await
        .map_err(|e| format!("Failed to create user: {}", e))?;

    // Fan-out: um aviso por admin + boas-vindas pro usuário
    notification_service::notify_admins(
        db,
        "New user registered",
        &format!("{} ({}) just registered", new_user.username, new_user.email),
        Some(&new_user_id),
        Some("user"),
    )
    .await?;

    notification_service::notify_user(
        db,
        &new_user_id,
        "Welcome to Charm",
        "Your account was created successfully. Create your first card to get started!",
        None,
        None,
    )
    .await?;

    let token = generate_jwt(&new_user)?;

    log::info!("✅ User registered successfully: {}", new_user.email);

    Ok(AuthResponse {
        success: true,
        token,
        user: UserInfo::from(new_user),
    })
}

// User login
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, String> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "email": &request.email })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "Invalid credentials".to_string())?;

    let valid = verify(&request.password, &user.password)
        .map_err(|e| format!("Password verification error: {}", e))?;

    if !valid {
        return Err("Invalid credentials".to_string());
    }

    let token = generate_jwt(&user)?;

    Ok(AuthResponse {
        success: true,
        token,
        user: UserInfo::from(user),
    })
}

/// Gera o OTP, grava no usuário e envia por email
pub async fn forgot_password(db: &MongoDB, email: &str) -> Result<(), String> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "email": email })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    let otp = generate_otp();
    let expires_at = (Utc::now() + Duration::minutes(OTP_TTL_MINUTES)).timestamp();

    collection
        .update_one(
            doc! { "user_id": &user.user_id },
            doc! { "$set": {
                "otp_code": &otp,
                "otp_expires_at": expires_at,
                "updated_at": BsonDateTime::now(),
            }},
        )
        .await
        .map_err(|e| format!("Failed to store OTP: {}", e))?;

    email_service::send_otp_email(email, &user.username, &otp).await?;

    log::info!("📧 OTP sent to {}", email);

    Ok(())
}

/// Confere OTP contra o que está gravado (e se ainda não expirou)
pub async fn verify_otp(db: &MongoDB, email: &str, otp: &str) -> Result<User, String> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "email": email })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    let stored = user
        .otp_code
        .as_deref()
        .ok_or_else(|| "Invalid or expired OTP".to_string())?;

    let expires_at = user.otp_expires_at.unwrap_or(0);

    if stored != otp || Utc::now().timestamp() > expires_at {
        return Err("Invalid or expired OTP".to_string());
    }

    Ok(user)
}

/// Reset de senha com OTP válido; limpa os campos de OTP no final
pub async fn reset_password(db: &MongoDB, request: &ResetPasswordRequest) -> Result<(), String> {
    if request.new_password.len() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }

    let user = verify_otp(db, &request.email, &request.otp).await?;

    let hashed = hash(&request.new_password, DEFAULT_COST)
        .map_err(|e| format!("Failed to hash password: {}", e))?;

    let collection = db.collection::<User>("users");

    collection
        .update_one(
            doc! { "user_id": &user.user_id },
            doc! {
                "$set": { "password": hashed, "updated_at": BsonDateTime::now() },
                "$unset": { "otp_code": "", "otp_expires_at": "" },
            },
        )
        .await
        .map_err(|e| format!("Failed to update password: {}", e))?;

    log::info!("🔑 Password reset for {}", request.email);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: None,
            user_id: "64b000000000000000000001".to_string(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password: "$2b$12$hash".to_string(),
            agility: Agility::Yuza,
            bills: Bills::NotPaid,
            photo: None,
            otp_code: None,
            otp_expires_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let user = sample_user();
        let token = generate_jwt(&user).unwrap();
        let claims = verify_token(&token).unwrap();

        assert_eq!(claims.sub, user.user_id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.agility, Agility::Yuza);
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_jwt_rejects_tampered_token() {
        let user = sample_user();
        let token = generate_jwt(&user).unwrap();

        // Corrompe o payload mantendo o formato a.b.c
        let mut parts: Vec<String> = token.split('.').map(|s| s.to_string()).collect();
        parts[1] = format!("x{}", parts[1]);
        let tampered = parts.join(".");

        assert!(verify_token(&tampered).is_err());
        assert!(verify_token("garbage").is_err());
    }

    #[test]
    fn test_otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_password_hash_verify() {
        let hashed = hash("Secret1!", 4).unwrap();  // custo baixo só no teste
        assert_ne!(hashed, "Secret1!");
        assert!(verify("Secret1!", &hashed).unwrap());
        assert!(!verify("wrong", &hashed).unwrap());
    }
}
