use crate::database::MongoDB;
use crate::models::{Agility, Bills, User};
use bcrypt::{hash, DEFAULT_COST};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use std::env;

/// Seed da conta supa padrão.
/// Só cria se não existir nenhum supa no banco; credenciais vêm do .env
/// (DEFAULT_ADMIN_EMAIL + DEFAULT_ADMIN_PASSWORD).
pub async fn seed_default_admin(db: &MongoDB) {
    let collection = db.collection::<User>("users");

    let count = collection
        .count_documents(doc! { "agility": "supa" })
        .await
        .unwrap_or(0);

    if count > 0 {
        log::info!("👤 Default admin: {} supa account(s) already in DB — skipping seed", count);
        return;
    }

    let email = match env::var("DEFAULT_ADMIN_EMAIL") {
        Ok(email) => email,
        Err(_) => {
            log::warn!("⚠️ No supa account and DEFAULT_ADMIN_EMAIL not set — skipping admin seed");
            return;
        }
    };

    let password = match env::var("DEFAULT_ADMIN_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            log::warn!("⚠️ DEFAULT_ADMIN_PASSWORD not set — skipping admin seed");
            return;
        }
    };

    let hashed = match hash(&password, DEFAULT_COST) {
        Ok(hashed) => hashed,
        Err(e) => {
            log::error!("   ❌ Failed to hash default admin password: {}", e);
            return;
        }
    };

    let admin = User {
        id: None,
        user_id: ObjectId::new().to_hex(),
        username: env::var("DEFAULT_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
        email,
        password: hashed,
        agility: Agility::Supa,
        bills: Bills::Paid,
        photo: None,
        otp_code: None,
        otp_expires_at: None,
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
    };

    match collection.insert_one(&admin).await {
        Ok(_) => {
            log::info!("   ✅ Default supa account seeded: {}", admin.email);
        }
        Err(e) => {
            log::error!("   ❌ Failed to seed default admin: {}", e);
        }
    }
}
