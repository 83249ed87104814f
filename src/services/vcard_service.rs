// ==================== VCARD MANAGEMENT ====================
// CRUD de cartões + geração do arquivo de contato (vCard 3.0) devolvido no
// scan. O formato do arquivo é fixo: FN, TITLE, TEL*, EMAIL*, URL* (socials
// em ordem de chave, depois otherLinks), END. Byte-estável entre chamadas.

use crate::{
    database::MongoDB,
    models::{Bills, CreateVCardRequest, UpdateVCardRequest, User, VCard, VCardResponse},
    services::notification_service,
};
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime as BsonDateTime};

const COLLECTION: &str = "vcards";

// ==================== SERVICE FUNCTIONS ====================

pub async fn create_card(
    db: &MongoDB,
    user_id: &str,
    request: CreateVCardRequest,
) -> Result<VCardResponse, String> {
    if request.name.trim().is_empty() {
        return Err("Card name is required".to_string());
    }

    // Billing gate: criação de cartão exige cobrança em dia. Checado no
    // banco, não no token: o status pode ter mudado depois do login.
    let users = db.collection::<User>("users");
    let user = users
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    if user.bills != Bills::Paid {
        return Err("Card creation requires a paid billing status".to_string());
    }

    let card_id = ObjectId::new().to_hex();

    let card = VCard {
        id: None,
        card_id: card_id.clone(),
        user_id: user_id.to_string(),
        name: request.name.trim().to_string(),
        title: request.title,
        phones: request.phones,
        emails: request.emails,
        socials: request.socials,
        other_links: request.other_links,
        photo: None,
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
    };

    db.collection::<VCard>(COLLECTION)
        .insert_one(&card)
        .await
        .map_err(|e| format!("Failed to create card: {}", e))?;

    notification_service::notify_admins(
        db,
        "New card created",
        &format!("{} created card '{}'", user.username, card.name),
        Some(&card_id),
        Some("vcard"),
    )
    .await?;

    notification_service::notify_user(
        db,
        user_id,
        "Card created",
        &format!("Your card '{}' is live and ready to share", card.name),
        Some(&card_id),
        Some("vcard"),
    )
    .await?;

    log::info!("✅ Card {} created for user {}", card_id, user_id);

    Ok(VCardResponse::from(card))
}

pub async fn list_cards(db: &MongoDB, user_id: &str) -> Result<Vec<VCardResponse>, String> {
    let collection = db.collection::<VCard>(COLLECTION);

    let mut cursor = collection
        .find(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let mut cards = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(card) => cards.push(VCardResponse::from(card)),
            Err(e) => log::warn!("⚠️ Skipping unreadable card row: {}", e),
        }
    }

    // Mais recentes primeiro
    cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(cards)
}

pub async fn get_card(db: &MongoDB, user_id: &str, card_id: &str) -> Result<VCardResponse, String> {
    let card = db
        .collection::<VCard>(COLLECTION)
        .find_one(doc! { "card_id": card_id, "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "Card not found".to_string())?;

    Ok(VCardResponse::from(card))
}

/// Lookup sem dono, usado pela view pública e pelo track de scan
pub async fn find_card(db: &MongoDB, card_id: &str) -> Result<Option<VCard>, String> {
    db.collection::<VCard>(COLLECTION)
        .find_one(doc! { "card_id": card_id })
        .await
        .map_err(|e| format!("Database error: {}", e))
}

pub async fn update_card(
    db: &MongoDB,
    user_id: &str,
    card_id: &str,
    request: UpdateVCardRequest,
) -> Result<VCardResponse, String> {
    let collection = db.collection::<VCard>(COLLECTION);

    let existing = collection
        .find_one(doc! { "card_id": card_id, "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "Card not found".to_string())?;

    let mut set_doc = doc! { "updated_at": BsonDateTime::now() };

    if let Some(name) = request.name {
        if name.trim().is_empty() {
            return Err("Card name cannot be empty".to_string());
        }
        set_doc.insert("name", name.trim());
    }
    if let Some(title) = request.title {
        set_doc.insert("title", title);
    }
    if let Some(phones) = request.phones {
        set_doc.insert("phones", phones);
    }
    if let Some(emails) = request.emails {
        set_doc.insert("emails", emails);
    }
    if let Some(socials) = request.socials {
        let bson = to_bson(&socials).map_err(|e| format!("Invalid socials: {}", e))?;
        set_doc.insert("socials", bson);
    }
    if let Some(other_links) = request.other_links {
        set_doc.insert("other_links", other_links);
    }

    collection
        .update_one(
            doc! { "card_id": card_id, "user_id": user_id },
            doc! { "$set": set_doc },
        )
        .await
        .map_err(|e| format!("Failed to update card: {}", e))?;

    let updated = collection
        .find_one(doc! { "card_id": card_id, "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "Card not found".to_string())?;

    notification_service::notify_admins(
        db,
        "Card updated",
        &format!("Card '{}' was updated by its owner", existing.name),
        Some(card_id),
        Some("vcard"),
    )
    .await?;

    notification_service::notify_user(
        db,
        user_id,
        "Card updated",
        &format!("Your card '{}' was updated", updated.name),
        Some(card_id),
        Some("vcard"),
    )
    .await?;

    Ok(VCardResponse::from(updated))
}

/// Deleta o cartão do usuário. Scan logs do cartão são mantidos; histórico
/// sobrevive ao cartão.
pub async fn delete_card(db: &MongoDB, user_id: &str, card_id: &str) -> Result<(), String> {
    let collection = db.collection::<VCard>(COLLECTION);

    let existing = collection
        .find_one(doc! { "card_id": card_id, "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "Card not found".to_string())?;

    collection
        .delete_one(doc! { "card_id": card_id, "user_id": user_id })
        .await
        .map_err(|e| format!("Failed to delete card: {}", e))?;

    notification_service::notify_admins(
        db,
        "Card deleted",
        &format!("Card '{}' was deleted by its owner", existing.name),
        Some(card_id),
        Some("vcard"),
    )
    .await?;

    notification_service::notify_user(
        db,
        user_id,
        "Card deleted",
        &format!("Your card '{}' was deleted", existing.name),
        Some(card_id),
        Some("vcard"),
    )
    .await?;

    log::info!("🗑️ Card {} deleted (scan logs preserved)", card_id);

    Ok(())
}

pub async fn set_card_photo(
    db: &MongoDB,
    user_id: &str,
    card_id: &str,
    photo_path: &str,
) -> Result<(), String> {
    let result = db
        .collection::<VCard>(COLLECTION)
        .update_one(
            doc! { "card_id": card_id, "user_id": user_id },
            doc! { "$set": { "photo": photo_path, "updated_at": BsonDateTime::now() } },
        )
        .await
        .map_err(|e| format!("Failed to set card photo: {}", e))?;

    if result.matched_count == 0 {
        return Err("Card not found".to_string());
    }

    Ok(())
}

// ==================== CONTACT FILE ====================

/// Gera o bloco de contato (vCard 3.0) a partir do cartão. A ordem dos
/// campos e o CRLF são contrato de interface: o client gera o mesmo bloco
/// localmente para download/share e os dois precisam bater byte a byte.
pub fn build_contact_file(card: &VCard) -> String {
    let mut out = String::new();
    out.push_str("BEGIN:VCARD\r\n");
    out.push_str("VERSION:3.0\r\n");
    out.push_str(&format!("FN:{}\r\n", card.name));

    if let Some(title) = &card.title {
        if !title.is_empty() {
            out.push_str(&format!("TITLE:{}\r\n", title));
        }
    }

    for phone in &card.phones {
        out.push_str(&format!("TEL;TYPE=CELL:{}\r\n", phone));
    }

    for email in &card.emails {
        out.push_str(&format!("EMAIL;TYPE=INTERNET:{}\r\n", email));
    }

    // BTreeMap garante ordem estável das redes sociais
    for url in card.socials.values() {
        out.push_str(&format!("URL:{}\r\n", url));
    }

    for link in &card.other_links {
        out.push_str(&format!("URL:{}\r\n", link));
    }

    out.push_str("END:VCARD\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_card() -> VCard {
        let mut socials = BTreeMap::new();
        socials.insert("linkedin".to_string(), "https://linkedin.com/in/alice".to_string());
        socials.insert("github".to_string(), "https://github.com/alice".to_string());

        VCard {
            id: None,
            card_id: "64b000000000000000000010".to_string(),
            user_id: "64b000000000000000000001".to_string(),
            name: "Alice Costa".to_string(),
            title: Some("Engineer".to_string()),
            phones: vec!["+351911111111".to_string(), "+351922222222".to_string()],
            emails: vec!["a@x.com".to_string()],
            socials,
            other_links: vec!["https://alice.dev".to_string()],
            photo: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_contact_file_exact_format() {
        let vcf = build_contact_file(&sample_card());

        // github < linkedin na ordem do BTreeMap
        let expected = "BEGIN:VCARD\r\n\
                        VERSION:3.0\r\n\
                        FN:Alice Costa\r\n\
                        TITLE:Engineer\r\n\
                        TEL;TYPE=CELL:+351911111111\r\n\
                        TEL;TYPE=CELL:+351922222222\r\n\
                        EMAIL;TYPE=INTERNET:a@x.com\r\n\
                        URL:https://github.com/alice\r\n\
                        URL:https://linkedin.com/in/alice\r\n\
                        URL:https://alice.dev\r\n\
                        END:VCARD\r\n";

        assert_eq!(vcf, expected);
    }

    #[test]
    fn test_contact_file_is_deterministic() {
        let card = sample_card();
        assert_eq!(build_contact_file(&card), build_contact_file(&card));
    }

    #[test]
    fn test_contact_file_skips_empty_optionals() {
        let mut card = sample_card();
        card.title = None;
        card.phones.clear();
        card.socials.clear();
        card.other_links.clear();

        let vcf = build_contact_file(&card);

        assert!(!vcf.contains("TITLE:"));
        assert!(!vcf.contains("TEL;"));
        assert!(!vcf.contains("URL:"));
        assert!(vcf.starts_with("BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Alice Costa\r\n"));
        assert!(vcf.ends_with("END:VCARD\r\n"));
    }

    #[test]
    fn test_contact_file_phones_and_emails_verbatim() {
        let card = sample_card();
        let vcf = build_contact_file(&card);

        for phone in &card.phones {
            assert!(vcf.contains(&format!("TEL;TYPE=CELL:{}\r\n", phone)));
        }
        for email in &card.emails {
            assert!(vcf.contains(&format!("EMAIL;TYPE=INTERNET:{}\r\n", email)));
        }
    }
}
