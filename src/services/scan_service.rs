// ==================== SCAN TRACKING ====================
// O fluxo central do sistema: um scan do QR público insere o registro de
// auditoria, notifica todos os admins atuais e o dono do cartão, e devolve
// o arquivo de contato do cartão. Os três writes rodam numa transação:
// ou tudo entra, ou nada entra.

use crate::{
    database::MongoDB,
    models::{ScanLog, ScanLogResponse, User, VCard},
    services::{geocode_service, notification_service, vcard_service},
};
use futures::stream::StreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::ClientSession;
use serde::Deserialize;
use std::collections::HashMap;

const COLLECTION: &str = "scan_logs";

// ==================== REQUEST/RESPONSE MODELS ====================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Body do POST /charm/track/{card_id}: telemetria enviada pela página
/// pública do cartão
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct TrackRequest {
    pub location: Option<GeoPoint>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Telemetria resolvida a partir da request HTTP (headers + socket)
#[derive(Debug)]
pub struct ScanTelemetry {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub platform: Option<String>,
}

/// Resultado do track: o arquivo de contato pronto para download
#[derive(Debug)]
pub struct TrackOutcome {
    pub card_name: String,
    pub file_name: String,
    pub contact_file: String,
}

// ==================== TRACK ====================

pub async fn track_scan(
    db: &MongoDB,
    card_id: &str,
    request: TrackRequest,
    telemetry: ScanTelemetry,
) -> Result<TrackOutcome, String> {
    // 1. Cartão precisa existir; senão 404 e nenhum log é gravado
    let card = vcard_service::find_card(db, card_id)
        .await?
        .ok_or_else(|| "Card not found".to_string())?;

    // 2. Dono do cartão (cartões nunca ficam órfãos: cascade na deleção)
    let owner = db
        .collection::<User>("users")
        .find_one(doc! { "user_id": &card.user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "Card owner not found".to_string())?;

    // 3. Localização: body do client, com fallback de reverse geocoding
    // quando só vieram coordenadas. Geocoding é best-effort e nunca derruba
    // o scan.
    let (latitude, longitude) = match &request.location {
        Some(point) => (Some(point.latitude), Some(point.longitude)),
        None => (None, None),
    };

    let (city, country) = match (&request.city, &request.country, &request.location) {
        (None, None, Some(point)) => {
            match geocode_service::reverse_geocode(point.latitude, point.longitude).await {
                Ok(resolved) => (resolved.city, resolved.country),
                Err(e) => {
                    log::warn!("⚠️ Reverse geocode failed for card {}: {}", card_id, e);
                    (None, None)
                }
            }
        }
        _ => (request.city.clone(), request.country.clone()),
    };

    let scan_log = ScanLog {
        id: None,
        card_id: card_id.to_string(),
        user_id: card.user_id.clone(),
        ip: telemetry.ip,
        latitude,
        longitude,
        city: city.clone(),
        country: country.clone(),
        user_agent: telemetry.user_agent,
        platform: telemetry.platform,
        scanned_at: BsonDateTime::now(),
    };

    // 4. Log + fan-out numa transação única
    let mut session = db
        .client()
        .start_session()
        .await
        .map_err(|e| format!("Failed to start session: {}", e))?;

    session
        .start_transaction()
        .await
        .map_err(|e| format!("Failed to start transaction: {}", e))?;

    let label = location_label(&city, &country);
    let write_result =
        write_scan_sequence(db, &mut session, &scan_log, &card, &owner, &label).await;

    match write_result {
        Ok(admin_count) => {
            session
                .commit_transaction()
                .await
                .map_err(|e| format!("Failed to commit scan: {}", e))?;
            log::info!(
                "📡 Scan recorded for card {} ({} admin notifications)",
                card_id,
                admin_count
            );
        }
        Err(e) => {
            let _ = session.abort_transaction().await;
            return Err(e);
        }
    }

    // 5. Arquivo de contato a partir dos campos gravados do cartão
    let contact_file = vcard_service::build_contact_file(&card);

    Ok(TrackOutcome {
        card_name: card.name.clone(),
        file_name: format!("{}.vcf", file_slug(&card.name)),
        contact_file,
    })
}

async fn write_scan_sequence(
    db: &MongoDB,
    session: &mut ClientSession,
    scan_log: &ScanLog,
    card: &VCard,
    owner: &User,
    location: &str,
) -> Result<u64, String> {
    db.collection::<ScanLog>(COLLECTION)
        .insert_one(scan_log)
        .session(&mut *session)
        .await
        .map_err(|e| format!("Failed to insert scan log: {}", e))?;

    let admin_count = notification_service::notify_admins_in_session(
        db,
        session,
        "Card scanned",
        &format!(
            "Card '{}' ({}) was scanned from {}",
            card.name, owner.username, location
        ),
        Some(&card.card_id),
        Some("scan"),
    )
    .await?;

    notification_service::notify_user_in_session(
        db,
        session,
        &owner.user_id,
        "Your card was scanned",
        &format!("Your card '{}' was scanned from {}", card.name, location),
        Some(&card.card_id),
        Some("scan"),
    )
    .await?;

    Ok(admin_count)
}

fn location_label(city: &Option<String>, country: &Option<String>) -> String {
    match (city, country) {
        (Some(city), Some(country)) => format!("{}, {}", city, country),
        (Some(city), None) => city.clone(),
        (None, Some(country)) => country.clone(),
        (None, None) => "an unknown location".to_string(),
    }
}

/// Nome de arquivo seguro derivado do nome do cartão
fn file_slug(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    let collapsed = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if collapsed.is_empty() {
        "card".to_string()
    } else {
        collapsed
    }
}

// ==================== HISTORY & COUNTS ====================

/// Todos os scans dos cartões do usuário, mais recentes primeiro
pub async fn list_scans_for_user(
    db: &MongoDB,
    user_id: &str,
) -> Result<Vec<ScanLogResponse>, String> {
    let collection = db.collection::<ScanLog>(COLLECTION);

    let mut cursor = collection
        .find(doc! { "user_id": user_id })
        .sort(doc! { "scanned_at": -1 })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let mut logs = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(log) => logs.push(ScanLogResponse::from(log)),
            Err(e) => log::warn!("⚠️ Skipping unreadable scan row: {}", e),
        }
    }

    Ok(logs)
}

/// Scans de um cartão específico; só o dono enxerga
pub async fn list_scans_for_card(
    db: &MongoDB,
    user_id: &str,
    card_id: &str,
) -> Result<Vec<ScanLogResponse>, String> {
    // Ownership primeiro: cartão de outro usuário responde como inexistente
    let owned = db
        .collection::<VCard>("vcards")
        .find_one(doc! { "card_id": card_id, "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    if owned.is_none() {
        return Err("Card not found".to_string());
    }

    let mut cursor = db
        .collection::<ScanLog>(COLLECTION)
        .find(doc! { "card_id": card_id })
        .sort(doc! { "scanned_at": -1 })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let mut logs = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(log) => logs.push(ScanLogResponse::from(log)),
            Err(e) => log::warn!("⚠️ Skipping unreadable scan row: {}", e),
        }
    }

    Ok(logs)
}

/// Contagem de scans agrupada por cartão: uma agregação única no lugar de
/// um count por cartão
pub async fn scan_counts_by_card(db: &MongoDB) -> Result<HashMap<String, i64>, String> {
    group_counts(db, "$card_id").await
}

/// Contagem de scans agrupada por dono de cartão
pub async fn scan_counts_by_user(db: &MongoDB) -> Result<HashMap<String, i64>, String> {
    group_counts(db, "$user_id").await
}

async fn group_counts(db: &MongoDB, group_key: &str) -> Result<HashMap<String, i64>, String> {
    let pipeline = vec![doc! {
        "$group": { "_id": group_key, "count": { "$sum": 1 } }
    }];

    let mut cursor = db
        .collection::<Document>(COLLECTION)
        .aggregate(pipeline)
        .await
        .map_err(|e| format!("Aggregation error: {}", e))?;

    let mut counts = HashMap::new();
    while let Some(result) = cursor.next().await {
        let document = result.map_err(|e| format!("Aggregation cursor error: {}", e))?;
        let key = document.get_str("_id").unwrap_or_default().to_string();
        let count = document
            .get_i64("count")
            .unwrap_or_else(|_| document.get_i32("count").unwrap_or(0) as i64);
        if !key.is_empty() {
            counts.insert(key, count);
        }
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_label() {
        assert_eq!(
            location_label(&Some("Lisboa".into()), &Some("Portugal".into())),
            "Lisboa, Portugal"
        );
        assert_eq!(location_label(&None, &Some("Portugal".into())), "Portugal");
        assert_eq!(location_label(&Some("Lisboa".into()), &None), "Lisboa");
        assert_eq!(location_label(&None, &None), "an unknown location");
    }

    #[test]
    fn test_file_slug() {
        assert_eq!(file_slug("Alice Costa"), "alice-costa");
        assert_eq!(file_slug("  João!! da Silva  "), "jo-o-da-silva");
        assert_eq!(file_slug("???"), "card");
        assert_eq!(file_slug("Already-Slugged"), "already-slugged");
    }
}
