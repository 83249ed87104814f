// Reverse geocoding lat/long -> cidade/país via API externa (formato
// Nominatim). O client normalmente já manda city/country no body do scan;
// este serviço cobre o caso de vir só coordenadas. Falha nunca derruba um
// scan; o chamador trata Err como "sem localização".

use crate::utils::cache;
use serde::Deserialize;
use std::env;

const DEFAULT_GEOCODE_API: &str = "https://nominatim.openstreetmap.org/reverse";

#[derive(Debug, Default, Deserialize)]
struct GeocodeAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    address: Option<GeocodeAddress>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Chave de cache com 3 casas decimais (~100m): scans do mesmo lugar não
/// repetem a chamada externa
fn cache_key(latitude: f64, longitude: f64) -> String {
    format!("geo:{:.3},{:.3}", latitude, longitude)
}

fn encode_cached(location: &ResolvedLocation) -> String {
    format!(
        "{}|{}",
        location.city.as_deref().unwrap_or(""),
        location.country.as_deref().unwrap_or("")
    )
}

fn decode_cached(value: &str) -> ResolvedLocation {
    let (city, country) = value.split_once('|').unwrap_or((value, ""));
    ResolvedLocation {
        city: if city.is_empty() { None } else { Some(city.to_string()) },
        country: if country.is_empty() { None } else { Some(country.to_string()) },
    }
}

pub async fn reverse_geocode(latitude: f64, longitude: f64) -> Result<ResolvedLocation, String> {
    let key = cache_key(latitude, longitude);
    if let Some(hit) = cache::get_cached(&key) {
        return Ok(decode_cached(&hit));
    }

    let base = env::var("GEOCODE_API_URL").unwrap_or_else(|_| DEFAULT_GEOCODE_API.to_string());
    let url = format!(
        "{}?lat={}&lon={}&format=json",
        base.trim_end_matches('/'),
        latitude,
        longitude
    );

    let client = reqwest::Client::new();
    let response = client
        .get(&url)
        .header("User-Agent", "charm-service/0.1")
        .send()
        .await
        .map_err(|e| format!("Geocode request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Geocode API returned {}", response.status()));
    }

    let parsed: GeocodeResponse = response
        .json()
        .await
        .map_err(|e| format!("Geocode parse failed: {}", e))?;

    let address = parsed.address.unwrap_or_default();
    let resolved = ResolvedLocation {
        city: address.city.or(address.town).or(address.village),
        country: address.country,
    };

    cache::set_cache(key, encode_cached(&resolved));

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_rounds_coordinates() {
        assert_eq!(cache_key(38.72225, -9.139337), "geo:38.722,-9.139");
        // Mesma vizinhança -> mesma chave
        assert_eq!(cache_key(38.7222, -9.1390), cache_key(38.72225, -9.13901));
    }

    #[test]
    fn test_cached_value_roundtrip() {
        let loc = ResolvedLocation {
            city: Some("Lisboa".to_string()),
            country: Some("Portugal".to_string()),
        };
        assert_eq!(decode_cached(&encode_cached(&loc)), loc);

        let only_country = ResolvedLocation {
            city: None,
            country: Some("Portugal".to_string()),
        };
        assert_eq!(decode_cached(&encode_cached(&only_country)), only_country);
    }

    #[test]
    fn test_parse_response_without_address() {
        let parsed: GeocodeResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.address.is_none());

        let parsed: GeocodeResponse = serde_json::from_str(
            r#"{"address": {"town": "Sintra", "country": "Portugal"}}"#,
        )
        .unwrap();
        let address = parsed.address.unwrap();
        assert_eq!(address.town.as_deref(), Some("Sintra"));
        assert!(address.city.is_none());
    }
}
