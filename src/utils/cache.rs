// Cache simples em memória (usado para memoizar reverse geocoding)
use std::collections::HashMap;
use std::sync::RwLock;

lazy_static::lazy_static! {
    static ref CACHE: RwLock<HashMap<String, String>> = RwLock::new(HashMap::new());
}

pub fn get_cached(key: &str) -> Option<String> {
    CACHE.read().ok()?.get(key).cloned()
}

pub fn set_cache(key: String, value: String) {
    if let Ok(mut cache) = CACHE.write() {
        cache.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        set_cache("geo:1.00,2.00".to_string(), "Lisboa|Portugal".to_string());
        assert_eq!(
            get_cached("geo:1.00,2.00"),
            Some("Lisboa|Portugal".to_string())
        );
        assert_eq!(get_cached("geo:9.99,9.99"), None);
    }
}
