// Upload de fotos (avatar e foto de cartão) para o diretório local /uploads.
// Paths relativos ("uploads/<uuid>.<ext>") são gravados no banco; o client
// prefixa com a base URL pública.

use actix_multipart::Field;
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::utils::error::AppError;

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;  // 5MB

pub fn uploads_dir() -> String {
    std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string())
}

/// Valida a extensão do arquivo enviado e devolve ela normalizada (lowercase)
pub fn validate_extension(filename: &str) -> Result<String, AppError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| AppError::InvalidRequest("File has no extension".to_string()))?;

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::InvalidRequest(format!(
            "Extension '{}' not allowed (jpg, jpeg, png, webp)",
            ext
        )));
    }

    Ok(ext)
}

/// Grava um field multipart em disco sob um nome uuid e devolve o path relativo
pub async fn save_photo(field: &mut Field, dir: &str) -> Result<String, AppError> {
    let original = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .map(|f| f.to_string())
        .ok_or_else(|| AppError::InvalidRequest("Missing filename".to_string()))?;

    let ext = validate_extension(&original)?;
    let stored_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
    let full_path = Path::new(dir).join(&stored_name);

    let mut file = tokio::fs::File::create(&full_path)
        .await
        .map_err(|e| AppError::UploadError(format!("Failed to create file: {}", e)))?;

    let mut written: usize = 0;
    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(|e| AppError::UploadError(format!("Read error: {}", e)))?;
        written += data.len();
        if written > MAX_UPLOAD_BYTES {
            // Remove o parcial antes de falhar
            let _ = tokio::fs::remove_file(&full_path).await;
            return Err(AppError::InvalidRequest("File too large (max 5MB)".to_string()));
        }
        file.write_all(&data)
            .await
            .map_err(|e| AppError::UploadError(format!("Write error: {}", e)))?;
    }

    if written == 0 {
        let _ = tokio::fs::remove_file(&full_path).await;
        return Err(AppError::InvalidRequest("Empty upload".to_string()));
    }

    Ok(format!("uploads/{}", stored_name))
}

/// Remove uma foto já gravada (best-effort: deleção de conta não falha por
/// causa de um arquivo que já sumiu)
pub async fn remove_photo(dir: &str, relative_path: &str) {
    // Só o componente final importa; nunca seguimos ".." vindo do banco
    let file_name = match Path::new(relative_path).file_name() {
        Some(name) => name.to_owned(),
        None => return,
    };

    let full_path = Path::new(dir).join(file_name);
    if let Err(e) = tokio::fs::remove_file(&full_path).await {
        log::warn!("⚠️ Could not remove photo {:?}: {}", full_path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_extension_ok() {
        assert_eq!(validate_extension("foto.PNG").unwrap(), "png");
        assert_eq!(validate_extension("a.b.jpeg").unwrap(), "jpeg");
    }

    #[test]
    fn test_validate_extension_rejected() {
        assert!(validate_extension("script.exe").is_err());
        assert!(validate_extension("semextensao").is_err());
        assert!(validate_extension("payload.svg").is_err());
    }
}
