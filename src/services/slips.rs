use base64::{engine::general_purpose, Engine as _};
use std::path::PathBuf;
use tracing::{error, info};
use uuid::Uuid;

/// Хранилище слипов оплаты. Картинка приходит с клиента как data URL,
/// сохраняется на диск, наружу отдаётся относительный URL.
///
/// Сохранение best-effort: бронь важнее картинки, поэтому любая ошибка
/// здесь превращается в `None`, а не в отказ платежа.
#[derive(Debug, Clone)]
pub struct SlipStorage {
    dir: PathBuf,
}

impl SlipStorage {
    pub fn new(dir: &str) -> Self {
        Self { dir: PathBuf::from(dir) }
    }

    pub async fn store_data_url(&self, data_url: &str) -> Option<String> {
        // отрезаем префикс вида "data:image/png;base64,"
        let encoded = match data_url.split_once("base64,") {
            Some((_, rest)) => rest,
            None => data_url,
        };

        let bytes = match general_purpose::STANDARD.decode(encoded.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to decode slip data: {:?}", e);
                return None;
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            error!("Failed to create slip dir {:?}: {:?}", self.dir, e);
            return None;
        }

        let filename = format!("slip-{}.png", Uuid::new_v4());
        let path = self.dir.join(&filename);

        match tokio::fs::write(&path, &bytes).await {
            Ok(()) => {
                info!("💾 Slip saved: {}", filename);
                Some(format!("/slips/{}", filename))
            }
            Err(e) => {
                error!("Failed to write slip {:?}: {:?}", path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    #[tokio::test]
    async fn stores_data_url_and_returns_public_path() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SlipStorage::new(dir.path().to_str().unwrap());

        let encoded = general_purpose::STANDARD.encode(b"fake png bytes");
        let data_url = format!("data:image/png;base64,{}", encoded);

        let url = storage.store_data_url(&data_url).await.expect("slip url");
        assert!(url.starts_with("/slips/slip-"));
        assert!(url.ends_with(".png"));

        let filename = url.trim_start_matches("/slips/");
        let saved = tokio::fs::read(dir.path().join(filename)).await.unwrap();
        assert_eq!(saved, b"fake png bytes");
    }

    #[tokio::test]
    async fn accepts_bare_base64_without_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SlipStorage::new(dir.path().to_str().unwrap());

        let encoded = general_purpose::STANDARD.encode(b"raw");
        assert!(storage.store_data_url(&encoded).await.is_some());
    }

    #[tokio::test]
    async fn broken_base64_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SlipStorage::new(dir.path().to_str().unwrap());

        assert!(storage.store_data_url("data:image/png;base64,@@не базе64@@").await.is_none());
    }
}
