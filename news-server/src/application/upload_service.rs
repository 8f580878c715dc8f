use chrono::Utc;
use tracing::info;

use crate::domain::error::DomainError;
use crate::infrastructure::object_store::ObjectStore;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const FALLBACK_EXTENSION: &str = "bin";

pub(crate) struct UploadService<S: ObjectStore> {
    store: S,
}

impl<S: ObjectStore> UploadService<S> {
    pub(crate) fn new(store: S) -> Self {
        Self { store }
    }

    /// Stores the image under a fresh random key and returns its public URL.
    /// The reported content type is passed through unchecked.
    pub(crate) async fn upload_image(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<String, DomainError> {
        let key = build_object_key(
            original_name,
            rand::random::<u64>(),
            Utc::now().timestamp_millis(),
        );
        let content_type = content_type.unwrap_or(FALLBACK_CONTENT_TYPE);

        info!(%key, content_type, size = data.len(), "uploading image");
        self.store
            .put(&key, data, content_type)
            .await
            .map_err(|err| DomainError::Storage(err.to_string()))?;

        Ok(self.store.public_url(&key))
    }
}

/// `{random}-{epoch-ms}.{ext}` with `random` in base 36.
pub(crate) fn build_object_key(original_name: &str, random: u64, epoch_ms: i64) -> String {
    format!(
        "{}-{epoch_ms}.{}",
        to_base36(random),
        extension_of(original_name)
    )
}

fn extension_of(original_name: &str) -> String {
    let extension = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();

    if extension.is_empty() {
        FALLBACK_EXTENSION.to_string()
    } else {
        extension
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
