//! Attachment storage keys and limits

use std::time::Duration;

use rand::Rng;
use uuid::Uuid;

/// Upload size cap (10 MB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Lifetime of pre-signed download links
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(300);

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 8;
const MAX_EXTENSION_LEN: usize = 16;

/// Random lowercase base36 string used to keep keys unique within a millisecond
pub fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Extension of an uploaded file name, if it has a usable one
///
/// Only short ASCII alphanumeric extensions are kept so that client-supplied
/// names can't inject path segments into the key.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    let valid = !stem.is_empty()
        && !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());

    valid.then(|| ext.to_ascii_lowercase())
}

/// Builds `attachments/<task_id>/<unix_millis>-<suffix>[.<ext>]`
pub fn build_attachment_key(task_id: Uuid, file_name: &str, unix_millis: i64, suffix: &str) -> String {
    match file_extension(file_name) {
        Some(ext) => format!("attachments/{}/{}-{}.{}", task_id, unix_millis, suffix, ext),
        None => format!("attachments/{}/{}-{}", task_id, unix_millis, suffix),
    }
}

/// Fresh key for an upload happening now
pub fn attachment_key(task_id: Uuid, file_name: &str) -> String {
    build_attachment_key(
        task_id,
        file_name,
        chrono::Utc::now().timestamp_millis(),
        &random_suffix(),
    )
}
