//! Object key rules for uploads.
//!
//! Keys have the shape `<folder>/<user_id>/<uuid>-<file_name>`. Every user
//! owns exactly the keys whose second segment is their id.

use uuid::Uuid;

use super::UploadError;

/// Folder used when the client does not name one.
pub const DEFAULT_FOLDER: &str = "uploads";

/// Content types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

const MAX_SEGMENT_LEN: usize = 200;

/// Normalizes a declared content type and checks it against the allow-list.
pub fn validate_content_type(content_type: &str) -> Result<String, UploadError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
        Ok(essence)
    } else {
        Err(UploadError::UnsupportedContentType(content_type.to_string()))
    }
}

/// Replaces everything outside `[A-Za-z0-9._-]` with `_`.
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_SEGMENT_LEN)
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

/// Keeps the last path component of a client file name, sanitized.
pub fn sanitize_file_name(file_name: &str) -> Result<String, UploadError> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let sanitized = sanitize_segment(base.trim());
    if sanitized.is_empty() {
        return Err(UploadError::InvalidFileName(file_name.to_string()));
    }
    Ok(sanitized)
}

/// Sanitized folder name, falling back to [`DEFAULT_FOLDER`].
pub fn folder_or_default(folder: Option<&str>) -> String {
    folder
        .map(|f| sanitize_segment(f.trim().trim_matches('/')))
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| DEFAULT_FOLDER.to_string())
}

/// Builds a fresh object key for `user_id`.
pub fn object_key(folder: &str, user_id: Uuid, file_name: &str) -> String {
    format!("{folder}/{user_id}/{}-{file_name}", Uuid::new_v4())
}

/// Prefix of all keys `user_id` owns inside `folder`.
pub fn user_prefix(folder: &str, user_id: Uuid) -> String {
    format!("{folder}/{user_id}/")
}

/// Checks that `key` lies inside one of `user_id`'s folders.
pub fn authorize_key(key: &str, user_id: Uuid) -> Result<(), UploadError> {
    let segments: Vec<&str> = key.split('/').collect();
    let owner = user_id.to_string();

    let well_formed = segments.len() >= 3
        && segments
            .iter()
            .all(|s| !s.is_empty() && *s != "." && *s != "..");

    if well_formed && segments[1] == owner {
        Ok(())
    } else {
        Err(UploadError::Forbidden(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Uuid {
        Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap()
    }

    #[test]
    fn test_allowed_content_types() {
        assert_eq!(validate_content_type("image/png").unwrap(), "image/png");
        assert_eq!(validate_content_type("IMAGE/JPEG").unwrap(), "image/jpeg");
        assert_eq!(
            validate_content_type("application/pdf; charset=binary").unwrap(),
            "application/pdf"
        );
    }

    #[test]
    fn test_rejected_content_types() {
        for content_type in ["text/html", "image/svg+xml", "", "application/x-msdownload"] {
            assert!(matches!(
                validate_content_type(content_type),
                Err(UploadError::UnsupportedContentType(_))
            ));
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("photo.png").unwrap(), "photo.png");
        assert_eq!(sanitize_file_name("my photo (1).png").unwrap(), "my_photo__1_.png");
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name("C:\\tmp\\x.pdf").unwrap(), "x.pdf");
        assert_eq!(sanitize_file_name(".hidden").unwrap(), "hidden");
        assert!(sanitize_file_name("dir/").is_err());
        assert!(sanitize_file_name("..").is_err());
    }

    #[test]
    fn test_folder_or_default() {
        assert_eq!(folder_or_default(None), "uploads");
        assert_eq!(folder_or_default(Some("")), "uploads");
        assert_eq!(folder_or_default(Some("avatars")), "avatars");
        assert_eq!(folder_or_default(Some("/a/b/")), "a_b");
    }

    #[test]
    fn test_object_key_shape() {
        let key = object_key("uploads", user(), "photo.png");
        assert!(key.starts_with(&user_prefix("uploads", user())));
        assert!(key.ends_with("-photo.png"));
        assert!(authorize_key(&key, user()).is_ok());
    }

    #[test]
    fn test_authorize_key_rejects_foreign_and_malformed_keys() {
        let other = Uuid::new_v4();
        let key = object_key("uploads", other, "photo.png");
        assert!(matches!(
            authorize_key(&key, user()),
            Err(UploadError::Forbidden(_))
        ));

        let owner = user();
        for key in [
            "photo.png".to_string(),
            format!("uploads/{owner}"),
            format!("uploads/{owner}/../{other}/x.png"),
            format!("uploads//{owner}/x.png"),
        ] {
            assert!(authorize_key(&key, owner).is_err(), "{key}");
        }
    }
}
