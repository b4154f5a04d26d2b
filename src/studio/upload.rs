use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::info;

use crate::error::StudioError;
use crate::types::ImageInput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// A selected photo together with the payload sent to the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file: SelectedFile,
    pub payload: ImageInput,
}

fn sniff_mime_type(bytes: &[u8], declared: Option<&str>) -> Option<String> {
    if let Ok(format) = image::guess_format(bytes) {
        return Some(format.to_mime_type().to_string());
    }
    declared
        .filter(|m| m.starts_with("image/"))
        .map(str::to_string)
}

/// Encodes a freshly selected file into the base64 payload sent to the API
pub fn encode_upload(
    file_name: &str,
    bytes: Vec<u8>,
    declared_mime: Option<&str>,
) -> Result<Upload, StudioError> {
    if bytes.is_empty() {
        return Err(StudioError::FileRead(format!("{file_name} is empty")));
    }

    let mime_type = sniff_mime_type(&bytes, declared_mime).ok_or_else(|| {
        StudioError::FileRead(format!("{file_name} is not a supported image"))
    })?;

    info!(
        "Encoding upload {file_name}: {} bytes, type: {mime_type}",
        bytes.len()
    );

    let payload = ImageInput {
        data: BASE64.encode(&bytes),
        mime_type: mime_type.clone(),
    };

    Ok(Upload {
        file: SelectedFile {
            file_name: file_name.to_string(),
            mime_type,
            bytes,
        },
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
        0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn test_payload_has_no_prefix_and_round_trips() {
        let upload = encode_upload("pixel.png", PNG_1X1.to_vec(), None).unwrap();

        assert!(!upload.payload.data.starts_with("data:"));
        assert_eq!(BASE64.decode(&upload.payload.data).unwrap(), PNG_1X1);
        assert_eq!(upload.payload.mime_type, "image/png");
        assert_eq!(upload.file.bytes, PNG_1X1);
    }

    #[test]
    fn test_sniffed_type_wins_over_declared() {
        let upload = encode_upload("pixel.jpg", PNG_1X1.to_vec(), Some("image/jpeg")).unwrap();
        assert_eq!(upload.file.mime_type, "image/png");
    }

    #[test]
    fn test_declared_image_type_is_trusted_when_unknown() {
        let upload = encode_upload("photo.heic", b"opaque".to_vec(), Some("image/heic")).unwrap();
        assert_eq!(upload.payload.mime_type, "image/heic");
    }

    #[test]
    fn test_rejects_empty_and_non_images() {
        assert!(matches!(
            encode_upload("empty.png", Vec::new(), Some("image/png")),
            Err(StudioError::FileRead(_))
        ));
        assert!(matches!(
            encode_upload("notes.txt", b"hello".to_vec(), Some("text/plain")),
            Err(StudioError::FileRead(_))
        ));
    }
}
