//! Multipart decoding of a spooled new-job upload.

use super::spool::SpoolFile;
use crate::error::{GatewayError, GatewayResult};
use tracing::debug;

/// Form field carrying the caller's processing options as a JSON string.
pub const OPTIONS_FIELD: &str = "options";

/// Form field requesting that the node fetch images from a URL.
pub const ZIP_URL_FIELD: &str = "zipurl";

/// What the gateway needs to know about an upload before choosing a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadManifest {
    /// Number of file parts in the form.
    pub image_count: u64,
    /// Raw value of the last `options` field, if any.
    pub options: Option<String>,
    /// Whether a `zipurl` field was present.
    pub url_requested: bool,
}

impl UploadManifest {
    /// Submitted options payload, empty when the field was absent.
    pub fn options_str(&self) -> &str {
        self.options.as_deref().unwrap_or("")
    }
}

/// Decode the spooled body as `multipart/form-data`.
///
/// File contents are drained without being kept; the spool itself is
/// forwarded to the node later.  A `zipurl` field does not stop decoding,
/// but the upload is rejected once the form has been read to the end.
pub async fn decode(spool: &SpoolFile, content_type: Option<&str>) -> GatewayResult<UploadManifest> {
    let content_type = content_type
        .ok_or_else(|| GatewayError::MalformedUpload("missing content-type".to_string()))?;
    let boundary = multer::parse_boundary(content_type).map_err(malformed)?;
    let mut multipart = multer::Multipart::new(spool.reader().await?, boundary);

    let mut manifest = UploadManifest::default();
    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        if field.file_name().is_some() {
            while field.chunk().await.map_err(malformed)?.is_some() {}
            manifest.image_count += 1;
            continue;
        }
        match field.name() {
            Some(OPTIONS_FIELD) => {
                manifest.options = Some(field.text().await.map_err(malformed)?);
            }
            Some(ZIP_URL_FIELD) => {
                manifest.url_requested = true;
                while field.chunk().await.map_err(malformed)?.is_some() {}
            }
            _ => {
                while field.chunk().await.map_err(malformed)?.is_some() {}
            }
        }
    }

    debug!(
        images = manifest.image_count,
        has_options = manifest.options.is_some(),
        url_requested = manifest.url_requested,
        "upload decoded"
    );

    if manifest.url_requested {
        return Err(GatewayError::UnsupportedUploadMode);
    }
    Ok(manifest)
}

fn malformed(err: multer::Error) -> GatewayError {
    GatewayError::MalformedUpload(err.to_string())
}
