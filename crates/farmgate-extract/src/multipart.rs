//! `multipart/form-data` decoding.

use bytes::Bytes;
use farmgate_core::{DispatchError, RequestBody, UploadedFile};
use indexmap::IndexMap;
use std::io;

/// Decodes a buffered multipart body into text fields and files.
///
/// Parts with a file name become [`UploadedFile`]s; all other parts are text
/// fields.
pub async fn parse_multipart(content_type: &str, body: Bytes) -> Result<RequestBody, DispatchError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| DispatchError::malformed("missing or invalid multipart boundary"))?;

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = IndexMap::new();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(ToString::to_string);
            let data = field.bytes().await.map_err(malformed)?;
            files.push(UploadedFile {
                field_name: name,
                file_name: Some(file_name),
                content_type,
                data,
            });
        } else {
            let value = field.text().await.map_err(malformed)?;
            fields.insert(name, value);
        }
    }

    Ok(RequestBody::Multipart { fields, files })
}

fn malformed(e: multer::Error) -> DispatchError {
    DispatchError::malformed(format!("multipart parse error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(boundary: &str) -> Bytes {
        let raw = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"title\"\r\n\r\n\
             Quarterly\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"report\"; filename=\"q3.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             a,b\n1,2\r\n\
             --{boundary}--\r\n"
        );
        Bytes::from(raw)
    }

    #[tokio::test]
    async fn test_fields_and_files() {
        let parsed = parse_multipart("multipart/form-data; boundary=XYZ", body("XYZ"))
            .await
            .unwrap();

        let RequestBody::Multipart { fields, files } = parsed else {
            panic!("expected multipart body");
        };
        assert_eq!(fields["title"], "Quarterly");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].field_name, "report");
        assert_eq!(files[0].file_name.as_deref(), Some("q3.csv"));
        assert_eq!(files[0].content_type.as_deref(), Some("text/csv"));
        assert_eq!(files[0].data, Bytes::from_static(b"a,b\n1,2"));
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let err = parse_multipart("multipart/form-data", body("XYZ"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BAD_REQUEST");
    }
}
