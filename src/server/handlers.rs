use crate::{
    error::ToonifyError,
    log_sink::StreamSink,
    models::{GenerationRequest, UploadResponse},
    server::AppState,
};
use actix_multipart::Multipart;
use actix_web::{
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    web, HttpResponse,
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateQuery {
    #[serde(default)]
    pub stream: Option<String>,
}

impl GenerateQuery {
    fn wants_stream(&self) -> bool {
        matches!(
            self.stream.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("1" | "true" | "yes")
        )
    }
}

/// `POST /api/generate`
///
/// Answers `{ outputUrl, logs }`, or with `?stream=true` a chunked text body of
/// progress lines ending in a `RESULT:` or `ERROR:` line. An unreadable body is
/// reported the same way as any other failure in the chosen mode.
pub async fn generate(
    state: web::Data<AppState>,
    query: web::Query<GenerateQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, ToonifyError> {
    let parsed = parse_request(&body);

    if !query.wants_stream() {
        let request = parsed?;
        let response = state.pipeline.generate_buffered(&request).await.map_err(|e| {
            log::error!("Generation failed: {}", e);
            e
        })?;
        return Ok(HttpResponse::Ok().json(response));
    }

    let (sink, lines) = StreamSink::channel();
    match parsed {
        Ok(request) => {
            let pipeline = state.pipeline.clone();
            actix_web::rt::spawn(async move {
                match pipeline.generate(&request, &sink).await {
                    Ok(url) => sink.finish_ok(&url),
                    Err(e) => {
                        log::error!("Generation failed: {}", e);
                        sink.finish_err(&e.to_string());
                    }
                }
            });
        }
        Err(e) => {
            log::warn!("Rejected generation request: {}", e);
            sink.finish_err(&e.to_string());
        }
    }

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(lines.map(|line| Ok::<_, ToonifyError>(web::Bytes::from(line)))))
}

fn parse_request(body: &[u8]) -> Result<GenerationRequest, ToonifyError> {
    serde_json::from_slice(body)
        .map_err(|e| ToonifyError::ValidationError(format!("Invalid request body: {}", e)))
}

/// `POST /api/upload` with multipart field `file`.
pub async fn upload(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ToonifyError> {
    store_multipart(&state, payload, "file", "uploads").await
}

/// `POST /api/style` with multipart field `style` (admin style reference).
pub async fn upload_style(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ToonifyError> {
    store_multipart(&state, payload, "style", "styles").await
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

struct UploadedFile {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn store_multipart(
    state: &AppState,
    payload: Multipart,
    field_name: &str,
    prefix: &str,
) -> Result<HttpResponse, ToonifyError> {
    let file = read_file_field(payload, field_name)
        .await?
        .ok_or_else(|| ToonifyError::ValidationError(format!("Missing {} file", field_name)))?;

    log::info!(
        "Storing {} ({} bytes, {})",
        file.filename,
        file.bytes.len(),
        file.content_type
    );
    let stored = state
        .pipeline
        .storage()
        .put_upload(prefix, &file.filename, file.bytes, &file.content_type)
        .await?;

    Ok(HttpResponse::Ok().json(UploadResponse { url: stored.url }))
}

async fn read_file_field(
    mut payload: Multipart,
    field_name: &str,
) -> Result<Option<UploadedFile>, ToonifyError> {
    let mut found = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            ToonifyError::ValidationError(format!("Invalid multipart data: {}", e))
        })?;

        if field.name() != Some(field_name) {
            while field.next().await.is_some() {}
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("upload")
            .to_string();
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                ToonifyError::ValidationError(format!("Error reading file: {}", e))
            })?;
            bytes.extend_from_slice(&chunk);
        }

        if !bytes.is_empty() {
            found = Some(UploadedFile {
                filename,
                content_type,
                bytes,
            });
        }
    }

    Ok(found)
}
