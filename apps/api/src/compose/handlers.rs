//! Axum route handler for the document API.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::io::Write;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, info_span};
use uuid::Uuid;

use crate::compose::{compose_document, SanitizedDocument};
use crate::compose::models::AnalysisRequest;
use crate::compose::stream::ChannelWriter;
use crate::errors::AppError;
use crate::render::{FontCapability, PdfBackend};
use crate::state::AppState;

/// Body chunks buffered between the render thread and the client.
const BODY_CHANNEL_CAPACITY: usize = 8;
const MAX_SLUG_LEN: usize = 60;

/// POST /api/v1/documents/analysis
///
/// Validates synchronously (400 before anything is streamed), then renders on the
/// blocking pool and streams the PDF as it is written. A failure after the
/// headers are sent aborts the body. Body rejections use the JSON error envelope.
pub async fn handle_render_analysis(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload?;
    let request = body.into_render_request()?;
    let request_id = Uuid::new_v4();
    let span = info_span!("render_document", %request_id);

    let capability = FontCapability::probe(state.config.emoji_font_path.as_deref());
    // Emoji-only text is rejected here when no emoji font is configured. A font
    // that later fails to register is caught by the composer.
    SanitizedDocument::from_request(&request, capability.preserve_emoji).validate()?;
    let filename = format!("{}-analysis.pdf", slugify(&request.metadata.title));
    let settings = state.settings.clone();

    let (writer, rx) = ChannelWriter::channel(BODY_CHANNEL_CAPACITY);
    let abort_tx = writer.sender();

    let render = tokio::task::spawn_blocking(move || {
        let _guard = span.enter();
        let mut writer = writer;
        let mut backend = PdfBackend::new(settings.page, &settings.document_title);

        let result = compose_document(&request, capability, &settings, &mut backend).and_then(|summary| {
            backend.finish(&mut writer)?;
            writer.flush().map_err(|e| AppError::Rendering(e.into()))?;
            Ok(summary)
        });

        match result {
            Ok(summary) => info!(
                pages = summary.pages,
                commands = summary.commands,
                emoji = summary.emoji_preserved,
                "Document generated"
            ),
            Err(e) => {
                error!(error = %e, "Document generation failed");
                writer.abort(e.to_string());
            }
        }
    });

    // A panicking render thread drops its writer; make sure the body ends in an error, not EOF.
    tokio::spawn(async move {
        if let Err(e) = render.await {
            let err = AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}"));
            error!(%request_id, error = %err, "Render task failed");
            let _ = abort_tx
                .send(Err(std::io::Error::other("document generation aborted")))
                .await;
        }
    });

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, Body::from_stream(ReceiverStream::new(rx))).into_response())
}

/// Lowercase ASCII slug for the download filename. Falls back to `problem`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "problem".to_string()
    } else {
        slug.to_string()
    }
}
