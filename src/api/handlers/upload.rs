use axum::{
    body::Bytes,
    extract::{
        multipart::{Field, MultipartError},
        Multipart, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use futures_util::stream;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::api::errors::ApiError;
use crate::application::dto::{UploadQuery, UploadResponse};
use crate::application::ports::BlobReader;
use crate::application::use_cases::{UploadBlobsUseCase, UploadError};

/// Multipart field carrying a file.
const FILE_FIELD: &str = "file";

/// Chunks in flight between the multipart parser and the store.
const CHUNK_QUEUE: usize = 4;

/// POST /blob/upload/?use-filename=true
/// Store every `file` part; answers 201 with one entry per stored file.
///
/// Each part is streamed into the store as it arrives, so memory use is
/// bounded by the chunk queue rather than the part size.
pub async fn upload_handler(
    State(use_case): State<Arc<UploadBlobsUseCase>>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut received = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| UploadError::InvalidRequest("file part without a filename".to_string()))?;

        // The field borrows the multipart body, so it is pumped into a
        // channel that the store reads as an owned stream.
        let (tx, rx) = mpsc::channel(CHUNK_QUEUE);
        let chunks = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        });
        let reader: BlobReader = Box::pin(StreamReader::new(chunks));

        let (forwarded, stored) = tokio::join!(
            forward_chunks(field, tx),
            use_case.execute(&filename, query.use_filename, reader)
        );
        forwarded?;
        let (_, item) = stored?;
        received.push(item);
    }

    if received.is_empty() {
        return Err(UploadError::InvalidRequest("no file parts in request".to_string()).into());
    }

    Ok((StatusCode::CREATED, Json(UploadResponse { received })))
}

/// Feed a part's chunks to the store; a parse failure is passed on as a read
/// error so the store discards the partial object.
async fn forward_chunks(
    mut field: Field<'_>,
    tx: mpsc::Sender<io::Result<Bytes>>,
) -> Result<(), MultipartError> {
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if tx.send(Ok(chunk)).await.is_err() {
                    // Store stopped reading; its error is reported instead.
                    return Ok(());
                }
            }
            Ok(None) => return Ok(()),
            Err(e) => {
                let _ = tx.send(Err(io::Error::other(e.body_text()))).await;
                return Err(e);
            }
        }
    }
}
