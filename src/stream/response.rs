//! Streaming response construction
//!
//! Bodies are `ReaderStream`s over the open file, so at most one buffer of
//! `chunk_size` bytes is held per response and hyper only polls for more
//! when the socket can take it. Dropping the body (client disconnect) drops
//! the file and stops the read loop.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::config::StreamConfig;
use crate::error::{Result, ShelfError};

use super::parse_range;
use super::StreamTarget;

/// How the bytes were requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Full,
    Partial,
    Download,
}

fn header_value(value: String) -> Result<HeaderValue> {
    HeaderValue::try_from(value).map_err(|e| ShelfError::Http(e.to_string()))
}

async fn open(target: &StreamTarget) -> Result<(File, u64)> {
    let file = File::open(&target.path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ShelfError::NotFound(target.key.relative_path.clone())
        } else {
            ShelfError::StreamIo(e)
        }
    })?;
    let size = file.metadata().await.map_err(ShelfError::StreamIo)?.len();
    Ok((file, size))
}

/// Wrap a reader as a response body. Once headers are out, a read error
/// can only be logged; returning it from the stream makes hyper abort the
/// connection.
fn body_from<R>(reader: R, chunk_size: usize, path: PathBuf) -> Body
where
    R: AsyncRead + Send + 'static,
{
    let stream = ReaderStream::with_capacity(reader, chunk_size).inspect_err(move |e| {
        tracing::warn!(path = ?path, error = %e, "read failed mid-transfer, aborting response");
    });
    Body::from_stream(stream)
}

/// Stream a file for inline playback, honouring an optional `Range` header.
pub async fn stream(
    target: &StreamTarget,
    range: Option<&str>,
    config: &StreamConfig,
) -> Result<(Delivery, Response)> {
    let (mut file, file_size) = open(target).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(target.content_type));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(
        header::CACHE_CONTROL,
        header_value(format!("public, max-age={}", config.cache_max_age_secs))?,
    );

    let Some(range) = range else {
        tracing::debug!(path = ?target.path, size = file_size, "streaming full file");
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file_size));
        let body = body_from(
            file.take(file_size),
            config.chunk_size_bytes(),
            target.path.clone(),
        );
        return Ok((Delivery::Full, (StatusCode::OK, headers, body).into_response()));
    };

    let window = parse_range(range, file_size)?;
    tracing::debug!(path = ?target.path, start = window.start, end = window.end, "streaming range");

    file.seek(SeekFrom::Start(window.start))
        .await
        .map_err(ShelfError::StreamIo)?;

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(window.len()));
    headers.insert(
        header::CONTENT_RANGE,
        header_value(window.content_range(file_size))?,
    );
    let body = body_from(
        file.take(window.len()),
        config.chunk_size_bytes(),
        target.path.clone(),
    );

    Ok((
        Delivery::Partial,
        (StatusCode::PARTIAL_CONTENT, headers, body).into_response(),
    ))
}

/// Value for `Content-Disposition` that makes browsers save the file.
/// Uses the RFC 5987 form so non-ASCII names survive.
pub fn attachment_disposition(filename: &str) -> String {
    format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}

/// Send the whole file as an attachment.
pub async fn download(target: &StreamTarget, config: &StreamConfig) -> Result<(Delivery, Response)> {
    let (file, file_size) = open(target).await?;
    tracing::debug!(path = ?target.path, size = file_size, "download");

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(target.content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file_size));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        header_value(attachment_disposition(&target.filename))?,
    );

    let body = body_from(
        file.take(file_size),
        config.chunk_size_bytes(),
        target.path.clone(),
    );
    Ok((Delivery::Download, (StatusCode::OK, headers, body).into_response()))
}
