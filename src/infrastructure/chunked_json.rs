// Length-prefixed JSON frame streaming
use crate::infrastructure::http_response::brotli;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Stream each message as a frame: 4-byte big-endian length, then the
/// JSON payload (Brotli-compressed per frame when `compress` is set).
pub fn chunked_json_stream<S, T>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + Sync + 'static,
{
    let byte_stream = stream.then(move |msg| async move { encode_frame(&msg, compress).await });

    // frames are compressed individually, so no Content-Encoding on the response
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn encode_frame<T: Serialize>(msg: &T, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(msg)?;
    let payload = if compress { brotli(json).await? } else { json };

    let mut frame = BytesMut::with_capacity(4 + payload.len());
    frame.put_u32(payload.len() as u32);
    frame.put_slice(&payload);
    Ok(frame.freeze())
}

/// Stream the current value of `rx` and every later update
pub fn stream_from_watch<T>(rx: watch::Receiver<T>, compress: bool) -> impl IntoResponse
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    match chunked_json_stream(WatchStream::new(rx), compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
