use std::collections::HashMap;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::Request;

/// Collect the full request body into memory.
pub async fn collect_body(req: Request<hyper::body::Incoming>) -> Result<Bytes> {
    Ok(req
        .collect()
        .await
        .context("Failed to read request body")?
        .to_bytes())
}

/// Parse a body as `application/x-www-form-urlencoded` key/value pairs.
pub fn form_params(body: &Bytes) -> HashMap<String, String> {
    form_urlencoded::parse(body.as_ref())
        .into_owned()
        .collect()
}

/// True when the bytes look like a JSON document. Auth endpoints accept
/// both JSON and form bodies; this picks the parser.
pub fn looks_like_json(body: &Bytes) -> bool {
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|b| *b == b'{' || *b == b'[')
        .unwrap_or(false)
}
