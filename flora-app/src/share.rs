//! Shareable record links and QR download names.

use flora_core::RecordId;

const SHARE_PARAM: &str = "flower";

/// `{base}?flower={id}`, with the id percent-encoded.
pub fn share_url(base: &str, id: &RecordId) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{SHARE_PARAM}={}", urlencoding::encode(id.as_str()))
}

/// The record id in a share link's query string, if present and non-empty.
pub fn parse_share_url(url: &str) -> Option<RecordId> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SHARE_PARAM)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .map(RecordId::new)
}

/// File name for a record's downloaded QR code.
pub fn qr_filename(name: &str) -> String {
    let slug = name.split_whitespace().collect::<Vec<_>>().join("-");
    format!("{slug}-QR.png")
}
