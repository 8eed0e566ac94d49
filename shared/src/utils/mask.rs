//! Helpers for keeping credentials out of log output

/// Number of leading characters of a token kept visible in logs
const VISIBLE_TOKEN_CHARS: usize = 8;

/// Mask a token value for logging, keeping only a short prefix.
///
/// Tokens are hex strings, but the prefix is taken on a char boundary so any
/// presented value is safe to pass in.
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return String::from("<empty>");
    }
    let prefix: String = token.chars().take(VISIBLE_TOKEN_CHARS).collect();
    if prefix.len() == token.len() {
        return String::from("****");
    }
    format!("{}****", prefix)
}

/// Mask the credentials part of a connection URL
pub fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(proto_end) = url.find("://") {
            if proto_end < at_pos {
                let proto = &url[..proto_end + 3];
                let host_part = &url[at_pos..];
                return format!("{}****{}", proto, host_part);
            }
        }
    }
    url.to_string()
}
