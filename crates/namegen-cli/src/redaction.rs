/// Mask the password and secret query parameters of a connection string.
pub fn redact_connection_string(conn: &str) -> String {
    let mut redacted = conn.to_string();

    if let Some(scheme_end) = conn.find("://") {
        let after_scheme = &conn[scheme_end + 3..];
        let authority_end = after_scheme.find(['/', '?']).unwrap_or(after_scheme.len());
        if let Some(at_idx) = after_scheme[..authority_end].rfind('@') {
            let auth_part = &after_scheme[..at_idx];
            if let Some(colon_idx) = auth_part.find(':') {
                let password_start = scheme_end + 3 + colon_idx + 1;
                let password_end = scheme_end + 3 + at_idx;
                redacted.replace_range(password_start..password_end, "***");
            }
        }
    }

    redact_query_params(&redacted)
}

fn redact_query_params(conn: &str) -> String {
    let Some(query_start) = conn.find('?') else {
        return conn.to_string();
    };

    let (base, query) = conn.split_at(query_start + 1);
    let params: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if is_sensitive_key(key) => format!("{key}=***"),
            _ => pair.to_string(),
        })
        .collect();

    format!("{base}{}", params.join("&"))
}

fn is_sensitive_key(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "password" | "pass" | "sslpassword" | "token"
    )
}
