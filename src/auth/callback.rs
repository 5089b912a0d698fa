//! Parsing of the provider redirect back to `/oauth2/callback`.

use super::error::AuthError;

/// Extract the authorization code from a callback URL or query string.
///
/// Accepts a full URL, a bare query, or a `?`-prefixed query. An
/// `error` parameter wins over `code` and becomes `AuthError::Provider`
/// with the provider's error code preserved verbatim; a query carrying
/// neither parameter is malformed.
pub fn parse_callback_query(input: &str) -> Result<String, AuthError> {
    let pairs = query_pairs(input);
    if let Some((_, code)) = pairs.iter().find(|(key, _)| key == "error") {
        return Err(AuthError::Provider { code: code.clone() });
    }
    if let Some((_, code)) = pairs.iter().find(|(key, _)| key == "code") {
        if !code.is_empty() {
            return Ok(code.clone());
        }
    }
    Err(AuthError::MalformedCallback(
        "query carries neither code nor error".to_string(),
    ))
}

fn query_pairs(input: &str) -> Vec<(String, String)> {
    let url = if input.contains("://") {
        reqwest::Url::parse(input).ok()
    } else {
        let trimmed = input.trim_start_matches('?');
        reqwest::Url::parse(&format!("http://callback.invalid/?{trimmed}")).ok()
    };
    url.map(|url| {
        url.query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_extracted_from_query() {
        assert_eq!(parse_callback_query("code=4%2Fabc123").unwrap(), "4/abc123");
        assert_eq!(parse_callback_query("?code=plain").unwrap(), "plain");
    }

    #[test]
    fn code_is_extracted_from_full_url() {
        let code = parse_callback_query(
            "https://docs.example.com/oauth2/callback?code=xyz&scope=openid",
        )
        .unwrap();
        assert_eq!(code, "xyz");
    }

    #[test]
    fn provider_error_is_preserved() {
        let err = parse_callback_query("?error=access_denied").unwrap_err();
        match err {
            AuthError::Provider { code } => assert_eq!(code, "access_denied"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_wins_over_code() {
        let err = parse_callback_query("?code=abc&error=server_error").unwrap_err();
        assert!(matches!(err, AuthError::Provider { .. }));
    }

    #[test]
    fn empty_query_is_malformed() {
        let err = parse_callback_query("?state=only").unwrap_err();
        assert!(matches!(err, AuthError::MalformedCallback(_)));
    }
}
