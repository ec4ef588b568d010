//! Credential rewrite for forwarded query strings.

/// Query parameter carrying the credential, both for callers and nodes.
pub const TOKEN_PARAM: &str = "token";

/// Rewrite a raw query string for a node that may carry its own token.
///
/// With `node_token` set, every `token` parameter value is replaced by the
/// node's token, or one is appended if the caller sent none.  All other
/// parameters keep their original bytes and order.  Without a node token
/// the query is returned unchanged.
pub fn rewrite_query(query: Option<&str>, node_token: Option<&str>) -> Option<String> {
    let Some(node_token) = node_token else {
        return query.map(str::to_owned);
    };
    let encoded: String = url::form_urlencoded::byte_serialize(node_token.as_bytes()).collect();
    let replacement = format!("{TOKEN_PARAM}={encoded}");

    let mut replaced = false;
    let mut pairs: Vec<&str> = Vec::new();
    for pair in query.unwrap_or("").split('&').filter(|p| !p.is_empty()) {
        let key = pair.split_once('=').map_or(pair, |(k, _)| k);
        if key == TOKEN_PARAM {
            pairs.push(&replacement);
            replaced = true;
        } else {
            pairs.push(pair);
        }
    }
    if !replaced {
        pairs.push(&replacement);
    }
    Some(pairs.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_token_replaces_caller_token() {
        assert_eq!(
            rewrite_query(Some("token=caller123&x=1"), Some("abc")).as_deref(),
            Some("token=abc&x=1")
        );
    }

    #[test]
    fn no_node_token_leaves_query_untouched() {
        assert_eq!(
            rewrite_query(Some("token=caller123&x=1"), None).as_deref(),
            Some("token=caller123&x=1")
        );
        assert_eq!(rewrite_query(None, None), None);
    }

    #[test]
    fn missing_caller_token_gets_node_token_appended() {
        assert_eq!(rewrite_query(Some("x=1"), Some("abc")).as_deref(), Some("x=1&token=abc"));
        assert_eq!(rewrite_query(None, Some("abc")).as_deref(), Some("token=abc"));
    }

    #[test]
    fn other_params_keep_their_encoding() {
        assert_eq!(
            rewrite_query(Some("name=a%20b&token=t&tokens=keep"), Some("n/1 +")).as_deref(),
            Some("name=a%20b&token=n%2F1+%2B&tokens=keep")
        );
    }
}
