//! URL encoding/decoding utilities

/// Decodes a URL-encoded string
///
/// Returns the original string if decoding fails.
pub fn url_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Splits a raw `a=b&c=d` query into pairs, percent-decoding each value.
///
/// Unlike form decoding, `+` is kept literally because base64 payloads
/// carried in query strings use it.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), url_decode(value)),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Splits `host:port`, accepting a bracketed IPv6 host.
pub fn split_host_port(authority: &str) -> Option<(String, u16)> {
    let (host, port) = if let Some(rest) = authority.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        (host, tail.strip_prefix(':')?)
    } else {
        authority.rsplit_once(':')?
    };
    let port = port.parse::<u16>().ok().filter(|p| *p != 0)?;
    if host.is_empty() {
        return None;
    }
    Some((host.to_string(), port))
}

/// Host of a parsed URL without the IPv6 brackets.
pub fn bare_host(url: &url::Url) -> String {
    url.host_str()
        .unwrap_or_default()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_decode() {
        assert_eq!(url_decode("Hello%20World%21"), "Hello World!");
        assert_eq!(url_decode("%E9%A6%99%E6%B8%AF"), "香港");
        assert_eq!(url_decode("%FF%FE"), "%FF%FE");
    }

    #[test]
    fn test_parse_query_keeps_plus() {
        let pairs = parse_query("a=b+c&flag&d=%2F");
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "b+c".to_string()),
                ("flag".to_string(), String::new()),
                ("d".to_string(), "/".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("1.2.3.4:80"), Some(("1.2.3.4".to_string(), 80)));
        assert_eq!(split_host_port("[::1]:443"), Some(("::1".to_string(), 443)));
        assert_eq!(split_host_port("host:0"), None);
        assert_eq!(split_host_port("host"), None);
        assert_eq!(split_host_port(":80"), None);
    }
}
