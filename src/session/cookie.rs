//! Lax `Cookie` header parsing, just enough to find one cookie by name.

use http::header::COOKIE;
use http::Request;

/// Extract the value of cookie `name` from `req`.
///
/// Every `Cookie` header is searched; the first pair named `name` wins.
/// Malformed pairs are skipped, surrounding double quotes are stripped, and
/// an empty value counts as absent.
pub fn session_id<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| unquote(value.trim()).to_string())
        .filter(|value| !value.is_empty())
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(cookies: &[&str]) -> Request<()> {
        let mut builder = Request::builder().uri("/chat");
        for cookie in cookies {
            builder = builder.header(COOKIE, *cookie);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_finds_named_cookie() {
        let req = request(&["theme=dark; SESSIONID=abc123; lang=en"]);
        assert_eq!(session_id(&req, "SESSIONID").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_absent_cookie() {
        assert_eq!(session_id(&request(&[]), "SESSIONID"), None);
        assert_eq!(session_id(&request(&["theme=dark"]), "SESSIONID"), None);
    }

    #[test]
    fn test_searches_all_cookie_headers() {
        let req = request(&["theme=dark", "SESSIONID=s2"]);
        assert_eq!(session_id(&req, "SESSIONID").as_deref(), Some("s2"));
    }

    #[test]
    fn test_first_match_wins() {
        let req = request(&["SESSIONID=first; SESSIONID=second"]);
        assert_eq!(session_id(&req, "SESSIONID").as_deref(), Some("first"));
    }

    #[test]
    fn test_lax_parsing() {
        let req = request(&["garbage;;  SESSIONID = \"quoted\" ;x"]);
        assert_eq!(session_id(&req, "SESSIONID").as_deref(), Some("quoted"));
    }

    #[test]
    fn test_empty_value_is_absent() {
        let req = request(&["SESSIONID=; other=1"]);
        assert_eq!(session_id(&req, "SESSIONID"), None);
    }

    #[test]
    fn test_name_is_case_sensitive() {
        let req = request(&["sessionid=lower"]);
        assert_eq!(session_id(&req, "SESSIONID"), None);
    }
}
