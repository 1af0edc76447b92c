use url::form_urlencoded;

/// Coerces an editor-supplied link into something a browser will treat as
/// absolute. Blank input yields `None`.
pub fn normalize_external_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Some(trimmed.to_string());
    }
    if let Some(rest) = trimmed.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    Some(format!("https://{trimmed}"))
}

/// Percent-encodes `text` for a query value, spaces as `%20`.
pub fn encode_query_component(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// `https://wa.me/<digits>?text=<message>`; non-digits in the number are dropped.
pub fn whatsapp_url(number: &str, message: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    format!(
        "https://wa.me/{digits}?text={}",
        encode_query_component(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https() {
        assert_eq!(
            normalize_external_url("example.com").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            normalize_external_url("  example.com/a?b=c ").as_deref(),
            Some("https://example.com/a?b=c")
        );
    }

    #[test]
    fn protocol_relative_gets_https() {
        assert_eq!(
            normalize_external_url("//example.com").as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn explicit_schemes_are_kept() {
        assert_eq!(
            normalize_external_url("http://example.com").as_deref(),
            Some("http://example.com")
        );
        assert_eq!(
            normalize_external_url("https://example.com").as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(normalize_external_url("   "), None);
    }

    #[test]
    fn whatsapp_link_encodes_message() {
        let url = whatsapp_url("+55 (88) 99425-3039", "Olá mundo\n1+1 & *b*");
        assert_eq!(
            url,
            "https://wa.me/5588994253039?text=Ol%C3%A1%20mundo%0A1%2B1%20%26%20*b*"
        );
    }
}
