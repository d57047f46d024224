//! Credential masking for anything that ends up in logs or printed config

/// Replacement shown in place of a secret
pub const MASK: &str = "****";

/// Mask the password of a connection URL, leaving everything else readable
///
/// URLs that do not parse are returned unchanged.
pub fn redact_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some(MASK));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_url() {
        assert_eq!(redact_url("postgres://logo:secret@db/logos"), "postgres://logo:****@db/logos");
        assert_eq!(redact_url("redis://:hunter2@cache:6379/0"), "redis://:****@cache:6379/0");
        assert_eq!(redact_url("redis://cache:6379"), "redis://cache:6379");
        assert_eq!(redact_url("sqlite::memory:"), "sqlite::memory:");
    }
}
