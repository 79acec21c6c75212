/// Normalizes a configuration key the same way the runtime does, so derived
/// matchers can compare against literals.
///
/// `-`, `_`, space and `.` separate segments; an upper-case letter after a
/// lower-case one, or a letter after a digit, starts a segment; other
/// characters are dropped.
pub fn to_field_name(key: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum Prev {
        Start,
        Lower,
        Upper,
        Digit,
        Separator,
    }

    let mut out = String::with_capacity(key.len() + 4);
    let mut prev = Prev::Start;
    for ch in key.trim().chars() {
        let next = if ch.is_ascii_lowercase() {
            Prev::Lower
        } else if ch.is_ascii_uppercase() {
            Prev::Upper
        } else if ch.is_ascii_digit() {
            Prev::Digit
        } else {
            if matches!(ch, '-' | '_' | ' ' | '.') && prev != Prev::Start {
                prev = Prev::Separator;
            }
            continue;
        };

        if matches!(
            (prev, next),
            (Prev::Separator, _) | (Prev::Lower, Prev::Upper) | (Prev::Digit, Prev::Lower | Prev::Upper)
        ) {
            out.push('_');
        }
        out.push(ch.to_ascii_lowercase());
        prev = next;
    }
    out
}

/// Module ids are registry keys: non-empty, no whitespace, no quotes.
///
/// # Examples
/// Valid: "heartbeat", "bootkit/greeter", "`file_parser`", "api.gateway-v2"
/// Invalid: "", "my module", "\"quoted\""
pub fn validate_module_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("module id cannot be empty".to_owned());
    }
    if let Some(ch) = id.chars().find(|c| c.is_whitespace()) {
        return Err(format!("module id must not contain whitespace, found {ch:?}"));
    }
    if let Some(ch) = id.chars().find(|c| matches!(c, '"' | '\'' | '`')) {
        return Err(format!("module id must not contain quotes, found '{ch}'"));
    }
    Ok(())
}

pub fn path_last_is(path: &syn::Path, want: &str) -> bool {
    path.segments.last().is_some_and(|s| s.ident == want)
}

/// Field identifier as written, without the `r#` prefix.
pub fn unraw(ident: &syn::Ident) -> String {
    let s = ident.to_string();
    s.strip_prefix("r#").map_or_else(|| s.clone(), str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_like_the_runtime() {
        assert_eq!(to_field_name("handshake_timeout"), "handshake_timeout");
        assert_eq!(to_field_name("level2name"), "level2_name");
        assert_eq!(to_field_name("TcpConfig"), "tcp_config");
        assert_eq!(to_field_name("type"), "type");
    }

    #[test]
    fn module_id_rules() {
        assert!(validate_module_id("bootkit/heartbeat").is_ok());
        assert!(validate_module_id("file_parser").is_ok());
        assert!(validate_module_id("").is_err());
        assert!(validate_module_id("my module").is_err());
        assert!(validate_module_id("\"q\"").is_err());
    }
}
