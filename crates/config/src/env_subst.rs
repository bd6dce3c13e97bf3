/// Replace `${ENV_VAR}` and `${ENV_VAR:-fallback}` references in raw config
/// text.
///
/// Unset variables without a fallback are left as written.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated, keep the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };
        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };
        match (name.is_empty(), lookup(name), fallback) {
            (false, Some(value), _) => out.push_str(&value),
            (false, None, Some(fallback)) => out.push_str(fallback),
            _ => {
                out.push_str("${");
                out.push_str(body);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "HIVE_FEED" => Some("spartacus".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("feed = \"${HIVE_FEED}\"", lookup),
            "feed = \"spartacus\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env_with("${HIVE_NOPE} and ${}", lookup),
            "${HIVE_NOPE} and ${}"
        );
    }

    #[test]
    fn uses_fallback_for_unset() {
        assert_eq!(
            substitute_env_with("${HIVE_NOPE:-300}/${HIVE_FEED:-x}", lookup),
            "300/spartacus"
        );
    }

    #[test]
    fn unterminated_reference_is_literal() {
        assert_eq!(substitute_env_with("a ${HIVE_FEED", lookup), "a ${HIVE_FEED");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain $text"), "plain $text");
    }
}
