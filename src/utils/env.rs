/// Expands `$VAR` and `${VAR}` references from the process environment.
///
/// Unset variables expand to an empty string, matching shell behaviour.
pub fn expand_env_vars(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => {
                    out.push_str(&lookup(&braced[..end]).unwrap_or_default());
                    rest = &braced[end + 1..];
                },
                None => {
                    // Unterminated, keep it verbatim
                    out.push_str(&rest[pos..]);
                    rest = "";
                },
            }
            continue;
        }

        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..len]).unwrap_or_default());
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "HOME" => Some("/home/anand".to_string()),
            "CLUSTER" => Some("thorny-jaguar".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_expands_plain_and_braced() {
        assert_eq!(
            expand_with("$HOME/.postgresql/root.crt", lookup),
            "/home/anand/.postgresql/root.crt"
        );
        assert_eq!(
            expand_with("--cluster=${CLUSTER}", lookup),
            "--cluster=thorny-jaguar"
        );
    }

    #[test]
    fn test_unset_variable_expands_to_empty() {
        assert_eq!(expand_with("$MISSING/root.crt", lookup), "/root.crt");
    }

    #[test]
    fn test_lone_dollar_and_unterminated_brace_are_kept() {
        assert_eq!(expand_with("cost $ 5", lookup), "cost $ 5");
        assert_eq!(expand_with("x${HOME", lookup), "x${HOME");
    }

    #[test]
    fn test_no_references() {
        assert_eq!(expand_with("/etc/ssl/root.crt", lookup), "/etc/ssl/root.crt");
    }
}
