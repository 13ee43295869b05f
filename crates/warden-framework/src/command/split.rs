/// Simple shell-like argument splitting.
///
/// Handles:
/// - Whitespace-separated arguments
/// - Quoted strings (single and double quotes)
/// - Escape sequences within double quotes
pub fn shell_split(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;

    for ch in input.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_double_quote => {
                escape_next = true;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
            }
            c if c.is_whitespace() && !in_single_quote && !in_double_quote => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Splits the text following a matched prefix into the invoked name and
/// its arguments.
///
/// The name is the word directly after the prefix, taken verbatim. Returns
/// `None` when nothing follows the prefix or whitespace comes first.
pub fn parse_invocation(rest: &str) -> Option<(&str, Vec<String>)> {
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let (name, tail) = rest.split_at(end);
    if name.is_empty() {
        return None;
    }
    Some((name, shell_split(tail)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_split_simple() {
        let args = shell_split("hello world");
        assert_eq!(args, vec!["hello", "world"]);
    }

    #[test]
    fn test_shell_split_quoted() {
        let args = shell_split(r#"set "Realm Club" now"#);
        assert_eq!(args, vec!["set", "Realm Club", "now"]);
    }

    #[test]
    fn test_shell_split_mixed_quotes() {
        let args = shell_split(r#""double's quote" 'single"s quote'"#);
        assert_eq!(args, vec!["double's quote", r#"single"s quote"#]);
    }

    #[test]
    fn test_shell_split_newlines_separate() {
        let args = shell_split("a\nb\tc");
        assert_eq!(args, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_shell_split_whitespace_only() {
        assert!(shell_split("   \t  ").is_empty());
    }

    #[test]
    fn test_parse_invocation() {
        let (name, args) = parse_invocation("prefix add \"r !\"").unwrap();
        assert_eq!(name, "prefix");
        assert_eq!(args, vec!["add", "r !"]);

        let (name, args) = parse_invocation("ping").unwrap();
        assert_eq!(name, "ping");
        assert!(args.is_empty());
    }

    #[test]
    fn test_parse_invocation_empty() {
        assert!(parse_invocation("").is_none());
        assert!(parse_invocation("   ").is_none());
    }

    #[test]
    fn test_parse_invocation_requires_name_after_prefix() {
        assert!(parse_invocation(" ping").is_none());
        assert!(parse_invocation("\tping now").is_none());
    }
}
