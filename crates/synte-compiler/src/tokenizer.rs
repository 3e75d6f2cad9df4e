//! Token stream splitting for the listing compiler.
//!
//! Syntə source is whitespace-delimited; this module only handles the
//! lexical split into tokens plus line-comment stripping. Everything about
//! what a token *means* (operator, operand, command, function invocation)
//! is the compiler's job.

/// Split a line of input into whitespace-separated tokens, stopping at a
/// bare `//` token (the rest of the line is a comment).
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for raw in line.split_whitespace() {
        if raw == "//" {
            break;
        }
        tokens.push(raw.to_string());
    }
    tokens
}

/// Split a comma-separated function-argument token (`a,b,c`) into its parts.
/// A token with no comma yields a single-element vector.
pub fn split_args(token: &str) -> Vec<String> {
    token.split(',').map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(
            tokenize("in a  mul 0.5   out dac"),
            vec!["in", "a", "mul", "0.5", "out", "dac"]
        );
    }

    #[test]
    fn stops_at_comment_marker() {
        assert_eq!(
            tokenize("in a out dac // lead voice"),
            vec!["in", "a", "out", "dac"]
        );
    }

    #[test]
    fn comment_only_line_yields_no_tokens() {
        assert!(tokenize("// just a comment").is_empty());
    }

    #[test]
    fn splits_function_arguments() {
        assert_eq!(split_args("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_args("330hz"), vec!["330hz"]);
    }
}
