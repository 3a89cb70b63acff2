use std::fmt;

/// Personal access token used against the Azure DevOps REST API.
///
/// The token is passed through verbatim; `Debug` never prints it.
#[derive(Clone)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_kept_verbatim() {
        let token = Token::from(" pat-value\n");
        assert_eq!(token.as_str(), " pat-value\n");
        assert_eq!(Token::from(String::from("p@t:x")).as_str(), "p@t:x");
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = Token::from("secret");
        assert_eq!(format!("{token:?}"), "Token(***)");
    }
}
