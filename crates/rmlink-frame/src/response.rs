//! Typed access to reply and push payload tokens.

use std::str::FromStr;

use crate::error::DataError;

/// A text payload split into whitespace-separated tokens.
///
/// A trailing `;` terminator is tolerated and stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    tokens: Vec<String>,
}

impl Response {
    /// Parse a raw payload.
    pub fn parse(payload: &[u8]) -> Result<Self, DataError> {
        let text = std::str::from_utf8(payload).map_err(|_| DataError::NotUtf8)?;
        Ok(Self::from_text(text))
    }

    pub fn from_text(text: &str) -> Self {
        let text = text.trim().trim_end_matches(';');
        Self {
            tokens: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// True for the bare `ok` acknowledgement.
    pub fn is_ok(&self) -> bool {
        self.tokens.len() == 1 && self.tokens[0].eq_ignore_ascii_case("ok")
    }

    /// Tokens joined back into a single line.
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    pub fn get_str(&self, index: usize) -> Result<&str, DataError> {
        self.tokens
            .get(index)
            .map(String::as_str)
            .ok_or(DataError::MissingToken {
                index,
                len: self.tokens.len(),
            })
    }

    pub fn get_int(&self, index: usize) -> Result<i64, DataError> {
        self.parse_token(index, "integer")
    }

    pub fn get_float(&self, index: usize) -> Result<f64, DataError> {
        self.parse_token(index, "number")
    }

    /// Reads `on`/`off` or `1`/`0`.
    pub fn get_bool(&self, index: usize) -> Result<bool, DataError> {
        let token = self.get_str(index)?;
        match token {
            "on" | "1" => Ok(true),
            "off" | "0" => Ok(false),
            _ => Err(self.invalid(index, "boolean")),
        }
    }

    /// Parse a token with any [`FromStr`] type.
    pub fn get_parsed<T: FromStr>(&self, index: usize) -> Result<T, DataError> {
        self.parse_token(index, std::any::type_name::<T>())
    }

    /// Tokens from `from` onwards; empty when out of range.
    pub fn tail(&self, from: usize) -> &[String] {
        self.tokens.get(from..).unwrap_or(&[])
    }

    fn parse_token<T: FromStr>(&self, index: usize, expected: &'static str) -> Result<T, DataError> {
        self.get_str(index)?
            .parse()
            .map_err(|_| self.invalid(index, expected))
    }

    fn invalid(&self, index: usize, expected: &'static str) -> DataError {
        DataError::InvalidToken {
            index,
            token: self.tokens[index].clone(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tokens_and_terminator() {
        let response = Response::parse(b" 0.5 -1 12 ;").unwrap();
        assert_eq!(response.len(), 3);
        assert_eq!(response.get_float(0).unwrap(), 0.5);
        assert_eq!(response.get_int(1).unwrap(), -1);
        assert_eq!(response.get_parsed::<u16>(2).unwrap(), 12);
    }

    #[test]
    fn recognises_ok() {
        assert!(Response::from_text("ok;").is_ok());
        assert!(Response::from_text("OK").is_ok());
        assert!(!Response::from_text("ok 1").is_ok());
    }

    #[test]
    fn booleans() {
        let response = Response::from_text("on off 1 0 maybe");
        assert!(response.get_bool(0).unwrap());
        assert!(!response.get_bool(1).unwrap());
        assert!(response.get_bool(2).unwrap());
        assert!(!response.get_bool(3).unwrap());
        assert!(matches!(
            response.get_bool(4),
            Err(DataError::InvalidToken { index: 4, expected: "boolean", .. })
        ));
    }

    #[test]
    fn missing_and_invalid_tokens() {
        let response = Response::from_text("abc");
        assert_eq!(
            response.get_int(3).unwrap_err(),
            DataError::MissingToken { index: 3, len: 1 }
        );
        assert_eq!(
            response.get_float(0).unwrap_err(),
            DataError::InvalidToken {
                index: 0,
                token: "abc".to_string(),
                expected: "number",
            }
        );
    }

    #[test]
    fn rejects_non_utf8() {
        assert_eq!(Response::parse(&[0xff]).unwrap_err(), DataError::NotUtf8);
    }

    #[test]
    fn tail_is_bounded() {
        let response = Response::from_text("1 a b");
        assert_eq!(response.tail(1), ["a", "b"]);
        assert!(response.tail(5).is_empty());
    }
}
