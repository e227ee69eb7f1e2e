use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{ConfigError, ConfigResult};

const HEADER_SEPARATOR: char = ':';

/// Custom request headers collected from repeated `-H name:value` flags.
///
/// Backed by an ordered multi-map: a repeated name appends another value instead of
/// replacing the earlier one, and iteration follows the order the flags were given in.
#[derive(Clone, Debug, Default)]
pub struct RequestHeaders {
    map: HeaderMap,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a single `name:value` token and appends it.
    ///
    /// Only the first colon separates name from value, and both halves are trimmed.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn push_token(&mut self, token: &str) -> ConfigResult<()> {
        let (name, value) = token
            .split_once(HEADER_SEPARATOR)
            .ok_or_else(|| ConfigError::InvalidHeader(token.to_string()))?;
        let (name, value) = (name.trim(), value.trim());

        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeader(token.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ConfigError::InvalidHeader(token.to_string()))?;

        self.map.append(name, value);
        Ok(())
    }

    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.map.get_all(name).into_iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn as_header_map(&self) -> &HeaderMap {
        &self.map
    }
}

impl<'a> TryFrom<&'a [String]> for RequestHeaders {
    type Error = ConfigError;

    fn try_from(tokens: &'a [String]) -> ConfigResult<Self> {
        let mut headers = RequestHeaders::new();
        for token in tokens {
            headers.push_token(token)?;
        }
        Ok(headers)
    }
}
