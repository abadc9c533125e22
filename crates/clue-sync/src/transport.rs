use crate::error::TransportError;
use crate::protocol::FormRequest;
use serde::{Deserialize, Serialize};

/// How form parameters travel: in the query string or the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Get,
    #[default]
    Post,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Delivers one request to the backend and returns the raw reply body.
///
/// Implementations hold no protocol state. Anything other than a successful
/// reply with a body (connection failure, non-200 status) is a
/// [`TransportError`].
pub trait Transport {
    fn send(&mut self, request: &FormRequest) -> Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, request: &FormRequest) -> Result<String, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, request: &FormRequest) -> Result<String, TransportError> {
        (**self).send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_and_default() {
        assert_eq!(Method::default(), Method::Post);
        assert_eq!(Method::Get.as_str(), "GET");
    }
}
