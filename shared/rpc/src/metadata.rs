//! Caller identity and tracing pairs attached to every RPC.
//!
//! Keys are canonical lowercase. Absent values stay absent; nothing here
//! synthesizes defaults.

use std::collections::HashMap;

pub const USER_ID_KEY: &str = "x-user-id";
pub const USER_ROLE_KEY: &str = "x-user-role";
pub const TRACE_ID_KEY: &str = "x-trace-id";

/// The request envelope carried inside every request frame.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcRequest {
    #[prost(string, tag = "1")]
    pub method: String,
    #[prost(map = "string, string", tag = "2")]
    pub metadata: HashMap<String, String>,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pairs: HashMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.insert(key.into().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get(USER_ID_KEY)
    }

    pub fn user_role(&self) -> Option<&str> {
        self.get(USER_ROLE_KEY)
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.get(TRACE_ID_KEY)
    }

    pub(crate) fn into_pairs(self) -> HashMap<String, String> {
        self.pairs
    }

    pub(crate) fn from_pairs(pairs: HashMap<String, String>) -> Self {
        Self { pairs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_canonicalized_to_lowercase() {
        let mut md = Metadata::new();
        md.insert("X-User-Id", "abc");
        assert_eq!(md.get("x-user-id"), Some("abc"));
        assert_eq!(md.user_id(), Some("abc"));
    }

    #[test]
    fn absent_values_stay_absent() {
        let md = Metadata::new();
        assert_eq!(md.user_id(), None);
        assert_eq!(md.user_role(), None);
        assert_eq!(md.trace_id(), None);
    }
}
