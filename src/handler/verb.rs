//! Request verbs
//!
//! The HTTP-alike verbs plus the filesystem extensions `READ`, `WRITE`,
//! `APPEND` and `LIST`. Anything else is kept as `Other` so the router can
//! answer 405 instead of failing to parse.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Verb {
    #[default]
    Get,
    Head,
    Put,
    Post,
    Delete,
    Read,
    Write,
    Append,
    List,
    Connect,
    Options,
    Trace,
    Track,
    /// Upper-cased verb outside the table
    Other(String),
}

impl Verb {
    /// Case-insensitive and total
    pub fn parse(method: &str) -> Self {
        let upper = method.trim().to_ascii_uppercase();
        match upper.as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "PUT" => Self::Put,
            "POST" => Self::Post,
            "DELETE" => Self::Delete,
            "READ" => Self::Read,
            "WRITE" => Self::Write,
            "APPEND" => Self::Append,
            "LIST" => Self::List,
            "CONNECT" => Self::Connect,
            "OPTIONS" => Self::Options,
            "TRACE" => Self::Trace,
            "TRACK" => Self::Track,
            _ => Self::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Append => "APPEND",
            Self::List => "LIST",
            Self::Connect => "CONNECT",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Track => "TRACK",
            Self::Other(name) => name,
        }
    }

    /// Verbs answered with 501: never served, never silently accepted
    pub const fn is_rejected(&self) -> bool {
        matches!(
            self,
            Self::Connect | Self::Options | Self::Trace | Self::Track
        )
    }
}

impl FromStr for Verb {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Verb {
    fn from(method: &str) -> Self {
        Self::parse(method)
    }
}

impl From<&hyper::Method> for Verb {
    fn from(method: &hyper::Method) -> Self {
        Self::parse(method.as_str())
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Verb::parse("get"), Verb::Get);
        assert_eq!(Verb::parse("List"), Verb::List);
        assert_eq!(Verb::parse(" append "), Verb::Append);
    }

    #[test]
    fn test_unknown_verb() {
        let verb = Verb::parse("brew");
        assert_eq!(verb, Verb::Other("BREW".to_string()));
        assert_eq!(verb.as_str(), "BREW");
        assert!(!verb.is_rejected());
    }

    #[test]
    fn test_rejected_verbs() {
        for name in ["CONNECT", "OPTIONS", "TRACE", "TRACK"] {
            assert!(Verb::parse(name).is_rejected(), "{name}");
        }
        assert!(!Verb::Get.is_rejected());
    }

    #[test]
    fn test_round_trip_names() {
        for name in ["GET", "HEAD", "PUT", "POST", "DELETE", "READ", "WRITE", "APPEND", "LIST"] {
            assert_eq!(Verb::parse(name).to_string(), name);
        }
        assert_eq!(Verb::from(&hyper::Method::PATCH), Verb::Other("PATCH".into()));
    }
}
