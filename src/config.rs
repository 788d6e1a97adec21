//! Service configuration.
//!
//! Every option can come from a flag or from a `MARGIN_*` environment
//! variable; flags win.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use crate::comments::{CommentOptions, DEFAULT_EVENT_BUS, DEFAULT_EVENT_SOURCE, MergePolicy};
use crate::error::Error;
use crate::principal::{FixedOwner, HeaderOwner, OwnerResolver};

/// Identity stamped on comments when no principal is supplied.
pub const DEFAULT_OWNER: &str = "fc4cec10-6ae4-435c-98ca-6964382fee77";

/// Log output format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Debug, Parser)]
#[command(name = "margin", version, about = "Document-comment request dispatcher")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "MARGIN_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Bus that receives domain events.
    #[arg(long, env = "MARGIN_EVENT_BUS", default_value = DEFAULT_EVENT_BUS)]
    pub event_bus: String,

    /// Source namespace stamped on domain events.
    #[arg(long, env = "MARGIN_EVENT_SOURCE", default_value = DEFAULT_EVENT_SOURCE)]
    pub event_source: String,

    /// Owner used when the request carries no principal.
    #[arg(long, env = "MARGIN_DEFAULT_OWNER", default_value = DEFAULT_OWNER)]
    pub default_owner: String,

    /// Header carrying the authenticated principal, set by the upstream proxy.
    #[arg(long, env = "MARGIN_OWNER_HEADER")]
    pub owner_header: Option<String>,

    /// Drop body fields that would overwrite PK, SK, DateAdded or Owner.
    #[arg(long, env = "MARGIN_PROTECT_SYSTEM_FIELDS")]
    pub protect_system_fields: bool,

    #[arg(long, env = "MARGIN_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Config {
    /// Rejects values that parse but cannot work.
    pub fn validate(&self) -> Result<(), Error> {
        if self.event_bus.trim().is_empty() {
            return Err(Error::Config("event bus name must not be empty".into()));
        }
        if self.event_source.trim().is_empty() {
            return Err(Error::Config("event source must not be empty".into()));
        }
        if self.default_owner.trim().is_empty() {
            return Err(Error::Config("default owner must not be empty".into()));
        }
        if matches!(&self.owner_header, Some(h) if http::HeaderName::from_bytes(h.as_bytes()).is_err()) {
            return Err(Error::Config("owner header is not a valid header name".into()));
        }
        Ok(())
    }

    pub fn comment_options(&self) -> CommentOptions {
        CommentOptions {
            event_bus: self.event_bus.clone(),
            event_source: self.event_source.clone(),
            merge_policy: if self.protect_system_fields {
                MergePolicy::ProtectSystemFields
            } else {
                MergePolicy::Permissive
            },
        }
    }

    pub fn owner_resolver(&self) -> Arc<dyn OwnerResolver> {
        match &self.owner_header {
            Some(header) => Arc::new(HeaderOwner::new(header.clone(), self.default_owner.clone())),
            None => Arc::new(FixedOwner(self.default_owner.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::request::Request;

    #[test]
    fn defaults_match_the_production_deployment() {
        let config = Config::try_parse_from(["margin"]).unwrap();

        assert_eq!(config.bind, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.event_bus, "com.globomantics.dms");
        assert_eq!(config.comment_options().merge_policy, MergePolicy::Permissive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "margin",
            "--bind", "127.0.0.1:8080",
            "--protect-system-fields",
            "--owner-header", "x-principal-id",
            "--log-format", "json",
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.comment_options().merge_policy, MergePolicy::ProtectSystemFields);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn owner_comes_from_the_configured_header() {
        let config = Config::try_parse_from(["margin", "--owner-header", "x-principal-id"]).unwrap();
        let owner = config.owner_resolver();

        let req = Request::new(Method::Post, "/comments/doc-1").with_header("X-Principal-Id", "user-7");
        assert_eq!(owner.resolve(&req), "user-7");

        let anonymous = Request::new(Method::Post, "/comments/doc-1");
        assert_eq!(owner.resolve(&anonymous), DEFAULT_OWNER);
    }

    #[test]
    fn owner_is_fixed_without_a_header() {
        let config = Config::try_parse_from(["margin", "--default-owner", "svc-account"]).unwrap();
        let req = Request::new(Method::Post, "/comments/doc-1").with_header("x-principal-id", "user-7");

        assert_eq!(config.owner_resolver().resolve(&req), "svc-account");
    }

    #[test]
    fn rejects_blank_bus() {
        let config = Config::try_parse_from(["margin", "--event-bus", " "]).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_bad_header_name() {
        let config = Config::try_parse_from(["margin", "--owner-header", "bad header"]).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
