// ABOUTME: Security header configuration for HTTP responses
// ABOUTME: HSTS defaults on in production, frame and referrer policies always applied
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

use super::types::Environment;
use super::{env_parse_or, env_var_opt, env_var_or};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Values for the security headers added to every response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityHeadersConfig {
    /// Send `Strict-Transport-Security`
    pub hsts_enabled: bool,
    /// HSTS `max-age` in seconds
    pub hsts_max_age: u64,
    /// Append `includeSubDomains`
    pub hsts_include_subdomains: bool,
    /// Append `preload`
    pub hsts_preload: bool,
    /// `X-Frame-Options` value
    pub frame_options: String,
    /// `Referrer-Policy` value
    pub referrer_policy: String,
    /// `Content-Security-Policy` value, omitted when unset
    pub content_security_policy: Option<String>,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            hsts_enabled: false,
            hsts_max_age: 31_536_000,
            hsts_include_subdomains: true,
            hsts_preload: false,
            frame_options: "DENY".into(),
            referrer_policy: "strict-origin-when-cross-origin".into(),
            content_security_policy: None,
        }
    }
}

impl SecurityHeadersConfig {
    /// Load from `SECURITY_HEADERS__*` variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed
    pub fn from_env(environment: Environment) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            hsts_enabled: env_parse_or(
                "SECURITY_HEADERS__HSTS_ENABLED",
                environment.is_production(),
            )?,
            hsts_max_age: env_parse_or("SECURITY_HEADERS__HSTS_MAX_AGE", defaults.hsts_max_age)?,
            hsts_include_subdomains: env_parse_or(
                "SECURITY_HEADERS__HSTS_INCLUDE_SUBDOMAINS",
                defaults.hsts_include_subdomains,
            )?,
            hsts_preload: env_parse_or("SECURITY_HEADERS__HSTS_PRELOAD", defaults.hsts_preload)?,
            frame_options: env_var_or("SECURITY_HEADERS__FRAME_OPTIONS", &defaults.frame_options),
            referrer_policy: env_var_or(
                "SECURITY_HEADERS__REFERRER_POLICY",
                &defaults.referrer_policy,
            ),
            content_security_policy: env_var_opt("SECURITY_HEADERS__CONTENT_SECURITY_POLICY"),
        })
    }

    /// `Strict-Transport-Security` value, if enabled
    #[must_use]
    pub fn hsts_value(&self) -> Option<String> {
        if !self.hsts_enabled {
            return None;
        }
        let mut value = format!("max-age={}", self.hsts_max_age);
        if self.hsts_include_subdomains {
            value.push_str("; includeSubDomains");
        }
        if self.hsts_preload {
            value.push_str("; preload");
        }
        Some(value)
    }
}
