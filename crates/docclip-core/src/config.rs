use std::time::Duration;

use miette::Result;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::origin::OriginTag;

/// Configuration for one attached clipboard controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClipboardConfig {
    /// Base URL the clipboard endpoint hangs off (no query string).
    pub service_root: String,
    /// Document-source identifier (WOPI source URL).
    pub doc_source: String,
    /// Backend server process identity.
    pub server_id: String,
    /// View identity within the backend session.
    pub view_id: String,
    /// Access tag at attach time.
    pub access_tag: String,
    /// How long to wait for a scripted clipboard command before telling the
    /// user to use keyboard shortcuts.
    pub refusal_timeout_ms: u64,
    /// Document forbids copying out.
    pub disable_copy: bool,
    /// Text placed in stubs for selections not yet downloaded.
    pub stub_notice: String,
    /// Text placed in stubs when copying is disabled.
    pub copy_disabled_notice: String,
    /// Origin of the embedding frame allowed to receive paste requests.
    /// Without it the host bridge is never tried.
    pub host_origin: Option<String>,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            service_root: String::new(),
            doc_source: String::new(),
            server_id: String::new(),
            view_id: String::new(),
            access_tag: String::new(),
            refusal_timeout_ms: 150,
            disable_copy: false,
            stub_notice: "This content is still on the server. Please download it before \
                          pasting into another application."
                .to_owned(),
            copy_disabled_notice: "Copying from this document is disabled.".to_owned(),
            host_origin: None,
        }
    }
}

impl ClipboardConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_root.contains('?') {
            return Err(ConfigError::ServiceRootHasQuery(self.service_root.clone()));
        }
        let required = [
            ("docSource", &self.doc_source),
            ("serverId", &self.server_id),
            ("viewId", &self.view_id),
            ("accessTag", &self.access_tag),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(ConfigError::MissingField(*field));
        }
        Ok(())
    }

    /// Origin tag of this view under its initial access tag.
    pub fn identity(&self) -> OriginTag {
        OriginTag::new(
            self.service_root.trim_end_matches('/'),
            self.doc_source.as_str(),
            self.server_id.as_str(),
            self.view_id.as_str(),
            self.access_tag.as_str(),
        )
    }

    pub fn refusal_timeout(&self) -> Duration {
        Duration::from_millis(self.refusal_timeout_ms)
    }
}
