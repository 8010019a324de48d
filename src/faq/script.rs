//! The FAQ dialogue graph as plain data.
//!
//! A script is loaded from YAML and validated once; the engine never has to
//! deal with dangling references afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::FaqError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqOption {
    pub label: String,
    /// Id of the state this option leads to.
    pub next: String,
}

/// One node of the dialogue graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FaqState {
    Menu {
        message: String,
        options: Vec<FaqOption>,
    },
    /// Collects free text; any non-blank text ends the flow.
    Input {
        message: String,
        #[serde(default)]
        placeholder: Option<String>,
        acknowledgement: String,
        /// Site key opened after the acknowledgement.
        redirect: String,
    },
    /// Closes the widget, or opens `redirect` when present.
    Terminal {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        redirect: Option<String>,
    },
}

impl FaqState {
    pub fn message(&self) -> &str {
        match self {
            FaqState::Menu { message, .. }
            | FaqState::Input { message, .. }
            | FaqState::Terminal { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqTiming {
    /// Delay before a terminal state's redirect opens.
    pub redirect_after_ms: u64,
    /// Delay before the widget closes.
    pub close_after_ms: u64,
    /// Delay before the redirect that follows an input submission.
    pub input_redirect_after_ms: u64,
}

impl Default for FaqTiming {
    fn default() -> Self {
        Self {
            redirect_after_ms: 1000,
            close_after_ms: 1500,
            input_redirect_after_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqScript {
    pub start: String,
    #[serde(default)]
    pub timing: FaqTiming,
    /// Site key to absolute URL.
    pub sites: BTreeMap<String, String>,
    pub states: BTreeMap<String, FaqState>,
}

impl FaqScript {
    pub fn from_yaml(source: &str) -> Result<Self, FaqError> {
        let script: FaqScript =
            serde_yaml::from_str(source).map_err(|e| FaqError::InvalidScript(e.to_string()))?;
        script.validate()?;
        Ok(script)
    }

    pub fn state(&self, id: &str) -> Result<&FaqState, FaqError> {
        self.states
            .get(id)
            .ok_or_else(|| FaqError::UnknownState(id.to_string()))
    }

    pub fn site_url(&self, key: &str) -> Result<&str, FaqError> {
        self.sites
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| FaqError::InvalidScript(format!("unknown site '{key}'")))
    }

    /// Every reference in the graph must resolve.
    fn validate(&self) -> Result<(), FaqError> {
        if !self.states.contains_key(&self.start) {
            return Err(FaqError::InvalidScript(format!(
                "start state '{}' is not defined",
                self.start
            )));
        }

        for (key, raw) in &self.sites {
            url::Url::parse(raw).map_err(|e| {
                FaqError::InvalidScript(format!("site '{key}' has an invalid URL: {e}"))
            })?;
        }

        for (id, state) in &self.states {
            match state {
                FaqState::Menu { options, .. } => {
                    if options.is_empty() {
                        return Err(FaqError::InvalidScript(format!(
                            "menu '{id}' has no options"
                        )));
                    }
                    for option in options {
                        if !self.states.contains_key(&option.next) {
                            return Err(FaqError::InvalidScript(format!(
                                "option '{}' in '{id}' points to unknown state '{}'",
                                option.label, option.next
                            )));
                        }
                    }
                }
                FaqState::Input { redirect, .. } => {
                    self.site_url(redirect)?;
                }
                FaqState::Terminal { redirect, .. } => {
                    if let Some(redirect) = redirect {
                        self.site_url(redirect)?;
                    }
                }
            }
        }

        Ok(())
    }
}
