use std::path::Path;

use serde::{Deserialize, Serialize};

use super::script::{FaqOption, FaqScript, FaqState};
use super::FaqError;

const BUILTIN_SCRIPT: &str = include_str!("faq.yaml");

/// Side effect the widget should perform after showing a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FaqAction {
    /// Open `url` in a new tab after `after_ms`.
    Redirect { url: String, after_ms: u64 },
    /// Close the widget after `after_ms`.
    Close { after_ms: u64 },
}

/// What the widget shows after a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// State the client should hold on to for its next step.
    pub state: String,
    pub message: String,
    #[serde(default)]
    pub options: Vec<FaqOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<FaqAction>,
    /// Whether a text box should be shown.
    pub accepts_input: bool,
}

/// Stateless walker over a [`FaqScript`]. The client holds the current state id
/// and sends it back with every step.
#[derive(Debug, Clone)]
pub struct FaqEngine {
    script: FaqScript,
}

impl FaqEngine {
    pub fn new(script: FaqScript) -> Self {
        Self { script }
    }

    /// The dialogue shipped with the binary.
    pub fn builtin() -> Result<Self, FaqError> {
        Self::from_yaml(BUILTIN_SCRIPT)
    }

    pub fn from_yaml(source: &str) -> Result<Self, FaqError> {
        Ok(Self::new(FaqScript::from_yaml(source)?))
    }

    pub fn from_path(path: &Path) -> Result<Self, FaqError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            FaqError::InvalidScript(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&source)
    }

    pub fn script(&self) -> &FaqScript {
        &self.script
    }

    pub fn start(&self) -> Result<Reply, FaqError> {
        self.enter(&self.script.start)
    }

    /// Follow one of the options of the menu `current`.
    pub fn choose(&self, current: &str, next: &str) -> Result<Reply, FaqError> {
        let FaqState::Menu { options, .. } = self.script.state(current)? else {
            return Err(FaqError::NotAnOption {
                state: current.to_string(),
                choice: next.to_string(),
            });
        };

        if !options.iter().any(|o| o.next == next) {
            return Err(FaqError::NotAnOption {
                state: current.to_string(),
                choice: next.to_string(),
            });
        }

        self.enter(next)
    }

    /// Submit free text in the input state `current`.
    ///
    /// The content itself is not inspected; anything non-blank ends the flow.
    pub fn submit(&self, current: &str, text: &str) -> Result<Reply, FaqError> {
        let FaqState::Input {
            acknowledgement,
            redirect,
            ..
        } = self.script.state(current)?
        else {
            return Err(FaqError::NotAnInput(current.to_string()));
        };

        if text.trim().is_empty() {
            return Err(FaqError::EmptyInput);
        }

        Ok(Reply {
            state: self.script.start.clone(),
            message: acknowledgement.clone(),
            options: Vec::new(),
            input_placeholder: None,
            action: Some(FaqAction::Redirect {
                url: self.script.site_url(redirect)?.to_string(),
                after_ms: self.script.timing.input_redirect_after_ms,
            }),
            accepts_input: false,
        })
    }

    fn enter(&self, id: &str) -> Result<Reply, FaqError> {
        let timing = &self.script.timing;
        let reply = match self.script.state(id)? {
            FaqState::Menu { message, options } => Reply {
                state: id.to_string(),
                message: message.clone(),
                options: options.clone(),
                input_placeholder: None,
                action: None,
                accepts_input: false,
            },
            FaqState::Input {
                message,
                placeholder,
                ..
            } => Reply {
                state: id.to_string(),
                message: message.clone(),
                options: Vec::new(),
                input_placeholder: placeholder.clone(),
                action: None,
                accepts_input: true,
            },
            FaqState::Terminal { message, redirect } => {
                let action = match redirect {
                    Some(site) => FaqAction::Redirect {
                        url: self.script.site_url(site)?.to_string(),
                        after_ms: timing.redirect_after_ms,
                    },
                    None => FaqAction::Close {
                        after_ms: timing.close_after_ms,
                    },
                };
                Reply {
                    state: id.to_string(),
                    message: message.clone(),
                    options: Vec::new(),
                    input_placeholder: None,
                    action: Some(action),
                    accepts_input: false,
                }
            }
        };
        Ok(reply)
    }
}
