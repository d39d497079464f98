//! The prompt collaborator.
//!
//! A session that needs input it cannot derive (a bind password, say) hands
//! the prompter an ordered list of [`Prompt`]s and blocks until every one has
//! an answer.

use ua_core::{Error, Result};

/// Key of the directory server URL prompt.
pub const LDAP_SERVER: &str = "ldap/server";
/// Key of the directory base DN prompt.
pub const LDAP_BASE_DN: &str = "ldap/basedn";
/// Key of the directory bind DN prompt.
pub const LDAP_BIND_DN: &str = "ldap/binddn";
/// Key of the directory bind password prompt.
pub const LDAP_PASSWORD: &str = "ldap/password";

/// One question for the prompter.
#[derive(Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Stable identifier.
    pub key: String,
    /// Text shown to the user.
    pub label: String,
    /// Whether the answer may be echoed. Secrets are not visible.
    pub visible: bool,
    /// Suggested answer, if any.
    pub default_value: Option<String>,
    /// The answer, filled in by the prompter.
    pub value: Option<String>,
}

impl std::fmt::Debug for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match (&self.value, self.visible) {
            (Some(_), false) => Some("<hidden>"),
            (Some(v), true) => Some(v.as_str()),
            (None, _) => None,
        };
        f.debug_struct("Prompt")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("visible", &self.visible)
            .field("value", &value)
            .finish_non_exhaustive()
    }
}

impl Prompt {
    /// Creates an unanswered prompt with no default.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>, visible: bool) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            visible,
            default_value: None,
            value: None,
        }
    }

    /// Sets the suggested answer.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Stores `value` as the answer.
    pub fn answer(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    /// Stores the default as the answer. An absent default answers with
    /// the empty string.
    pub fn accept_default(&mut self) {
        self.value = Some(self.default_value.clone().unwrap_or_default());
    }

    /// The answer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the prompter left this prompt unanswered.
    pub fn answered(&self) -> Result<&str> {
        self.value
            .as_deref()
            .ok_or_else(|| Error::config(format!("prompt '{}' was not answered", self.key)))
    }
}

/// Collects answers for prompts, blocking until done.
pub trait Prompter {
    /// Fills in `value` on every prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if input cannot be collected; the session then fails
    /// to open.
    fn prompt(&self, prompts: &mut [Prompt]) -> Result<()>;
}

impl<F> Prompter for F
where
    F: Fn(&mut [Prompt]) -> Result<()>,
{
    fn prompt(&self, prompts: &mut [Prompt]) -> Result<()> {
        self(prompts)
    }
}

/// Answers every prompt with its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsPrompter;

impl Prompter for DefaultsPrompter {
    fn prompt(&self, prompts: &mut [Prompt]) -> Result<()> {
        for prompt in prompts.iter_mut() {
            prompt.accept_default();
        }
        Ok(())
    }
}
