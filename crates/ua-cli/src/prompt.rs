//! Terminal prompter.

use std::io::{BufRead, Write};

use ua_admin::{Prompt, Prompter};
use ua_core::{Error, Result};

/// Environment variable consulted for the directory bind password.
pub const BIND_PASSWORD_ENV: &str = "USERADM_BIND_PASSWORD";

/// Asks on the terminal. Hidden prompts are read without echo.
///
/// With `quiet`, visible prompts take their defaults without asking. Hidden
/// prompts are still asked unless the bind password is in the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompter {
    quiet: bool,
}

impl ConsolePrompter {
    /// Creates a prompter.
    #[must_use]
    pub const fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn ask_visible(prompt: &mut Prompt) -> Result<()> {
        let mut stdout = std::io::stdout();
        let written = match &prompt.default_value {
            Some(default) => write!(stdout, "{} [{default}]: ", prompt.label),
            None => write!(stdout, "{}: ", prompt.label),
        };
        written.and_then(|()| stdout.flush()).map_err(input_error)?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(input_error)?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            prompt.accept_default();
        } else {
            prompt.answer(line);
        }
        Ok(())
    }

    fn ask_hidden(prompt: &mut Prompt) -> Result<()> {
        if prompt.key == ua_admin::prompt::LDAP_PASSWORD {
            if let Ok(password) = std::env::var(BIND_PASSWORD_ENV) {
                prompt.answer(password);
                return Ok(());
            }
        }
        let answer = rpassword::prompt_password(format!("{}: ", prompt.label)).map_err(input_error)?;
        prompt.answer(answer);
        Ok(())
    }
}

fn input_error(err: std::io::Error) -> Error {
    Error::config(format!("cannot read answer: {err}"))
}

impl Prompter for ConsolePrompter {
    fn prompt(&self, prompts: &mut [Prompt]) -> Result<()> {
        for prompt in prompts.iter_mut() {
            if !prompt.visible {
                Self::ask_hidden(prompt)?;
            } else if self.quiet {
                prompt.accept_default();
            } else {
                Self::ask_visible(prompt)?;
            }
        }
        Ok(())
    }
}
