//! Command templates with a `%` substitution placeholder.
//!
//! A template is the external program name plus its arguments, with at least
//! one token containing the reserved `%` character. Rendering a candidate
//! value replaces every `%` occurrence in every token with the value's
//! textual form.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::process::Invocation;

/// The reserved substitution token standing in for the candidate value.
pub const PLACEHOLDER: char = '%';

/// Characters that force a template through the shell. Plain templates run
/// as a structured argv; a token carrying any of these needs `sh -c`
/// semantics (e.g. `$((%*%))` arithmetic or an `&&` chain).
const SHELL_METACHARACTERS: &[char] = &[
    '&', '|', ';', '<', '>', '$', '`', '(', ')', '{', '}', '*', '?', '~',
];

/// A validated command template, optionally expanded for hold-out
/// evaluation.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    tokens: Vec<String>,
    shell: bool,
    scratch_model: Option<PathBuf>,
}

impl CommandTemplate {
    /// Creates a template from raw tokens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCommand`] when `tokens` is empty and
    /// [`Error::MissingPlaceholder`] when no token contains `%`.
    pub fn new(tokens: Vec<String>) -> Result<Self> {
        Self::build(tokens, false, None)
    }

    /// Creates a template expanded for hold-out evaluation against
    /// `test_set`.
    ///
    /// The training invocation is made to persist a model: a `-f <path>`
    /// already present in `tokens` is reused (and stays caller-owned),
    /// otherwise a scratch model path unique to this process is appended
    /// and owned by the template. A second invocation reusing the first
    /// token as the executable is chained with `&&` so it only runs when
    /// training succeeds:
    ///
    /// ```text
    /// <tokens...> -f <model> && <tokens[0]> -t -i <model> -d <test_set>
    /// ```
    ///
    /// The chained form always renders through the shell.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCommand`] when `tokens` is empty,
    /// [`Error::MissingPlaceholder`] when no token contains `%`, and
    /// [`Error::DanglingModelFlag`] when `tokens` ends in a `-f` with no
    /// path after it.
    pub fn with_holdout(mut tokens: Vec<String>, test_set: &Path) -> Result<Self> {
        if tokens.is_empty() {
            return Err(Error::EmptyCommand);
        }
        let mut scratch = None;
        let model = match tokens.iter().position(|t| t == "-f") {
            Some(at) => match tokens.get(at + 1) {
                Some(path) => PathBuf::from(path),
                None => return Err(Error::DanglingModelFlag),
            },
            None => {
                let path = std::env::temp_dir()
                    .join(format!("linetune-model-{}.tmp", std::process::id()));
                tokens.push("-f".to_owned());
                tokens.push(path.display().to_string());
                scratch = Some(path.clone());
                path
            }
        };
        let trainer = tokens[0].clone();
        tokens.push("&&".to_owned());
        tokens.push(trainer);
        tokens.push("-t".to_owned());
        tokens.push("-i".to_owned());
        tokens.push(model.display().to_string());
        tokens.push("-d".to_owned());
        tokens.push(test_set.display().to_string());
        Self::build(tokens, true, scratch)
    }

    fn build(tokens: Vec<String>, chained: bool, scratch_model: Option<PathBuf>) -> Result<Self> {
        if tokens.is_empty() {
            return Err(Error::EmptyCommand);
        }
        if !tokens.iter().any(|t| t.contains(PLACEHOLDER)) {
            return Err(Error::MissingPlaceholder);
        }
        let shell = chained
            || tokens
                .iter()
                .any(|t| t.contains(SHELL_METACHARACTERS));
        Ok(Self {
            tokens,
            shell,
            scratch_model,
        })
    }

    /// Renders the template for a candidate value, substituting every `%`
    /// occurrence.
    #[must_use]
    pub fn render(&self, value: f64) -> Invocation {
        let value = value.to_string();
        let mut tokens = self
            .tokens
            .iter()
            .map(|t| t.replace(PLACEHOLDER, &value));
        if self.shell {
            Invocation::Shell {
                command: tokens.collect::<Vec<_>>().join(" "),
            }
        } else {
            // build() guarantees at least one token
            let program = tokens.next().unwrap_or_default();
            Invocation::Direct {
                program,
                args: tokens.collect(),
            }
        }
    }

    /// The scratch model path, when this template generated one.
    #[must_use]
    pub fn scratch_model(&self) -> Option<&Path> {
        self.scratch_model.as_deref()
    }

    /// Deletes the scratch model left behind by an evaluation run. Only a
    /// path this template generated is ever touched; a caller-supplied
    /// `-f` path is never deleted. A missing file is not an error.
    pub fn cleanup_scratch(&self) {
        if let Some(path) = &self.scratch_model {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| (*t).to_owned()).collect()
    }

    #[test]
    fn substitutes_every_occurrence() {
        let template = CommandTemplate::new(tokens(&["prog", "--l1", "%", "--l2", "%"])).unwrap();
        match template.render(0.5) {
            Invocation::Direct { program, args } => {
                assert_eq!(program, "prog");
                assert_eq!(args, tokens(&["--l1", "0.5", "--l2", "0.5"]));
            }
            Invocation::Shell { command } => panic!("expected direct invocation, got `{command}`"),
        }
    }

    #[test]
    fn multiple_placeholders_in_one_token() {
        let template = CommandTemplate::new(tokens(&["echo", "%x%"])).unwrap();
        match template.render(4.0) {
            Invocation::Direct { args, .. } => assert_eq!(args, tokens(&["4x4"])),
            Invocation::Shell { command } => panic!("expected direct invocation, got `{command}`"),
        }
    }

    #[test]
    fn shell_metacharacters_force_shell_rendering() {
        let template =
            CommandTemplate::new(tokens(&["echo", "average", "loss", "=", "$((%*%))"])).unwrap();
        match template.render(4.0) {
            Invocation::Shell { command } => {
                assert_eq!(command, "echo average loss = $((4*4))");
            }
            Invocation::Direct { program, .. } => {
                panic!("expected shell invocation, got direct `{program}`");
            }
        }
    }

    #[test]
    fn rejects_empty_template() {
        assert!(matches!(
            CommandTemplate::new(Vec::new()),
            Err(Error::EmptyCommand)
        ));
    }

    #[test]
    fn rejects_missing_placeholder() {
        assert!(matches!(
            CommandTemplate::new(tokens(&["prog", "--flag"])),
            Err(Error::MissingPlaceholder)
        ));
    }

    #[test]
    fn holdout_appends_scratch_model_and_chained_test_run() {
        let template =
            CommandTemplate::with_holdout(tokens(&["vw", "--l2", "%"]), Path::new("test.dat"))
                .unwrap();
        let scratch = template
            .scratch_model()
            .expect("scratch model should be generated")
            .display()
            .to_string();
        match template.render(0.25) {
            Invocation::Shell { command } => {
                assert_eq!(
                    command,
                    format!("vw --l2 0.25 -f {scratch} && vw -t -i {scratch} -d test.dat")
                );
            }
            Invocation::Direct { program, .. } => {
                panic!("expected shell invocation, got direct `{program}`");
            }
        }
    }

    #[test]
    fn holdout_reuses_caller_model_and_owns_nothing() {
        let template = CommandTemplate::with_holdout(
            tokens(&["vw", "--l2", "%", "-f", "model.bin"]),
            Path::new("test.dat"),
        )
        .unwrap();
        assert!(template.scratch_model().is_none());
        match template.render(1.0) {
            Invocation::Shell { command } => {
                assert_eq!(
                    command,
                    "vw --l2 1 -f model.bin && vw -t -i model.bin -d test.dat"
                );
            }
            Invocation::Direct { program, .. } => {
                panic!("expected shell invocation, got direct `{program}`");
            }
        }
    }

    #[test]
    fn holdout_rejects_a_dangling_model_flag() {
        // a trailing -f with no path would otherwise collide with the
        // scratch model the template appends
        assert!(matches!(
            CommandTemplate::with_holdout(tokens(&["vw", "--l2", "%", "-f"]), Path::new("t.dat")),
            Err(Error::DanglingModelFlag)
        ));
    }

    #[test]
    fn holdout_reuses_first_token_as_test_executable() {
        let template = CommandTemplate::with_holdout(
            tokens(&["./train.sh", "--rate", "%"]),
            Path::new("held.dat"),
        )
        .unwrap();
        match template.render(2.0) {
            Invocation::Shell { command } => {
                assert!(command.contains("&& ./train.sh -t -i "), "command: {command}");
            }
            Invocation::Direct { program, .. } => {
                panic!("expected shell invocation, got direct `{program}`");
            }
        }
    }
}
