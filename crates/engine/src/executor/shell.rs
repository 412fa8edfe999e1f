//! Shell invocation.
//!
//! Command lines are handed to the shell verbatim. Quay performs no
//! escaping; quoting inside a command line is the caller's responsibility.

use std::path::Path;

use tokio::process::Command;

/// `<shell> -c <command_line>` in `working_dir`.
pub fn shell_command(shell: &str, command_line: &str, working_dir: &Path) -> Command {
    let mut command = Command::new(shell);
    command.arg("-c").arg(command_line).current_dir(working_dir);
    command
}

/// Wrapper text used by the raw-terminal backend:
/// `<shell> -i -c "<command_line>"`.
///
/// Known limitation: the command line is embedded inside an extra pair of
/// double quotes without escaping, so a command line containing `"`, `$`,
/// or backticks is re-interpreted by the outer shell. This is kept as-is.
pub fn raw_terminal_wrapper(shell: &str, command_line: &str) -> String {
    format!("{shell} -i -c \"{command_line}\"")
}

/// `/bin/sh -c '<shell> -i -c "<command_line>"'` in `working_dir`.
pub fn raw_terminal_command(shell: &str, command_line: &str, working_dir: &Path) -> Command {
    shell_command("/bin/sh", &raw_terminal_wrapper(shell, command_line), working_dir)
}
