//! Console reporting helpers. Log output goes to the log file; these lines
//! are the operator-facing narrative on stdout/stderr.

use colored::Colorize;

/// One numbered stage of a multi-stage pipeline, `3/8: ...`.
pub fn stage(step: usize, total: usize, text: &str) {
    println!(
        "{} {}",
        format!("{}/{}:", step, total).bold().blue(),
        text.blue()
    );
}

pub fn info(command: &str, text: &str) {
    println!("{} {}", command.bold().blue(), text.blue());
}

pub fn success(command: &str, text: &str) {
    println!("{} {}", command.bold().green(), text.green());
}

pub fn warn(command: &str, text: &str) {
    eprintln!("{} {}", command.bold().yellow(), text.yellow());
}

pub fn error(command: &str, text: &str) {
    eprintln!("{} {}", command.bold().red(), text.red());
}

/// Closing line after a completed command.
pub fn done() {
    println!();
    println!("{}", "Done!".bold().green());
}
