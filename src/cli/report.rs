//! Colored terminal reporting.

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

/// Print a section header.
pub fn header(title: &str) {
    println!("\n{}", title.bold());
}

/// Print aligned label/value rows.
///
/// Labels may contain CJK text, so alignment uses display width rather
/// than char count.
pub fn rows(entries: &[(&str, String)]) {
    let width = entries
        .iter()
        .map(|(label, _)| UnicodeWidthStr::width(*label))
        .max()
        .unwrap_or(0);
    for (label, value) in entries {
        let pad = width - UnicodeWidthStr::width(*label);
        println!("  {}{}  {}", label.dimmed(), " ".repeat(pad), value);
    }
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", "!".yellow(), message.yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.red());
}

pub fn file_changed(path: &str) {
    println!("  {} {}", "~".cyan(), path);
}
