//! Output formatting utilities

use bankprobe_core::{LineLevel, ReportLine};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg);
}

/// Print report lines, colored by level
///
/// Error lines go to stdout with the rest of the report so the output
/// reads in step order.
pub fn print_lines(lines: &[ReportLine]) {
    for line in lines {
        match line.level {
            LineLevel::Info => info(&line.text),
            LineLevel::Success => success(&line.text),
            LineLevel::Warning => warning(&line.text),
            LineLevel::Error => println!("{}", line.text.red()),
        }
    }
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}
