pub mod icons;
pub mod render;

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Neutral waiting indicator, drawn on stderr while the session or a remote
/// call resolves. Hidden when stderr is not a terminal.
pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .expect("spinner template is a valid static string"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

pub fn success(message: &str) {
    println!("{}{}", icons::CHECK, style(message).green());
}

pub fn warning(message: &str) {
    eprintln!("{}{}", icons::WARN, style(message).yellow());
}

pub fn failure(message: &str) {
    eprintln!("{}{}", icons::CROSS, style(message).red());
}
