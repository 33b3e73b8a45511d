use colored::Colorize;
use core::fmt;
use once_cell::sync::Lazy;
use regex::Regex;

pub static SUCCESS: Lazy<colored::ColoredString> = Lazy::new(|| "[VAA]".green());
pub static FAIL: Lazy<colored::ColoredString> = Lazy::new(|| "[VAA]".red());
pub static WARN: Lazy<colored::ColoredString> = Lazy::new(|| "[VAA]".yellow());

static ANSI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1B\[([0-9;]+)m").unwrap());

#[derive(Clone, Debug)]
pub struct ColoredString(pub colored::ColoredString);

impl serde::Serialize for ColoredString {
    fn serialize<S: serde::ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let stripped_string = strip_ansi(&self.0.to_string());
        serializer.serialize_str(stripped_string.trim())
    }
}

impl From<colored::ColoredString> for ColoredString {
    fn from(cs: colored::ColoredString) -> Self { ColoredString(cs) }
}

impl fmt::Display for ColoredString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

pub fn strip_ansi(text: &str) -> String { ANSI.replace_all(text, "").to_string() }

pub fn status(running: bool) -> ColoredString {
    match running {
        true => "online   ".green().bold().into(),
        false => "stopped   ".red().bold().into(),
    }
}
