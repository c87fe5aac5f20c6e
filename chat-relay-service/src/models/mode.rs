use std::fmt;
use std::str::FromStr;

/// Client hint steering which model answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Always the text model; uploaded images are dropped.
    Text,
    /// Always the vision model.
    Image,
    /// Vision model when an image survived encoding, text model otherwise.
    #[default]
    Best,
}

impl FromStr for Mode {
    type Err = std::convert::Infallible;

    /// Case-insensitive; anything unrecognised behaves as `Best`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "text" => Mode::Text,
            "image" => Mode::Image,
            _ => Mode::Best,
        })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Text => "text",
            Mode::Image => "image",
            Mode::Best => "best",
        };
        f.write_str(s)
    }
}

/// Outcome of the selection policy for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: String,
    pub images_attached: bool,
}
