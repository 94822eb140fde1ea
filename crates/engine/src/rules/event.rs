/// The interaction an event notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Activate,
    Hit,
    Grab,
    Release,
}

impl EventKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "activate" => Some(Self::Activate),
            "hit" => Some(Self::Hit),
            "grab" => Some(Self::Grab),
            "release" => Some(Self::Release),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "Activate",
            Self::Hit => "Hit",
            Self::Grab => "Grab",
            Self::Release => "Release",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
