//! Fixed category partitions.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One of the fixed record partitions, each with its own snapshot file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    #[default]
    Work,
    Home,
    App,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Work, Category::Home, Category::App];

    /// Stable label shown to users.
    pub fn display_text(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Home => "Home",
            Self::App => "App",
        }
    }

    /// Stable snapshot name; the file on disk is `<store_name>.cache`.
    pub fn store_name(self) -> &'static str {
        match self {
            Self::Work => "work.store",
            Self::Home => "home.store",
            Self::App => "app.store",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_text())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(Self::Work),
            "home" => Ok(Self::Home),
            "app" => Ok(Self::App),
            other => Err(format!(
                "unsupported category `{other}`; expected work|home|app"
            )),
        }
    }
}
