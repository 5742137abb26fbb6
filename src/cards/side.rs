/// Which half of the Force a card or player belongs to.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Side {
    Dark,
    Light,
}

impl Side {
    pub fn opponent(&self) -> Self {
        match self {
            Side::Dark => Side::Light,
            Side::Light => Side::Dark,
        }
    }
}

impl TryFrom<&str> for Side {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(Side::Dark),
            "light" => Ok(Side::Light),
            other => Err(format!("unknown side: {}", other)),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Dark => write!(f, "dark"),
            Side::Light => write!(f, "light"),
        }
    }
}
