/// Coarse bucket a card occupies on the server's board model.
#[derive(Debug, Default, Clone, Hash, Eq, PartialEq)]
pub enum Zone {
    Hand,
    AtLocation,
    Attached,
    Locations,
    SideOfTable,
    ForcePile,
    UsedPile,
    LostPile,
    ReserveDeck,
    OutOfPlay,
    Stacked,
    #[default]
    Unknown,
    Other(String),
}

impl From<&str> for Zone {
    fn from(s: &str) -> Self {
        match s {
            "HAND" => Zone::Hand,
            "AT_LOCATION" => Zone::AtLocation,
            "ATTACHED" => Zone::Attached,
            "LOCATIONS" => Zone::Locations,
            "SIDE_OF_TABLE" => Zone::SideOfTable,
            "FORCE_PILE" => Zone::ForcePile,
            "USED_PILE" => Zone::UsedPile,
            "LOST_PILE" => Zone::LostPile,
            "RESERVE_DECK" => Zone::ReserveDeck,
            "OUT_OF_PLAY" => Zone::OutOfPlay,
            "STACKED" | "STACKED_ON" => Zone::Stacked,
            "" => Zone::Unknown,
            other => Zone::Other(other.to_string()),
        }
    }
}
