/// Card type as printed on the card face.
#[derive(Debug, Default, Clone, Copy, Hash, Eq, PartialEq)]
pub enum CardKind {
    Character,
    Starship,
    Vehicle,
    Weapon,
    Device,
    Location,
    Effect,
    Interrupt,
    Objective,
    Creature,
    AdmiralsOrder,
    DefensiveShield,
    JediTest,
    Podracer,
    #[default]
    Unknown,
}

impl From<&str> for CardKind {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "character" => CardKind::Character,
            "starship" => CardKind::Starship,
            "vehicle" => CardKind::Vehicle,
            "weapon" => CardKind::Weapon,
            "device" => CardKind::Device,
            "location" => CardKind::Location,
            "effect" => CardKind::Effect,
            "interrupt" => CardKind::Interrupt,
            "objective" => CardKind::Objective,
            "creature" => CardKind::Creature,
            "admiral's order" => CardKind::AdmiralsOrder,
            "defensive shield" => CardKind::DefensiveShield,
            "jedi test" => CardKind::JediTest,
            "podracer" => CardKind::Podracer,
            _ => CardKind::Unknown,
        }
    }
}

impl std::fmt::Display for CardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CardKind::Character => "Character",
            CardKind::Starship => "Starship",
            CardKind::Vehicle => "Vehicle",
            CardKind::Weapon => "Weapon",
            CardKind::Device => "Device",
            CardKind::Location => "Location",
            CardKind::Effect => "Effect",
            CardKind::Interrupt => "Interrupt",
            CardKind::Objective => "Objective",
            CardKind::Creature => "Creature",
            CardKind::AdmiralsOrder => "Admiral's Order",
            CardKind::DefensiveShield => "Defensive Shield",
            CardKind::JediTest => "Jedi Test",
            CardKind::Podracer => "Podracer",
            CardKind::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}
