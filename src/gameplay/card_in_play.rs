use super::zone::Zone;
use crate::cards::Card;
use crate::cards::CardKind;

/// Runtime instance of a card the server has shown us, distinct from its
/// blueprint. Key metadata is denormalized at first sighting so logging and
/// scoring never need a registry round trip.
#[derive(Debug, Default, Clone)]
pub struct CardInPlay {
    pub card_id: String,
    pub blueprint_id: String,
    pub owner: String,
    pub zone: Zone,
    pub location_index: Option<usize>,
    pub attached_to: Option<String>,
    pub attachments: Vec<String>,

    pub title: String,
    pub kind: CardKind,
    pub power: i32,
    pub ability: i32,
    pub deploy: i32,
    pub forfeit: i32,
}

impl CardInPlay {
    pub fn new(card_id: &str, blueprint_id: &str, owner: &str, zone: Zone) -> Self {
        Self {
            card_id: card_id.to_string(),
            blueprint_id: blueprint_id.to_string(),
            owner: owner.to_string(),
            zone,
            ..Self::default()
        }
    }

    /// Copies display metadata from the registry card.
    pub fn absorb(&mut self, card: &Card) {
        self.title = card.title.clone();
        self.kind = card.kind;
        self.power = card.power_value();
        self.ability = card.ability_value();
        self.deploy = card.deploy_value();
        self.forfeit = card.forfeit_value();
    }

    pub fn display_name(&self) -> &str {
        match self.title.is_empty() {
            true => &self.blueprint_id,
            false => &self.title,
        }
    }
}
