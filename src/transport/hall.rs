use super::xml::Element;
use crate::cards::Side;

/// One row of the hall listing.
#[derive(Debug, Clone)]
pub struct GameTable {
    pub table_id: String,
    pub name: String,
    pub format: String,
    pub status: String,
    pub game_id: Option<String>,
    pub players: Vec<TablePlayer>,
}

#[derive(Debug, Clone)]
pub struct TablePlayer {
    pub name: String,
    pub side: Option<Side>,
}

impl GameTable {
    /// Parses a `<table …>` element. The table name rides in the
    /// `tournament` attribute with a "Casual - " prefix; players arrive as a
    /// comma-separated list of `name (SIDE)`.
    pub fn from_element(element: &Element) -> Option<GameTable> {
        let table_id = element.attr("id")?.to_string();
        let name = element
            .attr_or("tournament", "Unnamed Table")
            .replace("Casual - ", "");
        let status = element.attr_or("status", "unknown").to_ascii_lowercase();
        let format = element.attr_or("format", "open").to_string();
        let game_id = element
            .attr("gameId")
            .filter(|id| !id.is_empty())
            .map(String::from);
        let players = element
            .attr_or("players", "")
            .split(',')
            .filter_map(TablePlayer::from_entry)
            .collect();
        Some(GameTable {
            table_id,
            name,
            format,
            status,
            game_id,
            players,
        })
    }

    pub fn has_player(&self, name: &str) -> bool {
        self.players.iter().any(|p| p.name == name)
    }

    pub fn opponent_of(&self, name: &str) -> Option<&TablePlayer> {
        self.players.iter().find(|p| p.name != name)
    }

    pub fn is_finished(&self) -> bool {
        self.status == "finished"
    }
}

impl TablePlayer {
    fn from_entry(entry: &str) -> Option<TablePlayer> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        let (name, side) = match entry.split_once(" (") {
            Some((name, rest)) => {
                let side = Side::try_from(rest.trim_end_matches(')')).ok();
                (name.trim(), side)
            }
            None => (entry, None),
        };
        Some(TablePlayer {
            name: name.to_string(),
            side,
        })
    }
}

/// A deck available on the server, either from the shared library or the
/// bot's own collection.
#[derive(Debug, Clone)]
pub struct DeckInfo {
    pub name: String,
    pub side: Side,
    pub is_library: bool,
}

impl DeckInfo {
    /// Parses the `<decks>` listing with `<darkDeck>`/`<lightDeck>` children.
    pub fn from_listing(root: &Element, is_library: bool) -> Vec<DeckInfo> {
        let mut decks = Vec::new();
        for (tag, side) in [("darkDeck", Side::Dark), ("lightDeck", Side::Light)] {
            for element in root.find_all(tag) {
                if !element.text.is_empty() {
                    decks.push(DeckInfo {
                        name: element.text.clone(),
                        side,
                        is_library,
                    });
                }
            }
        }
        decks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hall_row_parses_players_and_name() {
        let root = Element::parse(
            r#"<hall><table id="t9" tournament="Casual - Bot Table" status="WAITING"
                format="open" gameId="" players="bot (DARK),foe (LIGHT)"/></hall>"#,
        )
        .unwrap();
        let table = GameTable::from_element(root.find("table").unwrap()).unwrap();
        assert_eq!(table.table_id, "t9");
        assert_eq!(table.name, "Bot Table");
        assert_eq!(table.status, "waiting");
        assert!(table.game_id.is_none());
        assert!(table.has_player("bot"));
        let opponent = table.opponent_of("bot").unwrap();
        assert_eq!(opponent.name, "foe");
        assert_eq!(opponent.side, Some(Side::Light));
    }

    #[test]
    fn deck_listing_splits_by_side() {
        let root = Element::parse(
            "<decks><darkDeck>Hunt Down</darkDeck><lightDeck>Insight</lightDeck></decks>",
        )
        .unwrap();
        let decks = DeckInfo::from_listing(&root, true);
        assert_eq!(decks.len(), 2);
        assert_eq!(decks[0].side, Side::Dark);
        assert_eq!(decks[1].name, "Insight");
    }
}
