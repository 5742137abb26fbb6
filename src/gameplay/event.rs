use super::zone::Zone;
use crate::cards::Side;
use crate::decision::DecisionRequest;
use crate::transport::Element;
use std::collections::HashMap;

/// One parsed game event from the server's long-poll feed.
#[derive(Debug, Clone)]
pub enum GameEvent {
    PutCardInPlay {
        card_id: String,
        blueprint_id: String,
        zone: Zone,
        owner: String,
        location_index: Option<usize>,
        target_card_id: Option<String>,
        system_name: Option<String>,
    },
    RemoveCardInPlay {
        card_ids: Vec<String>,
    },
    MoveCardInPlay {
        card_id: String,
        zone: Option<Zone>,
        location_index: Option<usize>,
        target_card_id: Option<String>,
    },
    GameState(StateSync),
    Participant {
        name: String,
        side: Option<Side>,
        all: Vec<String>,
    },
    TurnChange {
        player: String,
    },
    PhaseChange {
        phase: String,
    },
    StartBattle,
    EndBattle,
    Message {
        text: String,
    },
    Decision(DecisionRequest),
    Chat {
        from: String,
        text: String,
    },
    GameEnd,
    Unknown {
        tag: String,
    },
}

/// Periodic snapshot carried by a GS event: generations, pile sizes per
/// player, and the per-location power arrays for both sides. Power values
/// may be negative; negatives encode force icons, not power, and are
/// filtered at the query layer.
#[derive(Debug, Default, Clone)]
pub struct StateSync {
    pub dark_generation: i32,
    pub light_generation: i32,
    pub zones: Vec<PlayerZones>,
    pub dark_power: Option<HashMap<usize, i32>>,
    pub light_power: Option<HashMap<usize, i32>>,
}

#[derive(Debug, Default, Clone)]
pub struct PlayerZones {
    pub name: String,
    pub force_pile: u32,
    pub used_pile: u32,
    pub reserve_deck: u32,
    pub lost_pile: u32,
    pub out_of_play: u32,
    pub hand: u32,
}

fn index_attr(element: &Element, key: &str) -> Option<usize> {
    element
        .attr(key)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v >= 0)
        .map(|v| v as usize)
}

fn optional_attr(element: &Element, key: &str) -> Option<String> {
    element.attr(key).filter(|v| !v.is_empty()).map(String::from)
}

impl GameEvent {
    /// Maps a `<ge type=…>` element to an event. Unknown tags come back as
    /// `Unknown` so the fold can log and continue; a structurally broken
    /// element comes back as `None`.
    pub fn from_element(element: &Element) -> Option<GameEvent> {
        let tag = element.attr_or("type", "");
        match tag {
            "PCIP" | "RCIP" | "PCIPAR" => Some(GameEvent::PutCardInPlay {
                card_id: element.attr("cardId")?.to_string(),
                blueprint_id: element.attr_or("blueprintId", "").to_string(),
                zone: Zone::from(element.attr_or("zone", "")),
                owner: element.attr_or("zoneOwnerId", "").to_string(),
                location_index: index_attr(element, "locationIndex"),
                target_card_id: optional_attr(element, "targetCardId"),
                system_name: optional_attr(element, "systemName"),
            }),
            "RCFP" | "RLFP" => {
                let mut card_ids = Vec::new();
                if let Some(id) = optional_attr(element, "cardId") {
                    card_ids.push(id);
                }
                if let Some(others) = element.attr("otherCardIds") {
                    card_ids.extend(
                        others
                            .split(',')
                            .map(str::trim)
                            .filter(|id| !id.is_empty())
                            .map(String::from),
                    );
                }
                match card_ids.is_empty() {
                    true => None,
                    false => Some(GameEvent::RemoveCardInPlay { card_ids }),
                }
            }
            "MCIP" => Some(GameEvent::MoveCardInPlay {
                card_id: element.attr("cardId")?.to_string(),
                zone: element.attr("zone").filter(|z| !z.is_empty()).map(Zone::from),
                location_index: index_attr(element, "locationIndex"),
                target_card_id: optional_attr(element, "targetCardId"),
            }),
            "GS" => Some(GameEvent::GameState(StateSync::from_element(element))),
            "P" => Some(GameEvent::Participant {
                name: element.attr_or("participantId", "").to_string(),
                side: element.attr("side").and_then(|s| Side::try_from(s).ok()),
                all: element
                    .attr_or("allParticipantIds", "")
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect(),
            }),
            "TC" => Some(GameEvent::TurnChange {
                player: element.attr("participantId")?.to_string(),
            }),
            "GPC" => Some(GameEvent::PhaseChange {
                phase: element.attr("phase")?.to_string(),
            }),
            "SB" | "SD" | "SLC" | "SA" => Some(GameEvent::StartBattle),
            "EB" | "EA" | "ED" | "ELC" => Some(GameEvent::EndBattle),
            "M" => Some(GameEvent::Message {
                text: element.attr_or("message", "").to_string(),
            }),
            "D" => DecisionRequest::from_element(element).map(GameEvent::Decision),
            "CHAT" => Some(GameEvent::Chat {
                from: element.attr_or("from", "").to_string(),
                text: element.attr_or("message", "").to_string(),
            }),
            "GAME_END" => Some(GameEvent::GameEnd),
            // animation-only events the board model does not track
            "IP" | "CAC" => None,
            other => Some(GameEvent::Unknown {
                tag: other.to_string(),
            }),
        }
    }
}

impl StateSync {
    fn from_element(element: &Element) -> StateSync {
        let mut sync = StateSync {
            dark_generation: element
                .attr_or("darkForceGeneration", "0")
                .parse()
                .unwrap_or(0),
            light_generation: element
                .attr_or("lightForceGeneration", "0")
                .parse()
                .unwrap_or(0),
            ..StateSync::default()
        };
        for zones in element.find_all("playerZones") {
            let count = |key: &str| zones.attr_or(key, "0").parse().unwrap_or(0);
            sync.zones.push(PlayerZones {
                name: zones.attr_or("name", "").to_string(),
                force_pile: count("FORCE_PILE"),
                used_pile: count("USED_PILE"),
                reserve_deck: count("RESERVE_DECK"),
                lost_pile: count("LOST_PILE"),
                out_of_play: count("OUT_OF_PLAY"),
                hand: count("HAND"),
            });
        }
        sync.dark_power = element.find("darkPowerAtLocations").map(Self::power_array);
        sync.light_power = element.find("lightPowerAtLocations").map(Self::power_array);
        sync
    }

    /// Power arrives as indexed attributes, `_0="-1"` or `locationIndex2="5"`;
    /// the digits in the attribute name are the location index.
    fn power_array(element: &Element) -> HashMap<usize, i32> {
        let mut array = HashMap::new();
        for (key, value) in &element.attrs {
            let index = key
                .chars()
                .filter(char::is_ascii_digit)
                .collect::<String>();
            if let (Ok(index), Ok(power)) = (index.parse::<usize>(), value.parse::<i32>()) {
                array.insert(index, power);
            }
        }
        array
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(xml: &str) -> GameEvent {
        GameEvent::from_element(&Element::parse(xml).unwrap()).unwrap()
    }

    #[test]
    fn put_card_event() {
        let parsed = event(
            r#"<ge type="PCIP" cardId="c1" blueprintId="1_10" zone="AT_LOCATION"
                zoneOwnerId="bot" locationIndex="2"/>"#,
        );
        match parsed {
            GameEvent::PutCardInPlay {
                card_id,
                zone,
                location_index,
                ..
            } => {
                assert_eq!(card_id, "c1");
                assert_eq!(zone, Zone::AtLocation);
                assert_eq!(location_index, Some(2));
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn negative_location_index_is_absent() {
        let parsed = event(r#"<ge type="PCIP" cardId="c1" zone="HAND" locationIndex="-1"/>"#);
        match parsed {
            GameEvent::PutCardInPlay { location_index, .. } => assert_eq!(location_index, None),
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn remove_event_gathers_other_ids() {
        let parsed = event(r#"<ge type="RCFP" cardId="c1" otherCardIds="c2, c3"/>"#);
        match parsed {
            GameEvent::RemoveCardInPlay { card_ids } => {
                assert_eq!(card_ids, vec!["c1", "c2", "c3"]);
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn state_sync_reads_indexed_power_attributes() {
        let parsed = event(
            r#"<ge type="GS" darkForceGeneration="4" lightForceGeneration="6">
                <playerZones name="bot" FORCE_PILE="5" RESERVE_DECK="30" HAND="8"/>
                <darkPowerAtLocations _0="-1" _2="5"/>
                <lightPowerAtLocations locationIndex1="3"/>
            </ge>"#,
        );
        match parsed {
            GameEvent::GameState(sync) => {
                assert_eq!(sync.dark_generation, 4);
                assert_eq!(sync.zones[0].force_pile, 5);
                let dark = sync.dark_power.unwrap();
                assert_eq!(dark.get(&0), Some(&-1));
                assert_eq!(dark.get(&2), Some(&5));
                assert_eq!(sync.light_power.unwrap().get(&1), Some(&3));
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn unknown_tag_survives() {
        let parsed = event(r#"<ge type="WEIRD"/>"#);
        assert!(matches!(parsed, GameEvent::Unknown { tag } if tag == "WEIRD"));
    }

    #[test]
    fn animation_events_drop() {
        let element = Element::parse(r#"<ge type="IP"/>"#).unwrap();
        assert!(GameEvent::from_element(&element).is_none());
    }
}
