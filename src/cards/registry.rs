use super::card::Card;
use super::kind::CardKind;
use super::side::Side;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Read-only lookup from blueprint identifier to card metadata.
///
/// Built once at startup from the two per-side JSON corpora and shared by
/// reference between workers; never written afterwards.
#[derive(Debug, Default)]
pub struct CardRegistry {
    cards: HashMap<String, Card>,
}

#[derive(Deserialize)]
struct Corpus {
    #[serde(default)]
    cards: Vec<Entry>,
}

#[derive(Deserialize)]
struct Entry {
    #[serde(rename = "gempId", default)]
    gemp_id: String,
    #[serde(default)]
    front: Option<Face>,
    #[serde(default)]
    matching: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Face {
    #[serde(default)]
    title: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    sub_type: Option<String>,
    #[serde(default, deserialize_with = "stat")]
    power: Option<String>,
    #[serde(default, deserialize_with = "stat")]
    ability: Option<String>,
    #[serde(default, deserialize_with = "stat")]
    deploy: Option<String>,
    #[serde(default, deserialize_with = "stat")]
    forfeit: Option<String>,
    #[serde(default, deserialize_with = "stat")]
    destiny: Option<String>,
    #[serde(default, deserialize_with = "stat")]
    parsec: Option<String>,
    #[serde(default, deserialize_with = "stat")]
    hyperspeed: Option<String>,
    #[serde(default)]
    light_side_icons: Option<i32>,
    #[serde(default)]
    dark_side_icons: Option<i32>,
    #[serde(default)]
    gametext: String,
    #[serde(default)]
    lore: String,
    #[serde(default)]
    characteristics: Vec<String>,
    #[serde(default)]
    icons: Vec<String>,
}

/// The corpus is inconsistent about stat encoding: most are strings but some
/// sets use bare numbers. Accept either.
fn stat<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }
    Ok(Option::<Raw>::deserialize(de)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) if n.fract() == 0.0 => format!("{}", n as i64),
        Raw::Number(n) => format!("{}", n),
    }))
}

impl CardRegistry {
    /// Loads both corpora from `dir`. A missing file is an error; a malformed
    /// entry inside a file is logged and skipped.
    pub fn load(dir: &str) -> anyhow::Result<Self> {
        let mut registry = Self::default();
        registry.load_side(&Path::new(dir).join("Dark.json"), Side::Dark)?;
        registry.load_side(&Path::new(dir).join("Light.json"), Side::Light)?;
        log::info!("loaded {} cards from {}", registry.cards.len(), dir);
        Ok(registry)
    }

    fn load_side(&mut self, path: &Path, side: Side) -> anyhow::Result<()> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let corpus = serde_json::from_str::<Corpus>(&text)
            .map_err(|e| anyhow::anyhow!("cannot parse {}: {}", path.display(), e))?;
        let mut loaded = 0;
        for entry in corpus.cards {
            match Self::build(entry, side) {
                Some(card) => {
                    self.cards.insert(card.blueprint_id.clone(), card);
                    loaded += 1;
                }
                None => log::warn!("skipping malformed {} card entry", side),
            }
        }
        log::info!("loaded {} {} cards from {}", loaded, side, path.display());
        Ok(())
    }

    fn build(entry: Entry, side: Side) -> Option<Card> {
        let face = entry.front?;
        if entry.gemp_id.is_empty() {
            return None;
        }
        let is_unique = face.title.starts_with('•');
        let is_defensive_shield = face.gametext.contains("Defensive Shield");
        Some(Card {
            blueprint_id: entry.gemp_id,
            title: face.title,
            side: Some(side),
            kind: CardKind::from(face.kind.as_str()),
            sub_type: face.sub_type,
            power: face.power,
            ability: face.ability,
            deploy: face.deploy,
            forfeit: face.forfeit,
            destiny: face.destiny,
            parsec: face.parsec,
            hyperspeed: face.hyperspeed,
            light_side_icons: face.light_side_icons.unwrap_or(0),
            dark_side_icons: face.dark_side_icons.unwrap_or(0),
            gametext: face.gametext,
            lore: face.lore,
            characteristics: face.characteristics,
            icons: face.icons,
            matching: entry.matching,
            is_unique,
            is_defensive_shield,
        })
    }

    pub fn get(&self, blueprint_id: &str) -> Option<&Card> {
        self.cards.get(blueprint_id)
    }

    /// Display title, falling back to the blueprint id on a miss.
    pub fn title_of<'a>(&'a self, blueprint_id: &'a str) -> &'a str {
        self.get(blueprint_id)
            .map(|card| card.title.as_str())
            .unwrap_or(blueprint_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Registry seeded directly from cards; used by tests.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            cards: cards
                .into_iter()
                .map(|card| (card.blueprint_id.clone(), card))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_entries_index_by_gemp_id() {
        let json = r#"{"cards": [
            {"gempId": "1_249", "front": {"title": "•Devastator", "type": "Starship",
             "subType": "Capital", "power": "8", "deploy": 9, "icons": ["Pilot"]}},
            {"gempId": "", "front": {"title": "broken"}}
        ]}"#;
        let corpus = serde_json::from_str::<Corpus>(json).unwrap();
        let mut registry = CardRegistry::default();
        for entry in corpus.cards {
            if let Some(card) = CardRegistry::build(entry, Side::Dark) {
                registry.cards.insert(card.blueprint_id.clone(), card);
            }
        }
        assert_eq!(registry.len(), 1);
        let card = registry.get("1_249").unwrap();
        assert_eq!(card.title, "•Devastator");
        assert!(card.is_unique);
        assert_eq!(card.power_value(), 8);
        assert_eq!(card.deploy_value(), 9);
        assert!(card.has_permanent_pilot());
    }

    #[test]
    fn miss_falls_back_to_blueprint_id() {
        let registry = CardRegistry::default();
        assert_eq!(registry.title_of("9_99"), "9_99");
    }
}
