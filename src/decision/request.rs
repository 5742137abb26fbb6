use crate::transport::Element;

/// Server decision categories. Unrecognized types are carried verbatim so
/// the pipeline can still answer them with the safe default.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum DecisionKind {
    MultipleChoice,
    ActionChoice,
    CardActionChoice,
    CardSelection,
    ArbitraryCards,
    Integer,
    Unknown(String),
}

impl From<&str> for DecisionKind {
    fn from(s: &str) -> Self {
        match s {
            "MULTIPLE_CHOICE" => DecisionKind::MultipleChoice,
            "ACTION_CHOICE" => DecisionKind::ActionChoice,
            "CARD_ACTION_CHOICE" => DecisionKind::CardActionChoice,
            "CARD_SELECTION" => DecisionKind::CardSelection,
            "ARBITRARY_CARDS" => DecisionKind::ArbitraryCards,
            "INTEGER" => DecisionKind::Integer,
            other => DecisionKind::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionKind::MultipleChoice => write!(f, "MULTIPLE_CHOICE"),
            DecisionKind::ActionChoice => write!(f, "ACTION_CHOICE"),
            DecisionKind::CardActionChoice => write!(f, "CARD_ACTION_CHOICE"),
            DecisionKind::CardSelection => write!(f, "CARD_SELECTION"),
            DecisionKind::ArbitraryCards => write!(f, "ARBITRARY_CARDS"),
            DecisionKind::Integer => write!(f, "INTEGER"),
            DecisionKind::Unknown(tag) => write!(f, "{}", tag),
        }
    }
}

/// One choosable option inside a decision.
#[derive(Debug, Default, Clone)]
pub struct DecisionOption {
    pub option_id: String,
    pub display_text: String,
    pub card_id: Option<String>,
    pub blueprint_id: Option<String>,
    pub selectable: bool,
}

impl DecisionOption {
    /// Cancel/decline flavored options, recognized by their display text.
    pub fn is_cancelish(&self) -> bool {
        let text = self.display_text.to_ascii_lowercase();
        ["cancel", "done", "pass", "decline", "no response", "no further"]
            .iter()
            .any(|kw| text.starts_with(kw) || text.contains(&format!(" - {}", kw)))
    }
}

/// A server request for a bot response, decoded from a `<ge type="D">`
/// element. Parameters arrive as repeated positional `<parameter>` children;
/// parallel lists are zipped by index with permissive defaults.
#[derive(Debug, Default, Clone)]
pub struct DecisionRequest {
    pub decision_id: String,
    pub kind: DecisionKind,
    pub prompt: String,
    pub options: Vec<DecisionOption>,
    pub no_pass: bool,
    pub min: i64,
    pub max: i64,
    pub default_value: Option<i64>,
}

impl Default for DecisionKind {
    fn default() -> Self {
        DecisionKind::Unknown(String::new())
    }
}

impl DecisionRequest {
    pub fn from_element(element: &Element) -> Option<DecisionRequest> {
        let kind = DecisionKind::from(element.attr("decisionType")?);
        let decision_id = element.attr_or("id", "0").to_string();
        let prompt = element.attr_or("text", "").to_string();
        let mut no_pass = element.attr("noPass") == Some("true");
        let mut min = 0;
        let mut max = 0;
        let mut default_value = None;

        let mut action_ids = Vec::new();
        let mut action_texts = Vec::new();
        let mut card_ids = Vec::new();
        let mut blueprints = Vec::new();
        let mut selectable = Vec::new();
        let mut results = Vec::new();
        for parameter in element.find_all("parameter") {
            let value = parameter.attr_or("value", "");
            match parameter.attr_or("name", "") {
                "actionId" => action_ids.push(value.to_string()),
                "actionText" => action_texts.push(value.to_string()),
                "cardId" => card_ids.push(value.to_string()),
                "blueprintId" => blueprints.push(value.to_string()),
                "selectable" => selectable.push(value == "true"),
                "results" => results.push(value.to_string()),
                "noPass" => no_pass = value == "true",
                "min" => min = value.parse().unwrap_or(0),
                "max" => max = value.parse().unwrap_or(0),
                "defaultValue" => default_value = value.parse().ok(),
                _ => {}
            }
        }

        let count = action_ids.len().max(card_ids.len()).max(results.len());
        let options = (0..count)
            .map(|i| {
                let option_id = action_ids
                    .get(i)
                    .or_else(|| card_ids.get(i))
                    .cloned()
                    .unwrap_or_else(|| i.to_string());
                let display_text = action_texts
                    .get(i)
                    .or_else(|| results.get(i))
                    .cloned()
                    .unwrap_or_else(|| option_id.clone());
                DecisionOption {
                    option_id,
                    display_text,
                    card_id: card_ids.get(i).cloned().filter(|id| !id.is_empty()),
                    blueprint_id: blueprints.get(i).cloned().filter(|id| !id.is_empty()),
                    selectable: selectable.get(i).copied().unwrap_or(true),
                }
            })
            .collect();

        Some(DecisionRequest {
            decision_id,
            kind,
            prompt,
            options,
            no_pass,
            min,
            max,
            default_value,
        })
    }

    pub fn selectable_options(&self) -> Vec<&DecisionOption> {
        self.options.iter().filter(|o| o.selectable).collect()
    }

    pub fn option(&self, option_id: &str) -> Option<&DecisionOption> {
        self.options.iter().find(|o| o.option_id == option_id)
    }

    /// An empty answer is not accepted when noPass is set or a minimum
    /// selection count applies.
    pub fn must_choose(&self) -> bool {
        self.no_pass || self.min >= 1
    }

    pub fn first_selectable(&self) -> Option<&DecisionOption> {
        self.options.iter().find(|o| o.selectable)
    }

    pub fn first_non_cancel(&self) -> Option<&DecisionOption> {
        self.options
            .iter()
            .find(|o| o.selectable && !o.is_cancelish())
            .or_else(|| self.first_selectable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(xml: &str) -> DecisionRequest {
        DecisionRequest::from_element(&Element::parse(xml).unwrap()).unwrap()
    }

    #[test]
    fn action_choice_parses_options_and_flags() {
        let parsed = request(
            r#"<ge type="D" decisionType="CARD_ACTION_CHOICE" id="7" text="Optional responses">
                <parameter name="noPass" value="false"/>
                <parameter name="actionId" value="0"/>
                <parameter name="actionText" value="Deploy Vader"/>
                <parameter name="actionId" value="1"/>
                <parameter name="actionText" value="Cancel"/>
            </ge>"#,
        );
        assert_eq!(parsed.kind, DecisionKind::CardActionChoice);
        assert_eq!(parsed.decision_id, "7");
        assert!(!parsed.no_pass);
        assert_eq!(parsed.options.len(), 2);
        assert_eq!(parsed.options[0].display_text, "Deploy Vader");
        assert!(parsed.options[1].is_cancelish());
        assert_eq!(parsed.first_non_cancel().unwrap().option_id, "0");
    }

    #[test]
    fn selectable_bitmap_zips_with_cards() {
        let parsed = request(
            r#"<ge type="D" decisionType="CARD_SELECTION" id="3" text="Choose target">
                <parameter name="cardId" value="c1"/>
                <parameter name="cardId" value="c2"/>
                <parameter name="selectable" value="false"/>
                <parameter name="selectable" value="true"/>
            </ge>"#,
        );
        assert_eq!(parsed.options.len(), 2);
        assert!(!parsed.options[0].selectable);
        assert!(parsed.options[1].selectable);
        let selectable = parsed.selectable_options();
        assert_eq!(selectable.len(), 1);
        assert_eq!(selectable[0].option_id, "c2");
    }

    #[test]
    fn integer_decision_carries_bounds_and_default() {
        let parsed = request(
            r#"<ge type="D" decisionType="INTEGER" id="4" text="Choose amount">
                <parameter name="min" value="0"/>
                <parameter name="max" value="6"/>
                <parameter name="defaultValue" value="4"/>
            </ge>"#,
        );
        assert_eq!(parsed.kind, DecisionKind::Integer);
        assert_eq!(parsed.max, 6);
        assert_eq!(parsed.default_value, Some(4));
    }

    #[test]
    fn multiple_choice_results_become_indexed_options() {
        let parsed = request(
            r#"<ge type="D" decisionType="MULTIPLE_CHOICE" id="5" text="Start game?" noPass="true">
                <parameter name="results" value="Yes"/>
                <parameter name="results" value="No"/>
            </ge>"#,
        );
        assert!(parsed.no_pass);
        assert_eq!(parsed.options.len(), 2);
        assert_eq!(parsed.options[0].option_id, "0");
        assert_eq!(parsed.options[1].display_text, "No");
    }

    #[test]
    fn min_one_means_must_choose() {
        let parsed = request(
            r#"<ge type="D" decisionType="ARBITRARY_CARDS" id="6" text="Choose one">
                <parameter name="min" value="1"/>
                <parameter name="cardId" value="c1"/>
            </ge>"#,
        );
        assert!(parsed.must_choose());
    }
}
