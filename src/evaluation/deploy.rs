use super::action::EvaluatedAction;
use super::evaluator::Evaluator;
use crate::cards::Card;
use crate::cards::CardKind;
use crate::cards::Side;
use crate::decision::DecisionKind;
use crate::gameplay::BoardState;
use crate::gameplay::LocationInPlay;
use crate::players::BrainContext;
use crate::Score;

/// Blueprint id embedded in the server's action HTML, e.g.
/// `Deploy <div class='cardHint' value='7_305'>•OS-72-1</div>`.
pub fn blueprint_hint(text: &str) -> Option<String> {
    let start = text.find("value='")? + "value='".len();
    let rest = &text[start..];
    let end = rest.find('\'')?;
    Some(rest[..end].to_string())
}

/// Scores deploy-phase decisions: which card leaves the hand, and where it
/// lands. Consults the in-flight deployment plan for ordering and target
/// bonuses; everything else is local card and board arithmetic.
pub struct DeployEvaluator;

impl Evaluator for DeployEvaluator {
    fn name(&self) -> &str {
        "deploy"
    }

    fn can_evaluate(&self, context: &BrainContext<'_>) -> bool {
        let prompt = context.request.prompt.to_ascii_lowercase();
        match context.request.kind {
            DecisionKind::CardSelection => {
                prompt.contains("deploy") || prompt.contains("where to")
            }
            DecisionKind::CardActionChoice | DecisionKind::ActionChoice => {
                context.board.current_phase.to_ascii_lowercase().contains("deploy")
                    || prompt.contains("deploy")
            }
            DecisionKind::ArbitraryCards => {
                prompt.contains("deploy")
                    || prompt.contains("starting location")
                    || prompt.contains("reserve deck")
            }
            _ => false,
        }
    }

    fn evaluate(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        match context.request.kind {
            DecisionKind::CardActionChoice | DecisionKind::ActionChoice => {
                self.deploy_actions(context)
            }
            DecisionKind::CardSelection => self.target_selection(context),
            DecisionKind::ArbitraryCards => self.card_selection(context),
            _ => Vec::new(),
        }
    }
}

impl DeployEvaluator {
    /// "Choose Deploy action or Pass": rank the deployable cards.
    fn deploy_actions(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let mut actions = Vec::new();
        let offer = context
            .request
            .options
            .iter()
            .filter_map(|o| {
                blueprint_hint(&o.display_text).or_else(|| o.blueprint_id.clone())
            })
            .collect::<Vec<_>>();
        let plan = context.board.plan.lock().ok();
        let next = plan
            .as_ref()
            .filter(|plan| plan.is_current(&context.board.current_phase))
            .and_then(|plan| plan.eligible(&offer))
            .map(|i| i.blueprint_id.clone());

        for option in context.request.options.iter().filter(|o| o.selectable) {
            let text = &option.display_text;
            if !text.contains("Deploy") && !text.contains("Reserve Deck") {
                continue;
            }
            let mut action = EvaluatedAction::new(&option.option_id, 50.0, text);
            if text.contains("Reserve Deck") {
                action.add_reason("reserve deck deploy invites loops", -30.0);
                actions.push(action);
                continue;
            }
            let blueprint = blueprint_hint(text).or_else(|| option.blueprint_id.clone());
            match blueprint.as_deref().and_then(|bp| context.registry.get(bp)) {
                Some(card) => {
                    Self::score_card(&mut action, card, context);
                    if let (Some(plan), Some(bp)) = (plan.as_ref(), blueprint.as_deref()) {
                        if plan.is_current(&context.board.current_phase) {
                            match (&next, plan.instruction_for(bp)) {
                                (Some(next_bp), _) if next_bp == bp => {
                                    action.add_reason("next in plan", 60.0)
                                }
                                (_, Some(_)) => action.add_reason("planned for later", -15.0),
                                (_, None) if !plan.instructions.is_empty() => {
                                    action.add_reason("held back by plan", -40.0)
                                }
                                _ => {}
                            }
                        }
                    }
                }
                None => action.add_reason("card metadata missing", -10.0),
            }
            actions.push(action);
        }
        actions
    }

    /// "Choose where to deploy X": rank the offered targets. Options that
    /// resolve to board locations are scored on drain and contest math; a
    /// ship bound by the plan collects the boarding bonus through
    /// `target_bonus` and outranks the system fallback.
    fn target_selection(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let mut actions = Vec::new();
        let deploying = blueprint_hint(&context.request.prompt)
            .and_then(|bp| context.registry.get(&bp).cloned());
        let plan = context.board.plan.lock().ok();
        for option in context.request.options.iter().filter(|o| o.selectable) {
            let candidate = option.card_id.as_deref().unwrap_or(&option.option_id);
            let mut action = EvaluatedAction::new(
                &option.option_id,
                50.0,
                &format!("Deploy to {}", candidate),
            );
            if let Some(plan) = plan.as_ref() {
                let bonus = plan.target_bonus(candidate);
                if bonus != 0.0 {
                    action.add_reason("plan target", bonus);
                }
            }
            if let Some(location) = context.board.location_by_card_id(candidate) {
                action.display_text = format!("Deploy to {}", location.display_name());
                let system = LocationInPlay::system_of(location.display_name());
                match deploying
                    .as_ref()
                    .map(|card| card.may_deploy_at(&system))
                    .unwrap_or(true)
                {
                    false => action.add_reason("deploy restriction forbids this system", -999.0),
                    true => Self::score_location(
                        &mut action,
                        context.board,
                        location,
                        location.location_index,
                        context,
                    ),
                }
            }
            actions.push(action);
        }
        actions
    }

    /// Starting locations and reserve-deck picks.
    fn card_selection(&self, context: &BrainContext<'_>) -> Vec<EvaluatedAction> {
        let mut actions = Vec::new();
        let prompt = context.request.prompt.to_ascii_lowercase();
        for option in context.request.options.iter().filter(|o| o.selectable) {
            let mut action =
                EvaluatedAction::new(&option.option_id, 50.0, &option.display_text);
            if let Some(card) = option
                .blueprint_id
                .as_deref()
                .and_then(|bp| context.registry.get(bp))
            {
                action.display_text = format!("Select {}", card.title);
                if prompt.contains("reserve deck") {
                    if card.is_location() {
                        action.add_reason("location from reserve", 10.0);
                    }
                    if card.is_defensive_shield {
                        action.add_reason("defensive shield", 5.0);
                    }
                }
                if prompt.contains("starting location") {
                    let own_icons = match context.board.my_side {
                        Some(Side::Dark) => card.dark_side_icons,
                        _ => card.light_side_icons,
                    };
                    if own_icons > 0 {
                        action.add_reason("own force icons", own_icons as Score * 8.0);
                    }
                }
            }
            actions.push(action);
        }
        actions
    }

    /// Value of the card itself, independent of destination.
    fn score_card(action: &mut EvaluatedAction, card: &Card, context: &BrainContext<'_>) {
        let board = context.board;
        if card.is_location() {
            action.add_reason("location opens the board", 999.0);
            if board.my_generation() < context.config.force_gen_target {
                action.add_reason("force generation below target", 25.0);
            }
            return;
        }
        if card.kind == CardKind::Creature {
            action.add_reason("creature", 999.0);
            return;
        }
        if card.is_weapon() || card.is_device() {
            match Self::unarmed_warrior_present(board) {
                true => action.add_reason("warrior waiting for a weapon", 10.0),
                false => action.add_reason("no warrior to carry it", -10.0),
            }
            return;
        }
        if (card.is_starship() || card.is_vehicle()) && !card.has_permanent_pilot() {
            if card.is_starship() && !board.locations.iter().any(|l| l.is_space) {
                action.add_reason("no space location on the board", -999.0);
                return;
            }
            match Self::pilot_in_hand(board) {
                true => action.add_reason(
                    "bare hull with a pilot available",
                    10.0 * card.power_value() as Score,
                ),
                false => action.add_reason("bare hull, no pilot", -10.0),
            }
            return;
        }
        let power = card.power_value();
        let pure_pilot = card.is_pilot() && power <= 4 && !card.is_warrior()
            || card.is_pilot() && card.is_warrior() && power <= 3;
        if pure_pilot {
            action.add_reason("pure pilot, save for a cockpit", -10.0);
        } else {
            let force_after = board.my_zones.force_pile as i32 - card.deploy_value();
            match force_after >= 1 {
                true => action.add_reason("worth the force", 10.0 * power as Score),
                false => action.add_reason("would drain the force pile", -10.0),
            }
        }
        if power >= 5 {
            action.add_reason("high power", 10.0);
        } else if power >= 3 {
            action.add_reason("decent power", 5.0);
        }
        let ability = card.ability_value();
        if ability >= 4 {
            action.add_reason("high ability", 8.0);
        } else if ability >= 2 {
            action.add_reason("some ability", 4.0);
        }
    }

    /// Value of a destination: opponent icons mean drains, contests beat
    /// piling onto a location already won.
    fn score_location(
        action: &mut EvaluatedAction,
        board: &BoardState,
        location: &LocationInPlay,
        index: usize,
        context: &BrainContext<'_>,
    ) {
        let my = board.my_power_at(index);
        let their = board.their_power_at(index);
        let their_icons = context
            .registry
            .get(&location.blueprint_id)
            .map(|card| match board.my_side {
                Some(Side::Dark) => card.light_side_icons,
                _ => card.dark_side_icons,
            })
            .unwrap_or(0);
        if their_icons > 0 {
            action.add_reason("can drain here", 15.0 + their_icons as Score * 5.0);
        }
        let diff = my - their;
        if diff >= 8 {
            action.add_reason("overkill", -40.0 - (diff - 8) as Score * 2.0);
        } else if diff >= 4 {
            action.add_reason("already controlling", -20.0);
        }
        if their > 0 && diff < 0 {
            action.add_reason("contest opponent", 15.0 + (-diff) as Score * 1.5);
        } else if their > 0 && diff < 4 {
            action.add_reason("close contest", 8.0);
        }
        if my == 0 && their == 0 && their_icons > 0 {
            action.add_reason("establish presence with drain", 10.0);
        }
    }

    fn unarmed_warrior_present(board: &BoardState) -> bool {
        board.cards.values().any(|card| {
            card.owner == board.my_name
                && matches!(card.zone, crate::gameplay::Zone::AtLocation)
                && card.kind == CardKind::Character
                && card.attachments.is_empty()
        })
    }

    fn pilot_in_hand(board: &BoardState) -> bool {
        board
            .hand_cards()
            .iter()
            .any(|card| card.kind == CardKind::Character && card.ability > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRegistry;
    use crate::config::Config;
    use crate::decision::DecisionOption;
    use crate::decision::DecisionRequest;
    use crate::players::GameHistory;

    #[test]
    fn blueprint_hint_reads_card_html() {
        assert_eq!(
            blueprint_hint("Deploy <div class='cardHint' value='7_305'>•OS-72-1</div>"),
            Some("7_305".to_string())
        );
        assert_eq!(blueprint_hint("Deploy something plain"), None);
    }

    fn restricted_registry() -> CardRegistry {
        CardRegistry::from_cards(vec![
            Card {
                blueprint_id: "J1".into(),
                title: "•Jawa".into(),
                kind: CardKind::Character,
                power: Some("2".into()),
                deploy: Some("1".into()),
                gametext: "Deploys only on Tatooine.".into(),
                ..Card::default()
            },
            Card {
                blueprint_id: "CS1".into(),
                title: "Coruscant: Docks".into(),
                kind: CardKind::Location,
                sub_type: Some("Site".into()),
                icons: vec!["Exterior".into()],
                light_side_icons: 2,
                ..Card::default()
            },
            Card {
                blueprint_id: "TS1".into(),
                title: "Tatooine: Mos Eisley".into(),
                kind: CardKind::Location,
                sub_type: Some("Site".into()),
                icons: vec!["Exterior".into()],
                light_side_icons: 2,
                ..Card::default()
            },
        ])
    }

    fn board_with_sites(registry: &CardRegistry) -> BoardState {
        let mut board = BoardState::new("bot");
        board.my_side = Some(Side::Dark);
        for (i, (card_id, blueprint)) in [("c1", "CS1"), ("t1", "TS1")].iter().enumerate() {
            let meta = registry.get(blueprint).unwrap();
            board.add_location(LocationInPlay {
                card_id: card_id.to_string(),
                blueprint_id: blueprint.to_string(),
                owner: "foe".into(),
                location_index: i,
                system_name: LocationInPlay::system_of(&meta.title),
                site_name: meta.title.clone(),
                is_site: true,
                is_space: false,
                is_ground: true,
                my_cards: Vec::new(),
                their_cards: Vec::new(),
            });
        }
        board
    }

    #[test]
    fn restricted_card_scores_forbidden_system_at_or_below_zero() {
        // a Coruscant option for a Tatooine-only card never outranks
        // anything legal
        let registry = restricted_registry();
        let board = board_with_sites(&registry);
        let history = GameHistory::default();
        let config = Config::sample();
        let request = DecisionRequest {
            decision_id: "5".into(),
            kind: DecisionKind::CardSelection,
            prompt: "Choose where to deploy <div class='cardHint' value='J1'>•Jawa</div>".into(),
            options: vec![
                DecisionOption {
                    option_id: "c1".into(),
                    display_text: "c1".into(),
                    card_id: Some("c1".into()),
                    selectable: true,
                    ..DecisionOption::default()
                },
                DecisionOption {
                    option_id: "t1".into(),
                    display_text: "t1".into(),
                    card_id: Some("t1".into()),
                    selectable: true,
                    ..DecisionOption::default()
                },
            ],
            no_pass: true,
            ..DecisionRequest::default()
        };
        let context = BrainContext {
            board: &board,
            registry: &registry,
            request: &request,
            history: &history,
            config: &config,
        };
        let actions = DeployEvaluator.evaluate(&context);
        let coruscant = actions.iter().find(|a| a.action_id == "c1").unwrap();
        let tatooine = actions.iter().find(|a| a.action_id == "t1").unwrap();
        assert!(coruscant.score <= 0.0);
        assert!(tatooine.score > coruscant.score);
    }

    #[test]
    fn bound_ship_target_outranks_system_fallback() {
        // the offered targets include the landed ship's card id
        let registry = restricted_registry();
        let mut board = board_with_sites(&registry);
        {
            let mut plan = board.plan.lock().unwrap();
            *plan = crate::planner::DeployPlan::new(
                "",
                vec![crate::planner::DeployInstruction {
                    card_id: "h2".into(),
                    blueprint_id: "P".into(),
                    title: "pilot".into(),
                    kind: crate::planner::InstructionKind::Character,
                    target: Some(crate::planner::DeployTarget {
                        location_index: 0,
                        card_id: "c1".into(),
                        name: "Coruscant: Docks".into(),
                    }),
                    backup: None,
                    aboard_ship_blueprint: Some("B".into()),
                    aboard_ship_card_id: Some("331".into()),
                    done: false,
                }],
            );
        }
        let history = GameHistory::default();
        let config = Config::sample();
        let request = DecisionRequest {
            decision_id: "6".into(),
            kind: DecisionKind::CardSelection,
            prompt: "Choose where to deploy pilot".into(),
            options: vec![
                DecisionOption {
                    option_id: "331".into(),
                    display_text: "331".into(),
                    card_id: Some("331".into()),
                    selectable: true,
                    ..DecisionOption::default()
                },
                DecisionOption {
                    option_id: "c1".into(),
                    display_text: "c1".into(),
                    card_id: Some("c1".into()),
                    selectable: true,
                    ..DecisionOption::default()
                },
            ],
            no_pass: true,
            ..DecisionRequest::default()
        };
        let context = BrainContext {
            board: &board,
            registry: &registry,
            request: &request,
            history: &history,
            config: &config,
        };
        let actions = DeployEvaluator.evaluate(&context);
        let ship = actions.iter().find(|a| a.action_id == "331").unwrap();
        let system = actions.iter().find(|a| a.action_id == "c1").unwrap();
        assert!(ship.score > system.score);
        assert!(ship.score - system.score >= 100.0);
    }
}
