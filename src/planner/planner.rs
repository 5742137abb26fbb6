use super::plan::DeployInstruction;
use super::plan::DeployPlan;
use super::plan::DeployTarget;
use super::plan::InstructionKind;
use crate::cards::Card;
use crate::cards::CardRegistry;
use crate::cards::Side;
use crate::config::Config;
use crate::gameplay::BoardState;
use crate::gameplay::CardInPlay;
use crate::gameplay::LocationInPlay;
use crate::Score;

/// Builds the deployment plan at the start of each deploy phase.
///
/// The plan is a straight-line commitment: which cards leave the hand, in
/// what order, to which locations. Characters only ever target sites, lone
/// starships are never planned, and every candidate location is gated by
/// the card's own deploy restriction.
pub struct DeployPlanner;

struct Candidate<'a> {
    index: usize,
    location: &'a LocationInPlay,
    priority: Score,
}

impl DeployPlanner {
    pub fn build(board: &BoardState, registry: &CardRegistry, config: &Config) -> DeployPlan {
        let mut budget = board.my_zones.force_pile as i32 - 1;
        let mut instructions = Vec::new();
        let hand = board.hand_cards();

        let ground = Self::candidates(board, registry, config, false);
        let space = Self::candidates(board, registry, config, true);

        // locations open new targets, so they always make the plan
        for card in &hand {
            let Some(meta) = registry.get(&card.blueprint_id) else {
                continue;
            };
            if meta.is_location() && meta.deploy_value() <= budget {
                budget -= meta.deploy_value();
                instructions.push(Self::instruction(card, meta, InstructionKind::Location, None, None));
            }
        }

        // ships next: permanent pilots fly alone, bare hulls need a pilot
        // from hand planned aboard them
        let mut crewed = Vec::new();
        for card in &hand {
            let Some(ship) = registry.get(&card.blueprint_id) else {
                continue;
            };
            if !ship.is_starship() {
                continue;
            }
            let pilot = match ship.has_permanent_pilot() {
                true => None,
                false => match Self::best_pilot(&hand, registry, ship, budget - ship.deploy_value()) {
                    Some(pilot) => Some(pilot),
                    // a lone starship would sit powerless in space
                    None => continue,
                },
            };
            let (target, backup) = Self::targets_for(ship, &space, board);
            let Some(target) = target else {
                continue;
            };
            let combo = ship.deploy_value() + pilot.map(|p| p.1.deploy_value()).unwrap_or(0);
            if combo > budget {
                continue;
            }
            budget -= ship.deploy_value();
            instructions.push(Self::instruction(
                card,
                ship,
                InstructionKind::Ship,
                Some(target.clone()),
                backup.clone(),
            ));
            if let Some((pilot_card, pilot_meta)) = pilot {
                budget -= pilot_meta.deploy_value();
                let mut boarding = Self::instruction(
                    pilot_card,
                    pilot_meta,
                    InstructionKind::Character,
                    Some(target),
                    backup,
                );
                boarding.aboard_ship_blueprint = Some(ship.blueprint_id.clone());
                crewed.push(pilot_card.card_id.clone());
                instructions.push(boarding);
            }
        }

        // remaining characters target sites only, never systems
        for card in &hand {
            let Some(meta) = registry.get(&card.blueprint_id) else {
                continue;
            };
            if !meta.is_character() && !meta.is_vehicle() {
                continue;
            }
            if crewed.contains(&card.card_id) {
                continue;
            }
            if Self::is_pure_pilot(meta) {
                continue;
            }
            if meta.deploy_value() > budget {
                continue;
            }
            let (target, backup) = Self::targets_for(meta, &ground, board);
            let Some(target) = target else {
                continue;
            };
            budget -= meta.deploy_value();
            // vehicles share the ship rank so their pilots can still follow
            let rank = match meta.is_vehicle() {
                true => InstructionKind::Ship,
                false => InstructionKind::Character,
            };
            instructions.push(Self::instruction(card, meta, rank, Some(target), backup));
        }

        let plan = DeployPlan::new(&board.current_phase, instructions);
        match plan.instructions.is_empty() {
            true => log::info!("deploy plan: nothing worth deploying"),
            false => log::info!("deploy plan: {}", plan.summary()),
        }
        plan
    }

    fn instruction(
        card: &CardInPlay,
        meta: &Card,
        kind: InstructionKind,
        target: Option<DeployTarget>,
        backup: Option<DeployTarget>,
    ) -> DeployInstruction {
        DeployInstruction {
            card_id: card.card_id.clone(),
            blueprint_id: card.blueprint_id.clone(),
            title: meta.title.clone(),
            kind,
            target,
            backup,
            aboard_ship_blueprint: None,
            aboard_ship_card_id: None,
            done: false,
        }
    }

    /// Ranked deployable locations of one domain. Sites for ground, space
    /// locations for ships; placeholders are never targets.
    fn candidates<'a>(
        board: &'a BoardState,
        registry: &CardRegistry,
        config: &Config,
        space: bool,
    ) -> Vec<Candidate<'a>> {
        let mut ranked = board
            .locations
            .iter()
            .enumerate()
            .filter(|(_, loc)| !loc.is_placeholder())
            .filter(|(_, loc)| match space {
                true => loc.is_space,
                false => loc.is_site && loc.is_ground,
            })
            .map(|(index, location)| Candidate {
                index,
                location,
                priority: Self::location_priority(board, registry, config, index, location),
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        ranked
    }

    /// Best and backup target for a card, honoring its deploy restriction
    /// and skipping locations where we would be crushed on arrival.
    fn targets_for(
        card: &Card,
        candidates: &[Candidate<'_>],
        board: &BoardState,
    ) -> (Option<DeployTarget>, Option<DeployTarget>) {
        let mut picks = candidates
            .iter()
            .filter(|c| card.may_deploy_at(&board.system_name_at(c.index)))
            .filter(|c| c.priority > 0.0)
            .map(|c| DeployTarget {
                location_index: c.index,
                card_id: c.location.card_id.clone(),
                name: c.location.display_name().to_string(),
            });
        let target = picks.next();
        let backup = picks.next();
        (target, backup)
    }

    /// Strategic weight of a location as a deploy target. Opponent force
    /// icons are the primary draw (drains), reinforcing a thin friendly
    /// position comes next, and overwhelming enemy power disqualifies.
    fn location_priority(
        board: &BoardState,
        registry: &CardRegistry,
        config: &Config,
        index: usize,
        location: &LocationInPlay,
    ) -> Score {
        let my_power = board.my_power_at(index);
        let their_power = board.their_power_at(index);

        // outmatched beyond the danger threshold: never walk in
        if my_power - their_power <= config.battle_danger_threshold && their_power > 0 {
            return -100.0;
        }

        let their_icons = registry
            .get(&location.blueprint_id)
            .map(|card| match board.my_side {
                Some(Side::Dark) => card.light_side_icons,
                _ => card.dark_side_icons,
            })
            .unwrap_or(0);

        let mut score: Score = 1.0;
        if their_icons > 0 {
            score += 50.0 + their_icons as Score * 25.0;
        } else if their_power > 0 {
            score += match my_power > their_power {
                true => 15.0,
                false => 10.0,
            };
        } else if my_power > 0 {
            // alone already, nothing to gain
            score -= 50.0;
        }
        // a thin friendly position under threat wants reinforcement
        if my_power > 0 && my_power < config.deploy_threshold && their_power > 0 {
            score += 15.0 + (their_power - my_power) as Score;
        }
        // do not pile onto a location we already dominate
        if my_power >= their_power + config.deploy_threshold + 2 {
            score -= 40.0;
        }
        score
    }

    /// A weak pilot is worth more in a cockpit than on the ground.
    fn is_pure_pilot(card: &Card) -> bool {
        let power = card.power_value();
        (card.is_pilot() && !card.is_warrior() && power <= 4)
            || (card.is_pilot() && card.is_warrior() && power <= 3)
    }

    /// Highest-power affordable pilot for a bare hull, preferring the
    /// printed matching pair.
    fn best_pilot<'a>(
        hand: &[&'a CardInPlay],
        registry: &'a CardRegistry,
        ship: &Card,
        budget: i32,
    ) -> Option<(&'a CardInPlay, &'a Card)> {
        let mut pilots = hand
            .iter()
            .filter_map(|card| registry.get(&card.blueprint_id).map(|meta| (*card, meta)))
            .filter(|(_, meta)| meta.is_pilot() && meta.deploy_value() <= budget)
            .collect::<Vec<_>>();
        pilots.sort_by_key(|(_, meta)| {
            (
                !Self::is_matching_pair(meta, ship),
                -meta.power_value(),
            )
        });
        pilots.into_iter().next()
    }

    fn is_matching_pair(pilot: &Card, ship: &Card) -> bool {
        let strip = |s: &str| s.replace('•', "").trim().to_ascii_lowercase();
        let ship_title = strip(&ship.title);
        let pilot_title = strip(&pilot.title);
        let pilot_names_ship = pilot
            .matching
            .as_deref()
            .map(|m| strip(m) == ship_title || ship_title.contains(&strip(m)))
            .unwrap_or(false);
        let ship_names_pilot = ship
            .matching
            .as_deref()
            .map(|m| strip(m) == pilot_title || pilot_title.contains(&strip(m)))
            .unwrap_or(false);
        pilot_names_ship || ship_names_pilot
    }
}
