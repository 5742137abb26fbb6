use crate::Score;

/// Deploy ordering rank. Locations first to open new targets, ships before
/// characters so pilots can board ships whose card ids exist by then.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub enum InstructionKind {
    Location,
    Ship,
    Character,
}

/// Where an instruction wants its card to land.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DeployTarget {
    pub location_index: usize,
    pub card_id: String,
    pub name: String,
}

/// One planned placement: a card from hand, a target, and optionally the
/// ship it should board. A pilot planned aboard a ship that deploys this
/// same phase starts with only the ship's blueprint; the event fold binds
/// the real card id when the ship lands.
#[derive(Debug, Clone)]
pub struct DeployInstruction {
    pub card_id: String,
    pub blueprint_id: String,
    pub title: String,
    pub kind: InstructionKind,
    pub target: Option<DeployTarget>,
    pub backup: Option<DeployTarget>,
    pub aboard_ship_blueprint: Option<String>,
    pub aboard_ship_card_id: Option<String>,
    pub done: bool,
}

/// The ordered deployment plan for one deploy phase.
#[derive(Debug, Default)]
pub struct DeployPlan {
    pub phase: String,
    pub instructions: Vec<DeployInstruction>,
}

impl DeployPlan {
    pub fn new(phase: &str, mut instructions: Vec<DeployInstruction>) -> Self {
        instructions.sort_by_key(|i| i.kind);
        Self {
            phase: phase.to_string(),
            instructions,
        }
    }

    /// Whether this plan was built for the given phase string; anything else
    /// is stale and must be rebuilt.
    pub fn is_current(&self, phase: &str) -> bool {
        !self.phase.is_empty() && self.phase == phase
    }

    pub fn pending(&self) -> impl Iterator<Item = &DeployInstruction> {
        self.instructions.iter().filter(|i| !i.done)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending().next().is_none()
    }

    /// The instruction to execute against the server's current offer.
    ///
    /// Types are honored in rank order, but when no pending instruction of
    /// the best rank appears in the offer the next rank proceeds instead;
    /// server-side reordering must not deadlock the plan.
    pub fn eligible(&self, offered_blueprints: &[String]) -> Option<&DeployInstruction> {
        for kind in [
            InstructionKind::Location,
            InstructionKind::Ship,
            InstructionKind::Character,
        ] {
            let mut ranked = self.pending().filter(|i| i.kind == kind).peekable();
            if ranked.peek().is_none() {
                continue;
            }
            if let Some(offered) = ranked.find(|i| offered_blueprints.contains(&i.blueprint_id)) {
                return Some(offered);
            }
            // planned but not offered: fall through to the next rank
        }
        None
    }

    pub fn instruction_for(&self, blueprint_id: &str) -> Option<&DeployInstruction> {
        self.pending().find(|i| i.blueprint_id == blueprint_id)
    }

    /// Called by the event fold whenever one of our cards lands at a
    /// location: retires the matching instruction and binds the new card id
    /// into any pilot instruction waiting for this ship blueprint.
    pub fn on_friendly_deploy(&mut self, card_id: &str, blueprint_id: &str) {
        if let Some(done) = self
            .instructions
            .iter_mut()
            .find(|i| !i.done && i.blueprint_id == blueprint_id)
        {
            done.done = true;
            log::debug!("plan: {} deployed as {}", done.title, card_id);
        }
        self.bind_ship(blueprint_id, card_id);
    }

    /// Resolves deferred pilot boarding once the ship's card id is known.
    pub fn bind_ship(&mut self, ship_blueprint: &str, ship_card_id: &str) {
        for instruction in self.instructions.iter_mut().filter(|i| {
            !i.done && i.aboard_ship_blueprint.as_deref() == Some(ship_blueprint)
        }) {
            instruction.aboard_ship_card_id = Some(ship_card_id.to_string());
            log::debug!(
                "plan: {} will board {} ({})",
                instruction.title,
                ship_blueprint,
                ship_card_id
            );
        }
    }

    /// Scoring hook for target selection: a big boost for a bound ship
    /// target, a graded boost for planned locations, a mild penalty for
    /// off-plan targets while targets remain.
    pub fn target_bonus(&self, candidate_card_id: &str) -> Score {
        if self
            .pending()
            .any(|i| i.aboard_ship_card_id.as_deref() == Some(candidate_card_id))
        {
            return crate::MATCHING_SHIP_BONUS;
        }
        let targets = self
            .pending()
            .filter(|i| i.aboard_ship_card_id.is_none())
            .filter_map(|i| i.target.as_ref())
            .collect::<Vec<_>>();
        match targets
            .iter()
            .position(|t| t.card_id == candidate_card_id)
        {
            Some(rank) => 50.0 - (rank as Score * 10.0),
            None if targets.is_empty() => 0.0,
            None => -20.0,
        }
    }

    /// One-line digest for logs and snapshots.
    pub fn summary(&self) -> String {
        let pending = self
            .pending()
            .map(|i| i.title.as_str())
            .collect::<Vec<_>>();
        match pending.is_empty() {
            true => String::new(),
            false => pending.join(" -> "),
        }
    }
}
