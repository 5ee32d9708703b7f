use crate::grid::{board_capacity, cell_index, in_bounds, next_tile};
use crate::{GameError, GameInstance};
use snake_types::{DeathCause, PlayerId, Tile, MAX_HEALTH};
use std::collections::{BTreeMap, HashMap};

/// What happened during one [`GameInstance::step`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub turn: u32,
    /// First cause found for each player that died this turn.
    pub deaths: BTreeMap<PlayerId, DeathCause>,
    pub meals: Vec<PlayerId>,
    pub food_spawned: usize,
}

impl TurnReport {
    pub fn died(&self, id: PlayerId) -> bool {
        self.deaths.contains_key(&id)
    }
}

impl GameInstance {
    /// Advances one turn using every living player's pending move.
    ///
    /// Deaths are judged against the state after all moves and applied together, so the
    /// outcome does not depend on player order. Fails without touching state when a living
    /// player has never been given a move.
    pub fn step(&mut self) -> Result<TurnReport, GameError> {
        if let Some(player) = self
            .players
            .iter()
            .find(|player| player.alive && player.pending_move.is_none())
        {
            return Err(GameError::MissingMove(player.id));
        }

        self.turn = self.turn.saturating_add(1);
        let mut report = TurnReport {
            turn: self.turn,
            ..TurnReport::default()
        };

        self.movement_phase(&mut report);
        self.collision_phase(&mut report);
        for id in report.deaths.keys() {
            if let Some(player) = self.players.iter_mut().find(|player| player.id == *id) {
                player.alive = false;
            }
        }

        self.rebuild_occupancy();
        report.food_spawned = self.replenish_food();
        self.refresh_over();
        self.debug_assert_consistent_state();
        Ok(report)
    }

    fn movement_phase(&mut self, report: &mut TurnReport) {
        let (width, height) = (self.width, self.height);
        let mut eaten: Vec<Tile> = Vec::new();

        for player in self.players.iter_mut().filter(|player| player.alive) {
            player.health = player.health.saturating_sub(1);
            let Some(head) = player.head() else {
                continue;
            };
            let next = player
                .pending_move
                .map_or(head, |mv| next_tile(head, mv));

            if !in_bounds(next, width, height) {
                queue_death(&mut report.deaths, player.id, DeathCause::OutOfBounds);
                // Length must still shrink like a normal move, opponents compare against it.
                if player.body.len() > 1 {
                    player.body.pop_back();
                }
            } else if self.food.contains(&next) {
                player.health = MAX_HEALTH;
                player.body.push_front(next);
                eaten.push(next);
                report.meals.push(player.id);
            } else {
                player.body.pop_back();
                player.body.push_front(next);
            }

            if player.health == 0 {
                queue_death(&mut report.deaths, player.id, DeathCause::Starvation);
            }
        }

        for tile in eaten {
            self.food.remove(&tile);
        }
    }

    fn collision_phase(&self, report: &mut TurnReport) {
        let mut body_cells = vec![false; board_capacity(self.width, self.height)];
        let mut heads: HashMap<Tile, Vec<usize>> = HashMap::new();

        for (idx, player) in self.players.iter().enumerate() {
            if !player.alive {
                continue;
            }
            let mut segments = player.body.iter();
            if let Some(&head) = segments.next() {
                heads.entry(head).or_default().push(idx);
            }
            for &segment in segments {
                if let Some(cell) = cell_index(segment, self.width, self.height) {
                    body_cells[cell] = true;
                }
            }
        }

        for (idx, player) in self.players.iter().enumerate() {
            if !player.alive {
                continue;
            }
            let Some(head) = player.head() else {
                continue;
            };

            let longest_rival = heads
                .get(&head)
                .into_iter()
                .flatten()
                .filter(|&&other| other != idx)
                .map(|&other| self.players[other].length())
                .max();
            if longest_rival.is_some_and(|rival| rival >= player.length()) {
                queue_death(&mut report.deaths, player.id, DeathCause::HeadToHead);
            }

            if cell_index(head, self.width, self.height).is_some_and(|cell| body_cells[cell]) {
                queue_death(&mut report.deaths, player.id, DeathCause::BodyCollision);
            }
        }
    }

    fn refresh_over(&mut self) {
        let total = self.players.len();
        let alive = self.alive_count();
        let over_now = (total > 1 && alive <= 1) || (total == 1 && alive == 0);
        self.over = self.over || over_now;
    }
}

fn queue_death(deaths: &mut BTreeMap<PlayerId, DeathCause>, id: PlayerId, cause: DeathCause) {
    deaths.entry(id).or_insert(cause);
}
