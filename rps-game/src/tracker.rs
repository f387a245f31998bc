use crate::game::{Game, GameEvent, GameId};
use crate::{GameError, Result};
use std::collections::HashMap;

/// Local records of every tracked game, mutated only by confirmed events.
///
/// Live updates and rebuilds go through the same transitions: a rebuild is a
/// replay of the game's event history on an empty record.
#[derive(Debug, Default)]
pub struct GameTracker {
    games: HashMap<GameId, Game>,
    history: HashMap<GameId, Vec<GameEvent>>,
}

fn step(id: GameId, current: Option<Game>, event: &GameEvent) -> Result<Game> {
    match (current, event) {
        (None, GameEvent::Created { creator, stake }) => {
            tracing::info!("Tracking game {} created by {:?}", id, creator);
            Ok(Game::created(id, *creator, *stake))
        }
        (None, _) => Err(GameError::invalid_transition(id, None, event.name())),
        (Some(mut game), _) => {
            game.apply(event)?;
            Ok(game)
        }
    }
}

impl GameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: GameId) -> bool {
        self.games.contains_key(&id)
    }

    /// Cloned view of a game; callers never hold the authoritative record.
    pub fn snapshot(&self, id: GameId) -> Option<Game> {
        self.games.get(&id).cloned()
    }

    pub fn ids(&self) -> Vec<GameId> {
        let mut ids: Vec<GameId> = self.games.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Events applied to `id` so far, in order.
    pub fn history(&self, id: GameId) -> &[GameEvent] {
        self.history.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn apply(&mut self, id: GameId, event: GameEvent) -> Result<Game> {
        self.apply_all(id, vec![event])
    }

    /// Apply `events` in order, all or nothing.
    pub fn apply_all(&mut self, id: GameId, events: Vec<GameEvent>) -> Result<Game> {
        let mut scratch = self.games.get(&id).cloned();
        for event in &events {
            scratch = Some(step(id, scratch, event)?);
        }
        let Some(game) = scratch else {
            return Err(GameError::GameNotTracked(id));
        };

        self.games.insert(id, game.clone());
        self.history.entry(id).or_default().extend(events);
        Ok(game)
    }

    /// Replace the record of `id` with one rebuilt from its full history.
    /// The current record survives if the history does not replay cleanly.
    pub fn replay(&mut self, id: GameId, events: Vec<GameEvent>) -> Result<Game> {
        let mut scratch = None;
        for event in &events {
            scratch = Some(step(id, scratch, event)?);
        }
        let Some(game) = scratch else {
            return Err(GameError::GameNotTracked(id));
        };

        tracing::info!(
            "Rebuilt game {} from {} events: {:?}",
            id,
            events.len(),
            game.phase()
        );
        self.games.insert(id, game.clone());
        self.history.insert(id, events);
        Ok(game)
    }

    pub fn forget(&mut self, id: GameId) -> Option<Game> {
        self.history.remove(&id);
        self.games.remove(&id)
    }
}
