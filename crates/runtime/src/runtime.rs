//! High-level raid orchestrator.
//!
//! A [`Raid`] owns the session worker, wires up command/event channels, and
//! exposes a builder-based API for clients to play a raid round by round.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use battler_core::{
    CharacterCatalog, GameConfig, PhaseError, ProgressionContext, RaidResult, RaidSession,
    RoundController, RoundPhase,
};

use crate::api::{RaidHandle, Result, RuntimeError, SetupAction, SetupPlanner};
use crate::events::{Event, EventBus, Topic};
use crate::repository::SetupRepository;
use crate::workers::{CombatTiming, SessionWorker};

/// Raid configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RaidConfig {
    pub game_config: GameConfig,
    /// Wall-clock pacing of the combat tasks.
    pub timing: CombatTiming,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Setup actions taken per round before combat starts regardless.
    pub max_setup_actions: usize,
    /// Combat phases after which [`Raid::play`] closes the raid.
    pub max_rounds: Option<u32>,
    /// Save after every victory when a repository is configured.
    pub autosave: bool,
}

impl RaidConfig {
    /// Config whose combat timing follows `game_config.tick_ms`.
    pub fn with_game_config(game_config: GameConfig) -> Self {
        Self {
            timing: CombatTiming::for_tick_ms(game_config.tick_ms),
            game_config,
            ..Self::default()
        }
    }
}

impl Default for RaidConfig {
    fn default() -> Self {
        let game_config = GameConfig::default();
        Self {
            timing: CombatTiming::for_tick_ms(game_config.tick_ms),
            game_config,
            event_buffer_size: 256,
            command_buffer_size: 32,
            max_setup_actions: 64,
            max_rounds: None,
            autosave: false,
        }
    }
}

/// Main orchestrator of one raid
///
/// Design: Raid owns the session worker and coordinates rounds.
/// [`RaidHandle`] provides a cloneable façade for clients.
pub struct Raid {
    raid_id: String,
    config: RaidConfig,
    handle: RaidHandle,
    repository: Option<Arc<dyn SetupRepository>>,
    worker_handle: JoinHandle<()>,
}

impl Raid {
    /// Create a new raid builder
    pub fn builder() -> RaidBuilder {
        RaidBuilder::new()
    }

    pub fn raid_id(&self) -> &str {
        &self.raid_id
    }

    pub fn config(&self) -> &RaidConfig {
        &self.config
    }

    /// Get a cloneable handle to this raid
    pub fn handle(&self) -> RaidHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Persist the Setup-phase session. Fails outside Setup.
    pub async fn save(&self) -> Result<()> {
        let repository = self.repository.as_ref().ok_or(RuntimeError::NoRepository)?;
        let session = self.handle.setup_session().await?;
        repository.save(&self.raid_id, &session)?;
        info!(raid_id = %self.raid_id, round = session.round(), "raid saved");
        Ok(())
    }

    /// Play the raid to its end with `planner` making Setup decisions.
    ///
    /// The raid closes when the target round count is won, when
    /// `max_rounds` combat phases have been played, after a defeat the
    /// planner does not retry, or when the Board is empty at combat time.
    pub async fn play(&self, planner: &dyn SetupPlanner) -> Result<RaidResult> {
        loop {
            let view = self.handle.query().await?;
            match view.phase {
                RoundPhase::Terminated => return Ok(view.session.result()),
                RoundPhase::Combat => {
                    self.handle.await_resolution().await?;
                }
                RoundPhase::Resolution => {
                    if planner.retry_after_defeat(&view).await {
                        info!(round = view.session.round(), "retrying round");
                        self.handle.retry().await?;
                    } else {
                        return self.handle.terminate().await;
                    }
                }
                RoundPhase::Setup => {
                    let stats = view.session.stats();
                    let won = stats.rounds_won >= view.session.config().target_rounds;
                    let exhausted = self
                        .config
                        .max_rounds
                        .is_some_and(|max| stats.rounds_played >= max);
                    if won || exhausted {
                        return self.handle.terminate().await;
                    }

                    self.plan_setup(planner).await?;
                    match self.handle.play_round().await {
                        Ok(report) => {
                            if report.outcome.is_victory()
                                && self.config.autosave
                                && self.repository.is_some()
                            {
                                self.save().await?;
                            }
                        }
                        Err(RuntimeError::Phase(PhaseError::NoUnitsOnBoard)) => {
                            warn!(round = view.session.round(), "nothing to field, closing raid");
                            return self.handle.terminate().await;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }

    async fn plan_setup(&self, planner: &dyn SetupPlanner) -> Result<()> {
        for _ in 0..self.config.max_setup_actions {
            let view = self.handle.query().await?;
            let action = planner.next_action(&view).await?;
            let result = match action {
                SetupAction::StartCombat => return Ok(()),
                SetupAction::Purchase(slot) => self.handle.purchase(slot).await.map(drop),
                SetupAction::Refresh => self.handle.refresh().await.map(drop),
                SetupAction::BuyExperience => self.handle.buy_experience().await.map(drop),
                SetupAction::ToggleLock(slot) => self.handle.toggle_lock(slot).await.map(drop),
                SetupAction::Place { unit, destination } => {
                    self.handle.place(unit, destination).await.map(drop)
                }
                SetupAction::Sell(unit) => self.handle.sell(unit).await.map(drop),
            };
            if let Err(e) = result {
                if e.is_fatal() {
                    return Err(e);
                }
                debug!(?action, error = %e, "setup action rejected");
            }
        }
        warn!(
            limit = self.config.max_setup_actions,
            "setup action limit reached, starting combat"
        );
        Ok(())
    }

    /// Shutdown the raid gracefully
    ///
    /// Any running combat phase is cancelled. Outstanding handle clones keep
    /// the worker alive until they are dropped.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`Raid`] with flexible configuration.
pub struct RaidBuilder {
    config: RaidConfig,
    catalog: Option<Arc<CharacterCatalog>>,
    seed: Option<u64>,
    progression: ProgressionContext,
    repository: Option<Arc<dyn SetupRepository>>,
    raid_id: Option<String>,
    resume: bool,
}

impl RaidBuilder {
    fn new() -> Self {
        Self {
            config: RaidConfig::default(),
            catalog: None,
            seed: None,
            progression: ProgressionContext::default(),
            repository: None,
            raid_id: None,
            resume: false,
        }
    }

    /// Override raid configuration
    pub fn config(mut self, config: RaidConfig) -> Self {
        self.config = config;
        self
    }

    /// Character catalog; the bundled catalog is used when unset.
    pub fn catalog(mut self, catalog: impl Into<Arc<CharacterCatalog>>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Seed for every random draw in the raid; drawn at random when unset.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// External player progression, read once at raid start.
    pub fn progression(mut self, progression: ProgressionContext) -> Self {
        self.progression = progression;
        self
    }

    /// Set the repository used by [`Raid::save`] and [`resume`](Self::resume).
    pub fn repository(mut self, repository: impl SetupRepository + 'static) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    /// Share a repository with other raids.
    pub fn shared_repository(mut self, repository: Arc<dyn SetupRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Name the raid in its repository. Defaults to one derived from the seed.
    pub fn raid_id(mut self, raid_id: impl Into<String>) -> Self {
        self.raid_id = Some(raid_id.into());
        self
    }

    /// Continue the save named by [`raid_id`](Self::raid_id) instead of
    /// starting a new raid.
    pub fn resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Build the raid and spawn its session worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<Raid> {
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => Arc::new(
                battler_content::default_catalog()
                    .map_err(|e| RuntimeError::Content(e.to_string()))?,
            ),
        };
        let seed = self.seed.unwrap_or_else(rand::random);
        let raid_id = self
            .raid_id
            .unwrap_or_else(|| format!("raid-{:016x}", seed));

        let controller = if self.resume {
            let repository = self.repository.as_ref().ok_or(RuntimeError::NoRepository)?;
            let session: RaidSession = repository
                .load(&raid_id)?
                .ok_or_else(|| RuntimeError::SaveNotFound(raid_id.clone()))?;
            session
                .check_invariants(&catalog)
                .map_err(|source| RuntimeError::CorruptSave {
                    raid_id: raid_id.clone(),
                    source,
                })?;
            RoundController::resume(Arc::clone(&catalog), session, self.progression)
        } else {
            let session = RaidSession::new(self.config.game_config.clone(), &catalog, seed);
            info!(%raid_id, seed, "raid created");
            RoundController::new(Arc::clone(&catalog), session, self.progression)
        };

        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);

        let worker = SessionWorker::new(
            controller,
            self.config.timing,
            command_rx,
            event_bus.clone(),
        );
        let worker_handle = tokio::spawn(worker.run());

        Ok(Raid {
            raid_id,
            config: self.config,
            handle: RaidHandle::new(command_tx, event_bus),
            repository: self.repository,
            worker_handle,
        })
    }
}
