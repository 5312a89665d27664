//! Odisea Zombie Game Engine
//!
//! Rules engine for a single-player zombie survival card game: the day/step
//! cycle, card zones, and the dice-driven resolution of recruitment, conflict,
//! risk, and defense. Rendering, input, and asset handling belong to the host.

pub mod card;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod day;
pub mod deck;
pub mod dice;
pub mod error;
pub mod resolution;
pub mod seed;
pub mod session;
pub mod state;

use anyhow::Context;
use std::sync::Arc;

// Re-export commonly used types
pub use card::{Card, CardId, CardKind, TableEntry, TableFlags};
pub use catalog::{CardCatalog, CardGroup, CardRecord, CatalogData, CatalogError, normalize_name};
pub use config::{RulesConfig, RulesConfigError};
pub use day::DayStep;
pub use deck::{DeckState, Zone, shuffled};
pub use dice::{DieSource, ScriptedDice, SeededDice, derive_stream_seed};
pub use error::{EngineError, EngineResult};
pub use resolution::{
    ConflictOutcome, ConflictReport, EventAcknowledgment, RecruitOutcome, RecruitPlacement,
    RevealOutcome, RoundStatus,
};
pub use seed::{ShareCode, ShareCodeError};
pub use session::{GameSession, PlayOutcome};
pub use state::{GameOutcome, GameSnapshot, GameState, PendingKind, PendingResolution};

/// Trait for abstracting catalog loading.
/// Hosts read card data from wherever they keep it and hand it over here.
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the raw card groups.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog data cannot be loaded.
    fn load_catalog(&self) -> Result<CatalogData, Self::Error>;
}

/// Loader backed by the catalog compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalogLoader;

impl CatalogLoader for StaticCatalogLoader {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<CatalogData, Self::Error> {
        Ok(CatalogData::from_json(include_str!("../assets/catalog.json"))?)
    }
}

/// Builds sessions from a loader and a rules configuration.
pub struct GameEngine<L>
where
    L: CatalogLoader,
{
    loader: L,
    config: RulesConfig,
}

impl<L> GameEngine<L>
where
    L: CatalogLoader,
{
    pub const fn new(loader: L, config: RulesConfig) -> Self {
        Self { loader, config }
    }

    #[must_use]
    pub const fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Load and index the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails, ids collide, or the catalog has no
    /// deck cards.
    pub fn load_catalog(&self) -> anyhow::Result<CardCatalog> {
        let data = self
            .loader
            .load_catalog()
            .context("loading card catalog")?;
        let catalog = CardCatalog::build(&data).context("indexing card catalog")?;
        anyhow::ensure!(
            !catalog.deck_ids().is_empty(),
            "card catalog has no characters or events"
        );
        Ok(catalog)
    }

    /// Deal a new session with `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules configuration is invalid or the catalog
    /// cannot be loaded.
    pub fn create_session(&self, seed: u64) -> anyhow::Result<GameSession> {
        self.config.validate().context("validating rules config")?;
        let catalog = Arc::new(self.load_catalog()?);
        Ok(GameSession::new(catalog, self.config.clone(), seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl CatalogLoader for FixtureLoader {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<CatalogData, Self::Error> {
            let data = CatalogData::from_json(
                r#"{ "Personajes": { "Ana": { "id": 1, "Amenaza": 2, "Conflicto": 3 } },
                     "Eventos": { "Niebla": {} },
                     "Talentos": { "Sigilo": {} },
                     "Iniciativa": { "Vanguardia": {} } }"#,
            )
            .unwrap();
            Ok(data)
        }
    }

    #[derive(Clone, Copy, Default)]
    struct EmptyLoader;

    impl CatalogLoader for EmptyLoader {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<CatalogData, Self::Error> {
            Ok(CatalogData::default())
        }
    }

    #[test]
    fn engine_deals_sessions_from_the_loader() {
        let engine = GameEngine::new(FixtureLoader, RulesConfig::default());
        let mut session = engine.create_session(0xABCD).unwrap();
        assert_eq!(session.state().deck.draw_pile().len(), 2);
        assert_eq!(
            session.state().deck.active_talent(),
            Some(&CardId::from("talent-sigilo"))
        );
        session.with_state_mut(|state| state.threat_count = 9);
        let state = session.into_state();
        assert_eq!(state.threat_count, 9);
    }

    #[test]
    fn invalid_config_is_reported_with_context() {
        let config = RulesConfig {
            victory_travel: 0,
            ..RulesConfig::default()
        };
        let engine = GameEngine::new(FixtureLoader, config);
        let err = engine.create_session(1).unwrap_err();
        assert!(format!("{err:#}").contains("victory_travel"));
    }

    #[test]
    fn empty_catalogs_are_rejected() {
        let engine = GameEngine::new(EmptyLoader, RulesConfig::default());
        assert!(engine.create_session(1).is_err());
    }

    #[test]
    fn static_loader_matches_bundled_catalog() {
        let engine = GameEngine::new(StaticCatalogLoader, RulesConfig::default());
        let catalog = engine.load_catalog().unwrap();
        assert_eq!(catalog, CardCatalog::load_from_static());
    }
}
