// 🔗 Badge Service - fetch → resolve → render
// Holds no per-request state; safe to share behind an Arc.

use crate::badge::{BadgeColor, BadgeImage, BadgeRenderer, BadgeSpec};
use crate::error::BadgeError;
use crate::registry::RegistryClient;
use crate::status::{self, ResolvedStatus};
use crate::validation::EntityIdentifier;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Left panel caption, followed by the municipality name
pub const LEFT_TEXT_PREFIX: &str = "Stato ANPR";

#[derive(Clone)]
pub struct BadgeService {
    registry: Arc<dyn RegistryClient>,
    renderer: Arc<dyn BadgeRenderer>,
    embed_logo: bool,
}

impl BadgeService {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        renderer: Arc<dyn BadgeRenderer>,
        embed_logo: bool,
    ) -> Self {
        BadgeService {
            registry,
            renderer,
            embed_logo,
        }
    }

    /// Fetch and classify, without rendering.
    ///
    /// A malformed record is reported as [`BadgeError::NotFound`]: for the
    /// caller, "no data for this code" and "no such code" are the same thing.
    pub async fn status(
        &self,
        identifier: &EntityIdentifier,
        now: DateTime<Utc>,
    ) -> Result<ResolvedStatus, BadgeError> {
        let record = self.registry.fetch(identifier).await?;

        let status = status::resolve(&record, now).map_err(|e| match e {
            BadgeError::MalformedRecord { reason } => BadgeError::NotFound {
                identifier: identifier.to_string(),
                reason,
            },
            other => other,
        })?;

        tracing::info!(
            identifier = %identifier,
            state = status.state.name(),
            color = status.color.name(),
            "resolved migration status"
        );
        Ok(status)
    }

    /// Full badge pipeline for one identifier
    pub async fn handle(
        &self,
        identifier: &EntityIdentifier,
        now: DateTime<Utc>,
    ) -> Result<BadgeImage, BadgeError> {
        let status = self.status(identifier, now).await?;
        self.renderer.render(&badge_spec(&status, self.embed_logo))
    }
}

/// Renderer input for a resolved status
pub fn badge_spec(status: &ResolvedStatus, embed_logo: bool) -> BadgeSpec {
    BadgeSpec {
        left_color: BadgeColor::Blue,
        right_color: status.color,
        left_text: format!("{}: {}", LEFT_TEXT_PREFIX, status.display_name),
        right_text: status.label.clone(),
        logo: Some(status.icon),
        embed_logo,
    }
}

// ============================================================================
// TESTS
// ============================================================================
