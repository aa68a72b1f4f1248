use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use super::prompt::{parse_move_index, render_prompt};
use super::random::RandomSelector;
use crate::games::side_stacker::{Board, Move};

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("advisory service is not configured")]
    Unavailable,
    #[error("advisory service did not answer within {0:?}")]
    Timeout(Duration),
    #[error("advisory request failed: {0}")]
    Transport(String),
    #[error("no move number found in advisory reply")]
    Unparseable,
    #[error("advisory picked move {index}, only {available} available")]
    OutOfRange { index: usize, available: usize },
}

/// Text-completion service consulted by the hard tier.
#[async_trait]
pub trait AdvisoryClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AdvisoryError>;
}

/// Client for deployments without an advisory service; every request fails fast.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableAdvisory;

#[async_trait]
impl AdvisoryClient for UnavailableAdvisory {
    async fn complete(&self, _prompt: &str) -> Result<String, AdvisoryError> {
        Err(AdvisoryError::Unavailable)
    }
}

/// Hard tier: asks an external service and falls back to a random legal move on any failure.
pub struct AdvisorySelector {
    client: Arc<dyn AdvisoryClient>,
    timeout: Duration,
    fallback: RandomSelector,
}

impl AdvisorySelector {
    pub fn new(client: Arc<dyn AdvisoryClient>, timeout: Duration) -> Self {
        Self::with_fallback(client, timeout, RandomSelector::default())
    }

    pub fn with_fallback(
        client: Arc<dyn AdvisoryClient>,
        timeout: Duration,
        fallback: RandomSelector,
    ) -> Self {
        Self {
            client,
            timeout,
            fallback,
        }
    }

    pub async fn select_move(&self, board: &Board) -> Option<Move> {
        if board.is_game_over() {
            return None;
        }
        let moves = board.valid_moves();
        match moves.as_slice() {
            [] => None,
            [only] => Some(*only),
            _ => match self.ask(board, &moves).await {
                Ok(mv) => Some(mv),
                Err(err) => {
                    warn!(error = %err, "advisory move failed, falling back to random");
                    self.fallback.choose(&moves)
                }
            },
        }
    }

    async fn ask(&self, board: &Board, moves: &[Move]) -> Result<Move, AdvisoryError> {
        let prompt = render_prompt(board, moves);
        let reply = tokio::time::timeout(self.timeout, self.client.complete(&prompt))
            .await
            .map_err(|_| AdvisoryError::Timeout(self.timeout))??;

        debug!(reply = %reply.trim(), "advisory reply");

        let index = parse_move_index(&reply).ok_or(AdvisoryError::Unparseable)?;
        if index == 0 || index > moves.len() {
            return Err(AdvisoryError::OutOfRange {
                index,
                available: moves.len(),
            });
        }
        Ok(moves[index - 1])
    }
}
