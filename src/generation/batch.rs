use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{EmojiGenerator, GenerationError};
use crate::imaging::ProcessedImage;
use crate::llm::media::ReferenceImage;
use crate::settings::GenerationSettings;
use crate::utils::timing::BatchTimer;

#[derive(Debug, Clone)]
pub struct GeneratedEmoji {
    /// Zero-based position of the source variation in the action list.
    pub index: usize,
    pub action: String,
    pub image: ProcessedImage,
}

/// Successful emojis in completion order, not input order.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub emojis: Vec<GeneratedEmoji>,
    pub failed: usize,
    pub total: usize,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.emojis.len()
    }
}

type Settled = (usize, String, Result<ProcessedImage, GenerationError>);

fn progress_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    completed as f64 * 100.0 / total as f64
}

pub async fn generate_batch<G, F>(
    generator: Arc<G>,
    reference: Arc<ReferenceImage>,
    actions: &[String],
    settings: Arc<GenerationSettings>,
    mut on_progress: F,
    cancel: Option<&CancellationToken>,
) -> Result<BatchResult, GenerationError>
where
    G: EmojiGenerator + 'static,
    F: FnMut(f64),
{
    settings.validate().map_err(GenerationError::invalid_settings)?;

    let total = actions.len();
    let mut result = BatchResult {
        emojis: Vec::with_capacity(total),
        failed: 0,
        total,
    };
    if total == 0 {
        return Ok(result);
    }

    let mut timer = BatchTimer::start("generate_batch", total);
    info!("Starting emoji batch: {} variations", total);

    let mut tasks: JoinSet<Settled> = JoinSet::new();
    for (index, action) in actions.iter().enumerate() {
        let generator = Arc::clone(&generator);
        let reference = Arc::clone(&reference);
        let settings = Arc::clone(&settings);
        let action = action.clone();
        tasks.spawn(async move {
            let outcome = generator
                .generate_one(&reference, &action, &settings)
                .await;
            (index, action, outcome)
        });
    }

    let mut completed = 0usize;
    let mut cancelled = false;
    loop {
        let joined = match cancel {
            Some(token) if !cancelled => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        cancelled = true;
                        warn!("Emoji batch cancelled with {} of {} settled", completed, total);
                        tasks.abort_all();
                        continue;
                    }
                    joined = tasks.join_next() => joined,
                }
            }
            _ => tasks.join_next().await,
        };
        let Some(joined) = joined else {
            break;
        };

        completed += 1;
        match joined {
            Ok((index, action, Ok(image))) => {
                result.emojis.push(GeneratedEmoji {
                    index,
                    action,
                    image,
                });
            }
            Ok((index, action, Err(err))) => {
                result.failed += 1;
                let failed_action = err
                    .action()
                    .filter(|text| !text.is_empty())
                    .unwrap_or(&action);
                warn!(
                    "Variation {} (\"{}\") failed: kind={} error={}",
                    index + 1,
                    failed_action,
                    err.kind(),
                    err
                );
            }
            Err(err) if err.is_cancelled() => {
                result.failed += 1;
            }
            Err(err) => {
                result.failed += 1;
                warn!("Generation task ended abnormally: {}", err);
            }
        }
        on_progress(progress_percent(completed, total));
    }

    info!(
        "Emoji batch finished: {} succeeded, {} failed",
        result.succeeded(),
        result.failed
    );

    if result.emojis.is_empty() {
        if cancelled {
            timer.complete(0, result.failed, "cancelled");
            return Err(GenerationError::Cancelled {
                settled: completed,
                total,
            });
        }
        timer.complete(0, result.failed, "exhausted");
        return Err(GenerationError::BatchExhausted { attempted: total });
    }

    let status = if cancelled {
        "cancelled"
    } else if result.failed > 0 {
        "partial"
    } else {
        "success"
    };
    timer.complete(result.succeeded(), result.failed, status);
    Ok(result)
}
