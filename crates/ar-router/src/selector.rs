//! Tool selection for one intent span.
//!
//! Keyword scoring first; the local model is asked only when no tool
//! clears the keyword threshold. Never calls the cloud model.

use std::sync::Arc;

use ar_protocol::IntentSpan;

use crate::error::RouteError;
use crate::inference::LocalModelHandle;
use crate::registry::ToolRegistry;

/// A candidate tool and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTool {
    /// Registry index.
    pub index: usize,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMethod {
    Keyword,
    LocalModel,
    /// Nothing usable; downstream tiers that need a tool are skipped.
    Unselected,
}

/// Ranked candidates, best first.
#[derive(Debug, Clone)]
pub struct Selection {
    pub ranked: Vec<ScoredTool>,
    pub confidence: f64,
    pub method: SelectionMethod,
    /// Whether the local model was invoked to decide.
    pub model_invoked: bool,
}

impl Selection {
    /// Registry index of the chosen tool, if any.
    pub fn best(&self) -> Option<usize> {
        match self.method {
            SelectionMethod::Unselected => None,
            _ => self.ranked.first().map(|t| t.index),
        }
    }
}

pub struct ToolSelector {
    registry: Arc<ToolRegistry>,
    local: Option<Arc<LocalModelHandle>>,
    min_keyword_score: f64,
    min_model_confidence: f64,
}

impl ToolSelector {
    pub fn new(
        registry: Arc<ToolRegistry>,
        local: Option<Arc<LocalModelHandle>>,
        min_keyword_score: f64,
        min_model_confidence: f64,
    ) -> Self {
        Self {
            registry,
            local,
            min_keyword_score,
            min_model_confidence,
        }
    }

    /// Every tool with a non-zero keyword score, best first.
    ///
    /// The sort is stable, so equal scores keep registry declaration order.
    pub fn rank_keywords(&self, text: &str) -> Vec<ScoredTool> {
        let mut ranked: Vec<ScoredTool> = (0..self.registry.len())
            .filter_map(|index| {
                let score = self.registry.tool(index).match_score(text);
                (score > 0.0).then(|| ScoredTool {
                    index,
                    name: self.registry.spec(index).name.clone(),
                    score,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    pub async fn select(&self, span: &IntentSpan) -> Selection {
        let ranked = self.rank_keywords(&span.text);
        let best = ranked.first().map_or(0.0, |t| t.score);

        if best >= self.min_keyword_score {
            return Selection {
                ranked,
                confidence: best,
                method: SelectionMethod::Keyword,
                model_invoked: false,
            };
        }

        let low = RouteError::SelectionLowConfidence { best };
        tracing::debug!(span = span.index, reason = %low, "keyword selection inconclusive");

        let Some(local) = &self.local else {
            return Selection {
                ranked,
                confidence: best,
                method: SelectionMethod::Unselected,
                model_invoked: false,
            };
        };

        let chosen = match local.infer(&span.text, self.registry.specs()).await {
            Ok(out) if out.confidence >= self.min_model_confidence => out
                .calls
                .iter()
                .find_map(|c| self.registry.lookup(&c.name))
                .map(|index| (index, out.confidence)),
            Ok(out) => {
                tracing::debug!(confidence = out.confidence, "local selection below threshold");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "local model selection failed");
                None
            }
        };

        match chosen {
            Some((index, confidence)) => {
                let mut ordered = vec![ScoredTool {
                    index,
                    name: self.registry.spec(index).name.clone(),
                    score: confidence,
                }];
                ordered.extend(ranked.into_iter().filter(|t| t.index != index));
                Selection {
                    ranked: ordered,
                    confidence,
                    method: SelectionMethod::LocalModel,
                    model_invoked: true,
                }
            }
            None => Selection {
                ranked,
                confidence: best,
                method: SelectionMethod::Unselected,
                model_invoked: true,
            },
        }
    }
}
