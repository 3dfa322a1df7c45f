//! Description enrichment through a generative text collaborator.
//!
//! Enrichment is strictly best-effort: a failing generator never aborts the
//! batch. Every call produces a usable description, either the generated
//! text, the row's existing description, or a synthesized placeholder.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::dataset::RowSet;

/// Rows whose description is at least this many characters are never sent
/// to the generator again; a good description, once produced, stays.
pub const DESCRIPTION_THRESHOLD: usize = 50;

/// Bounded output length for generated descriptions.
pub const COMPLETION_MAX_TOKENS: u32 = 200;

/// Low randomness: conciseness and determinism over creativity.
pub const COMPLETION_TEMPERATURE: f32 = 0.3;

const SYSTEM_PROMPT: &str =
    "You are a data governance expert who creates clear, professional asset descriptions.";

/// Errors surfaced by generative text collaborators.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Completion request failed: {0}")]
    Request(String),

    #[error("Malformed completion response: {0}")]
    InvalidResponse(String),
}

/// Narrow interface over a chat-completion style text generator.
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerateError>;
}

/// Counts reported by a sheet-wide enrichment pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichStats {
    /// Rows below the description threshold.
    pub candidates: usize,
    /// Rows whose description was actually rewritten.
    pub generated: usize,
}

/// Drives description enrichment over a [`RowSet`].
pub struct Enricher<G> {
    generator: G,
}

impl<G: DescriptionGenerator> Enricher<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Whether a description is short enough to warrant (re)generation.
    pub fn needs_enrichment(current: &str) -> bool {
        current.chars().count() < DESCRIPTION_THRESHOLD
    }

    /// Produce an improved description for one asset.
    ///
    /// Never fails: on any generator error the current description is
    /// returned if non-empty, otherwise a placeholder derived from `name`.
    pub async fn enrich(&self, name: &str, qualified_name: &str, current: &str) -> String {
        let prompt = build_prompt(name, qualified_name, current);
        match self
            .generator
            .complete(
                SYSTEM_PROMPT,
                &prompt,
                COMPLETION_MAX_TOKENS,
                COMPLETION_TEMPERATURE,
            )
            .await
        {
            Ok(text) if !text.trim().is_empty() => {
                debug!(asset = name, "description generated");
                text.trim().to_string()
            }
            Ok(_) => {
                warn!(asset = name, "generator returned empty text; falling back");
                fallback(name, current)
            }
            Err(e) => {
                warn!(asset = name, error = %e, "generation failed; falling back");
                fallback(name, current)
            }
        }
    }

    /// Enrich every row below the threshold, mutating the set in place.
    ///
    /// In dry-run mode the candidates are counted and narrated but the
    /// generator is never invoked and no row changes.
    pub async fn enrich_rows(&self, rows: &mut RowSet, dry_run: bool) -> EnrichStats {
        let mut stats = EnrichStats::default();
        for index in 0..rows.len() {
            let (name, fqn, current) = {
                let record = rows.record(index);
                (
                    record.asset_name().to_string(),
                    record.asset_fqn().to_string(),
                    record.description().to_string(),
                )
            };

            if !Self::needs_enrichment(&current) {
                debug!(asset = %name, "description already comprehensive; skipping");
                continue;
            }
            stats.candidates += 1;

            if dry_run {
                info!(asset = %name, "dry run: description would be generated");
                continue;
            }

            info!(asset = %name, "generating description");
            let text = self.enrich(&name, &fqn, &current).await;
            rows.set_description(index, &text);
            stats.generated += 1;
        }
        stats
    }
}

/// Fallback description when generation fails or yields nothing.
fn fallback(name: &str, current: &str) -> String {
    if current.trim().is_empty() {
        format!("Data asset: {name}")
    } else {
        current.to_string()
    }
}

fn build_prompt(name: &str, qualified_name: &str, current: &str) -> String {
    format!(
        "You are a data governance expert. Please generate a clear, professional \
         description for the following data asset:\n\n\
         Asset Name: {name}\n\
         Asset Qualified Name: {qualified_name}\n\
         Current Description: {current}\n\n\
         Please provide a comprehensive description that includes:\n\
         1. What type of data this asset likely contains based on its name\n\
         2. Its potential business purpose or use case\n\
         3. Any relevant technical details inferred from the qualified name\n\n\
         Keep the description concise but informative (2-3 sentences maximum)."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGenerator {
        reply: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl FixedGenerator {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DescriptionGenerator for FixedGenerator {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .clone()
                .map_err(|_| GenerateError::Request("quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn failure_falls_back_to_existing_description() {
        let enricher = Enricher::new(FixedGenerator::failing());
        let text = enricher
            .enrich("SalesFact", "db.sales.fact", "Existing text")
            .await;
        assert_eq!(text, "Existing text");
    }

    #[tokio::test]
    async fn failure_with_empty_current_synthesizes_placeholder() {
        let enricher = Enricher::new(FixedGenerator::failing());
        let text = enricher.enrich("SalesFact", "db.sales.fact", "").await;
        assert_eq!(text, "Data asset: SalesFact");
        assert!(text.contains("SalesFact"));
    }

    #[tokio::test]
    async fn empty_generation_also_falls_back() {
        let enricher = Enricher::new(FixedGenerator::ok("   "));
        let text = enricher.enrich("SalesFact", "db.sales.fact", "").await;
        assert_eq!(text, "Data asset: SalesFact");
    }

    #[test]
    fn threshold_is_fifty_characters() {
        assert!(Enricher::<FixedGenerator>::needs_enrichment(""));
        assert!(Enricher::<FixedGenerator>::needs_enrichment(&"x".repeat(49)));
        assert!(!Enricher::<FixedGenerator>::needs_enrichment(&"x".repeat(50)));
    }

    fn sheet(dir: &tempfile::TempDir, description: &str) -> crate::dataset::RowSet {
        let path = dir.path().join("sheet.csv");
        std::fs::write(
            &path,
            format!(
                "AssetName,AssetFQN,AssetDescription,CollectionName,OwnerId,ParentAssetFQN,IsColumn\n\
                 SalesFact,db.sales.fact,{description},Finance,,,\n"
            ),
        )
        .unwrap();
        crate::dataset::load(&path).unwrap()
    }

    #[tokio::test]
    async fn comprehensive_descriptions_are_never_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let long = "d".repeat(60);
        let mut rows = sheet(&dir, &long);

        let enricher = Enricher::new(FixedGenerator::ok("generated"));
        let stats = enricher.enrich_rows(&mut rows, false).await;

        assert_eq!(stats, EnrichStats::default());
        assert_eq!(enricher.generator.calls(), 0);
        assert_eq!(rows.record(0).description(), long);
    }

    #[tokio::test]
    async fn short_description_is_rewritten_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut rows = sheet(&dir, "short");

        let enricher = Enricher::new(FixedGenerator::ok("A generated description."));
        let stats = enricher.enrich_rows(&mut rows, false).await;

        assert_eq!(stats.candidates, 1);
        assert_eq!(stats.generated, 1);
        assert_eq!(rows.record(0).description(), "A generated description.");
    }

    #[tokio::test]
    async fn dry_run_counts_candidates_without_calling_generator() {
        let dir = tempfile::tempdir().unwrap();
        let mut rows = sheet(&dir, "short");

        let enricher = Enricher::new(FixedGenerator::ok("generated"));
        let stats = enricher.enrich_rows(&mut rows, true).await;

        assert_eq!(stats.candidates, 1);
        assert_eq!(stats.generated, 0);
        assert_eq!(enricher.generator.calls(), 0);
        assert_eq!(rows.record(0).description(), "short");
    }
}
