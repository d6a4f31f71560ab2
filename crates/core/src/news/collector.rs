use crate::domain::headline::Headline;
use crate::news::provider::HeadlineSource;
use crate::news::relevance::filter_relevant;
use std::collections::HashSet;

/// Queries every source in turn. A failing source contributes nothing.
pub async fn collect_headlines(sources: &[Box<dyn HeadlineSource>]) -> Vec<Headline> {
    let mut raw = Vec::new();
    let mut failed_sources: usize = 0;

    for source in sources {
        match source.fetch_headlines().await {
            Ok(items) => {
                tracing::info!(source = source.name(), count = items.len(), "fetched headlines");
                raw.extend(items);
            }
            Err(err) => {
                failed_sources += 1;
                tracing::warn!(source = source.name(), error = %err, "headline source failed; skipping");
            }
        }
    }

    let out = dedupe_relevant(raw);
    tracing::info!(
        sources = sources.len(),
        failed_sources,
        headlines = out.len(),
        "headline collection finished"
    );
    out
}

/// Relevance filter plus exact-duplicate removal; the first occurrence wins.
pub fn dedupe_relevant(raw: Vec<Headline>) -> Vec<Headline> {
    let mut seen = HashSet::new();
    filter_relevant(raw)
        .into_iter()
        .filter(|h| seen.insert(h.clone()))
        .collect()
}
