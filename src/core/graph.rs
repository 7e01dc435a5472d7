//! Translation graph: which provider call connects which pair of languages

use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::core::errors::{Result, TranslationError};
use crate::core::language::{Language, SourceLanguage};
use crate::core::models::Translation;
use crate::core::pipeline::TranslationPipeline;

/// A translation provider adapter
#[async_trait]
pub trait Translator: Send + Sync {
    /// Provider name, used in logs and conflict reports
    fn name(&self) -> &str;

    /// Languages accepted as input. May include [`SourceLanguage::Auto`].
    fn sources(&self) -> Vec<SourceLanguage>;

    /// Languages this provider can produce
    fn targets(&self) -> Vec<Language>;

    /// Metered/paid provider
    fn is_expensive(&self) -> bool;

    /// Perform one provider call
    async fn translate(&self, from: SourceLanguage, to: Language, text: &str)
        -> Result<Translation>;
}

/// One hop: a translator bound to a fixed language pair
#[derive(Clone)]
pub struct TranslationEdge {
    translator: Arc<dyn Translator>,
    pub from: SourceLanguage,
    pub to: Language,
    pub expensive: bool,
}

impl TranslationEdge {
    pub fn new(translator: Arc<dyn Translator>, from: SourceLanguage, to: Language) -> Self {
        let expensive = translator.is_expensive();
        Self {
            translator,
            from,
            to,
            expensive,
        }
    }

    pub fn provider(&self) -> &str {
        self.translator.name()
    }

    pub async fn invoke(&self, text: &str) -> Result<Translation> {
        self.translator.translate(self.from, self.to, text).await
    }
}

impl fmt::Debug for TranslationEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationEdge")
            .field("provider", &self.provider())
            .field("from", &self.from)
            .field("to", &self.to)
            .field("expensive", &self.expensive)
            .finish()
    }
}

/// Collects translators and turns them into a [`TranslationGraph`]
///
/// Two translators declaring the same `(from, to)` pair is an error unless
/// [`GraphBuilder::allow_overrides`] is set, in which case the translator
/// registered last owns the edge.
#[derive(Default)]
pub struct GraphBuilder {
    translators: Vec<Arc<dyn Translator>>,
    allow_overrides: bool,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translators.push(translator);
        self
    }

    pub fn allow_overrides(mut self) -> Self {
        self.allow_overrides = true;
        self
    }

    pub fn build(self) -> Result<TranslationGraph> {
        let mut edges: IndexMap<SourceLanguage, IndexMap<Language, TranslationEdge>> =
            IndexMap::new();

        for translator in &self.translators {
            let targets = translator.targets();

            for from in translator.sources() {
                for &to in &targets {
                    if from == SourceLanguage::Known(to) {
                        continue;
                    }

                    let outgoing = edges.entry(from).or_default();
                    if let Some(existing) = outgoing.get(&to) {
                        if !self.allow_overrides {
                            return Err(TranslationError::EdgeConflict {
                                from,
                                to,
                                existing: existing.provider().to_string(),
                                incoming: translator.name().to_string(),
                            });
                        }
                        debug!(
                            "Edge {} -> {} moves from {} to {}",
                            from,
                            to,
                            existing.provider(),
                            translator.name()
                        );
                    }

                    outgoing.insert(to, TranslationEdge::new(Arc::clone(translator), from, to));
                }
            }
        }

        let graph = TranslationGraph { edges };
        debug!(
            "Built translation graph with {} edges from {} translators",
            graph.edge_count(),
            self.translators.len()
        );
        Ok(graph)
    }
}

/// Directed graph of single-call translation hops
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct TranslationGraph {
    edges: IndexMap<SourceLanguage, IndexMap<Language, TranslationEdge>>,
}

impl TranslationGraph {
    pub fn edge(&self, from: SourceLanguage, to: Language) -> Option<&TranslationEdge> {
        self.edges.get(&from).and_then(|outgoing| outgoing.get(&to))
    }

    /// All edges in registration order
    pub fn edges(&self) -> impl Iterator<Item = &TranslationEdge> {
        self.edges.values().flat_map(|outgoing| outgoing.values())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|outgoing| outgoing.len()).sum()
    }

    /// Languages that appear on either end of some edge
    pub fn languages(&self) -> Vec<Language> {
        let mut seen = Vec::new();
        for edge in self.edges() {
            for lang in [edge.from.known(), Some(edge.to)].into_iter().flatten() {
                if !seen.contains(&lang) {
                    seen.push(lang);
                }
            }
        }
        seen
    }

    /// Shortest chain of languages from `source` to `target`, or empty if none.
    ///
    /// Breadth-first, so the first path reaching `target` has the fewest hops;
    /// equal-length paths are decided by edge registration order.
    pub fn find_path(&self, source: SourceLanguage, target: Language) -> Vec<SourceLanguage> {
        let target = SourceLanguage::Known(target);
        let mut queue: VecDeque<Vec<SourceLanguage>> = VecDeque::from([vec![source]]);
        let mut visited: HashSet<SourceLanguage> = HashSet::from([source]);

        while let Some(path) = queue.pop_front() {
            let last = path[path.len() - 1];

            if last == target {
                return path;
            }

            let Some(outgoing) = self.edges.get(&last) else {
                continue;
            };

            for &neighbor in outgoing.keys() {
                let neighbor = SourceLanguage::Known(neighbor);
                if visited.insert(neighbor) {
                    let mut next = path.clone();
                    next.push(neighbor);
                    queue.push_back(next);
                }
            }
        }

        Vec::new()
    }

    /// Resolve the hops needed to go from `source` to `target`
    pub fn pipeline(&self, source: SourceLanguage, target: Language) -> TranslationPipeline {
        let path = self.find_path(source, target);

        let hops = path
            .windows(2)
            .filter_map(|pair| {
                let to = pair[1].known()?;
                self.edge(pair[0], to).cloned()
            })
            .collect();

        TranslationPipeline::new(hops)
    }
}
