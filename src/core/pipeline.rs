//! Sequential execution of a resolved translation path

use tracing::debug;

use crate::core::errors::Result;
use crate::core::graph::TranslationEdge;
use crate::core::language::{Language, SourceLanguage};

/// The hops connecting a source to a target, computed per request
#[derive(Debug, Clone, Default)]
pub struct TranslationPipeline {
    hops: Vec<TranslationEdge>,
    expensive: bool,
}

/// Final text of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub text: String,
    /// Detection reported by the first hop; later hops never override it
    pub detected_source: Option<Language>,
}

impl TranslationPipeline {
    pub fn new(hops: Vec<TranslationEdge>) -> Self {
        // Worst-case classification, not a sum
        let expensive = hops.iter().any(|hop| hop.expensive);
        Self { hops, expensive }
    }

    /// No hops means no route exists
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn expensive(&self) -> bool {
        self.expensive
    }

    pub fn hops(&self) -> &[TranslationEdge] {
        &self.hops
    }

    /// Languages visited, starting with the source
    pub fn path(&self) -> Vec<SourceLanguage> {
        let Some(first) = self.hops.first() else {
            return Vec::new();
        };

        std::iter::once(first.from)
            .chain(self.hops.iter().map(|hop| SourceLanguage::Known(hop.to)))
            .collect()
    }

    /// Run every hop in order, feeding each output into the next hop.
    ///
    /// The first failing hop aborts the run and its error is returned as is.
    pub async fn execute(&self, text: &str) -> Result<PipelineOutput> {
        let mut current = text.to_string();
        let mut detected_source = None;

        for (index, hop) in self.hops.iter().enumerate() {
            let translation = hop.invoke(&current).await?;

            debug!(
                "Translated from {} to {} via {}: {}",
                hop.from,
                hop.to,
                hop.provider(),
                translation.text
            );

            if index == 0 {
                detected_source = translation.detected_source;
            }
            current = translation.text;
        }

        Ok(PipelineOutput {
            text: current,
            detected_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::GraphBuilder;
    use crate::core::testing::MockTranslator;
    use crate::core::errors::TranslationError;
    use Language::*;

    #[tokio::test]
    async fn test_hops_run_in_sequence() {
        let first = MockTranslator::cheap("first", &[Bokmal], &[Nynorsk]).with_detected(Bokmal);
        let second = MockTranslator::cheap("second", &[Nynorsk], &[English]).with_detected(German);

        let graph = GraphBuilder::new()
            .register(first.arc())
            .register(second.arc())
            .build()
            .unwrap();

        let pipeline = graph.pipeline(Bokmal.into(), English);
        let output = pipeline.execute("hei").await.unwrap();

        assert_eq!(first.inputs(), vec!["hei".to_string()]);
        assert_eq!(second.inputs(), vec!["hei|nb>nn".to_string()]);
        assert_eq!(output.text, "hei|nb>nn|nn>en");
        assert_eq!(output.detected_source, Some(Bokmal));
    }

    #[tokio::test]
    async fn test_detection_only_from_first_hop() {
        let first = MockTranslator::cheap("first", &[Bokmal], &[Nynorsk]);
        let second = MockTranslator::cheap("second", &[Nynorsk], &[English]).with_detected(Nynorsk);

        let graph = GraphBuilder::new()
            .register(first.arc())
            .register(second.arc())
            .build()
            .unwrap();

        let output = graph
            .pipeline(Bokmal.into(), English)
            .execute("hei")
            .await
            .unwrap();
        assert_eq!(output.detected_source, None);
    }

    #[test]
    fn test_expensive_if_any_hop_is() {
        let cheap = MockTranslator::cheap("cheap", &[Nynorsk], &[Bokmal]);
        let paid = MockTranslator::expensive("paid", &[Bokmal], &[English]);

        let graph = GraphBuilder::new()
            .register(cheap.arc())
            .register(paid.arc())
            .build()
            .unwrap();

        let mixed = graph.pipeline(Nynorsk.into(), English);
        assert_eq!(mixed.len(), 2);
        assert!(mixed.expensive());

        let cheap_only = graph.pipeline(Nynorsk.into(), Bokmal);
        assert!(!cheap_only.expensive());
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_hops() {
        let broken = MockTranslator::expensive("broken", &[English], &[Bokmal]).failing();
        let pivot = MockTranslator::cheap("pivot", &[Bokmal], &[Nynorsk]);

        let graph = GraphBuilder::new()
            .register(broken.arc())
            .register(pivot.arc())
            .build()
            .unwrap();

        let err = graph
            .pipeline(English.into(), Nynorsk)
            .execute("hello")
            .await
            .unwrap_err();

        assert!(matches!(err, TranslationError::ApiError { status: 503, .. }));
        assert_eq!(broken.call_count(), 1);
        assert_eq!(pivot.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_pipeline_returns_input() {
        let pipeline = TranslationPipeline::default();
        assert!(pipeline.is_empty());
        assert!(pipeline.path().is_empty());

        let output = pipeline.execute("uendra").await.unwrap();
        assert_eq!(output.text, "uendra");
    }
}
