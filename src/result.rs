//! Result object: the set of pipelines loaded for one analysis.

use crate::pipeline::SharedPipeline;

/// Read-only container of loaded pipelines. Populated through
/// [`PostPipeline::load`](crate::pipeline::PostPipeline::load); carries
/// no computation of its own.
#[derive(Clone, Default)]
pub struct PostResult {
    pipelines: Vec<SharedPipeline>,
}

impl PostResult {
    /// Result with no pipelines.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, pipeline: SharedPipeline) {
        self.pipelines.push(pipeline);
    }

    /// Loaded pipelines, in load order.
    pub fn pipelines(&self) -> &[SharedPipeline] {
        &self.pipelines
    }

    /// Number of loaded pipelines.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// True when nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PostPipeline;

    #[test]
    fn load_appends_and_try_load_warns_on_missing() {
        let pipeline = PostPipeline::new().into_shared();
        let mut result = PostResult::new();
        PostPipeline::load(&pipeline, &mut result);
        assert_eq!(result.len(), 1);

        assert!(PostPipeline::try_load(&pipeline, Some(&mut result)));
        assert_eq!(result.len(), 2);
        assert!(!PostPipeline::try_load(&pipeline, None));
    }
}
