//! The registered projection pipelines.

mod client_contact_number;
mod contact_number_type;

use std::sync::Arc;

use crate::pipeline::{Pipeline, PipelineType};

pub use client_contact_number::{
    CLIENT_CONTACT_NUMBER_PIPELINE_ID, ClientContactNumberProjectionPipeline,
};
pub use contact_number_type::{
    CONTACT_NUMBER_TYPE_PIPELINE_ID, ContactNumberTypeProjectionPipeline,
};

/// Static list of the pipelines a streaming process may start.
#[derive(Clone, Default)]
pub struct PipelineRegistry {
    pipelines: Vec<Arc<dyn Pipeline>>,
}

impl std::fmt::Debug for PipelineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRegistry")
            .field(
                "pipelines",
                &self.pipelines.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PipelineRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pipeline of the contact number service.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with(ContactNumberTypeProjectionPipeline)
            .with(ClientContactNumberProjectionPipeline)
    }

    /// Registers a pipeline.
    #[must_use]
    pub fn with(mut self, pipeline: impl Pipeline + 'static) -> Self {
        self.pipelines.push(Arc::new(pipeline));
        self
    }

    /// The pipelines of `pipeline_type`, in registration order.
    #[must_use]
    pub fn pipelines(&self, pipeline_type: PipelineType) -> Vec<Arc<dyn Pipeline>> {
        self.pipelines
            .iter()
            .filter(|p| p.pipeline_type() == pipeline_type)
            .cloned()
            .collect()
    }

    /// Database configuration keys used by the pipelines of
    /// `pipeline_type`, once per pipeline using them.
    #[must_use]
    pub fn client_config_keys(&self, pipeline_type: PipelineType) -> Vec<&'static str> {
        self.pipelines(pipeline_type)
            .iter()
            .flat_map(|p| p.client_config_keys().iter().copied())
            .collect()
    }
}
