use std::sync::Arc;

use dialbook_event_store::pools::CLIENT_MANAGEMENT_DB_KEY;

use crate::pipeline::{Pipeline, PipelineContext, PipelineType};
use crate::transformers::{ContactNumberTypeProjectionTransformer, ProjectionTransformer};

/// Resume token key of the contact number type pipeline.
pub const CONTACT_NUMBER_TYPE_PIPELINE_ID: &str = "contact_number_type_event_store";

/// Projects contact number types into `contact_number_type_projection`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactNumberTypeProjectionPipeline;

impl Pipeline for ContactNumberTypeProjectionPipeline {
    fn id(&self) -> &'static str {
        CONTACT_NUMBER_TYPE_PIPELINE_ID
    }

    fn client_config_keys(&self) -> &'static [&'static str] {
        &[CLIENT_MANAGEMENT_DB_KEY]
    }

    fn pipeline_type(&self) -> PipelineType {
        PipelineType::Core
    }

    fn transformer(&self, ctx: &PipelineContext) -> Arc<dyn ProjectionTransformer> {
        Arc::new(ContactNumberTypeProjectionTransformer::new(Arc::clone(
            &ctx.contact_number_types,
        )))
    }
}
