use std::sync::Arc;

use dialbook_contact_number_setting::application::repository::ContactNumberSettingRepository;
use dialbook_event_store::pools::CLIENT_MANAGEMENT_DB_KEY;

use crate::pipeline::{Pipeline, PipelineContext, PipelineType};
use crate::transformers::{ClientContactNumberProjectionTransformer, ProjectionTransformer};

/// Resume token key of the client contact number pipeline.
pub const CLIENT_CONTACT_NUMBER_PIPELINE_ID: &str = "client_contact_number_event_store";

/// Projects client contact numbers into `client_contact_number_projection`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientContactNumberProjectionPipeline;

impl Pipeline for ClientContactNumberProjectionPipeline {
    fn id(&self) -> &'static str {
        CLIENT_CONTACT_NUMBER_PIPELINE_ID
    }

    fn client_config_keys(&self) -> &'static [&'static str] {
        &[CLIENT_MANAGEMENT_DB_KEY]
    }

    fn pipeline_type(&self) -> PipelineType {
        PipelineType::Core
    }

    fn transformer(&self, ctx: &PipelineContext) -> Arc<dyn ProjectionTransformer> {
        Arc::new(ClientContactNumberProjectionTransformer::new(
            Arc::clone(&ctx.client_contact_numbers),
            Arc::new(ContactNumberSettingRepository::new(Arc::clone(&ctx.events))),
        ))
    }
}
