//! services/client/src/controllers/generate.rs
//!
//! The generation form: validate, submit, hand the result to the viewer.

use std::sync::Arc;

use prd_client_core::domain::{Document, Format, GenerationRequest, TemplateType, View};
use prd_client_core::ports::{GenerateView, PrdService};
use tracing::{error, info};

use super::auth::AuthController;
use super::viewer::DocumentViewer;
use crate::error::{ClientError, ClientResult};

const GENERATION_FAILED: &str = "There was an error generating your PRD";

/// Raw form input, as typed or selected.
#[derive(Debug, Clone, Default)]
pub struct GenerationForm {
    pub title: String,
    pub input_prompt: String,
    pub template_type: String,
    pub format: String,
}

impl GenerationForm {
    pub fn to_request(&self) -> ClientResult<GenerationRequest> {
        if self.title.is_empty()
            || self.input_prompt.is_empty()
            || self.template_type.is_empty()
            || self.format.is_empty()
        {
            return Err(ClientError::Validation("Please fill out all fields.".into()));
        }
        let template_type = self
            .template_type
            .parse::<TemplateType>()
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        let format = self
            .format
            .parse::<Format>()
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        Ok(GenerationRequest {
            title: self.title.clone(),
            input_prompt: self.input_prompt.clone(),
            template_type,
            format,
        })
    }
}

pub struct GeneratePage {
    api: Arc<dyn PrdService>,
    auth: Arc<AuthController>,
    view: Arc<dyn GenerateView>,
    viewer: DocumentViewer,
}

impl GeneratePage {
    pub fn new(
        api: Arc<dyn PrdService>,
        auth: Arc<AuthController>,
        view: Arc<dyn GenerateView>,
        viewer: DocumentViewer,
    ) -> Self {
        Self {
            api,
            auth,
            view,
            viewer,
        }
    }

    pub fn viewer(&self) -> &DocumentViewer {
        &self.viewer
    }

    /// Submits the form. The busy state is restored whatever the outcome.
    pub async fn submit(&mut self, input: &GenerationForm) -> ClientResult<Document> {
        let request = match input.to_request() {
            Ok(request) => request,
            Err(err) => {
                self.view.show_error(&err.to_string());
                return Err(err);
            }
        };

        self.view.set_busy(true);
        let result = self.api.generate(&request).await.map_err(ClientError::from);
        self.view.set_busy(false);

        match result {
            Ok(doc) => {
                info!("Generated PRD {}", doc.id);
                self.view.hide_error();
                self.viewer.show(doc.clone());
                self.view.reveal_result();
                Ok(doc)
            }
            Err(e) => {
                error!("Error generating PRD: {}", e);
                self.auth.intercept(&e, View::Generate).await;
                self.view
                    .show_error(&format!("{}: {}", GENERATION_FAILED, e.user_message()));
                Err(e)
            }
        }
    }
}
