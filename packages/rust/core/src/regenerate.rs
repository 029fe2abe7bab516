//! On-demand regeneration of the description and the audience personas.
//!
//! Both operations return new values; the caller decides whether to fold
//! them into a saved [`AnalysisResult`] via `apply_usp` / `apply_audiences`.

use tracing::{info, instrument};

use siteprofiler_shared::{
    AnalysisResult, AudiencePersona, BusinessModel, Result, SiteProfilerError,
};

use crate::extraction::{ModelRequest, StructuredExtractor, parse_json_response};
use crate::normalize::{AudienceResponse, personas};
use crate::prompts;

/// Inputs for a new business description.
#[derive(Debug, Clone)]
pub struct UspContext {
    pub business_name: String,
    pub business_model: BusinessModel,
    pub website_url: String,
    pub current_draft: String,
}

impl From<&AnalysisResult> for UspContext {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            business_name: result.business_name.clone(),
            business_model: result.business_model,
            website_url: result.website_url.clone(),
            current_draft: result.usp.clone(),
        }
    }
}

/// Inputs for a new set of personas.
#[derive(Debug, Clone)]
pub struct AudienceContext {
    pub business_name: String,
    pub business_model: BusinessModel,
    pub description: String,
    pub asset_titles: Vec<String>,
}

impl From<&AnalysisResult> for AudienceContext {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            business_name: result.business_name.clone(),
            business_model: result.business_model,
            description: result.usp.clone(),
            asset_titles: result.asset_titles(),
        }
    }
}

/// Ask for a fresh factual description.
///
/// An empty answer is an error so the caller keeps its current draft.
#[instrument(skip_all, fields(business = %ctx.business_name))]
pub async fn regenerate_usp(
    extractor: &dyn StructuredExtractor,
    ctx: &UspContext,
) -> Result<String> {
    let prompt = prompts::usp_prompt(
        &ctx.business_name,
        ctx.business_model,
        &ctx.website_url,
        &ctx.current_draft,
    );
    let text = extractor.generate(&ModelRequest::text(prompt)).await?;
    let text = text.trim();
    if text.is_empty() {
        return Err(SiteProfilerError::Model("empty description returned".into()));
    }

    info!(chars = text.chars().count(), "regenerated description");
    Ok(text.to_string())
}

/// Ask for three new personas.
///
/// Only an answer carrying an `audiences` array counts; anything else is an
/// error and the caller keeps its current personas.
#[instrument(skip_all, fields(business = %ctx.business_name))]
pub async fn regenerate_audiences(
    extractor: &dyn StructuredExtractor,
    ctx: &AudienceContext,
) -> Result<Vec<AudiencePersona>> {
    let prompt = prompts::audience_prompt(
        &ctx.business_name,
        ctx.business_model,
        &ctx.description,
        &ctx.asset_titles,
    );
    let raw = extractor.generate(&ModelRequest::json(prompt)).await?;
    let parsed: AudienceResponse = parse_json_response(&raw)?;

    let Some(audiences) = parsed.audiences else {
        return Err(SiteProfilerError::ModelResponseMalformed(
            "answer has no audiences array".into(),
        ));
    };

    let personas = personas(audiences);
    info!(count = personas.len(), "regenerated personas");
    Ok(personas)
}
