//! Prompt builders for the extraction and regeneration requests.

use siteprofiler_shared::BusinessModel;

/// Guidance shared by every prompt that asks for audience personas.
const PERSONA_RULES: &str = "\
Write each persona description in Hebrew as a short profile:
- At most 40 words.
- Exactly three short, flowing sentences. No bullet points, labels or emojis.
- Sentence 1: who the persona is and the conflict they live with (they want X but hate Y).
- Sentence 2: the fear or friction that holds them back.
- Sentence 3: the marketing angle, i.e. what to sell them.
- Tone: professional and direct, no fluff.";

/// JSON document the extraction prompt asks for.
///
/// Mirrors [`crate::normalize::ExtractionResponse`].
const EXTRACTION_SCHEMA: &str = r#"{
  "business_name": "string",
  "business_model": "ecommerce | service | knowledge | portfolio | real_estate",
  "description_usp": "Hebrew string",
  "target_audiences": [
    { "title": "short catchy Hebrew title", "description": "the three-sentence profile" }
  ],
  "visuals": {
    "primary_color": "HEX string",
    "secondary_color": "HEX string",
    "logo_url": "string"
  },
  "extracted_assets": [
    {
      "title": "string",
      "imageUrl": "string",
      "link": "string",
      "type": "product | service | project | course | property"
    }
  ]
}"#;

const AUDIENCE_SCHEMA: &str = r#"{
  "audiences": [
    { "title": "short catchy Hebrew title", "description": "the three-sentence profile" }
  ]
}"#;

/// Prompt for the single structured-extraction request of an analysis run.
///
/// `primary_content` should already be truncated by the caller.
pub fn extraction_prompt(site_url: &str, primary_content: &str, visual_context: &str) -> String {
    format!(
        "You extract structured business data from websites.\n\
         Site: {site_url}\n\n\
         SOURCE CONTENT (text or Markdown, use it for business information):\n\
         {primary_content}\n\n\
         VISUAL CONTEXT (raw HTML, use it for colours and the logo):\n\
         {visual_context}\n\n\
         Instructions:\n\
         1. Business info: the business name and a Hebrew description of what it offers (USP).\n\
         2. Visuals: read style attributes, style tags and hex codes in the visual context.\n\
            The primary colour is the dominant brand colour; the secondary colour is the accent\n\
            used for footers or secondary buttons. For the logo look at <link rel=\"icon\">,\n\
            <meta property=\"og:image\"> and <img> tags whose class or id mentions \"logo\".\n\
         3. Target audience: identify three distinct personas.\n\
         {PERSONA_RULES}\n\
         4. Assets: find the products, services, courses, projects or properties the site lists.\n\
            Extract between 3 and 6 items. Each needs its own page link, its own image URL and\n\
            its name.\n\n\
         Answer with JSON only, following this schema:\n\
         {EXTRACTION_SCHEMA}\n"
    )
}

/// Prompt for a fresh, factual business description.
pub fn usp_prompt(
    business_name: &str,
    business_model: BusinessModel,
    website_url: &str,
    current_draft: &str,
) -> String {
    format!(
        "You are a factual business analyst.\n\
         Write a concise, informative Hebrew description of the business \"{business_name}\".\n\
         Business model: {business_model}.\n\
         Website: {website_url}.\n\
         Current draft: \"{current_draft}\"\n\n\
         Rules:\n\
         - This is not an advertisement. No marketing copy.\n\
         - No exclamation marks.\n\
         - No slogans such as \"come visit us\" or \"the best in the world\".\n\
         - Say what the business does, what it sells and who it serves.\n\
         - Keep it dry, professional and clear.\n\
         - At most 250 characters.\n\
         Answer with the description text only.\n"
    )
}

/// Prompt for three new audience personas.
pub fn audience_prompt(
    business_name: &str,
    business_model: BusinessModel,
    description: &str,
    asset_titles: &[String],
) -> String {
    let assets = asset_titles.join(", ");
    format!(
        "You are a consumer psychologist.\n\
         Identify three distinct target audience personas for this business:\n\n\
         Business name: {business_name}\n\
         Model: {business_model}\n\
         Description: {description}\n\
         Products and services: {assets}\n\n\
         {PERSONA_RULES}\n\n\
         Answer with JSON only, in this format:\n\
         {AUDIENCE_SCHEMA}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_embeds_inputs_and_schema() {
        let p = extraction_prompt("https://acme.co.il", "MAIN TEXT", "<style>.a{}</style>");
        assert!(p.contains("https://acme.co.il"));
        assert!(p.contains("MAIN TEXT"));
        assert!(p.contains("<style>.a{}</style>"));
        assert!(p.contains("\"extracted_assets\""));
        assert!(p.contains("\"imageUrl\""));
        assert!(p.contains("At most 40 words"));
    }

    #[test]
    fn usp_prompt_carries_draft_and_limits() {
        let p = usp_prompt("Acme", BusinessModel::Ecommerce, "https://acme.co.il", "old draft");
        assert!(p.contains("\"Acme\""));
        assert!(p.contains("ecommerce"));
        assert!(p.contains("old draft"));
        assert!(p.contains("250 characters"));
    }

    #[test]
    fn audience_prompt_lists_assets() {
        let titles = vec!["Shoes".to_string(), "Hats".to_string()];
        let p = audience_prompt("Acme", BusinessModel::Service, "We sell things", &titles);
        assert!(p.contains("Shoes, Hats"));
        assert!(p.contains("\"audiences\""));
    }
}
