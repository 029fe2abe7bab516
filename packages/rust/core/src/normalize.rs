//! Turning the model's loosely-typed answer into an [`AnalysisResult`].
//!
//! Every field of the answer is optional. Missing or blank values fall back
//! to fixed defaults, and the asset list is never left empty.

use std::collections::HashSet;

use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use siteprofiler_shared::{
    AnalysisResult, AssetItem, AssetType, AudiencePersona, BusinessModel, DEFAULT_PRIMARY_COLOR,
    DEFAULT_SECONDARY_COLOR, Result, SiteLink, SiteProfilerError, resolve_url,
};

/// Title given to an extracted asset with no name.
pub const UNNAMED_ASSET_TITLE: &str = "פריט ללא שם";

/// Title of the synthesized home-page asset.
pub const FALLBACK_ASSET_TITLE: &str = "דף הבית";

/// Title given to a site-map page promoted to an asset without a title.
pub const UNNAMED_PAGE_TITLE: &str = "דף ללא שם";

/// Personas kept from one answer.
pub const MAX_PERSONAS: usize = 3;

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

/// The extraction answer as the model sends it.
///
/// `null` is accepted anywhere a value is expected.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExtractionResponse {
    pub business_name: Option<String>,
    pub business_model: Option<String>,
    pub description_usp: Option<String>,
    pub target_audiences: Option<Vec<RawPersona>>,
    pub visuals: Option<Visuals>,
    pub extracted_assets: Option<Vec<ExtractedAsset>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPersona {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Visuals {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExtractedAsset {
    pub title: Option<String>,
    #[serde(rename = "imageUrl", alias = "image_url")]
    pub image_url: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
}

/// Regenerated personas as the model sends them.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AudienceResponse {
    pub audiences: Option<Vec<RawPersona>>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Build the final result for `website_url` from a model answer.
///
/// Relative image, logo and link URLs are resolved against `website_url`.
/// Assets pointing at the same page are collapsed to the first one.
/// `site_map` is stored as given.
pub fn build_result(
    response: ExtractionResponse,
    website_url: &str,
    site_map: Vec<SiteLink>,
) -> AnalysisResult {
    let business_model = BusinessModel::parse_or_default(response.business_model.as_deref());
    let default_type = business_model.asset_type();

    let mut assets: Vec<AssetItem> = response
        .extracted_assets
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, raw)| asset_from_extracted(index, raw, website_url, default_type))
        .collect();
    dedup_assets(&mut assets, website_url);

    if assets.is_empty() {
        debug!("no assets extracted, synthesizing home page asset");
        assets.push(fallback_asset(website_url, default_type));
    }

    let visuals = response.visuals.unwrap_or_default();

    AnalysisResult {
        website_url: website_url.to_string(),
        business_name: non_blank(response.business_name)
            .unwrap_or_else(|| name_from_url(website_url)),
        business_model,
        usp: non_blank(response.description_usp).unwrap_or_default(),
        target_audiences: personas(response.target_audiences.unwrap_or_default()),
        primary_color: non_blank(visuals.primary_color)
            .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
        secondary_color: non_blank(visuals.secondary_color)
            .unwrap_or_else(|| DEFAULT_SECONDARY_COLOR.to_string()),
        logo_url: resolve_url(visuals.logo_url.as_deref(), website_url),
        assets,
        site_map,
        analyzed_at: Utc::now(),
    }
}

/// Keep the first three personas, all selected.
pub fn personas(raw: Vec<RawPersona>) -> Vec<AudiencePersona> {
    raw.into_iter()
        .take(MAX_PERSONAS)
        .map(|p| AudiencePersona {
            title: p.title.unwrap_or_default().trim().to_string(),
            description: p.description.unwrap_or_default().trim().to_string(),
            selected: true,
        })
        .collect()
}

/// Drop assets that repeat an earlier one, keeping the first.
///
/// Assets are keyed by their link. An asset whose link is the site itself
/// (no page of its own) is keyed by link and image together.
fn dedup_assets(assets: &mut Vec<AssetItem>, website_url: &str) {
    let before = assets.len();
    let mut seen = HashSet::new();
    assets.retain(|asset| {
        let link = asset.link.clone().unwrap_or_default();
        let image = if link == website_url {
            asset.image_url.clone()
        } else {
            None
        };
        seen.insert((link, image))
    });
    if assets.len() < before {
        debug!(dropped = before - assets.len(), "dropped duplicate assets");
    }
}

/// Add the given site-map pages to `profile`'s catalog.
///
/// Repeated URLs count once and pages already in the catalog are skipped.
/// Every URL must be in the profile's site map. Returns how many assets
/// were added.
pub fn add_site_map_assets(profile: &mut AnalysisResult, urls: &[String]) -> Result<usize> {
    let mut wanted: Vec<&str> = Vec::with_capacity(urls.len());
    for url in urls {
        if !wanted.contains(&url.as_str()) {
            wanted.push(url);
        }
    }

    let selected: Vec<SiteLink> = wanted
        .iter()
        .filter_map(|url| profile.site_map.iter().find(|link| link.url == *url))
        .cloned()
        .collect();
    if selected.len() < wanted.len() {
        return Err(SiteProfilerError::validation(format!(
            "{} of the given URLs are not in the profile's site map",
            wanted.len() - selected.len()
        )));
    }

    let fresh: Vec<SiteLink> = selected
        .into_iter()
        .filter(|link| {
            let id = format!("map-{}", link.url);
            !profile
                .assets
                .iter()
                .any(|a| a.id == id || a.link.as_deref() == Some(link.url.as_str()))
        })
        .collect();

    let added = assets_from_site_links(&fresh, profile.business_model);
    let count = added.len();
    profile.assets.extend(added);
    Ok(count)
}

/// Promote site-map pages to catalog assets typed by `model`.
pub fn assets_from_site_links(links: &[SiteLink], model: BusinessModel) -> Vec<AssetItem> {
    let asset_type = model.asset_type();
    links
        .iter()
        .map(|link| {
            let title = link.title.trim();
            AssetItem {
                id: format!("map-{}", link.url),
                title: if title.is_empty() {
                    UNNAMED_PAGE_TITLE.to_string()
                } else {
                    title.to_string()
                },
                asset_type,
                image_url: None,
                images: Vec::new(),
                link: Some(link.url.clone()),
                description: None,
                price: None,
                ai_instructions: None,
                selected: true,
                verified: true,
            }
        })
        .collect()
}

fn asset_from_extracted(
    index: usize,
    raw: ExtractedAsset,
    website_url: &str,
    default_type: AssetType,
) -> AssetItem {
    let image_url = resolve_url(raw.image_url.as_deref(), website_url);
    AssetItem {
        id: format!("asset-{index}"),
        title: non_blank(raw.title).unwrap_or_else(|| UNNAMED_ASSET_TITLE.to_string()),
        asset_type: raw
            .asset_type
            .as_deref()
            .and_then(AssetType::parse)
            .unwrap_or(default_type),
        images: image_url.iter().cloned().collect(),
        image_url,
        link: Some(
            resolve_url(raw.link.as_deref(), website_url)
                .unwrap_or_else(|| website_url.to_string()),
        ),
        description: None,
        price: None,
        ai_instructions: None,
        selected: true,
        verified: true,
    }
}

fn fallback_asset(website_url: &str, asset_type: AssetType) -> AssetItem {
    AssetItem {
        id: "fallback-1".to_string(),
        title: FALLBACK_ASSET_TITLE.to_string(),
        asset_type,
        image_url: None,
        images: Vec::new(),
        link: Some(website_url.to_string()),
        description: None,
        price: None,
        ai_instructions: None,
        selected: true,
        verified: true,
    }
}

/// First label of the host: `https://www.acme.co.il/x` → `acme`.
fn name_from_url(website_url: &str) -> String {
    let host = website_url
        .split_once("://")
        .map_or(website_url, |(_, rest)| rest);
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.split(['.', '/', ':'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(website_url)
        .to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
