//! Core domain types for site analysis results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Brand colour used when the model does not report one.
pub const DEFAULT_PRIMARY_COLOR: &str = "#6c39ca";

/// Accent colour used when the model does not report one.
pub const DEFAULT_SECONDARY_COLOR: &str = "#e0e7ff";

// ---------------------------------------------------------------------------
// PageType
// ---------------------------------------------------------------------------

/// Coarse classification of a site page, inferred from its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Product,
    Category,
    Blog,
    General,
}

impl PageType {
    /// Infer the page type from URL path markers (case-insensitive).
    ///
    /// Rules are checked in order and the first match wins.
    pub fn infer(url: &str) -> Self {
        let lower = url.to_lowercase();
        let has_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

        if has_any(&["/product", "/item", "/p/"]) {
            Self::Product
        } else if has_any(&["/collection", "/category", "/c/"]) {
            Self::Category
        } else if has_any(&["/blog", "/news", "/article", "/post"]) {
            Self::Blog
        } else {
            Self::General
        }
    }
}

// ---------------------------------------------------------------------------
// SiteLink
// ---------------------------------------------------------------------------

/// A page discovered on the analysed site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLink {
    /// Human-readable title.
    pub title: String,
    /// Absolute URL.
    pub url: String,
    /// Inferred page type.
    #[serde(rename = "type")]
    pub page_type: PageType,
}

impl SiteLink {
    /// Build a link, classifying it from its URL.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            title: title.into(),
            page_type: PageType::infer(&url),
            url,
        }
    }
}

// ---------------------------------------------------------------------------
// BusinessModel / AssetType
// ---------------------------------------------------------------------------

/// Business model classification reported by the extraction model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessModel {
    Ecommerce,
    #[default]
    Service,
    Knowledge,
    Portfolio,
    RealEstate,
}

impl BusinessModel {
    /// Parse a model label, falling back to [`BusinessModel::Service`].
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("ecommerce") => Self::Ecommerce,
            Some("knowledge") => Self::Knowledge,
            Some("portfolio") => Self::Portfolio,
            Some("real_estate") => Self::RealEstate,
            _ => Self::Service,
        }
    }

    /// Canonical catalog item type for this business model.
    pub fn asset_type(self) -> AssetType {
        match self {
            Self::Ecommerce => AssetType::Product,
            Self::RealEstate => AssetType::Property,
            Self::Portfolio => AssetType::Project,
            Self::Knowledge => AssetType::Course,
            Self::Service => AssetType::Service,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ecommerce => "ecommerce",
            Self::Service => "service",
            Self::Knowledge => "knowledge",
            Self::Portfolio => "portfolio",
            Self::RealEstate => "real_estate",
        }
    }
}

impl std::fmt::Display for BusinessModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of catalog item a business offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Product,
    Service,
    Property,
    Project,
    Course,
}

impl AssetType {
    /// Parse an asset type label; unknown labels yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "product" => Some(Self::Product),
            "service" => Some(Self::Service),
            "property" => Some(Self::Property),
            "project" => Some(Self::Project),
            "course" => Some(Self::Course),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// AssetItem / AudiencePersona
// ---------------------------------------------------------------------------

/// A catalog entry representing something the business offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Free text set when the catalog is edited by hand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Extra guidance attached to this item for downstream content generation.
    #[serde(
        default,
        rename = "aiInstructions",
        skip_serializing_if = "Option::is_none"
    )]
    pub ai_instructions: Option<String>,
    pub selected: bool,
    pub verified: bool,
}

/// A short profile of one target-customer segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudiencePersona {
    pub title: String,
    pub description: String,
    pub selected: bool,
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// Final output of one site analysis run.
///
/// Built once by the orchestrator and handed to the caller, which owns any
/// later edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Normalized input URL the analysis ran against.
    pub website_url: String,
    pub business_name: String,
    pub business_model: BusinessModel,
    /// Unique selling proposition / short business description.
    pub usp: String,
    /// At most three personas.
    pub target_audiences: Vec<AudiencePersona>,
    pub primary_color: String,
    pub secondary_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Never empty.
    pub assets: Vec<AssetItem>,
    /// Sitemap-discovered links first, then links scanned from page content.
    pub site_map: Vec<SiteLink>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Replace the USP text with a regenerated one.
    pub fn apply_usp(&mut self, usp: String) {
        self.usp = usp;
    }

    /// Replace the persona list with a regenerated one.
    pub fn apply_audiences(&mut self, audiences: Vec<AudiencePersona>) {
        self.target_audiences = audiences;
    }

    /// Titles of all catalog assets, in order.
    pub fn asset_titles(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.title.clone()).collect()
    }
}
