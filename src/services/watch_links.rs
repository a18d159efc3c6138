use reqwest::Url;
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Streaming services a provider name can be linked to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreamingPlatform {
    Netflix,
    PrimeVideo,
    DisneyPlus,
    AppleTv,
    HboGo,
    GooglePlay,
}

impl StreamingPlatform {
    pub const ALL: [StreamingPlatform; 6] = [
        StreamingPlatform::Netflix,
        StreamingPlatform::PrimeVideo,
        StreamingPlatform::DisneyPlus,
        StreamingPlatform::AppleTv,
        StreamingPlatform::HboGo,
        StreamingPlatform::GooglePlay,
    ];

    /// Lower-case fragments that identify the platform in a provider name
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            StreamingPlatform::Netflix => &["netflix"],
            StreamingPlatform::PrimeVideo => &["prime video", "primevideo", "amazon"],
            StreamingPlatform::DisneyPlus => &["disney", "hotstar"],
            StreamingPlatform::AppleTv => &["apple tv", "appletv", "itunes", "apple"],
            StreamingPlatform::HboGo => &["hbo"],
            StreamingPlatform::GooglePlay => &["google play", "play movies"],
        }
    }

    /// Search page base URL, the title parameter name and any fixed parameters
    fn search_template(&self) -> (&'static str, &'static str, &'static [(&'static str, &'static str)]) {
        match self {
            StreamingPlatform::Netflix => ("https://www.netflix.com/search", "q", &[]),
            StreamingPlatform::PrimeVideo => (
                "https://www.primevideo.com/search/ref=atv_sr_sug_1",
                "phrase",
                &[],
            ),
            StreamingPlatform::DisneyPlus => ("https://www.disneyplus.com/search", "q", &[]),
            StreamingPlatform::AppleTv => ("https://tv.apple.com/search", "term", &[]),
            StreamingPlatform::HboGo => ("https://www.hbogo.co.th/search", "q", &[]),
            StreamingPlatform::GooglePlay => (
                "https://play.google.com/store/search",
                "q",
                &[("c", "movies")],
            ),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StreamingPlatform::Netflix => "Netflix",
            StreamingPlatform::PrimeVideo => "Prime Video",
            StreamingPlatform::DisneyPlus => "Disney+",
            StreamingPlatform::AppleTv => "Apple TV",
            StreamingPlatform::HboGo => "HBO Go",
            StreamingPlatform::GooglePlay => "Google Play",
        }
    }

    /// Recognises a catalog provider name such as "Amazon Prime Video"
    pub fn from_provider_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        let platform = Self::ALL
            .into_iter()
            .find(|platform| platform.keywords().iter().any(|k| name.contains(k)));

        if platform.is_none() {
            tracing::debug!(provider = %name, "No deep link for provider");
        }
        platform
    }

    /// The platform's search page for a movie title
    pub fn search_url(&self, title: &str) -> AppResult<Url> {
        let (base, title_param, fixed) = self.search_template();
        let mut url = Url::parse(base)
            .map_err(|e| AppError::Internal(format!("Invalid search URL {}: {}", base, e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(title_param, title);
            for (key, value) in fixed {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Deep link for a provider name, if the provider is a known platform
pub fn provider_link(provider_name: &str, title: &str) -> AppResult<Option<Url>> {
    StreamingPlatform::from_provider_name(provider_name)
        .map(|platform| platform.search_url(title))
        .transpose()
}
