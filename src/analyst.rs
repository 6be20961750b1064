use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystRequest {
    pub message: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalystResponse {
    pub response: String,
}

struct Topic {
    keywords: &'static [&'static str],
    response: &'static str,
}

// Matched in order; the first topic with any keyword hit wins.
static TOPICS: Lazy<Vec<Topic>> = Lazy::new(|| {
    vec![
        Topic {
            keywords: &["deforest", "forest", "tree"],
            response: "Deforestation is a critical environmental issue. Current trends show significant forest loss in tropical regions, with roughly 10 million hectares lost annually. This impacts biodiversity, carbon storage, and local climate patterns. Key actions include supporting reforestation projects, reducing paper consumption, and advocating for sustainable forestry practices.",
        },
        Topic {
            keywords: &["air", "pollution", "aqi", "quality"],
            response: "Air quality is measured using the Air Quality Index (AQI), ranging 0-500: Good (0-50), Moderate (51-100), Unhealthy for Sensitive Groups (101-150), Unhealthy (151-200), Very Unhealthy (201-300), Hazardous (301+). Major pollutants include PM2.5, PM10, ozone, CO, SO2, and NO2.",
        },
        Topic {
            keywords: &["water", "drought", "flood"],
            response: "Water resources are increasingly stressed by climate change. Key concerns: drought prediction from precipitation and soil-moisture models, pollution from industrial discharge and agricultural runoff, and accelerating glacier melt. Actions: conserve water, support watershed protection, reduce plastic use, and advocate for clean water policies.",
        },
        Topic {
            keywords: &["climate", "warming", "temperature"],
            response: "Climate change is the defining challenge of our time. Global average temperature has risen 1.1\u{b0}C above pre-industrial levels, driving extreme weather, sea-level rise, ocean acidification, and ecosystem disruption. Urgent action means renewable energy, energy efficiency, forest protection, and sustainable agriculture.",
        },
        Topic {
            keywords: &["action", "help", "do", "can i"],
            response: "Individual actions make a difference when multiplied across communities: reduce energy consumption, choose sustainable transportation, cut food waste, consume consciously, advocate for environmental policies, and monitor and report issues in your area.",
        },
    ]
});

const DEFAULT_RESPONSE: &str = "I'm your AI Environmental Analyst. I can provide insights on deforestation and land-use changes, air quality and pollution levels, water resources and drought prediction, climate change impacts, and actions you can take to make a difference. What specific environmental topic would you like to explore?";

/// Static fallback used by callers when a remote analyst is unreachable.
pub const OFFLINE_RESPONSE: &str = "I'm having trouble connecting right now. In the meantime: our system monitors deforestation, air quality, water pollution, and climate patterns using satellite data and machine learning. What specific aspect interests you?";

/// Keyword-matched static responder. Pure pass-through surface: lowercases
/// the message, picks the first matching topic, and always answers. An
/// unmatched message gets the default overview, never an error.
pub fn respond(request: &AnalystRequest) -> AnalystResponse {
    let lowered = request.message.to_lowercase();
    let response = TOPICS
        .iter()
        .find(|topic| topic.keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map_or(DEFAULT_RESPONSE, |topic| topic.response);

    AnalystResponse {
        response: response.to_string(),
    }
}
