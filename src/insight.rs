// Coaching-insight generator: prompt construction, model invocation, response
// validation, and the per-operation degradation policy.
//
// All three operations share the same pipeline (build prompt, call model with
// a JSON response hint, parse) but degrade differently on failure:
//   - analysis falls back to a static default and never fails,
//   - play generation surfaces an explicit error (a fabricated play would be
//     actively misleading),
//   - counter suggestions collapse to an empty list (advisory only).

use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::llm::{ChatModel, ChatRequest, ModelError};
use crate::metrics;
use crate::models::{Adjustments, AnalysisResult, CounterSuggestion, GeneratedPlay, Route};

const ANALYST_SYSTEM: &str = "You are an expert football coach with deep knowledge of offensive \
                              schemes, defensive coverages, and game strategy.";
const DESIGNER_SYSTEM: &str = "You are an expert football coach and play designer.";
const COORDINATOR_SYSTEM: &str = "You are an expert offensive coordinator.";

#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("malformed model response: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub struct InsightService {
    model: Arc<dyn ChatModel>,
}

impl InsightService {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Analyze a play. Always produces a result: if the model call fails or
    /// returns something unusable, the caller gets the static default
    /// analysis instead of an error.
    pub async fn analyze_play(
        &self,
        play_name: &str,
        formation: &str,
        personnel: &str,
        routes: &[Route],
        concept: Option<&str>,
    ) -> AnalysisResult {
        let prompt = analysis_prompt(play_name, formation, personnel, routes, concept);
        match self
            .complete_json::<AnalysisResult>("analyze", ANALYST_SYSTEM, prompt, 0.7, 1500)
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!("Play analysis failed, serving default analysis: {e}");
                metrics::ANALYSIS_FALLBACKS_TOTAL.inc();
                default_analysis()
            }
        }
    }

    /// Generate a complete play from a natural-language description. There is
    /// no fallback here: failure is reported, never papered over.
    pub async fn generate_play(&self, description: &str) -> Result<GeneratedPlay, InsightError> {
        let prompt = generation_prompt(description);
        self.complete_json("generate", DESIGNER_SYSTEM, prompt, 0.8, 2000)
            .await
    }

    /// Suggest plays that attack a defensive scheme. Advisory: any failure,
    /// and a payload without the expected `"plays"` key, yield an empty list.
    pub async fn suggest_counter_plays(&self, defensive_scheme: &str) -> Vec<CounterSuggestion> {
        let prompt = counter_prompt(defensive_scheme);
        let value = match self
            .complete_json::<serde_json::Value>("counters", COORDINATOR_SYSTEM, prompt, 0.7, 1000)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Counter suggestion failed, returning no suggestions: {e}");
                return Vec::new();
            }
        };
        // The model wraps the array under a "plays" key; missing key or
        // non-conforming items degrade to empty rather than erroring.
        value
            .get("plays")
            .cloned()
            .and_then(|plays| serde_json::from_value(plays).ok())
            .unwrap_or_default()
    }

    async fn complete_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        system: &str,
        prompt: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<T, InsightError> {
        metrics::MODEL_CALLS_TOTAL.with_label_values(&[operation]).inc();
        let result: Result<T, InsightError> = async {
            let text = self
                .model
                .complete(ChatRequest {
                    system: system.to_string(),
                    prompt,
                    temperature,
                    max_tokens,
                })
                .await?;
            Ok(serde_json::from_str(&text)?)
        }
        .await;
        if result.is_err() {
            metrics::MODEL_FAILURES_TOTAL
                .with_label_values(&[operation])
                .inc();
        }
        result
    }
}

// ── Prompt construction (deterministic given the inputs) ──────────────

pub fn analysis_prompt(
    play_name: &str,
    formation: &str,
    personnel: &str,
    routes: &[Route],
    concept: Option<&str>,
) -> String {
    let routes_json =
        serde_json::to_string_pretty(routes).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"You are an expert football coach analyzing a play. Provide detailed coaching analysis for:

Play: {play_name}
Formation: {formation}
Personnel: {personnel}
Concept: {concept}
Routes: {routes_json}

Provide analysis in the following JSON format:
{{
    "whenToCall": [3-4 specific game situations when this play is effective],
    "bestAgainst": [3-4 defensive schemes/coverages this beats],
    "strengths": [3-4 key advantages of this play],
    "weaknesses": [2-3 vulnerabilities to watch for],
    "coachingPoints": [3-4 key coaching points for execution],
    "qbProgression": [3-5 step QB read progression],
    "adjustments": {{
        "vsMan": "Adjustment against man coverage",
        "vsZone": "Adjustment against zone coverage",
        "vsBlitz": "Hot route adjustment for blitz"
    }},
    "redZone": "Effectiveness and adjustments in red zone",
    "keyMatchups": [2-3 critical player matchups for success]
}}

Be specific, practical, and use real football terminology. Focus on actionable coaching insights."#,
        concept = concept.unwrap_or("Custom"),
    )
}

pub fn generation_prompt(description: &str) -> String {
    format!(
        r#"You are an expert football coach. Generate a complete football play based on this description:

"{description}"

Return a JSON object with:
{{
    "name": "Play name",
    "formation": "Formation name (e.g., Gun Trips Right, I-Form Strong)",
    "personnel": "Personnel grouping (e.g., 11, 12, 21)",
    "concept": "Core concept (e.g., Mesh, Smash, Power)",
    "players": [
        {{"id": "position", "x": x_coord, "y": y_coord}}
    ],
    "routes": [
        {{
            "from": "player_id",
            "routeType": "route name",
            "path": "SVG path string",
            "label": "Route label"
        }}
    ],
    "blocking": {{
        "scheme": "Blocking scheme name",
        "assignments": {{"position": "assignment"}}
    }},
    "description": "Brief play description",
    "coachingNotes": "Key coaching points"
}}

Use standard football positions: QB, RB, FB, X, Z, Y, F, H, C, LG, RG, LT, RT
Field dimensions: 1200px wide x 600px tall, offense starts around y=380"#
    )
}

pub fn counter_prompt(defensive_scheme: &str) -> String {
    format!(
        r#"You are an expert offensive coordinator. Suggest 5 effective plays against: {defensive_scheme}

For each play, provide:
{{
    "playName": "Name of the play",
    "formation": "Offensive formation",
    "concept": "Core concept",
    "reasoning": "Why this works against {defensive_scheme}",
    "keyPoints": ["2-3 execution keys"]
}}

Return as a JSON object with the suggestions under a "plays" key."#
    )
}

// ── Static fallback analysis ──────────────────────────────────────────

/// Context-free default analysis, served whenever the model path fails.
pub fn default_analysis() -> AnalysisResult {
    AnalysisResult {
        when_to_call: vec![
            "3rd and medium (4-7 yards)".to_string(),
            "Red zone situations".to_string(),
            "2-minute drill".to_string(),
            "After successful run plays".to_string(),
        ],
        best_against: vec![
            "Cover 2 defense".to_string(),
            "Man coverage".to_string(),
            "Aggressive blitzing teams".to_string(),
        ],
        strengths: vec![
            "Multiple options for quarterback".to_string(),
            "Can exploit mismatches".to_string(),
            "Good ball control play".to_string(),
        ],
        weaknesses: vec![
            "Takes time to develop".to_string(),
            "Vulnerable to interior pressure".to_string(),
        ],
        coaching_points: vec![
            "Ensure proper spacing between receivers".to_string(),
            "QB must go through full progression".to_string(),
            "RB check protection first".to_string(),
        ],
        qb_progression: vec![
            "Pre-snap: Identify Mike linebacker".to_string(),
            "First read: Quick game concept".to_string(),
            "Second read: Intermediate routes".to_string(),
            "Checkdown: RB in flat".to_string(),
        ],
        adjustments: Adjustments {
            vs_man: "Convert to quick slants and hot routes".to_string(),
            vs_zone: "Sit in open windows, work option routes".to_string(),
            vs_blitz: "RB stays in for protection, hot route to slot".to_string(),
        },
        red_zone: "Effective inside the 20, consider fade routes to corners".to_string(),
        key_matchups: vec![
            "Slot receiver vs nickel corner".to_string(),
            "X receiver vs boundary corner".to_string(),
        ],
    }
}
