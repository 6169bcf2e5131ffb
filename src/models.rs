// Domain types: plays, playbooks, users, sessions, and model-generated payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

// ── Plays ─────────────────────────────────────────────────────────────

/// A player's pre-snap position on the 1200x600 field canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// A receiver's path: origin player, SVG path descriptor, and label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Player id the route starts from. Not validated against the play's
    /// player list (see save_play, which only warns on dangling origins).
    #[serde(rename = "from", alias = "from_player", default)]
    pub from_player: Option<String>,
    pub path: String,
    pub label: String,
    #[serde(rename = "routeType", alias = "route_type", default)]
    pub route_type: Option<String>,
    #[serde(default)]
    pub dash: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Play {
    pub name: String,
    pub formation: String,
    #[serde(default = "default_personnel")]
    pub personnel: String,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub concept: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

pub fn default_personnel() -> String {
    "11".to_string()
}

/// A play as persisted: the play itself plus its derived id, category, and tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlay {
    pub id: String,
    pub play: Play,
    pub category: String,
    pub tags: Vec<String>,
}

/// Derived play identifier: `"{category}_{slugified name}"`. Saving two plays
/// with the same name and category therefore overwrites (last write wins).
pub fn play_id(category: &str, name: &str) -> String {
    format!("{}_{}", category, name.to_lowercase().replace(' ', "_"))
}

/// High-water mark for issued id timestamps.
static LAST_ID_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Time-based entity id: `"{prefix}_{millis}"`. Two ids drawn within the same
/// millisecond must not collide (the store upserts, so a duplicate key would
/// silently replace the earlier record); the millisecond is bumped past the
/// last issued value to keep ids strictly increasing within the process.
pub fn entity_id(prefix: &str) -> String {
    let now = Utc::now().timestamp_millis();
    let prev = LAST_ID_MILLIS
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
            Some(last.max(now - 1) + 1)
        })
        .unwrap_or(now - 1);
    format!("{}_{}", prefix, prev.max(now - 1) + 1)
}

// ── Playbooks and sheets ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playbook {
    pub id: String,
    pub name: String,
    pub team: Option<String>,
    pub season: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    /// Ordered play ids, append-only and de-duplicated.
    pub plays: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaySheet {
    pub id: String,
    pub name: String,
    /// Free-text situation label, e.g. "3rd Down" or "Red Zone".
    pub situation: String,
    pub play_ids: Vec<String>,
    pub created_at: String,
}

// ── Users and sessions ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Coach,
    Assistant,
    Player,
}

impl Default for Role {
    fn default() -> Self {
        Role::Coach
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subscription {
    Free,
    Pro,
    Enterprise,
}

impl Default for Subscription {
    fn default() -> Self {
        Subscription::Free
    }
}

/// A user record as persisted (keyed by email). The credential is always an
/// argon2 PHC hash, never the plaintext password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub team: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub subscription: Subscription,
    pub created_at: String,
}

/// User shape returned to clients: everything except the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub name: String,
    pub team: Option<String>,
    pub role: Role,
    pub subscription: Subscription,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        UserPublic {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            team: user.team.clone(),
            role: user.role,
            subscription: user.subscription,
        }
    }
}

/// A bearer session (keyed by token). Valid until `expires_at` or explicit
/// logout; expiry is checked passively at validation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

// ── Model-generated payloads ──────────────────────────────────────────

/// Fixed-key coverage adjustments within an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustments {
    pub vs_man: String,
    pub vs_zone: String,
    pub vs_blitz: String,
}

/// Coaching analysis for a play. Wire names are camelCase, matching the JSON
/// shape the model is prompted to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub when_to_call: Vec<String>,
    pub best_against: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub coaching_points: Vec<String>,
    pub qb_progression: Vec<String>,
    pub adjustments: Adjustments,
    pub red_zone: String,
    pub key_matchups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blocking {
    pub scheme: String,
    #[serde(default)]
    pub assignments: BTreeMap<String, String>,
}

/// A complete play produced from a natural-language description. Extends the
/// core play shape with a blocking scheme and coaching notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPlay {
    pub name: String,
    pub formation: String,
    #[serde(default = "default_personnel")]
    pub personnel: String,
    #[serde(default)]
    pub concept: Option<String>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub blocking: Option<Blocking>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "coachingNotes", alias = "coaching_notes", default)]
    pub coaching_notes: Option<String>,
}

/// One offensive answer to a defensive scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterSuggestion {
    pub play_name: String,
    pub formation: String,
    pub concept: String,
    pub reasoning: String,
    pub key_points: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_id_slug() {
        assert_eq!(play_id("offense", "Mesh Drive"), "offense_mesh_drive");
        assert_eq!(play_id("red_zone", "PA Boot Right"), "red_zone_pa_boot_right");
        assert_eq!(play_id("offense", "Smash"), "offense_smash");
    }

    #[test]
    fn test_entity_ids_are_unique_back_to_back() {
        let ids: Vec<String> = (0..100).map(|_| entity_id("pb")).collect();
        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|id| id.starts_with("pb_")));
    }

    #[test]
    fn test_route_wire_names() {
        let route: Route = serde_json::from_str(
            r#"{"from": "X", "path": "M100 380 L 100 300", "label": "Go", "routeType": "vertical"}"#,
        )
        .unwrap();
        assert_eq!(route.from_player.as_deref(), Some("X"));
        assert_eq!(route.route_type.as_deref(), Some("vertical"));

        let out = serde_json::to_value(&route).unwrap();
        assert_eq!(out["from"], "X");
        assert_eq!(out["routeType"], "vertical");
    }

    #[test]
    fn test_play_defaults() {
        let play: Play =
            serde_json::from_str(r#"{"name": "Mesh", "formation": "Gun Trips Right"}"#).unwrap();
        assert_eq!(play.personnel, "11");
        assert!(play.players.is_empty());
        assert!(play.routes.is_empty());
    }

    #[test]
    fn test_analysis_wire_names_are_camel_case() {
        let analysis = AnalysisResult {
            when_to_call: vec!["3rd and medium".into()],
            best_against: vec!["Cover 2".into()],
            strengths: vec![],
            weaknesses: vec![],
            coaching_points: vec![],
            qb_progression: vec![],
            adjustments: Adjustments {
                vs_man: "m".into(),
                vs_zone: "z".into(),
                vs_blitz: "b".into(),
            },
            red_zone: "rz".into(),
            key_matchups: vec![],
        };
        let value = serde_json::to_value(&analysis).unwrap();
        assert!(value.get("whenToCall").is_some());
        assert!(value.get("qbProgression").is_some());
        assert!(value["adjustments"].get("vsBlitz").is_some());
    }
}
