//! Stage content fetched on phase entry: simulated discussion, lecturette outline,
//! PPDT picture description, and spoken narration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::FALLBACK_PPDT_PICTURES;
use crate::error::{CoreResult, GatewayError};
use crate::gateway::{decode, AiGateway};
use crate::types::{DiscussionPoint, Scenario, Speaker, Topic};

fn discussion_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "points": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "speaker": { "type": "STRING" },
                        "text": { "type": "STRING" }
                    },
                    "required": ["speaker", "text"]
                }
            }
        },
        "required": ["points"]
    })
}

#[derive(Deserialize)]
struct RawPoints {
    points: Vec<RawPoint>,
}

#[derive(Deserialize)]
struct RawPoint {
    speaker: String,
    text: String,
}

fn speaker_from(name: &str) -> Speaker {
    let trimmed = name.trim();
    if trimmed.eq_ignore_ascii_case("gto")
        || trimmed.to_ascii_lowercase().contains("testing officer")
    {
        Speaker::Gto
    } else if trimmed.is_empty() {
        Speaker::Peer("Candidate".into())
    } else {
        Speaker::Peer(trimmed.to_owned())
    }
}

/// Simulated group members reacting to the candidate's individual solution.
///
/// # Errors
///
/// Gateway failures; [`GatewayError::Malformed`] when no point has text.
pub async fn discussion_points(
    gateway: &dyn AiGateway,
    scenario: &Scenario,
    individual_solution: &str,
) -> Result<Vec<DiscussionPoint>, GatewayError> {
    let prompt = format!(
        "Simulate a Group Planning Exercise discussion at an SSB. Scenario:\n{}\n\n\
         One candidate proposed:\n{}\n\n\
         Produce 5 short discussion points from other candidates named \"Candidate 2\" to \
         \"Candidate 6\", some agreeing, some challenging priorities or resource use. One \
         point may come from the GTO steering the group.",
        scenario.narrative,
        if individual_solution.trim().is_empty() {
            "(no solution written)"
        } else {
            individual_solution
        }
    );
    let value = gateway.generate_json(&prompt, &discussion_schema()).await?;
    let raw = value.to_string();
    let parsed: RawPoints = decode(value)?;
    let points: Vec<DiscussionPoint> = parsed
        .points
        .into_iter()
        .filter(|p| !p.text.trim().is_empty())
        .map(|p| DiscussionPoint {
            speaker: speaker_from(&p.speaker),
            text: p.text.trim().to_owned(),
        })
        .collect();
    if points.is_empty() {
        return Err(GatewayError::malformed("no discussion points", raw));
    }
    Ok(points)
}

/// Talking-point outline for a lecturette topic.
///
/// # Errors
///
/// Gateway failures.
pub async fn lecturette_outline(
    gateway: &dyn AiGateway,
    topic: &Topic,
) -> Result<String, GatewayError> {
    let prompt = format!(
        "Prepare a concise outline for a 3-minute SSB lecturette on \"{}\" ({}). Give an \
         opening line, three main points with one fact each, and a conclusion. Plain text, \
         one point per line.",
        topic.title, topic.category
    );
    let text = gateway.generate_text(&prompt).await?;
    Ok(text.trim().to_owned())
}

/// A hazy, ambiguous scene for the PPDT, described in words.
///
/// Never fails: a provider failure picks one of the built-in scenes by `seed`.
pub async fn ppdt_picture(gateway: &dyn AiGateway, seed: u64) -> (String, bool) {
    const PROMPT: &str = "Describe, in 3 or 4 sentences, a hazy and ambiguous black-and-white \
        picture suitable for the SSB Picture Perception and Description Test. Mention the \
        setting, the number of people and what each seems to be doing, but leave the mood \
        and outcome open to interpretation. Describe only the picture.";
    match gateway.generate_text(PROMPT).await {
        Ok(text) if text.split_whitespace().count() >= 10 => (text.trim().to_owned(), false),
        Ok(text) => {
            tracing::warn!(raw = %text, "PPDT picture description too short; using built-in scene");
            (fallback_picture(seed).to_owned(), true)
        }
        Err(e) => {
            crate::gateway::log_failure("ppdt picture", &e);
            (fallback_picture(seed).to_owned(), true)
        }
    }
}

pub fn fallback_picture(seed: u64) -> &'static str {
    let idx = (seed % FALLBACK_PPDT_PICTURES.len() as u64) as usize;
    FALLBACK_PPDT_PICTURES[idx]
}

/// Synthesizes `text` in the GTO voice and writes `<dir>/<stem>.wav`.
///
/// # Errors
///
/// Gateway failures and I/O errors creating the directory or writing the file.
pub async fn speak_to_file(
    gateway: &dyn AiGateway,
    text: &str,
    dir: &Path,
    stem: &str,
) -> CoreResult<PathBuf> {
    let wav = gateway.synthesize_speech(text).await?;
    tokio::fs::create_dir_all(dir).await?;
    let safe: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let path = dir.join(format!("{safe}.wav"));
    tokio::fs::write(&path, wav).await?;
    tracing::info!(path = %path.display(), "narration audio written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speaker_names_map_to_roles() {
        assert_eq!(speaker_from("GTO"), Speaker::Gto);
        assert_eq!(speaker_from("Group Testing Officer"), Speaker::Gto);
        assert_eq!(speaker_from(" Candidate 4 "), Speaker::Peer("Candidate 4".into()));
    }

    #[test]
    fn fallback_picture_cycles() {
        let n = FALLBACK_PPDT_PICTURES.len() as u64;
        assert_eq!(fallback_picture(0), fallback_picture(n));
        assert_ne!(fallback_picture(0), fallback_picture(1));
    }
}
