// Transcript replay
// Feeds a recorded session (server frames interleaved with user actions)
// through a running engine.

use anyhow::Result;
use log::{info, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::engine::actor::{EngineError, EngineHandle};
use crate::engine::UserAction;
use crate::models::{ActiveView, UserId};

/// One line of a JSON-lines transcript.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayStep {
    Frame { frame: serde_json::Value },
    SelectContact { user_id: UserId },
    SetView { view: ActiveView },
    Back,
    SendGroup { content: String },
    SendPrivate { content: String },
}

impl ReplayStep {
    fn into_action(self) -> Option<UserAction> {
        match self {
            ReplayStep::Frame { .. } => None,
            ReplayStep::SelectContact { user_id } => Some(UserAction::SelectContactById(user_id)),
            ReplayStep::SetView { view } => Some(UserAction::SetActiveView(view)),
            ReplayStep::Back => Some(UserAction::BackToContacts),
            ReplayStep::SendGroup { content } => Some(UserAction::SendGroupMessage(content)),
            ReplayStep::SendPrivate { content } => Some(UserAction::SendPrivateMessage(content)),
        }
    }
}

/// Parse a transcript. Blank lines and `#` comments are skipped; lines that
/// fail to parse are logged and skipped.
pub fn parse_transcript<R: BufRead>(reader: R) -> Result<Vec<ReplayStep>> {
    let mut steps = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<ReplayStep>(trimmed) {
            Ok(step) => steps.push(step),
            Err(e) => warn!("Skipping transcript line {}: {}", index + 1, e),
        }
    }
    Ok(steps)
}

pub fn load_transcript(path: &Path) -> Result<Vec<ReplayStep>> {
    let file = File::open(path)?;
    let steps = parse_transcript(BufReader::new(file))?;
    info!("Loaded {} steps from {}", steps.len(), path.display());
    Ok(steps)
}

/// Queue every step on the engine, in order.
pub async fn run(handle: &EngineHandle, steps: Vec<ReplayStep>) -> Result<usize, EngineError> {
    let count = steps.len();
    for step in steps {
        match step {
            ReplayStep::Frame { frame } => handle.push_frame(frame.to_string()).await?,
            other => {
                if let Some(action) = other.into_action() {
                    handle.act(action).await?;
                }
            }
        }
    }
    Ok(count)
}
