use std::sync::Arc;

use serde_json::json;

use super::GlobalArgs;
use crate::auth::AuthState;
use crate::config::Config;
use crate::entity::{Note, NotesGroup, ProgressCategory, ShotCategory, ShotKey};
use crate::error::{Result, TrackerError};
use crate::repository::{NoteRepository, Outcome};
use crate::server;
use crate::tracker::TrackerController;

fn load_config(global: &GlobalArgs) -> Result<Config> {
    let config = Config::load()?;
    Ok(match &global.data_dir {
        Some(dir) => config.with_data_dir(dir.clone()),
        None => config,
    })
}

/// Open the stores and load the notes visible to the current user.
fn open_tracker(global: &GlobalArgs) -> Result<TrackerController> {
    let config = load_config(global)?;
    let repository = Arc::new(NoteRepository::open(&config)?);
    let mut tracker = TrackerController::new(repository);
    tracker.set_auth(AuthState::from_session(global.user.as_deref()));
    Ok(tracker)
}

/// Point the tracker at the note's shot and return its category and full id.
fn focus_note(tracker: &mut TrackerController, id: &str) -> Result<(ProgressCategory, String)> {
    let (shot, category, full_id) = tracker.notes().resolve(id)?;
    tracker.select_shot(shot);
    Ok((category, full_id))
}

fn find_note(tracker: &TrackerController, category: ProgressCategory, id: &str) -> Option<Note> {
    tracker
        .active_group()
        .and_then(|g| g.find(category, id))
        .cloned()
}

fn check_outcome(outcome: Outcome, action: &str) -> Result<()> {
    match outcome {
        Outcome::Applied => Ok(()),
        Outcome::NoOp => Err(TrackerError::Storage(format!("nothing to {}", action))),
        Outcome::Failed => Err(TrackerError::Storage(format!(
            "failed to {} note (see log for details)",
            action
        ))),
    }
}

fn print_banner(tracker: &TrackerController) {
    if let Some(banner) = tracker.storage_banner() {
        eprintln!("{}", banner);
    }
}

fn print_group(shot: &ShotKey, group: Option<&NotesGroup>) {
    println!("{} / {}", shot.category().name(), shot.shot_type());
    for category in ProgressCategory::ALL {
        println!("  {}", category.label());
        let notes = group.map(|g| g.get(category)).unwrap_or_default();
        if notes.is_empty() {
            println!("    (none)");
        }
        for note in notes {
            println!(
                "    {}  {}  {}",
                note.short_id(),
                note.date.format("%Y-%m-%d"),
                note.text
            );
        }
    }
}

pub fn handle_shots(json: bool) -> Result<()> {
    if json {
        let shots: Vec<_> = ShotCategory::ALL
            .into_iter()
            .map(|c| {
                json!({
                    "key": c,
                    "name": c.name(),
                    "types": c.shot_types().iter().map(|t| t.to_string()).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&shots)?);
        return Ok(());
    }

    for category in ShotCategory::ALL {
        let types: Vec<String> = category.shot_types().iter().map(|t| t.to_string()).collect();
        println!("{:<10} {}", category.name(), types.join(", "));
    }
    Ok(())
}

pub fn handle_list(
    global: &GlobalArgs,
    shot: Option<String>,
    shot_type: Option<String>,
    json: bool,
) -> Result<()> {
    let tracker = open_tracker(global)?;

    let category: Option<ShotCategory> = shot
        .as_deref()
        .map(str::parse::<ShotCategory>)
        .transpose()
        .map_err(TrackerError::InvalidShot)?;

    if let (Some(category), Some(shot_type)) = (category, shot_type.as_deref()) {
        let key = ShotKey::parse(&category.to_string(), shot_type)?;
        let group = tracker.notes().group(&key);
        if json {
            let empty = NotesGroup::default();
            println!("{}", serde_json::to_string_pretty(group.unwrap_or(&empty))?);
        } else {
            print_group(&key, group);
            print_banner(&tracker);
        }
        return Ok(());
    }

    let groups: Vec<_> = tracker
        .notes()
        .groups()
        .filter(|(key, group)| {
            !group.is_empty() && category.map_or(true, |c| key.category() == c)
        })
        .collect();

    if json {
        let map: serde_json::Map<String, serde_json::Value> = groups
            .iter()
            .map(|(key, group)| -> Result<(String, serde_json::Value)> {
                Ok((key.to_string(), serde_json::to_value(group)?))
            })
            .collect::<Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("No notes yet.");
    }
    for (i, (key, group)) in groups.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_group(key, Some(*group));
    }
    print_banner(&tracker);
    Ok(())
}

pub fn handle_add(
    global: &GlobalArgs,
    text: String,
    shot: String,
    shot_type: Option<String>,
    json: bool,
) -> Result<()> {
    let mut tracker = open_tracker(global)?;

    let category: ShotCategory = shot.parse().map_err(TrackerError::InvalidShot)?;
    tracker.select_shot_category(category);
    if let Some(shot_type) = shot_type {
        tracker.select_shot_type(shot_type.parse().map_err(TrackerError::InvalidShot)?)?;
    }

    if text.trim().is_empty() {
        eprintln!("Nothing to add: note text is empty");
        return Ok(());
    }

    tracker.set_draft(text);
    let note = tracker
        .submit_draft()
        .ok_or_else(|| TrackerError::Storage("failed to save note (see log for details)".to_string()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        let shot = note.shot();
        println!(
            "Added note ({}) to {} / {} - {}",
            note.short_id(),
            shot.category().name(),
            shot.shot_type(),
            note.text
        );
    }
    Ok(())
}

pub fn handle_move(global: &GlobalArgs, id: String, to: Option<String>, json: bool) -> Result<()> {
    let mut tracker = open_tracker(global)?;
    let (from, full_id) = focus_note(&mut tracker, &id)?;

    let to = match to {
        Some(to) => to.parse::<ProgressCategory>().map_err(TrackerError::InvalidCategory)?,
        None => from.next(),
    };

    check_outcome(tracker.move_to(&full_id, from, to), "move")?;

    let note = find_note(&tracker, to, &full_id).ok_or(TrackerError::NoteNotFound(full_id))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!(
            "Moved note ({}) from {} to {}",
            note.short_id(),
            from.label(),
            to.label()
        );
    }
    Ok(())
}

pub fn handle_edit(global: &GlobalArgs, id: String, text: String, json: bool) -> Result<()> {
    let mut tracker = open_tracker(global)?;
    let (category, full_id) = focus_note(&mut tracker, &id)?;

    tracker.begin_edit(&full_id, category)?;
    tracker.set_edit_buffer(text);
    check_outcome(tracker.commit_edit(category), "edit")?;

    let note = find_note(&tracker, category, &full_id).ok_or(TrackerError::NoteNotFound(full_id))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Updated note ({}) - {}", note.short_id(), note.text);
    }
    Ok(())
}

pub fn handle_delete(global: &GlobalArgs, id: String) -> Result<()> {
    let mut tracker = open_tracker(global)?;

    let (category, full_id) = match focus_note(&mut tracker, &id) {
        Ok(found) => found,
        Err(TrackerError::NoteNotFound(_)) => {
            println!("No note matching '{}', nothing deleted", id);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    match tracker.delete(&full_id, category) {
        Outcome::Failed => check_outcome(Outcome::Failed, "delete"),
        Outcome::Applied | Outcome::NoOp => {
            println!("Deleted note {}", full_id);
            Ok(())
        }
    }
}

pub fn handle_serve(global: &GlobalArgs, port: Option<u16>) -> Result<()> {
    let mut config = load_config(global)?;
    if let Some(port) = port {
        config.port = port;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(config))
}
