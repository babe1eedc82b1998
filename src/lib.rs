mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod members;
pub mod presence;
pub mod render;
pub mod state;
pub mod storage;
pub mod suggest;
pub mod task;

pub use config::{load_app_config, AppConfig};
pub use error::{AppError, AppResult};

use std::time::Duration;

use editor::{CanvasSession, RandomLabelPolicy, SessionOptions, ToolKind};
use geometry::Point;
use state::TaskStatus;
use storage::{AnnotationStorage, MemoryStorage};
use suggest::SuggestStatus;

/// Extra time allowed past the configured suggestion delays.
const SUGGESTION_WAIT_SLACK: Duration = Duration::from_secs(1);

/// Opens a canvas session for `config.demo_task`, wired the way the editor
/// page wires it.
pub fn open_session<S: AnnotationStorage + ?Sized>(
    storage: &S,
    config: &AppConfig,
) -> AppResult<CanvasSession> {
    let task = storage.load_task(&config.demo_task)?;
    let annotations = storage.load_annotations(&task.id)?;
    let options = SessionOptions {
        active_user: config.active_user.clone(),
        is_owner: true,
        origin: Point::default(),
        surface_width: config.surface_width,
        surface_height: config.surface_height,
        suggestion_delays: config.suggestion_delays(),
    };
    Ok(CanvasSession::new(task, annotations, options)
        .with_label_policy(Box::new(RandomLabelPolicy::new(config.labels.clone()))))
}

/// Draws one box, runs a suggestion round and accepts the batch.
fn annotate(session: &mut CanvasSession, config: &AppConfig) -> AppResult<()> {
    if session.status() == TaskStatus::Todo {
        session.start_task()?;
    }

    session.set_tool(ToolKind::BBox);
    session.pointer_down(Point::new(250.0, 60.0));
    session.pointer_move(Point::new(330.0, 110.0));
    session.pointer_up(Point::new(330.0, 110.0));
    session.set_tool(ToolKind::Select);

    session.request_suggestions()?;
    let delays = config.suggestion_delays();
    let status =
        session.wait_for_suggestions(delays.queued + delays.running + SUGGESTION_WAIT_SLACK);
    if status != SuggestStatus::Ready {
        tracing::warn!(?status, "suggestions did not arrive in time");
        return Ok(());
    }

    session.open_review();
    let ids: Vec<String> = session
        .review()
        .pending()
        .iter()
        .map(|suggestion| suggestion.id.clone())
        .collect();
    for id in &ids {
        session.mark_suggestion_adjusted(id);
    }
    session.apply_suggestions()?;
    Ok(())
}

/// Entrypoint used by higher-level integrations and CLI bindings.
pub fn run() -> AppResult<()> {
    logging::init();
    tracing::info!("starting LabelForge");

    let config = load_app_config();
    let mut storage = MemoryStorage::with_demo_data();
    let mut session = open_session(&storage, &config)?;

    if session.is_locked() {
        tracing::info!(task_id = %session.task().id, "task is confirmed; rendering read-only");
    } else {
        annotate(&mut session, &config)?;
    }

    let mut task = session.task().clone();
    task.annotation_count = u32::try_from(session.annotations().len()).unwrap_or(u32::MAX);
    storage.save_annotations(&task.id, session.annotations())?;
    storage.save_task(&task)?;
    session.render_to_png(&config.output_path)?;

    tracing::info!(
        task_id = %task.id,
        status = task.status.as_str(),
        annotations = task.annotation_count,
        "session saved"
    );
    Ok(())
}
