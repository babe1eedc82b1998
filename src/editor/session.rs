use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use image::{ImageFormat, RgbaImage};

use super::interaction::{DragMode, DragState, InteractionState, SelectionTarget};
use super::labels::{default_palette, LabelPolicy, RandomLabelPolicy};
use super::tools::{
    move_vertex, resize_corners, translate_vertices, Annotation, AnnotationShape, AnnotationStore,
    AnnotationStyle, PolygonDraft, PolygonStep, ToolKind,
};
use super::EditorViewport;
use crate::error::{AppError, AppResult};
use crate::geometry::{nearest_handle, nearest_vertex, Point};
use crate::input::{resolve_shortcut, InputContext, ShortcutAction, ShortcutKey, ShortcutModifiers};
use crate::presence::PresenceBoard;
use crate::render::{build_scene, rasterize, DraftPreview, RenderResult, Scene, SceneInput};
use crate::state::{StateTransition, TaskStatus};
use crate::suggest::{
    DemoSuggestionProvider, SuggestStatus, SuggestionDelays, SuggestionError, SuggestionJob,
    SuggestionProvider, SuggestionReview,
};
use crate::task::{Task, TaskLifecycle};

/// A drawn box commits only when both sides exceed this many screen pixels.
pub const MIN_BOX_EXTENT_PX: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub active_user: String,
    pub is_owner: bool,
    /// Top-left of the drawing surface in client coordinates.
    pub origin: Point,
    pub surface_width: u32,
    pub surface_height: u32,
    pub suggestion_delays: SuggestionDelays,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            active_user: "Alex Kim".to_string(),
            is_owner: true,
            origin: Point::default(),
            surface_width: 640,
            surface_height: 480,
            suggestion_delays: SuggestionDelays::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    AnnotationCreated(String),
    AnnotationUpdated(String),
    AnnotationDeleted(String),
    SuggestionsApplied(Vec<String>),
    TaskUpdated(Task),
}

pub type TaskListener = Box<dyn FnMut(&Task) + Send>;

/// Modal prompt guarding a task status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskDialog {
    Confirm,
    Reopen { reason: String },
}

/// The editor for one task: owns its annotations, pending suggestions and
/// all pointer/keyboard interaction state.
pub struct CanvasSession {
    lifecycle: TaskLifecycle,
    store: AnnotationStore,
    review: SuggestionReview,
    job: Option<SuggestionJob>,
    provider: Arc<dyn SuggestionProvider>,
    viewport: EditorViewport,
    tool: ToolKind,
    selection: Option<SelectionTarget>,
    interaction: InteractionState,
    labels: Box<dyn LabelPolicy>,
    presence: PresenceBoard,
    options: SessionOptions,
    events: Vec<SessionEvent>,
    task_listener: Option<TaskListener>,
    dialog: Option<TaskDialog>,
    text_input_active: bool,
}

impl std::fmt::Debug for CanvasSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasSession")
            .field("task_id", &self.lifecycle.task().id)
            .field("status", &self.lifecycle.status())
            .field("annotations", &self.store.len())
            .field("tool", &self.tool)
            .field("selection", &self.selection)
            .field("interaction", &self.interaction.name())
            .finish_non_exhaustive()
    }
}

impl CanvasSession {
    pub fn new(task: Task, annotations: Vec<Annotation>, options: SessionOptions) -> Self {
        let store = AnnotationStore::with_annotations(task.id.clone(), annotations);
        let presence = PresenceBoard::demo().without_user(&options.active_user);
        tracing::debug!(
            task_id = %task.id,
            status = ?task.status,
            annotations = store.len(),
            "open canvas session"
        );
        Self {
            lifecycle: TaskLifecycle::new(task),
            store,
            review: SuggestionReview::new(),
            job: None,
            provider: Arc::new(DemoSuggestionProvider),
            viewport: EditorViewport::new(),
            tool: ToolKind::default(),
            selection: None,
            interaction: InteractionState::Idle,
            labels: Box::new(RandomLabelPolicy::new(default_palette())),
            presence,
            options,
            events: Vec::new(),
            task_listener: None,
            dialog: None,
            text_input_active: false,
        }
    }

    pub fn with_label_policy(mut self, labels: Box<dyn LabelPolicy>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_suggestion_provider(mut self, provider: Arc<dyn SuggestionProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Called with the updated task after every status change.
    pub fn on_task_updated(&mut self, listener: impl FnMut(&Task) + Send + 'static) {
        self.task_listener = Some(Box::new(listener));
    }

    pub fn task(&self) -> &Task {
        self.lifecycle.task()
    }

    pub fn task_history(&self) -> &[StateTransition] {
        self.lifecycle.history()
    }

    pub fn is_locked(&self) -> bool {
        self.lifecycle.is_locked()
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.store.annotations()
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn review(&self) -> &SuggestionReview {
        &self.review
    }

    pub fn viewport(&self) -> &EditorViewport {
        &self.viewport
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn selection(&self) -> Option<&SelectionTarget> {
        self.selection.as_ref()
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Drains events produced since the last call.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn resize_surface(&mut self, width: u32, height: u32) {
        tracing::debug!(width, height, "resize canvas surface");
        self.options.surface_width = width;
        self.options.surface_height = height;
    }

    fn to_world(&self, screen: Point) -> Point {
        self.viewport.screen_to_world(screen, self.options.origin)
    }

    // ---- tools and viewport ----

    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.is_locked() || self.tool == tool {
            return;
        }
        tracing::debug!(from = ?self.tool, to = ?tool, "switch tool");
        self.abort_draft();
        self.tool = tool;
    }

    pub fn zoom_in(&mut self) {
        if !self.is_locked() {
            self.viewport.zoom_in();
        }
    }

    pub fn zoom_out(&mut self) {
        if !self.is_locked() {
            self.viewport.zoom_out();
        }
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    fn abort_draft(&mut self) {
        if matches!(
            self.interaction,
            InteractionState::DrawingBox { .. } | InteractionState::DrawingPolygon(_)
        ) {
            tracing::debug!(state = self.interaction.name(), "draft aborted");
            self.interaction = InteractionState::Idle;
        }
    }

    // ---- selection ----

    fn selected_shape(&self) -> Option<&Annotation> {
        match self.selection.as_ref()? {
            SelectionTarget::Annotation(id) => self.store.get(id),
            SelectionTarget::Suggestion(id) => self
                .review
                .visible()
                .find(|suggestion| suggestion.id == *id),
        }
    }

    /// Selects `target`, or clears the selection when it is already selected.
    pub fn toggle_selection(&mut self, target: SelectionTarget) {
        if self.selection.as_ref() == Some(&target) {
            self.selection = None;
            return;
        }
        let exists = match &target {
            SelectionTarget::Annotation(id) => self.store.contains(id),
            SelectionTarget::Suggestion(id) => self.review.get(id).is_some(),
        };
        if exists {
            self.selection = Some(target);
        }
    }

    fn hit_test(&self, world: Point) -> Option<SelectionTarget> {
        if let Some(suggestion) = self.review.top_visible_at(world) {
            return Some(SelectionTarget::Suggestion(suggestion.id.clone()));
        }
        self.store
            .top_annotation_at(world)
            .map(|annotation| SelectionTarget::Annotation(annotation.id.clone()))
    }

    fn handle_drag_at(&self, world: Point, screen: Point) -> Option<DragState> {
        let target = self.selection.clone()?;
        let annotation = self.selected_shape()?;
        let zoom = self.viewport.zoom();
        let mode = match &annotation.shape {
            AnnotationShape::BBox { points } => {
                DragMode::Resize(nearest_handle(world, points, zoom)?)
            }
            AnnotationShape::Polygon { points } => {
                DragMode::Vertex(nearest_vertex(world, points, zoom)?)
            }
        };
        Some(DragState::edit(
            mode,
            target,
            world,
            screen,
            annotation.shape.points().to_vec(),
        ))
    }

    // ---- pointer ----

    pub fn pointer_down(&mut self, screen: Point) {
        if self.is_locked() {
            return;
        }
        let world = self.to_world(screen);

        match self.tool {
            ToolKind::Select => {
                if let Some(drag) = self.handle_drag_at(world, screen) {
                    tracing::debug!(mode = ?drag.mode, "begin handle drag");
                    self.interaction = InteractionState::Dragging(drag);
                    return;
                }
                match self.hit_test(world) {
                    Some(target) => {
                        let baseline = match &target {
                            SelectionTarget::Annotation(id) => self.store.get(id),
                            SelectionTarget::Suggestion(id) => self.review.get(id),
                        }
                        .map(|annotation| annotation.shape.points().to_vec())
                        .unwrap_or_default();
                        tracing::debug!(target = target.id(), "select and begin move");
                        self.selection = Some(target.clone());
                        self.interaction = InteractionState::Dragging(DragState::edit(
                            DragMode::Move,
                            target,
                            world,
                            screen,
                            baseline,
                        ));
                    }
                    None => {
                        self.selection = None;
                        self.interaction = InteractionState::Idle;
                    }
                }
            }
            ToolKind::BBox => {
                self.interaction = InteractionState::DrawingBox {
                    start: world,
                    current: world,
                };
            }
            ToolKind::Polygon => self.place_polygon_vertex(world),
            ToolKind::Pan => {
                self.interaction = InteractionState::Dragging(DragState::pan(screen));
            }
            ToolKind::ZoomIn => self.viewport.zoom_in(),
            ToolKind::ZoomOut => self.viewport.zoom_out(),
        }
    }

    fn place_polygon_vertex(&mut self, world: Point) {
        let zoom = self.viewport.zoom();
        let step = match &mut self.interaction {
            InteractionState::DrawingPolygon(draft) => draft.place(world, zoom),
            _ => {
                self.interaction = InteractionState::DrawingPolygon(PolygonDraft::start(world));
                return;
            }
        };
        match step {
            PolygonStep::Appended { vertex_count } => {
                tracing::debug!(vertex_count, "polygon vertex placed");
            }
            PolygonStep::Closed(vertices) => {
                self.interaction = InteractionState::Idle;
                let style = self.next_style();
                match self.store.add_polygon(vertices, style) {
                    Ok(id) => self.record_created(id),
                    Err(err) => tracing::warn!(?err, "polygon commit rejected"),
                }
            }
        }
    }

    pub fn pointer_move(&mut self, screen: Point) {
        if self.is_locked() {
            return;
        }
        let world = self.to_world(screen);

        let drag = match &mut self.interaction {
            InteractionState::Idle => return,
            InteractionState::DrawingBox { current, .. } => {
                *current = world;
                return;
            }
            InteractionState::DrawingPolygon(draft) => {
                draft.set_hover(world);
                return;
            }
            InteractionState::Dragging(drag) => drag,
        };

        if drag.mode == DragMode::Pan {
            let (delta_x, delta_y) = screen.delta_from(drag.anchor_screen);
            drag.anchor_screen = screen;
            self.viewport.pan_by(delta_x, delta_y);
            return;
        }

        let (delta_x, delta_y) = world.delta_from(drag.start_world);
        let points = match drag.mode {
            DragMode::Move => translate_vertices(&drag.baseline, delta_x, delta_y),
            DragMode::Vertex(index) => move_vertex(&drag.baseline, index, delta_x, delta_y),
            DragMode::Resize(handle) => match <[Point; 4]>::try_from(drag.baseline.as_slice()) {
                Ok(corners) => resize_corners(&corners, handle, delta_x, delta_y).to_vec(),
                Err(_) => return,
            },
            DragMode::Pan => return,
        };
        let Some(target) = drag.target.clone() else {
            return;
        };

        let result = match &target {
            SelectionTarget::Annotation(id) => self.store.set_points(id, &points),
            SelectionTarget::Suggestion(id) => self.review.set_points(id, &points),
        };
        if let Err(err) = result {
            tracing::warn!(?err, target = target.id(), "drag update rejected");
        }
    }

    pub fn pointer_up(&mut self, screen: Point) {
        if self.is_locked() {
            return;
        }
        let world = self.to_world(screen);

        match std::mem::take(&mut self.interaction) {
            InteractionState::DrawingBox { start, .. } => self.commit_box(start, world),
            InteractionState::Dragging(drag) => {
                if let Some(SelectionTarget::Annotation(id)) = drag.target {
                    let changed = self
                        .store
                        .get(&id)
                        .is_some_and(|annotation| annotation.shape.points() != drag.baseline);
                    if changed {
                        tracing::debug!(annotation_id = %id, mode = ?drag.mode, "drag committed");
                        self.events.push(SessionEvent::AnnotationUpdated(id));
                    }
                }
            }
            draft @ InteractionState::DrawingPolygon(_) => self.interaction = draft,
            InteractionState::Idle => {}
        }
    }

    fn commit_box(&mut self, start: Point, end: Point) {
        let zoom = self.viewport.zoom();
        let width_px = (end.x - start.x).abs() * zoom;
        let height_px = (end.y - start.y).abs() * zoom;
        if width_px <= MIN_BOX_EXTENT_PX || height_px <= MIN_BOX_EXTENT_PX {
            tracing::debug!(width_px, height_px, "box too small; discarded");
            return;
        }

        let style = self.next_style();
        match self.store.add_bbox(start, end, style) {
            Ok(id) => self.record_created(id),
            Err(err) => tracing::warn!(?err, "box commit rejected"),
        }
    }

    fn next_style(&mut self) -> AnnotationStyle {
        let swatch = self.labels.next_label();
        AnnotationStyle {
            label: swatch.name,
            color: swatch.color,
            created_by: self.options.active_user.clone(),
        }
    }

    fn record_created(&mut self, id: String) {
        if let Some(annotation) = self.store.get(&id) {
            tracing::info!(
                annotation_id = %id,
                kind = annotation.shape.kind_name(),
                label = %annotation.label,
                "annotation created"
            );
        }
        self.events.push(SessionEvent::AnnotationCreated(id));
    }

    // ---- keyboard and deletion ----

    /// Resolves and applies a key press; returns the action taken, if any.
    pub fn key_down(
        &mut self,
        key: ShortcutKey,
        modifiers: ShortcutModifiers,
    ) -> Option<ShortcutAction> {
        let context = InputContext {
            dialog_open: self.dialog.is_some(),
            text_input_active: self.text_input_active,
            task_locked: self.is_locked(),
        };
        let action = resolve_shortcut(key, modifiers, context)?;
        match action {
            ShortcutAction::SelectTool(tool) => self.set_tool(tool),
            ShortcutAction::ZoomIn => self.zoom_in(),
            ShortcutAction::ZoomOut => self.zoom_out(),
            ShortcutAction::ResetView => self.reset_view(),
            ShortcutAction::AbortDraft => self.abort_draft(),
            ShortcutAction::DeleteSelection => {
                self.delete_selection();
            }
            ShortcutAction::DialogConfirm => {
                if let Err(err) = self.submit_dialog(Local::now().date_naive()) {
                    tracing::warn!(%err, "dialog submit rejected");
                }
            }
            ShortcutAction::DialogCancel => self.close_dialog(),
        }
        Some(action)
    }

    /// Marks a text field (label editor, search) as focused; canvas keys pass through to it.
    pub fn set_text_input_active(&mut self, active: bool) {
        self.text_input_active = active;
    }

    /// Removes the selected annotation, or discards the selected suggestion.
    pub fn delete_selection(&mut self) -> bool {
        if self.is_locked() {
            return false;
        }
        let Some(target) = self.selection.take() else {
            return false;
        };
        if let InteractionState::Dragging(drag) = &self.interaction {
            if drag.target.as_ref() == Some(&target) {
                self.interaction = InteractionState::Idle;
            }
        }
        match target {
            SelectionTarget::Annotation(id) => self.remove_annotation(&id),
            SelectionTarget::Suggestion(id) => {
                let discarded = self.review.discard(&id).is_some();
                if discarded {
                    tracing::debug!(suggestion_id = %id, "suggestion discarded");
                }
                discarded
            }
        }
    }

    pub fn delete_annotation(&mut self, id: &str) -> bool {
        if self.is_locked() {
            return false;
        }
        if matches!(&self.selection, Some(SelectionTarget::Annotation(selected)) if selected == id)
        {
            self.selection = None;
        }
        self.remove_annotation(id)
    }

    fn remove_annotation(&mut self, id: &str) -> bool {
        match self.store.remove(id) {
            Some(removed) => {
                tracing::info!(annotation_id = %removed.id, "annotation deleted");
                self.events
                    .push(SessionEvent::AnnotationDeleted(removed.id));
                true
            }
            None => false,
        }
    }

    // ---- suggestions ----

    pub fn suggest_status(&self) -> SuggestStatus {
        match &self.job {
            Some(job) => job.status(),
            None if self.review.has_pending() => SuggestStatus::Ready,
            None => SuggestStatus::Idle,
        }
    }

    pub fn request_suggestions(&mut self) -> AppResult<()> {
        if self.is_locked() {
            return Err(AppError::TaskLocked(self.task().id.clone()));
        }
        if self.suggest_status().is_busy() {
            return Err(SuggestionError::AlreadyRunning.into());
        }
        self.review.dismiss();
        if matches!(self.selection, Some(SelectionTarget::Suggestion(_))) {
            self.selection = None;
        }
        self.job = Some(SuggestionJob::spawn(
            Arc::clone(&self.provider),
            self.task().clone(),
            self.options.suggestion_delays,
        ));
        tracing::info!(task_id = %self.task().id, "suggestions requested");
        Ok(())
    }

    fn receive_suggestions(&mut self, batch: Vec<Annotation>) {
        tracing::info!(count = batch.len(), "suggestions ready");
        self.review.load(batch);
        self.job = None;
    }

    /// Picks up a finished batch without blocking.
    pub fn poll_suggestions(&mut self) -> SuggestStatus {
        if let Some(batch) = self.job.as_mut().and_then(SuggestionJob::poll) {
            self.receive_suggestions(batch);
        }
        self.drop_stalled_job();
        self.suggest_status()
    }

    pub fn wait_for_suggestions(&mut self, timeout: Duration) -> SuggestStatus {
        if let Some(batch) = self.job.as_mut().and_then(|job| job.wait_ready(timeout)) {
            self.receive_suggestions(batch);
        }
        self.drop_stalled_job();
        self.suggest_status()
    }

    /// Forgets a job whose worker died, so a new request can start.
    fn drop_stalled_job(&mut self) {
        if self.job.as_ref().is_some_and(|job| !job.status().is_busy()) {
            self.job = None;
        }
    }

    pub fn open_review(&mut self) {
        self.review.open();
    }

    pub fn toggle_suggestion(&mut self, id: &str) -> bool {
        self.review.toggle(id)
    }

    pub fn mark_suggestion_adjusted(&mut self, id: &str) -> bool {
        self.review.mark_adjusted(id)
    }

    pub fn dismiss_suggestions(&mut self) {
        self.review.dismiss();
        if matches!(self.selection, Some(SelectionTarget::Suggestion(_))) {
            self.selection = None;
        }
    }

    /// Moves selected, adjusted suggestions into the annotation list.
    pub fn apply_suggestions(&mut self) -> AppResult<usize> {
        if self.is_locked() {
            return Err(AppError::TaskLocked(self.task().id.clone()));
        }
        let applied = self.review.accepted().inspect_err(|err| {
            tracing::warn!(%err, "apply suggestions rejected");
        })?;
        let ids: Vec<String> = applied.iter().map(|a| a.id.clone()).collect();
        let count = self.store.extend_annotations(applied).inspect_err(|err| {
            tracing::warn!(%err, "apply suggestions rejected");
        })?;
        self.dismiss_suggestions();
        tracing::info!(count, "suggestions applied");
        self.events.push(SessionEvent::SuggestionsApplied(ids));
        Ok(count)
    }

    // ---- task lifecycle ----

    fn publish_task(&mut self) {
        let task = self.lifecycle.task().clone();
        if let Some(listener) = self.task_listener.as_mut() {
            listener(&task);
        }
        self.events.push(SessionEvent::TaskUpdated(task));
    }

    pub fn start_task(&mut self) -> AppResult<()> {
        self.lifecycle.start()?;
        self.publish_task();
        Ok(())
    }

    /// Confirms and locks the task; in-flight gestures are dropped.
    pub fn confirm_task(&mut self, date: NaiveDate) -> AppResult<()> {
        let user = self.options.active_user.clone();
        self.lifecycle.confirm(&user, date)?;
        self.interaction = InteractionState::Idle;
        self.publish_task();
        Ok(())
    }

    pub fn reopen_task(&mut self, reason: &str) -> AppResult<()> {
        self.lifecycle.reopen(reason, self.options.is_owner)?;
        self.publish_task();
        Ok(())
    }

    pub fn dialog(&self) -> Option<&TaskDialog> {
        self.dialog.as_ref()
    }

    pub fn open_confirm_dialog(&mut self) -> bool {
        if self.is_locked() {
            return false;
        }
        self.dialog = Some(TaskDialog::Confirm);
        true
    }

    /// Opens the reason prompt; only a confirmed task can be reopened.
    pub fn open_reopen_dialog(&mut self) -> bool {
        if !self.is_locked() {
            return false;
        }
        self.dialog = Some(TaskDialog::Reopen {
            reason: String::new(),
        });
        true
    }

    pub fn set_reopen_reason(&mut self, text: &str) {
        if let Some(TaskDialog::Reopen { reason }) = self.dialog.as_mut() {
            *reason = text.to_string();
        }
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    /// Runs the open dialog's action. The dialog stays open when the action is
    /// rejected, so the user can correct the reason.
    pub fn submit_dialog(&mut self, date: NaiveDate) -> AppResult<()> {
        let Some(dialog) = self.dialog.clone() else {
            return Ok(());
        };
        match dialog {
            TaskDialog::Confirm => self.confirm_task(date)?,
            TaskDialog::Reopen { reason } => self.reopen_task(&reason)?,
        }
        self.dialog = None;
        Ok(())
    }

    pub fn status(&self) -> TaskStatus {
        self.lifecycle.status()
    }

    // ---- rendering ----

    fn draft_preview(&self) -> Option<DraftPreview> {
        let points = self.interaction.preview_path()?;
        Some(DraftPreview {
            points,
            closed: matches!(self.interaction, InteractionState::DrawingBox { .. }),
        })
    }

    pub fn scene(&self) -> Scene {
        build_scene(&SceneInput {
            file_name: &self.task().file_name,
            annotations: self.store.annotations(),
            suggestions: self.review.visible().collect(),
            selection: self.selection.as_ref(),
            locked: self.is_locked(),
            preview: self.draft_preview(),
            cursors: self.presence.cursors(),
            viewport: self.viewport,
            width: self.options.surface_width,
            height: self.options.surface_height,
        })
    }

    pub fn render(&self) -> RgbaImage {
        rasterize(
            &self.scene(),
            self.options.surface_width,
            self.options.surface_height,
        )
    }

    pub fn render_to_png(&self, path: &Path) -> RenderResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.render().save_with_format(path, ImageFormat::Png)?;
        tracing::info!(path = %path.display(), "canvas rendered");
        Ok(())
    }
}
