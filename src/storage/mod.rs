use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editor::tools::{rect_corners, Annotation, AnnotationShape};
use crate::editor::labels::{color_for_label, default_palette};
use crate::geometry::{Color, Point};
use crate::state::TaskStatus;
use crate::task::Task;

const DATA_SUBDIR: &str = "labelforge";
const TASK_FILE_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("task id is empty")]
    MissingTaskId,
    #[error("task id cannot be used as a file name: {0}")]
    InvalidTaskId(String),
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid task document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Data access for tasks and their annotations.
pub trait AnnotationStorage {
    fn list_tasks(&self) -> StorageResult<Vec<Task>>;
    fn load_task(&self, task_id: &str) -> StorageResult<Task>;
    fn save_task(&mut self, task: &Task) -> StorageResult<()>;
    fn load_annotations(&self, task_id: &str) -> StorageResult<Vec<Annotation>>;
    fn save_annotations(&mut self, task_id: &str, annotations: &[Annotation]) -> StorageResult<()>;
}

fn validate_task_id(task_id: &str) -> StorageResult<()> {
    if task_id.trim().is_empty() {
        return Err(StorageError::MissingTaskId);
    }
    Ok(())
}

/// Process-local storage, seeded with the demo workspace.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tasks: BTreeMap<String, Task>,
    annotations: BTreeMap<String, Vec<Annotation>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demo_data() -> Self {
        let mut storage = Self::new();
        for task in demo_tasks() {
            storage.tasks.insert(task.id.clone(), task);
        }
        for annotation in demo_annotations() {
            storage
                .annotations
                .entry(annotation.task_id.clone())
                .or_default()
                .push(annotation);
        }
        storage
    }
}

impl AnnotationStorage for MemoryStorage {
    fn list_tasks(&self) -> StorageResult<Vec<Task>> {
        Ok(self.tasks.values().cloned().collect())
    }

    fn load_task(&self, task_id: &str) -> StorageResult<Task> {
        validate_task_id(task_id)?;
        self.tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| StorageError::TaskNotFound(task_id.to_string()))
    }

    fn save_task(&mut self, task: &Task) -> StorageResult<()> {
        validate_task_id(&task.id)?;
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    fn load_annotations(&self, task_id: &str) -> StorageResult<Vec<Annotation>> {
        validate_task_id(task_id)?;
        if !self.tasks.contains_key(task_id) {
            return Err(StorageError::TaskNotFound(task_id.to_string()));
        }
        Ok(self.annotations.get(task_id).cloned().unwrap_or_default())
    }

    fn save_annotations(&mut self, task_id: &str, annotations: &[Annotation]) -> StorageResult<()> {
        validate_task_id(task_id)?;
        if !self.tasks.contains_key(task_id) {
            return Err(StorageError::TaskNotFound(task_id.to_string()));
        }
        self.annotations
            .insert(task_id.to_string(), annotations.to_vec());
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskDocument {
    task: Task,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

/// One `<task_id>.json` document per task under a directory.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    dir: PathBuf,
}

impl JsonStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn with_default_dir() -> StorageResult<Self> {
        let dir = default_data_dir()?;
        fs::create_dir_all(&dir)?;
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<task_id>.json`; ids that would leave `dir` are rejected.
    pub fn path_for_task(&self, task_id: &str) -> StorageResult<PathBuf> {
        validate_task_id(task_id)?;
        if matches!(task_id, "." | "..") || task_id.contains(['/', '\\', '\0']) {
            return Err(StorageError::InvalidTaskId(task_id.to_string()));
        }
        let mut path = self.dir.clone();
        path.push(format!("{task_id}.{TASK_FILE_EXTENSION}"));
        Ok(path)
    }

    fn read_document(&self, task_id: &str) -> StorageResult<TaskDocument> {
        let path = self.path_for_task(task_id)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::TaskNotFound(task_id.to_string()));
            }
            Err(err) => return Err(StorageError::Io(err)),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_document(&self, document: &TaskDocument) -> StorageResult<()> {
        let path = self.path_for_task(&document.task.id)?;
        let serialized = serde_json::to_string_pretty(document)?;
        write_replace(&path, serialized.as_bytes())?;
        tracing::debug!(path = %path.display(), "task document written");
        Ok(())
    }

    /// Writes every task and annotation from `source` into this directory.
    pub fn import_from(&mut self, source: &dyn AnnotationStorage) -> StorageResult<usize> {
        let tasks = source.list_tasks()?;
        for task in &tasks {
            let annotations = source.load_annotations(&task.id)?;
            self.write_document(&TaskDocument {
                task: task.clone(),
                annotations,
            })?;
        }
        Ok(tasks.len())
    }
}

impl AnnotationStorage for JsonStorage {
    fn list_tasks(&self) -> StorageResult<Vec<Task>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut tasks = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(TASK_FILE_EXTENSION) {
                continue;
            }
            let Some(task_id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match self.read_document(task_id) {
                Ok(document) => tasks.push(document.task),
                Err(err) => {
                    tracing::warn!(path = %path.display(), ?err, "skipping unreadable task document");
                }
            }
        }
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tasks)
    }

    fn load_task(&self, task_id: &str) -> StorageResult<Task> {
        Ok(self.read_document(task_id)?.task)
    }

    fn save_task(&mut self, task: &Task) -> StorageResult<()> {
        let annotations = match self.read_document(&task.id) {
            Ok(document) => document.annotations,
            Err(StorageError::TaskNotFound(_)) => Vec::new(),
            Err(err) => return Err(err),
        };
        self.write_document(&TaskDocument {
            task: task.clone(),
            annotations,
        })
    }

    fn load_annotations(&self, task_id: &str) -> StorageResult<Vec<Annotation>> {
        Ok(self.read_document(task_id)?.annotations)
    }

    fn save_annotations(&mut self, task_id: &str, annotations: &[Annotation]) -> StorageResult<()> {
        let mut document = self.read_document(task_id)?;
        document.annotations = annotations.to_vec();
        self.write_document(&document)
    }
}

fn write_replace(destination: &Path, contents: &[u8]) -> StorageResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    let staging = destination.with_extension("json.tmp");
    fs::write(&staging, contents)?;
    fs::rename(&staging, destination)?;
    Ok(())
}

fn default_data_dir() -> StorageResult<PathBuf> {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        if !data_home.trim().is_empty() {
            return Ok(PathBuf::from(data_home).join(DATA_SUBDIR));
        }
    }
    let home = std::env::var("HOME").map_err(|_| StorageError::MissingHomeDirectory)?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join(DATA_SUBDIR))
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn demo_task(
    id: &str,
    file_name: &str,
    status: TaskStatus,
    assignee: &str,
    annotation_count: u32,
    created_day: u32,
    confirmed: Option<(&str, u32)>,
) -> Task {
    Task {
        id: id.to_string(),
        project_id: "p1".to_string(),
        file_name: file_name.to_string(),
        image_url: String::new(),
        status,
        assignee: assignee.to_string(),
        annotation_count,
        created_at: date(2026, 1, created_day),
        confirmed_by: confirmed.map(|(user, _)| user.to_string()),
        confirmed_at: confirmed.map(|(_, day)| date(2026, 1, day)),
    }
}

pub fn demo_tasks() -> Vec<Task> {
    use TaskStatus::*;
    vec![
        demo_task("t1", "intersection_001.jpg", Confirmed, "Alex Kim", 12, 16, Some(("Alex Kim", 20))),
        demo_task("t2", "highway_002.jpg", InProgress, "Alex Kim", 5, 17, None),
        demo_task("t3", "parking_003.jpg", Todo, "", 0, 18, None),
        demo_task("t4", "crosswalk_004.jpg", Confirmed, "Jamie L", 8, 19, Some(("Jamie L", 22))),
        demo_task("t5", "downtown_005.jpg", InProgress, "Sam R", 3, 20, None),
        demo_task("t6", "suburb_006.jpg", Todo, "", 0, 21, None),
    ]
}

fn demo_annotation(
    id: &str,
    task_id: &str,
    label: &str,
    shape: AnnotationShape,
    author: &str,
) -> Annotation {
    Annotation {
        id: id.to_string(),
        task_id: task_id.to_string(),
        label: label.to_string(),
        shape,
        color: color_for_label(&default_palette(), label).unwrap_or(Color::new(0x3B, 0x82, 0xF6)),
        confidence: None,
        created_by: author.to_string(),
    }
}

fn demo_box(x0: f64, y0: f64, x1: f64, y1: f64) -> AnnotationShape {
    AnnotationShape::BBox {
        points: rect_corners(Point::new(x0, y0), Point::new(x1, y1)),
    }
}

pub fn demo_annotations() -> Vec<Annotation> {
    vec![
        demo_annotation("a1", "t1", "car", demo_box(80.0, 120.0, 220.0, 240.0), "Alex Kim"),
        demo_annotation("a2", "t1", "person", demo_box(300.0, 100.0, 360.0, 280.0), "Alex Kim"),
        demo_annotation(
            "a3",
            "t1",
            "bicycle",
            AnnotationShape::Polygon {
                points: vec![
                    Point::new(400.0, 200.0),
                    Point::new(430.0, 170.0),
                    Point::new(470.0, 200.0),
                    Point::new(450.0, 260.0),
                    Point::new(410.0, 260.0),
                ],
            },
            "Jamie L",
        ),
        demo_annotation("a4", "t2", "car", demo_box(50.0, 150.0, 200.0, 280.0), "Alex Kim"),
        demo_annotation("a5", "t2", "car", demo_box(350.0, 130.0, 480.0, 250.0), "Alex Kim"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_serves_demo_workspace() {
        let storage = MemoryStorage::with_demo_data();
        let tasks = storage.list_tasks().expect("list tasks");
        assert_eq!(tasks.len(), 6);

        let t1 = storage.load_task("t1").expect("t1 exists");
        assert!(t1.is_locked());
        assert_eq!(t1.confirmed_by.as_deref(), Some("Alex Kim"));

        let annotations = storage.load_annotations("t1").expect("t1 annotations");
        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[2].shape.kind_name(), "polygon");
        assert_eq!(annotations[0].color, Color::new(0x0D, 0x94, 0x88));
        assert!(storage.load_annotations("t3").expect("t3 annotations").is_empty());
    }

    #[test]
    fn memory_storage_rejects_unknown_and_empty_ids() {
        let mut storage = MemoryStorage::with_demo_data();
        assert!(matches!(
            storage.load_task("t9"),
            Err(StorageError::TaskNotFound(id)) if id == "t9"
        ));
        assert!(matches!(
            storage.load_annotations(" "),
            Err(StorageError::MissingTaskId)
        ));
        assert!(matches!(
            storage.save_annotations("t9", &[]),
            Err(StorageError::TaskNotFound(_))
        ));
    }

    #[test]
    fn json_storage_round_trips_tasks_and_annotations() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut storage = JsonStorage::new(dir.path());
        let imported = storage
            .import_from(&MemoryStorage::with_demo_data())
            .expect("import demo data");
        assert_eq!(imported, 6);
        assert!(dir.path().join("t1.json").exists());

        let annotations = storage.load_annotations("t1").expect("load t1");
        assert_eq!(annotations, demo_annotations()[..3].to_vec());

        let mut task = storage.load_task("t2").expect("load t2");
        task.status = TaskStatus::Confirmed;
        storage.save_task(&task).expect("save t2");
        assert_eq!(
            storage.load_task("t2").expect("reload t2").status,
            TaskStatus::Confirmed
        );
        assert_eq!(
            storage.load_annotations("t2").expect("t2 annotations kept").len(),
            2
        );

        storage
            .save_annotations("t2", &annotations[..1])
            .expect("replace t2 annotations");
        assert_eq!(storage.load_annotations("t2").expect("reload").len(), 1);
        assert_eq!(storage.list_tasks().expect("list").len(), 6);
    }

    #[test]
    fn json_storage_reports_missing_and_corrupt_documents() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let storage = JsonStorage::new(dir.path());
        assert!(matches!(
            storage.load_task("t1"),
            Err(StorageError::TaskNotFound(_))
        ));

        std::fs::write(dir.path().join("broken.json"), "{not json").expect("write broken file");
        assert!(matches!(
            storage.load_task("broken"),
            Err(StorageError::Json(_))
        ));
        assert!(storage.list_tasks().expect("list skips broken").is_empty());
    }

    #[test]
    fn path_for_task_uses_task_id_filename() {
        let storage = JsonStorage::new("/tmp/labelforge-test");
        assert_eq!(
            storage.path_for_task("t3").expect("valid id"),
            PathBuf::from("/tmp/labelforge-test/t3.json")
        );
        assert!(matches!(
            storage.path_for_task(""),
            Err(StorageError::MissingTaskId)
        ));
    }

    #[test]
    fn path_for_task_rejects_ids_that_leave_the_directory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut storage = JsonStorage::new(dir.path().join("tasks"));
        for id in ["../x", "..", "a/b", "a\\b", "/etc/passwd"] {
            assert!(
                matches!(storage.path_for_task(id), Err(StorageError::InvalidTaskId(_))),
                "{id} should be rejected"
            );
        }

        let mut task = crate::storage::demo_tasks().remove(0);
        task.id = "../escaped".to_string();
        assert!(matches!(
            storage.save_task(&task),
            Err(StorageError::InvalidTaskId(_))
        ));
        assert!(!dir.path().join("escaped.json").exists());
        assert_eq!(
            storage.path_for_task("t..1").expect("dots inside a name are fine"),
            dir.path().join("tasks").join("t..1.json")
        );
    }
}
