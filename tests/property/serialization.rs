//! Property-based tests for the JSON wire model.
//!
//! Uses proptest to verify:
//! 1. Any task survives a JSON round-trip.
//! 2. Encoded tasks always use the backend field names and status values.
//! 3. Tasks embedded in a project payload decode without `projectId`.
//! 4. Arbitrary strings never cause a panic when decoded as a task.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::NaiveDate;
use pmt_proto::project::{Project, ProjectId};
use pmt_proto::task::{Priority, Task, TaskId, TaskStatus};
use pmt_proto::user::UserId;
use proptest::prelude::*;

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

fn arb_date() -> impl Strategy<Value = Option<NaiveDate>> {
    prop::option::of((2000i32..2100, 1u32..=12, 1u32..=28))
        .prop_map(|d| d.and_then(|(y, m, day)| NaiveDate::from_ymd_opt(y, m, day)))
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        any::<i64>(),
        "[^\x00]{0,64}",
        "[^\x00]{0,256}",
        arb_date(),
        arb_date(),
        arb_priority(),
        arb_status(),
        prop::option::of(any::<i64>()),
        prop::option::of(any::<i64>()),
    )
        .prop_map(
            |(id, name, description, due_date, end_date, priority, status, project, editor)| Task {
                id: TaskId(id),
                name,
                description,
                due_date,
                end_date,
                priority,
                status,
                project_id: project.map(ProjectId),
                editor_id: editor.map(UserId),
            },
        )
}

proptest! {
    #[test]
    fn task_json_round_trip(task in arb_task()) {
        let json = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(decoded, task);
    }

    #[test]
    fn task_json_uses_backend_field_names(task in arb_task()) {
        let value = serde_json::to_value(&task).unwrap();
        let object = value.as_object().unwrap();
        prop_assert!(object.contains_key("nom"));
        prop_assert!(object.contains_key("priorite"));
        prop_assert!(!object.contains_key("name"));
        let status = object["status"].as_str().unwrap();
        prop_assert!(["TODO", "IN_PROGRESS", "DONE"].contains(&status));
        prop_assert_eq!(object.contains_key("projectId"), task.project_id.is_some());
    }

    #[test]
    fn arbitrary_text_never_panics(input in ".{0,512}") {
        let _ = serde_json::from_str::<Task>(&input);
    }
}

#[test]
fn embedded_tasks_decode_without_project_id() {
    let json = r#"{
        "id": 4,
        "nom": "Roadmap",
        "description": "Q3 planning",
        "dateDebut": "2025-01-06",
        "dateFin": null,
        "tasks": [
            {"id": 1, "nom": "Draft", "description": "first pass", "priorite": "HIGH",
             "status": "IN_PROGRESS", "dateEcheance": "2025-02-01", "dateFin": null}
        ]
    }"#;
    let project: Project = serde_json::from_str(json).unwrap();
    assert_eq!(project.id, ProjectId(4));
    assert_eq!(project.end_date, None);
    let task = &project.tasks[0];
    assert_eq!(task.project_id, None);
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 2, 1));
}
