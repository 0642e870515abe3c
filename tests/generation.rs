use hearth::generate::GenerationService;
use hearth::instance::{FileTaskStore, TaskStatus};
use hearth::store::{TaskStore, TemplateStore};
use hearth::template::{
    Category, FileTemplateStore, Frequency, OverdueWhen, TemplateDraft, TemplateStatus,
};

mod support;

fn draft(name: &str, frequency: Frequency, due: &str) -> TemplateDraft {
    TemplateDraft {
        task_name: name.to_string(),
        assigned_to: "member-1".to_string(),
        frequency,
        due: due.to_string(),
        overdue_when: OverdueWhen::OneHour,
        category: Category::Medication,
        status: TemplateStatus::Active,
    }
}

#[test]
fn generation_writes_instances_to_the_date_partition() {
    let data = support::TestData::init();
    let templates = FileTemplateStore::new(data.storage());
    let tasks = FileTaskStore::new(data.storage());

    templates
        .create(draft("Take pills", Frequency::Daily, "Morning"))
        .expect("create template");
    templates
        .create(draft("Water plants", Frequency::Weekly, "Sunday"))
        .expect("create template");

    let service = GenerationService::new(&templates, &tasks, data.config().household_tz());

    // 2024-08-04 is a Sunday: both templates match.
    let generated = service
        .generate_daily_tasks_for_date("2024-08-04")
        .expect("generate");
    assert_eq!(generated.len(), 2);
    assert!(data.storage().task_partition("2024-08-04").exists());

    let on_disk = tasks.list_by_date("2024-08-04").expect("list");
    assert_eq!(on_disk.len(), 2);
    assert!(on_disk.iter().all(|i| i.status == TaskStatus::Pending));

    // Monday: only the daily template matches.
    let monday = service
        .generate_daily_tasks_for_date("2024-08-05")
        .expect("generate");
    assert_eq!(monday.len(), 1);
    assert_eq!(monday[0].task_name, "Take pills");
}

#[test]
fn generation_is_idempotent_per_date() {
    let data = support::TestData::init();
    let templates = FileTemplateStore::new(data.storage());
    let tasks = FileTaskStore::new(data.storage());
    templates
        .create(draft("Take pills", Frequency::Daily, "Evening"))
        .expect("create template");

    let service = GenerationService::new(&templates, &tasks, data.config().household_tz());

    let first = service
        .generate_daily_tasks_for_date("2024-08-04")
        .expect("generate");
    let second = service
        .generate_daily_tasks_for_date("2024-08-04")
        .expect("generate");

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].task_id, second[0].task_id);
    assert_eq!(tasks.list_by_date("2024-08-04").expect("list").len(), 1);
}

#[test]
fn instance_carries_template_back_reference_and_copied_fields() {
    let data = support::TestData::init();
    let templates = FileTemplateStore::new(data.storage());
    let tasks = FileTaskStore::new(data.storage());

    let mut template_draft = draft("Take pills", Frequency::Daily, "Morning");
    template_draft.overdue_when = OverdueWhen::SixHours;
    let template = templates.create(template_draft).expect("create template");

    let service = GenerationService::new(&templates, &tasks, data.config().household_tz());
    let generated = service
        .generate_daily_tasks_for_date("2024-08-04")
        .expect("generate");

    let instance = &generated[0];
    assert_eq!(instance.recurring_task_id, template.task_id);
    assert_ne!(instance.task_id, template.task_id);
    assert_eq!(instance.overdue_when, OverdueWhen::SixHours);

    // Editing the template later does not change the generated instance.
    templates
        .update(
            &template.task_id,
            hearth::template::TemplateUpdate {
                overdue_when: Some(OverdueWhen::SevenDays),
                ..Default::default()
            },
        )
        .expect("update template");
    let stored = tasks
        .get_by_id(&instance.task_id)
        .expect("get")
        .expect("instance");
    assert_eq!(stored.overdue_when, OverdueWhen::SixHours);
}

#[test]
fn deleting_a_template_keeps_generated_instances() {
    let data = support::TestData::init();
    let templates = FileTemplateStore::new(data.storage());
    let tasks = FileTaskStore::new(data.storage());
    let template = templates
        .create(draft("Take pills", Frequency::Daily, "Morning"))
        .expect("create template");

    let service = GenerationService::new(&templates, &tasks, data.config().household_tz());
    let generated = service
        .generate_daily_tasks_for_date("2024-08-04")
        .expect("generate");

    templates.delete(&template.task_id).expect("delete");
    assert!(templates.get(&template.task_id).expect("get").is_none());

    let survivor = tasks
        .get_by_id(&generated[0].task_id)
        .expect("get")
        .expect("instance");
    assert_eq!(survivor.recurring_task_id, template.task_id);
}

#[test]
fn monthly_template_out_of_range_generates_nothing() {
    let data = support::TestData::init();
    let templates = FileTemplateStore::new(data.storage());
    let tasks = FileTaskStore::new(data.storage());

    templates
        .create(draft("Change filters", Frequency::Monthly, "30"))
        .expect("create template");

    let service = GenerationService::new(&templates, &tasks, data.config().household_tz());
    let generated = service
        .generate_daily_tasks_for_date("2024-08-30")
        .expect("generate");
    assert!(generated.is_empty());
}

#[test]
fn malformed_dates_are_validation_errors() {
    let data = support::TestData::init();
    let templates = FileTemplateStore::new(data.storage());
    let tasks = FileTaskStore::new(data.storage());
    let service = GenerationService::new(&templates, &tasks, data.config().household_tz());

    let err = service
        .generate_daily_tasks_for_date("08/04/2024")
        .expect_err("malformed date");
    assert!(err.is_validation());

    let err = service
        .generate_daily_tasks_for_date("")
        .expect_err("empty date");
    assert!(err.is_validation());
}
