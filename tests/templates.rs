//! Checks the Tasker task templates in `config/tasker/templates` against the
//! job descriptors and the handler registry.

use logistics_api::handler_registry::LogisticsHandlerRegistry;
use logistics_api::queue::NEW_ORDER_MAIL;
use serde_yaml::Value;
use tasker_worker::worker::handlers::StepHandlerRegistry;

fn load_template(file: &str) -> Value {
    let path = format!("{}/config/tasker/templates/{}", env!("CARGO_MANIFEST_DIR"), file);
    let raw = std::fs::read_to_string(&path).expect("Failed to read task template");
    serde_yaml::from_str(&raw).expect("Task template is not valid YAML")
}

#[test]
fn new_order_mail_template_matches_the_job_descriptor() {
    let template = load_template("new_order_mail.yaml");

    assert_eq!(template["name"].as_str(), Some(NEW_ORDER_MAIL.task_name));
    assert_eq!(template["namespace_name"].as_str(), Some(NEW_ORDER_MAIL.namespace));
    assert_eq!(template["version"].as_str(), Some(NEW_ORDER_MAIL.version));
}

#[test]
fn every_template_step_has_a_registered_handler() {
    let registry = LogisticsHandlerRegistry::new();
    let template = load_template("new_order_mail.yaml");

    let steps = template["steps"].as_sequence().expect("Template has no steps");
    assert!(!steps.is_empty());

    for step in steps {
        let callable = step["handler"]["callable"]
            .as_str()
            .expect("Step has no handler callable");
        assert!(
            registry.handler_available(callable),
            "No handler registered for {}",
            callable
        );
    }
}
