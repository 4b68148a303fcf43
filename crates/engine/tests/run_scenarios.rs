//! End-to-end runner scenarios against an in-process capability.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use serde_json::{Value, json};

use socialflow_engine::{CapabilityInvoker, WorkflowRunner};
use socialflow_registry::{Capability, CapabilityCatalog, CapabilityDescriptor, CapabilityRegistry, OperationDescriptor};
use socialflow_types::{
    ParameterSpec, ParameterValidationResult, RunStatus, StepStatus, TypeTag, WorkflowDefinition, WorkflowStep,
};

/// Capability that records every invocation it receives.
struct ContentCapability {
    calls: Arc<Mutex<Vec<(String, IndexMap<String, Value>)>>>,
}

#[async_trait]
impl Capability for ContentCapability {
    fn capability_id(&self) -> &str {
        "content_tool"
    }

    async fn invoke(&self, operation_id: &str, arguments: IndexMap<String, Value>) -> anyhow::Result<Value> {
        self.calls
            .lock()
            .expect("call log lock")
            .push((operation_id.to_string(), arguments.clone()));
        // A small pause keeps wall-clock step timestamps strictly ordered.
        tokio::time::sleep(Duration::from_millis(2)).await;

        match operation_id {
            "search" => Ok(json!([
                {"id": 1, "caption": "cat on keyboard"},
                {"id": 2, "caption": "cat in box"},
                {"id": 3, "caption": "cat vs cucumber"}
            ])),
            "summarize" => {
                let records = arguments
                    .get("records")
                    .and_then(Value::as_array)
                    .ok_or_else(|| anyhow::anyhow!("records argument missing"))?;
                Ok(json!(format!("{} records summarized", records.len())))
            }
            other => anyhow::bail!("unknown operation {other}"),
        }
    }
}

fn catalog() -> CapabilityCatalog {
    CapabilityCatalog {
        capabilities: vec![CapabilityDescriptor {
            capability_id: "content_tool".to_string(),
            description: "search and summarize content".to_string(),
            operations: vec![
                OperationDescriptor {
                    operation_id: "search".to_string(),
                    description: String::new(),
                    parameters: vec![],
                    return_type: TypeTag::parse("sequence-of-record"),
                    http: None,
                },
                OperationDescriptor {
                    operation_id: "summarize".to_string(),
                    description: String::new(),
                    parameters: vec![],
                    return_type: TypeTag::String,
                    http: None,
                },
            ],
        }],
    }
}

fn search_then_summarize() -> WorkflowDefinition {
    let mut search_parameters = IndexMap::new();
    search_parameters.insert("keyword".to_string(), ParameterSpec::literal(TypeTag::String, json!("cats")));

    let mut summarize_parameters = IndexMap::new();
    summarize_parameters.insert("records".to_string(), ParameterSpec::required(TypeTag::parse("sequence-of-record")));

    WorkflowDefinition {
        workflow_id: "wf-e2e".to_string(),
        name: "search and summarize".to_string(),
        description: String::new(),
        created_at: Utc::now(),
        steps: vec![
            WorkflowStep {
                step_id: "search".to_string(),
                capability_id: "content_tool".to_string(),
                operation_id: "search".to_string(),
                description: "search for cat content".to_string(),
                parameters: search_parameters,
                return_type: TypeTag::parse("sequence-of-record"),
            },
            WorkflowStep {
                step_id: "summarize".to_string(),
                capability_id: "content_tool".to_string(),
                operation_id: "summarize".to_string(),
                description: "summarize the findings".to_string(),
                parameters: summarize_parameters,
                return_type: TypeTag::String,
            },
        ],
    }
}

fn harness() -> (WorkflowRunner, Arc<Mutex<Vec<(String, IndexMap<String, Value>)>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut registry = CapabilityRegistry::new(catalog());
    registry
        .register(Arc::new(ContentCapability { calls: calls.clone() }))
        .expect("register capability");
    let runner = WorkflowRunner::new(Arc::new(CapabilityInvoker::new(Arc::new(registry))));
    (runner, calls)
}

#[tokio::test]
async fn second_step_receives_the_first_steps_records() {
    let (runner, calls) = harness();
    let result = runner.execute(&search_then_summarize(), &ParameterValidationResult::valid()).await;

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.outputs["summarize"], json!("3 records summarized"));

    let calls = calls.lock().expect("call log lock");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "search");
    assert_eq!(calls[0].1["keyword"], json!("cats"));
    assert_eq!(calls[1].0, "summarize");
    // The exact three-element sequence produced by the first step.
    assert_eq!(
        calls[1].1["records"],
        json!([
            {"id": 1, "caption": "cat on keyboard"},
            {"id": 2, "caption": "cat in box"},
            {"id": 3, "caption": "cat vs cucumber"}
        ])
    );
}

#[tokio::test]
async fn completed_steps_have_strictly_increasing_start_times() {
    let (runner, _calls) = harness();
    let result = runner.execute(&search_then_summarize(), &ParameterValidationResult::valid()).await;

    assert_eq!(result.status, RunStatus::Completed);
    let step_results: Vec<_> = result.step_results.values().collect();
    assert_eq!(step_results.len(), 2);
    for step_result in &step_results {
        assert_eq!(step_result.status, StepStatus::Completed);
        assert!(step_result.end_time >= step_result.start_time);
    }
    assert!(
        step_results[1].start_time > step_results[0].start_time,
        "later steps must start strictly after earlier ones"
    );
    assert!(step_results[1].start_time >= step_results[0].end_time, "steps must not overlap");
}

#[tokio::test]
async fn distinct_runs_share_nothing_but_the_registry() {
    let (runner, _calls) = harness();
    let runner = Arc::new(runner);
    let workflow = search_then_summarize();

    let first = {
        let runner = runner.clone();
        let workflow = workflow.clone();
        tokio::spawn(async move { runner.execute(&workflow, &ParameterValidationResult::valid()).await })
    };
    let second = {
        let runner = runner.clone();
        let workflow = workflow.clone();
        tokio::spawn(async move { runner.execute(&workflow, &ParameterValidationResult::valid()).await })
    };

    let first = first.await.expect("first run");
    let second = second.await.expect("second run");
    assert_eq!(first.status, RunStatus::Completed);
    assert_eq!(second.status, RunStatus::Completed);
    assert_eq!(first.outputs["summarize"], second.outputs["summarize"]);
}
