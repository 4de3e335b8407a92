//! Session-level scenarios driven through the public API.
//!
//! Each test loads a spec from JSON, drives edits, scoped validation and batch
//! imports through an `ArgsSession`, and checks the state a renderer would see.

use argform::core::types::{ArgValues, ValidationEntry, ValidationIssue};
use argform::io::batch::BatchPayload;
use argform::io::spec_store::parse_args_spec;
use argform::test_support::{ScriptedValidator, values};
use argform::{ArgsSession, SessionError, SessionEvent, SessionOptions};
use serde_json::json;

const STORMWATER: &str = r#"{
    "model_name": "Stormwater Retention",
    "module": "models.stormwater",
    "args": {
        "workspace_dir": {"type": "directory", "order": 0},
        "results_suffix": {"type": "freestyle_string", "order": 0.5},
        "n_workers": {"type": "integer", "order": 0.9},
        "lulc_path": {"type": "raster", "order": 1},
        "adjust_retention_ratios": {
            "type": "boolean",
            "order": 3,
            "ui_control": ["retention_radius", "road_centerlines_path"]
        },
        "retention_radius": {"type": "number", "order": 3.2, "ui_option": "disable"},
        "road_centerlines_path": {"type": "vector", "order": 3.1, "ui_option": "disable"},
        "replacement_cost": {"type": "number"}
    }
}"#;

/// Display grouping: `[workspace_dir, results_suffix]`, `[lulc_path]`,
/// `[adjust, road, radius]`, `[replacement_cost]`; worker count never shows.
#[test]
fn arg_tree_groups_by_order_floor() {
    let spec = parse_args_spec(STORMWATER).expect("spec");
    let session = ArgsSession::new(
        spec,
        ArgValues::new(),
        ScriptedValidator::always_valid(),
        SessionOptions::default(),
    );

    let groups: Vec<Vec<String>> = session
        .arg_tree()
        .iter()
        .map(|group| group.keys().map(str::to_string).collect())
        .collect();
    assert_eq!(
        groups,
        vec![
            vec!["workspace_dir", "results_suffix"],
            vec!["lulc_path"],
            vec![
                "adjust_retention_ratios",
                "road_centerlines_path",
                "retention_radius"
            ],
            vec!["replacement_cost"],
        ]
    );
    assert!(session.arg_state("n_workers").is_none());
}

/// Full lifecycle: fresh form → invalid round → toggle gate → scoped fix →
/// automatic full round flips the overall flag.
#[tokio::test]
async fn edit_scoped_fix_and_follow_up_round() {
    let spec = parse_args_spec(STORMWATER).expect("spec");
    let validator = ScriptedValidator::new(vec![
        // update(workspace_dir)
        Ok(vec![
            ValidationIssue::new(["lulc_path"], "File not found"),
            ValidationIssue::new(["ghost_key"], "ignored"),
        ]),
        // update(adjust_retention_ratios)
        Ok(vec![ValidationIssue::new(["lulc_path"], "File not found")]),
        // validate(Some("lulc_path"))
        Ok(vec![]),
        // automatic full round
        Ok(vec![]),
    ]);
    let session = ArgsSession::new(
        spec,
        ArgValues::new(),
        validator.clone(),
        SessionOptions::default(),
    );
    let mut rx = session.subscribe();

    let hidden = session.arg_state("retention_radius").expect("radius");
    assert_eq!(hidden.active_ui_option.as_deref(), Some("disable"));
    assert!(!hidden.touched);

    let report = session
        .update("workspace_dir", json!("/tmp/ws"))
        .await
        .expect("update");
    assert_eq!(report.all_valid(), Some(false));
    assert_eq!(
        session.validation_entry("lulc_path"),
        Some(ValidationEntry::invalid("File not found"))
    );
    assert_eq!(
        session.validation_entry("workspace_dir"),
        Some(ValidationEntry::valid())
    );

    session
        .update("adjust_retention_ratios", json!(true))
        .await
        .expect("toggle");
    assert_eq!(
        session
            .arg_state("road_centerlines_path")
            .expect("road")
            .active_ui_option,
        None
    );

    session
        .set_value("lulc_path", json!("/data/lulc.tif"))
        .expect("set lulc");
    let report = session.validate(Some("lulc_path")).await.expect("scoped");
    assert!(report.ran_follow_up());
    assert_eq!(session.all_valid(), Some(true));

    let requests = validator.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests.iter().all(|req| req.model_id == "models.stormwater"));
    assert!(requests.iter().all(|req| !req.args.contains_key("n_workers")));
    assert_eq!(requests[2].limit_to.as_deref(), Some("lulc_path"));
    assert_eq!(requests[3].args["lulc_path"], json!("/data/lulc.tif"));

    let mut overall = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::OverallValidityChanged { all_valid } = event {
            overall.push(all_valid);
        }
    }
    assert_eq!(overall, vec![false, true]);
}

/// Import from a saved parameter set replaces values; a mismatched set does not.
#[tokio::test]
async fn batch_import_replaces_or_rejects() {
    let spec = parse_args_spec(STORMWATER).expect("spec");
    let session = ArgsSession::new(
        spec,
        values(vec![("workspace_dir", json!("/old"))]),
        ScriptedValidator::always_valid(),
        SessionOptions::default(),
    );

    let err = session
        .batch_update(BatchPayload {
            module: "models.carbon".to_string(),
            args: values(vec![("workspace_dir", json!("/carbon"))]),
        })
        .await
        .expect_err("wrong module");
    assert!(matches!(err, SessionError::ModuleMismatch { .. }));
    assert_eq!(session.values(), values(vec![("workspace_dir", json!("/old"))]));
    assert_eq!(session.all_valid(), None);

    let report = session
        .batch_update(BatchPayload {
            module: "models.stormwater".to_string(),
            args: values(vec![
                ("lulc_path", json!("/data/lulc.tif")),
                ("adjust_retention_ratios", json!(false)),
                ("n_workers", json!(4)),
            ]),
        })
        .await
        .expect("import");

    assert_eq!(report.all_valid(), Some(true));
    assert_eq!(
        session.values(),
        values(vec![
            ("lulc_path", json!("/data/lulc.tif")),
            ("adjust_retention_ratios", json!(false)),
        ])
    );
    assert_eq!(
        session
            .arg_state("retention_radius")
            .expect("radius")
            .active_ui_option
            .as_deref(),
        Some("disable")
    );
}
