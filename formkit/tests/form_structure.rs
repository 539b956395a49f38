//! Structural behavior: registration, sections, subforms, dynamic
//! properties and the change event bus.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use formkit::{
    Form, FormError, FormValues, ParameterDef, SectionDef, SubFormDef, ValidationOpts,
    ValidationStatus,
};

fn values(v: serde_json::Value) -> FormValues {
    v.as_object().cloned().unwrap_or_default()
}

#[test]
fn parameters_register_and_duplicates_fail() {
    let form = Form::new(values(json!({ "message": "Hello world!" })));
    assert_eq!(form.all_entries_count(), 0);
    assert_eq!(form.values(), values(json!({ "message": "Hello world!" })));

    let message = form
        .param::<String>(ParameterDef::new("message").value("Hello galaxy!"))
        .unwrap();
    assert_eq!(form.all_entries_count(), 1);

    // Buffered initial values land in the store on initialize()
    form.initialize().unwrap();
    assert_eq!(form.values(), values(json!({ "message": "Hello galaxy!" })));

    message.set_value("Hello universe!".into()).unwrap();
    assert_eq!(form.values(), values(json!({ "message": "Hello universe!" })));

    // Duplicate ids under the same parent are rejected
    let err = form.param::<String>(ParameterDef::new("message")).unwrap_err();
    assert!(matches!(err, FormError::DuplicatePath { .. }));
}

#[test]
fn initialize_runs_exactly_once() {
    let form = Form::new(FormValues::new());
    form.param::<String>(ParameterDef::new("name").value("first"))
        .unwrap();
    form.initialize().unwrap();
    let err = form.initialize().unwrap_err();
    assert!(matches!(err, FormError::AlreadyInitialized));
}

#[test]
fn sections_nest_and_counts_track() {
    let form = Form::new(values(json!({ "make": "Tesla" })));
    form.param::<String>(ParameterDef::new("make").label("Make"))
        .unwrap();
    form.param::<String>(
        ParameterDef::new("model").label("Model").value("Model Y"),
    )
    .unwrap();
    form.param::<f64>(ParameterDef::new("milesPerCharge").label("Miles per charge"))
        .unwrap();

    let drivers = form.section(SectionDef::new("drivers").label("Drivers")).unwrap();
    let drivers_param = drivers
        .param::<Vec<String>>(ParameterDef::new("registered").label("Drivers"))
        .unwrap();

    assert_eq!(form.all_entries_count(), 5);
    assert_eq!(form.child_entries_count(), 4);
    assert_eq!(drivers.child_entries_count(), 1);

    let advanced = drivers.section(SectionDef::new("advanced")).unwrap();
    let max_param = advanced
        .param::<f64>(ParameterDef::new("maxRegistered"))
        .unwrap();

    assert_eq!(form.all_entries_count(), 7);
    assert_eq!(form.child_entries_count(), 4);
    assert_eq!(drivers.child_entries_count(), 2);
    assert_eq!(advanced.child_entries_count(), 1);
    assert_eq!(max_param.path().as_str(), "drivers.advanced.maxRegistered");

    // hidden and disabled cascade from a section to everything below it
    assert!(!drivers_param.hidden());
    drivers.set_hidden(true);
    assert!(drivers_param.hidden());
    assert!(advanced.hidden());
    assert!(max_param.hidden());
    drivers.set_hidden(false);
    assert!(!max_param.hidden());

    drivers.set_disabled(true);
    assert!(drivers_param.disabled());
    assert!(max_param.disabled());
    drivers.set_disabled(false);
    assert!(!max_param.disabled());

    form.initialize().unwrap();
    assert_eq!(
        form.values(),
        values(json!({ "make": "Tesla", "model": "Model Y" }))
    );

    // Values written through a nested parameter land at its full path
    drivers_param
        .set_value(vec!["George".into(), "Abe".into()])
        .unwrap();
    assert_eq!(
        form.values(),
        values(json!({
            "make": "Tesla",
            "model": "Model Y",
            "drivers": { "registered": ["George", "Abe"] }
        }))
    );
}

#[test]
fn subforms_share_the_root_store() {
    let form = Form::new(values(json!({ "applicant": "Sir Gallahad" })));
    form.param::<String>(ParameterDef::new("applicant").value("Sir Lancelot"))
        .unwrap();

    let answers = form
        .sub_form(SubFormDef::new("answers").values(values(json!({ "color": "red" }))))
        .unwrap();
    answers.param::<String>(ParameterDef::new("color")).unwrap();
    answers
        .param::<f64>(ParameterDef::new("sparrowVelocity"))
        .unwrap();

    form.initialize().unwrap();
    assert_eq!(answers.values(), values(json!({ "color": "red" })));
    assert_eq!(
        form.values(),
        values(json!({
            "applicant": "Sir Lancelot",
            "answers": { "color": "red" }
        }))
    );

    // Mutation through the subform is visible at the root and vice versa
    answers.update_value("color", "blue");
    assert_eq!(form.values()["answers"].clone(), json!({ "color": "blue" }));
    form.update_value("answers.sparrowVelocity", 24);
    assert_eq!(
        answers.values(),
        values(json!({ "color": "blue", "sparrowVelocity": 24 }))
    );

    // Typed lookup distinguishes kinds
    assert!(form.get_sub_form("answers").is_ok());
    let err = form.get_param::<String>("answers").unwrap_err();
    assert!(matches!(err, FormError::EntryKindMismatch { .. }));
    let err = form.get_section("missing").unwrap_err();
    assert!(matches!(err, FormError::EntryNotFound { .. }));
}

#[test]
fn dynamic_properties_follow_value_changes() {
    let form = Form::new(values(json!({ "hideMessage": false, "message": "Hello world!" })));
    let hide = form
        .param::<bool>(ParameterDef::new("hideMessage"))
        .unwrap();
    let message = form
        .param::<String>(
            ParameterDef::new("message")
                .label("Not evaluated yet")
                .dynamic_hidden(|values| values.get("hideMessage") == Some(&json!(true)))
                .dynamic_label(|values| {
                    if values.get("hideMessage") == Some(&json!(true)) {
                        "Hidden message".to_string()
                    } else {
                        "Visible message".to_string()
                    }
                }),
        )
        .unwrap();
    form.initialize().unwrap();

    // Nothing is evaluated until asked
    assert!(!message.hidden());
    assert_eq!(message.label(), "Not evaluated yet");

    form.evaluate();
    assert!(!message.hidden());
    assert_eq!(message.label(), "Visible message");

    // A value change re-evaluates automatically
    hide.set_value(true).unwrap();
    assert!(message.hidden());
    assert_eq!(message.label(), "Hidden message");
}

#[test]
fn change_events_fire_with_old_and_new_values() {
    let form = Form::new(values(json!({ "hobbit": "Bilbo", "dwarf": "Gimli" })));
    form.param::<String>(ParameterDef::new("hobbit")).unwrap();
    form.param::<String>(ParameterDef::new("dwarf")).unwrap();
    form.initialize().unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = form.on_change(move |new_values, old_values| {
        if let Ok(mut log) = sink.lock() {
            log.push((new_values.clone(), old_values.clone()));
        }
    });

    form.update_value("hobbit", "Frodo");
    {
        let log = seen.lock().unwrap();
        assert_eq!(
            log.as_slice(),
            &[(
                values(json!({ "hobbit": "Frodo", "dwarf": "Gimli" })),
                values(json!({ "hobbit": "Bilbo", "dwarf": "Gimli" })),
            )]
        );
    }

    // Setting the same value again is a no-op: no event
    form.update_value("hobbit", "Frodo");
    assert_eq!(seen.lock().unwrap().len(), 1);

    // After unsubscribing, nothing fires
    form.off(subscription);
    form.update_value("dwarf", "Thorin");
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn subform_change_events_are_scoped() {
    let form = Form::new(FormValues::new());
    form.param::<String>(ParameterDef::new("dwarf").value("Gimli"))
        .unwrap();
    let elf = form
        .sub_form(
            SubFormDef::new("elf")
                .values(values(json!({ "type": "Noldor", "name": "Gil-Galad" }))),
        )
        .unwrap();
    elf.param::<String>(ParameterDef::new("name")).unwrap();
    form.initialize().unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = elf.on_change(move |new_values, old_values| {
        if let Ok(mut log) = sink.lock() {
            log.push((new_values.clone(), old_values.clone()));
        }
    });

    // A change outside the subform's subtree does not reach its listeners
    form.update_value("dwarf", "Thorin");
    assert!(seen.lock().unwrap().is_empty());

    elf.update_value("name", "Galadriel");
    {
        let log = seen.lock().unwrap();
        assert_eq!(
            log.as_slice(),
            &[(
                values(json!({ "type": "Noldor", "name": "Galadriel" })),
                values(json!({ "type": "Noldor", "name": "Gil-Galad" })),
            )]
        );
    }

    elf.off(subscription);
    elf.update_value("name", "Feanor");
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn change_handlers_may_reenter_the_form() {
    let form = Form::new(values(json!({ "number": 0 })));
    let number = form
        .param::<f64>(ParameterDef::new("number").value(1.0))
        .unwrap();
    form.param::<f64>(ParameterDef::new("numberPlusOne")).unwrap();
    form.param::<f64>(ParameterDef::new("numberPlusTwo")).unwrap();
    form.initialize().unwrap();

    let change_count = Arc::new(AtomicUsize::new(0));
    let counter = change_count.clone();
    let reentrant = form.clone();
    form.on_change(move |new_values, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        let n = new_values
            .get("number")
            .and_then(|v| v.as_f64())
            .unwrap_or_default();
        // Both the typed handle and update_value fire further change events
        if let Ok(plus_one) = reentrant.get_param::<f64>("numberPlusOne") {
            let _ = plus_one.set_value(n + 1.0);
        }
        reentrant.update_value("numberPlusTwo", n + 2.0);
    });

    number.set_value(2.0).unwrap();

    // Once for "number" and once for each computed value written inside the
    // handler
    assert_eq!(change_count.load(Ordering::SeqCst), 3);
    assert_eq!(
        form.values(),
        values(json!({ "number": 2.0, "numberPlusOne": 3.0, "numberPlusTwo": 4.0 }))
    );
}

#[tokio::test]
async fn reset_restores_construction_values() {
    let initial = values(json!({
        "family": "Canidae",
        "genus": "Canis",
        "species": "Canis familiaris"
    }));
    let form = Form::builder()
        .values(initial.clone())
        .on_validate_sync(|values| {
            if values.get("family") != Some(&json!("Canidae")) {
                return ValidationStatus::error("Dogs only!");
            }
            ValidationStatus::ok()
        })
        .build();
    form.initialize().unwrap();

    form.validate(ValidationOpts::default()).await;
    assert!(form.validation_status().unwrap().is_ok());

    form.set_values(values(json!({
        "family": "Felidae",
        "genus": "Felis",
        "species": "Felis catus"
    })));
    form.validate(ValidationOpts::default()).await;
    let status = form.validation_status().unwrap();
    assert_eq!(status.message.as_deref(), Some("Dogs only!"));

    form.reset();
    assert_eq!(form.values(), initial);
    form.validate(ValidationOpts::default()).await;
    assert!(form.validation_status().unwrap().is_ok());
}

#[test]
fn set_values_round_trips() {
    let form = Form::new(FormValues::new());
    form.param::<String>(ParameterDef::new("make")).unwrap();
    form.initialize().unwrap();

    let new_values = values(json!({ "make": "Ford", "extras": { "color": "blue" } }));
    form.set_values(new_values.clone());
    assert_eq!(form.values(), new_values);
}

#[test_log::test]
fn updating_a_section_value_degrades_silently() {
    let form = Form::new(FormValues::new());
    form.section(SectionDef::new("drivers")).unwrap();
    form.initialize().unwrap();

    let events = Arc::new(AtomicUsize::new(0));
    let counter = events.clone();
    form.on_change(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // Sections hold no value: logged and ignored, never an event or a panic
    form.update_value("drivers", "nope");
    // Same for paths nothing is registered at
    form.update_value("unknown", 1);

    assert!(form.values().is_empty());
    assert_eq!(events.load(Ordering::SeqCst), 0);
}

#[test]
fn dirty_tracks_store_writes() {
    let form = Form::new(FormValues::new());
    let name = form
        .param::<String>(ParameterDef::new("name").value("seeded"))
        .unwrap();
    form.initialize().unwrap();

    assert!(!name.dirty());
    name.set_value("edited".into()).unwrap();
    assert!(name.dirty());
}

#[test]
fn typed_value_round_trip_and_mismatch() {
    let form = Form::new(FormValues::new());
    let count = form.param::<f64>(ParameterDef::new("count")).unwrap();
    form.initialize().unwrap();

    assert_eq!(count.value().unwrap(), None);
    count.set_value(42.0).unwrap();
    assert_eq!(count.value().unwrap(), Some(42.0));

    // Reading the same path as a mismatched type is a configuration error
    let as_string = form.get_param::<String>("count").unwrap();
    assert!(matches!(
        as_string.value().unwrap_err(),
        FormError::ValueType { .. }
    ));
}
