//! End-to-end validation scenarios: aggregation, supersession, debounce and
//! convergence behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use formkit::{
    EntryPath, Form, FormValues, ParameterDef, ValidationLevel, ValidationOpts, ValidationStatus,
};

fn path(s: &str) -> EntryPath {
    EntryPath::parse(s).unwrap()
}

const ALLOWED_STATES: [&str; 4] = ["NY", "New York", "CA", "California"];

/// A form for registering national parks: `parkName` is required and depends
/// on `state` for cross-field validation; `state` is required and must be a
/// two-letter code.
fn national_park_form() -> Form {
    let form = Form::builder()
        .title("National park")
        .on_validate_sync(|values| {
            if values.get("parkName") == Some(&json!("Yosemite"))
                && values.get("state") != Some(&json!("CA"))
            {
                return ValidationStatus::error("Invalid park/state combination");
            }
            ValidationStatus::ok()
        })
        .build();

    form.param::<String>(
        ParameterDef::new("parkName")
            .label("Park name")
            .required(true)
            .dependency("state", "state")
            .on_validate_sync(|ctx| {
                let valid = ctx
                    .value()
                    .as_str()
                    .is_some_and(|s| s.chars().all(|c| c.is_alphabetic() || c.is_whitespace()));
                if valid {
                    ValidationStatus::ok()
                } else {
                    ValidationStatus::error(
                        "Invalid park name. Only letters and spaces are allowed.",
                    )
                }
            })
            .on_validate_async(|ctx| {
                let state = ctx.dependency_as_string("state");
                async move {
                    match state {
                        None => ValidationStatus::error(
                            "Cannot validate park name: no state selected",
                        ),
                        Some(state) if ALLOWED_STATES.contains(&state.as_str()) => {
                            ValidationStatus::ok()
                        }
                        Some(_) => ValidationStatus::error(format!(
                            "Invalid state selected. Valid options are: {}",
                            ALLOWED_STATES.join(", ")
                        )),
                    }
                }
            }),
    )
    .unwrap();

    form.param::<String>(
        ParameterDef::new("state")
            .required(true)
            .on_validate_async(|ctx| {
                let value = ctx.value().as_str().map(str::to_string);
                async move {
                    match value {
                        Some(state) if state.len() == 2 => ValidationStatus::ok(),
                        _ => ValidationStatus::error("State must be exactly 2 characters"),
                    }
                }
            }),
    )
    .unwrap();

    form.initialize().unwrap();
    form
}

#[tokio::test]
async fn empty_form_aggregates_error_count() {
    let form = national_park_form();
    let snapshot = form.validate(ValidationOpts::default()).await;

    let overall = snapshot.overall_status().unwrap();
    assert_eq!(overall.level, ValidationLevel::Error);
    assert_eq!(overall.message.as_deref(), Some("2 errors found"));

    let statuses = form.entry_validation_status();
    assert_eq!(
        statuses[&path("parkName")].message.as_deref(),
        Some("Park name is required")
    );
    assert_eq!(
        statuses[&path("state")].message.as_deref(),
        Some("State is required")
    );
}

#[tokio::test]
async fn single_error_message_is_verbatim() {
    let form = national_park_form();
    form.update_value("parkName", "Yosemite");
    let snapshot = form.validate(ValidationOpts::default()).await;

    // parkName now fails through its dependency, state through presence
    let overall = snapshot.overall_status().unwrap();
    assert_eq!(overall.message.as_deref(), Some("2 errors found"));

    form.update_value("state", "CA");
    form.validate(ValidationOpts::default()).await;
    assert!(form.validation_status().unwrap().is_ok());

    // Exactly one failing entry: the overall message is that entry's own
    form.update_value("state", "California");
    form.validate(ValidationOpts::default()).await;
    let status = form.validation_status().unwrap();
    assert_eq!(status.level, ValidationLevel::Error);
    assert_eq!(
        status.message.as_deref(),
        Some("State must be exactly 2 characters")
    );
}

#[tokio::test]
async fn dependency_failures_surface_through_park_name() {
    let form = national_park_form();
    form.update_value("parkName", "Yosemite");

    // "CO" passes the length check but is not an allowed state, so the only
    // failure comes from parkName's dependency-driven validator.
    form.update_value("state", "CO");
    form.validate(ValidationOpts::default()).await;
    let status = form.validation_status().unwrap();
    assert_eq!(status.level, ValidationLevel::Error);
    assert_eq!(
        status.message.as_deref(),
        Some("Invalid state selected. Valid options are: NY, New York, CA, California")
    );

    form.update_value("state", "CA");
    form.validate(ValidationOpts::default()).await;
    let status = form.validation_status().unwrap();
    assert!(status.is_ok());
    assert!(status.message.is_none());
}

#[tokio::test]
async fn required_precedence_skips_custom_sync_validator() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let form = Form::new(FormValues::new());
    let name = form
        .param::<String>(
            ParameterDef::new("name")
                .required(true)
                .on_validate_sync(move |_ctx| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    ValidationStatus::ok()
                }),
        )
        .unwrap();
    form.initialize().unwrap();

    let snapshot = form.validate(ValidationOpts::default()).await;
    let status = snapshot.entry_status(&path("name")).unwrap();
    assert_eq!(status.level, ValidationLevel::Error);
    assert_eq!(status.message.as_deref(), Some("Name is required"));
    // Per-field validation applies the same precedence
    assert_eq!(name.validate_sync().level, ValidationLevel::Error);
    // The custom validator must never have run
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn async_validator_skipped_when_sync_fails() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let form = Form::new(FormValues::new());
    form.param::<String>(
        ParameterDef::new("name")
            .required(true)
            .on_validate_async(move |_ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { ValidationStatus::ok() }
            }),
    )
    .unwrap();
    form.initialize().unwrap();

    form.validate(ValidationOpts::default()).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Once sync validation passes, the async validator runs
    form.update_value("name", "Sequoia");
    form.validate(ValidationOpts::default()).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn rapid_validation_cancels_earlier_attempt() {
    let form = national_park_form();
    form.update_value("parkName", "Yosemite");
    form.update_value("state", "CA");

    let first = form.validate(ValidationOpts::default());
    let second = form.validate(ValidationOpts::default());
    let (first, second) = tokio::join!(first, second);

    let canceled = first.overall_status().unwrap();
    assert_eq!(canceled.level, ValidationLevel::Canceled);
    assert_eq!(canceled.message.as_deref(), Some("Validation canceled"));

    let real = second.overall_status().unwrap();
    assert!(real.is_ok());
}

#[tokio::test(start_paused = true)]
async fn forced_validation_is_immune_to_cancellation() {
    let form = national_park_form();
    form.update_value("parkName", "Yosemite");
    form.update_value("state", "CA");

    let forced = form.validate(ValidationOpts::forced());
    let preempting = form.validate(ValidationOpts::default());
    let (forced, _) = tokio::join!(forced, preempting);

    let status = forced.overall_status().unwrap();
    assert_ne!(status.level, ValidationLevel::Canceled);
    assert!(status.is_ok());

    // Entry statuses carry the forced flag so renderers know to show every
    // error on final submit validation.
    let park = forced.entry_status(&path("parkName")).unwrap();
    assert!(park.forced);
}

#[tokio::test(start_paused = true)]
async fn wait_for_validation_returns_the_last_attempt() {
    let form = national_park_form();

    // Begin in an error state
    form.validate(ValidationOpts::default()).await;
    assert_eq!(
        form.validation_status().unwrap().level,
        ValidationLevel::Error
    );

    // waitForValidation is non-blocking: started before the burst, it still
    // observes the final outcome of the burst.
    let wait = form.wait_for_validation();

    form.update_value("parkName", "Yosemite");
    let v1 = form.validate(ValidationOpts::default());
    form.update_value("state", "invalid");
    let v2 = form.validate(ValidationOpts::default());
    form.update_value("state", "CA");
    let v3 = form.validate(ValidationOpts::default()); // only this one makes the form valid

    let (status, _, _, _) = tokio::join!(wait, v1, v2, v3);

    let status = status.unwrap();
    assert!(status.is_ok());
    // The status returned by waitForValidation is the form's current status
    assert_eq!(Some(status), form.validation_status());
}

#[tokio::test]
async fn validate_event_fires_after_sync_and_after_completion() {
    let form = national_park_form();

    let phases = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = phases.clone();
    form.on_validate(move |snapshot| {
        if let Ok(mut log) = sink.lock() {
            log.push((
                snapshot.sync_validation_complete(),
                snapshot.async_validation_complete(),
                snapshot.overall_status().is_some(),
            ));
        }
    });

    let pending = form.validate(ValidationOpts::default());

    // The sync pass has already run and fired its event; no overall status
    // yet, and the form still reports none.
    {
        let log = phases.lock().unwrap();
        assert_eq!(log.as_slice(), &[(true, false, false)]);
    }
    assert!(form.validation_status().is_none());

    pending.await;

    let log = phases.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1], (true, true, true));
}

#[tokio::test]
async fn form_level_async_overrides_sync_only_while_ok() {
    // Entry statuses all ok; sync callback ok; async callback warns →
    // overall picks up the warning.
    let form = Form::builder()
        .on_validate_sync(|_| ValidationStatus::ok())
        .on_validate_async(|_| async { ValidationStatus::warn("check the quota") })
        .build();
    form.param::<String>(ParameterDef::new("name")).unwrap();
    form.initialize().unwrap();

    form.validate(ValidationOpts::default()).await;
    let status = form.validation_status().unwrap();
    assert_eq!(status.level, ValidationLevel::Warn);
    assert_eq!(status.message.as_deref(), Some("check the quota"));

    // An entry-level error always beats the form-level callbacks.
    form.param::<String>(ParameterDef::new("required").required(true))
        .unwrap();
    form.validate(ValidationOpts::default()).await;
    let status = form.validation_status().unwrap();
    assert_eq!(status.level, ValidationLevel::Error);
    assert_eq!(status.message.as_deref(), Some("Required is required"));
}

#[tokio::test]
async fn warnings_aggregate_like_errors() {
    let form = Form::new(FormValues::new());
    for id in ["first", "second"] {
        form.param::<String>(
            ParameterDef::new(id)
                .on_validate_sync(|_| ValidationStatus::warn("deprecated option")),
        )
        .unwrap();
    }
    form.initialize().unwrap();

    form.validate(ValidationOpts::default()).await;
    let status = form.validation_status().unwrap();
    assert_eq!(status.level, ValidationLevel::Warn);
    assert_eq!(status.message.as_deref(), Some("2 warnings found"));
}

#[tokio::test]
async fn forced_status_is_pinned_until_next_validation() {
    let form = national_park_form();
    form.update_value("parkName", "Yosemite");
    form.update_value("state", "CA");

    form.force_validation_status(ValidationStatus::error("Deployment failed"));
    assert_eq!(
        form.validation_status().unwrap().message.as_deref(),
        Some("Deployment failed")
    );

    // The next validation clears the pinned status
    form.validate(ValidationOpts::default()).await;
    assert!(form.validation_status().unwrap().is_ok());
}

#[tokio::test]
async fn excluded_parameters_are_not_validated() {
    let form = Form::new(FormValues::new());
    form.param::<String>(
        ParameterDef::new("ghost")
            .required(true)
            .excluded(true),
    )
    .unwrap();
    form.param::<String>(ParameterDef::new("name")).unwrap();
    form.initialize().unwrap();

    form.validate(ValidationOpts::default()).await;
    assert!(form.validation_status().unwrap().is_ok());
}
