use crate::infra::InMemoryIntake;
use chrono::Local;
use clap::Args;
use freedom_riders::error::AppError;
use freedom_riders::workflows::rider_application::{
    ApplicationFormEngine, FieldPath, FieldValue, SubmissionStatus, WizardStep,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Have the in-memory intake reject the application to show the failure path.
    #[arg(long)]
    pub(crate) reject: bool,
}

type Answers = &'static [(FieldPath, Answer)];

#[derive(Debug, Clone, Copy)]
enum Answer {
    Text(&'static str),
    Flag(bool),
}

impl From<Answer> for FieldValue {
    fn from(answer: Answer) -> Self {
        match answer {
            Answer::Text(text) => FieldValue::from(text),
            Answer::Flag(flag) => FieldValue::from(flag),
        }
    }
}

const SAMPLE_ANSWERS: [Answers; 5] = [
    &[
        (FieldPath::FirstName, Answer::Text("Kwabena")),
        (FieldPath::LastName, Answer::Text("Ofori")),
        (FieldPath::Email, Answer::Text("kwabena.ofori@example.com")),
        (FieldPath::Phone, Answer::Text("+233 24 100 2000")),
        (FieldPath::DateOfBirth, Answer::Text("1995-08-19")),
        (FieldPath::Gender, Answer::Text("male")),
        (FieldPath::Address, Answer::Text("22 Lake Road")),
        (FieldPath::City, Answer::Text("Kumasi")),
        (FieldPath::Region, Answer::Text("Ashanti")),
    ],
    &[
        (FieldPath::WorkingModel, Answer::Text("in-house")),
        (FieldPath::PreferredWorkingHours, Answer::Text("full-time")),
    ],
    &[
        (FieldPath::HasMotorbike, Answer::Flag(true)),
        (FieldPath::MotorbikeMake, Answer::Text("Bajaj")),
        (FieldPath::MotorbikeModel, Answer::Text("Boxer 150")),
        (FieldPath::MotorbikeYear, Answer::Text("2021")),
        (FieldPath::MotorbikeRegistrationNumber, Answer::Text("AS 2231-21")),
        (FieldPath::MotorbikeCondition, Answer::Text("good")),
    ],
    &[
        (FieldPath::LicenseNumber, Answer::Text("GH-DL-330401")),
        (FieldPath::LicenseExpiryDate, Answer::Text("2027-10-31")),
        (FieldPath::YearsOfRidingExperience, Answer::Text("6")),
        (FieldPath::HasCommercialExperience, Answer::Flag(true)),
    ],
    &[
        (FieldPath::EmergencyFirstName, Answer::Text("Adwoa")),
        (FieldPath::EmergencyLastName, Answer::Text("Ofori")),
        (FieldPath::EmergencyPhone, Answer::Text("+233 20 300 4000")),
        (FieldPath::EmergencyRelationship, Answer::Text("Sister")),
    ],
];

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let intake = Arc::new(if args.reject {
        InMemoryIntake::rejecting("Rider recruitment is closed in this region")
    } else {
        InMemoryIntake::default()
    });
    let mut engine = ApplicationFormEngine::new(intake.clone());
    let mut status = engine.subscribe();

    println!("Freedom rider application demo");
    println!("Started {}", Local::now().format("%Y-%m-%d %H:%M"));

    println!("\nTrying to continue with an empty form");
    engine.next_step();
    let step = engine.current_step();
    println!(
        "  Still on step {} ({}), {} fields missing",
        step.number(),
        step.title(),
        engine.validation_errors().len()
    );

    for answers in SAMPLE_ANSWERS {
        let step = engine.current_step();
        println!(
            "\nStep {}/{}: {} - {}",
            step.number(),
            WizardStep::COUNT,
            step.title(),
            step.description()
        );
        for (path, answer) in answers {
            engine
                .update_field(*path, *answer)
                .map_err(|err| AppError::Submission(err.to_string()))?;
        }

        if step == WizardStep::LAST {
            engine.submit().await;
        } else {
            engine.next_step();
        }

        if !engine.validation_errors().is_empty() {
            for (path, message) in engine.validation_errors().iter() {
                println!("  {path}: {message}");
            }
            return Err(AppError::Submission(format!(
                "sample answers for step {} are incomplete",
                step.number()
            )));
        }
        println!("  {} answers recorded", answers.len());
    }

    // the watch channel holds the latest transition
    let outcome = status.borrow_and_update().clone();
    match &outcome {
        SubmissionStatus::Succeeded => println!("\nApplication submitted"),
        SubmissionStatus::Failed { message } => println!("\nSubmission failed: {message}"),
        other => println!("\nSubmission {}", other.label()),
    }

    for payload in intake.received() {
        match serde_json::to_string_pretty(&payload) {
            Ok(json) => println!("Delivered payload:\n{json}"),
            Err(err) => println!("Delivered payload unavailable: {err}"),
        }
    }

    Ok(())
}
