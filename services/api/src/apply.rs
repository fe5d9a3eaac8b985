use crate::infra::load_draft;
use clap::Args;
use freedom_riders::config::{AppConfig, IntakeConfig};
use freedom_riders::error::AppError;
use freedom_riders::telemetry;
use freedom_riders::workflows::fare::FareEstimator;
use freedom_riders::workflows::rider_application::{
    ApplicationFormEngine, ApplicationIntake, HttpIntake, SubmissionStatus, WizardStep,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ApplyArgs {
    /// JSON file holding the form fields (same keys the form uses)
    #[arg(long)]
    pub(crate) draft: PathBuf,
    /// Deliver to this URL instead of the configured intake endpoint
    #[arg(long)]
    pub(crate) endpoint: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct FareArgs {
    /// Pickup city
    #[arg(long)]
    pub(crate) pickup: String,
    /// Dropoff city
    #[arg(long)]
    pub(crate) dropoff: String,
}

pub(crate) async fn run_apply(args: ApplyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, config.environment)?;

    let intake_config = match args.endpoint {
        Some(endpoint) => IntakeConfig::new(endpoint, config.intake.timeout)?,
        None => config.intake,
    };
    let fields = load_draft(&args.draft)?;
    let intake = Arc::new(HttpIntake::new(&intake_config)?);

    println!("Submitting {} to {}", args.draft.display(), intake.endpoint());
    let mut engine = ApplicationFormEngine::with_fields(intake, fields);
    submit_draft(&mut engine).await
}

/// Walk every step, stopping at the first one that fails validation, then submit.
pub(crate) async fn submit_draft<I>(engine: &mut ApplicationFormEngine<I>) -> Result<(), AppError>
where
    I: ApplicationIntake + 'static,
{
    loop {
        let step = engine.current_step();
        let advanced = engine.next_step();
        if !engine.validation_errors().is_empty() {
            println!("Step {} ({}) is incomplete:", step.number(), step.title());
            for (path, message) in engine.validation_errors().iter() {
                println!("  {path}: {message}");
            }
            return Err(AppError::Submission(format!(
                "step {} failed validation",
                step.number()
            )));
        }
        println!("  Step {} ({}) complete", step.number(), step.title());
        if advanced == WizardStep::LAST && step == WizardStep::LAST {
            break;
        }
    }

    match engine.submit().await {
        SubmissionStatus::Succeeded => {
            println!("Application submitted");
            Ok(())
        }
        SubmissionStatus::Failed { message } => Err(AppError::Submission(message.clone())),
        other => Err(AppError::Submission(format!(
            "unexpected submission state '{}'",
            other.label()
        ))),
    }
}

pub(crate) fn run_fare(args: FareArgs) -> Result<(), AppError> {
    let quote = FareEstimator::default().estimate(&args.pickup, &args.dropoff)?;
    println!(
        "{} -> {}: {} km, {} {:.2}",
        quote.pickup, quote.dropoff, quote.distance_km, quote.currency, quote.price
    );
    Ok(())
}
