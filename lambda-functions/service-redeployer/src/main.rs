use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use service_redeployer::{
    invocation_deadline, AlarmEvent, RedeployAction, RedeployerSettings, Response,
};

async fn function_handler(
    action: &RedeployAction,
    event: LambdaEvent<AlarmEvent>,
) -> Result<Response, Error> {
    let deadline = invocation_deadline(event.context.deadline, action.settings().deadline_margin);
    let response = action.execute_until(&event.payload, deadline).await?;
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = RedeployerSettings::from_env()?;
    let action = RedeployAction::for_aws(settings);
    let action = &action;

    run(service_fn(move |event: LambdaEvent<AlarmEvent>| async move {
        function_handler(action, event).await
    }))
    .await
}
