mod args;
mod output;

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use hub_client::{Checkpoint, Facade, HubClient, PaginatedList};
use hub_common::{Entity, HubResult};

use crate::args::{
    Args, Command, DatasetCommand, ModelCommand, ProjectCommand, RecordCommand, TeamCommand,
};
use crate::output::{print_link, print_page, print_record, report};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _otel_guard = hub_common::telemetry::init_tracing(
        "hub-cli",
        args.otlp_endpoint.as_deref(),
        args.otlp_token.as_deref(),
    );

    let client = HubClient::connect(args.hub_config(), args.credentials()).await;
    let client = &client;

    match args.command {
        Command::Model { subcommand } => match subcommand {
            ModelCommand::List(list) => {
                walk(client.model_list(list.options()).await?, list.pages).await;
            }
            ModelCommand::Record(cmd) => {
                run_record(move |id| async move { client.model(id.as_deref()).await }, cmd).await?;
            }
            ModelCommand::Upload {
                id,
                weights,
                epoch,
                best,
                is_final,
                map,
            } => {
                let model = client.model(Some(&id)).await?;
                let checkpoint = Checkpoint {
                    epoch,
                    is_best: best,
                    map,
                    is_final,
                };
                let resp = model.upload_model(&weights, checkpoint).await?;
                report(resp, &format!("Weights uploaded for model '{id}'"), "Upload failed");
            }
            ModelCommand::Metrics { id, data } => {
                let model = client.model(Some(&id)).await?;
                let resp = model.upload_metrics(data).await?;
                report(resp, &format!("Metrics uploaded for model '{id}'"), "Metrics upload failed");
            }
            ModelCommand::Export { id, format } => {
                let model = client.model(Some(&id)).await?;
                let resp = model.export(&format).await?;
                report(resp, &format!("Export to {format} requested"), "Export failed");
            }
            ModelCommand::Predict { id, image, config } => {
                let model = client.model(Some(&id)).await?;
                let config: Entity = match config {
                    Some(value) => serde_json::from_value(value)?,
                    None => Entity::new(),
                };
                match model.predict(&image, &config).await? {
                    Some(resp) => println!("{}", resp.text()),
                    None => eprintln!("✗ Prediction failed"),
                }
            }
            ModelCommand::Link { id, object } => {
                let model = client.model(Some(&id)).await?;
                let link = match object.as_str() {
                    "dataset" => model.get_dataset_url().await?,
                    weight => model.get_weights_url(weight).await?,
                };
                print_link(&object, link);
            }
            ModelCommand::Heartbeat { id, interval } => {
                let model = client.model(Some(&id)).await?;
                model.start_heartbeat(Duration::from_secs(interval))?;
                let heartbeat = model.heartbeat().clone();
                heartbeat.stop_on(shutdown_signal());
                println!("✓ Heartbeats started for model '{id}' every {interval}s (Ctrl-C to stop)");

                while heartbeat.is_alive() && heartbeat.is_running() {
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
                // Still alive here means the loop ended on its own after a failed heartbeat.
                let failed = heartbeat.is_alive();
                if !heartbeat.shutdown(Duration::from_secs(10)).await {
                    tracing::warn!("heartbeat did not stop in time");
                }
                finish_heartbeat(&id, failed, heartbeat.agent_id().as_deref())?;
            }
        },
        Command::Dataset { subcommand } => match subcommand {
            DatasetCommand::List(list) => {
                walk(client.dataset_list(list.options()).await?, list.pages).await;
            }
            DatasetCommand::Record(cmd) => {
                run_record(move |id| async move { client.dataset(id.as_deref()).await }, cmd)
                    .await?;
            }
            DatasetCommand::Upload { id, file } => {
                let dataset = client.dataset(Some(&id)).await?;
                let resp = dataset.upload_dataset(&file).await?;
                report(resp, &format!("Dataset '{id}' uploaded"), "Dataset upload failed");
            }
            DatasetCommand::Link { id, object } => {
                let dataset = client.dataset(Some(&id)).await?;
                print_link(&object, dataset.get_download_link(&object).await?);
            }
        },
        Command::Project { subcommand } => match subcommand {
            ProjectCommand::List(list) => {
                walk(client.project_list(list.options()).await?, list.pages).await;
            }
            ProjectCommand::Record(cmd) => {
                run_record(move |id| async move { client.project(id.as_deref()).await }, cmd)
                    .await?;
            }
            ProjectCommand::UploadImage { id, file } => {
                let project = client.project(Some(&id)).await?;
                let resp = project.upload_image(&file).await?;
                report(resp, &format!("Image uploaded for project '{id}'"), "Image upload failed");
            }
        },
        Command::User { subcommand } => {
            run_record(move |id| async move { client.user(id.as_deref()).await }, subcommand)
                .await?;
        }
        Command::Team { subcommand } => match subcommand {
            TeamCommand::List(list) => {
                walk(client.team_list(list.options()).await?, list.pages).await;
            }
            TeamCommand::Record(cmd) => {
                run_record(move |id| async move { client.team(id.as_deref()).await }, cmd).await?;
            }
        },
    }

    Ok(())
}

/// Prints up to `pages` pages, stopping early at the last one.
async fn walk(mut list: PaginatedList, pages: usize) {
    print_page(&list);
    for _ in 1..pages {
        if !list.next().await {
            break;
        }
        print_page(&list);
    }
}

fn finish_heartbeat(id: &str, failed: bool, agent_id: Option<&str>) -> Result<()> {
    if failed {
        eprintln!("✗ Heartbeats for model '{id}' failed");
        anyhow::bail!("heartbeat loop for model '{id}' exited on error");
    }
    match agent_id {
        Some(agent) => println!("✓ Heartbeats stopped (agent {agent})"),
        None => println!("✓ Heartbeats stopped"),
    }
    Ok(())
}

async fn run_record<T, F, Fut>(open: F, cmd: RecordCommand) -> Result<()>
where
    T: Facade,
    F: FnOnce(Option<String>) -> Fut,
    Fut: Future<Output = HubResult<T>>,
{
    match cmd {
        RecordCommand::Get { id } => {
            let facade = open(Some(id)).await?;
            print_record(facade.record());
        }
        RecordCommand::Create { data } => {
            let mut facade = open(None).await?;
            facade.record_mut().create(data).await;
            let record = facade.record();
            let name = record.crud().name();
            match record.id() {
                Some(id) => println!("✓ Created {name} '{id}'"),
                None => eprintln!("✗ Failed to create {name}"),
            }
        }
        RecordCommand::Update { id, data } => {
            let facade = open(Some(id.clone())).await?;
            let resp = facade.record().update(data).await;
            report(resp, &format!("Updated '{id}'"), &format!("Failed to update '{id}'"));
        }
        RecordCommand::Delete { id, hard } => {
            let facade = open(Some(id.clone())).await?;
            let resp = facade.record().delete(hard).await;
            report(resp, &format!("Deleted '{id}'"), &format!("Failed to delete '{id}'"));
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error=%e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_heartbeat_reports_failure() {
        assert!(finish_heartbeat("m1", false, Some("agent-1")).is_ok());
        assert!(finish_heartbeat("m1", false, None).is_ok());

        let err = finish_heartbeat("m1", true, Some("agent-1")).unwrap_err();
        assert!(err.to_string().contains("m1"));
    }
}
