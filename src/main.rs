use std::env;

use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use smoney::csv::{read_entries, write_statements};
use smoney::{Engine, FileStorage};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let data_dir = args
        .next()
        .expect("usage: smoney <data-dir> [entries.csv]");
    let entries = args.next();

    let mut engine = Engine::new(FileStorage::new(&data_dir));

    if let Some(path) = entries {
        if !path.ends_with(".csv") {
            warn!(path, "entries file seems to not be a csv file");
        }

        let (entry_sender, entry_receiver) = tokio::sync::mpsc::channel(16);

        tokio::spawn(async move {
            let entries = match read_entries(&path) {
                Ok(entries) => entries,
                Err(e) => {
                    error!("{e}");
                    return;
                }
            };
            for result in entries {
                match result {
                    Ok(entry) => {
                        if entry_sender.send(entry).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("{e}");
                    }
                }
            }
        });

        engine.run(ReceiverStream::new(entry_receiver)).await;
    }

    if let Err(e) = write_statements(std::io::stdout().lock(), engine.statements()) {
        error!("failed to write report: {e}");
    }
}
