use std::future::Future;
use std::io::IsTerminal;
use std::path::MAIN_SEPARATOR;
use std::pin::Pin;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use http_body_util::BodyExt;
use hyper::Response;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;

use poteto::config::{self, Config};
use poteto::{logger, Body, Error, Poteto, RequestInit, Verb};

#[derive(Parser, Debug)]
#[command(name = "poteto", version, about = "Local files over an HTTP-style interface")]
struct Cli {
    /// Config file path (without extension)
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print resources in order, each loaded whole
    Cat {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Stream resources concurrently; chunks may interleave
    Dog {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// List directories recursively as JSON
    Ls { urls: Vec<String> },
    /// Write standard input to a resource
    Put { url: String },
    /// Delete resources (not recursive)
    Rm {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut cfg = Config::load_from(&cli.config)?;
    cfg.engine.persist_cwd = true;
    logger::init(&cfg)?;
    logger::log_info(&format!(
        "[CONFIG] Header prefix '{}', read chunk size {} bytes",
        cfg.engine.prefix, cfg.engine.read_chunk_size
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cfg, cli.command))
}

async fn async_main(cfg: Config, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let poteto = Arc::new(Poteto::new(&cfg)?);

    match command {
        Command::Cat { urls } => {
            for url in urls {
                match poteto.fetch(url.as_str(), RequestInit::new()).await {
                    Ok(response) => print_response(response).await?,
                    Err(err) => report(&url, &err),
                }
            }
        }
        Command::Dog { urls } => {
            let mut tasks = JoinSet::new();
            for url in urls {
                let poteto = Arc::clone(&poteto);
                tasks.spawn(async move {
                    match poteto.fetch(url.as_str(), RequestInit::new().method(Verb::Read)).await {
                        Ok(response) => print_response(response).await,
                        Err(err) => {
                            report(&url, &err);
                            Ok(())
                        }
                    }
                });
            }
            while let Some(result) = tasks.join_next().await {
                result??;
            }
        }
        Command::Ls { urls } => {
            let mut roots = if urls.is_empty() {
                vec![".".to_string()]
            } else {
                urls
            };
            roots.sort();
            roots.dedup();

            let mut tree = Map::new();
            for root in roots {
                let dir = format!("{root}/");
                let listing = match ls(&poteto, dir.clone()).await {
                    Ok(listing) => listing,
                    Err(err) => {
                        report(&dir, &err);
                        continue;
                    }
                };
                tree.insert(dir, listing);
            }
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(serde_json::to_string_pretty(&Value::Object(tree))?.as_bytes())
                .await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Command::Put { url } => {
            let stdin = tokio::io::stdin();
            if std::io::stdin().is_terminal() {
                eprintln!("writing interactive input to {url}, press Ctrl+D to stop");
            }
            let body = Body::reader(stdin, cfg.engine.read_chunk_size);
            let response = poteto
                .fetch(url.as_str(), RequestInit::new().method(Verb::Put).body(body))
                .await?;
            if !response.status().is_success() {
                let text = response.into_body().bytes().await?;
                eprintln!("{}", String::from_utf8_lossy(&text));
                std::process::exit(1);
            }
        }
        Command::Rm { urls } => {
            let mut tasks = JoinSet::new();
            for url in urls {
                let poteto = Arc::clone(&poteto);
                tasks.spawn(async move {
                    let result = poteto
                        .fetch(url.as_str(), RequestInit::new().method(Verb::Delete))
                        .await;
                    (url, result)
                });
            }
            while let Some(joined) = tasks.join_next().await {
                let (url, result) = joined?;
                match result {
                    Ok(response) if !response.status().is_success() => {
                        eprintln!("{url}: {}", response.status());
                    }
                    Ok(_) => {}
                    Err(err) => report(&url, &err),
                }
            }
        }
    }

    Ok(())
}

/// Copy a response body to stdout, or stderr when the status is not 2xx
async fn print_response(response: Response<Body>) -> std::io::Result<()> {
    let ok = response.status().is_success();
    let mut body = response.into_body();

    while let Some(frame) = body.frame().await {
        if let Ok(chunk) = frame?.into_data() {
            if ok {
                tokio::io::stdout().write_all(&chunk).await?;
            } else {
                tokio::io::stderr().write_all(&chunk).await?;
            }
        }
    }
    tokio::io::stdout().flush().await
}

fn report(url: &str, err: &Error) {
    eprintln!("poteto: {url}: {err}");
}

type Listing<'a> = Pin<Box<dyn Future<Output = Result<Value, Error>> + Send + 'a>>;

/// Directory tree under `dir` (which ends in a separator)
///
/// Files are strings, subdirectories are `{ "name/": [...] }` objects, and a
/// directory that cannot be listed is its status code.
fn ls(poteto: &Poteto, dir: String) -> Listing<'_> {
    Box::pin(async move {
        let response = poteto
            .fetch(dir.as_str(), RequestInit::new().method(Verb::List))
            .await?;
        if !response.status().is_success() {
            return Ok(Value::from(response.status().as_u16()));
        }

        let data = response.into_body().bytes().await.map_err(Error::BodyStream)?;
        let names: Vec<String> = serde_json::from_slice(&data)
            .map_err(|e| Error::BodyStream(std::io::Error::other(e)))?;

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            if name.ends_with(MAIN_SEPARATOR) {
                let nested = ls(poteto, format!("{dir}{name}")).await?;
                let mut object = Map::new();
                object.insert(name, nested);
                entries.push(Value::Object(object));
            } else {
                entries.push(Value::String(name));
            }
        }
        Ok(Value::Array(entries))
    })
}
