use anyhow::{Context, Result};
use argh::FromArgs;
use tracing_subscriber::EnvFilter;

use std::io::Write;

mod api;
mod filter;
mod model;
mod summary;
mod template;

use api::DrupalApi;
use filter::Filter;
use model::{Category, Queue};

/// Count drupal.org issues in the review queues per component.
#[derive(Debug, FromArgs)]
struct Args {
    /// show version
    #[argh(switch)]
    version: bool,

    /// base url of the drupal.org REST API
    #[argh(option, default = "DrupalApi::API_ENDPOINT.to_owned()")]
    api: String,

    /// project node id [default: 3060, Drupal core]
    #[argh(option, default = "3060")]
    project: u32,

    /// number of issues per page [default: 50]
    #[argh(option, default = "50")]
    limit: u32,

    /// queue to count, needs-review or rtbc; repeatable [default: both]
    #[argh(option)]
    queue: Vec<Queue>,

    /// version or major version to ignore; repeatable [default: 7, 8]
    #[argh(option)]
    exclude_version: Vec<String>,

    /// issue category to ignore, by name or code; repeatable [default: plan]
    #[argh(option)]
    exclude_category: Vec<Category>,
}

impl Args {
    fn queues(&self) -> Vec<Queue> {
        if self.queue.is_empty() {
            Queue::ALL.to_vec()
        } else {
            let mut queues = Vec::new();
            for queue in &self.queue {
                if !queues.contains(queue) {
                    queues.push(*queue);
                }
            }
            queues
        }
    }

    fn filter(&self) -> Filter {
        let versions = if self.exclude_version.is_empty() {
            vec!["7".to_owned(), "8".to_owned()]
        } else {
            self.exclude_version.clone()
        };
        let categories = if self.exclude_category.is_empty() {
            vec![Category::Plan]
        } else {
            self.exclude_category.clone()
        };
        Filter::new(versions, categories)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let args: Args = argh::from_env();
    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let hb = template::registry()?;
    let api = DrupalApi::new(&args.api)?;
    let filter = args.filter();
    let queues = args.queues();

    let mut per_queue = Vec::with_capacity(queues.len());
    for &queue in &queues {
        let fetched = api.issues(args.project, queue, args.limit).await;
        let fetched_len = fetched.len();
        let relevant = filter.apply(fetched);
        tracing::info!(
            "{}: {} issues, {} relevant",
            queue,
            fetched_len,
            relevant.len()
        );
        tracing::debug!(
            "{}: dropped {} issues for version or category",
            queue,
            fetched_len - relevant.len()
        );
        per_queue.push((queue, summary::count_by_component(&relevant)));
    }

    let rows = summary::merge(&per_queue);
    let report = template::render(&hb, &queues, &rows)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(report.as_bytes())
        .context("could not write report")?;
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_logging();

    if let Err(ref e) = run().await {
        let stderr = &mut std::io::stderr();
        let errmsg = "Error writing to stderr";

        writeln!(stderr, "Error: {}", e).expect(errmsg);
        for e in e.chain().skip(1) {
            writeln!(stderr, "Caused by: {}", e).expect(errmsg);
        }

        std::process::exit(1);
    }
}
