//! `uptool` — runs the built-in integrations over a repository, printing
//! what each would change.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tokio_util::sync::CancellationToken;
use uptool::policy::{IntegrationPolicy, PlanContext};
use uptool::registry::INTEGRATIONS;

/// Detect, plan, and optionally apply dependency upgrades across a repo.
#[derive(Debug, Parser)]
#[clap(name = "uptool", version)]
struct Cli {
    /// Repository root to scan. Defaults to the current directory.
    #[clap(long, default_value = ".")]
    path: PathBuf,

    /// Write rewrites to disk instead of only printing the plan.
    #[clap(long)]
    apply: bool,

    /// Only run the named integration (e.g. `github-actions`, `docker`).
    #[clap(long = "only")]
    only: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("uptool: {err}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    uptool::adapters::register_builtins(&INTEGRATIONS).ok();

    let integrations = match &cli.only {
        Some(name) => INTEGRATIONS.get(name).into_iter().collect::<Vec<_>>(),
        None => INTEGRATIONS.get_all(),
    };

    let cancel = CancellationToken::new();
    let ctx = PlanContext::new(IntegrationPolicy::default(), uptool::update::PolicySource::Default, cancel.clone());

    for integration in integrations {
        let manifests = integration
            .detect(&cli.path, &cancel)
            .await
            .with_context(|| format!("detecting {} manifests under {}", integration.name(), cli.path.display()))?;
        for manifest in manifests {
            let plan = integration
                .plan(&manifest, &ctx)
                .await
                .with_context(|| format!("planning updates for {}", manifest.path.display()))?;
            if plan.updates.is_empty() {
                continue;
            }

            println!("{} ({} update(s)):", manifest.path.display(), plan.updates.len());
            for update in &plan.updates {
                println!(
                    "  {} {} -> {} [{:?}]",
                    update.dependency.name, update.dependency.current_version, update.target_version, update.impact
                );
            }

            if cli.apply {
                let result = integration
                    .apply(&plan, &cancel)
                    .await
                    .with_context(|| format!("applying updates to {}", manifest.path.display()))?;
                println!("  applied {}, failed {}", result.applied, result.failed);
                if !result.manifest_diff.is_empty() {
                    println!("{}", result.manifest_diff);
                }
                for error in &result.errors {
                    eprintln!("  error: {error}");
                }
            }
        }
    }

    Ok(())
}
