//! Command handlers for the CLI.
//!
//! Called from `main` once the environment config is loaded and logging is
//! up. Configuration problems and a failed fetch are returned as errors;
//! per-product failures only show up in the run summary.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use tokio_util::sync::CancellationToken;
use trendhunt_ai::{build_provider, AiBudget, AiClient, ProviderOptions, RateLimit, RetryPolicy};
use trendhunt_analysis::{request_ceiling, Pipeline, PipelineSettings, RunSummary};
use trendhunt_core::{
    resolve_run_settings, AppConfig, ProductSink, ProductSource, RunInput, RunSettings,
};
use trendhunt_scraper::{ApifyClient, ApifyProductSource, SampleCatalog};

use crate::output::JsonLinesSink;

/// Conventional exit status for a run stopped by SIGINT.
const EXIT_CANCELLED: u8 = 130;

/// Run input file plus command-line overrides for individual fields.
#[derive(Debug, Default, Args)]
pub(crate) struct InputArgs {
    /// JSON run input (camelCase keys). Missing fields take defaults.
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,

    #[arg(long)]
    pub(crate) category: Option<String>,

    #[arg(long)]
    pub(crate) max_products: Option<i64>,

    /// openrouter, anthropic or openai
    #[arg(long)]
    pub(crate) provider: Option<String>,

    #[arg(long)]
    pub(crate) min_sales: Option<i64>,

    #[arg(long)]
    pub(crate) concurrency: Option<i64>,
}

impl InputArgs {
    /// Reads the input file, if any, and applies the flag overrides.
    pub(crate) fn load(&self) -> anyhow::Result<RunInput> {
        let mut input = match &self.input {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read run input {}", path.display()))?;
                RunInput::from_json_str(&raw)
                    .with_context(|| format!("invalid run input {}", path.display()))?
            }
            None => RunInput::default(),
        };

        if let Some(category) = &self.category {
            input.category.clone_from(category);
        }
        if let Some(max_products) = self.max_products {
            input.max_products = max_products;
        }
        if let Some(provider) = &self.provider {
            input.ai_provider.clone_from(provider);
        }
        if let Some(min_sales) = self.min_sales {
            input.min_sales_count = min_sales;
        }
        if self.concurrency.is_some() {
            input.concurrency = self.concurrency;
        }
        Ok(input)
    }
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[command(flatten)]
    pub(crate) input: InputArgs,

    /// Write JSON lines here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,

    /// Use the built-in sample catalog even when APIFY_TOKEN is set
    #[arg(long)]
    pub(crate) sample: bool,
}

/// Which product source a run will use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceChoice {
    Apify,
    Sample,
}

pub(crate) fn choose_source(config: &AppConfig, force_sample: bool) -> SourceChoice {
    if force_sample || config.apify_token.is_none() {
        SourceChoice::Sample
    } else {
        SourceChoice::Apify
    }
}

fn build_source(
    config: &AppConfig,
    choice: SourceChoice,
) -> anyhow::Result<Arc<dyn ProductSource>> {
    match (choice, config.apify_token.as_deref()) {
        (SourceChoice::Apify, Some(token)) => {
            let client =
                ApifyClient::new(token, Duration::from_secs(config.scraper_timeout_secs))
                    .context("failed to build Apify client")?;
            Ok(Arc::new(ApifyProductSource::new(
                client,
                config.apify_actor_id.as_str(),
            )))
        }
        _ => Ok(Arc::new(SampleCatalog)),
    }
}

fn build_ai_client(settings: &RunSettings, config: &AppConfig) -> anyhow::Result<AiClient> {
    let provider = build_provider(
        settings.provider,
        &settings.api_key,
        &ProviderOptions {
            model_override: settings.model_override.as_deref(),
            site_url: &config.site_url,
            base_url: None,
            timeout: Duration::from_secs(config.ai_timeout_secs),
        },
    )
    .context("failed to build AI provider")?;

    let budget = AiBudget::new(RateLimit {
        requests_per_minute: config.ai_requests_per_minute,
        max_wait: Duration::from_secs(config.ai_rate_limit_max_wait_secs),
    })
    .with_request_ceiling(request_ceiling(settings.max_products, config.ai_max_retries));

    let retry = RetryPolicy {
        max_retries: config.ai_max_retries,
        backoff_base_ms: config.ai_retry_backoff_base_ms,
    };
    let client =
        AiClient::new(provider, Arc::new(budget), retry).with_max_tokens(config.ai_max_tokens);
    tracing::info!(
        provider = client.provider_name(),
        max_tokens = config.ai_max_tokens,
        request_ceiling = ?client.budget().request_ceiling(),
        "AI client ready"
    );
    Ok(client)
}

/// Cancels `cancel` on CTRL-C or once `run_timeout` elapses, whichever
/// comes first. The task ends quietly if the run finishes first.
fn spawn_cancel_triggers(cancel: CancellationToken, run_timeout: Option<Duration>) {
    tokio::spawn(async move {
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for CTRL-C");
                std::future::pending::<()>().await;
            }
        };
        let deadline = async {
            match run_timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            () = cancel.cancelled() => {}
            () = interrupt => {
                tracing::warn!("interrupt received, cancelling run");
                cancel.cancel();
            }
            () = deadline => {
                tracing::warn!(?run_timeout, "run timeout reached, cancelling run");
                cancel.cancel();
            }
        }
    });
}

/// Runs the pipeline once and writes the summary to stderr.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unusable output path, or a
/// fetch that produced no products.
pub(crate) async fn run_pipeline(args: &RunArgs, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let input = args.input.load()?;
    let settings = resolve_run_settings(&input, config)?;
    tracing::info!(?settings, "run settings resolved");

    let choice = choose_source(config, args.sample);
    if choice == SourceChoice::Sample && !args.sample {
        tracing::warn!("APIFY_TOKEN is not set, using the sample product catalog");
    }
    let source = build_source(config, choice)?;
    let sink: Arc<dyn ProductSink> = Arc::new(open_sink(args.output.as_deref()).await?);
    let ai = build_ai_client(&settings, config)?;

    let pipeline = Pipeline::new(
        source,
        sink,
        ai,
        PipelineSettings::from_run(&settings, config),
    );

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(cancel.clone(), config.run_timeout_secs.map(Duration::from_secs));

    let result = pipeline.run(cancel.clone()).await;
    // Stops the trigger task.
    cancel.cancel();
    let summary = result?;

    print_summary(&summary)?;
    Ok(exit_code(&summary))
}

async fn open_sink(path: Option<&Path>) -> anyhow::Result<JsonLinesSink> {
    match path {
        Some(path) => JsonLinesSink::create(path)
            .await
            .with_context(|| format!("failed to open output file {}", path.display())),
        None => Ok(JsonLinesSink::stdout()),
    }
}

fn print_summary(summary: &RunSummary) -> anyhow::Result<()> {
    let rendered =
        serde_json::to_string_pretty(summary).context("failed to serialize run summary")?;
    eprintln!("{rendered}");
    Ok(())
}

pub(crate) fn exit_code(summary: &RunSummary) -> ExitCode {
    if summary.cancelled {
        ExitCode::from(EXIT_CANCELLED)
    } else {
        ExitCode::SUCCESS
    }
}

/// Validates configuration the same way `run` would, then reports what the
/// run would use.
///
/// # Errors
///
/// Returns the first configuration problem found.
pub(crate) fn check_config(args: &InputArgs, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let input = args.load()?;
    let settings = resolve_run_settings(&input, config)?;
    let source = match choose_source(config, false) {
        SourceChoice::Apify => format!("apify ({})", config.apify_actor_id),
        SourceChoice::Sample => "sample catalog (APIFY_TOKEN not set)".to_owned(),
    };

    println!("configuration OK");
    println!("  category:         {}", settings.category);
    println!("  max products:     {}", settings.max_products);
    println!("  provider:         {}", settings.provider);
    if let Some(model) = &settings.model_override {
        println!("  model:            {model}");
    }
    println!("  min sales count:  {}", settings.min_sales_count);
    println!("  concurrency:      {}", settings.concurrency);
    println!("  review analysis:  {}", settings.include_review_analysis);
    println!("  product source:   {source}");
    println!(
        "  AI request cap:   {}",
        request_ceiling(settings.max_products, config.ai_max_retries)
    );
    Ok(ExitCode::SUCCESS)
}
