use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::cli::output::{self, OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::auth::{self, CredentialArgs};
use crate::core::billing::{self, client::CostExplorerClient, CostSource};
use crate::core::config::AppConfig;
use crate::core::query::{split_list, CostQuery};
use crate::core::report::{consolidate, export};

/// Raw report flags as given on the command line.
#[derive(Default, Clone)]
pub struct ReportRequest {
    pub credentials: CredentialArgs,
    pub regions: Option<String>,
    pub timerange: Option<String>,
    pub json: bool,
    pub csv: bool,
    pub dimension: String,
    pub tag: String,
    pub interval: Option<String>,
    pub abbreviate: bool,
    pub color: bool,
}

pub async fn run(request: ReportRequest) -> Result<()> {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable config file");
            AppConfig::default()
        }
    };

    // Everything below up to the fetch is local validation.
    let opts = OutputOptions {
        format: output::resolve_format(request.json, request.csv, &config.settings.default_format)?,
        use_color: output::detect_color(request.color, &config.settings.color),
        abbreviate: request.abbreviate || config.settings.abbreviate,
    };

    let regions = match request.regions.as_deref() {
        Some(raw) => split_list(raw),
        None => config.settings.regions.clone(),
    };
    let granularity = request
        .interval
        .as_deref()
        .unwrap_or(&config.settings.granularity);
    let query = CostQuery::build(
        regions,
        request.timerange.as_deref(),
        &request.dimension,
        &request.tag,
        granularity,
    )?;

    let credentials = auth::resolve_credentials(&request.credentials)?;
    let client =
        CostExplorerClient::new(credentials, &config.api.endpoint, &config.api.signing_region)
            .context("Failed to set up Cost Explorer client")?;

    tracing::info!(host = client.host(), "using Cost Explorer endpoint");
    print!(
        "{}",
        fetch_and_render(&client, &query, &opts, &config.abbreviations).await?
    );

    Ok(())
}

/// Fetch every region of `query` from `source` and render it in the
/// selected format. The result always ends with a newline.
pub async fn fetch_and_render<S>(
    source: &S,
    query: &CostQuery,
    opts: &OutputOptions,
    abbreviations: &BTreeMap<String, String>,
) -> Result<String>
where
    S: CostSource + ?Sized + Sync,
{
    tracing::info!(
        regions = query.regions.len(),
        start = %query.start(),
        end = %query.end(),
        granularity = %query.granularity,
        "fetching cost and usage"
    );
    let costs = billing::get_costs(source, query).await?;
    tracing::info!(records = costs.len(), "fetched cost records");

    let rendered = match opts.format {
        OutputFormat::Json => format!("{}\n", export::render_json(&costs)?),
        OutputFormat::Csv => export::render_csv(&costs)?,
        OutputFormat::Text => {
            let groups = consolidate::consolidate_by_group(&costs)?;
            for group in &groups {
                tracing::debug!(
                    group = %group.group_label,
                    usage = %group.usage_quantity,
                    unit = %group.usage_unit,
                    "consolidated usage"
                );
            }
            let abbreviations = opts.abbreviate.then_some(abbreviations);
            let summary = renderer::render_summary(
                &groups,
                &query.start(),
                &query.end(),
                abbreviations,
                opts.use_color,
            );
            format!("{}\n", summary)
        }
    };
    Ok(rendered)
}
