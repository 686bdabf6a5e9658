use anyhow::Context;
use edition_ledger::datasource::RestCommerceSource;
use edition_ledger::engine::Severity;
use edition_ledger::orchestration::Auditor;
use edition_ledger::{init_db, Config, ProductId, Repository};
use std::sync::Arc;
use std::time::Duration;

/// Periodic reconciliation sweep: re-derives every line item's status from
/// fresh commerce-backend data and logs drift. Never mutates the ledger —
/// critical discrepancies need operator confirmation before repair.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;

    let pool = init_db(&config.database_path)
        .await
        .context("initializing ledger database")?;
    let repo = Arc::new(Repository::new(pool));

    let source = Arc::new(RestCommerceSource::new(
        config.commerce_api_url.clone(),
        config.commerce_api_token.clone(),
    ));
    let auditor = Auditor::new(source, repo.clone());

    let interval = Duration::from_millis(config.sweep_interval_ms);
    tracing::info!(
        interval_ms = config.sweep_interval_ms,
        "reconciliation sweep started"
    );

    loop {
        let products: Vec<ProductId> = if config.sweep_products.is_empty() {
            repo.product_ids()
                .await
                .context("listing ledger products")?
        } else {
            config.sweep_products.iter().map(ProductId::new).collect()
        };

        for product_id in &products {
            match auditor.audit_product(product_id).await {
                Ok(reports) => {
                    for report in reports {
                        match report.severity {
                            Severity::Critical => tracing::error!(
                                product_id = %product_id,
                                line_item_id = %report.line_item_id,
                                kind = ?report.kind,
                                expected = %report.expected,
                                actual = %report.actual,
                                "critical ledger drift"
                            ),
                            Severity::Warning => tracing::warn!(
                                product_id = %product_id,
                                line_item_id = %report.line_item_id,
                                kind = ?report.kind,
                                expected = %report.expected,
                                actual = %report.actual,
                                "ledger numbering drift"
                            ),
                            Severity::Info => tracing::info!(
                                product_id = %product_id,
                                line_item_id = %report.line_item_id,
                                kind = ?report.kind,
                                "ledger audit note"
                            ),
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(product_id = %product_id, error = %e, "audit failed");
                }
            }
        }

        tokio::time::sleep(interval).await;
    }
}
