use anyhow::Result;
use dotenv::dotenv;
use tracing::info;

use tracker::config::{self, Settings};
use tracker::{api, db, telemetry, AppContext};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let settings = Settings::from_matches(&config::command().get_matches())?;

    telemetry::init_subscriber(&settings.log_filter)?;

    let pool = db::setup_pool(&settings.database_url).await?;
    db::setup_db(&pool).await?;

    let address = settings.address();
    info!(%address, database = %settings.database_url, "Starting tracker");
    warp::serve(api::routes(AppContext::new(pool))).run(address).await;

    Ok(())
}
