use anyhow::{Context, Result};
use cafe_app::CafeApp;
use cafe_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    cafe_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    let mut app = CafeApp::new(config).context("Failed to start CafeSmart")?;

    // Optional city argument, saved like a settings change
    if let Some(city) = std::env::args().nth(1) {
        let stored = app.settings().set_city(&city)?;
        tracing::info!("City set from command line: {:?}", stored);
    }

    app.start().await?;
    tracing::info!("CafeSmart started");

    let view = app.refresh().await.render();

    println!("CafeSmart - drinks for the weather");
    println!();
    print!("{}", view);

    app.shutdown();
    Ok(())
}
