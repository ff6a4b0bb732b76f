use tracetail::runtime::{boot, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let (engine, source, config) = boot::boot()?;
    run::run(engine, source, config).await
}
