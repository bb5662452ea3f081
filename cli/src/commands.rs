use app::convert::{run_convert, ConvertParams};
use utils::app_config::AppConfig;

pub async fn convert_cmd(
    directory: String, num_threads: Option<usize>, dry_run: bool,
) -> utils::error::Result<()> {
    let config = AppConfig::fetch()?;

    // Command line flags win over the configured defaults
    let params = ConvertParams {
        directory,
        num_threads: num_threads.unwrap_or(config.convert.num_threads),
        dry_run: dry_run || config.convert.dry_run,
    };

    run_convert(params).await?;
    Ok(())
}
