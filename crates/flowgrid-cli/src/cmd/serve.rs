use super::App;
use flowgrid_core::config::WarnLevel;

pub fn run(app: App, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = app.config;
    if let Some(port) = port {
        config.server.port = port;
    }
    for warning in config.validate() {
        match warning.level {
            WarnLevel::Error => tracing::error!("{}", warning.message),
            WarnLevel::Warning => tracing::warn!("{}", warning.message),
        }
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(flowgrid_server::serve(config))
}
