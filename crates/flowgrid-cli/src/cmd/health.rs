use super::App;
use crate::output::print_json;
use anyhow::Context;
use flowgrid_core::client::ScenarioBackend;

pub fn run(app: &App) -> anyhow::Result<()> {
    let rt = app.runtime()?;
    let backend = app.backend();
    let status = rt
        .block_on(backend.health())
        .with_context(|| format!("backend at {} is unreachable", app.server))?;

    if app.json {
        print_json(&status)?;
    } else {
        println!("{}: {}", app.server, status.status);
    }
    if !status.is_up() {
        anyhow::bail!("backend reports status '{}'", status.status);
    }
    Ok(())
}
