use super::App;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use flowgrid_core::catalog::ActionDefinition;
use flowgrid_core::schema::resolve_columns;
use flowgrid_core::types::GridKind;
use flowgrid_core::FlowgridError;

#[derive(Subcommand)]
pub enum ActionsSubcommand {
    /// List catalog actions
    List {
        /// Only actions of this component
        #[arg(long)]
        component: Option<String>,
    },
    /// Show one action and the grid columns it produces
    Show { code: String },
}

pub fn run(app: &App, subcmd: ActionsSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ActionsSubcommand::List { component } => list(app, component.as_deref()),
        ActionsSubcommand::Show { code } => show(app, &code),
    }
}

fn list(app: &App, component: Option<&str>) -> anyhow::Result<()> {
    let rt = app.runtime()?;
    let catalog = app.catalog(&rt)?;
    let actions: Vec<&ActionDefinition> = catalog
        .iter()
        .filter(|a| component.map_or(true, |c| a.component_name == c))
        .collect();

    if app.json {
        return print_json(&actions);
    }
    if actions.is_empty() {
        println!("No actions.");
        return Ok(());
    }
    let rows = actions
        .iter()
        .map(|a| {
            vec![
                a.action_code.clone(),
                a.component_name.clone(),
                a.group_name.clone(),
                a.kind.to_string(),
                a.endpoint.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["CODE", "COMPONENT", "GROUP", "KIND", "ENDPOINT"], rows);
    Ok(())
}

fn show(app: &App, code: &str) -> anyhow::Result<()> {
    let rt = app.runtime()?;
    let catalog = app.catalog(&rt)?;
    let action = catalog
        .lookup(code)
        .ok_or_else(|| FlowgridError::UnknownAction(code.to_string()))?;

    if app.json {
        return print_json(action);
    }
    println!("Action:    {}", action.action_code);
    println!("Component: {}", action.component_name);
    println!("Group:     {}", action.group_name);
    println!("Kind:      {}", action.kind);
    if let Some(endpoint) = &action.endpoint {
        println!("Endpoint:  {endpoint}");
    }
    for &kind in GridKind::all() {
        let columns = resolve_columns(action, kind);
        if columns.is_empty() {
            continue;
        }
        println!();
        println!("{}:", kind.title());
        let rows = columns
            .iter()
            .map(|c| {
                vec![
                    c.key.clone(),
                    c.header.clone(),
                    if c.mandatory { "yes".into() } else { String::new() },
                ]
            })
            .collect();
        print_table(&["KEY", "HEADER", "REQUIRED"], rows);
    }
    Ok(())
}
