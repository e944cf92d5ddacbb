#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

mod cli;

use anyhow::{Context, bail};
use clap::Parser;
use cli::{Cli, Command, InventoryCommand, ListArgs, ReportCommand, ThemeCommand};
use invento_client::domain::auth::LoginOutcome;
use invento_client::domain::report::ReportFilter;
use invento_client::views::reports::render_summary;
use invento_client::views::{InventoryController, InventoryFilter, Page, SortDirection};
use invento_client::workers::Visibility;
use invento_client::{App, AppBuilder, telemetry};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let telemetry_guard = telemetry::init_telemetry(&cli.config.telemetry)?;

    invento_client::setup_panic_hook();

    let app = AppBuilder::new(cli.config).build().context("Failed to initialise client")?;
    let mut out = std::io::stdout();

    let result = run(&app, cli.command, &mut out).instrument(tracing::info_span!("command")).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    telemetry_guard.shutdown();

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run(app: &App, command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => match app.session.login(&email, &password).await {
            LoginOutcome::Success { user } => {
                writeln!(out, "Logged in as {} ({})", user.display_name(), user.effective_role())?;
            }
            LoginOutcome::Failure { message } => bail!(message),
        },
        Command::Logout => {
            app.session.logout().await;
            writeln!(out, "Logged out")?;
        }
        Command::Theme(ThemeCommand::Show) => writeln!(out, "{}", app.themes.theme())?,
        Command::Theme(ThemeCommand::Toggle) => writeln!(out, "{}", app.themes.toggle()?)?,
        Command::Layout { page } => {
            require_auth(app)?;
            app.layout(page).render(out)?;
        }
        Command::Whoami { refresh } => {
            require_auth(app)?;
            let user = if refresh { Some(app.session.fetch_profile().await?) } else { app.session.current_user() };
            if let Some(user) = user {
                writeln!(out, "{}", user.display_name())?;
                if let Some(email) = &user.email {
                    writeln!(out, "{email}")?;
                }
                writeln!(out, "role: {}", user.effective_role())?;
            }
        }
        Command::Dashboard { watch } => {
            require_auth(app)?;
            app.layout(Page::Dashboard).render(out)?;
            writeln!(out)?;
            if watch {
                watch_dashboard(app, out).await?;
            } else {
                app.dashboard().load().await?.render(out)?;
            }
        }
        Command::Inventory(command) => {
            require_auth(app)?;
            run_inventory(app, command, out).await?;
        }
        Command::Report(command) => {
            require_auth(app)?;
            let reports = app.reports();
            match command {
                ReportCommand::Summary(filter) => {
                    let summary = reports.summary(&ReportFilter::from(filter)).await?;
                    render_summary(&summary, out)?;
                }
                ReportCommand::Download { format, output, filter } => {
                    let dest = output.unwrap_or_else(|| PathBuf::from(format!("inventory_report.{format}")));
                    let bytes = reports.download(format, &ReportFilter::from(filter), &dest).await?;
                    writeln!(out, "Saved {bytes} bytes to {}", dest.display())?;
                }
            }
        }
    }
    Ok(())
}

fn require_auth(app: &App) -> anyhow::Result<()> {
    if !app.session.require_auth() {
        bail!("Not logged in. Run `invento login` first.");
    }
    Ok(())
}

async fn run_inventory(app: &App, command: InventoryCommand, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut inventory = app.inventory();
    match command {
        InventoryCommand::List(args) => {
            inventory.load().await?;
            apply_list_args(&mut inventory, args);
            let can_edit = inventory.can_edit();
            inventory.view().render(out, can_edit)?;
        }
        InventoryCommand::Add(item) => {
            let created = inventory.create_item(item.into()).await?;
            writeln!(out, "Created item {} ({})", created.id, created.sku)?;
        }
        InventoryCommand::Update { id, item } => {
            let updated = inventory.update_item(id, item.into()).await?;
            writeln!(out, "Updated item {} ({})", updated.id, updated.sku)?;
        }
        InventoryCommand::Delete { id } => {
            inventory.load().await?;
            if inventory.delete_item(id).await? {
                writeln!(out, "Deleted item {id}")?;
            } else {
                writeln!(out, "Cancelled")?;
            }
        }
    }
    Ok(())
}

fn apply_list_args(inventory: &mut InventoryController, args: ListArgs) {
    let view = inventory.view_mut();
    view.set_filter(InventoryFilter { search: args.search, category: args.category, status: args.status });
    if let Some(column) = args.sort {
        let direction = if args.desc { SortDirection::Desc } else { SortDirection::Asc };
        view.set_sort(column, direction);
    }
    if let Some(size) = args.page_size {
        view.set_page_size(size);
    }
    view.go_to_page(args.page);
}

async fn watch_dashboard(app: &App, out: &mut dyn Write) -> anyhow::Result<()> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    invento_client::spawn_signal_handler(shutdown_tx.clone());

    let worker = app.dashboard_worker(Visibility::default());
    let mut views = worker.subscribe();
    let mut handle = tokio::spawn(worker.run(shutdown_rx.clone()));
    let mut finished = false;

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = views.borrow_and_update().clone();
                if let Some(view) = latest {
                    view.render(out)?;
                    writeln!(out)?;
                }
            }
            _ = &mut handle => {
                finished = true;
                break;
            }
            _ = shutdown_rx.wait_for(|&s| s) => break,
        }
    }

    let _ = shutdown_tx.send(true);
    if !finished {
        let _ = handle.await;
    }
    Ok(())
}
