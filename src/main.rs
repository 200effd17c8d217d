//! Console front end for the cities listing.
//!
//! Every stdin line is treated as filter text unless it is one of the
//! commands `:page N`, `:sort COLUMN asc|desc`, `:reload` or `:quit`.

use std::env;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use cities_admin::domain::city::City;
use cities_admin::gate::GateError;
use cities_admin::gate::list::{FetchStatus, ListHandle, ListView};
use cities_admin::models::config::AdminConfig;
use cities_admin::pagination::SortOrder;
use cities_admin::repository::{HttpRepository, PageSource};

#[derive(Debug, PartialEq, Eq)]
enum ConsoleCommand {
    Filter(String),
    Page(i64),
    Sort(String, SortOrder),
    Reload,
    Quit,
}

fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let Some(command) = line.trim().strip_prefix(':') else {
        return Ok(ConsoleCommand::Filter(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("page"), Some(page), None) => page
            .parse::<i64>()
            .map(|page| ConsoleCommand::Page(page - 1))
            .map_err(|_| format!("not a page number: {page}")),
        (Some("sort"), Some(column), order) => {
            let order = match order {
                Some(order) => SortOrder::try_from(order.to_string())?,
                None => SortOrder::Asc,
            };
            Ok(ConsoleCommand::Sort(column.to_string(), order))
        }
        (Some("reload"), None, None) => Ok(ConsoleCommand::Reload),
        (Some("quit" | "q"), None, None) => Ok(ConsoleCommand::Quit),
        _ => Err(format!("unknown command :{command}")),
    }
}

fn render(view: &ListView<City>) {
    if view.hidden {
        println!("(no cities)");
        return;
    }
    for city in &view.rows {
        println!(
            "{:>6}  {:<32} {:>9.4} {:>10.4}  {}",
            city.id,
            city.name,
            city.lat,
            city.lon,
            city.country_name.as_deref().unwrap_or("-")
        );
    }
    let links: Vec<String> = view
        .page_links()
        .into_iter()
        .map(|link| match link {
            Some(page) if page == view.paginator.page_index as usize + 1 => format!("[{page}]"),
            Some(page) => page.to_string(),
            None => "...".to_string(),
        })
        .collect();
    println!(
        "{} cities, page {}/{}: {}",
        view.total_count,
        view.paginator.page_index + 1,
        view.paginator.total_pages,
        links.join(" ")
    );
}

async fn print_views(mut views: watch::Receiver<ListView<City>>) {
    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        render(&view);
    }
}

async fn print_failures(mut status: watch::Receiver<FetchStatus>) {
    while status.changed().await.is_ok() {
        if let FetchStatus::Failed(err) = &*status.borrow_and_update() {
            eprintln!("failed to load cities: {err}");
        }
    }
}

fn dispatch(list: &ListHandle<City>, command: ConsoleCommand) -> Result<(), GateError> {
    match command {
        ConsoleCommand::Filter(text) => list.filter_text_changed(text),
        ConsoleCommand::Page(page) => {
            let page_size = i64::from(list.query().page_size);
            list.page_changed(page, page_size)
        }
        ConsoleCommand::Sort(column, order) => list.sort_changed(column, order),
        ConsoleCommand::Reload => list.reload(),
        ConsoleCommand::Quit => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());
    let config = match AdminConfig::load(&app_env) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    let repo = match HttpRepository::new(&config.base_url, config.request_timeout()) {
        Ok(repo) => repo,
        Err(err) => {
            log::error!("Failed to build HTTP client: {err}");
            std::process::exit(1);
        }
    };
    let source: Arc<dyn PageSource<City>> = Arc::new(repo);

    let list = match ListHandle::spawn(source, config.list_settings(), None) {
        Ok(list) => list,
        Err(err) => {
            log::error!("Invalid listing settings: {err}");
            std::process::exit(1);
        }
    };
    log::info!("Listing cities from {}", config.base_url);

    tokio::spawn(print_views(list.view()));
    tokio::spawn(print_failures(list.status()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                log::error!("Failed to read stdin: {err}");
                break;
            }
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        if command == ConsoleCommand::Quit {
            break;
        }
        if let Err(err) = dispatch(&list, command) {
            eprintln!("{err}");
        }
    }

    list.close();
}
