use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use ferenda_search_client::BuildTrigger;
use ferenda_search_client::ClientConfig;
use ferenda_search_client::HttpGateway;
use ferenda_search_client::Location;
use ferenda_search_client::NavEvent;
use ferenda_search_client::NavigationController;
use ferenda_search_client::Page;
use ferenda_search_client::SaveEvent;
use ferenda_search_client::TextTemplates;
use ferenda_search_client::save_hook::DEFAULT_BUILD_TRIGGER_URL;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tracing::info;

/// Terminal front end for a ferenda search service.
#[derive(Debug, Parser)]
#[command(name = "ferenda-search", version)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Overrides `base_url` from the configuration.
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Initial location hash, e.g. `#/-/publ?q=skatt`.
    #[arg(value_name = "LOCATION")]
    pub location: Option<String>,

    /// Print the page once the initial load has settled and exit.
    #[arg(long)]
    pub once: bool,

    /// Keys offered as sort links under the result range (repeatable).
    #[arg(long = "sort", value_name = "TERM")]
    pub sort_terms: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ask the site build service to regenerate one wiki page.
    TriggerBuild(TriggerBuildArgs),
}

#[derive(Debug, clap::Args)]
pub struct TriggerBuildArgs {
    /// Title of the saved page.
    #[arg(long)]
    pub title: String,

    /// Treat the save as a minor edit (no build is requested).
    #[arg(long)]
    pub minor: bool,

    /// Build endpoint; the title is appended to it.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
}

/// One line typed at the prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Go(String),
    Search(Vec<(String, String)>),
    Click(String),
    Facets,
    Show,
    Help,
    Quit,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let command = match verb {
            "go" => Self::Go(required(verb, rest)?.to_string()),
            "click" => Self::Click(required(verb, rest)?.to_string()),
            "search" => Self::Search(search_fields(required(verb, rest)?)),
            "facets" => Self::Facets,
            "show" => Self::Show,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => anyhow::bail!("unknown command `{other}`; try `help`"),
        };
        Ok(Some(command))
    }
}

const HELP: &str = "\
commands:
  go <hash>                 replace the location hash
  search <text>             submit the search form with q=<text>
  search k=v [k=v ...]      submit the search form with the given fields
  click <href>              follow a link, e.g. `click #/-/publ?q=x&_sort=issued`
  facets                    list facet controls and their options
  show                      print the current page
  quit";

fn required<'a>(verb: &str, rest: &'a str) -> Result<&'a str> {
    if rest.is_empty() {
        anyhow::bail!("`{verb}` needs an argument");
    }
    Ok(rest)
}

/// `k=v` pairs when every word has one, otherwise the whole text as `q`.
fn search_fields(rest: &str) -> Vec<(String, String)> {
    let pairs: Option<Vec<(String, String)>> = rest
        .split_whitespace()
        .map(|word| {
            word.split_once('=')
                .map(|(name, value)| (name.to_string(), value.to_string()))
        })
        .collect();
    pairs.unwrap_or_else(|| vec![("q".to_string(), rest.to_string())])
}

pub fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    config.validate().context("validating configuration")?;
    Ok(config)
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    match &cli.command {
        Some(Command::TriggerBuild(args)) => trigger_build(&config, args).await,
        None => browse(&cli, &config).await,
    }
}

async fn trigger_build(config: &ClientConfig, args: &TriggerBuildArgs) -> Result<()> {
    let endpoint = args
        .endpoint
        .clone()
        .or_else(|| config.build_trigger_url.clone())
        .unwrap_or_else(|| DEFAULT_BUILD_TRIGGER_URL.to_string());
    let trigger = BuildTrigger::new(endpoint);
    let mut event = SaveEvent::new(args.title.clone());
    if args.minor {
        event = event.minor();
    }
    let delivered = trigger.on_save(&event).await;
    info!(title = %args.title, delivered, "save hook finished");
    let outcome = if delivered {
        "build requested"
    } else {
        "build not requested"
    };
    println!("{outcome}");
    Ok(())
}

async fn browse(cli: &Cli, config: &ClientConfig) -> Result<()> {
    let gateway = HttpGateway::new(config.base_url.clone(), config.request_timeout())
        .context("building HTTP client")?;
    let templates = TextTemplates::with_sort_terms(cli.sort_terms.iter().cloned());
    let location = Location::new(cli.location.as_deref().unwrap_or_default());
    let mut controller = NavigationController::bootstrap(
        config,
        Arc::new(gateway),
        Arc::new(templates),
        location,
    )
    .await;
    controller.settle().await;
    println!("{}", render_page(controller.page()));
    if cli.once {
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let command = match ReplCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        let event = match command {
            ReplCommand::Go(hash) => NavEvent::HashChanged(hash),
            ReplCommand::Click(href) => NavEvent::LinkClicked(href),
            ReplCommand::Search(fields) => {
                let mut form = controller.form().clone();
                for (name, value) in fields {
                    form.set(&name, value);
                }
                NavEvent::Submit(form)
            }
            ReplCommand::Facets => {
                println!("{}", render_facets(controller.page()));
                continue;
            }
            ReplCommand::Show => {
                println!("{}", render_page(controller.page()));
                continue;
            }
            ReplCommand::Help => {
                println!("{HELP}");
                continue;
            }
            ReplCommand::Quit => break,
        };
        controller.dispatch(event);
        controller.settle().await;
        println!("{}", render_page(controller.page()));
    }
    Ok(())
}

pub fn render_page(page: &Page) -> String {
    let mut out = String::new();
    if let Some(error) = page.error.content() {
        out.push_str(error);
    }
    if let Some(results) = page.results.content() {
        if page.results.is_folded() {
            let summary = results.lines().next().unwrap_or_default();
            let _ = writeln!(out, "[results folded: {summary}]");
        } else {
            out.push_str(results);
        }
    }
    if let Some(document) = page.document.content() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(document);
    }
    if out.is_empty() {
        out.push_str("(nothing to show)");
    }
    out.trim_end().to_string()
}

pub fn render_facets(page: &Page) -> String {
    let mut out = String::new();
    for control in page.facets.controls() {
        let _ = writeln!(out, "{} [{}]", control.label, control.name);
        for option in &control.options {
            let _ = writeln!(out, "  {} = {}", option.label, option.value);
        }
    }
    if out.is_empty() {
        out.push_str("(no facets)");
    }
    out.trim_end().to_string()
}
