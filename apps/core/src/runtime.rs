use std::path::PathBuf;

use crate::config::{self, ConfigError};
use crate::core_service::{CoreService, ServiceError};
use crate::logging;

#[derive(Debug)]
pub enum RuntimeError {
    Config(ConfigError),
    Service(ServiceError),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Service(error) => write!(f, "service error: {error}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigError> for RuntimeError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ServiceError> for RuntimeError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

const USAGE: &str =
    "usage: searchfan-core [--config <path>] (list | open <group> <query> | refresh-icons [--force])";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    ListTargets,
    OpenGroup { group: String, query: String },
    RefreshIcons { force: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub command: CliCommand,
    pub config_path: Option<PathBuf>,
}

pub fn parse_cli_args(args: &[String]) -> Result<CliOptions, String> {
    let mut rest = args;
    let mut config_path = None;

    if rest.first().map(String::as_str) == Some("--config") {
        let path = rest
            .get(1)
            .ok_or_else(|| format!("--config requires a path\n{USAGE}"))?;
        config_path = Some(PathBuf::from(path));
        rest = &rest[2..];
    }

    let command = match rest.first().map(String::as_str) {
        Some("list") => {
            if rest.len() > 1 {
                return Err(format!("list takes no arguments\n{USAGE}"));
            }
            CliCommand::ListTargets
        }
        Some("open") => {
            let group = rest
                .get(1)
                .ok_or_else(|| format!("open requires a group name\n{USAGE}"))?;
            if rest.len() < 3 {
                return Err(format!("open requires a query\n{USAGE}"));
            }
            CliCommand::OpenGroup {
                group: group.clone(),
                query: rest[2..].join(" "),
            }
        }
        Some("refresh-icons") => {
            let force = match rest.get(1).map(String::as_str) {
                None => false,
                Some("--force") if rest.len() == 2 => true,
                Some(other) => {
                    return Err(format!("unknown refresh-icons flag: {other}\n{USAGE}"));
                }
            };
            CliCommand::RefreshIcons { force }
        }
        Some(other) => return Err(format!("unknown command: {other}\n{USAGE}")),
        None => return Err(USAGE.to_string()),
    };

    Ok(CliOptions {
        command,
        config_path,
    })
}

pub fn run_with_options(options: CliOptions) -> Result<(), RuntimeError> {
    if let Err(error) = logging::init() {
        eprintln!("[searchfan-core] logging unavailable: {error}");
    }

    let config = config::load(options.config_path.as_deref())?;
    if !config.config_path.exists() {
        config::save(&config)?;
        println!(
            "[searchfan-core] wrote default config to {}",
            config.config_path.display()
        );
    }
    println!(
        "[searchfan-core] startup config_path={} targets_db_path={} icon_cache_dir={}",
        config.config_path.display(),
        config.targets_db_path.display(),
        config.icon_cache_dir.display(),
    );

    let service = CoreService::new(config)?;
    match options.command {
        CliCommand::ListTargets => run_list(&service),
        CliCommand::OpenGroup { group, query } => run_open(&service, &group, &query),
        CliCommand::RefreshIcons { force } => run_refresh(&service, force),
    }
}

fn run_list(service: &CoreService) -> Result<(), RuntimeError> {
    let catalog = service.catalog()?;
    if catalog.is_empty() {
        println!("[searchfan-core] no target groups configured");
        return Ok(());
    }

    for (group, targets) in catalog {
        println!(
            "[searchfan-core] group {} targets={}",
            group.name,
            targets.len()
        );
        for target in targets {
            println!(
                "  {:>4}  {:<24}  {}",
                target.id,
                target.display_label(),
                target.url_pattern
            );
        }
    }
    Ok(())
}

fn run_open(service: &CoreService, group: &str, query: &str) -> Result<(), RuntimeError> {
    let opened = service.open_group(group, query)?;
    if opened.is_empty() {
        println!("[searchfan-core] group '{group}' opened nothing");
        return Ok(());
    }
    for url in &opened {
        println!("[searchfan-core] opened {url}");
    }
    Ok(())
}

fn run_refresh(service: &CoreService, force: bool) -> Result<(), RuntimeError> {
    service.icons().set_failure_listener(|request| {
        println!(
            "[searchfan-core] icon fell back to badge for target {}",
            request.target_id
        );
    });

    let report = service.refresh_icons(force)?;
    println!(
        "[searchfan-core] refreshed {} icons, {} fallbacks, force={force}",
        report.refreshed, report.fallbacks
    );
    Ok(())
}
