use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;

use crate::config::{validate, Config};
use crate::contract::{
    CoreRequest, CoreResponse, GroupDto, ListTargetsResponse, OpenGroupResponse,
    RefreshIconsResponse,
};
use crate::favicon::HttpFaviconFetcher;
use crate::host::platform_registry;
use crate::icon_coordinator::{CoordinatorSettings, IconLoadCoordinator};
use crate::icon_key::IconRequest;
use crate::icon_resolver::IconResolver;
use crate::launcher::{launch_target, LaunchError, ShellOpener, UrlOpener};
use crate::logging;
use crate::model::{IconArtifact, IconOrigin, Target, TargetGroup};
use crate::target_store::{self, StoreError};

#[derive(Debug)]
pub enum ServiceError {
    Config(String),
    Store(StoreError),
    Launch(LaunchError),
    GroupNotFound(String),
    TargetNotFound(i64),
    Icon(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Store(error) => write!(f, "store error: {error}"),
            Self::Launch(error) => write!(f, "launch error: {error}"),
            Self::GroupNotFound(name) => write!(f, "group not found: {name}"),
            Self::TargetNotFound(id) => write!(f, "target not found: {id}"),
            Self::Icon(error) => write!(f, "icon error: {error}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<LaunchError> for ServiceError {
    fn from(value: LaunchError) -> Self {
        Self::Launch(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub fallbacks: usize,
}

/// Application facade: target catalog, group launching, and the icon
/// engine behind one set of commands.
pub struct CoreService {
    config: Config,
    db: Connection,
    icons: IconLoadCoordinator,
    opener: Box<dyn UrlOpener>,
}

impl CoreService {
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        let db = target_store::open_from_config(&config)?;
        let icons = production_coordinator(&config)?;
        Ok(Self {
            config,
            db,
            icons,
            opener: Box::new(ShellOpener),
        })
    }

    pub fn with_connection(config: Config, db: Connection) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        let icons = production_coordinator(&config)?;
        Ok(Self {
            config,
            db,
            icons,
            opener: Box::new(ShellOpener),
        })
    }

    /// Full injection seam for tests: caller supplies storage, the icon
    /// coordinator, and the opener.
    pub fn with_providers(
        config: Config,
        db: Connection,
        icons: IconLoadCoordinator,
        opener: Box<dyn UrlOpener>,
    ) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        Ok(Self {
            config,
            db,
            icons,
            opener,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn icons(&self) -> &IconLoadCoordinator {
        &self.icons
    }

    pub fn upsert_group(&self, group: &TargetGroup) -> Result<(), ServiceError> {
        target_store::upsert_group(&self.db, group)?;
        Ok(())
    }

    pub fn upsert_target(&self, target: &Target) -> Result<(), ServiceError> {
        target_store::upsert_target(&self.db, target)?;
        Ok(())
    }

    /// Every group with its targets, both in declared order.
    pub fn catalog(&self) -> Result<Vec<(TargetGroup, Vec<Target>)>, ServiceError> {
        let groups = target_store::list_groups(&self.db)?;
        let mut catalog = Vec::with_capacity(groups.len());
        for group in groups {
            let targets = target_store::targets_in_group(&self.db, group.id)?;
            catalog.push((group, targets));
        }
        Ok(catalog)
    }

    /// Opens every target in the named group with the query substituted.
    /// A target that fails to open is logged and skipped so one broken
    /// pattern cannot block the rest of the group. Returns opened URLs.
    pub fn open_group(&self, group_name: &str, query: &str) -> Result<Vec<String>, ServiceError> {
        let group = target_store::group_by_name(&self.db, group_name)?
            .ok_or_else(|| ServiceError::GroupNotFound(group_name.to_string()))?;
        let targets = target_store::targets_in_group(&self.db, group.id)?;

        let mut opened = Vec::new();
        for target in &targets {
            match launch_target(target, query, self.opener.as_ref()) {
                Ok(url) => opened.push(url),
                Err(error) => {
                    logging::warn(&format!("target {} failed to open: {error}", target.id));
                }
            }
        }
        Ok(opened)
    }

    /// Resolves one target's icon synchronously.
    pub fn icon_for_target(
        &self,
        target_id: i64,
        force_refresh: bool,
    ) -> Result<IconArtifact, ServiceError> {
        let target = target_store::get_target(&self.db, target_id)?
            .ok_or(ServiceError::TargetNotFound(target_id))?;
        let request = IconRequest::for_target(&target, force_refresh);
        self.icons
            .load_blocking(request)
            .ok_or_else(|| ServiceError::Icon("icon resolution did not complete".to_string()))
    }

    /// Walks every target through the icon engine, optionally bypassing
    /// caches, and reports how many ended in a fallback badge.
    pub fn refresh_icons(&self, force: bool) -> Result<RefreshReport, ServiceError> {
        let targets = target_store::list_targets(&self.db)?;
        let mut report = RefreshReport {
            refreshed: 0,
            fallbacks: 0,
        };
        for target in &targets {
            let request = IconRequest::for_target(target, force);
            match self.icons.load_blocking(request) {
                Some(artifact) => {
                    report.refreshed += 1;
                    if artifact.origin == IconOrigin::FallbackDefault {
                        report.fallbacks += 1;
                    }
                }
                None => logging::warn(&format!(
                    "icon refresh for target {} did not complete",
                    target.id
                )),
            }
        }
        Ok(report)
    }

    pub fn handle_command(&self, request: CoreRequest) -> Result<CoreResponse, ServiceError> {
        match request {
            CoreRequest::ListTargets(_) => {
                let groups = self
                    .catalog()?
                    .into_iter()
                    .map(|(group, targets)| GroupDto::from_group(group, targets))
                    .collect();
                Ok(CoreResponse::ListTargets(ListTargetsResponse { groups }))
            }
            CoreRequest::OpenGroup(open) => {
                let opened = self.open_group(&open.group, &open.query)?;
                Ok(CoreResponse::OpenGroup(OpenGroupResponse { opened }))
            }
            CoreRequest::RefreshIcons(refresh) => {
                let report = self.refresh_icons(refresh.force)?;
                Ok(CoreResponse::RefreshIcons(RefreshIconsResponse {
                    refreshed: report.refreshed,
                    fallbacks: report.fallbacks,
                }))
            }
        }
    }
}

fn production_coordinator(config: &Config) -> Result<IconLoadCoordinator, ServiceError> {
    let fetcher = HttpFaviconFetcher::new(Duration::from_secs(config.favicon_timeout_secs))
        .map_err(|error| ServiceError::Icon(error.to_string()))?;
    let resolver = Arc::new(IconResolver::new(platform_registry(), Arc::new(fetcher)));
    Ok(IconLoadCoordinator::new(
        resolver,
        CoordinatorSettings::from_config(config),
    ))
}
