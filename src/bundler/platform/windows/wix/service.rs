//! Launchers registered as Windows services.
//!
//! Services are hosted by a separate installer tool copied next to the
//! launchers. The tool's file component carries one `ServiceInstall` per
//! service launcher, and each service gets its own `ServiceConfig` component
//! with the restart-on-failure policy.

use super::id::{custom_id, Id};
use super::path::WixPath;
use crate::bundler::error::Result;
use crate::bundler::settings::LauncherSettings;
use serde::Serialize;

/// A launcher running as a service.
#[derive(Clone, Debug)]
pub struct LauncherService {
    name: String,
    description: String,
    launcher_path: WixPath,
}

impl LauncherService {
    /// Service for `launcher`, installed in `launchers_dir`.
    pub fn new(launcher: &LauncherSettings, launchers_dir: &WixPath) -> Self {
        Self {
            name: launcher.name.clone(),
            description: launcher
                .description
                .clone()
                .unwrap_or_else(|| launcher.name.clone()),
            launcher_path: launchers_dir.join(&launcher.name).with_suffix(".exe"),
        }
    }

    /// Installed path of the launcher.
    pub fn launcher_path(&self) -> &WixPath {
        &self.launcher_path
    }

    /// `<ServiceInstall>` with its `<ServiceControl>`.
    pub fn service_install(&self) -> Result<ServiceInstall> {
        let id = custom_id(&self.launcher_path, "svc")?;
        Ok(ServiceInstall {
            control_id: custom_id(&self.launcher_path, "svcctrl")?,
            name: self.name.clone(),
            display_name: self.name.clone(),
            description: self.description.clone(),
            arguments: format!("run \"[#{}]\"", Id::File.of(&self.launcher_path)?),
            id,
        })
    }

    /// `<util:ServiceConfig>` payload.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            service_name: self.name.clone(),
            first_failure: "restart",
            second_failure: "restart",
            third_failure: "none",
            restart_delay_seconds: 60,
            reset_period_days: 1,
        }
    }
}

/// `<ServiceInstall>` nested in the service installer's file component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceInstall {
    /// Element id.
    pub id: String,
    /// `<ServiceControl>` id.
    pub control_id: String,
    /// Service name.
    pub name: String,
    /// Name shown in the services console.
    pub display_name: String,
    /// Service description.
    pub description: String,
    /// Arguments passed to the service installer tool.
    pub arguments: String,
}

/// Failure actions of a service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceConfig {
    /// Service name.
    pub service_name: String,
    /// Action on the first failure.
    pub first_failure: &'static str,
    /// Action on the second failure.
    pub second_failure: &'static str,
    /// Action on later failures.
    pub third_failure: &'static str,
    /// Delay before restarting.
    pub restart_delay_seconds: u32,
    /// Period after which the failure count resets.
    pub reset_period_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> LauncherService {
        let mut launcher = LauncherSettings::new("Daemon");
        launcher.service = true;
        LauncherService::new(&launcher, &WixPath::installdir())
    }

    #[test]
    fn test_launcher_path() {
        assert_eq!(
            service().launcher_path().to_string(),
            r"INSTALLDIR\Daemon.exe"
        );
    }

    #[test]
    fn test_service_install_targets_launcher_file() {
        let svc = service();
        let install = svc.service_install().unwrap();
        let file_id = Id::File.of(svc.launcher_path()).unwrap();
        assert_eq!(install.arguments, format!("run \"[#{file_id}]\""));
        assert_eq!(install.description, "Daemon");
        assert_ne!(install.id, install.control_id);
    }

    #[test]
    fn test_service_config_restarts() {
        let config = service().service_config();
        assert_eq!(config.first_failure, "restart");
        assert_eq!(config.third_failure, "none");
    }
}
