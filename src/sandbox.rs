//! Process Confinement
//!
//! Installs a Landlock policy limiting the exporter to what it needs:
//!
//! - **Filesystem**: read-only access beneath the work directory handle that
//!   [`StatusDir`] captured at startup. Every other filesystem access is
//!   denied.
//! - **Network**: TCP bind on the configured port only. Outgoing TCP
//!   connections are denied.
//! - **IPC scoping**: abstract unix sockets and signals are scoped to the
//!   process where the kernel supports it (best effort).
//!
//! Landlock rules follow the directory the handle refers to, not its path.
//! If the work directory is removed and created again, the new directory is
//! outside the policy even though its path is identical, and scrapes come
//! back empty until the exporter is restarted.
//!
//! The policy applies to the calling thread and the threads it spawns
//! afterwards, so it must be installed before the async runtime starts its
//! workers. It cannot be lifted for the rest of the process lifetime.

use crate::bees::StatusDir;
use crate::error::{ExporterError, Result};
use landlock::{
    Access, AccessFs, AccessNet, CompatLevel, Compatible, NetPort, PathBeneath,
    RestrictionStatus, Ruleset, RulesetAttr, RulesetCreatedAttr, RulesetError, RulesetStatus,
    Scope, ABI,
};
use tracing::{info, warn};

/// Landlock ABI providing filesystem and TCP port rules.
const POLICY_ABI: ABI = ABI::V4;

/// Landlock ABI providing IPC scoping.
const SCOPE_ABI: ABI = ABI::V6;

/// Restricts the current thread, and every thread it spawns later, to the
/// work directory and the listening port.
///
/// # Errors
///
/// Returns [`ExporterError::ConfinementInstallFailed`] when the kernel cannot
/// fully enforce the filesystem and network rules. Callers must not serve
/// metrics in that case.
pub fn install(dir: &StatusDir, port: u16) -> Result<()> {
    let status = restrict_access(dir, port)
        .map_err(|e| ExporterError::ConfinementInstallFailed(e.to_string()))?;

    match status.ruleset {
        RulesetStatus::FullyEnforced => {
            info!(
                "Landlock policy enforced: read-only {:?}, bind on port {}",
                dir.path(),
                port
            );
        }
        other => {
            return Err(ExporterError::ConfinementInstallFailed(format!(
                "access policy is {other:?} on this kernel"
            )));
        }
    }

    match restrict_scope() {
        Ok(status) if status.ruleset == RulesetStatus::FullyEnforced => {
            info!("Landlock IPC scoping enforced");
        }
        Ok(status) => {
            warn!(
                "Landlock IPC scoping {:?}, this can be due to an old kernel",
                status.ruleset
            );
        }
        Err(e) => {
            warn!("Landlock IPC scoping could not be created: {}", e);
        }
    }

    Ok(())
}

fn restrict_access(
    dir: &StatusDir,
    port: u16,
) -> std::result::Result<RestrictionStatus, RulesetError> {
    Ruleset::default()
        .set_compatibility(CompatLevel::HardRequirement)
        .handle_access(AccessFs::from_all(POLICY_ABI))?
        .handle_access(AccessNet::from_all(POLICY_ABI))?
        .create()?
        .add_rule(PathBeneath::new(
            dir.handle(),
            AccessFs::from_read(POLICY_ABI),
        ))?
        .add_rule(NetPort::new(port, AccessNet::BindTcp))?
        .restrict_self()
}

fn restrict_scope() -> std::result::Result<RestrictionStatus, RulesetError> {
    Ruleset::default()
        .set_compatibility(CompatLevel::BestEffort)
        .scope(Scope::from_all(SCOPE_ABI))?
        .create()?
        .restrict_self()
}
