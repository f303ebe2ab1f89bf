use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    domain::{AppConfig, ImageProfiles},
    error::{Operation, SessionError},
    options::{SessionOptions, SettingsProfile},
    persistence::{ConfigResponse, ConfigStore, ImageProfilesResponse},
    tabs::TabId,
};

use super::{
    Collaborators,
    collection::EditContext,
    dirty::{DirtyTracker, RestartFlag},
    state::SessionPhase,
};

/// Target value the backup picker uses for "nothing selected".
const NO_BACKUP_TARGET: &str = "-";

/// What a completed settings save did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigSaveOutcome {
    /// The store confirmed the configuration save; the dirty flag was cleared.
    pub confirmed: bool,
    /// The image profiles could not be written. The user has been notified.
    pub image_profiles_failed: bool,
    /// A restart was recommended because the restart flag is raised.
    pub restart_recommended: bool,
    /// The operator accepted the restart prompt. Acting on it is up to the caller.
    pub restart_requested: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupOutcome {
    Declined,
    Succeeded,
    /// The store answered without confirming the backup.
    Refused,
}

/// Session of the settings tab: the application configuration plus the independently
/// stored image profiles.
pub struct ConfigSession {
    config: Option<AppConfig>,
    image_profiles: Option<ImageProfiles>,
    tab: TabId,
    phase: SessionPhase,
    loaded: bool,
    dirty: DirtyTracker,
    restart: RestartFlag,
    loading: bool,
    backup_loading: bool,
    backup_log: Vec<String>,
    profile: SettingsProfile,
    options: SessionOptions,
    store: Arc<dyn ConfigStore>,
    collaborators: Collaborators,
}

impl ConfigSession {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        collaborators: Collaborators,
        options: SessionOptions,
    ) -> Self {
        let profile = options.settings.clone();
        Self {
            config: None,
            image_profiles: None,
            tab: profile.tab_id(),
            phase: SessionPhase::Loading,
            loaded: false,
            dirty: DirtyTracker::new(),
            restart: RestartFlag::default(),
            loading: false,
            backup_loading: false,
            backup_log: Vec::new(),
            profile,
            options,
            store,
            collaborators,
        }
    }

    /// Fetch the configuration and the image profiles concurrently. Each failure is
    /// reported with its own message; the first one is returned. The loading indicator
    /// clears as soon as the configuration request settles.
    pub async fn load(&mut self) -> Result<(), SessionError> {
        self.phase.ensure_loadable(!self.loaded)?;
        self.loaded = true;
        self.phase = SessionPhase::Loading;
        self.set_loading(true);
        tracing::debug!(tab = %self.tab, "loading settings");

        let profiles_store = Arc::clone(&self.store);
        let fetch_profiles = async move { profiles_store.fetch_image_profiles().await };
        let (config_failure, profiles) = tokio::join!(
            async {
                let config = self.store.fetch_config().await;
                let failure = self.apply_config(config);
                self.set_loading(false);
                failure
            },
            fetch_profiles
        );
        let profiles_failure = self.apply_image_profiles(profiles);

        self.phase = SessionPhase::Ready;
        config_failure.or(profiles_failure).map_or(Ok(()), Err)
    }

    fn apply_config(&mut self, response: anyhow::Result<ConfigResponse>) -> Option<SessionError> {
        match response.map(|response| response.cfg) {
            Ok(raw) => match decode_or_default::<AppConfig>(raw) {
                Ok(config) => {
                    self.config = Some(config);
                    self.dirty
                        .set(false, self.collaborators.tabs.as_ref(), &self.tab);
                    None
                }
                Err(err) => {
                    tracing::warn!(error = %err, "stored configuration could not be decoded");
                    self.notify(&self.profile.notices.load_failed);
                    Some(SessionError::Decode(err))
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "configuration load failed");
                self.notify(&self.profile.notices.load_failed);
                Some(SessionError::transport(Operation::Load, &err))
            }
        }
    }

    fn apply_image_profiles(
        &mut self,
        response: anyhow::Result<ImageProfilesResponse>,
    ) -> Option<SessionError> {
        match response.map(|response| response.imgprofiles) {
            Ok(raw) => match decode_or_default::<ImageProfiles>(raw) {
                Ok(profiles) => {
                    self.image_profiles = Some(profiles);
                    None
                }
                Err(err) => {
                    tracing::warn!(error = %err, "stored image profiles could not be decoded");
                    self.notify(&self.profile.notices.image_profiles_load_failed);
                    Some(SessionError::Decode(err))
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "image profile load failed");
                self.notify(&self.profile.notices.image_profiles_load_failed);
                Some(SessionError::transport(Operation::LoadImageProfiles, &err))
            }
        }
    }

    /// Save the configuration and the image profiles concurrently. Image profiles that
    /// never loaded are not written back.
    pub async fn save(&mut self) -> Result<ConfigSaveOutcome, SessionError> {
        self.phase.ensure_ready()?;
        let Some(config) = self.config.as_ref() else {
            return Err(SessionError::Unbound);
        };
        let config_payload = serde_json::to_value(config).map_err(SessionError::Encode)?;
        let profiles_payload = self
            .image_profiles
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(SessionError::Encode)?;

        self.phase = SessionPhase::Saving;
        self.set_loading(true);
        tracing::debug!(tab = %self.tab, "saving settings");

        let profiles_store = Arc::clone(&self.store);
        let save_profiles = async move {
            match profiles_payload {
                Some(payload) => Some(profiles_store.save_image_profiles(payload).await),
                None => None,
            }
        };
        let (config_result, profiles_result) =
            tokio::join!(self.store.save_config(config_payload), save_profiles);

        let mut outcome = ConfigSaveOutcome::default();
        if let Some(Err(err)) = &profiles_result {
            tracing::warn!(error = %err, "image profile save failed");
            self.notify(&self.profile.notices.image_profiles_save_failed);
            outcome.image_profiles_failed = true;
        }

        let response = match config_result {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "configuration save failed");
                self.notify(&self.profile.notices.save_failed);
                self.settle();
                return Err(SessionError::transport(Operation::Save, &err));
            }
        };
        self.settle();

        if response.success {
            outcome.confirmed = true;
            self.notify(&self.profile.notices.saved);
            self.dirty
                .set(false, self.collaborators.tabs.as_ref(), &self.tab);
            tracing::info!(restart = self.restart.is_raised(), "configuration saved");
            if self.restart.is_raised() {
                outcome.restart_recommended = true;
                outcome.restart_requested = self
                    .collaborators
                    .confirm
                    .confirm(&self.profile.restart_prompt);
            }
        }
        Ok(outcome)
    }

    /// Raise the restart flag, e.g. after a setting that only applies on startup changed.
    pub fn set_restart_required(&mut self) {
        self.restart.raise();
        self.dirty
            .set(true, self.collaborators.tabs.as_ref(), &self.tab);
    }

    /// Ask for confirmation, then back up the store into `target`. The previous log is
    /// cleared once confirmed.
    pub async fn create_backup(
        &mut self,
        target: Option<&str>,
    ) -> Result<BackupOutcome, SessionError> {
        if self.phase.is_closed() {
            return Err(SessionError::Closed);
        }
        if self.backup_loading {
            return Err(SessionError::OperationInProgress(Operation::Backup));
        }
        if !self
            .collaborators
            .confirm
            .confirm(&self.profile.backup_prompt)
        {
            return Ok(BackupOutcome::Declined);
        }
        self.backup_log.clear();
        let Some(target) = target
            .map(str::trim)
            .filter(|target| !target.is_empty() && *target != NO_BACKUP_TARGET)
        else {
            return Err(SessionError::validation(
                self.profile.backup_target_required.clone(),
            ));
        };

        self.backup_loading = true;
        tracing::debug!(backup = target, "creating backup");
        let result = self.store.create_backup(target).await;
        self.backup_loading = false;

        match result {
            Ok(response) => {
                if let Some(log) = response.log {
                    self.backup_log = log;
                }
                if response.success {
                    self.notify(&self.profile.notices.backup_saved);
                    tracing::info!(
                        backup = target,
                        lines = self.backup_log.len(),
                        "backup finished"
                    );
                    Ok(BackupOutcome::Succeeded)
                } else {
                    Ok(BackupOutcome::Refused)
                }
            }
            Err(err) => {
                tracing::warn!(backup = target, error = %err, "backup failed");
                self.backup_log.push(format!("{err:#}"));
                self.notify(&self.profile.notices.backup_failed);
                Err(SessionError::transport(Operation::Backup, &err))
            }
        }
    }

    /// Recover after a load, save or backup future was dropped before it finished.
    pub fn abandon_pending(&mut self) -> bool {
        let busy_phase = self.phase.in_flight().is_some() && self.loaded;
        let busy_backup = self.backup_loading;
        if busy_phase {
            tracing::debug!(tab = %self.tab, "abandoning pending settings operation");
            self.settle();
        }
        self.backup_loading = false;
        busy_phase || busy_backup
    }

    /// Borrow the configuration for a collection operation.
    pub fn edit_config(&mut self) -> Option<EditContext<'_, AppConfig>> {
        if self.phase.is_closed() {
            return None;
        }
        Some(EditContext {
            document: self.config.as_mut()?,
            dirty: &mut self.dirty,
            restart: Some(&mut self.restart),
            tab: &self.tab,
            collaborators: &self.collaborators,
            policy: self.options.dirty_policy,
            remove_prompt: &self.profile.remove_prompt,
        })
    }

    /// Borrow the image profiles for a collection operation.
    pub fn edit_image_profiles(&mut self) -> Option<EditContext<'_, ImageProfiles>> {
        if self.phase.is_closed() {
            return None;
        }
        Some(EditContext {
            document: self.image_profiles.as_mut()?,
            dirty: &mut self.dirty,
            restart: Some(&mut self.restart),
            tab: &self.tab,
            collaborators: &self.collaborators,
            policy: self.options.dirty_policy,
            remove_prompt: &self.profile.remove_prompt,
        })
    }

    pub fn bucket_by_label(&self, label: &str) -> Option<&Value> {
        self.config.as_ref()?.bucket_by_label(label)
    }

    pub fn config(&self) -> Option<&AppConfig> {
        self.config.as_ref()
    }

    pub fn image_profiles(&self) -> Option<&ImageProfiles> {
        self.image_profiles.as_ref()
    }

    pub fn backup_log(&self) -> &[String] {
        &self.backup_log
    }

    pub fn is_backup_loading(&self) -> bool {
        self.backup_loading
    }

    pub fn restart_required(&self) -> bool {
        self.restart.is_raised()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn tab_id(&self) -> &TabId {
        &self.tab
    }

    pub fn navigate_to(&self, path: &str) {
        self.collaborators.tabs.navigate_to(path);
    }

    /// End the session. The settings tab itself stays open.
    pub fn close(&mut self) {
        self.loading = false;
        self.phase = SessionPhase::Closed;
    }

    fn notify(&self, message: &str) {
        self.collaborators.tabs.notify(message);
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.collaborators.tabs.set_loading(&self.tab, loading);
    }

    fn settle(&mut self) {
        self.phase = SessionPhase::Ready;
        self.set_loading(false);
    }
}

/// A store that has never held the record answers with nothing; start from defaults.
fn decode_or_default<T: DeserializeOwned + Default>(
    raw: Option<Value>,
) -> Result<T, serde_json::Error> {
    match raw {
        Some(Value::Null) | None => Ok(T::default()),
        Some(value) => serde_json::from_value(value),
    }
}
