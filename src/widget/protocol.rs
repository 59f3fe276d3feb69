use super::client::AccountApi;
use super::controls::{
    ScoreControls, concurrency_token, if_match_value, score_from_account, validate_score,
};
use super::host::{HostEvent, HostNotifier};
use super::session::{SaveGuard, SaveTicket, WidgetSession};
use super::view::{ErrorBanner, WidgetView};
use super::{LaunchParams, WidgetError};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    Blur,
    Enter,
    SliderRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(u8),
    /// The normalized value equals the last persisted score.
    Unchanged,
    /// Another save holds the guard; this trigger was dropped.
    InFlight,
}

struct WidgetState {
    session: WidgetSession,
    controls: ScoreControls,
}

/// Widget controller. Owns the session state and drives the view, the proxy
/// API and the host notifier through the load/edit/save cycle.
pub struct ScoreWidget {
    api: Arc<dyn AccountApi>,
    view: Arc<dyn WidgetView>,
    host: Arc<dyn HostNotifier>,
    banner: ErrorBanner,
    guard: SaveGuard,
    state: Mutex<WidgetState>,
}

/// Held for the duration of one save; hides the loading indicator and frees
/// the guard however the save ends.
struct SavingScope<'a> {
    view: &'a dyn WidgetView,
    _ticket: SaveTicket<'a>,
}

impl Drop for SavingScope<'_> {
    fn drop(&mut self) {
        self.view.set_loading(false);
    }
}

impl ScoreWidget {
    pub fn new(
        launch: &LaunchParams,
        api: Arc<dyn AccountApi>,
        view: Arc<dyn WidgetView>,
        host: Arc<dyn HostNotifier>,
    ) -> Self {
        Self {
            banner: ErrorBanner::new(view.clone()),
            api,
            view,
            host,
            guard: SaveGuard::default(),
            state: Mutex::new(WidgetState {
                session: WidgetSession::new(launch.account_id.clone()),
                controls: ScoreControls::default(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, WidgetState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn account_id(&self) -> String {
        self.state().session.account_id().to_string()
    }

    pub fn current_score(&self) -> u8 {
        self.state().session.current_score
    }

    #[cfg(test)]
    pub fn previous_score(&self) -> u8 {
        self.state().session.previous_score
    }

    pub fn controls(&self) -> ScoreControls {
        self.state().controls.clone()
    }

    #[cfg(test)]
    pub fn is_saving(&self) -> bool {
        self.guard.is_saving()
    }

    /// Fetches the account and shows its score. On failure only the error
    /// banner changes.
    pub async fn load(&self) -> Result<u8, WidgetError> {
        let account_id = self.account_id();
        let account = match self.fetch_account(&account_id).await {
            Ok(account) => account,
            Err(err) => {
                warn!(%account_id, %err, "error loading account");
                self.banner.show(&format!("Failed to load account: {err}"));
                return Err(err);
            }
        };
        let score = score_from_account(&account);
        let controls = {
            let mut state = self.state();
            state.session.loaded(score);
            state.controls.set_score(score);
            state.controls.clone()
        };
        self.view.render(&controls);
        info!(%account_id, score, "account loaded");
        Ok(score)
    }

    pub fn on_input(&self, raw: &str) -> u8 {
        self.edit(|controls| controls.on_input(raw))
    }

    pub fn on_slider_input(&self, value: i64) -> u8 {
        self.edit(|controls| controls.on_slider(value))
    }

    fn edit(&self, apply: impl FnOnce(&mut ScoreControls) -> u8) -> u8 {
        let (score, controls) = {
            let mut state = self.state();
            let score = apply(&mut state.controls);
            state.session.current_score = score;
            (score, state.controls.clone())
        };
        self.view.render(&controls);
        score
    }

    pub fn on_focus(&self) {
        self.toggle_edit_button(true);
    }

    pub fn on_edit_click(&self) {
        self.toggle_edit_button(true);
    }

    fn toggle_edit_button(&self, hidden: bool) {
        let controls = {
            let mut state = self.state();
            if hidden {
                state.controls.hide_edit_button();
            } else {
                state.controls.rearm_edit_button();
            }
            state.controls.clone()
        };
        self.view.render(&controls);
    }

    pub async fn on_blur(&self) -> Result<SaveOutcome, WidgetError> {
        let outcome = self.save(SaveTrigger::Blur).await;
        self.toggle_edit_button(false);
        outcome
    }

    pub async fn on_enter(&self) -> Result<SaveOutcome, WidgetError> {
        self.save(SaveTrigger::Enter).await
    }

    pub async fn on_slider_release(&self) -> Result<SaveOutcome, WidgetError> {
        self.save(SaveTrigger::SliderRelease).await
    }

    /// Persists the current input. Errors are returned after the display has
    /// been reverted and the banner shown.
    pub async fn save(&self, trigger: SaveTrigger) -> Result<SaveOutcome, WidgetError> {
        let Some(ticket) = self.guard.try_acquire() else {
            debug!(?trigger, "save already in progress, skipping");
            return Ok(SaveOutcome::InFlight);
        };

        let (account_id, sent_input, previous) = {
            let state = self.state();
            (
                state.session.account_id().to_string(),
                state.controls.input_text().to_string(),
                state.session.previous_score,
            )
        };
        let new_score = validate_score(&sent_input);
        if new_score == previous {
            debug!(?trigger, score = new_score, "no change in score, skipping save");
            return Ok(SaveOutcome::Unchanged);
        }

        let _scope = SavingScope {
            view: self.view.as_ref(),
            _ticket: ticket,
        };
        self.view.set_loading(true);
        self.banner.hide();

        match self.write_score(&account_id, new_score).await {
            Ok(()) => {
                // Input typed while the request was out stays on screen and
                // becomes the next save's candidate.
                let controls = {
                    let mut state = self.state();
                    if state.controls.input_text() == sent_input {
                        state.session.commit(new_score);
                        state.controls.set_score(new_score);
                        Some(state.controls.clone())
                    } else {
                        state.session.previous_score = new_score;
                        None
                    }
                };
                if let Some(controls) = controls {
                    self.view.render(&controls);
                }
                info!(%account_id, score = new_score, ?trigger, "score saved");
                self.host.notify(HostEvent::AccountRefresh);
                Ok(SaveOutcome::Saved(new_score))
            }
            Err(err) => {
                warn!(%account_id, score = new_score, %err, "error saving score");
                let controls = {
                    let mut state = self.state();
                    let restored = state.session.revert();
                    state.controls.set_score(restored);
                    state.controls.clone()
                };
                self.view.render(&controls);
                self.banner
                    .show(&format!("Failed to save. Value reverted. {err}"));
                Err(err)
            }
        }
    }

    /// Re-reads the account for a fresh concurrency token, then sends the
    /// merge-patch conditioned on it.
    async fn write_score(&self, account_id: &str, score: u8) -> Result<(), WidgetError> {
        let fresh = self.fetch_account(account_id).await?;
        let token = concurrency_token(&fresh).ok_or(WidgetError::PreconditionMissing)?;
        let if_match = if_match_value(&token);
        let patch = json!({ "extensions": { "CustomScore": score } });

        debug!(%account_id, score, %if_match, "sending score patch");
        let resp = self.api.patch_account(account_id, &if_match, &patch).await?;
        if !resp.is_success() {
            return Err(WidgetError::SaveFailed {
                status: resp.status,
                body: resp.body,
            });
        }
        Ok(())
    }

    async fn fetch_account(&self, account_id: &str) -> Result<Value, WidgetError> {
        let resp = self
            .api
            .get_account(account_id)
            .await
            .map_err(|e| WidgetError::AccountFetchFailed(e.to_string()))?;
        if !resp.is_success() {
            return Err(WidgetError::AccountFetchFailed(format!(
                "{} {}",
                resp.status, resp.reason
            )));
        }
        resp.json()
            .map_err(|e| WidgetError::AccountFetchFailed(e.to_string()))
    }
}
