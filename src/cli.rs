use crate::widget::controls::validate_score;
use crate::widget::{
    LaunchParams, ProxyAccountClient, SaveOutcome, ScoreWidget, TerminalView, TracingNotifier,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "crm-score-widget",
    version,
    about = "CRM account score proxy and widget client"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the account proxy (default).
    Serve,
    /// Drive the score widget against a running proxy.
    Score {
        #[command(subcommand)]
        action: ScoreAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScoreAction {
    /// Load the account and print its score.
    Show {
        /// Widget launch URL, e.g. http://localhost:3000/?accountId=<uuid>
        #[arg(long)]
        launch_url: String,
    },
    /// Edit the score and commit it the way the widget would.
    Set {
        #[arg(long)]
        launch_url: String,
        /// Raw input; normalized to 0..=100 before saving.
        #[arg(long, allow_hyphen_values = true)]
        value: String,
        #[arg(long, value_enum, default_value_t = Commit::Enter)]
        commit: Commit,
    },
}

/// UI gesture used to commit an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Commit {
    Enter,
    Blur,
    Slider,
}

pub async fn run_score(action: ScoreAction) -> anyhow::Result<()> {
    let launch_url = match &action {
        ScoreAction::Show { launch_url } | ScoreAction::Set { launch_url, .. } => launch_url,
    };
    let launch = LaunchParams::from_url(launch_url)?;
    let api = Arc::new(ProxyAccountClient::new(launch.proxy_base.clone())?);
    let widget = ScoreWidget::new(
        &launch,
        api,
        Arc::new(TerminalView::default()),
        Arc::new(TracingNotifier),
    );
    widget.load().await?;

    let ScoreAction::Set { value, commit, .. } = action else {
        return Ok(());
    };

    let outcome = match commit {
        Commit::Enter | Commit::Blur => {
            widget.on_edit_click();
            widget.on_input(&value);
            if commit == Commit::Enter {
                widget.on_enter().await?
            } else {
                widget.on_blur().await?
            }
        }
        Commit::Slider => {
            widget.on_slider_input(i64::from(validate_score(&value)));
            widget.on_slider_release().await?
        }
    };

    match outcome {
        SaveOutcome::Saved(score) => {
            tracing::info!(account_id = %widget.account_id(), score, "score saved");
        }
        SaveOutcome::Unchanged => {
            tracing::info!(
                score = widget.current_score(),
                display = %widget.controls().display(),
                "score unchanged; nothing sent"
            );
        }
        SaveOutcome::InFlight => {
            tracing::warn!("another save was in progress; nothing sent");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["crm-score-widget"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn set_accepts_negative_values() {
        let cli = Cli::try_parse_from([
            "crm-score-widget",
            "score",
            "set",
            "--launch-url",
            "http://localhost:3000/?accountId=a",
            "--value",
            "-5",
            "--commit",
            "slider",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Score {
                action: ScoreAction::Set { value, commit, .. },
            }) => {
                assert_eq!(value, "-5");
                assert_eq!(commit, Commit::Slider);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }
}
