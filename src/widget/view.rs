use super::controls::ScoreControls;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const ERROR_DISMISS_AFTER: Duration = Duration::from_secs(5);

/// Rendering surface for the widget. Calls are synchronous and cheap.
pub trait WidgetView: Send + Sync {
    fn render(&self, controls: &ScoreControls);
    fn set_loading(&self, visible: bool);
    fn show_error(&self, message: &str);
    fn hide_error(&self);
}

/// Transient error message. Each `show` restarts the dismiss timer; only the
/// most recent timer may hide the banner.
#[derive(Clone)]
pub struct ErrorBanner {
    view: Arc<dyn WidgetView>,
    generation: Arc<AtomicU64>,
    dismiss_after: Duration,
}

impl ErrorBanner {
    pub fn new(view: Arc<dyn WidgetView>) -> Self {
        Self::with_timeout(view, ERROR_DISMISS_AFTER)
    }

    pub fn with_timeout(view: Arc<dyn WidgetView>, dismiss_after: Duration) -> Self {
        Self {
            view,
            generation: Arc::new(AtomicU64::new(0)),
            dismiss_after,
        }
    }

    pub fn show(&self, message: &str) {
        let current = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.view.show_error(message);

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime; error banner will not auto-dismiss");
            return;
        };
        let view = self.view.clone();
        let generation = self.generation.clone();
        let dismiss_after = self.dismiss_after;
        handle.spawn(async move {
            tokio::time::sleep(dismiss_after).await;
            if generation.load(Ordering::Acquire) == current {
                view.hide_error();
            }
        });
    }

    pub fn hide(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.view.hide_error();
    }
}

/// Plain-text view for the terminal client. Prints the display line when it
/// changes.
#[derive(Debug, Default)]
pub struct TerminalView {
    last_line: Mutex<Option<String>>,
}

impl WidgetView for TerminalView {
    fn render(&self, controls: &ScoreControls) {
        let filled = usize::from(controls.slider()) / 5;
        let line = format!(
            "{:<16}[{}{}] {}",
            controls.display(),
            "#".repeat(filled),
            "-".repeat(20 - filled),
            controls.fill()
        );
        let mut last = self
            .last_line
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.as_deref() != Some(line.as_str()) {
            println!("{line}");
            *last = Some(line);
        }
    }

    fn set_loading(&self, visible: bool) {
        if visible {
            tracing::info!("saving");
        }
    }

    fn show_error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn hide_error(&self) {}
}
