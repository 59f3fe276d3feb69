use crate::server::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

/// Serves `index.html` from the public directory, or the built-in widget page
/// when the directory carries none.
pub async fn serve_entry(State(state): State<AppState>) -> impl IntoResponse {
    let path = state.config.public_dir.join("index.html");
    let html = match tokio::fs::read_to_string(&path).await {
        Ok(html) => html,
        Err(err) => {
            tracing::debug!(?path, %err, "no entry document on disk; using built-in page");
            entry_document()
        }
    };
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

pub fn entry_document() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Account Score</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 0; padding: 12px; }
  .row { display: flex; align-items: center; gap: 8px; }
  #customScore { width: 4em; }
  #scoreSlider { --slider-value: 0%; flex: 1; accent-color: #0a6ed1; }
  #editButton.force-hidden { visibility: hidden; }
  #loadingIndicator, #errorMessage { display: none; }
  #loadingIndicator.visible, #errorMessage.visible { display: block; }
  #errorMessage { color: #b00; margin-top: 8px; }
</style>
</head>
<body>
<div id="scoreDisplay">Score: 0/100</div>
<div class="row">
  <input id="customScore" type="number" min="0" max="100" value="0">
  <input id="scoreSlider" type="range" min="0" max="100" value="0">
  <button id="editButton" type="button">Edit</button>
</div>
<div id="loadingIndicator">Saving…</div>
<div id="errorMessage"></div>
<script>
(function() {
  const ERROR_DISMISS_MS = 5000;
  const state = { accountId: null, currentScore: 0, previousScore: 0, saving: false };
  const input = document.getElementById("customScore");
  const slider = document.getElementById("scoreSlider");
  const display = document.getElementById("scoreDisplay");
  const loading = document.getElementById("loadingIndicator");
  const errorBox = document.getElementById("errorMessage");
  const editButton = document.getElementById("editButton");
  let errorTimer = null;

  function validate(value) {
    const n = parseInt(value, 10);
    if (isNaN(n)) return 0;
    return Math.min(100, Math.max(0, n));
  }

  function mirror(score) {
    display.textContent = `Score: ${score}/100`;
    slider.style.setProperty("--slider-value", score + "%");
  }

  function render(score) {
    input.value = score;
    slider.value = score;
    mirror(score);
  }

  function showError(message) {
    errorBox.textContent = message;
    errorBox.classList.add("visible");
    clearTimeout(errorTimer);
    errorTimer = setTimeout(hideError, ERROR_DISMISS_MS);
  }

  function hideError() {
    errorBox.classList.remove("visible");
  }

  async function fetchAccount() {
    const res = await fetch(`/api/accounts/${encodeURIComponent(state.accountId)}`);
    if (!res.ok) throw new Error(`Failed to load account: ${res.status} ${res.statusText}`);
    return res.json();
  }

  async function load() {
    try {
      const account = await fetchAccount();
      const raw = account && account.value && account.value.extensions
        ? account.value.extensions.CustomScore : null;
      state.currentScore = raw ? validate(raw) : 0;
      state.previousScore = state.currentScore;
      render(state.currentScore);
    } catch (err) {
      showError(`Failed to load account: ${err.message}`);
    }
  }

  async function save() {
    if (state.saving) return;
    const sent = input.value;
    const score = validate(sent);
    if (score === state.previousScore) return;
    state.saving = true;
    loading.classList.add("visible");
    hideError();
    try {
      const fresh = await fetchAccount();
      const token = fresh && fresh.value && fresh.value.adminData
        ? fresh.value.adminData.updatedOn : null;
      if (!token) throw new Error("No updatedOn timestamp found for If-Match header");
      const res = await fetch(`/api/accounts/${encodeURIComponent(state.accountId)}`, {
        method: "PATCH",
        headers: { "Content-Type": "application/merge-patch+json", "If-Match": `"${token}"` },
        body: JSON.stringify({ extensions: { CustomScore: score } }),
      });
      if (!res.ok) throw new Error(`Save failed: ${res.status} ${await res.text()}`);
      state.previousScore = score;
      if (input.value === sent) {
        state.currentScore = score;
        render(score);
      }
      window.parent.postMessage({ event: "accountRefreshEvent", operation: "triggerCustomAction" }, "*");
    } catch (err) {
      state.currentScore = state.previousScore;
      render(state.previousScore);
      showError(`Failed to save. Value reverted. ${err.message}`);
    } finally {
      state.saving = false;
      loading.classList.remove("visible");
    }
  }

  input.addEventListener("input", (e) => {
    const score = validate(e.target.value);
    state.currentScore = score;
    slider.value = score;
    mirror(score);
  });
  slider.addEventListener("input", (e) => {
    const score = validate(e.target.value);
    state.currentScore = score;
    input.value = score;
    mirror(score);
  });
  input.addEventListener("blur", () => { save(); editButton.classList.remove("force-hidden"); });
  input.addEventListener("focus", () => editButton.classList.add("force-hidden"));
  input.addEventListener("keypress", (e) => {
    if (e.key === "Enter") { e.preventDefault(); save(); }
  });
  slider.addEventListener("mouseup", save);
  slider.addEventListener("touchend", save);
  editButton.addEventListener("click", () => {
    editButton.classList.add("force-hidden");
    input.focus();
  });

  state.accountId = new URLSearchParams(window.location.search).get("accountId");
  if (!state.accountId) {
    showError("No accountId provided in URL. Please provide ?accountId=YOUR_ACCOUNT_UUID");
    return;
  }
  load();
})();
</script>
</body>
</html>
"#
    .to_string()
}
