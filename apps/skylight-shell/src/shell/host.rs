use super::*;

impl ShellApp {
    pub(super) fn new(config: ShellConfig) -> ShellResult<Self> {
        let retry_policy = RetryPolicy::default();
        retry_policy.validate()?;

        let (load_tx, load_rx) = mpsc::channel();
        let (bridge_tx, bridge_rx) = mpsc::channel();
        let stack = Surface::primary(1, config.start_url.clone());

        Ok(Self {
            config,
            stack,
            next_surface_id: 2,
            next_request_id: 1,
            primary_phase: LoadPhase::Idle,
            previews: HashMap::new(),
            surface_errors: HashMap::new(),
            inflight: HashMap::new(),
            retry_policy,
            retry_state: RetryState::new(),
            pending_retry: None,
            load_tx,
            load_rx,
            bridge_tx,
            bridge_rx,
            pending_commands: Vec::new(),
            bridge_log: VecDeque::new(),
            console_input: String::new(),
            first_appearance_done: false,
            // The window starts focused; only a later unfocus/refocus edge
            // counts as returning to the foreground.
            was_focused: true,
            show_details: false,
            status_line: "Ready".to_owned(),
            last_error: None,
        })
    }

    /// A reload is issued only on the unfocused-to-focused transition.
    pub(super) fn handle_focus_change(&mut self, focused: bool) {
        if foreground_edge(self.was_focused, focused) {
            self.reload_primary(ReloadDirective::plain(), "returned to foreground");
        }
        self.was_focused = focused;
    }

    pub(super) fn primary_surface_id(&self) -> u64 {
        self.stack.id
    }

    pub(super) fn primary_loading(&self) -> bool {
        self.primary_phase == LoadPhase::Loading
    }

    /// First-appearance path: loads the start URL unless the primary surface
    /// already shows it or a load for it is in flight.
    pub(super) fn ensure_primary_loaded(&mut self, reason: &str) {
        let primary = self.primary_surface_id();
        let shown = self
            .previews
            .get(&primary)
            .map(|preview| preview.final_url.as_str());
        let in_flight = self.inflight.get(&primary).map(|load| load.url.as_str());
        if !should_issue_load(shown, in_flight, &self.config.start_url) {
            log::debug!("{reason}: start URL already loaded, skipping");
            return;
        }

        self.issue_primary_load(ReloadDirective::plain(), reason);
    }

    /// Deliberate reload of the start URL; cancels any scheduled retry.
    pub(super) fn reload_primary(&mut self, directive: ReloadDirective, reason: &str) {
        let primary = self.primary_surface_id();
        if self
            .inflight
            .get(&primary)
            .is_some_and(|load| same_navigation_target(&load.url, &self.config.start_url))
        {
            log::debug!("{reason}: load already in flight, skipping reload");
            return;
        }

        if self.pending_retry.take().is_some() {
            self.retry_state.invalidate();
        }

        self.issue_primary_load(directive, reason);
    }

    fn issue_primary_load(&mut self, directive: ReloadDirective, reason: &str) {
        match self.primary_phase.begin_load() {
            Ok(next) => self.primary_phase = next,
            Err(error) => {
                log::debug!("{reason}: {error}");
                return;
            }
        }

        let primary = self.primary_surface_id();
        let url = self.config.start_url.clone();
        log::info!("{reason}: loading {url}");
        self.status_line = format!("Loading {url}...");
        self.last_error = None;
        self.issue_load(primary, url, directive);
    }

    fn issue_load(&mut self, surface_id: u64, url: String, directive: ReloadDirective) {
        // Every navigation passes through the policy before a worker is spawned.
        match decide_navigation(&url) {
            NavigationDecision::Allow => {}
        }

        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.saturating_add(1);
        self.inflight.insert(
            surface_id,
            InflightLoad {
                request_id,
                url: url.clone(),
            },
        );

        if loader::spawn_page_load(self.load_tx.clone(), request_id, surface_id, url, directive)
            .is_err()
        {
            self.inflight.remove(&surface_id);
            if surface_id == self.primary_surface_id()
                && let Ok(next) = self.primary_phase.fail_load()
            {
                self.primary_phase = next;
            }
            self.status_line = "Load failed".to_owned();
            self.last_error = Some("failed to spawn load worker".to_owned());
        }
    }

    pub(super) fn poll_loads(&mut self) {
        loop {
            let Ok(outcome) = self.load_rx.try_recv() else {
                break;
            };

            let current = self
                .inflight
                .get(&outcome.surface_id)
                .map(|load| load.request_id);
            if current != Some(outcome.request_id) {
                log::debug!("ignoring stale load result for {}", outcome.url);
                continue;
            }
            self.inflight.remove(&outcome.surface_id);

            if outcome.surface_id == self.primary_surface_id() {
                self.handle_primary_outcome(outcome);
            } else {
                self.handle_external_outcome(outcome);
            }
        }
    }

    fn handle_primary_outcome(&mut self, outcome: LoadOutcome) {
        match outcome.result {
            Ok(preview) => {
                match self.primary_phase.finish_load() {
                    Ok(next) => self.primary_phase = next,
                    Err(error) => log::warn!("load bookkeeping out of sync: {error}"),
                }

                self.status_line = format!(
                    "Loaded {} (status {}, {} bytes)",
                    preview.final_url, preview.status_code, preview.body_bytes
                );
                self.surface_errors.remove(&outcome.surface_id);
                let final_url = preview.final_url.clone();
                self.previews.insert(outcome.surface_id, preview);

                let mut delegate = ShellDelegate { app: self };
                delegate.on_load_finished(&final_url);
            }
            Err(failure) => {
                match self.primary_phase.fail_load() {
                    Ok(next) => self.primary_phase = next,
                    Err(error) => log::warn!("load bookkeeping out of sync: {error}"),
                }

                self.status_line = "Load failed".to_owned();
                self.surface_errors
                    .insert(outcome.surface_id, failure.to_string());

                let mut delegate = ShellDelegate { app: self };
                delegate.on_load_failed(&failure);
            }
        }
    }

    fn handle_external_outcome(&mut self, outcome: LoadOutcome) {
        match outcome.result {
            Ok(preview) => {
                self.surface_errors.remove(&outcome.surface_id);
                self.previews.insert(outcome.surface_id, preview);
            }
            Err(failure) => {
                self.surface_errors
                    .insert(outcome.surface_id, failure.to_string());
            }
        }
    }

    pub(super) fn poll_bridge(&mut self) {
        let raw_messages: Vec<Value> = self.bridge_rx.try_iter().collect();
        for raw in raw_messages {
            let mut delegate = ShellDelegate { app: self };
            sky_bridge::deliver_raw(&mut delegate, BRIDGE_CHANNEL_NAME, &raw);
        }
    }

    pub(super) fn apply_pending_commands(&mut self) {
        let commands = std::mem::take(&mut self.pending_commands);
        for command in commands {
            match command {
                BridgeCommand::PresentExternalBrowser { url } => {
                    self.present_external_browser(url);
                }
            }
        }
    }

    fn present_external_browser(&mut self, url: Url) {
        let id = self.next_surface_id;
        self.next_surface_id = self.next_surface_id.saturating_add(1);
        let below = topmost(&self.stack).id;
        self.stack
            .present_on_topmost(Surface::external_browser(id, url.as_str()));
        log::info!("presenting in-app browser for {url} over surface {below}");
        self.note_bridge_event(format!("presented in-app browser for {url}"));
        self.issue_load(id, url.as_str().to_owned(), ReloadDirective::plain());
    }

    pub(super) fn dismiss_topmost_surface(&mut self) {
        let Some(surface) = self.stack.dismiss_topmost() else {
            return;
        };

        self.inflight.remove(&surface.id);
        self.previews.remove(&surface.id);
        self.surface_errors.remove(&surface.id);
        log::info!("dismissed in-app browser for {}", surface.url);
        self.note_bridge_event(format!("dismissed in-app browser for {}", surface.url));
    }

    pub(super) fn poll_retry(&mut self) {
        let due = self
            .pending_retry
            .as_ref()
            .is_some_and(|pending| Instant::now() >= pending.due_at);
        if !due {
            return;
        }

        let Some(pending) = self.pending_retry.take() else {
            return;
        };

        if !self.retry_state.accepts(&pending.ticket) {
            log::debug!("dropping superseded retry ticket");
            return;
        }

        self.issue_primary_load(
            pending.ticket.directive,
            &format!("retry attempt {}", pending.ticket.attempt),
        );
    }

    pub(super) fn post_console_message(&mut self) {
        let raw = self.console_input.trim();
        if raw.is_empty() {
            return;
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(value) => {
                self.note_bridge_event(format!("posted {raw}"));
                let _ = self.bridge_tx.send(value);
                self.console_input.clear();
            }
            Err(error) => {
                self.note_bridge_event(format!("console input is not JSON: {error}"));
            }
        }
    }

    pub(super) fn note_bridge_event(&mut self, entry: String) {
        if self.bridge_log.len() >= MAX_BRIDGE_EVENT_LOG {
            self.bridge_log.pop_front();
        }
        self.bridge_log.push_back(entry);
    }
}

/// Dispatcher object the bridge and loader report into.
struct ShellDelegate<'app> {
    app: &'app mut ShellApp,
}

impl SurfaceDelegate for ShellDelegate<'_> {
    fn on_message(&mut self, message: BridgeMessage) {
        self.app
            .note_bridge_event(format!("received action `{}`", message.action.as_tag()));
        if let Some(command) = sky_bridge::dispatch(&message) {
            self.app.pending_commands.push(command);
        }
    }

    fn on_load_finished(&mut self, url: &str) {
        self.app.retry_state.reset();
        self.app.pending_retry = None;
        self.app.last_error = None;
        log::info!("page host finished loading {url}");

        // Stands in for the document-end script injected into every page:
        // once the document is loaded it posts the ready notification back
        // through the message channel.
        let _ = self.app.bridge_tx.send(BridgeMessage::ready_notification());
    }

    fn on_load_failed(&mut self, failure: &LoadFailure) {
        self.app.last_error = Some(failure.to_string());
        if self.app.pending_retry.is_some() {
            return;
        }

        let ticket = self
            .app
            .retry_state
            .schedule(&self.app.retry_policy, failure);
        if let Some(ticket) = ticket {
            let due_at = Instant::now() + ticket.delay;
            self.app.pending_retry = Some(PendingRetry { ticket, due_at });
        }
    }
}

pub(super) fn foreground_edge(was_focused: bool, focused: bool) -> bool {
    focused && !was_focused
}

/// Idempotence guard for the primary surface's update path.
pub(super) fn should_issue_load(
    shown_url: Option<&str>,
    in_flight_url: Option<&str>,
    target: &str,
) -> bool {
    if in_flight_url.is_some_and(|url| same_navigation_target(url, target)) {
        return false;
    }

    if shown_url.is_some_and(|url| same_navigation_target(url, target)) {
        return false;
    }

    true
}

fn same_navigation_target(left: &str, right: &str) -> bool {
    if left == right {
        return true;
    }

    let Ok(left_url) = Url::parse(left) else {
        return false;
    };
    let Ok(right_url) = Url::parse(right) else {
        return false;
    };

    left_url.scheme() == right_url.scheme()
        && left_url.host_str() == right_url.host_str()
        && left_url.port_or_known_default() == right_url.port_or_known_default()
        && left_url.path() == right_url.path()
        && left_url.query() == right_url.query()
}

#[cfg(test)]
include!("tests.rs");
