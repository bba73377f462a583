#[derive(Debug, Clone)]
struct PagePreview {
    final_url: String,
    status_code: u16,
    title: Option<String>,
    body_bytes: usize,
    body_preview: String,
}

#[derive(Debug)]
struct LoadOutcome {
    request_id: u64,
    surface_id: u64,
    url: String,
    result: Result<PagePreview, LoadFailure>,
}

#[derive(Debug, Clone)]
struct InflightLoad {
    request_id: u64,
    url: String,
}

#[derive(Debug, Clone)]
struct PendingRetry {
    ticket: RetryTicket,
    due_at: Instant,
}

struct ShellApp {
    config: ShellConfig,
    stack: Surface,
    next_surface_id: u64,
    next_request_id: u64,
    primary_phase: LoadPhase,
    previews: HashMap<u64, PagePreview>,
    surface_errors: HashMap<u64, String>,
    inflight: HashMap<u64, InflightLoad>,
    retry_policy: RetryPolicy,
    retry_state: RetryState,
    pending_retry: Option<PendingRetry>,
    load_tx: mpsc::Sender<LoadOutcome>,
    load_rx: mpsc::Receiver<LoadOutcome>,
    bridge_tx: mpsc::Sender<Value>,
    bridge_rx: mpsc::Receiver<Value>,
    pending_commands: Vec<BridgeCommand>,
    bridge_log: VecDeque<String>,
    console_input: String,
    first_appearance_done: bool,
    was_focused: bool,
    show_details: bool,
    status_line: String,
    last_error: Option<String>,
}
