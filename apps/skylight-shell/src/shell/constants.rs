const DEFAULT_START_URL: &str = "http://127.0.0.1:8080/";
const START_URL_ENV: &str = "SKYLIGHT_START_URL";
const CLIENT_USER_AGENT: &str = "SkylightShell/0.1";
const LOAD_TIMEOUT: Duration = Duration::from_secs(20);
const LOAD_THREAD_STACK_SIZE: usize = 4 * 1024 * 1024;
const MAX_BODY_PREVIEW_BYTES: usize = 64 * 1024;
const MAX_BRIDGE_EVENT_LOG: usize = 64;
const LOADING_REPAINT_INTERVAL: Duration = Duration::from_millis(50);
