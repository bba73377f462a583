use super::*;

pub(super) fn spawn_page_load(
    tx: mpsc::Sender<LoadOutcome>,
    request_id: u64,
    surface_id: u64,
    url: String,
    directive: ReloadDirective,
) -> std::io::Result<()> {
    let job = move || {
        let result = fetch_page(&url, &directive);
        let _ = tx.send(LoadOutcome {
            request_id,
            surface_id,
            url,
            result,
        });
    };

    thread::Builder::new()
        .name("skylight-load".to_owned())
        .stack_size(LOAD_THREAD_STACK_SIZE)
        .spawn(job)
        .map(|_| ())
}

fn fetch_page(url: &str, directive: &ReloadDirective) -> Result<PagePreview, LoadFailure> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(CLIENT_USER_AGENT)
        .timeout(LOAD_TIMEOUT)
        .build()
        .map_err(classify_fetch_error)?;

    let mut request = client.get(url);
    if directive.mode == ReloadMode::BypassCache {
        request = request.header("Cache-Control", "no-cache");
    }
    if let Some((name, value)) = &directive.identifying_header {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send().map_err(classify_fetch_error)?;
    let status_code = response.status().as_u16();
    let final_url = response.url().to_string();
    let body = response.text().map_err(classify_fetch_error)?;

    Ok(PagePreview {
        final_url,
        status_code,
        title: extract_html_title(&body),
        body_bytes: body.len(),
        body_preview: truncate_preview_text(&body, MAX_BODY_PREVIEW_BYTES),
    })
}

fn classify_fetch_error(error: reqwest::Error) -> LoadFailure {
    let mut detail = error.to_string();
    let mut source = std::error::Error::source(&error);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }

    LoadFailure::new(classify_failure_detail(&detail), detail)
}

/// Maps a transport error description onto the retry classification.
pub(super) fn classify_failure_detail(detail: &str) -> LoadFailureKind {
    let lower = detail.to_ascii_lowercase();
    let secure_markers = ["certificate", "tls", "ssl", "handshake"];
    if secure_markers.iter().any(|marker| lower.contains(marker)) {
        LoadFailureKind::SecureConnection
    } else {
        LoadFailureKind::Other
    }
}

pub(super) fn extract_html_title(document: &str) -> Option<String> {
    let lower = document.to_ascii_lowercase();
    let open = lower.find("<title>")?;
    let close = lower.find("</title>")?;
    if close <= open + 7 {
        return None;
    }

    let title = document[(open + 7)..close].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_owned())
    }
}

pub(super) fn truncate_preview_text(input: &str, max_bytes: usize) -> String {
    if input.len() <= max_bytes {
        return input.to_owned();
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end = end.saturating_sub(1);
    }
    input[..end].to_owned()
}
