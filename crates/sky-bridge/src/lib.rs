//! Script-to-native message bridge for hosted pages.
//!
//! The hosted page posts `{action, data}` objects on a single named channel.
//! The bridge validates the envelope shape, maps the action tag onto a closed
//! enumeration, and dispatches to at most one native command. Every rejection
//! is log-and-drop: nothing is ever surfaced back to the page.

use serde_json::Value;
use sky_core::LoadFailure;
use sky_core::ShellError;
use sky_core::ShellResult;
use url::Url;

/// Name of the single message channel the hosted page posts to.
pub const BRIDGE_CHANNEL_NAME: &str = "skylightMessageHandler";

const ACTION_TAG_READY: &str = "ready";
const ACTION_TAG_LOG: &str = "log";
const ACTION_TAG_LAUNCH_EXTERNAL_DCF: &str = "launchExternalDCF";
const FIELD_ACTION: &str = "action";
const FIELD_DATA: &str = "data";
const FIELD_REDIRECT_URL: &str = "redirectURL";

/// Closed set of known page actions, plus the raw tag for anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeAction {
    Ready,
    Log,
    LaunchExternalDcf,
    Unknown(String),
}

impl BridgeAction {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            ACTION_TAG_READY => Self::Ready,
            ACTION_TAG_LOG => Self::Log,
            ACTION_TAG_LAUNCH_EXTERNAL_DCF => Self::LaunchExternalDcf,
            other => Self::Unknown(other.to_owned()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::Ready => ACTION_TAG_READY,
            Self::Log => ACTION_TAG_LOG,
            Self::LaunchExternalDcf => ACTION_TAG_LAUNCH_EXTERNAL_DCF,
            Self::Unknown(tag) => tag.as_str(),
        }
    }
}

/// Validated message envelope received from the hosted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeMessage {
    pub action: BridgeAction,
    pub data: Option<Value>,
}

impl BridgeMessage {
    /// The document-end notification the host posts when a page finishes loading.
    pub fn ready_notification() -> Value {
        serde_json::json!({
            FIELD_ACTION: ACTION_TAG_READY,
            FIELD_DATA: "page loaded successfully",
        })
    }
}

/// Native command produced by dispatching a bridge message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    /// Present a full-screen in-app browser surface on top of the topmost surface.
    PresentExternalBrowser { url: Url },
}

/// Validates channel and envelope shape of a raw posted value.
pub fn parse_message(channel: &str, raw: &Value) -> ShellResult<BridgeMessage> {
    if channel != BRIDGE_CHANNEL_NAME {
        return Err(ShellError::new(
            "bridge.channel_unknown",
            format!("message posted on unrecognized channel `{channel}`"),
        ));
    }

    let Some(body) = raw.as_object() else {
        return Err(ShellError::new(
            "bridge.payload_not_object",
            "bridge message payload is not a JSON object",
        ));
    };

    let Some(action_value) = body.get(FIELD_ACTION) else {
        return Err(ShellError::new(
            "bridge.action_missing",
            "bridge message has no `action` field",
        ));
    };

    let Some(action_tag) = action_value.as_str() else {
        return Err(ShellError::new(
            "bridge.action_not_string",
            "bridge message `action` field is not a string",
        ));
    };

    let data = body.get(FIELD_DATA).filter(|value| !value.is_null()).cloned();

    Ok(BridgeMessage {
        action: BridgeAction::from_tag(action_tag),
        data,
    })
}

/// Dispatches a validated message, returning at most one native command.
///
/// Rejections never escape to the page; they are logged and dropped here.
pub fn dispatch(message: &BridgeMessage) -> Option<BridgeCommand> {
    match &message.action {
        BridgeAction::Ready => {
            log::info!(
                "page ready: {}",
                message
                    .data
                    .as_ref()
                    .and_then(Value::as_str)
                    .unwrap_or("no data")
            );
            None
        }
        BridgeAction::Log => {
            match message.data.as_ref().and_then(Value::as_str) {
                Some(text) => log::info!("page log: {text}"),
                None => log::debug!("page log action without a string payload, ignoring"),
            }
            None
        }
        BridgeAction::LaunchExternalDcf => match extract_redirect_url(message.data.as_ref()) {
            Ok(url) => Some(BridgeCommand::PresentExternalBrowser { url }),
            Err(error) => {
                log::warn!("dropping launchExternalDCF message: {error}");
                None
            }
        },
        BridgeAction::Unknown(tag) => {
            log::warn!("unrecognized bridge action `{tag}`, ignoring");
            None
        }
    }
}

fn extract_redirect_url(data: Option<&Value>) -> ShellResult<Url> {
    let Some(data) = data else {
        return Err(ShellError::new(
            "bridge.launch_data_missing",
            "launchExternalDCF message carries no `data` field",
        ));
    };

    let Some(body) = data.as_object() else {
        return Err(ShellError::new(
            "bridge.launch_data_not_object",
            "launchExternalDCF `data` field is not an object",
        ));
    };

    let Some(redirect_value) = body.get(FIELD_REDIRECT_URL) else {
        return Err(ShellError::new(
            "bridge.redirect_url_missing",
            "launchExternalDCF `data` has no `redirectURL` field",
        ));
    };

    let Some(redirect) = redirect_value.as_str() else {
        return Err(ShellError::new(
            "bridge.redirect_url_not_string",
            "launchExternalDCF `redirectURL` field is not a string",
        ));
    };

    Url::parse(redirect).map_err(|error| {
        ShellError::new(
            "bridge.redirect_url_invalid",
            format!("launchExternalDCF `redirectURL` `{redirect}` does not parse: {error}"),
        )
    })
}

/// Observer interface implemented by the page host's dispatcher object.
pub trait SurfaceDelegate {
    fn on_message(&mut self, message: BridgeMessage);
    fn on_load_finished(&mut self, url: &str);
    fn on_load_failed(&mut self, failure: &LoadFailure);
}

/// Parses a raw posted value and forwards it to the delegate.
///
/// Malformed messages are logged and dropped without reaching the delegate.
pub fn deliver_raw(delegate: &mut dyn SurfaceDelegate, channel: &str, raw: &Value) {
    match parse_message(channel, raw) {
        Ok(message) => delegate.on_message(message),
        Err(error) => log::warn!("dropping malformed bridge message: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::BRIDGE_CHANNEL_NAME;
    use super::BridgeAction;
    use super::BridgeCommand;
    use super::BridgeMessage;
    use super::SurfaceDelegate;
    use super::deliver_raw;
    use super::dispatch;
    use super::parse_message;
    use serde_json::json;
    use sky_core::LoadFailure;

    fn parsed(raw: serde_json::Value) -> BridgeMessage {
        parse_message(BRIDGE_CHANNEL_NAME, &raw).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn action_tags_round_trip() {
        assert_eq!(BridgeAction::from_tag("ready"), BridgeAction::Ready);
        assert_eq!(BridgeAction::from_tag("log"), BridgeAction::Log);
        assert_eq!(
            BridgeAction::from_tag("launchExternalDCF"),
            BridgeAction::LaunchExternalDcf
        );
        assert_eq!(BridgeAction::LaunchExternalDcf.as_tag(), "launchExternalDCF");
        assert_eq!(
            BridgeAction::from_tag("somethingElse"),
            BridgeAction::Unknown("somethingElse".to_owned())
        );
    }

    #[test]
    fn rejects_wrong_channel() {
        let result = parse_message("otherHandler", &json!({"action": "ready"}));
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "bridge.channel_unknown");
        }
    }

    #[test]
    fn rejects_non_object_payload() {
        let result = parse_message(BRIDGE_CHANNEL_NAME, &json!("ready"));
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "bridge.payload_not_object");
        }
    }

    #[test]
    fn rejects_missing_action() {
        let result = parse_message(BRIDGE_CHANNEL_NAME, &json!({"data": "x"}));
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "bridge.action_missing");
        }
    }

    #[test]
    fn rejects_non_string_action() {
        let result = parse_message(BRIDGE_CHANNEL_NAME, &json!({"action": 7}));
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "bridge.action_not_string");
        }
    }

    #[test]
    fn null_data_is_treated_as_absent() {
        let message = parsed(json!({"action": "ready", "data": null}));
        assert_eq!(message.data, None);
    }

    #[test]
    fn ready_message_dispatches_no_command() {
        let message = parsed(json!({"action": "ready"}));
        assert_eq!(dispatch(&message), None);
    }

    #[test]
    fn log_message_dispatches_no_command() {
        let message = parsed(json!({"action": "log", "data": "hello from the page"}));
        assert_eq!(dispatch(&message), None);

        let non_string = parsed(json!({"action": "log", "data": {"nested": true}}));
        assert_eq!(dispatch(&non_string), None);
    }

    #[test]
    fn unknown_action_dispatches_no_command() {
        let message = parsed(json!({"action": "teleport", "data": "moon"}));
        assert_eq!(dispatch(&message), None);
    }

    #[test]
    fn launch_with_valid_redirect_presents_exactly_one_surface() {
        let message = parsed(json!({
            "action": "launchExternalDCF",
            "data": {"redirectURL": "https://example.com"},
        }));
        let command = dispatch(&message);
        assert!(matches!(
            command,
            Some(BridgeCommand::PresentExternalBrowser { url })
                if url.as_str() == "https://example.com/"
        ));
    }

    #[test]
    fn launch_without_data_presents_nothing() {
        let message = parsed(json!({"action": "launchExternalDCF"}));
        assert_eq!(dispatch(&message), None);
    }

    #[test]
    fn launch_with_empty_data_presents_nothing() {
        let message = parsed(json!({"action": "launchExternalDCF", "data": {}}));
        assert_eq!(dispatch(&message), None);
    }

    #[test]
    fn launch_with_non_object_data_presents_nothing() {
        let message = parsed(json!({"action": "launchExternalDCF", "data": "https://example.com"}));
        assert_eq!(dispatch(&message), None);
    }

    #[test]
    fn launch_with_unparseable_redirect_presents_nothing() {
        let message = parsed(json!({
            "action": "launchExternalDCF",
            "data": {"redirectURL": "not a url"},
        }));
        assert_eq!(dispatch(&message), None);
    }

    #[test]
    fn launch_with_non_string_redirect_presents_nothing() {
        let message = parsed(json!({
            "action": "launchExternalDCF",
            "data": {"redirectURL": 42},
        }));
        assert_eq!(dispatch(&message), None);
    }

    #[derive(Default)]
    struct RecordingDelegate {
        messages: Vec<BridgeMessage>,
    }

    impl SurfaceDelegate for RecordingDelegate {
        fn on_message(&mut self, message: BridgeMessage) {
            self.messages.push(message);
        }

        fn on_load_finished(&mut self, _url: &str) {}

        fn on_load_failed(&mut self, _failure: &LoadFailure) {}
    }

    #[test]
    fn deliver_raw_forwards_valid_messages() {
        let mut delegate = RecordingDelegate::default();
        deliver_raw(
            &mut delegate,
            BRIDGE_CHANNEL_NAME,
            &json!({"action": "ready"}),
        );
        assert_eq!(delegate.messages.len(), 1);
        assert_eq!(delegate.messages[0].action, BridgeAction::Ready);
    }

    #[test]
    fn deliver_raw_drops_malformed_messages_without_delegate_call() {
        let mut delegate = RecordingDelegate::default();
        deliver_raw(&mut delegate, BRIDGE_CHANNEL_NAME, &json!({"data": "x"}));
        deliver_raw(&mut delegate, "otherHandler", &json!({"action": "ready"}));
        deliver_raw(&mut delegate, BRIDGE_CHANNEL_NAME, &json!(["ready"]));
        assert!(delegate.messages.is_empty());
    }

    #[test]
    fn ready_notification_parses_as_ready_message() {
        let raw = BridgeMessage::ready_notification();
        let message = parsed(raw);
        assert_eq!(message.action, BridgeAction::Ready);
        assert!(message.data.is_some());
    }
}
