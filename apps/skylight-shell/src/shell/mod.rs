use eframe::egui;
use serde_json::Value;
use sky_bridge::BRIDGE_CHANNEL_NAME;
use sky_bridge::BridgeCommand;
use sky_bridge::BridgeMessage;
use sky_bridge::SurfaceDelegate;
use sky_core::LoadFailure;
use sky_core::LoadFailureKind;
use sky_core::ShellConfig;
use sky_core::ShellResult;
use sky_surface::LoadPhase;
use sky_surface::NavigationDecision;
use sky_surface::ReloadDirective;
use sky_surface::ReloadMode;
use sky_surface::RetryPolicy;
use sky_surface::RetryState;
use sky_surface::RetryTicket;
use sky_surface::Surface;
use sky_surface::decide_navigation;
use sky_surface::topmost;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use std::time::Instant;
use url::Url;

include!("constants.rs");
include!("types.rs");

mod host;
mod loader;
mod startup;
mod ui;

pub(crate) use startup::run;
