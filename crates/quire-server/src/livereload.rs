//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// WebSocket endpoint browsers connect to.
pub const LIVE_RELOAD_PATH: &str = "/__livereload";

/// Path serving the client script.
pub const LIVE_RELOAD_SCRIPT_PATH: &str = "/__livereload.js";

/// Messages sent to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Connection established
    Connected,

    /// Site was rebuilt; reload the page
    Reload,
}

/// Hub for broadcasting reload messages to all connected browsers.
#[derive(Debug, Clone)]
pub struct LiveReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl LiveReloadHub {
    /// Create a new hub.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    /// Send a message to all connected browsers.
    pub fn send(&self, msg: ReloadMessage) {
        // No receivers just means no browser is open.
        let _ = self.sender.send(msg);
    }

    /// Subscribe to reload messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Number of connected browsers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LiveReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Tag injected into every page built for the dev server.
pub fn script_tag() -> String {
    format!(r#"<script src="{LIVE_RELOAD_SCRIPT_PATH}"></script>"#)
}

/// Client-side script: connect to the endpoint, reload on `reload`.
pub fn client_script() -> String {
    format!(
        r#"(function() {{
  'use strict';
  var scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
  var ws = new WebSocket(scheme + location.host + '{LIVE_RELOAD_PATH}');

  ws.onmessage = function(event) {{
    var msg = JSON.parse(event.data);
    if (msg.type === 'reload') {{
      location.reload();
    }}
  }};

  ws.onclose = function() {{
    console.log('[livereload] Disconnected');
    setTimeout(function() {{ location.reload(); }}, 1000);
  }};
}})();
"#
    )
}
